//! Locates the current etcd leader through the cluster's JSON gateway and
//! resolves the host its clients should connect to.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod tls;
mod types;

pub use error::{Error, Result};
pub use tls::TlsConfig;
pub use types::{Member, MemberListResponse, ResponseHeader, StatusResponse};

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

static STATUS_PATH: &str = "/v3/maintenance/status";
static MEMBER_LIST_PATH: &str = "/v3/cluster/member/list";

/// Client for the etcd administrative endpoints.
#[derive(Clone, Debug)]
pub struct EtcdClient {
    client: Client,
    endpoint: Url,
}

impl EtcdClient {
    /// Creates a client authenticated with the given credentials.
    ///
    /// # Errors
    ///
    /// This function will return an error if the credential files cannot be
    /// read or parsed.
    pub fn new(endpoint: Url, tls: &TlsConfig, timeout: Option<Duration>) -> Result<Self> {
        let client = tls.build_client(timeout)?;

        Ok(Self::with_client(client, endpoint))
    }

    /// Creates a client on top of an already configured HTTP client.
    #[must_use]
    pub const fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetches the status of the member behind the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StatusUnavailable`] on transport failures, non-success
    /// responses and undecodable bodies.
    pub async fn status(&self) -> Result<StatusResponse> {
        self.post(STATUS_PATH).await.map_err(Error::StatusUnavailable)
    }

    /// Fetches the cluster member directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MembersUnavailable`] on transport failures, non-success
    /// responses and undecodable bodies.
    pub async fn member_list(&self) -> Result<MemberListResponse> {
        self.post(MEMBER_LIST_PATH)
            .await
            .map_err(Error::MembersUnavailable)
    }

    /// Finds the current leader and returns the host of its first client URL.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The status request fails
    /// - The cluster has no leader
    /// - The member list request fails
    /// - The leader is missing from the member list or has no client URL
    /// - The leader's first client URL is not `[scheme://]host:port`
    pub async fn locate_leader(&self) -> Result<String> {
        let status = self.status().await?;

        if status.leader.is_empty() {
            return Err(Error::NoLeader);
        }

        debug!(leader_id = %status.leader, "cluster status received");

        let members = self.member_list().await?.members;

        debug!(count = members.len(), "member list received");

        resolve_leader_address(&members, &status.leader)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> reqwest::Result<T> {
        let url = format!("{}{}", self.endpoint.as_str().trim_end_matches('/'), path);

        self.client
            .post(url)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }
}

/// Resolves the host of the member whose ID is `leader_id`.
///
/// Only the first client URL is considered.
///
/// # Errors
///
/// Returns [`Error::LeaderAddressMissing`] if no member matches or the match
/// has no client URL, and [`Error::MalformedAddress`] if the first client URL
/// does not split into exactly a host and a port.
pub fn resolve_leader_address(members: &[Member], leader_id: &str) -> Result<String> {
    let url = members
        .iter()
        .find(|member| member.id == leader_id)
        .and_then(|member| member.client_urls.first())
        .ok_or_else(|| Error::LeaderAddressMissing(leader_id.to_string()))?;

    let without_scheme = url.split_once("://").map_or(url.as_str(), |(_, rest)| rest);

    match without_scheme.split(':').collect::<Vec<_>>().as_slice() {
        [host, _port] if !host.is_empty() => Ok((*host).to_string()),
        _ => Err(Error::MalformedAddress(url.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::Json;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::{MethodRouter, post};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    fn member(id: &str, client_urls: &[&str]) -> Member {
        Member {
            id: id.to_string(),
            name: format!("node-{id}"),
            peer_urls: vec![],
            client_urls: client_urls.iter().map(ToString::to_string).collect(),
            is_learner: false,
        }
    }

    fn reply(body: Value) -> MethodRouter {
        post(move || {
            let body = body.clone();
            async move { Json(body) }
        })
    }

    async fn serve(router: Router) -> EtcdClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        EtcdClient::with_client(
            Client::new(),
            Url::parse(&format!("http://{addr}")).unwrap(),
        )
    }

    fn status_body(leader: &str) -> Value {
        json!({
            "header": {
                "cluster_id": "14841639068965178418",
                "member_id": "10276657743932975437",
                "revision": "42",
                "raft_term": "3"
            },
            "version": "3.5.9",
            "dbSize": "20480",
            "leader": leader,
            "raftIndex": "120",
            "raftTerm": "3",
            "raftAppliedIndex": "120",
            "dbSizeInUse": "16384"
        })
    }

    fn members_body() -> Value {
        json!({
            "header": { "cluster_id": "14841639068965178418" },
            "members": [
                {
                    "ID": "m1",
                    "name": "node-1",
                    "peerURLs": ["https://10.0.0.1:2380"],
                    "clientURLs": ["https://10.0.0.1:2379"]
                },
                {
                    "ID": "m2",
                    "name": "node-2",
                    "peerURLs": ["https://10.0.0.2:2380"],
                    "clientURLs": ["https://10.0.0.2:2379"]
                }
            ]
        })
    }

    #[test]
    fn test_resolve_picks_leader() {
        let members = vec![
            member("m1", &["https://10.0.0.1:2379"]),
            member("m2", &["https://10.0.0.2:2379"]),
        ];

        assert_eq!(resolve_leader_address(&members, "m2").unwrap(), "10.0.0.2");
    }

    #[test]
    fn test_resolve_first_url_wins() {
        let members = vec![member(
            "m1",
            &["https://10.0.0.1:2379", "https://192.168.0.1:2379"],
        )];

        assert_eq!(resolve_leader_address(&members, "m1").unwrap(), "10.0.0.1");
    }

    #[test]
    fn test_resolve_without_scheme() {
        let members = vec![member("m1", &["etcd-0.internal:2379"])];

        assert_eq!(
            resolve_leader_address(&members, "m1").unwrap(),
            "etcd-0.internal"
        );
    }

    #[test]
    fn test_resolve_empty_client_urls() {
        let members = vec![member("m1", &["https://10.0.0.1:2379"]), member("m2", &[])];

        let err = resolve_leader_address(&members, "m2").unwrap_err();

        assert!(matches!(err, Error::LeaderAddressMissing(id) if id == "m2"));
    }

    #[test]
    fn test_resolve_unknown_leader() {
        let members = vec![member("m1", &["https://10.0.0.1:2379"])];

        let err = resolve_leader_address(&members, "m9").unwrap_err();

        assert!(matches!(err, Error::LeaderAddressMissing(_)));
    }

    #[test]
    fn test_resolve_malformed() {
        for url in ["https://10.0.0.1", "https://[fd00::1]:2379", "https://:2379"] {
            let members = vec![member("m1", &[url])];

            let err = resolve_leader_address(&members, "m1").unwrap_err();

            assert!(matches!(err, Error::MalformedAddress(u) if u == url));
        }
    }

    #[test]
    fn test_decode_sparse_member() {
        // Unstarted members have no name and no client URLs.
        let body = json!({ "members": [{ "ID": "m3", "peerURLs": ["https://10.0.0.3:2380"] }] });

        let response: MemberListResponse = serde_json::from_value(body).unwrap();

        assert_eq!(response.members[0].id, "m3");
        assert!(response.members[0].client_urls.is_empty());
        assert!(response.members[0].name.is_empty());
    }

    #[tokio::test]
    async fn test_locate_leader() {
        let client = serve(
            Router::new()
                .route(STATUS_PATH, reply(status_body("m2")))
                .route(MEMBER_LIST_PATH, reply(members_body())),
        )
        .await;

        assert_eq!(client.locate_leader().await.unwrap(), "10.0.0.2");
    }

    #[tokio::test]
    async fn test_locate_no_leader() {
        let client = serve(
            Router::new()
                .route(STATUS_PATH, reply(json!({ "version": "3.5.9" })))
                .route(MEMBER_LIST_PATH, reply(members_body())),
        )
        .await;

        assert!(matches!(client.locate_leader().await, Err(Error::NoLeader)));
    }

    #[tokio::test]
    async fn test_locate_status_error() {
        let client = serve(Router::new().route(
            STATUS_PATH,
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "etcdserver: unhealthy") }),
        ))
        .await;

        assert!(matches!(
            client.locate_leader().await,
            Err(Error::StatusUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_locate_members_unavailable() {
        let client = serve(Router::new().route(STATUS_PATH, reply(status_body("m2")))).await;

        assert!(matches!(
            client.locate_leader().await,
            Err(Error::MembersUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_locate_malformed_body() {
        let client = serve(Router::new().route(
            STATUS_PATH,
            post(|| async { "definitely not json" }),
        ))
        .await;

        assert!(matches!(
            client.locate_leader().await,
            Err(Error::StatusUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_locate_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = EtcdClient::with_client(
            Client::new(),
            Url::parse(&format!("http://{addr}")).unwrap(),
        );

        assert!(matches!(
            client.locate_leader().await,
            Err(Error::StatusUnavailable(_))
        ));
    }
}
