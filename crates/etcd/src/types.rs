use serde::Deserialize;

/// Response header attached to every etcd reply.
///
/// The JSON gateway renders 64-bit integers as strings and omits zero values.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResponseHeader {
    /// ID of the cluster.
    pub cluster_id: String,

    /// ID of the member that answered.
    pub member_id: String,

    /// Key-value store revision.
    pub revision: String,

    /// Raft term of the answering member.
    pub raft_term: String,
}

/// Reply of `/v3/maintenance/status`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusResponse {
    /// Response header.
    pub header: ResponseHeader,

    /// Server version.
    pub version: String,

    /// Backend database size in bytes.
    pub db_size: String,

    /// Member ID of the current leader, empty when there is none.
    pub leader: String,

    /// Current raft index.
    pub raft_index: String,

    /// Current raft term.
    pub raft_term: String,

    /// Last applied raft index.
    pub raft_applied_index: String,

    /// Bytes of the backend database logically in use.
    pub db_size_in_use: String,
}

/// A single cluster member.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Member {
    /// Member ID.
    #[serde(rename = "ID")]
    pub id: String,

    /// Human readable name, empty until the member has started.
    pub name: String,

    /// URLs used for peer traffic.
    #[serde(rename = "peerURLs")]
    pub peer_urls: Vec<String>,

    /// URLs clients connect to, empty until the member has started.
    #[serde(rename = "clientURLs")]
    pub client_urls: Vec<String>,

    /// Whether the member is a non-voting learner.
    #[serde(rename = "isLearner")]
    pub is_learner: bool,
}

/// Reply of `/v3/cluster/member/list`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MemberListResponse {
    /// Response header.
    pub header: ResponseHeader,

    /// All members of the cluster.
    pub members: Vec<Member>,
}
