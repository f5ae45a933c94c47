use serde::{Deserialize, Serialize};

/// Stored value for one like: `likes:{user}:{item}` → `{ "likedAt": ms }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRecord {
    pub liked_at: i64,
}

/// Response of a toggle or remove call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikedResponse {
    pub liked: bool,
}

/// Response of a list call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikesResponse {
    pub likes: Vec<String>,
}
