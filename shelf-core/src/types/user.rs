//! Storefront account

use serde::{Deserialize, Serialize};

/// A signed-in (mock) user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub avatar: String,
    #[serde(default)]
    pub is_admin: bool,
}
