use crate::core::domain::value_object::serde_helpers::optional_system_time;
use serde::Serialize;
use std::time::SystemTime;

/// A user known to the access control layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    /// Full `user@realm` id.
    pub id: String,
    pub realm: String,
    pub enabled: bool,
    /// Account expiry; `None` means never.
    #[serde(with = "optional_system_time")]
    pub expires_at: Option<SystemTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRecord {
    pub id: String,
    pub privileges: Vec<String>,
    /// Built-in roles cannot be modified.
    pub built_in: bool,
}
