use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage key for the logged-in user record.
pub const SESSION_USER_KEY: &str = "user";
/// Storage key for the authentication marker.
pub const SESSION_AUTH_FLAG_KEY: &str = "auth_status";
/// The only value the marker may hold.
pub const SESSION_AUTH_FLAG_VALUE: &str = "authenticated";

/// An authenticated user as persisted in the session store and echoed
/// back to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub email: String,
    pub name: String,
    pub login_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_keys() {
        let session = UserSession {
            email: "ana@g.globo".to_string(),
            name: "Ana".to_string(),
            login_time: Utc::now(),
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["email"], "ana@g.globo");
        assert!(value.get("loginTime").is_some());
        assert!(value.get("login_time").is_none());
    }
}
