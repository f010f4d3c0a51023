use serde::Deserialize;

/// Body of `POST /api/login`. Missing fields default to empty strings
/// so the gate can answer with its own message instead of a
/// deserialization error.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}
