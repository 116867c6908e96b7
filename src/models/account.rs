use serde::{Deserialize, Serialize};

/// Credentials sent to signup and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Result of signup or login. Only login carries an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub access_token: Option<String>,
}
