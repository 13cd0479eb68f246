use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct AuthRequestClientEnvironment {
    #[serde(rename = "APPLICATION")]
    pub application: String,
    #[serde(rename = "OS")]
    pub os: String,
    #[serde(rename = "OS_VERSION")]
    pub os_version: String,
    #[serde(rename = "OCSP_MODE", skip_serializing_if = "Option::is_none")]
    pub ocsp_mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthRequestData {
    #[serde(rename = "CLIENT_APP_ID")]
    pub client_app_id: String,
    #[serde(rename = "CLIENT_APP_VERSION")]
    pub client_app_version: String,
    #[serde(rename = "ACCOUNT_NAME")]
    pub account_name: String,
    #[serde(rename = "LOGIN_NAME")]
    pub login_name: String,
    #[serde(rename = "PASSWORD")]
    pub password: String,
    #[serde(rename = "AUTHENTICATOR")]
    pub authenticator: String,
    #[serde(rename = "CLIENT_ENVIRONMENT")]
    pub client_environment: AuthRequestClientEnvironment,
}

#[derive(Debug, Serialize)]
pub struct AuthRequest {
    pub data: AuthRequestData,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthResponseData {
    pub token: Option<String>,
    #[serde(rename = "masterToken")]
    pub master_token: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<i64>,
    #[serde(rename = "serverVersion")]
    pub server_version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub data: Option<AuthResponseData>,
    pub message: Option<String>,
    pub code: Option<String>,
    pub success: bool,
}

/// Body returned by session maintenance endpoints such as `/session?delete=true`.
#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub message: Option<String>,
    pub code: Option<String>,
    pub success: bool,
}
