//! Request and response payloads shared by the handlers and the integration tests.

use core_access::User;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_true() -> bool {
    true
}

// --- General ---

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// --- Users ---

#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The public view of an account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct EmailAvailability {
    pub email: String,
    pub available: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UsernameAvailability {
    pub username: String,
    pub available: bool,
}

// --- Materials ---

#[derive(Serialize, Deserialize, Debug)]
pub struct IngestTextRequest {
    #[serde(default)]
    pub text: String,
}

// --- Frameworks ---

#[derive(Serialize, Deserialize, Debug)]
pub struct TextGenerateRequest {
    pub text: String,
    /// `true` skips the seed pipeline and sends structure-only metadata.
    #[serde(default = "default_true")]
    pub use_global_llm: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct FileGenerateParams {
    /// `false` skips the framework model and uses the mock builder.
    #[serde(default = "default_true")]
    pub use_global_llm: bool,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GenerateResponse {
    pub success: bool,
    pub framework_id: Option<String>,
    pub framework: Option<Value>,
    pub frameworks: Option<Vec<Value>>,
    pub metadata: Option<Value>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateFrameworkResponse {
    pub success: bool,
    pub message: String,
    pub framework_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RegenerateRequest {
    pub framework: Value,
    #[serde(default)]
    pub use_local: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RegenerateResponse {
    pub success: bool,
    pub framework: Value,
    /// `"local"` or `"cloud"`.
    pub method: String,
    pub message: String,
}
