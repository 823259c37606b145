//! Wire types for the push delivery provider (FCM legacy HTTP protocol).

use serde::{Deserialize, Serialize};

/// Notification section of a push message.
#[derive(Debug, Clone, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

/// One push message addressed to a single registration token.
#[derive(Debug, Clone, Serialize)]
pub struct FcmMessage {
    pub to: String,
    pub notification: FcmNotification,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

/// Provider response for a single-token send.
#[derive(Debug, Clone, Deserialize)]
pub struct FcmResponse {
    #[serde(default)]
    pub success: i64,
    #[serde(default)]
    pub failure: i64,
    #[serde(default)]
    pub results: Vec<FcmResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FcmResult {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FcmResponse {
    /// First error code in the result list, if any.
    pub fn first_error(&self) -> Option<&str> {
        self.results.iter().find_map(|r| r.error.as_deref())
    }
}

/// Error codes the provider documents as "this token is dead; stop sending".
/// Anything else is treated as transient and left for the next cycle.
pub fn is_permanent_error_code(code: &str) -> bool {
    matches!(
        code,
        "NotRegistered" | "InvalidRegistration" | "MissingRegistration"
    )
}
