use serde::{Deserialize, Serialize};

/// Uniform result shape returned to API consumers.
///
/// `is_success` is the authoritative outcome; `status_code` is mirrored as the
/// HTTP status of the response carrying the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope<T> {
    pub data: Option<T>,
    pub is_success: bool,
    pub status_code: u16,
    pub message: Option<String>,
    pub description: Option<String>,
}

impl<T> ResponseEnvelope<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            is_success: true,
            status_code: 200,
            message: Some(message.into()),
            description: None,
        }
    }

    pub fn failure(
        status_code: u16,
        message: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            data: None,
            is_success: false,
            status_code,
            message: Some(message.into()),
            description: Some(description.into()),
        }
    }
}
