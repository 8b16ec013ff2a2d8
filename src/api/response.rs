use serde::Serialize;

/// Standard response envelope. Every envelope carries the request id it
/// pertains to, so clients can correlate async work.
#[derive(Serialize, Debug)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub request_id: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(request_id: impl Into<String>, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            request_id: request_id.into(),
        }
    }

    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            request_id: request_id.into(),
        }
    }
}
