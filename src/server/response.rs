//! Response envelope wrapped around every lookup answer

use crate::database::GeoData;
use serde::Serialize;

/// Message of the envelope returned for a malformed `:ip`
pub const INVALID_IP_MESSAGE: &str = "unable to decode ip";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{status, message, data}` envelope; `data` only ever accompanies success
#[derive(Debug, Clone, Serialize)]
pub struct JsonResponse {
    status: Status,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<GeoData>,
}

impl JsonResponse {
    pub fn success(data: GeoData) -> Self {
        Self {
            status: Status::Success,
            message: "OK".to_string(),
            data: Some(data),
        }
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            data: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
