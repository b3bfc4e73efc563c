pub(crate) mod http;
pub(crate) mod raw;

use crate::error::CheckError;
use bytes::Bytes;
use reqwest::{Method, StatusCode};
use std::borrow::Cow;

pub struct WireResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl WireResponse {
    pub fn body_str(&self) -> Cow<str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// The HTTP client abstraction scenarios talk to when they do not need
/// byte-level control over the connection.
pub trait Exchange {
    fn exchange(&self, method: Method, url: &str) -> Result<WireResponse, CheckError>;
}

#[cfg(test)]
pub(crate) struct NoopExchange;

#[cfg(test)]
impl Exchange for NoopExchange {
    fn exchange(&self, _method: Method, url: &str) -> Result<WireResponse, CheckError> {
        Err(CheckError::Connect(format!("no transport behind {}", url)))
    }
}
