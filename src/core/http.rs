use std::time::Duration;

use reqwest::blocking::{
    Client,
    Response,
};

use crate::core::CardForgeError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub fn http_client() -> Result<Client, CardForgeError> {
    http_client_with_timeout(REQUEST_TIMEOUT)
}

pub fn http_client_with_timeout(timeout: Duration) -> Result<Client, CardForgeError> {
    Client::builder()
        .timeout(timeout)
        .user_agent("cardforge/0.3 (+reqwest)")
        .build()
        .map_err(|e| CardForgeError::Custom(format!("HTTP client build failed: {e}")))
}

/// Turns a non-2xx response into `HttpStatus`, keeping the body for the log.
pub fn ensure_success(resp: Response) -> Result<Response, CardForgeError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(CardForgeError::HttpStatus { status: status.as_u16(), body });
    }
    Ok(resp)
}
