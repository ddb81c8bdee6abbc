use std::time::Duration;

use reqwest::blocking::Client;
use url::Url;

use crate::error::FetchError;

/// Long enough to survive one TCP retransmission.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(3100);

const USER_AGENT: &str = concat!("stormwords/", env!("CARGO_PKG_VERSION"));

pub fn build_client() -> Result<Client, FetchError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(FetchError::Transport)
}

pub fn parse_endpoint(raw: &str) -> Result<Url, FetchError> {
    Url::parse(raw).map_err(|e| FetchError::Malformed(format!("bad endpoint {raw}: {e}")))
}

/// Single GET, no retries. Non-2xx answers become `FetchError::HttpStatus`.
pub fn get_text(client: &Client, url: &Url) -> Result<String, FetchError> {
    tracing::debug!(url = %url, "GET");
    let resp = client.get(url.clone()).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }
    Ok(resp.text()?)
}
