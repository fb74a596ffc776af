use crate::error::ExtractError;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const IPHONE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
pub const FACEBOOK_USER_AGENT: &str =
    "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.5";

/// Fetches pages and binary assets over HTTP.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Page body as text. `user_agent` overrides the desktop browser default.
    async fn fetch_html(&self, url: &str, user_agent: Option<&str>)
        -> Result<String, ExtractError>;

    /// Raw bytes, sent with an optional `Referer`.
    async fn fetch_bytes(&self, url: &str, referer: Option<&str>)
        -> Result<Vec<u8>, ExtractError>;
}

/// [`PageFetcher`] that presents itself as a desktop browser.
pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ExtractError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DESKTOP_USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for RequestFetcher {
    async fn fetch_html(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<String, ExtractError> {
        let mut request = self.client.get(url);
        if let Some(user_agent) = user_agent {
            request = request.header(USER_AGENT, HeaderValue::from_str(user_agent)?);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        debug!("Fetched {} bytes of HTML from {}", html.len(), url);
        Ok(html)
    }

    async fn fetch_bytes(
        &self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<Vec<u8>, ExtractError> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, HeaderValue::from_str(referer)?);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
