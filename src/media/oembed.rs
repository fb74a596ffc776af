use crate::config::OEmbedConfig;
use crate::error::ExtractError;
use crate::model::VideoMetadata;
use crate::platform::Platform;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Lightweight public metadata lookup.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Never fails: any problem yields empty metadata.
    async fn fetch_oembed(&self, url: &str, platform: Platform) -> VideoMetadata;
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    thumbnail_url: Option<String>,
    author_name: Option<String>,
}

pub struct OEmbedFetcher {
    client: Client,
    config: OEmbedConfig,
}

impl OEmbedFetcher {
    pub fn new(config: &OEmbedConfig) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn request(
        &self,
        url: &str,
        platform: Platform,
    ) -> Result<Option<OEmbedResponse>, ExtractError> {
        let request = match platform {
            Platform::Youtube => self
                .client
                .get(&self.config.youtube_endpoint)
                .query(&[("format", "json"), ("url", url)]),
            Platform::Tiktok => self
                .client
                .get(&self.config.tiktok_endpoint)
                .query(&[("url", url)]),
            Platform::Instagram => {
                let Some(token) = self.config.instagram_token.as_deref() else {
                    warn!("Instagram oEmbed token not configured");
                    return Ok(None);
                };
                self.client
                    .get(&self.config.instagram_endpoint)
                    .query(&[("url", url), ("access_token", token)])
            }
            Platform::Web => return Ok(None),
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ExtractError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(Some(response.json().await?))
    }
}

#[async_trait]
impl MetadataFetcher for OEmbedFetcher {
    async fn fetch_oembed(&self, url: &str, platform: Platform) -> VideoMetadata {
        match self.request(url, platform).await {
            Ok(Some(data)) => {
                debug!("oEmbed for {}: {:?}", url, data);
                VideoMetadata {
                    title: data.title,
                    thumbnail: data.thumbnail_url,
                    uploader: data.author_name,
                    ..Default::default()
                }
            }
            Ok(None) => VideoMetadata::default(),
            Err(e) => {
                warn!("oEmbed fetch failed for {}: {}", platform.as_str(), e);
                VideoMetadata::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn fetcher(server_url: &str, token: Option<&str>) -> OEmbedFetcher {
        OEmbedFetcher::new(&OEmbedConfig {
            youtube_endpoint: format!("{}/oembed", server_url),
            tiktok_endpoint: format!("{}/tiktok/oembed", server_url),
            instagram_endpoint: format!("{}/instagram_oembed", server_url),
            instagram_token: token.map(str::to_string),
            timeout: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_youtube_oembed() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/oembed")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded(
                    "url".into(),
                    "https://www.youtube.com/watch?v=abc".into(),
                ),
            ]))
            .with_status(200)
            .with_body(
                r#"{"title":"One-Pan Lemon Chicken","author_name":"Kitchen","thumbnail_url":"https://i.ytimg.com/vi/abc/hq.jpg"}"#,
            )
            .create_async()
            .await;

        let meta = fetcher(&server.url(), None)
            .fetch_oembed("https://www.youtube.com/watch?v=abc", Platform::Youtube)
            .await;

        mock.assert_async().await;
        assert_eq!(meta.title.as_deref(), Some("One-Pan Lemon Chicken"));
        assert_eq!(meta.uploader.as_deref(), Some("Kitchen"));
        assert!(meta.description.is_none());
    }

    #[tokio::test]
    async fn test_http_error_yields_empty_metadata() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/tiktok/oembed")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let meta = fetcher(&server.url(), None)
            .fetch_oembed("https://www.tiktok.com/@a/video/1", Platform::Tiktok)
            .await;
        assert!(meta.is_empty());
    }

    #[tokio::test]
    async fn test_instagram_without_token_is_skipped() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/instagram_oembed")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let meta = fetcher(&server.url(), None)
            .fetch_oembed("https://www.instagram.com/reel/X/", Platform::Instagram)
            .await;

        mock.assert_async().await;
        assert!(meta.is_empty());
    }

    #[tokio::test]
    async fn test_instagram_with_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/instagram_oembed")
            .match_query(Matcher::UrlEncoded("access_token".into(), "tok".into()))
            .with_status(200)
            .with_body(r#"{"title":"Birria tacos","thumbnail_url":"https://cdn/x.jpg"}"#)
            .create_async()
            .await;

        let meta = fetcher(&server.url(), Some("tok"))
            .fetch_oembed("https://www.instagram.com/reel/X/", Platform::Instagram)
            .await;

        mock.assert_async().await;
        assert_eq!(meta.thumbnail.as_deref(), Some("https://cdn/x.jpg"));
    }
}
