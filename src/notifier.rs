use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::X_API_BASE;

/// Confirmation of a published post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    /// Platform id of the post; `None` when nothing was actually published.
    pub id: Option<String>,
}

/// Destination for rendered announcements.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish `text`. `Ok` means the post went out.
    async fn post(&self, text: &str) -> Result<PostReceipt>;
}

/// Posts to X through the v2 API with an OAuth 2.0 user-context token.
#[derive(Debug, Clone)]
pub struct XClient {
    http: Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Serialize)]
struct CreatePostRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: String,
}

/// The account behind an access token.
#[derive(Debug, Clone, Deserialize)]
pub struct XUser {
    pub id: String,
    pub name: String,
    pub username: String,
}

impl XClient {
    pub fn new(http: Client, access_token: String) -> Self {
        Self::with_base_url(http, X_API_BASE.to_string(), access_token)
    }

    pub fn with_base_url(http: Client, base_url: String, access_token: String) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// `GET /2/users/me`: verifies the token and returns the account.
    pub async fn me(&self) -> Result<XUser> {
        let url = self.url("/2/users/me");
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("X API request failed: {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("X API non-2xx: {status} body={text}");
        }
        let body: DataEnvelope<XUser> = resp.json().await.context("failed to decode X user")?;
        Ok(body.data)
    }
}

#[async_trait]
impl Notifier for XClient {
    async fn post(&self, text: &str) -> Result<PostReceipt> {
        let url = self.url("/2/tweets");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&CreatePostRequest { text })
            .send()
            .await
            .with_context(|| format!("X API request failed: {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("X API non-2xx: {status} body={body}");
        }
        let body: DataEnvelope<CreatedPost> =
            resp.json().await.context("failed to decode created post")?;
        info!("Posted https://x.com/i/status/{}", body.data.id);
        Ok(PostReceipt {
            id: Some(body.data.id),
        })
    }
}

/// Dry-run sink: logs what would have been posted.
#[derive(Debug, Default)]
pub struct LogNotifier {
    posted: Mutex<Vec<String>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts "posted" so far.
    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn post(&self, text: &str) -> Result<PostReceipt> {
        info!("DRY RUN - would post:\n{text}");
        if let Ok(mut posted) = self.posted.lock() {
            posted.push(text.to_string());
        }
        Ok(PostReceipt { id: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_records_text() {
        let sink = LogNotifier::new();
        let receipt = sink.post("⚾ hello").await.unwrap();
        assert_eq!(receipt, PostReceipt { id: None });
        assert_eq!(sink.posted(), vec!["⚾ hello".to_string()]);
    }

    #[test]
    fn url_joins_without_double_slash() {
        let c = XClient::with_base_url(Client::new(), "http://localhost:9/".into(), "t".into());
        assert_eq!(c.url("/2/tweets"), "http://localhost:9/2/tweets");
    }

    #[test]
    fn created_post_envelope_parses() {
        let body: DataEnvelope<CreatedPost> =
            serde_json::from_str(r#"{"data":{"id":"1790","text":"hi"}}"#).unwrap();
        assert_eq!(body.data.id, "1790");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_error() {
        let c = XClient::with_base_url(Client::new(), "http://127.0.0.1:1".into(), "t".into());
        assert!(c.post("x").await.is_err());
    }
}
