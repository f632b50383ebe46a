// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Wikipedia intro enrichment.
//!
//! Secondary, more expensive fetch that resolves a Wikipedia article URL to
//! the plain-text introduction of that article, via the MediaWiki extracts
//! API of the language edition the URL points at. The reconciliation engine
//! attaches the text to detailed remote events before merging; failures
//! here never fail the surrounding call.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::SourceError;
use crate::config::EngineConfig;

/// Resolves an article URL to its plain-text introduction.
#[async_trait]
pub trait IntroSource: Send + Sync {
    async fn article_intro(&self, article_url: &str) -> Result<String, SourceError>;
}

/// [`IntroSource`] backed by the MediaWiki extracts API.
pub struct WikipediaIntroSource {
    client: reqwest::Client,
}

impl WikipediaIntroSource {
    pub fn new(config: &EngineConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Turn an article URL such as
    /// `https://en.wikipedia.org/wiki/International_Day_of_Happiness` into
    /// the extracts API request for that language edition. The title is
    /// kept as it appears in the path, already percent-encoded.
    fn extracts_url(article_url: &str) -> Result<String, SourceError> {
        let url = Url::parse(article_url)
            .map_err(|e| SourceError::Malformed(format!("bad article url '{article_url}': {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| SourceError::Malformed(format!("no host in '{article_url}'")))?;
        let language = host.strip_suffix(".wikipedia.org").ok_or_else(|| {
            SourceError::Malformed(format!("'{article_url}' is not a wikipedia article"))
        })?;
        let title = url.path().strip_prefix("/wiki/").ok_or_else(|| {
            SourceError::Malformed(format!("'{article_url}' is not an article path"))
        })?;
        if language.is_empty() || title.is_empty() {
            return Err(SourceError::Malformed(format!(
                "'{article_url}' is not a wikipedia article"
            )));
        }

        Ok(format!(
            "https://{language}.wikipedia.org/w/api.php\
             ?action=query&format=json&formatversion=2\
             &prop=extracts&exintro=1&explaintext=1&titles={title}"
        ))
    }

    fn parse_extract(body: &Value) -> Result<String, SourceError> {
        body.pointer("/query/pages/0/extract")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| SourceError::Malformed("missing query.pages[0].extract".into()))
    }
}

#[async_trait]
impl IntroSource for WikipediaIntroSource {
    async fn article_intro(&self, article_url: &str) -> Result<String, SourceError> {
        let request_url = Self::extracts_url(article_url)?;
        debug!(article_url, "fetching article intro");

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        Self::parse_extract(&body)
    }
}
