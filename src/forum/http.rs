use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::types::{CourseStatistics, PostRef, RawPost};
use super::{ForumSource, SourceError};
use crate::config::Config;
use crate::constants::SYNC_USER_AGENT;

/// Forum source backed by the upstream JSON API.
#[derive(Debug, Clone)]
pub struct HttpForumSource {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    posts: Vec<PostRef>,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    post_ids: Vec<i64>,
}

impl HttpForumSource {
    /// Build a source client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(SYNC_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.forum_base_url.trim_end_matches('/').to_string(),
            api_token: config.forum_api_token.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        debug!(url, "Fetching from forum API");

        let mut request = self.client.get(url).query(query);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ForumSource for HttpForumSource {
    async fn get_changes(
        &self,
        course_id: &str,
        since: &str,
    ) -> Result<Vec<PostRef>, SourceError> {
        let url = format!("{}/api/v1/courses/{course_id}/feed", self.base_url);
        let feed: FeedResponse = self.get_json(&url, &[("since", since)]).await?;
        Ok(feed.posts)
    }

    async fn get_full_id_listing(&self, course_id: &str) -> Result<HashSet<i64>, SourceError> {
        let url = format!("{}/api/v1/courses/{course_id}/posts", self.base_url);
        let listing: ListingResponse = self.get_json(&url, &[]).await?;
        Ok(listing.post_ids.into_iter().collect())
    }

    async fn get_post_detail(
        &self,
        course_id: &str,
        post_id: i64,
    ) -> Result<RawPost, SourceError> {
        let url = format!(
            "{}/api/v1/courses/{course_id}/posts/{post_id}",
            self.base_url
        );

        match self.get_json(&url, &[]).await {
            Ok(raw) => Ok(raw),
            // The API distinguishes gone-for-good from transient failures.
            Err(SourceError::Http { status: 404 | 410 }) => {
                Err(SourceError::NotFound { post_id })
            }
            Err(SourceError::Http { status: 401 | 403 }) => {
                Err(SourceError::Forbidden { post_id })
            }
            Err(e) => Err(e),
        }
    }

    async fn get_statistics(&self, course_id: &str) -> Result<CourseStatistics, SourceError> {
        let url = format!("{}/api/v1/courses/{course_id}/stats", self.base_url);
        self.get_json(&url, &[]).await
    }
}
