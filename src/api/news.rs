//! News articles and feed sources (the research view).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{default_true, lenient_bool, lenient_count, IdInput};
use crate::error::ClientError;
use crate::invoke::Invoker;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: i64,
    #[serde(default)]
    pub source_id: Option<i64>,
    #[serde(default)]
    pub source_name: Option<String>,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    /// `unread`, `read`, `dismissed`, ...; owned by the backend.
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub starred: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSort {
    Newest,
    Oldest,
    Relevance,
}

/// Filters for `list_news_articles`. Every `None` field is left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticleFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<ArticleSort>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToggleStarInput {
    pub id: i64,
    pub starred: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleStatusInput {
    pub id: i64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSource {
    pub id: i64,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "lenient_count")]
    pub fetch_interval_minutes: u64,
    #[serde(default)]
    pub last_sync_at: Option<String>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub article_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedSourceInput {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_interval_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedSourceInput {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_interval_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToggleFeedSourceInput {
    pub id: i64,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSourceInput {
    pub source_id: i64,
}

/// Summary of a feed sync. Counters the backend leaves out read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    #[serde(default, deserialize_with = "lenient_count")]
    pub sources_synced: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub articles_added: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub articles_updated: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

pub async fn list_news_articles(
    invoker: &Invoker,
    filter: &NewsArticleFilter,
) -> Result<Vec<NewsArticle>, ClientError> {
    invoker.invoke_with("list_news_articles", filter).await
}

pub async fn get_news_article(invoker: &Invoker, id: i64) -> Result<NewsArticle, ClientError> {
    invoker.invoke_with("get_news_article", &IdInput { id }).await
}

pub async fn toggle_star_news_article(
    invoker: &Invoker,
    id: i64,
    starred: bool,
) -> Result<(), ClientError> {
    invoker
        .invoke_with("toggle_star_news_article", &ToggleStarInput { id, starred })
        .await
}

pub async fn update_news_article_status(
    invoker: &Invoker,
    id: i64,
    status: &str,
) -> Result<(), ClientError> {
    let input = ArticleStatusInput {
        id,
        status: status.to_string(),
    };
    invoker.invoke_with("update_news_article_status", &input).await
}

pub async fn delete_news_article(invoker: &Invoker, id: i64) -> Result<(), ClientError> {
    invoker.invoke_with("delete_news_article", &IdInput { id }).await
}

pub async fn list_feed_sources(invoker: &Invoker) -> Result<Vec<FeedSource>, ClientError> {
    invoker.invoke("list_feed_sources").await
}

/// Research-view name for [`list_feed_sources`].
pub async fn list_research_sources(invoker: &Invoker) -> Result<Vec<FeedSource>, ClientError> {
    list_feed_sources(invoker).await
}

pub async fn create_feed_source(
    invoker: &Invoker,
    input: &CreateFeedSourceInput,
) -> Result<FeedSource, ClientError> {
    invoker.invoke_with("create_feed_source", input).await
}

pub async fn update_feed_source(
    invoker: &Invoker,
    input: &UpdateFeedSourceInput,
) -> Result<FeedSource, ClientError> {
    invoker.invoke_with("update_feed_source", input).await
}

pub async fn delete_feed_source(invoker: &Invoker, id: i64) -> Result<(), ClientError> {
    invoker.invoke_with("delete_feed_source", &IdInput { id }).await
}

pub async fn toggle_feed_source(
    invoker: &Invoker,
    id: i64,
    enabled: bool,
) -> Result<FeedSource, ClientError> {
    invoker
        .invoke_with("toggle_feed_source", &ToggleFeedSourceInput { id, enabled })
        .await
}

pub async fn sync_feed_source_now(invoker: &Invoker, source_id: i64) -> Result<SyncResult, ClientError> {
    invoker
        .invoke_with("sync_feed_source_now", &SyncSourceInput { source_id })
        .await
}

/// Research-view name for [`sync_feed_source_now`].
pub async fn sync_research_source_now(
    invoker: &Invoker,
    source_id: i64,
) -> Result<SyncResult, ClientError> {
    sync_feed_source_now(invoker, source_id).await
}

pub async fn sync_all_feed_sources(invoker: &Invoker) -> Result<SyncResult, ClientError> {
    invoker.invoke("sync_all_feed_sources").await
}
