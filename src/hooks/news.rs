//! Research view: articles and feed sources.

use serde_json::{json, Value};

use super::cached;
use crate::api::news::{
    self as api, CreateFeedSourceInput, FeedSource, NewsArticle, NewsArticleFilter, SyncResult,
    UpdateFeedSourceInput,
};
use crate::error::ClientError;
use crate::query::{KeyFilter, Mutation, OptimisticUpdate, QueryClient};

pub mod keys {
    use crate::api::news::NewsArticleFilter;
    use crate::query::QueryKey;

    /// One entry per distinct filter.
    pub fn articles(filter: &NewsArticleFilter) -> QueryKey {
        QueryKey::new(["news", "articles"]).with_params(filter)
    }

    pub fn article(id: i64) -> QueryKey {
        QueryKey::new(["news", "article"]).push(id)
    }

    pub fn sources() -> QueryKey {
        QueryKey::new(["news", "sources"])
    }
}

fn news_scope() -> KeyFilter {
    KeyFilter::prefix(["news"])
}

fn sources_scope() -> KeyFilter {
    KeyFilter::Exact(keys::sources())
}

pub async fn news_articles(
    client: &QueryClient,
    filter: &NewsArticleFilter,
) -> Result<Vec<NewsArticle>, ClientError> {
    cached(client, keys::articles(filter), || {
        api::list_news_articles(client.invoker(), filter)
    })
    .await
}

pub async fn news_article(client: &QueryClient, id: i64) -> Result<NewsArticle, ClientError> {
    cached(client, keys::article(id), || api::get_news_article(client.invoker(), id)).await
}

pub async fn feed_sources(client: &QueryClient) -> Result<Vec<FeedSource>, ClientError> {
    cached(client, keys::sources(), || api::list_feed_sources(client.invoker())).await
}

/// Set the star flag of one article in a cached article or article list.
/// Returns `None` when the article is not in `value`.
fn with_star(value: &Value, id: i64, starred: bool) -> Option<Value> {
    let mut value = value.clone();
    let mut hit = false;
    let mut mark = |article: &mut Value| {
        if article.get("id").and_then(Value::as_i64) == Some(id) {
            article["starred"] = json!(starred);
            hit = true;
        }
    };
    if let Some(items) = value.as_array_mut() {
        items.iter_mut().for_each(&mut mark);
    } else if value.is_object() {
        mark(&mut value);
    } else {
        return None;
    }
    hit.then_some(value)
}

/// Star or unstar an article, reflecting it in every cached list right away.
pub async fn toggle_star(client: &QueryClient, id: i64, starred: bool) -> Result<(), ClientError> {
    let update = OptimisticUpdate::new()
        .update_matching(KeyFilter::prefix(["news", "articles"]), move |list| {
            with_star(list, id, starred)
        })
        .update(keys::article(id), move |current| {
            current.and_then(|article| with_star(article, id, starred))
        });

    Mutation::new("toggle_star_news_article")
        .optimistic(update)
        .invalidates(KeyFilter::prefix(["news", "articles"]))
        .invalidates(KeyFilter::Exact(keys::article(id)))
        .run(client, api::toggle_star_news_article(client.invoker(), id, starred))
        .await
}

pub async fn update_article_status(
    client: &QueryClient,
    id: i64,
    status: &str,
) -> Result<(), ClientError> {
    Mutation::new("update_news_article_status")
        .invalidates(news_scope())
        .run(client, api::update_news_article_status(client.invoker(), id, status))
        .await
}

pub async fn delete_article(client: &QueryClient, id: i64) -> Result<(), ClientError> {
    Mutation::new("delete_news_article")
        .invalidates(news_scope())
        .run(client, api::delete_news_article(client.invoker(), id))
        .await
}

pub async fn create_feed_source(
    client: &QueryClient,
    input: &CreateFeedSourceInput,
) -> Result<FeedSource, ClientError> {
    Mutation::new("create_feed_source")
        .invalidates(sources_scope())
        .run(client, api::create_feed_source(client.invoker(), input))
        .await
}

pub async fn update_feed_source(
    client: &QueryClient,
    input: &UpdateFeedSourceInput,
) -> Result<FeedSource, ClientError> {
    Mutation::new("update_feed_source")
        .invalidates(sources_scope())
        .run(client, api::update_feed_source(client.invoker(), input))
        .await
}

pub async fn delete_feed_source(client: &QueryClient, id: i64) -> Result<(), ClientError> {
    Mutation::new("delete_feed_source")
        .invalidates(sources_scope())
        .run(client, api::delete_feed_source(client.invoker(), id))
        .await
}

pub async fn toggle_feed_source(
    client: &QueryClient,
    id: i64,
    enabled: bool,
) -> Result<FeedSource, ClientError> {
    Mutation::new("toggle_feed_source")
        .invalidates(sources_scope())
        .run(client, api::toggle_feed_source(client.invoker(), id, enabled))
        .await
}

/// Sync one source now. New articles may appear in any list.
pub async fn sync_feed_source(client: &QueryClient, source_id: i64) -> Result<SyncResult, ClientError> {
    Mutation::new("sync_feed_source_now")
        .invalidates(news_scope())
        .run(client, api::sync_feed_source_now(client.invoker(), source_id))
        .await
}

pub async fn sync_all_feed_sources(client: &QueryClient) -> Result<SyncResult, ClientError> {
    Mutation::new("sync_all_feed_sources")
        .invalidates(news_scope())
        .run(client, api::sync_all_feed_sources(client.invoker()))
        .await
}
