//! Ideas and writings, including draft autosave.

use serde_json::Value;

use super::cached;
use crate::api::ideas::{
    self as api, CreateIdeaInput, CreateWritingInput, Idea, SaveDraftInput,
    UpdateIdeaMetadataInput, Writing, WritingFilter,
};
use crate::error::ClientError;
use crate::query::{Debounced, KeyFilter, Mutation, OptimisticUpdate, QueryClient, SaveStatus};

pub mod keys {
    use crate::api::ideas::WritingFilter;
    use crate::query::QueryKey;

    pub fn ideas() -> QueryKey {
        QueryKey::new(["ideas"])
    }

    pub fn idea(id: i64) -> QueryKey {
        ideas().push(id)
    }

    pub fn writings(filter: &WritingFilter) -> QueryKey {
        QueryKey::new(["writings"]).with_params(filter)
    }

    pub fn writing(id: i64) -> QueryKey {
        QueryKey::new(["writings", "detail"]).push(id)
    }
}

fn ideas_scope() -> KeyFilter {
    KeyFilter::prefix(["ideas"])
}

fn writings_scope() -> KeyFilter {
    KeyFilter::prefix(["writings"])
}

pub async fn ideas(client: &QueryClient) -> Result<Vec<Idea>, ClientError> {
    cached(client, keys::ideas(), || api::list_ideas(client.invoker())).await
}

pub async fn idea(client: &QueryClient, id: i64) -> Result<Idea, ClientError> {
    cached(client, keys::idea(id), || api::get_idea(client.invoker(), id)).await
}

pub async fn create_idea(client: &QueryClient, input: &CreateIdeaInput) -> Result<Idea, ClientError> {
    Mutation::new("create_idea")
        .invalidates(ideas_scope())
        .run(client, api::create_idea(client.invoker(), input))
        .await
}

pub async fn update_idea(
    client: &QueryClient,
    input: &UpdateIdeaMetadataInput,
) -> Result<Idea, ClientError> {
    Mutation::new("update_idea_metadata")
        .invalidates(ideas_scope())
        .run(client, api::update_idea_metadata(client.invoker(), input))
        .await
}

pub async fn archive_idea(client: &QueryClient, id: i64) -> Result<Idea, ClientError> {
    Mutation::new("archive_idea")
        .invalidates(ideas_scope())
        .run(client, api::archive_idea(client.invoker(), id))
        .await
}

pub async fn delete_idea(client: &QueryClient, id: i64) -> Result<(), ClientError> {
    Mutation::new("delete_idea")
        .invalidates(ideas_scope())
        .run(client, api::delete_idea(client.invoker(), id))
        .await
}

pub async fn writings(client: &QueryClient, filter: &WritingFilter) -> Result<Vec<Writing>, ClientError> {
    cached(client, keys::writings(filter), || {
        api::list_writings(client.invoker(), filter)
    })
    .await
}

pub async fn writing(client: &QueryClient, id: i64) -> Result<Writing, ClientError> {
    cached(client, keys::writing(id), || api::get_writing(client.invoker(), id)).await
}

pub async fn create_writing(
    client: &QueryClient,
    input: &CreateWritingInput,
) -> Result<Writing, ClientError> {
    Mutation::new("create_writing")
        .invalidates(writings_scope())
        .run(client, api::create_writing(client.invoker(), input))
        .await
}

pub async fn publish_writing(client: &QueryClient, id: i64) -> Result<Writing, ClientError> {
    Mutation::new("publish_writing")
        .invalidates(writings_scope())
        .run(client, api::publish_writing(client.invoker(), id))
        .await
}

/// Save a draft, showing the new content in the cached writing immediately.
///
/// No invalidation on success: the cached detail already holds what was saved.
pub async fn save_writing_draft(
    client: &QueryClient,
    writing_id: i64,
    content_json: Value,
) -> Result<(), ClientError> {
    let patched = content_json.clone();
    let update = OptimisticUpdate::new().update(keys::writing(writing_id), move |current| {
        let mut writing = current?.clone();
        writing
            .as_object_mut()?
            .insert("contentJson".to_string(), patched.clone());
        Some(writing)
    });
    let input = SaveDraftInput {
        writing_id,
        content_json,
    };
    Mutation::new("save_writing_draft")
        .optimistic(update)
        .run(client, api::save_writing_draft(client.invoker(), &input))
        .await
}

/// Debounced autosave for one open writing.
///
/// Feed every editor change to [`update`](Self::update). The content the
/// editor opened with is not saved; later edits are saved once the configured
/// quiet window passes.
pub struct DraftAutosave {
    writing_id: i64,
    inner: Debounced<Value>,
}

impl DraftAutosave {
    pub fn new(client: &QueryClient, writing_id: i64) -> Self {
        let window = client.config().autosave_debounce();
        let client = client.clone();
        let inner = Debounced::spawn(window, move |content| {
            let client = client.clone();
            async move { save_writing_draft(&client, writing_id, content).await }
        });
        Self { writing_id, inner }
    }

    pub fn writing_id(&self) -> i64 {
        self.writing_id
    }

    pub fn update(&self, content_json: Value) {
        self.inner.update(content_json);
    }

    pub fn status(&self) -> SaveStatus {
        self.inner.status()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<SaveStatus> {
        self.inner.subscribe()
    }

    /// Flush any pending edit (editor closing) and wait for the save.
    pub async fn finish(self) {
        self.inner.finish().await;
    }
}
