//! Ideas and writings.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use super::{lenient_count, IdInput};
use crate::error::ClientError;
use crate::invoke::Invoker;

/// Semantic priority of an idea.
///
/// The backend stores priority as a number; this layer only ever exposes the label.
///
/// | code | label |
/// |---|---|
/// | 0 | `low` |
/// | 1 | `medium` |
/// | 2 | `high` |
/// | 3 | `urgent` |
///
/// Codes outside the table read as `medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Priority::Low,
            2 => Priority::High,
            3 => Priority::Urgent,
            _ => Priority::Medium,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

/// Serializes as the label, the shape views (and the cache) see.
impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Accepts the backend's numeric code or an already-mapped label.
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PriorityVisitor;

        impl<'de> Visitor<'de> for PriorityVisitor {
            type Value = Priority;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a priority code or label")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Priority, E> {
                Ok(Priority::from_code(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Priority, E> {
                Ok(Priority::from_code(i64::try_from(v).unwrap_or(i64::MAX)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Priority, E> {
                Ok(Priority::from_code(v as i64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Priority, E> {
                Priority::from_label(v)
                    .or_else(|| v.trim().parse::<i64>().ok().map(Priority::from_code))
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Priority, E> {
                Ok(Priority::default())
            }
        }

        deserializer.deserialize_any(PriorityVisitor)
    }
}

/// Outgoing priority: always the numeric code.
fn priority_code<S: Serializer>(priority: &Option<Priority>, serializer: S) -> Result<S::Ok, S::Error> {
    match priority {
        Some(p) => serializer.serialize_i64(p.code()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "super::lenient_bool")]
    pub archived: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIdeaInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "priority_code")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIdeaMetadataInput {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "priority_code")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Writing {
    pub id: i64,
    #[serde(default)]
    pub idea_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub writing_type: String,
    #[serde(default)]
    pub status: String,
    /// Editor document (delta ops) as stored by the backend.
    #[serde(default)]
    pub content_json: Option<Value>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub word_count: u64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idea_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWritingInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idea_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writing_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftInput {
    pub writing_id: i64,
    pub content_json: Value,
}

pub async fn list_ideas(invoker: &Invoker) -> Result<Vec<Idea>, ClientError> {
    invoker.invoke("list_ideas").await
}

pub async fn get_idea(invoker: &Invoker, id: i64) -> Result<Idea, ClientError> {
    invoker.invoke_with("get_idea", &IdInput { id }).await
}

pub async fn create_idea(invoker: &Invoker, input: &CreateIdeaInput) -> Result<Idea, ClientError> {
    invoker.invoke_with("create_idea", input).await
}

pub async fn update_idea_metadata(
    invoker: &Invoker,
    input: &UpdateIdeaMetadataInput,
) -> Result<Idea, ClientError> {
    invoker.invoke_with("update_idea_metadata", input).await
}

/// Older name for [`update_idea_metadata`]; same command, same nested payload.
pub async fn update_idea(
    invoker: &Invoker,
    input: &UpdateIdeaMetadataInput,
) -> Result<Idea, ClientError> {
    update_idea_metadata(invoker, input).await
}

pub async fn archive_idea(invoker: &Invoker, id: i64) -> Result<Idea, ClientError> {
    invoker.invoke_with("archive_idea", &IdInput { id }).await
}

pub async fn delete_idea(invoker: &Invoker, id: i64) -> Result<(), ClientError> {
    invoker.invoke_with("delete_idea", &IdInput { id }).await
}

pub async fn list_writings(
    invoker: &Invoker,
    filter: &WritingFilter,
) -> Result<Vec<Writing>, ClientError> {
    invoker.invoke_with("list_writings", filter).await
}

pub async fn get_writing(invoker: &Invoker, id: i64) -> Result<Writing, ClientError> {
    invoker.invoke_with("get_writing", &IdInput { id }).await
}

pub async fn create_writing(
    invoker: &Invoker,
    input: &CreateWritingInput,
) -> Result<Writing, ClientError> {
    invoker.invoke_with("create_writing", input).await
}

pub async fn save_writing_draft(invoker: &Invoker, input: &SaveDraftInput) -> Result<(), ClientError> {
    invoker.invoke_with("save_writing_draft", input).await
}

pub async fn publish_writing(invoker: &Invoker, id: i64) -> Result<Writing, ClientError> {
    invoker.invoke_with("publish_writing", &IdInput { id }).await
}
