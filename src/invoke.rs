//! Command invocation adapter.
//!
//! The single narrow wrapper around the host's inter-process call primitive.
//! Every typed API function goes through [`Invoker`], so argument shape is
//! uniform: either no arguments, or one DTO wrapped under `input`.

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ClientError;

/// Key every single-DTO command receives its payload under.
pub const INPUT_KEY: &str = "input";

/// Host-side call primitive: run `command` with `args` and return its JSON result.
///
/// Implementations must not retry, batch or time out on their own; errors are
/// returned as-is so callers see exactly what the backend reported.
pub trait Transport: Send + Sync {
    fn call<'a>(
        &'a self,
        command: &'a str,
        args: Option<Value>,
    ) -> BoxFuture<'a, Result<Value, ClientError>>;
}

/// Typed front door to a [`Transport`]. Cheap to clone.
#[derive(Clone)]
pub struct Invoker {
    transport: Arc<dyn Transport>,
}

impl Invoker {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Call a zero-argument command.
    pub async fn invoke<T: DeserializeOwned>(&self, command: &str) -> Result<T, ClientError> {
        self.dispatch(command, None).await
    }

    /// Call a single-DTO command; `input` is sent as `{ "input": <dto> }`.
    pub async fn invoke_with<I, T>(&self, command: &str, input: &I) -> Result<T, ClientError>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(input).map_err(|e| ClientError::Encode(e.to_string()))?;
        let mut args = serde_json::Map::with_capacity(1);
        args.insert(INPUT_KEY.to_string(), payload);
        self.dispatch(command, Some(Value::Object(args))).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        command: &str,
        args: Option<Value>,
    ) -> Result<T, ClientError> {
        let started = Instant::now();
        let result = self.transport.call(command, args).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let value = match result {
            Ok(value) => {
                tracing::debug!(command, elapsed_ms, "command completed");
                value
            }
            Err(e) => {
                tracing::warn!(command, elapsed_ms, error = %e, "command failed");
                return Err(e);
            }
        };

        serde_json::from_value(value).map_err(|e| ClientError::Decode {
            command: command.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct SyncInput {
        source_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        search: Option<String>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        ok: bool,
    }

    #[tokio::test]
    async fn zero_argument_commands_send_no_args() {
        let transport = ScriptedTransport::new(|_, _| Ok(json!({"ok": true})));
        let invoker = Invoker::new(transport.clone());

        let answer: Answer = invoker.invoke("get_app_settings").await.unwrap();
        assert_eq!(answer, Answer { ok: true });

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].command, "get_app_settings");
        assert!(calls[0].args.is_none());
    }

    #[tokio::test]
    async fn dto_commands_wrap_payload_under_input() {
        let transport = ScriptedTransport::new(|_, _| Ok(Value::Null));
        let invoker = Invoker::new(transport.clone());

        let input = SyncInput {
            source_id: 7,
            search: None,
        };
        let _: () = invoker.invoke_with("sync_feed_source_now", &input).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].args, Some(json!({"input": {"sourceId": 7}})));
    }

    #[tokio::test]
    async fn backend_errors_propagate_unchanged() {
        let transport =
            ScriptedTransport::new(|_, _| Err(ClientError::backend("Feed source not found")));
        let invoker = Invoker::new(transport);

        let err = invoker.invoke::<Value>("list_feed_sources").await.unwrap_err();
        assert_eq!(err, ClientError::backend("Feed source not found"));
    }

    #[tokio::test]
    async fn mismatched_response_is_a_decode_error() {
        let transport = ScriptedTransport::new(|_, _| Ok(json!("not an object")));
        let invoker = Invoker::new(transport);

        let err = invoker.invoke::<Answer>("list_ideas").await.unwrap_err();
        match err {
            ClientError::Decode { command, .. } => assert_eq!(command, "list_ideas"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
