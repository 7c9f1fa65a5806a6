//! In-memory transport for unit tests.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ClientError;
use crate::invoke::{Invoker, Transport};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub command: String,
    pub args: Option<Value>,
}

type Handler =
    dyn Fn(String, Option<Value>) -> BoxFuture<'static, Result<Value, ClientError>> + Send + Sync;

/// Records every call and answers it through a handler closure.
pub(crate) struct ScriptedTransport {
    calls: Mutex<Vec<RecordedCall>>,
    handler: Box<Handler>,
}

impl ScriptedTransport {
    /// Answer synchronously.
    pub(crate) fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&str, Option<&Value>) -> Result<Value, ClientError> + Send + Sync + 'static,
    {
        Self::with_async(move |command, args| {
            let result = handler(&command, args.as_ref());
            async move { result }.boxed()
        })
    }

    /// Answer with a future, so tests can control completion order.
    pub(crate) fn with_async<F>(handler: F) -> Arc<Self>
    where
        F: Fn(String, Option<Value>) -> BoxFuture<'static, Result<Value, ClientError>>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        })
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub(crate) fn calls_to(&self, command: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.command == command)
            .cloned()
            .collect()
    }

    pub(crate) fn invoker(self: &Arc<Self>) -> Invoker {
        Invoker::new(self.clone())
    }
}

impl Transport for ScriptedTransport {
    fn call<'a>(
        &'a self,
        command: &'a str,
        args: Option<Value>,
    ) -> BoxFuture<'a, Result<Value, ClientError>> {
        self.calls.lock().push(RecordedCall {
            command: command.to_string(),
            args: args.clone(),
        });
        (self.handler)(command.to_string(), args)
    }
}

/// Unwrap the `input` DTO of a recorded call.
pub(crate) fn input_of(call: &RecordedCall) -> Value {
    call.args
        .as_ref()
        .and_then(|a| a.get(crate::invoke::INPUT_KEY))
        .cloned()
        .unwrap_or(Value::Null)
}
