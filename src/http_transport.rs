//! [`Transport`] over the desktop backend's loopback HTTP command bridge.
//!
//! Wire shape: `POST {endpoint}/invoke/{command}` with the args object as the
//! JSON body (`{}` for zero-argument commands). A 2xx body is the command's
//! result; anything else carries `{"error": "<message>"}`.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::invoke::Transport;

pub struct HttpTransport {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            auth_token,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.endpoint.clone(), config.auth_token.clone())
    }

    fn command_url(&self, command: &str) -> String {
        format!("{}/invoke/{}", self.base_url, command)
    }

    async fn post(&self, command: &str, args: Option<Value>) -> Result<Value, ClientError> {
        let body = args.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let mut request = self.client.post(self.command_url(command)).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ClientError::Backend {
                status: Some(status.as_u16()),
                message: error_message(&text, status),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ClientError::Decode {
            command: command.to_string(),
            message: format!("invalid JSON body: {e}"),
        })
    }
}

/// Pull the backend's message out of an error body, falling back to the raw text.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    if let Some(msg) = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.as_str())
    {
        return msg.to_string();
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

impl Transport for HttpTransport {
    fn call<'a>(
        &'a self,
        command: &'a str,
        args: Option<Value>,
    ) -> BoxFuture<'a, Result<Value, ClientError>> {
        self.post(command, args).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn posts_args_and_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invoke/list_news_articles")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"input": {"limit": 50}})))
            .with_status(200)
            .with_body(r#"[{"id":1}]"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url(), None);
        let value = transport
            .call("list_news_articles", Some(json!({"input": {"limit": 50}})))
            .await
            .unwrap();

        assert_eq!(value, json!([{"id": 1}]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn zero_argument_commands_send_empty_object() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invoke/list_ideas")
            .match_body(Matcher::Json(json!({})))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let transport = HttpTransport::new(format!("{}/", server.url()), None);
        assert_eq!(transport.call("list_ideas", None).await.unwrap(), json!([]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_body_is_null() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invoke/delete_idea")
            .with_status(200)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url(), None);
        let value = transport
            .call("delete_idea", Some(json!({"input": {"id": 3}})))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn sends_bearer_token_when_configured() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invoke/get_app_settings")
            .match_header("authorization", "Bearer s3cret")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let config = ClientConfig {
            endpoint: server.url(),
            auth_token: Some("s3cret".into()),
            ..ClientConfig::default()
        };
        let transport = HttpTransport::from_config(&config);
        transport.call("get_app_settings", None).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_body_becomes_backend_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invoke/restore_database_from_backup")
            .with_status(500)
            .with_body(r#"{"error":"Backup file is corrupt"}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url(), None);
        let err = transport
            .call("restore_database_from_backup", Some(json!({"input": {}})))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ClientError::Backend {
                status: Some(500),
                message: "Backup file is corrupt".into()
            }
        );
    }

    #[tokio::test]
    async fn unparseable_error_body_uses_raw_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invoke/list_ideas")
            .with_status(404)
            .with_body("no such command")
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url(), None);
        let err = transport.call("list_ideas", None).await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Backend {
                status: Some(404),
                message: "no such command".into()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        // Port 9 (discard) is closed on loopback in practice
        let transport = HttpTransport::new("http://127.0.0.1:9", None);
        let err = transport.call("list_ideas", None).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
