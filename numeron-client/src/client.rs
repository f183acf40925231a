//! Game Server client: item activation and state queries over HTTP.

use std::time::{Duration, Instant};

use numeron_core::config::ServerConfig;
use numeron_core::ports::GameServer;
use numeron_core::protocol::{
    DoubleCallStatus, GameSnapshot, ItemReply, UseItemRequest, UseItemResponse,
};
use numeron_core::TransportError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ClientError;

/// HTTP client for one play session.
///
/// Holds a cookie store, so the server sees every call from the same
/// session.
#[derive(Debug, Clone)]
pub struct GameClient {
    http: Client,
    config: ServerConfig,
}

impl GameClient {
    /// Create a client for the server described by `config`.
    ///
    /// # Errors
    /// Returns [`ClientError::ConfigError`] if the HTTP client cannot be built.
    pub fn new(config: ServerConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::ConfigError(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Server configuration in use.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.request_timeout_ms)
    }

    /// Timeouts carry the configured limit; everything else goes through
    /// the generic conversion.
    fn classify(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.config.request_timeout_ms)
        } else {
            err.into()
        }
    }

    /// Submit one item activation.
    ///
    /// The body is read whatever the status: the server answers rejections
    /// with HTTP 400 and `{"error": ...}`, which is a normal
    /// [`ItemReply::Rejected`].
    ///
    /// # Errors
    /// Returns a [`ClientError`] if the request fails, times out, or the
    /// reply is neither a success body nor an error body.
    pub async fn post_use_item(&self, request: &UseItemRequest) -> Result<ItemReply, ClientError> {
        let url = self.config.endpoint(&self.config.use_item_path);
        let start = Instant::now();

        let result = self
            .http
            .post(&url)
            .json(request)
            .timeout(self.timeout())
            .send()
            .await;

        let resp = result.map_err(|e| {
            warn!(url = %url, error = %e, "Item request failed");
            self.classify(e)
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.classify(e))?;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            item = %request.item_name,
            status = status.as_u16(),
            latency_ms,
            "Item request completed"
        );

        interpret_use_item(status, text)
    }

    /// Fetch the authoritative play state.
    ///
    /// # Errors
    /// Returns a [`ClientError`] on transport, status or parse failure.
    pub async fn fetch_snapshot(&self) -> Result<GameSnapshot, ClientError> {
        self.get_json(&self.config.snapshot_path).await
    }

    /// Whether a DOUBLE follow-up call is currently allowed.
    ///
    /// # Errors
    /// Returns a [`ClientError`] on transport, status or parse failure.
    pub async fn double_call_available(&self) -> Result<bool, ClientError> {
        let status: DoubleCallStatus = self.get_json(&self.config.double_call_path).await?;
        Ok(status.double_call_available)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.config.endpoint(path);
        let start = Instant::now();
        let resp = self
            .http
            .get(&url)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "State request failed");
                self.classify(e)
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.classify(e))?;
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Game Server returned error");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(
            url = %url,
            latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Fetched Game Server state"
        );
        serde_json::from_str(&text).map_err(|e| ClientError::ParseError(e.to_string()))
    }
}

/// Turn a raw item reply into an [`ItemReply`].
fn interpret_use_item(status: StatusCode, text: String) -> Result<ItemReply, ClientError> {
    match serde_json::from_str::<UseItemResponse>(&text) {
        Ok(body) if body.is_rejection() || status.is_success() => Ok(body.into()),
        Ok(_) => Err(ClientError::Status {
            status: status.as_u16(),
            body: text,
        }),
        Err(e) if status.is_success() => Err(ClientError::ParseError(format!(
            "{e}; raw body: '{text}'"
        ))),
        Err(_) => Err(ClientError::Status {
            status: status.as_u16(),
            body: text,
        }),
    }
}

impl GameServer for GameClient {
    async fn use_item(&self, request: &UseItemRequest) -> Result<ItemReply, TransportError> {
        self.post_use_item(request).await.map_err(TransportError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_on_400_is_a_reply() {
        let reply = interpret_use_item(
            StatusCode::BAD_REQUEST,
            r#"{"error":"TARGET needs a digit"}"#.into(),
        )
        .expect("reply");
        assert_eq!(reply, ItemReply::Rejected { reason: "TARGET needs a digit".into() });
    }

    #[test]
    fn error_body_on_success_status_is_still_a_rejection() {
        let reply = interpret_use_item(StatusCode::OK, r#"{"error":"already used"}"#.into())
            .expect("reply");
        assert!(matches!(reply, ItemReply::Rejected { .. }));
    }

    #[test]
    fn server_error_without_body_is_status_error() {
        let err = interpret_use_item(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>".into())
            .expect_err("status");
        assert!(matches!(err, ClientError::Status { status: 502, .. }));
    }

    #[test]
    fn non_error_json_on_failure_status_is_status_error() {
        let err = interpret_use_item(StatusCode::INTERNAL_SERVER_ERROR, "{}".into())
            .expect_err("status");
        assert!(matches!(err, ClientError::Status { status: 500, .. }));
    }

    #[test]
    fn empty_error_on_failure_status_is_status_error() {
        let err = interpret_use_item(StatusCode::BAD_REQUEST, r#"{"error":""}"#.into())
            .expect_err("status");
        assert!(matches!(err, ClientError::Status { status: 400, .. }));
    }

    #[test]
    fn numeric_effect_is_applied() {
        let reply = interpret_use_item(StatusCode::OK, r#"{"effect":42}"#.into()).expect("reply");
        assert_eq!(reply, ItemReply::Applied { effect: Some("42".into()) });
    }

    #[test]
    fn garbage_on_success_is_parse_error() {
        let err = interpret_use_item(StatusCode::OK, "ok".into()).expect_err("parse");
        assert!(matches!(err, ClientError::ParseError(_)));
    }

    #[test]
    fn nested_success_body() {
        let reply = interpret_use_item(
            StatusCode::OK,
            r#"{"success":true,"result":{"effect":"HIGH_LOW: high at tens"},"item":"HIGH_LOW"}"#
                .into(),
        )
        .expect("reply");
        assert_eq!(
            reply,
            ItemReply::Applied { effect: Some("HIGH_LOW: high at tens".into()) }
        );
    }

    #[test]
    fn client_error_becomes_transport_error() {
        let err: TransportError = ClientError::Timeout(5000).into();
        assert!(err.to_string().contains("5000ms"));
    }
}
