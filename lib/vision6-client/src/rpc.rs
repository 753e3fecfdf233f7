//! JSON-RPC request dispatch.
//!
//! [`RpcClient`] owns the connection parameters and the serialize/send/decode
//! boundary; the wire itself is behind the [`Transport`] trait so the HTTP
//! collaborator stays replaceable.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Transport protocol, chosen from the endpoint's scheme prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Plain HTTP.
    Http,
    /// TLS.
    Https,
}

impl Protocol {
    /// Whether this is the secure protocol.
    pub fn is_secure(self) -> bool {
        matches!(self, Self::Https)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

/// Chooses the protocol from the endpoint string's prefix.
///
/// `https...` selects [`Protocol::Https`]; anything else falls back to
/// [`Protocol::Http`]. Evaluated once at construction, never per call.
#[must_use]
pub fn select_protocol(endpoint: &str) -> Protocol {
    if endpoint.starts_with("https") {
        Protocol::Https
    } else {
        Protocol::Http
    }
}

/// Network, connection, timeout, or response-decoding failure.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum TransportError {
    /// HTTP failure from the underlying reqwest client.
    Http(reqwest::Error),

    /// The response body is not a JSON-RPC envelope.
    #[display("malformed JSON-RPC response: {source}")]
    #[from(skip)]
    Decode {
        /// Underlying JSON parse failure.
        source: serde_json::Error,
        /// The body that failed to parse.
        body: String,
    },
}

/// The serialize/send/deserialize boundary to the remote service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs a JSON body to the endpoint and decodes the JSON response.
    async fn post_json(&self, endpoint: &Url, body: Value) -> Result<Value, TransportError>;
}

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a default reqwest client.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, endpoint: &Url, body: Value) -> Result<Value, TransportError> {
        let response = self.client.post(endpoint.clone()).json(&body).send().await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| TransportError::Decode { source, body: text })
    }
}

/// The decoded JSON-RPC response.
///
/// May carry an `error` field (truthy means failure), a `result` field
/// (success payload, even when falsy), or neither (raw passthrough).
#[derive(Debug, Clone, PartialEq)]
pub struct RpcEnvelope {
    raw: Value,
}

impl RpcEnvelope {
    pub(crate) fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// The `error` field, if present.
    pub fn error(&self) -> Option<&Value> {
        self.raw.get("error")
    }

    /// The `result` field, if present.
    pub fn result(&self) -> Option<&Value> {
        self.raw.get("result")
    }

    /// The `error` field when it is present and truthy.
    ///
    /// A `null`/`false`/`0`/`""` error does not count as a failure, matching
    /// the remote service's envelope conventions.
    pub fn failure(&self) -> Option<&Value> {
        self.error().filter(|error| is_truthy(error))
    }

    /// Consumes the envelope, returning the raw decoded body.
    pub fn into_raw(self) -> Value {
        self.raw
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|float| float != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Dispatches single JSON-RPC requests to a fixed endpoint.
///
/// Construction parses the endpoint and derives the protocol once; per-call
/// work is limited to serializing `{method, params}` (with a fresh request
/// id), sending it, and decoding the envelope.
#[derive(Clone)]
pub struct RpcClient {
    endpoint: Url,
    protocol: Protocol,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("protocol", &self.protocol)
            .finish()
    }
}

impl RpcClient {
    /// Creates a client over the default HTTP transport.
    pub fn new(endpoint: &str) -> Result<Self, url::ParseError> {
        Self::with_transport(endpoint, Arc::new(HttpTransport::new()))
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(
        endpoint: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, url::ParseError> {
        let protocol = select_protocol(endpoint);
        let endpoint = endpoint.parse()?;
        Ok(Self {
            endpoint,
            protocol,
            transport,
        })
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The protocol derived at construction.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Sends one JSON-RPC request and decodes the response envelope.
    pub async fn request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<RpcEnvelope, TransportError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": Uuid::new_v4().to_string(),
        });

        debug!(target: "vision6", method, "sending JSON-RPC request");
        let raw = self.transport.post_json(&self.endpoint, body).await?;
        debug!(target: "vision6", method, "received JSON-RPC response");

        Ok(RpcEnvelope::new(raw))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::test_support::RecordingTransport;

    #[rstest]
    #[case::https("https://www.vision6.com.au/api/jsonrpcserver.php?version=3.0", Protocol::Https)]
    #[case::https_host_only("https://x", Protocol::Https)]
    #[case::http("http://x", Protocol::Http)]
    #[case::no_scheme("x", Protocol::Http)]
    fn protocol_follows_the_endpoint_prefix(#[case] endpoint: &str, #[case] expected: Protocol) {
        assert_eq!(select_protocol(endpoint), expected);
    }

    #[test]
    fn invalid_endpoint_is_rejected_at_construction() {
        assert!(RpcClient::new("not a url").is_err());
    }

    #[tokio::test]
    async fn request_serializes_a_json_rpc_call() {
        let transport = RecordingTransport::replying(json!({"result": 42}));
        let client = RpcClient::with_transport("http://localhost/api", Arc::clone(&transport) as _)
            .expect("endpoint should parse");

        let envelope = client
            .request("getListById", vec![json!("key"), json!(7)])
            .await
            .expect("request should succeed");
        assert_eq!(envelope.result(), Some(&json!(42)));

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].endpoint.as_str(), "http://localhost/api");
        let body = &calls[0].body;
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "getListById");
        assert_eq!(body["params"], json!(["key", 7]));
        assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[rstest]
    #[case::null(json!({"error": null, "result": 1}), false)]
    #[case::false_flag(json!({"error": false}), false)]
    #[case::zero(json!({"error": 0}), false)]
    #[case::empty_string(json!({"error": ""}), false)]
    #[case::message(json!({"error": "boom"}), true)]
    #[case::object(json!({"error": {"code": 13}}), true)]
    #[case::absent(json!({"result": 1}), false)]
    fn envelope_failure_requires_a_truthy_error(#[case] raw: Value, #[case] failing: bool) {
        let envelope = RpcEnvelope::new(raw);
        assert_eq!(envelope.failure().is_some(), failing);
    }
}
