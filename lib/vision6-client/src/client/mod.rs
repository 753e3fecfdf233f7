//! The Vision6 client and its call gateway.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::credential::SecureString;
use crate::error::Error;
use crate::rpc::{Protocol, RpcClient, RpcEnvelope};
use crate::schema::{SchemaRef, SchemaStore};
use crate::validator::Validator;

mod builder;
pub use self::builder::Vision6ClientBuilder;

mod methods;
pub use self::methods::SortOrder;

/// The well-known production endpoint, used when none is supplied.
pub const DEFAULT_ENDPOINT: &str = "https://www.vision6.com.au/api/jsonrpcserver.php?version=3.0";

/// Client for the Vision6 JSON-RPC API.
///
/// Every call is validated against the method's request schema before any
/// network activity. The schema document is loaded lazily, at most once per
/// process, and shared by all clients.
///
/// # Example
///
/// ```rust,no_run
/// use vision6_client::Vision6Client;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), vision6_client::Error> {
/// let client = Vision6Client::new("my-api-key")?;
///
/// // Generic dispatch
/// let lists = client.call("searchLists", [serde_json::json!([])]).await?;
///
/// // Or the typed facade
/// let lists = client.search_lists(None, None, None, None, None).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Thread safety
///
/// The client is cheap to clone and safe for concurrent calls; the only
/// shared mutable state is the memoized schema-load outcome and the
/// read-mostly compilation cache.
#[derive(Debug, Clone)]
pub struct Vision6Client {
    api_key: SecureString,
    rpc: RpcClient,
    schemas: SchemaStore,
    validator: Arc<OnceCell<Validator>>,
}

impl Vision6Client {
    /// Starts building a client.
    pub fn builder() -> Vision6ClientBuilder {
        Vision6ClientBuilder::default()
    }

    /// Creates a client for the production endpoint.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Config`] when the API key is empty.
    pub fn new(api_key: impl Into<SecureString>) -> Result<Self, Error> {
        Self::builder().with_api_key(api_key).build()
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &Url {
        self.rpc.endpoint()
    }

    /// The protocol selected from the endpoint at construction.
    pub fn protocol(&self) -> Protocol {
        self.rpc.protocol()
    }

    /// Calls a remote method with positional arguments.
    ///
    /// The pipeline per invocation:
    ///
    /// 1. **Prepare** — the credential is prepended to the arguments.
    /// 2. **Ensure schema** — await the shared, one-time schema load.
    /// 3. **Validate** — check (and coerce) the arguments against the
    ///    method's `requestSchema`; a violation means no network attempt.
    /// 4. **Dispatch** — send the JSON-RPC request.
    /// 5. **Interpret** — a truthy `error` fails the call, a `result` (even
    ///    falsy) succeeds with its value, neither passes the envelope through.
    ///
    /// Any stage failing short-circuits the rest; nothing is retried.
    pub async fn call(
        &self,
        method_name: &str,
        options: impl IntoIterator<Item = Value>,
    ) -> Result<Value, Error> {
        // Prepare
        let mut args = vec![Value::String(self.api_key.as_str().to_owned())];
        args.extend(options);
        debug!(target: "vision6", method = method_name, argc = args.len(), "calling");

        // Ensure schema
        let validator = self.validator().await?;

        // Validate
        let reference = SchemaRef::request(method_name);
        let validated = validator.validate(&reference, Some(json!({ "args": args })))?;
        let args = match validated {
            Value::Object(mut map) => match map.remove("args") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        // Dispatch
        let envelope = self.rpc.request(method_name, args).await?;

        // Interpret
        interpret(envelope)
    }

    /// Validates a response value against a method's `responseSchema`.
    ///
    /// The core never validates responses on its own; this is the hook for
    /// callers that want the same guarantee on the way back.
    pub async fn validate_response(
        &self,
        method_name: &str,
        response: Value,
    ) -> Result<Value, Error> {
        let validator = self.validator().await?;
        let validated = validator.validate(
            &SchemaRef::response(method_name),
            Some(json!({ "response": response })),
        )?;
        Ok(match validated {
            Value::Object(mut map) => map.remove("response").unwrap_or(Value::Null),
            other => other,
        })
    }

    /// Awaits schema readiness and returns the shared validator.
    ///
    /// The store's single pending-future registration guarantees one load
    /// under concurrent first access and delivers a load failure to every
    /// caller awaiting that attempt.
    async fn validator(&self) -> Result<&Validator, Error> {
        let document = self.schemas.ready().await?;
        Ok(self
            .validator
            .get_or_init(|| async move { Validator::new(document) })
            .await)
    }
}

fn interpret(envelope: RpcEnvelope) -> Result<Value, Error> {
    if let Some(error) = envelope.failure() {
        return Err(Error::remote(error.clone()));
    }
    let raw = envelope.into_raw();
    match raw {
        Value::Object(mut map) if map.contains_key("result") => {
            Ok(map.remove("result").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::test_support::{RecordingTransport, init_tracing, test_client};

    #[test]
    fn empty_api_key_fails_before_any_load_or_network() {
        let error = Vision6Client::new("").expect_err("empty key should be rejected");
        assert!(matches!(error, Error::Config { .. }));

        let error = Vision6Client::builder()
            .build()
            .expect_err("missing key should be rejected");
        assert!(matches!(error, Error::Config { .. }));
    }

    #[test]
    fn whitespace_api_key_is_rejected() {
        let error = Vision6Client::new("   ").expect_err("blank key should be rejected");
        assert!(matches!(error, Error::Config { .. }));
    }

    #[test]
    fn endpoint_prefix_selects_the_protocol() {
        let secure = Vision6Client::builder()
            .with_api_key("key")
            .with_endpoint("https://x")
            .build()
            .expect("client should build");
        assert_eq!(secure.protocol(), Protocol::Https);

        let insecure = Vision6Client::builder()
            .with_api_key("key")
            .with_endpoint("http://x")
            .build()
            .expect("client should build");
        assert_eq!(insecure.protocol(), Protocol::Http);
    }

    #[test]
    fn default_endpoint_is_the_production_server() {
        let client = Vision6Client::new("key").expect("client should build");
        assert_eq!(client.endpoint().as_str(), DEFAULT_ENDPOINT);
        assert_eq!(client.protocol(), Protocol::Https);
    }

    #[tokio::test]
    async fn credential_is_injected_as_the_first_argument() {
        let transport = RecordingTransport::replying(json!({"result": []}));
        let client = test_client(Arc::clone(&transport));

        client
            .call("getListById", [json!(7)])
            .await
            .expect("call should succeed");

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].body["params"], json!(["test-api-key", 7]));
    }

    #[tokio::test]
    async fn invalid_arguments_issue_no_transport_request() {
        let transport = RecordingTransport::replying(json!({"result": []}));
        let client = test_client(Arc::clone(&transport));

        let error = client
            .call("getListById", [json!("not-a-list-id")])
            .await
            .expect_err("invalid arguments should be rejected");
        assert!(matches!(error, Error::Validation(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_method_issues_no_transport_request() {
        let transport = RecordingTransport::replying(json!({"result": []}));
        let client = test_client(Arc::clone(&transport));

        let error = client
            .call("noSuchMethod", [])
            .await
            .expect_err("unknown method should be rejected");
        assert!(matches!(error, Error::Validation(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn result_field_is_unwrapped() {
        let transport = RecordingTransport::replying(json!({"result": {"id": 7, "name": "News"}}));
        let client = test_client(transport);

        let result = client
            .call("getListById", [json!(7)])
            .await
            .expect("call should succeed");
        assert_eq!(result, json!({"id": 7, "name": "News"}));
    }

    #[tokio::test]
    async fn falsy_result_still_succeeds() {
        let transport = RecordingTransport::replying(json!({"result": 0}));
        let client = test_client(transport);

        let result = client
            .call("countLists", [])
            .await
            .expect("call should succeed");
        assert_eq!(result, json!(0));
    }

    #[tokio::test]
    async fn truthy_error_field_fails_the_call() {
        let transport = RecordingTransport::replying(json!({"error": "boom"}));
        let client = test_client(transport);

        let error = client
            .call("getListById", [json!(7)])
            .await
            .expect_err("remote error should fail the call");
        let Error::Remote { message, .. } = error else {
            panic!("expected a remote error, got {error}");
        };
        assert_eq!(message, "boom");
    }

    #[tokio::test]
    async fn envelope_without_result_or_error_passes_through() {
        let transport = RecordingTransport::replying(json!({}));
        let client = test_client(transport);

        let result = client
            .call("getListById", [json!(7)])
            .await
            .expect("call should succeed");
        assert_eq!(result, json!({}));
    }

    #[tokio::test]
    async fn schema_load_failure_reaches_the_caller_before_networking() {
        let transport = RecordingTransport::replying(json!({"result": []}));
        let client = Vision6Client::builder()
            .with_api_key("test-api-key")
            .with_schema_store(SchemaStore::new("/definitely/not/here.json"))
            .with_transport(Arc::clone(&transport) as _)
            .build()
            .expect("client should build");

        let error = client
            .call("getListById", [json!(7)])
            .await
            .expect_err("load failure should fail the call");
        assert!(matches!(error, Error::SchemaLoad(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_calls_share_a_single_schema_load() {
        init_tracing();
        let transport = RecordingTransport::with_responses(
            std::iter::repeat_n(json!({"result": []}), 16),
        );
        let client = test_client(Arc::clone(&transport));

        let outcomes = futures_util::future::join_all((0..16).map(|_| {
            let client = client.clone();
            async move { client.call("getTimezoneList", []).await }
        }))
        .await;
        for outcome in outcomes {
            outcome.expect("call should succeed");
        }
        assert_eq!(client.schemas.load_attempts(), 1);
        assert_eq!(transport.call_count(), 16);
    }

    #[tokio::test]
    async fn validate_response_checks_the_response_schema() {
        let transport = RecordingTransport::replying(json!({"result": []}));
        let client = test_client(transport);

        client
            .validate_response("searchLists", json!([{"id": 1, "name": "News"}]))
            .await
            .expect("response should validate");

        let error = client
            .validate_response("searchLists", json!("not-a-list-of-lists"))
            .await
            .expect_err("invalid response should be rejected");
        assert!(matches!(error, Error::Validation(_)));
    }
}
