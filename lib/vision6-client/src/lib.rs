//! Schema-validated client for the Vision6 JSON-RPC API.
//!
//! Every remote method's argument and response contracts live in a bundled
//! JSON Schema document. The client loads that document lazily (at most once
//! per process, shared across all client instances), validates call arguments
//! against the method's request schema *before* any network activity, then
//! dispatches a single JSON-RPC request and maps the response envelope into a
//! uniform outcome.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use vision6_client::{SortOrder, Vision6Client};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), vision6_client::Error> {
//! let client = Vision6Client::new("my-api-key")?;
//!
//! // Typed facade with documented defaults...
//! let lists = client.search_lists(None, Some(10), None, None, Some(SortOrder::Desc)).await?;
//!
//! // ...or generic dispatch.
//! let count = client.call("countLists", [serde_json::json!([])]).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Failure model
//!
//! Every call either fully succeeds or fails with exactly one [`Error`]:
//! configuration problems surface at construction, schema-load failures reach
//! every call awaiting the shared load, validation failures prevent the
//! network request entirely, and a truthy JSON-RPC `error` field becomes
//! [`Error::Remote`]. Nothing is retried; retry policy belongs to callers.

mod client;
mod credential;
mod error;
mod rpc;
mod schema;
mod validator;

pub use self::client::{DEFAULT_ENDPOINT, SortOrder, Vision6Client, Vision6ClientBuilder};
pub use self::credential::SecureString;
pub use self::error::Error;
pub use self::rpc::{
    HttpTransport, Protocol, RpcClient, RpcEnvelope, Transport, TransportError, select_protocol,
};
pub use self::schema::{LoadError, SchemaDocument, SchemaRef, SchemaStore};
pub use self::validator::{ValidationError, Validator, Violation};

#[cfg(test)]
mod test_support;
