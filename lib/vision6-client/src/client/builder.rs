use std::sync::Arc;

use tokio::sync::OnceCell;

use super::{DEFAULT_ENDPOINT, Vision6Client};
use crate::credential::SecureString;
use crate::error::Error;
use crate::rpc::{RpcClient, Transport};
use crate::schema::SchemaStore;

/// Builder for [`Vision6Client`] instances.
///
/// Only the API key is mandatory; the endpoint defaults to the production
/// server, the schema store to the process-wide one, and the transport to a
/// reqwest-backed HTTP transport.
///
/// # Example
///
/// ```rust,no_run
/// use vision6_client::Vision6Client;
///
/// # fn example() -> Result<(), vision6_client::Error> {
/// let client = Vision6Client::builder()
///     .with_api_key("my-api-key")
///     .with_endpoint("https://www.vision6.com.au/api/jsonrpcserver.php?version=3.0")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default, derive_more::Debug)]
pub struct Vision6ClientBuilder {
    api_key: Option<SecureString>,
    endpoint: Option<String>,
    schema_store: Option<SchemaStore>,
    #[debug(skip)]
    transport: Option<Arc<dyn Transport>>,
}

impl Vision6ClientBuilder {
    /// Sets the API key. Required; must be non-empty.
    pub fn with_api_key(mut self, api_key: impl Into<SecureString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Overrides the endpoint URL.
    ///
    /// The transport protocol follows the endpoint's scheme prefix (`https`
    /// selects the secure protocol) and is fixed at build time.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Overrides the schema store (defaults to [`SchemaStore::global`]).
    pub fn with_schema_store(mut self, store: SchemaStore) -> Self {
        self.schema_store = Some(store);
        self
    }

    /// Overrides the wire transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Config`] when the API key is absent or blank, or
    /// when the endpoint cannot be parsed. No schema load or network attempt
    /// happens here.
    pub fn build(self) -> Result<Vision6Client, Error> {
        let Self {
            api_key,
            endpoint,
            schema_store,
            transport,
        } = self;

        let Some(api_key) = api_key.filter(|key| !key.is_blank()) else {
            return Err(Error::config("Invalid Vision6 API key"));
        };

        let endpoint = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());
        let rpc = match transport {
            Some(transport) => RpcClient::with_transport(&endpoint, transport),
            None => RpcClient::new(&endpoint),
        }
        .map_err(|source| Error::config(format!("invalid endpoint '{endpoint}': {source}")))?;

        let schemas = schema_store.unwrap_or_else(|| SchemaStore::global().clone());

        Ok(Vision6Client {
            api_key,
            rpc,
            schemas,
            validator: Arc::new(OnceCell::new()),
        })
    }
}
