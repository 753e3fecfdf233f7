//! Shared helpers for the in-crate test modules.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};
use url::Url;

use crate::rpc::{Transport, TransportError};
use crate::schema::SchemaStore;
use crate::{Vision6Client, Vision6ClientBuilder};

pub(crate) fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// One request observed by the [`RecordingTransport`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub(crate) endpoint: Url,
    pub(crate) body: Value,
}

/// Transport spy: records every dispatched request and replays scripted
/// responses in order (repeating `{"result": null}` once exhausted).
pub(crate) struct RecordingTransport {
    responses: Mutex<VecDeque<Value>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingTransport {
    pub(crate) fn replying(response: Value) -> Arc<Self> {
        Self::with_responses([response])
    }

    pub(crate) fn with_responses(responses: impl IntoIterator<Item = Value>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post_json(&self, endpoint: &Url, body: Value) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                endpoint: endpoint.clone(),
                body,
            });
        let response = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| json!({"result": null}));
        Ok(response)
    }
}

/// The bundled schema document shipped with the crate.
pub(crate) fn bundled_schema_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("schema/vision6.json")
}

/// A client over the bundled schemas, a fresh (non-global) store, and the
/// given transport.
pub(crate) fn test_client(transport: Arc<RecordingTransport>) -> Vision6Client {
    Vision6ClientBuilder::default()
        .with_api_key("test-api-key")
        .with_schema_store(SchemaStore::new(bundled_schema_path()))
        .with_transport(transport as _)
        .build()
        .expect("test client should build")
}
