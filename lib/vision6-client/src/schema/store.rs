use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde_json::Value;
use tracing::{debug, warn};

use super::document::{SchemaDocument, SharedDocument};

/// Schema document fetch/dereference failure.
///
/// Clonable so one in-flight load can deliver its outcome to every waiting
/// caller.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
pub enum LoadError {
    /// The schema file could not be read.
    #[display("failed to read schema document '{path}': {source}")]
    Read {
        /// Location of the schema file.
        path: String,
        /// Underlying I/O failure.
        source: Arc<std::io::Error>,
    },

    /// The schema file is not valid JSON.
    #[display("schema document '{path}' is not valid JSON: {source}")]
    Parse {
        /// Location of the schema file.
        path: String,
        /// Underlying JSON parse failure.
        source: Arc<serde_json::Error>,
    },

    /// An internal `$ref` points at nothing.
    #[display("unresolvable schema reference '{reference}'")]
    UnresolvedRef {
        /// The reference that failed to resolve.
        reference: String,
    },

    /// Internal `$ref` links form a cycle.
    #[display("schema reference cycle through '{reference}'")]
    CircularRef {
        /// A reference on the cycle.
        reference: String,
    },
}

type LoadOutcome = Result<SharedDocument, LoadError>;
type PendingLoad = Shared<BoxFuture<'static, LoadOutcome>>;

enum LoadState {
    Unloaded,
    Loading(PendingLoad),
    Loaded(SharedDocument),
}

/// Memoized, single-flight loader for the schema document.
///
/// The first [`SchemaStore::ready`] call starts an asynchronous
/// fetch-and-dereference of the document; every concurrent or later call
/// observes the same load operation instead of repeating it. A failed load
/// is delivered to all callers awaiting that attempt and resets the store,
/// so a subsequent call may retry from scratch.
#[derive(Clone)]
pub struct SchemaStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: PathBuf,
    state: Mutex<LoadState>,
    attempts: AtomicUsize,
}

impl SchemaStore {
    /// Creates a store that loads from the given schema file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path: path.into(),
                state: Mutex::new(LoadState::Unloaded),
                attempts: AtomicUsize::new(0),
            }),
        }
    }

    /// The process-wide store backing every client by default.
    ///
    /// Loads from `$VISION6_SCHEMA_PATH` when set, else the bundled
    /// `schema/vision6.json`.
    pub fn global() -> &'static SchemaStore {
        static GLOBAL: OnceLock<SchemaStore> = OnceLock::new();
        GLOBAL.get_or_init(|| SchemaStore::new(default_schema_path()))
    }

    /// Resolves once the schema document is loaded and dereferenced.
    ///
    /// Callable any number of times; all callers observe the same underlying
    /// load. The registration of a single pending future (not a flag check)
    /// guarantees at most one fetch under concurrent first access.
    pub async fn ready(&self) -> Result<SharedDocument, LoadError> {
        let pending = {
            let mut state = self
                .inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match &*state {
                LoadState::Loaded(document) => return Ok(Arc::clone(document)),
                LoadState::Loading(pending) => pending.clone(),
                LoadState::Unloaded => {
                    let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!(
                        target: "vision6",
                        path = %self.inner.path.display(),
                        attempt,
                        "loading schema document"
                    );
                    let pending = load(Arc::clone(&self.inner)).boxed().shared();
                    *state = LoadState::Loading(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    /// Number of load attempts started so far.
    #[cfg(test)]
    pub(crate) fn load_attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let state = match &*state {
            LoadState::Unloaded => "Unloaded",
            LoadState::Loading(_) => "Loading",
            LoadState::Loaded(_) => "Loaded",
        };
        f.debug_struct("SchemaStore")
            .field("path", &self.inner.path)
            .field("state", &state)
            .finish()
    }
}

async fn load(inner: Arc<StoreInner>) -> LoadOutcome {
    let outcome = fetch_and_dereference(&inner.path).await;

    let mut state = inner.state.lock().unwrap_or_else(PoisonError::into_inner);
    match &outcome {
        Ok(document) => *state = LoadState::Loaded(Arc::clone(document)),
        Err(error) => {
            // Reset so a later call may retry; waiters on this attempt still
            // receive the shared error.
            warn!(target: "vision6", %error, "schema load failed");
            *state = LoadState::Unloaded;
        }
    }
    outcome
}

async fn fetch_and_dereference(path: &Path) -> LoadOutcome {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Read {
            path: path.display().to_string(),
            source: Arc::new(source),
        })?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.display().to_string(),
        source: Arc::new(source),
    })?;
    let document = SchemaDocument::parse(&value)?;
    debug!(target: "vision6", id = document.id(), "schema document loaded");
    Ok(Arc::new(document))
}

fn default_schema_path() -> PathBuf {
    std::env::var_os("VISION6_SCHEMA_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("schema/vision6.json"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn temp_schema_file(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("vision6-schema-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, content).expect("temp schema file should be writable");
        path
    }

    const MINIMAL_DOCUMENT: &str = r##"{
        "id": "vision6",
        "definitions": {"listId": {"type": "integer"}},
        "methods": {
            "getListById": {
                "requestSchema": {
                    "type": "object",
                    "required": ["args"],
                    "properties": {
                        "args": {
                            "type": "array",
                            "items": [{"type": "string"}, {"$ref": "#/definitions/listId"}]
                        }
                    }
                },
                "responseSchema": {"type": "object"}
            }
        }
    }"##;

    #[tokio::test]
    async fn concurrent_first_callers_share_one_load() {
        crate::test_support::init_tracing();
        let path = temp_schema_file(MINIMAL_DOCUMENT);
        let store = SchemaStore::new(&path);

        let outcomes = futures_util::future::join_all((0..16).map(|_| {
            let store = store.clone();
            async move { store.ready().await }
        }))
        .await;

        let first = outcomes[0].as_ref().expect("load should succeed");
        for outcome in &outcomes {
            let document = outcome.as_ref().expect("load should succeed");
            assert!(Arc::ptr_eq(first, document));
        }
        assert_eq!(store.load_attempts(), 1);

        fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn later_callers_replay_the_memoized_outcome() {
        let path = temp_schema_file(MINIMAL_DOCUMENT);
        let store = SchemaStore::new(&path);

        let first = store.ready().await.expect("load should succeed");
        // Deleting the file must not matter: the document is memoized.
        fs::remove_file(&path).ok();
        let second = store.ready().await.expect("load should be memoized");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.load_attempts(), 1);
    }

    #[tokio::test]
    async fn failure_is_shared_and_a_later_call_may_retry() {
        let path = std::env::temp_dir().join(format!("vision6-missing-{}.json", uuid::Uuid::new_v4()));
        let store = SchemaStore::new(&path);

        let outcomes = futures_util::future::join_all((0..4).map(|_| {
            let store = store.clone();
            async move { store.ready().await }
        }))
        .await;
        for outcome in &outcomes {
            assert!(matches!(outcome, Err(LoadError::Read { .. })));
        }
        assert_eq!(store.load_attempts(), 1);

        // The failed attempt left no partial state; a later call retries.
        fs::write(&path, MINIMAL_DOCUMENT).expect("temp schema file should be writable");
        store.ready().await.expect("retry should succeed");
        assert_eq!(store.load_attempts(), 2);

        fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error() {
        let path = temp_schema_file("{not json");
        let store = SchemaStore::new(&path);

        let error = store.ready().await.expect_err("load should fail");
        assert!(matches!(error, LoadError::Parse { .. }));

        fs::remove_file(&path).ok();
    }
}
