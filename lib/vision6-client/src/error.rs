use serde_json::Value;

use crate::rpc::TransportError;
use crate::schema::LoadError;
use crate::validator::ValidationError;

/// Errors that can occur when using the Vision6 client.
///
/// Every failure of the call pipeline surfaces as exactly one of these
/// variants; no stage downgrades an error into a success and nothing is
/// retried automatically.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum Error {
    /// Invalid client configuration.
    ///
    /// Surfaced synchronously at construction time, before any schema load or
    /// network activity (missing API key, unparseable endpoint, ...).
    #[display("Invalid configuration: {message}")]
    #[from(skip)]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// The schema document could not be fetched or dereferenced.
    ///
    /// Delivered to the caller that triggered the load and to every call
    /// awaiting the same in-flight load.
    SchemaLoad(LoadError),

    /// The call arguments (or a response) violated the method's schema.
    Validation(ValidationError),

    /// Network, connection, or response-decoding failure from the transport.
    Transport(TransportError),

    /// The remote service returned a JSON-RPC `error` field.
    #[display("Remote error: {message}")]
    #[from(skip)]
    Remote {
        /// Human-readable rendering of the remote `error` value.
        message: String,
        /// The raw `error` value for diagnostics.
        detail: Value,
    },
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Builds a [`Error::Remote`] from the envelope's `error` value.
    ///
    /// A string error becomes the message verbatim; anything else is rendered
    /// as compact JSON.
    pub(crate) fn remote(detail: Value) -> Self {
        let message = match &detail {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Self::Remote { message, detail }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn remote_error_message_from_string() {
        let error = Error::remote(json!("boom"));
        assert_eq!(error.to_string(), "Remote error: boom");
    }

    #[test]
    fn remote_error_message_from_object() {
        let error = Error::remote(json!({"code": 13, "message": "no such list"}));
        let Error::Remote { message, detail } = &error else {
            panic!("expected a remote error");
        };
        assert_eq!(message, r#"{"code":13,"message":"no such list"}"#);
        assert_eq!(detail["code"], 13);
    }
}
