//! Schema document loading and addressing.
//!
//! The remote API's method contracts live in a single JSON Schema document
//! (`schema/vision6.json`), one entry per method with a `requestSchema` and a
//! `responseSchema`. [`SchemaStore`] loads and dereferences that document at
//! most once per process; [`SchemaRef`] addresses a (sub-)schema inside it.

mod document;
mod store;

pub use self::document::{SchemaDocument, SchemaRef};
pub use self::store::{LoadError, SchemaStore};
