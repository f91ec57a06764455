//! Program serialization
//!
//! Two textual renderings of a finished program: JSON (dump and load) and
//! XML (dump only, for inspection and tooling). The JSON loader rebuilds
//! the program through the same constructors the builder API uses, so a
//! document that violates a structural invariant is rejected the same way
//! hand-built IR would be.

pub mod json;
pub mod xml;

#[cfg(test)]
pub(crate) mod test_support;

use slasm_common::{EntryError, StructuralError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write XML: {0}")]
    Xml(#[from] ::xml::writer::Error),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error(
        "document declares slasm version '{found}' but this toolchain \
         implements '{expected}'"
    )]
    VersionMismatch { expected: String, found: String },

    #[error("data blob '{label}' is not valid hex: {source}")]
    DataBlob {
        label: String,
        source: hex::FromHexError,
    },
}
