mod drop_index;
mod partial_index;

use docdb_kv::RedbEngine;
use serde_json::json;

use crate::database::Database;
use crate::document::Document;

/// Build a `Document` from a `serde_json::json!` object literal.
pub fn doc(value: serde_json::Value) -> Document {
    Document::from_map(value.as_object().expect("test fixture must be a JSON object").clone())
}

/// A fresh, empty in-memory database for a test.
pub fn test_db() -> Database<RedbEngine> {
    Database::open_in_memory().expect("failed to open in-memory database")
}
