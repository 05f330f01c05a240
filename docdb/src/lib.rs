//! Embedded document database layered on an ordered KV engine: tables of
//! JSON-like documents with an auto-generated primary key, plus secondary
//! indexes derived from a per-index brace template.

pub mod catalog;
pub mod database;
pub mod document;
pub mod error;
pub mod index;
pub mod options;
pub mod table;
pub mod template;

#[cfg(test)]
mod test;

pub use database::Database;
pub use document::Document;
pub use error::Error;
pub use error::Result;
pub use index::Index;
pub use options::EnvOptions;
pub use table::Table;
pub use template::Template;

// re-export so downstream crates only need to depend on `docdb`.
pub use docdb_kv;
