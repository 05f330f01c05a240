//! Error taxonomy for the table/index engine.

/// Errors surfaced by [`crate::database::Database`], [`crate::table::Table`]
/// and [`crate::index::Index`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operation named a table that does not exist.
    #[error("table \"{0}\" does not exist")]
    TableMissing(String),

    /// `Database::table` creation conflicts with an already-open table.
    #[error("table \"{0}\" already exists")]
    TableExists(String),

    /// `find`/`seek`/`unindex`/`drop_index` on an unknown index.
    #[error("index \"{index}\" does not exist on table \"{table}\"")]
    IndexMissing {
        /// Owning table name.
        table: String,
        /// Missing index name.
        index: String,
    },

    /// `Table::index` called twice with the same name.
    #[error("index \"{index}\" already exists on table \"{table}\"")]
    IndexExists {
        /// Owning table name.
        table: String,
        /// Duplicate index name.
        index: String,
    },

    /// `Table::get(pk)` on an absent key.
    #[error("no document with _id \"{0}\"")]
    NotFound(String),

    /// `Table::save`/`Table::delete` called with a document that has no
    /// `_id` field.
    #[error("document has no _id field")]
    MissingId,

    /// A writer transaction failed and was rolled back.
    #[error("write transaction aborted: {0}")]
    WriteFail(#[source] anyhow::Error),

    /// A template string was malformed at index-creation time.
    #[error("malformed index template \"{template}\": {reason}")]
    TemplateSyntax {
        /// The offending template string.
        template: String,
        /// Human-readable reason.
        reason: String,
    },

    /// ORM-layer error: a link-table row expected to exist is absent.
    ///
    /// Not raised by this crate directly (the ORM/calculated-field layer is
    /// out of scope), kept here so collaborators on the other side of the
    /// boundary described in §6.4 can surface it through the same enum.
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A document failed to (de)serialize.
    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout `docdb`.
pub type Result<T> = std::result::Result<T, Error>;
