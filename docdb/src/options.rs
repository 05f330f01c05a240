//! Environment configuration.
//!
//! Re-exports [`docdb_kv::EnvOptions`] (`map_size`, `subdir`, `sync`,
//! `max_dbs`) rather than defining a second struct, so `docdb` callers
//! configure the same knobs the `docdb-kv` backend actually reads. See
//! DESIGN.md for which fields are honored by `redb` and which are retained
//! as documented no-ops for interface continuity.
pub use docdb_kv::EnvOptions;
