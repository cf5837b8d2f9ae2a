//! Persistence layer for member records.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{MemberRecord, MemberStore, MemberUpdate};
