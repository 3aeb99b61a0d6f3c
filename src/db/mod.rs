pub mod collation;
pub mod connection;
pub mod repository;

pub use connection::{Database, Outcome, Statement, StatementKind, Value};
