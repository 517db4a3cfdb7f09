//! sqllogic core - Backend abstractions for the conformance runner
//!
//! This crate provides the fundamental traits and types that the runner and
//! every backend crate depend on. It defines:
//!
//! - `DatabaseDriver` - Trait for backend implementations, selected by name
//! - `Connection` - Trait for a live, exclusively owned backend connection
//! - `SchemaIntrospection` - Table/view enumeration used for schema resets
//! - Common types like `Value`, `Row`, `QueryResult`, etc.

mod connection;
mod driver;
mod error;
mod types;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use types::*;
