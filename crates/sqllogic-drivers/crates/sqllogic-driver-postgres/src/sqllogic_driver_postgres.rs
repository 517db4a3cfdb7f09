//! PostgreSQL backend implementation

mod connection;
mod driver;

pub use connection::PostgresConnection;
pub use driver::PostgresDriver;
