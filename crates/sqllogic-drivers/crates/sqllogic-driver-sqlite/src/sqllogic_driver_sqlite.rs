//! SQLite backend implementation

mod connection;
mod driver;

pub use connection::SqliteConnection;
pub use driver::SqliteDriver;
