pub mod connection;
pub mod schema;
pub mod store;

pub use store::{ReadTx, Store, WriteTx};
