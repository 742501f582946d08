pub mod commands;
pub mod config;
pub mod data_type;
pub mod database;
pub mod error;
pub mod grammar;
pub mod printer;
pub mod query;
pub mod repl;
pub mod schema;
pub mod storage;
pub mod tokenizer;
pub mod value;

pub use commands::{CommandInfo, CommandRegistry};
pub use config::Config;
pub use data_type::DataType;
pub use database::{Database, Outcome};
pub use error::{Error, Result};
pub use query::ListQuery;
pub use repl::Repl;
pub use schema::{Field, Schema};
pub use storage::{Cursor, MemoryDriver, Row, StorageDriver};
pub use value::Value;
