pub mod types;
pub mod parser;
pub mod store;

pub use types::*;
pub use parser::parse;
pub use store::{TelemetrySnapshot, TelemetryStore};
