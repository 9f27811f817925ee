pub mod config;
pub mod error;
pub mod logs;
pub mod service;
pub mod types;
pub mod validation;

pub use config::*;
pub use error::*;
pub use logs::*;
pub use service::*;
pub use types::*;
pub use validation::*;
