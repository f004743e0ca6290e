pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use catalog::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use validation::*;
