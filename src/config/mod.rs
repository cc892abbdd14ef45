//! Configuration management module
//!
//! Precedence, lowest to highest: defaults, scenario file, `.env` and
//! `LOAD_*` environment variables, command-line arguments.

pub mod env;
pub mod parser;
pub mod validation;

pub use env::EnvManager;
pub use parser::{display_config_summary, load_config, ConfigParser};
pub use validation::{validate_config, ConfigValidator, ValidationLevel, ValidationWarning};

pub use crate::models::TestConfig;
