//! Configuration loading.
//!
//! Settings come from a TOML file (created from embedded defaults on first
//! run), then environment variables, then command line flags.

pub mod defaults;
pub mod loader;

pub use defaults::ClientConfig;
pub use loader::{get_default_config, load_client_config, load_configuration, write_config_to};
