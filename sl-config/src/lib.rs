//! Configuration loading and shared settings for semantic layer clients.

pub mod environment;
pub mod load;
pub mod shared;

pub use load::{Config, ConfigLayer, LoadConfigError, load_config, load_config_from};
