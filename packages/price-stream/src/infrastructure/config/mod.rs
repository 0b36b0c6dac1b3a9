//! Configuration Module
//!
//! Environment-driven settings shared by both pipeline binaries, plus the
//! parsing helpers each binary uses for its own settings.

mod settings;

pub use settings::{
    ConfigError, ConnectSettings, StreamSettings, load_dotenv, parse_env_duration_millis,
    parse_env_duration_secs, parse_env_f64, parse_env_list, parse_env_u16, parse_env_u32,
    parse_env_usize,
};
