mod config;
mod tables;

pub use config::{Config, EnvPolicy, PosixRoot};
pub use tables::{TranslationTables, PRIVATE_VARIABLES, SHELL_VARIABLES};
