mod args;
mod env;

pub use args::rewrite_arguments;
pub use env::{finalize, DerivedEntries, EnvRewriter, EnvironmentEntry};
