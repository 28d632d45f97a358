mod launch;
mod quote;
mod resolve;
mod supervise;
pub(crate) mod sys;
mod tree;

pub use launch::Launch;
pub use quote::Arg;
pub use resolve::{strip_verbatim, Resolver};
pub use supervise::Supervisor;
pub use sys::SystemProcesses;
