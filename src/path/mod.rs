mod classify;
mod matcher;
mod translate;

pub use classify::PathKind;
pub use matcher::matches_any;
pub use translate::{normalize_windows, Translator};
