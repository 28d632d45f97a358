use lazy_static::lazy_static;
use regex::Regex;

use crate::path::{PathKind, Translator};

lazy_static! {
    /// `name=value`, `-name=value`, `--name:value`, ...
    static ref OPTION: Regex =
        Regex::new(r"(?s)^(-{0,2}[A-Za-z0-9_][A-Za-z0-9_-]*[=:])(.*)$").unwrap();
    /// Windows style `/name:value` switches
    static ref SWITCH: Regex = Regex::new(r"(?s)^(/[A-Za-z0-9_][A-Za-z0-9_-]*:)(.*)$").unwrap();
}

/// Translates every argument from `start` onward in place.
pub fn rewrite_arguments(translator: &Translator, args: &mut [String], start: usize) {
    for arg in args.iter_mut().skip(start) {
        let rewritten = rewrite_argument(translator, arg);
        if rewritten != *arg {
            log::debug!("argument '{}' -> '{}'", arg, rewritten);
            *arg = rewritten;
        }
    }
}

/// Translates a single argument. Native paths are normalized, option values
/// are translated on their own, anything else is translated as a whole.
pub fn rewrite_argument(translator: &Translator, arg: &str) -> String {
    let kind = translator.classify(arg);
    if kind == PathKind::WindowsPath {
        return translator.translate(arg, kind);
    }

    if let Some(caps) = OPTION.captures(arg).or_else(|| SWITCH.captures(arg)) {
        let (name, value) = (&caps[1], &caps[2]);
        // `scheme://host/...` is a URL, not an option
        let url = !name.starts_with('/') && name.ends_with(':') && value.starts_with("//");
        if !url {
            return format!("{}{}", name, rewrite_value(translator, value));
        }
    }

    translator.to_windows(arg)
}

/// Double quotes around a value survive translation; a single-quoted value is
/// taken literally.
pub fn rewrite_value(translator: &Translator, value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let inner = &value[1..value.len() - 1];
        return format!("\"{}\"", translator.to_windows(inner));
    }
    if value.starts_with('\'') {
        return value.to_string();
    }
    translator.to_windows(value)
}
