use super::{
    classify::{is_separator, Classifier, PathKind},
    matcher::matches,
};
use crate::module::Config;

/// The native null device.
pub const NULL_DEVICE: &str = "NUL";

/// At least one absolute looking path on each side of a `:`.
const POSIX_LIST_SHAPE: &str = "*/+*:*/+*";

/// Rewrites separators to `\`, collapses repeated separators (the leading
/// pair of a UNC path excepted) and upper-cases the drive letter.
/// A single trailing separator is dropped unless `keep_trailing` is set or it
/// ends a drive root (`C:\`) or a bare `..\`.
pub fn normalize_windows(s: &str, keep_trailing: bool) -> String {
    let unc = s.chars().take(2).filter(|c| is_separator(*c)).count() == 2;
    let mut out = String::with_capacity(s.len());
    let mut previous_separator = false;

    for (i, c) in s.chars().enumerate() {
        if is_separator(c) {
            if previous_separator && !(unc && i == 1) {
                continue;
            }
            out.push('\\');
            previous_separator = true;
        } else {
            out.push(c);
            previous_separator = false;
        }
    }

    uppercase_drive(&mut out);

    if !keep_trailing && out.len() > 1 && out.ends_with('\\') {
        let head = &out[..out.len() - 1];
        if !(head.ends_with(':') || head == ".." || head == "\\") {
            out.pop();
        }
    }
    out
}

fn uppercase_drive(path: &mut String) {
    let offset = if path.starts_with("\\\\?\\") { 4 } else { 0 };
    let bytes = path.as_bytes();
    if bytes.len() > offset + 1 && bytes[offset].is_ascii_alphabetic() && bytes[offset + 1] == b':' {
        path[offset..offset + 1].make_ascii_uppercase();
    }
}

/// Appends an already normalized `\`-rooted path to the root without
/// doubling the separator at the seam.
fn join_root(root: &str, tail: &str) -> String {
    if root.ends_with('\\') {
        format!("{}{}", root, tail.trim_start_matches('\\'))
    } else {
        format!("{}{}", root, tail)
    }
}

/// Translates single paths and path lists to their Windows form.
pub struct Translator<'a> {
    classifier: Classifier<'a>,
    root: &'a str,
    keep_trailing: bool,
}

impl<'a> Translator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            classifier: Classifier::new(&config.tables, config.force_unknown),
            root: config.root.as_str(),
            keep_trailing: config.keep_trailing,
        }
    }

    pub fn classify(&self, s: &str) -> PathKind {
        self.classifier.classify(s)
    }

    /// Translates `s`, which may be a single path or a `;` or `:` separated
    /// list. Anything that is not entirely made of paths comes back as is.
    pub fn to_windows(&self, s: &str) -> String {
        if s.contains(';') {
            return self.windows_list(s).unwrap_or_else(|| s.to_string());
        }

        let kind = self.classify(s);
        if kind == PathKind::WindowsPath {
            return self.translate(s, kind);
        }
        if matches(s, POSIX_LIST_SHAPE) {
            return self.posix_list(s).unwrap_or_else(|| s.to_string());
        }
        self.translate(s, kind)
    }

    /// Translates one string already classified as `kind`.
    pub fn translate(&self, s: &str, kind: PathKind) -> String {
        match kind {
            PathKind::NotAPath => s.to_string(),
            PathKind::WindowsPath | PathKind::RelativeDotPath => {
                normalize_windows(s, self.keep_trailing)
            }
            PathKind::PosixRoot => self.root.to_string(),
            PathKind::DeviceNull => NULL_DEVICE.to_string(),
            PathKind::PosixWildcardDir(index) => {
                match self.classifier.tables().wildcard[index].drive {
                    Some(offset) => self.translate_mount(s, offset),
                    None => join_root(self.root, &normalize_windows(s, self.keep_trailing)),
                }
            }
            PathKind::PosixFixedDir | PathKind::UnknownAbsolute => {
                join_root(self.root, &normalize_windows(s, self.keep_trailing))
            }
        }
    }

    /// `/cygdrive/c/x` → `C:\x`
    fn translate_mount(&self, s: &str, offset: usize) -> String {
        let (letter, rest) = s[offset..].split_at(1);
        normalize_windows(&format!("{}:{}", letter, rest), self.keep_trailing)
    }

    fn windows_list(&self, s: &str) -> Option<String> {
        let mut parts = vec![];
        for token in s.split(';').filter(|t| !t.is_empty()) {
            match self.classify(token) {
                kind @ (PathKind::WindowsPath | PathKind::RelativeDotPath) => {
                    parts.push(self.translate(token, kind))
                }
                _ => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(parts.join(";"))
    }

    fn posix_list(&self, s: &str) -> Option<String> {
        let mut parts = vec![];
        for (i, token) in s.split(':').enumerate() {
            if token.is_empty() {
                if i == 0 {
                    return None;
                }
                continue;
            }
            let kind = self.classify(token);
            if !kind.is_path() {
                log::trace!("'{}' is not a path list: '{}'", s, token);
                return None;
            }
            parts.push(self.translate(token, kind));
        }
        if parts.is_empty() {
            return None;
        }
        Some(parts.join(";"))
    }
}
