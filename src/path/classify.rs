use super::matcher::match_pattern;
use crate::module::TranslationTables;

/// How a string should be translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    NotAPath,
    /// `C:`, `C:\...`, `\\server\share`, `\\?\C:\...` (either separator)
    WindowsPath,
    /// `.`, `..`, `./...`, `../...`
    RelativeDotPath,
    /// exactly `/`
    PosixRoot,
    /// a single-component path listed in the fixed table
    PosixFixedDir,
    /// a path matched by the wildcard rule at this index
    PosixWildcardDir(usize),
    /// `/dev/null`
    DeviceNull,
    /// an absolute path outside both tables, only produced in force mode
    UnknownAbsolute,
}

impl PathKind {
    pub fn is_path(self) -> bool {
        self != PathKind::NotAPath
    }
}

pub fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// `X:` followed by a separator or nothing, or a UNC / long path prefix.
pub fn is_windows_path(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':' {
        return b.len() == 2 || is_separator(b[2] as char);
    }
    b.len() >= 3 && is_separator(b[0] as char) && is_separator(b[1] as char) && !is_separator(b[2] as char)
}

/// `.` or `..`, alone or followed by a separator.
pub fn is_dot_path(s: &str) -> bool {
    [s.strip_prefix(".."), s.strip_prefix('.')]
        .into_iter()
        .flatten()
        .any(|rest| rest.is_empty() || rest.starts_with(is_separator))
}

/// Classifies strings against a set of translation tables.
pub struct Classifier<'a> {
    tables: &'a TranslationTables,
    force: bool,
}

impl<'a> Classifier<'a> {
    /// With `force`, absolute paths outside the tables are still treated as
    /// paths instead of plain text.
    pub fn new(tables: &'a TranslationTables, force: bool) -> Self {
        Self { tables, force }
    }

    pub fn tables(&self) -> &TranslationTables {
        self.tables
    }

    pub fn classify(&self, s: &str) -> PathKind {
        match s.chars().next() {
            None | Some('\'') | Some('"') => PathKind::NotAPath,
            _ if is_dot_path(s) => PathKind::RelativeDotPath,
            _ if is_windows_path(s) => PathKind::WindowsPath,
            Some('/') => self.classify_absolute(s),
            _ => PathKind::NotAPath,
        }
    }

    fn classify_absolute(&self, s: &str) -> PathKind {
        if s == "/" {
            return PathKind::PosixRoot;
        }
        if s == "/dev/null" {
            return PathKind::DeviceNull;
        }

        let found = if s[1..].contains('/') {
            self.tables
                .wildcard
                .iter()
                .position(|rule| match_pattern(s, &rule.pattern).is_match())
                .map(PathKind::PosixWildcardDir)
        } else {
            self.tables
                .fixed
                .iter()
                .any(|dir| dir == s)
                .then_some(PathKind::PosixFixedDir)
        };

        match found {
            Some(kind) => kind,
            None if self.force => PathKind::UnknownAbsolute,
            None => PathKind::NotAPath,
        }
    }
}
