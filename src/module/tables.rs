use lazy_static::lazy_static;

/// A prefix pattern for absolute POSIX paths with more than one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardRule {
    pub pattern: String,

    /// Offset of the `?` that names a drive letter, for mount rules such as
    /// `/cygdrive/?/+*`. `None` means the path is placed under the root.
    pub drive: Option<usize>,
}

impl WildcardRule {
    /// A rule whose matches are translated relative to the POSIX root.
    pub fn prefix(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            drive: None,
        }
    }

    /// A drive mount rule. The pattern must contain a `/?/` component.
    pub fn drive(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            drive: pattern.find("/?/").map(|i| i + 1),
        }
    }
}

/// Fixed (exact) and wildcarded (glob) lists of recognized POSIX directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTables {
    pub fixed: Vec<String>,
    pub wildcard: Vec<WildcardRule>,
}

impl Default for TranslationTables {
    fn default() -> Self {
        DEFAULT_TABLES.clone()
    }
}

const FIXED_DIRS: &[&str] = &[
    "/bin", "/etc", "/home", "/lib", "/lib64", "/media", "/opt", "/root", "/run", "/sbin", "/tmp",
    "/usr", "/var",
];

const DRIVE_MOUNTS: &[&str] = &["/cygdrive/?/+*"];

const WILDCARD_DIRS: &[&str] = &[
    "/bin/*", "/dev/*", "/dir/*", "/etc/*", "/home/*", "/lib/*", "/lib64/*", "/media/*", "/mnt/*",
    "/opt/*", "/proc/*", "/root/*", "/run/*", "/sbin/*", "/tmp/*", "/usr/*", "/var/*",
];

/// Variables that are never forwarded to the child.
pub const PRIVATE_VARIABLES: &[&str] = &[
    "_",
    "!::",
    "!;",
    "CYGWIN_ROOT",
    "OLDPWD",
    "ORIGINAL_PATH",
    "ORIGINAL_TEMP",
    "ORIGINAL_TMP",
    "PATH",
    "POSIX_ROOT",
    "POSIXRUN_ROOT",
    "PS1",
    "PWD",
    "temp",
    "tmp",
];

/// POSIX shell state that means nothing to a native program.
/// Dropped unless `--keep-posix-env` is given.
pub const SHELL_VARIABLES: &[&str] = &[
    "INFOPATH",
    "MANPATH",
    "PROFILEREAD",
    "SHELL",
    "SHLVL",
    "TERM",
];

lazy_static! {
    static ref DEFAULT_TABLES: TranslationTables = TranslationTables {
        fixed: FIXED_DIRS.iter().map(|s| s.to_string()).collect(),
        wildcard: DRIVE_MOUNTS
            .iter()
            .map(|s| WildcardRule::drive(s))
            .chain(WILDCARD_DIRS.iter().map(|s| WildcardRule::prefix(s)))
            .collect(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_rule_records_the_letter_offset() {
        let rule = WildcardRule::drive("/cygdrive/?/+*");
        assert_eq!(rule.drive, Some(10));
        assert_eq!(WildcardRule::prefix("/usr/*").drive, None);
    }

    #[test]
    fn drive_mounts_are_scanned_first() {
        let tables = TranslationTables::default();
        assert!(tables.wildcard[0].drive.is_some());
        assert!(tables.fixed.contains(&"/usr".to_string()));
    }
}
