use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{common::Error, path::normalize_windows};

use super::TranslationTables;

/// Variables consulted, in order, for the POSIX root when `--root` is not given.
/// `POSIXRUN_ROOT` is what we export to the child, so nested runs agree.
pub const ROOT_VARIABLES: &[&str] = &["POSIXRUN_ROOT", "POSIX_ROOT", "CYGWIN_ROOT"];

/// Install locations checked last.
pub const DEFAULT_ROOTS: &[&str] = &["C:\\cygwin64", "C:\\cygwin"];

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(2000);

/// What to do with an inherited environment entry that cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvPolicy {
    #[default]
    Strict,
    Skip,
}

/// The Windows directory that stands in for `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosixRoot(String);

impl PosixRoot {
    /// Normalizes `dir` (backslashes, upper-case drive, no trailing separator
    /// unless it is a drive root). Fails when nothing is left.
    pub fn new(dir: &str) -> Result<Self, Error> {
        let root = normalize_windows(dir.trim(), false);
        if root.is_empty() {
            return Err(Error::Configuration("Cannot find valid POSIX root".into()));
        }
        Ok(Self(root))
    }

    /// Picks the root from, in order: the explicit override, the root
    /// variables, an install containing the running executable, and the
    /// default install locations.
    pub fn resolve<F>(explicit: Option<&str>, lookup: F, exe: Option<&Path>) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = explicit {
            return Self::new(dir);
        }

        let inherited = ROOT_VARIABLES
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty());
        if let Some(dir) = inherited {
            log::debug!("POSIX root from environment: {}", dir);
            return Self::new(&dir);
        }

        let discovered = exe
            .and_then(discover_install)
            .or_else(|| DEFAULT_ROOTS.iter().map(PathBuf::from).find(|p| is_install(p)));
        match discovered {
            Some(dir) => {
                log::debug!("POSIX root discovered at {}", dir.display());
                Self::new(&dir.to_string_lossy())
            }
            None => Err(Error::Configuration("Cannot find valid POSIX root".into())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A POSIX installation is recognized by its mount table.
fn is_install(dir: &Path) -> bool {
    dir.join("etc").join("fstab").is_file()
}

/// Walks up from the executable's directory looking for an installation.
pub fn discover_install(exe: &Path) -> Option<PathBuf> {
    exe.parent()?
        .ancestors()
        .find(|dir| is_install(dir))
        .map(Path::to_path_buf)
}

/// Everything the translation and launch stages need, fixed at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PosixRoot,
    pub tables: TranslationTables,

    /// translate absolute paths missing from the tables
    pub force_unknown: bool,
    pub keep_trailing: bool,

    /// keep POSIX shell variables such as `SHELL` and `TERM`
    pub keep_posix_env: bool,
    /// forward environment values untranslated
    pub skip_env: bool,

    /// variable-name patterns forwarded untranslated
    pub exclude: Vec<String>,
    /// variable-name patterns never forwarded
    pub unset: Vec<String>,
    pub env_policy: EnvPolicy,

    pub timeout: Option<Duration>,
    pub grace: Duration,
}

impl Config {
    pub fn new(root: PosixRoot) -> Self {
        Self {
            root,
            tables: TranslationTables::default(),
            force_unknown: false,
            keep_trailing: false,
            keep_posix_env: false,
            skip_env: false,
            exclude: vec![],
            unset: vec![],
            env_policy: EnvPolicy::default(),
            timeout: None,
            grace: DEFAULT_GRACE_PERIOD,
        }
    }
}
