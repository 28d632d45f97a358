use std::{ffi::OsString, fmt};

use crate::{
    common::Error,
    module::{Config, EnvPolicy, PRIVATE_VARIABLES, SHELL_VARIABLES},
    path::{matches_any, Translator},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentEntry {
    pub name: String,
    pub value: String,
}

impl EnvironmentEntry {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for EnvironmentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Filters and translates the inherited environment.
pub struct EnvRewriter<'a> {
    config: &'a Config,
    translator: Translator<'a>,
}

impl<'a> EnvRewriter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            translator: Translator::new(config),
        }
    }

    /// Turns raw `(name, value)` pairs into entries. Pairs that are not valid
    /// Unicode or have no name are fatal under [`EnvPolicy::Strict`] and
    /// dropped under [`EnvPolicy::Skip`].
    pub fn collect<I>(&self, vars: I) -> Result<Vec<EnvironmentEntry>, Error>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut entries = vec![];
        for (name, value) in vars {
            match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) if !name.is_empty() => {
                    entries.push(EnvironmentEntry::new(name, value))
                }
                (name, _) => {
                    let shown = match name {
                        Ok(name) => name,
                        Err(name) => name.to_string_lossy().into_owned(),
                    };
                    match self.config.env_policy {
                        EnvPolicy::Strict => return Err(Error::MalformedEnvironment(shown)),
                        EnvPolicy::Skip => log::warn!("skipping malformed environment entry '{}'", shown),
                    }
                }
            }
        }
        Ok(entries)
    }

    /// Drops private and denied variables and translates the values of the
    /// rest, except for excluded names.
    pub fn rewrite(&self, entries: Vec<EnvironmentEntry>) -> Vec<EnvironmentEntry> {
        entries
            .into_iter()
            .filter(|entry| self.is_forwarded(&entry.name))
            .map(|mut entry| {
                if self.translates(&entry.name) && needs_translation(&entry.value) {
                    let value = self.translator.to_windows(&entry.value);
                    if value != entry.value {
                        log::debug!("{}: '{}' -> '{}'", entry.name, entry.value, value);
                        entry.value = value;
                    }
                }
                entry
            })
            .collect()
    }

    fn is_forwarded(&self, name: &str) -> bool {
        if PRIVATE_VARIABLES.contains(&name) {
            return false;
        }
        if !self.config.keep_posix_env && SHELL_VARIABLES.contains(&name) {
            return false;
        }
        !matches_any(name, &self.config.unset)
    }

    fn translates(&self, name: &str) -> bool {
        !self.config.skip_env && !matches_any(name, &self.config.exclude)
    }
}

fn needs_translation(value: &str) -> bool {
    !value.starts_with('\'') && value.contains('/')
}

/// Entries that are always set for the child, overriding inherited ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedEntries {
    pub path: String,
    pub root: String,
    pub cwd: String,
    pub temp: String,
}

impl DerivedEntries {
    /// Builds the derived entries from the inherited `PATH` and `TEMP` (or
    /// `TMP`), both of which must be present.
    pub fn from_environment<F>(translator: &Translator, lookup: F, root: &str, cwd: &str) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup("PATH")
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::Configuration("Missing PATH environment variable".into()))?;
        let temp = lookup("TEMP")
            .or_else(|| lookup("TMP"))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Configuration("Missing TEMP environment variable".into()))?;

        Ok(Self {
            path: trim_list(&translator.to_windows(&path)),
            root: root.to_string(),
            cwd: cwd.to_string(),
            temp: translator.to_windows(&temp),
        })
    }

    /// Directories of the search path, in order.
    pub fn search_dirs(&self) -> Vec<String> {
        self.path
            .split(';')
            .filter(|dir| !dir.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn into_entries(self) -> Vec<EnvironmentEntry> {
        vec![
            EnvironmentEntry::new("PATH", self.path),
            EnvironmentEntry::new("POSIXRUN_ROOT", self.root),
            EnvironmentEntry::new("PWD", self.cwd),
            EnvironmentEntry::new("TEMP", self.temp.clone()),
            EnvironmentEntry::new("TMP", self.temp),
        ]
    }
}

/// Drops trailing list separators.
fn trim_list(list: &str) -> String {
    list.trim_end_matches(';').to_string()
}

/// Sorts entries case-insensitively by name, then sets the derived entries,
/// replacing an entry of the same name (in any case) in place.
pub fn finalize(mut entries: Vec<EnvironmentEntry>, derived: DerivedEntries) -> Vec<EnvironmentEntry> {
    entries.sort_by_cached_key(|entry| entry.name.to_uppercase());
    for entry in derived.into_entries() {
        match entries
            .iter_mut()
            .find(|e| e.name.eq_ignore_ascii_case(&entry.name))
        {
            Some(existing) => existing.value = entry.value,
            None => entries.push(entry),
        }
    }
    entries
}
