use std::{fs, path::Path};

use super::quote::{quote, Arg};
use crate::common::Error;

/// Paths at least this long keep their `\\?\` prefix.
const MAX_SHORT_PATH: usize = 256;

const SCRIPT_EXTENSIONS: &[&str] = &["bat", "cmd"];
const DEFAULT_INTERPRETER: &str = "cmd.exe";

/// What actually gets started for a program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// passed to the native create call
    pub application: String,
    /// leading arguments, the application itself first
    pub argv: Vec<Arg>,
    /// batch script run by the interpreter in `application`
    pub script: Option<String>,
}

impl Resolved {
    /// The complete argument vector with the program's own `args` appended.
    ///
    /// For a batch script everything after `/C` is wrapped in one more pair
    /// of quotes: `cmd` strips the outermost pair of a line holding more
    /// than two.
    pub fn command<I>(&self, args: I) -> Vec<Arg>
    where
        I: IntoIterator<Item = String>,
    {
        let mut argv = self.argv.clone();
        match &self.script {
            Some(script) => {
                let mut line = format!("\"\"{}\"", script);
                for arg in args {
                    line.push(' ');
                    line.push_str(&quote(&arg));
                }
                line.push('"');
                argv.push(Arg::Raw(line));
            }
            None => argv.extend(args.into_iter().map(Arg::Regular)),
        }
        argv
    }
}

/// Finds executables in the working directory, then in the search path.
pub struct Resolver<'a> {
    cwd: &'a Path,
    search_dirs: &'a [String],
    interpreter: Option<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(cwd: &'a Path, search_dirs: &'a [String]) -> Self {
        Self {
            cwd,
            search_dirs,
            interpreter: None,
        }
    }

    /// Command interpreter for batch scripts, usually `%COMSPEC%`.
    pub fn with_interpreter(mut self, interpreter: Option<String>) -> Self {
        self.interpreter = interpreter.filter(|i| !i.trim().is_empty());
        self
    }

    /// Resolves `program` (already translated) to an absolute path. Batch
    /// scripts are run through the command interpreter.
    pub fn resolve(&self, program: &str) -> Result<Resolved, Error> {
        let path = self.find(program)?;
        if !is_script(&path) {
            return Ok(Resolved {
                application: path.clone(),
                argv: vec![Arg::Regular(path)],
                script: None,
            });
        }

        let interpreter = match &self.interpreter {
            Some(interpreter) => interpreter.clone(),
            None => self.find(DEFAULT_INTERPRETER)?,
        };
        log::debug!("running script '{}' with '{}'", path, interpreter);
        Ok(Resolved {
            application: interpreter.clone(),
            argv: vec![Arg::Regular(interpreter), Arg::from("/D"), Arg::from("/C")],
            script: Some(path),
        })
    }

    /// Absolute path of `program`, with the `\\?\` prefix removed from short
    /// drive-letter paths.
    pub fn find(&self, program: &str) -> Result<String, Error> {
        let found = std::iter::once(self.cwd.as_os_str())
            .chain(self.search_dirs.iter().map(|dir| Path::new(dir).as_os_str()))
            .find_map(|dir| which::which_in(program, Some(dir), self.cwd).ok())
            .ok_or_else(|| Error::Resolution(program.to_string()))?;

        let canonical = fs::canonicalize(&found).unwrap_or(found);
        let resolved = strip_verbatim(&canonical);
        log::debug!("resolved '{}' to '{}'", program, resolved);
        Ok(resolved)
    }
}

fn is_script(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| SCRIPT_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
}

/// `\\?\C:\x` → `C:\x` for paths short enough to work without the prefix.
/// Verbatim UNC paths are left alone.
pub fn strip_verbatim(path: &Path) -> String {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix(r"\\?\") {
        let bytes = rest.as_bytes();
        if s.len() < MAX_SHORT_PATH && bytes.len() > 1 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
            return rest.to_string();
        }
    }
    s.into_owned()
}
