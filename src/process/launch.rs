use std::path::{Path, PathBuf};

use super::{
    quote::{make_command_line, Arg},
    sys::{self, Process},
};
use crate::{common::Error, rewrite::EnvironmentEntry, signal::pass_control_to_child};

/// UTF-16 units of a command line, terminator included.
pub const MAX_COMMAND_LINE: usize = 32767;
/// UTF-16 units of an environment block, terminators included.
pub const MAX_ENVIRONMENT_BLOCK: usize = 65535;

/// A fully prepared child process: resolved program, final argument vector
/// and environment, serialized in their native form.
#[derive(Debug)]
pub struct Launch {
    pub(super) application: String,
    #[cfg_attr(windows, allow(dead_code))]
    pub(super) args: Vec<Arg>,
    #[cfg_attr(windows, allow(dead_code))]
    pub(super) env: Vec<EnvironmentEntry>,
    pub(super) cwd: PathBuf,
    /// Serialized forms handed to `CreateProcessW`.
    #[cfg_attr(unix, allow(dead_code))]
    pub(super) command_line: Vec<u16>,
    #[cfg_attr(unix, allow(dead_code))]
    pub(super) environment: Vec<u16>,
}

impl Launch {
    /// `args[0]` is the program as the child sees it, normally `application`.
    pub fn new(application: String, args: Vec<Arg>, env: Vec<EnvironmentEntry>, cwd: &Path) -> Result<Self, Error> {
        let command_line = encode_command_line(&args)?;
        let environment = encode_environment(&env)?;
        log::debug!("command line: {}", String::from_utf16_lossy(&command_line[..command_line.len() - 1]));
        log::debug!("environment block: {} entries, {} units", env.len(), environment.len());

        Ok(Self {
            application,
            args,
            env,
            cwd: cwd.to_path_buf(),
            command_line,
            environment,
        })
    }

    /// Starts the child, hands interrupts over to it, then lets it run.
    pub fn spawn(&mut self) -> Result<Process, Error> {
        let process = sys::spawn_suspended(self).map_err(|source| Error::Spawn {
            program: self.application.clone(),
            source,
        })?;
        pass_control_to_child();
        process.resume().map_err(|source| Error::Spawn {
            program: self.application.clone(),
            source,
        })?;
        Ok(process)
    }
}

/// The quoted command line as NUL-terminated UTF-16.
pub fn encode_command_line(args: &[Arg]) -> Result<Vec<u16>, Error> {
    let mut line: Vec<u16> = make_command_line(args).encode_utf16().collect();
    line.push(0);
    if line.len() > MAX_COMMAND_LINE {
        return Err(Error::TooLarge {
            what: "Command line",
            size: line.len(),
            limit: MAX_COMMAND_LINE,
        });
    }
    Ok(line)
}

/// `NAME=VALUE\0...NAME=VALUE\0\0`; an empty environment is two terminators.
pub fn encode_environment(env: &[EnvironmentEntry]) -> Result<Vec<u16>, Error> {
    let mut block: Vec<u16> = vec![];
    for entry in env {
        block.extend(entry.to_string().encode_utf16());
        block.push(0);
    }
    if block.is_empty() {
        block.push(0);
    }
    block.push(0);
    if block.len() > MAX_ENVIRONMENT_BLOCK {
        return Err(Error::TooLarge {
            what: "Environment",
            size: block.len(),
            limit: MAX_ENVIRONMENT_BLOCK,
        });
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn command_line_is_terminated() {
        let line = encode_command_line(&[Arg::from("C:\\x\\tool.exe"), Arg::from("a b")]).unwrap();
        let mut expected = units("C:\\x\\tool.exe \"a b\"");
        expected.push(0);
        assert_eq!(line, expected);
    }

    #[test]
    fn oversized_command_line_is_rejected() {
        let args = vec![Arg::from("tool.exe"), Arg::from("x".repeat(MAX_COMMAND_LINE))];
        match encode_command_line(&args) {
            Err(Error::TooLarge { limit, size, .. }) => {
                assert_eq!(limit, MAX_COMMAND_LINE);
                assert!(size > limit);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn environment_block_layout() {
        let env = vec![EnvironmentEntry::new("A", "1"), EnvironmentEntry::new("PATH", "C:\\bin")];
        let mut expected = units("A=1");
        expected.push(0);
        expected.extend(units("PATH=C:\\bin"));
        expected.extend([0, 0]);
        assert_eq!(encode_environment(&env).unwrap(), expected);
        assert_eq!(encode_environment(&[]).unwrap(), [0, 0]);
    }

    #[test]
    fn environment_limit_counts_utf16_units() {
        // "V=" + value + NUL + final NUL
        let fits = MAX_ENVIRONMENT_BLOCK - 4;
        let env = vec![EnvironmentEntry::new("V", "é".repeat(fits))];
        assert_eq!(encode_environment(&env).unwrap().len(), MAX_ENVIRONMENT_BLOCK);

        let env = vec![EnvironmentEntry::new("V", "é".repeat(fits + 1))];
        assert!(matches!(encode_environment(&env), Err(Error::TooLarge { .. })));
    }

    #[test]
    fn launch_keeps_its_parts() {
        let launch = Launch::new(
            "C:\\x\\tool.exe".into(),
            vec![Arg::from("C:\\x\\tool.exe")],
            vec![EnvironmentEntry::new("A", "1")],
            Path::new("C:\\work"),
        )
        .unwrap();
        assert_eq!(launch.application, "C:\\x\\tool.exe");
        assert_eq!(launch.args.len(), 1);
        assert_eq!(launch.env.len(), 1);
        assert_eq!(*launch.command_line.last().unwrap(), 0);
        // A=1, its terminator, the block terminator
        assert_eq!(launch.environment.len(), 5);
    }
}
