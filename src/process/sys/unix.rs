use std::{
    io,
    os::unix::process::ExitStatusExt,
    process::{Child, Command, ExitStatus},
    thread,
    time::{Duration, Instant},
};

use nix::{
    errno::Errno,
    sys::signal::{kill, Signal},
    unistd::Pid,
};

use crate::{
    process::{
        launch::Launch,
        quote::Arg,
        supervise::{ProcessTable, Supervised, WaitOutcome},
        tree::ProcessEntry,
    },
    signal::Interrupt,
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A child started through `std::process`. There is no suspended state here:
/// the child runs as soon as it is spawned.
#[derive(Debug)]
pub struct Process {
    child: Child,
}

pub fn spawn_suspended(launch: &mut Launch) -> io::Result<Process> {
    let child = Command::new(&launch.application)
        .args(launch.args.iter().skip(1).map(Arg::as_str))
        .env_clear()
        .envs(launch.env.iter().map(|entry| (&entry.name, &entry.value)))
        .current_dir(&launch.cwd)
        .spawn()?;
    Ok(Process { child })
}

impl Process {
    pub fn resume(&self) -> io::Result<()> {
        Ok(())
    }
}

fn exit_code(status: ExitStatus) -> u32 {
    match status.code() {
        Some(code) => code as u32,
        None => 128 + status.signal().unwrap_or(0) as u32,
    }
}

fn send(pid: u32, signal: Signal) -> io::Result<()> {
    match kill(Pid::from_raw(pid as i32), signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

impl Supervised for Process {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn wait(&mut self, interrupt: Option<&Interrupt>, timeout: Option<Duration>) -> io::Result<WaitOutcome> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(WaitOutcome::Exited(exit_code(status)));
            }
            if interrupt.map_or(false, Interrupt::is_raised) {
                return Ok(WaitOutcome::Interrupted);
            }
            if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                return Ok(WaitOutcome::TimedOut);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn interrupt(&mut self) -> io::Result<()> {
        send(self.pid(), Signal::SIGINT)
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }
}

/// Processes as listed under `/proc`. Other Unix systems report an empty
/// table, so only the child itself is terminated there.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl ProcessTable for SystemProcesses {
    #[cfg(target_os = "linux")]
    fn snapshot(&self) -> io::Result<Vec<ProcessEntry>> {
        let mut entries = vec![];
        for dir in std::fs::read_dir("/proc")?.flatten() {
            let pid = match dir.file_name().to_str().and_then(|name| name.parse().ok()) {
                Some(pid) => pid,
                None => continue,
            };
            // gone already
            let Ok(stat) = std::fs::read_to_string(dir.path().join("stat")) else {
                continue;
            };
            if let Some(entry) = parse_stat(pid, &stat) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    #[cfg(not(target_os = "linux"))]
    fn snapshot(&self) -> io::Result<Vec<ProcessEntry>> {
        Ok(vec![])
    }

    fn terminate(&self, pid: u32) -> io::Result<()> {
        send(pid, Signal::SIGKILL)
    }
}

/// `pid (name) state ppid ...`; the name may itself contain parentheses.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_stat(pid: u32, stat: &str) -> Option<ProcessEntry> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    let name = stat.get(open + 1..close)?;
    let mut fields = stat.get(close + 1..)?.split_whitespace();
    let _state = fields.next()?;
    let ppid = fields.next()?.parse().ok()?;
    Some(ProcessEntry::new(pid, ppid, name))
}
