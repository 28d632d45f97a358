use std::{io, time::Duration};

use super::tree::{descendants, ProcessEntry};
use crate::{common::TERMINATED_EXIT_CODE, signal::Interrupt};

/// Why a wait returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Exited(u32),
    Interrupted,
    TimedOut,
}

/// A running child the supervisor can wait on and stop.
pub trait Supervised {
    fn pid(&self) -> u32;

    /// Blocks until the process exits, `interrupt` is raised (when given),
    /// or `timeout` elapses. `None` waits without bound.
    fn wait(&mut self, interrupt: Option<&Interrupt>, timeout: Option<Duration>) -> io::Result<WaitOutcome>;

    /// Asks the process to stop on its own.
    fn interrupt(&mut self) -> io::Result<()>;

    fn kill(&mut self) -> io::Result<()>;
}

/// System-wide view of running processes.
pub trait ProcessTable {
    fn snapshot(&self) -> io::Result<Vec<ProcessEntry>>;

    /// Force-terminates `pid`. A process that is already gone is not an error.
    fn terminate(&self, pid: u32) -> io::Result<()>;
}

/// Native exit codes are unsigned; anything past a byte reports as 255.
pub fn clamp_exit_code(code: u32) -> i32 {
    code.min(255) as i32
}

pub struct Supervisor<'a, T> {
    table: T,
    interrupt: &'a Interrupt,
    timeout: Option<Duration>,
    grace: Duration,
}

impl<'a, T: ProcessTable> Supervisor<'a, T> {
    pub fn new(table: T, interrupt: &'a Interrupt, timeout: Option<Duration>, grace: Duration) -> Self {
        Self {
            table,
            interrupt,
            timeout,
            grace,
        }
    }

    /// Waits for `child` and returns the exit code to report. Failures past
    /// this point are logged and end in forced termination.
    pub fn supervise<C: Supervised>(&self, child: &mut C) -> i32 {
        let pid = child.pid();
        match child.wait(Some(self.interrupt), self.timeout) {
            Ok(WaitOutcome::Exited(code)) => {
                log::debug!("process {} exited with {}", pid, code);
                return clamp_exit_code(code);
            }
            Ok(WaitOutcome::Interrupted) => log::info!("interrupted, stopping process {}", pid),
            Ok(WaitOutcome::TimedOut) => {
                log::warn!("process {} did not finish within {:?}", pid, self.timeout.unwrap_or_default())
            }
            Err(err) => log::warn!("waiting for process {} failed: {}", pid, err),
        }
        self.stop(child)
    }

    fn stop<C: Supervised>(&self, child: &mut C) -> i32 {
        let pid = child.pid();
        if let Err(err) = child.interrupt() {
            log::warn!("cannot interrupt process {}: {}", pid, err);
        }
        match child.wait(None, Some(self.grace)) {
            Ok(WaitOutcome::Exited(code)) => {
                log::info!("process {} stopped with {}", pid, code);
                return clamp_exit_code(code);
            }
            Ok(_) => log::info!("process {} still running after {:?}, terminating", pid, self.grace),
            Err(err) => log::warn!("waiting for process {} failed: {}", pid, err),
        }

        self.terminate_tree(pid);
        if let Err(err) = child.kill() {
            log::warn!("cannot terminate process {}: {}", pid, err);
        }
        if let Err(err) = child.wait(None, Some(self.grace)) {
            log::debug!("reaping process {} failed: {}", pid, err);
        }
        TERMINATED_EXIT_CODE
    }

    fn terminate_tree(&self, root: u32) {
        let snapshot = match self.table.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("cannot list processes: {}", err);
                return;
            }
        };
        for node in descendants(&snapshot, root) {
            log::debug!("terminating process {} (depth {}, {} below)", node.pid, node.depth, node.descendants);
            if let Err(err) = self.table.terminate(node.pid) {
                log::warn!("cannot terminate process {}: {}", node.pid, err);
            }
        }
    }
}
