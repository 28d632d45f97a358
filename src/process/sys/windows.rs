use std::{
    ffi::OsStr,
    io, mem,
    os::windows::{
        ffi::OsStrExt,
        io::{AsRawHandle, FromRawHandle, OwnedHandle, RawHandle},
    },
    ptr,
    time::Duration,
};

use windows_sys::Win32::{
    Foundation::{
        ERROR_INVALID_PARAMETER, HANDLE, INVALID_HANDLE_VALUE, WAIT_OBJECT_0, WAIT_TIMEOUT,
    },
    System::{
        Console::{GenerateConsoleCtrlEvent, CTRL_C_EVENT},
        Diagnostics::ToolHelp::{
            CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
            TH32CS_SNAPPROCESS,
        },
        Threading::{
            CreateEventW, CreateProcessW, GetExitCodeProcess, OpenProcess, ResumeThread, SetEvent,
            TerminateProcess, WaitForMultipleObjects, CREATE_SUSPENDED, CREATE_UNICODE_ENVIRONMENT,
            INFINITE, PROCESS_INFORMATION, PROCESS_TERMINATE, STARTUPINFOW,
        },
    },
};

use crate::{
    common::TERMINATED_EXIT_CODE,
    process::{
        launch::Launch,
        supervise::{ProcessTable, Supervised, WaitOutcome},
        tree::ProcessEntry,
    },
    signal::Interrupt,
};

fn wide(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(Some(0)).collect()
}

fn raw(handle: &OwnedHandle) -> HANDLE {
    handle.as_raw_handle() as HANDLE
}

/// Takes ownership of a handle returned by a Win32 call, which reports
/// failure as null or `INVALID_HANDLE_VALUE`.
fn owned(handle: HANDLE) -> io::Result<OwnedHandle> {
    if handle == 0 || handle == INVALID_HANDLE_VALUE {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { OwnedHandle::from_raw_handle(handle as RawHandle) })
}

fn check(result: i32) -> io::Result<()> {
    if result == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Manual-reset event, initially unsignaled.
pub fn create_event() -> io::Result<OwnedHandle> {
    owned(unsafe { CreateEventW(ptr::null(), 1, 0, ptr::null()) })
}

pub fn set_event(event: &OwnedHandle) {
    unsafe { SetEvent(raw(event)) };
}

fn wait_millis(timeout: Option<Duration>) -> u32 {
    match timeout {
        Some(timeout) => timeout.as_millis().min(INFINITE as u128 - 1) as u32,
        None => INFINITE,
    }
}

#[derive(Debug)]
pub struct Process {
    process: OwnedHandle,
    thread: OwnedHandle,
    pid: u32,
}

/// Creates the child with its primary thread suspended.
pub fn spawn_suspended(launch: &mut Launch) -> io::Result<Process> {
    let application = wide(OsStr::new(&launch.application));
    let cwd = wide(launch.cwd.as_os_str());

    let mut startup: STARTUPINFOW = unsafe { mem::zeroed() };
    startup.cb = mem::size_of::<STARTUPINFOW>() as u32;
    let mut info: PROCESS_INFORMATION = unsafe { mem::zeroed() };

    check(unsafe {
        CreateProcessW(
            application.as_ptr(),
            launch.command_line.as_mut_ptr(),
            ptr::null(),
            ptr::null(),
            1,
            CREATE_SUSPENDED | CREATE_UNICODE_ENVIRONMENT,
            launch.environment.as_ptr().cast(),
            cwd.as_ptr(),
            &startup,
            &mut info,
        )
    })?;

    Ok(Process {
        process: owned(info.hProcess)?,
        thread: owned(info.hThread)?,
        pid: info.dwProcessId,
    })
}

impl Process {
    pub fn resume(&self) -> io::Result<()> {
        if unsafe { ResumeThread(raw(&self.thread)) } == u32::MAX {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn exit_code(&self) -> io::Result<u32> {
        let mut code = 0u32;
        check(unsafe { GetExitCodeProcess(raw(&self.process), &mut code) })?;
        Ok(code)
    }
}

impl Supervised for Process {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn wait(&mut self, interrupt: Option<&Interrupt>, timeout: Option<Duration>) -> io::Result<WaitOutcome> {
        let mut handles = vec![raw(&self.process)];
        if let Some(interrupt) = interrupt {
            handles.push(raw(interrupt.event()));
        }
        let result = unsafe {
            WaitForMultipleObjects(handles.len() as u32, handles.as_ptr(), 0, wait_millis(timeout))
        };
        match result {
            r if r == WAIT_OBJECT_0 => Ok(WaitOutcome::Exited(self.exit_code()?)),
            r if r == WAIT_OBJECT_0 + 1 => Ok(WaitOutcome::Interrupted),
            r if r == WAIT_TIMEOUT => Ok(WaitOutcome::TimedOut),
            _ => Err(io::Error::last_os_error()),
        }
    }

    /// Sends Ctrl-C to every process attached to our console.
    fn interrupt(&mut self) -> io::Result<()> {
        check(unsafe { GenerateConsoleCtrlEvent(CTRL_C_EVENT, 0) })
    }

    fn kill(&mut self) -> io::Result<()> {
        check(unsafe { TerminateProcess(raw(&self.process), TERMINATED_EXIT_CODE as u32) })
    }
}

/// Processes as seen through a ToolHelp snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl ProcessTable for SystemProcesses {
    fn snapshot(&self) -> io::Result<Vec<ProcessEntry>> {
        let snapshot = owned(unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) })?;
        let mut entry: PROCESSENTRY32W = unsafe { mem::zeroed() };
        entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

        let mut entries = vec![];
        let mut more = unsafe { Process32FirstW(raw(&snapshot), &mut entry) } != 0;
        while more {
            let len = entry.szExeFile.iter().position(|&c| c == 0).unwrap_or(entry.szExeFile.len());
            entries.push(ProcessEntry::new(
                entry.th32ProcessID,
                entry.th32ParentProcessID,
                String::from_utf16_lossy(&entry.szExeFile[..len]),
            ));
            more = unsafe { Process32NextW(raw(&snapshot), &mut entry) } != 0;
        }
        Ok(entries)
    }

    fn terminate(&self, pid: u32) -> io::Result<()> {
        let process = match owned(unsafe { OpenProcess(PROCESS_TERMINATE, 0, pid) }) {
            Ok(process) => process,
            Err(err) if err.raw_os_error() == Some(ERROR_INVALID_PARAMETER as i32) => {
                log::debug!("process {} is already gone", pid);
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        check(unsafe { TerminateProcess(raw(&process), TERMINATED_EXIT_CODE as u32) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{process::quote::Arg, rewrite::EnvironmentEntry};
    use std::{env, path::Path};

    #[test]
    fn event_is_manual_reset() {
        let interrupt = Interrupt::new().unwrap();
        interrupt.raise();
        let handles = [raw(interrupt.event())];
        for _ in 0..2 {
            let result = unsafe { WaitForMultipleObjects(1, handles.as_ptr(), 0, 0) };
            assert_eq!(result, WAIT_OBJECT_0);
        }
    }

    #[test]
    fn child_exit_code_is_reported() {
        let comspec = env::var("COMSPEC").unwrap_or_else(|_| "C:\\Windows\\System32\\cmd.exe".into());
        let env: Vec<EnvironmentEntry> = env::vars().map(|(n, v)| EnvironmentEntry::new(n, v)).collect();
        let args = vec![Arg::from(comspec.as_str()), Arg::from("/D"), Arg::from("/C"), Arg::from("exit 3")];
        let mut launch = Launch::new(comspec.clone(), args, env, Path::new("C:\\")).unwrap();
        let mut process = launch.spawn().unwrap();
        assert_eq!(process.wait(None, None).unwrap(), WaitOutcome::Exited(3));
    }

    #[test]
    fn snapshot_includes_this_process() {
        let entries = SystemProcesses.snapshot().unwrap();
        assert!(entries.iter().any(|entry| entry.pid == std::process::id()));
    }
}
