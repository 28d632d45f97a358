use assert_cmd::Command;
use predicates::prelude::*;

const ROOT: &str = "C:\\cygwin64";

/// posixrun with a clean, predictable environment.
fn posixrun() -> Command {
    let mut cmd = Command::cargo_bin("posixrun").expect("posixrun binary");
    cmd.env_clear()
        .env("PATH", "/usr/local/bin:/usr/bin")
        .env("TEMP", "/tmp")
        .arg("--root")
        .arg(ROOT);
    cmd
}

#[test]
fn help_names_the_program() {
    Command::cargo_bin("posixrun")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("posixrun"))
        .stdout(predicate::str::contains("--print-env"));
}

#[test]
fn missing_program_is_a_usage_error() {
    posixrun().assert().code(2);
}

#[test]
fn arguments_are_printed_translated() {
    posixrun()
        .args(["-p", "/usr/bin/gcc", "--prefix=/usr/local", "C:/Windows", "-I/usr/include", "hello"])
        .assert()
        .success()
        .stdout(
            "C:\\cygwin64\\usr\\bin\\gcc\n\
             --prefix=C:\\cygwin64\\usr\\local\n\
             C:\\Windows\n\
             -I/usr/include\n\
             hello\n",
        );
}

#[test]
fn urls_are_passed_through() {
    posixrun()
        .args(["-p", "git", "clone", "https://example.com/repo.git", "/usr/src/repo"])
        .assert()
        .success()
        .stdout("git\nclone\nhttps://example.com/repo.git\nC:\\cygwin64\\usr\\src\\repo\n");
}

#[test]
fn force_translates_unknown_directories() {
    posixrun()
        .args(["-p", "/srv/www"])
        .assert()
        .success()
        .stdout("/srv/www\n");
    posixrun()
        .args(["-f", "-p", "/srv/www"])
        .assert()
        .success()
        .stdout("C:\\cygwin64\\srv\\www\n");
}

#[test]
fn environment_values_are_translated() {
    posixrun()
        .env("LD_LIBRARY_PATH", "/usr/lib:/usr/local/lib")
        .args(["-e", "LD_LIBRARY_PATH", "PATH", "TMP"])
        .assert()
        .success()
        .stdout(
            "LD_LIBRARY_PATH=C:\\cygwin64\\usr\\lib;C:\\cygwin64\\usr\\local\\lib\n\
             PATH=C:\\cygwin64\\usr\\local\\bin;C:\\cygwin64\\usr\\bin\n\
             TMP=C:\\cygwin64\\tmp\n",
        );
}

#[test]
fn shell_variables_are_dropped_unless_kept() {
    posixrun()
        .env("TERM", "xterm")
        .args(["-e", "TERM"])
        .assert()
        .code(2)
        .stdout("");
    posixrun()
        .env("TERM", "xterm")
        .args(["-k", "-e", "TERM"])
        .assert()
        .success()
        .stdout("TERM=xterm\n");
}

#[test]
fn exclude_and_unset_patterns() {
    posixrun()
        .env("HOME", "/home/user")
        .env("SECRET_TOKEN", "/x/y")
        .args(["-x", "HO*", "-u", "SECRET_*", "-e", "HOME", "SECRET_TOKEN"])
        .assert()
        .success()
        .stdout("HOME=/home/user\n");
}

#[test]
fn root_comes_from_the_environment() {
    let mut cmd = Command::cargo_bin("posixrun").unwrap();
    cmd.env_clear()
        .env("PATH", "/usr/bin")
        .env("TEMP", "/tmp")
        .env("POSIX_ROOT", "d:/msys64/")
        .args(["-e", "POSIXRUN_ROOT", "PATH"])
        .assert()
        .success()
        .stdout("PATH=D:\\msys64\\usr\\bin\nPOSIXRUN_ROOT=D:\\msys64\n");
}

#[test]
fn missing_path_is_a_configuration_error() {
    let mut cmd = Command::cargo_bin("posixrun").unwrap();
    cmd.env_clear()
        .env("TEMP", "/tmp")
        .args(["--root", ROOT, "-e"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("posixrun: Missing PATH"));
}

#[test]
fn quiet_suppresses_diagnostics() {
    let mut cmd = Command::cargo_bin("posixrun").unwrap();
    cmd.env_clear()
        .env("TEMP", "/tmp")
        .args(["--root", ROOT, "-q", "-e"])
        .assert()
        .code(2)
        .stderr("");
}

#[test]
fn unknown_program_is_not_found() {
    posixrun()
        .arg("no-such-program-anywhere")
        .assert()
        .code(127)
        .stderr(predicate::str::contains("Cannot find PROGRAM 'no-such-program-anywhere'"));
}

#[cfg(windows)]
#[test]
fn workdir_is_translated_under_the_root() {
    let root = tempfile::tempdir().expect("temporary directory");
    std::fs::create_dir_all(root.path().join("usr").join("src")).expect("usr/src");
    let mut cmd = Command::cargo_bin("posixrun").unwrap();
    cmd.env_clear()
        .env("PATH", "/usr/bin")
        .env("TEMP", "/tmp")
        .arg("--root")
        .arg(root.path())
        .args(["-w", "/usr/src/", "-e", "PWD"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("PWD=").and(predicate::str::ends_with("\\usr\\src\n")));
}

#[cfg(unix)]
mod exec {
    use super::*;
    use serial_test::serial;
    use std::{
        fs,
        os::unix::fs::PermissionsExt,
        time::{Duration, Instant},
    };
    use tempfile::TempDir;

    /// A working directory holding one executable shell script.
    struct ScriptFixture {
        dir: TempDir,
    }

    impl ScriptFixture {
        fn new(name: &str, body: &str) -> Self {
            let dir = tempfile::tempdir().expect("temporary directory");
            let path = dir.path().join(name);
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("script");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("permissions");
            Self { dir }
        }

        fn command(&self) -> Command {
            let mut cmd = posixrun();
            cmd.current_dir(self.dir.path());
            cmd
        }
    }

    #[test]
    #[serial]
    fn exit_code_is_propagated() {
        let fixture = ScriptFixture::new("fail.sh", "exit 3");
        fixture.command().arg("fail.sh").assert().code(3);
    }

    #[test]
    #[serial]
    fn child_sees_translated_arguments_and_environment() {
        let fixture = ScriptFixture::new("show.sh", "printf '%s\\n' \"$@\" \"$HOME\" \"${TERM:-none}\"");
        fixture
            .command()
            .env("HOME", "/home/user")
            .env("TERM", "xterm")
            .args(["show.sh", "/usr/bin", "--prefix=/usr/local", "'/etc'", "a b"])
            .assert()
            .success()
            .stdout(
                "C:\\cygwin64\\usr\\bin\n\
                 --prefix=C:\\cygwin64\\usr\\local\n\
                 '/etc'\n\
                 a b\n\
                 C:\\cygwin64\\home\\user\n\
                 none\n",
            );
    }

    #[test]
    #[serial]
    fn workdir_option_changes_directory() {
        let fixture = ScriptFixture::new("ok.sh", "exit 0");
        posixrun()
            .arg("-w")
            .arg(fixture.dir.path())
            .arg("ok.sh")
            .assert()
            .success();
    }

    #[test]
    #[serial]
    fn stubborn_child_is_terminated_after_timeout() {
        let fixture = ScriptFixture::new("spin.sh", "trap '' INT\nwhile :; do :; done");
        let started = Instant::now();
        fixture
            .command()
            .args(["-t", "1", "--grace", "200", "spin.sh"])
            .assert()
            .code(137);
        assert!(started.elapsed() < Duration::from_secs(20));
    }
}
