use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    cli::Cli,
    common::{Error, CONFIGURATION_EXIT_CODE},
    module::{Config, PosixRoot},
    path::Translator,
    process::{strip_verbatim, Arg, Launch, Resolver, Supervisor, SystemProcesses},
    rewrite::{finalize, rewrite_arguments, DerivedEntries, EnvRewriter, EnvironmentEntry},
    signal::{setup_signal_handler, Interrupt},
};

fn lookup(name: &str) -> Option<String> {
    env::var(name).ok()
}

pub fn execute(cli: Cli) -> Result<i32, Error> {
    let interrupt = Arc::new(
        Interrupt::new().map_err(|err| Error::Configuration(format!("Cannot create interrupt event: {}", err)))?,
    );
    setup_signal_handler(interrupt.clone());

    let exe = env::current_exe().ok();
    let root = PosixRoot::resolve(cli.root.as_deref(), lookup, exe.as_deref())?;
    log::debug!("POSIX root: {}", root.as_str());
    let config = cli.config(root);
    let translator = Translator::new(&config);

    if let Some(dir) = &cli.workdir {
        // translated paths only exist on Windows
        let dir = if cfg!(windows) {
            working_directory(&translator, dir)
        } else {
            PathBuf::from(dir)
        };
        log::debug!("working directory: {}", dir.display());
        env::set_current_dir(&dir).map_err(|err| {
            Error::Configuration(format!("Cannot change directory to '{}': {}", dir.display(), err))
        })?;
    }
    let cwd = env::current_dir()
        .map_err(|err| Error::Configuration(format!("Cannot get current directory: {}", err)))?;

    if cli.print_args {
        return print_arguments(&translator, cli.command);
    }

    let rewriter = EnvRewriter::new(&config);
    let entries = rewriter.rewrite(rewriter.collect(env::vars_os())?);
    let pwd = translator.to_windows(&strip_verbatim(&cwd));
    let derived = DerivedEntries::from_environment(&translator, lookup, config.root.as_str(), &pwd)?;

    if cli.print_env {
        return print_environment(&finalize(entries, derived), &cli.command);
    }

    let mut args = cli.command;
    let program = match args.first() {
        Some(program) => translator.to_windows(program),
        None => return Err(Error::Configuration("Missing PROGRAM".into())),
    };
    rewrite_arguments(&translator, &mut args, 1);

    let search_dirs = derived.search_dirs();
    let resolved = Resolver::new(&cwd, &search_dirs)
        .with_interpreter(lookup("COMSPEC"))
        .resolve(&program)?;

    let argv = resolved.command(args.into_iter().skip(1));
    run(&config, &interrupt, resolved.application, argv, finalize(entries, derived), &cwd)
}

fn run(
    config: &Config,
    interrupt: &Interrupt,
    application: String,
    argv: Vec<Arg>,
    env: Vec<EnvironmentEntry>,
    cwd: &Path,
) -> Result<i32, Error> {
    let mut launch = Launch::new(application, argv, env, cwd)?;
    let mut process = launch.spawn()?;
    let supervisor = Supervisor::new(SystemProcesses, interrupt, config.timeout, config.grace);
    Ok(supervisor.supervise(&mut process))
}

/// `-w` takes POSIX or native paths; trailing separators are dropped unless
/// they end a root.
fn working_directory(translator: &Translator, dir: &str) -> PathBuf {
    let trimmed = dir.trim_end_matches(['/', '\\']);
    let dir = if trimmed.is_empty() || trimmed.ends_with(':') { dir } else { trimmed };
    PathBuf::from(translator.to_windows(dir))
}

/// Every argument, PROGRAM included, translated and printed one per line.
fn print_arguments(translator: &Translator, mut args: Vec<String>) -> Result<i32, Error> {
    rewrite_arguments(translator, &mut args, 0);
    write_lines(args.iter())?;
    Ok(0)
}

/// The environment PROGRAM would get. With `names`, only those variables;
/// nothing matching is reported like a missing file.
fn print_environment(env: &[EnvironmentEntry], names: &[String]) -> Result<i32, Error> {
    let selected: Vec<&EnvironmentEntry> = env
        .iter()
        .filter(|entry| names.is_empty() || names.iter().any(|name| *name == entry.name))
        .collect();
    write_lines(selected.iter())?;
    if selected.is_empty() {
        return Ok(CONFIGURATION_EXIT_CODE);
    }
    Ok(0)
}

fn write_lines<I, T>(lines: I) -> Result<(), Error>
where
    I: Iterator<Item = T>,
    T: std::fmt::Display,
{
    let mut out = io::stdout().lock();
    for line in lines {
        writeln!(out, "{}", line).map_err(|err| Error::Configuration(format!("Cannot write output: {}", err)))?;
    }
    Ok(())
}
