use std::time::Duration;

use clap::Parser;

use crate::module::{Config, EnvPolicy, PosixRoot};

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = "Run a native Windows PROGRAM with POSIX paths in its arguments and environment translated",
    after_help = "With --print-env, ARGUMENTS are the names of the variables to print.",
    long_about = None
)]
#[command(help_template = "\
{before-help}{name} ({version})
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
")]
pub struct Cli {
    /// Use DIR as POSIX root
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<String>,

    /// Change working directory before running PROGRAM
    #[arg(short, long, value_name = "DIR")]
    pub workdir: Option<String>,

    /// Keep POSIX shell variables (SHELL, TERM, ...)
    #[arg(short, long)]
    pub keep_posix_env: bool,

    /// Do not translate environment values
    #[arg(short, long)]
    pub skip_env: bool,

    /// Translate absolute POSIX paths that are not known POSIX directories
    #[arg(short, long)]
    pub force: bool,

    /// Keep trailing path separators
    #[arg(long)]
    pub keep_trailing: bool,

    /// Forward variables matching PATTERN untranslated
    #[arg(short = 'x', long, value_name = "PATTERN", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Do not forward variables matching PATTERN
    #[arg(short, long, value_name = "PATTERN", value_delimiter = ',')]
    pub unset: Vec<String>,

    /// Terminate PROGRAM after SECONDS
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Time between interrupting PROGRAM and killing it
    #[arg(long, value_name = "MILLIS")]
    pub grace: Option<u64>,

    /// Skip malformed environment entries instead of failing
    #[arg(long)]
    pub lenient_env: bool,

    /// Do not print diagnostics
    #[arg(short, long)]
    pub quiet: bool,

    /// Print translated arguments instead of running PROGRAM
    #[arg(short, long, conflicts_with = "print_env")]
    pub print_args: bool,

    /// Print the environment PROGRAM would get and exit
    #[arg(short = 'e', long)]
    pub print_env: bool,

    #[arg(
        value_name = "PROGRAM",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "print_env"
    )]
    pub command: Vec<String>,
}

impl Cli {
    pub fn config(&self, root: PosixRoot) -> Config {
        let mut config = Config::new(root);
        config.force_unknown = self.force;
        config.keep_trailing = self.keep_trailing;
        config.keep_posix_env = self.keep_posix_env;
        config.skip_env = self.skip_env;
        config.exclude = self.exclude.clone();
        config.unset = self.unset.clone();
        if self.lenient_env {
            config.env_policy = EnvPolicy::Skip;
        }
        config.timeout = self.timeout.map(Duration::from_secs);
        if let Some(grace) = self.grace {
            config.grace = Duration::from_millis(grace);
        }
        config
    }
}
