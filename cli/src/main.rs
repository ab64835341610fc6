use clap::Parser;
use moviesearch::{failure_report, run, Cli};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&cli, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (code, message) = failure_report(&err);
            eprintln!("{message}");
            ExitCode::from(code)
        }
    }
}
