//! moc wrapper
//!
//! fbmake calls this once per header inheriting `QObject`. It turns the
//! fbmake options into a metaobject compiler invocation producing
//! `moc_<header>.cpp` in the install directory.

mod args;
mod config;
mod error;
mod moc;
mod term;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use error::{Error, ErrorContext, Result};

/// Environment variable holding the log filter directives.
const LOG_ENV_VAR: &str = "MOC_WRAPPER_LOG";

/// Qt moc wrapper for fbmake
#[derive(Parser)]
#[clap(name = "moc-wrapper")]
#[clap(about = "Runs moc on a header with arguments derived from fbmake conventions")]
struct Cli {
    #[clap(flatten)]
    moc: args::MocArgs,

    #[clap(flatten)]
    config: args::ConfigArgs,
}

fn setup_logging() {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));

    // Logs go to stderr, stdout carries the command and moc's output.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn run(cli: &Cli) -> Result<()> {
    let request = cli.moc.validate()?;

    let config = config::Config::load()?.override_with(&cli.config.overrides());
    debug!("using {:?}", config);

    moc::MocCommand::new(&config, &request)?
        .run()
        .with_context(format!("failed to generate moc for `{}`", request.file))
}

fn main() {
    setup_logging();

    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        err.display();

        #[allow(clippy::exit)]
        std::process::exit(err.exit_code().unwrap_or(error::FAILURE_EXIT_CODE));
    }
}
