//! Runs the metaobject compiler on a single header.
//!
//! The command is kept as a list of arguments and spawned directly, without a
//! shell, so paths are never reinterpreted.

use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use crate::{
    args::MocRequest,
    config::Config,
    error::{ErrorContext, FAILURE_EXIT_CODE},
    term::Step,
    Error, Result,
};

/// Name of the source file moc generates for `file`: `moc_<stem>.cpp`.
///
/// Only the final extension is dropped, so `a.b.h` gives `moc_a.b.cpp`.
pub fn target_file_name(file: &Utf8Path) -> Option<String> {
    file.file_stem().map(|stem| format!("moc_{}.cpp", stem))
}

pub struct MocCommand {
    program: Utf8PathBuf,
    args: Vec<String>,
    file: Utf8PathBuf,
    target: String,
    fail_on_child_error: bool,
}

impl MocCommand {
    pub fn new(config: &Config, request: &MocRequest) -> Result<Self> {
        let target = target_file_name(&request.file).ok_or_else(|| {
            Error::usage(format!("`{}` does not name a header file", request.file))
        })?;

        let output = match &request.install_dir {
            Some(install_dir) => install_dir.join(&target),
            None => Utf8PathBuf::from(&target),
        };
        let project_dir = request.fbcode_dir.join(&config.project_name);

        // moc needs the original header path and the project directory: the
        // file is generated in an environment isolated from the target one.
        let args = vec![
            "-o".to_owned(),
            output.into_string(),
            format!("-f{}", request.file),
            format!("-p{}", project_dir),
            request.file.to_string(),
        ];

        Ok(Self {
            program: config.moc_path.clone(),
            args,
            file: request.file.clone(),
            target,
            fail_on_child_error: config.fail_on_child_error,
        })
    }

    pub fn program(&self) -> &Utf8Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The generated file name, without its directory.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The command line for `program`, arguments joined with spaces.
    pub fn command_line(&self, program: impl Display) -> String {
        let mut line = program.to_string();

        for arg in self.args() {
            line.push(' ');
            line.push_str(arg);
        }

        line
    }

    /// Prints the command, runs it and forwards its output.
    ///
    /// moc's stdout is captured and echoed once it exits, its stderr goes
    /// straight to ours. A failing moc is only reported as an error when
    /// `fail_on_child_error` is set; otherwise the failure is logged and
    /// ignored.
    #[tracing::instrument(skip_all, fields(file = %self.file))]
    pub fn run(&self) -> Result<()> {
        let program = self.resolve_program()?;
        Step::Running.print(self.command_line(program.display()));

        let mut cmd = Command::new(&program);
        cmd.args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        info!("Executing: {:?}", &cmd);

        let now = Instant::now();
        let output = cmd.output().map_err(|err| {
            Error::from_source(err)
                .with_context(format!("failed to spawn `{}`", program.display()))
                .with_exit_code(Some(FAILURE_EXIT_CODE))
        })?;

        forward(&mut std::io::stdout(), &output.stdout)?;

        if output.status.success() {
            info!("Completed in {}ms: {:?}", now.elapsed().as_millis(), &cmd);
            Step::Finished.print(self.target());

            return Ok(());
        }

        warn!(
            "Failed in {}ms with {}: {:?}",
            now.elapsed().as_millis(),
            output.status,
            &cmd
        );

        if self.fail_on_child_error {
            Err(self.failure(output.status))
        } else {
            Step::Ignored.print(format_args!(
                "moc failure on `{}` ({})",
                self.file, output.status
            ));

            Ok(())
        }
    }

    fn resolve_program(&self) -> Result<PathBuf> {
        let program = which::which(&self.program)
            .map_err(|err| Error::from_source(err).with_exit_code(Some(FAILURE_EXIT_CODE)))
            .with_full_context(
                format!("could not find moc at `{}`", self.program),
                "Set `moc_path` in moc-wrapper.toml, the `MOC_WRAPPER_MOC_PATH` \
                 environment variable or the `--moc-path` option.",
            )?;

        debug!("resolved `{}` to {}", self.program, program.display());

        Ok(program)
    }

    fn failure(&self, status: ExitStatus) -> Error {
        // Killed by a signal: there is no code to pass on.
        let exit_code = status.code().unwrap_or(FAILURE_EXIT_CODE);

        Error::new(format!("moc failed on `{}` ({})", self.file, status))
            .with_exit_code(Some(exit_code))
    }
}

/// The command line with the configured program, before `PATH` lookup.
///
/// `run` prints the line with the resolved program instead.
impl Display for MocCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.command_line(self.program()))
    }
}

fn forward(out: &mut impl Write, bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }

    out.write_all(bytes)
        .and_then(|_| out.flush())
        .map_err(|err| Error::from_source(err).with_context("failed to forward moc output"))
}
