use std::{
    fmt::{Debug, Display, Formatter},
    io::Write,
};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Exit code used for usage, configuration and spawn failures.
pub const FAILURE_EXIT_CODE: i32 = 1;

pub type Result<T> = std::result::Result<T, Error>;

/// A wrapper error, optionally caused by another error.
///
/// Errors can carry a human-friendly explanation and the exit code the
/// wrapper should terminate with.
#[derive(thiserror::Error)]
pub struct Error {
    description: String,
    explanation: Option<String>,
    #[source]
    source: Option<anyhow::Error>,
    exit_code: Option<i32>,
}

impl Error {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            explanation: None,
            source: None,
            exit_code: None,
        }
    }

    /// A missing or malformed command-line option.
    pub fn usage(description: impl Into<String>) -> Self {
        Self::new(description).with_exit_code(Some(FAILURE_EXIT_CODE))
    }

    pub fn from_source(source: impl Into<anyhow::Error>) -> Self {
        Self::new("").with_source(source)
    }

    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());

        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());

        self
    }

    pub fn with_exit_code(mut self, exit_code: Option<i32>) -> Self {
        self.exit_code = exit_code;

        self
    }

    pub fn with_context(mut self, description: impl Into<String>) -> Self {
        if self.description.is_empty() {
            self.description = description.into();

            self
        } else {
            // The outermost error is the one reported, it decides the exit code.
            let exit_code = self.exit_code;

            Self::new(description)
                .with_source(self)
                .with_exit_code(exit_code)
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Reports the error on stderr, in color when attached to a terminal.
    pub fn display(&self) {
        if atty::is(atty::Stream::Stderr) {
            let mut stderr = StandardStream::stderr(ColorChoice::Always);

            // Nothing sensible left to do if stderr itself is broken.
            if self.write_colored(&mut stderr).is_err() {
                let _ = stderr.reset();
            }
        } else {
            eprintln!("error: {}", self);
        }
    }

    fn write_colored(&self, stderr: &mut StandardStream) -> std::io::Result<()> {
        stderr.set_color(
            ColorSpec::new()
                .set_fg(Some(Color::Red))
                .set_intense(true)
                .set_bold(true),
        )?;
        write!(stderr, "error")?;
        stderr.reset()?;
        writeln!(stderr, ": {}", self.description())?;

        if let Some(source) = self.cause() {
            stderr.set_color(
                ColorSpec::new()
                    .set_fg(Some(Color::White))
                    .set_intense(true)
                    .set_bold(true),
            )?;
            write!(stderr, "Caused by")?;
            stderr.reset()?;
            writeln!(stderr, ": {}", source)?;
        }

        if let Some(explanation) = self.explanation() {
            stderr.set_color(
                ColorSpec::new()
                    .set_fg(Some(Color::Yellow))
                    .set_bold(true)
                    .set_intense(true),
            )?;
            writeln!(stderr, "\n{}", explanation)?;
            stderr.reset()?;
        }

        Ok(())
    }
}

pub(crate) trait ErrorContext {
    fn with_context(self, description: impl Into<String>) -> Self;
    fn with_full_context(
        self,
        description: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self;
}

impl<T> ErrorContext for crate::Result<T> {
    fn with_context(self, description: impl Into<String>) -> Self {
        self.map_err(|e| e.with_context(description))
    }

    fn with_full_context(
        self,
        description: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        self.map_err(|e| e.with_context(description).with_explanation(explanation))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description)?;

        if let Some(source) = self.source.as_ref() {
            write!(f, ": {}", source)?;
        }

        if let Some(explanation) = &self.explanation {
            write!(f, "\n\n{}", explanation)?;
        }

        Ok(())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("description", &self.description)
            .field("explanation", &self.explanation)
            .field("source", &self.source)
            .field("exit_code", &self.exit_code)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_described_errors() {
        let err = Error::usage("--file is required").with_context("invalid invocation");

        assert_eq!(err.description(), "invalid invocation");
        assert_eq!(err.exit_code(), Some(FAILURE_EXIT_CODE));
        assert_eq!(err.to_string(), "invalid invocation: --file is required");
    }

    #[test]
    fn test_context_fills_empty_description() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = Error::from_source(io).with_context("failed to spawn moc");

        assert_eq!(err.description(), "failed to spawn moc");
        assert_eq!(err.to_string(), "failed to spawn moc: no such file");
        assert!(err.exit_code().is_none());
    }

    #[test]
    fn test_context_keeps_exit_code() {
        let err = Error::new("moc failed on `Foo.h` (exit status: 2)")
            .with_exit_code(Some(2))
            .with_context("failed to generate moc for `Foo.h`");

        assert_eq!(err.exit_code(), Some(2));
        assert!(err.cause().is_some());
    }

    #[test]
    fn test_result_alias_carries_context() {
        fn spawn() -> Result<u32> {
            Err(Error::from_source(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )))
        }

        let err = spawn().with_context("failed to spawn `moc`").unwrap_err();

        assert_eq!(err.to_string(), "failed to spawn `moc`: permission denied");
    }

    #[test]
    fn test_full_context_adds_explanation() {
        let result: crate::Result<()> = Err(Error::new("bad value"));
        let err = result
            .with_full_context("failed to load the configuration", "check moc-wrapper.toml")
            .unwrap_err();

        assert_eq!(err.explanation(), Some("check moc-wrapper.toml"));
        assert!(err.to_string().ends_with("\n\ncheck moc-wrapper.toml"));
    }
}
