use std::{fmt::Display, io::Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// The stages of a moc invocation reported on stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Running,
    Finished,
    Ignored,
}

impl Step {
    fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Finished => "Finished",
            Self::Ignored => "Ignored",
        }
    }

    fn color(self) -> Color {
        match self {
            Self::Running | Self::Finished => Color::Green,
            Self::Ignored => Color::Yellow,
        }
    }

    /// The uncolored line, label right-aligned on 12 columns.
    pub fn line(self, subject: impl Display) -> String {
        format!("{:>12} {}", self.label(), subject)
    }

    /// Prints the step on stdout, coloring the label on a terminal.
    pub fn print(self, subject: impl Display) {
        if atty::is(atty::Stream::Stdout) {
            let mut stdout = StandardStream::stdout(ColorChoice::Always);

            if self.write_colored(&mut stdout, &subject).is_err() {
                let _ = stdout.reset();
            }
        } else {
            println!("{}", self.line(subject));
        }
    }

    fn write_colored(
        self,
        stdout: &mut StandardStream,
        subject: &impl Display,
    ) -> std::io::Result<()> {
        stdout.set_color(
            ColorSpec::new()
                .set_fg(Some(self.color()))
                .set_intense(true)
                .set_bold(true),
        )?;
        write!(stdout, "{:>12}", self.label())?;
        stdout.reset()?;
        writeln!(stdout, " {}", subject)
    }
}
