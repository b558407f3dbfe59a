use camino::{Utf8Path, Utf8PathBuf};

use crate::{config::ConfigOverrides, Error, Result};

/// Options passed by fbmake, once per header file.
#[derive(Debug, Default, clap::Args)]
pub struct MocArgs {
    /// The fbcode base directory (automatic)
    #[clap(long = "fbcode_dir", alias = "fbcode-dir", value_name = "DIR")]
    pub(crate) fbcode_dir: Option<Utf8PathBuf>,
    /// The fbcode build install dir (automatic)
    #[clap(long = "install_dir", alias = "install-dir", value_name = "DIR")]
    pub(crate) install_dir: Option<Utf8PathBuf>,
    /// Header file that inherits QObject
    #[clap(long, value_name = "HEADER")]
    pub(crate) file: Option<Utf8PathBuf>,
}

/// Overrides for the configuration file values.
#[derive(Debug, Default, clap::Args)]
pub struct ConfigArgs {
    /// Path to the moc executable
    #[clap(long, value_name = "PATH")]
    pub(crate) moc_path: Option<Utf8PathBuf>,
    /// Project directory name, relative to the fbcode directory
    #[clap(long, value_name = "NAME")]
    pub(crate) project_name: Option<String>,
    /// Exit with moc's status when it fails instead of succeeding anyway
    #[clap(long)]
    pub(crate) fail_on_child_error: bool,
}

impl ConfigArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            moc_path: self.moc_path.clone(),
            project_name: self.project_name.clone(),
            fail_on_child_error: self.fail_on_child_error.then_some(true),
        }
    }
}

/// A validated invocation: both required options are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MocRequest {
    pub fbcode_dir: Utf8PathBuf,
    pub install_dir: Option<Utf8PathBuf>,
    pub file: Utf8PathBuf,
}

impl MocArgs {
    /// Checks the required options, `--fbcode_dir` first.
    pub fn validate(&self) -> Result<MocRequest> {
        let fbcode_dir = non_empty(self.fbcode_dir.as_deref()).ok_or_else(|| {
            Error::usage("this should be called from fbmake")
                .with_explanation("`--fbcode_dir` is set by fbmake and must not be empty.")
        })?;

        let file = non_empty(self.file.as_deref())
            .ok_or_else(|| Error::usage("--file is required"))?;

        if file.file_name().is_none() {
            return Err(Error::usage(format!("`{}` does not name a header file", file))
                .with_explanation("`--file` must end with a file name, such as `Widget.h`."));
        }

        Ok(MocRequest {
            fbcode_dir: fbcode_dir.to_owned(),
            install_dir: non_empty(self.install_dir.as_deref()).map(ToOwned::to_owned),
            file: file.to_owned(),
        })
    }
}

fn non_empty(path: Option<&Utf8Path>) -> Option<&Utf8Path> {
    path.filter(|path| !path.as_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(fbcode_dir: Option<&str>, install_dir: Option<&str>, file: Option<&str>) -> MocArgs {
        MocArgs {
            fbcode_dir: fbcode_dir.map(Utf8PathBuf::from),
            install_dir: install_dir.map(Utf8PathBuf::from),
            file: file.map(Utf8PathBuf::from),
        }
    }

    #[test]
    fn test_valid_request() {
        let request = args(Some("/fb"), Some("/out"), Some("/src/Foo.h"))
            .validate()
            .unwrap();

        assert_eq!(
            request,
            MocRequest {
                fbcode_dir: "/fb".into(),
                install_dir: Some("/out".into()),
                file: "/src/Foo.h".into(),
            }
        );
    }

    #[test]
    fn test_install_dir_is_optional() {
        let request = args(Some("/fb"), None, Some("Foo.h")).validate().unwrap();
        assert!(request.install_dir.is_none());

        let request = args(Some("/fb"), Some(""), Some("Foo.h")).validate().unwrap();
        assert!(request.install_dir.is_none());
    }

    #[test]
    fn test_missing_fbcode_dir() {
        for fbcode_dir in [None, Some("")] {
            let err = args(fbcode_dir, Some("/out"), Some("/src/Foo.h"))
                .validate()
                .unwrap_err();

            assert_eq!(err.description(), "this should be called from fbmake");
            assert_eq!(err.exit_code(), Some(1));
        }
    }

    #[test]
    fn test_missing_file() {
        for file in [None, Some("")] {
            let err = args(Some("/fb"), Some("/out"), file).validate().unwrap_err();

            assert_eq!(err.description(), "--file is required");
            assert_eq!(err.exit_code(), Some(1));
        }
    }

    #[test]
    fn test_fbcode_dir_is_checked_first() {
        let err = args(None, None, None).validate().unwrap_err();

        assert_eq!(err.description(), "this should be called from fbmake");
    }

    #[test]
    fn test_file_without_name() {
        for file in ["/", "src/.."] {
            let err = args(Some("/fb"), None, Some(file)).validate().unwrap_err();

            assert_eq!(err.exit_code(), Some(1));
            assert!(err.description().contains("does not name a header file"));
        }
    }

    #[test]
    fn test_config_overrides() {
        let overrides = ConfigArgs::default().overrides();
        assert_eq!(overrides, ConfigOverrides::default());

        let overrides = ConfigArgs {
            moc_path: Some("/opt/qt/bin/moc".into()),
            project_name: None,
            fail_on_child_error: true,
        }
        .overrides();

        assert_eq!(overrides.moc_path, Some("/opt/qt/bin/moc".into()));
        assert_eq!(overrides.fail_on_child_error, Some(true));
    }
}
