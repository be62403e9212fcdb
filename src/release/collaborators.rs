//! External collaborators of a release: the test runner and version control.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;

use crate::config::VerifyConfig;

/// Failure of an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' exited with {status}{}", format_stderr(.stderr))]
    Failed { command: String, status: ExitStatus, stderr: String },
}

fn format_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// Runs the project's test suite.
pub trait Verifier {
    fn verify(&self) -> Result<(), CommandError>;
}

/// Records a release in version control.
pub trait VersionControl {
    /// Stage files.
    fn add(&self, paths: &[PathBuf]) -> Result<(), CommandError>;

    /// Commit staged files.
    fn commit(&self, message: &str) -> Result<(), CommandError>;

    /// Create an annotated tag on the current commit.
    fn tag(&self, name: &str, message: &str) -> Result<(), CommandError>;
}

/// Test runner invoked as an external command (karma by default).
///
/// Output is streamed to the terminal; the exit status decides the outcome.
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    program: String,
    args: Vec<String>,
    config: PathBuf,
    browsers: Vec<String>,
    watch: bool,
    work_dir: Option<PathBuf>,
}

impl CommandVerifier {
    /// Create a verifier from configuration; `config` is the resolved runner
    /// configuration path.
    pub fn from_config(verify: &VerifyConfig, config: PathBuf) -> Self {
        Self {
            program: verify.command.clone(),
            args: verify.args.clone(),
            config,
            browsers: verify.browsers.clone(),
            watch: false,
            work_dir: None,
        }
    }

    /// Keep the runner alive and re-run on changes instead of a single run.
    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Run the command from this directory.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list passed to the runner.
    pub fn command_line(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.push(self.config.as_os_str().to_os_string());
        if !self.browsers.is_empty() {
            args.push(OsString::from("--browsers"));
            args.push(OsString::from(self.browsers.join(",")));
        }
        if !self.watch {
            args.push(OsString::from("--single-run"));
        }
        args
    }
}

impl Verifier for CommandVerifier {
    fn verify(&self) -> Result<(), CommandError> {
        let args = self.command_line();
        tracing::info!(program = %self.program, ?args, "running test suite");

        let mut command = Command::new(&self.program);
        command.args(&args).stdin(Stdio::null());
        if let Some(dir) = &self.work_dir {
            command.current_dir(dir);
        }

        let status = command
            .status()
            .map_err(|source| CommandError::Spawn { program: self.program.clone(), source })?;
        if status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                command: self.program.clone(),
                status,
                stderr: String::new(),
            })
        }
    }
}

/// Version control through the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    work_dir: PathBuf,
}

impl GitCli {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self { program: "git".to_string(), work_dir: work_dir.into() }
    }

    /// Use a different git executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn git(&self, args: &[OsString]) -> Result<(), CommandError> {
        tracing::debug!(program = %self.program, ?args, "running git");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CommandError::Spawn { program: self.program.clone(), source })?;

        if output.status.success() {
            return Ok(());
        }
        let command = std::iter::once(self.program.clone())
            .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ");
        Err(CommandError::Failed {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl VersionControl for GitCli {
    fn add(&self, paths: &[PathBuf]) -> Result<(), CommandError> {
        let mut args = vec![OsString::from("add"), OsString::from("--")];
        args.extend(paths.iter().map(|p| p.as_os_str().to_os_string()));
        self.git(&args)
    }

    fn commit(&self, message: &str) -> Result<(), CommandError> {
        self.git(&[OsString::from("commit"), OsString::from("-m"), OsString::from(message)])
    }

    fn tag(&self, name: &str, message: &str) -> Result<(), CommandError> {
        self.git(&[
            OsString::from("tag"),
            OsString::from("-a"),
            OsString::from(name),
            OsString::from("-m"),
            OsString::from(message),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_verifier_single_run_by_default() {
        let verifier =
            CommandVerifier::from_config(&VerifyConfig::default(), PathBuf::from("karma.conf.js"));

        assert_eq!(verifier.program(), "karma");
        assert_eq!(
            strings(verifier.command_line()),
            vec!["start", "karma.conf.js", "--browsers", "PhantomJS", "--single-run"]
        );
    }

    #[test]
    fn test_verifier_watch_drops_single_run() {
        let mut config = VerifyConfig::default();
        config.browsers = vec!["Chrome".to_string(), "Firefox".to_string()];
        let verifier =
            CommandVerifier::from_config(&config, PathBuf::from("karma.conf.js")).with_watch(true);

        assert_eq!(
            strings(verifier.command_line()),
            vec!["start", "karma.conf.js", "--browsers", "Chrome,Firefox"]
        );
    }

    #[test]
    fn test_verifier_missing_program() {
        let mut config = VerifyConfig::default();
        config.command = "langpack-test-no-such-runner".to_string();
        let verifier = CommandVerifier::from_config(&config, PathBuf::from("karma.conf.js"));

        assert!(matches!(verifier.verify(), Err(CommandError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_verifier_exit_status_decides() {
        let mut config = VerifyConfig::default();
        config.command = "sh".to_string();
        config.args = vec!["-c".to_string(), "exit 0".to_string()];
        let passing = CommandVerifier::from_config(&config, PathBuf::from("karma.conf.js"));
        assert!(passing.verify().is_ok());

        config.args = vec!["-c".to_string(), "exit 1".to_string()];
        let failing = CommandVerifier::from_config(&config, PathBuf::from("karma.conf.js"));
        assert!(matches!(failing.verify(), Err(CommandError::Failed { .. })));
    }

    #[test]
    fn test_git_missing_program() {
        let temp = TempDir::new().unwrap();
        let git = GitCli::new(temp.path()).with_program("langpack-test-no-such-git");

        assert_eq!(git.work_dir(), temp.path());
        assert!(matches!(git.commit("x"), Err(CommandError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_git_failure_reports_command() {
        let temp = TempDir::new().unwrap();
        let git = GitCli::new(temp.path()).with_program("false");

        let err = git.tag("1.0.0", "Update version to 1.0.0").unwrap_err();
        assert!(err.to_string().starts_with("'false tag -a 1.0.0 -m Update version to 1.0.0' exited with"));
    }
}
