use crate::error::{MonorepoHelperError, Result};
use crate::git::{ProcessOutput, ProcessRunner};
use std::path::Path;
use std::process::Command;

/// Real [ProcessRunner] backed by `std::process::Command`.
///
/// Invocations block until the child exits; stdout and stderr are captured
/// as lossily-decoded UTF-8. Going through the system git binary means
/// authentication, credential helpers and `versionsort` behave exactly as
/// the user's git configuration defines them.
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<ProcessOutput> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| MonorepoHelperError::process("empty command line"))?;

        let mut command = Command::new(program);
        command.args(rest);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|e| {
            MonorepoHelperError::process(format!("failed to start '{}': {}", program, e))
        })?;

        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
