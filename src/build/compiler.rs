//! Stylesheet compiler abstraction
//!
//! The compiler is an external capability: given a working directory and
//! a dependency descriptor it writes compiled CSS to a requested path, or
//! fails with whatever it printed.

use crate::config::schema::BuildConfig;
use crate::error::{ShowcaseError, ShowcaseResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Everything a compiler needs for one build
#[derive(Debug, Clone)]
pub struct CompileJob {
    /// Cache entry directory, used as the working directory
    pub workdir: PathBuf,
    /// Dependency descriptor file
    pub descriptor: PathBuf,
    /// Where the compiled stylesheet must be written
    pub output: PathBuf,
    /// Pinned dependency, `org/repo`
    pub dependency: String,
    /// Commit the dependency is pinned to
    pub sha: String,
}

/// Compiles a theme into a stylesheet
#[async_trait]
pub trait StyleCompiler: Send + Sync {
    /// Compile `job`, writing CSS to `job.output`
    async fn compile(&self, job: &CompileJob) -> ShowcaseResult<()>;

    /// Human-readable compiler name for logs
    fn name(&self) -> &str;
}

/// Compiler that runs an external program
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    /// Arguments with placeholders filled in for `job`
    pub fn expand_args(&self, job: &CompileJob) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{descriptor}", &job.descriptor.to_string_lossy())
                    .replace("{output}", &job.output.to_string_lossy())
                    .replace("{dir}", &job.workdir.to_string_lossy())
                    .replace("{dependency}", &job.dependency)
                    .replace("{sha}", &job.sha)
            })
            .collect()
    }
}

#[async_trait]
impl StyleCompiler for CommandCompiler {
    async fn compile(&self, job: &CompileJob) -> ShowcaseResult<()> {
        let args = self.expand_args(job);
        debug!("Executing: {} {:?} in {}", self.program, args, job.workdir.display());

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&job.workdir)
            .env("SHOWCASE_DESCRIPTOR", &job.descriptor)
            .env("SHOWCASE_OUTPUT", &job.output)
            .env("SHOWCASE_DEPENDENCY", &job.dependency)
            .env("SHOWCASE_SHA", &job.sha)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ShowcaseError::command_failed(&self.program, e))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if stdout.is_empty() {
                match output.status.code() {
                    Some(code) => format!("{} exited with status {}", self.program, code),
                    None => format!("{} terminated by signal", self.program),
                }
            } else {
                stdout
            }
        } else {
            stderr
        };

        Err(ShowcaseError::build(message))
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job(dir: &TempDir) -> CompileJob {
        CompileJob {
            workdir: dir.path().to_path_buf(),
            descriptor: dir.path().join("component.json"),
            output: dir.path().join("build.css.partial"),
            dependency: "acme/theme".to_string(),
            sha: "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef".to_string(),
        }
    }

    #[test]
    fn expands_placeholders() {
        let dir = TempDir::new().unwrap();
        let compiler = CommandCompiler::new(
            "builder",
            vec![
                "--manifest={descriptor}".to_string(),
                "{dependency}@{sha}".to_string(),
                "-o".to_string(),
                "{output}".to_string(),
            ],
        );

        let args = compiler.expand_args(&job(&dir));

        assert_eq!(
            args[0],
            format!("--manifest={}", dir.path().join("component.json").display())
        );
        assert_eq!(args[1], "acme/theme@deadbeefdeadbeefdeadbeefdeadbeefdeadbeef");
        assert_eq!(args[3], dir.path().join("build.css.partial").to_string_lossy());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_command_writes_output() {
        let dir = TempDir::new().unwrap();
        let compiler = CommandCompiler::new(
            "sh",
            vec!["-c".to_string(), "printf 'a{b:c}' > \"$SHOWCASE_OUTPUT\"".to_string()],
        );
        let job = job(&dir);

        compiler.compile(&job).await.unwrap();

        assert_eq!(std::fs::read_to_string(&job.output).unwrap(), "a{b:c}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let compiler = CommandCompiler::new(
            "sh",
            vec![
                "-c".to_string(),
                "echo 'missing index file' >&2; exit 3".to_string(),
            ],
        );

        let err = compiler.compile(&job(&dir)).await.unwrap_err();
        assert_eq!(err.to_string(), "missing index file");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn silent_failure_reports_exit_status() {
        let dir = TempDir::new().unwrap();
        let compiler = CommandCompiler::new("sh", vec!["-c".to_string(), "exit 7".to_string()]);

        let err = compiler.compile(&job(&dir)).await.unwrap_err();
        assert_eq!(err.to_string(), "sh exited with status 7");
    }

    #[tokio::test]
    async fn missing_program_is_command_failure() {
        let dir = TempDir::new().unwrap();
        let compiler = CommandCompiler::new("showcase-no-such-compiler", vec![]);

        let err = compiler.compile(&job(&dir)).await.unwrap_err();
        assert!(matches!(err, ShowcaseError::CommandFailed { .. }));
    }
}
