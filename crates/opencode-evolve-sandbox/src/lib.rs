//! Hook validator / sandbox (spec.md §4.3): runs a candidate hook's test
//! command inside a disposable mirror of the workspace's ancillary subtrees,
//! so a crashing or malicious candidate can never touch the live workspace.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Subtrees mirrored into the sandbox because the hook conventionally reads
/// them (spec.md §4.3) — anything else under the workspace stays invisible
/// to the candidate.
const MIRRORED_SUBTREES: &[&str] = &["traits", "prompts"];

const WORKSPACE_ENV_VAR: &str = "OPENCODE_EVOLVE_WORKSPACE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub ok: bool,
    pub output: String,
}

impl ValidationOutcome {
    fn ok(output: impl Into<String>) -> Self {
        Self {
            ok: true,
            output: output.into(),
        }
    }

    fn failed(output: impl Into<String>) -> Self {
        Self {
            ok: false,
            output: output.into(),
        }
    }
}

/// Validates candidate hook content against the configured test command.
pub struct Sandbox {
    workspace: PathBuf,
    hook_name: String,
    test_script: Option<String>,
    timeout: Duration,
}

impl Sandbox {
    pub fn new(
        workspace: impl Into<PathBuf>,
        hook_name: impl Into<String>,
        test_script: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            hook_name: hook_name.into(),
            test_script,
            timeout,
        }
    }

    /// `validate(candidate_content) -> { ok, output }`.
    pub async fn validate(&self, candidate_content: &[u8]) -> ValidationOutcome {
        let Some(test_script) = &self.test_script else {
            return ValidationOutcome::ok("no test configured");
        };

        let tmp = match tempfile::tempdir() {
            Ok(tmp) => tmp,
            Err(error) => {
                return ValidationOutcome::failed(format!("sandbox setup failed: {error}"));
            }
        };

        if let Err(error) = self.mirror_subtrees(tmp.path()) {
            return ValidationOutcome::failed(format!("sandbox mirror failed: {error}"));
        }

        if let Err(error) = self.install_candidate(tmp.path(), candidate_content) {
            return ValidationOutcome::failed(format!("sandbox install failed: {error}"));
        }

        // `tmp` is dropped (and the directory removed) no matter which path
        // below returns, including early errors, satisfying the "tear down
        // unconditionally" contract.
        self.run_test(tmp.path(), test_script).await
    }

    fn mirror_subtrees(&self, sandbox_root: &Path) -> std::io::Result<()> {
        for subtree in MIRRORED_SUBTREES {
            let source = self.workspace.join(subtree);
            if !source.exists() {
                continue;
            }
            let dest_root = sandbox_root.join(subtree);
            for entry in walkdir::WalkDir::new(&source) {
                let entry = entry.map_err(std::io::Error::other)?;
                let relative = entry.path().strip_prefix(&source).map_err(std::io::Error::other)?;
                let dest = dest_root.join(relative);
                if entry.file_type().is_dir() {
                    std::fs::create_dir_all(&dest)?;
                } else {
                    if let Some(parent) = dest.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::copy(entry.path(), &dest)?;
                }
            }
        }
        Ok(())
    }

    fn install_candidate(&self, sandbox_root: &Path, content: &[u8]) -> std::io::Result<()> {
        let hooks_dir = sandbox_root.join("hooks");
        std::fs::create_dir_all(&hooks_dir)?;
        let path = hooks_dir.join(&self.hook_name);
        let mut file = std::fs::File::create(&path)?;
        file.write_all(content)?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        }

        Ok(())
    }

    async fn run_test(&self, sandbox_root: &Path, test_script: &str) -> ValidationOutcome {
        let sandbox_root_str = sandbox_root.to_string_lossy().to_string();

        let mut child = match Command::new(test_script)
            .arg(&sandbox_root_str)
            .env(WORKSPACE_ENV_VAR, &sandbox_root_str)
            .current_dir(sandbox_root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(error) => {
                return ValidationOutcome::failed(format!(
                    "failed to spawn test command: {error}"
                ));
            }
        };

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        let result = tokio::time::timeout(self.timeout, async {
            let mut out_buf = Vec::new();
            let mut err_buf = Vec::new();
            if let Some(stdout) = stdout.as_mut() {
                stdout.read_to_end(&mut out_buf).await?;
            }
            if let Some(stderr) = stderr.as_mut() {
                stderr.read_to_end(&mut err_buf).await?;
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((out_buf, err_buf, status))
        })
        .await;

        let (out_buf, err_buf, status) = match result {
            Ok(Ok(triple)) => triple,
            Ok(Err(io_error)) => {
                return ValidationOutcome::failed(format!("test command i/o error: {io_error}"));
            }
            Err(_elapsed) => {
                let _ = child.start_kill();
                return ValidationOutcome::failed("test command timed out".to_string());
            }
        };

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&out_buf),
            String::from_utf8_lossy(&err_buf)
        );

        if status.success() {
            ValidationOutcome::ok(combined)
        } else {
            let described = status
                .code()
                .map(|code| format!("exit {code}"))
                .unwrap_or_else(|| "terminated by signal".to_string());
            ValidationOutcome::failed(format!("{combined}{described}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox(workspace: &Path, test_script: Option<&str>) -> Sandbox {
        Sandbox::new(
            workspace,
            "evolve.py",
            test_script.map(str::to_string),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn no_test_script_succeeds_trivially() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = sandbox(dir.path(), None).validate(b"#!/bin/sh\n").await;
        assert!(outcome.ok);
        assert_eq!(outcome.output, "no test configured");
    }

    #[tokio::test]
    async fn passing_test_script_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("run_tests.sh");
        std::fs::write(&script_path, "#!/bin/sh\necho passed\nexit 0\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let outcome = sandbox(dir.path(), Some(script_path.to_str().unwrap()))
            .validate(b"#!/bin/sh\necho candidate\n")
            .await;
        assert!(outcome.ok);
        assert!(outcome.output.contains("passed"));
    }

    #[tokio::test]
    async fn failing_test_script_reports_not_ok_with_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("run_tests.sh");
        std::fs::write(&script_path, "#!/bin/sh\necho boom\nexit 3\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let outcome = sandbox(dir.path(), Some(script_path.to_str().unwrap()))
            .validate(b"#!/bin/sh\n")
            .await;
        assert!(!outcome.ok);
        assert!(outcome.output.contains("boom"));
        assert!(outcome.output.contains("exit 3"));
    }

    #[tokio::test]
    async fn timeout_kills_test_script_and_reports_not_ok() {
        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("run_tests.sh");
        std::fs::write(&script_path, "#!/bin/sh\nsleep 5\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let outcome = Sandbox::new(
            dir.path(),
            "evolve.py",
            Some(script_path.to_str().unwrap().to_string()),
            Duration::from_millis(50),
        )
        .validate(b"#!/bin/sh\n")
        .await;
        assert!(!outcome.ok);
        assert!(outcome.output.contains("timed out"));
    }

    #[tokio::test]
    async fn mirrors_traits_and_prompts_but_not_other_subtrees() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("prompts")).unwrap();
        std::fs::write(dir.path().join("prompts/a.md"), "hello").unwrap();
        std::fs::create_dir_all(dir.path().join("secrets")).unwrap();
        std::fs::write(dir.path().join("secrets/s.txt"), "shh").unwrap();

        let script_path = dir.path().join("run_tests.sh");
        std::fs::write(
            &script_path,
            "#!/bin/sh\n\
             test -f \"$1/prompts/a.md\" || (echo missing-prompt && exit 1)\n\
             test ! -e \"$1/secrets/s.txt\" || (echo leaked-secret && exit 1)\n\
             test -x \"$1/hooks/evolve.py\" || (echo missing-hook && exit 1)\n\
             echo ok\n",
        )
        .unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let outcome = sandbox(dir.path(), Some(script_path.to_str().unwrap()))
            .validate(b"#!/bin/sh\necho candidate\n")
            .await;
        assert!(outcome.ok, "{}", outcome.output);
    }
}
