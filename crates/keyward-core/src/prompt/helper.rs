use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{InteractivePrompt, PromptReply, PromptRequest};
use crate::error::{AuthError, Result};

/// Environment variable naming the helper program.
pub const HELPER_ENV: &str = "KEYWARD_HELPER";
const HELPER_BINARY: &str = "keyward-helper";
const ACTION_GET: &str = "GET";
const ACTION_ERASE: &str = "ERASE";

/// Delegates prompting to an external program speaking the credential
/// helper protocol: the program is run with `GET` or `ERASE`, receives
/// `key=value` lines on stdin terminated by a blank line, and answers
/// `username=` and `password=` lines on stdout.
#[derive(Debug, Clone)]
pub struct HelperPrompt {
    program: PathBuf,
}

impl HelperPrompt {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find a helper: `$KEYWARD_HELPER`, then the configured path, then
    /// `keyward-helper` on `PATH`. Paths that are not files are ignored.
    pub fn locate(configured: Option<&Path>) -> Option<Self> {
        let from_env = std::env::var_os(HELPER_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        from_env
            .into_iter()
            .chain(configured.map(Path::to_path_buf))
            .chain(which::which(HELPER_BINARY).ok())
            .find(|path| path.is_file())
            .map(Self::new)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn run(&self, action: &str, request: &PromptRequest) -> Result<String> {
        debug!(helper = %self.program.display(), action, host = %request.host, "Running credential helper");

        let mut child = Command::new(&self.program)
            .arg(action)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AuthError::Prompt(format!("{}: {}", self.program.display(), e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(helper_input(request).as_bytes()).await?;
            stdin.flush().await?;
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AuthError::Prompt(format!(
                "{} {} failed: {}",
                self.program.display(),
                action,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl InteractivePrompt for HelperPrompt {
    fn is_interactive(&self) -> bool {
        true
    }

    async fn ask(&self, request: &PromptRequest) -> Result<PromptReply> {
        let output = self.run(ACTION_GET, request).await?;
        let reply = parse_reply(&output);
        Ok(PromptReply {
            username: reply.username.or_else(|| request.username.clone()),
            password: reply.password,
        })
    }

    async fn forget(&self, request: &PromptRequest) -> Result<()> {
        if let Err(e) = self.run(ACTION_ERASE, request).await {
            warn!(error = %e, "Credential helper failed to erase rejected credential");
        }
        Ok(())
    }
}

fn helper_input(request: &PromptRequest) -> String {
    let mut input = String::new();
    if let Some(user) = &request.username {
        input.push_str(&format!("username={user}\n"));
    }
    input.push_str(&format!(
        "host={}\nprotocol={}\npath={}\n\n",
        request.host,
        request.scheme,
        request.path.trim_start_matches('/')
    ));
    input
}

fn parse_reply(output: &str) -> PromptReply {
    let mut reply = PromptReply::default();
    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(user) = line.strip_prefix("username=") {
            if !user.is_empty() {
                reply.username = Some(user.to_string());
            }
        } else if let Some(password) = line.strip_prefix("password=") {
            reply.password = password.to_string();
        }
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: Option<&str>) -> PromptRequest {
        PromptRequest {
            realm: "realm".into(),
            url: "https://example.com/repos".into(),
            scheme: "https".into(),
            host: "example.com".into(),
            path: "/repos/app".into(),
            username: username.map(str::to_string),
        }
    }

    #[test]
    fn test_helper_input() {
        assert_eq!(
            helper_input(&request(Some("alice"))),
            "username=alice\nhost=example.com\nprotocol=https\npath=repos/app\n\n"
        );
        assert_eq!(
            helper_input(&request(None)),
            "host=example.com\nprotocol=https\npath=repos/app\n\n"
        );
    }

    #[test]
    fn test_parse_reply() {
        let reply = parse_reply("protocol=https\r\nusername=bob\r\npassword=a=b\r\n");
        assert_eq!(reply.username.as_deref(), Some("bob"));
        assert_eq!(reply.password, "a=b");

        let reply = parse_reply("quit=1\n");
        assert_eq!(reply.username, None);
        assert!(reply.password.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_helper_roundtrip() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let script = temp_dir.path().join("helper.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\ncat > /dev/null\nprintf 'username=bob\\npassword=s3cret\\n'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let prompt = HelperPrompt::new(&script);
        let reply = prompt.ask(&request(None)).await.unwrap();
        assert_eq!(reply.username.as_deref(), Some("bob"));
        assert_eq!(reply.password, "s3cret");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_helper_actions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let log = temp_dir.path().join("actions.log");
        let script = temp_dir.path().join("helper.sh");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\ncat > /dev/null\necho \"$1\" >> '{}'\n[ \"$1\" = GET ] && echo password=pw\nexit 0\n",
                log.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let prompt = HelperPrompt::new(&script);
        let reply = prompt.ask(&request(Some("alice"))).await.unwrap();
        assert_eq!(reply.password, "pw");
        assert_eq!(reply.username.as_deref(), Some("alice"));
        prompt.forget(&request(Some("alice"))).await.unwrap();

        assert_eq!(std::fs::read_to_string(&log).unwrap(), "GET\nERASE\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_helper() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let script = temp_dir.path().join("helper.sh");
        std::fs::write(&script, "#!/bin/sh\ncat > /dev/null\necho nope >&2\nexit 3\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let prompt = HelperPrompt::new(&script);
        assert!(matches!(
            prompt.ask(&request(None)).await,
            Err(AuthError::Prompt(_))
        ));
        // Erase failures are not fatal
        assert!(prompt.forget(&request(None)).await.is_ok());
    }
}
