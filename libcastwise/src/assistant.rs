//! Bridge to an external content-assistant CLI
//!
//! The assistant is any executable that accepts
//! `-p --output-format <json|text> --tools <tools> <prompt>` and writes its
//! answer to stdout. Castwise uses it to polish and draft post copy.
//!
//! Each call spawns one child process, captures its output and kills it if
//! it outlives the timeout.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::AssistantConfig;
use crate::error::{AssistantError, Result};

pub const DEFAULT_COMMAND: &str = "agent";
pub const DEFAULT_TOOLS: &str = "Read,Edit,Write";
/// Tool set for calls that must not touch the filesystem
pub const READ_ONLY_TOOLS: &str = "Read";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const ENHANCE_TIMEOUT: Duration = Duration::from_secs(60);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(90);
const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Json,
    Text,
}

impl OutputMode {
    fn as_arg(&self) -> &'static str {
        match self {
            OutputMode::Json => "json",
            OutputMode::Text => "text",
        }
    }
}

/// Per-call settings for [`AssistantBridge::execute`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOptions {
    pub output: OutputMode,
    pub tools: String,
    pub timeout: Duration,
    /// Overrides the bridge's working directory for this call
    pub working_dir: Option<PathBuf>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            output: OutputMode::Json,
            tools: DEFAULT_TOOLS.to_string(),
            timeout: DEFAULT_TIMEOUT,
            working_dir: None,
        }
    }
}

/// What the assistant printed
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantOutput {
    /// Stdout parsed as JSON
    Structured(Value),
    /// Raw stdout; `parse_error` is set when JSON was requested but not
    /// produced
    Text { text: String, parse_error: bool },
}

impl AssistantOutput {
    /// The answer text: a non-empty `result` (or `text`) field of structured
    /// output, or non-empty raw text
    pub fn content(&self) -> Option<String> {
        let found = match self {
            AssistantOutput::Structured(value) => ["result", "text"]
                .iter()
                .find_map(|field| value.get(field).and_then(Value::as_str)),
            AssistantOutput::Text { text, .. } => Some(text.as_str()),
        };

        found.filter(|s| !s.trim().is_empty()).map(str::to_string)
    }
}

#[derive(Debug, Clone)]
pub struct AssistantBridge {
    command: String,
    tools: String,
    timeout: Duration,
    working_dir: Option<PathBuf>,
}

impl Default for AssistantBridge {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND)
    }
}

impl AssistantBridge {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            tools: DEFAULT_TOOLS.to_string(),
            timeout: DEFAULT_TIMEOUT,
            working_dir: None,
        }
    }

    /// Build a bridge from the `[assistant]` config section
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        Ok(Self {
            command: config.command.clone(),
            tools: config.tools.clone(),
            timeout: config.timeout()?,
            working_dir: config.working_dir(),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Options carrying this bridge's configured tools and timeout
    pub fn options(&self) -> ExecOptions {
        ExecOptions {
            tools: self.tools.clone(),
            timeout: self.timeout,
            ..Default::default()
        }
    }

    /// Run the assistant once with `prompt`
    ///
    /// # Errors
    ///
    /// - [`AssistantError::Spawn`] if the executable cannot be started
    /// - [`AssistantError::Timeout`] if it runs past `options.timeout`; the
    ///   child is killed
    /// - [`AssistantError::Exited`] on a non-zero exit status
    pub async fn execute(
        &self,
        prompt: &str,
        options: &ExecOptions,
    ) -> std::result::Result<AssistantOutput, AssistantError> {
        let mut command = Command::new(&self.command);
        command
            .arg("-p")
            .arg("--output-format")
            .arg(options.output.as_arg())
            .arg("--tools")
            .arg(&options.tools)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = options.working_dir.as_ref().or(self.working_dir.as_ref()) {
            command.current_dir(dir);
        }

        debug!(
            command = %self.command,
            tools = %options.tools,
            timeout = %humantime::format_duration(options.timeout),
            "Starting assistant"
        );

        let child = command.spawn().map_err(|source| AssistantError::Spawn {
            command: self.command.clone(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it
        let output = match timeout(options.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(command = %self.command, "Assistant timed out, killed");
                return Err(AssistantError::Timeout {
                    command: self.command.clone(),
                    timeout: options.timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(AssistantError::Exited {
                command: self.command.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        Ok(match options.output {
            OutputMode::Json => match serde_json::from_str(stdout.trim()) {
                Ok(value) => AssistantOutput::Structured(value),
                Err(e) => {
                    debug!("Assistant output is not JSON: {}", e);
                    AssistantOutput::Text {
                        text: stdout,
                        parse_error: true,
                    }
                }
            },
            OutputMode::Text => AssistantOutput::Text {
                text: stdout,
                parse_error: false,
            },
        })
    }

    /// Rewrite `content` following `instruction`
    ///
    /// Read-only tools, 60 second limit. When the assistant answers with
    /// nothing usable the original content comes back unchanged.
    pub async fn enhance(
        &self,
        content: &str,
        instruction: &str,
        file_path: Option<&str>,
    ) -> std::result::Result<String, AssistantError> {
        let prompt = enhance_prompt(content, instruction, file_path);
        let options = ExecOptions {
            tools: READ_ONLY_TOOLS.to_string(),
            timeout: ENHANCE_TIMEOUT,
            ..Default::default()
        };

        let output = self.execute(&prompt, &options).await?;
        Ok(output.content().unwrap_or_else(|| content.to_string()))
    }

    /// Draft new content of `kind` (blog, social, email, ...)
    ///
    /// Read-only tools, 90 second limit.
    ///
    /// # Errors
    ///
    /// [`AssistantError::EmptyOutput`] when the answer has no content.
    pub async fn generate(
        &self,
        kind: &str,
        description: &str,
        brand: Option<&Value>,
    ) -> std::result::Result<String, AssistantError> {
        let prompt = generate_prompt(kind, description, brand);
        let options = ExecOptions {
            tools: READ_ONLY_TOOLS.to_string(),
            timeout: GENERATE_TIMEOUT,
            ..Default::default()
        };

        self.execute(&prompt, &options)
            .await?
            .content()
            .ok_or(AssistantError::EmptyOutput)
    }

    /// True when `<command> --version` exits successfully within 5 seconds
    pub async fn is_available(&self) -> bool {
        let child = Command::new(&self.command)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                debug!(command = %self.command, "Assistant not found: {}", e);
                return false;
            }
        };

        matches!(
            timeout(VERSION_TIMEOUT, child.wait()).await,
            Ok(Ok(status)) if status.success()
        )
    }
}

fn enhance_prompt(content: &str, instruction: &str, file_path: Option<&str>) -> String {
    format!(
        "You are improving marketing copy.\n\n\
         FILE: {}\n\
         INSTRUCTION: {}\n\n\
         ORIGINAL CONTENT:\n---\n{}\n---\n\n\
         Reply with the improved content only, without commentary.\n",
        file_path.unwrap_or("(none)"),
        instruction,
        content
    )
}

fn generate_prompt(kind: &str, description: &str, brand: Option<&Value>) -> String {
    let brand_context = brand
        .map(|b| format!("BRAND CONTEXT: {}\n", b))
        .unwrap_or_default();

    format!(
        "Write marketing content.\n\n\
         TYPE: {kind}\n\
         DESCRIPTION: {description}\n\
         {brand_context}\n\
         Produce high-quality {kind} content for this description.\n\
         Reply with the content only, formatted for its type.\n"
    )
}


#[cfg(all(test, unix))]
mod process_tests {
    use super::*;
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Write an executable shell script and return a bridge that runs it
    fn script(dir: &TempDir, body: &str) -> AssistantBridge {
        let path = dir.path().join("assistant.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        AssistantBridge::new(path.to_string_lossy().into_owned())
    }

    #[tokio::test]
    #[serial]
    async fn test_execute_parses_json() {
        let dir = TempDir::new().unwrap();
        let bridge = script(&dir, r#"echo '{"result": "Better copy"}'"#);

        let output = bridge.execute("prompt", &ExecOptions::default()).await.unwrap();
        assert_eq!(
            output,
            AssistantOutput::Structured(serde_json::json!({"result": "Better copy"}))
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_execute_passes_arguments() {
        let dir = TempDir::new().unwrap();
        let bridge = script(&dir, r#"printf '%s\n' "$@""#);
        let options = ExecOptions {
            output: OutputMode::Text,
            tools: "Read".to_string(),
            ..Default::default()
        };

        let output = bridge.execute("Say hi", &options).await.unwrap();
        assert_eq!(
            output,
            AssistantOutput::Text {
                text: "-p\n--output-format\ntext\n--tools\nRead\nSay hi\n".to_string(),
                parse_error: false,
            }
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_execute_falls_back_to_text() {
        let dir = TempDir::new().unwrap();
        let bridge = script(&dir, "echo 'plain words'");

        let output = bridge.execute("prompt", &ExecOptions::default()).await.unwrap();
        assert_eq!(
            output,
            AssistantOutput::Text {
                text: "plain words\n".to_string(),
                parse_error: true,
            }
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_execute_uses_working_dir() {
        let dir = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let bridge = script(&dir, "pwd");
        let options = ExecOptions {
            output: OutputMode::Text,
            working_dir: Some(work.path().to_path_buf()),
            ..Default::default()
        };

        let output = bridge.execute("prompt", &options).await.unwrap();
        let printed = output.content().unwrap();
        let expected = work.path().canonicalize().unwrap();
        assert_eq!(std::path::Path::new(printed.trim()).canonicalize().unwrap(), expected);
    }

    #[tokio::test]
    #[serial]
    async fn test_execute_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let bridge = script(&dir, "echo boom >&2\nexit 3");

        let err = bridge
            .execute("prompt", &ExecOptions::default())
            .await
            .unwrap_err();
        match err {
            AssistantError::Exited { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_execute_timeout() {
        let dir = TempDir::new().unwrap();
        let bridge = script(&dir, "sleep 5");
        let options = ExecOptions {
            timeout: Duration::from_millis(200),
            ..Default::default()
        };

        let started = std::time::Instant::now();
        let err = bridge.execute("prompt", &options).await.unwrap_err();
        assert!(matches!(err, AssistantError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    #[serial]
    async fn test_execute_missing_command() {
        let bridge = AssistantBridge::new("/nonexistent/castwise-assistant");
        let err = bridge
            .execute("prompt", &ExecOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Spawn { .. }));
    }

    #[tokio::test]
    #[serial]
    async fn test_enhance_returns_result() {
        let dir = TempDir::new().unwrap();
        let bridge = script(&dir, r#"echo '{"result": "Shiny new copy"}'"#);

        let enhanced = bridge.enhance("Old copy", "Polish", None).await.unwrap();
        assert_eq!(enhanced, "Shiny new copy");
    }

    #[tokio::test]
    #[serial]
    async fn test_enhance_falls_back_to_original() {
        let dir = TempDir::new().unwrap();
        let bridge = script(&dir, "echo '{}'");

        let enhanced = bridge.enhance("Old copy", "Polish", None).await.unwrap();
        assert_eq!(enhanced, "Old copy");
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_uses_raw_text() {
        let dir = TempDir::new().unwrap();
        let bridge = script(&dir, "echo 'Fresh post'");

        let generated = bridge.generate("social", "teaser", None).await.unwrap();
        assert_eq!(generated, "Fresh post\n");
    }

    #[tokio::test]
    #[serial]
    async fn test_generate_empty_output() {
        let dir = TempDir::new().unwrap();
        let bridge = script(&dir, "true");

        let err = bridge.generate("social", "teaser", None).await.unwrap_err();
        assert!(matches!(err, AssistantError::EmptyOutput));
    }

    #[tokio::test]
    #[serial]
    async fn test_is_available() {
        let dir = TempDir::new().unwrap();
        assert!(script(&dir, "exit 0").is_available().await);

        let other = TempDir::new().unwrap();
        assert!(!script(&other, "exit 1").is_available().await);

        assert!(
            !AssistantBridge::new("/nonexistent/castwise-assistant")
                .is_available()
                .await
        );
    }
}
