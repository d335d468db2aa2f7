// src/exec/command.rs

//! Shell-command deploy backend.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result as AnyResult};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info};

use super::backend::{DeployFailure, DeployFuture, DeployResult, DeploySuccess, Deployer};
use crate::artifact::Artifact;
use crate::config::DeploySection;
use crate::engine::RunContext;
use crate::errors::{DeployError, Result};

const ID_VAR: &str = "DEPLOYDAG_ARTIFACT_ID";
const KIND_VAR: &str = "DEPLOYDAG_ARTIFACT_KIND";
const NAME_VAR: &str = "DEPLOYDAG_ARTIFACT_NAME";
const ENVIRONMENT_VAR: &str = "DEPLOYDAG_ENVIRONMENT";

const PLACEHOLDERS: [(&str, &str); 4] = [
    ("{id}", ID_VAR),
    ("{kind}", KIND_VAR),
    ("{name}", NAME_VAR),
    ("{environment}", ENVIRONMENT_VAR),
];

fn var_ref(var: &str) -> String {
    if cfg!(windows) {
        format!("\"!{var}!\"")
    } else {
        format!("\"${{{var}}}\"")
    }
}

/// Runs a command template once per artifact.
///
/// The artifact values are exported as `DEPLOYDAG_*` environment variables,
/// together with `DEPLOYDAG_CREATED_IN_RUN`. Placeholders `{id}`, `{kind}`,
/// `{name}` and `{environment}` become quoted references to those variables
/// (`"${DEPLOYDAG_ARTIFACT_NAME}"` under `sh`, `"!DEPLOYDAG_ARTIFACT_NAME!"`
/// under `cmd /V:ON`), so each one expands to exactly one argument and its
/// content is never parsed by the shell. Do not quote placeholders in the
/// template.
#[derive(Debug, Clone)]
pub struct CommandDeployer {
    template: String,
    working_dir: Option<PathBuf>,
    created_on_stdout: Option<Regex>,
    unchanged_on_stdout: Option<Regex>,
}

impl CommandDeployer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            working_dir: None,
            created_on_stdout: None,
            unchanged_on_stdout: None,
        }
    }

    /// Build from a validated `[deploy]` section.
    pub fn from_config(section: &DeploySection, working_dir: impl Into<PathBuf>) -> Result<Self> {
        let cmd = section.cmd.as_deref().ok_or_else(|| {
            DeployError::ConfigError("no [deploy].cmd configured; use --dry-run to only plan".into())
        })?;
        let compile = |field: &str, pattern: &Option<String>| -> Result<Option<Regex>> {
            pattern
                .as_deref()
                .map(|p| {
                    Regex::new(p).map_err(|e| DeployError::ConfigError(format!("deploy.{field}: {e}")))
                })
                .transpose()
        };

        Ok(Self {
            template: cmd.to_string(),
            working_dir: Some(working_dir.into()),
            created_on_stdout: compile("created_on_stdout", &section.created_on_stdout)?,
            unchanged_on_stdout: compile("unchanged_on_stdout", &section.unchanged_on_stdout)?,
        })
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_created_pattern(mut self, re: Regex) -> Self {
        self.created_on_stdout = Some(re);
        self
    }

    pub fn with_unchanged_pattern(mut self, re: Regex) -> Self {
        self.unchanged_on_stdout = Some(re);
        self
    }

    /// The command line handed to the shell. Artifact values stay in the
    /// environment; see [`CommandDeployer`].
    pub fn render(&self) -> String {
        PLACEHOLDERS
            .iter()
            .fold(self.template.clone(), |line, (placeholder, var)| {
                line.replace(placeholder, &var_ref(var))
            })
    }

    async fn run(&self, artifact: &Artifact, ctx: &RunContext) -> DeployResult {
        match self.run_inner(artifact, ctx).await {
            Ok(result) => result,
            Err(err) => {
                error!(artifact = %artifact.id, error = %err, "deploy command execution error");
                Err(DeployFailure::new(format!("{err:#}")))
            }
        }
    }

    async fn run_inner(&self, artifact: &Artifact, ctx: &RunContext) -> AnyResult<DeployResult> {
        let line = self.render();
        info!(
            artifact = %artifact.id,
            name = %artifact.name,
            cmd = %line,
            "starting deploy command"
        );

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/V:ON").arg("/C").arg(&line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&line);
            c
        };

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        let created: Vec<&str> = ctx.created.iter().map(String::as_str).collect();
        cmd.env(ID_VAR, &artifact.id)
            .env(KIND_VAR, artifact.kind.platform_name())
            .env(NAME_VAR, &artifact.name)
            .env(ENVIRONMENT_VAR, &ctx.environment)
            .env("DEPLOYDAG_CREATED_IN_RUN", created.join(","))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning deploy command for '{}'", artifact.id))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let id = artifact.id.as_str();

        let read_stdout = async {
            let (mut created, mut unchanged) = (false, false);
            if let Some(out) = stdout {
                let mut lines = BufReader::new(out).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(artifact = %id, "stdout: {}", line);
                    created |= self.created_on_stdout.as_ref().is_some_and(|re| re.is_match(&line));
                    unchanged |= self.unchanged_on_stdout.as_ref().is_some_and(|re| re.is_match(&line));
                }
            }
            (created, unchanged)
        };

        // Consume stderr so the pipe never fills; keep the last line for the report.
        let read_stderr = async {
            let mut last: Option<String> = None;
            if let Some(err) = stderr {
                let mut lines = BufReader::new(err).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(artifact = %id, "stderr: {}", line);
                    if !line.trim().is_empty() {
                        last = Some(line);
                    }
                }
            }
            last
        };

        let ((created, unchanged), last_stderr) = tokio::join!(read_stdout, read_stderr);
        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for deploy command of '{}'", artifact.id))?;

        if status.success() {
            let success = if created {
                DeploySuccess::Created
            } else if unchanged {
                DeploySuccess::Unchanged
            } else {
                DeploySuccess::Deployed
            };
            debug!(artifact = %artifact.id, %success, "deploy command finished");
            Ok(Ok(success))
        } else {
            Ok(Err(DeployFailure::exited(status.code(), last_stderr)))
        }
    }
}

impl Deployer for CommandDeployer {
    fn deploy<'a>(&'a mut self, artifact: &'a Artifact, ctx: &'a RunContext) -> DeployFuture<'a> {
        Box::pin(self.run(artifact, ctx))
    }
}
