use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use sysgate_executor::{CommandRunner, ExecutionOutcome, Executor, ShellCommand};
use sysgate_interpreter::{interpret, ResultShape, StructuredResult, SummaryData};
use sysgate_policy::{PolicyDecision, PolicyGate};
use tracing::{debug, info, warn};

use crate::agent::AgentTranslation;
use crate::catalog::{CommandCatalog, SUMMARY_PROBES};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::metrics::Metrics;

const DEFAULT_CATEGORY: &str = "system";
const AGENT_BLOCKED_REASON: &str = "Blocked by the translation agent";

/// A raw command from upstream, plus how its output should be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeFormRequest {
    #[serde(default)]
    pub query: String,
    pub command: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub shape_hint: Option<ResultShape>,
    #[serde(default)]
    pub columns: Vec<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl FreeFormRequest {
    pub fn new(query: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            command: command.into(),
            category: default_category(),
            shape_hint: None,
            columns: Vec::new(),
        }
    }

    pub fn with_shape(mut self, shape: ResultShape) -> Self {
        self.shape_hint = Some(shape);
        self
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }
}

/// Result of a catalog request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReport {
    pub name: String,
    pub command: String,
    pub output: String,
    pub result: StructuredResult,
    /// Only for `summary`.
    pub summary: Option<SummaryData>,
}

/// Routes requests through catalog or policy, then runner, then interpreter.
///
/// Holds no per-request state; every call may run concurrently.
pub struct Gateway<R: CommandRunner = Executor> {
    runner: R,
    policy: PolicyGate,
    catalog: CommandCatalog,
    config: GatewayConfig,
    metrics: Arc<Metrics>,
}

impl Gateway<Executor> {
    pub fn from_config(config: GatewayConfig) -> Self {
        let executor = config.executor();
        Self::with_runner(config, executor)
    }
}

impl<R: CommandRunner> Gateway<R> {
    pub fn with_runner(config: GatewayConfig, runner: R) -> Self {
        Self {
            runner,
            policy: config.policy(),
            catalog: CommandCatalog::new(),
            config,
            metrics: Metrics::new(),
        }
    }

    pub fn policy(&self) -> &PolicyGate {
        &self.policy
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Policy verdict for a command, without running it.
    pub fn check(&self, command: &str) -> PolicyDecision {
        self.policy.evaluate(command)
    }

    /// Run a catalog entry by name. Catalog pipelines skip the policy gate.
    pub async fn run_metric(&self, name: &str) -> Result<MetricReport, GatewayError> {
        self.metrics.inc_catalog_requests();

        let entry = self
            .catalog
            .resolve(name)
            .ok_or_else(|| GatewayError::UnknownCatalogName {
                name: name.to_string(),
                available: self.catalog.names().join(", "),
            })?;
        info!("Catalog request: {}", entry.name);

        let command = entry.shell_command();
        let output = self.execute(&command, self.config.catalog_timeout()).await?;

        let summary = if entry.is_summary() {
            Some(self.probe_summary().await)
        } else {
            None
        };

        let interpretation = interpret(&output, Some(entry.shape), &entry.column_names());
        if interpretation.is_empty() {
            self.metrics.inc_empty_parses();
        }
        let result = StructuredResult::from_interpretation(
            entry.name,
            entry.command,
            entry.category,
            output.clone(),
            interpretation,
        );

        Ok(MetricReport {
            name: entry.name.to_string(),
            command: entry.command.to_string(),
            output,
            result,
            summary,
        })
    }

    /// Validate, run and interpret an arbitrary command.
    ///
    /// A denial is delivered as a `Blocked` result and never reaches the
    /// runner.
    pub async fn run_free_form(
        &self,
        request: FreeFormRequest,
    ) -> Result<StructuredResult, GatewayError> {
        self.metrics.inc_free_form_requests();

        let command = request.command.trim();
        if command.is_empty() {
            return Err(GatewayError::EmptyCommand);
        }
        info!("Free-form request: {}", command);

        let decision = self.policy.evaluate(command);
        if let PolicyDecision::Denied { matched_pattern } = &decision {
            self.metrics.inc_denials();
            warn!("Denied command {:?} (matched {:?})", command, matched_pattern);
            let reason = decision.reason().unwrap_or_default();
            return Ok(StructuredResult::blocked(request.query, command, reason)
                .with_matched_pattern(matched_pattern.as_str()));
        }

        let shell_command = ShellCommand::new(command);
        let output = self
            .execute(&shell_command, self.config.free_form_timeout())
            .await?;

        let hint = request.shape_hint.filter(|shape| *shape != ResultShape::Blocked);
        let interpretation = interpret(&output, hint, &request.columns);
        if interpretation.is_empty() {
            self.metrics.inc_empty_parses();
        }

        Ok(StructuredResult::from_interpretation(
            request.query,
            command,
            request.category,
            output,
            interpretation,
        ))
    }

    /// Handle an extracted agent answer. Nothing runs when the agent gave no
    /// command or refused the request itself.
    pub async fn run_translation(
        &self,
        translation: AgentTranslation,
    ) -> Result<StructuredResult, GatewayError> {
        if translation.is_unparseable() || translation.command.trim().is_empty() {
            info!("Agent answer has no command, showing its text");
            let interpretation =
                interpret(&translation.result, Some(ResultShape::PlainText), &[]);
            return Ok(StructuredResult::from_interpretation(
                translation.query,
                translation.command,
                translation.category,
                translation.result,
                interpretation,
            ));
        }

        if translation.is_flagged_blocked() {
            self.metrics.inc_denials();
            warn!("Agent flagged command as unsafe: {}", translation.command);
            let reason = if translation.blocked_reason.is_empty() {
                AGENT_BLOCKED_REASON.to_string()
            } else {
                translation.blocked_reason
            };
            return Ok(StructuredResult::blocked(
                translation.query,
                translation.command,
                reason,
            ));
        }

        self.run_free_form(translation.into_request()).await
    }

    async fn execute(
        &self,
        command: &ShellCommand,
        timeout: Duration,
    ) -> Result<String, GatewayError> {
        let _in_flight = self.metrics.track_in_flight();
        self.metrics.inc_executions();

        match self.runner.run(command, timeout).await {
            ExecutionOutcome::Success {
                stdout,
                duration_ms,
            } => {
                debug!("{} finished in {}ms", command, duration_ms);
                Ok(stdout)
            }
            ExecutionOutcome::TimedOut { timeout_ms } => {
                self.metrics.inc_timeouts();
                Err(GatewayError::ExecutionTimedOut {
                    command: command.to_string(),
                    timeout_ms,
                })
            }
            ExecutionOutcome::Failed { stderr, exit_info } => {
                self.metrics.inc_failures();
                Err(GatewayError::ExecutionFailed {
                    command: command.to_string(),
                    stderr,
                    exit_info,
                })
            }
        }
    }

    /// The four health card probes, run concurrently. A failed probe only
    /// costs its own card.
    async fn probe_summary(&self) -> SummaryData {
        let timeout = self.config.summary_probe_timeout();
        let [memory, disk, cpu, uptime] = SUMMARY_PROBES;
        let (memory, disk, cpu, uptime) = tokio::join!(
            self.probe(memory, timeout),
            self.probe(disk, timeout),
            self.probe(cpu, timeout),
            self.probe(uptime, timeout),
        );
        SummaryData::from_probes(
            cpu.as_deref(),
            memory.as_deref(),
            disk.as_deref(),
            uptime.as_deref(),
        )
    }

    async fn probe(&self, command: &str, timeout: Duration) -> Option<String> {
        match self.execute(&ShellCommand::new(command), timeout).await {
            Ok(output) => Some(output),
            Err(e) => {
                warn!("Summary probe failed: {}", e);
                None
            }
        }
    }
}
