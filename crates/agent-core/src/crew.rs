//! Crews
//!
//! A crew is a small task graph executed in sequential process order.
//! Each task invokes one registered tool; a task may name upstream tasks
//! whose structured output is handed to it under the `context` argument.
//!
//! ```text
//! inputs ──▶ [fetch] ──▶ [assess] ──▶ [allocate] ──▶ CrewOutput
//!               │            ▲ ▲            ▲
//!               └────────────┘ └────────────┘ (context)
//! ```
//!
//! Crews only run with valid credentials. Any task failure aborts the run
//! with `AgentError::TaskFailed`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::tool::{Tool, ToolCall, ToolRegistry};

/// Credentials a crew needs before it may run
#[derive(Clone, Serialize, Deserialize)]
pub struct CrewCredentials {
    pub api_key: String,
}

impl std::fmt::Debug for CrewCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrewCredentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Shortest key accepted as well-formed
const MIN_KEY_LEN: usize = 8;

impl CrewCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into() }
    }

    /// Static well-formedness check (no network)
    pub fn validate(&self) -> Result<()> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(AgentError::Auth("crew API key is empty".into()));
        }
        if key.len() < MIN_KEY_LEN || key.chars().any(char::is_whitespace) {
            return Err(AgentError::Auth("crew API key is malformed".into()));
        }
        Ok(())
    }
}

/// A unit of work in a crew
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Unique task name
    pub name: String,

    /// Registered tool that performs the task
    pub tool: String,

    /// What the task is for (logged)
    pub description: String,

    /// Upstream tasks whose data this task receives
    pub context: Vec<String>,
}

impl Task {
    pub fn new(name: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tool: tool.into(),
            description: String::new(),
            context: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn context(mut self, upstream: &[&str]) -> Self {
        self.context = upstream.iter().map(|s| (*s).to_string()).collect();
        self
    }
}

/// Output of one completed task
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task: String,
    pub tool: String,
    pub output: String,
    pub data: Option<serde_json::Value>,
}

/// Output of a whole crew run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrewOutput {
    pub run_id: String,
    pub tasks: Vec<TaskOutput>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrewOutput {
    /// Output of a named task
    pub fn get(&self, task: &str) -> Option<&TaskOutput> {
        self.tasks.iter().find(|t| t.task == task)
    }

    /// Output of the final task
    pub fn last(&self) -> Option<&TaskOutput> {
        self.tasks.last()
    }
}

/// Crew configuration
#[derive(Clone, Debug)]
pub struct CrewConfig {
    /// Time budget for each task
    pub task_timeout: Duration,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(30),
        }
    }
}

/// A validated, runnable crew
pub struct Crew {
    tools: Arc<ToolRegistry>,
    tasks: Vec<Task>,
    credentials: CrewCredentials,
    config: CrewConfig,
}

impl Crew {
    /// Run every task in order
    pub async fn kickoff(&self, inputs: HashMap<String, serde_json::Value>) -> Result<CrewOutput> {
        self.credentials.validate()?;

        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        tracing::info!(run_id = %run_id, tasks = self.tasks.len(), tools = ?self.tools.names(), "Crew kickoff");

        for task in &self.tasks {
            let mut arguments = inputs.clone();
            arguments.insert("context".into(), Self::context_for(task, &outputs));

            let call = ToolCall::new(&task.tool, arguments);
            tracing::debug!(task = %task.name, tool = %task.tool, "{}", task.description);

            let secs = self.config.task_timeout.as_secs();
            let result = tokio::time::timeout(self.config.task_timeout, self.tools.execute(&call))
                .await
                .map_err(|_| AgentError::TaskFailed {
                    task: task.name.clone(),
                    reason: AgentError::Timeout(secs).to_string(),
                })?
                .map_err(|e| AgentError::TaskFailed {
                    task: task.name.clone(),
                    reason: e.to_string(),
                })?;

            if !result.success {
                return Err(AgentError::TaskFailed {
                    task: task.name.clone(),
                    reason: result.output,
                });
            }

            outputs.push(TaskOutput {
                task: task.name.clone(),
                tool: task.tool.clone(),
                output: result.output,
                data: result.data,
            });
        }

        tracing::info!(run_id = %run_id, "Crew finished");

        Ok(CrewOutput {
            run_id,
            tasks: outputs,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn context_for(task: &Task, done: &[TaskOutput]) -> serde_json::Value {
        let mut context = serde_json::Map::new();
        for upstream in &task.context {
            if let Some(out) = done.iter().find(|o| &o.task == upstream) {
                context.insert(
                    upstream.clone(),
                    out.data.clone().unwrap_or(serde_json::Value::Null),
                );
            }
        }
        serde_json::Value::Object(context)
    }

    /// Task names in execution order
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Builder for a crew
pub struct CrewBuilder {
    tools: ToolRegistry,
    tasks: Vec<Task>,
    credentials: Option<CrewCredentials>,
    config: CrewConfig,
}

impl Default for CrewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CrewBuilder {
    pub fn new() -> Self {
        Self {
            tools: ToolRegistry::new(),
            tasks: Vec::new(),
            credentials: None,
            config: CrewConfig::default(),
        }
    }

    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn credentials(mut self, credentials: CrewCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.config.task_timeout = timeout;
        self
    }

    /// Validate the task graph and produce a crew
    pub fn build(self) -> Result<Crew> {
        let credentials = self.credentials
            .ok_or_else(|| AgentError::Config("Crew credentials are required".into()))?;
        credentials.validate()?;

        if self.tasks.is_empty() {
            return Err(AgentError::Config("Crew has no tasks".into()));
        }

        for (i, task) in self.tasks.iter().enumerate() {
            if self.tools.get(&task.tool).is_none() {
                return Err(AgentError::ToolNotFound(task.tool.clone()));
            }
            if self.tasks[..i].iter().any(|t| t.name == task.name) {
                return Err(AgentError::Config(format!("Duplicate task name: {}", task.name)));
            }
            for upstream in &task.context {
                if !self.tasks[..i].iter().any(|t| &t.name == upstream) {
                    return Err(AgentError::Config(format!(
                        "Task '{}' depends on '{}' which does not run before it",
                        task.name, upstream
                    )));
                }
            }
        }

        Ok(Crew {
            tools: Arc::new(self.tools),
            tasks: self.tasks,
            credentials,
            config: self.config,
        })
    }
}
