//! Multi-step processing of a single audio file.
//!
//! A [`Workflow`] maps the four standard steps (analysis, separation,
//! classification, visualization) to operation factories supplied by the
//! collaborators, then runs a requested subset through the coordinator:
//! concurrently via [`TaskCoordinator::run_parallel`], or one after another
//! via [`TaskCoordinator::run_with_cache`].

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::Params;
use crate::coordinator::{error_result, Operation, ParallelTask, TaskCoordinator};

/// Steps requested when the caller does not name any.
pub const DEFAULT_STEPS: [WorkflowStep; 2] = [WorkflowStep::Analysis, WorkflowStep::Classification];

/// A processing step of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStep {
    Analysis,
    Separation,
    Classification,
    Visualization,
}

impl WorkflowStep {
    pub const ALL: [WorkflowStep; 4] = [
        Self::Analysis,
        Self::Separation,
        Self::Classification,
        Self::Visualization,
    ];

    /// Operation name used for caching and timing.
    pub fn name(self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Separation => "separation",
            Self::Classification => "classification",
            Self::Visualization => "visualization",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkflowStep {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|step| step.name() == name)
            .ok_or_else(|| WorkflowError::UnknownStep(s.to_string()))
    }
}

/// Workflow errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Unknown workflow step '{0}'")]
    UnknownStep(String),

    #[error("No valid operations specified (available: {})", join_names(.available))]
    NoValidSteps { available: Vec<WorkflowStep> },
}

fn join_names(steps: &[WorkflowStep]) -> String {
    steps
        .iter()
        .map(|step| step.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the operation for one step from the file and parameters.
pub type StepFactory = Arc<dyn Fn(&Path, &Params) -> Operation + Send + Sync>;

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub step: WorkflowStep,
    pub result: Value,
    /// Seconds spent on this step; only measured in sequential mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_secs: Option<f64>,
}

/// Results of a workflow run, in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowReport {
    pub file_path: PathBuf,
    /// Requested names that matched no registered step
    pub skipped: Vec<String>,
    pub results: Vec<StepResult>,
    pub parallel: bool,
    pub total_time_secs: f64,
}

impl WorkflowReport {
    /// Result of a step, if it ran.
    pub fn result(&self, step: WorkflowStep) -> Option<&Value> {
        self.results
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.result)
    }
}

/// Step registry bound to a coordinator.
pub struct Workflow {
    coordinator: Arc<TaskCoordinator>,
    steps: BTreeMap<WorkflowStep, StepFactory>,
}

impl Workflow {
    pub fn new(coordinator: Arc<TaskCoordinator>) -> Self {
        Self {
            coordinator,
            steps: BTreeMap::new(),
        }
    }

    /// Register the operation factory for a step, replacing any previous one.
    pub fn register<F>(mut self, step: WorkflowStep, factory: F) -> Self
    where
        F: Fn(&Path, &Params) -> Operation + Send + Sync + 'static,
    {
        self.steps.insert(step, Arc::new(factory));
        self
    }

    /// Steps with a registered factory.
    pub fn available_steps(&self) -> Vec<WorkflowStep> {
        self.steps.keys().copied().collect()
    }

    /// Run the requested steps on a file.
    ///
    /// Unknown or unregistered names are skipped. An empty `requested`
    /// slice selects [`DEFAULT_STEPS`]. Parallel mode is only used when more
    /// than one step remains. In sequential mode a failing step records an
    /// error value in its slot and later steps still run.
    pub async fn run(
        &self,
        file: &Path,
        requested: &[&str],
        params: &Params,
        parallel: bool,
    ) -> Result<WorkflowReport, WorkflowError> {
        if !file.exists() {
            return Err(WorkflowError::FileNotFound(file.to_path_buf()));
        }

        let (selected, skipped) = self.select(requested);
        if selected.is_empty() {
            return Err(WorkflowError::NoValidSteps {
                available: self.available_steps(),
            });
        }
        for name in &skipped {
            warn!(step = %name, "Skipping unknown workflow step");
        }

        let started = Instant::now();
        let run_parallel = parallel && selected.len() > 1;

        let results = if run_parallel {
            self.run_concurrently(file, params, &selected).await
        } else {
            self.run_sequentially(file, params, &selected).await
        };

        let report = WorkflowReport {
            file_path: file.to_path_buf(),
            skipped,
            results,
            parallel: run_parallel,
            total_time_secs: started.elapsed().as_secs_f64(),
        };

        info!(
            file = %file.display(),
            steps = report.results.len(),
            parallel = run_parallel,
            total_secs = report.total_time_secs,
            "Workflow complete"
        );
        Ok(report)
    }

    fn select(&self, requested: &[&str]) -> (Vec<(WorkflowStep, StepFactory)>, Vec<String>) {
        let mut selected = Vec::new();
        let mut skipped = Vec::new();

        let names: Vec<&str> = if requested.is_empty() {
            DEFAULT_STEPS.iter().map(|step| step.name()).collect()
        } else {
            requested.to_vec()
        };

        for name in names {
            let factory = name
                .parse::<WorkflowStep>()
                .ok()
                .and_then(|step| self.steps.get(&step).map(|f| (step, Arc::clone(f))));
            match factory {
                Some(entry) => selected.push(entry),
                None => skipped.push(name.to_string()),
            }
        }

        (selected, skipped)
    }

    async fn run_concurrently(
        &self,
        file: &Path,
        params: &Params,
        selected: &[(WorkflowStep, StepFactory)],
    ) -> Vec<StepResult> {
        let tasks = selected
            .iter()
            .map(|(step, factory)| ParallelTask::new(step.name(), factory(file, params)))
            .collect();

        let values = self.coordinator.run_parallel(tasks).await;

        selected
            .iter()
            .zip(values)
            .map(|((step, _), result)| StepResult {
                step: *step,
                result,
                elapsed_secs: None,
            })
            .collect()
    }

    async fn run_sequentially(
        &self,
        file: &Path,
        params: &Params,
        selected: &[(WorkflowStep, StepFactory)],
    ) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(selected.len());

        for (step, factory) in selected {
            let started = Instant::now();
            let result = self
                .coordinator
                .run_with_cache(step.name(), factory(file, params), file, params)
                .await
                .unwrap_or_else(|e| {
                    warn!(step = %step, error = %e, "Workflow step failed");
                    error_result(format!("Task {} failed: {}", step, e))
                });

            results.push(StepResult {
                step: *step,
                result,
                elapsed_secs: Some(started.elapsed().as_secs_f64()),
            });
        }

        results
    }
}
