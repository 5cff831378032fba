//! Sync engine - drives the per-repository workflows for one command.
//!
//! Repositories are processed strictly in declaration order, one at a time.
//! A failed item is recorded and the batch continues; the caller turns the
//! final summary into the process exit status.

use anyhow::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{Config, RepositorySpec};
use crate::credentials::CredentialStore;
use crate::git::{GitCli, VcsClient};
use crate::logging::RunLog;

/// Remote name pointing at the target after registration
const ORIGIN: &str = "origin";

/// Remote name preserving the original source after registration
const OLD_ORIGIN: &str = "old-origin";

/// Top-level command selecting the per-repository workflow sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    /// Clone from source, then register and push the target remote
    Clone,
    /// Push the source branch to the target branch
    Push,
    /// Pull from the preserved source remote
    Pull,
    /// Delete the local working copy
    Clear,
}

impl SyncCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncCommand::Clone => "clone",
            SyncCommand::Push => "push",
            SyncCommand::Pull => "pull",
            SyncCommand::Clear => "clear",
        }
    }

    /// Whether this command invokes the version-control client at all
    pub fn needs_git(&self) -> bool {
        !matches!(self, SyncCommand::Clear)
    }
}

/// Workflow step that produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Clone,
    Register,
    Push,
    Pull,
    Clear,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Clone => "clone",
            Step::Register => "register",
            Step::Push => "push",
            Step::Pull => "pull",
            Step::Clear => "clear",
        }
    }
}

/// Typed result of one workflow step on one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Step completed
    Done { name: String, step: Step },
    /// Precondition not met; nothing was changed
    Skipped {
        name: String,
        step: Step,
        reason: String,
    },
    /// Step failed; the batch continues with the next repository
    Failed {
        name: String,
        step: Step,
        error: String,
    },
}

impl SyncOutcome {
    fn done(spec: &RepositorySpec, step: Step) -> Self {
        SyncOutcome::Done {
            name: spec.name.clone(),
            step,
        }
    }

    fn skipped(spec: &RepositorySpec, step: Step, reason: &str) -> Self {
        SyncOutcome::Skipped {
            name: spec.name.clone(),
            step,
            reason: reason.to_string(),
        }
    }

    fn failed(spec: &RepositorySpec, step: Step, error: Error) -> Self {
        SyncOutcome::Failed {
            name: spec.name.clone(),
            step,
            error: format!("{error:#}"),
        }
    }
}

/// Results from a complete run
#[derive(Debug)]
pub struct RunSummary {
    /// Repositories iterated (not individual steps)
    pub repositories: usize,
    pub done: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration: Duration,
    pub outcomes: Vec<SyncOutcome>,
}

impl RunSummary {
    fn new(repositories: usize, outcomes: Vec<SyncOutcome>, duration: Duration) -> Self {
        let mut done = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for outcome in &outcomes {
            match outcome {
                SyncOutcome::Done { .. } => done += 1,
                SyncOutcome::Skipped { .. } => skipped += 1,
                SyncOutcome::Failed { .. } => failed += 1,
            }
        }

        Self {
            repositories,
            done,
            failed,
            skipped,
            duration,
            outcomes,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// The engine applying one command to every configured repository
pub struct SyncEngine {
    workspace: PathBuf,
    repos: Vec<RepositorySpec>,
    credentials: CredentialStore,
    vcs: Arc<dyn VcsClient>,
    log: RunLog,
}

impl SyncEngine {
    /// Create an engine backed by the installed git binary
    pub fn new(config: Config, workspace: PathBuf, log: RunLog) -> Self {
        Self::with_client(config, workspace, log, Arc::new(GitCli::new()))
    }

    /// Create an engine with a substitute version-control client
    pub fn with_client(
        config: Config,
        workspace: PathBuf,
        log: RunLog,
        vcs: Arc<dyn VcsClient>,
    ) -> Self {
        Self {
            workspace,
            credentials: CredentialStore::new(config.authentication),
            repos: config.repository,
            vcs,
            log,
        }
    }

    /// Apply `command` to every repository in declaration order
    pub async fn run(&self, command: SyncCommand) -> RunSummary {
        let start = Instant::now();
        let total = self.repos.len();

        self.log.line(format!(
            "starting {} for {} repositories",
            command.as_str(),
            total
        ));

        let mut outcomes = Vec::new();

        for (index, spec) in self.repos.iter().enumerate() {
            self.log
                .line(format!("[{}/{}] {}", index + 1, total, spec.name));

            match command {
                SyncCommand::Clone => {
                    let outcome = self.clone_repo(spec).await;
                    let cloned = matches!(outcome, SyncOutcome::Done { .. });
                    self.record(outcome, &mut outcomes);

                    // Registration only makes sense on a fresh clone; an
                    // already-present working copy keeps its remotes.
                    if cloned {
                        let outcome = self.register_target(spec).await;
                        self.record(outcome, &mut outcomes);
                    }
                }
                SyncCommand::Push => {
                    let outcome = self.push_repo(spec).await;
                    self.record(outcome, &mut outcomes);
                }
                SyncCommand::Pull => {
                    let outcome = self.pull_repo(spec).await;
                    self.record(outcome, &mut outcomes);
                }
                SyncCommand::Clear => {
                    let outcome = self.clear_repo(spec).await;
                    self.record(outcome, &mut outcomes);
                }
            }
        }

        let summary = RunSummary::new(total, outcomes, start.elapsed());

        self.log.line(format!(
            "finished in {:.2}s: {} done, {} failed, {} skipped",
            summary.duration.as_secs_f64(),
            summary.done,
            summary.failed,
            summary.skipped
        ));

        summary
    }

    /// Materialize the working copy from the source remote
    async fn clone_repo(&self, spec: &RepositorySpec) -> SyncOutcome {
        if self.working_copy(spec).exists() {
            return SyncOutcome::skipped(spec, Step::Clone, "working copy already present");
        }

        let url = self
            .credentials
            .resolve_url(&spec.source.url, spec.source.auth_id());

        match self
            .vcs
            .clone_branch(&self.workspace, &url, &spec.source.branch, &spec.name)
            .await
        {
            Ok(()) => SyncOutcome::done(spec, Step::Clone),
            Err(e) => SyncOutcome::failed(spec, Step::Clone, e),
        }
    }

    /// Attach the target remote and publish the branch to it.
    ///
    /// Renames `origin` to `old-origin` so the source stays reachable, then
    /// adds the target as the new `origin`. Pulls read from `old-origin`
    /// afterwards; pushes go to `origin`.
    async fn register_target(&self, spec: &RepositorySpec) -> SyncOutcome {
        let path = self.working_copy(spec);
        if !path.exists() {
            return SyncOutcome::skipped(spec, Step::Register, "working copy missing");
        }

        let url = self
            .credentials
            .resolve_url(&spec.target.url, spec.target.auth_id());

        let result = async {
            self.vcs.rename_remote(&path, ORIGIN, OLD_ORIGIN).await?;
            self.vcs.add_remote(&path, ORIGIN, &url).await?;
            self.vcs.push(&path, ORIGIN, &refspec(spec), true).await
        }
        .await;

        match result {
            Ok(()) => SyncOutcome::done(spec, Step::Register),
            Err(e) => SyncOutcome::failed(spec, Step::Register, e),
        }
    }

    /// Publish the source branch to the target branch on the target remote
    async fn push_repo(&self, spec: &RepositorySpec) -> SyncOutcome {
        let path = self.working_copy(spec);
        if !path.exists() {
            return SyncOutcome::skipped(spec, Step::Push, "working copy missing");
        }

        match self.vcs.push(&path, ORIGIN, &refspec(spec), true).await {
            Ok(()) => SyncOutcome::done(spec, Step::Push),
            Err(e) => SyncOutcome::failed(spec, Step::Push, e),
        }
    }

    /// Refresh the working copy from the preserved source remote
    async fn pull_repo(&self, spec: &RepositorySpec) -> SyncOutcome {
        let path = self.working_copy(spec);
        if !path.exists() {
            return SyncOutcome::skipped(spec, Step::Pull, "working copy missing");
        }

        match self.vcs.pull(&path, OLD_ORIGIN).await {
            Ok(()) => SyncOutcome::done(spec, Step::Pull),
            Err(e) => SyncOutcome::failed(spec, Step::Pull, e),
        }
    }

    /// Delete the working copy tree
    async fn clear_repo(&self, spec: &RepositorySpec) -> SyncOutcome {
        let path = self.working_copy(spec);
        if !path.exists() {
            return SyncOutcome::skipped(spec, Step::Clear, "working copy missing");
        }

        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => SyncOutcome::done(spec, Step::Clear),
            Err(e) => SyncOutcome::failed(spec, Step::Clear, e.into()),
        }
    }

    fn working_copy(&self, spec: &RepositorySpec) -> PathBuf {
        self.workspace.join(&spec.name)
    }

    fn record(&self, outcome: SyncOutcome, outcomes: &mut Vec<SyncOutcome>) {
        match &outcome {
            SyncOutcome::Done { name, step } => {
                self.log.line(format!("{name}: {} done", step.as_str()));
            }
            SyncOutcome::Skipped { name, step, reason } => {
                self.log
                    .line(format!("{name}: {} skipped ({reason})", step.as_str()));
            }
            SyncOutcome::Failed { name, step, error } => {
                self.log
                    .line(format!("{name}: {} failed: {error}", step.as_str()));
            }
        }
        outcomes.push(outcome);
    }
}

/// `source:target` refspec for upstream-setting pushes
fn refspec(spec: &RepositorySpec) -> String {
    format!("{}:{}", spec.source.branch, spec.target.branch)
}
