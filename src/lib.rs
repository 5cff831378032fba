//! gitsync - Batch mirroring of git repositories between two remotes
//!
//! gitsync keeps a declared set of repositories synchronized between an
//! upstream origin and a secondary target remote, driven by a `config.json`
//! in a workspace directory. One command applies one workflow to every
//! repository, strictly in declaration order.
//!
//! ## Core Features
//!
//! - **Declarative batches**: repositories and credentials live in a single
//!   JSON configuration file
//! - **Four workflows**: clone-and-register, push, pull, and clear
//! - **Credential embedding**: percent-encoded `user:pass@` URLs for
//!   non-interactive authentication
//! - **Durable run log**: timestamped progress duplicated to stdout and
//!   `gitsync.log`
//! - **Fault isolation**: a failed repository is reported and the batch
//!   continues; failures surface in the process exit status
//!
//! ## Modules
//!
//! - [`config`]: configuration model, loading, and validation
//! - [`credentials`]: credential-embedded URL construction
//! - [`git`]: the version-control client capability and its git-CLI backend
//! - [`logging`]: the timestamped run log
//! - [`sync`]: the sync engine and per-repository workflows

pub mod config;
pub mod credentials;
pub mod git;
pub mod logging;
pub mod sync;

pub use config::{AuthEntry, Config, RemoteSpec, RepositorySpec};
pub use credentials::CredentialStore;
pub use git::{GitCli, VcsClient};
pub use logging::RunLog;
pub use sync::{RunSummary, Step, SyncCommand, SyncEngine, SyncOutcome};
