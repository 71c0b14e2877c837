//! Persisted deploy state.
//!
//! Everything that survives between runs lives in one state directory:
//! - `last_commit`: the last successfully deployed revision
//! - `deploy.log`: append-only history, one line per recorded run
//! - `deploy.lock`: advisory lock held while a run is in progress

pub mod commit;
pub mod history;
pub mod lock;

pub use commit::CommitStore;
pub use history::{DeployHistory, DeployRecord};
pub use lock::DeployLock;
