#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use git2::{IndexAddOption, Repository, Signature};
use tempfile::TempDir;

use rollout_core::deps::DependencyInstaller;
use rollout_core::git::{SourceControl, git_command};
use rollout_core::orchestration::{DeployOrchestrator, ReadinessPolicy};
use rollout_core::registry::{Service, ServiceRegistry};
use rollout_core::selection::{SelectionMode, Selector};
use rollout_core::state::CommitStore;
use rollout_core::supervisor::ProcessSupervisor;
use rollout_core::types::{Revision, ServiceStatus};

pub const MANIFEST: &str = "requirements.txt";

// ---------------------------------------------------------------------------
// git fixtures
// ---------------------------------------------------------------------------

pub fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    index.update_all(["*"].iter(), None).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::now("rollout", "rollout@example.com").unwrap();
    match repo.head() {
        Ok(head) => {
            let parent = repo.find_commit(head.target().unwrap()).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
                .unwrap()
        }
        Err(_) => repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[])
            .unwrap(),
    }
}

pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn current_branch(repo: &Repository) -> String {
    repo.head().unwrap().shorthand().unwrap().to_string()
}

/// Clone `upstream` into `dest` with the git CLI.
pub fn clone_repo(upstream: &Path, dest: &Path) {
    let status = git_command()
        .arg("clone")
        .arg("--quiet")
        .arg(upstream)
        .arg(dest)
        .status()
        .unwrap();
    assert!(status.success(), "git clone failed");
}

pub fn rev(oid: git2::Oid) -> Revision {
    Revision::parse(&oid.to_string()).unwrap()
}

// ---------------------------------------------------------------------------
// fakes
// ---------------------------------------------------------------------------

/// Ordered record of collaborator calls shared by all fakes.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Events other than liveness queries.
    pub fn actions(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| !e.starts_with("status:"))
            .collect()
    }
}

struct SourceState {
    head: Revision,
    upstream: Revision,
    tracked: Vec<String>,
    diffs: HashMap<(String, String), Vec<String>>,
    known: HashSet<String>,
    sync_error: Option<String>,
}

pub struct FakeSource {
    journal: Journal,
    state: Mutex<SourceState>,
}

impl FakeSource {
    pub fn new(journal: Journal, head: &str) -> Self {
        Self {
            journal,
            state: Mutex::new(SourceState {
                head: Revision::parse(head).unwrap(),
                upstream: Revision::parse(head).unwrap(),
                tracked: Vec::new(),
                diffs: HashMap::new(),
                known: HashSet::from([head.to_string()]),
                sync_error: None,
            }),
        }
    }

    /// New upstream revision; the next sync moves head to it.
    pub fn push_upstream(&self, revision: &str) {
        let mut state = self.state.lock().unwrap();
        state.upstream = Revision::parse(revision).unwrap();
        state.known.insert(revision.to_string());
    }

    pub fn set_tracked(&self, paths: &[&str]) {
        self.state.lock().unwrap().tracked = paths.iter().map(|p| p.to_string()).collect();
    }

    pub fn set_diff(&self, from: &str, to: &str, paths: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.known.insert(from.to_string());
        state.known.insert(to.to_string());
        state.diffs.insert(
            (from.to_string(), to.to_string()),
            paths.iter().map(|p| p.to_string()).collect(),
        );
    }

    pub fn fail_sync(&self, message: &str) {
        self.state.lock().unwrap().sync_error = Some(message.to_string());
    }

    pub fn head(&self) -> Revision {
        self.state.lock().unwrap().head.clone()
    }
}

impl SourceControl for FakeSource {
    fn sync(&self) -> anyhow::Result<Revision> {
        self.journal.push("sync");
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.sync_error {
            anyhow::bail!("{}", message);
        }
        state.head = state.upstream.clone();
        Ok(state.head.clone())
    }

    fn fetch_upstream(&self) -> anyhow::Result<Revision> {
        self.journal.push("fetch");
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.sync_error {
            anyhow::bail!("{}", message);
        }
        Ok(state.upstream.clone())
    }

    fn diff_paths(&self, from: &Revision, to: &Revision) -> anyhow::Result<Vec<String>> {
        self.journal.push(format!("diff:{}..{}", from, to));
        let state = self.state.lock().unwrap();
        state
            .diffs
            .get(&(from.to_string(), to.to_string()))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no diff fixture for {}..{}", from, to))
    }

    fn tracked_paths(&self, at: &Revision) -> anyhow::Result<Vec<String>> {
        self.journal.push(format!("tracked:{}", at));
        Ok(self.state.lock().unwrap().tracked.clone())
    }

    fn has_revision(&self, revision: &Revision) -> bool {
        self.state.lock().unwrap().known.contains(revision.as_str())
    }
}

pub struct FakeSupervisor {
    journal: Journal,
    statuses: Mutex<HashMap<String, ServiceStatus>>,
    reload_error: Mutex<Option<String>>,
}

impl FakeSupervisor {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            statuses: Mutex::new(HashMap::new()),
            reload_error: Mutex::new(None),
        }
    }

    /// Units not configured here report running.
    pub fn set_status(&self, unit: &str, status: ServiceStatus) {
        self.statuses.lock().unwrap().insert(unit.to_string(), status);
    }

    pub fn fail_reload(&self, message: &str) {
        *self.reload_error.lock().unwrap() = Some(message.to_string());
    }
}

impl ProcessSupervisor for FakeSupervisor {
    fn reload(&self) -> anyhow::Result<()> {
        self.journal.push("reload");
        if let Some(message) = self.reload_error.lock().unwrap().as_ref() {
            anyhow::bail!("{}", message);
        }
        Ok(())
    }

    fn restart(&self, unit: &str) -> anyhow::Result<()> {
        self.journal.push(format!("restart:{}", unit));
        Ok(())
    }

    fn status(&self, unit: &str) -> ServiceStatus {
        self.journal.push(format!("status:{}", unit));
        self.statuses
            .lock()
            .unwrap()
            .get(unit)
            .copied()
            .unwrap_or(ServiceStatus::Running)
    }

    fn diagnostics(&self, unit: &str) -> String {
        self.journal.push(format!("diagnostics:{}", unit));
        format!("{} - failed\nTraceback: boom", unit)
    }
}

pub struct FakeInstaller {
    journal: Journal,
    error: Mutex<Option<String>>,
}

impl FakeInstaller {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            error: Mutex::new(None),
        }
    }

    pub fn fail(&self, message: &str) {
        *self.error.lock().unwrap() = Some(message.to_string());
    }
}

impl DependencyInstaller for FakeInstaller {
    fn install(&self) -> anyhow::Result<()> {
        self.journal.push("install");
        if let Some(message) = self.error.lock().unwrap().as_ref() {
            anyhow::bail!("{}", message);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// harness
// ---------------------------------------------------------------------------

/// Fakes plus a scratch state directory.
pub struct Harness {
    pub temp: TempDir,
    pub journal: Journal,
    pub source: Arc<FakeSource>,
    pub supervisor: Arc<FakeSupervisor>,
    pub installer: Arc<FakeInstaller>,
}

impl Harness {
    pub fn new(head: &str) -> Self {
        let journal = Journal::default();
        Self {
            temp: TempDir::new().unwrap(),
            source: Arc::new(FakeSource::new(journal.clone(), head)),
            supervisor: Arc::new(FakeSupervisor::new(journal.clone())),
            installer: Arc::new(FakeInstaller::new(journal.clone())),
            journal,
        }
    }

    pub fn state_dir(&self) -> PathBuf {
        self.temp.path().join("state")
    }

    pub fn commits(&self) -> CommitStore {
        CommitStore::new(&self.state_dir())
    }

    pub fn orchestrator(&self, registry: ServiceRegistry, selector: Selector) -> DeployOrchestrator {
        DeployOrchestrator::new(
            self.source.clone(),
            self.supervisor.clone(),
            self.installer.clone(),
            registry,
            selector,
            self.state_dir(),
        )
        .with_readiness(ReadinessPolicy::immediate())
    }
}

pub fn selector(mode: SelectionMode) -> Selector {
    Selector::for_mode(mode, MANIFEST, true)
}

/// The four application services, all explicit-only.
pub fn app_registry() -> ServiceRegistry {
    ServiceRegistry::new(vec![
        Service::explicit("main_app"),
        Service::explicit("admin_app"),
        Service::explicit("youtube_app"),
        Service::explicit("prev_app"),
    ])
    .unwrap()
}

/// `svcX` watches `app/`, `svcY` watches `api/`.
pub fn pattern_registry() -> ServiceRegistry {
    ServiceRegistry::new(vec![
        Service::with_prefixes("svcX", ["app/"]),
        Service::with_prefixes("svcY", ["api/"]),
    ])
    .unwrap()
}
