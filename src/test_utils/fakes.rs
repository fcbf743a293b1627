//! In-memory provider fakes.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::core::DepflowError;
use crate::github::{ApiInfo, CommitComparison, HistoryError, HistoryProvider};
use crate::graph::{Build, BuildGraph, BuildGraphProvider, BuildId, BuildSummary};

/// Build-graph provider serving a fixed graph.
#[derive(Debug)]
pub struct FakeBuildGraphProvider {
    latest: Option<BuildId>,
    graph: BuildGraph,
    graph_requests: AtomicUsize,
}

impl FakeBuildGraphProvider {
    /// Serve `builds`, reporting `latest` as the latest build of every repository.
    pub fn new(latest: BuildId, builds: impl IntoIterator<Item = Build>) -> Self {
        Self {
            latest: Some(latest),
            graph: BuildGraph::new(builds),
            graph_requests: AtomicUsize::new(0),
        }
    }

    /// A provider with no builds on any channel.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            latest: None,
            graph: BuildGraph::default(),
            graph_requests: AtomicUsize::new(0),
        }
    }

    /// Number of graph requests served.
    pub fn graph_requests(&self) -> usize {
        self.graph_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildGraphProvider for FakeBuildGraphProvider {
    async fn get_latest(&self, repository: &str, channel_id: u32) -> Result<BuildSummary> {
        let id = self.latest.ok_or_else(|| DepflowError::LatestBuildNotFound {
            repository: repository.to_string(),
            channel_id,
        })?;
        let build = self.graph.get(id);
        Ok(BuildSummary {
            id,
            commit: build.map(|b| b.commit.clone()),
            date_produced: build.map(|b| b.date_produced),
        })
    }

    async fn get_build_graph(&self, _build_id: BuildId) -> Result<BuildGraph> {
        self.graph_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.graph.clone())
    }
}

/// One recorded `compare` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareCall {
    pub owner: String,
    pub repo: String,
    pub base: String,
    pub head: String,
}

/// History provider answering from canned responses keyed by `owner/repo`.
///
/// Unknown repositories answer [`HistoryError::NotFound`].
#[derive(Debug, Default)]
pub struct FakeHistoryProvider {
    responses: HashMap<String, Result<CommitComparison, HistoryError>>,
    delays: HashMap<String, Duration>,
    api_info: Option<ApiInfo>,
    calls: Mutex<Vec<CompareCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeHistoryProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_comparison(mut self, owner: &str, repo: &str, comparison: CommitComparison) -> Self {
        self.responses.insert(key(owner, repo), Ok(comparison));
        self
    }

    #[must_use]
    pub fn with_error(mut self, owner: &str, repo: &str, error: HistoryError) -> Self {
        self.responses.insert(key(owner, repo), Err(error));
        self
    }

    /// Delay the answer for `owner/repo`.
    #[must_use]
    pub fn with_delay(mut self, owner: &str, repo: &str, delay: Duration) -> Self {
        self.delays.insert(key(owner, repo), delay);
        self
    }

    #[must_use]
    pub fn with_api_info(mut self, info: ApiInfo) -> Self {
        self.api_info = Some(info);
        self
    }

    /// Calls received so far, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    pub fn calls(&self) -> Vec<CompareCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    /// Highest number of concurrently running `compare` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoryProvider for FakeHistoryProvider {
    async fn compare(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<CommitComparison, HistoryError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(CompareCall {
                owner: owner.to_string(),
                repo: repo.to_string(),
                base: base.to_string(),
                head: head.to_string(),
            });
        }

        let key = key(owner, repo);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.responses.get(&key).cloned().unwrap_or(Err(HistoryError::NotFound))
    }

    fn last_api_info(&self) -> Option<ApiInfo> {
        self.api_info
    }
}

fn key(owner: &str, repo: &str) -> String {
    format!("{}/{}", owner.to_ascii_lowercase(), repo.to_ascii_lowercase())
}
