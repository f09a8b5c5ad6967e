use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};

use log::{debug, info, warn};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::{
    dashboard::Dashboard,
    payload::{Payload, ProblemsResponse, ProfileResponse, StatsResponse},
    prelude::*,
};

pub const EMPTY_USERNAME_MESSAGE: &str = "Please enter a username";
pub const FALLBACK_MESSAGE: &str =
    "Failed to fetch profile data. Please check the username and try again.";

/// Somewhere the dashboard can get its three payloads from
pub trait StatsSource: Send + Sync {
    fn profile(&self, username: &str) -> impl Future<Output = Result<ProfileResponse>> + Send;
    fn stats(&self, username: &str) -> impl Future<Output = Result<StatsResponse>> + Send;
    fn problems(&self, username: &str) -> impl Future<Output = Result<ProblemsResponse>> + Send;
}

/// What the dashboard currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub loading: bool,
    pub error: Option<String>,
    pub dashboard: Option<Dashboard>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Loaded,
    Failed(String),
    /// A newer search started before this one finished, its results were dropped
    Superseded,
}

/// Runs searches against a [StatsSource], only ever keeping the newest search's result
pub struct SearchSession<S: StatsSource> {
    source: S,
    state: RwLock<SearchState>,
    generation: AtomicU64,
    current: Mutex<CancellationToken>,
}

impl<S: StatsSource> SearchSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: RwLock::new(SearchState::default()),
            generation: AtomicU64::new(0),
            current: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn state(&self) -> SearchState {
        self.state.read().await.clone()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Start a new generation, cancelling whatever search was in flight
    fn begin(&self) -> (u64, CancellationToken) {
        let token = CancellationToken::new();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = std::mem::replace(&mut *self.current.lock().unwrap(), token.clone());
        previous.cancel();
        (generation, token)
    }

    async fn fetch_all(&self, username: &str) -> Result<Dashboard> {
        let (profile, stats, problems) = futures::try_join!(
            async {
                self.source.profile(username).await.map_err(|why| {
                    warn!("Profile fetch for {username} failed: {why:?}");
                    anyhow!("Profile not found")
                })
            },
            async {
                self.source.stats(username).await.map_err(|why| {
                    warn!("Stats fetch for {username} failed: {why:?}");
                    anyhow!("Stats not found")
                })
            },
            async {
                self.source.problems(username).await.map_err(|why| {
                    warn!("Problems fetch for {username} failed: {why:?}");
                    anyhow!("Problems not found")
                })
            },
        )?;

        let app_error = profile
            .app_error()
            .or_else(|| stats.app_error())
            .or_else(|| problems.app_error());

        if let Some(err) = app_error {
            bail!(err);
        }

        Ok(Dashboard {
            username: username.to_string(),
            profile,
            stats,
            problems,
        })
    }

    pub async fn search(&self, username: &str) -> SearchOutcome {
        if username.trim().is_empty() {
            self.state.write().await.error = Some(EMPTY_USERNAME_MESSAGE.to_string());
            return SearchOutcome::Failed(EMPTY_USERNAME_MESSAGE.to_string());
        }

        let (generation, token) = self.begin();
        debug!("Starting search #{generation} for {username}");

        {
            let mut state = self.state.write().await;
            if !self.is_current(generation) {
                return SearchOutcome::Superseded;
            }
            *state = SearchState {
                loading: true,
                error: None,
                dashboard: None,
            };
        }

        let res = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Search #{generation} cancelled");
                return SearchOutcome::Superseded;
            }
            res = self.fetch_all(username) => res,
        };

        let mut state = self.state.write().await;
        if !self.is_current(generation) {
            debug!("Dropping stale result of search #{generation}");
            return SearchOutcome::Superseded;
        }

        state.loading = false;
        match res {
            Ok(dashboard) => {
                info!("Loaded dashboard for {username}");
                state.dashboard = Some(dashboard);
                SearchOutcome::Loaded
            }
            Err(why) => {
                let msg = why.to_string();
                let msg = if msg.is_empty() {
                    FALLBACK_MESSAGE.to_string()
                } else {
                    msg
                };
                state.error = Some(msg.clone());
                SearchOutcome::Failed(msg)
            }
        }
    }
}
