//! Process-scoped readiness for the external places library.
//!
//! A [`WidgetSession`] is built once, shared through an `Arc`, and loads the
//! library at most once. Failure is terminal for the session: everything
//! downstream degrades to plain text input instead of retrying.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::app::ports::{PlacesLibrary, PlacesLibraryLoader};
use crate::config::PlacesConfig;
use crate::observability::metrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    MissingCredential,
    LoadError(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MissingCredential => write!(f, "missing credential"),
            FailureReason::LoadError(detail) => write!(f, "load error: {}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Uninitialized,
    Loading,
    Ready,
    Failed(FailureReason),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Readiness::Failed(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Readiness::Uninitialized => "uninitialized",
            Readiness::Loading => "loading",
            Readiness::Ready => "ready",
            Readiness::Failed(_) => "failed",
        }
    }
}

enum SessionState {
    Uninitialized,
    Loading,
    Ready(PlacesLibrary),
    Failed(FailureReason),
}

impl SessionState {
    fn readiness(&self) -> Readiness {
        match self {
            SessionState::Uninitialized => Readiness::Uninitialized,
            SessionState::Loading => Readiness::Loading,
            SessionState::Ready(_) => Readiness::Ready,
            SessionState::Failed(reason) => Readiness::Failed(reason.clone()),
        }
    }
}

pub struct WidgetSession {
    credential: Option<String>,
    loader: Arc<dyn PlacesLibraryLoader>,
    state: Mutex<SessionState>,
    notify: watch::Sender<Readiness>,
}

impl WidgetSession {
    pub fn new(credential: Option<String>, loader: Arc<dyn PlacesLibraryLoader>) -> Self {
        let credential = credential
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let (notify, _) = watch::channel(Readiness::Uninitialized);
        Self {
            credential,
            loader,
            state: Mutex::new(SessionState::Uninitialized),
            notify,
        }
    }

    pub fn from_config(config: &PlacesConfig, loader: Arc<dyn PlacesLibraryLoader>) -> Self {
        Self::new(config.credential().map(str::to_string), loader)
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transition(&self, state: &mut SessionState, next: SessionState) -> Readiness {
        *state = next;
        let readiness = state.readiness();
        info!(readiness = readiness.label(), "places session transition");
        metrics::session::readiness_changed(readiness.label());
        self.notify.send_replace(readiness.clone());
        readiness
    }

    /// Start the library load if nobody has yet; otherwise report the current state.
    ///
    /// Only the first caller awaits the load. Callers arriving while it is in
    /// flight get `Loading` back immediately.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Readiness {
        let credential = {
            let mut state = self.lock_state();
            if !matches!(*state, SessionState::Uninitialized) {
                return state.readiness();
            }
            match self.credential.clone() {
                Some(credential) => {
                    self.transition(&mut *state, SessionState::Loading);
                    credential
                }
                None => {
                    warn!("places credential is not configured; autocomplete disabled");
                    return self.transition(
                        &mut *state,
                        SessionState::Failed(FailureReason::MissingCredential),
                    );
                }
            }
        };

        let outcome = self.loader.load(&credential).await;

        let mut state = self.lock_state();
        match outcome {
            Ok(library) => self.transition(&mut *state, SessionState::Ready(library)),
            Err(e) => {
                warn!(error = %e, "places library failed to load");
                self.transition(
                    &mut *state,
                    SessionState::Failed(FailureReason::LoadError(e.to_string())),
                )
            }
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.lock_state().readiness()
    }

    /// The loaded library, only while the session is ready
    pub fn library(&self) -> Option<PlacesLibrary> {
        match &*self.lock_state() {
            SessionState::Ready(library) => Some(library.clone()),
            _ => None,
        }
    }

    /// Watch readiness transitions without polling
    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.notify.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AddressError, Result};
    use crate::infra::in_memory::{InMemoryPlacesService, ScriptedWidgetFactory};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingLoader {
        loads: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl CountingLoader {
        fn new(fail: bool, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                loads: AtomicUsize::new(0),
                fail,
                delay,
            })
        }
    }

    #[async_trait]
    impl PlacesLibraryLoader for CountingLoader {
        async fn load(&self, _credential: &str) -> Result<PlacesLibrary> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(AddressError::LoadFailure("network unreachable".into()));
            }
            Ok(PlacesLibrary {
                service: Arc::new(InMemoryPlacesService::default()),
                widgets: Arc::new(ScriptedWidgetFactory::default()),
            })
        }
    }

    #[tokio::test]
    async fn test_missing_credential_fails_without_loading() {
        let loader = CountingLoader::new(false, Duration::ZERO);
        let session = WidgetSession::new(None, loader.clone());

        let readiness = session.initialize().await;
        assert_eq!(readiness, Readiness::Failed(FailureReason::MissingCredential));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
        assert!(session.library().is_none());
    }

    #[tokio::test]
    async fn test_blank_credential_is_missing() {
        let loader = CountingLoader::new(false, Duration::ZERO);
        let session = WidgetSession::new(Some("  ".into()), loader.clone());
        assert!(session.initialize().await.is_failed());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ready_after_successful_load() {
        let loader = CountingLoader::new(false, Duration::ZERO);
        let session = WidgetSession::new(Some("key".into()), loader.clone());

        assert_eq!(session.readiness(), Readiness::Uninitialized);
        assert_eq!(session.initialize().await, Readiness::Ready);
        assert!(session.library().is_some());

        // Repeat calls never reload
        assert_eq!(session.initialize().await, Readiness::Ready);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_initialize_loads_once() {
        let loader = CountingLoader::new(false, Duration::from_millis(50));
        let session = WidgetSession::new(Some("key".into()), loader.clone());

        let (first, second) = tokio::join!(session.initialize(), session.initialize());
        assert_eq!(first, Readiness::Ready);
        assert_eq!(second, Readiness::Loading);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert_eq!(session.readiness(), Readiness::Ready);
    }

    #[tokio::test]
    async fn test_load_failure_is_terminal() {
        let loader = CountingLoader::new(true, Duration::ZERO);
        let session = WidgetSession::new(Some("key".into()), loader.clone());

        let readiness = session.initialize().await;
        assert!(matches!(readiness, Readiness::Failed(FailureReason::LoadError(_))));

        assert!(session.initialize().await.is_failed());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let loader = CountingLoader::new(false, Duration::ZERO);
        let session = WidgetSession::new(Some("key".into()), loader);
        let rx = session.subscribe();

        session.initialize().await;
        assert_eq!(*rx.borrow(), Readiness::Ready);
    }
}
