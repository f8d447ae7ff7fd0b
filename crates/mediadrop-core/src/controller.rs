//! Upload workflow controller.
//!
//! Drives one attempt at a time through
//! `Idle -> InProgress -> Succeeded | Failed`. The UI state lives in a
//! `watch` channel and is replaced as a whole on every transition. Each
//! attempt gets a fresh id and cancellation token; writes tagged with an id
//! that is no longer current are dropped, so a superseded attempt can never
//! overwrite the state of the one that replaced it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::{normalize_folder, UploadConfig};
use crate::credential::{CredentialFetcher, HttpCredentialFetcher};
use crate::error::UploadError;
use crate::models::{FailureKind, UploadProgress, UploadResult, UploadTarget, UploadUiState};
use crate::transport::{HttpUploadTransport, ProgressCallback, UploadRequest, UploadTransport};

/// Controller wired to the HTTP credential endpoint and upload transport.
pub type HttpUploadController = UploadController<HttpCredentialFetcher, HttpUploadTransport>;

/// Orchestrates credential fetch, upload, and outcome classification.
pub struct UploadController<F, T> {
    fetcher: F,
    transport: T,
    folder: String,
    shared: Arc<SharedState>,
    active: Mutex<Option<ActiveAttempt>>,
}

struct SharedState {
    state: watch::Sender<UploadUiState>,
    current_attempt: AtomicU64,
}

struct ActiveAttempt {
    id: u64,
    cancel: CancellationToken,
}

impl SharedState {
    /// Replace the state if `attempt` is still current.
    fn publish(&self, attempt: u64, next: UploadUiState) -> bool {
        self.state.send_if_modified(|state| {
            if self.current_attempt.load(Ordering::SeqCst) != attempt {
                return false;
            }
            *state = next;
            true
        })
    }

    /// Raise the in-progress percent; lower or late values are ignored.
    fn advance_progress(&self, attempt: u64, percent: u8) -> bool {
        self.state.send_if_modified(|state| {
            if self.current_attempt.load(Ordering::SeqCst) != attempt {
                return false;
            }
            match state {
                UploadUiState::InProgress(current) if percent > *current => {
                    *current = percent;
                    true
                }
                _ => false,
            }
        })
    }
}

impl HttpUploadController {
    /// Build a controller backed by HTTP collaborators.
    pub fn from_config(config: &UploadConfig) -> crate::Result<Self> {
        Ok(Self::new(
            HttpCredentialFetcher::from_config(config)?,
            HttpUploadTransport::from_config(config)?,
            config.default_folder.clone(),
        ))
    }
}

impl<F, T> UploadController<F, T>
where
    F: CredentialFetcher,
    T: UploadTransport,
{
    pub fn new(fetcher: F, transport: T, folder: impl Into<String>) -> Self {
        let (state, _) = watch::channel(UploadUiState::Idle);
        Self {
            fetcher,
            transport,
            folder: normalize_folder(Some(folder.into())),
            shared: Arc::new(SharedState {
                state,
                current_attempt: AtomicU64::new(0),
            }),
            active: Mutex::new(None),
        }
    }

    /// Destination folder passed to the transport.
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Snapshot of the current UI state.
    pub fn state(&self) -> UploadUiState {
        self.shared.state.borrow().clone()
    }

    /// Receiver that observes every published state.
    pub fn subscribe(&self) -> watch::Receiver<UploadUiState> {
        self.shared.state.subscribe()
    }

    /// Run one upload attempt for `selected_file`.
    ///
    /// Supersedes any attempt still in flight. Returns the terminal state this
    /// attempt resolved to; it is published only while the attempt is current.
    pub async fn submit(&self, selected_file: Option<UploadTarget>) -> UploadUiState {
        let cancel = CancellationToken::new();
        let attempt = self.begin_attempt(cancel.clone());

        let Some(file) = selected_file else {
            return self.finish(attempt, &cancel, Err(UploadError::NoFileSelected));
        };

        tracing::debug!(attempt, file_name = %file.name, size = file.size(), "Starting upload attempt");
        self.shared.publish(attempt, UploadUiState::InProgress(0));

        let outcome = self.run_attempt(attempt, file, &cancel).await;
        self.finish(attempt, &cancel, outcome)
    }

    /// Signal the in-flight attempt to stop.
    ///
    /// Returns `false` when no attempt is in progress.
    pub fn cancel(&self) -> bool {
        let active = self.lock_active();
        let Some(active) = active.as_ref() else {
            return false;
        };
        tracing::info!(attempt = active.id, "Cancelling upload attempt");
        active.cancel.cancel();
        true
    }

    async fn run_attempt(
        &self,
        attempt: u64,
        file: UploadTarget,
        cancel: &CancellationToken,
    ) -> Result<UploadResult, UploadError> {
        let credential = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(UploadError::cancelled()),
            credential = self.fetcher.fetch_credential() => credential?,
        };

        let request = UploadRequest {
            file,
            credential,
            folder: self.folder.clone(),
        };
        self.transport
            .upload(request, self.progress_callback(attempt), cancel.clone())
            .await
    }

    fn finish(
        &self,
        attempt: u64,
        cancel: &CancellationToken,
        outcome: Result<UploadResult, UploadError>,
    ) -> UploadUiState {
        let outcome = self.release_attempt(attempt, cancel, outcome);
        let state = match outcome {
            Ok(result) => {
                tracing::info!(
                    attempt,
                    file_id = %result.file_id,
                    url = %result.url,
                    "Upload succeeded"
                );
                UploadUiState::Succeeded(result)
            }
            Err(error) => {
                let kind = error.kind();
                match kind {
                    FailureKind::AbortedByUser | FailureKind::ValidationError => {
                        tracing::warn!(attempt, kind = %kind, "Upload failed: {}", error);
                    }
                    _ => tracing::error!(attempt, kind = %kind, "Upload failed: {}", error),
                }
                UploadUiState::Failed(kind, error.message())
            }
        };
        debug_assert!(state.is_terminal());

        if !self.shared.publish(attempt, state.clone()) {
            tracing::debug!(attempt, "Discarding outcome of superseded upload attempt");
        }
        state
    }

    fn begin_attempt(&self, cancel: CancellationToken) -> u64 {
        let mut active = self.lock_active();
        let attempt = self.shared.current_attempt.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = active.take() {
            tracing::debug!(
                superseded = previous.id,
                attempt,
                "Superseding in-flight upload attempt"
            );
            previous.cancel.cancel();
        }
        *active = Some(ActiveAttempt {
            id: attempt,
            cancel,
        });
        attempt
    }

    /// Deregister `attempt` and settle its outcome against its token.
    ///
    /// Runs under the `active` lock, so a `cancel()` that returned `true`
    /// for this attempt always turns its outcome into an abort.
    fn release_attempt(
        &self,
        attempt: u64,
        cancel: &CancellationToken,
        outcome: Result<UploadResult, UploadError>,
    ) -> Result<UploadResult, UploadError> {
        let mut active = self.lock_active();
        if active.as_ref().is_some_and(|current| current.id == attempt) {
            *active = None;
        }
        let keep = matches!(
            outcome,
            Err(UploadError::Aborted(_) | UploadError::NoFileSelected)
        );
        if cancel.is_cancelled() && !keep {
            return Err(UploadError::cancelled());
        }
        outcome
    }

    fn progress_callback(&self, attempt: u64) -> ProgressCallback {
        let shared = Arc::clone(&self.shared);
        Arc::new(move |progress: UploadProgress| {
            shared.advance_progress(attempt, progress.percent());
        })
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveAttempt>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::OnceLock;

    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    use super::*;
    use crate::models::UploadCredential;

    const TEN_MIB: u64 = 10 * 1024 * 1024;

    fn sample_credential() -> UploadCredential {
        UploadCredential {
            signature: "s".to_string(),
            expire: 1_700_000_000,
            token: "t".to_string(),
            public_key: "pk".to_string(),
        }
    }

    fn sample_result(file_id: &str) -> UploadResult {
        UploadResult {
            file_id: file_id.to_string(),
            name: "a.png".to_string(),
            size: TEN_MIB,
            file_path: "/a.png".to_string(),
            url: "https://x/a.png".to_string(),
            file_type: "image".to_string(),
            height: None,
            width: None,
            thumbnail_url: None,
        }
    }

    fn sample_file() -> UploadTarget {
        UploadTarget::new(
            "a.png",
            Some("image/png".to_string()),
            vec![0_u8; usize::try_from(TEN_MIB).unwrap()],
        )
    }

    #[derive(Clone, Copy)]
    enum FetchBehavior {
        Succeed,
        Fail,
        Hang,
    }

    struct FakeFetcher {
        behavior: FetchBehavior,
        calls: Arc<AtomicUsize>,
    }

    impl CredentialFetcher for FakeFetcher {
        async fn fetch_credential(&self) -> Result<UploadCredential, UploadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                FetchBehavior::Succeed => Ok(sample_credential()),
                FetchBehavior::Fail => Err(UploadError::Auth),
                FetchBehavior::Hang => std::future::pending().await,
            }
        }
    }

    enum Script {
        Complete {
            progress: Vec<(u64, u64)>,
            outcome: Result<UploadResult, UploadError>,
        },
        AwaitCancel {
            outcome: Result<UploadResult, UploadError>,
        },
        Gated {
            gate: Arc<Notify>,
            progress: Vec<(u64, u64)>,
            outcome: Result<UploadResult, UploadError>,
        },
    }

    #[derive(Default)]
    struct TransportProbe {
        calls: AtomicUsize,
        started: Notify,
        folders: Mutex<Vec<String>>,
        observer: OnceLock<watch::Receiver<UploadUiState>>,
        observed: Mutex<Vec<UploadUiState>>,
    }

    impl TransportProbe {
        fn observe(&self) {
            if let Some(receiver) = self.observer.get() {
                self.observed.lock().unwrap().push(receiver.borrow().clone());
            }
        }

        fn observed_progress(&self) -> Vec<u8> {
            self.observed
                .lock()
                .unwrap()
                .iter()
                .filter_map(UploadUiState::progress)
                .collect()
        }
    }

    struct FakeTransport {
        scripts: Mutex<VecDeque<Script>>,
        probe: Arc<TransportProbe>,
    }

    impl UploadTransport for FakeTransport {
        async fn upload(
            &self,
            request: UploadRequest,
            progress: ProgressCallback,
            cancel: CancellationToken,
        ) -> Result<UploadResult, UploadError> {
            let probe = Arc::clone(&self.probe);
            probe.calls.fetch_add(1, Ordering::SeqCst);
            probe.folders.lock().unwrap().push(request.folder.clone());
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted upload call");
            probe.observe();
            probe.started.notify_one();

            let emit = |events: Vec<(u64, u64)>| {
                for (sent, total) in events {
                    progress(UploadProgress::new(sent, total));
                    probe.observe();
                }
            };

            match script {
                Script::Complete { progress, outcome } => {
                    emit(progress);
                    outcome
                }
                Script::AwaitCancel { outcome } => {
                    cancel.cancelled().await;
                    outcome
                }
                Script::Gated {
                    gate,
                    progress,
                    outcome,
                } => {
                    gate.notified().await;
                    emit(progress);
                    outcome
                }
            }
        }
    }

    struct Harness {
        controller: Arc<UploadController<FakeFetcher, FakeTransport>>,
        fetch_calls: Arc<AtomicUsize>,
        probe: Arc<TransportProbe>,
    }

    impl Harness {
        fn new(fetch: FetchBehavior, scripts: Vec<Script>) -> Self {
            Self::with_folder(fetch, scripts, "/")
        }

        fn with_folder(fetch: FetchBehavior, scripts: Vec<Script>, folder: &str) -> Self {
            let fetch_calls = Arc::new(AtomicUsize::new(0));
            let probe = Arc::new(TransportProbe::default());
            let controller = UploadController::new(
                FakeFetcher {
                    behavior: fetch,
                    calls: Arc::clone(&fetch_calls),
                },
                FakeTransport {
                    scripts: Mutex::new(scripts.into()),
                    probe: Arc::clone(&probe),
                },
                folder,
            );
            let _ = probe.observer.set(controller.subscribe());
            Self {
                controller: Arc::new(controller),
                fetch_calls,
                probe,
            }
        }

        fn fetch_calls(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }

        fn upload_calls(&self) -> usize {
            self.probe.calls.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn submit_without_file_fails_validation_without_collaborators() {
        let harness = Harness::new(FetchBehavior::Succeed, Vec::new());

        let state = harness.controller.submit(None).await;

        assert_eq!(
            state,
            UploadUiState::Failed(FailureKind::ValidationError, "no file selected".to_string())
        );
        assert_eq!(harness.controller.state(), state);
        assert_eq!(harness.fetch_calls(), 0);
        assert_eq!(harness.upload_calls(), 0);
    }

    #[tokio::test]
    async fn successful_upload_reports_progress_then_result() {
        let harness = Harness::new(
            FetchBehavior::Succeed,
            vec![Script::Complete {
                progress: vec![(TEN_MIB / 2, TEN_MIB), (TEN_MIB, TEN_MIB)],
                outcome: Ok(sample_result("f1")),
            }],
        );

        let state = harness.controller.submit(Some(sample_file())).await;

        assert_eq!(state, UploadUiState::Succeeded(sample_result("f1")));
        assert_eq!(harness.controller.state(), state);
        assert_eq!(harness.probe.observed_progress(), vec![0, 50, 100]);
        assert_eq!(harness.fetch_calls(), 1);
        assert_eq!(harness.upload_calls(), 1);
    }

    #[tokio::test]
    async fn credential_failure_never_reaches_transport() {
        let harness = Harness::new(FetchBehavior::Fail, Vec::new());

        let state = harness.controller.submit(Some(sample_file())).await;

        assert_eq!(state.failure_kind(), Some(FailureKind::AuthFailure));
        assert_eq!(harness.fetch_calls(), 1);
        assert_eq!(harness.upload_calls(), 0);
    }

    #[tokio::test]
    async fn network_failure_is_classified_without_partial_result() {
        let harness = Harness::new(
            FetchBehavior::Succeed,
            vec![Script::Complete {
                progress: vec![(TEN_MIB / 4, TEN_MIB)],
                outcome: Err(UploadError::network("connection reset by peer")),
            }],
        );

        let state = harness.controller.submit(Some(sample_file())).await;

        assert_eq!(
            state,
            UploadUiState::Failed(
                FailureKind::NetworkFailure,
                "connection reset by peer".to_string()
            )
        );
        assert!(state.result().is_none());
    }

    #[tokio::test]
    async fn progress_never_decreases_within_an_attempt() {
        let harness = Harness::new(
            FetchBehavior::Succeed,
            vec![Script::Complete {
                progress: vec![(60, 100), (30, 100), (80, 100), (250, 100)],
                outcome: Ok(sample_result("f1")),
            }],
        );

        harness.controller.submit(Some(sample_file())).await;

        let observed = harness.probe.observed_progress();
        assert_eq!(observed, vec![0, 60, 60, 80, 100]);
        assert!(observed.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(observed.iter().all(|percent| *percent <= 100));
    }

    #[tokio::test]
    async fn progress_resets_for_each_attempt() {
        let harness = Harness::new(
            FetchBehavior::Succeed,
            vec![
                Script::Complete {
                    progress: vec![(100, 100)],
                    outcome: Ok(sample_result("f1")),
                },
                Script::Complete {
                    progress: vec![(10, 100)],
                    outcome: Ok(sample_result("f2")),
                },
            ],
        );

        harness.controller.submit(Some(sample_file())).await;
        harness.controller.submit(Some(sample_file())).await;

        assert_eq!(harness.probe.observed_progress(), vec![0, 100, 0, 10]);
        assert_eq!(harness.fetch_calls(), 2);
    }

    #[tokio::test]
    async fn cancel_in_flight_yields_aborted() {
        let harness = Harness::new(
            FetchBehavior::Succeed,
            vec![Script::AwaitCancel {
                outcome: Err(UploadError::cancelled()),
            }],
        );
        let controller = Arc::clone(&harness.controller);
        let attempt = tokio::spawn(async move { controller.submit(Some(sample_file())).await });

        harness.probe.started.notified().await;
        assert!(harness.controller.cancel());

        let state = attempt.await.unwrap();
        assert_eq!(
            state,
            UploadUiState::Failed(
                FailureKind::AbortedByUser,
                "upload aborted by user".to_string()
            )
        );
        assert!(!harness.controller.cancel());
    }

    #[tokio::test]
    async fn cancelled_attempt_never_succeeds_even_if_transport_does() {
        let harness = Harness::new(
            FetchBehavior::Succeed,
            vec![Script::AwaitCancel {
                outcome: Ok(sample_result("f1")),
            }],
        );
        let controller = Arc::clone(&harness.controller);
        let attempt = tokio::spawn(async move { controller.submit(Some(sample_file())).await });

        harness.probe.started.notified().await;
        harness.controller.cancel();

        let state = attempt.await.unwrap();
        assert_eq!(state.failure_kind(), Some(FailureKind::AbortedByUser));
        assert_eq!(harness.controller.state(), state);
    }

    #[tokio::test]
    async fn cancel_accepted_before_release_turns_success_into_abort() {
        let harness = Harness::new(FetchBehavior::Succeed, Vec::new());
        let cancel = CancellationToken::new();
        let attempt = harness.controller.begin_attempt(cancel.clone());

        // Transport has already returned when the cancel lands.
        assert!(harness.controller.cancel());
        let state = harness
            .controller
            .finish(attempt, &cancel, Ok(sample_result("f1")));

        assert_eq!(state.failure_kind(), Some(FailureKind::AbortedByUser));
        assert_eq!(harness.controller.state(), state);
        assert!(!harness.controller.cancel());
    }

    #[tokio::test]
    async fn cancel_during_credential_fetch_skips_transport() {
        let harness = Harness::new(FetchBehavior::Hang, Vec::new());
        let mut receiver = harness.controller.subscribe();
        let controller = Arc::clone(&harness.controller);
        let attempt = tokio::spawn(async move { controller.submit(Some(sample_file())).await });

        receiver
            .wait_for(UploadUiState::is_in_progress)
            .await
            .unwrap();
        assert!(harness.controller.cancel());

        let state = attempt.await.unwrap();
        assert_eq!(state.failure_kind(), Some(FailureKind::AbortedByUser));
        assert_eq!(harness.upload_calls(), 0);
    }

    #[tokio::test]
    async fn cancel_without_attempt_is_a_no_op() {
        let harness = Harness::new(FetchBehavior::Succeed, Vec::new());
        assert!(!harness.controller.cancel());
        assert_eq!(harness.controller.state(), UploadUiState::Idle);
    }

    #[tokio::test]
    async fn cancelled_token_does_not_leak_into_next_attempt() {
        let harness = Harness::new(
            FetchBehavior::Succeed,
            vec![
                Script::AwaitCancel {
                    outcome: Err(UploadError::cancelled()),
                },
                Script::Complete {
                    progress: vec![(100, 100)],
                    outcome: Ok(sample_result("f2")),
                },
            ],
        );
        let controller = Arc::clone(&harness.controller);
        let first = tokio::spawn(async move { controller.submit(Some(sample_file())).await });
        harness.probe.started.notified().await;
        harness.controller.cancel();
        first.await.unwrap();

        let second = harness.controller.submit(Some(sample_file())).await;
        assert_eq!(second, UploadUiState::Succeeded(sample_result("f2")));
    }

    #[tokio::test]
    async fn superseded_attempt_cannot_overwrite_newer_state() {
        let gate = Arc::new(Notify::new());
        let harness = Harness::new(
            FetchBehavior::Succeed,
            vec![
                Script::Gated {
                    gate: Arc::clone(&gate),
                    progress: vec![(90, 100)],
                    outcome: Ok(sample_result("stale")),
                },
                Script::Complete {
                    progress: vec![(100, 100)],
                    outcome: Ok(sample_result("fresh")),
                },
            ],
        );
        let controller = Arc::clone(&harness.controller);
        let first = tokio::spawn(async move { controller.submit(Some(sample_file())).await });
        harness.probe.started.notified().await;

        let second = harness.controller.submit(Some(sample_file())).await;
        assert_eq!(second, UploadUiState::Succeeded(sample_result("fresh")));

        gate.notify_one();
        let first = first.await.unwrap();
        assert_eq!(first.failure_kind(), Some(FailureKind::AbortedByUser));
        assert_eq!(
            harness.controller.state(),
            UploadUiState::Succeeded(sample_result("fresh"))
        );
    }

    #[tokio::test]
    async fn folder_is_normalized_and_forwarded() {
        let harness = Harness::with_folder(
            FetchBehavior::Succeed,
            vec![Script::Complete {
                progress: Vec::new(),
                outcome: Ok(sample_result("f1")),
            }],
            "avatars",
        );

        harness.controller.submit(Some(sample_file())).await;

        assert_eq!(harness.controller.folder(), "/avatars");
        assert_eq!(
            *harness.probe.folders.lock().unwrap(),
            vec!["/avatars".to_string()]
        );
    }
}
