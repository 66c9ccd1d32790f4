//! Pairing attempt orchestration.
//!
//! ```text
//! UI action (start/retry/cancel)
//!   -> PairingService (one attempt at a time)
//!     -> PairingBackendPort (session mint, approval long-poll)
//!     -> PairingLifecycle (pure transitions)
//!     -> KeyEnvelopeManager (on approval)
//!   -> PairingUiEvent stream back to the UI
//! ```
//!
//! One attempt is one spawned task. Starting or retrying aborts whatever is
//! in flight and bumps a generation counter; events from a superseded
//! attempt are dropped at the emit gate, so a cancelled attempt can never
//! touch UI state after the fact.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::AbortHandle;
use tracing::{info_span, Instrument};

use ms_core::pairing::{
    Decision, LifecycleEvent, PairingLifecycle, PairingOutcome, PairingStatus,
};
use ms_core::ports::{ClockPort, PairingBackendError, PairingBackendPort};
use ms_core::settings::PairingSettings;

use crate::usecases::keysync::KeyEnvelopeManager;

use super::events::{PairingEventPort, PairingUiEvent};

const EVENT_CHANNEL_CAPACITY: usize = 32;

struct ServiceInner {
    generation: u64,
    status: PairingStatus,
    attempt: Option<AbortHandle>,
}

/// Facade over the whole pairing flow for one local device.
#[derive(Clone)]
pub struct PairingService {
    backend: Arc<dyn PairingBackendPort>,
    importer: KeyEnvelopeManager,
    clock: Arc<dyn ClockPort>,
    settings: PairingSettings,
    inner: Arc<Mutex<ServiceInner>>,
    event_senders: Arc<Mutex<Vec<mpsc::Sender<PairingUiEvent>>>>,
}

impl PairingService {
    pub fn new(
        backend: Arc<dyn PairingBackendPort>,
        importer: KeyEnvelopeManager,
        clock: Arc<dyn ClockPort>,
        settings: PairingSettings,
    ) -> Self {
        Self {
            backend,
            importer,
            clock,
            settings,
            inner: Arc::new(Mutex::new(ServiceInner {
                generation: 0,
                status: PairingStatus::Generating,
                attempt: None,
            })),
            event_senders: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Begin a fresh pairing attempt, cancelling any attempt in flight.
    pub async fn start(&self) {
        let generation = {
            let mut inner = self.inner.lock().await;
            if let Some(handle) = inner.attempt.take() {
                handle.abort();
            }
            inner.generation += 1;
            inner.status = PairingStatus::Generating;
            inner.generation
        };

        self.emit(
            generation,
            PairingUiEvent::StatusChanged(PairingStatus::Generating),
        )
        .await;

        let service = self.clone();
        let span = info_span!("pairing.attempt", generation);
        let handle = tokio::spawn(
            async move { service.run_attempt(generation).await }.instrument(span),
        );

        let mut inner = self.inner.lock().await;
        // Only track the task if it is still the current attempt.
        if inner.generation == generation {
            inner.attempt = Some(handle.abort_handle());
        } else {
            handle.abort();
        }
    }

    /// Start over with a new session and token. The superseded token is
    /// never reused.
    pub async fn retry(&self) {
        self.start().await;
    }

    /// Abort the attempt in flight, if any.
    pub async fn cancel(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(handle) = inner.attempt.take() {
            handle.abort();
        }
        // Invalidate the generation so an already-scheduled emit is dropped.
        inner.generation += 1;
    }

    pub async fn status(&self) -> PairingStatus {
        self.inner.lock().await.status.clone()
    }

    async fn run_attempt(&self, generation: u64) {
        let mut lifecycle = PairingLifecycle::new();

        let session = match self.backend.create_session().await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "pairing session creation failed");
                let decision = lifecycle.apply(LifecycleEvent::TransportFailed {
                    message: err.to_string(),
                });
                self.handle_decision(generation, &mut lifecycle, decision)
                    .await;
                return;
            }
        };

        let decision = lifecycle.apply(LifecycleEvent::SessionReady {
            session: session.clone(),
        });
        if !self
            .handle_decision(generation, &mut lifecycle, decision)
            .await
        {
            return;
        }

        let remaining = session
            .remaining(self.clock.now())
            .to_std()
            .unwrap_or_default();

        // The local deadline races the approval long-poll; whichever fires
        // first decides the event. The backend enforces its own expiry too,
        // but the local timer guarantees the UI moves even if the backend
        // never answers.
        let event = tokio::select! {
            _ = tokio::time::sleep(remaining) => LifecycleEvent::DeadlineElapsed,
            result = self
                .backend
                .wait_for_approval(&session.token, self.settings.approval_timeout) =>
            {
                match result {
                    Ok(outcome) => LifecycleEvent::OutcomeArrived { outcome },
                    Err(PairingBackendError::Timeout) => LifecycleEvent::OutcomeArrived {
                        outcome: PairingOutcome::Expired,
                    },
                    Err(err) => LifecycleEvent::TransportFailed {
                        message: err.to_string(),
                    },
                }
            }
        };

        let decision = lifecycle.apply(event);
        self.handle_decision(generation, &mut lifecycle, decision)
            .await;
    }

    /// Execute one lifecycle decision. Returns false when the attempt has
    /// been superseded and should stop.
    async fn handle_decision(
        &self,
        generation: u64,
        lifecycle: &mut PairingLifecycle,
        decision: Decision,
    ) -> bool {
        match decision {
            Decision::Ignore => true,
            Decision::PresentPayload { session } => {
                self.emit(
                    generation,
                    PairingUiEvent::StatusChanged(PairingStatus::WaitingForScan { session }),
                )
                .await
            }
            Decision::BeginKeyImport {
                remote_account_id, ..
            } => {
                if !self
                    .emit(
                        generation,
                        PairingUiEvent::StatusChanged(PairingStatus::Success),
                    )
                    .await
                {
                    return false;
                }
                match self.importer.fetch_and_import(&remote_account_id).await {
                    Ok(()) => {
                        self.emit(
                            generation,
                            PairingUiEvent::KeysImported {
                                account_id: remote_account_id,
                            },
                        )
                        .await
                    }
                    Err(err) => {
                        let status = lifecycle.fail_import(err.to_string());
                        self.emit(
                            generation,
                            PairingUiEvent::KeyImportFailed {
                                message: err.to_string(),
                                recoverable: err.is_recoverable(),
                            },
                        )
                        .await;
                        self.emit(generation, PairingUiEvent::StatusChanged(status))
                            .await
                    }
                }
            }
            Decision::NotifyRejected => {
                self.emit(
                    generation,
                    PairingUiEvent::StatusChanged(PairingStatus::Rejected),
                )
                .await
            }
            Decision::NotifyExpired => {
                self.emit(
                    generation,
                    PairingUiEvent::StatusChanged(PairingStatus::Expired),
                )
                .await
            }
            Decision::NotifyError { message } => {
                self.emit(
                    generation,
                    PairingUiEvent::StatusChanged(PairingStatus::Error { message }),
                )
                .await
            }
            // The service starts new sessions itself; the machine never has
            // to ask for one mid-attempt.
            Decision::StartNewSession => true,
        }
    }

    /// Emit an event if `generation` is still current. Stale emits are
    /// dropped and reported as such.
    async fn emit(&self, generation: u64, event: PairingUiEvent) -> bool {
        {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                tracing::debug!(generation, "dropping event from superseded attempt");
                return false;
            }
            if let PairingUiEvent::StatusChanged(status) = &event {
                inner.status = status.clone();
            }
        }

        let mut senders = self.event_senders.lock().await;
        senders.retain(|tx| !tx.is_closed());
        for tx in senders.iter() {
            if tx.send(event.clone()).await.is_err() {
                tracing::debug!("pairing event receiver dropped mid-send");
            }
        }
        true
    }
}

#[async_trait]
impl PairingEventPort for PairingService {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<PairingUiEvent>> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.event_senders.lock().await.push(tx);
        Ok(rx)
    }
}
