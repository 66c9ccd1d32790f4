//! End-to-end pairing flows against in-memory collaborators: session mint,
//! approval, key import, and the recovery paths.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::timeout;

use ms_app::usecases::keysync::{KeyEnvelopeManager, KeySyncRecovery};
use ms_app::usecases::pairing::{PairingEventPort, PairingService, PairingUiEvent};
use ms_core::ids::{AccountId, DeviceId, PairingToken};
use ms_core::keysync::{KeyEnvelope, KeySyncError, SyncGroupKeypair};
use ms_core::pairing::{PairingOutcome, PairingSession, PairingStatus};
use ms_core::ports::{
    DeviceIdentityPort, DeviceKeyError, DeviceKeyPort, EnvelopeStoreError, KeyEnvelopeStorePort,
    KeypairStoreError, KeypairStorePort, PairingBackendError, PairingBackendPort, SyncCacheError,
    SyncCachePort, SystemClock,
};
use ms_core::settings::{KeySyncSettings, PairingSettings};

enum ApprovalScript {
    Outcome(PairingOutcome),
    Hang,
}

struct ScriptedBackend {
    settings: PairingSettings,
    scripts: Mutex<VecDeque<ApprovalScript>>,
    minted_tokens: Mutex<Vec<PairingToken>>,
    history_resyncs: AtomicUsize,
}

impl ScriptedBackend {
    fn new(settings: PairingSettings, scripts: Vec<ApprovalScript>) -> Arc<Self> {
        Arc::new(Self {
            settings,
            scripts: Mutex::new(scripts.into()),
            minted_tokens: Mutex::new(Vec::new()),
            history_resyncs: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PairingBackendPort for ScriptedBackend {
    async fn create_session(&self) -> Result<PairingSession, PairingBackendError> {
        let session = PairingSession::issue(&self.settings, Utc::now())?;
        self.minted_tokens.lock().unwrap().push(session.token.clone());
        Ok(session)
    }

    async fn wait_for_approval(
        &self,
        _token: &PairingToken,
        _timeout: Duration,
    ) -> Result<PairingOutcome, PairingBackendError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ApprovalScript::Hang);
        match script {
            ApprovalScript::Outcome(outcome) => Ok(outcome),
            ApprovalScript::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(PairingBackendError::Timeout)
            }
        }
    }

    async fn request_history_resync(
        &self,
        _account_id: &AccountId,
    ) -> Result<(), PairingBackendError> {
        self.history_resyncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Envelope mailbox holding at most one envelope, like the real store does
/// for a single (account, device) slot.
struct InMemoryEnvelopeStore {
    envelope: Mutex<Option<KeyEnvelope>>,
}

impl InMemoryEnvelopeStore {
    fn holding(envelope: Option<KeyEnvelope>) -> Arc<Self> {
        Arc::new(Self {
            envelope: Mutex::new(envelope),
        })
    }

    fn publish(&self, envelope: KeyEnvelope) {
        *self.envelope.lock().unwrap() = Some(envelope);
    }
}

#[async_trait]
impl KeyEnvelopeStorePort for InMemoryEnvelopeStore {
    async fn get(
        &self,
        _account_id: &AccountId,
        _device_id: &DeviceId,
    ) -> Result<Option<KeyEnvelope>, EnvelopeStoreError> {
        Ok(self.envelope.lock().unwrap().clone())
    }

    async fn delete(
        &self,
        _account_id: &AccountId,
        _device_id: &DeviceId,
    ) -> Result<(), EnvelopeStoreError> {
        *self.envelope.lock().unwrap() = None;
        Ok(())
    }
}

struct XorDeviceKeys;

const DEVICE_KEY_MASK: u8 = 0x5a;

#[async_trait]
impl DeviceKeyPort for XorDeviceKeys {
    async fn decrypt_with_device_key(&self, ciphertext: &[u8]) -> Result<Vec<u8>, DeviceKeyError> {
        Ok(ciphertext.iter().map(|b| b ^ DEVICE_KEY_MASK).collect())
    }
}

fn sealed(plaintext: &[u8]) -> Vec<u8> {
    plaintext.iter().map(|b| b ^ DEVICE_KEY_MASK).collect()
}

struct InMemoryKeypairStore {
    installed: Mutex<Option<SyncGroupKeypair>>,
}

impl InMemoryKeypairStore {
    fn empty() -> Arc<Self> {
        Arc::new(Self {
            installed: Mutex::new(None),
        })
    }
}

#[async_trait]
impl KeypairStorePort for InMemoryKeypairStore {
    async fn install(
        &self,
        _account_id: &AccountId,
        keypair: SyncGroupKeypair,
    ) -> Result<(), KeypairStoreError> {
        *self.installed.lock().unwrap() = Some(keypair);
        Ok(())
    }

    async fn installed(
        &self,
        _account_id: &AccountId,
    ) -> Result<Option<SyncGroupKeypair>, KeypairStoreError> {
        Ok(self.installed.lock().unwrap().clone())
    }

    async fn clear(&self, _account_id: &AccountId) -> Result<(), KeypairStoreError> {
        *self.installed.lock().unwrap() = None;
        Ok(())
    }
}

/// Cache fake that records which accounts have been flushed, so tests can
/// compare observable cache state and not just call counts.
struct InMemorySyncCache {
    invalidations: AtomicUsize,
    flushed: Mutex<HashSet<AccountId>>,
}

impl InMemorySyncCache {
    fn fresh() -> Arc<Self> {
        Arc::new(Self {
            invalidations: AtomicUsize::new(0),
            flushed: Mutex::new(HashSet::new()),
        })
    }

    fn flushed_accounts(&self) -> HashSet<AccountId> {
        self.flushed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncCachePort for InMemorySyncCache {
    async fn invalidate(&self, account_id: &AccountId) -> Result<(), SyncCacheError> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.flushed.lock().unwrap().insert(account_id.clone());
        Ok(())
    }
}

struct FixedIdentity(DeviceId);

impl DeviceIdentityPort for FixedIdentity {
    fn current_device_id(&self) -> DeviceId {
        self.0.clone()
    }
}

struct Fixture {
    backend: Arc<ScriptedBackend>,
    envelopes: Arc<InMemoryEnvelopeStore>,
    keypairs: Arc<InMemoryKeypairStore>,
    cache: Arc<InMemorySyncCache>,
    manager: KeyEnvelopeManager,
    service: PairingService,
}

fn short_settings() -> PairingSettings {
    PairingSettings {
        session_ttl: Duration::from_millis(100),
        approval_timeout: Duration::from_millis(100),
        protocol_version: 2,
    }
}

fn fixture(scripts: Vec<ApprovalScript>, envelope: Option<KeyEnvelope>) -> Fixture {
    let backend = ScriptedBackend::new(short_settings(), scripts);
    let envelopes = InMemoryEnvelopeStore::holding(envelope);
    let keypairs = InMemoryKeypairStore::empty();
    let cache = InMemorySyncCache::fresh();
    let manager = KeyEnvelopeManager::new(
        Arc::clone(&envelopes) as Arc<dyn KeyEnvelopeStorePort>,
        Arc::new(XorDeviceKeys),
        Arc::clone(&keypairs) as Arc<dyn KeypairStorePort>,
        Arc::clone(&cache) as Arc<dyn SyncCachePort>,
        Arc::new(FixedIdentity(DeviceId::new())),
        KeySyncSettings {
            max_attempts: 5,
            retry_delay: Duration::from_millis(10),
        },
    );
    let service = PairingService::new(
        Arc::clone(&backend) as Arc<dyn PairingBackendPort>,
        manager.clone(),
        Arc::new(SystemClock),
        short_settings(),
    );
    Fixture {
        backend,
        envelopes,
        keypairs,
        cache,
        manager,
        service,
    }
}

fn ready_envelope(private: &[u8], public: &[u8]) -> KeyEnvelope {
    KeyEnvelope::ready(sealed(private), public.to_vec())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn next_event(rx: &mut mpsc::Receiver<PairingUiEvent>) -> PairingUiEvent {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for pairing event")
        .expect("event channel closed")
}

#[tokio::test]
async fn full_pairing_flow_installs_the_shared_keypair() {
    init_tracing();
    let account = AccountId::new();
    let fx = fixture(
        vec![ApprovalScript::Outcome(PairingOutcome::Approved {
            remote_account_id: account.clone(),
            remote_device_id: Some(DeviceId::new()),
        })],
        Some(ready_envelope(b"group-private", b"group-public")),
    );
    let mut rx = fx.service.subscribe().await.unwrap();

    fx.service.start().await;

    assert_eq!(
        next_event(&mut rx).await,
        PairingUiEvent::StatusChanged(PairingStatus::Generating)
    );
    let session = match next_event(&mut rx).await {
        PairingUiEvent::StatusChanged(PairingStatus::WaitingForScan { session }) => session,
        other => panic!("expected waiting status, got {:?}", other),
    };
    assert!(session.qr_payload.encode().starts_with("msync:v2:"));

    assert_eq!(
        next_event(&mut rx).await,
        PairingUiEvent::StatusChanged(PairingStatus::Success)
    );
    assert_eq!(
        next_event(&mut rx).await,
        PairingUiEvent::KeysImported {
            account_id: account.clone()
        }
    );

    let installed = fx.keypairs.installed.lock().unwrap().clone().unwrap();
    assert_eq!(installed.private_key(), b"group-private");
    assert_eq!(installed.public_key(), b"group-public");
    assert_eq!(fx.cache.invalidations.load(Ordering::SeqCst), 1);
    // Envelope consumed.
    assert!(fx.envelopes.envelope.lock().unwrap().is_none());
}

#[tokio::test]
async fn envelope_published_during_the_settle_window_still_imports() {
    init_tracing();
    let account = AccountId::new();
    let fx = fixture(
        vec![ApprovalScript::Outcome(PairingOutcome::Approved {
            remote_account_id: account.clone(),
            remote_device_id: None,
        })],
        None,
    );
    let mut rx = fx.service.subscribe().await.unwrap();

    fx.service.start().await;

    // Publish while the import loop is already polling.
    let envelopes = Arc::clone(&fx.envelopes);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(15)).await;
        envelopes.publish(ready_envelope(b"late-private", b"late-public"));
    });

    loop {
        match next_event(&mut rx).await {
            PairingUiEvent::KeysImported { account_id } => {
                assert_eq!(account_id, account);
                break;
            }
            PairingUiEvent::KeyImportFailed { message, .. } => {
                panic!("import failed: {}", message)
            }
            PairingUiEvent::StatusChanged(_) => {}
        }
    }
    assert!(fx.keypairs.installed.lock().unwrap().is_some());
}

#[tokio::test]
async fn expired_attempt_leaves_no_key_material() {
    init_tracing();
    let fx = fixture(
        vec![ApprovalScript::Hang],
        Some(ready_envelope(b"p", b"q")),
    );
    let mut rx = fx.service.subscribe().await.unwrap();

    fx.service.start().await;

    next_event(&mut rx).await; // Generating
    next_event(&mut rx).await; // WaitingForScan
    assert_eq!(
        next_event(&mut rx).await,
        PairingUiEvent::StatusChanged(PairingStatus::Expired)
    );
    assert!(fx.keypairs.installed.lock().unwrap().is_none());
    assert_eq!(fx.cache.invalidations.load(Ordering::SeqCst), 0);
    assert_eq!(fx.service.status().await, PairingStatus::Expired);
}

#[tokio::test]
async fn retry_after_expiry_succeeds_with_a_new_token() {
    let account = AccountId::new();
    let fx = fixture(
        vec![
            ApprovalScript::Hang,
            ApprovalScript::Outcome(PairingOutcome::Approved {
                remote_account_id: account.clone(),
                remote_device_id: None,
            }),
        ],
        Some(ready_envelope(b"retry-private", b"retry-public")),
    );
    let mut rx = fx.service.subscribe().await.unwrap();

    fx.service.start().await;
    next_event(&mut rx).await;
    let first_session = match next_event(&mut rx).await {
        PairingUiEvent::StatusChanged(PairingStatus::WaitingForScan { session }) => session,
        other => panic!("expected waiting status, got {:?}", other),
    };
    assert_eq!(
        next_event(&mut rx).await,
        PairingUiEvent::StatusChanged(PairingStatus::Expired)
    );

    fx.service.retry().await;
    next_event(&mut rx).await; // Generating
    let second_session = match next_event(&mut rx).await {
        PairingUiEvent::StatusChanged(PairingStatus::WaitingForScan { session }) => session,
        other => panic!("expected waiting status, got {:?}", other),
    };
    assert_ne!(first_session.token, second_session.token);

    assert_eq!(
        next_event(&mut rx).await,
        PairingUiEvent::StatusChanged(PairingStatus::Success)
    );
    assert_eq!(
        next_event(&mut rx).await,
        PairingUiEvent::KeysImported {
            account_id: account
        }
    );
    assert_eq!(fx.backend.minted_tokens.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn resync_fetches_a_fresh_envelope_for_a_paired_account() {
    let account = AccountId::new();
    let fx = fixture(vec![], Some(ready_envelope(b"new-private", b"new-public")));
    let recovery = KeySyncRecovery::new(
        fx.manager.clone(),
        Arc::clone(&fx.backend) as Arc<dyn PairingBackendPort>,
    );

    recovery.resync(&account).await.unwrap();

    let installed = fx.keypairs.installed.lock().unwrap().clone().unwrap();
    assert_eq!(installed.private_key(), b"new-private");
    assert_eq!(fx.cache.invalidations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_invalidation_for_one_account_is_idempotent() {
    let account = AccountId::new();
    let fx = fixture(vec![], Some(ready_envelope(b"first-private", b"first-public")));
    let recovery = KeySyncRecovery::new(
        fx.manager.clone(),
        Arc::clone(&fx.backend) as Arc<dyn PairingBackendPort>,
    );

    recovery.resync(&account).await.unwrap();
    let after_once = fx.cache.flushed_accounts();
    assert!(after_once.contains(&account));

    // A second key rotation flushes the same account again; the observable
    // cache state must match the single-flush state.
    fx.envelopes
        .publish(ready_envelope(b"second-private", b"second-public"));
    recovery.resync(&account).await.unwrap();

    assert_eq!(fx.cache.invalidations.load(Ordering::SeqCst), 2);
    assert_eq!(fx.cache.flushed_accounts(), after_once);
}

#[tokio::test]
async fn resync_without_a_published_envelope_reports_not_ready() {
    let account = AccountId::new();
    let fx = fixture(vec![], None);
    let recovery = KeySyncRecovery::new(
        fx.manager.clone(),
        Arc::clone(&fx.backend) as Arc<dyn PairingBackendPort>,
    );

    let err = recovery.resync(&account).await.unwrap_err();
    assert_eq!(err, KeySyncError::EnvelopeNotReady { attempts: 5 });
    assert!(fx.keypairs.installed.lock().unwrap().is_none());
}

#[tokio::test]
async fn history_resync_reaches_the_backend() {
    let account = AccountId::new();
    let fx = fixture(vec![], None);
    let recovery = KeySyncRecovery::new(
        fx.manager.clone(),
        Arc::clone(&fx.backend) as Arc<dyn PairingBackendPort>,
    );

    recovery.request_history_resync(&account).await.unwrap();
    recovery.request_history_resync(&account).await.unwrap();

    assert_eq!(fx.backend.history_resyncs.load(Ordering::SeqCst), 2);
}
