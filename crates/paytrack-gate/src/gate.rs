//! The PIN lock screen state machine
//!
//! One [`PinGate`] guards one visit to the lock view. It decides between
//! first-run setup and login, collects digits, verifies them after a short
//! delay, counts failures and locks input for a while after too many. A
//! successful unlock writes the session flag and replaces the view with the
//! dashboard; the gate accepts no further input after that.
//!
//! The gate is driven entirely from outside: input methods, timer events via
//! [`PinGate::on_timer`] and biometric results via
//! [`PinGate::complete_biometric`]. All of them are synchronous.

use std::sync::Arc;
use std::time::Duration;

use paytrack_core::{
    secret, settings, AppConfig, Localizer, Navigator, SessionFlag, Stores, View,
};
use zeroize::Zeroizing;

use crate::biometric::{
    AssertionPolicy, BiometricAuthenticator, BiometricError, BiometricRequest, Challenge,
    DEFAULT_ASSERTION_TIMEOUT,
};
use crate::buffer::{Digit, EntryBuffer};
use crate::feedback::{Feedback, Notice};
use crate::lockout::{LockoutPolicy, LockoutState};
use crate::scheduler::{Scheduler, TimerEvent, TimerId, TimerKind};

/// Delay between the fourth digit and verification
pub const DEFAULT_VERIFY_DELAY: Duration = Duration::from_millis(150);

/// Countdown tick interval
const LOCKOUT_TICK: Duration = Duration::from_secs(1);

/// Gate errors
///
/// Only biometric requests report errors; everything else is a silent no-op
/// when the gate is not accepting input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Biometric unlock is not enabled")]
    BiometricUnavailable,

    #[error("Locked out for {0} more seconds")]
    LockedOut(u64),

    #[error("A biometric request is already in progress")]
    Busy,

    #[error("Access already granted")]
    AlreadyGranted,
}

/// Gate timing and limits
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateConfig {
    pub lockout: LockoutPolicy,
    pub verify_delay: Duration,
    pub biometric_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            lockout: LockoutPolicy::default(),
            verify_delay: DEFAULT_VERIFY_DELAY,
            biometric_timeout: DEFAULT_ASSERTION_TIMEOUT,
        }
    }
}

impl From<&AppConfig> for GateConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            lockout: LockoutPolicy::from_config(config),
            verify_delay: config.verify_delay(),
            biometric_timeout: config.biometric_timeout(),
        }
    }
}

/// Host collaborators
#[derive(Clone)]
pub struct GateServices {
    pub navigator: Arc<dyn Navigator>,
    pub feedback: Arc<dyn Feedback>,
    pub localizer: Arc<dyn Localizer>,
}

/// Which PIN the gate is collecting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateMode {
    /// First run, choosing a PIN
    Create,
    /// First run, repeating the chosen PIN
    Confirm,
    /// A PIN is stored
    Login,
}

enum Mode {
    Create,
    Confirm { candidate: Zeroizing<String> },
    Login,
}

impl Mode {
    fn kind(&self) -> GateMode {
        match self {
            Mode::Create => GateMode::Create,
            Mode::Confirm { .. } => GateMode::Confirm,
            Mode::Login => GateMode::Login,
        }
    }
}

/// Keyboard input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
}

/// What the lock view should render
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateSnapshot {
    pub mode: GateMode,
    /// Number of filled dots
    pub filled: usize,
    pub failed_attempts: u32,
    pub max_attempts: u32,
    pub lockout_remaining: Option<u64>,
    pub verifying: bool,
    pub biometric_available: bool,
    pub granted: bool,
}

/// PIN lock screen
pub struct PinGate {
    stores: Stores,
    session: SessionFlag,
    config: GateConfig,
    scheduler: Arc<dyn Scheduler>,
    services: GateServices,

    mode: Mode,
    buffer: EntryBuffer,
    failed_attempts: u32,
    lockout: LockoutState,
    pending_verify: Option<TimerId>,
    lockout_timer: Option<TimerId>,
    biometric_enabled: bool,
    biometric_in_flight: bool,
    granted: bool,
    next_timer: u64,
}

impl PinGate {
    pub fn new(
        stores: Stores,
        config: GateConfig,
        scheduler: Arc<dyn Scheduler>,
        services: GateServices,
    ) -> Self {
        let session = SessionFlag::new(stores.session.clone());
        Self {
            stores,
            session,
            config,
            scheduler,
            services,
            mode: Mode::Login,
            buffer: EntryBuffer::new(),
            failed_attempts: 0,
            lockout: LockoutState::Inactive,
            pending_verify: None,
            lockout_timer: None,
            biometric_enabled: false,
            biometric_in_flight: false,
            granted: false,
            next_timer: 0,
        }
    }

    /// Prepare the lock view
    ///
    /// Goes straight to the dashboard when the session is already unlocked.
    pub fn initialize(&mut self) {
        self.services.localizer.translate_page();

        match self.session.is_active() {
            Ok(true) => {
                tracing::debug!("Session already active, skipping lock screen");
                self.granted = true;
                self.services.navigator.replace_view(View::Dashboard);
                return;
            }
            Ok(false) => {}
            Err(e) => tracing::warn!("Could not read session flag: {}", e),
        }

        let local = self.stores.local.as_ref();
        let has_secret = secret::has_secret(local).unwrap_or_else(|e| {
            tracing::warn!("Could not read stored PIN, assuming one exists: {}", e);
            true
        });

        if has_secret {
            self.mode = Mode::Login;
            self.biometric_enabled = settings::biometric_enabled(local).unwrap_or_else(|e| {
                tracing::warn!("Could not read biometric flag: {}", e);
                false
            });
            if self.biometric_enabled {
                self.services.feedback.notify(&Notice::BiometricAvailable);
            }
        } else {
            self.mode = Mode::Create;
            self.services.feedback.notify(&Notice::CreatePrompt);
        }
        tracing::debug!("Lock screen ready in {:?} mode", self.mode.kind());
    }

    fn accepts_input(&self) -> bool {
        !self.granted && !self.lockout.is_active()
    }

    /// Type one digit
    ///
    /// Returns `false` if the digit was ignored.
    pub fn submit_digit(&mut self, digit: Digit) -> bool {
        if !self.accepts_input() || self.pending_verify.is_some() {
            return false;
        }
        if !self.buffer.push(digit) {
            return false;
        }
        self.services.feedback.clear();

        if self.buffer.is_full() {
            let id = self.schedule(self.config.verify_delay, TimerKind::Verify);
            self.pending_verify = Some(id);
        }
        true
    }

    /// Remove the last digit
    ///
    /// Also cancels a verification scheduled for the now-shorter entry.
    pub fn submit_delete(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }
        if let Some(id) = self.pending_verify.take() {
            self.scheduler.cancel(id);
            tracing::debug!("Pending verification cancelled");
        }
        self.services.feedback.clear();
        self.buffer.pop()
    }

    /// Verify a full entry now instead of after the delay
    pub fn submit_enter(&mut self) -> bool {
        if !self.accepts_input() || !self.buffer.is_full() {
            return false;
        }
        if let Some(id) = self.pending_verify.take() {
            self.scheduler.cancel(id);
        }
        self.verify();
        true
    }

    /// Map a key press to an input operation
    pub fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::Char(c) => match Digit::from_char(c) {
                Some(digit) => self.submit_digit(digit),
                None => false,
            },
            Key::Backspace => self.submit_delete(),
            Key::Enter => self.submit_enter(),
        }
    }

    /// Deliver a timer event scheduled by this gate
    ///
    /// Events for cancelled or superseded timers are ignored.
    pub fn on_timer(&mut self, event: TimerEvent) {
        match event.kind {
            TimerKind::Verify if self.pending_verify == Some(event.id) => {
                self.pending_verify = None;
                self.verify();
            }
            TimerKind::LockoutTick if self.lockout_timer == Some(event.id) => {
                self.lockout_timer = None;
                self.tick_lockout();
            }
            _ => tracing::trace!("Ignoring stale timer {:?}", event),
        }
    }

    fn schedule(&mut self, after: Duration, kind: TimerKind) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.scheduler.schedule(after, TimerEvent { id, kind });
        id
    }

    fn cancel_timers(&mut self) {
        if let Some(id) = self.pending_verify.take() {
            self.scheduler.cancel(id);
        }
        if let Some(id) = self.lockout_timer.take() {
            self.scheduler.cancel(id);
        }
    }

    fn verify(&mut self) {
        if self.granted || !self.buffer.is_full() {
            return;
        }
        let entered = self.buffer.take();

        match std::mem::replace(&mut self.mode, Mode::Login) {
            Mode::Login => self.verify_login(&entered),
            Mode::Create => {
                tracing::debug!("PIN chosen, waiting for confirmation");
                self.mode = Mode::Confirm { candidate: entered };
                self.services.feedback.notify(&Notice::ConfirmPrompt);
            }
            Mode::Confirm { candidate } => self.verify_confirm(&entered, candidate),
        }
    }

    fn verify_login(&mut self, entered: &str) {
        let matched = match secret::load_secret(self.stores.local.as_ref()) {
            Ok(Some(stored)) => secret::pins_match(entered, &stored),
            Ok(None) => {
                tracing::warn!("No PIN stored while in login mode");
                false
            }
            Err(e) => {
                tracing::warn!("Could not read stored PIN: {}", e);
                false
            }
        };

        if matched {
            self.failed_attempts = 0;
            self.services.feedback.notify(&Notice::Unlocked);
            self.grant();
        } else {
            self.register_failure();
        }
    }

    fn verify_confirm(&mut self, entered: &str, candidate: Zeroizing<String>) {
        if !secret::pins_match(entered, &candidate) {
            tracing::debug!("Confirmation did not match, restarting setup");
            self.mode = Mode::Create;
            self.services.feedback.notify(&Notice::PinMismatch);
            return;
        }

        match secret::store_secret(self.stores.local.as_ref(), &candidate) {
            Ok(()) => {
                tracing::info!("PIN created");
                self.services.feedback.notify(&Notice::PinCreated);
                self.grant();
            }
            Err(e) => {
                tracing::warn!("Could not store new PIN: {}", e);
                self.mode = Mode::Create;
                self.services.feedback.notify(&Notice::SaveFailed);
            }
        }
    }

    fn register_failure(&mut self) {
        self.failed_attempts += 1;
        let policy = &self.config.lockout;
        tracing::debug!("Incorrect PIN, {}", policy.describe(self.failed_attempts));

        if policy.is_locked(self.failed_attempts) {
            self.start_lockout();
        } else {
            let notice = Notice::IncorrectPin {
                attempt: self.failed_attempts,
                max: policy.max_attempts,
            };
            self.services.feedback.notify(&notice);
        }
    }

    fn start_lockout(&mut self) {
        self.buffer.clear();
        self.lockout = LockoutState::engage(&self.config.lockout);
        let seconds = self.config.lockout.countdown_secs();
        tracing::info!(
            "Locked out for {}s after {} failed attempts",
            seconds,
            self.failed_attempts
        );

        self.services
            .feedback
            .notify(&Notice::LockoutStarted { seconds });
        self.lockout_timer = Some(self.schedule(LOCKOUT_TICK, TimerKind::LockoutTick));
    }

    fn tick_lockout(&mut self) {
        match self.lockout.tick() {
            Some(0) => self.end_lockout(),
            Some(remaining) => {
                self.services
                    .feedback
                    .notify(&Notice::LockoutTick { remaining });
                self.lockout_timer = Some(self.schedule(LOCKOUT_TICK, TimerKind::LockoutTick));
            }
            None => {}
        }
    }

    fn end_lockout(&mut self) {
        self.lockout = LockoutState::Inactive;
        self.failed_attempts = 0;
        self.buffer.clear();
        tracing::info!("Lockout ended");
        self.services.feedback.notify(&Notice::LockoutEnded);
    }

    fn grant(&mut self) {
        self.cancel_timers();
        self.lockout = LockoutState::Inactive;
        self.buffer.clear();
        self.mode = Mode::Login;

        match self.session.grant() {
            Ok(()) => {
                self.granted = true;
                tracing::info!("Access granted");
                self.services.navigator.replace_view(View::Dashboard);
            }
            Err(e) => {
                tracing::warn!("Could not write session flag: {}", e);
                self.services.feedback.notify(&Notice::SaveFailed);
            }
        }
    }

    /// Start a biometric unlock
    ///
    /// The returned request must be run against the platform and its result
    /// passed to [`PinGate::complete_biometric`].
    pub fn begin_biometric(&mut self) -> Result<BiometricRequest, GateError> {
        if self.granted {
            return Err(GateError::AlreadyGranted);
        }
        if !self.biometric_enabled || !matches!(self.mode, Mode::Login) {
            return Err(GateError::BiometricUnavailable);
        }
        if let Some(remaining) = self.lockout.remaining() {
            return Err(GateError::LockedOut(remaining));
        }
        if self.biometric_in_flight {
            return Err(GateError::Busy);
        }

        let challenge = Challenge::generate();
        tracing::debug!(
            "Requesting biometric assertion, challenge {}",
            challenge.fingerprint()
        );
        self.biometric_in_flight = true;
        Ok(BiometricRequest {
            challenge,
            policy: AssertionPolicy::with_timeout(self.config.biometric_timeout),
        })
    }

    /// Apply the outcome of a request from [`PinGate::begin_biometric`]
    pub fn complete_biometric(&mut self, result: Result<(), BiometricError>) {
        if !self.biometric_in_flight {
            tracing::trace!("Ignoring biometric result with no request outstanding");
            return;
        }
        self.biometric_in_flight = false;
        if self.granted {
            return;
        }

        match result {
            Ok(()) => {
                self.failed_attempts = 0;
                self.services.feedback.notify(&Notice::Unlocked);
                self.grant();
            }
            Err(BiometricError::Canceled) => {
                tracing::debug!("Biometric prompt dismissed");
            }
            Err(BiometricError::Failed(reason)) => {
                tracing::warn!("Biometric unlock failed: {}", reason);
                self.services
                    .feedback
                    .notify(&Notice::BiometricFailed { reason });
            }
        }
    }

    /// Run a biometric unlock to completion against `authenticator`
    pub async fn unlock_with_biometric(
        &mut self,
        authenticator: &dyn BiometricAuthenticator,
    ) -> Result<(), GateError> {
        let request = self.begin_biometric()?;
        let result = authenticator
            .request_assertion(&request.challenge, &request.policy)
            .await;
        self.complete_biometric(result);
        Ok(())
    }

    pub fn mode(&self) -> GateMode {
        self.mode.kind()
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }

    pub fn is_locked_out(&self) -> bool {
        self.lockout.is_active()
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            mode: self.mode.kind(),
            filled: self.buffer.len(),
            failed_attempts: self.failed_attempts,
            max_attempts: self.config.lockout.max_attempts,
            lockout_remaining: self.lockout.remaining(),
            verifying: self.pending_verify.is_some(),
            biometric_available: self.biometric_enabled
                && matches!(self.mode, Mode::Login)
                && !self.granted,
            granted: self.granted,
        }
    }
}

impl Drop for PinGate {
    fn drop(&mut self) {
        self.cancel_timers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Severity;
    use crate::scheduler::ManualScheduler;
    use crate::testing::{NoopLocalizer, RecordingFeedback, RecordingNavigator};
    use paytrack_core::{keys, KeyValueStore, MemoryStore, StoreError};

    struct Rig {
        gate: PinGate,
        scheduler: Arc<ManualScheduler>,
        feedback: Arc<RecordingFeedback>,
        navigator: Arc<RecordingNavigator>,
        stores: Stores,
    }

    impl Rig {
        fn new(stored: Option<&str>) -> Self {
            let stores = Stores::in_memory();
            if let Some(pin) = stored {
                secret::store_secret(stores.local.as_ref(), pin).unwrap();
            }
            Self::with_stores(stores)
        }

        fn with_stores(stores: Stores) -> Self {
            let scheduler = Arc::new(ManualScheduler::new());
            let feedback = Arc::new(RecordingFeedback::default());
            let navigator = Arc::new(RecordingNavigator::default());
            let services = GateServices {
                navigator: navigator.clone(),
                feedback: feedback.clone(),
                localizer: Arc::new(NoopLocalizer::default()),
            };
            let mut gate = PinGate::new(
                stores.clone(),
                GateConfig::default(),
                scheduler.clone(),
                services,
            );
            gate.initialize();
            Self {
                gate,
                scheduler,
                feedback,
                navigator,
                stores,
            }
        }

        fn advance(&mut self, by: Duration) {
            let gate = &mut self.gate;
            self.scheduler.advance(by, |event| gate.on_timer(event));
        }

        fn type_pin(&mut self, pin: &str) {
            for c in pin.chars() {
                self.gate.handle_key(Key::Char(c));
            }
            self.advance(DEFAULT_VERIFY_DELAY);
        }

        fn session_active(&self) -> bool {
            SessionFlag::new(self.stores.session.clone())
                .is_active()
                .unwrap()
        }
    }

    #[test]
    fn test_initialize_without_secret_enters_create() {
        let rig = Rig::new(None);
        assert_eq!(rig.gate.mode(), GateMode::Create);
        assert_eq!(rig.feedback.notices(), vec![Notice::CreatePrompt]);
    }

    #[test]
    fn test_initialize_with_active_session_skips_gate() {
        let stores = Stores::in_memory();
        SessionFlag::new(stores.session.clone()).grant().unwrap();
        let mut rig = Rig::with_stores(stores);

        assert!(rig.gate.is_granted());
        assert_eq!(rig.navigator.views(), vec![View::Dashboard]);
        assert!(!rig.gate.handle_key(Key::Char('1')));
    }

    #[test]
    fn test_first_run_create_and_confirm() {
        let mut rig = Rig::new(None);
        rig.type_pin("1111");
        assert_eq!(rig.gate.mode(), GateMode::Confirm);
        assert_eq!(rig.gate.snapshot().filled, 0);

        rig.type_pin("1111");
        assert!(rig.gate.is_granted());
        assert!(rig.session_active());
        assert_eq!(
            secret::load_secret(rig.stores.local.as_ref())
                .unwrap()
                .unwrap()
                .as_str(),
            "1111"
        );
        assert_eq!(rig.navigator.views(), vec![View::Dashboard]);
        assert_eq!(rig.feedback.last(), Some(Notice::PinCreated));
    }

    #[test]
    fn test_first_run_mismatch_returns_to_create() {
        let mut rig = Rig::new(None);
        rig.type_pin("1234");
        rig.type_pin("5678");

        assert_eq!(rig.gate.mode(), GateMode::Create);
        assert_eq!(rig.gate.snapshot().filled, 0);
        assert!(!rig.gate.is_granted());
        assert!(!secret::has_secret(rig.stores.local.as_ref()).unwrap());
        assert_eq!(rig.feedback.last(), Some(Notice::PinMismatch));
    }

    #[test]
    fn test_correct_login_grants() {
        let mut rig = Rig::new(Some("9999"));
        assert_eq!(rig.gate.mode(), GateMode::Login);

        rig.type_pin("9999");
        assert!(rig.gate.is_granted());
        assert_eq!(rig.gate.failed_attempts(), 0);
        assert!(rig.session_active());
        assert_eq!(rig.feedback.last().map(|n| n.severity()), Some(Severity::Success));
    }

    #[test]
    fn test_verification_waits_for_delay() {
        let mut rig = Rig::new(Some("9999"));
        for c in "9999".chars() {
            rig.gate.handle_key(Key::Char(c));
        }
        assert!(rig.gate.snapshot().verifying);
        assert!(!rig.gate.is_granted());

        // Input is ignored while verification is pending
        assert!(!rig.gate.handle_key(Key::Char('1')));

        rig.advance(Duration::from_millis(149));
        assert!(!rig.gate.is_granted());
        rig.advance(Duration::from_millis(1));
        assert!(rig.gate.is_granted());
    }

    #[test]
    fn test_failed_attempts_then_success() {
        let mut rig = Rig::new(Some("9999"));
        for attempt in 1..=3 {
            rig.type_pin("1234");
            assert_eq!(
                rig.feedback.last(),
                Some(Notice::IncorrectPin { attempt, max: 4 })
            );
            assert_eq!(rig.gate.snapshot().filled, 0);
        }
        assert!(!rig.gate.is_locked_out());

        rig.type_pin("9999");
        assert!(rig.gate.is_granted());
    }

    #[test]
    fn test_lockout_after_max_attempts() {
        let mut rig = Rig::new(Some("9999"));
        for _ in 0..4 {
            rig.type_pin("1234");
        }
        assert!(rig.gate.is_locked_out());
        assert_eq!(rig.feedback.last(), Some(Notice::LockoutStarted { seconds: 60 }));
        assert_eq!(rig.gate.snapshot().lockout_remaining, Some(60));

        // Input rejected while locked out
        assert!(!rig.gate.handle_key(Key::Char('9')));
        assert!(!rig.gate.handle_key(Key::Backspace));
        assert_eq!(rig.gate.snapshot().filled, 0);

        rig.advance(Duration::from_secs(1));
        assert_eq!(rig.feedback.last(), Some(Notice::LockoutTick { remaining: 59 }));

        rig.advance(Duration::from_secs(58));
        assert!(rig.gate.is_locked_out());
        assert_eq!(rig.gate.snapshot().lockout_remaining, Some(1));

        rig.advance(Duration::from_secs(1));
        assert!(!rig.gate.is_locked_out());
        assert_eq!(rig.gate.failed_attempts(), 0);
        assert_eq!(rig.feedback.last(), Some(Notice::LockoutEnded));
        assert_eq!(rig.scheduler.pending(), 0);

        rig.type_pin("9999");
        assert!(rig.gate.is_granted());
    }

    #[test]
    fn test_delete_cancels_pending_verification() {
        let mut rig = Rig::new(Some("9999"));
        for c in "1234".chars() {
            rig.gate.handle_key(Key::Char(c));
        }
        assert!(rig.gate.handle_key(Key::Backspace));
        assert!(!rig.gate.snapshot().verifying);
        assert_eq!(rig.gate.snapshot().filled, 3);

        rig.advance(Duration::from_secs(1));
        assert_eq!(rig.gate.failed_attempts(), 0);
        assert_eq!(rig.feedback.notices(), Vec::<Notice>::new());
        assert!(rig.feedback.clear_count() > 0);
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut rig = Rig::new(Some("1234"));
        for c in "1234".chars() {
            rig.gate.handle_key(Key::Char(c));
        }
        rig.gate.handle_key(Key::Backspace);
        rig.gate.handle_key(Key::Char('4'));

        // The first verification timer was id 0
        rig.gate.on_timer(TimerEvent {
            id: TimerId(0),
            kind: TimerKind::Verify,
        });
        assert!(!rig.gate.is_granted());
        assert!(rig.gate.snapshot().verifying);

        rig.advance(DEFAULT_VERIFY_DELAY);
        assert!(rig.gate.is_granted());
    }

    #[test]
    fn test_enter_verifies_immediately() {
        let mut rig = Rig::new(Some("2468"));
        for c in "246".chars() {
            rig.gate.handle_key(Key::Char(c));
        }
        assert!(!rig.gate.handle_key(Key::Enter));

        rig.gate.handle_key(Key::Char('8'));
        assert!(rig.gate.handle_key(Key::Enter));
        assert!(rig.gate.is_granted());
        assert_eq!(rig.scheduler.pending(), 0);
    }

    #[test]
    fn test_other_keys_ignored() {
        let mut rig = Rig::new(Some("2468"));
        assert!(!rig.gate.handle_key(Key::Char('x')));
        assert!(!rig.gate.handle_key(Key::Backspace));
        assert_eq!(rig.gate.snapshot().filled, 0);
    }

    /// Local store whose PIN key cannot be read
    struct UnreadableSecret(MemoryStore);

    impl KeyValueStore for UnreadableSecret {
        fn get(&self, key: &str) -> paytrack_core::Result<Option<String>> {
            if key == keys::SECRET {
                return Err(StoreError::Corrupt("bad sector".to_string()));
            }
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> paytrack_core::Result<()> {
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> paytrack_core::Result<()> {
            self.0.remove(key)
        }
    }

    #[test]
    fn test_unreadable_secret_counts_as_present() {
        let stores = Stores::new(
            Arc::new(UnreadableSecret(MemoryStore::new())),
            Arc::new(MemoryStore::new()),
        );
        let mut rig = Rig::with_stores(stores);
        assert_eq!(rig.gate.mode(), GateMode::Login);

        // Verification against an unreadable PIN fails
        rig.type_pin("0000");
        assert!(!rig.gate.is_granted());
        assert_eq!(rig.gate.failed_attempts(), 1);
    }

    #[test]
    fn test_biometric_requires_flag() {
        let mut rig = Rig::new(Some("1234"));
        assert_eq!(
            rig.gate.begin_biometric().unwrap_err(),
            GateError::BiometricUnavailable
        );
        assert!(!rig.gate.snapshot().biometric_available);
    }

    fn biometric_rig() -> Rig {
        let stores = Stores::in_memory();
        secret::store_secret(stores.local.as_ref(), "1234").unwrap();
        stores.local.set(keys::BIOMETRIC_ENABLED, "true").unwrap();
        Rig::with_stores(stores)
    }

    #[test]
    fn test_biometric_success_grants() {
        let mut rig = biometric_rig();
        assert!(rig.gate.snapshot().biometric_available);
        assert_eq!(rig.feedback.notices(), vec![Notice::BiometricAvailable]);

        let request = rig.gate.begin_biometric().unwrap();
        assert_eq!(request.policy.timeout, Duration::from_secs(60));
        assert_eq!(rig.gate.begin_biometric().unwrap_err(), GateError::Busy);

        rig.gate.complete_biometric(Ok(()));
        assert!(rig.gate.is_granted());
        assert!(rig.session_active());
    }

    #[test]
    fn test_biometric_cancel_is_silent() {
        let mut rig = biometric_rig();
        rig.gate.begin_biometric().unwrap();
        rig.gate.complete_biometric(Err(BiometricError::Canceled));

        assert!(!rig.gate.is_granted());
        assert_eq!(rig.feedback.notices(), vec![Notice::BiometricAvailable]);

        // PIN entry still works
        rig.type_pin("1234");
        assert!(rig.gate.is_granted());
    }

    #[test]
    fn test_biometric_failure_notifies() {
        let mut rig = biometric_rig();
        rig.gate.begin_biometric().unwrap();
        rig.gate
            .complete_biometric(Err(BiometricError::Failed("no match".to_string())));

        assert!(!rig.gate.is_granted());
        assert_eq!(
            rig.feedback.last(),
            Some(Notice::BiometricFailed {
                reason: "no match".to_string()
            })
        );
        // A second request is allowed
        assert!(rig.gate.begin_biometric().is_ok());
    }

    #[test]
    fn test_biometric_blocked_during_lockout() {
        let mut rig = biometric_rig();
        for _ in 0..4 {
            rig.type_pin("0000");
        }
        assert_eq!(rig.gate.begin_biometric().unwrap_err(), GateError::LockedOut(60));
    }

    #[test]
    fn test_unsolicited_biometric_result_ignored() {
        let mut rig = biometric_rig();
        rig.gate.complete_biometric(Ok(()));
        assert!(!rig.gate.is_granted());
    }

    #[test]
    fn test_drop_cancels_timers() {
        let mut rig = Rig::new(Some("9999"));
        for _ in 0..4 {
            rig.type_pin("1234");
        }
        assert_eq!(rig.scheduler.pending(), 1);
        let scheduler = rig.scheduler.clone();
        drop(rig);
        assert_eq!(scheduler.pending(), 0);
    }
}
