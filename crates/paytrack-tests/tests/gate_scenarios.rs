//! Lock screen scenarios
//!
//! Each test drives a gate over real file-backed stores with a hand-stepped
//! clock, the way a host with its own event loop would.

use std::sync::Arc;
use std::time::Duration;

use paytrack_core::{secret, JsonFileStore, MemoryStore, SessionFlag, Stores, View};
use paytrack_gate::testing::{NoopLocalizer, RecordingFeedback, RecordingNavigator};
use paytrack_gate::{
    Digit, GateConfig, GateMode, GateServices, Key, LockoutPolicy, ManualScheduler, Notice,
    PinGate, DEFAULT_VERIFY_DELAY,
};
use tempfile::TempDir;

struct Screen {
    gate: PinGate,
    clock: Arc<ManualScheduler>,
    feedback: Arc<RecordingFeedback>,
    navigator: Arc<RecordingNavigator>,
    localizer: Arc<NoopLocalizer>,
}

impl Screen {
    fn open(stores: &Stores, config: GateConfig) -> Self {
        let clock = Arc::new(ManualScheduler::new());
        let feedback = Arc::new(RecordingFeedback::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let localizer = Arc::new(NoopLocalizer::default());
        let services = GateServices {
            navigator: navigator.clone(),
            feedback: feedback.clone(),
            localizer: localizer.clone(),
        };
        let mut gate = PinGate::new(stores.clone(), config, clock.clone(), services);
        gate.initialize();
        Self {
            gate,
            clock,
            feedback,
            navigator,
            localizer,
        }
    }

    fn wait(&mut self, by: Duration) {
        let gate = &mut self.gate;
        self.clock.advance(by, |event| gate.on_timer(event));
    }

    fn enter(&mut self, pin: &str) {
        for c in pin.chars() {
            let digit = Digit::from_char(c).unwrap();
            self.gate.submit_digit(digit);
        }
        self.wait(DEFAULT_VERIFY_DELAY);
    }
}

fn file_stores(dir: &TempDir) -> Stores {
    let local = JsonFileStore::open(dir.path().join("local.json")).unwrap();
    Stores::new(Arc::new(local), Arc::new(MemoryStore::new()))
}

#[test]
fn test_first_run_then_login_on_next_visit() {
    let dir = TempDir::new().unwrap();
    let stores = file_stores(&dir);

    let mut screen = Screen::open(&stores, GateConfig::default());
    assert_eq!(screen.gate.mode(), GateMode::Create);
    assert_eq!(screen.localizer.translations(), 1);

    screen.enter("1111");
    assert_eq!(screen.gate.mode(), GateMode::Confirm);
    screen.enter("1111");
    assert!(screen.gate.is_granted());
    assert_eq!(screen.navigator.views(), vec![View::Dashboard]);

    // Reopen the store from disk: the PIN survived
    let reopened = JsonFileStore::open(dir.path().join("local.json")).unwrap();
    assert_eq!(
        secret::load_secret(&reopened).unwrap().unwrap().as_str(),
        "1111"
    );

    // Lock, then a new visit asks for the PIN
    SessionFlag::new(stores.session.clone()).revoke().unwrap();
    let mut screen = Screen::open(&stores, GateConfig::default());
    assert_eq!(screen.gate.mode(), GateMode::Login);
    screen.enter("1111");
    assert!(screen.gate.is_granted());
}

#[test]
fn test_three_misses_then_correct_pin() {
    let stores = Stores::in_memory();
    secret::store_secret(stores.local.as_ref(), "9999").unwrap();

    let mut screen = Screen::open(&stores, GateConfig::default());
    for _ in 0..3 {
        screen.enter("1234");
    }
    assert!(!screen.gate.is_locked_out());
    assert_eq!(screen.gate.failed_attempts(), 3);

    screen.enter("9999");
    assert!(screen.gate.is_granted());
}

#[test]
fn test_four_misses_lock_out_until_countdown_ends() {
    let stores = Stores::in_memory();
    secret::store_secret(stores.local.as_ref(), "9999").unwrap();

    let mut screen = Screen::open(&stores, GateConfig::default());
    for _ in 0..4 {
        screen.enter("1234");
    }
    assert!(screen.gate.is_locked_out());

    // Even the right PIN is ignored now
    screen.enter("9999");
    assert!(!screen.gate.is_granted());
    assert_eq!(screen.gate.snapshot().filled, 0);

    screen.wait(Duration::from_secs(60));
    assert!(!screen.gate.is_locked_out());
    assert_eq!(screen.gate.failed_attempts(), 0);

    let ticks = screen
        .feedback
        .notices()
        .into_iter()
        .filter(|n| matches!(n, Notice::LockoutTick { .. }))
        .count();
    assert_eq!(ticks, 59);

    screen.enter("9999");
    assert!(screen.gate.is_granted());
}

#[test]
fn test_configured_policy_is_honoured() {
    let stores = Stores::in_memory();
    secret::store_secret(stores.local.as_ref(), "9999").unwrap();

    let config = GateConfig {
        lockout: LockoutPolicy {
            max_attempts: 2,
            duration: Duration::from_secs(30),
        },
        verify_delay: Duration::from_millis(10),
        ..GateConfig::default()
    };
    let mut screen = Screen::open(&stores, config);
    for c in "1234".chars() {
        screen.gate.handle_key(Key::Char(c));
    }
    screen.wait(Duration::from_millis(10));
    assert_eq!(
        screen.feedback.last(),
        Some(Notice::IncorrectPin { attempt: 1, max: 2 })
    );

    for c in "1234".chars() {
        screen.gate.handle_key(Key::Char(c));
    }
    screen.wait(Duration::from_millis(10));
    assert_eq!(
        screen.feedback.last(),
        Some(Notice::LockoutStarted { seconds: 30 })
    );

    screen.wait(Duration::from_secs(30));
    assert_eq!(screen.feedback.last(), Some(Notice::LockoutEnded));
}

#[test]
fn test_already_unlocked_session_skips_lock_screen() {
    let stores = Stores::in_memory();
    secret::store_secret(stores.local.as_ref(), "9999").unwrap();
    SessionFlag::new(stores.session.clone()).grant().unwrap();

    let screen = Screen::open(&stores, GateConfig::default());
    assert!(screen.gate.is_granted());
    assert_eq!(screen.navigator.views(), vec![View::Dashboard]);
    assert!(screen.feedback.notices().is_empty());
}

#[tokio::test]
async fn test_biometric_unlock_through_authenticator() {
    use paytrack_core::keys;
    use paytrack_gate::{AssertionPolicy, BiometricAuthenticator, BiometricError, Challenge};

    struct Sensor;

    #[async_trait::async_trait]
    impl BiometricAuthenticator for Sensor {
        async fn request_assertion(
            &self,
            challenge: &Challenge,
            policy: &AssertionPolicy,
        ) -> Result<(), BiometricError> {
            assert_eq!(challenge.as_bytes().len(), 32);
            assert_eq!(policy.timeout, Duration::from_secs(60));
            Ok(())
        }
    }

    let stores = Stores::in_memory();
    secret::store_secret(stores.local.as_ref(), "9999").unwrap();
    stores.local.set(keys::BIOMETRIC_ENABLED, "true").unwrap();

    let mut screen = Screen::open(&stores, GateConfig::default());
    screen.gate.unlock_with_biometric(&Sensor).await.unwrap();
    assert!(screen.gate.is_granted());
    assert!(SessionFlag::new(stores.session.clone()).is_active().unwrap());
}
