//! Tokio driver for the gate
//!
//! [`GateDriver`] owns the [`PinGate`] inside one task. Key presses, timer
//! fires and biometric results all arrive on one unbounded channel, so the
//! gate is only ever touched by that task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use paytrack_core::Stores;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::biometric::{BiometricAuthenticator, BiometricError};
use crate::gate::{GateConfig, GateServices, Key, PinGate};
use crate::scheduler::{Scheduler, TimerEvent, TimerId};

/// Input accepted by the driver
#[derive(Debug)]
pub enum GateInput {
    Key(Key),
    /// Start a biometric unlock
    Biometric,
    /// Result of a biometric request started by the driver
    BiometricDone(Result<(), BiometricError>),
    Timer(TimerEvent),
    Shutdown,
}

/// How the driver finished
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateOutcome {
    /// The session was unlocked
    Granted,
    /// Shut down or every sender dropped before an unlock
    Closed,
}

/// Scheduler backed by tokio sleep tasks
///
/// Must be used from within a tokio runtime.
///
/// Timer tasks hold only weak senders: a pending timer does not keep the
/// driver alive once every [`GateHandle`] is gone.
pub struct TokioScheduler {
    tx: mpsc::WeakUnboundedSender<GateInput>,
    tasks: Mutex<HashMap<TimerId, JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new(tx: &mpsc::UnboundedSender<GateInput>) -> Self {
        Self {
            tx: tx.downgrade(),
            tasks: Mutex::new(HashMap::new()),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, after: Duration, event: TimerEvent) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(GateInput::Timer(event));
            }
        });

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|_, task| !task.is_finished());
            tasks.insert(event.id, handle);
        }
    }

    fn cancel(&self, id: TimerId) {
        if let Ok(mut tasks) = self.tasks.lock() {
            if let Some(task) = tasks.remove(&id) {
                task.abort();
            }
        }
    }
}

/// Sends input to a running [`GateDriver`]
#[derive(Clone, Debug)]
pub struct GateHandle {
    tx: mpsc::UnboundedSender<GateInput>,
}

impl GateHandle {
    /// `false` once the driver has stopped
    pub fn send(&self, input: GateInput) -> bool {
        self.tx.send(input).is_ok()
    }

    pub fn key(&self, key: Key) -> bool {
        self.send(GateInput::Key(key))
    }

    pub fn biometric(&self) -> bool {
        self.send(GateInput::Biometric)
    }

    pub fn shutdown(&self) -> bool {
        self.send(GateInput::Shutdown)
    }
}

/// Runs a [`PinGate`] until it grants access or is shut down
pub struct GateDriver {
    gate: PinGate,
    rx: mpsc::UnboundedReceiver<GateInput>,
    tx: mpsc::WeakUnboundedSender<GateInput>,
    authenticator: Arc<dyn BiometricAuthenticator>,
}

impl GateDriver {
    pub fn new(
        stores: Stores,
        config: GateConfig,
        services: GateServices,
        authenticator: Arc<dyn BiometricAuthenticator>,
    ) -> (Self, GateHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Arc::new(TokioScheduler::new(&tx));
        let gate = PinGate::new(stores, config, scheduler, services);
        let driver = Self {
            gate,
            rx,
            tx: tx.downgrade(),
            authenticator,
        };
        (driver, GateHandle { tx })
    }

    pub fn gate(&self) -> &PinGate {
        &self.gate
    }

    /// Initialize the gate and process input until it finishes
    pub async fn run(mut self) -> GateOutcome {
        self.gate.initialize();

        while !self.gate.is_granted() {
            let input = match self.rx.recv().await {
                Some(input) => input,
                None => break,
            };

            match input {
                GateInput::Key(key) => {
                    self.gate.handle_key(key);
                }
                GateInput::Biometric => self.start_biometric(),
                GateInput::BiometricDone(result) => self.gate.complete_biometric(result),
                GateInput::Timer(event) => self.gate.on_timer(event),
                GateInput::Shutdown => {
                    tracing::debug!("Lock screen shut down");
                    break;
                }
            }
        }

        if self.gate.is_granted() {
            GateOutcome::Granted
        } else {
            GateOutcome::Closed
        }
    }

    fn start_biometric(&mut self) {
        let request = match self.gate.begin_biometric() {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("Biometric unlock not started: {}", e);
                return;
            }
        };
        let tx = match self.tx.upgrade() {
            Some(tx) => tx,
            None => return,
        };

        let authenticator = self.authenticator.clone();
        tokio::spawn(async move {
            let timeout = request.policy.timeout;
            let assertion = authenticator.request_assertion(&request.challenge, &request.policy);
            let result = match tokio::time::timeout(timeout, assertion).await {
                Ok(result) => result,
                Err(_) => Err(BiometricError::Failed("timed out".to_string())),
            };
            let _ = tx.send(GateInput::BiometricDone(result));
        });
    }
}
