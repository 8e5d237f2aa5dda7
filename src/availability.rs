/// Nickname availability checker
///
/// Debounces a changing text input and drives at most one availability
/// probe at a time on a background worker. A generation counter guards
/// commits: only the result belonging to the newest input may mutate the
/// shared check state, so overlapping or out-of-order probe resolutions
/// cannot clobber a fresher verdict.
///
/// Format errors (too short, bad characters) are owned by the validation
/// engine; this component goes quiet (`Idle`) for them and never touches
/// the network. Probe failures are swallowed into `Errored` and never block
/// the user; the server re-validates at submission.
///
/// A probe that never returns leaves the status at `Checking` indefinitely;
/// there is no secondary timeout around the transport's own.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::validation::{NICKNAME_MIN_LEN, NICKNAME_PATTERN};

/// Transport used to ask the profile service whether a nickname is free.
/// `Ok(true)` means available. Implemented by the HTTP client and by test
/// fakes.
pub trait AvailabilityProbe: Send + Sync + 'static {
    fn check(&self, nickname: &str) -> Result<bool, ApiError>;
}

/// Where the check currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NicknameStatus {
    /// No check relevant for the current input (empty or fails format rules)
    Idle,
    /// A debounce cycle or probe call is in flight
    Checking,
    Available,
    Taken,
    /// The probe failed; treated as unknown, never blocks progression
    Errored,
}

/// Status plus the exact normalized value that produced it. When the live
/// input diverges from `checked_value` the state is stale and must be
/// treated as unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct NicknameCheckState {
    pub status: NicknameStatus,
    pub checked_value: String,
}

impl NicknameCheckState {
    fn idle() -> Self {
        Self {
            status: NicknameStatus::Idle,
            checked_value: String::new(),
        }
    }
}

enum WorkerMessage {
    Input { value: String, generation: u64 },
    Shutdown,
}

struct SharedCheckState {
    state: Mutex<NicknameCheckState>,
    /// Bumped on every input change; a probe result commits only while its
    /// captured generation is still the newest.
    generation: AtomicU64,
    /// Set on shutdown so a late probe result cannot write to torn-down state
    closed: AtomicBool,
}

/// Debounced availability checker.
pub struct AvailabilityChecker {
    shared: Arc<SharedCheckState>,
    worker_tx: Sender<WorkerMessage>,
    format_re: Regex,
}

impl AvailabilityChecker {
    /// Spawn the worker with the given debounce window.
    pub fn new(probe: Arc<dyn AvailabilityProbe>, debounce: Duration) -> Self {
        let shared = Arc::new(SharedCheckState {
            state: Mutex::new(NicknameCheckState::idle()),
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        });

        let (worker_tx, worker_rx) = unbounded();
        let worker_shared = Arc::clone(&shared);
        thread::spawn(move || run_worker(worker_rx, worker_shared, probe, debounce));

        Self {
            shared,
            worker_tx,
            format_re: Regex::new(NICKNAME_PATTERN).expect("hard-coded nickname pattern compiles"),
        }
    }

    /// Feed the latest raw input value. Supersedes any pending debounce
    /// cycle; earlier in-flight results become no-ops.
    pub fn input(&self, raw: &str) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let trimmed = raw.trim();
        if trimmed.chars().count() < NICKNAME_MIN_LEN || !self.format_re.is_match(trimmed) {
            // Format errors belong to the validation engine; no network call.
            *self.shared.state.lock() = NicknameCheckState::idle();
            return;
        }

        let normalized = trimmed.to_lowercase();

        {
            let mut state = self.shared.state.lock();
            // Same value already resolved: keep the verdict, skip the cycle.
            if state.checked_value == normalized
                && matches!(
                    state.status,
                    NicknameStatus::Available | NicknameStatus::Taken
                )
            {
                return;
            }
            // Pending indicator shows before the debounce window expires
            *state = NicknameCheckState {
                status: NicknameStatus::Checking,
                checked_value: normalized.clone(),
            };
        }

        let _ = self.worker_tx.send(WorkerMessage::Input {
            value: normalized,
            generation,
        });
    }

    /// Snapshot of the committed check state.
    pub fn state(&self) -> NicknameCheckState {
        self.shared.state.lock().clone()
    }

    /// Effective status for the given live input value, accounting for
    /// staleness: a committed verdict for some other value is reported as
    /// `Checking`, because `input` has already started a fresh cycle for
    /// the live value; an input that fails format rules is `Idle`.
    pub fn status_for(&self, live_value: &str) -> NicknameStatus {
        let trimmed = live_value.trim();
        if trimmed.chars().count() < NICKNAME_MIN_LEN || !self.format_re.is_match(trimmed) {
            return NicknameStatus::Idle;
        }

        let state = self.shared.state.lock();
        if state.checked_value == trimmed.to_lowercase() {
            state.status
        } else {
            NicknameStatus::Checking
        }
    }
}

impl Drop for AvailabilityChecker {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        // Cancels any pending debounce cycle. The worker is not joined: a
        // probe already on the wire may outlive us, and its result is
        // discarded by the closed flag.
        let _ = self.worker_tx.send(WorkerMessage::Shutdown);
    }
}

fn run_worker(
    rx: Receiver<WorkerMessage>,
    shared: Arc<SharedCheckState>,
    probe: Arc<dyn AvailabilityProbe>,
    debounce: Duration,
) {
    debug!("availability worker started");

    let mut pending: Option<(String, u64)> = None;

    loop {
        let message = match pending {
            // A value is waiting out its debounce window; newer input resets it
            Some(_) => match rx.recv_timeout(debounce) {
                Ok(message) => Some(message),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(message) => Some(message),
                Err(_) => break,
            },
        };

        match message {
            Some(WorkerMessage::Shutdown) => break,
            Some(WorkerMessage::Input { value, generation }) => {
                pending = Some((value, generation));
            }
            None => {
                // Window expired: the surviving value gets its single probe call
                let Some((value, generation)) = pending.take() else {
                    continue;
                };

                if generation != shared.generation.load(Ordering::SeqCst) {
                    // Superseded while waiting (e.g. by input that went Idle)
                    continue;
                }

                let status = match probe.check(&value) {
                    Ok(true) => NicknameStatus::Available,
                    Ok(false) => NicknameStatus::Taken,
                    Err(err) => {
                        // Fail open: the server is the authoritative check
                        warn!("nickname availability check failed: {err}");
                        NicknameStatus::Errored
                    }
                };

                if shared.closed.load(Ordering::SeqCst) {
                    continue;
                }

                let mut state = shared.state.lock();
                // Race guard: commit only while this is still the newest input
                if generation == shared.generation.load(Ordering::SeqCst) {
                    *state = NicknameCheckState {
                        status,
                        checked_value: value,
                    };
                } else {
                    debug!("discarding stale availability result for '{value}'");
                }
            }
        }
    }

    debug!("availability worker stopped");
}
