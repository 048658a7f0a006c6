//! Security Event Monitoring
//!
//! Append-only bounded buffer of security events with threshold rules and
//! an escalation hook. Both session halves report here; the monitor decides
//! when a pattern of events warrants forcing the user out.
//!
//! Logging an event must never be able to crash the request that triggered
//! it: lock poisoning is recovered and escalation handler panics are caught
//! and downgraded to an error log.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

/// Security event classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TokenAccess,
    FingerprintMismatch,
    TokenExpiry,
    SuspiciousRequest,
    DeviceChange,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TokenAccess => "token_access",
            EventKind::FingerprintMismatch => "fingerprint_mismatch",
            EventKind::TokenExpiry => "token_expiry",
            EventKind::SuspiciousRequest => "suspicious_request",
            EventKind::DeviceChange => "device_change",
        }
    }
}

/// Event severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// One observed security event
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    pub kind: EventKind,
    pub severity: Severity,
    pub at_ms: i64,
    pub details: serde_json::Map<String, Value>,
}

impl SecurityEvent {
    pub fn new(kind: EventKind, severity: Severity) -> Self {
        Self {
            kind,
            severity,
            at_ms: now_unix_ms(),
            details: serde_json::Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Escalation raised by a threshold rule or a critical event
#[derive(Debug, Clone)]
pub struct Escalation {
    pub severity: Severity,
    pub kind: EventKind,
    pub reason: &'static str,
}

/// Receives escalations synchronously.
///
/// A `Critical` escalation is the forced-logout signal; `High` is a warning
/// the handler may surface or count.
pub trait EscalationHandler: Send + Sync {
    fn on_escalation(&self, escalation: &Escalation);
}

/// Default handler: escalations are only traced
struct TraceOnlyHandler;

impl EscalationHandler for TraceOnlyHandler {
    fn on_escalation(&self, escalation: &Escalation) {
        tracing::warn!(
            kind = escalation.kind.as_str(),
            severity = escalation.severity.as_str(),
            reason = escalation.reason,
            "Security escalation (no handler installed)"
        );
    }
}

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Ring buffer capacity; oldest entries evicted beyond this
    pub capacity: usize,
    /// Entries older than this are removed by the age sweep
    pub max_event_age: Duration,
    /// Interval of the background age sweep
    pub sweep_interval: Duration,
    /// Token accesses within `token_access_window` that trigger escalation
    pub token_access_threshold: usize,
    pub token_access_window: Duration,
    /// Suspicious requests within `suspicious_window` that trigger escalation
    pub suspicious_threshold: usize,
    pub suspicious_window: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            max_event_age: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(600),
            token_access_threshold: 5,
            token_access_window: Duration::from_secs(60),
            suspicious_threshold: 3,
            suspicious_window: Duration::from_secs(300),
        }
    }
}

#[derive(Default)]
struct MonitorState {
    events: VecDeque<SecurityEvent>,
    // Last escalation instant per rule, to suppress storms within one window
    last_token_access_escalation_ms: Option<i64>,
    last_suspicious_escalation_ms: Option<i64>,
}

/// Security event monitor with a bounded buffer and threshold rules.
///
/// Cheap to clone; all clones share the same buffer. Construct once at
/// startup and inject where needed; there is no ambient global instance.
#[derive(Clone)]
pub struct SecurityEventMonitor {
    config: Arc<MonitorConfig>,
    state: Arc<Mutex<MonitorState>>,
    handler: Arc<dyn EscalationHandler>,
    sweeper_started: Arc<AtomicBool>,
}

impl SecurityEventMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_handler(config, Arc::new(TraceOnlyHandler))
    }

    pub fn with_handler(config: MonitorConfig, handler: Arc<dyn EscalationHandler>) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(MonitorState::default())),
            handler,
            sweeper_started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Append an event and evaluate threshold rules. Never panics.
    pub fn log(&self, event: SecurityEvent) {
        tracing::debug!(
            kind = event.kind.as_str(),
            severity = event.severity.as_str(),
            "Security event"
        );

        let escalation = {
            let mut state = self.lock_state();

            state.events.push_back(event.clone());
            while state.events.len() > self.config.capacity {
                state.events.pop_front();
            }

            self.evaluate_rules(&mut state, &event)
        };

        if let Some(escalation) = escalation {
            tracing::warn!(
                kind = escalation.kind.as_str(),
                severity = escalation.severity.as_str(),
                reason = escalation.reason,
                "Security escalation"
            );

            let handler = Arc::clone(&self.handler);
            if catch_unwind(AssertUnwindSafe(|| handler.on_escalation(&escalation))).is_err() {
                tracing::error!(
                    reason = escalation.reason,
                    "Escalation handler panicked; escalation swallowed"
                );
            }
        }
    }

    /// Remove entries older than the configured maximum age.
    ///
    /// Runs independently of the capacity bound; returns removed count.
    pub fn sweep_expired(&self) -> usize {
        let cutoff = now_unix_ms() - self.config.max_event_age.as_millis() as i64;
        let mut state = self.lock_state();

        let before = state.events.len();
        state.events.retain(|event| event.at_ms >= cutoff);
        before - state.events.len()
    }

    /// Start the background age sweeper.
    ///
    /// Started at most once per monitor; subsequent calls return `None`.
    pub fn spawn_sweeper(&self) -> Option<SweepHandle> {
        if self.sweeper_started.swap(true, Ordering::SeqCst) {
            tracing::warn!("Security monitor sweeper already running");
            return None;
        }

        let monitor = self.clone();
        let interval = self.config.sweep_interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await; // immediate first tick

            loop {
                ticker.tick().await;
                let removed = monitor.sweep_expired();
                if removed > 0 {
                    tracing::debug!(removed, "Swept aged security events");
                }
            }
        });

        Some(SweepHandle {
            abort: task.abort_handle(),
        })
    }

    /// Snapshot of the current buffer, oldest first
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.lock_state().events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock_state().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned lock means another thread panicked mid-append; the buffer
    // is still structurally sound, so recover rather than propagate.
    fn lock_state(&self) -> MutexGuard<'_, MonitorState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn evaluate_rules(
        &self,
        state: &mut MonitorState,
        event: &SecurityEvent,
    ) -> Option<Escalation> {
        // Any critical event forces logout immediately; a fingerprint
        // mismatch is critical regardless of how it was logged.
        if event.severity == Severity::Critical || event.kind == EventKind::FingerprintMismatch {
            return Some(Escalation {
                severity: Severity::Critical,
                kind: event.kind,
                reason: "critical security event",
            });
        }

        match event.kind {
            EventKind::TokenAccess => {
                let window = self.config.token_access_window;
                if count_recent(&state.events, EventKind::TokenAccess, event.at_ms, window)
                    >= self.config.token_access_threshold
                    && outside_window(state.last_token_access_escalation_ms, event.at_ms, window)
                {
                    state.last_token_access_escalation_ms = Some(event.at_ms);
                    return Some(Escalation {
                        severity: Severity::High,
                        kind: EventKind::TokenAccess,
                        reason: "excessive token access",
                    });
                }
            }
            EventKind::SuspiciousRequest => {
                let window = self.config.suspicious_window;
                if count_recent(
                    &state.events,
                    EventKind::SuspiciousRequest,
                    event.at_ms,
                    window,
                ) >= self.config.suspicious_threshold
                    && outside_window(state.last_suspicious_escalation_ms, event.at_ms, window)
                {
                    state.last_suspicious_escalation_ms = Some(event.at_ms);
                    return Some(Escalation {
                        severity: Severity::High,
                        kind: EventKind::SuspiciousRequest,
                        reason: "repeated suspicious requests",
                    });
                }
            }
            _ => {}
        }

        None
    }
}

/// Handle for the background sweeper task
pub struct SweepHandle {
    abort: tokio::task::AbortHandle,
}

impl SweepHandle {
    /// Stop the sweeper. Idempotent.
    pub fn cancel(&self) {
        self.abort.abort();
    }
}

fn count_recent(
    events: &VecDeque<SecurityEvent>,
    kind: EventKind,
    now_ms: i64,
    window: Duration,
) -> usize {
    let cutoff = now_ms - window.as_millis() as i64;
    events
        .iter()
        .filter(|e| e.kind == kind && e.at_ms >= cutoff)
        .count()
}

fn outside_window(last_ms: Option<i64>, now_ms: i64, window: Duration) -> bool {
    match last_ms {
        Some(last) => now_ms - last >= window.as_millis() as i64,
        None => true,
    }
}

fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
