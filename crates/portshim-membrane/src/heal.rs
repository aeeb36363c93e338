//! Self-healing ledger.
//!
//! In hardened mode the ABI layer repairs invalid caller input instead of
//! failing. Every repair is a [`HealingAction`]; the [`HealingPolicy`]
//! counts them and keeps the most recent few as [`HealEvent`]s so a harness
//! (or a debugger) can see what was patched up and where.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Number of recent heal events retained.
pub const RECENT_EVENTS_CAPACITY: usize = 32;

/// Repairs the membrane can apply to an invalid call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealingAction {
    /// A size argument was clamped (e.g. a null destination treated as size 0).
    ClampSize { requested: usize, clamped: usize },
    /// A safe default was produced instead of performing the operation.
    ReturnSafeDefault,
    /// An unknown service name resolved to port 0.
    DefaultPort,
    /// An unresolvable host resolved to the loopback address.
    LoopbackHost,
    /// No healing needed.
    None,
}

impl HealingAction {
    /// Returns true if this action represents an actual healing (not None).
    #[must_use]
    pub const fn is_heal(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Short stable name used in logs and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ClampSize { .. } => "clamp_size",
            Self::ReturnSafeDefault => "return_safe_default",
            Self::DefaultPort => "default_port",
            Self::LoopbackHost => "loopback_host",
            Self::None => "none",
        }
    }
}

/// One recorded repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealEvent {
    /// C symbol that applied the repair.
    pub symbol: &'static str,
    pub action: HealingAction,
}

/// Counters and recent history of applied repairs.
pub struct HealingPolicy {
    /// Total heals applied.
    pub total_heals: AtomicU64,
    /// Size clamps applied.
    pub size_clamps: AtomicU64,
    /// Safe defaults returned.
    pub safe_defaults: AtomicU64,
    /// Unknown services defaulted to port 0.
    pub port_defaults: AtomicU64,
    /// Unresolvable hosts replaced by loopback.
    pub loopback_hosts: AtomicU64,
    recent: Mutex<VecDeque<HealEvent>>,
}

impl HealingPolicy {
    /// Create a new policy with zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total_heals: AtomicU64::new(0),
            size_clamps: AtomicU64::new(0),
            safe_defaults: AtomicU64::new(0),
            port_defaults: AtomicU64::new(0),
            loopback_hosts: AtomicU64::new(0),
            recent: Mutex::new(VecDeque::new()),
        }
    }

    /// Record a healing action applied by `symbol`.
    pub fn record(&self, symbol: &'static str, action: HealingAction) {
        if !action.is_heal() {
            return;
        }
        self.total_heals.fetch_add(1, Ordering::Relaxed);
        match action {
            HealingAction::ClampSize { .. } => {
                self.size_clamps.fetch_add(1, Ordering::Relaxed);
            }
            HealingAction::ReturnSafeDefault => {
                self.safe_defaults.fetch_add(1, Ordering::Relaxed);
            }
            HealingAction::DefaultPort => {
                self.port_defaults.fetch_add(1, Ordering::Relaxed);
            }
            HealingAction::LoopbackHost => {
                self.loopback_hosts.fetch_add(1, Ordering::Relaxed);
            }
            HealingAction::None => {}
        }

        let mut recent = self.recent.lock();
        if recent.len() == RECENT_EVENTS_CAPACITY {
            recent.pop_front();
        }
        recent.push_back(HealEvent { symbol, action });
    }

    /// Snapshot of the most recent heal events, oldest first.
    #[must_use]
    pub fn recent_events(&self) -> Vec<HealEvent> {
        self.recent.lock().iter().copied().collect()
    }

    /// Total number of heals applied so far.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total_heals.load(Ordering::Relaxed)
    }

    /// Counter values as `(name, value)` pairs, in a fixed order.
    #[must_use]
    pub fn counters(&self) -> [(&'static str, u64); 5] {
        [
            ("total_heals", self.total_heals.load(Ordering::Relaxed)),
            ("size_clamps", self.size_clamps.load(Ordering::Relaxed)),
            ("safe_defaults", self.safe_defaults.load(Ordering::Relaxed)),
            ("port_defaults", self.port_defaults.load(Ordering::Relaxed)),
            ("loopback_hosts", self.loopback_hosts.load(Ordering::Relaxed)),
        ]
    }
}

impl Default for HealingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_POLICY: HealingPolicy = HealingPolicy::new();

/// Access the global healing policy.
#[must_use]
pub fn global_healing_policy() -> &'static HealingPolicy {
    &GLOBAL_POLICY
}
