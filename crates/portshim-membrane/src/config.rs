//! Runtime mode configuration.
//!
//! The mode comes from the `PORTSHIM_MODE` environment variable:
//! - `strict` (default): the shim behaves exactly like the function it stands
//!   in for. Invalid input produces the documented error return and errno.
//! - `hardened`: invalid input is repaired deterministically (empty string
//!   for a null source, port 0 for an unknown service, loopback for an
//!   unresolvable host) and every repair is recorded in the healing ledger.
//! - `off`: no validation. Reachable through the API only, for benchmarks.

use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable holding the runtime mode.
pub const MODE_ENV: &str = "PORTSHIM_MODE";

/// Runtime operating mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SafetyLevel {
    /// Behave like the emulated libc function, errors included.
    #[default]
    Strict = 1,
    /// Repair invalid input instead of failing, and record the repair.
    Hardened = 2,
    /// No validation. Benchmark baseline only.
    Off = 3,
}

impl SafetyLevel {
    /// Parse a mode name, ignoring case. Unknown names are `Strict`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "hardened" | "repair" | "full" => Self::Hardened,
            "off" | "none" => Self::Off,
            _ => Self::Strict,
        }
    }

    /// Parse the environment value. `off` is never taken from the
    /// environment; it falls back to `Strict`.
    fn from_env_value(raw: &str) -> Self {
        match Self::from_str_loose(raw) {
            Self::Off => Self::Strict,
            level => level,
        }
    }

    const fn from_slot(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Strict),
            2 => Some(Self::Hardened),
            3 => Some(Self::Off),
            _ => None,
        }
    }

    /// Returns true if invalid input should be repaired.
    #[must_use]
    pub const fn heals_enabled(self) -> bool {
        matches!(self, Self::Hardened)
    }

    /// Returns true if input validation is active.
    #[must_use]
    pub const fn validation_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Lowercase mode name, as accepted by [`SafetyLevel::from_str_loose`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Hardened => "hardened",
            Self::Off => "off",
        }
    }
}

// Holds a `SafetyLevel` discriminant once resolved.
static MODE_SLOT: AtomicU8 = AtomicU8::new(SLOT_EMPTY);

const SLOT_EMPTY: u8 = 0;
const SLOT_LOADING: u8 = u8::MAX;

/// The process-wide mode. The environment is read on the first call only.
///
/// Calls racing with that first read see `Strict` instead of waiting.
#[must_use]
pub fn safety_level() -> SafetyLevel {
    if let Some(level) = SafetyLevel::from_slot(MODE_SLOT.load(Ordering::Acquire)) {
        return level;
    }
    if MODE_SLOT
        .compare_exchange(SLOT_EMPTY, SLOT_LOADING, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return SafetyLevel::from_slot(MODE_SLOT.load(Ordering::Acquire)).unwrap_or_default();
    }

    let level = std::env::var(MODE_ENV)
        .map(|v| SafetyLevel::from_env_value(&v))
        .unwrap_or_default();
    // A concurrent set_safety_level wins over the environment.
    let _ = MODE_SLOT.compare_exchange(
        SLOT_LOADING,
        level as u8,
        Ordering::AcqRel,
        Ordering::Acquire,
    );
    SafetyLevel::from_slot(MODE_SLOT.load(Ordering::Acquire)).unwrap_or(level)
}

/// Pin the process-wide mode, bypassing the environment.
///
/// Returns the previous mode, or `None` if none had been resolved yet.
/// Used by the conformance harness, tests and benches that run several
/// modes in one process.
pub fn set_safety_level(level: SafetyLevel) -> Option<SafetyLevel> {
    SafetyLevel::from_slot(MODE_SLOT.swap(level as u8, Ordering::AcqRel))
}
