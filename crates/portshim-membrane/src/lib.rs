//! Runtime safety membrane for portshim.
//!
//! Sits between the `extern "C"` entry points in `portshim-abi` and the safe
//! implementations in `portshim-core`. It owns the two pieces of
//! process-wide state the shim has:
//!
//! - **Configuration** (`config`): the runtime mode (strict / hardened / off),
//!   read once from `PORTSHIM_MODE`.
//! - **Self-healing ledger** (`heal`): which repairs were applied to invalid
//!   caller input in hardened mode, as atomic counters plus a short ring of
//!   recent events.

#![deny(unsafe_code)]

pub mod config;
pub mod heal;

pub use config::{SafetyLevel, safety_level, set_safety_level};
pub use heal::{HealEvent, HealingAction, HealingPolicy, global_healing_policy};
