// extern "C" entry points take raw pointers from C callers and document their
// contracts in SAFETY comments at each dereference.
#![allow(clippy::missing_safety_doc)]
//! # portshim-abi
//!
//! `extern "C"` boundary for portshim. Builds a `cdylib` exposing the
//! fallback symbols with their C signatures:
//!
//! ```text
//! strlcpy  gettimeofday  getaddrinfo  freeaddrinfo  gai_strerror  socket_set_blocking
//! ```
//!
//! ```text
//! C caller -> ABI entry (this crate) -> membrane mode check -> core impl -> return
//! ```
//!
//! Symbols are unmangled in release builds only. Debug builds (and therefore
//! `cargo test`) keep Rust names so a test binary never shadows the host
//! libc's own implementations.
//!
//! In **strict** mode invalid input produces the error return and errno the
//! emulated function documents. In **hardened** mode it is repaired and the
//! repair is recorded in the membrane's healing ledger.

pub mod errno_abi;
#[cfg(feature = "getaddrinfo")]
pub mod resolv_abi;
pub mod socket_abi;
#[cfg(feature = "strlcpy")]
pub mod string_abi;
#[cfg(feature = "gettimeofday")]
pub mod time_abi;
pub mod util;
