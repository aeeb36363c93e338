//! errno values set by the ABI layer.
//!
//! These numbers are shared by Linux, macOS and the BSDs.

/// Bad file descriptor.
pub const EBADF: i32 = 9;
/// Bad address.
pub const EFAULT: i32 = 14;
