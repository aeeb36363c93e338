//! Socket blocking-mode helpers.
//!
//! The flag arithmetic behind `socket_set_blocking`. The `fcntl` calls that
//! read and write the descriptor status flags live in the ABI crate, which
//! passes the platform's `O_NONBLOCK` bit in.

/// Returns `true` if `fd` could name an open descriptor.
#[inline]
pub fn valid_fd(fd: i32) -> bool {
    fd >= 0
}

/// New status flags for a descriptor currently at `current`: `nonblock_bit`
/// cleared when `blocking`, set otherwise. Every other bit is preserved.
#[inline]
#[must_use]
pub const fn blocking_flags(current: i32, blocking: bool, nonblock_bit: i32) -> i32 {
    if blocking {
        current & !nonblock_bit
    } else {
        current | nonblock_bit
    }
}

/// Returns `true` if `flags` has `nonblock_bit` set.
#[inline]
#[must_use]
pub const fn is_nonblocking(flags: i32, nonblock_bit: i32) -> bool {
    flags & nonblock_bit != 0
}
