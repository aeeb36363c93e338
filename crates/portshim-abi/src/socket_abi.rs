//! ABI layer for `socket_set_blocking`.

use std::ffi::c_int;

use portshim_core::errno;
use portshim_core::socket as socket_core;
use portshim_membrane::safety_level;

use crate::errno_abi::set_abi_errno;

/// Switch a descriptor between blocking (`blocking != 0`) and non-blocking
/// (`blocking == 0`) mode by toggling `O_NONBLOCK`.
///
/// Returns 0 on success, -1 with errno from `fcntl` on failure. A negative
/// `fd` fails with `EBADF` before any syscall unless validation is off.
#[cfg_attr(not(debug_assertions), unsafe(no_mangle))]
pub extern "C" fn socket_set_blocking(fd: c_int, blocking: c_int) -> c_int {
    if safety_level().validation_enabled() && !socket_core::valid_fd(fd) {
        set_abi_errno(errno::EBADF);
        return -1;
    }

    let Some(flags) = status_flags(fd) else {
        return -1;
    };
    let flags = socket_core::blocking_flags(flags, blocking != 0, libc::O_NONBLOCK);
    // SAFETY: F_SETFL takes an integer flag word.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } == -1 {
        return -1;
    }
    0
}

/// Whether `fd` has `O_NONBLOCK` set; `None` (errno set) if `fcntl` fails.
#[must_use]
pub fn socket_is_nonblocking(fd: c_int) -> Option<bool> {
    status_flags(fd).map(|flags| socket_core::is_nonblocking(flags, libc::O_NONBLOCK))
}

fn status_flags(fd: c_int) -> Option<c_int> {
    // SAFETY: F_GETFL takes no pointer argument.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL, 0) };
    (flags >= 0).then_some(flags)
}
