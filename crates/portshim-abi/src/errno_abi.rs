//! errno access for the ABI layer.
//!
//! The shim runs next to the host libc, so errno is the host's thread-local
//! errno, reached through its accessor.

use std::ffi::c_int;

#[inline]
fn errno_location() -> *mut c_int {
    // SAFETY: the accessor takes no arguments and returns this thread's errno slot.
    unsafe {
        #[cfg(target_os = "linux")]
        {
            libc::__errno_location()
        }
        #[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))]
        {
            libc::__errno()
        }
        #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
        {
            libc::__error()
        }
    }
}

/// Set the calling thread's errno.
#[inline]
pub fn set_abi_errno(val: c_int) {
    // SAFETY: errno_location returns a valid, thread-local pointer.
    unsafe { *errno_location() = val };
}

/// Read the calling thread's errno.
#[inline]
#[must_use]
pub fn abi_errno() -> c_int {
    // SAFETY: errno_location returns a valid, thread-local pointer.
    unsafe { *errno_location() }
}
