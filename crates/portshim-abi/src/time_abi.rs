//! ABI layer for `gettimeofday`.
//!
//! The clock is read with `clock_gettime(CLOCK_REALTIME)` via `libc`; the
//! conversion to microseconds is `portshim_core::time`.

use std::ffi::c_int;

use portshim_core::errno;
use portshim_core::time::{Timeval, Timezone};

use crate::errno_abi::set_abi_errno;

/// `struct timezone`. `libc` leaves it opaque, so it is declared here.
#[allow(non_camel_case_types)]
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct timezone {
    pub tz_minuteswest: c_int,
    pub tz_dsttime: c_int,
}

/// POSIX `gettimeofday`.
///
/// Returns -1 with `EFAULT` when `tv` is null. A non-null `tz` is always
/// zero-filled.
#[cfg_attr(not(debug_assertions), unsafe(no_mangle))]
pub unsafe extern "C" fn gettimeofday(tv: *mut libc::timeval, tz: *mut timezone) -> c_int {
    if tv.is_null() {
        set_abi_errno(errno::EFAULT);
        return -1;
    }

    // SAFETY: timespec is plain data; all-zero is a valid value.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    // SAFETY: ts is a valid, writable timespec.
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) } != 0 {
        // errno already set by clock_gettime.
        return -1;
    }
    let now = Timeval::from_timespec(ts.tv_sec as i64, ts.tv_nsec as i64);

    // SAFETY: tv is non-null and writable per the gettimeofday contract.
    unsafe {
        (*tv).tv_sec = now.tv_sec as libc::time_t;
        (*tv).tv_usec = now.tv_usec as libc::suseconds_t;
    }

    if !tz.is_null() {
        let zone = Timezone::default();
        // SAFETY: tz is non-null and writable per the gettimeofday contract.
        unsafe {
            (*tz).tz_minuteswest = zone.tz_minuteswest;
            (*tz).tz_dsttime = zone.tz_dsttime;
        }
    }
    0
}
