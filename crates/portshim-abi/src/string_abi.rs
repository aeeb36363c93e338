//! ABI layer for `strlcpy`.
//!
//! The copy itself is `portshim_core::string::strlcpy`; this layer turns the
//! raw pointers into slices and handles the null-pointer cases.

use std::ffi::{CStr, c_char};
use std::{ptr, slice};

use portshim_core::errno;
use portshim_core::string as string_core;
use portshim_membrane::{HealingAction, global_healing_policy, safety_level};

use crate::errno_abi::set_abi_errno;

/// BSD `strlcpy`.
///
/// Copies at most `size - 1` bytes of `src` into `dst`, NUL-terminates when
/// `size > 0` and returns `strlen(src)`.
///
/// A null `src` returns 0: strict mode sets `EFAULT` and leaves `dst`
/// alone, hardened mode writes an empty string. A null `dst` with a
/// non-zero `size` is treated as `size == 0`.
#[cfg_attr(not(debug_assertions), unsafe(no_mangle))]
pub unsafe extern "C" fn strlcpy(dst: *mut c_char, src: *const c_char, size: usize) -> usize {
    let heals = safety_level().heals_enabled();

    if src.is_null() {
        if heals {
            if !dst.is_null() && size > 0 {
                // SAFETY: dst has at least one writable byte.
                unsafe { *dst = 0 };
            }
            global_healing_policy().record("strlcpy", HealingAction::ReturnSafeDefault);
        } else {
            set_abi_errno(errno::EFAULT);
        }
        return 0;
    }

    // SAFETY: src is a NUL-terminated string per the strlcpy contract.
    let src_bytes = unsafe { CStr::from_ptr(src) }.to_bytes();
    let src_len = src_bytes.len();

    let size = if dst.is_null() && size > 0 {
        if heals {
            global_healing_policy().record(
                "strlcpy",
                HealingAction::ClampSize {
                    requested: size,
                    clamped: 0,
                },
            );
        } else {
            set_abi_errno(errno::EFAULT);
        }
        0
    } else {
        size
    };
    if size == 0 {
        return src_len;
    }

    // SAFETY: dst is writable for size bytes and does not overlap src.
    let dst_buf = unsafe { slice::from_raw_parts_mut(dst.cast::<u8>(), size) };
    string_core::strlcpy(dst_buf, src_bytes)
}

/// [`strlcpy`] for Rust callers. `None` stands for a null pointer; a null
/// `dst` is passed with `null_dst_size` as its size, a buffer with its own
/// length.
pub fn strlcpy_checked(dst: Option<&mut [u8]>, null_dst_size: usize, src: Option<&CStr>) -> usize {
    let src = src.map_or(ptr::null(), CStr::as_ptr);
    match dst {
        // SAFETY: buf is writable for buf.len() bytes and src is terminated.
        Some(buf) => unsafe { strlcpy(buf.as_mut_ptr().cast(), src, buf.len()) },
        // SAFETY: a null dst is one of the inputs strlcpy handles itself.
        None => unsafe { strlcpy(ptr::null_mut(), src, null_dst_size) },
    }
}
