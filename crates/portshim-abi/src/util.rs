//! Pointer helpers shared by the ABI adapters.

use std::ffi::{CStr, c_char};

/// Borrow an optional C string argument.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub unsafe fn opt_cstr<'a>(ptr: *const c_char) -> Option<&'a CStr> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null, terminated per the caller contract.
    Some(unsafe { CStr::from_ptr(ptr) })
}

/// Bytes of an optional C string, without the terminator.
///
/// # Safety
///
/// Same contract as [`opt_cstr`].
pub unsafe fn opt_c_bytes<'a>(ptr: *const c_char) -> Option<&'a [u8]> {
    // SAFETY: forwarded caller contract.
    unsafe { opt_cstr(ptr) }.map(CStr::to_bytes)
}
