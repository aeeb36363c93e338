//! String functions.
//!
//! Implements the BSD `strlcpy` size-bounded copy. Strings are byte slices;
//! a string ends at its first NUL byte or at the end of the slice, whichever
//! comes first.

/// Length of the C string in `s`: bytes before the first NUL, or `s.len()`
/// if there is none.
#[inline]
pub fn strlen(s: &[u8]) -> usize {
    s.iter().position(|&b| b == 0).unwrap_or(s.len())
}

/// Size-bounded string copy (`strlcpy`).
///
/// Copies at most `dst.len() - 1` bytes of `src` into `dst` and always
/// NUL-terminates when `dst` is non-empty. Returns `strlen(src)`, so the copy
/// was truncated iff the return value is `>= dst.len()`.
///
/// An empty `dst` is left untouched. Bytes of `src` after its terminator are
/// never copied.
pub fn strlcpy(dst: &mut [u8], src: &[u8]) -> usize {
    let src_len = strlen(src);
    if dst.is_empty() {
        return src_len;
    }

    let copy_len = src_len.min(dst.len() - 1);
    dst[..copy_len].copy_from_slice(&src[..copy_len]);
    dst[copy_len] = 0;
    src_len
}

/// Returns true if a `strlcpy` into a buffer of `size` bytes that returned
/// `ret` was truncated.
#[inline]
pub const fn strlcpy_truncated(ret: usize, size: usize) -> bool {
    ret >= size
}
