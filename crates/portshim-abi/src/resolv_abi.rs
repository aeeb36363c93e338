//! ABI layer for the resolver fallbacks (`<netdb.h>`).
//!
//! - `getaddrinfo`: single IPv4 result, numeric or host-file host, numeric or
//!   service-file port (see `portshim_core::resolv`)
//! - `freeaddrinfo`
//! - `gai_strerror`
//!
//! Error codes returned here are the host's own `EAI_*` values, so callers
//! can compare them against their `<netdb.h>`; `gai_strerror` from this
//! module reads the same values back.

use std::ffi::{CStr, CString, c_char, c_int};
use std::mem::size_of;
use std::ptr;

use portshim_core::resolv::{self, AddrHints, AddrInfo, GaiError, Repair, ResolverFiles};
use portshim_membrane::{HealingAction, global_healing_policy, safety_level};

use crate::util::opt_c_bytes;

/// Flag bit that no known `AI_*` value uses; marks untranslatable host flags.
const UNKNOWN_FLAG: i32 = 1 << 30;

const FLAG_MAP: [(c_int, i32); 7] = [
    (libc::AI_PASSIVE, resolv::AI_PASSIVE),
    (libc::AI_CANONNAME, resolv::AI_CANONNAME),
    (libc::AI_NUMERICHOST, resolv::AI_NUMERICHOST),
    (libc::AI_V4MAPPED, resolv::AI_V4MAPPED),
    (libc::AI_ALL, resolv::AI_ALL),
    (libc::AI_ADDRCONFIG, resolv::AI_ADDRCONFIG),
    (libc::AI_NUMERICSERV, resolv::AI_NUMERICSERV),
];

#[cfg(all(target_os = "linux", target_env = "gnu"))]
const NATIVE_EAI_NODATA: c_int = libc::EAI_NODATA;
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
const NATIVE_EAI_NODATA: c_int = libc::EAI_NONAME;

/// Core errors and the host's `EAI_*` values. `NoName` comes before `NoData`
/// so that where both share a value it reads back as `NoName`.
const EAI_MAP: [(GaiError, c_int); 11] = [
    (GaiError::BadFlags, libc::EAI_BADFLAGS),
    (GaiError::NoName, libc::EAI_NONAME),
    (GaiError::NoData, NATIVE_EAI_NODATA),
    (GaiError::Again, libc::EAI_AGAIN),
    (GaiError::Fail, libc::EAI_FAIL),
    (GaiError::Family, libc::EAI_FAMILY),
    (GaiError::SockType, libc::EAI_SOCKTYPE),
    (GaiError::Service, libc::EAI_SERVICE),
    (GaiError::Memory, libc::EAI_MEMORY),
    (GaiError::System, libc::EAI_SYSTEM),
    (GaiError::Overflow, libc::EAI_OVERFLOW),
];

fn native_code(err: GaiError) -> c_int {
    EAI_MAP
        .iter()
        .find(|(e, _)| *e == err)
        .map_or(libc::EAI_FAIL, |&(_, code)| code)
}

fn from_native_code(code: c_int) -> Option<GaiError> {
    EAI_MAP.iter().find(|(_, c)| *c == code).map(|&(err, _)| err)
}

fn native_strerror(code: c_int) -> &'static CStr {
    match from_native_code(code) {
        Some(err) => err.message(),
        None if code == 0 => resolv::gai_strerror(0),
        None => resolv::gai_strerror(c_int::MIN),
    }
}

/// Translate caller hints (host header values) into core hints.
fn hints_from_libc(h: &libc::addrinfo) -> AddrHints {
    let mut flags = 0;
    let mut rest = h.ai_flags;
    for (host_bit, core_bit) in FLAG_MAP {
        if h.ai_flags & host_bit != 0 {
            flags |= core_bit;
            rest &= !host_bit;
        }
    }
    if rest != 0 {
        flags |= UNKNOWN_FLAG;
    }

    let family = match h.ai_family {
        libc::AF_UNSPEC => resolv::AF_UNSPEC,
        libc::AF_INET => resolv::AF_INET,
        _ => resolv::AF_INET6,
    };
    let socktype = match h.ai_socktype {
        0 => 0,
        libc::SOCK_STREAM => resolv::SOCK_STREAM,
        libc::SOCK_DGRAM => resolv::SOCK_DGRAM,
        libc::SOCK_RAW => resolv::SOCK_RAW,
        _ => -1,
    };

    AddrHints {
        flags,
        family,
        socktype,
        protocol: h.ai_protocol,
    }
}

/// Run the core lookup; in hardened mode failures that can be repaired are,
/// and each repair is recorded in the healing ledger.
fn resolve(
    node: Option<&[u8]>,
    service: Option<&[u8]>,
    hints: Option<&AddrHints>,
    repair: bool,
) -> Result<AddrInfo, GaiError> {
    let files = ResolverFiles::from_env();
    if !repair {
        return resolv::getaddrinfo(&files, node, service, hints);
    }
    resolv::getaddrinfo_repaired(&files, node, service, hints, |r| {
        let action = match r {
            Repair::DefaultPort => HealingAction::DefaultPort,
            Repair::LoopbackHost => HealingAction::LoopbackHost,
        };
        global_healing_policy().record("getaddrinfo", action);
    })
}

/// Allocate a C `addrinfo` node (and its `sockaddr_in`) for `info`.
///
/// `ai_flags`, `ai_socktype` and `ai_protocol` are copied from the caller's
/// raw hints so they come back exactly as passed in.
fn build_addrinfo(info: &AddrInfo, raw_hints: Option<&libc::addrinfo>) -> *mut libc::addrinfo {
    let (flags, socktype, protocol) = raw_hints
        .map(|h| (h.ai_flags, h.ai_socktype, h.ai_protocol))
        .unwrap_or((0, 0, 0));

    // SAFETY: sockaddr_in is plain data; all-zero is a valid value.
    let mut sin: libc::sockaddr_in = unsafe { std::mem::zeroed() };
    sin.sin_family = libc::AF_INET as libc::sa_family_t;
    sin.sin_port = info.addr.port().to_be();
    sin.sin_addr = libc::in_addr {
        s_addr: u32::from_ne_bytes(info.addr.ip().octets()),
    };
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    {
        sin.sin_len = size_of::<libc::sockaddr_in>() as u8;
    }
    let sockaddr_ptr = Box::into_raw(Box::new(sin)).cast::<libc::sockaddr>();

    let canonname = info
        .canonname
        .as_deref()
        .and_then(|name| CString::new(name).ok())
        .map_or(ptr::null_mut(), CString::into_raw);

    // SAFETY: addrinfo is plain data; all-zero (null pointers) is a valid value.
    let mut ai: libc::addrinfo = unsafe { std::mem::zeroed() };
    ai.ai_flags = flags;
    ai.ai_family = libc::AF_INET;
    ai.ai_socktype = socktype;
    ai.ai_protocol = protocol;
    ai.ai_addrlen = size_of::<libc::sockaddr_in>() as libc::socklen_t;
    ai.ai_addr = sockaddr_ptr;
    ai.ai_canonname = canonname;
    ai.ai_next = ptr::null_mut();
    Box::into_raw(Box::new(ai))
}

/// POSIX `getaddrinfo`, restricted to a single `AF_INET` result.
///
/// Returns 0 and stores a one-node list in `*res`, or an `EAI_*` code with
/// `*res` set to null. A null `res` fails with `EAI_FAIL`.
#[cfg_attr(not(debug_assertions), unsafe(no_mangle))]
pub unsafe extern "C" fn getaddrinfo(
    node: *const c_char,
    service: *const c_char,
    hints: *const libc::addrinfo,
    res: *mut *mut libc::addrinfo,
) -> c_int {
    if res.is_null() {
        return libc::EAI_FAIL;
    }
    // SAFETY: res is non-null and writable by contract.
    unsafe { *res = ptr::null_mut() };

    let repair = safety_level().heals_enabled();

    // SAFETY: optional C-string arguments follow the getaddrinfo contract.
    let node = unsafe { opt_c_bytes(node) };
    // SAFETY: optional C-string arguments follow the getaddrinfo contract.
    let service = unsafe { opt_c_bytes(service) };
    let raw_hints = if hints.is_null() {
        None
    } else {
        // SAFETY: non-null hints point to a caller-owned addrinfo.
        Some(unsafe { &*hints })
    };
    let core_hints = raw_hints.map(hints_from_libc);

    match resolve(node, service, core_hints.as_ref(), repair) {
        Ok(info) => {
            // SAFETY: res is non-null and writable.
            unsafe { *res = build_addrinfo(&info, raw_hints) };
            0
        }
        Err(err) => native_code(err),
    }
}

/// POSIX `freeaddrinfo`. Frees a list produced by [`getaddrinfo`]; null is
/// a no-op.
#[cfg_attr(not(debug_assertions), unsafe(no_mangle))]
pub unsafe extern "C" fn freeaddrinfo(mut res: *mut libc::addrinfo) {
    while !res.is_null() {
        // SAFETY: res is a node allocated by build_addrinfo.
        let node = unsafe { Box::from_raw(res) };
        if !node.ai_addr.is_null() && node.ai_family == libc::AF_INET {
            // SAFETY: ai_addr was allocated as a boxed sockaddr_in by build_addrinfo.
            drop(unsafe { Box::from_raw(node.ai_addr.cast::<libc::sockaddr_in>()) });
        }
        if !node.ai_canonname.is_null() {
            // SAFETY: ai_canonname came from CString::into_raw.
            drop(unsafe { CString::from_raw(node.ai_canonname) });
        }
        res = node.ai_next;
    }
}

/// POSIX `gai_strerror`. Never returns null.
#[cfg_attr(not(debug_assertions), unsafe(no_mangle))]
pub unsafe extern "C" fn gai_strerror(errcode: c_int) -> *const c_char {
    native_strerror(errcode).as_ptr()
}
