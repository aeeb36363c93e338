//! Fixture case execution.
//!
//! `strlcpy` and `socket_set_blocking` run through the C boundary functions
//! of `portshim-abi` on owned buffers and a scratch UDP socket, with the
//! process mode pinned to the case's mode. `getaddrinfo` runs the same
//! repair path on the core resolver, fed the host and service tables carried
//! in the fixture. Each result is rendered as a single comparable string.

use std::ffi::{CString, c_int};
use std::net::{Ipv4Addr, UdpSocket};
use std::os::fd::AsRawFd;

use parking_lot::Mutex;
use portshim_abi::errno_abi::{abi_errno, set_abi_errno};
use portshim_abi::socket_abi::{socket_is_nonblocking, socket_set_blocking};
use portshim_abi::string_abi::strlcpy_checked;
use portshim_core::resolv::{self, AddrHints, GaiError, Repair, ResolverFiles};
use portshim_core::string;
use portshim_core::time::{Timeval, Timezone};
use portshim_membrane::{HealingAction, SafetyLevel, global_healing_policy, set_safety_level};
use serde_json::Value;

use crate::HarnessError;

/// Byte used to pre-fill destination buffers so untouched bytes are visible.
const FILL: u8 = b'#';

// The mode and the healing ledger are process-wide.
static EXEC_LOCK: Mutex<()> = Mutex::new(());

/// Result of running one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Rendered output, compared against `expected_output`.
    pub output: String,
    /// errno left behind by the call (0 when untouched).
    pub errno: i32,
    /// Healing actions applied, by name.
    pub heals: Vec<&'static str>,
}

impl Execution {
    fn ok(output: String) -> Self {
        Self {
            output,
            errno: 0,
            heals: Vec::new(),
        }
    }
}

/// Execute `function` with `inputs` under `level`.
///
/// The process mode is pinned to `level` for the duration of the call and
/// restored afterwards. Heals are the entries the call added to the global
/// healing ledger.
pub fn execute_fixture_case(
    function: &str,
    inputs: &Value,
    level: SafetyLevel,
) -> Result<Execution, HarnessError> {
    let _serial = EXEC_LOCK.lock();
    let previous = set_safety_level(level);
    let before = global_healing_policy().total();

    let result = dispatch(function, inputs, level);

    let heals = heals_since(before);
    if let Some(previous) = previous {
        set_safety_level(previous);
    }
    let mut exec = result?;
    exec.heals = heals;
    Ok(exec)
}

fn dispatch(function: &str, inputs: &Value, level: SafetyLevel) -> Result<Execution, HarnessError> {
    match function {
        "strlcpy" => exec_strlcpy(inputs),
        "gettimeofday" => Ok(exec_gettimeofday()),
        "timeval_from_timespec" => exec_timeval_from_timespec(inputs),
        "getaddrinfo" => exec_getaddrinfo(inputs, level),
        "gai_strerror" => {
            let code = req_i64(inputs, "code")?;
            let code = i32::try_from(code)
                .map_err(|_| HarnessError::bad_input("code", "out of i32 range"))?;
            Ok(Execution::ok(resolv::gai_strerror(code).to_string_lossy().into_owned()))
        }
        "socket_set_blocking" => exec_socket_set_blocking(inputs),
        other => Err(HarnessError::UnsupportedFunction(other.to_string())),
    }
}

/// Names of the ledger entries recorded after the ledger total was `before`.
fn heals_since(before: u64) -> Vec<&'static str> {
    let policy = global_healing_policy();
    let fresh = usize::try_from(policy.total().saturating_sub(before)).unwrap_or(usize::MAX);
    let events = policy.recent_events();
    events[events.len().saturating_sub(fresh)..]
        .iter()
        .map(|event| event.action.name())
        .collect()
}

fn exec_strlcpy(inputs: &Value) -> Result<Execution, HarnessError> {
    let size = usize::try_from(req_i64(inputs, "size")?)
        .map_err(|_| HarnessError::bad_input("size", "must be non-negative"))?;
    let src = opt_str(inputs, "src")?
        .map(CString::new)
        .transpose()
        .map_err(|_| HarnessError::bad_input("src", "contains NUL"))?;
    let dst_null = opt_bool(inputs, "dst_null")?.unwrap_or(false);

    let mut dst = vec![FILL; if dst_null { 0 } else { size }];
    set_abi_errno(0);
    let ret = if dst_null {
        strlcpy_checked(None, size, src.as_deref())
    } else {
        strlcpy_checked(Some(&mut dst), 0, src.as_deref())
    };
    let errno = abi_errno();

    let shown = &dst[..string::strlen(&dst)];
    Ok(Execution {
        output: format!("ret={ret} dst={:?}", String::from_utf8_lossy(shown)),
        errno,
        heals: Vec::new(),
    })
}

fn exec_gettimeofday() -> Execution {
    let tv = Timeval::now();
    let tz = Timezone::default();
    let state = if tv.is_normalized() && tv.tv_sec > 0 {
        "normalized"
    } else {
        "denormal"
    };
    Execution::ok(format!("{state} tz={}/{}", tz.tz_minuteswest, tz.tz_dsttime))
}

fn exec_timeval_from_timespec(inputs: &Value) -> Result<Execution, HarnessError> {
    let tv = Timeval::from_timespec(req_i64(inputs, "sec")?, req_i64(inputs, "nsec")?);
    Ok(Execution::ok(format!("tv_sec={} tv_usec={}", tv.tv_sec, tv.tv_usec)))
}

fn exec_getaddrinfo(inputs: &Value, level: SafetyLevel) -> Result<Execution, HarnessError> {
    let node = opt_str(inputs, "node")?;
    let service = opt_str(inputs, "service")?;
    let hints = match inputs.get("hints") {
        None | Some(Value::Null) => None,
        Some(h) => Some(AddrHints {
            flags: opt_i32(h, "flags")?,
            family: opt_i32(h, "family")?,
            socktype: opt_i32(h, "socktype")?,
            protocol: opt_i32(h, "protocol")?,
        }),
    };
    let files = ResolverFiles::new(
        opt_str(inputs, "hosts")?.unwrap_or_default(),
        opt_str(inputs, "services")?.unwrap_or_default(),
    );

    let node = node.map(str::as_bytes);
    let service = service.map(str::as_bytes);
    let result = if level.heals_enabled() {
        resolv::getaddrinfo_repaired(&files, node, service, hints.as_ref(), |r| {
            let action = match r {
                Repair::DefaultPort => HealingAction::DefaultPort,
                Repair::LoopbackHost => HealingAction::LoopbackHost,
            };
            global_healing_policy().record("getaddrinfo", action);
        })
    } else {
        resolv::getaddrinfo(&files, node, service, hints.as_ref())
    };

    let output = match result {
        Ok(ai) => {
            let mut out = format!(
                "family={} socktype={} protocol={} addr={}",
                ai.family, ai.socktype, ai.protocol, ai.addr
            );
            if let Some(canon) = ai.canonname {
                out.push_str(&format!(" canon={canon}"));
            }
            out
        }
        Err(err) => eai_name(err).to_string(),
    };
    Ok(Execution::ok(output))
}

/// Toggles `O_NONBLOCK` on a scratch UDP socket, or on the `fd` given in
/// the inputs, and reports the flag as read back with `fcntl`.
fn exec_socket_set_blocking(inputs: &Value) -> Result<Execution, HarnessError> {
    let blocking = opt_bool(inputs, "blocking")?
        .ok_or_else(|| HarnessError::bad_input("blocking", "required boolean"))?;
    let start_nonblocking = opt_bool(inputs, "nonblocking")?.unwrap_or(false);

    let scratch;
    let fd = match inputs.get("fd") {
        None | Some(Value::Null) => {
            scratch = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).map_err(HarnessError::Socket)?;
            scratch
                .set_nonblocking(start_nonblocking)
                .map_err(HarnessError::Socket)?;
            scratch.as_raw_fd()
        }
        Some(_) => opt_i32(inputs, "fd")?,
    };

    set_abi_errno(0);
    if socket_set_blocking(fd, c_int::from(blocking)) != 0 {
        return Ok(Execution {
            output: String::from("ret=-1"),
            errno: abi_errno(),
            heals: Vec::new(),
        });
    }
    let nonblocking = socket_is_nonblocking(fd)
        .ok_or_else(|| HarnessError::Socket(std::io::Error::last_os_error()))?;
    Ok(Execution::ok(format!("ret=0 nonblocking={nonblocking}")))
}

/// Symbolic name for an `EAI_*` error, as written in fixtures.
#[must_use]
pub const fn eai_name(err: GaiError) -> &'static str {
    match err {
        GaiError::BadFlags => "EAI_BADFLAGS",
        GaiError::NoName => "EAI_NONAME",
        GaiError::Again => "EAI_AGAIN",
        GaiError::Fail => "EAI_FAIL",
        GaiError::NoData => "EAI_NODATA",
        GaiError::Family => "EAI_FAMILY",
        GaiError::SockType => "EAI_SOCKTYPE",
        GaiError::Service => "EAI_SERVICE",
        GaiError::Memory => "EAI_MEMORY",
        GaiError::System => "EAI_SYSTEM",
        GaiError::Overflow => "EAI_OVERFLOW",
    }
}

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

fn req_i64(inputs: &Value, field: &'static str) -> Result<i64, HarnessError> {
    inputs
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| HarnessError::bad_input(field, "required integer"))
}

/// Integer field; absent or null reads as 0.
fn opt_i32(inputs: &Value, field: &'static str) -> Result<i32, HarnessError> {
    match inputs.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| HarnessError::bad_input(field, "expected i32")),
    }
}

/// String field; absent or null reads as `None`.
fn opt_str<'a>(inputs: &'a Value, field: &'static str) -> Result<Option<&'a str>, HarnessError> {
    match inputs.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(HarnessError::bad_input(field, "expected string or null")),
    }
}

fn opt_bool(inputs: &Value, field: &'static str) -> Result<Option<bool>, HarnessError> {
    match inputs.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| HarnessError::bad_input(field, "expected boolean")),
    }
}
