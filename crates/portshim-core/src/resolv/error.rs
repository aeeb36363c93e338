//! `getaddrinfo` error codes and their messages.

use std::ffi::CStr;

/// EAI error codes (glibc values).
pub const EAI_BADFLAGS: i32 = -1;
pub const EAI_NONAME: i32 = -2;
pub const EAI_AGAIN: i32 = -3;
pub const EAI_FAIL: i32 = -4;
pub const EAI_NODATA: i32 = -5;
pub const EAI_FAMILY: i32 = -6;
pub const EAI_SOCKTYPE: i32 = -7;
pub const EAI_SERVICE: i32 = -8;
pub const EAI_MEMORY: i32 = -10;
pub const EAI_SYSTEM: i32 = -11;
pub const EAI_OVERFLOW: i32 = -12;

/// Legacy `h_errno` values reported by `gethostbyname`-style lookups.
pub const HOST_NOT_FOUND: i32 = 1;
pub const TRY_AGAIN: i32 = 2;
pub const NO_RECOVERY: i32 = 3;
pub const NO_DATA: i32 = 4;

const UNKNOWN_MESSAGE: &CStr = c"Unknown getaddrinfo error";

/// Failure of a `getaddrinfo` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum GaiError {
    #[error("Invalid value for ai_flags")]
    BadFlags,
    #[error("Name or service not known")]
    NoName,
    #[error("Temporary failure in name resolution")]
    Again,
    #[error("Non-recoverable failure in name resolution")]
    Fail,
    #[error("No address associated with hostname")]
    NoData,
    #[error("ai_family not supported")]
    Family,
    #[error("ai_socktype not supported")]
    SockType,
    #[error("Servname not supported for ai_socktype")]
    Service,
    #[error("Memory allocation failure")]
    Memory,
    #[error("System error")]
    System,
    #[error("Argument buffer overflow")]
    Overflow,
}

impl GaiError {
    /// Every variant, in code order.
    pub const ALL: [Self; 11] = [
        Self::BadFlags,
        Self::NoName,
        Self::Again,
        Self::Fail,
        Self::NoData,
        Self::Family,
        Self::SockType,
        Self::Service,
        Self::Memory,
        Self::System,
        Self::Overflow,
    ];

    /// The integer code returned through the C ABI.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::BadFlags => EAI_BADFLAGS,
            Self::NoName => EAI_NONAME,
            Self::Again => EAI_AGAIN,
            Self::Fail => EAI_FAIL,
            Self::NoData => EAI_NODATA,
            Self::Family => EAI_FAMILY,
            Self::SockType => EAI_SOCKTYPE,
            Self::Service => EAI_SERVICE,
            Self::Memory => EAI_MEMORY,
            Self::System => EAI_SYSTEM,
            Self::Overflow => EAI_OVERFLOW,
        }
    }

    /// Inverse of [`GaiError::code`].
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            EAI_BADFLAGS => Some(Self::BadFlags),
            EAI_NONAME => Some(Self::NoName),
            EAI_AGAIN => Some(Self::Again),
            EAI_FAIL => Some(Self::Fail),
            EAI_NODATA => Some(Self::NoData),
            EAI_FAMILY => Some(Self::Family),
            EAI_SOCKTYPE => Some(Self::SockType),
            EAI_SERVICE => Some(Self::Service),
            EAI_MEMORY => Some(Self::Memory),
            EAI_SYSTEM => Some(Self::System),
            EAI_OVERFLOW => Some(Self::Overflow),
            _ => None,
        }
    }

    /// Map a legacy `h_errno` value onto the EAI set.
    #[must_use]
    pub const fn from_h_errno(h_errno: i32) -> Self {
        match h_errno {
            HOST_NOT_FOUND => Self::NoName,
            TRY_AGAIN => Self::Again,
            NO_DATA => Self::NoData,
            _ => Self::Fail,
        }
    }

    /// NUL-terminated message, identical to the `Display` text.
    #[must_use]
    pub const fn message(self) -> &'static CStr {
        match self {
            Self::BadFlags => c"Invalid value for ai_flags",
            Self::NoName => c"Name or service not known",
            Self::Again => c"Temporary failure in name resolution",
            Self::Fail => c"Non-recoverable failure in name resolution",
            Self::NoData => c"No address associated with hostname",
            Self::Family => c"ai_family not supported",
            Self::SockType => c"ai_socktype not supported",
            Self::Service => c"Servname not supported for ai_socktype",
            Self::Memory => c"Memory allocation failure",
            Self::System => c"System error",
            Self::Overflow => c"Argument buffer overflow",
        }
    }
}

/// Message for any `getaddrinfo` return value (`gai_strerror`).
///
/// Total over `i32`: 0 is "Success", unknown codes get a generic message.
#[must_use]
pub fn gai_strerror(code: i32) -> &'static CStr {
    if code == 0 {
        return c"Success";
    }
    match GaiError::from_code(code) {
        Some(err) => err.message(),
        None => UNKNOWN_MESSAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for err in GaiError::ALL {
            assert_eq!(GaiError::from_code(err.code()), Some(err));
        }
        assert_eq!(GaiError::from_code(0), None);
        assert_eq!(GaiError::from_code(-9), None);
    }

    #[test]
    fn display_matches_c_message() {
        for err in GaiError::ALL {
            assert_eq!(err.to_string().as_bytes(), err.message().to_bytes());
        }
    }

    #[test]
    fn strerror_success_and_unknown() {
        assert_eq!(gai_strerror(0), c"Success");
        assert_eq!(gai_strerror(12345), c"Unknown getaddrinfo error");
        assert_eq!(gai_strerror(i32::MIN), c"Unknown getaddrinfo error");
        assert_eq!(gai_strerror(EAI_NONAME), c"Name or service not known");
    }

    #[test]
    fn h_errno_mapping() {
        assert_eq!(GaiError::from_h_errno(HOST_NOT_FOUND), GaiError::NoName);
        assert_eq!(GaiError::from_h_errno(TRY_AGAIN), GaiError::Again);
        assert_eq!(GaiError::from_h_errno(NO_RECOVERY), GaiError::Fail);
        assert_eq!(GaiError::from_h_errno(NO_DATA), GaiError::NoData);
        assert_eq!(GaiError::from_h_errno(77), GaiError::Fail);
    }
}
