//! Name-to-address resolution (`<netdb.h>` subset).
//!
//! A deliberately small `getaddrinfo`: one IPv4 (`AF_INET`) result per call,
//! resolved from a numeric address or the host file, with the port taken from
//! a numeric service or the service file. There is no DNS client here.

pub mod error;
pub mod files;
pub mod inet;

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4};

pub use error::{GaiError, gai_strerror};
pub use files::{HOSTS_ENV, HostEntry, ResolverFiles, SERVICES_ENV};

/// Address families.
pub const AF_UNSPEC: i32 = 0;
pub const AF_INET: i32 = 2;
pub const AF_INET6: i32 = 10;

/// Socket types.
pub const SOCK_STREAM: i32 = 1;
pub const SOCK_DGRAM: i32 = 2;
pub const SOCK_RAW: i32 = 3;

/// Protocols.
pub const IPPROTO_TCP: i32 = 6;
pub const IPPROTO_UDP: i32 = 17;

/// `ai_flags` bits (glibc values).
pub const AI_PASSIVE: i32 = 0x0001;
pub const AI_CANONNAME: i32 = 0x0002;
pub const AI_NUMERICHOST: i32 = 0x0004;
pub const AI_V4MAPPED: i32 = 0x0008;
pub const AI_ALL: i32 = 0x0010;
pub const AI_ADDRCONFIG: i32 = 0x0020;
pub const AI_NUMERICSERV: i32 = 0x0400;

/// Every flag bit this resolver accepts. `AI_V4MAPPED`, `AI_ALL` and
/// `AI_ADDRCONFIG` are accepted and have no effect on an IPv4-only lookup.
pub const AI_KNOWN_MASK: i32 = AI_PASSIVE
    | AI_CANONNAME
    | AI_NUMERICHOST
    | AI_V4MAPPED
    | AI_ALL
    | AI_ADDRCONFIG
    | AI_NUMERICSERV;

/// Lookup hints (the input half of `struct addrinfo`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddrHints {
    pub flags: i32,
    pub family: i32,
    pub socktype: i32,
    pub protocol: i32,
}

impl AddrHints {
    /// Hints for an IPv4 lookup of the given socket type.
    #[must_use]
    pub const fn inet(socktype: i32) -> Self {
        Self {
            flags: 0,
            family: AF_INET,
            socktype,
            protocol: 0,
        }
    }

    /// Same hints with `flags` replaced.
    #[must_use]
    pub const fn with_flags(mut self, flags: i32) -> Self {
        self.flags = flags;
        self
    }
}

/// A resolved address (the output half of `struct addrinfo`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrInfo {
    /// Copied from the hints.
    pub flags: i32,
    /// Always `AF_INET`.
    pub family: i32,
    /// Copied from the hints.
    pub socktype: i32,
    /// Copied from the hints.
    pub protocol: i32,
    pub addr: SocketAddrV4,
    /// Set when `AI_CANONNAME` was requested.
    pub canonname: Option<String>,
}

/// Resolve `node` and `service` to a single IPv4 socket address.
///
/// - `node`: numeric dotted-quad, or a name looked up in the host file
///   (skipped under `AI_NUMERICHOST`). `None` yields the wildcard address
///   with `AI_PASSIVE`, loopback otherwise.
/// - `service`: decimal port, or a name looked up in the service file
///   (skipped under `AI_NUMERICSERV`). `None` yields port 0.
/// - `hints`: `None` behaves as all-zero hints. The family must be
///   `AF_UNSPEC` or `AF_INET`.
pub fn getaddrinfo(
    files: &ResolverFiles,
    node: Option<&[u8]>,
    service: Option<&[u8]>,
    hints: Option<&AddrHints>,
) -> Result<AddrInfo, GaiError> {
    let hints = hints.copied().unwrap_or_default();
    validate_hints(&hints)?;

    if node.is_none() && service.is_none() {
        return Err(GaiError::NoName);
    }
    if node.is_none() && hints.flags & AI_CANONNAME != 0 {
        return Err(GaiError::BadFlags);
    }

    let port = match service {
        Some(svc) => resolve_service(files, svc, &hints)?,
        None => 0,
    };

    let (ip, canonical) = match node {
        Some(name) => resolve_host(files, name, &hints)?,
        None if hints.flags & AI_PASSIVE != 0 => (Ipv4Addr::UNSPECIFIED, None),
        None => (Ipv4Addr::LOCALHOST, None),
    };

    Ok(AddrInfo {
        flags: hints.flags,
        family: AF_INET,
        socktype: hints.socktype,
        protocol: hints.protocol,
        addr: SocketAddrV4::new(ip, port),
        canonname: if hints.flags & AI_CANONNAME != 0 {
            canonical
        } else {
            None
        },
    })
}

/// Substitution made by [`getaddrinfo_repaired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// An unknown service was replaced by port 0.
    DefaultPort,
    /// An unresolvable host was replaced by `127.0.0.1`.
    LoopbackHost,
}

const LOOPBACK_NODE: &[u8] = b"127.0.0.1";
const DEFAULT_SERVICE: &[u8] = b"0";

/// [`getaddrinfo`] that repairs instead of failing where it can: an unknown
/// service becomes port 0 and an unresolvable host name becomes loopback.
/// Each substitution is reported to `on_repair` before the lookup runs.
///
/// Errors caused by the hints themselves, by `SOCK_RAW` with a service, or
/// by a name given under `AI_NUMERICHOST` / `AI_NUMERICSERV` are returned
/// unchanged.
pub fn getaddrinfo_repaired(
    files: &ResolverFiles,
    node: Option<&[u8]>,
    service: Option<&[u8]>,
    hints: Option<&AddrHints>,
    mut on_repair: impl FnMut(Repair),
) -> Result<AddrInfo, GaiError> {
    let effective = hints.copied().unwrap_or_default();
    validate_hints(&effective)?;

    let mut service = service;
    if let Some(svc) = service {
        if effective.socktype != SOCK_RAW
            && matches!(
                resolve_service(files, svc, &effective),
                Err(GaiError::Service)
            )
        {
            on_repair(Repair::DefaultPort);
            service = Some(DEFAULT_SERVICE);
        }
    }

    let mut node = node;
    if let Some(name) = node {
        if effective.flags & AI_NUMERICHOST == 0
            && matches!(
                resolve_host(files, name, &effective),
                Err(GaiError::NoName | GaiError::NoData)
            )
        {
            on_repair(Repair::LoopbackHost);
            node = Some(LOOPBACK_NODE);
        }
    }

    getaddrinfo(files, node, service, hints)
}

fn validate_hints(hints: &AddrHints) -> Result<(), GaiError> {
    if hints.flags & !AI_KNOWN_MASK != 0 {
        return Err(GaiError::BadFlags);
    }
    if hints.family != AF_UNSPEC && hints.family != AF_INET {
        return Err(GaiError::Family);
    }
    if !matches!(hints.socktype, 0 | SOCK_STREAM | SOCK_DGRAM | SOCK_RAW) {
        return Err(GaiError::SockType);
    }
    Ok(())
}

/// Service file protocol implied by the hints, if any.
fn service_protocol(hints: &AddrHints) -> Option<&'static [u8]> {
    match (hints.socktype, hints.protocol) {
        (SOCK_STREAM, _) | (0, IPPROTO_TCP) => Some(b"tcp"),
        (SOCK_DGRAM, _) | (0, IPPROTO_UDP) => Some(b"udp"),
        _ => None,
    }
}

/// Parse a decimal port. `None` if `s` is not all digits.
fn parse_numeric_port(s: &[u8]) -> Option<Result<u16, GaiError>> {
    if s.is_empty() || !s.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let text = core::str::from_utf8(s).ok()?;
    Some(text.parse::<u16>().map_err(|_| GaiError::Service))
}

fn resolve_service(
    files: &ResolverFiles,
    service: &[u8],
    hints: &AddrHints,
) -> Result<u16, GaiError> {
    if hints.socktype == SOCK_RAW {
        return Err(GaiError::Service);
    }
    if let Some(port) = parse_numeric_port(service) {
        return port;
    }
    if hints.flags & AI_NUMERICSERV != 0 {
        return Err(GaiError::NoName);
    }
    files
        .service_port(service, service_protocol(hints))
        .ok_or(GaiError::Service)
}

fn resolve_host(
    files: &ResolverFiles,
    name: &[u8],
    hints: &AddrHints,
) -> Result<(Ipv4Addr, Option<String>), GaiError> {
    if name.is_empty() {
        return Err(GaiError::NoName);
    }

    if let Some(v4) = inet::parse_ipv4_loose(name) {
        return Ok((v4, Some(String::from_utf8_lossy(name).into_owned())));
    }
    if let Ok(text) = core::str::from_utf8(name) {
        if text.parse::<Ipv6Addr>().is_ok() {
            return Err(GaiError::Family);
        }
    }

    if hints.flags & AI_NUMERICHOST != 0 {
        return Err(GaiError::NoName);
    }

    files
        .host_v4(name)
        .map(|entry| (entry.addr, Some(entry.canonical)))
        .map_err(GaiError::from_h_errno)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> ResolverFiles {
        ResolverFiles::new(
            b"127.0.0.1 localhost\n10.0.0.7 agent.example.org agent\nfe80::7 agent6\n".to_vec(),
            b"snmp 161/udp\nsnmp 161/tcp\nsnmp-trap 162/udp snmptrap\nhttp 80/tcp www\n".to_vec(),
        )
    }

    #[test]
    fn numeric_host_and_port() {
        let ai = getaddrinfo(&files(), Some(b"192.168.1.1"), Some(b"161"), None).unwrap();
        assert_eq!(ai.family, AF_INET);
        assert_eq!(ai.addr, SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 1), 161));
        assert_eq!(ai.canonname, None);
    }

    #[test]
    fn shorthand_numeric_hosts_skip_the_host_file() {
        let numeric = AddrHints::default().with_flags(AI_NUMERICHOST | AI_CANONNAME);
        let ai = getaddrinfo(&files(), Some(b"127.1"), Some(b"80"), Some(&numeric)).unwrap();
        assert_eq!(ai.addr, SocketAddrV4::new(Ipv4Addr::LOCALHOST, 80));
        assert_eq!(ai.canonname.as_deref(), Some("127.1"));

        let ai = getaddrinfo(&files(), Some(b"0x0a.7"), None, None).unwrap();
        assert_eq!(*ai.addr.ip(), Ipv4Addr::new(10, 0, 0, 7));

        let err = getaddrinfo(&files(), Some(b"10.1.2.3.4"), None, Some(&numeric)).unwrap_err();
        assert_eq!(err, GaiError::NoName);
    }

    #[test]
    fn host_file_name_and_service_name() {
        let hints = AddrHints::inet(SOCK_DGRAM);
        let ai = getaddrinfo(&files(), Some(b"agent"), Some(b"snmptrap"), Some(&hints)).unwrap();
        assert_eq!(ai.addr, SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 7), 162));
        assert_eq!(ai.socktype, SOCK_DGRAM);
    }

    #[test]
    fn hints_are_copied_to_result() {
        let hints = AddrHints {
            flags: AI_NUMERICSERV,
            family: AF_UNSPEC,
            socktype: SOCK_STREAM,
            protocol: IPPROTO_TCP,
        };
        let ai = getaddrinfo(&files(), Some(b"10.0.0.1"), Some(b"80"), Some(&hints)).unwrap();
        assert_eq!(ai.flags, AI_NUMERICSERV);
        assert_eq!(ai.family, AF_INET);
        assert_eq!(ai.socktype, SOCK_STREAM);
        assert_eq!(ai.protocol, IPPROTO_TCP);
    }

    #[test]
    fn canonname_from_host_file() {
        let hints = AddrHints::default().with_flags(AI_CANONNAME);
        let ai = getaddrinfo(&files(), Some(b"AGENT"), None, Some(&hints)).unwrap();
        assert_eq!(ai.canonname.as_deref(), Some("agent.example.org"));
    }

    #[test]
    fn canonname_without_node_is_bad_flags() {
        let hints = AddrHints::default().with_flags(AI_CANONNAME);
        let err = getaddrinfo(&files(), None, Some(b"80"), Some(&hints)).unwrap_err();
        assert_eq!(err, GaiError::BadFlags);
    }

    #[test]
    fn no_node_passive_vs_active() {
        let passive = AddrHints::default().with_flags(AI_PASSIVE);
        let ai = getaddrinfo(&files(), None, Some(b"161"), Some(&passive)).unwrap();
        assert_eq!(*ai.addr.ip(), Ipv4Addr::UNSPECIFIED);

        let ai = getaddrinfo(&files(), None, Some(b"161"), None).unwrap();
        assert_eq!(*ai.addr.ip(), Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn neither_node_nor_service() {
        assert_eq!(getaddrinfo(&files(), None, None, None), Err(GaiError::NoName));
    }

    #[test]
    fn no_service_is_port_zero() {
        let ai = getaddrinfo(&files(), Some(b"localhost"), None, None).unwrap();
        assert_eq!(ai.addr.port(), 0);
    }

    #[test]
    fn only_inet_family_is_supported() {
        let hints = AddrHints {
            family: AF_INET6,
            ..AddrHints::default()
        };
        let err = getaddrinfo(&files(), Some(b"127.0.0.1"), None, Some(&hints)).unwrap_err();
        assert_eq!(err, GaiError::Family);

        let err = getaddrinfo(&files(), Some(b"::1"), None, None).unwrap_err();
        assert_eq!(err, GaiError::Family);
    }

    #[test]
    fn unknown_flags_rejected() {
        let hints = AddrHints::default().with_flags(0x4000_0000);
        let err = getaddrinfo(&files(), Some(b"127.0.0.1"), None, Some(&hints)).unwrap_err();
        assert_eq!(err, GaiError::BadFlags);
    }

    #[test]
    fn unknown_socktype_rejected() {
        let hints = AddrHints::inet(99);
        let err = getaddrinfo(&files(), Some(b"127.0.0.1"), None, Some(&hints)).unwrap_err();
        assert_eq!(err, GaiError::SockType);
    }

    #[test]
    fn unknown_host_is_noname() {
        let err = getaddrinfo(&files(), Some(b"nosuchhost"), None, None).unwrap_err();
        assert_eq!(err, GaiError::NoName);
    }

    #[test]
    fn host_with_only_ipv6_entry_is_nodata() {
        let err = getaddrinfo(&files(), Some(b"agent6"), None, None).unwrap_err();
        assert_eq!(err, GaiError::NoData);
    }

    #[test]
    fn numerichost_skips_host_file() {
        let hints = AddrHints::default().with_flags(AI_NUMERICHOST);
        let err = getaddrinfo(&files(), Some(b"localhost"), None, Some(&hints)).unwrap_err();
        assert_eq!(err, GaiError::NoName);
    }

    #[test]
    fn numericserv_skips_service_file() {
        let hints = AddrHints::default().with_flags(AI_NUMERICSERV);
        let err =
            getaddrinfo(&files(), Some(b"127.0.0.1"), Some(b"snmp"), Some(&hints)).unwrap_err();
        assert_eq!(err, GaiError::NoName);
    }

    #[test]
    fn service_protocol_follows_socktype() {
        let stream = AddrHints::inet(SOCK_STREAM);
        let err = getaddrinfo(&files(), Some(b"127.0.0.1"), Some(b"snmptrap"), Some(&stream))
            .unwrap_err();
        assert_eq!(err, GaiError::Service);

        let udp_proto = AddrHints {
            protocol: IPPROTO_UDP,
            ..AddrHints::default()
        };
        let ai = getaddrinfo(&files(), Some(b"127.0.0.1"), Some(b"snmptrap"), Some(&udp_proto))
            .unwrap();
        assert_eq!(ai.addr.port(), 162);
    }

    #[test]
    fn bad_services() {
        assert_eq!(
            getaddrinfo(&files(), Some(b"127.0.0.1"), Some(b"70000"), None),
            Err(GaiError::Service)
        );
        assert_eq!(
            getaddrinfo(&files(), Some(b"127.0.0.1"), Some(b"gopher"), None),
            Err(GaiError::Service)
        );
        let raw = AddrHints::inet(SOCK_RAW);
        assert_eq!(
            getaddrinfo(&files(), Some(b"127.0.0.1"), Some(b"80"), Some(&raw)),
            Err(GaiError::Service)
        );
    }

    #[test]
    fn empty_node_is_noname() {
        assert_eq!(
            getaddrinfo(&files(), Some(b""), Some(b"80"), None),
            Err(GaiError::NoName)
        );
    }

    // ---- getaddrinfo_repaired ----

    #[test]
    fn repaired_unknown_service_defaults_to_port_zero() {
        let mut repairs = Vec::new();
        let ai = getaddrinfo_repaired(&files(), Some(b"agent"), Some(b"gopher"), None, |r| {
            repairs.push(r)
        })
        .unwrap();
        assert_eq!(ai.addr, SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 7), 0));
        assert_eq!(repairs, vec![Repair::DefaultPort]);
    }

    #[test]
    fn repaired_unknown_host_is_loopback() {
        let mut repairs = Vec::new();
        let ai = getaddrinfo_repaired(&files(), Some(b"agent6"), Some(b"nope"), None, |r| {
            repairs.push(r)
        })
        .unwrap();
        assert_eq!(ai.addr, SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0));
        assert_eq!(repairs, vec![Repair::DefaultPort, Repair::LoopbackHost]);
    }

    #[test]
    fn repaired_passes_hint_errors_through() {
        let hints = AddrHints {
            family: AF_INET6,
            ..AddrHints::default()
        };
        let err = getaddrinfo_repaired(&files(), Some(b"nohost"), None, Some(&hints), |_| {
            panic!("no repair expected")
        });
        assert_eq!(err, Err(GaiError::Family));
        assert_eq!(
            getaddrinfo_repaired(&files(), None, None, None, |_| panic!("no repair expected")),
            Err(GaiError::NoName)
        );
    }

    #[test]
    fn repaired_leaves_explicit_refusals_alone() {
        let raw = AddrHints::inet(SOCK_RAW);
        let err = getaddrinfo_repaired(&files(), Some(b"127.0.0.1"), Some(b"80"), Some(&raw), |_| {
            panic!("no repair expected")
        });
        assert_eq!(err, Err(GaiError::Service));

        let numeric = AddrHints::default().with_flags(AI_NUMERICSERV);
        let err = getaddrinfo_repaired(
            &files(),
            Some(b"10.0.0.1"),
            Some(b"http"),
            Some(&numeric),
            |_| panic!("no repair expected"),
        );
        assert_eq!(err, Err(GaiError::NoName));
    }
}
