//! File-based lookup backends: the host file (`/etc/hosts`) and the service
//! file (`/etc/services`).
//!
//! Parsing works on raw file contents so it can be tested without touching
//! the filesystem. [`ResolverFiles`] is the loaded pair a lookup runs against.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

use super::error::{HOST_NOT_FOUND, NO_DATA};

/// Default host file path.
pub const DEFAULT_HOSTS_PATH: &str = "/etc/hosts";
/// Default service file path.
pub const DEFAULT_SERVICES_PATH: &str = "/etc/services";
/// Environment variable overriding the host file path.
pub const HOSTS_ENV: &str = "PORTSHIM_HOSTS";
/// Environment variable overriding the service file path.
pub const SERVICES_ENV: &str = "PORTSHIM_SERVICES";

/// Address parsed from a host file line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAddr {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

/// A matched host file entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub addr: Ipv4Addr,
    /// First name on the matching line.
    pub canonical: String,
}

/// A service file entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: Vec<u8>,
    pub port: u16,
    pub protocol: Vec<u8>,
    pub aliases: Vec<Vec<u8>>,
}

fn strip_comment(line: &[u8]) -> &[u8] {
    match line.iter().position(|&b| b == b'#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn fields(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    line.split(|&b| b == b' ' || b == b'\t' || b == b'\r')
        .filter(|f| !f.is_empty())
}

/// Parse a single host file line.
///
/// Format: `<address> <hostname> [<alias>...]`. Comments (`#`) and blank
/// lines yield `None`, as do lines whose address is not an IP literal or
/// that carry no name.
pub fn parse_hosts_line(line: &[u8]) -> Option<(HostAddr, Vec<Vec<u8>>)> {
    let mut fields = fields(strip_comment(line));
    let addr_field = fields.next()?;
    let names: Vec<Vec<u8>> = fields.map(<[u8]>::to_vec).collect();
    if names.is_empty() {
        return None;
    }

    let addr_str = core::str::from_utf8(addr_field).ok()?;
    if let Ok(v4) = addr_str.parse::<Ipv4Addr>() {
        Some((HostAddr::V4(v4), names))
    } else if let Ok(v6) = addr_str.parse::<Ipv6Addr>() {
        Some((HostAddr::V6(v6), names))
    } else {
        None
    }
}

/// Look up the first IPv4 entry for `name` in host file content.
///
/// Matching is ASCII case-insensitive against every name on a line.
/// Errors are `h_errno` values: `HOST_NOT_FOUND` when no line names the
/// host, `NO_DATA` when it only appears with IPv6 addresses.
pub fn lookup_host_v4(content: &[u8], name: &[u8]) -> Result<HostEntry, i32> {
    let mut seen_other_family = false;
    for line in content.split(|&b| b == b'\n') {
        let Some((addr, names)) = parse_hosts_line(line) else {
            continue;
        };
        if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            continue;
        }
        match addr {
            HostAddr::V4(v4) => {
                return Ok(HostEntry {
                    addr: v4,
                    canonical: String::from_utf8_lossy(&names[0]).into_owned(),
                });
            }
            HostAddr::V6(_) => seen_other_family = true,
        }
    }
    Err(if seen_other_family {
        NO_DATA
    } else {
        HOST_NOT_FOUND
    })
}

/// Parse a single service file line.
///
/// Format: `<service-name> <port>/<protocol> [<alias>...]`.
pub fn parse_services_line(line: &[u8]) -> Option<ServiceEntry> {
    let mut fields = fields(strip_comment(line));
    let name = fields.next()?;
    let port_proto = fields.next()?;

    let slash_pos = port_proto.iter().position(|&b| b == b'/')?;
    let port_str = core::str::from_utf8(&port_proto[..slash_pos]).ok()?;
    let port: u16 = port_str.parse().ok()?;
    let protocol = &port_proto[slash_pos + 1..];
    if protocol.is_empty() {
        return None;
    }

    Some(ServiceEntry {
        name: name.to_vec(),
        port,
        protocol: protocol.to_vec(),
        aliases: fields.map(<[u8]>::to_vec).collect(),
    })
}

/// Look up a service by name or alias, optionally restricted to a protocol.
pub fn lookup_service(content: &[u8], name: &[u8], protocol: Option<&[u8]>) -> Option<u16> {
    content
        .split(|&b| b == b'\n')
        .filter_map(parse_services_line)
        .find(|entry| {
            let name_matches = entry.name.eq_ignore_ascii_case(name)
                || entry.aliases.iter().any(|a| a.eq_ignore_ascii_case(name));
            let proto_matches = protocol.is_none_or(|p| entry.protocol.eq_ignore_ascii_case(p));
            name_matches && proto_matches
        })
        .map(|entry| entry.port)
}

/// Loaded host and service file contents.
#[derive(Debug, Clone, Default)]
pub struct ResolverFiles {
    hosts: Vec<u8>,
    services: Vec<u8>,
}

impl ResolverFiles {
    /// Build from in-memory contents.
    #[must_use]
    pub fn new(hosts: impl Into<Vec<u8>>, services: impl Into<Vec<u8>>) -> Self {
        Self {
            hosts: hosts.into(),
            services: services.into(),
        }
    }

    /// Load from the given paths. An unreadable file behaves as empty, the
    /// same as a host with no entries.
    #[must_use]
    pub fn from_paths(hosts: &Path, services: &Path) -> Self {
        Self {
            hosts: std::fs::read(hosts).unwrap_or_default(),
            services: std::fs::read(services).unwrap_or_default(),
        }
    }

    /// Load from `PORTSHIM_HOSTS` / `PORTSHIM_SERVICES`, falling back to the
    /// system files.
    #[must_use]
    pub fn from_env() -> Self {
        let hosts = std::env::var_os(HOSTS_ENV).unwrap_or_else(|| DEFAULT_HOSTS_PATH.into());
        let services =
            std::env::var_os(SERVICES_ENV).unwrap_or_else(|| DEFAULT_SERVICES_PATH.into());
        Self::from_paths(Path::new(&hosts), Path::new(&services))
    }

    /// See [`lookup_host_v4`].
    pub fn host_v4(&self, name: &[u8]) -> Result<HostEntry, i32> {
        lookup_host_v4(&self.hosts, name)
    }

    /// See [`lookup_service`].
    #[must_use]
    pub fn service_port(&self, name: &[u8], protocol: Option<&[u8]>) -> Option<u16> {
        lookup_service(&self.services, name, protocol)
    }
}
