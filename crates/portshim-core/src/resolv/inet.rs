//! Numeric IPv4 host syntax.
//!
//! `getaddrinfo` treats any `inet_aton` form as a numeric address, not just
//! the dotted quad: `127.1`, `10.1.2`, `0x7f.0.0.1`, `0177.0.0.1` and
//! `2130706433` all name 127.0.0.1 or its neighbours.

use std::net::Ipv4Addr;

/// Parse one to four dot-separated parts, each decimal, octal (leading `0`)
/// or hex (leading `0x`). The last part fills every byte the earlier parts
/// leave, so it may be up to 32, 24, 16 or 8 bits wide. Trailing text of any
/// kind, whitespace included, is rejected.
#[must_use]
pub fn parse_ipv4_loose(text: &[u8]) -> Option<Ipv4Addr> {
    let mut parts = [0u32; 4];
    let mut count = 0;
    for part in text.split(|&b| b == b'.') {
        let slot = parts.get_mut(count)?;
        *slot = parse_part(part)?;
        count += 1;
    }

    let (head, last) = parts[..count].split_at(count - 1);
    if head.iter().any(|&p| p > 0xff) {
        return None;
    }
    let last_bits = 32 - 8 * head.len() as u32;
    if last_bits < 32 && last[0] >> last_bits != 0 {
        return None;
    }
    let addr = head
        .iter()
        .enumerate()
        .fold(last[0], |acc, (i, &p)| acc | p << (24 - 8 * i as u32));
    Some(Ipv4Addr::from(addr))
}

fn parse_part(part: &[u8]) -> Option<u32> {
    let (digits, radix) = match part {
        [b'0', b'x' | b'X', rest @ ..] => (rest, 16),
        [b'0', rest @ ..] if !rest.is_empty() => (rest, 8),
        _ => (part, 10),
    };
    if digits.is_empty() || !digits.iter().all(|&b| char::from(b).is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(std::str::from_utf8(digits).ok()?, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Option<Ipv4Addr> {
        parse_ipv4_loose(s.as_bytes())
    }

    #[test]
    fn dotted_quad() {
        assert_eq!(parse("192.168.1.1"), Some(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(parse("0.0.0.0"), Some(Ipv4Addr::UNSPECIFIED));
        assert_eq!(parse("255.255.255.255"), Some(Ipv4Addr::BROADCAST));
    }

    #[test]
    fn short_forms_fill_from_the_last_part() {
        assert_eq!(parse("127.1"), Some(Ipv4Addr::LOCALHOST));
        assert_eq!(parse("10.1.2"), Some(Ipv4Addr::new(10, 1, 0, 2)));
        assert_eq!(parse("10.65535"), Some(Ipv4Addr::new(10, 0, 255, 255)));
        assert_eq!(parse("2130706433"), Some(Ipv4Addr::LOCALHOST));
        assert_eq!(parse("1.2.772"), Some(Ipv4Addr::new(1, 2, 3, 4)));
    }

    #[test]
    fn octal_and_hex_parts() {
        assert_eq!(parse("0x7f.0.0.1"), Some(Ipv4Addr::LOCALHOST));
        assert_eq!(parse("0177.0.0.1"), Some(Ipv4Addr::LOCALHOST));
        assert_eq!(parse("0X7F000001"), Some(Ipv4Addr::LOCALHOST));
        assert_eq!(parse("010.0.0.010"), Some(Ipv4Addr::new(8, 0, 0, 8)));
        assert_eq!(parse("0"), Some(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn rejects_out_of_range_parts() {
        assert_eq!(parse("256.0.0.1"), None);
        assert_eq!(parse("1.2.3.256"), None);
        assert_eq!(parse("1.2.65536"), None);
        assert_eq!(parse("1.16777216"), None);
        assert_eq!(parse("4294967296"), None);
        assert_eq!(parse("0x100000000"), None);
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in [
            "", ".", "1.", ".1", "1..2", "1.2.3.4.5", "08", "0x", "0xg", "1.2.3.4 ", " 1.2.3.4",
            "+1", "localhost", "::1",
        ] {
            assert_eq!(parse(bad), None, "{bad:?}");
        }
    }
}
