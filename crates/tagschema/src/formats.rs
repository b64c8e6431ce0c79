//! Built-in format predicates
//!
//! Each format is a pure function from a string to success or a failure
//! reason. The validator registers all of them under their JSON-Schema
//! names; callers may add their own through
//! [`Validator::register_format`](crate::Validator::register_format).

use std::net::{Ipv4Addr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;

/// RFC 5322 atext plus dot, for the local part of an email address.
static EMAIL_LOCAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+$").expect("static regex"));

/// `date-time`: an RFC 3339 timestamp.
pub fn date_time(value: &str) -> Result<(), String> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// `email`: local part and domain checked structurally, with the length
/// limits of RFC 5321 (64 octets local, 253 octets domain, 254 total).
pub fn email(value: &str) -> Result<(), String> {
    if value.len() > 254 {
        return Err("address is longer than 254 characters".to_string());
    }
    let at = value
        .rfind('@')
        .ok_or_else(|| "address contains no `@`".to_string())?;
    let (local, domain) = (&value[..at], &value[at + 1..]);
    if local.is_empty() || local.len() > 64 {
        return Err("local part must be 1 to 64 characters".to_string());
    }
    if !EMAIL_LOCAL_REGEX.is_match(local) {
        return Err("local part contains invalid characters".to_string());
    }
    hostname(domain).map_err(|reason| format!("invalid domain: {reason}"))
}

/// `hostname`: dot-separated labels of letters, digits and hyphens.
pub fn hostname(value: &str) -> Result<(), String> {
    let host = value.strip_suffix('.').unwrap_or(value);
    if host.len() > 253 {
        return Err("hostname is longer than 253 characters".to_string());
    }
    if matches!(host.bytes().next(), Some(b'0'..=b'9' | b'-')) {
        return Err("hostname must not start with a digit or hyphen".to_string());
    }
    for label in host.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err("labels must be 1 to 63 characters".to_string());
        }
        if label.ends_with('-') {
            return Err("labels must not end with a hyphen".to_string());
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err("labels may only contain letters, digits and hyphens".to_string());
        }
    }
    Ok(())
}

/// `ipv4`: dotted quad.
pub fn ipv4(value: &str) -> Result<(), String> {
    if value.split('.').count() != 4 {
        return Err("expected four dot-separated octets".to_string());
    }
    value
        .parse::<Ipv4Addr>()
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// `ipv6`: colon-separated address, abbreviations allowed.
pub fn ipv6(value: &str) -> Result<(), String> {
    if !value.contains(':') {
        return Err("expected a colon-separated address".to_string());
    }
    value
        .parse::<Ipv6Addr>()
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// `uri`: an absolute URI with a scheme.
pub fn uri(value: &str) -> Result<(), String> {
    url::Url::parse(value).map(|_| ()).map_err(|e| e.to_string())
}

/// `uri-reference` (also registered as `uri-template`): an absolute URI or a
/// relative reference.
pub fn uri_reference(value: &str) -> Result<(), String> {
    match url::Url::parse(value) {
        Ok(_) => Ok(()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

/// `json-pointer`: every `~` must be followed by `~`, `0` or `1`.
pub fn json_pointer(value: &str) -> Result<(), String> {
    for segment in value.split('/') {
        let bytes = segment.as_bytes();
        for (i, b) in bytes.iter().enumerate() {
            if *b == b'~' {
                match bytes.get(i + 1) {
                    Some(b'~') | Some(b'0') | Some(b'1') => {}
                    _ => return Err("`~` must be followed by `0`, `1` or `~`".to_string()),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_time() {
        assert!(date_time("2024-01-19T12:00:00Z").is_ok());
        assert!(date_time("2024-01-19T12:00:00.123456789+08:00").is_ok());
        assert!(date_time("2024-01-19 12:00:00").is_err());
        assert!(date_time("not-a-date").is_err());
    }

    #[test]
    fn test_email() {
        assert!(email("user@example.com").is_ok());
        assert!(email("test.user+tag@sub.example.co.uk").is_ok());
        assert!(email("invalid-email").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("user@").is_err());
        assert!(email("user@-bad.com").is_err());
        assert!(email(&format!("{}@example.com", "a".repeat(65))).is_err());
    }

    #[test]
    fn test_hostname() {
        assert!(hostname("example.com").is_ok());
        assert!(hostname("sub.example.com.").is_ok());
        assert!(hostname("localhost").is_ok());
        assert!(hostname("-leading.com").is_err());
        assert!(hostname("trailing-.com").is_err());
        assert!(hostname("has space.com").is_err());
        assert!(hostname(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_ipv4() {
        assert!(ipv4("192.168.1.1").is_ok());
        assert!(ipv4("0.0.0.0").is_ok());
        assert!(ipv4("999.999.999.999").is_err());
        assert!(ipv4("1.2.3").is_err());
        assert!(ipv4("a.b.c.d").is_err());
    }

    #[test]
    fn test_ipv6() {
        assert!(ipv6("::1").is_ok());
        assert!(ipv6("2001:db8::8a2e:370:7334").is_ok());
        assert!(ipv6("192.168.1.1").is_err());
        assert!(ipv6("not:an:address").is_err());
    }

    #[test]
    fn test_uri() {
        assert!(uri("https://example.com/path?q=1").is_ok());
        assert!(uri("ftp://example.com").is_ok());
        assert!(uri("/relative/only").is_err());
    }

    #[test]
    fn test_uri_reference() {
        assert!(uri_reference("https://example.com").is_ok());
        assert!(uri_reference("/relative/path").is_ok());
        assert!(uri_reference("http://[bad").is_err());
    }

    #[test]
    fn test_json_pointer() {
        assert!(json_pointer("/a/b/c").is_ok());
        assert!(json_pointer("/a~0b/c~1d").is_ok());
        assert!(json_pointer("/tilde~~ok").is_ok());
        assert!(json_pointer("/bad~2").is_err());
        assert!(json_pointer("/trailing~").is_err());
    }
}
