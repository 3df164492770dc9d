//! URL parsing, scheme checking and host normalization.

use std::fmt;
use std::net::IpAddr;

use url::{Host, Url};

use crate::Error;

/// A URL that has passed every classifier gate.
///
/// There is no public constructor: values only come out of
/// [`classify`](crate::classify) or [`Classifier::classify`](crate::Classifier::classify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    inner: Url,
    host: String,
}

impl ParsedUrl {
    /// Parse `input`, check its scheme and normalize its host.
    ///
    /// With `strict_ip_encoding`, a host that the WHATWG parser turned into
    /// an IPv4 address must already have been written as that canonical
    /// dotted quad. Octal, hex, single-integer and short forms are rejected
    /// here instead of being silently reinterpreted.
    ///
    /// This is not the full classification: range checks happen in
    /// [`Classifier::classify`](crate::Classifier::classify).
    pub(crate) fn parse(input: &str, strict_ip_encoding: bool) -> Result<Self, Error> {
        let url = Url::parse(input).map_err(|e| Error::invalid_url(input, e.to_string()))?;

        // Url lowercases the scheme during parsing
        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::unsafe_scheme(input, scheme)),
        }

        if strict_ip_encoding {
            reject_ambiguous_ipv4(&url, input)?;
        }

        let host = url
            .host_str()
            .ok_or_else(|| Error::invalid_url(input, "URL must have a host"))?;
        let host = normalize_host(host, input)?;

        Ok(Self { inner: url, host })
    }

    /// Lowercase scheme, `http` or `https`.
    pub fn scheme(&self) -> &str {
        self.inner.scheme()
    }

    /// Normalized hostname: lowercase, no trailing dot. IPv6 literals keep
    /// their brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The host as an IP address, when it is an IP literal.
    pub fn ip(&self) -> Option<IpAddr> {
        match self.inner.host()? {
            Host::Ipv4(ip) => Some(IpAddr::V4(ip)),
            Host::Ipv6(ip) => Some(IpAddr::V6(ip)),
            Host::Domain(_) => None,
        }
    }

    /// Port, defaulting to 80 for http and 443 for https.
    pub fn port(&self) -> u16 {
        self.inner.port_or_known_default().unwrap_or(80)
    }

    pub fn path(&self) -> &str {
        self.inner.path()
    }

    /// The canonical absolute URL, suitable for issuing the request.
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    pub fn is_https(&self) -> bool {
        self.inner.scheme() == "https"
    }

    /// Resolve a possibly relative reference (a redirect `Location`)
    /// against this URL. The result is unclassified.
    pub fn join(&self, reference: &str) -> Result<String, Error> {
        self.inner
            .join(reference)
            .map(String::from)
            .map_err(|e| Error::invalid_url(reference, e.to_string()))
    }

    pub fn into_url(self) -> Url {
        self.inner
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ParsedUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Normalize a hostname: lowercase, remove one trailing dot.
fn normalize_host(host: &str, original_url: &str) -> Result<String, Error> {
    let mut normalized = host.to_lowercase();

    if normalized.ends_with('.') {
        normalized.pop();
    }

    if normalized.is_empty() {
        return Err(Error::invalid_url(original_url, "empty hostname"));
    }

    Ok(normalized)
}

/// Reject IPv4 hosts that were not written as a canonical dotted quad.
fn reject_ambiguous_ipv4(url: &Url, input: &str) -> Result<(), Error> {
    let Some(Host::Ipv4(ip)) = url.host() else {
        return Ok(());
    };

    let raw = raw_host(input).map(|host| host.trim_end_matches('.').to_ascii_lowercase());
    if raw.as_deref() == Some(ip.to_string().as_str()) {
        return Ok(());
    }

    Err(Error::invalid_url(
        input,
        format!("ambiguous IPv4 encoding, write it as {}", ip),
    ))
}

/// Pull the host exactly as written out of a raw URL string.
///
/// Only meaningful for special schemes, where any run of `/` or `\` may
/// follow the colon.
fn raw_host(input: &str) -> Option<&str> {
    let input = input.trim_matches(|c: char| c <= ' ');
    let (_, rest) = input.split_once(':')?;
    let rest = rest.trim_start_matches(['/', '\\']);

    let authority_end = rest.find(['/', '\\', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];

    let host_with_port = authority
        .rfind('@')
        .map(|i| &authority[i + 1..])
        .unwrap_or(authority);

    let host = if host_with_port.starts_with('[') {
        host_with_port
            .find(']')
            .map(|i| &host_with_port[..=i])
            .unwrap_or(host_with_port)
    } else {
        host_with_port
            .rfind(':')
            .map(|i| &host_with_port[..i])
            .unwrap_or(host_with_port)
    };

    Some(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<ParsedUrl, Error> {
        ParsedUrl::parse(input, true)
    }

    fn parse_lax(input: &str) -> Result<ParsedUrl, Error> {
        ParsedUrl::parse(input, false)
    }

    fn assert_invalid(input: &str) {
        match parse(input) {
            Err(Error::InvalidUrl { url, .. }) => assert_eq!(url, input),
            other => panic!("expected InvalidUrl for {}, got {:?}", input, other),
        }
    }

    // ==================== Valid URL Tests ====================

    #[test]
    fn test_parse_https_url() {
        let url = parse("https://example.com/path").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host(), "example.com");
        assert_eq!(url.port(), 443);
        assert!(url.is_https());
        assert_eq!(url.as_str(), "https://example.com/path");
    }

    #[test]
    fn test_parse_http_url() {
        let url = parse("http://example.com/path").unwrap();
        assert_eq!(url.port(), 80);
        assert!(!url.is_https());
    }

    #[test]
    fn test_parse_with_port_query_and_fragment() {
        let url = parse("https://example.com:8443/path?query=1#fragment").unwrap();
        assert_eq!(url.port(), 8443);
        assert_eq!(url.path(), "/path");
    }

    #[test]
    fn test_canonical_form() {
        let url = parse("HTTPS://Example.COM").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
        assert_eq!(url.to_string(), "https://example.com/");
    }

    #[test]
    fn test_ip_accessor() {
        assert_eq!(
            parse("http://8.8.8.8/").unwrap().ip(),
            Some("8.8.8.8".parse().unwrap())
        );
        assert_eq!(
            parse("http://[2001:db8::1]/").unwrap().ip(),
            Some("2001:db8::1".parse().unwrap())
        );
        assert_eq!(parse("http://example.com/").unwrap().ip(), None);
    }

    #[test]
    fn test_ipv6_host_keeps_brackets() {
        let url = parse("http://[2001:DB8::1]:8080/").unwrap();
        assert_eq!(url.host(), "[2001:db8::1]");
        assert_eq!(url.port(), 8080);
    }

    // ==================== Hostname Normalization Tests ====================

    #[test]
    fn test_normalize_hostname_lowercase() {
        assert_eq!(parse("https://EXAMPLE.COM/path").unwrap().host(), "example.com");
    }

    #[test]
    fn test_normalize_hostname_trailing_dot() {
        assert_eq!(parse("https://example.com./path").unwrap().host(), "example.com");
        assert_eq!(parse("https://EXAMPLE.COM./path").unwrap().host(), "example.com");
    }

    // ==================== Scheme Tests ====================

    #[test]
    fn test_reject_non_http_schemes() {
        for (input, scheme) in [
            ("ftp://example.com", "ftp"),
            ("file:///etc/passwd", "file"),
            ("chrome://settings", "chrome"),
            ("chrome-extension://abcdef/page.html", "chrome-extension"),
            ("javascript:alert(1)", "javascript"),
            ("data:text/html,<h1>hi</h1>", "data"),
            ("ftp://0177.0.0.1/", "ftp"),
            ("ws://2130706433/", "ws"),
        ] {
            match parse(input) {
                Err(Error::UnsafeScheme { scheme: got, .. }) => assert_eq!(got, scheme),
                other => panic!("expected UnsafeScheme for {}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_mixed_case_scheme_is_allowed() {
        assert_eq!(parse("HtTp://example.com/").unwrap().scheme(), "http");
    }

    #[test]
    fn test_unparseable_input() {
        assert_invalid("not a url");
        assert_invalid("");
        assert_invalid("/relative/path");
        assert_invalid("http://");
        assert_invalid("http://256.0.0.1/");
    }

    // ==================== Ambiguous IPv4 Encoding Tests ====================

    #[test]
    fn test_reject_octal_ip() {
        assert_invalid("http://0177.0.0.1/");
        assert_invalid("http://127.0.0.01/");
        assert_invalid("http://0251.0376.0251.0376/");
    }

    #[test]
    fn test_reject_decimal_ip() {
        assert_invalid("http://2130706433/");
        assert_invalid("http://2852039166/");
    }

    #[test]
    fn test_reject_hex_ip() {
        assert_invalid("http://0x7f000001/");
        assert_invalid("http://0x7f.0.0.1/");
        assert_invalid("http://0X7F.0X00.0X00.0X01/");
        assert_invalid("http://0xa9fea9fe/latest/meta-data/");
    }

    #[test]
    fn test_reject_short_form_ip() {
        assert_invalid("http://127.1/");
        assert_invalid("http://10.1/");
        assert_invalid("http://192.168.1/");
        assert_invalid("http://169.254.43518/");
    }

    #[test]
    fn test_reject_ambiguous_ip_without_slashes() {
        assert_invalid("http:0177.0.0.1/");
        assert_invalid("http:\\\\2130706433/");
    }

    #[test]
    fn test_canonical_ipv4_with_userinfo_and_port() {
        let url = parse("http://user:pw@8.8.4.4:8080/").unwrap();
        assert_eq!(url.host(), "8.8.4.4");
    }

    #[test]
    fn test_lax_mode_canonicalizes() {
        assert_eq!(parse_lax("http://0177.0.0.1/").unwrap().host(), "127.0.0.1");
        assert_eq!(parse_lax("http://2130706433/").unwrap().host(), "127.0.0.1");
        assert_eq!(parse_lax("http://0xa9fea9fe/").unwrap().host(), "169.254.169.254");
        assert_eq!(parse_lax("http://10.1/").unwrap().host(), "10.0.0.1");
    }

    #[test]
    fn test_numeric_looking_domains_are_not_ips() {
        assert_eq!(parse("http://0177.example.com/").unwrap().host(), "0177.example.com");
        assert_eq!(parse("http://123host.example.com/").unwrap().host(), "123host.example.com");
        assert_eq!(parse("http://example.co2/").unwrap().host(), "example.co2");
    }

    // ==================== Helpers ====================

    #[test]
    fn test_raw_host_extraction() {
        assert_eq!(raw_host("http://Example.com:80/x"), Some("Example.com"));
        assert_eq!(raw_host("http://a:b@0x7f.1/"), Some("0x7f.1"));
        assert_eq!(raw_host("http://[::1]:8080/"), Some("[::1]"));
        assert_eq!(raw_host("  https://host?x"), Some("host"));
        assert_eq!(raw_host("no colon"), None);
    }

    #[test]
    fn test_join_redirect_location() {
        let url = parse("https://example.com/a/b").unwrap();
        assert_eq!(url.join("/c").unwrap(), "https://example.com/c");
        assert_eq!(url.join("d").unwrap(), "https://example.com/a/d");
        assert_eq!(url.join("http://10.0.0.1/").unwrap(), "http://10.0.0.1/");
    }

    #[test]
    fn test_into_url() {
        let inner = parse("http://example.com/").unwrap().into_url();
        assert_eq!(inner.host_str(), Some("example.com"));
    }
}
