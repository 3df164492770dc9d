//! Error types for url_gate.

use thiserror::Error;

use crate::blocklist::BlockedRange;

/// Errors returned by classification and by gated fetching.
///
/// The first four variants are classifier verdicts. Every variant carries
/// the offending URL so callers can surface it without re-parsing a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Input is not a syntactically valid absolute URL.
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Scheme is neither `http` nor `https`.
    #[error("Unsafe URL scheme '{scheme}': only http and https are allowed")]
    UnsafeScheme { url: String, scheme: String },

    /// Hostname refers to the local host.
    #[error("Loopback blocked: {host}")]
    LoopbackBlocked { url: String, host: String },

    /// Hostname is an address inside a blocked private or link-local range.
    #[error("Private address blocked: {host} is in {range}")]
    PrivateIpBlocked {
        url: String,
        host: String,
        range: BlockedRange,
    },

    /// A redirect pointed at a URL the classifier rejects.
    #[error("Redirect blocked: {redirect_url} - {source}")]
    RedirectBlocked {
        original_url: String,
        redirect_url: String,
        #[source]
        source: Box<Error>,
    },

    /// Redirect chain exceeded the policy limit.
    #[error("Too many redirects (max {max})")]
    TooManyRedirects { url: String, max: u8 },

    /// The transport failed to perform the request.
    #[error("HTTP error: {message}")]
    Http { url: String, message: String },
}

impl Error {
    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsafe_scheme(url: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self::UnsafeScheme {
            url: url.into(),
            scheme: scheme.into(),
        }
    }

    pub(crate) fn loopback_blocked(url: impl Into<String>, host: impl Into<String>) -> Self {
        Self::LoopbackBlocked {
            url: url.into(),
            host: host.into(),
        }
    }

    pub(crate) fn private_ip_blocked(
        url: impl Into<String>,
        host: impl Into<String>,
        range: BlockedRange,
    ) -> Self {
        Self::PrivateIpBlocked {
            url: url.into(),
            host: host.into(),
            range,
        }
    }

    /// Build a transport failure. Public so `Transport` implementations
    /// outside this crate can report errors.
    pub fn http(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            message: message.into(),
        }
    }

    /// True when the URL (or a redirect hop) was refused on safety grounds,
    /// as opposed to being unparseable or failing in transit.
    pub fn is_blocked(&self) -> bool {
        match self {
            Self::UnsafeScheme { .. }
            | Self::LoopbackBlocked { .. }
            | Self::PrivateIpBlocked { .. } => true,
            Self::RedirectBlocked { source, .. } => source.is_blocked(),
            Self::InvalidUrl { .. } | Self::TooManyRedirects { .. } | Self::Http { .. } => false,
        }
    }

    /// The URL this error is about.
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url, .. }
            | Self::UnsafeScheme { url, .. }
            | Self::LoopbackBlocked { url, .. }
            | Self::PrivateIpBlocked { url, .. }
            | Self::TooManyRedirects { url, .. }
            | Self::Http { url, .. } => url,
            Self::RedirectBlocked { redirect_url, .. } => redirect_url,
        }
    }
}
