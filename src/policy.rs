//! Classifier policy and its builder.
//!
//! The built-in blocks (loopback, the private and link-local ranges, unsafe
//! schemes) cannot be switched off. A policy can only tighten them:
//!
//! - **Strict IP encoding** (on by default) rejects numeric hosts that are
//!   not canonical dotted quads instead of canonicalizing them.
//! - **Extra CIDR blocks** add operator ranges, reported as
//!   [`BlockedRange::Custom`](crate::BlockedRange::Custom).
//! - **Redirect limit** bounds how many hops
//!   [`fetch_if_safe`](crate::fetch_if_safe) follows.
//!
//! Policies can be built in code or loaded from TOML:
//!
//! ```toml
//! strict_ip_encoding = true
//! blocked_cidrs = ["100.64.0.0/10", "2001:db8::/32"]
//! max_redirects = 5
//! ```

use std::fs;
use std::net::IpAddr;
use std::path::Path;

use ipnet::IpNet;
use serde::Deserialize;
use thiserror::Error;

use crate::blocklist::{embedded_ipv4, BlockedRange};

/// Default number of redirects [`fetch_if_safe`](crate::fetch_if_safe) follows.
pub const DEFAULT_MAX_REDIRECTS: u8 = 10;

/// Immutable classifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    strict_ip_encoding: bool,
    blocked_cidrs: Vec<IpNet>,
    max_redirects: u8,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            strict_ip_encoding: true,
            blocked_cidrs: Vec::new(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl Policy {
    /// Parse a policy from TOML. Omitted keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, PolicyError> {
        Ok(toml::from_str(input)?)
    }

    /// Read and parse a TOML policy file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn strict_ip_encoding(&self) -> bool {
        self.strict_ip_encoding
    }

    pub fn max_redirects(&self) -> u8 {
        self.max_redirects
    }

    pub fn blocked_cidrs(&self) -> &[IpNet] {
        &self.blocked_cidrs
    }

    /// First operator-supplied range containing `ip`, or the IPv4 address
    /// an IPv6 `ip` embeds.
    pub(crate) fn custom_block(&self, ip: IpAddr) -> Option<BlockedRange> {
        let embedded = match ip {
            IpAddr::V6(ipv6) => embedded_ipv4(ipv6).map(IpAddr::V4),
            IpAddr::V4(_) => None,
        };

        self.blocked_cidrs
            .iter()
            .find(|net| net.contains(&ip) || embedded.is_some_and(|v4| net.contains(&v4)))
            .map(|net| BlockedRange::Custom(*net))
    }
}

/// Errors loading a [`Policy`].
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid policy: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid CIDR '{cidr}': {reason}")]
    InvalidCidr { cidr: String, reason: String },
}

/// Builder for [`Policy`].
///
/// ```rust
/// use url_gate::{Classifier, PolicyBuilder};
///
/// let policy = PolicyBuilder::new()
///     .block_cidr("100.64.0.0/10")
///     .unwrap()
///     .max_redirects(3)
///     .build();
///
/// let classifier = Classifier::new(policy);
/// assert!(classifier.classify("http://100.64.1.1/").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    policy: Policy,
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block an extra IP range in CIDR notation.
    pub fn block_cidr(mut self, cidr: &str) -> Result<Self, PolicyError> {
        let net: IpNet = cidr.parse().map_err(|e: ipnet::AddrParseError| {
            PolicyError::InvalidCidr {
                cidr: cidr.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.policy.blocked_cidrs.push(net);
        Ok(self)
    }

    /// Canonicalize ambiguous numeric hosts instead of rejecting them.
    /// They are still range-checked after canonicalization.
    pub fn allow_ambiguous_ip_encoding(mut self) -> Self {
        self.policy.strict_ip_encoding = false;
        self
    }

    pub fn max_redirects(mut self, max: u8) -> Self {
        self.policy.max_redirects = max;
        self
    }

    pub fn build(self) -> Policy {
        self.policy
    }
}
