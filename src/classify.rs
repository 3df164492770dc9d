//! The URL safety classifier.

use tracing::{debug, warn};

use crate::blocklist::{blocked_range, is_loopback_hostname, is_loopback_ip};
use crate::error::Error;
use crate::parsed_url::ParsedUrl;
use crate::policy::Policy;

/// Classify `candidate` with the default [`Policy`].
///
/// Gates run in order and the first failure wins:
/// 1. Parse as an absolute URL ([`Error::InvalidUrl`])
/// 2. Allow only `http` and `https` ([`Error::UnsafeScheme`])
/// 3. Lowercase the hostname
/// 4. Block loopback names and addresses ([`Error::LoopbackBlocked`])
/// 5. Block private and link-local IPv4 ranges ([`Error::PrivateIpBlocked`])
/// 6. Block unique-local and link-local IPv6 ranges ([`Error::PrivateIpBlocked`])
///
/// No DNS lookup happens here. A domain name is judged by its spelling only.
///
/// # Example
///
/// ```rust
/// use url_gate::{classify, Error};
///
/// let url = classify("https://example.com/page").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
///
/// assert!(matches!(
///     classify("http://localhost:8080/admin"),
///     Err(Error::LoopbackBlocked { .. })
/// ));
/// ```
pub fn classify(candidate: &str) -> Result<ParsedUrl, Error> {
    Classifier::default().classify(candidate)
}

/// A classifier bound to a [`Policy`].
///
/// Stateless apart from its policy; share it freely across threads.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    policy: Policy,
}

impl Classifier {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Classify `candidate` under this classifier's policy. See [`classify`].
    pub fn classify(&self, candidate: &str) -> Result<ParsedUrl, Error> {
        let result = self.check(candidate);
        match &result {
            Ok(url) => debug!(url = %url, "URL classified as safe"),
            Err(e) => warn!(url = %candidate, error = %e, "URL rejected"),
        }
        result
    }

    fn check(&self, candidate: &str) -> Result<ParsedUrl, Error> {
        let url = ParsedUrl::parse(candidate, self.policy.strict_ip_encoding())?;

        if is_loopback_hostname(url.host()) {
            return Err(Error::loopback_blocked(candidate, url.host()));
        }

        let Some(ip) = url.ip() else {
            return Ok(url);
        };

        if is_loopback_ip(ip) {
            return Err(Error::loopback_blocked(candidate, url.host()));
        }

        if let Some(range) = blocked_range(ip).or_else(|| self.policy.custom_block(ip)) {
            return Err(Error::private_ip_blocked(candidate, url.host(), range));
        }

        Ok(url)
    }
}
