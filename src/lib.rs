//! # url_gate
//!
//! SSRF-safe classification of user-supplied URLs.
//!
//! `url_gate` decides whether an untrusted URL string may be fetched. It
//! accepts only `http`/`https`, and refuses loopback hosts and private or
//! link-local IP literals. It never resolves DNS. Use [`fetch_if_safe`] to
//! gate real requests: it only hands classified URLs to the injected
//! [`Transport`] and re-classifies every redirect hop.
//!
//! ## Quick Start
//!
//! ```rust
//! use url_gate::{classify, BlockedRange, Error};
//!
//! let url = classify("https://example.com/page")?;
//! assert_eq!(url.host(), "example.com");
//!
//! match classify("http://10.0.0.5/internal") {
//!     Err(Error::PrivateIpBlocked { range, .. }) => assert_eq!(range, BlockedRange::Private10),
//!     other => panic!("unexpected {:?}", other),
//! }
//! # Ok::<(), url_gate::Error>(())
//! ```

mod blocklist;
mod classify;
mod error;
mod fetch;
mod parsed_url;
mod policy;

#[cfg(feature = "fetch")]
mod transport;

pub use blocklist::BlockedRange;
pub use classify::{classify, Classifier};
pub use error::Error;
pub use fetch::{fetch_if_safe, FetchResult, Method, RequestOptions, Transport};
pub use parsed_url::ParsedUrl;
pub use policy::{Policy, PolicyBuilder, PolicyError, DEFAULT_MAX_REDIRECTS};

#[cfg(feature = "fetch")]
pub use transport::ReqwestTransport;
