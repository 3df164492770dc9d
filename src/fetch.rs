//! Gated fetching with redirect re-validation.
//!
//! The network itself is behind the [`Transport`] trait. The wrapper never
//! hands a URL to the transport unless the classifier accepted it, and it
//! re-classifies every redirect target before following it.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::classify::Classifier;
use crate::error::Error;
use crate::parsed_url::ParsedUrl;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Per-request options passed through to the [`Transport`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// A plain `GET` with no headers, body or timeout.
    pub fn get() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Options for following a redirect: `HEAD` stays `HEAD`, everything
    /// else becomes `GET`. Headers and body are dropped so credentials
    /// never travel to the redirect target.
    ///
    /// This applies to 307 and 308 as well, which HTTP says should repeat
    /// the original method and body. A non-idempotent request that gets a
    /// 307/308 is therefore not replayed; the follow-up is a plain `GET`.
    fn redirected(&self) -> Self {
        let method = match self.method {
            Method::Head => Method::Head,
            _ => Method::Get,
        };
        Self {
            method,
            headers: Vec::new(),
            body: None,
            timeout: self.timeout,
        }
    }
}

/// The capability that actually performs HTTP requests.
///
/// Implementations must not follow redirects themselves; they report the
/// `Location` through [`redirect_location`](Transport::redirect_location)
/// and let the wrapper classify it.
pub trait Transport {
    type Response;

    /// Perform one request to an already classified URL.
    fn send(
        &self,
        url: &ParsedUrl,
        options: &RequestOptions,
    ) -> impl Future<Output = Result<Self::Response, Error>> + Send;

    /// The raw `Location` of a redirect response, or `None` when the
    /// response is final.
    fn redirect_location(&self, response: &Self::Response) -> Option<String>;
}

/// Final response plus every URL that was requested to get there.
#[derive(Debug)]
pub struct FetchResult<R> {
    pub response: R,

    /// Classified URLs in request order, the original first.
    pub chain: Vec<ParsedUrl>,
}

impl<R> FetchResult<R> {
    /// Number of redirects followed.
    pub fn redirects(&self) -> usize {
        self.chain.len().saturating_sub(1)
    }
}

/// Classify `candidate` with the default policy and, only if it is safe,
/// fetch it through `transport`.
///
/// # Example
///
/// ```rust,no_run
/// use url_gate::{fetch_if_safe, RequestOptions, ReqwestTransport};
///
/// # async fn example() -> Result<(), url_gate::Error> {
/// let transport = ReqwestTransport::new()?;
/// let result = fetch_if_safe(&transport, "https://example.com/", &RequestOptions::get()).await?;
/// println!("{} after {} redirects", result.response.status(), result.redirects());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_if_safe<T: Transport>(
    transport: &T,
    candidate: &str,
    options: &RequestOptions,
) -> Result<FetchResult<T::Response>, Error> {
    Classifier::default()
        .fetch_if_safe(transport, candidate, options)
        .await
}

impl Classifier {
    /// [`fetch_if_safe`] under this classifier's policy.
    pub async fn fetch_if_safe<T: Transport>(
        &self,
        transport: &T,
        candidate: &str,
        options: &RequestOptions,
    ) -> Result<FetchResult<T::Response>, Error> {
        let max = self.policy().max_redirects();
        let redirect_options = options.redirected();

        let mut current = self.classify(candidate)?;
        let mut chain = Vec::new();

        loop {
            let request = if chain.is_empty() {
                options
            } else {
                &redirect_options
            };

            debug!(url = %current, method = request.method.as_str(), hop = chain.len(), "sending request");
            let response = transport.send(&current, request).await?;
            let location = transport.redirect_location(&response);
            chain.push(current.clone());

            let Some(location) = location else {
                return Ok(FetchResult { response, chain });
            };

            if chain.len() > usize::from(max) {
                warn!(url = %candidate, max, "redirect limit reached");
                return Err(Error::TooManyRedirects {
                    url: candidate.to_string(),
                    max,
                });
            }

            let redirect_blocked = |redirect_url: &str, source: Error| Error::RedirectBlocked {
                original_url: candidate.to_string(),
                redirect_url: redirect_url.to_string(),
                source: Box::new(source),
            };

            let next = current
                .join(&location)
                .map_err(|e| redirect_blocked(&location, e))?;
            debug!(from = %current, to = %next, "following redirect");
            current = self
                .classify(&next)
                .map_err(|e| redirect_blocked(&next, e))?;
        }
    }
}
