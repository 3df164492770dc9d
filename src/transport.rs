//! [`Transport`] backed by reqwest.

use reqwest::redirect::Policy as RedirectPolicy;
use reqwest::{header, Client, Response};

use crate::error::Error;
use crate::fetch::{Method, RequestOptions, Transport};
use crate::parsed_url::ParsedUrl;

/// Performs requests with a reqwest [`Client`] whose own redirect handling
/// is disabled.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, Error> {
        let client = Client::builder()
            .redirect(RedirectPolicy::none())
            .build()
            .map_err(|e| Error::http("", e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client. The caller must have built it with
    /// `redirect::Policy::none()`, otherwise redirects bypass classification.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl Transport for ReqwestTransport {
    type Response = Response;

    async fn send(&self, url: &ParsedUrl, options: &RequestOptions) -> Result<Response, Error> {
        let mut request = self
            .client
            .request(to_reqwest_method(options.method), url.as_str());

        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        request
            .send()
            .await
            .map_err(|e| Error::http(url.as_str(), e.to_string()))
    }

    fn redirect_location(&self, response: &Response) -> Option<String> {
        if !response.status().is_redirection() {
            return None;
        }
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}
