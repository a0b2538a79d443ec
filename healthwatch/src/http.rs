//! HTTP probe
//!

use super::error::ProbeError;
use super::probe::Probe;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use tokio::time::Duration;
use tracing::debug;

/// Username and password for basic authentication
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Options for the HTTP probe
///
/// `new` fills in the defaults, the `with_*` methods override single fields.
///
/// # Defaults
/// * method: `HEAD`
/// * expected status: `200`
/// * timeout: 30 seconds
#[derive(Clone, Debug, Deserialize)]
pub struct HttpProbeOptions {
    pub url: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default = "default_expected_status")]
    pub expected_status: u16,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// Sent in order; repeating a key adds another value.
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    /// Used instead of a client built from `timeout`.
    #[serde(skip)]
    pub client: Option<Client>,
}

fn default_method() -> String {
    Method::HEAD.to_string()
}

fn default_expected_status() -> u16 {
    200
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl HttpProbeOptions {
    pub fn new<T: AsRef<str>>(url: T) -> HttpProbeOptions {
        HttpProbeOptions {
            url: url.as_ref().to_string(),
            method: default_method(),
            expected_status: default_expected_status(),
            timeout: default_timeout(),
            credentials: None,
            headers: Vec::new(),
            client: None,
        }
    }

    /// Set the HTTP method, e.g. `"GET"` or `"POST"`
    pub fn with_method<T: AsRef<str>>(mut self, method: T) -> Self {
        self.method = method.as_ref().to_string();
        self
    }

    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    /// Set the timeout for the whole request
    ///
    /// Has no effect together with [`HttpProbeOptions::with_client`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_basic_auth<T: AsRef<str>>(mut self, username: T, password: T) -> Self {
        self.credentials = Some(Credentials {
            username: username.as_ref().to_string(),
            password: password.as_ref().to_string(),
        });
        self
    }

    /// Add a header to the request
    ///
    /// Headers are additive, the same key may be added more than once.
    pub fn with_header<T: AsRef<str>>(mut self, key: T, value: T) -> Self {
        self.headers
            .push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Execute the request with a caller supplied client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }
}

/// HTTP probe
///
/// Sends one request per check and compares the response status with the
/// expected one.
///
/// # Examples
/// ```rust,no_run
/// use healthwatch::http::{HttpProbe, HttpProbeOptions};
/// use healthwatch::Probe;
///
/// #[tokio::main]
/// async fn main() {
///     let probe = HttpProbe::with_options(
///         HttpProbeOptions::new("http://localhost:8080/healthy")
///             .with_method("POST")                        // optional
///             .with_header("Content-Type", "nothing")     // optional
///             .with_basic_auth("trillian", "tricia123")   // optional
///             .with_expected_status(204),                 // optional
///     );
///     let _ = probe.check().await;
/// }
/// ```
#[derive(Clone, Debug)]
pub struct HttpProbe {
    options: HttpProbeOptions,
}

impl HttpProbe {
    /// Create a probe for `url` with the default options
    pub fn new<T: AsRef<str>>(url: T) -> HttpProbe {
        HttpProbe::with_options(HttpProbeOptions::new(url))
    }

    pub fn with_options(options: HttpProbeOptions) -> HttpProbe {
        HttpProbe { options }
    }

    pub fn url(&self) -> &str {
        &self.options.url
    }

    pub fn options(&self) -> &HttpProbeOptions {
        &self.options
    }

    fn invalid_request<E: ToString>(&self, reason: E) -> ProbeError {
        ProbeError::InvalidRequest {
            method: self.options.method.clone(),
            url: self.options.url.clone(),
            reason: reason.to_string(),
        }
    }

    fn client(&self) -> Result<Client, ProbeError> {
        if let Some(client) = &self.options.client {
            return Ok(client.clone());
        }

        Client::builder()
            .timeout(self.options.timeout)
            .build()
            .map_err(|source| ProbeError::Client {
                url: self.options.url.clone(),
                source,
            })
    }

    fn request(&self, client: &Client) -> Result<reqwest::Request, ProbeError> {
        let method = Method::from_bytes(self.options.method.as_bytes())
            .map_err(|e| self.invalid_request(e))?;
        let url = Url::parse(&self.options.url).map_err(|e| self.invalid_request(e))?;

        let mut request = client.request(method, url);

        if let Some(credentials) = &self.options.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        for (key, value) in self.options.headers.iter() {
            let name =
                HeaderName::from_bytes(key.as_bytes()).map_err(|e| self.invalid_request(e))?;
            let value = HeaderValue::from_str(value).map_err(|e| self.invalid_request(e))?;
            request = request.header(name, value);
        }

        request.build().map_err(|e| self.invalid_request(e))
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        let client = self.client()?;
        let request = self.request(&client)?;

        debug!("http probe sending {} {}", request.method(), self.options.url);

        let response = client
            .execute(request)
            .await
            .map_err(|source| ProbeError::Request {
                url: self.options.url.clone(),
                source,
            })?;

        let actual = response.status().as_u16();
        if actual != self.options.expected_status {
            return Err(ProbeError::UnexpectedStatus {
                url: self.options.url.clone(),
                actual,
                expected: self.options.expected_status,
            });
        }

        debug!("http probe for {} succeeded", self.options.url);
        Ok(())
    }
}
