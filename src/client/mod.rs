use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::debug;

use crate::criteria::FilterCriteria;
use crate::student::StudentRecord;

pub const STUDENTS_PATH: &str = "api/students";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid header '{header}', expected 'Key: Value'")]
    InvalidHeader { header: String },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to encode search criteria: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("malformed student list: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}

/// Anything that can answer a page of a student search.
pub trait SearchApi {
    fn fetch_page<'a>(
        &'a self,
        criteria: &'a FilterCriteria,
    ) -> BoxFuture<'a, Result<Vec<StudentRecord>, ClientError>>;
}

impl<T: SearchApi + ?Sized> SearchApi for &T {
    fn fetch_page<'a>(
        &'a self,
        criteria: &'a FilterCriteria,
    ) -> BoxFuture<'a, Result<Vec<StudentRecord>, ClientError>> {
        (**self).fetch_page(criteria)
    }
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub header: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/".to_string(),
            timeout_seconds: 10,
            proxy: None,
            header: None,
        }
    }
}

pub fn students_endpoint(base_url: &str) -> Result<reqwest::Url, ClientError> {
    let trimmed = base_url.trim();
    let mut base = reqwest::Url::parse(trimmed).map_err(|e| ClientError::InvalidUrl {
        url: trimmed.to_string(),
        message: e.to_string(),
    })?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(STUDENTS_PATH)
        .map_err(|e| ClientError::InvalidUrl {
            url: trimmed.to_string(),
            message: e.to_string(),
        })
}

pub fn parse_header(raw: &str) -> Result<(String, String), ClientError> {
    let invalid = || ClientError::InvalidHeader {
        header: raw.to_string(),
    };
    let (key, value) = raw.split_once(':').ok_or_else(invalid)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[derive(Clone, Debug)]
pub struct HttpSearchApi {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpSearchApi {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        let endpoint = students_endpoint(&options.base_url)?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!(
                "studentdir/",
                env!("CARGO_PKG_VERSION")
            )),
        );
        if let Some(raw) = options.header.as_deref().filter(|h| !h.trim().is_empty()) {
            let (key, value) = parse_header(raw)?;
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                ClientError::InvalidHeader {
                    header: raw.to_string(),
                }
            })?;
            let value = reqwest::header::HeaderValue::from_str(&value).map_err(|_| {
                ClientError::InvalidHeader {
                    header: raw.to_string(),
                }
            })?;
            headers.insert(name, value);
        }

        let timeout = Duration::from_secs(options.timeout_seconds.try_into().unwrap_or(10));
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout);

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| ClientError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::HttpClientBuild { source: e })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

impl SearchApi for HttpSearchApi {
    fn fetch_page<'a>(
        &'a self,
        criteria: &'a FilterCriteria,
    ) -> BoxFuture<'a, Result<Vec<StudentRecord>, ClientError>> {
        Box::pin(async move {
            let body =
                serde_json::to_vec(criteria).map_err(|e| ClientError::Encode { source: e })?;
            debug!(url = %self.endpoint, page = criteria.page, "requesting student page");
            let response = self
                .client
                .post(self.endpoint.clone())
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
                .map_err(|e| ClientError::Transport {
                    url: self.endpoint.to_string(),
                    source: e,
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(ClientError::Status {
                    url: self.endpoint.to_string(),
                    status: status.as_u16(),
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| ClientError::Transport {
                    url: self.endpoint.to_string(),
                    source: e,
                })?;
            serde_json::from_slice::<Vec<StudentRecord>>(&bytes)
                .map_err(|e| ClientError::Decode { source: e })
        })
    }
}
