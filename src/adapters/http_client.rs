//! Blocking reqwest transport.

use crate::ports::http_port::{HttpError, HttpPort, HttpResponse};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

pub struct ReqwestHttp {
    client: Client,
}

impl ReqwestHttp {
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rollfolio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Transport {
                url: String::new(),
                reason: e.without_url().to_string(),
            })?;
        Ok(Self { client })
    }
}

impl HttpPort for ReqwestHttp {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, HttpError> {
        // Query strings carry the API key, so only the bare URL is logged.
        debug!(url, params = query.len(), "GET");
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                HttpError::Timeout {
                    url: url.to_string(),
                }
            } else {
                HttpError::Transport {
                    url: url.to_string(),
                    reason: e.without_url().to_string(),
                }
            }
        };

        let response = self.client.get(url).query(query).send().map_err(map_err)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().map_err(map_err)?.to_vec();
        debug!(url, status, bytes = body.len(), "response");

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}
