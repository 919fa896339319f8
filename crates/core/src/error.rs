use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Census,
    Fred,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upstream::Census => f.write_str("census"),
            Upstream::Fred => f.write_str("fred"),
        }
    }
}

/// The response body is for logs only and never appears in `Display`.
#[derive(Debug, Clone)]
pub struct UpstreamError {
    pub upstream: Upstream,
    pub stage: &'static str,
    pub target: String,
    pub detail: String,
    pub status: Option<u16>,
    pub body: Option<String>,
}

impl UpstreamError {
    pub fn request(upstream: Upstream, target: impl Into<String>, err: reqwest::Error) -> Self {
        Self {
            upstream,
            stage: "request",
            target: target.into(),
            // The URL carries the API key as a query parameter.
            detail: err.without_url().to_string(),
            status: None,
            body: None,
        }
    }

    pub fn status(
        upstream: Upstream,
        target: impl Into<String>,
        status: reqwest::StatusCode,
        body: String,
    ) -> Self {
        Self {
            upstream,
            stage: "status",
            target: target.into(),
            detail: format!("HTTP {status}"),
            status: Some(status.as_u16()),
            body: Some(body),
        }
    }

    pub fn decode(upstream: Upstream, target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            upstream,
            stage: "decode",
            target: target.into(),
            detail: detail.into(),
            status: None,
            body: None,
        }
    }

    pub fn log(&self) {
        tracing::error!(
            upstream = %self.upstream,
            stage = self.stage,
            subject = %self.target,
            http_status = ?self.status,
            body = self.body.as_deref().unwrap_or(""),
            "upstream call failed: {}",
            self.detail
        );
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} failed for {}: {}",
            self.upstream, self.stage, self.target, self.detail
        )
    }
}

impl std::error::Error for UpstreamError {}

pub fn log_failure(err: &anyhow::Error, what: &str) {
    match err.downcast_ref::<UpstreamError>() {
        Some(upstream) => upstream.log(),
        None => tracing::error!(error = %format!("{err:#}"), "{what} failed"),
    }
}
