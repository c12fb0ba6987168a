use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{0}")]
    Transport(String),

    #[error("{}", endpoint_detail(.status, .status_text, .body))]
    Endpoint {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

fn endpoint_detail(status: &u16, status_text: &str, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {} {}", status, status_text).trim_end().to_string()
    } else {
        body.to_string()
    }
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Endpoint { .. } => "endpoint",
            FetchError::Decode(_) => "decode",
        }
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write export file '{path}': {cause}")]
    Write { path: PathBuf, cause: io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_error_uses_body() {
        let err = FetchError::Endpoint {
            status: 500,
            status_text: "Internal Server Error".into(),
            body: "db unavailable\n".into(),
        };
        assert_eq!(err.to_string(), "db unavailable");
        assert_eq!(err.kind(), "endpoint");
    }

    #[test]
    fn test_endpoint_error_without_body() {
        let err = FetchError::Endpoint {
            status: 503,
            status_text: "Service Unavailable".into(),
            body: String::new(),
        };
        assert_eq!(err.to_string(), "HTTP 503 Service Unavailable");
    }
}
