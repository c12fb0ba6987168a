use crate::error::FetchError;
use crate::query::FetchRequest;
use crate::record::{decode_records, LogRecord};
use std::sync::mpsc;

#[derive(Debug)]
pub struct FetchOutcome {
    pub seq: u64,
    pub result: Result<Vec<LogRecord>, FetchError>,
}

/// Runs query requests off the UI thread and hands their outcomes back
/// through a channel that the UI drains once per frame.
pub struct LogFetcher {
    sender: mpsc::Sender<FetchOutcome>,
    receiver: mpsc::Receiver<FetchOutcome>,
    in_flight: usize,
}

impl LogFetcher {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            in_flight: 0,
        }
    }

    pub fn fetch(&mut self, request: FetchRequest, ctx: &egui::Context) {
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        let seq = request.seq;

        log::info!("Fetching logs (request #{}): {}", seq, request.url);
        ehttp::fetch(ehttp::Request::get(&request.url), move |response| {
            let result = response
                .map_err(FetchError::Transport)
                .and_then(|response| {
                    interpret_response(
                        response.ok,
                        response.status,
                        &response.status_text,
                        &response.bytes,
                    )
                });
            // The receiver is gone only while the app is shutting down.
            sender.send(FetchOutcome { seq, result }).ok();
            ctx.request_repaint();
        });
        self.in_flight += 1;
    }

    pub fn poll(&mut self) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.receiver.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Default for LogFetcher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn interpret_response(
    ok: bool,
    status: u16,
    status_text: &str,
    bytes: &[u8],
) -> Result<Vec<LogRecord>, FetchError> {
    if !ok {
        return Err(FetchError::Endpoint {
            status,
            status_text: status_text.to_string(),
            body: String::from_utf8_lossy(bytes).into_owned(),
        });
    }
    Ok(decode_records(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_decodes_records() {
        let records = interpret_response(true, 200, "OK", br#"[{"message":"a"},{"message":"b"}]"#).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_null_body_is_empty_result() {
        let records = interpret_response(true, 200, "OK", b"null").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_non_success_status_carries_body() {
        let err = interpret_response(false, 500, "Internal Server Error", b"db unavailable").unwrap_err();
        assert!(matches!(err, FetchError::Endpoint { status: 500, .. }));
        assert_eq!(err.to_string(), "db unavailable");
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        let err = interpret_response(true, 200, "OK", b"<html>").unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn test_poll_drains_channel() {
        let mut fetcher = LogFetcher::new();
        fetcher.in_flight = 2;
        fetcher
            .sender
            .send(FetchOutcome { seq: 1, result: Ok(Vec::new()) })
            .unwrap();
        fetcher
            .sender
            .send(FetchOutcome { seq: 2, result: Err(FetchError::Transport("offline".into())) })
            .unwrap();

        let outcomes = fetcher.poll();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[1].seq, 2);
        assert_eq!(fetcher.in_flight(), 0);
        assert!(fetcher.poll().is_empty());
    }
}
