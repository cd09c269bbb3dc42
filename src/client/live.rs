//! Blocking consumer for the live analytics endpoints

use std::io::{BufRead, BufReader};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::analytics::RealtimeSnapshot;
use crate::api::services::admin::ApiResponse;
use crate::errors::{FolioError, Result};

pub const DEFAULT_MAX_FAILURES: u32 = 5;
const BASE_BACKOFF_SECS: u64 = 1;
const MAX_BACKOFF_SECS: u64 = 30;

/// How the client is currently receiving snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMethod {
    Stream,
    Polling,
}

/// One parsed SSE frame from the live stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    Data(String),
    ErrorEvent(String),
}

/// Backoff for the Nth consecutive failure: 1s doubled each time,
/// capped at 30s
pub fn backoff_delay(consecutive_failures: u32) -> Duration {
    let exponent = consecutive_failures.saturating_sub(1).min(63);
    let secs = BASE_BACKOFF_SECS
        .checked_shl(exponent)
        .unwrap_or(MAX_BACKOFF_SECS)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

/// Decide the method after a failure; Polling is a one-way door
pub fn method_after_failure(
    current: ConnectionMethod,
    consecutive_failures: u32,
    max_failures: u32,
) -> ConnectionMethod {
    match current {
        ConnectionMethod::Polling => ConnectionMethod::Polling,
        ConnectionMethod::Stream if consecutive_failures >= max_failures => {
            ConnectionMethod::Polling
        }
        ConnectionMethod::Stream => ConnectionMethod::Stream,
    }
}

/// Parse one blank-line-delimited SSE block
pub fn parse_frame(block: &str) -> Option<SseFrame> {
    let mut event_name: Option<&str> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event_name = Some(rest.trim());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim_start());
        }
    }

    if data_lines.is_empty() {
        return None;
    }
    let data = data_lines.join("\n");

    match event_name {
        Some("error") => Some(SseFrame::ErrorEvent(data)),
        _ => Some(SseFrame::Data(data)),
    }
}

pub struct LiveClientConfig {
    /// Server base, e.g. `http://127.0.0.1:8080`
    pub base_url: String,
    /// Bearer token for the admin API
    pub token: String,
    pub max_failures: u32,
    pub poll_interval: Duration,
}

impl LiveClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            max_failures: DEFAULT_MAX_FAILURES,
            poll_interval: Duration::from_secs(10),
        }
    }
}

pub struct LiveClient {
    agent: ureq::Agent,
    config: LiveClientConfig,
    method: ConnectionMethod,
    consecutive_failures: u32,
}

impl LiveClient {
    pub fn new(config: LiveClientConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(330)))
            .build()
            .into();

        Self {
            agent,
            config,
            method: ConnectionMethod::Stream,
            consecutive_failures: 0,
        }
    }

    pub fn method(&self) -> ConnectionMethod {
        self.method
    }

    /// Consume snapshots until the callback returns `false`
    pub fn run<F>(&mut self, mut on_snapshot: F) -> Result<()>
    where
        F: FnMut(RealtimeSnapshot) -> bool,
    {
        loop {
            let result = match self.method {
                ConnectionMethod::Stream => self.consume_stream(&mut on_snapshot),
                ConnectionMethod::Polling => self.poll_once(&mut on_snapshot),
            };

            match result {
                Ok(false) => return Ok(()),
                Ok(true) => {
                    self.consecutive_failures = 0;
                    if self.method == ConnectionMethod::Polling {
                        std::thread::sleep(self.config.poll_interval);
                    }
                }
                Err(e) => {
                    self.consecutive_failures += 1;
                    warn!(
                        "Live client failure {} via {:?}: {}",
                        self.consecutive_failures, self.method, e
                    );

                    let next = method_after_failure(
                        self.method,
                        self.consecutive_failures,
                        self.config.max_failures,
                    );
                    if next != self.method {
                        info!("Live stream unreachable, switching to polling");
                        self.consecutive_failures = 0;
                    }
                    self.method = next;

                    std::thread::sleep(backoff_delay(self.consecutive_failures.max(1)));
                }
            }
        }
    }

    /// Read the SSE stream until the callback stops or the connection
    /// drops. Returns Ok(true) when at least one frame arrived before a
    /// clean end of stream.
    fn consume_stream<F>(&self, on_snapshot: &mut F) -> Result<bool>
    where
        F: FnMut(RealtimeSnapshot) -> bool,
    {
        let url = format!("{}/admin/v1/analytics/live", self.config.base_url);
        let response = self
            .agent
            .get(&url)
            .header("Authorization", &format!("Bearer {}", self.config.token))
            .header("Accept", "text/event-stream")
            .call()
            .map_err(|e| FolioError::external_service(format!("stream connect: {}", e)))?;

        let reader = BufReader::new(response.into_body().into_reader());
        let mut block = String::new();
        let mut got_frame = false;

        for line in reader.lines() {
            let line =
                line.map_err(|e| FolioError::external_service(format!("stream read: {}", e)))?;

            if line.is_empty() {
                if let Some(frame) = parse_frame(&block) {
                    got_frame = true;
                    match frame {
                        SseFrame::Data(json) => match serde_json::from_str(&json) {
                            Ok(snapshot) => {
                                if !on_snapshot(snapshot) {
                                    return Ok(false);
                                }
                            }
                            Err(e) => debug!("Skipping unparsable frame: {}", e),
                        },
                        SseFrame::ErrorEvent(payload) => {
                            warn!("Server reported stream error: {}", payload);
                        }
                    }
                }
                block.clear();
            } else {
                block.push_str(&line);
                block.push('\n');
            }
        }

        if got_frame {
            Ok(true)
        } else {
            Err(FolioError::external_service("stream ended without data"))
        }
    }

    fn poll_once<F>(&self, on_snapshot: &mut F) -> Result<bool>
    where
        F: FnMut(RealtimeSnapshot) -> bool,
    {
        let url = format!("{}/admin/v1/analytics/realtime", self.config.base_url);
        let envelope: ApiResponse<RealtimeSnapshot> = self
            .agent
            .get(&url)
            .header("Authorization", &format!("Bearer {}", self.config.token))
            .call()
            .map_err(|e| FolioError::external_service(format!("poll: {}", e)))?
            .into_body()
            .read_json()
            .map_err(|e| FolioError::external_service(format!("poll decode: {}", e)))?;

        match envelope.data {
            Some(snapshot) => Ok(on_snapshot(snapshot)),
            None => Err(FolioError::external_service(
                envelope.error.unwrap_or_else(|| "empty response".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
        assert_eq!(backoff_delay(5), Duration::from_secs(16));
        assert_eq!(backoff_delay(6), Duration::from_secs(30));
        assert_eq!(backoff_delay(60), Duration::from_secs(30));
    }

    #[test]
    fn test_stream_failures_switch_to_polling() {
        let mut method = ConnectionMethod::Stream;
        for failures in 1..DEFAULT_MAX_FAILURES {
            method = method_after_failure(method, failures, DEFAULT_MAX_FAILURES);
            assert_eq!(method, ConnectionMethod::Stream);
        }

        method = method_after_failure(method, DEFAULT_MAX_FAILURES, DEFAULT_MAX_FAILURES);
        assert_eq!(method, ConnectionMethod::Polling);
    }

    #[test]
    fn test_polling_is_permanent() {
        // Even a single failure keeps polling once there
        assert_eq!(
            method_after_failure(ConnectionMethod::Polling, 1, DEFAULT_MAX_FAILURES),
            ConnectionMethod::Polling
        );
        assert_eq!(
            method_after_failure(ConnectionMethod::Polling, 100, DEFAULT_MAX_FAILURES),
            ConnectionMethod::Polling
        );
    }

    #[test]
    fn test_parse_data_frame() {
        let frame = parse_frame("data: {\"a\":1}\n");
        assert_eq!(frame, Some(SseFrame::Data("{\"a\":1}".to_string())));
    }

    #[test]
    fn test_parse_error_frame() {
        let frame = parse_frame("event: error\ndata: {\"error\":\"boom\"}\n");
        assert_eq!(
            frame,
            Some(SseFrame::ErrorEvent("{\"error\":\"boom\"}".to_string()))
        );
    }

    #[test]
    fn test_parse_ignores_comment_only_block() {
        assert_eq!(parse_frame(": keepalive\n"), None);
        assert_eq!(parse_frame(""), None);
    }
}
