// src/source/mod.rs
//! Raw event source
//!
//! Feeds newline-delimited JSON `RawEvent`s from any async reader (stdin,
//! a socket, a file) into the pipeline, one at a time and in arrival order.
//!
//! ```text
//! {"sourceApplication":"com.whatsapp","title":"Group: Alice","body":"3 on 5","key":{"id":42}}
//! ```

use crate::pipeline::{Admission, EventPipeline, NotificationKey, RawEvent, Suppressor};
use crate::utils::errors::{ReaderError, Result};
use futures::StreamExt;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

/// Longest accepted line; longer lines are skipped
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Counts of what a source run consumed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub lines: u64,
    pub events: u64,
    pub undecodable: u64,
    pub admitted: u64,
}

pub struct JsonLinesSource<R> {
    lines: FramedRead<R, LinesCodec>,
    pipeline: Arc<EventPipeline>,
}

impl<R: AsyncRead + Unpin> JsonLinesSource<R> {
    pub fn new(reader: R, pipeline: Arc<EventPipeline>) -> Self {
        Self {
            lines: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)),
            pipeline,
        }
    }

    /// Process events until the reader reaches EOF
    pub async fn run(mut self) -> Result<SourceStats> {
        let mut stats = SourceStats::default();

        while let Some(line) = self.lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!("Skipping line longer than {} bytes", MAX_LINE_LENGTH);
                    stats.lines += 1;
                    stats.undecodable += 1;
                    continue;
                }
                Err(LinesCodecError::Io(e)) => {
                    return Err(ReaderError::SourceFailed(format!("Failed to read events: {}", e)));
                }
            };

            stats.lines += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let raw: RawEvent = match serde_json::from_str(line) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Skipping undecodable event: {}", e);
                    stats.undecodable += 1;
                    continue;
                }
            };

            stats.events += 1;
            if let Admission::Admitted(_) = self.pipeline.process(&raw) {
                stats.admitted += 1;
            }
        }

        info!(
            lines = stats.lines,
            events = stats.events,
            admitted = stats.admitted,
            "Event source reached end of input"
        );
        Ok(stats)
    }
}

/// Suppressor for sources that cannot dismiss notifications themselves
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSuppressor;

impl Suppressor for LoggingSuppressor {
    fn suppress(&self, key: &NotificationKey) {
        debug!(tag = ?key.tag, id = key.id, "Dismiss notification");
    }
}
