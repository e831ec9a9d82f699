//! Observation ingestion
//!
//! Reads newline-delimited vision frames from the producer stream and turns
//! each into an [`Ingest`] outcome. Framing is explicit: a frame ends at
//! `\n`, so records that TCP merges or splits across reads are reassembled
//! correctly. `receive` is the session loop's only suspension point.

use std::time::Duration;

use cogni_common::{DecodeError, VisionObservation};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::trace;

use crate::error::{Error, Result};

/// Outcome of one `receive` call
#[derive(Debug)]
pub enum Ingest {
    /// A validated observation
    Observation(VisionObservation),
    /// Producer closed the stream; end the session
    EndOfStream,
    /// Frame rejected; skip the cycle and keep going
    Malformed(DecodeError),
}

/// Ingestion limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    /// Largest accepted frame, excluding the newline
    pub max_frame_bytes: usize,
    /// Bound on how long `receive` may wait; `None` waits forever
    pub receive_timeout: Option<Duration>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: 4096,
            receive_timeout: Some(Duration::from_secs(5)),
        }
    }
}

enum Frame {
    Line,
    Oversized,
    End,
}

/// Decoder for a stream of vision frames
pub struct ObservationStream<R> {
    reader: BufReader<R>,
    config: IngestConfig,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> ObservationStream<R> {
    pub fn new(inner: R, config: IngestConfig) -> Self {
        Self {
            reader: BufReader::new(inner),
            config,
            buf: Vec::with_capacity(256),
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Wait for the next frame and decode it
    ///
    /// Transport errors and receive timeouts are session-fatal and come back
    /// as `Err`. Undecodable frames are not errors.
    pub async fn receive(&mut self) -> Result<Ingest> {
        let frame = match self.config.receive_timeout {
            Some(limit) => tokio::time::timeout(limit, self.next_frame())
                .await
                .map_err(|_| Error::ReceiveTimeout(limit))??,
            None => self.next_frame().await?,
        };

        Ok(match frame {
            Frame::End => Ingest::EndOfStream,
            Frame::Oversized => Ingest::Malformed(DecodeError::FrameTooLarge {
                limit: self.config.max_frame_bytes,
            }),
            Frame::Line => match VisionObservation::decode(&self.buf) {
                Ok(observation) => Ingest::Observation(observation),
                Err(e) => Ingest::Malformed(e),
            },
        })
    }

    /// Read the next non-blank line into `self.buf`, without its terminator
    async fn next_frame(&mut self) -> std::io::Result<Frame> {
        let max = self.config.max_frame_bytes;
        // Frame body plus an optional '\r' and the '\n'
        let read_limit = max as u64 + 2;
        loop {
            self.buf.clear();
            let n = (&mut self.reader)
                .take(read_limit)
                .read_until(b'\n', &mut self.buf)
                .await?;
            if n == 0 {
                return Ok(Frame::End);
            }

            let terminated = self.buf.last() == Some(&b'\n');
            if !terminated && n as u64 >= read_limit {
                let discarded = self.discard_rest_of_line().await?;
                trace!("Discarded oversized frame ({} bytes)", n + discarded);
                return Ok(Frame::Oversized);
            }

            if terminated {
                self.buf.pop();
            }
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
            if self.buf.len() > max {
                trace!("Rejected oversized frame ({} bytes)", self.buf.len());
                return Ok(Frame::Oversized);
            }
            if self.buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Frame::Line);
        }
    }

    /// Skip input up to and including the next newline (or EOF)
    async fn discard_rest_of_line(&mut self) -> std::io::Result<usize> {
        let mut discarded = 0;
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(discarded);
            }
            match available.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    self.reader.consume(pos + 1);
                    return Ok(discarded + pos + 1);
                }
                None => {
                    let len = available.len();
                    self.reader.consume(len);
                    discarded += len;
                }
            }
        }
    }
}
