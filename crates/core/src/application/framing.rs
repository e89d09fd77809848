//! Stream Framing
//!
//! JSON-RPC over a stream socket has no message delimiter. Frames are cut
//! at JSON value boundaries found by a streaming parse, so newline-delimited
//! daemons, daemons that write objects back to back, and reads that split or
//! coalesce objects are all handled the same way.

use serde::de::IgnoredAny;

use crate::port::TransportError;

/// Incremental splitter from raw bytes to complete JSON values
///
/// Value boundaries are found by a byte scanner that resumes where the last
/// `next_frame` stopped, so a frame arriving in many reads is scanned once.
/// The full JSON parse runs once per frame, after the scanner sees it close.
pub struct FrameDecoder {
    buf: Vec<u8>,
    max_frame_bytes: usize,
    scan: Scan,
}

/// Scanner position inside the frame at the head of `buf`
#[derive(Debug, Default)]
struct Scan {
    /// Bytes of the current frame already looked at
    pos: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl FrameDecoder {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_frame_bytes,
            scan: Scan::default(),
        }
    }

    /// Append bytes read from the stream
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// True when a value has started but not finished
    pub fn has_partial_frame(&self) -> bool {
        self.buf.iter().any(|b| !b.is_ascii_whitespace())
    }

    /// Pop the next complete value, if the buffer holds one
    ///
    /// # Errors
    /// - TransportError::InvalidFrame if the bytes are not JSON, or a value does
    ///   not start with `{` or `[`
    /// - TransportError::FrameTooLarge once a value grows past the limit
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.scan.pos == 0 {
            let start = match self.buf.iter().position(|b| !b.is_ascii_whitespace()) {
                Some(start) => start,
                None => {
                    self.buf.clear();
                    return Ok(None);
                }
            };
            self.buf.drain(..start);

            // Bare scalars can't be split safely (`12` may continue as `123`)
            if !matches!(self.buf[0], b'{' | b'[') {
                return Err(TransportError::InvalidFrame(format!(
                    "expected a JSON object, found byte 0x{:02x}",
                    self.buf[0]
                )));
            }
        }

        match self.scan_to_close() {
            Some(end) => {
                self.scan = Scan::default();
                if end > self.max_frame_bytes {
                    return Err(TransportError::FrameTooLarge {
                        limit: self.max_frame_bytes,
                    });
                }
                let frame: Vec<u8> = self.buf.drain(..end).collect();
                serde_json::from_slice::<IgnoredAny>(&frame)
                    .map_err(|e| TransportError::InvalidFrame(e.to_string()))?;
                Ok(Some(frame))
            }
            None if self.buf.len() > self.max_frame_bytes => Err(TransportError::FrameTooLarge {
                limit: self.max_frame_bytes,
            }),
            None => Ok(None),
        }
    }

    /// Advance the scanner over new bytes; returns the frame length once the
    /// outermost bracket closes
    fn scan_to_close(&mut self) -> Option<usize> {
        let scan = &mut self.scan;
        let limit = self.buf.len().min(self.max_frame_bytes.saturating_add(1));

        while scan.pos < limit {
            let byte = self.buf[scan.pos];
            scan.pos += 1;

            if scan.in_string {
                if scan.escaped {
                    scan.escaped = false;
                } else if byte == b'\\' {
                    scan.escaped = true;
                } else if byte == b'"' {
                    scan.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => scan.in_string = true,
                b'{' | b'[' => scan.depth += 1,
                b'}' | b']' => {
                    scan.depth = scan.depth.saturating_sub(1);
                    if scan.depth == 0 {
                        return Some(scan.pos);
                    }
                }
                _ => {}
            }
        }
        None
    }
}
