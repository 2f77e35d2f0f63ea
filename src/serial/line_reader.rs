use std::io::{BufRead, BufReader, ErrorKind, Read};

use super::Result;

/// Longest partial record kept while waiting for its terminator.
pub const MAX_PENDING_BYTES: usize = 4096;

/// Assembles newline-delimited records from a timeout-bounded byte stream.
///
/// Bytes that arrive before a read timeout are kept and completed by later
/// reads, so a record split across two timeouts is still delivered whole.
pub struct LineReader<R> {
    inner: BufReader<R>,
    pending: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            pending: Vec::new(),
        }
    }

    pub fn get_mut(&mut self) -> &mut R {
        self.inner.get_mut()
    }

    /// Bytes received so far for a record whose terminator has not arrived.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Next complete record without its `\n` / `\r\n` terminator.
    ///
    /// `Ok(None)` means no complete record arrived before the underlying
    /// read timed out, the stream hit end-of-file, or the pending record
    /// outgrew `MAX_PENDING_BYTES` and was dropped. Blank records are skipped.
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };
            if available.is_empty() {
                return Ok(None);
            }

            // Never take more than one byte past the limit per chunk
            let room = MAX_PENDING_BYTES + 1 - self.pending.len();
            let window = &available[..available.len().min(room)];
            let (used, complete) = match window.iter().position(|&b| b == b'\n') {
                Some(idx) => (idx + 1, true),
                None => (window.len(), false),
            };
            self.pending.extend_from_slice(&window[..used]);
            self.inner.consume(used);

            if !complete {
                if self.pending.len() > MAX_PENDING_BYTES {
                    log::warn!(
                        "Discarding {} bytes of unterminated serial data",
                        self.pending.len()
                    );
                    self.pending.clear();
                    return Ok(None);
                }
                continue;
            }

            let mut line = std::mem::take(&mut self.pending);
            while matches!(line.last(), Some(b'\n' | b'\r')) {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Some(line));
        }
    }
}
