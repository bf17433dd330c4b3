//! The streaming parser: feed arbitrary chunks, take back complete
//! serialized elements.
//!
//! State is a single growable buffer plus a cursor; each `feed` appends
//! the chunk and re-runs the scanner from the cursor in streaming mode,
//! which stops cleanly at the first construct the buffer cannot finish.
//! Completed elements are copied out verbatim (start tag through end tag)
//! the moment their end tag lands, so the buffer prefix can be discarded
//! once consumed. The open-element stack lives here, not in the scanner,
//! because it must survive chunk boundaries.

use std::collections::VecDeque;
use std::ops::Range;

use crate::error::{Error, Result};
use crate::scanner::{ScanOptions, Scanner, TokenSink};
use crate::ParseMode;

struct Capture {
    start: usize,
    depth: usize,
}

pub struct ElementStream {
    buf: Vec<u8>,
    cursor: usize,
    mode: ParseMode,
    filter: Option<Vec<u8>>,
    /// Names of open elements, concatenated; `opened_starts` marks where
    /// each begins.
    opened_buffer: Vec<u8>,
    opened_starts: Vec<usize>,
    capture: Option<Capture>,
    completed: VecDeque<Vec<u8>>,
    error: Option<Error>,
    started: bool,
}

impl ElementStream {
    /// `filter` restricts emission to elements with that exact tag name;
    /// without it every top-level element is emitted.
    pub fn new(filter: Option<&[u8]>, mode: ParseMode) -> Self {
        ElementStream {
            buf: Vec::new(),
            cursor: 0,
            mode,
            filter: filter.map(|f| f.to_vec()),
            opened_buffer: Vec::new(),
            opened_starts: Vec::new(),
            capture: None,
            completed: VecDeque::new(),
            error: None,
            started: false,
        }
    }

    /// Append a chunk and scan as far as the buffer allows. Returns the
    /// number of completed elements waiting and the current buffer size.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(usize, usize)> {
        self.check_poisoned()?;
        self.buf.extend_from_slice(chunk);
        self.run(true)?;
        Ok((self.completed.len(), self.buf.len()))
    }

    /// Drain up to `max` completed elements, in end-tag order.
    pub fn take(&mut self, max: usize) -> Vec<Vec<u8>> {
        let n = max.min(self.completed.len());
        let out: Vec<Vec<u8>> = self.completed.drain(..n).collect();
        self.compact();
        out
    }

    /// Number of completed elements waiting.
    pub fn available(&self) -> usize {
        self.completed.len()
    }

    pub fn buffer_size(&self) -> usize {
        self.buf.len()
    }

    /// Flush the residue. Leftover partial markup or unclosed elements
    /// are fatal in strict mode and ignored leniently. On failure the
    /// error latches but already-completed entries stay takeable.
    pub fn finalize(&mut self) -> Result<Vec<Vec<u8>>> {
        self.check_poisoned()?;
        match self.run(false) {
            Ok(()) => {
                if self.mode.is_strict() && !self.opened_starts.is_empty() {
                    let err = Error::UnclosedTag(self.cursor);
                    self.error = Some(err.clone());
                    return Err(err);
                }
            }
            Err(e) => {
                if self.mode.is_strict() {
                    return Err(e);
                }
                log::debug!("lenient stream finalize ignored trailing error: {e}");
            }
        }
        Ok(self.completed.drain(..).collect())
    }

    fn check_poisoned(&self) -> Result<()> {
        if self.error.is_some() {
            Err(Error::StreamPoisoned)
        } else {
            Ok(())
        }
    }

    fn run(&mut self, streaming: bool) -> Result<()> {
        let opts = ScanOptions {
            mode: self.mode,
            fragment: true,
            streaming,
            allow_xml_decl: !self.started && self.cursor == 0,
        };
        let mut scanner = Scanner::with_pos(&self.buf, self.cursor, opts);
        let mut sink = StreamSink {
            input: &self.buf,
            filter: self.filter.as_deref(),
            opened_buffer: &mut self.opened_buffer,
            opened_starts: &mut self.opened_starts,
            capture: &mut self.capture,
            completed: &mut self.completed,
        };
        match scanner.scan(&mut sink) {
            Ok(consumed) => {
                self.cursor = consumed;
                if self.cursor > 0 {
                    self.started = true;
                }
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Discard the consumed prefix once it dominates the buffer. Offsets
    /// held in the cursor and the capture frame are rewritten; completed
    /// entries are already owned copies.
    fn compact(&mut self) {
        let keep_from = match &self.capture {
            Some(c) => c.start.min(self.cursor),
            None => self.cursor,
        };
        if keep_from > 0 && keep_from * 2 > self.buf.len() {
            self.buf.drain(..keep_from);
            self.cursor -= keep_from;
            if let Some(c) = &mut self.capture {
                c.start -= keep_from;
            }
        }
    }
}

struct StreamSink<'a> {
    input: &'a [u8],
    filter: Option<&'a [u8]>,
    opened_buffer: &'a mut Vec<u8>,
    opened_starts: &'a mut Vec<usize>,
    capture: &'a mut Option<Capture>,
    completed: &'a mut VecDeque<Vec<u8>>,
}

impl TokenSink for StreamSink<'_> {
    fn start_element(
        &mut self,
        name: Range<usize>,
        _prefix_len: usize,
        _attrs: &[crate::scanner::AttrToken],
        is_empty: bool,
        tag: Range<usize>,
    ) -> Result<()> {
        let depth = self.opened_starts.len();
        let name_bytes = &self.input[name];
        if self.capture.is_none() {
            let matches = match self.filter {
                Some(f) => name_bytes == f,
                None => depth == 0,
            };
            if matches {
                if is_empty {
                    self.completed.push_back(self.input[tag.clone()].to_vec());
                } else {
                    *self.capture = Some(Capture {
                        start: tag.start,
                        depth,
                    });
                }
            }
        }
        if !is_empty {
            self.opened_starts.push(self.opened_buffer.len());
            self.opened_buffer.extend_from_slice(name_bytes);
        }
        Ok(())
    }

    fn end_element(&mut self, name: Range<usize>, tag: Range<usize>) -> Result<()> {
        let found = &self.input[name];
        let start = match self.opened_starts.pop() {
            Some(start) => start,
            None => {
                return Err(Error::MismatchedEndTag {
                    expected: String::new(),
                    found: String::from_utf8_lossy(found).into_owned(),
                    pos: tag.start,
                })
            }
        };
        if &self.opened_buffer[start..] != found {
            return Err(Error::MismatchedEndTag {
                expected: String::from_utf8_lossy(&self.opened_buffer[start..]).into_owned(),
                found: String::from_utf8_lossy(found).into_owned(),
                pos: tag.start,
            });
        }
        self.opened_buffer.truncate(start);
        if let Some(c) = self.capture.as_ref() {
            if c.depth == self.opened_starts.len() {
                self.completed.push_back(self.input[c.start..tag.end].to_vec());
                *self.capture = None;
            }
        }
        Ok(())
    }
}
