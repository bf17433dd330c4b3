//! Zero-copy XML parsing.
//!
//! The scanner tokenizes a byte buffer and dispatches structural events;
//! three consumers sit on top of it:
//!
//! - [`parse`]/[`parse_strict`]/[`parse_lenient`] build a
//!   [`StructuralIndex`] — flat arrays of elements, texts and attributes,
//!   all referencing the input by span;
//! - [`sax_parse`] collects the in-order event sequence with entities
//!   decoded;
//! - [`ElementStream`] accepts chunked input and hands back complete
//!   serialized elements under bounded memory.
//!
//! Only the five predefined entities and numeric character references are
//! ever expanded, and DOCTYPEs are skipped, not processed — external
//! entities cannot be fetched by construction.

mod chars;
mod entity;
mod error;
mod index;
mod input;
mod sax;
mod scanner;
mod span;
mod stream;

pub use crate::error::{Error, Result};
pub use crate::index::{
    ChildKind, ChildRef, IndexAttribute, IndexElement, IndexText, StructuralIndex, SENTINEL,
    XML_NAMESPACE,
};
pub use crate::sax::{sax_parse, SaxEvent};
pub use crate::scanner::{AttrToken, ScanOptions, Scanner, TokenSink};
pub use crate::span::Span;
pub use crate::stream::ElementStream;

use crate::index::IndexBuilder;
use crate::scanner::ScanOptions as Opts;

/// Well-formedness enforcement level.
///
/// Strict mode rejects everything XML 1.0 calls not well-formed; lenient
/// mode suppresses the recoverable checks (name alphabets, comment
/// contents, `]]>` in text, unknown entities) and keeps going. A
/// mismatched end tag stops parsing in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    #[default]
    Strict,
    Lenient,
}

impl ParseMode {
    pub fn is_strict(&self) -> bool {
        matches!(self, ParseMode::Strict)
    }
}

/// Parse a document into a [`StructuralIndex`].
pub fn parse(bytes: &[u8], mode: ParseMode) -> Result<StructuralIndex> {
    let buf = input::prepare(bytes, mode)?;
    let mut builder = IndexBuilder::new(buf.len());
    let mut scanner = Scanner::new(&buf, Opts::document(mode));
    scanner.scan(&mut builder)?;
    log::debug!("parsed {} bytes into structural index", buf.len());
    Ok(builder.into_index(buf))
}

/// Parse with every well-formedness check enforced.
pub fn parse_strict(bytes: &[u8]) -> Result<StructuralIndex> {
    parse(bytes, ParseMode::Strict)
}

/// Best-effort parse: recoverable problems are skipped, fatal ones stop
/// the scan and whatever was built so far is returned. Never fails.
pub fn parse_lenient(bytes: &[u8]) -> StructuralIndex {
    let buf = match input::prepare(bytes, ParseMode::Lenient) {
        Ok(buf) => buf,
        // nothing indexable; hand back an empty document
        Err(e) => {
            log::debug!("lenient parse could not prepare input: {e}");
            Vec::new()
        }
    };
    let mut builder = IndexBuilder::new(buf.len());
    let mut scanner = Scanner::new(&buf, Opts::document(ParseMode::Lenient));
    if let Err(e) = scanner.scan(&mut builder) {
        log::debug!("lenient parse stopped early: {e}");
    }
    builder.into_index(buf)
}
