//! The operations host bindings call, in one place.
//!
//! Parsing produces an immutable [`StructuralIndex`]; XPath evaluation
//! runs against it through a process-wide [`Evaluator`] whose
//! compiled-expression cache is the only shared mutable state. The
//! streaming parser ([`ElementStream`]) and the SAX collector
//! ([`sax_parse_lenient`]/[`sax_parse`]) sit beside the tree parse for
//! callers with other memory profiles.
//!
//! ```
//! let doc = xylem::parse_strict(b"<r><item id=\"1\">A</item><item id=\"2\">B</item></r>").unwrap();
//! let ids = xylem::xpath_text_list(&doc, "//item/@id").unwrap();
//! assert_eq!(ids, ["1", "2"]);
//! ```

use std::sync::OnceLock;

use thiserror::Error;

pub use xylem_xml::{
    ElementStream, Error as ParseError, ParseMode, SaxEvent, Span, StructuralIndex,
};
pub use xylem_xpath::{
    DocumentAccess, Error as XPathError, Evaluator, IndexNode, NodeKind, Value,
};

/// The error taxonomy of the whole engine: structural (parse),
/// compile/evaluation (XPath, tagged with the originating expression),
/// and resource (streaming-state) failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] xylem_xml::Error),

    #[error("{error} (in XPath {xpath:?})")]
    Xpath {
        xpath: String,
        error: xylem_xpath::Error,
    },
}

impl Error {
    fn xpath(xpath: &str, error: xylem_xpath::Error) -> Self {
        Error::Xpath {
            xpath: xpath.to_string(),
            error,
        }
    }
}

fn evaluator() -> &'static Evaluator {
    static EVALUATOR: OnceLock<Evaluator> = OnceLock::new();
    EVALUATOR.get_or_init(Evaluator::new)
}

/// Parse with full well-formedness checking.
pub fn parse_strict(bytes: &[u8]) -> Result<StructuralIndex, Error> {
    Ok(xylem_xml::parse_strict(bytes)?)
}

/// Best-effort parse; never fails.
pub fn parse_lenient(bytes: &[u8]) -> StructuralIndex {
    xylem_xml::parse_lenient(bytes)
}

/// Handle to the document's root element, if one exists (a lenient parse
/// of an empty document has none).
pub fn root(doc: &StructuralIndex) -> Option<IndexNode> {
    doc.root_element().map(IndexNode::Element)
}

/// Evaluate an XPath 1.0 expression against the whole document.
pub fn xpath(doc: &StructuralIndex, expr: &str) -> Result<Value<IndexNode>, Error> {
    evaluator()
        .evaluate(doc, xylem_xpath::document_node(), expr)
        .map_err(|e| Error::xpath(expr, e))
}

/// Evaluate with an explicit context node (for relative expressions).
pub fn xpath_at(
    doc: &StructuralIndex,
    context: IndexNode,
    expr: &str,
) -> Result<Value<IndexNode>, Error> {
    evaluator()
        .evaluate(doc, context, expr)
        .map_err(|e| Error::xpath(expr, e))
}

/// The string-value of every selected node, without materializing node
/// handles for the caller.
pub fn xpath_text_list(doc: &StructuralIndex, expr: &str) -> Result<Vec<String>, Error> {
    evaluator()
        .evaluate_strings(doc, xylem_xpath::document_node(), expr)
        .map_err(|e| Error::xpath(expr, e))
}

/// Create a streaming parser. With a filter only elements with that
/// exact tag name are emitted; without one, every top-level element.
pub fn streaming_new(filter: Option<&str>, mode: ParseMode) -> ElementStream {
    ElementStream::new(filter.map(str::as_bytes), mode)
}

/// Strict SAX parse: the full decoded event sequence in document order.
pub fn sax_parse(bytes: &[u8]) -> Result<Vec<SaxEvent>, Error> {
    Ok(xylem_xml::sax_parse(bytes, ParseMode::Strict)?)
}

/// Lenient SAX parse of the recoverable prefix of the input.
pub fn sax_parse_lenient(bytes: &[u8]) -> Result<Vec<SaxEvent>, Error> {
    Ok(xylem_xml::sax_parse(bytes, ParseMode::Lenient)?)
}
