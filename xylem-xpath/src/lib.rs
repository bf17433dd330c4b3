//! XPath 1.0 over anything that implements [`DocumentAccess`].
//!
//! An [`Evaluator`] owns the compiled-expression cache and is otherwise
//! stateless: one evaluator serves any number of documents and threads.
//! Compilation goes source → AST (`xylem-xpath-ast`) → compiled form
//! with fast-path predicates; evaluation walks the document through the
//! capability trait, so the structural index and plain test trees are
//! queried by the same engine.
//!
//! ```
//! use xylem_xpath::{Evaluator, Value};
//!
//! let doc = xylem_xml::parse_strict(b"<r><a/><a/></r>").unwrap();
//! let evaluator = Evaluator::new();
//! let n = evaluator.evaluate(&doc, xylem_xpath::document_node(), "count(//a)").unwrap();
//! assert_eq!(n, Value::Number(2.0));
//! ```

mod axis;
mod cache;
mod compile;
mod doc;
mod error;
mod eval;
mod library;
mod value;
mod xml;

pub use crate::doc::{DocumentAccess, NodeKind};
pub use crate::error::{Error, ParseError, Result};
pub use crate::value::{number_from_str, number_to_string, Value};
pub use crate::xml::IndexNode;

use crate::cache::QueryCache;
use crate::eval::EvalContext;

/// The context node to evaluate against a whole document: the root node,
/// so relative paths start above the root element.
pub fn document_node() -> IndexNode {
    IndexNode::Root
}

/// A reusable XPath 1.0 engine with a bounded LRU of compiled
/// expressions.
pub struct Evaluator {
    cache: QueryCache,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator {
            cache: QueryCache::new(cache::DEFAULT_CAPACITY),
        }
    }

    pub fn with_cache_capacity(capacity: usize) -> Self {
        Evaluator {
            cache: QueryCache::new(capacity),
        }
    }

    /// Compile (or fetch from cache) and evaluate against `context`.
    pub fn evaluate<D: DocumentAccess>(
        &self,
        doc: &D,
        context: D::Node,
        xpath: &str,
    ) -> Result<Value<D::Node>> {
        let compiled = self.cache.get_or_compile(xpath)?;
        eval::evaluate(
            doc,
            &compiled,
            &EvalContext {
                node: context,
                position: 1,
                size: 1,
            },
        )
    }

    /// Fast path for callers that only want text: the string-value of
    /// every node the expression selects, in document order.
    pub fn evaluate_strings<D: DocumentAccess>(
        &self,
        doc: &D,
        context: D::Node,
        xpath: &str,
    ) -> Result<Vec<String>> {
        match self.evaluate(doc, context, xpath)? {
            Value::NodeSet(nodes) => {
                Ok(nodes.into_iter().map(|n| doc.string_value(n)).collect())
            }
            _ => Err(Error::eval("expression did not produce a node-set")),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}
