//! XPath 1.0 AST and parser.
//!
//! [`parse`] turns an expression string into an [`Expr`] tree, expanding
//! the abbreviated syntax along the way. Compilation and evaluation live
//! in `xylem-xpath`.

mod ast;
mod error;
mod parser;

pub use crate::ast::{Axis, BinaryOp, Expr, Literal, LocationPath, NodeTest, Step};
pub use crate::error::ParseError;
pub use crate::parser::parse;
