use thiserror::Error;

pub use xylem_xpath_ast::ParseError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Lexing or parsing failed; carries the offset into the expression.
    #[error(transparent)]
    Compile(#[from] ParseError),

    /// The expression compiled but cannot be evaluated — an unsupported
    /// feature (`$var`, `id()`), an unknown function, or a type the
    /// conversion rules cannot bridge.
    #[error("{0}")]
    Eval(String),
}

impl Error {
    pub(crate) fn eval(message: impl Into<String>) -> Self {
        Error::Eval(message.into())
    }
}
