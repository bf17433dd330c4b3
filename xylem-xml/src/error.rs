use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Parse and streaming errors.
///
/// Variants that point at the input carry the byte offset of the offending
/// construct in the normalized buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Ran out of input in the middle of a construct. Inside the streaming
    /// parser this means "wait for the next chunk" rather than failure.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Spans are 32-bit offsets; anything past 4 GiB cannot be indexed.
    #[error("input too large for a 32-bit structural index")]
    InputTooLarge,

    /// The input is not valid in its detected encoding.
    #[error("input is not valid in its detected encoding")]
    InvalidEncoding,

    #[error("malformed markup at byte {0}")]
    MalformedMarkup(usize),

    #[error("invalid name at byte {0}")]
    BadName(usize),

    #[error("unclosed tag at byte {0}")]
    UnclosedTag(usize),

    #[error("mismatched end tag at byte {pos}: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        expected: String,
        found: String,
        pos: usize,
    },

    #[error("malformed attribute at byte {0}")]
    BadAttribute(usize),

    #[error("duplicate attribute at byte {0}")]
    DuplicateAttribute(usize),

    #[error("invalid character reference at byte {0}")]
    InvalidCharRef(usize),

    #[error("unknown entity reference at byte {0}")]
    UnknownEntity(usize),

    #[error("malformed comment at byte {0}")]
    BadComment(usize),

    #[error("malformed CDATA section at byte {0}")]
    BadCData(usize),

    #[error("malformed DOCTYPE at byte {0}")]
    BadDoctype(usize),

    /// `]]>` in character data, `--` in a comment.
    #[error("forbidden sequence at byte {0}")]
    ForbiddenSequence(usize),

    #[error("malformed XML declaration at byte {0}")]
    BadXmlDecl(usize),

    #[error("document has no root element")]
    NoRootElement,

    #[error("more than one root element at byte {0}")]
    MultipleRootElements(usize),

    /// A single name or attribute value longer than a 16-bit span length.
    #[error("token at byte {0} exceeds the indexable length")]
    OversizedToken(usize),

    /// The stream hit a fatal error earlier; only `take` keeps working.
    #[error("streaming parser already failed; create a new stream")]
    StreamPoisoned,
}

impl Error {
    /// Byte offset of the offending construct, when the variant has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::MalformedMarkup(p)
            | Error::BadName(p)
            | Error::UnclosedTag(p)
            | Error::BadAttribute(p)
            | Error::DuplicateAttribute(p)
            | Error::InvalidCharRef(p)
            | Error::UnknownEntity(p)
            | Error::BadComment(p)
            | Error::BadCData(p)
            | Error::BadDoctype(p)
            | Error::ForbiddenSequence(p)
            | Error::BadXmlDecl(p)
            | Error::MultipleRootElements(p)
            | Error::OversizedToken(p) => Some(*p),
            Error::MismatchedEndTag { pos, .. } => Some(*pos),
            _ => None,
        }
    }
}
