//! XPath 1.0 tokenizer.
//!
//! Lexing happens in two layers: a raw [`logos`] lexer producing
//! context-free tokens, and [`XPathLexer`], a wrapper iterator applying
//! the XPath 1.0 §3.7 disambiguation rule — after a token that is not
//! `@`, `::`, `(`, `[`, `,` or an operator, `*` means multiplication and
//! the NCNames `and`, `or`, `div`, `mod` are operators. Axis and function
//! names stay plain NCNames; the parser resolves them from lookahead.

use logos::{Logos, Span, SpannedIter};

#[derive(Logos, Clone, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(subpattern ncname_start = r"[A-Za-z_\u{c0}-\u{d6}\u{d8}-\u{f6}\u{f8}-\u{2ff}\u{370}-\u{37d}\u{37f}-\u{1fff}\u{200c}-\u{200d}\u{2070}-\u{218f}\u{2c00}-\u{2fef}\u{3001}-\u{d7ff}\u{f900}-\u{fdcf}\u{fdf0}-\u{fffd}\u{10000}-\u{effff}]")]
#[logos(subpattern ncname_char = r"(?&ncname_start)|[\-\.0-9\u{b7}\u{300}-\u{36f}\u{203f}-\u{2040}]")]
pub enum Token<'a> {
    #[regex(r"[0-9]+(\.[0-9]*)?|\.[0-9]+", number_literal)]
    Number(f64),
    // XPath 1.0 literals have no escape mechanism
    #[regex(r#""[^"]*"|'[^']*'"#, string_literal)]
    Literal(&'a str),
    #[regex(r"(?&ncname_start)(?&ncname_char)*")]
    NCName(&'a str),

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("..")]
    DotDot,
    #[token(".")]
    Dot,
    #[token("@")]
    At,
    #[token(",")]
    Comma,
    #[token("::")]
    DoubleColon,
    #[token(":")]
    Colon,
    #[token("//")]
    DoubleSlash,
    #[token("/")]
    Slash,
    #[token("|")]
    Pipe,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("=")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token("<=")]
    LessThanEqual,
    #[token("<")]
    LessThan,
    #[token(">=")]
    GreaterThanEqual,
    #[token(">")]
    GreaterThan,
    #[token("*")]
    Star,
    #[token("$")]
    Dollar,

    // produced only by the disambiguating wrapper
    Multiply,
    And,
    Or,
    Div,
    Mod,
}

fn number_literal<'a>(lex: &mut logos::Lexer<'a, Token<'a>>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn string_literal<'a>(lex: &mut logos::Lexer<'a, Token<'a>>) -> &'a str {
    let slice = lex.slice();
    &slice[1..slice.len() - 1]
}

/// True when the token before the current one puts the lexer in operator
/// position (§3.7: preceding token exists and is not `@ :: ( [ ,` or an
/// operator). `$` and `:` are treated like non-operator positions so that
/// `$div` stays a variable name and `p:*` a name test.
fn operator_position(prev: &Option<Token>) -> bool {
    match prev {
        None => false,
        Some(t) => !matches!(
            t,
            Token::At
                | Token::DoubleColon
                | Token::LeftParen
                | Token::LeftBracket
                | Token::Comma
                | Token::Colon
                | Token::Dollar
                | Token::Slash
                | Token::DoubleSlash
                | Token::Pipe
                | Token::Plus
                | Token::Minus
                | Token::Equal
                | Token::NotEqual
                | Token::LessThan
                | Token::LessThanEqual
                | Token::GreaterThan
                | Token::GreaterThanEqual
                | Token::Multiply
                | Token::And
                | Token::Or
                | Token::Div
                | Token::Mod
        ),
    }
}

pub struct XPathLexer<'a> {
    spanned: SpannedIter<'a, Token<'a>>,
    prev: Option<Token<'a>>,
}

impl<'a> Iterator for XPathLexer<'a> {
    type Item = (Result<Token<'a>, ()>, Span);

    fn next(&mut self) -> Option<Self::Item> {
        let (token, span) = self.spanned.next()?;
        let token = token.map(|t| {
            let t = if operator_position(&self.prev) {
                match t {
                    Token::Star => Token::Multiply,
                    Token::NCName("and") => Token::And,
                    Token::NCName("or") => Token::Or,
                    Token::NCName("div") => Token::Div,
                    Token::NCName("mod") => Token::Mod,
                    t => t,
                }
            } else {
                t
            };
            self.prev = Some(t.clone());
            t
        });
        Some((token, span))
    }
}

pub fn lexer(input: &str) -> XPathLexer<'_> {
    XPathLexer {
        spanned: Token::lexer(input).spanned(),
        prev: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        lexer(input).map(|(t, _)| t.expect("lex error")).collect()
    }

    #[test]
    fn numbers_and_literals() {
        assert_eq!(
            tokens(r#"3.5 .5 42 'a' "b""#),
            [
                Token::Number(3.5),
                Token::Number(0.5),
                Token::Number(42.0),
                Token::Literal("a"),
                Token::Literal("b"),
            ]
        );
    }

    #[test]
    fn path_punctuation() {
        assert_eq!(
            tokens("//a/b[1]/@c"),
            [
                Token::DoubleSlash,
                Token::NCName("a"),
                Token::Slash,
                Token::NCName("b"),
                Token::LeftBracket,
                Token::Number(1.0),
                Token::RightBracket,
                Token::Slash,
                Token::At,
                Token::NCName("c"),
            ]
        );
    }

    #[test]
    fn star_is_multiply_after_an_operand() {
        assert_eq!(
            tokens("2 * 3"),
            [Token::Number(2.0), Token::Multiply, Token::Number(3.0)]
        );
        assert_eq!(
            tokens("a[1] * 2"),
            [
                Token::NCName("a"),
                Token::LeftBracket,
                Token::Number(1.0),
                Token::RightBracket,
                Token::Multiply,
                Token::Number(2.0),
            ]
        );
    }

    #[test]
    fn star_is_a_name_test_elsewhere() {
        assert_eq!(tokens("*"), [Token::Star]);
        assert_eq!(
            tokens("child::*"),
            [Token::NCName("child"), Token::DoubleColon, Token::Star]
        );
        assert_eq!(tokens("@*"), [Token::At, Token::Star]);
        assert_eq!(
            tokens("p:*"),
            [Token::NCName("p"), Token::Colon, Token::Star]
        );
        // a multiply's right operand is back to name-test position
        assert_eq!(
            tokens("* * *"),
            [Token::Star, Token::Multiply, Token::Star]
        );
    }

    #[test]
    fn keywords_only_in_operator_position() {
        assert_eq!(
            tokens("a and b"),
            [Token::NCName("a"), Token::And, Token::NCName("b")]
        );
        assert_eq!(
            tokens("6 mod 4 div 2"),
            [
                Token::Number(6.0),
                Token::Mod,
                Token::Number(4.0),
                Token::Div,
                Token::Number(2.0),
            ]
        );
        // as step names they stay NCNames
        assert_eq!(
            tokens("/and/or"),
            [
                Token::Slash,
                Token::NCName("and"),
                Token::Slash,
                Token::NCName("or"),
            ]
        );
        assert_eq!(tokens("$div"), [Token::Dollar, Token::NCName("div")]);
    }

    #[test]
    fn hyphenated_ncnames_lex_whole() {
        assert_eq!(
            tokens("ancestor-or-self::node()"),
            [
                Token::NCName("ancestor-or-self"),
                Token::DoubleColon,
                Token::NCName("node"),
                Token::LeftParen,
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn dots_and_double_dots() {
        assert_eq!(
            tokens("../.."),
            [Token::DotDot, Token::Slash, Token::DotDot]
        );
        assert_eq!(tokens("."), [Token::Dot]);
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(
            tokens("a <= 2 != b"),
            [
                Token::NCName("a"),
                Token::LessThanEqual,
                Token::Number(2.0),
                Token::NotEqual,
                Token::NCName("b"),
            ]
        );
    }

    #[test]
    fn spans_point_into_the_source() {
        let spans: Vec<Span> = lexer("a | b").map(|(_, s)| s).collect();
        assert_eq!(spans, [0..1, 2..3, 4..5]);
    }

    #[test]
    fn unterminated_literal_is_an_error() {
        assert!(lexer("'oops").any(|(t, _)| t.is_err()));
    }
}
