//! Recursive-descent XPath 1.0 parser.
//!
//! Precedence, loosest first: `or`, `and`, equality, relational,
//! additive, multiplicative, unary minus, union, path. Abbreviations are
//! expanded here: `//` becomes a `descendant-or-self::node()` step, `.`
//! and `..` become `self::node()` and `parent::node()`, `@` selects the
//! attribute axis.

use std::ops::Range;
use std::str::FromStr;

use xylem_xpath_lexer::{lexer, Token};

use crate::ast::{Axis, BinaryOp, Expr, Literal, LocationPath, NodeTest, Step};
use crate::error::ParseError;

type Result<T> = std::result::Result<T, ParseError>;

/// Parse an expression into its AST.
pub fn parse(input: &str) -> Result<Expr> {
    let mut tokens = Vec::new();
    for (token, span) in lexer(input) {
        match token {
            Ok(t) => tokens.push((t, span)),
            Err(()) => return Err(ParseError::new("unrecognized token", span.start)),
        }
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
    };
    let expr = parser.expression()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error_here("unexpected trailing token"));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: Vec<(Token<'a>, Range<usize>)>,
    pos: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + n).map(|(t, _)| t)
    }

    fn here(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| s.start)
            .unwrap_or(self.end)
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.here())
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, token: &Token<'a>) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token<'a>, what: &str) -> Result<()> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected {what}")))
        }
    }

    // ---- precedence chain ----

    fn expression(&mut self) -> Result<Expr> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.and_expr()?;
        while self.eat(&Token::Or) {
            lhs = binary(BinaryOp::Or, lhs, self.and_expr()?);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.equality_expr()?;
        while self.eat(&Token::And) {
            lhs = binary(BinaryOp::And, lhs, self.equality_expr()?);
        }
        Ok(lhs)
    }

    fn equality_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.relational_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Equal) => BinaryOp::Eq,
                Some(Token::NotEqual) => BinaryOp::Ne,
                _ => break,
            };
            self.bump();
            lhs = binary(op, lhs, self.relational_expr()?);
        }
        Ok(lhs)
    }

    fn relational_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.additive_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::LessThan) => BinaryOp::Lt,
                Some(Token::LessThanEqual) => BinaryOp::Le,
                Some(Token::GreaterThan) => BinaryOp::Gt,
                Some(Token::GreaterThanEqual) => BinaryOp::Ge,
                _ => break,
            };
            self.bump();
            lhs = binary(op, lhs, self.additive_expr()?);
        }
        Ok(lhs)
    }

    fn additive_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.multiplicative_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            lhs = binary(op, lhs, self.multiplicative_expr()?);
        }
        Ok(lhs)
    }

    fn multiplicative_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.unary_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Multiply) => BinaryOp::Mul,
                Some(Token::Div) => BinaryOp::Div,
                Some(Token::Mod) => BinaryOp::Mod,
                _ => break,
            };
            self.bump();
            lhs = binary(op, lhs, self.unary_expr()?);
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            Ok(Expr::Negate(Box::new(self.unary_expr()?)))
        } else {
            self.union_expr()
        }
    }

    fn union_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.path_expr()?;
        while self.eat(&Token::Pipe) {
            lhs = binary(BinaryOp::Union, lhs, self.path_expr()?);
        }
        Ok(lhs)
    }

    // ---- paths ----

    fn path_expr(&mut self) -> Result<Expr> {
        if !self.starts_filter_expr() {
            return self.location_path().map(Expr::Path);
        }
        let primary = self.primary_expr()?;
        let predicates = self.predicates()?;
        let mut steps = Vec::new();
        if self.eat(&Token::Slash) {
            self.relative_location_path(&mut steps)?;
        } else if self.eat(&Token::DoubleSlash) {
            steps.push(Step::descendant_or_self());
            self.relative_location_path(&mut steps)?;
        }
        if predicates.is_empty() && steps.is_empty() {
            Ok(primary)
        } else {
            Ok(Expr::Filter {
                primary: Box::new(primary),
                predicates,
                steps,
            })
        }
    }

    /// A primary expression begins here rather than a location path:
    /// literal, number, variable, parenthesis, or a function call — an
    /// NCName followed by `(` that is not a node-type test.
    fn starts_filter_expr(&self) -> bool {
        match self.peek() {
            Some(Token::Number(_) | Token::Literal(_) | Token::Dollar | Token::LeftParen) => true,
            Some(Token::NCName(name)) => {
                if is_node_type(name) {
                    return false;
                }
                match (self.peek_at(1), self.peek_at(2), self.peek_at(3)) {
                    (Some(Token::LeftParen), _, _) => true,
                    (Some(Token::Colon), Some(Token::NCName(_)), Some(Token::LeftParen)) => true,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn primary_expr(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(&Token::Number(n)) => {
                self.bump();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            Some(&Token::Literal(s)) => {
                self.bump();
                Ok(Expr::Literal(Literal::String(s.to_string())))
            }
            Some(Token::Dollar) => {
                self.bump();
                let name = self.qname_string("variable name")?;
                Ok(Expr::VariableRef(name))
            }
            Some(Token::LeftParen) => {
                self.bump();
                let expr = self.expression()?;
                self.expect(Token::RightParen, ")")?;
                Ok(expr)
            }
            Some(Token::NCName(_)) => {
                let name = self.qname_string("function name")?;
                self.expect(Token::LeftParen, "(")?;
                let mut args = Vec::new();
                if !self.eat(&Token::RightParen) {
                    loop {
                        args.push(self.expression()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(Token::RightParen, ")")?;
                        break;
                    }
                }
                Ok(Expr::FunctionCall { name, args })
            }
            _ => Err(self.error_here("expected an expression")),
        }
    }

    /// `ncname` or `ncname:ncname` as one string.
    fn qname_string(&mut self, what: &str) -> Result<String> {
        let first = match self.peek() {
            Some(Token::NCName(n)) => *n,
            _ => return Err(self.error_here(format!("expected {what}"))),
        };
        self.bump();
        if self.peek() == Some(&Token::Colon) {
            if let Some(Token::NCName(local)) = self.peek_at(1) {
                let qname = format!("{first}:{local}");
                self.bump();
                self.bump();
                return Ok(qname);
            }
        }
        Ok(first.to_string())
    }

    fn location_path(&mut self) -> Result<LocationPath> {
        let mut steps = Vec::new();
        let absolute;
        if self.eat(&Token::Slash) {
            absolute = true;
            if self.starts_step() {
                self.relative_location_path(&mut steps)?;
            }
        } else if self.eat(&Token::DoubleSlash) {
            absolute = true;
            steps.push(Step::descendant_or_self());
            self.relative_location_path(&mut steps)?;
        } else {
            absolute = false;
            self.relative_location_path(&mut steps)?;
        }
        Ok(LocationPath { absolute, steps })
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::NCName(_) | Token::Star | Token::At | Token::Dot | Token::DotDot
            )
        )
    }

    fn relative_location_path(&mut self, steps: &mut Vec<Step>) -> Result<()> {
        loop {
            steps.push(self.step()?);
            if self.eat(&Token::Slash) {
                continue;
            }
            if self.eat(&Token::DoubleSlash) {
                steps.push(Step::descendant_or_self());
                continue;
            }
            break;
        }
        Ok(())
    }

    fn step(&mut self) -> Result<Step> {
        if self.eat(&Token::Dot) {
            return Ok(Step::new(Axis::Self_, NodeTest::Node));
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step::new(Axis::Parent, NodeTest::Node));
        }
        let axis = self.axis_specifier()?;
        let node_test = self.node_test()?;
        let mut step = Step::new(axis, node_test);
        step.predicates = self.predicates()?;
        Ok(step)
    }

    fn axis_specifier(&mut self) -> Result<Axis> {
        if self.eat(&Token::At) {
            return Ok(Axis::Attribute);
        }
        let axis = match (self.peek(), self.peek_at(1)) {
            (Some(Token::NCName(name)), Some(Token::DoubleColon)) => Some(
                Axis::from_str(name)
                    .map_err(|_| self.error_here(format!("unknown axis {name}")))?,
            ),
            _ => None,
        };
        match axis {
            Some(axis) => {
                self.bump();
                self.bump();
                Ok(axis)
            }
            None => Ok(Axis::Child),
        }
    }

    fn node_test(&mut self) -> Result<NodeTest> {
        if self.eat(&Token::Star) {
            return Ok(NodeTest::Star);
        }
        let name = match self.peek() {
            Some(Token::NCName(n)) => *n,
            _ => return Err(self.error_here("expected a node test")),
        };
        self.bump();
        if self.eat(&Token::LeftParen) {
            let test = match name {
                "text" => NodeTest::Text,
                "comment" => NodeTest::Comment,
                "node" => NodeTest::Node,
                "processing-instruction" => {
                    let target = match self.peek() {
                        Some(Token::Literal(t)) => {
                            let t = t.to_string();
                            self.bump();
                            Some(t)
                        }
                        _ => None,
                    };
                    NodeTest::ProcessingInstruction(target)
                }
                _ => return Err(self.error_here(format!("unknown node type {name}"))),
            };
            self.expect(Token::RightParen, ")")?;
            return Ok(test);
        }
        if self.peek() == Some(&Token::Colon) {
            return match self.peek_at(1) {
                Some(Token::Star) => {
                    self.bump();
                    self.bump();
                    Ok(NodeTest::PrefixStar(name.to_string()))
                }
                Some(Token::NCName(local)) => {
                    let local = local.to_string();
                    self.bump();
                    self.bump();
                    Ok(NodeTest::Name {
                        prefix: Some(name.to_string()),
                        local,
                    })
                }
                _ => Err(self.error_here("expected a name after prefix")),
            };
        }
        Ok(NodeTest::Name {
            prefix: None,
            local: name.to_string(),
        })
    }

    fn predicates(&mut self) -> Result<Vec<Expr>> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LeftBracket) {
            predicates.push(self.expression()?);
            self.expect(Token::RightBracket, "]")?;
        }
        Ok(predicates)
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn is_node_type(name: &str) -> bool {
    matches!(name, "text" | "node" | "comment" | "processing-instruction")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(axis: Axis, local: &str) -> Step {
        Step::new(
            axis,
            NodeTest::Name {
                prefix: None,
                local: local.to_string(),
            },
        )
    }

    #[test]
    fn simple_relative_path() {
        assert_eq!(
            parse("a/b").unwrap(),
            Expr::Path(LocationPath {
                absolute: false,
                steps: vec![step(Axis::Child, "a"), step(Axis::Child, "b")],
            })
        );
    }

    #[test]
    fn absolute_and_root() {
        assert_eq!(
            parse("/").unwrap(),
            Expr::Path(LocationPath {
                absolute: true,
                steps: vec![],
            })
        );
        assert_eq!(
            parse("/a").unwrap(),
            Expr::Path(LocationPath {
                absolute: true,
                steps: vec![step(Axis::Child, "a")],
            })
        );
    }

    #[test]
    fn double_slash_expands() {
        assert_eq!(
            parse("//a").unwrap(),
            Expr::Path(LocationPath {
                absolute: true,
                steps: vec![Step::descendant_or_self(), step(Axis::Child, "a")],
            })
        );
    }

    #[test]
    fn abbreviations() {
        assert_eq!(
            parse("../.").unwrap(),
            Expr::Path(LocationPath {
                absolute: false,
                steps: vec![
                    Step::new(Axis::Parent, NodeTest::Node),
                    Step::new(Axis::Self_, NodeTest::Node),
                ],
            })
        );
        assert_eq!(
            parse("@id").unwrap(),
            Expr::Path(LocationPath {
                absolute: false,
                steps: vec![step(Axis::Attribute, "id")],
            })
        );
    }

    #[test]
    fn explicit_axes() {
        let parsed = parse("ancestor-or-self::*").unwrap();
        assert_eq!(
            parsed,
            Expr::Path(LocationPath {
                absolute: false,
                steps: vec![Step::new(Axis::AncestorOrSelf, NodeTest::Star)],
            })
        );
        assert!(parse("sideways::a").is_err());
    }

    #[test]
    fn node_type_tests() {
        assert_eq!(
            parse("text()").unwrap(),
            Expr::Path(LocationPath {
                absolute: false,
                steps: vec![Step::new(Axis::Child, NodeTest::Text)],
            })
        );
        assert_eq!(
            parse("processing-instruction('p')").unwrap(),
            Expr::Path(LocationPath {
                absolute: false,
                steps: vec![Step::new(
                    Axis::Child,
                    NodeTest::ProcessingInstruction(Some("p".to_string())),
                )],
            })
        );
    }

    #[test]
    fn prefixed_name_tests() {
        assert_eq!(
            parse("p:a/p:*").unwrap(),
            Expr::Path(LocationPath {
                absolute: false,
                steps: vec![
                    Step::new(
                        Axis::Child,
                        NodeTest::Name {
                            prefix: Some("p".to_string()),
                            local: "a".to_string(),
                        },
                    ),
                    Step::new(Axis::Child, NodeTest::PrefixStar("p".to_string())),
                ],
            })
        );
    }

    #[test]
    fn predicates_attach_to_steps() {
        let parsed = parse("a[1][@id]").unwrap();
        let Expr::Path(path) = parsed else {
            panic!("expected path")
        };
        assert_eq!(path.steps[0].predicates.len(), 2);
        assert_eq!(
            path.steps[0].predicates[0],
            Expr::Literal(Literal::Number(1.0))
        );
    }

    #[test]
    fn function_calls() {
        assert_eq!(
            parse("count(//a)").unwrap(),
            Expr::FunctionCall {
                name: "count".to_string(),
                args: vec![Expr::Path(LocationPath {
                    absolute: true,
                    steps: vec![Step::descendant_or_self(), step(Axis::Child, "a")],
                })],
            }
        );
        assert_eq!(
            parse("true()").unwrap(),
            Expr::FunctionCall {
                name: "true".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn precedence() {
        // 2 + 3 * 4 parses as 2 + (3 * 4)
        let parsed = parse("2 + 3 * 4").unwrap();
        let Expr::Binary { op: BinaryOp::Add, rhs, .. } = parsed else {
            panic!("expected + at the top")
        };
        assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Mul, .. }));

        // a or b and c parses as a or (b and c)
        let parsed = parse("a = 1 or b and c").unwrap();
        assert!(matches!(parsed, Expr::Binary { op: BinaryOp::Or, .. }));
    }

    #[test]
    fn unary_minus_binds_tighter_than_multiply() {
        let parsed = parse("-a * b").unwrap();
        let Expr::Binary { op: BinaryOp::Mul, lhs, .. } = parsed else {
            panic!("expected * at the top")
        };
        assert!(matches!(*lhs, Expr::Negate(_)));
    }

    #[test]
    fn union_of_paths() {
        let parsed = parse("a | b | c").unwrap();
        let Expr::Binary { op: BinaryOp::Union, lhs, .. } = parsed else {
            panic!("expected | at the top")
        };
        assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Union, .. }));
    }

    #[test]
    fn filter_expression_with_trailing_path() {
        let parsed = parse("(//a)[1]/b").unwrap();
        let Expr::Filter { predicates, steps, .. } = parsed else {
            panic!("expected filter")
        };
        assert_eq!(predicates.len(), 1);
        assert_eq!(steps, vec![step(Axis::Child, "b")]);
    }

    #[test]
    fn variable_reference() {
        assert_eq!(
            parse("$x").unwrap(),
            Expr::VariableRef("x".to_string())
        );
    }

    #[test]
    fn keywords_usable_as_names() {
        assert_eq!(
            parse("/and").unwrap(),
            Expr::Path(LocationPath {
                absolute: true,
                steps: vec![step(Axis::Child, "and")],
            })
        );
    }

    #[test]
    fn errors_carry_positions() {
        let err = parse("a[").unwrap_err();
        assert_eq!(err.position, 2);
        let err = parse("count(").unwrap_err();
        assert_eq!(err.position, 6);
        assert!(parse("").is_err());
        assert!(parse("a b").is_err());
        assert!(parse("'unterminated").is_err());
    }
}
