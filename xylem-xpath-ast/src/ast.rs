use strum_macros::{Display, EnumString};

/// The thirteen XPath 1.0 axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Axis {
    #[strum(serialize = "ancestor")]
    Ancestor,
    #[strum(serialize = "ancestor-or-self")]
    AncestorOrSelf,
    #[strum(serialize = "attribute")]
    Attribute,
    #[strum(serialize = "child")]
    Child,
    #[strum(serialize = "descendant")]
    Descendant,
    #[strum(serialize = "descendant-or-self")]
    DescendantOrSelf,
    #[strum(serialize = "following")]
    Following,
    #[strum(serialize = "following-sibling")]
    FollowingSibling,
    #[strum(serialize = "namespace")]
    Namespace,
    #[strum(serialize = "parent")]
    Parent,
    #[strum(serialize = "preceding")]
    Preceding,
    #[strum(serialize = "preceding-sibling")]
    PrecedingSibling,
    #[strum(serialize = "self")]
    Self_,
}

impl Axis {
    /// Reverse axes present their nodes in reverse document order, which
    /// is what `position()` counts along.
    pub fn is_reverse(&self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
        )
    }
}

/// The name or kind filter an axis applies before predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// `*`
    Star,
    /// `p:*`
    PrefixStar(String),
    /// `local` or `p:local`
    Name {
        prefix: Option<String>,
        local: String,
    },
    /// `text()`
    Text,
    /// `comment()`
    Comment,
    /// `node()`
    Node,
    /// `processing-instruction()`, optionally with a target literal
    ProcessingInstruction(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    pub fn new(axis: Axis, node_test: NodeTest) -> Self {
        Step {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }

    /// The `descendant-or-self::node()` step `//` abbreviates.
    pub fn descendant_or_self() -> Self {
        Step::new(Axis::DescendantOrSelf, NodeTest::Node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinaryOp {
    #[strum(serialize = "or")]
    Or,
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "=")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "div")]
    Div,
    #[strum(serialize = "mod")]
    Mod,
    #[strum(serialize = "|")]
    Union,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    /// Rooted at the document (`/...`) rather than the context node.
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(LocationPath),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Negate(Box<Expr>),
    Literal(Literal),
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
    /// `$name` — always rejected at evaluation time.
    VariableRef(String),
    /// A primary expression with predicates and/or a trailing path,
    /// e.g. `(//a)[1]/b`.
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
}
