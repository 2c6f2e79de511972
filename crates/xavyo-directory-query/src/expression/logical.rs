//! Composite filters: `&`, `|`, `!` and the object-class selector.

use std::fmt;

use super::{Expression, ResolveContext};
use crate::error::{QueryError, QueryResult};

/// The kind of a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalKind {
    And,
    Or,
    Not,
    /// Object-class selector. One child is emitted bare; several are OR-ed.
    From,
}

impl LogicalKind {
    /// Symbols a node of this kind accepts.
    #[must_use]
    pub fn allowed_symbols(&self) -> &'static [&'static str] {
        match self {
            LogicalKind::And => &["&"],
            LogicalKind::Or => &["|"],
            LogicalKind::Not => &["!"],
            LogicalKind::From => &["&", "|"],
        }
    }

    #[must_use]
    pub fn default_symbol(&self) -> &'static str {
        match self {
            LogicalKind::And => "&",
            LogicalKind::Or | LogicalKind::From => "|",
            LogicalKind::Not => "!",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalKind::And => "AND",
            LogicalKind::Or => "OR",
            LogicalKind::Not => "NOT",
            LogicalKind::From => "FROM",
        }
    }
}

impl fmt::Display for LogicalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered list of child expressions joined by an operator symbol.
#[derive(Debug, Clone)]
pub struct Logical {
    kind: LogicalKind,
    operator_symbol: &'static str,
    children: Vec<Expression>,
}

impl Logical {
    /// Create an empty composite of the given kind.
    #[must_use]
    pub fn new(kind: LogicalKind) -> Self {
        Self {
            kind,
            operator_symbol: kind.default_symbol(),
            children: Vec::new(),
        }
    }

    /// `(&...)` over the given children.
    #[must_use]
    pub fn and(children: impl IntoIterator<Item = Expression>) -> Self {
        Self::unchecked(LogicalKind::And, children)
    }

    /// `(|...)` over the given children.
    #[must_use]
    pub fn or(children: impl IntoIterator<Item = Expression>) -> Self {
        Self::unchecked(LogicalKind::Or, children)
    }

    /// Object-class selector over the given children.
    #[must_use]
    pub fn from_classes(children: impl IntoIterator<Item = Expression>) -> Self {
        let mut node = Self::unchecked(LogicalKind::From, children);
        node.force_from_symbol();
        node
    }

    /// `(!child)`
    ///
    /// # Errors
    /// `QuerySyntax` if `child` is itself a composite.
    pub fn not(child: impl Into<Expression>) -> QueryResult<Self> {
        let mut node = Self::new(LogicalKind::Not);
        node.add(child)?;
        Ok(node)
    }

    /// NOT over a leaf the caller built itself.
    pub(crate) fn not_leaf(child: Expression) -> Self {
        debug_assert!(!child.is_composite());
        Self {
            kind: LogicalKind::Not,
            operator_symbol: "!",
            children: vec![child],
        }
    }

    fn unchecked(kind: LogicalKind, children: impl IntoIterator<Item = Expression>) -> Self {
        Self {
            kind,
            operator_symbol: kind.default_symbol(),
            children: children.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> LogicalKind {
        self.kind
    }

    #[must_use]
    pub fn operator_symbol(&self) -> &str {
        self.operator_symbol
    }

    #[must_use]
    pub fn children(&self) -> &[Expression] {
        &self.children
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Change the operator symbol.
    ///
    /// # Errors
    /// `QuerySyntax` naming the symbol and the allowed set when this kind does
    /// not accept `symbol`.
    pub fn set_operator_symbol(&mut self, symbol: &str) -> QueryResult<()> {
        let allowed = self.kind.allowed_symbols();
        match allowed.iter().find(|s| **s == symbol) {
            Some(accepted) => {
                self.operator_symbol = *accepted;
                Ok(())
            }
            None => Err(QueryError::syntax(format!(
                "operator '{symbol}' is not valid for {}, allowed: {}",
                self.kind,
                allowed.join(", ")
            ))),
        }
    }

    /// Append a child.
    ///
    /// # Errors
    /// `QuerySyntax` when adding a second child, or any composite child, to NOT.
    pub fn add(&mut self, child: impl Into<Expression>) -> QueryResult<()> {
        let child = child.into();
        if self.kind == LogicalKind::Not {
            if !self.children.is_empty() {
                return Err(QueryError::syntax("NOT accepts exactly one child"));
            }
            if child.is_composite() {
                return Err(QueryError::syntax(format!(
                    "NOT cannot directly contain a composite, got {child}"
                )));
            }
        }
        self.children.push(child);
        self.force_from_symbol();
        Ok(())
    }

    /// Builder form of [`Logical::add`].
    pub fn with(mut self, child: impl Into<Expression>) -> QueryResult<Self> {
        self.add(child)?;
        Ok(self)
    }

    fn force_from_symbol(&mut self) {
        if self.kind == LogicalKind::From && self.children.len() > 1 {
            self.operator_symbol = "|";
        }
    }

    pub(crate) fn resolve(&mut self, ctx: &ResolveContext<'_>) -> QueryResult<()> {
        for child in &mut self.children {
            child.resolve(ctx)?;
        }
        self.force_from_symbol();
        Ok(())
    }

    pub(crate) fn to_filter(&self) -> QueryResult<String> {
        if self.children.is_empty() {
            return Err(QueryError::syntax(format!(
                "{} composite has no children",
                self.kind
            )));
        }
        if self.kind == LogicalKind::From && self.children.len() == 1 {
            return self.children[0].to_filter();
        }

        let symbol = match self.kind {
            LogicalKind::From => "|",
            _ => self.operator_symbol,
        };
        let mut filter = String::from("(");
        filter.push_str(symbol);
        for child in &self.children {
            filter.push_str(&child.to_filter()?);
        }
        filter.push(')');
        Ok(filter)
    }
}
