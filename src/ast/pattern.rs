//! # Pattern AST Nodes
//!
//! Patterns appear in `fn` clauses, `case` arms, exception handlers and
//! `val` bindings. The same node is consumed twice:
//!
//! - the elaborator computes the *type* a pattern accepts and the types of the
//!   variables it binds
//! - the evaluator matches it against a *value* and produces the bindings
//!
//! ## Identifier Patterns
//!
//! Whether `x` binds a variable or tests for a constructor is not decided by
//! the syntax. It depends on the identifier status of `x` in the State at the
//! point of matching:
//!
//! ```text
//! datatype t = A | B
//! fn A => 1 | x => 2     (* A tests for the constructor, x binds *)
//! ```
//!
//! ## Record Patterns
//!
//! A record pattern with a trailing `...` is *incomplete*: it matches records
//! carrying at least the listed fields. Tuple patterns are complete records
//! labelled `1..n`.

use lachs::Span;

use super::expression::{Ident, Literal};
use super::type_expression::TypeExpression;

#[derive(Debug, Clone)]
pub enum Pattern {
    Wildcard(Wildcard),
    Constant(Literal),
    Ident(Ident),
    Record(RecordPattern),
    Constructed(ConstructedPattern),
    Layered(LayeredPattern),
    Typed(TypedPattern),
    Tuple(TuplePattern),
    List(ListPattern),
}

#[derive(Debug, Clone)]
pub struct Wildcard {
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct RecordPattern {
    pub fields: Vec<(String, Pattern)>,
    pub complete: bool,
    pub position: Span,
}

/// `C p`
#[derive(Debug, Clone)]
pub struct ConstructedPattern {
    pub constructor: Ident,
    pub argument: Box<Pattern>,
    pub position: Span,
}

/// `x : ty as p`
#[derive(Debug, Clone)]
pub struct LayeredPattern {
    pub name: Ident,
    pub annotation: Option<TypeExpression>,
    pub pattern: Box<Pattern>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct TypedPattern {
    pub pattern: Box<Pattern>,
    pub ty: TypeExpression,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct TuplePattern {
    pub elements: Vec<Pattern>,
    pub position: Span,
}

/// `[p1, ..., pn]`
#[derive(Debug, Clone)]
pub struct ListPattern {
    pub elements: Vec<Pattern>,
    pub position: Span,
}

impl Pattern {
    pub fn position(&self) -> &Span {
        match self {
            Pattern::Wildcard(Wildcard { position })
            | Pattern::Constant(Literal { position, .. })
            | Pattern::Ident(Ident { position, .. })
            | Pattern::Record(RecordPattern { position, .. })
            | Pattern::Constructed(ConstructedPattern { position, .. })
            | Pattern::Layered(LayeredPattern { position, .. })
            | Pattern::Typed(TypedPattern { position, .. })
            | Pattern::Tuple(TuplePattern { position, .. })
            | Pattern::List(ListPattern { position, .. }) => position,
        }
    }

    /// The identifier a `val rec` binding introduces, looking through type
    /// annotations.
    pub fn bound_name(&self) -> Option<&Ident> {
        match self {
            Pattern::Ident(ident) => Some(ident),
            Pattern::Typed(TypedPattern { pattern, .. }) => pattern.bound_name(),
            _ => None,
        }
    }
}
