//! # Elaboration Errors
//!
//! Errors raised while checking a declaration statically. Checking of the
//! current top-level declaration stops at the first error and the State it was
//! checked against stays unchanged.
//!
//! ## Error Reporting
//!
//! Errors carry the span of the offending syntax node. The derived `Display`
//! renders the source excerpt when the span has one, and a
//! plain `Type error: ...` line otherwise (nodes built programmatically have
//! empty spans).
//!
//! ## Related Modules
//!
//! - [`crate::types::unify`] - `UnifyError`s are wrapped in
//!   [`ElaborationError::Unification`]
//! - [`crate::types::infer`] - produces every other variant

use lachs::Span;

use super::ty::Type;
use super::unify::UnifyError;

/// Static error found while elaborating a declaration.
///
/// # Example Error Messages
///
/// ```text
/// Type error: unbound identifier: x
///
/// Type error: type mismatch: expected int, found bool
///   Note: in function application
///
/// Type error: constructor SOME expects an argument
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElaborationError {
    /// Two types could not be unified.
    #[error("{}", located(.span, format!("{}{}", .error, note(.context))))]
    Unification {
        error: UnifyError,
        span: Span,
        /// What was being checked when unification failed
        context: Option<String>,
    },

    #[error("{}", located(.span, format!("unbound identifier: {}", .name)))]
    UnboundIdentifier { name: String, span: Span },

    #[error("{}", located(.span, format!("unbound type: {}", .name)))]
    UnboundType { name: String, span: Span },

    /// A name used in constructor position that is bound as a variable.
    #[error("{}", located(.span, format!("{} is not a constructor", .name)))]
    NotAConstructor { name: String, span: Span },

    /// A constructor used with the wrong number of arguments in a pattern.
    #[error("{}", located(.span, arity(.name, .expects_argument)))]
    ConstructorArity {
        name: String,
        expects_argument: bool,
        span: Span,
    },

    /// The same variable bound twice in one pattern or binding group.
    #[error("{}", located(.span, format!("identifier {} is bound twice", .name)))]
    DuplicateIdentifier { name: String, span: Span },

    #[error("{}", located(.span, format!("label {} appears twice", .label)))]
    DuplicateLabel { label: String, span: Span },

    #[error("{}", located(.span, format!("type {} expects {} argument(s), found {}", .name, .expected, .found)))]
    TypeArity {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    /// A flexible record pattern whose fields were never fixed.
    #[error("{}", located(.span, format!("unresolved flexible record type {}", .ty.normalize())))]
    UnresolvedRecord { ty: Type, span: Span },

    /// `val rec` whose right-hand side is not a `fn`.
    #[error("{}", located(.span, format!("recursive binding of {} must be a fn expression", .name)))]
    NonFunctionRecursion { name: String, span: Span },

    /// A declaration that would rebind a reserved identifier such as `true` or `::`.
    #[error("{}", located(.span, format!("cannot rebind {}", .name)))]
    Rebind { name: String, span: Span },
}

/// The source excerpt when the span has one; nodes built programmatically
/// have empty spans and get a plain `Type error:` line.
fn located(span: &Span, message: String) -> String {
    if span.source.is_empty() {
        format!("Type error: {}", message)
    } else {
        span.to_string(&message)
    }
}

fn note(context: &Option<String>) -> String {
    match context {
        Some(context) => format!("\n  Note: {}", context),
        None => String::new(),
    }
}

fn arity(name: &str, expects_argument: &bool) -> String {
    if *expects_argument {
        format!("constructor {} expects an argument", name)
    } else {
        format!("constructor {} takes no argument", name)
    }
}

impl ElaborationError {
    pub fn unbound_identifier(name: impl ToString, span: Span) -> Self {
        ElaborationError::UnboundIdentifier {
            name: name.to_string(),
            span,
        }
    }

    pub fn unbound_type(name: impl ToString, span: Span) -> Self {
        ElaborationError::UnboundType {
            name: name.to_string(),
            span,
        }
    }

    pub fn duplicate_identifier(name: impl ToString, span: Span) -> Self {
        ElaborationError::DuplicateIdentifier {
            name: name.to_string(),
            span,
        }
    }

    /// Attach the failing unification to a source location.
    pub fn from_unify_error(error: UnifyError, span: Span) -> Self {
        ElaborationError::Unification {
            error,
            span,
            context: None,
        }
    }

    /// Add context to this error (only affects `Unification`).
    pub fn with_context(mut self, context: impl ToString) -> Self {
        if let ElaborationError::Unification { context: ctx, .. } = &mut self {
            *ctx = Some(context.to_string());
        }
        self
    }

    pub fn span(&self) -> &Span {
        match self {
            ElaborationError::Unification { span, .. }
            | ElaborationError::UnboundIdentifier { span, .. }
            | ElaborationError::UnboundType { span, .. }
            | ElaborationError::NotAConstructor { span, .. }
            | ElaborationError::ConstructorArity { span, .. }
            | ElaborationError::DuplicateIdentifier { span, .. }
            | ElaborationError::DuplicateLabel { span, .. }
            | ElaborationError::TypeArity { span, .. }
            | ElaborationError::UnresolvedRecord { span, .. }
            | ElaborationError::NonFunctionRecursion { span, .. }
            | ElaborationError::Rebind { span, .. } => span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_span() -> Span {
        Span {
            start: (0, 0),
            end: (0, 0),
            source: String::new(),
        }
    }

    #[test]
    fn test_display_without_source() {
        let error = ElaborationError::unbound_identifier("x", dummy_span());
        assert_eq!(error.to_string(), "Type error: unbound identifier: x");
    }

    #[test]
    fn test_context_only_on_unification() {
        let error = ElaborationError::from_unify_error(
            UnifyError::Mismatch {
                expected: Type::int(),
                found: Type::bool(),
            },
            dummy_span(),
        )
        .with_context("in function application");
        assert_eq!(
            error.to_string(),
            "Type error: type mismatch: expected int, found bool\n  Note: in function application"
        );

        let unchanged = ElaborationError::unbound_type("t", dummy_span()).with_context("ignored");
        assert_eq!(unchanged.to_string(), "Type error: unbound type: t");
    }

    #[test]
    fn test_derived_messages() {
        let arity = ElaborationError::ConstructorArity {
            name: "SOME".to_string(),
            expects_argument: true,
            span: dummy_span(),
        };
        assert_eq!(arity.to_string(), "Type error: constructor SOME expects an argument");

        let rebind = ElaborationError::Rebind {
            name: "true".to_string(),
            span: dummy_span(),
        };
        assert_eq!(rebind.to_string(), "Type error: cannot rebind true");
        let boxed: Box<dyn std::error::Error> = Box::new(rebind);
        assert!(boxed.source().is_none());
    }
}
