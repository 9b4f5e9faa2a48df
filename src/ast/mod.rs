//! Abstract syntax consumed by the engine.
//!
//! The parser is an external collaborator: it hands over trees in which every
//! infix application has already been resolved into an ordinary
//! [`Application`](expression::Application) of the operator to a pair.
//! Derived forms (tuples, lists, `if`, `case`, `andalso`, `orelse`,
//! sequences, `#label`, clausal `fun`) are kept as separate nodes and lowered
//! by [`crate::desugar`] before checking and evaluation.

pub mod build;
pub mod declaration;
pub mod expression;
pub mod pattern;
pub mod type_expression;

pub use declaration::Declaration;
pub use expression::{Constant, Expression, Match};
pub use pattern::Pattern;
pub use type_expression::TypeExpression;
