pub mod error;
pub mod exhaustive;
pub mod infer;
pub mod ty;
pub mod unify;

pub use error::ElaborationError;
pub use infer::Elaborator;
pub use ty::{is_equality_variable, Type};
pub use unify::{admits_equality, instantiate, instantiate_scheme, matches, Constraint, UnifyError};
