//! # Error Kinds
//!
//! Every fallible operation of the engine returns [`Error`]:
//!
//! - [`Error::Elaboration`] - the declaration is ill-typed; the State it was
//!   checked against is left untouched
//! - [`Error::Evaluation`] - a runtime fact that static checking should have
//!   ruled out (e.g. a missing record field)
//! - [`Error::Internal`] - a broken invariant of the engine itself
//!
//! Exceptions raised by programs (`Div`, `Match`, user exceptions) are not
//! errors. They travel as ordinary values with the thrown flag set.

use std::fmt;

use lachs::Span;
use thiserror::Error;

use crate::types::ElaborationError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Elaboration(#[from] ElaborationError),
    #[error("Evaluation error: {0}")]
    Evaluation(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn internal(message: impl ToString) -> Self {
        Error::Internal(message.to_string())
    }

    pub fn evaluation(message: impl ToString) -> Self {
        Error::Evaluation(message.to_string())
    }
}

/// Non-fatal diagnostic accumulated on the State.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub message: String,
    pub position: Span,
}

impl Warning {
    pub fn new(message: impl ToString, position: Span) -> Self {
        Self {
            message: message.to_string(),
            position,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.position.source.is_empty() {
            write!(f, "Warning: {}", self.message)
        } else {
            write!(f, "{}", self.position.to_string(&self.message))
        }
    }
}
