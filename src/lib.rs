//! # smlcore - A typed evaluation engine for the Standard ML core language
//!
//! smlcore elaborates and evaluates Standard ML core-language declarations
//! one at a time against a persistent, session-wide environment. It takes an
//! already parsed abstract syntax tree; lexing and parsing live elsewhere.
//!
//! ## Architecture Overview
//!
//! Every top-level declaration passes through the following stages:
//!
//! 1. **Desugaring** (`desugar`) - Rewrites derived forms (tuples, lists,
//!    `if`, `case`, `andalso`, `orelse`, sequences, selectors, `fun`) into the
//!    core forms the later stages understand
//! 2. **Elaboration** (`types`) - Hindley-Milner inference with equality type
//!    variables, overloaded operators, flexible records, the value restriction
//!    and exhaustiveness warnings
//! 3. **Evaluation** (`interpreter`) - A tree-walking evaluator over closures,
//!    constructors, exceptions and mutable references
//! 4. **Binding** (`toplevel`) - Merges the static and dynamic results into a
//!    new [`State`] node
//!
//! ## Pipeline Flow
//!
//! ```text
//! Declaration (ast::Declaration)
//!     ↓
//! [Desugaring] → Core declaration
//!     ↓
//! [Elaborator] → Static bindings (types, identifier status)
//!     ↓
//! [Evaluator] → Dynamic bindings, or an uncaught exception
//!     ↓
//! [declare] → New State
//! ```
//!
//! ## Key Design Decisions
//!
//! ### A chain of states
//! Environments are immutable from the outside: a declaration never modifies
//! the State it was given. It returns a child node carrying only the new
//! bindings, and lookups walk the chain towards the root. A declaration that
//! fails to elaborate, or that raises while evaluating, therefore leaves the
//! caller's State exactly as it was.
//!
//! Some data is shared by the whole session rather than scoped to a node:
//! - the memory behind `ref` cells and arrays
//! - the bindings and constraints of type variables
//! - the warnings and the output of `print`
//!
//! ### Exceptions as values
//! Evaluation never unwinds the Rust stack for an SML exception. Every
//! evaluation result carries a thrown flag, and each rule stops at the first
//! raised subexpression. Only internal faults are reported as [`Error`].
//!
//! ### Generations
//! Constructors and exceptions are compared by name and by the generation
//! they were declared in, so redeclaring `exception Match` creates an
//! exception distinct from the builtin one.
//!
//! ## Module Structure
//!
//! - [`ast`] - Core-language syntax tree and builders
//! - [`desugar`] - Derived form expansion
//! - [`types`] - Types, unification, exhaustiveness and elaboration
//! - [`interpreter`] - Values, pattern matching and evaluation
//! - [`state`] - The environment chain and the session storage
//! - [`builtins`] - The initial State with the builtin types and functions
//! - [`toplevel`] - `declare` and the lookup functions front ends use
//! - [`error`] - Error and warning types
//!
//! ## Example
//!
//! ```
//! use smlcore::ast::build::*;
//! use smlcore::{declare, describe, initial_state, Options};
//!
//! let state = initial_state();
//! let factorial = fun(
//!     "fact",
//!     vec![
//!         (vec![pint(0)], int(1)),
//!         (vec![var("n")], infix("*", ident("n"), apply(ident("fact"), infix("-", ident("n"), int(1))))),
//!     ],
//! );
//! let state = declare(factorial, &state, &Options::default()).unwrap().state;
//! let state = declare(val(var("x"), apply(ident("fact"), int(5))), &state, &Options::default())
//!     .unwrap()
//!     .state;
//!
//! assert_eq!(describe("x", &state).unwrap(), "x : int = 120");
//! ```

pub mod ast;
pub mod builtins;
pub mod desugar;
pub mod error;
pub mod interpreter;
pub mod state;
pub mod toplevel;
pub mod types;

pub use builtins::initial_state;
pub use error::{Error, Warning};
pub use interpreter::{Evaluation, Value};
pub use state::{IdentifierStatus, State};
pub use toplevel::{
    declare, declared_names, describe, evaluate, infer, lookup_dynamic, lookup_static, DeclarationOutcome, Options,
};
pub use types::Type;
