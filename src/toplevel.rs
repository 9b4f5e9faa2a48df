//! Entry points used by front ends: declare a top-level declaration, query
//! the resulting State, and check or run single expressions.

use std::rc::Rc;

use crate::ast::{Declaration, Expression};
use crate::desugar::{desugar_declaration, desugar_expression};
use crate::error::{Error, Warning};
use crate::interpreter::{Evaluation, Flow, Value};
use crate::state::{Bindings, IdentifierStatus, State};
use crate::types::{instantiate, Elaborator, Type};

/// Which phases `declare` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub disable_elaboration: bool,
    pub disable_evaluation: bool,
    pub warn_nonexhaustive: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            disable_elaboration: false,
            disable_evaluation: false,
            warn_nonexhaustive: true,
        }
    }
}

#[derive(Debug)]
pub struct DeclarationOutcome {
    /// The State after the declaration; the input State when evaluation
    /// raised.
    pub state: Rc<State>,
    pub evaluation_errored: bool,
    /// The exception that escaped the declaration, if any.
    pub exception: Option<Value>,
    /// Warnings recorded while processing this declaration.
    pub warnings: Vec<Warning>,
}

/// Static bindings introduced by `declaration`, with every type variable the
/// declaration resolved substituted away.
fn elaborate(declaration: &Declaration, state: &Rc<State>, options: &Options) -> Result<Bindings, Error> {
    let checkpoint = state.type_variable_checkpoint();
    let mut elaborator = Elaborator::new(options.warn_nonexhaustive);
    let result = elaborator
        .elaborate_declaration(declaration, &state.child())
        .and_then(|result| elaborator.finish(&result).map(|_| result))
        .and_then(|result| result.bindings_since(state));
    let mut bindings = match result {
        Ok(bindings) => bindings,
        Err(error) => {
            elaborator.abandon(state, checkpoint);
            return Err(error);
        }
    };

    state.commit_type_variables(checkpoint);
    for (ty, _) in bindings.static_basis.values.values_mut() {
        *ty = instantiate(ty, state);
    }
    Ok(bindings)
}

/// Check, evaluate and bind a top-level declaration.
///
/// An elaboration error leaves `state` unchanged. An exception escaping
/// evaluation is reported in the outcome, whose State is then `state` itself.
pub fn declare(declaration: Declaration, state: &Rc<State>, options: &Options) -> Result<DeclarationOutcome, Error> {
    let declaration = desugar_declaration(declaration);
    let warnings_before = state.warning_count();
    let new_warnings = || state.warnings().into_iter().skip(warnings_before).collect::<Vec<_>>();

    let static_bindings = if options.disable_elaboration {
        None
    } else {
        match elaborate(&declaration, state, options) {
            Ok(bindings) => Some(bindings),
            Err(error) => {
                state.truncate_warnings(warnings_before);
                log::debug!("declaration rejected: {}", error);
                return Err(error);
            }
        }
    };

    let dynamic_bindings = if options.disable_evaluation {
        Bindings::default()
    } else {
        match declaration.evaluate(&state.child())? {
            Flow::Continue(result) => result.bindings_since(state)?,
            Flow::Raised(exception) => {
                log::debug!("uncaught exception {}", exception.render(state));
                return Ok(DeclarationOutcome {
                    state: Rc::clone(state),
                    evaluation_errored: true,
                    exception: Some(exception),
                    warnings: new_warnings(),
                });
            }
        }
    };

    let bindings = match static_bindings {
        Some(static_bindings) => dynamic_bindings.with_static_basis(static_bindings),
        None => dynamic_bindings,
    };
    let result = state.child();
    result.install(bindings);

    for name in result.declared_names(result.id()) {
        if let Some(line) = describe(&name, &result) {
            log::debug!("{}", line);
        }
    }

    Ok(DeclarationOutcome {
        state: result,
        evaluation_errored: false,
        exception: None,
        warnings: new_warnings(),
    })
}

/// Type and status of `name`, with resolved type variables substituted.
pub fn lookup_static(name: &str, state: &State) -> Option<(Type, IdentifierStatus)> {
    state
        .lookup_static_value(name, 0)
        .map(|(ty, status)| (instantiate(&ty, state), status))
}

pub fn lookup_dynamic(name: &str, state: &State) -> Option<(Value, IdentifierStatus)> {
    state.lookup_dynamic_value(name, 0)
}

/// Infer the type of a single expression. The State's type variables are
/// left as they were, so monomorphic bindings are not fixed by the query.
pub fn infer(expression: Expression, state: &Rc<State>) -> Result<Type, Error> {
    let expression = desugar_expression(expression);
    let checkpoint = state.type_variable_checkpoint();
    let mut elaborator = Elaborator::new(true);
    let ty = elaborator
        .infer_expression(&expression, state)
        .and_then(|ty| elaborator.finish(state).map(|_| ty))
        .map(|ty| instantiate(&ty, state));
    elaborator.abandon(state, checkpoint);
    ty
}

/// Evaluate a single expression without checking it.
pub fn evaluate(expression: Expression, state: &Rc<State>) -> Result<Evaluation, Error> {
    desugar_expression(expression).evaluate(state)
}

/// Value identifiers bound in nodes with id at least `id_limit`.
pub fn declared_names(state: &State, id_limit: usize) -> Vec<String> {
    state.declared_names(id_limit)
}

/// `name : type = value`, omitting whichever half is unknown.
pub fn describe(name: &str, state: &State) -> Option<String> {
    let ty = lookup_static(name, state).map(|(ty, _)| ty.normalize());
    let value = lookup_dynamic(name, state).map(|(value, _)| value.render(state));
    match (ty, value) {
        (Some(ty), Some(value)) => Some(format!("{} : {} = {}", name, ty, value)),
        (Some(ty), None) => Some(format!("{} : {}", name, ty)),
        (None, Some(value)) => Some(format!("{} = {}", name, value)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::builtins::initial_state;

    #[test]
    fn test_declare_binds_value_and_type() {
        let state = initial_state();
        let outcome = declare(val(var("x"), int(3)), &state, &Options::default()).unwrap();
        assert!(!outcome.evaluation_errored);
        assert_eq!(lookup_static("x", &outcome.state).unwrap().0, Type::int());
        assert!(lookup_dynamic("x", &outcome.state).is_some());
        assert_eq!(describe("x", &outcome.state).unwrap(), "x : int = 3");
    }

    #[test]
    fn test_elaboration_error_leaves_state_unchanged() {
        let state = initial_state();
        let before = state.declared_names(0).len();
        let result = declare(val(var("x"), apply(ident("not"), int(1))), &state, &Options::default());
        assert!(matches!(result, Err(Error::Elaboration(_))));
        assert_eq!(state.declared_names(0).len(), before);
        assert!(lookup_static("x", &state).is_none());
    }

    #[test]
    fn test_raised_exception_is_reported() {
        let state = initial_state();
        let outcome = declare(val(var("x"), raise(ident("Div"))), &state, &Options::default()).unwrap();
        assert!(outcome.evaluation_errored);
        assert!(Rc::ptr_eq(&outcome.state, &state));
        assert!(outcome.exception.unwrap().equals(&Value::builtin_exception("Div")).unwrap());
    }

    #[test]
    fn test_overload_defaulted_in_stored_type() {
        let state = initial_state();
        let declaration = fun("double", vec![(vec![var("x")], infix("+", ident("x"), ident("x")))]);
        let outcome = declare(declaration, &state, &Options::default()).unwrap();
        let (ty, _) = lookup_static("double", &outcome.state).unwrap();
        assert_eq!(ty.to_string(), "int -> int");
    }

    #[test]
    fn test_disabled_evaluation_binds_only_types() {
        let state = initial_state();
        let options = Options {
            disable_evaluation: true,
            ..Options::default()
        };
        let outcome = declare(val(var("x"), int(3)), &state, &options).unwrap();
        assert!(lookup_static("x", &outcome.state).is_some());
        assert!(lookup_dynamic("x", &outcome.state).is_none());
    }

    #[test]
    fn test_warnings_are_returned_per_declaration() {
        let state = initial_state();
        let first = declare(it(case(int(2), vec![(pint(1), int(0))])), &state, &Options::default()).unwrap();
        assert_eq!(first.warnings.len(), 1);
        let second = declare(val(var("y"), int(1)), &first.state, &Options::default()).unwrap();
        assert!(second.warnings.is_empty());
    }

    #[test]
    fn test_nonexhaustive_warning_can_be_disabled() {
        let state = initial_state();
        let options = Options {
            warn_nonexhaustive: false,
            ..Options::default()
        };
        let outcome = declare(it(lambda(vec![(pint(1), int(0))])), &state, &options).unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_infer_expression() {
        let state = initial_state();
        let ty = infer(lambda(vec![(var("x"), ident("x"))]), &state).unwrap();
        assert_eq!(ty.normalize().to_string(), "'a -> 'a");
    }

    #[test]
    fn test_failed_row_does_not_leak_into_next_declaration() {
        let state = initial_state();
        assert!(declare(it(selector("a")), &state, &Options::default()).is_err());
        assert!(declare(val(var("y"), int(1)), &state, &Options::default()).is_ok());
    }

    #[test]
    fn test_rejected_declaration_keeps_earlier_types() {
        let state = initial_state();
        let state = declare(val(var("r"), apply(ident("ref"), list(vec![]))), &state, &Options::default())
            .unwrap()
            .state;

        // The assignment unifies r with int list before `not 1` fails.
        let rejected = val(
            var("x"),
            tuple(vec![
                infix(":=", ident("r"), list(vec![int(1)])),
                apply(ident("not"), int(1)),
            ]),
        );
        assert!(matches!(
            declare(rejected, &state, &Options::default()),
            Err(Error::Elaboration(_))
        ));
        assert_eq!(lookup_static("r", &state).unwrap().0.normalize().to_string(), "'a list ref");

        let outcome = declare(
            val(var("y"), infix(":=", ident("r"), list(vec![string("s")]))),
            &state,
            &Options::default(),
        )
        .unwrap();
        assert_eq!(lookup_static("r", &outcome.state).unwrap().0.to_string(), "string list ref");
    }

    #[test]
    fn test_rejected_rebind_keeps_derived_forms() {
        let state = initial_state();
        let result = declare(
            datatype(vec![], "t", vec![("true", None), ("false", None)]),
            &state,
            &Options::default(),
        );
        assert!(matches!(result, Err(Error::Elaboration(_))));

        let outcome = declare(
            it(if_then_else(ident("true"), int(1), int(2))),
            &state,
            &Options::default(),
        )
        .unwrap();
        assert_eq!(describe("it", &outcome.state).unwrap(), "it : int = 1");
    }

    #[test]
    fn test_infer_does_not_fix_monomorphic_bindings() {
        let state = initial_state();
        let state = declare(val(var("r"), apply(ident("ref"), list(vec![]))), &state, &Options::default())
            .unwrap()
            .state;
        let ty = infer(apply(ident("!"), ident("r")), &state).unwrap();
        assert_eq!(ty.normalize().to_string(), "'a list");
        let ty = infer(infix(":=", ident("r"), list(vec![int(1)])), &state).unwrap();
        assert_eq!(ty, Type::unit());
        assert_eq!(lookup_static("r", &state).unwrap().0.normalize().to_string(), "'a list ref");
    }
}
