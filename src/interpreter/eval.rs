//! Expression evaluation
//!
//! Every rule that evaluates more than one subexpression checks the thrown
//! flag after each step and stops at the first raised exception, so
//! exceptions propagate left to right without unwinding the host stack.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::expression::*;
use crate::error::Error;
use crate::state::{IdentifierStatus, State};

use super::declaration::Flow;
use super::pattern::match_pattern;
use super::value::{Closure, Evaluation, Value, MATCH};

/// Evaluate an expression and bail out with it when it raised.
macro_rules! propagate {
    ($evaluation:expr) => {{
        let evaluation = $evaluation;
        if evaluation.thrown {
            return Ok(evaluation);
        }
        evaluation.value
    }};
}

fn constant_value(constant: &Constant) -> Value {
    match constant {
        Constant::Int(value) => Value::Int(*value),
        Constant::Word(value) => Value::Word(*value),
        Constant::Real(value) => Value::Real(*value),
        Constant::Char(value) => Value::Char(*value),
        Constant::String(value) => Value::String(value.clone()),
    }
}

fn install(scope: &State, bindings: Vec<(String, Value)>) {
    for (name, value) in bindings {
        scope.set_dynamic_value(name, value, IdentifierStatus::Variable);
    }
}

impl Expression {
    pub fn evaluate(&self, state: &Rc<State>) -> Result<Evaluation, Error> {
        match self {
            Expression::Constant(literal) => Ok(Evaluation::returned(constant_value(&literal.value))),
            Expression::Ident(ident) => match state.lookup_dynamic_value(&ident.value, 0) {
                Some((value, _)) => Ok(Evaluation::returned(value)),
                None => Err(Error::evaluation(format!("unbound identifier {}", ident.value))),
            },
            Expression::Record(Record { fields, .. }) => {
                let mut values = IndexMap::new();
                for (label, field) in fields {
                    let value = propagate!(field.evaluate(state)?);
                    values.insert(label.clone(), value);
                }
                Ok(Evaluation::returned(Value::Record(values)))
            }
            Expression::Application(Application {
                function, argument, ..
            }) => {
                let function = propagate!(function.evaluate(state)?);
                let argument = propagate!(argument.evaluate(state)?);
                apply(function, argument, state)
            }
            Expression::Typed(Typed { expression, .. }) => expression.evaluate(state),
            Expression::Handle(Handle {
                expression,
                handler,
                ..
            }) => {
                let protected = expression.evaluate(state)?;
                if !protected.thrown {
                    return Ok(protected);
                }
                for clause in &handler.clauses {
                    if let Some(bindings) = match_pattern(&clause.pattern, &protected.value, state) {
                        let scope = state.child();
                        install(&scope, bindings);
                        return clause.body.evaluate(&scope);
                    }
                }
                Ok(protected)
            }
            Expression::Raise(Raise { expression, .. }) => {
                let exception = propagate!(expression.evaluate(state)?);
                Ok(Evaluation::raised(exception))
            }
            Expression::Lambda(Lambda { body, .. }) => Ok(Evaluation::returned(Value::Closure(Rc::new(Closure {
                state: Rc::clone(state),
                recursive_group: Rc::new(vec![]),
                clauses: Rc::clone(body),
            })))),
            Expression::Let(Let {
                declaration, body, ..
            }) => match declaration.evaluate(state)? {
                Flow::Continue(scope) => body.evaluate(&scope),
                Flow::Raised(exception) => Ok(Evaluation::raised(exception)),
            },
            Expression::While(While { condition, body, .. }) => {
                loop {
                    let condition = propagate!(condition.evaluate(state)?);
                    let Some(holds) = condition.as_bool() else {
                        return Err(Error::evaluation("while condition is not a boolean"));
                    };
                    if !holds {
                        break;
                    }
                    propagate!(body.evaluate(state)?);
                }
                Ok(Evaluation::returned(Value::unit()))
            }
            Expression::Tuple(_)
            | Expression::List(_)
            | Expression::IfThenElse(_)
            | Expression::Case(_)
            | Expression::AndAlso(_)
            | Expression::OrElse(_)
            | Expression::Sequence(_)
            | Expression::Selector(_) => Err(Error::internal(
                "derived form reached evaluation without desugaring",
            )),
        }
    }
}

/// Apply a function value to an argument.
pub fn apply(function: Value, argument: Value, state: &Rc<State>) -> Result<Evaluation, Error> {
    match function {
        Value::Closure(closure) => call(&closure, argument),
        Value::Native(native) => {
            log::trace!("call native {}", native.name);
            (native.implementation)(argument, state)
        }
        Value::ValueConstructor {
            name,
            generation: 0,
            ..
        } if name == "ref" => Ok(Evaluation::returned(Value::Reference(state.allocate(argument)))),
        Value::ValueConstructor { name, generation, .. } => Ok(Evaluation::returned(Value::Constructed {
            name,
            argument: Some(Box::new(argument)),
            generation,
        })),
        Value::ExceptionConstructor { name, generation, .. } => Ok(Evaluation::returned(Value::Exception {
            name,
            argument: Some(Box::new(argument)),
            generation,
        })),
        other => Err(Error::internal(format!("cannot apply {:?}", other))),
    }
}

/// Call a closure: bind its recursive group afresh in a frame that reuses
/// the defining state's id, then try each clause in order.
fn call(closure: &Closure, argument: Value) -> Result<Evaluation, Error> {
    log::trace!("call closure defined in state {}", closure.state.id());
    let frame = closure.state.child_with_id(closure.state.id());
    for (name, member) in closure.recursive_group.iter() {
        let member = match member {
            Value::Closure(template) => Value::Closure(Rc::new(Closure {
                state: Rc::clone(&template.state),
                recursive_group: Rc::clone(&closure.recursive_group),
                clauses: Rc::clone(&template.clauses),
            })),
            other => other.clone(),
        };
        frame.set_dynamic_value(name, member, IdentifierStatus::Variable);
    }

    for clause in &closure.clauses.clauses {
        if let Some(bindings) = match_pattern(&clause.pattern, &argument, &frame) {
            let scope = frame.child();
            install(&scope, bindings);
            return clause.body.evaluate(&scope);
        }
    }
    Ok(Evaluation::raise_builtin(MATCH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::ast::build::apply;
    use crate::builtins::initial_state;
    use crate::desugar::desugar_expression;

    fn run(expression: Expression) -> Evaluation {
        let state = initial_state();
        desugar_expression(expression).evaluate(&state).unwrap()
    }

    fn is_exception(evaluation: &Evaluation, name: &str) -> bool {
        evaluation.thrown
            && matches!(&evaluation.value, Value::Exception { name: found, generation: 0, .. } if found == name)
    }

    #[test]
    fn test_constant() {
        let result = run(int(5));
        assert!(!result.thrown);
        assert!(result.value.equals(&Value::Int(5)).unwrap());
    }

    #[test]
    fn test_closure_application() {
        let result = run(apply(lambda(vec![(var("x"), infix("+", ident("x"), int(1)))]), int(41)));
        assert!(result.value.equals(&Value::Int(42)).unwrap());
    }

    #[test]
    fn test_no_matching_clause_raises_match() {
        let result = run(case(int(2), vec![(pint(1), ident("true"))]));
        assert!(is_exception(&result, "Match"));
    }

    #[test]
    fn test_raise_propagates_through_record() {
        let result = run(tuple(vec![int(1), raise(ident("Bind")), apply(ident("print"), string("x"))]));
        assert!(is_exception(&result, "Bind"));
    }

    #[test]
    fn test_handle_catches_matching_exception() {
        let result = run(handle(raise(ident("Div")), vec![(var("Div"), int(0))]));
        assert!(!result.thrown);
        assert!(result.value.equals(&Value::Int(0)).unwrap());
    }

    #[test]
    fn test_handle_repropagates_unmatched_exception() {
        let result = run(handle(raise(ident("Div")), vec![(var("Match"), int(0))]));
        assert!(is_exception(&result, "Div"));
    }

    #[test]
    fn test_let_binds_for_body() {
        let result = run(let_in(val(var("x"), int(2)), infix("*", ident("x"), ident("x"))));
        assert!(result.value.equals(&Value::Int(4)).unwrap());
    }

    #[test]
    fn test_ref_and_assignment() {
        let body = sequence(vec![
            infix(":=", ident("r"), int(7)),
            apply(ident("!"), ident("r")),
        ]);
        let result = run(let_in(val(var("r"), apply(ident("ref"), int(1))), body));
        assert!(result.value.equals(&Value::Int(7)).unwrap());
    }

    #[test]
    fn test_while_loop() {
        let body = sequence(vec![
            while_do(
                infix("<", apply(ident("!"), ident("i")), int(10)),
                infix(":=", ident("i"), infix("+", apply(ident("!"), ident("i")), int(1))),
            ),
            apply(ident("!"), ident("i")),
        ]);
        let result = run(let_in(val(var("i"), apply(ident("ref"), int(0))), body));
        assert!(result.value.equals(&Value::Int(10)).unwrap());
    }

    #[test]
    fn test_andalso_short_circuits() {
        let result = run(and_also(ident("false"), raise(ident("Div"))));
        assert!(!result.thrown);
        assert_eq!(result.value.as_bool(), Some(false));
    }

    #[test]
    fn test_recursive_closure() {
        let factorial = fun(
            "fact",
            vec![
                (vec![pint(0)], int(1)),
                (
                    vec![var("n")],
                    infix("*", ident("n"), apply(ident("fact"), infix("-", ident("n"), int(1)))),
                ),
            ],
        );
        let result = run(let_in(factorial, apply(ident("fact"), int(5))));
        assert!(result.value.equals(&Value::Int(120)).unwrap());
    }

    #[test]
    fn test_selector() {
        let result = run(apply(selector("b"), record(vec![("a", int(1)), ("b", int(2))])));
        assert!(result.value.equals(&Value::Int(2)).unwrap());
    }

    #[test]
    fn test_derived_form_without_desugaring_is_internal() {
        let state = initial_state();
        let result = tuple(vec![int(1), int(2)]).evaluate(&state);
        assert!(matches!(result, Err(Error::Internal(_))));
    }
}
