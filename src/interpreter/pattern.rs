use crate::ast::expression::{Constant, Ident};
use crate::ast::pattern::*;
use crate::state::State;

use super::value::Value;

/// Match `value` against `pattern`, returning the variable bindings on
/// success. Never raises; callers decide what a failed match means.
pub fn match_pattern(pattern: &Pattern, value: &Value, state: &State) -> Option<Vec<(String, Value)>> {
    let mut bindings = vec![];
    if match_into(pattern, value, state, &mut bindings) {
        Some(bindings)
    } else {
        None
    }
}

/// Name and generation of a constructor tag or constructed value.
fn tag(value: &Value) -> Option<(&str, usize)> {
    match value {
        Value::Constructed {
            name, generation, ..
        }
        | Value::Exception {
            name, generation, ..
        }
        | Value::ValueConstructor {
            name, generation, ..
        }
        | Value::ExceptionConstructor {
            name, generation, ..
        } => Some((name.as_str(), *generation)),
        _ => None,
    }
}

fn is_exception(value: &Value) -> bool {
    matches!(value, Value::Exception { .. } | Value::ExceptionConstructor { .. })
}

/// The bound constructor named by `ident`, if any.
fn constructor_tag(ident: &Ident, state: &State) -> Option<Value> {
    state
        .lookup_dynamic_value(&ident.value, 0)
        .filter(|(_, status)| status.is_constructor())
        .map(|(value, _)| value)
}

fn same_constructor(constructor: &Value, value: &Value) -> bool {
    is_exception(constructor) == is_exception(value) && tag(constructor).is_some() && tag(constructor) == tag(value)
}

fn constant_matches(constant: &Constant, value: &Value) -> bool {
    match (constant, value) {
        (Constant::Int(expected), Value::Int(found)) | (Constant::Word(expected), Value::Word(found)) => {
            expected == found
        }
        (Constant::Real(expected), Value::Real(found)) => expected == found,
        (Constant::Char(expected), Value::Char(found)) => expected == found,
        (Constant::String(expected), Value::String(found)) => expected == found,
        _ => false,
    }
}

fn match_into(pattern: &Pattern, value: &Value, state: &State, bindings: &mut Vec<(String, Value)>) -> bool {
    match pattern {
        Pattern::Wildcard(_) => true,
        Pattern::Constant(literal) => constant_matches(&literal.value, value),
        Pattern::Ident(ident) => match constructor_tag(ident, state) {
            Some(constructor) => {
                let has_argument = matches!(
                    value,
                    Value::Constructed { argument: Some(_), .. } | Value::Exception { argument: Some(_), .. }
                );
                !has_argument && same_constructor(&constructor, value)
            }
            None => {
                bindings.push((ident.value.clone(), value.clone()));
                true
            }
        },
        Pattern::Constructed(ConstructedPattern {
            constructor,
            argument,
            ..
        }) => {
            let Some(constructor) = constructor_tag(constructor, state) else {
                return false;
            };
            if let (Value::ValueConstructor { name, generation: 0, .. }, Value::Reference(address)) =
                (&constructor, value)
            {
                if name == "ref" {
                    return match state.cell(*address) {
                        Some(content) => match_into(argument, &content, state, bindings),
                        None => false,
                    };
                }
            }
            match value {
                Value::Constructed {
                    argument: Some(inner),
                    ..
                }
                | Value::Exception {
                    argument: Some(inner),
                    ..
                } if same_constructor(&constructor, value) => match_into(argument, inner, state, bindings),
                _ => false,
            }
        }
        Pattern::Record(RecordPattern { fields, complete, .. }) => {
            let Value::Record(values) = value else {
                return false;
            };
            if *complete && values.len() != fields.len() {
                return false;
            }
            fields.iter().all(|(label, field)| match values.get(label) {
                Some(inner) => match_into(field, inner, state, bindings),
                None => false,
            })
        }
        Pattern::Layered(LayeredPattern { name, pattern, .. }) => {
            bindings.push((name.value.clone(), value.clone()));
            match_into(pattern, value, state, bindings)
        }
        Pattern::Typed(TypedPattern { pattern, .. }) => match_into(pattern, value, state, bindings),
        Pattern::Tuple(TuplePattern { elements, .. }) => {
            let Value::Record(values) = value else {
                return false;
            };
            values.len() == elements.len()
                && elements.iter().enumerate().all(|(index, element)| {
                    match values.get(&(index + 1).to_string()) {
                        Some(inner) => match_into(element, inner, state, bindings),
                        None => false,
                    }
                })
        }
        Pattern::List(ListPattern { elements, .. }) => match value.as_list() {
            Some(values) if values.len() == elements.len() => elements
                .iter()
                .zip(&values)
                .all(|(element, inner)| match_into(element, inner, state, bindings)),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::builtins::initial_state;
    use crate::state::IdentifierStatus;

    #[test]
    fn test_wildcard_binds_nothing() {
        let state = initial_state();
        assert_eq!(match_pattern(&wildcard(), &Value::Int(3), &state).map(|b| b.len()), Some(0));
    }

    #[test]
    fn test_variable_binds_value() {
        let state = initial_state();
        let bindings = match_pattern(&var("x"), &Value::Int(3), &state).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].0, "x");
    }

    #[test]
    fn test_constant_pattern() {
        let state = initial_state();
        assert!(match_pattern(&pint(1), &Value::Int(1), &state).is_some());
        assert!(match_pattern(&pint(1), &Value::Int(2), &state).is_none());
        assert!(match_pattern(&pstring("a"), &Value::String("a".into()), &state).is_some());
    }

    #[test]
    fn test_constructor_identifier_does_not_bind() {
        let state = initial_state();
        assert!(match_pattern(&var("true"), &Value::bool(true), &state).is_some());
        assert!(match_pattern(&var("true"), &Value::bool(false), &state).is_none());
    }

    #[test]
    fn test_generation_distinguishes_constructors() {
        let state = initial_state();
        let shadow = state.child();
        shadow.set_dynamic_value(
            "Match",
            Value::Exception {
                name: "Match".to_string(),
                argument: None,
                generation: 1,
            },
            IdentifierStatus::ExceptionConstructor,
        );
        let builtin = Value::builtin_exception("Match");
        assert!(match_pattern(&var("Match"), &builtin, &shadow).is_none());
        assert!(match_pattern(&var("Match"), &builtin, &state).is_some());
    }

    #[test]
    fn test_list_and_cons_patterns() {
        let state = initial_state();
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let bindings = match_pattern(&pcons(var("h"), var("t")), &list, &state).unwrap();
        assert!(bindings[0].1.equals(&Value::Int(1)).unwrap());
        assert!(match_pattern(&plist(vec![var("a"), var("b")]), &list, &state).is_some());
        assert!(match_pattern(&plist(vec![var("a")]), &list, &state).is_none());
    }

    #[test]
    fn test_record_completeness() {
        let state = initial_state();
        let value = Value::tuple(vec![Value::Int(1), Value::Int(2)]);
        assert!(match_pattern(&precord(vec![("1", var("x"))], true), &value, &state).is_none());
        assert!(match_pattern(&precord(vec![("1", var("x"))], false), &value, &state).is_some());
    }

    #[test]
    fn test_layered_binds_whole_value() {
        let state = initial_state();
        let value = Value::tuple(vec![Value::Int(1), Value::Int(2)]);
        let bindings = match_pattern(&layered("p", ptuple(vec![var("a"), wildcard()])), &value, &state).unwrap();
        let names: Vec<&str> = bindings.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["p", "a"]);
    }

    #[test]
    fn test_ref_pattern_dereferences() {
        let state = initial_state();
        let address = state.allocate(Value::Int(9));
        let bindings = match_pattern(&constructed("ref", var("x")), &Value::Reference(address), &state).unwrap();
        assert!(bindings[0].1.equals(&Value::Int(9)).unwrap());
    }
}
