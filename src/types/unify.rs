use indexmap::IndexMap;
use thiserror::Error;

use crate::state::State;

use super::ty::{is_equality_variable, Type};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnifyError {
    #[error("type mismatch: expected {expected}, found {found}")]
    Mismatch { expected: Type, found: Type },
    #[error("occurs check: cannot construct infinite type {var} = {ty}")]
    OccursCheck { var: String, ty: Type },
    #[error("type {ty} does not admit equality")]
    Equality { ty: Type },
    #[error("type {ty} is not one of {}", list(.domain))]
    Overload { ty: Type, domain: Vec<Type> },
    #[error("record labels differ: {left} and {right}")]
    Labels { left: Type, right: Type },
}

fn list(types: &[Type]) -> String {
    types
        .iter()
        .map(Type::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Restriction attached to a type variable that is not bound yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// The variable must become one of these types (overloaded operators).
    Domain(Vec<Type>),
    /// The variable must become a record containing at least these fields.
    Row(IndexMap<String, Type>),
}

/// Follow bindings of a variable until reaching an unbound variable or a
/// non-variable type. Only the head is resolved.
fn resolve_head(ty: &Type, state: &State) -> Type {
    let mut current = ty.clone();
    let mut steps = 0;
    while let Type::Variable(name) = &current {
        match state.type_variable_binding(name) {
            Some(bound) if steps < 10_000 => {
                current = bound;
                steps += 1;
            }
            _ => break,
        }
    }
    current
}

/// Replace every bound type variable by its binding.
pub fn instantiate(ty: &Type, state: &State) -> Type {
    instantiate_guarded(ty, state, &mut vec![])
}

fn instantiate_guarded(ty: &Type, state: &State, seen: &mut Vec<String>) -> Type {
    match ty {
        Type::Variable(name) => {
            if seen.contains(name) {
                return ty.clone();
            }
            match state.type_variable_binding(name) {
                Some(bound) => {
                    seen.push(name.clone());
                    let resolved = instantiate_guarded(&bound, state, seen);
                    seen.pop();
                    resolved
                }
                None => ty.clone(),
            }
        }
        Type::Record { fields, complete } => Type::Record {
            fields: fields
                .iter()
                .map(|(label, field)| (label.clone(), instantiate_guarded(field, state, seen)))
                .collect(),
            complete: *complete,
        },
        Type::Function(param, result) => Type::function(
            instantiate_guarded(param, state, seen),
            instantiate_guarded(result, state, seen),
        ),
        Type::Named { name, args } => Type::named(
            name,
            args.iter()
                .map(|arg| instantiate_guarded(arg, state, seen))
                .collect(),
        ),
        Type::Scheme {
            bound,
            body,
            domain,
        } => Type::Scheme {
            bound: bound.clone(),
            body: Box::new(instantiate_guarded(body, state, seen)),
            domain: domain.clone(),
        },
        Type::Any => Type::Any,
    }
}

/// Open every outer quantifier of `ty` with a fresh variable, so independent
/// uses of a polymorphic binding never share inferred types.
pub fn instantiate_scheme(ty: &Type, state: &State) -> Type {
    let mut current = ty.clone();
    while let Type::Scheme {
        bound,
        body,
        domain,
    } = current
    {
        let fresh = state.fresh_type_variable(is_equality_variable(&bound));
        if !domain.is_empty() {
            if let Type::Variable(name) = &fresh {
                state.set_type_variable_constraint(name, Constraint::Domain(domain));
            }
        }
        current = body.substitute(&bound, &fresh);
    }
    current
}

fn occurs_in(var: &str, ty: &Type, state: &State) -> bool {
    match ty {
        Type::Variable(name) => {
            if name == var {
                return true;
            }
            match state.type_variable_binding(name) {
                Some(bound) => occurs_in(var, &bound, state),
                None => false,
            }
        }
        Type::Record { fields, .. } => fields.values().any(|field| occurs_in(var, field, state)),
        Type::Function(param, result) => occurs_in(var, param, state) || occurs_in(var, result, state),
        Type::Named { args, .. } => args.iter().any(|arg| occurs_in(var, arg, state)),
        Type::Scheme { bound, body, .. } => bound != var && occurs_in(var, body, state),
        Type::Any => false,
    }
}

/// Structurally unify `a` and `b`.
///
/// Every substitution is written into `state` as soon as it is found, so
/// later parts of the same type already see it. The returned list holds all
/// substitutions made, in order.
///
/// ```text
/// matches('t0 -> 't0, int -> 't1):
///   't0 := int
///   't1 := int        ('t0 already resolves to int)
/// ```
pub fn matches(a: &Type, b: &Type, state: &State) -> Result<Vec<(String, Type)>, UnifyError> {
    let a = resolve_head(a, state);
    let b = resolve_head(b, state);
    log::trace!("unify {} with {}", a, b);

    match (&a, &b) {
        (Type::Any, _) | (_, Type::Any) => Ok(vec![]),
        (Type::Variable(x), Type::Variable(y)) if x == y => Ok(vec![]),
        (Type::Variable(x), Type::Variable(y)) => bind_variables(x, y, state),
        (Type::Variable(x), other) | (other, Type::Variable(x)) => bind(x, other, state),
        (Type::Scheme { .. }, _) => matches(&instantiate_scheme(&a, state), &b, state),
        (_, Type::Scheme { .. }) => matches(&a, &instantiate_scheme(&b, state), state),
        (
            Type::Record {
                fields: left,
                complete: left_complete,
            },
            Type::Record {
                fields: right,
                complete: right_complete,
            },
        ) => {
            let left_in_right = left.keys().all(|label| right.contains_key(label));
            let right_in_left = right.keys().all(|label| left.contains_key(label));
            let compatible = match (left_complete, right_complete) {
                (true, true) => left_in_right && right_in_left,
                (false, true) => left_in_right,
                (true, false) => right_in_left,
                (false, false) => true,
            };
            if !compatible {
                return Err(UnifyError::Labels {
                    left: instantiate(&a, state),
                    right: instantiate(&b, state),
                });
            }
            let mut substitutions = vec![];
            for (label, field) in left {
                if let Some(other) = right.get(label) {
                    substitutions.extend(matches(field, other, state)?);
                }
            }
            Ok(substitutions)
        }
        (Type::Function(p1, r1), Type::Function(p2, r2)) => {
            let mut substitutions = matches(p1, p2, state)?;
            substitutions.extend(matches(r1, r2, state)?);
            Ok(substitutions)
        }
        (
            Type::Named {
                name: n1,
                args: args1,
            },
            Type::Named {
                name: n2,
                args: args2,
            },
        ) if n1 == n2 && args1.len() == args2.len() => {
            let mut substitutions = vec![];
            for (left, right) in args1.iter().zip(args2) {
                substitutions.extend(matches(left, right, state)?);
            }
            Ok(substitutions)
        }
        _ => Err(UnifyError::Mismatch {
            expected: instantiate(&a, state),
            found: instantiate(&b, state),
        }),
    }
}

/// Bind the unbound variable `var` to the non-variable type `ty`.
fn bind(var: &str, ty: &Type, state: &State) -> Result<Vec<(String, Type)>, UnifyError> {
    if occurs_in(var, ty, state) {
        return Err(UnifyError::OccursCheck {
            var: var.to_string(),
            ty: instantiate(ty, state),
        });
    }

    let mut substitutions = vec![];
    if is_equality_variable(var) {
        substitutions.extend(make_equality(ty, state)?);
    }

    let constraint = state.take_type_variable_constraint(var);
    state.bind_type_variable(var, ty.clone());
    substitutions.push((var.to_string(), ty.clone()));

    match constraint {
        None => {}
        Some(Constraint::Domain(domain)) => {
            let resolved = instantiate(ty, state);
            if !domain.contains(&resolved) {
                return Err(UnifyError::Overload {
                    ty: resolved,
                    domain,
                });
            }
        }
        Some(Constraint::Row(row)) => {
            let Type::Record { fields, .. } = ty else {
                return Err(UnifyError::Mismatch {
                    expected: Type::Record {
                        fields: row,
                        complete: false,
                    },
                    found: instantiate(ty, state),
                });
            };
            let open = Type::Record {
                fields: row,
                complete: false,
            };
            let closed = Type::Record {
                fields: fields.clone(),
                complete: true,
            };
            substitutions.extend(matches(&open, &closed, state)?);
        }
    }
    Ok(substitutions)
}

/// Bind one of two distinct unbound variables to the other, merging their
/// constraints onto the survivor.
fn bind_variables(x: &str, y: &str, state: &State) -> Result<Vec<(String, Type)>, UnifyError> {
    // keep the equality variable alive
    let (from, to) = if is_equality_variable(x) && !is_equality_variable(y) {
        (y, x)
    } else {
        (x, y)
    };

    let from_constraint = state.take_type_variable_constraint(from);
    let to_constraint = state.take_type_variable_constraint(to);
    state.bind_type_variable(from, Type::variable(to));
    let mut substitutions = vec![(from.to_string(), Type::variable(to))];

    let merged = match (from_constraint, to_constraint) {
        (None, None) => None,
        (Some(constraint), None) | (None, Some(constraint)) => Some(constraint),
        (Some(Constraint::Domain(left)), Some(Constraint::Domain(right))) => {
            let common: Vec<Type> = left.iter().filter(|ty| right.contains(ty)).cloned().collect();
            if common.is_empty() {
                return Err(UnifyError::Overload {
                    ty: Type::variable(to),
                    domain: left,
                });
            }
            Some(Constraint::Domain(common))
        }
        (Some(Constraint::Row(left)), Some(Constraint::Row(right))) => {
            let mut merged = right.clone();
            for (label, field) in left {
                match right.get(&label) {
                    Some(other) => substitutions.extend(matches(&field, other, state)?),
                    None => {
                        merged.insert(label, field);
                    }
                }
            }
            Some(Constraint::Row(merged))
        }
        (Some(Constraint::Row(row)), Some(Constraint::Domain(domain)))
        | (Some(Constraint::Domain(domain)), Some(Constraint::Row(row))) => {
            return Err(UnifyError::Overload {
                ty: Type::Record {
                    fields: row,
                    complete: false,
                },
                domain,
            });
        }
    };

    let merged = match merged {
        Some(Constraint::Domain(domain)) if is_equality_variable(to) => {
            let admitted: Vec<Type> = domain
                .iter()
                .filter(|ty| admits_equality(ty, state))
                .cloned()
                .collect();
            if admitted.is_empty() {
                return Err(UnifyError::Equality {
                    ty: Type::variable(to),
                });
            }
            Some(Constraint::Domain(admitted))
        }
        other => other,
    };
    if let Some(constraint) = merged {
        state.set_type_variable_constraint(to, constraint);
    }
    Ok(substitutions)
}

/// Force `ty` to admit equality, turning plain type variables inside it into
/// fresh equality variables.
fn make_equality(ty: &Type, state: &State) -> Result<Vec<(String, Type)>, UnifyError> {
    let ty = resolve_head(ty, state);
    match &ty {
        Type::Variable(name) if is_equality_variable(name) => Ok(vec![]),
        Type::Variable(name) => {
            let fresh = state.fresh_type_variable(true);
            matches(&Type::variable(name), &fresh, state)
        }
        Type::Record { fields, .. } => {
            let mut substitutions = vec![];
            for field in fields.values() {
                substitutions.extend(make_equality(field, state)?);
            }
            Ok(substitutions)
        }
        Type::Named { name, args } => {
            if is_reference_like(name) {
                return Ok(vec![]);
            }
            let allowed = state
                .lookup_static_type(name, 0)
                .map(|information| information.admits_equality)
                .unwrap_or(false);
            if !allowed {
                return Err(UnifyError::Equality {
                    ty: instantiate(&ty, state),
                });
            }
            let mut substitutions = vec![];
            for arg in args {
                substitutions.extend(make_equality(arg, state)?);
            }
            Ok(substitutions)
        }
        Type::Any => Ok(vec![]),
        Type::Function(..) | Type::Scheme { .. } => Err(UnifyError::Equality {
            ty: instantiate(&ty, state),
        }),
    }
}

/// Mutable cells compare by identity, whatever they hold.
fn is_reference_like(name: &str) -> bool {
    matches!(name, "ref" | "array")
}

/// Whether values of `ty` can be compared with `=`.
pub fn admits_equality(ty: &Type, state: &State) -> bool {
    match resolve_head(ty, state) {
        Type::Variable(name) => is_equality_variable(&name),
        Type::Record { fields, .. } => fields.values().all(|field| admits_equality(field, state)),
        Type::Named { name, args } => {
            if is_reference_like(&name) {
                return true;
            }
            state
                .lookup_static_type(&name, 0)
                .map(|information| information.admits_equality)
                .unwrap_or(false)
                && args.iter().all(|arg| admits_equality(arg, state))
        }
        Type::Function(..) | Type::Scheme { .. } | Type::Any => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::initial_state;

    fn var(name: &str) -> Type {
        Type::variable(name)
    }

    #[test]
    fn test_unify_identical_named() {
        let state = initial_state();
        assert_eq!(matches(&Type::int(), &Type::int(), &state), Ok(vec![]));
    }

    #[test]
    fn test_unify_named_mismatch() {
        let state = initial_state();
        let result = matches(&Type::int(), &Type::bool(), &state);
        assert_eq!(
            result,
            Err(UnifyError::Mismatch {
                expected: Type::int(),
                found: Type::bool()
            })
        );
    }

    #[test]
    fn test_unify_variable_binds_into_state() {
        let state = initial_state();
        let result = matches(&var("'x"), &Type::int(), &state).unwrap();
        assert_eq!(result, vec![("'x".to_string(), Type::int())]);
        assert_eq!(state.type_variable_binding("'x"), Some(Type::int()));
    }

    #[test]
    fn test_unify_threads_earlier_bindings() {
        let state = initial_state();
        let left = Type::function(var("'x"), var("'x"));
        let right = Type::function(Type::int(), var("'y"));
        matches(&left, &right, &state).unwrap();
        assert_eq!(instantiate(&var("'y"), &state), Type::int());
    }

    #[test]
    fn test_occurs_check() {
        let state = initial_state();
        let result = matches(&var("'x"), &Type::list(var("'x")), &state);
        assert!(matches!(result, Err(UnifyError::OccursCheck { .. })));
    }

    #[test]
    fn test_record_labels_must_agree() {
        let state = initial_state();
        let pair = Type::tuple(vec![Type::int(), Type::int()]);
        let triple = Type::tuple(vec![Type::int(), Type::int(), Type::int()]);
        assert!(matches!(
            matches(&pair, &triple, &state),
            Err(UnifyError::Labels { .. })
        ));
    }

    #[test]
    fn test_open_record_accepts_superset() {
        let state = initial_state();
        let mut fields = IndexMap::new();
        fields.insert("1".to_string(), var("'x"));
        let open = Type::Record {
            fields,
            complete: false,
        };
        let pair = Type::tuple(vec![Type::string(), Type::int()]);
        matches(&open, &pair, &state).unwrap();
        assert_eq!(instantiate(&var("'x"), &state), Type::string());
    }

    #[test]
    fn test_any_unifies_with_everything() {
        let state = initial_state();
        assert_eq!(matches(&Type::Any, &Type::real(), &state), Ok(vec![]));
    }

    #[test]
    fn test_equality_variable_rejects_real() {
        let state = initial_state();
        let result = matches(&var("''x"), &Type::real(), &state);
        assert!(matches!(result, Err(UnifyError::Equality { .. })));
    }

    #[test]
    fn test_equality_variable_rejects_functions() {
        let state = initial_state();
        let function = Type::function(Type::int(), Type::int());
        assert!(matches(&var("''x"), &function, &state).is_err());
    }

    #[test]
    fn test_equality_propagates_into_variables() {
        let state = initial_state();
        matches(&var("''x"), &Type::list(var("'y")), &state).unwrap();
        let resolved = instantiate(&var("'y"), &state);
        match resolved {
            Type::Variable(name) => assert!(is_equality_variable(&name)),
            other => panic!("expected an equality variable, got {}", other),
        }
    }

    #[test]
    fn test_domain_constraint_checks_membership() {
        let state = initial_state();
        let scheme = Type::overloaded(
            "'a",
            var("'a"),
            vec![Type::int(), Type::word(), Type::real()],
        );
        let instance = instantiate_scheme(&scheme, &state);
        assert!(matches(&instance, &Type::string(), &state).is_err());

        let other = instantiate_scheme(&scheme, &state);
        assert!(matches(&other, &Type::real(), &state).is_ok());
    }

    #[test]
    fn test_domains_intersect() {
        let state = initial_state();
        let int_real = Type::overloaded("'a", var("'a"), vec![Type::int(), Type::real()]);
        let int_word = Type::overloaded("'a", var("'a"), vec![Type::int(), Type::word()]);
        let left = instantiate_scheme(&int_real, &state);
        let right = instantiate_scheme(&int_word, &state);
        matches(&left, &right, &state).unwrap();
        assert!(matches(&left, &Type::real(), &state).is_err());
    }

    #[test]
    fn test_instantiate_scheme_is_fresh_each_time() {
        let state = initial_state();
        let identity = Type::scheme("'a", Type::function(var("'a"), var("'a")));
        let first = instantiate_scheme(&identity, &state);
        let second = instantiate_scheme(&identity, &state);
        assert_ne!(first, second);
        matches(&first, &Type::function(Type::int(), Type::int()), &state).unwrap();
        matches(&second, &Type::function(Type::bool(), Type::bool()), &state).unwrap();
    }

    #[test]
    fn test_admits_equality() {
        let state = initial_state();
        assert!(admits_equality(&Type::list(Type::int()), &state));
        assert!(!admits_equality(&Type::real(), &state));
        assert!(!admits_equality(
            &Type::function(Type::int(), Type::int()),
            &state
        ));
        assert!(admits_equality(&Type::reference(Type::real()), &state));
        assert!(admits_equality(&var("''a"), &state));
        assert!(!admits_equality(&var("'a"), &state));
    }
}
