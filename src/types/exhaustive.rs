//! Exhaustiveness of matches.
//!
//! Patterns are flattened into [`Shape`]s and checked with the usefulness
//! test over pattern matrices: a match is exhaustive when a wildcard row
//! would not be useful after its clauses.

use indexmap::IndexMap;

use crate::ast::expression::{Constant, Ident};
use crate::ast::pattern::*;
use crate::state::{IdentifierStatus, State};
use crate::types::{instantiate, Type};

#[derive(Debug, Clone)]
enum Shape {
    Any,
    Constructor {
        name: String,
        /// Every constructor of the datatype, `None` for exceptions.
        signature: Option<Vec<String>>,
        argument: Option<Box<Shape>>,
    },
    Record(IndexMap<String, Shape>),
    Constant(Constant),
}

/// Whether `patterns`, tried in order, cover every value.
pub fn is_exhaustive(patterns: &[&Pattern], state: &State) -> bool {
    let rows: Vec<Vec<Shape>> = patterns
        .iter()
        .map(|pattern| vec![shape(pattern, state)])
        .collect();
    !useful(&rows, &[Shape::Any])
}

/// Whether a single binding pattern can fail to match.
pub fn is_refutable(pattern: &Pattern, state: &State) -> bool {
    !is_exhaustive(&[pattern], state)
}

fn shape(pattern: &Pattern, state: &State) -> Shape {
    match pattern {
        Pattern::Wildcard(_) => Shape::Any,
        Pattern::Constant(literal) => Shape::Constant(literal.value.clone()),
        Pattern::Ident(ident) => match constructor(ident, state) {
            Some((name, signature)) => Shape::Constructor {
                name,
                signature,
                argument: None,
            },
            None => Shape::Any,
        },
        Pattern::Record(RecordPattern { fields, .. }) => Shape::Record(
            fields
                .iter()
                .map(|(label, field)| (label.clone(), shape(field, state)))
                .collect(),
        ),
        Pattern::Constructed(ConstructedPattern {
            constructor: ident,
            argument,
            ..
        }) => {
            let (name, signature) =
                constructor(ident, state).unwrap_or_else(|| (ident.value.clone(), None));
            Shape::Constructor {
                name,
                signature,
                argument: Some(Box::new(shape(argument, state))),
            }
        }
        Pattern::Layered(LayeredPattern { pattern, .. })
        | Pattern::Typed(TypedPattern { pattern, .. }) => shape(pattern, state),
        Pattern::Tuple(TuplePattern { elements, .. }) => tuple(
            elements
                .iter()
                .map(|element| shape(element, state))
                .collect(),
        ),
        Pattern::List(ListPattern { elements, .. }) => {
            let list_signature = Some(vec!["nil".to_string(), "::".to_string()]);
            elements.iter().rev().fold(
                Shape::Constructor {
                    name: "nil".to_string(),
                    signature: list_signature.clone(),
                    argument: None,
                },
                |tail, head| Shape::Constructor {
                    name: "::".to_string(),
                    signature: list_signature.clone(),
                    argument: Some(Box::new(tuple(vec![shape(head, state), tail]))),
                },
            )
        }
    }
}

fn tuple(elements: Vec<Shape>) -> Shape {
    Shape::Record(
        elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| ((index + 1).to_string(), element))
            .collect(),
    )
}

/// Name and sibling constructors of `ident`, if it is bound as a constructor.
fn constructor(ident: &Ident, state: &State) -> Option<(String, Option<Vec<String>>)> {
    let (ty, status) = state.lookup_static_value(&ident.value, 0)?;
    match status {
        IdentifierStatus::Variable => None,
        IdentifierStatus::ExceptionConstructor => Some((ident.value.clone(), None)),
        IdentifierStatus::ValueConstructor => {
            let result = match instantiate(&ty, state).body() {
                Type::Function(_, result) => (**result).clone(),
                other => other.clone(),
            };
            let signature = match result {
                Type::Named { name, .. } => state
                    .lookup_static_type(&name, 0)
                    .map(|information| information.constructors)
                    .filter(|constructors| !constructors.is_empty()),
                _ => None,
            };
            Some((ident.value.clone(), signature))
        }
    }
}

fn useful(rows: &[Vec<Shape>], vector: &[Shape]) -> bool {
    let Some((head, rest)) = vector.split_first() else {
        return rows.is_empty();
    };

    match head {
        Shape::Constructor { name, argument, .. } => {
            let arity = usize::from(argument.is_some());
            let mut specialized_vector: Vec<Shape> = argument.iter().map(|shape| (**shape).clone()).collect();
            specialized_vector.extend(rest.iter().cloned());
            useful(&specialize_constructor(rows, name, arity), &specialized_vector)
        }
        Shape::Constant(constant) => useful(&specialize_constant(rows, constant), rest),
        Shape::Record(fields) => {
            let labels = record_labels(rows, Some(fields));
            let mut specialized_vector: Vec<Shape> = labels
                .iter()
                .map(|label| fields.get(label).cloned().unwrap_or(Shape::Any))
                .collect();
            specialized_vector.extend(rest.iter().cloned());
            useful(&specialize_record(rows, &labels), &specialized_vector)
        }
        Shape::Any => {
            if rows.iter().any(|row| matches!(row.first(), Some(Shape::Record(_)))) {
                let labels = record_labels(rows, None);
                let mut specialized_vector = vec![Shape::Any; labels.len()];
                specialized_vector.extend(rest.iter().cloned());
                return useful(&specialize_record(rows, &labels), &specialized_vector);
            }

            if let Some(constructors) = complete_signature(rows) {
                return constructors.iter().any(|(name, arity)| {
                    let mut specialized_vector = vec![Shape::Any; *arity];
                    specialized_vector.extend(rest.iter().cloned());
                    useful(&specialize_constructor(rows, name, *arity), &specialized_vector)
                });
            }

            let default: Vec<Vec<Shape>> = rows
                .iter()
                .filter(|row| matches!(row.first(), Some(Shape::Any)))
                .map(|row| row[1..].to_vec())
                .collect();
            useful(&default, rest)
        }
    }
}

/// Constructors heading the first column, with their arities, when they
/// cover their whole datatype.
fn complete_signature(rows: &[Vec<Shape>]) -> Option<Vec<(String, usize)>> {
    let mut seen: IndexMap<String, usize> = IndexMap::new();
    let mut signature: Option<Vec<String>> = None;
    for row in rows {
        if let Some(Shape::Constructor {
            name,
            signature: row_signature,
            argument,
        }) = row.first()
        {
            seen.insert(name.clone(), usize::from(argument.is_some()));
            signature = signature.or_else(|| row_signature.clone());
        }
    }
    let signature = signature?;
    if signature.iter().all(|name| seen.contains_key(name)) {
        Some(seen.into_iter().collect())
    } else {
        None
    }
}

fn record_labels(rows: &[Vec<Shape>], extra: Option<&IndexMap<String, Shape>>) -> Vec<String> {
    let mut labels: Vec<String> = vec![];
    let heads = rows.iter().filter_map(|row| match row.first() {
        Some(Shape::Record(fields)) => Some(fields),
        _ => None,
    });
    for fields in heads.chain(extra) {
        for label in fields.keys() {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
    }
    labels
}

fn specialize_constructor(rows: &[Vec<Shape>], constructor: &str, arity: usize) -> Vec<Vec<Shape>> {
    rows.iter()
        .filter_map(|row| {
            let (head, rest) = row.split_first()?;
            let mut specialized = match head {
                Shape::Constructor { name, argument, .. } if name == constructor => {
                    match argument {
                        Some(argument) => vec![(**argument).clone()],
                        None => vec![Shape::Any; arity],
                    }
                }
                Shape::Any => vec![Shape::Any; arity],
                _ => return None,
            };
            specialized.extend(rest.iter().cloned());
            Some(specialized)
        })
        .collect()
}

fn specialize_constant(rows: &[Vec<Shape>], constant: &Constant) -> Vec<Vec<Shape>> {
    rows.iter()
        .filter_map(|row| {
            let (head, rest) = row.split_first()?;
            match head {
                Shape::Constant(other) if other == constant => Some(rest.to_vec()),
                Shape::Any => Some(rest.to_vec()),
                _ => None,
            }
        })
        .collect()
}

fn specialize_record(rows: &[Vec<Shape>], labels: &[String]) -> Vec<Vec<Shape>> {
    rows.iter()
        .filter_map(|row| {
            let (head, rest) = row.split_first()?;
            let mut specialized: Vec<Shape> = match head {
                Shape::Record(fields) => labels
                    .iter()
                    .map(|label| fields.get(label).cloned().unwrap_or(Shape::Any))
                    .collect(),
                Shape::Any => vec![Shape::Any; labels.len()],
                _ => return None,
            };
            specialized.extend(rest.iter().cloned());
            Some(specialized)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::builtins::initial_state;

    #[test]
    fn test_variable_is_exhaustive() {
        let state = initial_state();
        assert!(is_exhaustive(&[&var("x")], &state));
        assert!(!is_refutable(&wildcard(), &state));
    }

    #[test]
    fn test_constants_are_never_exhaustive() {
        let state = initial_state();
        assert!(!is_exhaustive(&[&pint(1), &pint(2)], &state));
        assert!(is_exhaustive(&[&pint(1), &wildcard()], &state));
    }

    #[test]
    fn test_bool_constructors_cover() {
        let state = initial_state();
        assert!(is_exhaustive(&[&var("true"), &var("false")], &state));
        assert!(!is_exhaustive(&[&var("true")], &state));
    }

    #[test]
    fn test_list_patterns() {
        let state = initial_state();
        let cons = pcons(var("x"), var("xs"));
        assert!(is_exhaustive(&[&plist(vec![]), &cons], &state));
        assert!(!is_exhaustive(&[&cons], &state));

        let single = plist(vec![var("x")]);
        assert!(!is_exhaustive(&[&plist(vec![]), &single], &state));
    }

    #[test]
    fn test_tuples_need_every_combination() {
        let state = initial_state();
        let rows = [
            ptuple(vec![var("true"), var("true")]),
            ptuple(vec![var("false"), wildcard()]),
        ];
        assert!(!is_exhaustive(&[&rows[0], &rows[1]], &state));

        let last = ptuple(vec![wildcard(), var("false")]);
        assert!(is_exhaustive(&[&rows[0], &rows[1], &last], &state));
    }

    #[test]
    fn test_exceptions_are_open() {
        let state = initial_state();
        assert!(!is_exhaustive(&[&var("Match"), &var("Bind")], &state));
    }

    #[test]
    fn test_incomplete_record_pattern() {
        let state = initial_state();
        let pattern = precord(vec![("a", var("x"))], false);
        assert!(!is_refutable(&pattern, &state));
    }
}
