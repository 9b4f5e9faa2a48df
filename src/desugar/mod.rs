//! Desugaring - lower derived forms into the core language
//!
//! This module handles the following transformations:
//! - `(e1, ..., en)` → `{1 = e1, ..., n = en}`
//! - `[e1, ..., en]` → `e1 :: ... :: en :: nil`
//! - `case e of m` → `(fn m) e`
//! - `if c then a else b` → `case c of true => a | false => b`
//! - `a andalso b` → `if a then b else false`, `a orelse b` → `if a then true else b`
//! - `(e1; ...; en)` → `case e1 of _ => ... en`
//! - `#label` → `fn {label = x, ...} => x`
//! - clausal `fun` → `val rec` over nested `fn`s
//!
//! Patterns are left alone: tuple and list patterns are understood directly
//! by both the elaborator and the pattern matcher.

use std::rc::Rc;

use lachs::Span;

use crate::ast::declaration::*;
use crate::ast::expression::*;
use crate::ast::pattern::{Pattern, RecordPattern, TuplePattern, Wildcard};

/// Desugar a declaration and every expression inside it
pub fn desugar_declaration(declaration: Declaration) -> Declaration {
    match declaration {
        Declaration::Value(ValueDeclaration {
            recursive,
            bindings,
            position,
        }) => Declaration::Value(ValueDeclaration {
            recursive,
            bindings: bindings
                .into_iter()
                .map(|ValueBinding { pattern, expression }| ValueBinding {
                    pattern,
                    expression: desugar_expression(expression),
                })
                .collect(),
            position,
        }),
        Declaration::Function(function) => desugar_function(function),
        Declaration::Local(LocalDeclaration {
            declaration,
            body,
            position,
        }) => Declaration::Local(LocalDeclaration {
            declaration: Box::new(desugar_declaration(*declaration)),
            body: Box::new(desugar_declaration(*body)),
            position,
        }),
        Declaration::Sequential(SequentialDeclaration {
            declarations,
            position,
        }) => Declaration::Sequential(SequentialDeclaration {
            declarations: declarations.into_iter().map(desugar_declaration).collect(),
            position,
        }),
        other => other,
    }
}

/// Desugar an expression into core forms only
pub fn desugar_expression(expression: Expression) -> Expression {
    match expression {
        Expression::Constant(_) | Expression::Ident(_) => expression,
        Expression::Record(Record { fields, position }) => Expression::Record(Record {
            fields: fields
                .into_iter()
                .map(|(label, field)| (label, desugar_expression(field)))
                .collect(),
            position,
        }),
        Expression::Application(Application {
            function,
            argument,
            position,
        }) => Expression::Application(Application {
            function: Box::new(desugar_expression(*function)),
            argument: Box::new(desugar_expression(*argument)),
            position,
        }),
        Expression::Typed(Typed {
            expression,
            ty,
            position,
        }) => Expression::Typed(Typed {
            expression: Box::new(desugar_expression(*expression)),
            ty,
            position,
        }),
        Expression::Handle(Handle {
            expression,
            handler,
            position,
        }) => Expression::Handle(Handle {
            expression: Box::new(desugar_expression(*expression)),
            handler: desugar_match(handler),
            position,
        }),
        Expression::Raise(Raise {
            expression,
            position,
        }) => Expression::Raise(Raise {
            expression: Box::new(desugar_expression(*expression)),
            position,
        }),
        Expression::Lambda(Lambda { body, position }) => {
            let body = Rc::try_unwrap(body).unwrap_or_else(|shared| (*shared).clone());
            lambda(desugar_match(body), position)
        }
        Expression::Let(Let {
            declaration,
            body,
            position,
        }) => Expression::Let(Let {
            declaration: Box::new(desugar_declaration(*declaration)),
            body: Box::new(desugar_expression(*body)),
            position,
        }),
        Expression::While(While {
            condition,
            body,
            position,
        }) => Expression::While(While {
            condition: Box::new(desugar_expression(*condition)),
            body: Box::new(desugar_expression(*body)),
            position,
        }),
        Expression::Tuple(Tuple { elements, position }) => {
            let mut elements: Vec<Expression> =
                elements.into_iter().map(desugar_expression).collect();
            if elements.len() == 1 {
                return elements.remove(0);
            }
            tuple(elements, position)
        }
        Expression::List(List { elements, position }) => elements
            .into_iter()
            .rev()
            .fold(ident("nil", &position), |tail, head| {
                Expression::Application(Application {
                    function: Box::new(ident("::", &position)),
                    argument: Box::new(tuple(vec![desugar_expression(head), tail], position.clone())),
                    position: position.clone(),
                })
            }),
        Expression::IfThenElse(IfThenElse {
            condition,
            then_branch,
            else_branch,
            position,
        }) => if_then_else(
            desugar_expression(*condition),
            desugar_expression(*then_branch),
            desugar_expression(*else_branch),
            position,
        ),
        Expression::Case(Case {
            scrutinee,
            arms,
            position,
        }) => case(desugar_expression(*scrutinee), desugar_match(arms), position),
        Expression::AndAlso(Binary {
            left,
            right,
            position,
        }) => if_then_else(
            desugar_expression(*left),
            desugar_expression(*right),
            ident("false", &position),
            position,
        ),
        Expression::OrElse(Binary {
            left,
            right,
            position,
        }) => if_then_else(
            desugar_expression(*left),
            ident("true", &position),
            desugar_expression(*right),
            position,
        ),
        Expression::Sequence(Sequence {
            expressions,
            position,
        }) => {
            let mut expressions: Vec<Expression> =
                expressions.into_iter().map(desugar_expression).collect();
            let Some(last) = expressions.pop() else {
                return tuple(vec![], position);
            };
            expressions.into_iter().rev().fold(last, |rest, first| {
                case(
                    first,
                    single_clause(Pattern::Wildcard(Wildcard { position: position.clone() }), rest, &position),
                    position.clone(),
                )
            })
        }
        Expression::Selector(Selector { label, position }) => {
            let selected = "__selected";
            let pattern = Pattern::Record(RecordPattern {
                fields: vec![(label, Pattern::Ident(name(selected, &position)))],
                complete: false,
                position: position.clone(),
            });
            lambda(
                single_clause(pattern, ident(selected, &position), &position),
                position,
            )
        }
    }
}

fn desugar_match(Match { clauses, position }: Match) -> Match {
    Match {
        clauses: clauses
            .into_iter()
            .map(|Clause { pattern, body }| Clause {
                pattern,
                body: desugar_expression(body),
            })
            .collect(),
        position,
    }
}

/// `fun f p1 ... pn = e | ...` becomes
/// `val rec f = fn __arg1 => ... fn __argn => case (__arg1, ..., __argn) of (p1, ..., pn) => e | ...`
fn desugar_function(FunctionDeclaration { bindings, position }: FunctionDeclaration) -> Declaration {
    let bindings = bindings
        .into_iter()
        .map(|binding| {
            let FunctionBinding {
                name: function_name,
                clauses,
                position,
            } = binding;
            let arity = clauses
                .first()
                .map(|clause| clause.parameters.len())
                .unwrap_or(1)
                .max(1);

            let arms: Vec<Clause> = clauses
                .into_iter()
                .map(|FunctionClause {
                          parameters,
                          result_type,
                          body,
                      }| {
                    let body = desugar_expression(body);
                    let body = match result_type {
                        Some(ty) => Expression::Typed(Typed {
                            position: body.position().clone(),
                            expression: Box::new(body),
                            ty,
                        }),
                        None => body,
                    };
                    let pattern = if parameters.len() == 1 {
                        parameters.into_iter().next().unwrap_or_else(|| wildcard(&position))
                    } else {
                        Pattern::Tuple(TuplePattern {
                            elements: parameters,
                            position: position.clone(),
                        })
                    };
                    Clause { pattern, body }
                })
                .collect();
            let arms = Match {
                clauses: arms,
                position: position.clone(),
            };

            let expression = if arity == 1 {
                lambda(arms, position.clone())
            } else {
                let arguments: Vec<String> = (1..=arity).map(|index| format!("__arg{}", index)).collect();
                let scrutinee = tuple(
                    arguments
                        .iter()
                        .map(|argument| ident(argument, &position))
                        .collect(),
                    position.clone(),
                );
                arguments
                    .iter()
                    .rev()
                    .fold(case(scrutinee, arms, position.clone()), |body, argument| {
                        lambda(
                            single_clause(Pattern::Ident(name(argument, &position)), body, &position),
                            position.clone(),
                        )
                    })
            };

            ValueBinding {
                pattern: Pattern::Ident(function_name),
                expression,
            }
        })
        .collect();

    Declaration::Value(ValueDeclaration {
        recursive: true,
        bindings,
        position,
    })
}

fn name(value: &str, position: &Span) -> Ident {
    Ident {
        value: value.to_string(),
        position: position.clone(),
    }
}

fn ident(value: &str, position: &Span) -> Expression {
    Expression::Ident(name(value, position))
}

fn wildcard(position: &Span) -> Pattern {
    Pattern::Wildcard(Wildcard {
        position: position.clone(),
    })
}

fn tuple(elements: Vec<Expression>, position: Span) -> Expression {
    Expression::Record(Record {
        fields: elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| ((index + 1).to_string(), element))
            .collect(),
        position,
    })
}

fn lambda(body: Match, position: Span) -> Expression {
    Expression::Lambda(Lambda {
        body: Rc::new(body),
        position,
    })
}

fn single_clause(pattern: Pattern, body: Expression, position: &Span) -> Match {
    Match {
        clauses: vec![Clause { pattern, body }],
        position: position.clone(),
    }
}

fn case(scrutinee: Expression, arms: Match, position: Span) -> Expression {
    Expression::Application(Application {
        function: Box::new(lambda(arms, position.clone())),
        argument: Box::new(scrutinee),
        position,
    })
}

fn if_then_else(condition: Expression, then_branch: Expression, else_branch: Expression, position: Span) -> Expression {
    let arms = Match {
        clauses: vec![
            Clause {
                pattern: Pattern::Ident(name("true", &position)),
                body: then_branch,
            },
            Clause {
                pattern: Pattern::Ident(name("false", &position)),
                body: else_branch,
            },
        ],
        position: position.clone(),
    };
    case(condition, arms, position)
}
