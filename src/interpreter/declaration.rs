use std::rc::Rc;

use crate::ast::declaration::*;
use crate::ast::expression::{Expression, Lambda, Typed};
use crate::error::Error;
use crate::state::{allows_rebind, IdentifierStatus, InfixStatus, State};

use super::pattern::match_pattern;
use super::value::{Closure, Value, BIND};

/// Outcome of evaluating a declaration.
#[derive(Debug)]
pub enum Flow {
    /// The node holding the new bindings.
    Continue(Rc<State>),
    /// An exception escaped; nothing was bound.
    Raised(Value),
}

fn check_rebind(name: &str) -> Result<(), Error> {
    if allows_rebind(name) {
        Ok(())
    } else {
        Err(Error::evaluation(format!("cannot rebind {}", name)))
    }
}

fn lambda_of(expression: &Expression) -> Option<&Lambda> {
    match expression {
        Expression::Lambda(lambda) => Some(lambda),
        Expression::Typed(Typed { expression, .. }) => lambda_of(expression),
        _ => None,
    }
}

impl Declaration {
    pub fn evaluate(&self, state: &Rc<State>) -> Result<Flow, Error> {
        match self {
            Declaration::Value(ValueDeclaration {
                recursive: false,
                bindings,
                ..
            }) => {
                let mut values = vec![];
                for binding in bindings {
                    let evaluation = binding.expression.evaluate(state)?;
                    if evaluation.thrown {
                        return Ok(Flow::Raised(evaluation.value));
                    }
                    values.push(evaluation.value);
                }

                let result = state.child();
                for (binding, value) in bindings.iter().zip(&values) {
                    let Some(matched) = match_pattern(&binding.pattern, value, state) else {
                        return Ok(Flow::Raised(Value::builtin_exception(BIND)));
                    };
                    for (name, value) in matched {
                        result.set_dynamic_value(name, value, IdentifierStatus::Variable);
                    }
                }
                Ok(Flow::Continue(result))
            }
            Declaration::Value(ValueDeclaration {
                recursive: true,
                bindings,
                ..
            }) => {
                let mut templates = vec![];
                for binding in bindings {
                    let (Some(name), Some(lambda)) = (binding.pattern.bound_name(), lambda_of(&binding.expression))
                    else {
                        return Err(Error::internal("recursive binding is not a fn"));
                    };
                    check_rebind(&name.value)?;
                    templates.push((
                        name.value.clone(),
                        Value::Closure(Rc::new(Closure {
                            state: Rc::clone(state),
                            recursive_group: Rc::new(vec![]),
                            clauses: Rc::clone(&lambda.body),
                        })),
                    ));
                }

                let group = Rc::new(templates);
                let result = state.child();
                for (name, template) in group.iter() {
                    let Value::Closure(template) = template else {
                        continue;
                    };
                    let closure = Value::Closure(Rc::new(Closure {
                        state: Rc::clone(&template.state),
                        recursive_group: Rc::clone(&group),
                        clauses: Rc::clone(&template.clauses),
                    }));
                    result.set_dynamic_value(name, closure, IdentifierStatus::Variable);
                }
                Ok(Flow::Continue(result))
            }
            Declaration::Type(_) => Ok(Flow::Continue(state.child())),
            Declaration::Datatype(DatatypeDeclaration { bindings, .. }) => {
                let result = state.child();
                for binding in bindings {
                    let mut names = vec![];
                    for constructor in &binding.constructors {
                        let name = constructor.name.value.clone();
                        check_rebind(&name)?;
                        let generation = state.next_generation(&name);
                        let value = match constructor.argument {
                            Some(_) => Value::ValueConstructor {
                                name: name.clone(),
                                arity: 1,
                                generation,
                            },
                            None => Value::Constructed {
                                name: name.clone(),
                                argument: None,
                                generation,
                            },
                        };
                        result.set_dynamic_value(&name, value, IdentifierStatus::ValueConstructor);
                        names.push(name);
                    }
                    result.set_dynamic_type(&binding.name.value, names);
                }
                Ok(Flow::Continue(result))
            }
            Declaration::DatatypeReplication(DatatypeReplication { name, original, .. }) => {
                let Some(constructors) = state.lookup_dynamic_type(&original.value, 0) else {
                    return Err(Error::evaluation(format!("unbound datatype {}", original.value)));
                };
                let result = state.child();
                for constructor in &constructors {
                    if let Some((value, status)) = state.lookup_dynamic_value(constructor, 0) {
                        result.set_dynamic_value(constructor, value, status);
                    }
                }
                result.set_dynamic_type(&name.value, constructors);
                Ok(Flow::Continue(result))
            }
            Declaration::Exception(ExceptionDeclaration { bindings, .. }) => {
                let result = state.child();
                for binding in bindings {
                    match binding {
                        ExceptionBinding::New { name, argument } => {
                            check_rebind(&name.value)?;
                            let generation = state.next_generation(&name.value);
                            let value = match argument {
                                Some(_) => Value::ExceptionConstructor {
                                    name: name.value.clone(),
                                    arity: 1,
                                    generation,
                                },
                                None => Value::Exception {
                                    name: name.value.clone(),
                                    argument: None,
                                    generation,
                                },
                            };
                            result.set_dynamic_value(&name.value, value, IdentifierStatus::ExceptionConstructor);
                        }
                        ExceptionBinding::Alias { name, original } => {
                            check_rebind(&name.value)?;
                            let Some((value, _)) = state.lookup_dynamic_value(&original.value, 0) else {
                                return Err(Error::evaluation(format!("unbound exception {}", original.value)));
                            };
                            result.set_dynamic_value(&name.value, value, IdentifierStatus::ExceptionConstructor);
                        }
                    }
                }
                Ok(Flow::Continue(result))
            }
            Declaration::Local(LocalDeclaration {
                declaration, body, ..
            }) => {
                let inner = match declaration.evaluate(state)? {
                    Flow::Continue(inner) => inner,
                    raised => return Ok(raised),
                };
                let outer = match body.evaluate(&inner)? {
                    Flow::Continue(outer) => outer,
                    raised => return Ok(raised),
                };
                let result = state.child();
                result.install(outer.bindings_since(&inner)?);
                Ok(Flow::Continue(result))
            }
            Declaration::Sequential(SequentialDeclaration { declarations, .. }) => {
                let mut current = Rc::clone(state);
                for declaration in declarations {
                    current = match declaration.evaluate(&current)? {
                        Flow::Continue(next) => next,
                        raised => return Ok(raised),
                    };
                }
                Ok(Flow::Continue(current))
            }
            Declaration::Infix(InfixDeclaration {
                operators,
                precedence,
                right_associative,
                ..
            }) => {
                let result = state.child();
                for operator in operators {
                    result.set_infix(
                        &operator.value,
                        InfixStatus {
                            infix: true,
                            precedence: *precedence,
                            right_associative: *right_associative,
                        },
                    );
                }
                Ok(Flow::Continue(result))
            }
            Declaration::Nonfix(NonfixDeclaration { operators, .. }) => {
                let result = state.child();
                for operator in operators {
                    result.set_infix(&operator.value, InfixStatus::nonfix());
                }
                Ok(Flow::Continue(result))
            }
            Declaration::Empty => Ok(Flow::Continue(Rc::clone(state))),
            Declaration::Function(_) => Err(Error::internal(
                "fun declaration reached evaluation without desugaring",
            )),
        }
    }
}
