//! # Elaboration
//!
//! Hindley-Milner inference over the desugared AST. Every binding the
//! elaborator introduces is written into a State node, so the static half of
//! a declaration is built with the same chain discipline as the dynamic half:
//! each declaration pushes a child and installs its bindings there.
//!
//! ## Polymorphism
//!
//! Bindings are generalized only when their right-hand side is
//! non-expansive (the value restriction). Type variables that are free in
//! the enclosing environment, or that still carry an overload domain or a
//! row constraint, are never quantified.
//!
//! ```text
//! val id = fn x => x          id : 'a -> 'a      (generalized)
//! val r = ref nil             r : 't3 list ref   (expansive, stays monomorphic)
//! val sum = fn (a, b) => a + b
//!                             sum : int * int -> int  (domain defaulted)
//! ```
//!
//! ## Finishing a Declaration
//!
//! [`Elaborator::finish`] runs after each top-level declaration. Overloaded
//! variables that are still open default to `int` (or the first member of
//! their domain), and flexible records that never met a complete record type
//! are rejected.

use std::collections::HashMap;
use std::rc::Rc;

use lachs::Span;

use crate::ast::declaration::*;
use crate::ast::expression::*;
use crate::ast::pattern::*;
use crate::ast::type_expression::*;
use crate::error::{Error, Warning};
use crate::state::{allows_rebind, IdentifierStatus, InfixStatus, State, TypeInformation};

use super::error::ElaborationError;
use super::exhaustive::{is_exhaustive, is_refutable};
use super::ty::{is_equality_variable, Type};
use super::unify::{admits_equality, instantiate, instantiate_scheme, matches, Constraint};

pub struct Elaborator {
    warn_nonexhaustive: bool,
    /// Type variables written in annotations, per top-level declaration.
    type_variables: HashMap<String, Type>,
    /// Row variables created by flexible record patterns.
    rows: Vec<(String, Span)>,
}

fn unify(expected: &Type, found: &Type, state: &State, span: &Span, context: &str) -> Result<(), Error> {
    matches(expected, found, state)
        .map(|_| ())
        .map_err(|error| ElaborationError::from_unify_error(error, span.clone()).with_context(context).into())
}

fn constant_type(constant: &Constant) -> Type {
    match constant {
        Constant::Int(_) => Type::int(),
        Constant::Word(_) => Type::word(),
        Constant::Real(_) => Type::real(),
        Constant::Char(_) => Type::char(),
        Constant::String(_) => Type::string(),
    }
}

fn empty_span() -> Span {
    Span {
        start: (0, 0),
        end: (0, 0),
        source: String::new(),
    }
}

/// Non-expansive expressions may be generalized.
fn is_non_expansive(expression: &Expression, state: &State) -> bool {
    match expression {
        Expression::Constant(_) | Expression::Ident(_) | Expression::Lambda(_) => true,
        Expression::Record(Record { fields, .. }) => fields
            .iter()
            .all(|(_, field)| is_non_expansive(field, state)),
        Expression::Typed(Typed { expression, .. }) => is_non_expansive(expression, state),
        Expression::Application(Application {
            function, argument, ..
        }) => match function.as_ref() {
            Expression::Ident(ident) if ident.value != "ref" => {
                let is_constructor = state
                    .lookup_static_value(&ident.value, 0)
                    .map(|(_, status)| status.is_constructor())
                    .unwrap_or(false);
                is_constructor && is_non_expansive(argument, state)
            }
            _ => false,
        },
        _ => false,
    }
}

/// `val rec` right-hand sides must be `fn` expressions.
fn is_lambda(expression: &Expression) -> bool {
    match expression {
        Expression::Lambda(_) => true,
        Expression::Typed(Typed { expression, .. }) => is_lambda(expression),
        _ => false,
    }
}

impl Elaborator {
    pub fn new(warn_nonexhaustive: bool) -> Self {
        Self {
            warn_nonexhaustive,
            type_variables: HashMap::new(),
            rows: vec![],
        }
    }

    pub fn infer_expression(&mut self, expression: &Expression, state: &Rc<State>) -> Result<Type, Error> {
        match expression {
            Expression::Constant(literal) => Ok(constant_type(&literal.value)),
            Expression::Ident(ident) => {
                let Some((ty, _)) = state.lookup_static_value(&ident.value, 0) else {
                    return Err(
                        ElaborationError::unbound_identifier(&ident.value, ident.position.clone()).into(),
                    );
                };
                Ok(instantiate(&instantiate_scheme(&ty, state), state))
            }
            Expression::Record(Record { fields, position }) => {
                let mut types = indexmap::IndexMap::new();
                for (label, field) in fields {
                    if types.contains_key(label) {
                        return Err(ElaborationError::DuplicateLabel {
                            label: label.clone(),
                            span: position.clone(),
                        }
                        .into());
                    }
                    let ty = self.infer_expression(field, state)?;
                    types.insert(label.clone(), ty);
                }
                Ok(Type::record(types))
            }
            Expression::Application(Application {
                function,
                argument,
                position,
            }) => {
                let function_type = self.infer_expression(function, state)?;
                let argument_type = self.infer_expression(argument, state)?;
                let result = state.fresh_type_variable(false);
                unify(
                    &function_type,
                    &Type::function(argument_type, result.clone()),
                    state,
                    position,
                    "in function application",
                )?;
                Ok(instantiate(&result, state))
            }
            Expression::Typed(Typed {
                expression,
                ty,
                position,
            }) => {
                let inferred = self.infer_expression(expression, state)?;
                let annotated = self.elaborate_type(ty, state)?;
                unify(&annotated, &inferred, state, position, "in type annotation")?;
                Ok(instantiate(&annotated, state))
            }
            Expression::Handle(Handle {
                expression,
                handler,
                position,
            }) => {
                let protected = self.infer_expression(expression, state)?;
                let handler_type = self.infer_match(handler, state, false)?;
                unify(
                    &Type::function(Type::exn(), protected.clone()),
                    &handler_type,
                    state,
                    position,
                    "in exception handler",
                )?;
                Ok(instantiate(&protected, state))
            }
            Expression::Raise(Raise {
                expression,
                position,
            }) => {
                let raised = self.infer_expression(expression, state)?;
                unify(&Type::exn(), &raised, state, position, "in raise expression")?;
                Ok(state.fresh_type_variable(false))
            }
            Expression::Lambda(Lambda { body, .. }) => {
                let warn = self.warn_nonexhaustive;
                self.infer_match(body, state, warn)
            }
            Expression::Let(Let {
                declaration, body, ..
            }) => {
                let scope = self.elaborate_declaration(declaration, state)?;
                self.infer_expression(body, &scope)
            }
            Expression::While(While {
                condition,
                body,
                position,
            }) => {
                let condition_type = self.infer_expression(condition, state)?;
                unify(&Type::bool(), &condition_type, state, position, "in while condition")?;
                self.infer_expression(body, state)?;
                Ok(Type::unit())
            }
            Expression::Tuple(_)
            | Expression::List(_)
            | Expression::IfThenElse(_)
            | Expression::Case(_)
            | Expression::AndAlso(_)
            | Expression::OrElse(_)
            | Expression::Sequence(_)
            | Expression::Selector(_) => Err(Error::internal(
                "derived form reached elaboration without desugaring",
            )),
        }
    }

    /// Type of a match as a function from the matched value to the result.
    pub fn infer_match(&mut self, body: &Match, state: &Rc<State>, warn: bool) -> Result<Type, Error> {
        let parameter = state.fresh_type_variable(false);
        let result = state.fresh_type_variable(false);

        for clause in &body.clauses {
            let scope = state.child();
            let (pattern_type, bindings) = self.pattern_type(&clause.pattern, state)?;
            unify(
                &parameter,
                &pattern_type,
                state,
                clause.pattern.position(),
                "in match pattern",
            )?;
            for (name, ty) in bindings {
                scope.set_static_value(name, ty, IdentifierStatus::Variable);
            }
            let body_type = self.infer_expression(&clause.body, &scope)?;
            unify(&result, &body_type, state, clause.body.position(), "in match arm")?;
        }

        if warn {
            let patterns: Vec<&Pattern> = body.clauses.iter().map(|clause| &clause.pattern).collect();
            if !is_exhaustive(&patterns, state) {
                state.add_warning(Warning::new("match nonexhaustive", body.position.clone()));
            }
        }

        Ok(instantiate(&Type::function(parameter, result), state))
    }

    /// Type accepted by `pattern`, plus the variables it binds.
    pub fn pattern_type(&mut self, pattern: &Pattern, state: &Rc<State>) -> Result<(Type, Vec<(String, Type)>), Error> {
        let mut bindings = vec![];
        let ty = self.pattern_type_into(pattern, state, &mut bindings)?;
        Ok((ty, bindings))
    }

    fn bind_variable(&self, ident: &Ident, ty: Type, bindings: &mut Vec<(String, Type)>) -> Result<(), Error> {
        if bindings.iter().any(|(name, _)| *name == ident.value) {
            return Err(ElaborationError::duplicate_identifier(&ident.value, ident.position.clone()).into());
        }
        bindings.push((ident.value.clone(), ty));
        Ok(())
    }

    fn pattern_type_into(
        &mut self,
        pattern: &Pattern,
        state: &Rc<State>,
        bindings: &mut Vec<(String, Type)>,
    ) -> Result<Type, Error> {
        match pattern {
            Pattern::Wildcard(_) => Ok(state.fresh_type_variable(false)),
            Pattern::Constant(literal) => Ok(constant_type(&literal.value)),
            Pattern::Ident(ident) => match state.lookup_static_value(&ident.value, 0) {
                Some((ty, status)) if status.is_constructor() => {
                    let ty = instantiate(&instantiate_scheme(&ty, state), state);
                    if let Type::Function(..) = ty {
                        return Err(ElaborationError::ConstructorArity {
                            name: ident.value.clone(),
                            expects_argument: true,
                            span: ident.position.clone(),
                        }
                        .into());
                    }
                    Ok(ty)
                }
                _ => {
                    let ty = state.fresh_type_variable(false);
                    self.bind_variable(ident, ty.clone(), bindings)?;
                    Ok(ty)
                }
            },
            Pattern::Record(RecordPattern {
                fields,
                complete,
                position,
            }) => {
                let mut types = indexmap::IndexMap::new();
                for (label, field) in fields {
                    if types.contains_key(label) {
                        return Err(ElaborationError::DuplicateLabel {
                            label: label.clone(),
                            span: position.clone(),
                        }
                        .into());
                    }
                    let ty = self.pattern_type_into(field, state, bindings)?;
                    types.insert(label.clone(), ty);
                }
                if *complete {
                    return Ok(Type::record(types));
                }
                let row = state.fresh_type_variable(false);
                if let Type::Variable(name) = &row {
                    state.set_type_variable_constraint(name, Constraint::Row(types));
                    self.rows.push((name.clone(), position.clone()));
                }
                Ok(row)
            }
            Pattern::Constructed(ConstructedPattern {
                constructor,
                argument,
                position,
            }) => {
                let Some((ty, status)) = state.lookup_static_value(&constructor.value, 0) else {
                    return Err(ElaborationError::unbound_identifier(
                        &constructor.value,
                        constructor.position.clone(),
                    )
                    .into());
                };
                if !status.is_constructor() {
                    return Err(ElaborationError::NotAConstructor {
                        name: constructor.value.clone(),
                        span: constructor.position.clone(),
                    }
                    .into());
                }
                let Type::Function(parameter, result) = instantiate(&instantiate_scheme(&ty, state), state) else {
                    return Err(ElaborationError::ConstructorArity {
                        name: constructor.value.clone(),
                        expects_argument: false,
                        span: constructor.position.clone(),
                    }
                    .into());
                };
                let argument_type = self.pattern_type_into(argument, state, bindings)?;
                unify(&parameter, &argument_type, state, position, "in constructor pattern")?;
                Ok(instantiate(&result, state))
            }
            Pattern::Layered(LayeredPattern {
                name,
                annotation,
                pattern,
                position,
            }) => {
                let ty = self.pattern_type_into(pattern, state, bindings)?;
                if let Some(annotation) = annotation {
                    let annotated = self.elaborate_type(annotation, state)?;
                    unify(&annotated, &ty, state, position, "in layered pattern")?;
                }
                self.bind_variable(name, ty.clone(), bindings)?;
                Ok(ty)
            }
            Pattern::Typed(TypedPattern {
                pattern,
                ty,
                position,
            }) => {
                let inferred = self.pattern_type_into(pattern, state, bindings)?;
                let annotated = self.elaborate_type(ty, state)?;
                unify(&annotated, &inferred, state, position, "in pattern annotation")?;
                Ok(instantiate(&annotated, state))
            }
            Pattern::Tuple(TuplePattern { elements, .. }) => {
                let mut types = vec![];
                for element in elements {
                    types.push(self.pattern_type_into(element, state, bindings)?);
                }
                Ok(Type::tuple(types))
            }
            Pattern::List(ListPattern { elements, .. }) => {
                let element_type = state.fresh_type_variable(false);
                for element in elements {
                    let ty = self.pattern_type_into(element, state, bindings)?;
                    unify(&element_type, &ty, state, element.position(), "in list pattern")?;
                }
                Ok(Type::list(instantiate(&element_type, state)))
            }
        }
    }

    /// Translate a written type into a [`Type`], expanding aliases.
    pub fn elaborate_type(&mut self, ty: &TypeExpression, state: &State) -> Result<Type, Error> {
        match ty {
            TypeExpression::Variable(ident) => Ok(self
                .type_variables
                .entry(ident.value.clone())
                .or_insert_with(|| state.fresh_type_variable(is_equality_variable(&ident.value)))
                .clone()),
            TypeExpression::Record(RecordType { fields, position }) => {
                let mut types = indexmap::IndexMap::new();
                for (label, field) in fields {
                    if types.contains_key(label) {
                        return Err(ElaborationError::DuplicateLabel {
                            label: label.clone(),
                            span: position.clone(),
                        }
                        .into());
                    }
                    let field = self.elaborate_type(field, state)?;
                    types.insert(label.clone(), field);
                }
                Ok(Type::record(types))
            }
            TypeExpression::Tuple(TupleType { elements, .. }) => {
                let mut types = vec![];
                for element in elements {
                    types.push(self.elaborate_type(element, state)?);
                }
                Ok(Type::tuple(types))
            }
            TypeExpression::Function(FunctionType {
                parameter, result, ..
            }) => {
                let parameter = self.elaborate_type(parameter, state)?;
                let result = self.elaborate_type(result, state)?;
                Ok(Type::function(parameter, result))
            }
            TypeExpression::Constructed(ConstructedType {
                name,
                arguments,
                position,
            }) => {
                let Some(information) = state.lookup_static_type(&name.value, 0) else {
                    return Err(ElaborationError::unbound_type(&name.value, name.position.clone()).into());
                };
                if information.parameters.len() != arguments.len() {
                    return Err(ElaborationError::TypeArity {
                        name: name.value.clone(),
                        expected: information.parameters.len(),
                        found: arguments.len(),
                        span: position.clone(),
                    }
                    .into());
                }
                let mut types = vec![];
                for argument in arguments {
                    types.push(self.elaborate_type(argument, state)?);
                }
                Ok(information.apply(&types))
            }
        }
    }

    /// Elaborate `ty` with each of `parameters` standing for itself.
    fn elaborate_parameterized(
        &mut self,
        parameters: &[Ident],
        ty: &TypeExpression,
        state: &State,
    ) -> Result<Type, Error> {
        let saved = std::mem::take(&mut self.type_variables);
        for parameter in parameters {
            self.type_variables
                .insert(parameter.value.clone(), Type::variable(&parameter.value));
        }
        let result = self.elaborate_type(ty, state);
        self.type_variables = saved;
        result
    }

    /// Check a declaration against `state` and return the node holding its
    /// static bindings.
    pub fn elaborate_declaration(&mut self, declaration: &Declaration, state: &Rc<State>) -> Result<Rc<State>, Error> {
        match declaration {
            Declaration::Value(value) if value.recursive => self.elaborate_recursive(value, state),
            Declaration::Value(value) => self.elaborate_value(value, state),
            Declaration::Type(TypeDeclaration { bindings, .. }) => {
                let result = state.child();
                for binding in bindings {
                    let ty = self.elaborate_parameterized(&binding.parameters, &binding.ty, state)?;
                    let parameters: Vec<String> =
                        binding.parameters.iter().map(|parameter| parameter.value.clone()).collect();
                    let admits = admits_equality(
                        &parameters
                            .iter()
                            .fold(ty.clone(), |ty, parameter| ty.substitute(parameter, &Type::int())),
                        state,
                    );
                    result.set_static_type(
                        &binding.name.value,
                        TypeInformation {
                            ty,
                            parameters,
                            constructors: vec![],
                            admits_equality: admits,
                        },
                    );
                }
                Ok(result)
            }
            Declaration::Datatype(datatype) => self.elaborate_datatype(datatype, state),
            Declaration::DatatypeReplication(DatatypeReplication { name, original, .. }) => {
                let Some(information) = state.lookup_static_type(&original.value, 0) else {
                    return Err(ElaborationError::unbound_type(&original.value, original.position.clone()).into());
                };
                let result = state.child();
                for constructor in &information.constructors {
                    if let Some((ty, status)) = state.lookup_static_value(constructor, 0) {
                        result.set_static_value(constructor, ty, status);
                    }
                }
                result.set_static_type(&name.value, information);
                Ok(result)
            }
            Declaration::Exception(ExceptionDeclaration { bindings, .. }) => {
                let result = state.child();
                for binding in bindings {
                    match binding {
                        ExceptionBinding::New { name, argument } => {
                            check_rebind(name)?;
                            let ty = match argument {
                                Some(argument) => Type::function(self.elaborate_type(argument, state)?, Type::exn()),
                                None => Type::exn(),
                            };
                            result.set_static_value(&name.value, ty, IdentifierStatus::ExceptionConstructor);
                        }
                        ExceptionBinding::Alias { name, original } => {
                            check_rebind(name)?;
                            match state.lookup_static_value(&original.value, 0) {
                                Some((ty, IdentifierStatus::ExceptionConstructor)) => {
                                    result.set_static_value(&name.value, ty, IdentifierStatus::ExceptionConstructor)
                                }
                                Some(_) => {
                                    return Err(ElaborationError::NotAConstructor {
                                        name: original.value.clone(),
                                        span: original.position.clone(),
                                    }
                                    .into())
                                }
                                None => {
                                    return Err(ElaborationError::unbound_identifier(
                                        &original.value,
                                        original.position.clone(),
                                    )
                                    .into())
                                }
                            }
                        }
                    }
                }
                Ok(result)
            }
            Declaration::Local(LocalDeclaration {
                declaration, body, ..
            }) => {
                let inner = self.elaborate_declaration(declaration, state)?;
                let outer = self.elaborate_declaration(body, &inner)?;
                let result = state.child();
                result.install(outer.bindings_since(&inner)?);
                Ok(result)
            }
            Declaration::Sequential(SequentialDeclaration { declarations, .. }) => {
                let mut current = Rc::clone(state);
                for declaration in declarations {
                    current = self.elaborate_declaration(declaration, &current)?;
                }
                Ok(current)
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
                Ok(result)
            }
            Declaration::Nonfix(NonfixDeclaration { operators, .. }) => {
                let result = state.child();
                for operator in operators {
                    result.set_infix(&operator.value, InfixStatus::nonfix());
                }
                Ok(result)
            }
            Declaration::Empty => Ok(Rc::clone(state)),
            Declaration::Function(_) => Err(Error::internal(
                "fun declaration reached elaboration without desugaring",
            )),
        }
    }

    fn elaborate_value(&mut self, value: &ValueDeclaration, state: &Rc<State>) -> Result<Rc<State>, Error> {
        let mut inferred = vec![];
        let mut seen: Vec<String> = vec![];

        for binding in &value.bindings {
            let expression_type = self.infer_expression(&binding.expression, state)?;
            let (pattern_type, bindings) = self.pattern_type(&binding.pattern, state)?;
            unify(
                &pattern_type,
                &expression_type,
                state,
                binding.expression.position(),
                "in value binding",
            )?;

            if self.warn_nonexhaustive && is_refutable(&binding.pattern, state) {
                state.add_warning(Warning::new("binding not exhaustive", value.position.clone()));
            }

            for (name, _) in &bindings {
                if seen.contains(name) {
                    return Err(ElaborationError::duplicate_identifier(name, value.position.clone()).into());
                }
                seen.push(name.clone());
            }
            inferred.push((bindings, is_non_expansive(&binding.expression, state)));
        }

        let result = state.child();
        for (bindings, generalizable) in inferred {
            for (name, ty) in bindings {
                let ty = if generalizable {
                    self.generalize(&ty, state)
                } else {
                    instantiate(&ty, state)
                };
                log::trace!("val {} : {}", name, ty);
                result.set_static_value(name, ty, IdentifierStatus::Variable);
            }
        }
        Ok(result)
    }

    fn elaborate_recursive(&mut self, value: &ValueDeclaration, state: &Rc<State>) -> Result<Rc<State>, Error> {
        let scope = state.child();
        let mut assumed = vec![];

        for binding in &value.bindings {
            let Some(name) = binding.pattern.bound_name() else {
                return Err(ElaborationError::NonFunctionRecursion {
                    name: "_".to_string(),
                    span: binding.pattern.position().clone(),
                }
                .into());
            };
            check_rebind(name)?;
            if !is_lambda(&binding.expression) {
                return Err(ElaborationError::NonFunctionRecursion {
                    name: name.value.clone(),
                    span: binding.expression.position().clone(),
                }
                .into());
            }
            if assumed.iter().any(|(known, _)| *known == name.value) {
                return Err(ElaborationError::duplicate_identifier(&name.value, name.position.clone()).into());
            }
            let (ty, _) = self.pattern_type(&binding.pattern, state)?;
            scope.set_static_value(&name.value, ty.clone(), IdentifierStatus::Variable);
            assumed.push((name.value.clone(), ty));
        }

        for (binding, (_, assumed_type)) in value.bindings.iter().zip(&assumed) {
            let ty = self.infer_expression(&binding.expression, &scope)?;
            unify(
                assumed_type,
                &ty,
                state,
                binding.expression.position(),
                "in recursive binding",
            )?;
        }

        let result = state.child();
        for (name, ty) in assumed {
            let ty = self.generalize(&ty, state);
            log::trace!("val rec {} : {}", name, ty);
            result.set_static_value(name, ty, IdentifierStatus::Variable);
        }
        Ok(result)
    }

    fn elaborate_datatype(&mut self, datatype: &DatatypeDeclaration, state: &Rc<State>) -> Result<Rc<State>, Error> {
        let result = state.child();

        for binding in &datatype.bindings {
            let parameters: Vec<String> = binding.parameters.iter().map(|parameter| parameter.value.clone()).collect();
            result.set_static_type(
                &binding.name.value,
                TypeInformation {
                    ty: Type::named(
                        &binding.name.value,
                        parameters.iter().map(Type::variable).collect(),
                    ),
                    parameters,
                    constructors: binding
                        .constructors
                        .iter()
                        .map(|constructor| constructor.name.value.clone())
                        .collect(),
                    admits_equality: true,
                },
            );
        }

        let mut arguments: Vec<(String, Vec<String>, Vec<Type>)> = vec![];
        let mut seen: Vec<String> = vec![];
        for binding in &datatype.bindings {
            let parameters: Vec<String> = binding.parameters.iter().map(|parameter| parameter.value.clone()).collect();
            let ty = Type::named(
                &binding.name.value,
                parameters.iter().map(Type::variable).collect(),
            );
            let mut argument_types = vec![];
            for constructor in &binding.constructors {
                check_rebind(&constructor.name)?;
                if seen.contains(&constructor.name.value) {
                    return Err(ElaborationError::duplicate_identifier(
                        &constructor.name.value,
                        constructor.name.position.clone(),
                    )
                    .into());
                }
                seen.push(constructor.name.value.clone());

                let constructor_type = match &constructor.argument {
                    Some(argument) => {
                        let argument = self.elaborate_parameterized(&binding.parameters, argument, &result)?;
                        argument_types.push(argument.clone());
                        Type::function(argument, ty.clone())
                    }
                    None => ty.clone(),
                };
                let scheme = parameters
                    .iter()
                    .rev()
                    .fold(constructor_type, |body, parameter| Type::scheme(parameter, body));
                result.set_static_value(
                    &constructor.name.value,
                    scheme,
                    IdentifierStatus::ValueConstructor,
                );
            }
            arguments.push((binding.name.value.clone(), parameters, argument_types));
        }

        // a datatype loses equality once any argument of its constructors does
        loop {
            let mut changed = false;
            for (name, parameters, argument_types) in &arguments {
                let Some(mut information) = result.lookup_static_type(name, result.id()) else {
                    continue;
                };
                if !information.admits_equality {
                    continue;
                }
                let admits = argument_types.iter().all(|argument| {
                    let closed = parameters
                        .iter()
                        .fold(argument.clone(), |ty, parameter| ty.substitute(parameter, &Type::int()));
                    admits_equality(&closed, &result)
                });
                if !admits {
                    information.admits_equality = false;
                    result.set_static_type(name, information);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Ok(result)
    }

    /// Quantify the variables of `ty` that are free neither in `state` nor
    /// constrained.
    pub fn generalize(&self, ty: &Type, state: &State) -> Type {
        let ty = instantiate(ty, state);
        let environment = environment_variables(state);
        ty.free_variables()
            .into_iter()
            .rev()
            .filter(|variable| {
                !environment.contains(variable) && state.type_variable_constraint(variable).is_none()
            })
            .fold(ty, |body, variable| Type::scheme(variable, body))
    }

    /// Resolve what the declaration left open: default overloaded variables
    /// and reject unresolved flexible records.
    pub fn finish(&mut self, state: &State) -> Result<(), Error> {
        let mut unresolved = None;
        for (name, constraint) in state.constrained_type_variables() {
            state.take_type_variable_constraint(&name);
            match constraint {
                Constraint::Domain(domain) => {
                    let default = if domain.contains(&Type::int()) {
                        Type::int()
                    } else {
                        match domain.first() {
                            Some(first) => first.clone(),
                            None => continue,
                        }
                    };
                    log::trace!("default {} to {}", name, default);
                    state.bind_type_variable(&name, default);
                }
                Constraint::Row(fields) => {
                    if unresolved.is_none() {
                        let span = self
                            .rows
                            .iter()
                            .find(|(row, _)| instantiate(&Type::variable(row), state) == Type::variable(&name))
                            .map(|(_, span)| span.clone())
                            .unwrap_or_else(empty_span);
                        unresolved = Some(ElaborationError::UnresolvedRecord {
                            ty: Type::Record {
                                fields,
                                complete: false,
                            },
                            span,
                        });
                    }
                }
            }
        }
        self.rows.clear();
        self.type_variables.clear();
        match unresolved {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    /// Undo every type-variable binding and constraint recorded since
    /// `checkpoint`, so a failed declaration leaves the session as it found it.
    pub fn abandon(&mut self, state: &State, checkpoint: usize) {
        state.rollback_type_variables(checkpoint);
        self.rows.clear();
        self.type_variables.clear();
    }
}

fn check_rebind(name: &Ident) -> Result<(), Error> {
    if allows_rebind(&name.value) {
        return Ok(());
    }
    Err(ElaborationError::Rebind {
        name: name.value.clone(),
        span: name.position.clone(),
    }
    .into())
}

fn environment_variables(state: &State) -> Vec<String> {
    let mut variables = vec![];
    for node in state.ancestors() {
        for (_, ty, _) in node.local_static_values() {
            for variable in instantiate(&ty, state).free_variables() {
                if !variables.contains(&variable) {
                    variables.push(variable);
                }
            }
        }
    }
    variables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::builtins::initial_state;
    use crate::desugar::{desugar_declaration, desugar_expression};

    fn infer(expression: Expression) -> Result<Type, Error> {
        let state = initial_state();
        let mut elaborator = Elaborator::new(true);
        let ty = elaborator.infer_expression(&desugar_expression(expression), &state)?;
        elaborator.finish(&state)?;
        Ok(instantiate(&ty, &state).normalize())
    }

    fn elaborate(declaration: Declaration) -> Result<Rc<State>, Error> {
        let state = initial_state();
        let mut elaborator = Elaborator::new(true);
        let result = elaborator.elaborate_declaration(&desugar_declaration(declaration), &state)?;
        elaborator.finish(&result)?;
        Ok(result)
    }

    fn type_of(state: &State, name: &str) -> String {
        let (ty, _) = state.lookup_static_value(name, 0).unwrap();
        instantiate(&ty, state).normalize().to_string()
    }

    #[test]
    fn test_infer_constants() {
        assert_eq!(infer(int(1)).unwrap(), Type::int());
        assert_eq!(infer(string("a")).unwrap(), Type::string());
        assert_eq!(infer(real(1.5)).unwrap(), Type::real());
    }

    #[test]
    fn test_infer_identity_function() {
        let ty = infer(lambda(vec![(var("x"), ident("x"))])).unwrap();
        assert_eq!(ty.to_string(), "'a -> 'a");
    }

    #[test]
    fn test_overload_defaults_to_int() {
        let ty = infer(lambda(vec![(
            ptuple(vec![var("a"), var("b")]),
            infix("+", ident("a"), ident("b")),
        )]))
        .unwrap();
        assert_eq!(ty.to_string(), "int * int -> int");
    }

    #[test]
    fn test_overload_follows_argument() {
        let ty = infer(infix("*", real(1.0), real(2.0))).unwrap();
        assert_eq!(ty, Type::real());
    }

    #[test]
    fn test_overload_rejects_outside_domain() {
        let result = infer(infix("+", string("a"), string("b")));
        assert!(matches!(result, Err(Error::Elaboration(ElaborationError::Unification { .. }))));
    }

    #[test]
    fn test_application_mismatch_has_context() {
        let result = infer(apply(ident("not"), int(1)));
        match result {
            Err(Error::Elaboration(error)) => {
                assert!(error.to_string().contains("in function application"));
            }
            other => panic!("expected an elaboration error, got {:?}", other),
        }
    }

    #[test]
    fn test_unbound_identifier() {
        let result = infer(ident("nope"));
        assert!(matches!(
            result,
            Err(Error::Elaboration(ElaborationError::UnboundIdentifier { .. }))
        ));
    }

    #[test]
    fn test_equality_rejects_functions() {
        let identity = lambda(vec![(var("x"), ident("x"))]);
        let result = infer(infix("=", identity.clone(), identity));
        assert!(result.is_err());
    }

    #[test]
    fn test_equality_rejects_real() {
        assert!(infer(infix("=", real(1.0), real(1.0))).is_err());
        assert_eq!(infer(infix("=", int(1), int(1))).unwrap(), Type::bool());
    }

    #[test]
    fn test_let_polymorphism() {
        let body = tuple(vec![
            apply(ident("id"), int(1)),
            apply(ident("id"), string("a")),
        ]);
        let expression = let_in(val(var("id"), lambda(vec![(var("x"), ident("x"))])), body);
        assert_eq!(infer(expression).unwrap().to_string(), "int * string");
    }

    #[test]
    fn test_value_restriction_keeps_ref_monomorphic() {
        let state = elaborate(val(var("r"), apply(ident("ref"), ident("nil")))).unwrap();
        let (ty, _) = state.lookup_static_value("r", 0).unwrap();
        assert!(!matches!(ty, Type::Scheme { .. }));
    }

    #[test]
    fn test_fun_is_generalized() {
        let state = elaborate(fun("f", vec![(vec![var("x")], ident("x"))])).unwrap();
        assert_eq!(type_of(&state, "f"), "'a -> 'a");
    }

    #[test]
    fn test_recursive_function() {
        let declaration = fun(
            "length",
            vec![
                (vec![plist(vec![])], int(0)),
                (
                    vec![pcons(wildcard(), var("rest"))],
                    infix("+", int(1), apply(ident("length"), ident("rest"))),
                ),
            ],
        );
        let state = elaborate(declaration).unwrap();
        assert_eq!(type_of(&state, "length"), "'a list -> int");
    }

    #[test]
    fn test_val_rec_requires_fn() {
        let result = elaborate(val_rec(vec![("x", int(1))]));
        assert!(matches!(
            result,
            Err(Error::Elaboration(ElaborationError::NonFunctionRecursion { .. }))
        ));
    }

    #[test]
    fn test_reserved_identifiers_cannot_be_rebound() {
        let rebinds = [
            datatype(vec![], "t", vec![("true", None), ("false", None)]),
            datatype(vec![], "u", vec![("nil", None)]),
            exception("ref", None),
            exception_alias("::", "Match"),
            fun("true", vec![(vec![var("x")], ident("x"))]),
        ];
        for declaration in rebinds {
            assert!(matches!(
                elaborate(declaration),
                Err(Error::Elaboration(ElaborationError::Rebind { .. }))
            ));
        }
    }

    #[test]
    fn test_datatype_constructors() {
        let declaration = datatype(
            vec!["'a"],
            "option",
            vec![("NONE", None), ("SOME", Some(tyvar("'a")))],
        );
        let state = elaborate(declaration).unwrap();
        assert_eq!(type_of(&state, "SOME"), "'a -> 'a option");
        assert_eq!(
            state.lookup_static_value("NONE", 0).unwrap().1,
            IdentifierStatus::ValueConstructor
        );
    }

    #[test]
    fn test_datatype_equality_fixpoint() {
        let declaration = datatypes(vec![
            datatype_binding(vec![], "a", vec![("A", Some(tycon("b", vec![])))]),
            datatype_binding(vec![], "b", vec![("B", Some(tycon("real", vec![]))), ("C", None)]),
        ]);
        let state = elaborate(declaration).unwrap();
        assert!(!state.lookup_static_type("a", 0).unwrap().admits_equality);
        assert!(!state.lookup_static_type("b", 0).unwrap().admits_equality);
    }

    #[test]
    fn test_type_alias_expands() {
        let declaration = seq(vec![
            type_alias(vec!["'a"], "pair", tytuple(vec![tyvar("'a"), tyvar("'a")])),
            val(
                var("p"),
                typed(tuple(vec![int(1), int(2)]), tycon("pair", vec![tycon("int", vec![])])),
            ),
        ]);
        let state = elaborate(declaration).unwrap();
        assert_eq!(type_of(&state, "p"), "int * int");
    }

    #[test]
    fn test_type_arity_is_checked() {
        let result = elaborate(val(var("x"), typed(int(1), tycon("list", vec![]))));
        assert!(matches!(
            result,
            Err(Error::Elaboration(ElaborationError::TypeArity { .. }))
        ));
    }

    #[test]
    fn test_duplicate_pattern_variable() {
        let result = elaborate(val(ptuple(vec![var("x"), var("x")]), tuple(vec![int(1), int(2)])));
        assert!(matches!(
            result,
            Err(Error::Elaboration(ElaborationError::DuplicateIdentifier { .. }))
        ));
    }

    #[test]
    fn test_constructor_arity_in_pattern() {
        let result = infer(lambda(vec![(var("::"), int(1))]));
        assert!(matches!(
            result,
            Err(Error::Elaboration(ElaborationError::ConstructorArity { .. }))
        ));
    }

    #[test]
    fn test_not_a_constructor() {
        let result = infer(lambda(vec![(constructed("print", var("x")), int(1))]));
        assert!(matches!(
            result,
            Err(Error::Elaboration(ElaborationError::NotAConstructor { .. }))
        ));
    }

    #[test]
    fn test_selector_resolved_by_argument() {
        let expression = apply(
            selector("b"),
            record(vec![("a", int(1)), ("b", string("x"))]),
        );
        assert_eq!(infer(expression).unwrap(), Type::string());
    }

    #[test]
    fn test_unresolved_flexible_record() {
        let result = infer(selector("b"));
        assert!(matches!(
            result,
            Err(Error::Elaboration(ElaborationError::UnresolvedRecord { .. }))
        ));
    }

    #[test]
    fn test_occurs_check_is_an_error() {
        let expression = lambda(vec![(var("f"), apply(ident("f"), ident("f")))]);
        let result = infer(expression);
        assert!(matches!(
            result,
            Err(Error::Elaboration(ElaborationError::Unification {
                error: crate::types::UnifyError::OccursCheck { .. },
                ..
            }))
        ));
    }

    #[test]
    fn test_nonexhaustive_match_warns() {
        let state = initial_state();
        let mut elaborator = Elaborator::new(true);
        let expression = desugar_expression(case(int(2), vec![(pint(1), ident("true"))]));
        elaborator.infer_expression(&expression, &state).unwrap();
        assert_eq!(state.warning_count(), 1);
    }

    #[test]
    fn test_handler_does_not_warn() {
        let state = initial_state();
        let mut elaborator = Elaborator::new(true);
        let expression = handle(int(1), vec![(var("Div"), int(0))]);
        elaborator.infer_expression(&expression, &state).unwrap();
        assert_eq!(state.warning_count(), 0);
    }

    #[test]
    fn test_local_hides_helpers() {
        let declaration = local(
            val(var("hidden"), int(1)),
            val(var("shown"), ident("hidden")),
        );
        let state = elaborate(declaration).unwrap();
        assert!(state.lookup_static_value("shown", 0).is_some());
        assert!(state.lookup_static_value("hidden", 0).is_none());
    }

    #[test]
    fn test_exception_declaration() {
        let state = elaborate(exception("Fail", Some(tycon("string", vec![])))).unwrap();
        let (ty, status) = state.lookup_static_value("Fail", 0).unwrap();
        assert_eq!(ty.to_string(), "string -> exn");
        assert_eq!(status, IdentifierStatus::ExceptionConstructor);
    }

    #[test]
    fn test_raise_requires_exn() {
        assert!(infer(raise(int(1))).is_err());
        assert!(infer(raise(ident("Div"))).is_ok());
    }
}
