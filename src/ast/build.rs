//! Constructors for AST nodes with a synthetic span.
//!
//! Used by the demo binary and by tests to assemble programs without going
//! through a parser.

use std::rc::Rc;

use lachs::Span;

use super::declaration::*;
use super::expression::*;
use super::pattern::*;
use super::type_expression::*;

pub fn span() -> Span {
    Span {
        start: (0, 0),
        end: (0, 0),
        source: String::new(),
    }
}

pub fn name(value: &str) -> Ident {
    Ident {
        value: value.to_string(),
        position: span(),
    }
}

fn constant(value: Constant) -> Expression {
    Expression::Constant(Literal {
        value,
        position: span(),
    })
}

pub fn int(value: i64) -> Expression {
    constant(Constant::Int(value))
}

pub fn word(value: i64) -> Expression {
    constant(Constant::Word(value))
}

pub fn real(value: f64) -> Expression {
    constant(Constant::Real(value))
}

pub fn char(value: char) -> Expression {
    constant(Constant::Char(value))
}

pub fn string(value: &str) -> Expression {
    constant(Constant::String(value.to_string()))
}

pub fn ident(value: &str) -> Expression {
    Expression::Ident(name(value))
}

pub fn apply(function: Expression, argument: Expression) -> Expression {
    Expression::Application(Application {
        function: Box::new(function),
        argument: Box::new(argument),
        position: span(),
    })
}

/// `left op right`, i.e. `op (left, right)`.
pub fn infix(op: &str, left: Expression, right: Expression) -> Expression {
    apply(ident(op), tuple(vec![left, right]))
}

pub fn tuple(elements: Vec<Expression>) -> Expression {
    Expression::Tuple(Tuple {
        elements,
        position: span(),
    })
}

pub fn unit() -> Expression {
    tuple(vec![])
}

pub fn list(elements: Vec<Expression>) -> Expression {
    Expression::List(List {
        elements,
        position: span(),
    })
}

pub fn record(fields: Vec<(&str, Expression)>) -> Expression {
    Expression::Record(Record {
        fields: fields
            .into_iter()
            .map(|(label, expression)| (label.to_string(), expression))
            .collect(),
        position: span(),
    })
}

pub fn clauses(arms: Vec<(Pattern, Expression)>) -> Match {
    Match {
        clauses: arms
            .into_iter()
            .map(|(pattern, body)| Clause { pattern, body })
            .collect(),
        position: span(),
    }
}

pub fn lambda(arms: Vec<(Pattern, Expression)>) -> Expression {
    Expression::Lambda(Lambda {
        body: Rc::new(clauses(arms)),
        position: span(),
    })
}

pub fn case(scrutinee: Expression, arms: Vec<(Pattern, Expression)>) -> Expression {
    Expression::Case(Case {
        scrutinee: Box::new(scrutinee),
        arms: clauses(arms),
        position: span(),
    })
}

pub fn if_then_else(condition: Expression, then_branch: Expression, else_branch: Expression) -> Expression {
    Expression::IfThenElse(IfThenElse {
        condition: Box::new(condition),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
        position: span(),
    })
}

fn binary(left: Expression, right: Expression) -> Binary {
    Binary {
        left: Box::new(left),
        right: Box::new(right),
        position: span(),
    }
}

pub fn and_also(left: Expression, right: Expression) -> Expression {
    Expression::AndAlso(binary(left, right))
}

pub fn or_else(left: Expression, right: Expression) -> Expression {
    Expression::OrElse(binary(left, right))
}

pub fn sequence(expressions: Vec<Expression>) -> Expression {
    Expression::Sequence(Sequence {
        expressions,
        position: span(),
    })
}

pub fn while_do(condition: Expression, body: Expression) -> Expression {
    Expression::While(While {
        condition: Box::new(condition),
        body: Box::new(body),
        position: span(),
    })
}

pub fn selector(label: &str) -> Expression {
    Expression::Selector(Selector {
        label: label.to_string(),
        position: span(),
    })
}

pub fn raise(expression: Expression) -> Expression {
    Expression::Raise(Raise {
        expression: Box::new(expression),
        position: span(),
    })
}

pub fn handle(expression: Expression, arms: Vec<(Pattern, Expression)>) -> Expression {
    Expression::Handle(Handle {
        expression: Box::new(expression),
        handler: clauses(arms),
        position: span(),
    })
}

pub fn let_in(declaration: Declaration, body: Expression) -> Expression {
    Expression::Let(Let {
        declaration: Box::new(declaration),
        body: Box::new(body),
        position: span(),
    })
}

pub fn typed(expression: Expression, ty: TypeExpression) -> Expression {
    Expression::Typed(Typed {
        expression: Box::new(expression),
        ty,
        position: span(),
    })
}

// patterns

pub fn wildcard() -> Pattern {
    Pattern::Wildcard(Wildcard { position: span() })
}

pub fn var(value: &str) -> Pattern {
    Pattern::Ident(name(value))
}

fn constant_pattern(value: Constant) -> Pattern {
    Pattern::Constant(Literal {
        value,
        position: span(),
    })
}

pub fn pint(value: i64) -> Pattern {
    constant_pattern(Constant::Int(value))
}

pub fn pstring(value: &str) -> Pattern {
    constant_pattern(Constant::String(value.to_string()))
}

pub fn pchar(value: char) -> Pattern {
    constant_pattern(Constant::Char(value))
}

pub fn constructed(constructor: &str, argument: Pattern) -> Pattern {
    Pattern::Constructed(ConstructedPattern {
        constructor: name(constructor),
        argument: Box::new(argument),
        position: span(),
    })
}

pub fn ptuple(elements: Vec<Pattern>) -> Pattern {
    Pattern::Tuple(TuplePattern {
        elements,
        position: span(),
    })
}

pub fn plist(elements: Vec<Pattern>) -> Pattern {
    Pattern::List(ListPattern {
        elements,
        position: span(),
    })
}

/// `head :: tail`
pub fn pcons(head: Pattern, tail: Pattern) -> Pattern {
    constructed("::", ptuple(vec![head, tail]))
}

pub fn precord(fields: Vec<(&str, Pattern)>, complete: bool) -> Pattern {
    Pattern::Record(RecordPattern {
        fields: fields
            .into_iter()
            .map(|(label, pattern)| (label.to_string(), pattern))
            .collect(),
        complete,
        position: span(),
    })
}

pub fn layered(variable: &str, pattern: Pattern) -> Pattern {
    Pattern::Layered(LayeredPattern {
        name: name(variable),
        annotation: None,
        pattern: Box::new(pattern),
        position: span(),
    })
}

pub fn ptyped(pattern: Pattern, ty: TypeExpression) -> Pattern {
    Pattern::Typed(TypedPattern {
        pattern: Box::new(pattern),
        ty,
        position: span(),
    })
}

// types

pub fn tyvar(value: &str) -> TypeExpression {
    TypeExpression::Variable(name(value))
}

pub fn tycon(type_name: &str, arguments: Vec<TypeExpression>) -> TypeExpression {
    TypeExpression::Constructed(ConstructedType {
        name: name(type_name),
        arguments,
        position: span(),
    })
}

pub fn tyfun(parameter: TypeExpression, result: TypeExpression) -> TypeExpression {
    TypeExpression::Function(FunctionType {
        parameter: Box::new(parameter),
        result: Box::new(result),
        position: span(),
    })
}

pub fn tytuple(elements: Vec<TypeExpression>) -> TypeExpression {
    TypeExpression::Tuple(TupleType {
        elements,
        position: span(),
    })
}

pub fn tyrecord(fields: Vec<(&str, TypeExpression)>) -> TypeExpression {
    TypeExpression::Record(RecordType {
        fields: fields
            .into_iter()
            .map(|(label, ty)| (label.to_string(), ty))
            .collect(),
        position: span(),
    })
}

// declarations

pub fn val(pattern: Pattern, expression: Expression) -> Declaration {
    Declaration::Value(ValueDeclaration {
        recursive: false,
        bindings: vec![ValueBinding {
            pattern,
            expression,
        }],
        position: span(),
    })
}

/// `val it = expression`
pub fn it(expression: Expression) -> Declaration {
    val(var("it"), expression)
}

pub fn val_rec(bindings: Vec<(&str, Expression)>) -> Declaration {
    Declaration::Value(ValueDeclaration {
        recursive: true,
        bindings: bindings
            .into_iter()
            .map(|(variable, expression)| ValueBinding {
                pattern: var(variable),
                expression,
            })
            .collect(),
        position: span(),
    })
}

pub fn fun_binding(function: &str, clauses: Vec<(Vec<Pattern>, Expression)>) -> FunctionBinding {
    FunctionBinding {
        name: name(function),
        clauses: clauses
            .into_iter()
            .map(|(parameters, body)| FunctionClause {
                parameters,
                result_type: None,
                body,
            })
            .collect(),
        position: span(),
    }
}

pub fn fun(function: &str, clauses: Vec<(Vec<Pattern>, Expression)>) -> Declaration {
    funs(vec![fun_binding(function, clauses)])
}

/// `fun ... and ...`
pub fn funs(bindings: Vec<FunctionBinding>) -> Declaration {
    Declaration::Function(FunctionDeclaration {
        bindings,
        position: span(),
    })
}

pub fn type_alias(parameters: Vec<&str>, type_name: &str, ty: TypeExpression) -> Declaration {
    Declaration::Type(TypeDeclaration {
        bindings: vec![TypeBinding {
            parameters: parameters.into_iter().map(name).collect(),
            name: name(type_name),
            ty,
        }],
        position: span(),
    })
}

pub fn datatype_binding(
    parameters: Vec<&str>,
    type_name: &str,
    constructors: Vec<(&str, Option<TypeExpression>)>,
) -> DatatypeBinding {
    DatatypeBinding {
        parameters: parameters.into_iter().map(name).collect(),
        name: name(type_name),
        constructors: constructors
            .into_iter()
            .map(|(constructor, argument)| ConstructorBinding {
                name: name(constructor),
                argument,
            })
            .collect(),
    }
}

pub fn datatype(
    parameters: Vec<&str>,
    type_name: &str,
    constructors: Vec<(&str, Option<TypeExpression>)>,
) -> Declaration {
    datatypes(vec![datatype_binding(parameters, type_name, constructors)])
}

/// `datatype ... and ...`
pub fn datatypes(bindings: Vec<DatatypeBinding>) -> Declaration {
    Declaration::Datatype(DatatypeDeclaration {
        bindings,
        position: span(),
    })
}

pub fn datatype_replication(type_name: &str, original: &str) -> Declaration {
    Declaration::DatatypeReplication(DatatypeReplication {
        name: name(type_name),
        original: name(original),
        position: span(),
    })
}

pub fn exception(exception_name: &str, argument: Option<TypeExpression>) -> Declaration {
    Declaration::Exception(ExceptionDeclaration {
        bindings: vec![ExceptionBinding::New {
            name: name(exception_name),
            argument,
        }],
        position: span(),
    })
}

pub fn exception_alias(exception_name: &str, original: &str) -> Declaration {
    Declaration::Exception(ExceptionDeclaration {
        bindings: vec![ExceptionBinding::Alias {
            name: name(exception_name),
            original: name(original),
        }],
        position: span(),
    })
}

pub fn local(declaration: Declaration, body: Declaration) -> Declaration {
    Declaration::Local(LocalDeclaration {
        declaration: Box::new(declaration),
        body: Box::new(body),
        position: span(),
    })
}

pub fn seq(declarations: Vec<Declaration>) -> Declaration {
    Declaration::Sequential(SequentialDeclaration {
        declarations,
        position: span(),
    })
}

pub fn infix_declaration(precedence: u8, right_associative: bool, operators: Vec<&str>) -> Declaration {
    Declaration::Infix(InfixDeclaration {
        operators: operators.into_iter().map(name).collect(),
        precedence,
        right_associative,
        position: span(),
    })
}

pub fn nonfix(operators: Vec<&str>) -> Declaration {
    Declaration::Nonfix(NonfixDeclaration {
        operators: operators.into_iter().map(name).collect(),
        position: span(),
    })
}
