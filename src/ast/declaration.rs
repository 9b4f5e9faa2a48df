use lachs::Span;

use super::expression::{Expression, Ident};
use super::pattern::Pattern;
use super::type_expression::TypeExpression;

#[derive(Debug, Clone)]
pub enum Declaration {
    Value(ValueDeclaration),
    /// Clausal `fun`, lowered to `val rec` by `desugar`.
    Function(FunctionDeclaration),
    Type(TypeDeclaration),
    Datatype(DatatypeDeclaration),
    DatatypeReplication(DatatypeReplication),
    Exception(ExceptionDeclaration),
    Local(LocalDeclaration),
    Sequential(SequentialDeclaration),
    Infix(InfixDeclaration),
    Nonfix(NonfixDeclaration),
    Empty,
}

/// `val [rec] pat = exp and ...`
#[derive(Debug, Clone)]
pub struct ValueDeclaration {
    pub recursive: bool,
    pub bindings: Vec<ValueBinding>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct ValueBinding {
    pub pattern: Pattern,
    pub expression: Expression,
}

/// `fun f p11 ... p1n = e1 | ... and g ...`
#[derive(Debug, Clone)]
pub struct FunctionDeclaration {
    pub bindings: Vec<FunctionBinding>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionBinding {
    pub name: Ident,
    pub clauses: Vec<FunctionClause>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionClause {
    pub parameters: Vec<Pattern>,
    pub result_type: Option<TypeExpression>,
    pub body: Expression,
}

/// `type ('a, ...) name = ty and ...`
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub bindings: Vec<TypeBinding>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct TypeBinding {
    pub parameters: Vec<Ident>,
    pub name: Ident,
    pub ty: TypeExpression,
}

/// `datatype ('a, ...) name = C1 of ty | C2 and ...`
#[derive(Debug, Clone)]
pub struct DatatypeDeclaration {
    pub bindings: Vec<DatatypeBinding>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct DatatypeBinding {
    pub parameters: Vec<Ident>,
    pub name: Ident,
    pub constructors: Vec<ConstructorBinding>,
}

#[derive(Debug, Clone)]
pub struct ConstructorBinding {
    pub name: Ident,
    pub argument: Option<TypeExpression>,
}

/// `datatype name = datatype original`
#[derive(Debug, Clone)]
pub struct DatatypeReplication {
    pub name: Ident,
    pub original: Ident,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct ExceptionDeclaration {
    pub bindings: Vec<ExceptionBinding>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub enum ExceptionBinding {
    /// `exception E [of ty]`
    New {
        name: Ident,
        argument: Option<TypeExpression>,
    },
    /// `exception E = F`
    Alias { name: Ident, original: Ident },
}

/// `local declaration in body end`
#[derive(Debug, Clone)]
pub struct LocalDeclaration {
    pub declaration: Box<Declaration>,
    pub body: Box<Declaration>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct SequentialDeclaration {
    pub declarations: Vec<Declaration>,
    pub position: Span,
}

/// `infix[r] precedence op ...`
#[derive(Debug, Clone)]
pub struct InfixDeclaration {
    pub operators: Vec<Ident>,
    pub precedence: u8,
    pub right_associative: bool,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct NonfixDeclaration {
    pub operators: Vec<Ident>,
    pub position: Span,
}
