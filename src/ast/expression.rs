use std::rc::Rc;

use lachs::Span;

use super::declaration::Declaration;
use super::pattern::Pattern;
use super::type_expression::TypeExpression;

#[derive(Debug, Clone)]
pub enum Expression {
    Constant(Literal),
    Ident(Ident),
    Record(Record),
    Application(Application),
    Typed(Typed),
    Handle(Handle),
    Raise(Raise),
    Lambda(Lambda),
    Let(Let),
    While(While),

    // derived forms, lowered by `desugar`
    Tuple(Tuple),
    List(List),
    IfThenElse(IfThenElse),
    Case(Case),
    AndAlso(Binary),
    OrElse(Binary),
    Sequence(Sequence),
    Selector(Selector),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Word(i64),
    Real(f64),
    Char(char),
    String(String),
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub value: Constant,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub value: String,
    pub position: Span,
}

/// `{label = expression, ...}`, evaluated left to right.
#[derive(Debug, Clone)]
pub struct Record {
    pub fields: Vec<(String, Expression)>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct Application {
    pub function: Box<Expression>,
    pub argument: Box<Expression>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct Typed {
    pub expression: Box<Expression>,
    pub ty: TypeExpression,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct Handle {
    pub expression: Box<Expression>,
    pub handler: Match,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct Raise {
    pub expression: Box<Expression>,
    pub position: Span,
}

/// `fn match`. Clauses are shared with every closure created from it.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub body: Rc<Match>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct Let {
    pub declaration: Box<Declaration>,
    pub body: Box<Expression>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct While {
    pub condition: Box<Expression>,
    pub body: Box<Expression>,
    pub position: Span,
}

/// `pattern => expression | ...`
#[derive(Debug, Clone)]
pub struct Match {
    pub clauses: Vec<Clause>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct Clause {
    pub pattern: Pattern,
    pub body: Expression,
}

#[derive(Debug, Clone)]
pub struct Tuple {
    pub elements: Vec<Expression>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct List {
    pub elements: Vec<Expression>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct IfThenElse {
    pub condition: Box<Expression>,
    pub then_branch: Box<Expression>,
    pub else_branch: Box<Expression>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub scrutinee: Box<Expression>,
    pub arms: Match,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct Binary {
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub position: Span,
}

/// `(e1; e2; ...; en)`
#[derive(Debug, Clone)]
pub struct Sequence {
    pub expressions: Vec<Expression>,
    pub position: Span,
}

/// `#label`
#[derive(Debug, Clone)]
pub struct Selector {
    pub label: String,
    pub position: Span,
}

impl Expression {
    pub fn position(&self) -> &Span {
        match self {
            Expression::Constant(Literal { position, .. })
            | Expression::Ident(Ident { position, .. })
            | Expression::Record(Record { position, .. })
            | Expression::Application(Application { position, .. })
            | Expression::Typed(Typed { position, .. })
            | Expression::Handle(Handle { position, .. })
            | Expression::Raise(Raise { position, .. })
            | Expression::Lambda(Lambda { position, .. })
            | Expression::Let(Let { position, .. })
            | Expression::While(While { position, .. })
            | Expression::Tuple(Tuple { position, .. })
            | Expression::List(List { position, .. })
            | Expression::IfThenElse(IfThenElse { position, .. })
            | Expression::Case(Case { position, .. })
            | Expression::AndAlso(Binary { position, .. })
            | Expression::OrElse(Binary { position, .. })
            | Expression::Sequence(Sequence { position, .. })
            | Expression::Selector(Selector { position, .. }) => position,
        }
    }
}
