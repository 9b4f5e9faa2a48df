use lachs::Span;

use super::expression::Ident;

/// Type annotation as written in source.
#[derive(Debug, Clone)]
pub enum TypeExpression {
    Variable(Ident),
    Record(RecordType),
    Tuple(TupleType),
    Function(FunctionType),
    Constructed(ConstructedType),
}

#[derive(Debug, Clone)]
pub struct RecordType {
    pub fields: Vec<(String, TypeExpression)>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct TupleType {
    pub elements: Vec<TypeExpression>,
    pub position: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionType {
    pub parameter: Box<TypeExpression>,
    pub result: Box<TypeExpression>,
    pub position: Span,
}

/// `(t1, ..., tn) name`
#[derive(Debug, Clone)]
pub struct ConstructedType {
    pub name: Ident,
    pub arguments: Vec<TypeExpression>,
    pub position: Span,
}

impl TypeExpression {
    pub fn position(&self) -> &Span {
        match self {
            TypeExpression::Variable(Ident { position, .. })
            | TypeExpression::Record(RecordType { position, .. })
            | TypeExpression::Tuple(TupleType { position, .. })
            | TypeExpression::Function(FunctionType { position, .. })
            | TypeExpression::Constructed(ConstructedType { position, .. }) => position,
        }
    }
}
