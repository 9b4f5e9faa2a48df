use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

/// Static type of an expression, pattern or binding.
///
/// Tuples are records whose labels are `"1"` through `"n"`, and `unit` is the
/// empty record. Primitive types and datatypes are both `Named`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Variable(String),
    Record {
        fields: IndexMap<String, Type>,
        complete: bool,
    },
    Function(Box<Type>, Box<Type>),
    Named {
        name: String,
        args: Vec<Type>,
    },
    /// Universally quantified over `bound`. A non-empty `domain` restricts
    /// the instances of `bound` to the listed types.
    Scheme {
        bound: String,
        body: Box<Type>,
        domain: Vec<Type>,
    },
    Any,
}

/// Type variables whose second character is a quote (`''a`) only range over
/// types that admit equality.
pub fn is_equality_variable(name: &str) -> bool {
    name.chars().nth(1) == Some('\'')
}

impl Type {
    pub fn variable(name: impl ToString) -> Self {
        Type::Variable(name.to_string())
    }

    pub fn named(name: impl ToString, args: Vec<Type>) -> Self {
        Type::Named {
            name: name.to_string(),
            args,
        }
    }

    pub fn function(param: Type, result: Type) -> Self {
        Type::Function(Box::new(param), Box::new(result))
    }

    pub fn scheme(bound: impl ToString, body: Type) -> Self {
        Type::Scheme {
            bound: bound.to_string(),
            body: Box::new(body),
            domain: vec![],
        }
    }

    pub fn overloaded(bound: impl ToString, body: Type, domain: Vec<Type>) -> Self {
        Type::Scheme {
            bound: bound.to_string(),
            body: Box::new(body),
            domain,
        }
    }

    pub fn record(fields: IndexMap<String, Type>) -> Self {
        Type::Record {
            fields,
            complete: true,
        }
    }

    pub fn tuple(elements: Vec<Type>) -> Self {
        Type::record(
            elements
                .into_iter()
                .enumerate()
                .map(|(index, ty)| ((index + 1).to_string(), ty))
                .collect(),
        )
    }

    pub fn unit() -> Self {
        Type::tuple(vec![])
    }

    pub fn int() -> Self {
        Type::named("int", vec![])
    }

    pub fn word() -> Self {
        Type::named("word", vec![])
    }

    pub fn real() -> Self {
        Type::named("real", vec![])
    }

    pub fn char() -> Self {
        Type::named("char", vec![])
    }

    pub fn string() -> Self {
        Type::named("string", vec![])
    }

    pub fn bool() -> Self {
        Type::named("bool", vec![])
    }

    pub fn exn() -> Self {
        Type::named("exn", vec![])
    }

    pub fn list(element: Type) -> Self {
        Type::named("list", vec![element])
    }

    pub fn reference(element: Type) -> Self {
        Type::named("ref", vec![element])
    }

    pub fn array(element: Type) -> Self {
        Type::named("array", vec![element])
    }

    pub fn vector(element: Type) -> Self {
        Type::named("vector", vec![element])
    }

    /// Element types if this is a complete record labelled `"1".."n"`.
    pub fn tuple_elements(&self) -> Option<Vec<&Type>> {
        let Type::Record {
            fields,
            complete: true,
        } = self
        else {
            return None;
        };
        let is_tuple = fields
            .keys()
            .enumerate()
            .all(|(index, label)| *label == (index + 1).to_string());
        if is_tuple {
            Some(fields.values().collect())
        } else {
            None
        }
    }

    /// Free type variables in order of first appearance.
    pub fn free_variables(&self) -> Vec<String> {
        let mut found = vec![];
        self.collect_free_variables(&mut vec![], &mut found);
        found
    }

    fn collect_free_variables(&self, bound: &mut Vec<String>, found: &mut Vec<String>) {
        match self {
            Type::Variable(name) => {
                if !bound.contains(name) && !found.contains(name) {
                    found.push(name.clone());
                }
            }
            Type::Record { fields, .. } => fields
                .values()
                .for_each(|field| field.collect_free_variables(bound, found)),
            Type::Function(param, result) => {
                param.collect_free_variables(bound, found);
                result.collect_free_variables(bound, found);
            }
            Type::Named { args, .. } => args
                .iter()
                .for_each(|arg| arg.collect_free_variables(bound, found)),
            Type::Scheme {
                bound: variable,
                body,
                ..
            } => {
                bound.push(variable.clone());
                body.collect_free_variables(bound, found);
                bound.pop();
            }
            Type::Any => {}
        }
    }

    /// Replace free occurrences of the variable `name` by `replacement`.
    pub fn substitute(&self, name: &str, replacement: &Type) -> Type {
        match self {
            Type::Variable(variable) if variable == name => replacement.clone(),
            Type::Variable(_) | Type::Any => self.clone(),
            Type::Record { fields, complete } => Type::Record {
                fields: fields
                    .iter()
                    .map(|(label, field)| (label.clone(), field.substitute(name, replacement)))
                    .collect(),
                complete: *complete,
            },
            Type::Function(param, result) => Type::function(
                param.substitute(name, replacement),
                result.substitute(name, replacement),
            ),
            Type::Named { name: type_name, args } => Type::named(
                type_name,
                args.iter()
                    .map(|arg| arg.substitute(name, replacement))
                    .collect(),
            ),
            Type::Scheme { bound, .. } if bound == name => self.clone(),
            Type::Scheme {
                bound,
                body,
                domain,
            } => Type::Scheme {
                bound: bound.clone(),
                body: Box::new(body.substitute(name, replacement)),
                domain: domain.clone(),
            },
        }
    }

    /// Strip quantifiers, leaving their variables free.
    pub fn body(&self) -> &Type {
        match self {
            Type::Scheme { body, .. } => body.body(),
            other => other,
        }
    }

    /// Rename every type variable to `'a`, `'b`, ... (`''a` for equality
    /// variables) in order of first appearance.
    pub fn normalize(&self) -> Type {
        let mut renaming = HashMap::new();
        self.rename(&mut renaming)
    }

    fn rename(&self, renaming: &mut HashMap<String, String>) -> Type {
        match self {
            Type::Variable(name) => {
                let next = renaming.len();
                let renamed = renaming.entry(name.clone()).or_insert_with(|| {
                    let prefix = if is_equality_variable(name) { "''" } else { "'" };
                    format!("{}{}", prefix, variable_letters(next))
                });
                Type::Variable(renamed.clone())
            }
            Type::Record { fields, complete } => Type::Record {
                fields: fields
                    .iter()
                    .map(|(label, field)| (label.clone(), field.rename(renaming)))
                    .collect(),
                complete: *complete,
            },
            Type::Function(param, result) => {
                let param = param.rename(renaming);
                Type::function(param, result.rename(renaming))
            }
            Type::Named { name, args } => {
                Type::named(name, args.iter().map(|arg| arg.rename(renaming)).collect())
            }
            Type::Scheme { body, .. } => body.rename(renaming),
            Type::Any => Type::Any,
        }
    }

    fn fmt_with_precedence(&self, f: &mut fmt::Formatter, precedence: u8) -> fmt::Result {
        match self {
            Type::Variable(name) => write!(f, "{}", name),
            Type::Any => write!(f, "_"),
            Type::Scheme { body, .. } => body.fmt_with_precedence(f, precedence),
            Type::Function(param, result) => {
                if precedence > 0 {
                    write!(f, "(")?;
                }
                param.fmt_with_precedence(f, 1)?;
                write!(f, " -> ")?;
                result.fmt_with_precedence(f, 0)?;
                if precedence > 0 {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Type::Named { name, args } => match args.as_slice() {
                [] => write!(f, "{}", name),
                [arg] => {
                    arg.fmt_with_precedence(f, 3)?;
                    write!(f, " {}", name)
                }
                args => {
                    write!(f, "(")?;
                    for (index, arg) in args.iter().enumerate() {
                        if index > 0 {
                            write!(f, ", ")?;
                        }
                        arg.fmt_with_precedence(f, 0)?;
                    }
                    write!(f, ") {}", name)
                }
            },
            Type::Record { fields, complete } => {
                if let Some(elements) = self.tuple_elements() {
                    if elements.is_empty() {
                        return write!(f, "unit");
                    }
                    if elements.len() > 1 {
                        if precedence > 1 {
                            write!(f, "(")?;
                        }
                        for (index, element) in elements.iter().enumerate() {
                            if index > 0 {
                                write!(f, " * ")?;
                            }
                            element.fmt_with_precedence(f, 2)?;
                        }
                        if precedence > 1 {
                            write!(f, ")")?;
                        }
                        return Ok(());
                    }
                }
                write!(f, "{{")?;
                for (index, (label, field)) in fields.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", label)?;
                    field.fmt_with_precedence(f, 0)?;
                }
                if !complete {
                    if !fields.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "...")?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn variable_letters(mut index: usize) -> String {
    let mut letters = String::new();
    loop {
        letters.insert(0, (b'a' + (index % 26) as u8) as char);
        if index < 26 {
            return letters;
        }
        index = index / 26 - 1;
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_with_precedence(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_primitive_and_function() {
        let ty = Type::function(Type::int(), Type::bool());
        assert_eq!(ty.to_string(), "int -> bool");
    }

    #[test]
    fn test_display_nested_function_parenthesized() {
        let ty = Type::function(Type::function(Type::int(), Type::int()), Type::int());
        assert_eq!(ty.to_string(), "(int -> int) -> int");
    }

    #[test]
    fn test_display_tuple_and_unit() {
        let ty = Type::function(Type::tuple(vec![Type::int(), Type::string()]), Type::unit());
        assert_eq!(ty.to_string(), "int * string -> unit");
    }

    #[test]
    fn test_display_type_application() {
        let ty = Type::list(Type::list(Type::variable("'a")));
        assert_eq!(ty.to_string(), "'a list list");
        let pair = Type::list(Type::tuple(vec![Type::int(), Type::int()]));
        assert_eq!(pair.to_string(), "(int * int) list");
    }

    #[test]
    fn test_display_open_record() {
        let mut fields = IndexMap::new();
        fields.insert("name".to_string(), Type::string());
        let ty = Type::Record {
            fields,
            complete: false,
        };
        assert_eq!(ty.to_string(), "{name: string, ...}");
    }

    #[test]
    fn test_free_variables_skip_bound() {
        let ty = Type::scheme(
            "'a",
            Type::function(Type::variable("'a"), Type::variable("'b")),
        );
        assert_eq!(ty.free_variables(), vec!["'b".to_string()]);
    }

    #[test]
    fn test_substitute_respects_shadowing() {
        let inner = Type::scheme("'a", Type::variable("'a"));
        assert_eq!(inner.substitute("'a", &Type::int()), inner);
        let open = Type::list(Type::variable("'a"));
        assert_eq!(open.substitute("'a", &Type::int()), Type::list(Type::int()));
    }

    #[test]
    fn test_normalize_renames_in_order() {
        let ty = Type::function(Type::variable("'t7"), Type::variable("''t3"));
        assert_eq!(ty.normalize().to_string(), "'a -> ''b");
    }

    #[test]
    fn test_equality_variable_sigil() {
        assert!(is_equality_variable("''a"));
        assert!(!is_equality_variable("'a"));
    }
}
