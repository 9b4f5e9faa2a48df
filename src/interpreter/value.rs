use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::Match;
use crate::error::Error;
use crate::state::State;

pub const MAXINT: i128 = 1_073_741_823;
pub const MININT: i128 = -1_073_741_824;
/// Longest array `array` will allocate; longer requests raise `Size`.
pub const MAX_ARRAY_LENGTH: i64 = 16_777_215;

pub const MATCH: &str = "Match";
pub const BIND: &str = "Bind";
pub const DIV: &str = "Div";
pub const OVERFLOW: &str = "Overflow";
pub const SUBSCRIPT: &str = "Subscript";
pub const SIZE: &str = "Size";
pub const CHR: &str = "Chr";

/// Host implementation of a predefined function.
pub type NativeImplementation = fn(Value, &Rc<State>) -> Result<Evaluation, Error>;

#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub implementation: NativeImplementation,
}

/// A `fn` value together with the scope it was created in.
///
/// Members of a recursive group are not bound in `state`; every call binds
/// them afresh from `recursive_group`, so a closure never points at itself.
pub struct Closure {
    pub state: Rc<State>,
    pub recursive_group: Rc<Vec<(String, Value)>>,
    pub clauses: Rc<Match>,
}

/// Runtime value representation
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Word(i64),
    Real(f64),
    Char(char),
    String(String),
    Record(IndexMap<String, Value>),
    Constructed {
        name: String,
        argument: Option<Box<Value>>,
        generation: usize,
    },
    Exception {
        name: String,
        argument: Option<Box<Value>>,
        generation: usize,
    },
    Closure(Rc<Closure>),
    Native(NativeFunction),
    /// Constructor tag before application
    ValueConstructor {
        name: String,
        arity: usize,
        generation: usize,
    },
    ExceptionConstructor {
        name: String,
        arity: usize,
        generation: usize,
    },
    Reference(usize),
    Array {
        address: usize,
        length: usize,
    },
    Vector(Vec<Value>),
}

/// Result of evaluating an expression: a value, or an exception on its way
/// to the nearest handler.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub value: Value,
    pub thrown: bool,
}

impl Evaluation {
    pub fn returned(value: Value) -> Self {
        Self {
            value,
            thrown: false,
        }
    }

    pub fn raised(value: Value) -> Self {
        Self { value, thrown: true }
    }

    /// Raise one of the predefined exceptions.
    pub fn raise_builtin(name: &str) -> Self {
        Self::raised(Value::builtin_exception(name))
    }
}

/// Range-check an integer result.
pub fn checked_int(value: i128) -> Option<i64> {
    if (MININT..=MAXINT).contains(&value) {
        Some(value as i64)
    } else {
        None
    }
}

impl Value {
    pub fn bool(value: bool) -> Self {
        Value::Constructed {
            name: if value { "true" } else { "false" }.to_string(),
            argument: None,
            generation: 0,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Constructed {
                name,
                argument: None,
                generation: 0,
            } => match name.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn unit() -> Self {
        Value::Record(IndexMap::new())
    }

    pub fn tuple(elements: Vec<Value>) -> Self {
        Value::Record(
            elements
                .into_iter()
                .enumerate()
                .map(|(index, element)| ((index + 1).to_string(), element))
                .collect(),
        )
    }

    pub fn list(elements: Vec<Value>) -> Self {
        elements
            .into_iter()
            .rev()
            .fold(Value::nil(), |tail, head| Value::Constructed {
                name: "::".to_string(),
                argument: Some(Box::new(Value::tuple(vec![head, tail]))),
                generation: 0,
            })
    }

    fn nil() -> Self {
        Value::Constructed {
            name: "nil".to_string(),
            argument: None,
            generation: 0,
        }
    }

    /// Elements of a proper list value.
    pub fn as_list(&self) -> Option<Vec<Value>> {
        let mut elements = vec![];
        let mut current = self;
        loop {
            match current {
                Value::Constructed {
                    name,
                    argument: None,
                    generation: 0,
                } if name == "nil" => return Some(elements),
                Value::Constructed {
                    name,
                    argument: Some(pair),
                    generation: 0,
                } if name == "::" => {
                    elements.push(pair.field("1")?.clone());
                    current = pair.field("2")?;
                }
                _ => return None,
            }
        }
    }

    pub fn field(&self, label: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(label),
            _ => None,
        }
    }

    /// Components of a pair, as passed to binary operators.
    pub fn pair(&self) -> Result<(Value, Value), Error> {
        match (self.field("1"), self.field("2")) {
            (Some(left), Some(right)) => Ok((left.clone(), right.clone())),
            _ => Err(Error::internal(format!(
                "expected a pair, found {:?}",
                self
            ))),
        }
    }

    pub fn builtin_exception(name: &str) -> Self {
        Value::Exception {
            name: name.to_string(),
            argument: None,
            generation: 0,
        }
    }

    /// Structural equality.
    ///
    /// Constructed values and exceptions only compare equal when both name and
    /// generation agree. References and arrays compare by address.
    pub fn equals(&self, other: &Value) -> Result<bool, Error> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) | (Value::Word(a), Value::Word(b)) => Ok(a == b),
            (Value::Real(a), Value::Real(b)) => Ok(a == b),
            (Value::Char(a), Value::Char(b)) => Ok(a == b),
            (Value::String(a), Value::String(b)) => Ok(a == b),
            (Value::Record(a), Value::Record(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (label, left) in a {
                    match b.get(label) {
                        Some(right) => {
                            if !left.equals(right)? {
                                return Ok(false);
                            }
                        }
                        None => return Ok(false),
                    }
                }
                Ok(true)
            }
            (
                Value::Constructed {
                    name: n1,
                    argument: a1,
                    generation: g1,
                },
                Value::Constructed {
                    name: n2,
                    argument: a2,
                    generation: g2,
                },
            )
            | (
                Value::Exception {
                    name: n1,
                    argument: a1,
                    generation: g1,
                },
                Value::Exception {
                    name: n2,
                    argument: a2,
                    generation: g2,
                },
            ) => {
                if n1 != n2 || g1 != g2 {
                    return Ok(false);
                }
                match (a1, a2) {
                    (None, None) => Ok(true),
                    (Some(a1), Some(a2)) => a1.equals(a2),
                    _ => Ok(false),
                }
            }
            (
                Value::ValueConstructor {
                    name: n1,
                    generation: g1,
                    ..
                },
                Value::ValueConstructor {
                    name: n2,
                    generation: g2,
                    ..
                },
            )
            | (
                Value::ExceptionConstructor {
                    name: n1,
                    generation: g1,
                    ..
                },
                Value::ExceptionConstructor {
                    name: n2,
                    generation: g2,
                    ..
                },
            ) => Ok(n1 == n2 && g1 == g2),
            (Value::Reference(a), Value::Reference(b)) => Ok(a == b),
            (Value::Array { address: a, .. }, Value::Array { address: b, .. }) => Ok(a == b),
            (Value::Vector(a), Value::Vector(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (left, right) in a.iter().zip(b) {
                    if !left.equals(right)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Closure(_) | Value::Native(_), _) | (_, Value::Closure(_) | Value::Native(_)) => {
                Err(Error::internal("functions do not admit equality"))
            }
            _ => Ok(false),
        }
    }

    /// Render the value in source notation, following references into the
    /// memory of `state`.
    pub fn render(&self, state: &State) -> String {
        match self {
            Value::Int(value) | Value::Word(value) => {
                let text = value.abs().to_string();
                let prefix = if matches!(self, Value::Word(_)) { "0w" } else { "" };
                if *value < 0 {
                    format!("~{}{}", prefix, text)
                } else {
                    format!("{}{}", prefix, text)
                }
            }
            Value::Real(value) => render_real(*value),
            Value::Char(value) => format!("#\"{}\"", escape(&value.to_string())),
            Value::String(value) => format!("\"{}\"", escape(value)),
            Value::Record(fields) => {
                if let Some(elements) = tuple_elements(fields) {
                    if elements.len() != 1 {
                        let rendered: Vec<String> =
                            elements.iter().map(|element| element.render(state)).collect();
                        return format!("({})", rendered.join(", "));
                    }
                }
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(label, field)| format!("{} = {}", label, field.render(state)))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::Constructed { .. } if self.as_list().is_some() => {
                let rendered: Vec<String> = self
                    .as_list()
                    .unwrap_or_default()
                    .iter()
                    .map(|element| element.render(state))
                    .collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Constructed { name, argument, .. } | Value::Exception { name, argument, .. } => {
                match argument {
                    None => name.clone(),
                    Some(argument) => format!("{} {}", name, argument.render_atomic(state)),
                }
            }
            Value::Closure(_) | Value::Native(_) => "fn".to_string(),
            Value::ValueConstructor { name, .. } | Value::ExceptionConstructor { name, .. } => {
                name.clone()
            }
            Value::Reference(address) => match state.cell(*address) {
                Some(content) => format!("ref {}", content.render_atomic(state)),
                None => "ref ?".to_string(),
            },
            Value::Array { address, length } => {
                let rendered: Vec<String> = (0..*length)
                    .map(|offset| match state.cell(address + offset) {
                        Some(element) => element.render(state),
                        None => "?".to_string(),
                    })
                    .collect();
                format!("[|{}|]", rendered.join(", "))
            }
            Value::Vector(elements) => {
                let rendered: Vec<String> = elements.iter().map(|element| element.render(state)).collect();
                format!("#[{}]", rendered.join(", "))
            }
        }
    }

    /// Render with parentheses when the value is a constructor application.
    fn render_atomic(&self, state: &State) -> String {
        let rendered = self.render(state);
        let needs_parentheses = match self {
            Value::Constructed { argument, .. } | Value::Exception { argument, .. } => {
                argument.is_some() && self.as_list().is_none()
            }
            Value::Reference(_) => true,
            _ => false,
        };
        if needs_parentheses {
            format!("({})", rendered)
        } else {
            rendered
        }
    }
}

fn tuple_elements(fields: &IndexMap<String, Value>) -> Option<Vec<&Value>> {
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

fn render_real(value: f64) -> String {
    let text = if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        "inf".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value.abs())
    } else {
        value.abs().to_string()
    };
    if value < 0.0 {
        format!("~{}", text)
    } else {
        text
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::new();
    for character in text.chars() {
        match character {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "Int({})", value),
            Value::Word(value) => write!(f, "Word({})", value),
            Value::Real(value) => write!(f, "Real({})", value),
            Value::Char(value) => write!(f, "Char({:?})", value),
            Value::String(value) => write!(f, "String({:?})", value),
            Value::Record(fields) => f.debug_map().entries(fields.iter()).finish(),
            Value::Constructed {
                name,
                argument,
                generation,
            } => write!(f, "Constructed({}#{}, {:?})", name, generation, argument),
            Value::Exception {
                name,
                argument,
                generation,
            } => write!(f, "Exception({}#{}, {:?})", name, generation, argument),
            Value::Closure(_) => write!(f, "Closure"),
            Value::Native(native) => write!(f, "Native({})", native.name),
            Value::ValueConstructor {
                name, generation, ..
            } => write!(f, "ValueConstructor({}#{})", name, generation),
            Value::ExceptionConstructor {
                name, generation, ..
            } => write!(f, "ExceptionConstructor({}#{})", name, generation),
            Value::Reference(address) => write!(f, "Reference({})", address),
            Value::Array { address, length } => write!(f, "Array({}, {})", address, length),
            Value::Vector(elements) => f.debug_list().entries(elements.iter()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_int_bounds() {
        assert_eq!(checked_int(MAXINT), Some(1_073_741_823));
        assert_eq!(checked_int(MAXINT + 1), None);
        assert_eq!(checked_int(MININT), Some(-1_073_741_824));
        assert_eq!(checked_int(MININT - 1), None);
    }

    #[test]
    fn test_constructed_equality_needs_generation() {
        let first = Value::Exception {
            name: "Match".to_string(),
            argument: None,
            generation: 0,
        };
        let second = Value::Exception {
            name: "Match".to_string(),
            argument: None,
            generation: 1,
        };
        assert!(!first.equals(&second).unwrap());
        assert!(first.equals(&first.clone()).unwrap());
    }

    #[test]
    fn test_record_equality_ignores_order() {
        let mut left = IndexMap::new();
        left.insert("a".to_string(), Value::Int(1));
        left.insert("b".to_string(), Value::Int(2));
        let mut right = IndexMap::new();
        right.insert("b".to_string(), Value::Int(2));
        right.insert("a".to_string(), Value::Int(1));
        assert!(Value::Record(left).equals(&Value::Record(right)).unwrap());
    }

    #[test]
    fn test_list_round_trip() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let elements = list.as_list().unwrap();
        assert_eq!(elements.len(), 2);
        assert!(elements[1].equals(&Value::Int(2)).unwrap());
    }

    #[test]
    fn test_bool_helpers() {
        assert_eq!(Value::bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(1).as_bool(), None);
    }

    #[test]
    fn test_render_scalars() {
        let state = State::root();
        assert_eq!(Value::Int(-3).render(&state), "~3");
        assert_eq!(Value::Real(2.0).render(&state), "2.0");
        assert_eq!(Value::Char('a').render(&state), "#\"a\"");
        assert_eq!(Value::String("hi\n".into()).render(&state), "\"hi\\n\"");
    }

    #[test]
    fn test_render_structures() {
        let state = State::root();
        let pair = Value::tuple(vec![Value::Int(1), Value::bool(false)]);
        assert_eq!(pair.render(&state), "(1, false)");
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(list.render(&state), "[1, 2]");
        let some = Value::Constructed {
            name: "SOME".to_string(),
            argument: Some(Box::new(Value::Constructed {
                name: "SOME".to_string(),
                argument: Some(Box::new(Value::Int(1))),
                generation: 0,
            })),
            generation: 0,
        };
        assert_eq!(some.render(&state), "SOME (SOME 1)");
    }

    #[test]
    fn test_render_reference_follows_memory() {
        let state = State::root();
        let address = state.allocate(Value::Int(7));
        assert_eq!(Value::Reference(address).render(&state), "ref 7");
    }

    #[test]
    fn test_comparing_functions_is_internal_error() {
        fn identity(value: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
            Ok(Evaluation::returned(value))
        }
        let native = Value::Native(NativeFunction {
            name: "identity",
            implementation: identity,
        });
        assert!(matches!(native.equals(&native), Err(Error::Internal(_))));
    }
}
