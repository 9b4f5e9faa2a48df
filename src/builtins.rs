//! # Initial Basis
//!
//! The root State every session starts from: the predefined types, the
//! constructors of `bool`, `list` and `ref`, the predefined exceptions, the
//! native functions and the default fixities.
//!
//! Predefined constructors and exceptions all carry generation 0, and their
//! counters start at 1, so a user declaration that reuses one of their names
//! always produces a distinct constructor.

use std::rc::Rc;

use crate::error::Error;
use crate::interpreter::{
    checked_int, Evaluation, NativeFunction, NativeImplementation, Value, BIND, CHR, DIV, MATCH,
    MAX_ARRAY_LENGTH, OVERFLOW, SIZE, SUBSCRIPT,
};
use crate::state::{IdentifierStatus, InfixStatus, State, TypeInformation};
use crate::types::Type;

const EXCEPTIONS: [&str; 7] = [MATCH, BIND, DIV, OVERFLOW, SUBSCRIPT, SIZE, CHR];

fn alpha() -> Type {
    Type::variable("'a")
}

fn pair(left: Type, right: Type) -> Type {
    Type::tuple(vec![left, right])
}

fn binary(ty: Type, result: Type) -> Type {
    Type::function(pair(ty.clone(), ty), result)
}

fn polymorphic(body: Type) -> Type {
    Type::scheme("'a", body)
}

fn overloaded(body: Type, domain: Vec<Type>) -> Type {
    Type::overloaded("'a", body, domain)
}

fn numbers() -> Vec<Type> {
    vec![Type::int(), Type::word(), Type::real()]
}

fn ordered() -> Vec<Type> {
    vec![Type::int(), Type::word(), Type::real(), Type::string(), Type::char()]
}

fn native(
    name: &'static str,
    ty: Type,
    implementation: NativeImplementation,
) -> (&'static str, Type, NativeImplementation) {
    (name, ty, implementation)
}

fn natives() -> Vec<(&'static str, Type, NativeImplementation)> {
    vec![
        native("+", overloaded(binary(alpha(), alpha()), numbers()), add),
        native("-", overloaded(binary(alpha(), alpha()), numbers()), subtract),
        native("*", overloaded(binary(alpha(), alpha()), numbers()), multiply),
        native("div", overloaded(binary(alpha(), alpha()), vec![Type::int(), Type::word()]), div),
        native("mod", overloaded(binary(alpha(), alpha()), vec![Type::int(), Type::word()]), modulo),
        native("/", binary(Type::real(), Type::real()), divide),
        native("~", overloaded(Type::function(alpha(), alpha()), vec![Type::int(), Type::real()]), negate),
        native("abs", overloaded(Type::function(alpha(), alpha()), vec![Type::int(), Type::real()]), absolute),
        native("<", overloaded(binary(alpha(), Type::bool()), ordered()), less),
        native("<=", overloaded(binary(alpha(), Type::bool()), ordered()), less_equal),
        native(">", overloaded(binary(alpha(), Type::bool()), ordered()), greater),
        native(">=", overloaded(binary(alpha(), Type::bool()), ordered()), greater_equal),
        native("=", Type::scheme("''a", binary(Type::variable("''a"), Type::bool())), equal),
        native("<>", Type::scheme("''a", binary(Type::variable("''a"), Type::bool())), not_equal),
        native("^", binary(Type::string(), Type::string()), concat),
        native("size", Type::function(Type::string(), Type::int()), size),
        native("explode", Type::function(Type::string(), Type::list(Type::char())), explode),
        native("implode", Type::function(Type::list(Type::char()), Type::string()), implode),
        native("ord", Type::function(Type::char(), Type::int()), ord),
        native("chr", Type::function(Type::int(), Type::char()), chr),
        native("not", Type::function(Type::bool(), Type::bool()), not),
        native("real", Type::function(Type::int(), Type::real()), real),
        native("floor", Type::function(Type::real(), Type::int()), floor),
        native("!", polymorphic(Type::function(Type::reference(alpha()), alpha())), dereference),
        native(
            ":=",
            polymorphic(Type::function(pair(Type::reference(alpha()), alpha()), Type::unit())),
            assign,
        ),
        native("print", Type::function(Type::string(), Type::unit()), print),
        native(
            "array",
            polymorphic(Type::function(pair(Type::int(), alpha()), Type::array(alpha()))),
            array,
        ),
        native(
            "sub",
            polymorphic(Type::function(pair(Type::array(alpha()), Type::int()), alpha())),
            sub,
        ),
        native(
            "update",
            polymorphic(Type::function(
                Type::tuple(vec![Type::array(alpha()), Type::int(), alpha()]),
                Type::unit(),
            )),
            update,
        ),
        native("length", polymorphic(Type::function(Type::array(alpha()), Type::int())), length),
        native("vector", polymorphic(Type::function(Type::list(alpha()), Type::vector(alpha()))), vector),
        native(
            "vsub",
            polymorphic(Type::function(pair(Type::vector(alpha()), Type::int()), alpha())),
            vector_sub,
        ),
        native("vlength", polymorphic(Type::function(Type::vector(alpha()), Type::int())), vector_length),
    ]
}

fn primitive(name: &str, admits_equality: bool) -> TypeInformation {
    TypeInformation {
        ty: Type::named(name, vec![]),
        parameters: vec![],
        constructors: vec![],
        admits_equality,
    }
}

fn unary(name: &str, constructors: Vec<String>) -> TypeInformation {
    TypeInformation {
        ty: Type::named(name, vec![alpha()]),
        parameters: vec!["'a".to_string()],
        constructors,
        admits_equality: true,
    }
}

/// Build the root State of a new session.
pub fn initial_state() -> Rc<State> {
    let state = State::root();

    state.set_static_type(
        "unit",
        TypeInformation {
            ty: Type::unit(),
            parameters: vec![],
            constructors: vec![],
            admits_equality: true,
        },
    );
    state.set_static_type(
        "bool",
        TypeInformation {
            constructors: vec!["true".to_string(), "false".to_string()],
            ..primitive("bool", true)
        },
    );
    for name in ["int", "word", "string", "char"] {
        state.set_static_type(name, primitive(name, true));
    }
    state.set_static_type("real", primitive("real", false));
    state.set_static_type("exn", primitive("exn", false));
    state.set_static_type("list", unary("list", vec!["nil".to_string(), "::".to_string()]));
    state.set_static_type("ref", unary("ref", vec!["ref".to_string()]));
    state.set_static_type("array", unary("array", vec![]));
    state.set_static_type("vector", unary("vector", vec![]));

    state.set_dynamic_type("bool", vec!["true".to_string(), "false".to_string()]);
    state.set_dynamic_type("list", vec!["nil".to_string(), "::".to_string()]);
    state.set_dynamic_type("ref", vec!["ref".to_string()]);

    let constructors = [
        ("true", Type::bool(), Value::bool(true)),
        ("false", Type::bool(), Value::bool(false)),
        (
            "nil",
            polymorphic(Type::list(alpha())),
            Value::Constructed {
                name: "nil".to_string(),
                argument: None,
                generation: 0,
            },
        ),
        (
            "::",
            polymorphic(Type::function(pair(alpha(), Type::list(alpha())), Type::list(alpha()))),
            Value::ValueConstructor {
                name: "::".to_string(),
                arity: 1,
                generation: 0,
            },
        ),
        (
            "ref",
            polymorphic(Type::function(alpha(), Type::reference(alpha()))),
            Value::ValueConstructor {
                name: "ref".to_string(),
                arity: 1,
                generation: 0,
            },
        ),
    ];
    for (name, ty, value) in constructors {
        state.set_static_value(name, ty, IdentifierStatus::ValueConstructor);
        state.set_dynamic_value(name, value, IdentifierStatus::ValueConstructor);
        state.set_value_identifier_id(name, 1);
    }

    for name in EXCEPTIONS {
        state.set_static_value(name, Type::exn(), IdentifierStatus::ExceptionConstructor);
        state.set_dynamic_value(
            name,
            Value::builtin_exception(name),
            IdentifierStatus::ExceptionConstructor,
        );
        state.set_value_identifier_id(name, 1);
    }

    for (name, ty, implementation) in natives() {
        state.set_static_value(name, ty, IdentifierStatus::Variable);
        state.set_dynamic_value(
            name,
            Value::Native(NativeFunction { name, implementation }),
            IdentifierStatus::Variable,
        );
    }

    for name in ["div", "mod", "*", "/"] {
        state.set_infix(name, InfixStatus::left(7));
    }
    for name in ["+", "-", "^"] {
        state.set_infix(name, InfixStatus::left(6));
    }
    state.set_infix("::", InfixStatus::right(5));
    for name in ["=", "<>", "<", ">", "<=", ">="] {
        state.set_infix(name, InfixStatus::left(4));
    }
    state.set_infix(":=", InfixStatus::left(3));

    state
}

fn returned(value: Value) -> Result<Evaluation, Error> {
    Ok(Evaluation::returned(value))
}

fn raised(name: &str) -> Result<Evaluation, Error> {
    Ok(Evaluation::raise_builtin(name))
}

fn mismatch(native: &str, argument: &Value) -> Error {
    Error::internal(format!("{} applied to {:?}", native, argument))
}

/// Range-checked integer result, raising `Overflow` when out of bounds.
fn integer(value: Option<i128>, wrap: fn(i64) -> Value) -> Result<Evaluation, Error> {
    match value.and_then(checked_int) {
        Some(value) => returned(wrap(value)),
        None => raised(OVERFLOW),
    }
}

fn arithmetic(
    native: &str,
    argument: Value,
    integer_operation: fn(i128, i128) -> Option<i128>,
    real_operation: fn(f64, f64) -> f64,
) -> Result<Evaluation, Error> {
    match argument.pair()? {
        (Value::Int(left), Value::Int(right)) => {
            integer(integer_operation(left as i128, right as i128), Value::Int)
        }
        (Value::Word(left), Value::Word(right)) => {
            integer(integer_operation(left as i128, right as i128), Value::Word)
        }
        (Value::Real(left), Value::Real(right)) => returned(Value::Real(real_operation(left, right))),
        _ => Err(mismatch(native, &argument)),
    }
}

fn add(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    arithmetic("+", argument, i128::checked_add, |left, right| left + right)
}

fn subtract(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    arithmetic("-", argument, i128::checked_sub, |left, right| left - right)
}

fn multiply(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    arithmetic("*", argument, i128::checked_mul, |left, right| left * right)
}

fn floor_division(left: i128, right: i128) -> i128 {
    let quotient = left / right;
    if left % right != 0 && ((left < 0) != (right < 0)) {
        quotient - 1
    } else {
        quotient
    }
}

fn division(native: &str, argument: Value, operation: fn(i128, i128) -> i128) -> Result<Evaluation, Error> {
    match argument.pair()? {
        (Value::Int(_), Value::Int(0)) | (Value::Word(_), Value::Word(0)) => raised(DIV),
        (Value::Int(left), Value::Int(right)) => integer(Some(operation(left as i128, right as i128)), Value::Int),
        (Value::Word(left), Value::Word(right)) => integer(Some(operation(left as i128, right as i128)), Value::Word),
        _ => Err(mismatch(native, &argument)),
    }
}

fn div(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    division("div", argument, floor_division)
}

fn modulo(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    division("mod", argument, |left, right| left - right * floor_division(left, right))
}

fn divide(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument.pair()? {
        (Value::Real(left), Value::Real(right)) => returned(Value::Real(left / right)),
        _ => Err(mismatch("/", &argument)),
    }
}

fn negate(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::Int(value) => integer(Some(-(value as i128)), Value::Int),
        Value::Real(value) => returned(Value::Real(-value)),
        other => Err(mismatch("~", &other)),
    }
}

fn absolute(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::Int(value) => integer(Some((value as i128).abs()), Value::Int),
        Value::Real(value) => returned(Value::Real(value.abs())),
        other => Err(mismatch("abs", &other)),
    }
}

/// `None` when either side is a NaN real, which makes every ordering false.
fn compare(native: &str, argument: Value) -> Result<Option<std::cmp::Ordering>, Error> {
    let ordering = match argument.pair()? {
        (Value::Int(left), Value::Int(right)) | (Value::Word(left), Value::Word(right)) => Some(left.cmp(&right)),
        (Value::Real(left), Value::Real(right)) => left.partial_cmp(&right),
        (Value::String(left), Value::String(right)) => Some(left.cmp(&right)),
        (Value::Char(left), Value::Char(right)) => Some(left.cmp(&right)),
        _ => return Err(mismatch(native, &argument)),
    };
    Ok(ordering)
}

fn less(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    returned(Value::bool(compare("<", argument)?.is_some_and(|ordering| ordering.is_lt())))
}

fn less_equal(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    returned(Value::bool(compare("<=", argument)?.is_some_and(|ordering| ordering.is_le())))
}

fn greater(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    returned(Value::bool(compare(">", argument)?.is_some_and(|ordering| ordering.is_gt())))
}

fn greater_equal(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    returned(Value::bool(compare(">=", argument)?.is_some_and(|ordering| ordering.is_ge())))
}

fn equal(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    let (left, right) = argument.pair()?;
    returned(Value::bool(left.equals(&right)?))
}

fn not_equal(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    let (left, right) = argument.pair()?;
    returned(Value::bool(!left.equals(&right)?))
}

fn concat(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument.pair()? {
        (Value::String(left), Value::String(right)) => returned(Value::String(left + &right)),
        _ => Err(mismatch("^", &argument)),
    }
}

fn size(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::String(text) => returned(Value::Int(text.chars().count() as i64)),
        other => Err(mismatch("size", &other)),
    }
}

fn explode(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::String(text) => returned(Value::list(text.chars().map(Value::Char).collect())),
        other => Err(mismatch("explode", &other)),
    }
}

fn implode(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    let characters = argument.as_list().ok_or_else(|| mismatch("implode", &argument))?;
    let mut text = String::new();
    for character in characters {
        match character {
            Value::Char(character) => text.push(character),
            other => return Err(mismatch("implode", &other)),
        }
    }
    returned(Value::String(text))
}

fn ord(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::Char(character) => returned(Value::Int(character as i64)),
        other => Err(mismatch("ord", &other)),
    }
}

fn chr(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::Int(code) if (0..=255).contains(&code) => match char::from_u32(code as u32) {
            Some(character) => returned(Value::Char(character)),
            None => raised(CHR),
        },
        Value::Int(_) => raised(CHR),
        other => Err(mismatch("chr", &other)),
    }
}

fn not(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument.as_bool() {
        Some(value) => returned(Value::bool(!value)),
        None => Err(mismatch("not", &argument)),
    }
}

fn real(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::Int(value) => returned(Value::Real(value as f64)),
        other => Err(mismatch("real", &other)),
    }
}

fn floor(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::Real(value) if value.is_finite() => integer(Some(value.floor() as i128), Value::Int),
        Value::Real(_) => raised(OVERFLOW),
        other => Err(mismatch("floor", &other)),
    }
}

fn dereference(argument: Value, state: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::Reference(address) => match state.cell(address) {
            Some(value) => returned(value),
            None => Err(Error::internal(format!("dangling reference {}", address))),
        },
        other => Err(mismatch("!", &other)),
    }
}

fn assign(argument: Value, state: &Rc<State>) -> Result<Evaluation, Error> {
    match argument.pair()? {
        (Value::Reference(address), value) => {
            state.set_cell(address, value);
            returned(Value::unit())
        }
        _ => Err(mismatch(":=", &argument)),
    }
}

fn print(argument: Value, state: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::String(text) => {
            state.print(&text);
            returned(Value::unit())
        }
        other => Err(mismatch("print", &other)),
    }
}

fn array(argument: Value, state: &Rc<State>) -> Result<Evaluation, Error> {
    match argument.pair()? {
        (Value::Int(length), _) if !(0..=MAX_ARRAY_LENGTH).contains(&length) => raised(SIZE),
        (Value::Int(length), initial) => {
            let length = length as usize;
            let address = state.allocate_block(vec![initial; length]);
            returned(Value::Array { address, length })
        }
        _ => Err(mismatch("array", &argument)),
    }
}

/// Offset of `index` into a block of `length` cells.
fn offset(index: i64, length: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|index| *index < length)
}

fn sub(argument: Value, state: &Rc<State>) -> Result<Evaluation, Error> {
    match argument.pair()? {
        (Value::Array { address, length }, Value::Int(index)) => match offset(index, length) {
            Some(offset) => match state.cell(address + offset) {
                Some(value) => returned(value),
                None => Err(Error::internal(format!("dangling array cell {}", address + offset))),
            },
            None => raised(SUBSCRIPT),
        },
        _ => Err(mismatch("sub", &argument)),
    }
}

fn update(argument: Value, state: &Rc<State>) -> Result<Evaluation, Error> {
    match (argument.field("1"), argument.field("2"), argument.field("3")) {
        (Some(Value::Array { address, length }), Some(Value::Int(index)), Some(value)) => {
            match offset(*index, *length) {
                Some(offset) => {
                    state.set_cell(address + offset, value.clone());
                    returned(Value::unit())
                }
                None => raised(SUBSCRIPT),
            }
        }
        _ => Err(mismatch("update", &argument)),
    }
}

fn length(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::Array { length, .. } => returned(Value::Int(length as i64)),
        other => Err(mismatch("length", &other)),
    }
}

fn vector(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument.as_list() {
        Some(elements) => returned(Value::Vector(elements)),
        None => Err(mismatch("vector", &argument)),
    }
}

fn vector_sub(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument.pair()? {
        (Value::Vector(elements), Value::Int(index)) => match offset(index, elements.len()) {
            Some(offset) => returned(elements[offset].clone()),
            None => raised(SUBSCRIPT),
        },
        _ => Err(mismatch("vsub", &argument)),
    }
}

fn vector_length(argument: Value, _: &Rc<State>) -> Result<Evaluation, Error> {
    match argument {
        Value::Vector(elements) => returned(Value::Int(elements.len() as i64)),
        other => Err(mismatch("vlength", &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, argument: Value) -> Evaluation {
        let state = initial_state();
        let (function, _) = state.lookup_dynamic_value(name, 0).unwrap();
        crate::interpreter::apply(function, argument, &state).unwrap()
    }

    fn ints(left: i64, right: i64) -> Value {
        Value::tuple(vec![Value::Int(left), Value::Int(right)])
    }

    fn raised_builtin(evaluation: &Evaluation, name: &str) -> bool {
        evaluation.thrown && evaluation.value.equals(&Value::builtin_exception(name)).unwrap()
    }

    #[test]
    fn test_overflow_on_multiplication() {
        assert!(raised_builtin(&call("*", ints(1_073_741_823, 4)), OVERFLOW));
    }

    #[test]
    fn test_addition_at_the_bounds() {
        let result = call("+", ints(1_073_741_822, 1));
        assert!(result.value.equals(&Value::Int(1_073_741_823)).unwrap());
        assert!(raised_builtin(&call("+", ints(1_073_741_823, 1)), OVERFLOW));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(raised_builtin(&call("div", ints(12, 0)), DIV));
        assert!(raised_builtin(&call("mod", ints(12, 0)), DIV));
    }

    #[test]
    fn test_floor_division_semantics() {
        assert!(call("div", ints(12, 5)).value.equals(&Value::Int(2)).unwrap());
        assert!(call("mod", ints(12, 5)).value.equals(&Value::Int(2)).unwrap());
        assert!(call("div", ints(-7, 2)).value.equals(&Value::Int(-4)).unwrap());
        assert!(call("mod", ints(-7, 2)).value.equals(&Value::Int(1)).unwrap());
        assert!(call("mod", ints(7, -2)).value.equals(&Value::Int(-1)).unwrap());
    }

    #[test]
    fn test_negating_minint_overflows() {
        assert!(raised_builtin(&call("~", Value::Int(-1_073_741_824)), OVERFLOW));
        assert!(raised_builtin(&call("div", ints(-1_073_741_824, -1)), OVERFLOW));
    }

    #[test]
    fn test_string_natives() {
        let pair = Value::tuple(vec![Value::String("ab".into()), Value::String("cd".into())]);
        assert!(call("^", pair).value.equals(&Value::String("abcd".into())).unwrap());
        assert!(call("size", Value::String("abc".into())).value.equals(&Value::Int(3)).unwrap());
        let exploded = call("explode", Value::String("hi".into())).value;
        assert!(call("implode", exploded).value.equals(&Value::String("hi".into())).unwrap());
    }

    #[test]
    fn test_chr_range() {
        assert!(call("chr", Value::Int(97)).value.equals(&Value::Char('a')).unwrap());
        assert!(raised_builtin(&call("chr", Value::Int(256)), CHR));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(call("<", ints(1, 2)).value.as_bool(), Some(true));
        assert_eq!(call(">=", ints(1, 2)).value.as_bool(), Some(false));
        let strings = Value::tuple(vec![Value::String("a".into()), Value::String("b".into())]);
        assert_eq!(call("<", strings).value.as_bool(), Some(true));
    }

    #[test]
    fn test_array_bounds() {
        let state = initial_state();
        let (array_native, _) = state.lookup_dynamic_value("array", 0).unwrap();
        let created = crate::interpreter::apply(array_native, ints(3, 0), &state).unwrap().value;
        let (sub_native, _) = state.lookup_dynamic_value("sub", 0).unwrap();
        let outside = Value::tuple(vec![created.clone(), Value::Int(3)]);
        let result = crate::interpreter::apply(sub_native, outside, &state).unwrap();
        assert!(raised_builtin(&result, SUBSCRIPT));

        assert!(raised_builtin(&call("array", ints(-1, 0)), SIZE));
    }

    #[test]
    fn test_oversized_array_raises_size() {
        assert!(raised_builtin(&call("array", ints(1_000_000_000, 0)), SIZE));
        assert!(raised_builtin(&call("array", ints(MAX_ARRAY_LENGTH + 1, 0)), SIZE));
    }

    #[test]
    fn test_nan_comparisons_are_false() {
        let nan = || Value::tuple(vec![Value::Real(f64::NAN), Value::Real(1.0)]);
        for operator in ["<", "<=", ">", ">="] {
            let evaluation = call(operator, nan());
            assert!(!evaluation.thrown);
            assert_eq!(evaluation.value.as_bool(), Some(false), "{}", operator);
        }
        let reals = Value::tuple(vec![Value::Real(0.5), Value::Real(1.0)]);
        assert_eq!(call("<", reals).value.as_bool(), Some(true));
    }

    #[test]
    fn test_builtin_exception_counters_start_at_one() {
        let state = initial_state();
        for name in EXCEPTIONS {
            assert_eq!(state.value_identifier_id(name), 1);
        }
    }

    #[test]
    fn test_default_fixities() {
        let state = initial_state();
        assert_eq!(state.lookup_infix("div").map(|status| status.precedence), Some(7));
        assert!(state.lookup_infix("::").unwrap().right_associative);
        assert!(state.lookup_infix("print").is_none());
    }
}
