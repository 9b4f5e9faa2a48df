//! Property tests for the unifier, integer arithmetic and the pattern
//! matcher using proptest.
//!
//! 1. Unification reflexivity: matches(t, t) always succeeds
//! 2. Unification symmetry: matches(a, b) succeeds iff matches(b, a) does,
//!    and afterwards both sides resolve to the same type
//! 3. Integer results outside [MININT, MAXINT] raise Overflow
//! 4. The wildcard pattern matches every value and binds nothing

use proptest::prelude::*;
use smlcore::ast::build::*;
use smlcore::interpreter::{match_pattern, Value, MAXINT, MININT};
use smlcore::types::{instantiate, matches, Type};
use smlcore::{evaluate, initial_state};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const VARIABLE_POOL: &[&str] = &["'p0", "'p1", "'p2"];

fn arb_base_type() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::int()),
        Just(Type::real()),
        Just(Type::string()),
        Just(Type::bool()),
        prop::sample::select(VARIABLE_POOL).prop_map(Type::variable),
    ]
}

fn arb_type() -> impl Strategy<Value = Type> {
    arb_base_type().prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::list),
            (inner.clone(), inner.clone()).prop_map(|(param, result)| Type::function(param, result)),
            prop::collection::vec(inner, 2..4).prop_map(Type::tuple),
        ]
    })
}

fn arb_int() -> impl Strategy<Value = i64> {
    (MININT as i64)..=(MAXINT as i64)
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        arb_int().prop_map(Value::Int),
        "[a-z]{0,8}".prop_map(Value::String),
        any::<bool>().prop_map(Value::bool),
        prop::char::range('a', 'z').prop_map(Value::Char),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::tuple),
            prop::collection::vec(inner, 0..4).prop_map(Value::list),
        ]
    })
}

fn is_exception(value: &Value, expected: &str) -> bool {
    matches!(value, Value::Exception { name, generation: 0, .. } if name == expected)
}

// ---------------------------------------------------------------------------
// Unification
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_unify_reflexive(ty in arb_type()) {
        let state = initial_state();
        prop_assert!(matches(&ty, &ty, &state).is_ok());
        prop_assert_eq!(instantiate(&ty, &state), ty);
    }

    #[test]
    fn prop_unify_symmetric(a in arb_type(), b in arb_type()) {
        let forward_state = initial_state();
        let forward = matches(&a, &b, &forward_state);
        let backward_state = initial_state();
        let backward = matches(&b, &a, &backward_state);
        prop_assert_eq!(forward.is_ok(), backward.is_ok());

        if forward.is_ok() {
            prop_assert_eq!(instantiate(&a, &forward_state), instantiate(&b, &forward_state));
            prop_assert_eq!(instantiate(&a, &backward_state), instantiate(&b, &backward_state));
        }
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_addition_in_range_or_overflow(x in arb_int(), y in arb_int()) {
        let state = initial_state();
        let evaluation = evaluate(infix("+", int(x), int(y)), &state).unwrap();
        let exact = x as i128 + y as i128;
        if (MININT..=MAXINT).contains(&exact) {
            prop_assert!(!evaluation.thrown);
            prop_assert!(evaluation.value.equals(&Value::Int(exact as i64)).unwrap());
        } else {
            prop_assert!(evaluation.thrown);
            prop_assert!(is_exception(&evaluation.value, "Overflow"));
        }
    }

    #[test]
    fn prop_multiplication_in_range_or_overflow(x in arb_int(), y in arb_int()) {
        let state = initial_state();
        let evaluation = evaluate(infix("*", int(x), int(y)), &state).unwrap();
        let exact = x as i128 * y as i128;
        if (MININT..=MAXINT).contains(&exact) {
            prop_assert!(!evaluation.thrown);
            prop_assert!(evaluation.value.equals(&Value::Int(exact as i64)).unwrap());
        } else {
            prop_assert!(is_exception(&evaluation.value, "Overflow"));
        }
    }

    #[test]
    fn prop_div_mod_reconstruct(x in arb_int(), y in arb_int().prop_filter("nonzero", |y| *y != 0)) {
        let state = initial_state();
        let quotient = evaluate(infix("div", int(x), int(y)), &state).unwrap();
        let remainder = evaluate(infix("mod", int(x), int(y)), &state).unwrap();
        prop_assume!(!quotient.thrown);
        prop_assert!(!remainder.thrown);

        let (Value::Int(q), Value::Int(r)) = (&quotient.value, &remainder.value) else {
            return Err(TestCaseError::fail("div and mod must return ints"));
        };
        prop_assert_eq!(*q as i128 * y as i128 + *r as i128, x as i128);
        prop_assert!(*r == 0 || (*r < 0) == (y < 0));
        prop_assert!(r.abs() < y.abs());
    }
}

// ---------------------------------------------------------------------------
// Pattern matching
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_wildcard_matches_everything(value in arb_value()) {
        let state = initial_state();
        let bindings = match_pattern(&wildcard(), &value, &state);
        prop_assert_eq!(bindings.map(|bindings| bindings.len()), Some(0));
    }

    #[test]
    fn prop_variable_binds_value(value in arb_value()) {
        let state = initial_state();
        let bindings = match_pattern(&var("v"), &value, &state).unwrap();
        prop_assert_eq!(bindings.len(), 1);
        prop_assert_eq!(bindings[0].0.as_str(), "v");
        prop_assert!(bindings[0].1.equals(&value).unwrap());
    }
}
