mod declaration;
mod eval;
mod pattern;
mod value;

pub use declaration::Flow;
pub use eval::apply;
pub use pattern::match_pattern;
pub use value::{
    checked_int, Closure, Evaluation, NativeFunction, NativeImplementation, Value, BIND, CHR, DIV, MATCH,
    MAXINT, MAX_ARRAY_LENGTH, MININT, OVERFLOW, SIZE, SUBSCRIPT,
};
