//! # Environment Chain
//!
//! A [`State`] is one node of a parent-linked chain of scopes. Every node owns
//! a local static basis (name → type) and a local dynamic basis
//! (name → value); lookups walk from the node toward the root and return the
//! first local hit.
//!
//! ```text
//! initial basis (id 0)
//!     ↑
//! val x = 1     (id 1)
//!     ↑
//! fun f y = x   (id 2)  ← a Closure for `f` keeps this node alive
//!     ↑
//! f 3 call frame (id 2, same id as the closure's defining node)
//! ```
//!
//! Nodes are reference counted: children share their parent, and closures
//! share the node they were created in. Bases use interior mutability since
//! a node is written after creation (declarations install their bindings into
//! a freshly pushed child).
//!
//! ## Identifier Limits and Targeted Writes
//!
//! Every lookup takes an `id_limit`. The walk stops before entering a node
//! whose id is below the limit, which makes "bindings introduced since id N"
//! queries cheap. The `*_at` setters walk toward the root until they reach the
//! node carrying the requested id and write there.
//!
//! ## Session Storage
//!
//! The memory store, the type-variable substitution produced by the Unifier,
//! the warning log and the print buffer are session wide: every node of a
//! chain shares them, and children inherit the handle from their parent.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{Error, Warning};
use crate::interpreter::Value;
use crate::types::{Constraint, Type};

/// How a bound value identifier behaves in patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierStatus {
    Variable,
    ValueConstructor,
    ExceptionConstructor,
}

impl IdentifierStatus {
    pub fn is_constructor(self) -> bool {
        !matches!(self, IdentifierStatus::Variable)
    }
}

/// Identifiers no declaration may rebind; the derived forms and the `ref`
/// pattern refer to them by name.
const RESERVED_IDENTIFIERS: [&str; 6] = ["true", "false", "nil", "::", "ref", "="];

pub fn allows_rebind(name: &str) -> bool {
    !RESERVED_IDENTIFIERS.contains(&name)
}

/// Static description of a type name.
///
/// `ty` is the type the name expands to, written over `parameters`; for a
/// datatype it is `Named(name, parameters)` and for an alias it is the alias
/// body.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInformation {
    pub ty: Type,
    pub parameters: Vec<String>,
    pub constructors: Vec<String>,
    pub admits_equality: bool,
}

impl TypeInformation {
    /// Expand the name applied to `args`.
    pub fn apply(&self, args: &[Type]) -> Type {
        self.parameters
            .iter()
            .zip(args)
            .fold(self.ty.clone(), |ty, (parameter, arg)| {
                ty.substitute(parameter, arg)
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfixStatus {
    pub infix: bool,
    pub precedence: u8,
    pub right_associative: bool,
}

impl InfixStatus {
    pub fn left(precedence: u8) -> Self {
        Self {
            infix: true,
            precedence,
            right_associative: false,
        }
    }

    pub fn right(precedence: u8) -> Self {
        Self {
            infix: true,
            precedence,
            right_associative: true,
        }
    }

    pub fn nonfix() -> Self {
        Self {
            infix: false,
            precedence: 0,
            right_associative: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticBasis {
    pub values: IndexMap<String, (Type, IdentifierStatus)>,
    pub types: IndexMap<String, TypeInformation>,
}

#[derive(Debug, Clone, Default)]
pub struct DynamicBasis {
    pub values: IndexMap<String, (Value, IdentifierStatus)>,
    /// Constructor names of each datatype, needed to replicate datatypes.
    pub types: IndexMap<String, Vec<String>>,
}

/// Flat, append-only address space for references, arrays and vectors.
#[derive(Debug, Default)]
pub struct Memory {
    next_address: usize,
    cells: HashMap<usize, Value>,
}

impl Memory {
    pub fn allocate(&mut self, values: Vec<Value>) -> usize {
        let address = self.next_address;
        let length = values.len();
        for (offset, value) in values.into_iter().enumerate() {
            self.cells.insert(address + offset, value);
        }
        self.next_address = address + length.max(1);
        address
    }

    pub fn get(&self, address: usize) -> Option<&Value> {
        self.cells.get(&address)
    }

    pub fn set(&mut self, address: usize, value: Value) {
        self.cells.insert(address, value);
    }

    pub fn next_address(&self) -> usize {
        self.next_address
    }
}

/// Previous entry of a type variable, recorded so a failed declaration can
/// be undone.
#[derive(Debug)]
enum Undo {
    Binding(String, Option<Type>),
    Constraint(String, Option<Constraint>),
}

#[derive(Debug, Default)]
struct TypeVariables {
    bindings: HashMap<String, Type>,
    constraints: HashMap<String, Constraint>,
    next: usize,
    trail: Vec<Undo>,
}

#[derive(Debug, Default)]
struct Session {
    memory: RefCell<Memory>,
    type_variables: RefCell<TypeVariables>,
    warnings: RefCell<Vec<Warning>>,
    output: RefCell<String>,
}

/// Bindings lifted out of a run of nodes, see [`State::bindings_since`].
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub static_basis: StaticBasis,
    pub dynamic_basis: DynamicBasis,
    pub infixes: IndexMap<String, InfixStatus>,
}

impl Bindings {
    /// Keep the dynamic part, take the static part from `other`.
    pub fn with_static_basis(mut self, other: Bindings) -> Self {
        self.static_basis = other.static_basis;
        for (name, status) in other.infixes {
            self.infixes.entry(name).or_insert(status);
        }
        self
    }
}

#[derive(Debug)]
pub struct State {
    id: usize,
    parent: Option<Rc<State>>,
    static_basis: RefCell<StaticBasis>,
    dynamic_basis: RefCell<DynamicBasis>,
    infixes: RefCell<HashMap<String, InfixStatus>>,
    value_identifier_ids: RefCell<HashMap<String, usize>>,
    /// Value identifiers in the order they were bound into this node.
    declared: RefCell<Vec<String>>,
    session: Rc<Session>,
}

/// Iterator from a node toward the root.
pub struct Ancestors<'a> {
    next: Option<&'a State>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a State;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}

impl State {
    /// A fresh root with id 0 and its own session storage.
    pub fn root() -> Rc<State> {
        Rc::new(State::node(0, None, Rc::new(Session::default())))
    }

    fn node(id: usize, parent: Option<Rc<State>>, session: Rc<Session>) -> State {
        State {
            id,
            parent,
            static_basis: RefCell::default(),
            dynamic_basis: RefCell::default(),
            infixes: RefCell::default(),
            value_identifier_ids: RefCell::default(),
            declared: RefCell::default(),
            session,
        }
    }

    /// Push an empty node with id `parent.id + 1`.
    pub fn child(self: &Rc<Self>) -> Rc<State> {
        self.child_with_id(self.id + 1)
    }

    /// Push an empty node with an explicit id.
    pub fn child_with_id(self: &Rc<Self>, id: usize) -> Rc<State> {
        Rc::new(State::node(id, Some(Rc::clone(self)), Rc::clone(&self.session)))
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn parent(&self) -> Option<&Rc<State>> {
        self.parent.as_ref()
    }

    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    fn visible(&self, id_limit: usize) -> impl Iterator<Item = &State> {
        self.ancestors().take_while(move |state| state.id >= id_limit)
    }

    fn node_at(&self, at_id: usize) -> Result<&State, Error> {
        self.ancestors()
            .find(|state| state.id == at_id)
            .ok_or_else(|| Error::internal(format!("no enclosing state with id {}", at_id)))
    }

    fn root_node(&self) -> &State {
        let mut current = self;
        while let Some(parent) = current.parent.as_deref() {
            current = parent;
        }
        current
    }

    pub fn lookup_static_value(&self, name: &str, id_limit: usize) -> Option<(Type, IdentifierStatus)> {
        self.visible(id_limit)
            .find_map(|state| state.static_basis.borrow().values.get(name).cloned())
    }

    pub fn lookup_dynamic_value(&self, name: &str, id_limit: usize) -> Option<(Value, IdentifierStatus)> {
        self.visible(id_limit)
            .find_map(|state| state.dynamic_basis.borrow().values.get(name).cloned())
    }

    pub fn lookup_static_type(&self, name: &str, id_limit: usize) -> Option<TypeInformation> {
        self.visible(id_limit)
            .find_map(|state| state.static_basis.borrow().types.get(name).cloned())
    }

    pub fn lookup_dynamic_type(&self, name: &str, id_limit: usize) -> Option<Vec<String>> {
        self.visible(id_limit)
            .find_map(|state| state.dynamic_basis.borrow().types.get(name).cloned())
    }

    /// Fixity of `name`, `None` when it was never declared infix.
    pub fn lookup_infix(&self, name: &str) -> Option<InfixStatus> {
        self.ancestors()
            .find_map(|state| state.infixes.borrow().get(name).copied())
            .filter(|status| status.infix)
    }

    pub fn set_static_value(&self, name: impl ToString, ty: Type, status: IdentifierStatus) {
        let name = name.to_string();
        self.note_declared(&name);
        self.static_basis.borrow_mut().values.insert(name, (ty, status));
    }

    pub fn set_static_value_at(
        &self,
        name: impl ToString,
        ty: Type,
        status: IdentifierStatus,
        at_id: usize,
    ) -> Result<(), Error> {
        self.node_at(at_id)?.set_static_value(name, ty, status);
        Ok(())
    }

    pub fn set_dynamic_value(&self, name: impl ToString, value: Value, status: IdentifierStatus) {
        let name = name.to_string();
        self.note_declared(&name);
        self.dynamic_basis.borrow_mut().values.insert(name, (value, status));
    }

    pub fn set_dynamic_value_at(
        &self,
        name: impl ToString,
        value: Value,
        status: IdentifierStatus,
        at_id: usize,
    ) -> Result<(), Error> {
        self.node_at(at_id)?.set_dynamic_value(name, value, status);
        Ok(())
    }

    pub fn set_static_type(&self, name: impl ToString, information: TypeInformation) {
        self.static_basis
            .borrow_mut()
            .types
            .insert(name.to_string(), information);
    }

    pub fn set_static_type_at(
        &self,
        name: impl ToString,
        information: TypeInformation,
        at_id: usize,
    ) -> Result<(), Error> {
        self.node_at(at_id)?.set_static_type(name, information);
        Ok(())
    }

    pub fn set_dynamic_type(&self, name: impl ToString, constructors: Vec<String>) {
        self.dynamic_basis
            .borrow_mut()
            .types
            .insert(name.to_string(), constructors);
    }

    pub fn set_dynamic_type_at(
        &self,
        name: impl ToString,
        constructors: Vec<String>,
        at_id: usize,
    ) -> Result<(), Error> {
        self.node_at(at_id)?.set_dynamic_type(name, constructors);
        Ok(())
    }

    pub fn set_infix(&self, name: impl ToString, status: InfixStatus) {
        self.infixes.borrow_mut().insert(name.to_string(), status);
    }

    pub fn set_infix_at(&self, name: impl ToString, status: InfixStatus, at_id: usize) -> Result<(), Error> {
        self.node_at(at_id)?.set_infix(name, status);
        Ok(())
    }

    fn note_declared(&self, name: &str) {
        let mut declared = self.declared.borrow_mut();
        if let Some(index) = declared.iter().position(|known| known == name) {
            declared.remove(index);
        }
        declared.push(name.to_string());
    }

    /// Current counter for `name`, 0 if it was never bumped.
    pub fn value_identifier_id(&self, name: &str) -> usize {
        self.ancestors()
            .find_map(|state| state.value_identifier_ids.borrow().get(name).copied())
            .unwrap_or(0)
    }

    /// Return the current counter for `name` and store its successor at the
    /// node with id `at_id`.
    pub fn increment_value_identifier_id_at(&self, name: &str, at_id: usize) -> Result<usize, Error> {
        let current = self.value_identifier_id(name);
        self.node_at(at_id)?
            .value_identifier_ids
            .borrow_mut()
            .insert(name.to_string(), current + 1);
        Ok(current)
    }

    /// Allocate the generation of a freshly declared constructor or exception.
    ///
    /// Counters live at the root so that every declaration of a name, in any
    /// scope and on any call, draws a distinct generation.
    pub fn next_generation(&self, name: &str) -> usize {
        let current = self.value_identifier_id(name);
        self.root_node()
            .value_identifier_ids
            .borrow_mut()
            .insert(name.to_string(), current + 1);
        current
    }

    pub fn set_value_identifier_id(&self, name: impl ToString, id: usize) {
        self.value_identifier_ids
            .borrow_mut()
            .insert(name.to_string(), id);
    }

    /// Value identifiers bound in nodes with id at least `id_limit`, outermost
    /// first, without duplicates.
    pub fn declared_names(&self, id_limit: usize) -> Vec<String> {
        let nodes: Vec<&State> = self.visible(id_limit).collect();
        let mut names: Vec<String> = vec![];
        for state in nodes.into_iter().rev() {
            for name in state.declared.borrow().iter() {
                if let Some(index) = names.iter().position(|known| known == name) {
                    names.remove(index);
                }
                names.push(name.clone());
            }
        }
        names
    }

    /// Collect the bindings of every node from `self` up to, but excluding,
    /// `ancestor`. Inner bindings shadow outer ones.
    pub fn bindings_since(&self, ancestor: &State) -> Result<Bindings, Error> {
        let mut nodes = vec![];
        let mut current = Some(self);
        loop {
            match current {
                Some(state) if std::ptr::eq(state, ancestor) => break,
                Some(state) => {
                    nodes.push(state);
                    current = state.parent.as_deref();
                }
                None => {
                    return Err(Error::internal(format!(
                        "state {} is not an ancestor of state {}",
                        ancestor.id, self.id
                    )))
                }
            }
        }

        let mut bindings = Bindings::default();
        for state in nodes.into_iter().rev() {
            let static_basis = state.static_basis.borrow();
            for (name, binding) in &static_basis.values {
                bindings.static_basis.values.shift_remove(name);
                bindings.static_basis.values.insert(name.clone(), binding.clone());
            }
            for (name, information) in &static_basis.types {
                bindings.static_basis.types.insert(name.clone(), information.clone());
            }
            let dynamic_basis = state.dynamic_basis.borrow();
            for (name, binding) in &dynamic_basis.values {
                bindings.dynamic_basis.values.shift_remove(name);
                bindings.dynamic_basis.values.insert(name.clone(), binding.clone());
            }
            for (name, constructors) in &dynamic_basis.types {
                bindings.dynamic_basis.types.insert(name.clone(), constructors.clone());
            }
            for (name, status) in state.infixes.borrow().iter() {
                bindings.infixes.insert(name.clone(), *status);
            }
        }
        Ok(bindings)
    }

    /// Write previously collected bindings into this node.
    pub fn install(&self, bindings: Bindings) {
        for (name, (ty, status)) in bindings.static_basis.values {
            self.set_static_value(name, ty, status);
        }
        for (name, information) in bindings.static_basis.types {
            self.set_static_type(name, information);
        }
        for (name, (value, status)) in bindings.dynamic_basis.values {
            self.set_dynamic_value(name, value, status);
        }
        for (name, constructors) in bindings.dynamic_basis.types {
            self.set_dynamic_type(name, constructors);
        }
        for (name, status) in bindings.infixes {
            self.set_infix(name, status);
        }
    }

    /// Local static values of this node, in binding order.
    pub fn local_static_values(&self) -> Vec<(String, Type, IdentifierStatus)> {
        self.static_basis
            .borrow()
            .values
            .iter()
            .map(|(name, (ty, status))| (name.clone(), ty.clone(), *status))
            .collect()
    }

    // memory

    pub fn allocate(&self, value: Value) -> usize {
        self.session.memory.borrow_mut().allocate(vec![value])
    }

    pub fn allocate_block(&self, values: Vec<Value>) -> usize {
        self.session.memory.borrow_mut().allocate(values)
    }

    pub fn cell(&self, address: usize) -> Option<Value> {
        self.session.memory.borrow().get(address).cloned()
    }

    pub fn set_cell(&self, address: usize, value: Value) {
        self.session.memory.borrow_mut().set(address, value);
    }

    // type variables

    pub fn fresh_type_variable(&self, equality: bool) -> Type {
        let mut variables = self.session.type_variables.borrow_mut();
        let id = variables.next;
        variables.next += 1;
        let prefix = if equality { "''" } else { "'" };
        Type::Variable(format!("{}t{}", prefix, id))
    }

    pub fn type_variable_binding(&self, name: &str) -> Option<Type> {
        self.session
            .type_variables
            .borrow()
            .bindings
            .get(name)
            .cloned()
    }

    pub fn bind_type_variable(&self, name: impl ToString, ty: Type) {
        let name = name.to_string();
        let mut variables = self.session.type_variables.borrow_mut();
        let previous = variables.bindings.insert(name.clone(), ty);
        variables.trail.push(Undo::Binding(name, previous));
    }

    pub fn type_variable_constraint(&self, name: &str) -> Option<Constraint> {
        self.session
            .type_variables
            .borrow()
            .constraints
            .get(name)
            .cloned()
    }

    pub fn set_type_variable_constraint(&self, name: impl ToString, constraint: Constraint) {
        let name = name.to_string();
        let mut variables = self.session.type_variables.borrow_mut();
        let previous = variables.constraints.insert(name.clone(), constraint);
        variables.trail.push(Undo::Constraint(name, previous));
    }

    pub fn take_type_variable_constraint(&self, name: &str) -> Option<Constraint> {
        let mut variables = self.session.type_variables.borrow_mut();
        let removed = variables.constraints.remove(name);
        if let Some(constraint) = &removed {
            variables
                .trail
                .push(Undo::Constraint(name.to_string(), Some(constraint.clone())));
        }
        removed
    }

    /// Mark the current type-variable substitution; see
    /// [`State::rollback_type_variables`].
    pub fn type_variable_checkpoint(&self) -> usize {
        self.session.type_variables.borrow().trail.len()
    }

    /// Undo every binding and constraint change made since `checkpoint`.
    /// Fresh variable names are not reused.
    pub fn rollback_type_variables(&self, checkpoint: usize) {
        let mut variables = self.session.type_variables.borrow_mut();
        while variables.trail.len() > checkpoint {
            let Some(undo) = variables.trail.pop() else {
                break;
            };
            match undo {
                Undo::Binding(name, Some(ty)) => {
                    variables.bindings.insert(name, ty);
                }
                Undo::Binding(name, None) => {
                    variables.bindings.remove(&name);
                }
                Undo::Constraint(name, Some(constraint)) => {
                    variables.constraints.insert(name, constraint);
                }
                Undo::Constraint(name, None) => {
                    variables.constraints.remove(&name);
                }
            }
        }
    }

    /// Keep every change made since `checkpoint`.
    pub fn commit_type_variables(&self, checkpoint: usize) {
        self.session.type_variables.borrow_mut().trail.truncate(checkpoint);
    }

    /// Unbound variables that still carry a constraint.
    pub fn constrained_type_variables(&self) -> Vec<(String, Constraint)> {
        let variables = self.session.type_variables.borrow();
        let mut constrained: Vec<(String, Constraint)> = variables
            .constraints
            .iter()
            .filter(|(name, _)| !variables.bindings.contains_key(*name))
            .map(|(name, constraint)| (name.clone(), constraint.clone()))
            .collect();
        constrained.sort_by(|(left, _), (right, _)| left.cmp(right));
        constrained
    }

    // warnings and output

    pub fn add_warning(&self, warning: Warning) {
        log::warn!("{}", warning);
        self.session.warnings.borrow_mut().push(warning);
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.session.warnings.borrow().clone()
    }

    pub fn warning_count(&self) -> usize {
        self.session.warnings.borrow().len()
    }

    pub fn truncate_warnings(&self, length: usize) {
        self.session.warnings.borrow_mut().truncate(length);
    }

    pub fn print(&self, text: &str) {
        self.session.output.borrow_mut().push_str(text);
    }

    /// Drain everything printed so far.
    pub fn take_output(&self) -> String {
        std::mem::take(&mut *self.session.output.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_identifiers() {
        assert!(!allows_rebind("true"));
        assert!(!allows_rebind("::"));
        assert!(allows_rebind("SOME"));
        assert!(allows_rebind("Match"));
    }

    #[test]
    fn test_rollback_restores_type_variables() {
        let root = State::root();
        root.bind_type_variable("'kept", Type::int());
        let checkpoint = root.type_variable_checkpoint();

        root.bind_type_variable("'fresh", Type::bool());
        root.bind_type_variable("'kept", Type::string());
        root.set_type_variable_constraint("'open", Constraint::Domain(vec![Type::int(), Type::real()]));
        root.rollback_type_variables(checkpoint);

        assert_eq!(root.type_variable_binding("'kept"), Some(Type::int()));
        assert_eq!(root.type_variable_binding("'fresh"), None);
        assert_eq!(root.type_variable_constraint("'open"), None);
    }

    #[test]
    fn test_commit_keeps_type_variables() {
        let root = State::root();
        let checkpoint = root.type_variable_checkpoint();
        root.bind_type_variable("'a", Type::int());
        root.commit_type_variables(checkpoint);
        root.rollback_type_variables(checkpoint);
        assert_eq!(root.type_variable_binding("'a"), Some(Type::int()));
    }

    #[test]
    fn test_lookup_falls_through_to_parent() {
        let root = State::root();
        root.set_dynamic_value("x", Value::Int(1), IdentifierStatus::Variable);
        let child = root.child();
        let (value, status) = child.lookup_dynamic_value("x", 0).unwrap();
        assert!(matches!(value, Value::Int(1)));
        assert_eq!(status, IdentifierStatus::Variable);
    }

    #[test]
    fn test_child_shadows_parent() {
        let root = State::root();
        root.set_static_value("x", Type::int(), IdentifierStatus::Variable);
        let child = root.child();
        child.set_static_value("x", Type::bool(), IdentifierStatus::Variable);
        assert_eq!(child.lookup_static_value("x", 0).unwrap().0, Type::bool());
        assert_eq!(root.lookup_static_value("x", 0).unwrap().0, Type::int());
    }

    #[test]
    fn test_id_limit_stops_the_walk() {
        let root = State::root();
        root.set_static_value("x", Type::int(), IdentifierStatus::Variable);
        let child = root.child();
        child.set_static_value("y", Type::int(), IdentifierStatus::Variable);
        assert!(child.lookup_static_value("x", 1).is_none());
        assert!(child.lookup_static_value("y", 1).is_some());
    }

    #[test]
    fn test_set_at_targets_ancestor() {
        let root = State::root();
        let child = root.child();
        let grandchild = child.child();
        grandchild
            .set_dynamic_value_at("z", Value::Int(3), IdentifierStatus::Variable, 1)
            .unwrap();
        assert!(child.lookup_dynamic_value("z", 0).is_some());
        assert!(root.lookup_dynamic_value("z", 0).is_none());
    }

    #[test]
    fn test_set_at_unknown_id_is_internal_error() {
        let root = State::root();
        let child = root.child();
        let result = child.set_infix_at("+", InfixStatus::left(6), 7);
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn test_memory_is_shared_across_the_chain() {
        let root = State::root();
        let child = root.child();
        let address = child.allocate(Value::Int(5));
        assert!(matches!(root.cell(address), Some(Value::Int(5))));
        let second = root.allocate(Value::Int(6));
        assert_ne!(address, second);
    }

    #[test]
    fn test_generations_are_allocated_at_the_root() {
        let root = State::root();
        let nested = root.child().child();
        assert_eq!(nested.next_generation("E"), 0);
        assert_eq!(root.child().next_generation("E"), 1);
        assert_eq!(root.value_identifier_id("E"), 2);
    }

    #[test]
    fn test_bindings_since_collects_run() {
        let root = State::root();
        let first = root.child();
        first.set_static_value("a", Type::int(), IdentifierStatus::Variable);
        let second = first.child();
        second.set_static_value("b", Type::bool(), IdentifierStatus::Variable);
        second.set_static_value("a", Type::string(), IdentifierStatus::Variable);

        let bindings = second.bindings_since(&root).unwrap();
        let names: Vec<&String> = bindings.static_basis.values.keys().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(bindings.static_basis.values["a"].0, Type::string());
    }

    #[test]
    fn test_declared_names_respect_limit() {
        let root = State::root();
        root.set_dynamic_value("old", Value::Int(0), IdentifierStatus::Variable);
        let child = root.child();
        child.set_dynamic_value("new", Value::Int(1), IdentifierStatus::Variable);
        assert_eq!(child.declared_names(1), vec!["new".to_string()]);
    }

    #[test]
    fn test_nonfix_hides_infix() {
        let root = State::root();
        root.set_infix("+", InfixStatus::left(6));
        let child = root.child();
        child.set_infix("+", InfixStatus::nonfix());
        assert!(child.lookup_infix("+").is_none());
        assert_eq!(root.lookup_infix("+").map(|status| status.precedence), Some(6));
    }
}
