// Environment for variable bindings and scope management

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{Symbol, BUILTIN_PACKAGE};
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::values::Value;

/// A handle on one frame of the scope chain. Cloning the handle shares the
/// frame, so a closure and the block that created it see the same bindings.
///
/// Closures stored in the frame they capture (`defun` at top level, `labels`)
/// form reference cycles; those frames are never freed.
#[derive(Clone)]
pub struct Environment(Rc<Frame>);

struct Frame {
    bindings: RefCell<HashMap<Symbol, Binding>>,
    parent: Option<Environment>,
}

#[derive(Clone)]
struct Binding {
    value: Value,
    constant: bool,
}

impl Environment {
    /// Creates a new, empty root environment.
    pub fn new() -> Self {
        Environment(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// Creates an empty child frame chained onto `parent`. Nothing is copied.
    pub fn with_parent(parent: &Environment) -> Self {
        Environment(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        }))
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.0.parent.as_ref()
    }

    /// The outermost frame of the chain.
    pub fn root(&self) -> Environment {
        let mut env = self;
        while let Some(parent) = env.parent() {
            env = parent;
        }
        env.clone()
    }

    /// Looks up a symbol innermost-first. `lisp:name` falls back to the
    /// unqualified root binding.
    pub fn lookup(&self, name: &Symbol) -> Option<Value> {
        let mut env = Some(self);
        while let Some(frame) = env {
            if let Some(binding) = frame.0.bindings.borrow().get(name) {
                return Some(binding.value.clone());
            }
            env = frame.parent();
        }
        match name.package() {
            Some((BUILTIN_PACKAGE, _)) => self.root().lookup_local(&name.unqualified()),
            _ => None,
        }
    }

    /// Like `lookup` but an unbound symbol is an error.
    pub fn get(&self, name: &Symbol) -> RuntimeResult<Value> {
        self.lookup(name)
            .ok_or_else(|| RuntimeError::UnboundSymbol(name.clone()))
    }

    /// Looks in this frame only.
    pub fn lookup_local(&self, name: &Symbol) -> Option<Value> {
        self.0
            .bindings
            .borrow()
            .get(name)
            .map(|binding| binding.value.clone())
    }

    /// Defines or overwrites a binding in this frame.
    pub fn define(&self, name: &Symbol, value: Value) {
        self.0.bindings.borrow_mut().insert(
            name.clone(),
            Binding {
                value,
                constant: false,
            },
        );
    }

    /// Like `define`, but fails if this frame holds `name` as a constant.
    pub fn define_checked(&self, function: &str, name: &Symbol, value: Value) -> RuntimeResult<()> {
        if self.is_constant(name) {
            return Err(RuntimeError::RebindConstant {
                function: function.to_string(),
                symbol: name.clone(),
            });
        }
        self.define(name, value);
        Ok(())
    }

    /// Defines a binding that `set` refuses to overwrite.
    pub fn define_constant(&self, name: &Symbol, value: Value) {
        self.0.bindings.borrow_mut().insert(
            name.clone(),
            Binding {
                value,
                constant: true,
            },
        );
    }

    pub fn is_constant(&self, name: &Symbol) -> bool {
        self.0
            .bindings
            .borrow()
            .get(name)
            .map(|binding| binding.constant)
            .unwrap_or(false)
    }

    /// Assigns a binding in the root frame.
    pub fn set(&self, name: &Symbol, value: Value) -> RuntimeResult<()> {
        let root = self.root();
        let name = name.unqualified();
        if root.is_constant(&name) {
            return Err(RuntimeError::RebindConstant {
                function: "lisp:set".to_string(),
                symbol: name,
            });
        }
        root.define(&name, value);
        Ok(())
    }

    pub fn symbol_names(&self) -> Vec<String> {
        let mut names = self
            .0
            .bindings
            .borrow()
            .keys()
            .map(|s| s.0.clone())
            .collect::<Vec<_>>();

        if let Some(parent) = self.parent() {
            names.append(&mut parent.symbol_names());
        }

        names.sort();
        names.dedup();
        names
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut env = self;
        while let Some(parent) = env.parent() {
            depth += 1;
            env = parent;
        }
        depth
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

// Frames hold closures that hold frames.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.0.bindings.borrow().len())
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_innermost_first() {
        let root = Environment::new();
        root.define(&Symbol::new("x"), Value::Integer(1));
        let child = Environment::with_parent(&root);
        assert_eq!(child.lookup(&Symbol::new("x")), Some(Value::Integer(1)));
        child.define(&Symbol::new("x"), Value::Integer(2));
        assert_eq!(child.lookup(&Symbol::new("x")), Some(Value::Integer(2)));
        assert_eq!(root.lookup(&Symbol::new("x")), Some(Value::Integer(1)));
    }

    #[test]
    fn child_frames_see_later_parent_changes() {
        let root = Environment::new();
        let child = Environment::with_parent(&root);
        assert!(child.lookup(&Symbol::new("y")).is_none());
        root.define(&Symbol::new("y"), Value::Integer(7));
        assert_eq!(child.lookup(&Symbol::new("y")), Some(Value::Integer(7)));
    }

    #[test]
    fn set_targets_root_and_respects_constants() {
        let root = Environment::new();
        root.define_constant(&Symbol::new("true"), Value::Boolean(true));
        let child = Environment::with_parent(&root);
        child.set(&Symbol::new("x"), Value::Integer(1)).unwrap();
        assert!(child.lookup_local(&Symbol::new("x")).is_none());
        assert_eq!(root.lookup_local(&Symbol::new("x")), Some(Value::Integer(1)));

        let err = child
            .set(&Symbol::new("true"), Value::Integer(2))
            .unwrap_err();
        assert_eq!(err.kind(), Symbol::new("RebindConstantError"));
        assert_eq!(err.message(), "cannot rebind constant: true");
    }

    #[test]
    fn qualified_names_fall_back_to_root() {
        let root = Environment::new();
        root.define(&Symbol::new("car"), Value::Integer(1));
        let child = Environment::with_parent(&root);
        assert_eq!(child.lookup(&Symbol::new("lisp:car")), Some(Value::Integer(1)));
        assert!(child.lookup(&Symbol::new("other:car")).is_none());
        assert!(matches!(
            child.get(&Symbol::new("nope")),
            Err(RuntimeError::UnboundSymbol(_))
        ));
    }
}
