use crate::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Lexically nested name bindings for the tree-walking evaluator. `get`
/// walks outward through enclosing frames; `set` always writes the
/// innermost frame, so shadowing is implicit.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Rc<Object>>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            outer: None,
        }
    }
    pub fn new_enclosed(outer: Rc<RefCell<Environment>>) -> Self {
        Self {
            store: HashMap::new(),
            outer: Some(outer),
        }
    }
    pub fn get(&self, name: &str) -> Option<Rc<Object>> {
        if let Some(obj) = self.store.get(name) {
            return Some(Rc::clone(obj));
        }
        self.outer.as_ref().and_then(|outer| outer.borrow().get(name))
    }
    pub fn set(&mut self, name: &str, value: Rc<Object>) {
        self.store.insert(name.to_string(), value);
    }
}
