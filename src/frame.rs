use crate::code::Instructions;
use crate::object::Closure;
use std::rc::Rc;

/// One function activation: the executing closure, an instruction pointer
/// into its bytecode, and the stack offset where its locals begin.
#[derive(Clone)]
pub struct Frame {
    closure: Rc<Closure>,
    ip: usize,
    base_pointer: usize,
}

impl Frame {
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Frame {
            closure,
            ip: 0,
            base_pointer,
        }
    }
    pub fn closure(&self) -> &Rc<Closure> {
        &self.closure
    }
    pub fn instructions(&self) -> &Instructions {
        self.closure.function().instructions()
    }
    pub fn ip(&self) -> usize {
        self.ip
    }
    pub fn update_ip(&mut self, ip: usize) {
        self.ip = ip;
    }
    pub fn base_pointer(&self) -> usize {
        self.base_pointer
    }
}
