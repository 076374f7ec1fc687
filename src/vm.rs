use crate::code::{read_uint16, read_uint8, Opcode};
use crate::compiler::Bytecode;
use crate::frame::Frame;
use crate::object;
use crate::object::{objects_equal, Builtin, Closure, HashPair, Object, BUILTINS};
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::convert::TryFrom;
use std::rc::Rc;

pub const STACK_SIZE: usize = 2048;
pub const GLOBALS_SIZE: usize = 65535;
pub const MAX_FRAMES: usize = 1024;

pub struct VM<'a> {
    constants: &'a [Object],
    // sp points at the next free slot; the top of stack is stack[sp - 1]
    stack: Vec<Rc<Object>>,
    sp: usize,
    globals: Vec<Rc<Object>>,
    frames: Vec<Frame>,
}

impl<'a> VM<'a> {
    pub fn new(bytecode: &'a Bytecode) -> Self {
        Self::new_with_globals_store(bytecode, new_globals_store())
    }
    pub fn new_with_globals_store(bytecode: &'a Bytecode, globals: Vec<Rc<Object>>) -> Self {
        let main_function = Rc::new(object::CompiledFunctionObject::new(
            bytecode.instructions.clone(),
            0,
            0,
        ));
        let main_closure = Rc::new(Closure::new(main_function, vec![]));
        let mut frames = Vec::with_capacity(MAX_FRAMES);
        frames.push(Frame::new(main_closure, 0));
        Self {
            constants: &bytecode.constants,
            stack: vec![Rc::new(Object::Null); STACK_SIZE],
            sp: 0,
            globals,
            frames,
        }
    }
    pub fn into_globals(self) -> Vec<Rc<Object>> {
        self.globals
    }
    // Expression statements end with OpPop, so the program's final value
    // sits in the slot just past the top of the stack.
    pub fn last_popped_stack_elem(&self) -> Rc<Object> {
        Rc::clone(&self.stack[self.sp])
    }
    fn current_frame(&self) -> &Frame {
        self.frames.last().expect("at least the main frame exists")
    }
    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames
            .last_mut()
            .expect("at least the main frame exists")
    }
    fn push_frame(&mut self, frame: Frame) -> Result<()> {
        if self.frames.len() >= MAX_FRAMES {
            bail!("stack overflow");
        }
        self.frames.push(frame);
        Ok(())
    }
    fn pop_frame(&mut self) -> Frame {
        self.frames.pop().expect("popped more frames than were pushed")
    }
    fn push(&mut self, obj: Rc<Object>) -> Result<()> {
        if self.sp >= STACK_SIZE {
            bail!("stack overflow");
        }
        self.stack[self.sp] = obj;
        self.sp += 1;
        Ok(())
    }
    fn pop(&mut self) -> Rc<Object> {
        let obj = Rc::clone(&self.stack[self.sp - 1]);
        self.sp -= 1;
        obj
    }
    pub fn run(&mut self) -> Result<()> {
        use Opcode::*;
        while self.current_frame().ip() < self.current_frame().instructions().len() {
            let ip = self.current_frame().ip();
            let op_byte = self.current_frame().instructions()[ip];
            let op = match Opcode::try_from(op_byte) {
                Ok(op) => op,
                Err(_) => bail!("unknown opcode: {}", op_byte),
            };
            match op {
                OpConstant => {
                    let const_index =
                        read_uint16(self.current_frame().instructions().rest(ip + 1)) as usize;
                    self.current_frame_mut().update_ip(ip + 3);
                    let obj = Rc::new(self.constants[const_index].clone());
                    self.push(obj)?;
                }
                OpPop => {
                    self.current_frame_mut().update_ip(ip + 1);
                    self.pop();
                }
                OpAdd | OpSub | OpMul | OpDiv => {
                    self.current_frame_mut().update_ip(ip + 1);
                    self.execute_binary_operation(op)?;
                }
                OpTrue => {
                    self.current_frame_mut().update_ip(ip + 1);
                    self.push(Rc::new(Object::Boolean(true)))?;
                }
                OpFalse => {
                    self.current_frame_mut().update_ip(ip + 1);
                    self.push(Rc::new(Object::Boolean(false)))?;
                }
                OpNull => {
                    self.current_frame_mut().update_ip(ip + 1);
                    self.push(Rc::new(Object::Null))?;
                }
                OpEqual | OpNotEqual | OpGreaterThan => {
                    self.current_frame_mut().update_ip(ip + 1);
                    self.execute_comparison(op)?;
                }
                OpBang => {
                    self.current_frame_mut().update_ip(ip + 1);
                    let operand = self.pop();
                    self.push(Rc::new(Object::Boolean(!operand.is_truthy())))?;
                }
                OpMinus => {
                    self.current_frame_mut().update_ip(ip + 1);
                    let operand = self.pop();
                    match &*operand {
                        Object::Integer(value) => {
                            self.push(Rc::new(Object::Integer(-value)))?;
                        }
                        obj => {
                            bail!("unsupported operator: -{}", obj.r#type());
                        }
                    }
                }
                OpJump => {
                    let pos = read_uint16(self.current_frame().instructions().rest(ip + 1));
                    self.current_frame_mut().update_ip(pos as usize);
                }
                OpJumpNotTruthy => {
                    let pos = read_uint16(self.current_frame().instructions().rest(ip + 1));
                    self.current_frame_mut().update_ip(ip + 3);
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.current_frame_mut().update_ip(pos as usize);
                    }
                }
                OpSetGlobal => {
                    let index =
                        read_uint16(self.current_frame().instructions().rest(ip + 1)) as usize;
                    self.current_frame_mut().update_ip(ip + 3);
                    self.globals[index] = self.pop();
                }
                OpGetGlobal => {
                    let index =
                        read_uint16(self.current_frame().instructions().rest(ip + 1)) as usize;
                    self.current_frame_mut().update_ip(ip + 3);
                    let obj = Rc::clone(&self.globals[index]);
                    self.push(obj)?;
                }
                OpArray => {
                    let len =
                        read_uint16(self.current_frame().instructions().rest(ip + 1)) as usize;
                    self.current_frame_mut().update_ip(ip + 3);
                    let elements = self.stack[self.sp - len..self.sp].to_vec();
                    self.sp -= len;
                    self.push(Rc::new(Object::ArrayObject(elements)))?;
                }
                OpHash => {
                    let len =
                        read_uint16(self.current_frame().instructions().rest(ip + 1)) as usize;
                    self.current_frame_mut().update_ip(ip + 3);
                    let hash = self.build_hash(self.sp - len, self.sp)?;
                    self.sp -= len;
                    self.push(hash)?;
                }
                OpIndex => {
                    self.current_frame_mut().update_ip(ip + 1);
                    let index = self.pop();
                    let left = self.pop();
                    self.execute_index_expression(left, index)?;
                }
                OpCall => {
                    let num_args =
                        read_uint8(self.current_frame().instructions().rest(ip + 1)) as usize;
                    self.current_frame_mut().update_ip(ip + 2);
                    self.execute_call(num_args)?;
                }
                OpReturnValue => {
                    let return_value = self.pop();
                    let frame = self.pop_frame();
                    if self.frames.is_empty() {
                        // `return` at the top level ends the program with
                        // that value as the final stack element
                        self.sp = frame.base_pointer();
                        self.push(return_value)?;
                        self.pop();
                        return Ok(());
                    }
                    self.sp = frame.base_pointer() - 1;
                    self.push(return_value)?;
                }
                OpReturn => {
                    let frame = self.pop_frame();
                    self.sp = frame.base_pointer() - 1;
                    self.push(Rc::new(Object::Null))?;
                }
                OpSetLocal => {
                    let index =
                        read_uint8(self.current_frame().instructions().rest(ip + 1)) as usize;
                    self.current_frame_mut().update_ip(ip + 2);
                    let base_pointer = self.current_frame().base_pointer();
                    self.stack[base_pointer + index] = self.pop();
                }
                OpGetLocal => {
                    let index =
                        read_uint8(self.current_frame().instructions().rest(ip + 1)) as usize;
                    self.current_frame_mut().update_ip(ip + 2);
                    let base_pointer = self.current_frame().base_pointer();
                    let obj = Rc::clone(&self.stack[base_pointer + index]);
                    self.push(obj)?;
                }
                OpGetBuiltin => {
                    let index =
                        read_uint8(self.current_frame().instructions().rest(ip + 1)) as usize;
                    self.current_frame_mut().update_ip(ip + 2);
                    self.push(Rc::new(Object::BuiltinObject(&BUILTINS[index])))?;
                }
                OpClosure => {
                    let const_index =
                        read_uint16(self.current_frame().instructions().rest(ip + 1)) as usize;
                    let free_count =
                        read_uint8(self.current_frame().instructions().rest(ip + 3)) as usize;
                    self.current_frame_mut().update_ip(ip + 4);
                    self.push_closure(const_index, free_count)?;
                }
                OpGetFree => {
                    let index =
                        read_uint8(self.current_frame().instructions().rest(ip + 1)) as usize;
                    self.current_frame_mut().update_ip(ip + 2);
                    let obj = Rc::clone(&self.current_frame().closure().free()[index]);
                    self.push(obj)?;
                }
                OpCurrentClosure => {
                    self.current_frame_mut().update_ip(ip + 1);
                    let closure = Rc::clone(self.current_frame().closure());
                    self.push(Rc::new(Object::ClosureObject(closure)))?;
                }
            }
        }
        Ok(())
    }
    fn execute_binary_operation(&mut self, op: Opcode) -> Result<()> {
        let right = self.pop();
        let left = self.pop();
        match (&*left, &*right) {
            (Object::Integer(left), Object::Integer(right)) => {
                self.execute_binary_integer_operation(op, *left, *right)?;
            }
            (Object::MonkeyString(left), Object::MonkeyString(right)) => {
                if op != Opcode::OpAdd {
                    bail!("unknown string operator: {:?}", op);
                }
                let concatenated = format!("{}{}", left, right);
                self.push(Rc::new(Object::MonkeyString(concatenated)))?;
            }
            _ => {
                bail!(
                    "unsupported types for binary operation: {} {}",
                    left.r#type(),
                    right.r#type()
                );
            }
        };
        Ok(())
    }
    fn execute_binary_integer_operation(
        &mut self,
        op: Opcode,
        left: i64,
        right: i64,
    ) -> Result<()> {
        use Opcode::*;
        let result = match op {
            OpAdd => left + right,
            OpSub => left - right,
            OpMul => left * right,
            OpDiv => {
                if right == 0 {
                    bail!("division by zero");
                }
                left / right
            }
            _ => {
                bail!("unknown integer operator: {:?}", op)
            }
        };
        self.push(Rc::new(Object::Integer(result)))?;
        Ok(())
    }
    fn execute_comparison(&mut self, op: Opcode) -> Result<()> {
        use Opcode::*;
        let right = self.pop();
        let left = self.pop();
        if let (Object::Integer(left), Object::Integer(right)) = (&*left, &*right) {
            let result = match op {
                OpEqual => left == right,
                OpNotEqual => left != right,
                OpGreaterThan => left > right,
                _ => {
                    bail!("unknown integer operator: {:?}", op)
                }
            };
            return self.push(Rc::new(Object::Boolean(result)));
        }
        match op {
            OpEqual => self.push(Rc::new(Object::Boolean(objects_equal(&left, &right)))),
            OpNotEqual => self.push(Rc::new(Object::Boolean(!objects_equal(&left, &right)))),
            _ => {
                bail!(
                    "unknown operator: {:?} ({} {})",
                    op,
                    left.r#type(),
                    right.r#type()
                )
            }
        }
    }
    fn build_hash(&self, start_index: usize, end_index: usize) -> Result<Rc<Object>> {
        let mut pairs = HashMap::new();
        let mut i = start_index;
        while i < end_index {
            let key = Rc::clone(&self.stack[i]);
            let value = Rc::clone(&self.stack[i + 1]);
            let hash_key = key.hash_key()?;
            pairs.insert(hash_key, HashPair { key, value });
            i += 2;
        }
        Ok(Rc::new(Object::HashObject(pairs)))
    }
    fn execute_index_expression(&mut self, left: Rc<Object>, index: Rc<Object>) -> Result<()> {
        match (&*left, &*index) {
            (Object::ArrayObject(elements), Object::Integer(i)) => {
                if *i < 0 || *i as usize >= elements.len() {
                    self.push(Rc::new(Object::Null))
                } else {
                    self.push(Rc::clone(&elements[*i as usize]))
                }
            }
            (Object::HashObject(pairs), _) => {
                let hash_key = index.hash_key()?;
                match pairs.get(&hash_key) {
                    Some(pair) => self.push(Rc::clone(&pair.value)),
                    None => self.push(Rc::new(Object::Null)),
                }
            }
            _ => {
                bail!("index operator not supported: {}", left.r#type())
            }
        }
    }
    fn execute_call(&mut self, num_args: usize) -> Result<()> {
        let callee = Rc::clone(&self.stack[self.sp - 1 - num_args]);
        match &*callee {
            Object::ClosureObject(closure) => self.call_closure(Rc::clone(closure), num_args),
            Object::BuiltinObject(builtin) => self.call_builtin(builtin, num_args),
            obj => bail!("calling {} is not supported", obj.r#type()),
        }
    }
    fn call_closure(&mut self, closure: Rc<Closure>, num_args: usize) -> Result<()> {
        let function = closure.function();
        if num_args != function.num_parameters() {
            bail!(
                "wrong number of arguments: want={}, got={}",
                function.num_parameters(),
                num_args
            );
        }
        let num_locals = function.num_locals();
        let base_pointer = self.sp - num_args;
        if base_pointer + num_locals > STACK_SIZE {
            bail!("stack overflow");
        }
        self.push_frame(Frame::new(closure, base_pointer))?;
        // arguments already sit in the first local slots; reserve the rest
        self.sp = base_pointer + num_locals;
        Ok(())
    }
    fn push_closure(&mut self, const_index: usize, free_count: usize) -> Result<()> {
        let function = match &self.constants[const_index] {
            Object::CompiledFunctionObject(function) => Rc::clone(function),
            obj => bail!("not a function: {}", obj.r#type()),
        };
        let free = self.stack[self.sp - free_count..self.sp].to_vec();
        self.sp -= free_count;
        let closure = Rc::new(Closure::new(function, free));
        self.push(Rc::new(Object::ClosureObject(closure)))
    }
    fn call_builtin(&mut self, builtin: &Builtin, num_args: usize) -> Result<()> {
        let args = self.stack[self.sp - num_args..self.sp].to_vec();
        let result = builtin.apply(&args);
        self.sp = self.sp - num_args - 1;
        self.push(result)
    }
}

pub fn new_globals_store() -> Vec<Rc<Object>> {
    vec![Rc::new(Object::Null); GLOBALS_SIZE]
}
