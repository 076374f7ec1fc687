use anyhow::{bail, Result};
use fnv::FnvHasher;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hasher;
use std::rc::Rc;

use crate::ast::Statement;
use crate::code::Instructions;
use crate::environment::Environment;

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Integer(i64),
    MonkeyString(String),
    Boolean(bool),
    ArrayObject(Vec<Rc<Object>>),
    HashObject(HashMap<HashKey, HashPair>),
    FunctionObject(Rc<Function>),
    CompiledFunctionObject(Rc<CompiledFunctionObject>),
    ClosureObject(Rc<Closure>),
    BuiltinObject(&'static Builtin),
    ReturnValue(Rc<Object>),
    ErrorObject(String),
    Null,
}

impl Object {
    pub fn r#type(&self) -> &'static str {
        use Object::*;
        match self {
            Integer(..) => "INTEGER",
            MonkeyString(..) => "STRING",
            Boolean(..) => "BOOLEAN",
            ArrayObject(..) => "ARRAY",
            HashObject(..) => "HASH",
            FunctionObject(..) => "FUNCTION",
            CompiledFunctionObject(..) => "COMPILED_FUNCTION",
            ClosureObject(..) => "CLOSURE",
            BuiltinObject(..) => "BUILTIN",
            ReturnValue(..) => "RETURN_VALUE",
            ErrorObject(..) => "ERROR",
            Null => "NULL",
        }
    }
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }
    pub fn is_error(&self) -> bool {
        matches!(self, Object::ErrorObject(..))
    }
    pub fn hash_key(&self) -> Result<HashKey> {
        let value = match self {
            Object::Integer(val) => *val as u64,
            Object::Boolean(val) => *val as u64,
            Object::MonkeyString(val) => {
                let mut hasher = FnvHasher::default();
                hasher.write(val.as_bytes());
                hasher.finish()
            }
            obj => {
                bail!("unusable as hash key: {}", obj.r#type());
            }
        };
        Ok(HashKey {
            kind: self.r#type(),
            value,
        })
    }
}

/// Equality as the language defines it: integers, strings, booleans and
/// null compare by value; everything else by reference identity.
pub fn objects_equal(left: &Rc<Object>, right: &Rc<Object>) -> bool {
    match (&**left, &**right) {
        (Object::Integer(l), Object::Integer(r)) => l == r,
        (Object::MonkeyString(l), Object::MonkeyString(r)) => l == r,
        (Object::Boolean(l), Object::Boolean(r)) => l == r,
        (Object::Null, Object::Null) => true,
        _ => Rc::ptr_eq(left, right),
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Object::*;
        match self {
            Integer(value) => write!(f, "{}", value),
            MonkeyString(value) => write!(f, "{}", value),
            Boolean(value) => write!(f, "{}", value),
            ArrayObject(elements) => {
                let elements: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            HashObject(pairs) => {
                let pairs: Vec<String> = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key, pair.value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            FunctionObject(function) => {
                write!(
                    f,
                    "fn({}) {{\n{}\n}}",
                    function.parameters.join(", "),
                    function.body
                )
            }
            CompiledFunctionObject(function) => {
                write!(f, "CompiledFunction[{:p}]", Rc::as_ptr(function))
            }
            ClosureObject(closure) => write!(f, "Closure[{:p}]", Rc::as_ptr(closure)),
            BuiltinObject(..) => write!(f, "builtin function"),
            ReturnValue(value) => write!(f, "{}", value),
            ErrorObject(message) => write!(f, "ERROR: {}", message),
            Null => write!(f, "null"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    kind: &'static str,
    value: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Rc<Object>,
    pub value: Rc<Object>,
}

/// A user function captured by the tree-walking evaluator. Compares and
/// debug-prints by identity so that captured environments (which may refer
/// back to the function itself) are never traversed.
#[derive(Clone)]
pub struct Function {
    parameters: Vec<String>,
    body: Statement,
    env: Rc<RefCell<Environment>>,
}

impl Function {
    pub fn new(parameters: Vec<String>, body: Statement, env: Rc<RefCell<Environment>>) -> Self {
        Self {
            parameters,
            body,
            env,
        }
    }
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
    pub fn body(&self) -> &Statement {
        &self.body
    }
    pub fn env(&self) -> &Rc<RefCell<Environment>> {
        &self.env
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Function({})", self.parameters.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunctionObject {
    instructions: Instructions,
    num_locals: usize,
    num_parameters: usize,
}

impl CompiledFunctionObject {
    pub fn new(instructions: Instructions, num_locals: usize, num_parameters: usize) -> Self {
        Self {
            instructions,
            num_locals,
            num_parameters,
        }
    }
    pub fn instructions(&self) -> &Instructions {
        &self.instructions
    }
    pub fn num_locals(&self) -> usize {
        self.num_locals
    }
    pub fn num_parameters(&self) -> usize {
        self.num_parameters
    }
}

/// A compiled function bundled with the values of its free variables,
/// captured when `OpClosure` executes.
#[derive(Debug, Clone)]
pub struct Closure {
    function: Rc<CompiledFunctionObject>,
    free: Vec<Rc<Object>>,
}

impl Closure {
    pub fn new(function: Rc<CompiledFunctionObject>, free: Vec<Rc<Object>>) -> Self {
        Self { function, free }
    }
    pub fn function(&self) -> &Rc<CompiledFunctionObject> {
        &self.function
    }
    pub fn free(&self) -> &[Rc<Object>] {
        &self.free
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

#[derive(Debug, PartialEq)]
pub struct Builtin {
    name: &'static str,
    func: fn(&[Rc<Object>]) -> Rc<Object>,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn apply(&self, args: &[Rc<Object>]) -> Rc<Object> {
        (self.func)(args)
    }
}

// Indices are baked into OpGetBuiltin operands; reorder only together with
// the compiler's builtin scope setup.
pub static BUILTINS: [Builtin; 6] = [
    Builtin {
        name: "len",
        func: builtin_len,
    },
    Builtin {
        name: "puts",
        func: builtin_puts,
    },
    Builtin {
        name: "first",
        func: builtin_first,
    },
    Builtin {
        name: "last",
        func: builtin_last,
    },
    Builtin {
        name: "rest",
        func: builtin_rest,
    },
    Builtin {
        name: "push",
        func: builtin_push,
    },
];

fn new_error(message: String) -> Rc<Object> {
    Rc::new(Object::ErrorObject(message))
}

fn builtin_len(args: &[Rc<Object>]) -> Rc<Object> {
    if args.len() != 1 {
        return new_error(format!(
            "wrong number of arguments. got={}, want=1",
            args.len()
        ));
    }
    match &*args[0] {
        Object::MonkeyString(value) => Rc::new(Object::Integer(value.len() as i64)),
        Object::ArrayObject(elements) => Rc::new(Object::Integer(elements.len() as i64)),
        obj => new_error(format!(
            "argument to `len` not supported, got {}",
            obj.r#type()
        )),
    }
}

fn builtin_puts(args: &[Rc<Object>]) -> Rc<Object> {
    for arg in args {
        println!("{}", arg);
    }
    Rc::new(Object::Null)
}

fn builtin_first(args: &[Rc<Object>]) -> Rc<Object> {
    if args.len() != 1 {
        return new_error(format!(
            "wrong number of arguments. got={}, want=1",
            args.len()
        ));
    }
    match &*args[0] {
        Object::ArrayObject(elements) => match elements.first() {
            Some(first) => Rc::clone(first),
            None => Rc::new(Object::Null),
        },
        obj => new_error(format!(
            "argument to `first` must be ARRAY, got {}",
            obj.r#type()
        )),
    }
}

fn builtin_last(args: &[Rc<Object>]) -> Rc<Object> {
    if args.len() != 1 {
        return new_error(format!(
            "wrong number of arguments. got={}, want=1",
            args.len()
        ));
    }
    match &*args[0] {
        Object::ArrayObject(elements) => match elements.last() {
            Some(last) => Rc::clone(last),
            None => Rc::new(Object::Null),
        },
        obj => new_error(format!(
            "argument to `last` must be ARRAY, got {}",
            obj.r#type()
        )),
    }
}

fn builtin_rest(args: &[Rc<Object>]) -> Rc<Object> {
    if args.len() != 1 {
        return new_error(format!(
            "wrong number of arguments. got={}, want=1",
            args.len()
        ));
    }
    match &*args[0] {
        Object::ArrayObject(elements) if !elements.is_empty() => {
            Rc::new(Object::ArrayObject(elements[1..].to_vec()))
        }
        Object::ArrayObject(..) => Rc::new(Object::Null),
        obj => new_error(format!(
            "argument to `rest` must be ARRAY, got {}",
            obj.r#type()
        )),
    }
}

fn builtin_push(args: &[Rc<Object>]) -> Rc<Object> {
    if args.len() != 2 {
        return new_error(format!(
            "wrong number of arguments. got={}, want=2",
            args.len()
        ));
    }
    match &*args[0] {
        Object::ArrayObject(elements) => {
            let mut elements = elements.clone();
            elements.push(Rc::clone(&args[1]));
            Rc::new(Object::ArrayObject(elements))
        }
        obj => new_error(format!(
            "argument to `push` must be ARRAY, got {}",
            obj.r#type()
        )),
    }
}
