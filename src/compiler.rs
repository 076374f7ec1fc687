use crate::ast::{Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::code::{make, Instructions, Opcode};
use crate::object;
use crate::object::Object;
use crate::symbol_table::{Symbol, SymbolScope, SymbolTable};
use anyhow::{bail, Result};
use std::convert::TryFrom;
use std::mem;
use std::rc::Rc;

pub struct Compiler {
    constants: Vec<Object>,

    symbol_table: SymbolTable,

    scopes: Vec<CompilationScope>,
    scope_index: usize,
}

#[derive(Copy, Clone)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

impl CompilationScope {
    fn new() -> Self {
        Self {
            instructions: Instructions::new(),
            last_instruction: None,
            previous_instruction: None,
        }
    }
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        symbol_table.define_builtins();
        Self {
            constants: vec![],
            symbol_table,
            scopes: vec![CompilationScope::new()],
            scope_index: 0,
        }
    }
    pub fn new_with_state(symbol_table: &SymbolTable, constants: &[Object]) -> Self {
        let mut compiler = Self::new();
        compiler.symbol_table = symbol_table.clone();
        compiler.constants = constants.to_vec();
        compiler
    }
    pub fn compile(&mut self, program: Program) -> Result<()> {
        for stmt in program.into_statements() {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }
    fn compile_statement(&mut self, statement: Statement) -> Result<()> {
        use Statement::*;
        match statement {
            LetStatement { name, value } => {
                self.compile_expression(value)?;
                let symbol = self.symbol_table.define(&name);
                let index = symbol.index();
                match symbol.scope() {
                    SymbolScope::GlobalScope => {
                        self.emit(Opcode::OpSetGlobal, &[index]);
                    }
                    _ => {
                        self.emit(Opcode::OpSetLocal, &[index]);
                    }
                }
            }
            ReturnStatement(return_value) => {
                self.compile_expression(return_value)?;
                self.emit(Opcode::OpReturnValue, &[]);
            }
            ExpressionStatement(exp) => {
                self.compile_expression(exp)?;
                self.emit(Opcode::OpPop, &[]);
            }
            BlockStatement(statements) => {
                for stmt in statements {
                    self.compile_statement(stmt)?;
                }
            }
        }
        Ok(())
    }
    fn compile_expression(&mut self, expression: Expression) -> Result<()> {
        use Expression::*;
        use InfixOperator::*;
        use Opcode::*;
        match expression {
            InfixExpression {
                left,
                operator,
                right,
            } => {
                // `<` compiles as a swapped `>`; there is no OpLessThan
                let (left, right) = if operator == LT {
                    (right, left)
                } else {
                    (left, right)
                };
                self.compile_expression(*left)?;
                self.compile_expression(*right)?;
                match operator {
                    PLUS => {
                        self.emit(OpAdd, &[]);
                    }
                    MINUS => {
                        self.emit(OpSub, &[]);
                    }
                    ASTERISK => {
                        self.emit(OpMul, &[]);
                    }
                    SLASH => {
                        self.emit(OpDiv, &[]);
                    }
                    LT | GT => {
                        self.emit(OpGreaterThan, &[]);
                    }
                    EQ => {
                        self.emit(OpEqual, &[]);
                    }
                    NEQ => {
                        self.emit(OpNotEqual, &[]);
                    }
                }
            }
            IntegerLiteral(value) => {
                let integer = Object::Integer(value);
                let operands = &[self.add_constant(integer)];
                self.emit(OpConstant, operands);
            }
            StringLiteral(value) => {
                let string = Object::MonkeyString(value);
                let operands = &[self.add_constant(string)];
                self.emit(OpConstant, operands);
            }
            Expression::Boolean(value) => {
                if value {
                    self.emit(OpTrue, &[]);
                } else {
                    self.emit(OpFalse, &[]);
                }
            }
            PrefixExpression { operator, right } => {
                self.compile_expression(*right)?;
                match operator {
                    PrefixOperator::MINUS => {
                        self.emit(OpMinus, &[]);
                    }
                    PrefixOperator::BANG => {
                        self.emit(OpBang, &[]);
                    }
                }
            }
            IfExpression {
                condition,
                consequence,
                alternative,
            } => {
                self.compile_expression(*condition)?;

                let jump_not_truthy_pos = self.emit(OpJumpNotTruthy, &[9999]);

                self.compile_statement(*consequence)?;
                if self.last_instruction_is(OpPop) {
                    self.remove_last_pop();
                }

                let jump_pos = self.emit(OpJump, &[9999]);

                let after_consequence_pos = self.current_instructions().len();
                self.change_operand(jump_not_truthy_pos, after_consequence_pos);

                match alternative {
                    None => {
                        self.emit(OpNull, &[]);
                    }
                    Some(alt) => {
                        self.compile_statement(*alt)?;
                        if self.last_instruction_is(OpPop) {
                            self.remove_last_pop();
                        }
                    }
                }

                let after_alternative_pos = self.current_instructions().len();
                self.change_operand(jump_pos, after_alternative_pos);
            }
            Identifier(name) => {
                match self.symbol_table.resolve(&name) {
                    Some(symbol) => self.load_symbol(&symbol),
                    None => {
                        bail!("identifier not found: {}", name);
                    }
                };
            }
            ArrayLiteral(elements) => {
                let len = elements.len();
                for e in elements {
                    self.compile_expression(e)?;
                }
                self.emit(OpArray, &[len]);
            }
            HashLiteral(mut pairs) => {
                // stable bytecode: pairs ordered by the key's canonical form
                pairs.sort_by(|(k1, _), (k2, _)| k1.to_string().cmp(&k2.to_string()));
                let len = pairs.len();
                for (key, value) in pairs {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(OpHash, &[len * 2]);
            }
            IndexExpression { left, index } => {
                self.compile_expression(*left)?;
                self.compile_expression(*index)?;
                self.emit(OpIndex, &[]);
            }
            FunctionLiteral {
                name,
                parameters,
                body,
            } => {
                self.enter_scope();

                if let Some(name) = &name {
                    self.symbol_table.define_function_name(name);
                }

                let num_parameters = parameters.len();
                for param in parameters {
                    self.symbol_table.define(&param);
                }

                self.compile_statement(*body)?;

                if self.last_instruction_is(OpPop) {
                    self.replace_last_pop_with_return();
                }
                if !self.last_instruction_is(OpReturnValue) {
                    self.emit(OpReturn, &[]);
                }

                let free_symbols: Vec<Rc<Symbol>> = self.symbol_table.free_symbols().to_vec();
                let num_locals = self.symbol_table.num_definitions();
                let instructions = self.leave_scope();

                for symbol in &free_symbols {
                    self.load_symbol(symbol);
                }

                let compiled_function = Object::CompiledFunctionObject(Rc::new(
                    object::CompiledFunctionObject::new(instructions, num_locals, num_parameters),
                ));
                let const_index = self.add_constant(compiled_function);
                self.emit(OpClosure, &[const_index, free_symbols.len()]);
            }
            CallExpression {
                function,
                arguments,
            } => {
                self.compile_expression(*function)?;

                let number_of_arguments = arguments.len();

                for arg in arguments {
                    self.compile_expression(arg)?;
                }

                self.emit(OpCall, &[number_of_arguments]);
            }
        }
        Ok(())
    }
    fn load_symbol(&mut self, symbol: &Symbol) {
        let index = symbol.index();
        match symbol.scope() {
            SymbolScope::GlobalScope => {
                self.emit(Opcode::OpGetGlobal, &[index]);
            }
            SymbolScope::LocalScope => {
                self.emit(Opcode::OpGetLocal, &[index]);
            }
            SymbolScope::BuiltinScope => {
                self.emit(Opcode::OpGetBuiltin, &[index]);
            }
            SymbolScope::FreeScope => {
                self.emit(Opcode::OpGetFree, &[index]);
            }
            SymbolScope::FunctionScope => {
                self.emit(Opcode::OpCurrentClosure, &[]);
            }
        }
    }
    fn add_constant(&mut self, obj: Object) -> usize {
        self.constants.push(obj);
        self.constants.len() - 1
    }
    fn emit(&mut self, op: Opcode, operands: &[usize]) -> usize {
        let instruction = make(op, operands);
        let position = self.add_instruction(instruction);
        self.set_last_instruction(op, position);
        position
    }
    fn add_instruction(&mut self, instruction: Instructions) -> usize {
        let pos_new_instruction = self.current_instructions().len();
        self.current_instructions_mut().extend(instruction);
        pos_new_instruction
    }
    fn set_last_instruction(&mut self, op: Opcode, pos: usize) {
        let last = EmittedInstruction {
            opcode: op,
            position: pos,
        };
        // self.prev <- self.last
        // self.last <- last
        self.scopes[self.scope_index].previous_instruction =
            self.scopes[self.scope_index].last_instruction;
        self.scopes[self.scope_index].last_instruction = Some(last);
    }
    fn last_instruction_is(&self, op: Opcode) -> bool {
        match &self.scopes[self.scope_index].last_instruction {
            Some(last) => last.opcode == op,
            None => false,
        }
    }
    fn remove_last_pop(&mut self) {
        let last_position = self.last_instruction().position;
        self.current_instructions_mut().truncate(last_position);
        // self.last <- self.prev
        self.scopes[self.scope_index].last_instruction =
            self.scopes[self.scope_index].previous_instruction;
        self.scopes[self.scope_index].previous_instruction = None;
    }
    fn replace_instruction(&mut self, pos: usize, new_instruction: Instructions) {
        let instructions = self.current_instructions_mut();
        for i in 0..new_instruction.len() {
            instructions[pos + i] = new_instruction[i];
        }
    }
    fn change_operand(&mut self, op_pos: usize, operand: usize) {
        let op = Opcode::try_from(self.current_instructions()[op_pos])
            .unwrap_or_else(|err| panic!("patching an unknown opcode: {:?}", err));
        let new_instruction = make(op, &[operand]);
        self.replace_instruction(op_pos, new_instruction);
    }
    fn current_instructions(&self) -> &Instructions {
        &self.scopes[self.scope_index].instructions
    }
    fn current_instructions_mut(&mut self) -> &mut Instructions {
        &mut self.scopes[self.scope_index].instructions
    }
    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::new());
        self.scope_index += 1;
        let outer = mem::replace(&mut self.symbol_table, SymbolTable::new());
        self.symbol_table = SymbolTable::new_enclosed_symbol_table(Box::new(outer));
    }
    fn leave_scope(&mut self) -> Instructions {
        let scope = self
            .scopes
            .pop()
            .unwrap_or_else(|| panic!("left more scopes than were entered"));
        self.scope_index -= 1;
        let outer = self
            .symbol_table
            .take_outer()
            .unwrap_or_else(|| panic!("left the global symbol table"));
        self.symbol_table = *outer;
        scope.instructions
    }
    fn replace_last_pop_with_return(&mut self) {
        let last_position = self.last_instruction().position;
        self.replace_instruction(last_position, make(Opcode::OpReturnValue, &[]));
        self.last_instruction_mut().opcode = Opcode::OpReturnValue;
    }
    fn last_instruction(&self) -> &EmittedInstruction {
        self.scopes[self.scope_index]
            .last_instruction
            .as_ref()
            .unwrap_or_else(|| panic!("there is no last emitted instruction"))
    }
    fn last_instruction_mut(&mut self) -> &mut EmittedInstruction {
        self.scopes[self.scope_index]
            .last_instruction
            .as_mut()
            .unwrap_or_else(|| panic!("there is no last emitted instruction"))
    }
    pub fn constants(&self) -> &Vec<Object> {
        &self.constants
    }
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }
    pub fn bytecode(self) -> Bytecode {
        Bytecode {
            instructions: self.current_instructions().clone(),
            constants: self.constants,
        }
    }
}

pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Object>,
}
