use crate::compiler::Compiler;
use crate::environment::Environment;
use crate::evaluator;
use crate::lexer::Lexer;
use crate::object::Object;
use crate::parser::Parser;
use crate::symbol_table::SymbolTable;
use crate::vm::{self, VM};
use std::cell::RefCell;
use std::io;
use std::io::Write;
use std::rc::Rc;

const PROMPT: &'static str = ">> ";

/// Compile-and-run loop. The symbol table, constant pool and globals
/// survive across lines so definitions persist between inputs.
pub fn start() {
    let mut constants: Vec<Object> = Vec::new();
    let mut globals = vm::new_globals_store();
    let mut symbol_table = SymbolTable::new();
    symbol_table.define_builtins();

    loop {
        let input = match read_line() {
            Some(input) => input,
            None => return, // EOF
        };
        let lexer = Lexer::new(&input);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();
        if !parser.errors().is_empty() {
            print_parser_errors(parser.errors());
            continue;
        }
        let mut compiler = Compiler::new_with_state(&symbol_table, &constants);
        if let Err(err) = compiler.compile(program) {
            println!("compilation failed:\n {:?}", err);
            continue;
        }
        symbol_table = compiler.symbol_table().clone();
        let bytecode = compiler.bytecode();
        let mut machine = VM::new_with_globals_store(&bytecode, globals);
        match machine.run() {
            Ok(()) => {
                println!("{}", machine.last_popped_stack_elem());
            }
            Err(err) => {
                println!("executing bytecode failed:\n {:?}", err);
            }
        }
        globals = machine.into_globals();
        constants = bytecode.constants;
    }
}

/// Tree-walker loop sharing one environment across lines.
pub fn start_eval() {
    let env = Rc::new(RefCell::new(Environment::new()));
    loop {
        let input = match read_line() {
            Some(input) => input,
            None => return, // EOF
        };
        let lexer = Lexer::new(&input);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();
        if !parser.errors().is_empty() {
            print_parser_errors(parser.errors());
            continue;
        }
        let evaluated = evaluator::eval(&program, &env);
        println!("{}", evaluated);
    }
}

fn read_line() -> Option<String> {
    print!("{}", PROMPT);
    io::stdout().flush().ok()?;
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input).ok()?;
    if read == 0 {
        return None;
    }
    Some(input.trim_end().to_string())
}

fn print_parser_errors(errors: &[String]) {
    println!("parser errors:");
    for error in errors {
        println!("\t{}", error);
    }
}
