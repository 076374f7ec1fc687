use monkey_lang::ast::Program;
use monkey_lang::compiler::Compiler;
use monkey_lang::environment::Environment;
use monkey_lang::evaluator;
use monkey_lang::lexer::Lexer;
use monkey_lang::parser::Parser;
use monkey_lang::vm::VM;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

const INPUT: &str = "
    let fibonacci = fn(x) {
        if (x == 0) {
            return 0;
        } else {
            if (x == 1) {
                return 1;
            } else {
                fibonacci(x - 1) + fibonacci(x - 2);
            }
        }
    };
    fibonacci(25);
";

fn parse(input: &str) -> Program {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();
    assert!(
        parser.errors().is_empty(),
        "parse error: {:?}",
        parser.errors()
    );
    program
}

fn run_vm() {
    let program = parse(INPUT);
    let mut compiler = Compiler::new();
    compiler.compile(program).expect("compile error");
    let bytecode = compiler.bytecode();
    let mut vm = VM::new(&bytecode);

    let start = Instant::now();
    vm.run().expect("vm error");
    let duration = start.elapsed();

    println!(
        "engine=vm, result={}, duration={}s",
        vm.last_popped_stack_elem(),
        duration.as_secs_f64()
    );
}

fn run_eval() {
    let program = parse(INPUT);
    let env = Rc::new(RefCell::new(Environment::new()));

    let start = Instant::now();
    let result = evaluator::eval(&program, &env);
    let duration = start.elapsed();

    println!(
        "engine=eval, result={}, duration={}s",
        result,
        duration.as_secs_f64()
    );
}

fn main() {
    let engine = std::env::args().nth(1).unwrap_or_else(|| "vm".to_string());
    match engine.as_str() {
        "vm" => run_vm(),
        "eval" => run_eval(),
        other => eprintln!("unknown engine {:?}, expected vm or eval", other),
    }
}
