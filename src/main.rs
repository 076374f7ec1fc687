use monkey_lang::repl;

fn main() {
    println!("This is the Monkey programming language!");
    println!("Feel free to type in commands");
    if std::env::args().any(|arg| arg == "--eval") {
        repl::start_eval();
    } else {
        repl::start();
    }
}
