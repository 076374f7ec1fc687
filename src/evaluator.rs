use crate::ast::{Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::environment::Environment;
use crate::object::{objects_equal, Function, HashPair, Object, BUILTINS};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Reference semantics for the language. Errors are first-class values that
/// short-circuit evaluation; `return` travels as a ReturnValue wrapper that
/// blocks propagate and only program/function boundaries unwrap.
pub fn eval(program: &Program, env: &Rc<RefCell<Environment>>) -> Rc<Object> {
    let mut result = Rc::new(Object::Null);
    for statement in program.statements() {
        result = eval_statement(statement, env);
        match &*result {
            Object::ReturnValue(value) => return Rc::clone(value),
            Object::ErrorObject(..) => return result,
            _ => {}
        }
    }
    result
}

fn eval_statement(statement: &Statement, env: &Rc<RefCell<Environment>>) -> Rc<Object> {
    match statement {
        Statement::LetStatement { name, value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            env.borrow_mut().set(name, value);
            Rc::new(Object::Null)
        }
        Statement::ReturnStatement(return_value) => {
            let value = eval_expression(return_value, env);
            if value.is_error() {
                return value;
            }
            Rc::new(Object::ReturnValue(value))
        }
        Statement::ExpressionStatement(exp) => eval_expression(exp, env),
        Statement::BlockStatement(statements) => eval_block_statement(statements, env),
    }
}

// Unlike eval, a block does NOT unwrap ReturnValue: a `return` inside a
// nested if has to pierce every enclosing block of the same function.
fn eval_block_statement(statements: &[Statement], env: &Rc<RefCell<Environment>>) -> Rc<Object> {
    let mut result = Rc::new(Object::Null);
    for statement in statements {
        result = eval_statement(statement, env);
        if matches!(&*result, Object::ReturnValue(..) | Object::ErrorObject(..)) {
            return result;
        }
    }
    result
}

fn eval_expression(expression: &Expression, env: &Rc<RefCell<Environment>>) -> Rc<Object> {
    use Expression::*;
    match expression {
        IntegerLiteral(value) => Rc::new(Object::Integer(*value)),
        StringLiteral(value) => Rc::new(Object::MonkeyString(value.clone())),
        Boolean(value) => Rc::new(Object::Boolean(*value)),
        Identifier(name) => eval_identifier(name, env),
        PrefixExpression { operator, right } => {
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_prefix_expression(*operator, right)
        }
        InfixExpression {
            left,
            operator,
            right,
        } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_infix_expression(*operator, left, right)
        }
        IfExpression {
            condition,
            consequence,
            alternative,
        } => {
            let condition = eval_expression(condition, env);
            if condition.is_error() {
                return condition;
            }
            if condition.is_truthy() {
                eval_statement(consequence, env)
            } else if let Some(alt) = alternative {
                eval_statement(alt, env)
            } else {
                Rc::new(Object::Null)
            }
        }
        FunctionLiteral {
            parameters, body, ..
        } => Rc::new(Object::FunctionObject(Rc::new(Function::new(
            parameters.clone(),
            (**body).clone(),
            Rc::clone(env),
        )))),
        CallExpression {
            function,
            arguments,
        } => {
            let function = eval_expression(function, env);
            if function.is_error() {
                return function;
            }
            let args = eval_expressions(arguments, env);
            if args.len() == 1 && args[0].is_error() {
                return Rc::clone(&args[0]);
            }
            apply_function(function, args)
        }
        ArrayLiteral(elements) => {
            let elements = eval_expressions(elements, env);
            if elements.len() == 1 && elements[0].is_error() {
                return Rc::clone(&elements[0]);
            }
            Rc::new(Object::ArrayObject(elements))
        }
        IndexExpression { left, index } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let index = eval_expression(index, env);
            if index.is_error() {
                return index;
            }
            eval_index_expression(left, index)
        }
        HashLiteral(pairs) => eval_hash_literal(pairs, env),
    }
}

fn eval_identifier(name: &str, env: &Rc<RefCell<Environment>>) -> Rc<Object> {
    if let Some(value) = env.borrow().get(name) {
        return value;
    }
    if let Some(builtin) = BUILTINS.iter().find(|builtin| builtin.name() == name) {
        return Rc::new(Object::BuiltinObject(builtin));
    }
    new_error(format!("identifier not found: {}", name))
}

fn eval_prefix_expression(operator: PrefixOperator, right: Rc<Object>) -> Rc<Object> {
    match operator {
        PrefixOperator::BANG => native_bool_to_boolean_object(!right.is_truthy()),
        PrefixOperator::MINUS => match &*right {
            Object::Integer(value) => Rc::new(Object::Integer(-value)),
            obj => new_error(format!("unsupported operator: -{}", obj.r#type())),
        },
    }
}

fn eval_infix_expression(
    operator: InfixOperator,
    left: Rc<Object>,
    right: Rc<Object>,
) -> Rc<Object> {
    use InfixOperator::*;
    match (&*left, &*right) {
        (Object::Integer(l), Object::Integer(r)) => {
            eval_integer_infix_expression(operator, *l, *r)
        }
        (Object::MonkeyString(l), Object::MonkeyString(r)) => match operator {
            PLUS => Rc::new(Object::MonkeyString(format!("{}{}", l, r))),
            EQ => native_bool_to_boolean_object(l == r),
            NEQ => native_bool_to_boolean_object(l != r),
            _ => new_error(format!("unsupported operator: STRING {} STRING", operator)),
        },
        _ => match operator {
            EQ => native_bool_to_boolean_object(objects_equal(&left, &right)),
            NEQ => native_bool_to_boolean_object(!objects_equal(&left, &right)),
            _ if left.r#type() != right.r#type() => new_error(format!(
                "type mismatch: {} {} {}",
                left.r#type(),
                operator,
                right.r#type()
            )),
            _ => new_error(format!(
                "unsupported operator: {} {} {}",
                left.r#type(),
                operator,
                right.r#type()
            )),
        },
    }
}

fn eval_integer_infix_expression(operator: InfixOperator, left: i64, right: i64) -> Rc<Object> {
    use InfixOperator::*;
    match operator {
        PLUS => Rc::new(Object::Integer(left + right)),
        MINUS => Rc::new(Object::Integer(left - right)),
        ASTERISK => Rc::new(Object::Integer(left * right)),
        SLASH => {
            if right == 0 {
                new_error("division by zero".to_string())
            } else {
                Rc::new(Object::Integer(left / right))
            }
        }
        LT => native_bool_to_boolean_object(left < right),
        GT => native_bool_to_boolean_object(left > right),
        EQ => native_bool_to_boolean_object(left == right),
        NEQ => native_bool_to_boolean_object(left != right),
    }
}

fn eval_expressions(
    expressions: &[Expression],
    env: &Rc<RefCell<Environment>>,
) -> Vec<Rc<Object>> {
    let mut result = Vec::with_capacity(expressions.len());
    for expression in expressions {
        let evaluated = eval_expression(expression, env);
        if evaluated.is_error() {
            return vec![evaluated];
        }
        result.push(evaluated);
    }
    result
}

fn apply_function(function: Rc<Object>, args: Vec<Rc<Object>>) -> Rc<Object> {
    match &*function {
        Object::FunctionObject(function) => {
            if args.len() != function.parameters().len() {
                return new_error(format!(
                    "wrong number of arguments: want={}, got={}",
                    function.parameters().len(),
                    args.len()
                ));
            }
            let env = extend_function_env(function, args);
            let evaluated = eval_statement(function.body(), &env);
            unwrap_return_value(evaluated)
        }
        Object::BuiltinObject(builtin) => builtin.apply(&args),
        _ => new_error("not a function".to_string()),
    }
}

fn extend_function_env(function: &Function, args: Vec<Rc<Object>>) -> Rc<RefCell<Environment>> {
    let env = Rc::new(RefCell::new(Environment::new_enclosed(Rc::clone(
        function.env(),
    ))));
    for (param, arg) in function.parameters().iter().zip(args.into_iter()) {
        env.borrow_mut().set(param, arg);
    }
    env
}

fn unwrap_return_value(obj: Rc<Object>) -> Rc<Object> {
    match &*obj {
        Object::ReturnValue(value) => Rc::clone(value),
        _ => obj,
    }
}

fn eval_index_expression(left: Rc<Object>, index: Rc<Object>) -> Rc<Object> {
    match (&*left, &*index) {
        (Object::ArrayObject(elements), Object::Integer(i)) => {
            if *i < 0 || *i as usize >= elements.len() {
                Rc::new(Object::Null)
            } else {
                Rc::clone(&elements[*i as usize])
            }
        }
        (Object::HashObject(pairs), _) => match index.hash_key() {
            Ok(key) => match pairs.get(&key) {
                Some(pair) => Rc::clone(&pair.value),
                None => Rc::new(Object::Null),
            },
            Err(err) => new_error(err.to_string()),
        },
        _ => new_error("index operator not supported".to_string()),
    }
}

fn eval_hash_literal(
    pairs: &[(Expression, Expression)],
    env: &Rc<RefCell<Environment>>,
) -> Rc<Object> {
    let mut hashed_pairs = HashMap::new();
    for (key_node, value_node) in pairs {
        let key = eval_expression(key_node, env);
        if key.is_error() {
            return key;
        }
        let hash_key = match key.hash_key() {
            Ok(hash_key) => hash_key,
            Err(err) => return new_error(err.to_string()),
        };
        let value = eval_expression(value_node, env);
        if value.is_error() {
            return value;
        }
        hashed_pairs.insert(hash_key, HashPair { key, value });
    }
    Rc::new(Object::HashObject(hashed_pairs))
}

fn native_bool_to_boolean_object(value: bool) -> Rc<Object> {
    Rc::new(Object::Boolean(value))
}

fn new_error(message: String) -> Rc<Object> {
    Rc::new(Object::ErrorObject(message))
}
