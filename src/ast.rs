use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    LetStatement { name: String, value: Expression },
    ReturnStatement(Expression),
    ExpressionStatement(Expression),
    BlockStatement(Vec<Statement>),
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Statement::*;
        match self {
            LetStatement { name, value } => {
                write!(f, "let {} = {};", name, value)
            }
            ReturnStatement(return_value) => {
                write!(f, "return {};", return_value)
            }
            ExpressionStatement(exp) => {
                write!(f, "{}", exp)
            }
            BlockStatement(statements) => {
                for stmt in statements {
                    write!(f, "{}", stmt)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(String),
    IntegerLiteral(i64),
    StringLiteral(String),
    Boolean(bool),
    ArrayLiteral(Vec<Expression>),
    // pairs keep source order; the compiler sorts them itself
    HashLiteral(Vec<(Expression, Expression)>),
    PrefixExpression {
        operator: PrefixOperator,
        right: Box<Expression>,
    },
    InfixExpression {
        left: Box<Expression>,
        operator: InfixOperator,
        right: Box<Expression>,
    },
    IfExpression {
        condition: Box<Expression>,
        consequence: Box<Statement>,
        alternative: Option<Box<Statement>>,
    },
    FunctionLiteral {
        // filled in by the parser for `let name = fn(...) {...};`
        name: Option<String>,
        parameters: Vec<String>,
        body: Box<Statement>,
    },
    CallExpression {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    IndexExpression {
        left: Box<Expression>,
        index: Box<Expression>,
    },
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Expression::*;
        match self {
            Identifier(name) => {
                write!(f, "{}", name)
            }
            IntegerLiteral(value) => {
                write!(f, "{}", value)
            }
            StringLiteral(value) => {
                write!(f, "{}", value)
            }
            Boolean(value) => {
                write!(f, "{}", value)
            }
            ArrayLiteral(elements) => {
                let elements: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            HashLiteral(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            PrefixExpression { operator, right } => {
                write!(f, "({}{})", operator, right)
            }
            InfixExpression {
                left,
                operator,
                right,
            } => {
                write!(f, "({} {} {})", left, operator, right)
            }
            IfExpression {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) {{ {} }}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, " else {{ {} }}", alt)?;
                }
                Ok(())
            }
            FunctionLiteral {
                parameters, body, ..
            } => {
                write!(f, "fn({}) {{ {} }}", parameters.join(", "), body)
            }
            CallExpression {
                function,
                arguments,
            } => {
                let arguments: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", function, arguments.join(", "))
            }
            IndexExpression { left, index } => {
                write!(f, "({}[{}])", left, index)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InfixOperator {
    PLUS,
    MINUS,
    ASTERISK,
    SLASH,
    LT,
    GT,
    EQ,
    NEQ,
}

impl Display for InfixOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use InfixOperator::*;
        let op = match self {
            PLUS => "+",
            MINUS => "-",
            ASTERISK => "*",
            SLASH => "/",
            LT => "<",
            GT => ">",
            EQ => "==",
            NEQ => "!=",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrefixOperator {
    MINUS,
    BANG,
}

impl Display for PrefixOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use PrefixOperator::*;
        let op = match self {
            MINUS => "-",
            BANG => "!",
        };
        write!(f, "{}", op)
    }
}
