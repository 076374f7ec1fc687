use crate::ast::{Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::lexer::Lexer;
use crate::token::Token;

#[derive(PartialOrd, PartialEq)]
enum Precedence {
    LOWEST,
    EQUALS,
    LESS,
    SUM,
    PRODUCT,
    PREFIX,
    CALL,
    INDEX,
}

impl Token {
    fn precedence(&self) -> Precedence {
        use Precedence::*;
        use Token::*;
        match self {
            EQ | NEQ => EQUALS,
            LT | GT => LESS,
            PLUS | MINUS => SUM,
            ASTERISK | SLASH => PRODUCT,
            LPAREN => CALL,
            LBRACKET => INDEX,
            _ => LOWEST,
        }
    }
}

/// Pratt parser over two tokens of lookahead. Syntax errors are pushed onto
/// an error list and the malformed sub-node is dropped; parsing always
/// continues to the end of the input.
pub struct Parser<'a> {
    l: Lexer<'a>,
    cur: Token,
    peek: Token,
    errors: Vec<String>,
}

impl<'a> Parser<'a> {
    pub fn new(l: Lexer<'a>) -> Self {
        let mut parser = Parser {
            l,
            cur: Token::EOF,
            peek: Token::EOF,
            errors: Vec::new(),
        };
        parser.next_token();
        parser.next_token();
        parser
    }
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
    fn next_token(&mut self) {
        // self.cur <- self.peek
        // self.peek <- self.l.next()
        std::mem::swap(&mut self.cur, &mut self.peek);
        self.peek = self.l.next().unwrap_or(Token::EOF);
    }
    fn cur_token_is(&self, token: &Token) -> bool {
        &self.cur == token
    }
    fn peek_token_is(&self, token: &Token) -> bool {
        &self.peek == token
    }
    fn expect_peek(&mut self, token: &Token) -> bool {
        if self.peek_token_is(token) {
            self.next_token();
            true
        } else {
            self.peek_error(token.kind());
            false
        }
    }
    fn peek_error(&mut self, expected: &str) {
        self.errors.push(format!(
            "expected next token to be {}, got {} instead",
            expected,
            self.peek.kind()
        ));
    }
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.cur_token_is(&Token::EOF) {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        Program::new(statements)
    }
    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur {
            Token::LET => self.parse_let_statement(),
            Token::RETURN => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }
    fn parse_let_statement(&mut self) -> Option<Statement> {
        let name = match &self.peek {
            Token::IDENT(literal) => literal.to_string(),
            _ => {
                self.peek_error("IDENT");
                return None;
            }
        };
        self.next_token(); // self.cur <- IDENT

        if !self.expect_peek(&Token::ASSIGN) {
            return None;
        }
        self.next_token();

        let mut value = self.parse_expression(Precedence::LOWEST)?;
        // a function literal bound by let carries the binding name so its
        // body can call itself
        if let Expression::FunctionLiteral { name: fn_name, .. } = &mut value {
            *fn_name = Some(name.clone());
        }

        if self.peek_token_is(&Token::SEMICOLON) {
            self.next_token();
        }
        Some(Statement::LetStatement { name, value })
    }
    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.next_token();
        let return_value = self.parse_expression(Precedence::LOWEST)?;
        if self.peek_token_is(&Token::SEMICOLON) {
            self.next_token();
        }
        Some(Statement::ReturnStatement(return_value))
    }
    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let exp = self.parse_expression(Precedence::LOWEST)?;
        if self.peek_token_is(&Token::SEMICOLON) {
            self.next_token();
        }
        Some(Statement::ExpressionStatement(exp))
    }
    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        use Expression::*;
        use Token::*;
        let mut exp = match &self.cur {
            IDENT(literal) => Identifier(literal.to_string()),
            INT(literal) => match literal.parse::<i64>() {
                Ok(value) => IntegerLiteral(value),
                Err(_) => {
                    self.errors
                        .push(format!("could not parse {:?} as integer", literal));
                    return None;
                }
            },
            STRING(literal) => StringLiteral(literal.to_string()),
            MINUS | BANG => self.parse_prefix_expression()?,
            LPAREN => self.parse_grouped_expression()?,
            TRUE => Boolean(true),
            FALSE => Boolean(false),
            IF => self.parse_if_expression()?,
            FUNCTION => self.parse_function_literal()?,
            LBRACKET => self.parse_array_literal()?,
            LBRACE => self.parse_hash_literal()?,
            token => {
                self.errors.push(format!(
                    "no prefix parse function for {} found",
                    token.kind()
                ));
                return None;
            }
        };
        while !self.peek_token_is(&Token::SEMICOLON) && precedence < self.peek.precedence() {
            exp = match &self.peek {
                PLUS | MINUS | ASTERISK | SLASH | LT | GT | EQ | NEQ => {
                    self.next_token();
                    self.parse_infix_expression(exp)?
                }
                LPAREN => {
                    self.next_token();
                    self.parse_call_expression(exp)?
                }
                LBRACKET => {
                    self.next_token();
                    self.parse_index_expression(exp)?
                }
                _ => return Some(exp),
            };
        }
        Some(exp)
    }
    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let exp = self.parse_expression(Precedence::LOWEST)?;
        if !self.expect_peek(&Token::RPAREN) {
            return None;
        }
        Some(exp)
    }
    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = match &self.cur {
            Token::MINUS => PrefixOperator::MINUS,
            Token::BANG => PrefixOperator::BANG,
            _ => unreachable!(),
        };
        self.next_token();
        let right = self.parse_expression(Precedence::PREFIX)?;
        Some(Expression::PrefixExpression {
            operator,
            right: Box::new(right),
        })
    }
    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = match &self.cur {
            Token::PLUS => InfixOperator::PLUS,
            Token::MINUS => InfixOperator::MINUS,
            Token::ASTERISK => InfixOperator::ASTERISK,
            Token::SLASH => InfixOperator::SLASH,
            Token::LT => InfixOperator::LT,
            Token::GT => InfixOperator::GT,
            Token::EQ => InfixOperator::EQ,
            Token::NEQ => InfixOperator::NEQ,
            _ => unreachable!(),
        };
        let precedence = self.cur.precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expression::InfixExpression {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }
    fn parse_if_expression(&mut self) -> Option<Expression> {
        if !self.expect_peek(&Token::LPAREN) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::LOWEST)?;

        if !self.expect_peek(&Token::RPAREN) {
            return None;
        }
        if !self.expect_peek(&Token::LBRACE) {
            return None;
        }
        let consequence = self.parse_block_statement();

        let alternative = if self.peek_token_is(&Token::ELSE) {
            self.next_token();
            if !self.expect_peek(&Token::LBRACE) {
                return None;
            }
            Some(Box::new(self.parse_block_statement()))
        } else {
            None
        };
        Some(Expression::IfExpression {
            condition: Box::new(condition),
            consequence: Box::new(consequence),
            alternative,
        })
    }
    fn parse_block_statement(&mut self) -> Statement {
        self.next_token();
        let mut statements = Vec::new();
        while !self.cur_token_is(&Token::RBRACE) && !self.cur_token_is(&Token::EOF) {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        Statement::BlockStatement(statements)
    }
    fn parse_function_literal(&mut self) -> Option<Expression> {
        if !self.expect_peek(&Token::LPAREN) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;
        if !self.expect_peek(&Token::LBRACE) {
            return None;
        }
        let body = self.parse_block_statement();
        Some(Expression::FunctionLiteral {
            name: None,
            parameters,
            body: Box::new(body),
        })
    }
    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut parameters = Vec::new();
        if self.peek_token_is(&Token::RPAREN) {
            self.next_token();
            return Some(parameters);
        }
        self.next_token();
        parameters.push(self.parse_identifier_name()?);
        while self.peek_token_is(&Token::COMMA) {
            self.next_token();
            self.next_token();
            parameters.push(self.parse_identifier_name()?);
        }
        if !self.expect_peek(&Token::RPAREN) {
            return None;
        }
        Some(parameters)
    }
    fn parse_identifier_name(&mut self) -> Option<String> {
        match &self.cur {
            Token::IDENT(literal) => Some(literal.to_string()),
            token => {
                self.errors.push(format!(
                    "expected next token to be IDENT, got {} instead",
                    token.kind()
                ));
                None
            }
        }
    }
    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(&Token::RPAREN)?;
        Some(Expression::CallExpression {
            function: Box::new(function),
            arguments,
        })
    }
    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::LOWEST)?;
        if !self.expect_peek(&Token::RBRACKET) {
            return None;
        }
        Some(Expression::IndexExpression {
            left: Box::new(left),
            index: Box::new(index),
        })
    }
    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(&Token::RBRACKET)?;
        Some(Expression::ArrayLiteral(elements))
    }
    fn parse_expression_list(&mut self, end: &Token) -> Option<Vec<Expression>> {
        let mut list = Vec::new();
        if self.peek_token_is(end) {
            self.next_token();
            return Some(list);
        }
        self.next_token();
        list.push(self.parse_expression(Precedence::LOWEST)?);
        while self.peek_token_is(&Token::COMMA) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::LOWEST)?);
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }
    fn parse_hash_literal(&mut self) -> Option<Expression> {
        let mut pairs = Vec::new();
        while !self.peek_token_is(&Token::RBRACE) {
            self.next_token();
            let key = self.parse_expression(Precedence::LOWEST)?;
            if !self.expect_peek(&Token::COLON) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::LOWEST)?;
            pairs.push((key, value));
            if !self.peek_token_is(&Token::RBRACE) && !self.expect_peek(&Token::COMMA) {
                return None;
            }
        }
        if !self.expect_peek(&Token::RBRACE) {
            return None;
        }
        Some(Expression::HashLiteral(pairs))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expression, InfixOperator, PrefixOperator, Program, Statement};
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse(input: &str) -> Program {
        let lexer = Lexer::new(input);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();
        assert!(
            parser.errors().is_empty(),
            "parser has errors: {:?}",
            parser.errors()
        );
        program
    }

    fn parse_errors(input: &str) -> Vec<String> {
        let lexer = Lexer::new(input);
        let mut parser = Parser::new(lexer);
        parser.parse_program();
        parser.errors().to_vec()
    }

    #[test]
    fn test_let_statements() {
        let program = parse("let x = 5; let y = z;");
        let statements = program.statements();
        assert_eq!(statements.len(), 2);

        let stmt = &statements[0];
        assert_eq!(
            stmt,
            &Statement::LetStatement {
                name: "x".to_string(),
                value: Expression::IntegerLiteral(5)
            }
        );

        let stmt = &statements[1];
        assert_eq!(
            stmt,
            &Statement::LetStatement {
                name: "y".to_string(),
                value: Expression::Identifier("z".to_string()),
            }
        );
    }

    #[test]
    fn test_let_binds_function_literal_name() {
        let program = parse("let myFunction = fn() { };");
        let statements = program.statements();
        assert_eq!(statements.len(), 1);
        match &statements[0] {
            Statement::LetStatement {
                value: Expression::FunctionLiteral { name, .. },
                ..
            } => {
                assert_eq!(name.as_deref(), Some("myFunction"));
            }
            stmt => panic!("not a let-bound function literal: {:?}", stmt),
        }
        // a bare literal has no name
        let program = parse("fn() { };");
        match &program.statements()[0] {
            Statement::ExpressionStatement(Expression::FunctionLiteral { name, .. }) => {
                assert_eq!(name, &None);
            }
            stmt => panic!("not a function literal: {:?}", stmt),
        }
    }

    #[test]
    fn test_return_statements() {
        let program = parse("return 5; return x;");
        let statements = program.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0],
            Statement::ReturnStatement(Expression::IntegerLiteral(5))
        );
        assert_eq!(
            statements[1],
            Statement::ReturnStatement(Expression::Identifier("x".to_string()))
        );
    }

    #[test]
    fn test_integer_literal_expression() {
        let program = parse("123;");
        let statements = program.statements();
        assert_eq!(statements.len(), 1);
        let stmt = &statements[0];
        assert_eq!(
            stmt,
            &Statement::ExpressionStatement(Expression::IntegerLiteral(123))
        );
    }

    #[test]
    fn test_string_literal_expression() {
        let program = parse(r#""hello world";"#);
        assert_eq!(
            program.statements()[0],
            Statement::ExpressionStatement(Expression::StringLiteral("hello world".to_string()))
        );
    }

    #[test]
    fn test_prefix_expressions() {
        let tests = vec![
            ("!5;", PrefixOperator::BANG, Expression::IntegerLiteral(5)),
            ("-15;", PrefixOperator::MINUS, Expression::IntegerLiteral(15)),
            ("!true;", PrefixOperator::BANG, Expression::Boolean(true)),
        ];
        for (input, operator, right) in tests {
            let program = parse(input);
            assert_eq!(
                program.statements()[0],
                Statement::ExpressionStatement(Expression::PrefixExpression {
                    operator,
                    right: Box::new(right),
                })
            );
        }
    }

    #[test]
    fn test_if_else_expression() {
        use Expression::*;
        use Statement::*;
        let program = parse("if (1 < 2) { 3; 4 } else { 5; };");
        let statements = program.statements();
        assert_eq!(statements.len(), 1);
        let stmt = &statements[0];
        assert_eq!(
            stmt,
            &ExpressionStatement(IfExpression {
                condition: Box::new(InfixExpression {
                    left: Box::new(IntegerLiteral(1)),
                    operator: InfixOperator::LT,
                    right: Box::new(IntegerLiteral(2))
                }),
                consequence: Box::new(BlockStatement(vec![
                    ExpressionStatement(IntegerLiteral(3)),
                    ExpressionStatement(IntegerLiteral(4)),
                ])),
                #[rustfmt::skip]
                alternative: Some(Box::new(BlockStatement(vec![
                    ExpressionStatement(IntegerLiteral (5)),
                ]))),
            })
        )
    }

    #[test]
    fn test_function_literal_parsing() {
        use Expression::*;
        use Statement::*;
        let program = parse("fn(x, y) { x + y; }");
        assert_eq!(
            program.statements()[0],
            ExpressionStatement(FunctionLiteral {
                name: None,
                parameters: vec!["x".to_string(), "y".to_string()],
                body: Box::new(BlockStatement(vec![ExpressionStatement(InfixExpression {
                    left: Box::new(Identifier("x".to_string())),
                    operator: InfixOperator::PLUS,
                    right: Box::new(Identifier("y".to_string())),
                })])),
            })
        );
    }

    #[test]
    fn test_function_parameter_parsing() {
        let tests = vec![
            ("fn() {};", vec![]),
            ("fn(x) {};", vec!["x"]),
            ("fn(x, y, z) {};", vec!["x", "y", "z"]),
        ];
        for (input, expected) in tests {
            let program = parse(input);
            match &program.statements()[0] {
                Statement::ExpressionStatement(Expression::FunctionLiteral {
                    parameters, ..
                }) => {
                    assert_eq!(parameters, &expected);
                }
                stmt => panic!("not a function literal: {:?}", stmt),
            }
        }
    }

    #[test]
    fn test_call_expression_parsing() {
        use Expression::*;
        let program = parse("add(1, 2 * 3, 4 + 5);");
        assert_eq!(
            program.statements()[0],
            Statement::ExpressionStatement(CallExpression {
                function: Box::new(Identifier("add".to_string())),
                arguments: vec![
                    IntegerLiteral(1),
                    InfixExpression {
                        left: Box::new(IntegerLiteral(2)),
                        operator: InfixOperator::ASTERISK,
                        right: Box::new(IntegerLiteral(3)),
                    },
                    InfixExpression {
                        left: Box::new(IntegerLiteral(4)),
                        operator: InfixOperator::PLUS,
                        right: Box::new(IntegerLiteral(5)),
                    },
                ],
            })
        );
    }

    #[test]
    fn test_array_literal_parsing() {
        use Expression::*;
        let program = parse("[1, 2 * 2, 3 + 3]");
        assert_eq!(
            program.statements()[0],
            Statement::ExpressionStatement(ArrayLiteral(vec![
                IntegerLiteral(1),
                InfixExpression {
                    left: Box::new(IntegerLiteral(2)),
                    operator: InfixOperator::ASTERISK,
                    right: Box::new(IntegerLiteral(2)),
                },
                InfixExpression {
                    left: Box::new(IntegerLiteral(3)),
                    operator: InfixOperator::PLUS,
                    right: Box::new(IntegerLiteral(3)),
                },
            ]))
        );
    }

    #[test]
    fn test_index_expression_parsing() {
        use Expression::*;
        let program = parse("myArray[1 + 1]");
        assert_eq!(
            program.statements()[0],
            Statement::ExpressionStatement(IndexExpression {
                left: Box::new(Identifier("myArray".to_string())),
                index: Box::new(InfixExpression {
                    left: Box::new(IntegerLiteral(1)),
                    operator: InfixOperator::PLUS,
                    right: Box::new(IntegerLiteral(1)),
                }),
            })
        );
    }

    #[test]
    fn test_hash_literal_parsing() {
        use Expression::*;
        let program = parse(r#"{"one": 1, "two": 2, "three": 3}"#);
        assert_eq!(
            program.statements()[0],
            Statement::ExpressionStatement(HashLiteral(vec![
                (StringLiteral("one".to_string()), IntegerLiteral(1)),
                (StringLiteral("two".to_string()), IntegerLiteral(2)),
                (StringLiteral("three".to_string()), IntegerLiteral(3)),
            ]))
        );

        let program = parse("{}");
        assert_eq!(
            program.statements()[0],
            Statement::ExpressionStatement(HashLiteral(vec![]))
        );

        let program = parse("{1: 0 + 1}");
        assert_eq!(
            program.statements()[0],
            Statement::ExpressionStatement(HashLiteral(vec![(
                IntegerLiteral(1),
                InfixExpression {
                    left: Box::new(IntegerLiteral(0)),
                    operator: InfixOperator::PLUS,
                    right: Box::new(IntegerLiteral(1)),
                }
            )]))
        );
    }

    #[test]
    fn test_operator_precedence_parsing() {
        let tests = vec![
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b * c", "((a * b) * c)"),
            ("a * b / c", "((a * b) / c)"),
            ("a + b / c", "(a + (b / c))"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("3 + 4; -5 * 5", "(3 + 4)((-5) * 5)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))"),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))",
            ),
            ("true", "true"),
            ("false", "false"),
            ("3 > 5 == false", "((3 > 5) == false)"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("(5 + 5) * 2", "((5 + 5) * 2)"),
            ("2 / (5 + 5)", "(2 / (5 + 5))"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("!(true == true)", "(!(true == true))"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))",
            ),
            ("add(a + b + c * d / f + g)", "add((((a + b) + ((c * d) / f)) + g))"),
            (
                "a * [1, 2, 3, 4][b * c] * d",
                "((a * ([1, 2, 3, 4][(b * c)])) * d)",
            ),
            (
                "add(a * b[2], b[1], 2 * [1, 2][1])",
                "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))",
            ),
        ];
        for (input, expected) in tests {
            let program = parse(input);
            assert_eq!(expected, program.to_string());
        }
    }

    #[test]
    fn test_parser_errors_accumulate() {
        let tests = vec![
            ("let x 5;", "expected next token to be =, got INT instead"),
            ("let = 5;", "expected next token to be IDENT, got = instead"),
            ("@", "no prefix parse function for ILLEGAL found"),
            (
                "91234567890123456789",
                "could not parse \"91234567890123456789\" as integer",
            ),
        ];
        for (input, expected) in tests {
            let errors = parse_errors(input);
            assert!(
                errors.iter().any(|e| e == expected),
                "error {:?} not found in {:?}",
                expected,
                errors
            );
        }
    }

    #[test]
    fn test_parser_recovers_after_error() {
        // the bad statement is dropped, the good ones survive
        let lexer = Lexer::new("let x 5; let y = 7; y;");
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();
        assert_eq!(parser.errors().len(), 1);
        assert!(program
            .statements()
            .contains(&Statement::LetStatement {
                name: "y".to_string(),
                value: Expression::IntegerLiteral(7),
            }));
    }
}
