use crate::token::{lookup_ident, Token};
use std::str::Chars;

pub struct Lexer<'a> {
    input: Chars<'a>,
    cur: Option<char>,
    peek: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Self {
            input: input.chars(),
            cur: None,
            peek: None,
        };
        lexer.read_char();
        lexer.read_char();
        lexer
    }
    fn read_char(&mut self) {
        self.cur = self.peek;
        self.peek = self.input.next();
    }
    fn skip_whitespace(&mut self) {
        while self.cur.map_or(false, |c| c.is_ascii_whitespace()) {
            self.read_char();
        }
    }
    fn read_number(&mut self) -> String {
        let mut res = String::new();
        while let Some(c) = self.cur.filter(|c| c.is_ascii_digit()) {
            res.push(c);
            self.read_char();
        }
        res
    }
    fn read_identifier(&mut self) -> String {
        let mut res = String::new();
        while let Some(c) = self.cur.filter(|&c| is_letter(c)) {
            res.push(c);
            self.read_char();
        }
        res
    }
    // The opening quote has already been consumed. Strings are raw, no
    // escape sequences; an unterminated string ends at end of input.
    fn read_string(&mut self) -> String {
        let mut res = String::new();
        while let Some(c) = self.cur.filter(|&c| c != '"') {
            res.push(c);
            self.read_char();
        }
        self.read_char(); // closing quote
        res
    }
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        use Token::*;
        self.skip_whitespace();
        let c = self.cur?;
        let token = match c {
            '=' => {
                self.read_char();
                if self.cur == Some('=') {
                    self.read_char();
                    EQ
                } else {
                    ASSIGN
                }
            }
            '!' => {
                self.read_char();
                if self.cur == Some('=') {
                    self.read_char();
                    NEQ
                } else {
                    BANG
                }
            }
            '+' => {
                self.read_char();
                PLUS
            }
            '-' => {
                self.read_char();
                MINUS
            }
            '*' => {
                self.read_char();
                ASTERISK
            }
            '/' => {
                self.read_char();
                SLASH
            }
            '<' => {
                self.read_char();
                LT
            }
            '>' => {
                self.read_char();
                GT
            }
            ',' => {
                self.read_char();
                COMMA
            }
            ';' => {
                self.read_char();
                SEMICOLON
            }
            ':' => {
                self.read_char();
                COLON
            }
            '(' => {
                self.read_char();
                LPAREN
            }
            ')' => {
                self.read_char();
                RPAREN
            }
            '{' => {
                self.read_char();
                LBRACE
            }
            '}' => {
                self.read_char();
                RBRACE
            }
            '[' => {
                self.read_char();
                LBRACKET
            }
            ']' => {
                self.read_char();
                RBRACKET
            }
            '"' => {
                self.read_char();
                STRING(self.read_string())
            }
            c if c.is_ascii_digit() => INT(self.read_number()),
            c if is_letter(c) => lookup_ident(&self.read_identifier()),
            c => {
                self.read_char();
                ILLEGAL(c)
            }
        };
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::token::Token;
    use crate::token::Token::*;

    #[test]
    fn test_next_token() {
        let input = r#"let five = 5;
let ten = 10;
let add = fn(x, y) {
    x + y;
};
let result = add(five, ten);
!-/*5;
5 < 10 > 5;
if (5 < 10) {
    return true;
} else {
    return false;
}
10 == 10;
10 != 9;
"foobar"
"foo bar"
[1, 2];
{"foo": "bar"}
"#;
        let tests = vec![
            LET,
            IDENT("five".to_string()),
            ASSIGN,
            INT("5".to_string()),
            SEMICOLON,
            LET,
            IDENT("ten".to_string()),
            ASSIGN,
            INT("10".to_string()),
            SEMICOLON,
            LET,
            IDENT("add".to_string()),
            ASSIGN,
            FUNCTION,
            LPAREN,
            IDENT("x".to_string()),
            COMMA,
            IDENT("y".to_string()),
            RPAREN,
            LBRACE,
            IDENT("x".to_string()),
            PLUS,
            IDENT("y".to_string()),
            SEMICOLON,
            RBRACE,
            SEMICOLON,
            LET,
            IDENT("result".to_string()),
            ASSIGN,
            IDENT("add".to_string()),
            LPAREN,
            IDENT("five".to_string()),
            COMMA,
            IDENT("ten".to_string()),
            RPAREN,
            SEMICOLON,
            BANG,
            MINUS,
            SLASH,
            ASTERISK,
            INT("5".to_string()),
            SEMICOLON,
            INT("5".to_string()),
            LT,
            INT("10".to_string()),
            GT,
            INT("5".to_string()),
            SEMICOLON,
            IF,
            LPAREN,
            INT("5".to_string()),
            LT,
            INT("10".to_string()),
            RPAREN,
            LBRACE,
            RETURN,
            TRUE,
            SEMICOLON,
            RBRACE,
            ELSE,
            LBRACE,
            RETURN,
            FALSE,
            SEMICOLON,
            RBRACE,
            INT("10".to_string()),
            EQ,
            INT("10".to_string()),
            SEMICOLON,
            INT("10".to_string()),
            NEQ,
            INT("9".to_string()),
            SEMICOLON,
            STRING("foobar".to_string()),
            STRING("foo bar".to_string()),
            LBRACKET,
            INT("1".to_string()),
            COMMA,
            INT("2".to_string()),
            RBRACKET,
            SEMICOLON,
            LBRACE,
            STRING("foo".to_string()),
            COLON,
            STRING("bar".to_string()),
            RBRACE,
        ];
        let lexer = Lexer::new(input);
        let tokens: Vec<Token> = lexer.collect();
        assert_eq!(tests.len(), tokens.len());
        for (expected, actual) in tests.into_iter().zip(tokens.into_iter()) {
            assert_eq!(expected, actual);
        }
    }
}
