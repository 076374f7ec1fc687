#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Token {
    ILLEGAL(char),
    EOF,

    IDENT(String),
    INT(String),
    STRING(String),

    ASSIGN,   // =
    PLUS,     // +
    MINUS,    // -
    ASTERISK, // *
    SLASH,    // /
    BANG,     // !
    LT,       // <
    GT,       // >
    EQ,       // ==
    NEQ,      // !=

    COMMA,     // ,
    SEMICOLON, // ;
    COLON,     // :

    LPAREN,   // (
    RPAREN,   // )
    LBRACE,   // {
    RBRACE,   // }
    LBRACKET, // [
    RBRACKET, // ]

    FUNCTION, // fn
    LET,      // let
    RETURN,   // return
    TRUE,     // true
    FALSE,    // false
    IF,       // if
    ELSE,     // else
}

impl Token {
    // kind name without any literal payload, for parser error messages
    pub fn kind(&self) -> &'static str {
        use Token::*;
        match self {
            ILLEGAL(..) => "ILLEGAL",
            EOF => "EOF",
            IDENT(..) => "IDENT",
            INT(..) => "INT",
            STRING(..) => "STRING",
            ASSIGN => "=",
            PLUS => "+",
            MINUS => "-",
            ASTERISK => "*",
            SLASH => "/",
            BANG => "!",
            LT => "<",
            GT => ">",
            EQ => "==",
            NEQ => "!=",
            COMMA => ",",
            SEMICOLON => ";",
            COLON => ":",
            LPAREN => "(",
            RPAREN => ")",
            LBRACE => "{",
            RBRACE => "}",
            LBRACKET => "[",
            RBRACKET => "]",
            FUNCTION => "fn",
            LET => "let",
            RETURN => "return",
            TRUE => "true",
            FALSE => "false",
            IF => "if",
            ELSE => "else",
        }
    }
}

pub fn lookup_ident(ident: &str) -> Token {
    match ident {
        "fn" => Token::FUNCTION,
        "let" => Token::LET,
        "return" => Token::RETURN,
        "true" => Token::TRUE,
        "false" => Token::FALSE,
        "if" => Token::IF,
        "else" => Token::ELSE,
        _ => Token::IDENT(ident.to_string()),
    }
}
