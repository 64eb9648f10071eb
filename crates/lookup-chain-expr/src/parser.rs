//! Expression parser
//!
//! A recursive descent parser for the call-expression grammar: literals, names,
//! calls with positional and keyword arguments, attribute access, subscripts,
//! `and`/`or`, prefix `+`/`-` and `body if test else orelse`.

use crate::ast::{BoolOperator, Expr, Keyword, Statement, UnaryOperator};
use crate::error::{ExprError, ExprResult};

/// Parse a single expression
///
/// # Example
/// ```rust
/// use lookup_chain_expr::parse_expression;
///
/// let ast = parse_expression("LOOKUP(a, b)").unwrap();
/// let ast = parse_expression("x.at['k', 'v']").unwrap();
/// let ast = parse_expression("1 if flag else 2").unwrap();
/// ```
pub fn parse_expression(text: &str) -> ExprResult<Expr> {
    let mut parser = ExprParser::new(text)?;
    let expr = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse a statement of the form `target = expr` or a bare `expr`
///
/// The target must be a name, attribute or subscript.
pub fn parse_statement(text: &str) -> ExprResult<Statement> {
    let mut parser = ExprParser::new(text)?;
    let first = parser.parse_expression()?;

    if !matches!(parser.current_token(), Token::Assign) {
        parser.expect_end()?;
        return Ok(Statement {
            target: None,
            value: first,
        });
    }

    if !matches!(
        first,
        Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. }
    ) {
        return Err(ExprError::Syntax(format!(
            "cannot assign to expression in '{}'",
            text
        )));
    }

    parser.consume();
    let value = parser.parse_expression()?;
    parser.expect_end()?;

    Ok(Statement {
        target: Some(first),
        value,
    })
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),

    // Identifiers and keywords
    Identifier(String),
    True,
    False,
    None,
    And,
    Or,
    If,
    Else,

    // Operators
    Plus,
    Minus,
    Assign,
    Dot,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,

    // Anything the grammar has no use for
    Unknown(char),

    // End of input
    Eof,
}

/// Scans the whole input into tokens up front; keyword arguments need one
/// token of lookahead past the identifier.
struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn tokenize(mut self) -> ExprResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn scan_token(&mut self) -> ExprResult<Token> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '[' => Some(Token::LeftBracket),
            ']' => Some(Token::RightBracket),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // `=` is assignment, `==` is not part of the grammar
        if c == '=' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::Unknown('='));
            }
            return Ok(Token::Assign);
        }

        if c == '\'' || c == '"' {
            return self.scan_string(c);
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c == '.' {
            self.advance();
            return Ok(Token::Dot);
        }

        if c.is_alphabetic() || c == '_' {
            return Ok(self.scan_identifier());
        }

        self.advance();
        Ok(Token::Unknown(c))
    }

    fn scan_string(&mut self, quote: char) -> ExprResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(Token::String(s));
                }
                Some('\\') => {
                    self.advance();
                    if let Some(escaped) = self.peek_char() {
                        s.push(escaped);
                        self.advance();
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => {
                    return Err(ExprError::Syntax(format!(
                        "unterminated string literal '{}'",
                        &self.input[start..]
                    )))
                }
            }
        }
    }

    fn scan_number(&mut self) -> ExprResult<Token> {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse()
            .map(Token::Number)
            .map_err(|_| ExprError::Syntax(format!("invalid number literal '{}'", num_str)))
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }

        match &self.input[start..self.pos] {
            "True" => Token::True,
            "False" => Token::False,
            "None" => Token::None,
            "and" => Token::And,
            "or" => Token::Or,
            "if" => Token::If,
            "else" => Token::Else,
            text => Token::Identifier(text.to_string()),
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }
}

/// Expression parser
struct ExprParser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn new(input: &'a str) -> ExprResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self {
            input,
            tokens,
            pos: 0,
        })
    }

    fn current_token(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek_token(&self) -> &Token {
        self.tokens.get(self.pos + 1).unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> ExprResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {:?}", expected)))
        }
    }

    fn expect_end(&self) -> ExprResult<()> {
        if matches!(self.current_token(), Token::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("expected end of input"))
        }
    }

    fn unexpected(&self, what: &str) -> ExprError {
        ExprError::Syntax(format!(
            "{}, got {:?} in '{}'",
            what,
            self.current_token(),
            self.input
        ))
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Conditional: body if test else orelse
    // 2. or
    // 3. and
    // 4. Unary: +, -
    // 5. Postfix: call, attribute, subscript
    // 6. Primary: literals, names, parentheses

    fn parse_expression(&mut self) -> ExprResult<Expr> {
        let body = self.parse_or()?;

        if !matches!(self.current_token(), Token::If) {
            return Ok(body);
        }

        self.consume();
        let test = self.parse_or()?;
        self.expect(&Token::Else)?;
        // Right associative: `a if x else b if y else c`
        let orelse = self.parse_expression()?;

        Ok(Expr::Conditional {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    fn parse_or(&mut self) -> ExprResult<Expr> {
        let first = self.parse_and()?;
        let mut values = vec![first];

        while matches!(self.current_token(), Token::Or) {
            self.consume();
            values.push(self.parse_and()?);
        }

        Ok(Self::bool_op(BoolOperator::Or, values))
    }

    fn parse_and(&mut self) -> ExprResult<Expr> {
        let first = self.parse_unary()?;
        let mut values = vec![first];

        while matches!(self.current_token(), Token::And) {
            self.consume();
            values.push(self.parse_unary()?);
        }

        Ok(Self::bool_op(BoolOperator::And, values))
    }

    fn bool_op(op: BoolOperator, mut values: Vec<Expr>) -> Expr {
        if values.len() == 1 {
            return values.remove(0);
        }
        Expr::BoolOp { op, values }
    }

    fn parse_unary(&mut self) -> ExprResult<Expr> {
        let op = match self.current_token() {
            Token::Plus => UnaryOperator::Plus,
            Token::Minus => UnaryOperator::Minus,
            _ => return self.parse_postfix(),
        };

        self.consume();
        let operand = self.parse_unary()?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> ExprResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_token() {
                Token::LeftParen => {
                    expr = self.parse_call(expr)?;
                }
                Token::Dot => {
                    self.consume();
                    match self.consume() {
                        Token::Identifier(attr) => {
                            expr = Expr::Attribute {
                                value: Box::new(expr),
                                attr,
                            };
                        }
                        _ => {
                            self.pos -= 1;
                            return Err(self.unexpected("expected attribute name after '.'"));
                        }
                    }
                }
                Token::LeftBracket => {
                    expr = self.parse_subscript(expr)?;
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> ExprResult<Expr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume();
                Ok(Expr::Number(n))
            }

            Token::String(s) => {
                self.consume();
                Ok(Expr::String(s))
            }

            Token::True => {
                self.consume();
                Ok(Expr::Boolean(true))
            }

            Token::False => {
                self.consume();
                Ok(Expr::Boolean(false))
            }

            Token::None => {
                self.consume();
                Ok(Expr::None)
            }

            Token::Identifier(name) => {
                self.consume();
                Ok(Expr::Name(name))
            }

            Token::LeftParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            _ => Err(self.unexpected("unexpected token")),
        }
    }

    fn parse_call(&mut self, func: Expr) -> ExprResult<Expr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();
        let mut keywords = Vec::new();

        while !matches!(self.current_token(), Token::RightParen) {
            if let (Token::Identifier(arg), Token::Assign) =
                (self.current_token().clone(), self.peek_token())
            {
                self.consume();
                self.consume();
                let value = self.parse_expression()?;
                keywords.push(Keyword { arg, value });
            } else if keywords.is_empty() {
                args.push(self.parse_expression()?);
            } else {
                return Err(self.unexpected("positional argument follows keyword argument"));
            }

            if matches!(self.current_token(), Token::Comma) {
                self.consume();
            } else {
                break;
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(Expr::Call {
            func: Box::new(func),
            args,
            keywords,
        })
    }

    fn parse_subscript(&mut self, value: Expr) -> ExprResult<Expr> {
        self.expect(&Token::LeftBracket)?;

        let mut keys = vec![self.parse_expression()?];
        while matches!(self.current_token(), Token::Comma) {
            self.consume();
            if matches!(self.current_token(), Token::RightBracket) {
                break;
            }
            keys.push(self.parse_expression()?);
        }

        self.expect(&Token::RightBracket)?;

        Ok(Expr::Subscript {
            value: Box::new(value),
            keys,
        })
    }
}
