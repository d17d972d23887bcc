use crate::ast::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::fault::Fault;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),

    // Identifiers & keywords
    Name(String),
    True,
    False,
    None,
    And,
    Or,
    Not,

    // Operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    Assign,  // =
    EqEq,    // ==
    NotEq,   // !=
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Grouping & punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Semicolon,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse one logical input (continuation lines already joined) into its
/// `;`-separated statements.
pub fn parse_input(input: &str) -> Result<Vec<Stmt>, Fault> {
    let tokens = tokenize(input)?;
    let mut parser = StmtParser::new(tokens);
    let mut stmts = Vec::new();

    while !parser.at_end() {
        stmts.push(parser.parse_stmt()?);
        if !parser.at_end() {
            parser.expect(Token::Semicolon)?;
        }
    }

    if stmts.is_empty() {
        return Err(Fault::InvalidSyntax("empty input".into()));
    }
    Ok(stmts)
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

fn tokenize(input: &str) -> Result<Vec<Token>, Fault> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            // Newlines from joined continuation lines are plain whitespace.
            ' ' | '\t' | '\n' | '\r' => i += 1,

            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let mut is_float = false;
                if i < chars.len() && chars[i] == '.' {
                    // `1.` and `1.5` are floats; `1.method()` is not.
                    if i + 1 >= chars.len() || !chars[i + 1].is_ascii_alphabetic() {
                        is_float = true;
                        i += 1;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                if is_float {
                    let f = text
                        .parse::<f64>()
                        .map_err(|_| Fault::InvalidSyntax(format!("invalid number '{}'", text)))?;
                    tokens.push(Token::Float(f));
                } else {
                    let n = text
                        .parse::<i64>()
                        .map_err(|_| Fault::InvalidSyntax(format!("invalid number '{}'", text)))?;
                    tokens.push(Token::Int(n));
                }
            }

            '\'' | '"' => {
                let quote = c;
                i += 1;
                let mut s = String::new();
                loop {
                    if i >= chars.len() {
                        return Err(Fault::InvalidSyntax(
                            "unterminated string literal".into(),
                        ));
                    }
                    match chars[i] {
                        '\\' if i + 1 < chars.len() => {
                            s.push(match chars[i + 1] {
                                'n' => '\n',
                                't' => '\t',
                                other => other,
                            });
                            i += 2;
                        }
                        q if q == quote => {
                            i += 1;
                            break;
                        }
                        other => {
                            s.push(other);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }

            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "True" => Token::True,
                    "False" => Token::False,
                    "None" => Token::None,
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Name(word),
                });
            }

            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::StarStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::SlashSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    tokens.push(Token::Assign);
                    i += 1;
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    return Err(Fault::InvalidSyntax("invalid syntax".into()));
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::LtEq);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::GtEq);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            ';' => {
                tokens.push(Token::Semicolon);
                i += 1;
            }
            '#' => break, // trailing comment on an input line

            other => {
                return Err(Fault::InvalidSyntax(format!(
                    "invalid character '{}'",
                    other
                )));
            }
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Statement & expression parser
// ---------------------------------------------------------------------------

struct StmtParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl StmtParser {
    fn new(tokens: Vec<Token>) -> Self {
        StmtParser { tokens, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<(), Fault> {
        match self.advance() {
            Some(tok) if tok == expected => Ok(()),
            _ => Err(Fault::InvalidSyntax("invalid syntax".into())),
        }
    }

    /// `name = expr` is an assignment; anything else is an expression.
    fn parse_stmt(&mut self) -> Result<Stmt, Fault> {
        if let (Some(Token::Name(name)), Some(Token::Assign)) =
            (self.tokens.get(self.pos), self.tokens.get(self.pos + 1))
        {
            let target = name.clone();
            self.pos += 2;
            let value = self.parse_expr(0)?;
            return Ok(Stmt::Assign { target, value });
        }
        Ok(Stmt::Expr(self.parse_expr(0)?))
    }

    /// Precedence-climbing expression parser.
    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, Fault> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some(op) = self.peek().and_then(binary_op) else {
                break;
            };
            let (lbp, rbp) = binding_power(op);
            if lbp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(rbp)?;
            lhs = Expr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, Fault> {
        let expr = match self.advance() {
            Some(Token::Int(n)) => Expr::Int(n),
            Some(Token::Float(f)) => Expr::Float(f),
            Some(Token::Str(s)) => Expr::Str(s),
            Some(Token::True) => Expr::Bool(true),
            Some(Token::False) => Expr::Bool(false),
            Some(Token::None) => Expr::None,
            Some(Token::Name(name)) => Expr::Name(name),

            Some(Token::Minus) => {
                // Unary minus binds tighter than any binary operator except **.
                let operand = self.parse_expr(13)?;
                Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                }
            }
            Some(Token::Not) => {
                let operand = self.parse_expr(5)?;
                Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                }
            }

            Some(Token::LParen) => {
                // Unit `()`, a parenthesized expression, or a tuple.
                if self.peek() == Some(&Token::RParen) {
                    self.advance();
                    Expr::Tuple(Vec::new())
                } else {
                    let first = self.parse_expr(0)?;
                    if self.peek() == Some(&Token::Comma) {
                        let mut items = vec![first];
                        while self.peek() == Some(&Token::Comma) {
                            self.advance();
                            if self.peek() == Some(&Token::RParen) {
                                break;
                            }
                            items.push(self.parse_expr(0)?);
                        }
                        self.expect(Token::RParen)?;
                        Expr::Tuple(items)
                    } else {
                        self.expect(Token::RParen)?;
                        first
                    }
                }
            }

            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if self.peek() != Some(&Token::RBracket) {
                    loop {
                        items.push(self.parse_expr(0)?);
                        if self.peek() == Some(&Token::Comma) {
                            self.advance();
                            if self.peek() == Some(&Token::RBracket) {
                                break;
                            }
                        } else {
                            break;
                        }
                    }
                }
                self.expect(Token::RBracket)?;
                Expr::List(items)
            }

            _ => return Err(Fault::InvalidSyntax("invalid syntax".into())),
        };

        self.parse_trailers(expr)
    }

    /// Postfix chains: attribute access, calls, indexing.
    fn parse_trailers(&mut self, mut expr: Expr) -> Result<Expr, Fault> {
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    let Some(Token::Name(name)) = self.advance() else {
                        return Err(Fault::InvalidSyntax("invalid syntax".into()));
                    };
                    expr = Expr::Attribute {
                        target: Box::new(expr),
                        name,
                    };
                }
                Some(Token::LParen) => {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.parse_expr(0)?);
                            if self.peek() == Some(&Token::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen)?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expr(0)?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    Some(match token {
        Token::Or => BinaryOp::Or,
        Token::And => BinaryOp::And,
        Token::EqEq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::Ne,
        Token::Lt => BinaryOp::Lt,
        Token::Gt => BinaryOp::Gt,
        Token::LtEq => BinaryOp::Le,
        Token::GtEq => BinaryOp::Ge,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::TrueDiv,
        Token::SlashSlash => BinaryOp::FloorDiv,
        Token::Percent => BinaryOp::Mod,
        Token::StarStar => BinaryOp::Pow,
        _ => return None,
    })
}

/// (left, right) binding powers; right > left makes the operator
/// left-associative, the reverse makes it right-associative (`**`).
fn binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Or => (1, 2),
        BinaryOp::And => (3, 4),
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Gt
        | BinaryOp::Le
        | BinaryOp::Ge => (7, 8),
        BinaryOp::Add | BinaryOp::Sub => (9, 10),
        BinaryOp::Mul | BinaryOp::TrueDiv | BinaryOp::FloorDiv | BinaryOp::Mod => (11, 12),
        BinaryOp::Pow => (16, 15),
    }
}
