// Formula parser - converts a formula body (text after the leading '=')
// into an AST. Supports: numbers, cell refs (A1), ranges (A1:B2),
// functions (SUM), basic math (+, -, *, /)

use super::functions;
use super::refs::{self, CellRef};

/// Expression AST produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    CellRef(CellRef),
    Range(CellRef, CellRef),
    Function {
        name: String,
        args: Vec<Expr>,
    },
    BinaryOp {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone)]
enum Token {
    Number(f64),
    CellRef(CellRef),
    /// A range lexed as one token: ref ':' ref with no intervening whitespace
    Range(CellRef, CellRef),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

/// Parse a formula body into an AST. The caller strips the leading '='.
pub fn parse_body(body: &str) -> Result<Expr, String> {
    let tokens = tokenize(body)?;
    if tokens.is_empty() {
        return Err("Empty formula".to_string());
    }
    let (expr, pos) = parse_expression(&tokens, 0)?;
    if pos != tokens.len() {
        return Err("Unexpected token".to_string());
    }
    Ok(expr)
}

/// Collect a run of characters that can form a reference or identifier.
fn collect_chunk(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut chunk = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_alphanumeric() || ch == '$' {
            chunk.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    chunk
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => { chars.next(); }
            '+' => { tokens.push(Token::Plus); chars.next(); }
            '-' => { tokens.push(Token::Minus); chars.next(); }
            '*' => { tokens.push(Token::Star); chars.next(); }
            '/' => { tokens.push(Token::Slash); chars.next(); }
            '(' => { tokens.push(Token::LParen); chars.next(); }
            ')' => { tokens.push(Token::RParen); chars.next(); }
            ',' => { tokens.push(Token::Comma); chars.next(); }
            'A'..='Z' | 'a'..='z' | '$' => {
                let chunk = collect_chunk(&mut chars);
                if let Some(start) = refs::parse_a1(&chunk) {
                    // Range if immediately followed by ':' and another reference
                    if chars.peek() == Some(&':') {
                        let mut lookahead = chars.clone();
                        lookahead.next(); // skip ':'
                        let end_chunk = collect_chunk(&mut lookahead);
                        if let Some(end) = refs::parse_a1(&end_chunk) {
                            chars.next(); // commit the ':'
                            for _ in 0..end_chunk.len() {
                                chars.next();
                            }
                            tokens.push(Token::Range(start, end));
                            continue;
                        }
                    }
                    tokens.push(Token::CellRef(start));
                } else if c == '$' {
                    return Err(format!("Invalid cell reference: {}", chunk));
                } else {
                    tokens.push(Token::Ident(chunk.to_uppercase()));
                }
            }
            '0'..='9' => {
                let mut num_str = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        num_str.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // Fractional part only if '.' is followed by a digit
                if chars.peek() == Some(&'.') {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.peek().is_some_and(|d| d.is_ascii_digit()) {
                        num_str.push('.');
                        chars.next();
                        while let Some(&d) = chars.peek() {
                            if d.is_ascii_digit() {
                                num_str.push(d);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                    }
                }
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| format!("Invalid number: {}", num_str))?;
                tokens.push(Token::Number(num));
            }
            _ => return Err(format!("Unexpected character: {}", c)),
        }
    }

    Ok(tokens)
}

// expression := term (('+'|'-') term)*
fn parse_expression(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_term(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Plus => Op::Add,
            Token::Minus => Op::Sub,
            _ => break,
        };
        let (right, new_pos) = parse_term(tokens, pos + 1)?;
        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

// term := factor (('*'|'/') factor)*
fn parse_term(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_factor(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Star => Op::Mul,
            Token::Slash => Op::Div,
            _ => break,
        };
        let (right, new_pos) = parse_factor(tokens, pos + 1)?;
        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

// factor := '+' factor | '-' factor | primary
fn parse_factor(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    if pos >= tokens.len() {
        return Err("Unexpected end of expression".to_string());
    }
    match &tokens[pos] {
        Token::Plus => {
            // Unary plus is a no-op
            parse_factor(tokens, pos + 1)
        }
        Token::Minus => {
            // Unary minus desugars to 0 - x
            let (expr, pos) = parse_factor(tokens, pos + 1)?;
            Ok((
                Expr::BinaryOp {
                    op: Op::Sub,
                    left: Box::new(Expr::Number(0.0)),
                    right: Box::new(expr),
                },
                pos,
            ))
        }
        _ => parse_primary(tokens, pos),
    }
}

fn parse_primary(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    if pos >= tokens.len() {
        return Err("Unexpected end of expression".to_string());
    }

    match &tokens[pos] {
        Token::Number(n) => Ok((Expr::Number(*n), pos + 1)),
        Token::CellRef(r) => Ok((Expr::CellRef(*r), pos + 1)),
        Token::Range(start, end) => Ok((Expr::Range(*start, *end), pos + 1)),
        Token::Ident(name) => {
            // An identifier is only legal immediately before '('
            match tokens.get(pos + 1) {
                Some(Token::LParen) => {}
                _ => return Err("Unexpected token".to_string()),
            }
            if !functions::is_known_function(name) {
                return Err(format!("Unknown function {}", name));
            }
            let (args, new_pos) = parse_function_args(tokens, pos + 2)?;
            Ok((
                Expr::Function {
                    name: name.clone(),
                    args,
                },
                new_pos,
            ))
        }
        Token::LParen => {
            let (expr, pos) = parse_expression(tokens, pos + 1)?;
            match tokens.get(pos) {
                Some(Token::RParen) => Ok((expr, pos + 1)),
                _ => Err("Missing closing parenthesis".to_string()),
            }
        }
        _ => Err("Unexpected token".to_string()),
    }
}

fn parse_function_args(tokens: &[Token], pos: usize) -> Result<(Vec<Expr>, usize), String> {
    let mut args = Vec::new();
    let mut pos = pos;

    // Empty argument list: SUM()
    if let Some(Token::RParen) = tokens.get(pos) {
        return Ok((args, pos + 1));
    }

    loop {
        let (arg, new_pos) = parse_expression(tokens, pos)?;
        args.push(arg);
        pos = new_pos;

        match tokens.get(pos) {
            Some(Token::RParen) => return Ok((args, pos + 1)),
            Some(Token::Comma) => pos += 1,
            Some(_) => return Err("Expected comma or closing parenthesis".to_string()),
            None => return Err("Missing closing parenthesis in function call".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: usize, col: usize) -> Expr {
        Expr::CellRef(CellRef::new(row, col))
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_body("42"), Ok(Expr::Number(42.0)));
        assert_eq!(parse_body("1.25"), Ok(Expr::Number(1.25)));
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_body("B3"), Ok(cell(2, 1)));
        assert_eq!(parse_body("aa10"), Ok(cell(9, 26)));
    }

    #[test]
    fn test_parse_absolute_flags_survive() {
        let expr = parse_body("$A$1+A$1").unwrap();
        match expr {
            Expr::BinaryOp { op: Op::Add, left, right } => {
                match (*left, *right) {
                    (Expr::CellRef(a), Expr::CellRef(b)) => {
                        assert!(a.col_abs && a.row_abs);
                        assert!(!b.col_abs && b.row_abs);
                    }
                    other => panic!("Expected two cell refs, got {:?}", other),
                }
            }
            other => panic!("Expected Add, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_range_token() {
        let expr = parse_body("A1:B2").unwrap();
        assert_eq!(expr, Expr::Range(CellRef::new(0, 0), CellRef::new(1, 1)));
    }

    #[test]
    fn test_precedence() {
        // A1+B1*3 parses as A1+(B1*3)
        let expr = parse_body("A1+B1*3").unwrap();
        match expr {
            Expr::BinaryOp { op: Op::Add, left, right } => {
                assert_eq!(*left, cell(0, 0));
                assert!(matches!(*right, Expr::BinaryOp { op: Op::Mul, .. }));
            }
            other => panic!("Expected Add at root, got {:?}", other),
        }
    }

    #[test]
    fn test_parens_override_precedence() {
        // (1+2)*3 parses as Mul at root
        let expr = parse_body("(1+2)*3").unwrap();
        assert!(matches!(expr, Expr::BinaryOp { op: Op::Mul, .. }));
    }

    #[test]
    fn test_unary_minus_desugars() {
        let expr = parse_body("-A1").unwrap();
        match expr {
            Expr::BinaryOp { op: Op::Sub, left, right } => {
                assert_eq!(*left, Expr::Number(0.0));
                assert_eq!(*right, cell(0, 0));
            }
            other => panic!("Expected Sub, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_plus_noop() {
        assert_eq!(parse_body("+1"), Ok(Expr::Number(1.0)));
        assert_eq!(parse_body("++1"), Ok(Expr::Number(1.0)));
    }

    #[test]
    fn test_function_call() {
        let expr = parse_body("SUM(A1:B1,5)").unwrap();
        match expr {
            Expr::Function { name, args } => {
                assert_eq!(name, "SUM");
                assert_eq!(args.len(), 2);
                assert!(matches!(args[0], Expr::Range(..)));
                assert_eq!(args[1], Expr::Number(5.0));
            }
            other => panic!("Expected Function, got {:?}", other),
        }
    }

    #[test]
    fn test_function_name_case_insensitive() {
        assert!(parse_body("sum(1)").is_ok());
        assert!(parse_body("Sum(1)").is_ok());
    }

    #[test]
    fn test_empty_args() {
        let expr = parse_body("SUM()").unwrap();
        match expr {
            Expr::Function { args, .. } => assert!(args.is_empty()),
            other => panic!("Expected Function, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_function_fails_with_name() {
        let err = parse_body("A1+BADFUNC(1)").unwrap_err();
        assert!(err.contains("BADFUNC"), "message was: {}", err);
    }

    #[test]
    fn test_bare_identifier_rejected() {
        assert!(parse_body("SUM").is_err());
        assert!(parse_body("FOO+1").is_err());
    }

    #[test]
    fn test_trailing_token_rejected() {
        assert_eq!(parse_body("1 2"), Err("Unexpected token".to_string()));
        assert_eq!(parse_body("A1 B1"), Err("Unexpected token".to_string()));
    }

    #[test]
    fn test_unexpected_character() {
        let err = parse_body("1 # 2").unwrap_err();
        assert!(err.contains("Unexpected character"), "message was: {}", err);
    }

    #[test]
    fn test_lone_colon_rejected() {
        // ':' is only legal between two references
        let err = parse_body("A1:5").unwrap_err();
        assert!(err.contains("Unexpected character"), "message was: {}", err);
    }

    #[test]
    fn test_trailing_dot_rejected() {
        let err = parse_body("1.").unwrap_err();
        assert!(err.contains("Unexpected character"), "message was: {}", err);
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(parse_body(""), Err("Empty formula".to_string()));
        assert_eq!(parse_body("   "), Err("Empty formula".to_string()));
    }

    #[test]
    fn test_missing_close_paren() {
        assert!(parse_body("(1+2").is_err());
        assert!(parse_body("SUM(1,2").is_err());
    }

    #[test]
    fn test_absolute_range_endpoints() {
        let expr = parse_body("$A1:A$5").unwrap();
        match expr {
            Expr::Range(start, end) => {
                assert!(start.col_abs && !start.row_abs);
                assert!(!end.col_abs && end.row_abs);
            }
            other => panic!("Expected Range, got {:?}", other),
        }
    }
}
