// Expression parser - converts one line of calculator input into an AST
// Supports: numbers (decimal, exponent, 0x hex), identifiers, assignment (name = expr),
// arithmetic (+, -, *, /, ^), modulo and postfix percent (%), factorial (!),
// implicit multiplication (3 miles, 2(4)), function calls, unit conversion (to / in)

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Variable, constant, or unit name (resolved at evaluation time)
    Ident(String),
    Function {
        name: String,
        args: Vec<Expr>,
    },
    BinaryOp {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Neg(Box<Expr>),
    Percent(Box<Expr>),
    Factorial(Box<Expr>),
    /// `value to target` / `value in target`
    Convert {
        value: Box<Expr>,
        target: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

/// One parsed line
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Blank line or comment-only line
    Empty,
    Expr(Expr),
    Assign { name: String, value: Expr },
}

/// Parse a single line. Blank lines and `#` comments parse to `Statement::Empty`.
pub fn parse_statement(line: &str) -> Result<Statement, String> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(Statement::Empty);
    }

    // Assignment: IDENT '=' expr
    if let [Token::Ident(name), Token::Eq, rest @ ..] = tokens.as_slice() {
        if rest.is_empty() {
            return Err(format!("Missing value in assignment to {}", name));
        }
        let value = parse_all(rest)?;
        return Ok(Statement::Assign { name: name.clone(), value });
    }

    Ok(Statement::Expr(parse_all(&tokens)?))
}

/// Parse an expression (no assignment allowed)
pub fn parse_expr(input: &str) -> Result<Expr, String> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("Empty expression".to_string());
    }
    parse_all(&tokens)
}

fn parse_all(tokens: &[Token]) -> Result<Expr, String> {
    let (expr, pos) = parse_conversion(tokens, 0)?;
    if pos < tokens.len() {
        return Err(format!("Unexpected token {} at position {}", tokens[pos], pos));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Bang,
    LParen,
    RParen,
    Comma,
    Eq,
    /// `to` / `in` conversion keyword
    To,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(s) => write!(f, "\"{}\"", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::Percent => write!(f, "%"),
            Token::Bang => write!(f, "!"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Eq => write!(f, "="),
            Token::To => write!(f, "to"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' => { chars.next(); }
            // Comment runs to end of line
            '#' => break,
            '+' => { tokens.push(Token::Plus); chars.next(); }
            '-' => { tokens.push(Token::Minus); chars.next(); }
            '*' => { tokens.push(Token::Star); chars.next(); }
            '/' => { tokens.push(Token::Slash); chars.next(); }
            '^' => { tokens.push(Token::Caret); chars.next(); }
            '%' => { tokens.push(Token::Percent); chars.next(); }
            '!' => { tokens.push(Token::Bang); chars.next(); }
            '(' => { tokens.push(Token::LParen); chars.next(); }
            ')' => { tokens.push(Token::RParen); chars.next(); }
            ',' => { tokens.push(Token::Comma); chars.next(); }
            '=' => { tokens.push(Token::Eq); chars.next(); }
            'A'..='Z' | 'a'..='z' | '_' => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if ident == "to" || ident == "in" {
                    tokens.push(Token::To);
                } else {
                    tokens.push(Token::Ident(ident));
                }
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();

                // Hexadecimal literal: 0x followed by at least one hex digit
                if c == '0' {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.next() == Some('x')
                        && lookahead.peek().is_some_and(|d| d.is_ascii_hexdigit())
                    {
                        chars.next();
                        chars.next();
                        while let Some(&d) = chars.peek() {
                            if d.is_ascii_hexdigit() {
                                num_str.push(d);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        let num = i64::from_str_radix(&num_str, 16)
                            .map_err(|_| format!("Invalid hex number: 0x{}", num_str))?;
                        tokens.push(Token::Number(num as f64));
                        continue;
                    }
                }

                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num_str.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }

                // Exponent: e/E followed by a digit, or by a sign and a digit
                if matches!(chars.peek(), Some('e') | Some('E')) {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    let mut exp = String::from("e");
                    if let Some(&sign) = lookahead.peek() {
                        if sign == '+' || sign == '-' {
                            exp.push(sign);
                            lookahead.next();
                        }
                    }
                    if lookahead.peek().is_some_and(|d| d.is_ascii_digit()) {
                        while let Some(&d) = lookahead.peek() {
                            if d.is_ascii_digit() {
                                exp.push(d);
                                lookahead.next();
                            } else {
                                break;
                            }
                        }
                        num_str.push_str(&exp);
                        chars = lookahead;
                    }
                }

                let num: f64 = num_str.parse().map_err(|_| format!("Invalid number: {}", num_str))?;
                tokens.push(Token::Number(num));
            }
            _ => return Err(format!("Unexpected character: {}", c)),
        }
    }

    Ok(tokens)
}

// Lowest precedence: unit conversion (`3 miles to km`)
fn parse_conversion(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_add_sub(tokens, pos)?;

    while pos < tokens.len() {
        if let Token::To = &tokens[pos] {
            let (target, new_pos) = parse_mul_div(tokens, pos + 1)?;
            left = Expr::Convert {
                value: Box::new(left),
                target: Box::new(target),
            };
            pos = new_pos;
        } else {
            break;
        }
    }

    Ok((left, pos))
}

fn parse_add_sub(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_mul_div(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Plus => Op::Add,
            Token::Minus => Op::Sub,
            _ => break,
        };
        let (right, new_pos) = parse_mul_div(tokens, pos + 1)?;
        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_mul_div(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_unary(tokens, pos)?;

    while pos < tokens.len() {
        let (op, next) = match &tokens[pos] {
            Token::Star => (Op::Mul, pos + 1),
            Token::Slash => (Op::Div, pos + 1),
            // A `%` left over from parse_postfix sits between two operands: modulo
            Token::Percent => (Op::Mod, pos + 1),
            // Implicit multiplication: `3 miles`, `2 data`, `2(3+1)`
            Token::Ident(_) | Token::LParen => (Op::Mul, pos),
            _ => break,
        };
        let (right, new_pos) = parse_unary(tokens, next)?;
        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_unary(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    match tokens.get(pos) {
        Some(Token::Minus) => {
            let (expr, pos) = parse_unary(tokens, pos + 1)?;
            Ok((Expr::Neg(Box::new(expr)), pos))
        }
        // Unary plus is a no-op
        Some(Token::Plus) => parse_unary(tokens, pos + 1),
        _ => parse_power(tokens, pos),
    }
}

// Exponentiation (^) - right-associative, binds tighter than unary minus on its left
fn parse_power(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (base, pos) = parse_postfix(tokens, pos)?;

    if let Some(Token::Caret) = tokens.get(pos) {
        let (exponent, new_pos) = parse_unary(tokens, pos + 1)?;
        return Ok((
            Expr::BinaryOp {
                op: Op::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            },
            new_pos,
        ));
    }

    Ok((base, pos))
}

// Postfix factorial (!) and percent (%). A `%` followed by an operand is modulo
// and is left for parse_mul_div.
fn parse_postfix(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let (mut expr, mut pos) = parse_primary(tokens, pos)?;

    while pos < tokens.len() {
        match &tokens[pos] {
            Token::Bang => {
                expr = Expr::Factorial(Box::new(expr));
                pos += 1;
            }
            Token::Percent if !starts_operand(tokens.get(pos + 1)) => {
                expr = Expr::Percent(Box::new(expr));
                pos += 1;
            }
            _ => break,
        }
    }

    Ok((expr, pos))
}

fn starts_operand(token: Option<&Token>) -> bool {
    matches!(
        token,
        Some(Token::Number(_)) | Some(Token::Ident(_)) | Some(Token::LParen)
    )
}

fn parse_primary(tokens: &[Token], pos: usize) -> Result<(Expr, usize), String> {
    let Some(token) = tokens.get(pos) else {
        return Err("Unexpected end of expression".to_string());
    };

    match token {
        Token::Number(n) => Ok((Expr::Number(*n), pos + 1)),
        Token::Ident(name) => {
            if let Some(Token::LParen) = tokens.get(pos + 1) {
                let (args, new_pos) = parse_function_args(tokens, pos + 2)?;
                return Ok((
                    Expr::Function {
                        name: name.clone(),
                        args,
                    },
                    new_pos,
                ));
            }
            Ok((Expr::Ident(name.clone()), pos + 1))
        }
        Token::LParen => {
            let (expr, pos) = parse_conversion(tokens, pos + 1)?;
            match tokens.get(pos) {
                Some(Token::RParen) => Ok((expr, pos + 1)),
                Some(_) => Err("Expected closing parenthesis".to_string()),
                None => Err("Missing closing parenthesis".to_string()),
            }
        }
        Token::Minus | Token::Plus => parse_unary(tokens, pos),
        other => Err(format!("Unexpected token {} at position {}", other, pos)),
    }
}

fn parse_function_args(tokens: &[Token], pos: usize) -> Result<(Vec<Expr>, usize), String> {
    let mut args = Vec::new();
    let mut pos = pos;

    // Empty call: f()
    if let Some(Token::RParen) = tokens.get(pos) {
        return Ok((args, pos + 1));
    }

    loop {
        let (arg, new_pos) = parse_conversion(tokens, pos)?;
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

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse_statement("").unwrap(), Statement::Empty);
        assert_eq!(parse_statement("   \t").unwrap(), Statement::Empty);
        assert_eq!(parse_statement("# groceries").unwrap(), Statement::Empty);
    }

    #[test]
    fn test_assignment() {
        let stmt = parse_statement("data = 10").unwrap();
        assert_eq!(
            stmt,
            Statement::Assign { name: "data".into(), value: Expr::Number(10.0) }
        );
        assert!(parse_statement("data =").is_err());
    }

    #[test]
    fn test_lone_equals_is_an_error() {
        assert!(parse_statement("=").is_err());
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3
        let expr = parse_expr("1+2*3").unwrap();
        assert_eq!(
            expr,
            Expr::BinaryOp {
                op: Op::Add,
                left: num(1.0),
                right: Box::new(Expr::BinaryOp { op: Op::Mul, left: num(2.0), right: num(3.0) }),
            }
        );
    }

    #[test]
    fn test_power_is_right_associative_and_beats_negation() {
        let expr = parse_expr("-2^2").unwrap();
        assert_eq!(
            expr,
            Expr::Neg(Box::new(Expr::BinaryOp { op: Op::Pow, left: num(2.0), right: num(2.0) }))
        );

        let expr = parse_expr("2^3^2").unwrap();
        assert_eq!(
            expr,
            Expr::BinaryOp {
                op: Op::Pow,
                left: num(2.0),
                right: Box::new(Expr::BinaryOp { op: Op::Pow, left: num(3.0), right: num(2.0) }),
            }
        );
    }

    #[test]
    fn test_percent_versus_modulo() {
        assert_eq!(
            parse_expr("8%5").unwrap(),
            Expr::BinaryOp { op: Op::Mod, left: num(8.0), right: num(5.0) }
        );
        assert_eq!(parse_expr("25%").unwrap(), Expr::Percent(num(25.0)));
        assert!(matches!(
            parse_expr("(200 *25%)").unwrap(),
            Expr::BinaryOp { op: Op::Mul, .. }
        ));
    }

    #[test]
    fn test_hex_and_exponent_literals() {
        assert_eq!(parse_expr("0x90").unwrap(), Expr::Number(144.0));
        assert_eq!(parse_expr("1.5e3").unwrap(), Expr::Number(1500.0));
        assert_eq!(parse_expr("2e-1").unwrap(), Expr::Number(0.2));
        // `2eur` is 2 times eur, not an exponent
        assert!(matches!(parse_expr("2eur").unwrap(), Expr::BinaryOp { op: Op::Mul, .. }));
    }

    #[test]
    fn test_implicit_multiplication_and_conversion() {
        let expr = parse_expr("3miles to km").unwrap();
        match expr {
            Expr::Convert { value, target } => {
                assert_eq!(
                    *value,
                    Expr::BinaryOp {
                        op: Op::Mul,
                        left: num(3.0),
                        right: Box::new(Expr::Ident("miles".into())),
                    }
                );
                assert_eq!(*target, Expr::Ident("km".into()));
            }
            other => panic!("expected conversion, got {:?}", other),
        }

        assert!(matches!(parse_expr("1 kg in lbs").unwrap(), Expr::Convert { .. }));
    }

    #[test]
    fn test_function_call() {
        let expr = parse_expr("max(1, 2, 3)").unwrap();
        match expr {
            Expr::Function { name, args } => {
                assert_eq!(name, "max");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected function, got {:?}", other),
        }
        assert!(parse_expr("sqrt(4").is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_expr("2 3").is_err());
        assert!(parse_expr("1 +").is_err());
        assert!(parse_expr("5 €").is_err());
    }
}
