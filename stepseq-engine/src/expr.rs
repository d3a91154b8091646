//! Mini-expression parser for custom steps
//!
//! Supports arithmetic on numeric literals and named variables with
//! `+ - * / // % **` (`^` is accepted for `**`), parentheses, unary signs and a
//! fixed set of functions. Nothing else is reachable from an expression: no
//! attribute access, no other calls, no ambient state.

use stepseq_core::{EvalError, Number};
use std::collections::{BTreeSet, HashMap};

/// Token types for the expression parser
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Number),
    Ident(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
    Comma,
}

/// Whitelisted functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Abs,
    Floor,
    Ceil,
    Round,
    Sqrt,
    Min,
    Max,
    Pow,
    Int,
    Float,
}

impl Func {
    fn lookup(name: &str) -> Option<Func> {
        let func = match name {
            "abs" => Func::Abs,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "round" => Func::Round,
            "sqrt" => Func::Sqrt,
            "min" => Func::Min,
            "max" => Func::Max,
            "pow" => Func::Pow,
            "int" => Func::Int,
            "float" => Func::Float,
            _ => return None,
        };
        Some(func)
    }

    pub fn name(self) -> &'static str {
        match self {
            Func::Abs => "abs",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
            Func::Round => "round",
            Func::Sqrt => "sqrt",
            Func::Min => "min",
            Func::Max => "max",
            Func::Pow => "pow",
            Func::Int => "int",
            Func::Float => "float",
        }
    }
}

/// AST node for expressions
#[derive(Debug, Clone)]
pub enum Expr {
    Num(Number),
    Var(String),
    BinOp(Box<Expr>, Op, Box<Expr>),
    UnaryMinus(Box<Expr>),
    Call(Func, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// Tokenize expression string, keeping each token's character offset
fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let start = i;
        let ch = chars[i];
        let token = match ch {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::DoubleStar
            }
            '*' => Token::Star,
            '^' => Token::DoubleStar,
            '/' if chars.get(i + 1) == Some(&'/') => {
                i += 1;
                Token::DoubleSlash
            }
            '/' => Token::Slash,
            '%' => Token::Percent,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    num_str.push(chars[i]);
                    i += 1;
                }
                // Exponent: e5, e+5, E-5
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        num_str.extend(&chars[i..j]);
                        i = j;
                    }
                }
                let number = Number::parse_literal(&num_str).map_err(|_| {
                    EvalError::parse_error(format!("Invalid number: {}", num_str)).at(start)
                })?;
                tokens.push((Token::Number(number), start));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    ident.push(chars[i]);
                    i += 1;
                }
                tokens.push((Token::Ident(ident), start));
                continue;
            }
            _ => {
                return Err(
                    EvalError::parse_error(format!("Unexpected character: {}", ch)).at(start)
                );
            }
        };
        tokens.push((token, start));
        i += 1;
    }

    Ok(tokens)
}

/// Parse tokens into AST
struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn new(tokens: Vec<(Token, usize)>, end: usize) -> Self {
        Parser { tokens, pos: 0, end }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, at)| *at)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), EvalError> {
        if self.peek() == Some(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(EvalError::parse_error(format!("Expected {}", what)).at(self.offset()))
        }
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Op::Add,
                Some(Token::Minus) => Op::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::BinOp(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    // term = unary (('*' | '/' | '//' | '%') unary)*
    fn parse_term(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Star) => Op::Mul,
                Some(Token::Slash) => Op::Div,
                Some(Token::DoubleSlash) => Op::FloorDiv,
                Some(Token::Percent) => Op::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinOp(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    // unary = ('-' | '+') unary | power
    // Binds looser than '**', so -x**2 is -(x**2)
    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::UnaryMinus(Box::new(expr)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // power = primary ('**' unary)?  (right associative)
    fn parse_power(&mut self) -> Result<Expr, EvalError> {
        let left = self.parse_primary()?;

        if matches!(self.peek(), Some(Token::DoubleStar)) {
            self.advance();
            let right = self.parse_unary()?;
            return Ok(Expr::BinOp(Box::new(left), Op::Pow, Box::new(right)));
        }

        Ok(left)
    }

    // primary = number | variable | func '(' args ')' | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let at = self.offset();
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Num(n)),
            Some(Token::Ident(name)) => {
                if !matches!(self.peek(), Some(Token::LParen)) {
                    return Ok(Expr::Var(name));
                }
                let func = Func::lookup(&name)
                    .ok_or_else(|| EvalError::undefined_func(&name).at(at))?;
                self.advance(); // consume '('
                let args = self.parse_args()?;
                Ok(Expr::Call(func, args))
            }
            Some(Token::LParen) => {
                let expr = self.parse_expr()?;
                self.expect(Token::RParen, "closing ')'")?;
                Ok(expr)
            }
            Some(token) => {
                Err(EvalError::parse_error(format!("Unexpected token: {:?}", token)).at(at))
            }
            None => Err(EvalError::parse_error("Unexpected end of expression").at(at)),
        }
    }

    // args = (expr (',' expr)*)? ')'
    fn parse_args(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {
                    self.advance();
                    return Ok(args);
                }
                _ => {
                    return Err(EvalError::parse_error("Expected ',' or ')' in argument list")
                        .at(self.offset()));
                }
            }
        }
    }
}

/// Parse an expression string into an AST
pub fn parse_expr(input: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::parse_error("Empty expression"));
    }
    let mut parser = Parser::new(tokens, input.chars().count());
    let expr = parser.parse_expr()?;

    if parser.pos < parser.tokens.len() {
        return Err(EvalError::parse_error("Unexpected tokens at end of expression")
            .at(parser.offset()));
    }

    Ok(expr)
}

impl Expr {
    /// Names of all variables referenced by the expression
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Num(_) => {}
            Expr::Var(name) => {
                names.insert(name.as_str());
            }
            Expr::BinOp(left, _, right) => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expr::UnaryMinus(inner) => inner.collect_variables(names),
            Expr::Call(_, args) => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }
}

/// Evaluate an expression with the given variable context
pub fn eval_expr(expr: &Expr, ctx: &HashMap<String, Number>) -> Result<Number, EvalError> {
    match expr {
        Expr::Num(n) => Ok(n.clone()),
        Expr::Var(name) => ctx
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::undefined_var(name)),
        Expr::BinOp(left, op, right) => {
            let l = eval_expr(left, ctx)?;
            let r = eval_expr(right, ctx)?;
            match op {
                Op::Add => Ok(l.add(&r)),
                Op::Sub => Ok(l.sub(&r)),
                Op::Mul => Ok(l.mul(&r)),
                Op::Div => l.checked_div(&r).map_err(EvalError::from),
                Op::FloorDiv => l.floor_div(&r).map_err(EvalError::from),
                Op::Mod => l.rem(&r).map_err(EvalError::from),
                Op::Pow => l.pow(&r).map_err(EvalError::from),
            }
        }
        Expr::UnaryMinus(inner) => Ok(eval_expr(inner, ctx)?.neg()),
        Expr::Call(func, args) => {
            let values = args
                .iter()
                .map(|arg| eval_expr(arg, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            call_func(*func, &values)
        }
    }
}

fn call_func(func: Func, args: &[Number]) -> Result<Number, EvalError> {
    match func {
        Func::Min | Func::Max => {
            if args.len() < 2 {
                return Err(EvalError::arg_count(func.name(), "at least 2", args.len()));
            }
            let mut best = &args[0];
            for candidate in &args[1..] {
                let better = if func == Func::Min {
                    candidate < best
                } else {
                    candidate > best
                };
                if better {
                    best = candidate;
                }
            }
            Ok(best.clone())
        }
        Func::Pow => match args {
            [base, exp] => base.pow(exp).map_err(EvalError::from),
            _ => Err(EvalError::arg_count("pow", "2", args.len())),
        },
        Func::Abs => Ok(single(func, args)?.abs()),
        Func::Floor => single(func, args)?.floor().map_err(EvalError::from),
        Func::Ceil => single(func, args)?.ceil().map_err(EvalError::from),
        Func::Round => single(func, args)?.round().map_err(EvalError::from),
        Func::Sqrt => single(func, args)?.sqrt().map_err(EvalError::from),
        Func::Int => single(func, args)?.trunc().map_err(EvalError::from),
        Func::Float => Ok(single(func, args)?.to_real()),
    }
}

fn single(func: Func, args: &[Number]) -> Result<&Number, EvalError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(EvalError::arg_count(func.name(), "1", args.len())),
    }
}

/// A parsed expression together with its source text
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        let ast = parse_expr(source).map_err(|e| e.with_expression(source))?;
        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    pub fn references(&self, name: &str) -> bool {
        self.ast.variables().contains(name)
    }

    /// Evaluate with exactly one binding in scope
    pub fn eval_with(&self, name: &str, value: &Number) -> Result<Number, EvalError> {
        let mut ctx = HashMap::with_capacity(1);
        ctx.insert(name.to_string(), value.clone());
        eval_expr(&self.ast, &ctx).map_err(|e| e.with_expression(&self.source))
    }
}
