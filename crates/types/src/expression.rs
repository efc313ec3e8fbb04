//! Arithmetic expressions used by `EXPR` mapping rules.
//!
//! Expressions are parsed once when the mapping file is loaded; evaluation
//! happens in the engine against resolved operand values. Supported syntax:
//! numeric literals, identifiers, `+ - * / ^`, unary `-`/`+`, parentheses and
//! the single-argument functions listed in [`Function`].

use std::fmt;

use indexmap::IndexSet;
use thiserror::Error;

/// Errors raised while parsing an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,

    #[error("unexpected character '{character}' at offset {offset}")]
    UnexpectedCharacter { character: char, offset: usize },

    #[error("invalid number '{text}'")]
    InvalidNumber { text: String },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken { found: String, expected: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOperator {
    pub fn symbol(&self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
            BinaryOperator::Power => '^',
        }
    }

    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOperator::Add => left + right,
            BinaryOperator::Subtract => left - right,
            BinaryOperator::Multiply => left * right,
            BinaryOperator::Divide => left / right,
            BinaryOperator::Power => left.powf(right),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Sqrt,
    Exp,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "abs" => Some(Function::Abs),
            "sqrt" => Some(Function::Sqrt),
            "exp" => Some(Function::Exp),
            "log" | "ln" => Some(Function::Log),
            "log10" => Some(Function::Log10),
            "sin" => Some(Function::Sin),
            "cos" => Some(Function::Cos),
            "tan" => Some(Function::Tan),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Sqrt => "sqrt",
            Function::Exp => "exp",
            Function::Log => "log",
            Function::Log10 => "log10",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Function::Abs => value.abs(),
            Function::Sqrt => value.sqrt(),
            Function::Exp => value.exp(),
            Function::Log => value.ln(),
            Function::Log10 => value.log10(),
            Function::Sin => value.sin(),
            Function::Cos => value.cos(),
            Function::Tan => value.tan(),
        }
    }
}

/// Expression syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Negate(Box<Expr>),
    Binary {
        operator: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: Function,
        argument: Box<Expr>,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{value}"),
            Expr::Variable(name) => f.write_str(name),
            Expr::Negate(inner) => write!(f, "(-{inner})"),
            Expr::Binary { operator, left, right } => write!(f, "({left} {} {right})", operator.symbol()),
            Expr::Call { function, argument } => write!(f, "{}({argument})", function.name()),
        }
    }
}

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }
        let mut parser = Parser { tokens, position: 0 };
        let root = parser.parse_sum()?;
        if let Some(token) = parser.peek() {
            return Err(ExpressionError::UnexpectedToken {
                found: token.describe(),
                expected: "end of expression",
            });
        }
        Ok(Self {
            source: source.trim().to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Variable names in order of first appearance.
    pub fn variables(&self) -> IndexSet<&str> {
        let mut names = IndexSet::new();
        collect_variables(&self.root, &mut names);
        names
    }
}

fn collect_variables<'a>(expr: &'a Expr, names: &mut IndexSet<&'a str>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Variable(name) => {
            names.insert(name.as_str());
        }
        Expr::Negate(inner) => collect_variables(inner, names),
        Expr::Binary { left, right, .. } => {
            collect_variables(left, names);
            collect_variables(right, names);
        }
        Expr::Call { argument, .. } => collect_variables(argument, names),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Operator(char),
    OpenParen,
    CloseParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(value) => format!("number {value}"),
            Token::Identifier(name) => format!("identifier '{name}'"),
            Token::Operator(symbol) => format!("operator '{symbol}'"),
            Token::OpenParen => "'('".to_string(),
            Token::CloseParen => "')'".to_string(),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let characters: Vec<(usize, char)> = source.char_indices().collect();
    let mut cursor = 0;
    while cursor < characters.len() {
        let (offset, character) = characters[cursor];
        match character {
            c if c.is_whitespace() => cursor += 1,
            '+' | '-' | '*' | '/' | '^' => {
                tokens.push(Token::Operator(character));
                cursor += 1;
            }
            '(' => {
                tokens.push(Token::OpenParen);
                cursor += 1;
            }
            ')' => {
                tokens.push(Token::CloseParen);
                cursor += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = cursor;
                while cursor < characters.len() && is_number_character(&characters, cursor) {
                    cursor += 1;
                }
                let text: String = characters[start..cursor].iter().map(|(_, c)| *c).collect();
                let value = text.parse::<f64>().map_err(|_| ExpressionError::InvalidNumber { text })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = cursor;
                while cursor < characters.len() && (characters[cursor].1.is_ascii_alphanumeric() || characters[cursor].1 == '_') {
                    cursor += 1;
                }
                tokens.push(Token::Identifier(characters[start..cursor].iter().map(|(_, c)| *c).collect()));
            }
            _ => return Err(ExpressionError::UnexpectedCharacter { character, offset }),
        }
    }
    Ok(tokens)
}

/// Digits, a decimal point, and an exponent marker with optional sign.
fn is_number_character(characters: &[(usize, char)], cursor: usize) -> bool {
    let character = characters[cursor].1;
    if character.is_ascii_digit() || character == '.' || character == 'e' || character == 'E' {
        return true;
    }
    (character == '+' || character == '-') && cursor > 0 && matches!(characters[cursor - 1].1, 'e' | 'E')
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn take_operator(&mut self, accepted: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Operator(symbol)) if accepted.contains(symbol) => {
                let symbol = *symbol;
                self.position += 1;
                Some(symbol)
            }
            _ => None,
        }
    }

    fn parse_sum(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_product()?;
        while let Some(symbol) = self.take_operator(&['+', '-']) {
            let right = self.parse_product()?;
            let operator = if symbol == '+' {
                BinaryOperator::Add
            } else {
                BinaryOperator::Subtract
            };
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_product(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_unary()?;
        while let Some(symbol) = self.take_operator(&['*', '/']) {
            let right = self.parse_unary()?;
            let operator = if symbol == '*' {
                BinaryOperator::Multiply
            } else {
                BinaryOperator::Divide
            };
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        match self.take_operator(&['-', '+']) {
            Some('-') => Ok(Expr::Negate(Box::new(self.parse_unary()?))),
            Some(_) => self.parse_unary(),
            None => self.parse_power(),
        }
    }

    // `^` is right-associative and binds tighter than unary minus.
    fn parse_power(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.parse_primary()?;
        if self.take_operator(&['^']).is_some() {
            let exponent = self.parse_unary()?;
            return Ok(binary(BinaryOperator::Power, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Identifier(name)) => {
                if self.peek() != Some(&Token::OpenParen) {
                    return Ok(Expr::Variable(name));
                }
                let function = Function::from_name(&name).ok_or(ExpressionError::UnknownFunction { name })?;
                self.position += 1;
                let argument = self.parse_sum()?;
                self.expect_close()?;
                Ok(Expr::Call {
                    function,
                    argument: Box::new(argument),
                })
            }
            Some(Token::OpenParen) => {
                let inner = self.parse_sum()?;
                self.expect_close()?;
                Ok(inner)
            }
            Some(other) => Err(ExpressionError::UnexpectedToken {
                found: other.describe(),
                expected: "number, identifier or '('",
            }),
            None => Err(ExpressionError::UnexpectedToken {
                found: "end of expression".to_string(),
                expected: "number, identifier or '('",
            }),
        }
    }

    fn expect_close(&mut self) -> Result<(), ExpressionError> {
        match self.next() {
            Some(Token::CloseParen) => Ok(()),
            Some(other) => Err(ExpressionError::UnexpectedToken {
                found: other.describe(),
                expected: "')'",
            }),
            None => Err(ExpressionError::UnexpectedToken {
                found: "end of expression".to_string(),
                expected: "')'",
            }),
        }
    }
}

fn binary(operator: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}
