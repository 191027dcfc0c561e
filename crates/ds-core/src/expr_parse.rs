use std::sync::OnceLock;

use regex::Regex;

use crate::error::DialogueError;
use crate::expr::{BinaryOp, ExprNode, UnaryOp};
use crate::value::{Gender, Value};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Variable(String),
    Text(String),
    Name(String),
    Int(i32),
    Float(f32),
    Word(String),
    Symbol(&'static str),
}

const SYMBOLS: [&str; 17] = [
    "==", "!=", "<>", "<=", ">=", "&&", "||", "+", "-", "*", "/", "%", "<", ">", "!", "(", ")",
];

fn token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r#"^(?:\{(?P<var>[A-Za-z_][A-Za-z0-9_.]*)\}|"(?P<text>(?:[^"\\]|\\.)*)"|`(?P<name>[^`]*)`|(?P<num>\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)|(?P<sym>==|!=|<>|<=|>=|&&|\|\||[-+*/%<>!()])|(?P<word>[A-Za-z_][A-Za-z0-9_]*))"#,
        )
        .expect("expression token regex must compile")
    })
}

fn parse_error(source: &str, message: impl Into<String>) -> DialogueError {
    DialogueError::new(
        "EXPR_PARSE",
        format!("{} in expression \"{}\".", message.into(), source),
    )
}

fn tokenize(source: &str) -> Result<Vec<Token>, DialogueError> {
    let mut tokens = Vec::new();
    let mut rest = source.trim_start();
    while !rest.is_empty() {
        let captures = token_regex()
            .captures(rest)
            .ok_or_else(|| parse_error(source, format!("Unexpected input \"{}\"", rest)))?;
        let token = if let Some(name) = captures.name("var") {
            Token::Variable(name.as_str().to_string())
        } else if let Some(text) = captures.name("text") {
            Token::Text(unescape(text.as_str()))
        } else if let Some(name) = captures.name("name") {
            Token::Name(name.as_str().to_string())
        } else if let Some(number) = captures.name("num") {
            let raw = number.as_str();
            if raw.contains(['.', 'e', 'E']) {
                let value: f32 = raw
                    .parse()
                    .map_err(|_| parse_error(source, format!("Invalid number {}", raw)))?;
                if !value.is_finite() {
                    return Err(DialogueError::new(
                        "EXPR_ARITHMETIC",
                        format!("Float literal {} is out of range in \"{}\".", raw, source),
                    ));
                }
                Token::Float(value)
            } else {
                Token::Int(
                    raw.parse()
                        .map_err(|_| parse_error(source, format!("Integer {} overflows", raw)))?,
                )
            }
        } else if let Some(symbol) = captures.name("sym") {
            let symbol = SYMBOLS
                .iter()
                .find(|candidate| **candidate == symbol.as_str())
                .copied()
                .ok_or_else(|| parse_error(source, "Unknown operator"))?;
            Token::Symbol(symbol)
        } else if let Some(word) = captures.name("word") {
            Token::Word(word.as_str().to_ascii_lowercase())
        } else {
            return Err(parse_error(source, "Unrecognized token"));
        };
        tokens.push(token);
        let consumed = captures.get(0).map(|full| full.end()).unwrap_or(rest.len());
        rest = rest[consumed..].trim_start();
    }
    Ok(tokens)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(match next {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
            }
        } else {
            out.push(ch);
        }
    }
    out
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn eat_binary(&mut self, table: &[(&str, BinaryOp)]) -> Option<BinaryOp> {
        let op = match self.peek()? {
            Token::Symbol(symbol) => table
                .iter()
                .find(|(candidate, _)| *candidate == *symbol)
                .map(|(_, op)| *op),
            Token::Word(word) => table
                .iter()
                .find(|(candidate, _)| *candidate == word.as_str())
                .map(|(_, op)| *op),
            _ => None,
        }?;
        self.position += 1;
        Some(op)
    }

    fn binary_level(
        &mut self,
        table: &[(&str, BinaryOp)],
        next: fn(&mut Self) -> Result<ExprNode, DialogueError>,
    ) -> Result<ExprNode, DialogueError> {
        let mut lhs = next(self)?;
        while let Some(op) = self.eat_binary(table) {
            let rhs = next(self)?;
            lhs = ExprNode::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn or(&mut self) -> Result<ExprNode, DialogueError> {
        self.binary_level(&[("or", BinaryOp::Or), ("||", BinaryOp::Or)], Self::and)
    }

    fn and(&mut self) -> Result<ExprNode, DialogueError> {
        self.binary_level(
            &[("and", BinaryOp::And), ("&&", BinaryOp::And)],
            Self::equality,
        )
    }

    fn equality(&mut self) -> Result<ExprNode, DialogueError> {
        self.binary_level(
            &[
                ("==", BinaryOp::Eq),
                ("!=", BinaryOp::Ne),
                ("<>", BinaryOp::Ne),
            ],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<ExprNode, DialogueError> {
        self.binary_level(
            &[
                ("<=", BinaryOp::Le),
                (">=", BinaryOp::Ge),
                ("<", BinaryOp::Lt),
                (">", BinaryOp::Gt),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<ExprNode, DialogueError> {
        self.binary_level(
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<ExprNode, DialogueError> {
        self.binary_level(
            &[
                ("*", BinaryOp::Mul),
                ("/", BinaryOp::Div),
                ("%", BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<ExprNode, DialogueError> {
        let op = match self.peek() {
            Some(Token::Symbol("!")) => Some(UnaryOp::Not),
            Some(Token::Word(word)) if word == "not" => Some(UnaryOp::Not),
            Some(Token::Symbol("-")) => Some(UnaryOp::Negate),
            _ => None,
        };
        let Some(op) = op else {
            return self.primary();
        };
        self.position += 1;
        let operand = self.unary()?;
        // Fold negative numeric literals so they render and reparse identically.
        Ok(match (op, operand) {
            (UnaryOp::Negate, ExprNode::Literal(Value::Int(value))) => {
                ExprNode::Literal(Value::Int(-value))
            }
            (UnaryOp::Negate, ExprNode::Literal(Value::Float(value))) => {
                ExprNode::Literal(Value::Float(-value))
            }
            (op, operand) => ExprNode::Unary {
                op,
                operand: Box::new(operand),
            },
        })
    }

    fn primary(&mut self) -> Result<ExprNode, DialogueError> {
        let token = self
            .advance()
            .ok_or_else(|| parse_error(self.source, "Unexpected end"))?;
        match token {
            Token::Variable(name) => Ok(ExprNode::Variable(name)),
            Token::Text(value) => Ok(ExprNode::Literal(Value::Text(value))),
            Token::Name(value) => Ok(ExprNode::Literal(Value::Name(value))),
            Token::Int(value) => Ok(ExprNode::Literal(Value::Int(value))),
            Token::Float(value) => Ok(ExprNode::Literal(Value::Float(value))),
            Token::Symbol("(") => {
                let inner = self.or()?;
                match self.advance() {
                    Some(Token::Symbol(")")) => Ok(inner),
                    _ => Err(parse_error(self.source, "Missing closing parenthesis")),
                }
            }
            Token::Word(word) => match word.as_str() {
                "true" => Ok(ExprNode::Literal(Value::Boolean(true))),
                "false" => Ok(ExprNode::Literal(Value::Boolean(false))),
                other => Gender::parse(other)
                    .map(|gender| ExprNode::Literal(Value::Gender(gender)))
                    .ok_or_else(|| {
                        parse_error(
                            self.source,
                            format!(
                                "Unknown word \"{}\" (variables are written {{{}}})",
                                other, other
                            ),
                        )
                    }),
            },
            Token::Symbol(symbol) => Err(parse_error(
                self.source,
                format!("Unexpected operator \"{}\"", symbol),
            )),
        }
    }
}

/// Parses the text form of an expression, e.g. `{health} > 0 and not {fled}`.
pub fn parse_expression(source: &str) -> Result<ExprNode, DialogueError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(parse_error(source, "Empty expression"));
    }
    let mut parser = Parser {
        source,
        tokens,
        position: 0,
    };
    let root = parser.or()?;
    if parser.position != parser.tokens.len() {
        return Err(parse_error(source, "Trailing input"));
    }
    Ok(root)
}

#[cfg(test)]
mod expr_parse_tests {
    use super::*;

    #[test]
    fn parses_literals_of_every_kind() {
        assert_eq!(
            parse_expression("42"),
            Ok(ExprNode::Literal(Value::Int(42)))
        );
        assert_eq!(
            parse_expression("0.25"),
            Ok(ExprNode::Literal(Value::Float(0.25)))
        );
        assert_eq!(
            parse_expression("TRUE"),
            Ok(ExprNode::Literal(Value::Boolean(true)))
        );
        assert_eq!(
            parse_expression("\"a\\\"b\""),
            Ok(ExprNode::Literal(Value::Text("a\"b".to_string())))
        );
        assert_eq!(
            parse_expression("`Guard`"),
            Ok(ExprNode::Literal(Value::Name("Guard".to_string())))
        );
        assert_eq!(
            parse_expression("Neuter"),
            Ok(ExprNode::Literal(Value::Gender(Gender::Neuter)))
        );
        assert_eq!(
            parse_expression("{SpeakerName.Bob}"),
            Ok(ExprNode::Variable("SpeakerName.Bob".to_string()))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let parsed = parse_expression("{a} or {b} and {c}").expect("parse");
        let ExprNode::Binary { op, rhs, .. } = parsed else {
            panic!("expected binary root");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(
            *rhs,
            ExprNode::Binary {
                op: BinaryOp::And,
                ..
            }
        ));
    }

    #[test]
    fn rejects_float_literals_out_of_range() {
        let error = parse_expression("1e39").expect_err("overflowing literal");
        assert_eq!(error.code, "EXPR_ARITHMETIC");
        assert_eq!(
            parse_expression("3.4e38"),
            Ok(ExprNode::Literal(Value::Float(3.4e38)))
        );
    }

    #[test]
    fn rejects_malformed_input() {
        for source in ["", "{a} +", "(1", "1 2", "health > 0", "{a} = 1", "\"open"] {
            let error = parse_expression(source).expect_err(source);
            assert_eq!(error.code, "EXPR_PARSE", "{}", source);
        }
    }
}
