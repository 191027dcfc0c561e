use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DialogueError;
use crate::expr_parse::parse_expression;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    Literal(Value),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<ExprNode>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<ExprNode>,
        rhs: Box<ExprNode>,
    },
}

/// A compiled condition or assignment expression.
///
/// Serialized as its text form (see [`parse_expression`]) so compiled
/// graphs stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Expression {
    root: ExprNode,
}

impl Expression {
    pub fn new(root: ExprNode) -> Self {
        Self { root }
    }

    pub fn parse(source: &str) -> Result<Self, DialogueError> {
        parse_expression(source).map(Self::new)
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(ExprNode::Literal(value.into()))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(ExprNode::Variable(name.into()))
    }

    pub fn root(&self) -> &ExprNode {
        &self.root
    }

    /// Variables referenced by this expression, in first-use order.
    pub fn variable_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        collect_variables(&self.root, &mut names);
        names
    }

    /// Evaluates against a variable snapshot without touching it. A variable
    /// absent from the snapshot reads as the zero value of the kind it is
    /// combined with (`Int(0)` when there is nothing to infer from).
    pub fn evaluate(&self, variables: &BTreeMap<String, Value>) -> Result<Value, DialogueError> {
        Ok(eval_node(&self.root, variables)?.unwrap_or(Value::Int(0)))
    }

    pub fn evaluate_boolean(
        &self,
        variables: &BTreeMap<String, Value>,
    ) -> Result<bool, DialogueError> {
        Ok(self.evaluate(variables)?.is_truthy())
    }
}

impl TryFrom<String> for Expression {
    type Error = DialogueError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::parse(&source)
    }
}

impl From<Expression> for String {
    fn from(expression: Expression) -> Self {
        expression.to_string()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(&self.root, f)
    }
}

fn collect_variables(node: &ExprNode, out: &mut Vec<String>) {
    match node {
        ExprNode::Literal(_) => {}
        ExprNode::Variable(name) => {
            if !out.iter().any(|existing| existing == name) {
                out.push(name.clone());
            }
        }
        ExprNode::Unary { operand, .. } => collect_variables(operand, out),
        ExprNode::Binary { lhs, rhs, .. } => {
            collect_variables(lhs, out);
            collect_variables(rhs, out);
        }
    }
}

// `None` marks an unset variable whose zero value depends on its peer.
fn eval_node(
    node: &ExprNode,
    variables: &BTreeMap<String, Value>,
) -> Result<Option<Value>, DialogueError> {
    match node {
        ExprNode::Literal(value) => Ok(Some(value.clone())),
        ExprNode::Variable(name) => Ok(variables.get(name).cloned()),
        ExprNode::Unary { op, operand } => {
            let operand = eval_node(operand, variables)?;
            match op {
                UnaryOp::Not => Ok(Some(Value::Boolean(
                    !operand.map(|value| value.is_truthy()).unwrap_or(false),
                ))),
                UnaryOp::Negate => operand.unwrap_or(Value::Int(0)).negate().map(Some),
            }
        }
        ExprNode::Binary { op, lhs, rhs } => match op {
            BinaryOp::And => {
                if !truthy(eval_node(lhs, variables)?) {
                    return Ok(Some(Value::Boolean(false)));
                }
                Ok(Some(Value::Boolean(truthy(eval_node(rhs, variables)?))))
            }
            BinaryOp::Or => {
                if truthy(eval_node(lhs, variables)?) {
                    return Ok(Some(Value::Boolean(true)));
                }
                Ok(Some(Value::Boolean(truthy(eval_node(rhs, variables)?))))
            }
            _ => {
                let (left, right) =
                    fill_missing(eval_node(lhs, variables)?, eval_node(rhs, variables)?);
                apply_binary(*op, &left, &right).map(Some)
            }
        },
    }
}

fn truthy(value: Option<Value>) -> bool {
    value.map(|value| value.is_truthy()).unwrap_or(false)
}

fn fill_missing(left: Option<Value>, right: Option<Value>) -> (Value, Value) {
    match (left, right) {
        (Some(left), Some(right)) => (left, right),
        (Some(left), None) => {
            let zero = Value::zero(left.kind());
            (left, zero)
        }
        (None, Some(right)) => (Value::zero(right.kind()), right),
        (None, None) => (Value::Int(0), Value::Int(0)),
    }
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, DialogueError> {
    match op {
        BinaryOp::Add => left.add(right),
        BinaryOp::Sub => left.sub(right),
        BinaryOp::Mul => left.mul(right),
        BinaryOp::Div => left.div(right),
        BinaryOp::Rem => left.rem(right),
        BinaryOp::Eq => Ok(Value::Boolean(left.loosely_equals(right))),
        BinaryOp::Ne => Ok(Value::Boolean(!left.loosely_equals(right))),
        BinaryOp::Lt => Ok(Value::Boolean(left.compare(right)?.is_lt())),
        BinaryOp::Le => Ok(Value::Boolean(left.compare(right)?.is_le())),
        BinaryOp::Gt => Ok(Value::Boolean(left.compare(right)?.is_gt())),
        BinaryOp::Ge => Ok(Value::Boolean(left.compare(right)?.is_ge())),
        BinaryOp::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
    }
}

fn write_node(node: &ExprNode, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match node {
        ExprNode::Literal(value) => write_literal(value, f),
        ExprNode::Variable(name) => write!(f, "{{{}}}", name),
        ExprNode::Unary { op, operand } => {
            match op {
                UnaryOp::Not => f.write_str("not ")?,
                UnaryOp::Negate => f.write_str("-")?,
            }
            write_node(operand, f)
        }
        ExprNode::Binary { op, lhs, rhs } => {
            f.write_str("(")?;
            write_node(lhs, f)?;
            write!(f, " {} ", op.symbol())?;
            write_node(rhs, f)?;
            f.write_str(")")
        }
    }
}

fn write_literal(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Float(value) => write!(f, "{:?}", value),
        Value::Text(value) => write!(
            f,
            "\"{}\"",
            value.replace('\\', "\\\\").replace('"', "\\\"")
        ),
        Value::Name(value) => write!(f, "`{}`", value),
        other => write!(f, "{}", other),
    }
}
