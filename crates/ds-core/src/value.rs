use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DialogueError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Masculine,
    Feminine,
    #[default]
    Neuter,
    Animate,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Masculine => "masculine",
            Self::Feminine => "feminine",
            Self::Neuter => "neuter",
            Self::Animate => "animate",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "masculine" => Some(Self::Masculine),
            "feminine" => Some(Self::Feminine),
            "neuter" => Some(Self::Neuter),
            "animate" => Some(Self::Animate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Int,
    Float,
    Boolean,
    Text,
    Name,
    Gender,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Name => "name",
            Self::Gender => "gender",
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

/// A dialogue variable or expression result.
///
/// Slots are not statically typed: a variable may hold any kind over its
/// lifetime. Structural equality (`PartialEq`) distinguishes kinds; script
/// equality with coercion is [`Value::loosely_equals`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Int(i32),
    Float(f32),
    Boolean(bool),
    Text(String),
    Name(String),
    Gender(Gender),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Text(_) => ValueKind::Text,
            Self::Name(_) => ValueKind::Name,
            Self::Gender(_) => ValueKind::Gender,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => Self::Int(0),
            ValueKind::Float => Self::Float(0.0),
            ValueKind::Boolean => Self::Boolean(false),
            ValueKind::Text => Self::Text(String::new()),
            ValueKind::Name => Self::Name(String::new()),
            ValueKind::Gender => Self::Gender(Gender::default()),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Int(value) => *value != 0,
            Self::Float(value) => *value != 0.0,
            Self::Boolean(value) => *value,
            Self::Text(value) | Self::Name(value) => !value.is_empty(),
            Self::Gender(_) => false,
        }
    }

    /// Numeric view used by arithmetic and ordering; Boolean counts as 0/1.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Int(value) => Some(*value as f32),
            Self::Float(value) => Some(*value),
            Self::Boolean(value) => Some(if *value { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) | Self::Name(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn coerce_to(&self, kind: ValueKind) -> Result<Value, DialogueError> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        let coerced = match (self, kind) {
            (Self::Int(value), ValueKind::Float) => Some(Self::Float(*value as f32)),
            (Self::Float(value), ValueKind::Int) => Some(Self::Int(value.trunc() as i32)),
            (Self::Boolean(value), ValueKind::Int) => Some(Self::Int(i32::from(*value))),
            (Self::Boolean(value), ValueKind::Float) => {
                Some(Self::Float(if *value { 1.0 } else { 0.0 }))
            }
            (Self::Int(_) | Self::Float(_) | Self::Text(_) | Self::Name(_), ValueKind::Boolean) => {
                Some(Self::Boolean(self.is_truthy()))
            }
            (Self::Int(_) | Self::Float(_) | Self::Boolean(_) | Self::Name(_), ValueKind::Text) => {
                Some(Self::Text(self.to_string()))
            }
            (Self::Gender(value), ValueKind::Text) => Some(Self::Text(value.as_str().to_string())),
            (Self::Text(value), ValueKind::Name) => Some(Self::Name(value.clone())),
            _ => None,
        };
        coerced.ok_or_else(|| {
            DialogueError::new(
                "VALUE_TYPE_MISMATCH",
                format!("Cannot convert {} to {}.", self.type_name(), kind.as_str()),
            )
        })
    }

    /// Script equality: numeric kinds widen, Boolean compares against
    /// numeric truthiness, Text and Name compare as strings. Every other
    /// pairing is unequal.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Boolean(left), right) if right.kind().is_numeric() => {
                *left == right.is_truthy()
            }
            (left, Self::Boolean(right)) if left.kind().is_numeric() => {
                left.is_truthy() == *right
            }
            (Self::Int(left), Self::Int(right)) => left == right,
            (Self::Boolean(left), Self::Boolean(right)) => left == right,
            (Self::Gender(left), Self::Gender(right)) => left == right,
            (left, right) if left.kind().is_numeric() && right.kind().is_numeric() => {
                left.as_number() == right.as_number()
            }
            (left, right) => match (left.as_str(), right.as_str()) {
                (Some(left), Some(right)) => left == right,
                _ => false,
            },
        }
    }

    pub fn compare(&self, other: &Value) -> Result<Ordering, DialogueError> {
        if let (Self::Int(left), Self::Int(right)) = (self, other) {
            return Ok(left.cmp(right));
        }
        let (Some(left), Some(right)) = (self.as_number(), other.as_number()) else {
            return Err(DialogueError::new(
                "EXPR_TYPE",
                format!(
                    "Cannot order {} against {}.",
                    self.type_name(),
                    other.type_name()
                ),
            ));
        };
        left.partial_cmp(&right).ok_or_else(|| {
            DialogueError::new("EXPR_ARITHMETIC", "Comparison against NaN is undefined.")
        })
    }

    pub fn add(&self, other: &Value) -> Result<Value, DialogueError> {
        if let (Some(left), Some(right)) = (self.as_str(), other.as_str()) {
            return Ok(Self::Text(format!("{}{}", left, right)));
        }
        self.arithmetic(other, "+", i32::checked_add, |left, right| left + right)
    }

    pub fn sub(&self, other: &Value) -> Result<Value, DialogueError> {
        self.arithmetic(other, "-", i32::checked_sub, |left, right| left - right)
    }

    pub fn mul(&self, other: &Value) -> Result<Value, DialogueError> {
        self.arithmetic(other, "*", i32::checked_mul, |left, right| left * right)
    }

    pub fn div(&self, other: &Value) -> Result<Value, DialogueError> {
        if other.as_number() == Some(0.0) {
            return Err(DialogueError::new("EXPR_ARITHMETIC", "Division by zero."));
        }
        self.arithmetic(other, "/", i32::checked_div, |left, right| left / right)
    }

    pub fn rem(&self, other: &Value) -> Result<Value, DialogueError> {
        if other.as_number() == Some(0.0) {
            return Err(DialogueError::new("EXPR_ARITHMETIC", "Modulo by zero."));
        }
        self.arithmetic(other, "%", i32::checked_rem, |left, right| left % right)
    }

    pub fn negate(&self) -> Result<Value, DialogueError> {
        match self {
            Self::Int(value) => value.checked_neg().map(Self::Int).ok_or_else(|| {
                DialogueError::new("EXPR_ARITHMETIC", "Integer overflow in negation.")
            }),
            Self::Float(value) if value.is_finite() => Ok(Self::Float(-value)),
            Self::Float(value) => Err(DialogueError::new(
                "EXPR_ARITHMETIC",
                format!("Cannot negate non-finite float {}.", value),
            )),
            _ => Err(DialogueError::new(
                "EXPR_TYPE",
                format!("Cannot negate {}.", self.type_name()),
            )),
        }
    }

    fn arithmetic(
        &self,
        other: &Value,
        symbol: &str,
        int_op: fn(i32, i32) -> Option<i32>,
        float_op: fn(f32, f32) -> f32,
    ) -> Result<Value, DialogueError> {
        match (self, other) {
            (Self::Int(left), Self::Int(right)) => {
                int_op(*left, *right).map(Self::Int).ok_or_else(|| {
                    DialogueError::new(
                        "EXPR_ARITHMETIC",
                        format!("Integer overflow in {} {} {}.", left, symbol, right),
                    )
                })
            }
            (left, right)
                if left.kind().is_numeric() && right.kind().is_numeric() =>
            {
                let left = left.as_number().unwrap_or_default();
                let right = right.as_number().unwrap_or_default();
                let result = float_op(left, right);
                if !result.is_finite() {
                    return Err(DialogueError::new(
                        "EXPR_ARITHMETIC",
                        format!("Float overflow in {} {} {}.", left, symbol, right),
                    ));
                }
                Ok(Self::Float(result))
            }
            _ => Err(DialogueError::new(
                "EXPR_TYPE",
                format!(
                    "Operator {} is not defined for {} and {}.",
                    symbol,
                    self.type_name(),
                    other.type_name()
                ),
            )),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
            Self::Boolean(value) => write!(f, "{}", value),
            Self::Text(value) | Self::Name(value) => f.write_str(value),
            Self::Gender(value) => f.write_str(value.as_str()),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Gender> for Value {
    fn from(value: Gender) -> Self {
        Self::Gender(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod value_tests {
    use super::*;

    fn all_samples() -> Vec<Value> {
        vec![
            Value::Int(3),
            Value::Float(2.5),
            Value::Boolean(true),
            Value::Text("hi".to_string()),
            Value::Name("Bob".to_string()),
            Value::Gender(Gender::Feminine),
        ]
    }

    #[test]
    fn coercion_table_matches_documented_rules() {
        let kinds = [
            ValueKind::Int,
            ValueKind::Float,
            ValueKind::Boolean,
            ValueKind::Text,
            ValueKind::Name,
            ValueKind::Gender,
        ];
        // rows follow all_samples(), columns follow kinds
        let allowed = [
            [true, true, true, true, false, false],
            [true, true, true, true, false, false],
            [true, true, true, true, false, false],
            [false, false, true, true, true, false],
            [false, false, true, true, true, false],
            [false, false, false, true, false, true],
        ];
        for (row, value) in all_samples().iter().enumerate() {
            for (column, kind) in kinds.iter().enumerate() {
                let result = value.coerce_to(*kind);
                assert_eq!(
                    result.is_ok(),
                    allowed[row][column],
                    "{:?} -> {:?}",
                    value,
                    kind
                );
                match result {
                    Ok(coerced) => assert_eq!(coerced.kind(), *kind),
                    Err(error) => assert_eq!(error.code, "VALUE_TYPE_MISMATCH"),
                }
            }
        }
    }

    #[test]
    fn coercion_values_are_exact() {
        assert_eq!(
            Value::Float(2.9).coerce_to(ValueKind::Int),
            Ok(Value::Int(2))
        );
        assert_eq!(
            Value::Int(7).coerce_to(ValueKind::Float),
            Ok(Value::Float(7.0))
        );
        assert_eq!(
            Value::Boolean(true).coerce_to(ValueKind::Int),
            Ok(Value::Int(1))
        );
        assert_eq!(
            Value::Text(String::new()).coerce_to(ValueKind::Boolean),
            Ok(Value::Boolean(false))
        );
        assert_eq!(
            Value::Gender(Gender::Masculine).coerce_to(ValueKind::Text),
            Ok(Value::Text("masculine".to_string()))
        );
        assert_eq!(
            Value::Text("Bob".to_string()).coerce_to(ValueKind::Name),
            Ok(Value::Name("Bob".to_string()))
        );
    }

    #[test]
    fn truthiness_is_total() {
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(Value::Float(0.1).is_truthy());
        assert!(Value::Text("x".to_string()).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(!Value::Name(String::new()).is_truthy());
        assert!(!Value::Gender(Gender::Masculine).is_truthy());
    }

    #[test]
    fn loose_equality_follows_coercion_classes() {
        assert!(Value::Int(2).loosely_equals(&Value::Float(2.0)));
        assert!(Value::Boolean(true).loosely_equals(&Value::Int(5)));
        assert!(Value::Int(0).loosely_equals(&Value::Boolean(false)));
        assert!(Value::Text("Bob".to_string()).loosely_equals(&Value::Name("Bob".to_string())));
        assert!(!Value::Text("1".to_string()).loosely_equals(&Value::Int(1)));
        assert!(!Value::Gender(Gender::Neuter).loosely_equals(&Value::Boolean(false)));
        assert!(Value::Gender(Gender::Neuter).loosely_equals(&Value::Gender(Gender::Neuter)));
    }

    #[test]
    fn ordering_requires_numeric_operands() {
        assert_eq!(
            Value::Int(1).compare(&Value::Float(1.5)),
            Ok(Ordering::Less)
        );
        assert_eq!(
            Value::Boolean(true).compare(&Value::Int(0)),
            Ok(Ordering::Greater)
        );
        let error = Value::Text("a".to_string())
            .compare(&Value::Int(1))
            .expect_err("text ordering should fail");
        assert_eq!(error.code, "EXPR_TYPE");
    }

    #[test]
    fn arithmetic_widens_and_checks() {
        assert_eq!(Value::Int(2).add(&Value::Int(3)), Ok(Value::Int(5)));
        assert_eq!(Value::Int(2).mul(&Value::Float(1.5)), Ok(Value::Float(3.0)));
        assert_eq!(Value::Int(7).div(&Value::Int(2)), Ok(Value::Int(3)));
        assert_eq!(Value::Int(7).rem(&Value::Int(4)), Ok(Value::Int(3)));
        assert_eq!(
            Value::Text("a".to_string()).add(&Value::Name("b".to_string())),
            Ok(Value::Text("ab".to_string()))
        );
        assert_eq!(
            Value::Int(1).div(&Value::Int(0)).expect_err("div zero").code,
            "EXPR_ARITHMETIC"
        );
        assert_eq!(
            Value::Int(i32::MAX)
                .add(&Value::Int(1))
                .expect_err("overflow")
                .code,
            "EXPR_ARITHMETIC"
        );
        assert_eq!(
            Value::Boolean(true)
                .sub(&Value::Int(1))
                .expect_err("bool arithmetic")
                .code,
            "EXPR_TYPE"
        );
    }

    #[test]
    fn float_arithmetic_never_yields_non_finite_values() {
        let big = Value::Float(f32::MAX);
        assert_eq!(
            big.mul(&Value::Int(2)).expect_err("overflow").code,
            "EXPR_ARITHMETIC"
        );
        assert_eq!(
            big.add(&Value::Float(f32::MAX)).expect_err("overflow").code,
            "EXPR_ARITHMETIC"
        );
        assert_eq!(
            Value::Float(f32::MAX).div(&Value::Float(0.5)).expect_err("overflow").code,
            "EXPR_ARITHMETIC"
        );
        assert_eq!(Value::Float(1.5).negate(), Ok(Value::Float(-1.5)));
        assert_eq!(
            Value::Float(f32::NAN).negate().expect_err("nan").code,
            "EXPR_ARITHMETIC"
        );
    }

    #[test]
    fn serializes_with_explicit_type_tag() {
        let json = serde_json::to_string(&Value::Int(4)).expect("serialize");
        assert_eq!(json, r#"{"type":"int","value":4}"#);
        let gender: Value =
            serde_json::from_str(r#"{"type":"gender","value":"feminine"}"#).expect("parse");
        assert_eq!(gender, Value::Gender(Gender::Feminine));
    }
}
