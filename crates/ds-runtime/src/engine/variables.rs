use super::*;

use ds_core::Gender;

impl Dialogue {
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> &BTreeMap<String, Value> {
        &self.variables
    }

    /// Writes a variable from the host side. Subscribers only hear about it
    /// when the stored value actually changes.
    pub fn set_variable(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if self.variables.get(name) == Some(&value) {
            return;
        }
        self.variables.insert(name.to_string(), value);
        self.raise_variable_changed(name, false);
    }

    pub fn set_variable_int(&mut self, name: &str, value: i32) {
        self.set_variable(name, Value::Int(value));
    }

    pub fn set_variable_float(&mut self, name: &str, value: f32) {
        self.set_variable(name, Value::Float(value));
    }

    pub fn set_variable_boolean(&mut self, name: &str, value: bool) {
        self.set_variable(name, Value::Boolean(value));
    }

    pub fn set_variable_text(&mut self, name: &str, value: impl Into<String>) {
        self.set_variable(name, Value::Text(value.into()));
    }

    pub fn set_variable_name(&mut self, name: &str, value: impl Into<String>) {
        self.set_variable(name, Value::Name(value.into()));
    }

    pub fn set_variable_gender(&mut self, name: &str, value: Gender) {
        self.set_variable(name, Value::Gender(value));
    }

    pub fn variable_int(&self, name: &str) -> i32 {
        match self.variables.get(name) {
            None => 0,
            Some(Value::Int(value)) => *value,
            Some(Value::Float(value)) => {
                tracing::warn!(variable = name, "float variable read as int, truncating");
                *value as i32
            }
            Some(Value::Boolean(value)) => i32::from(*value),
            Some(other) => {
                self.type_mismatch(name, other, "int");
                0
            }
        }
    }

    pub fn variable_float(&self, name: &str) -> f32 {
        match self.variables.get(name) {
            None => 0.0,
            Some(Value::Float(value)) => *value,
            Some(Value::Int(value)) => *value as f32,
            Some(other) => {
                self.type_mismatch(name, other, "float");
                0.0
            }
        }
    }

    pub fn variable_boolean(&self, name: &str) -> bool {
        match self.variables.get(name) {
            None => false,
            Some(Value::Boolean(value)) => *value,
            Some(Value::Int(value)) => *value != 0,
            Some(other) => {
                self.type_mismatch(name, other, "boolean");
                false
            }
        }
    }

    pub fn variable_text(&self, name: &str) -> String {
        match self.variables.get(name) {
            None => String::new(),
            Some(Value::Text(value)) => value.clone(),
            Some(other) => {
                self.type_mismatch(name, other, "text");
                String::new()
            }
        }
    }

    pub fn variable_name(&self, name: &str) -> String {
        match self.variables.get(name) {
            None => String::new(),
            Some(Value::Name(value)) => value.clone(),
            Some(other) => {
                self.type_mismatch(name, other, "name");
                String::new()
            }
        }
    }

    pub fn variable_gender(&self, name: &str) -> Gender {
        match self.variables.get(name) {
            None => Gender::default(),
            Some(Value::Gender(value)) => *value,
            Some(other) => {
                self.type_mismatch(name, other, "gender");
                Gender::default()
            }
        }
    }

    fn type_mismatch(&self, name: &str, found: &Value, expected: &str) {
        self.record_diagnostic(
            "VALUE_TYPE_MISMATCH",
            format!(
                "Variable \"{}\" holds a {} value, cannot read it as {}.",
                name,
                found.type_name(),
                expected
            ),
        );
    }
}
