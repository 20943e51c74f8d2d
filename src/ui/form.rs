use crate::engine::alerts::{AlertKind, AlertOp, NewAlert, MAX_SYMBOL_LEN};
use crate::error::{Result, StonksError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Symbol,
    Kind,
    Op,
    Value,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Symbol => FormField::Kind,
            FormField::Kind => FormField::Op,
            FormField::Op => FormField::Value,
            FormField::Value => FormField::Symbol,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::Symbol => FormField::Value,
            FormField::Kind => FormField::Symbol,
            FormField::Op => FormField::Kind,
            FormField::Value => FormField::Op,
        }
    }
}

/// Text-entry state of the "Create alert" form. Starts as BTC, 24h %, above 5.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertForm {
    pub symbol: String,
    pub kind: AlertKind,
    pub op: AlertOp,
    pub value: String,
    pub field: FormField,
}

impl Default for AlertForm {
    fn default() -> Self {
        let defaults = NewAlert::default();
        Self {
            symbol: defaults.symbol,
            kind: defaults.kind,
            op: defaults.op,
            value: defaults.value.to_string(),
            field: FormField::Symbol,
        }
    }
}

impl AlertForm {
    pub fn type_char(&mut self, c: char) {
        match self.field {
            FormField::Symbol => {
                if c.is_ascii_alphanumeric() && self.symbol.chars().count() < MAX_SYMBOL_LEN {
                    self.symbol.push(c.to_ascii_uppercase());
                }
            }
            FormField::Value => {
                if c.is_ascii_digit() || c == '.' || (c == '-' && self.value.is_empty()) {
                    self.value.push(c);
                }
            }
            FormField::Kind | FormField::Op => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.field {
            FormField::Symbol => {
                self.symbol.pop();
            }
            FormField::Value => {
                self.value.pop();
            }
            FormField::Kind | FormField::Op => {}
        }
    }

    /// Flips the selection of the type or direction field.
    pub fn cycle(&mut self) {
        match self.field {
            FormField::Kind => {
                self.kind = match self.kind {
                    AlertKind::Pct24 => AlertKind::Price,
                    _ => AlertKind::Pct24,
                }
            }
            FormField::Op => {
                self.op = match self.op {
                    AlertOp::Above => AlertOp::Below,
                    AlertOp::Below => AlertOp::Above,
                }
            }
            FormField::Symbol | FormField::Value => {}
        }
    }

    pub fn to_new_alert(&self) -> Result<NewAlert> {
        let value = self
            .value
            .trim()
            .parse::<f64>()
            .map_err(|_| StonksError::InvalidInput("threshold must be a number".into()))?;
        NewAlert {
            symbol: self.symbol.clone(),
            kind: self.kind,
            op: self.op,
            value,
        }
        .validate()
    }
}
