use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("validation failed: {0}")]
    Invalid(FieldErrors),
}

impl ModelError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { field, message: message.into() }
    }

    /// Flatten into a field -> message map.
    pub fn into_field_errors(self) -> FieldErrors {
        match self {
            ModelError::Validation { field, message } => {
                let mut errs = FieldErrors::default();
                errs.insert(field, message);
                errs
            }
            ModelError::Invalid(errs) => errs,
        }
    }
}

/// Per-field validation messages, keyed by the wire field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        // first failure per field wins
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Record the failure carried by `res`, if any.
    pub fn check(&mut self, res: Result<(), ModelError>) {
        if let Err(e) = res {
            for (field, message) in e.into_field_errors().0 {
                self.insert(field, message);
            }
        }
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, field: &str) -> Option<&str> { self.0.get(field).map(String::as_str) }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn into_result(self) -> Result<(), ModelError> {
        if self.is_empty() { Ok(()) } else { Err(ModelError::Invalid(self)) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join(", "))
    }
}
