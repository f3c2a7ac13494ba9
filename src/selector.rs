// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Label selector compilation and matching.
//!
//! Matching and rendering are delegated to [`kube::core::Selector`]; this
//! module adds the key, value and operand validation the API server applies
//! to a `LabelSelector` before it is used.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use kube::core::{Expression, SelectorExt};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("{operator:?} is not a valid label selector operator (key {key:?})")]
    UnknownOperator { key: String, operator: String },

    #[error("values for key {key:?} must be non-empty for operator {operator}")]
    MissingValues { key: String, operator: String },

    #[error("values for key {key:?} must be empty for operator {operator}")]
    UnexpectedValues { key: String, operator: String },

    #[error("invalid label key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid label value {value:?} for key {key:?}")]
    InvalidValue { key: String, value: String },
}

/// A compiled label selector. A selector without requirements matches every label set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector(kube::core::Selector);

impl Selector {
    /// Compile a Kubernetes `LabelSelector` into a predicate over label sets.
    pub fn compile(selector: &LabelSelector) -> Result<Self, SelectorError> {
        let mut expressions = Vec::new();

        if let Some(match_labels) = &selector.match_labels {
            for (key, value) in match_labels {
                validate_key(key)?;
                validate_value(key, value)?;
                expressions.push(Expression::Equal(key.clone(), value.clone()));
            }
        }

        if let Some(requirements) = &selector.match_expressions {
            for requirement in requirements {
                expressions.push(expression(requirement)?);
            }
        }

        // Stable sort keeps matchLabels ahead of expressions on the same key
        expressions.sort_by(|a, b| expression_key(a).cmp(expression_key(b)));

        Ok(Self(expressions.into_iter().collect()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.selects_all()
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0.matches(labels)
    }

    /// The selector to hand to the API server, or `None` when it matches everything.
    pub fn label_filter(&self) -> Option<&kube::core::Selector> {
        (!self.is_empty()).then_some(&self.0)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn expression(requirement: &LabelSelectorRequirement) -> Result<Expression, SelectorError> {
    let key = &requirement.key;
    let operator = &requirement.operator;
    let values = requirement.values.as_deref().unwrap_or_default();

    validate_key(key)?;
    match operator.as_str() {
        "In" | "NotIn" if values.is_empty() => {
            return Err(SelectorError::MissingValues {
                key: key.clone(),
                operator: operator.clone(),
            })
        }
        "Exists" | "DoesNotExist" if !values.is_empty() => {
            return Err(SelectorError::UnexpectedValues {
                key: key.clone(),
                operator: operator.clone(),
            })
        }
        "In" | "NotIn" | "Exists" | "DoesNotExist" => {}
        _ => {
            return Err(SelectorError::UnknownOperator {
                key: key.clone(),
                operator: operator.clone(),
            })
        }
    }
    for value in values {
        validate_value(key, value)?;
    }

    Expression::try_from(requirement.clone()).map_err(|_| SelectorError::UnknownOperator {
        key: key.clone(),
        operator: operator.clone(),
    })
}

fn expression_key(expression: &Expression) -> &str {
    match expression {
        Expression::In(key, _)
        | Expression::NotIn(key, _)
        | Expression::Equal(key, _)
        | Expression::NotEqual(key, _)
        | Expression::Exists(key)
        | Expression::DoesNotExist(key) => key,
    }
}

fn validate_value(key: &str, value: &str) -> Result<(), SelectorError> {
    if is_valid_label_value(value) {
        Ok(())
    } else {
        Err(SelectorError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

fn validate_key(key: &str) -> Result<(), SelectorError> {
    let invalid = |reason: &str| SelectorError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty() || prefix.len() > MAX_PREFIX_LEN || !is_dns_subdomain(prefix) {
            return Err(invalid("prefix must be a DNS subdomain"));
        }
    }

    if name.is_empty() {
        return Err(invalid("name part must be non-empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("name part must be no more than 63 characters"));
    }
    if !is_qualified_segment(name) {
        return Err(invalid(
            "name part must consist of alphanumeric characters, '-', '_' or '.', \
             and must start and end with an alphanumeric character",
        ));
    }

    Ok(())
}

fn is_valid_label_value(value: &str) -> bool {
    value.is_empty() || (value.len() <= MAX_NAME_LEN && is_qualified_segment(value))
}

fn is_qualified_segment(s: &str) -> bool {
    let bytes = s.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        }
        _ => false,
    }
}

fn is_dns_subdomain(s: &str) -> bool {
    s.split('.').all(|label| {
        let bytes = label.as_bytes();
        match (bytes.first(), bytes.last()) {
            (Some(first), Some(last)) => {
                label.len() <= MAX_NAME_LEN
                    && (first.is_ascii_lowercase() || first.is_ascii_digit())
                    && (last.is_ascii_lowercase() || last.is_ascii_digit())
                    && bytes
                        .iter()
                        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
            }
            _ => false,
        }
    })
}
