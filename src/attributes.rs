//! The attribute bag handed to a factory with every start-of-element event.
//!
//! Attribute names are case sensitive. Values arrive already unescaped from the
//! document driver; the typed getters below turn them into the scalar types the
//! builders need and report a [`TimecourseError::FormatViolation`] naming the
//! element and attribute when a value is missing or malformed.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, TimecourseError};
use crate::keys::KeyHasher;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: HashMap<String, String, KeyHasher>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
    /// Builder-style insert, handy when assembling events by hand.
    pub fn with(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.insert(name, value.to_string());
        self
    }
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn required(&self, element: &str, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(TimecourseError::format(format!(
                "<{element}> is missing required attribute '{name}'"
            ))),
        }
    }
    /// Absent and blank values are both treated as missing.
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.trim().is_empty())
    }
    pub fn optional_string(&self, name: &str) -> Option<String> {
        self.optional(name).map(str::to_owned)
    }

    pub fn required_int(&self, element: &str, name: &str) -> Result<i32> {
        parse_int(element, name, self.required(element, name)?)
    }
    pub fn optional_int(&self, element: &str, name: &str) -> Result<Option<i32>> {
        self.optional(name)
            .map(|value| parse_int(element, name, value))
            .transpose()
    }
    pub fn optional_serial(&self, element: &str, name: &str) -> Result<Option<u64>> {
        self.optional(name)
            .map(|value| {
                value.trim().parse::<u64>().map_err(|_| {
                    TimecourseError::format(format!(
                        "<{element}> attribute '{name}' is not a serial number: '{value}'"
                    ))
                })
            })
            .transpose()
    }
    pub fn required_float(&self, element: &str, name: &str) -> Result<f64> {
        parse_float(element, name, self.required(element, name)?)
    }
    pub fn optional_float(&self, element: &str, name: &str) -> Result<Option<f64>> {
        self.optional(name)
            .map(|value| parse_float(element, name, value))
            .transpose()
    }
    /// `yes` / `no` flags; anything else is a format error.
    pub fn yes_no(&self, element: &str, name: &str, default: bool) -> Result<bool> {
        match self.optional(name).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) if v == "yes" || v == "true" => Ok(true),
            Some(v) if v == "no" || v == "false" => Ok(false),
            Some(v) => Err(TimecourseError::format(format!(
                "<{element}> attribute '{name}' must be yes or no, found '{v}'"
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (k, v) in iter {
            attributes.insert(k, v);
        }
        attributes
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn parse_int(element: &str, name: &str, value: &str) -> Result<i32> {
    value.trim().parse::<i32>().map_err(|_| {
        TimecourseError::format(format!(
            "<{element}> attribute '{name}' is not an integer: '{value}'"
        ))
    })
}

fn parse_float(element: &str, name: &str, value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(TimecourseError::format(format!(
            "<{element}> attribute '{name}' is not a number: '{value}'"
        ))),
    }
}
