//! Query-string binding for filters.
//!
//! A query parameter `field.operator=value` is routed to the filter of `field`,
//! which parses `value` into its scalar type. Values that do not parse are
//! rejected here, so condition building never sees an ill-typed value.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

use super::{Filter, RangeFilter, StringFilter};

/// A filter value could not be parsed into the type of its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParseError {
    pub field: String,
    pub operator: String,
    pub value: String,
    pub expected: &'static str,
}

impl fmt::Display for FilterParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid value '{}' for '{}", self.value, self.field)?;
        if !self.operator.is_empty() {
            write!(f, ".{}", self.operator)?;
        }
        write!(f, "': expected {}", self.expected)
    }
}

impl std::error::Error for FilterParseError {}

/// Scalar types that can appear as a filter operand.
pub trait FilterValue: Sized {
    /// Human readable type name used in error messages.
    const EXPECTED: &'static str;

    fn parse_value(raw: &str) -> Option<Self>;
}

impl FilterValue for i32 {
    const EXPECTED: &'static str = "an integer";

    fn parse_value(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl FilterValue for i64 {
    const EXPECTED: &'static str = "an integer";

    fn parse_value(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl FilterValue for f64 {
    const EXPECTED: &'static str = "a finite number";

    fn parse_value(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
    }
}

impl FilterValue for bool {
    const EXPECTED: &'static str = "true or false";

    fn parse_value(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

impl FilterValue for String {
    const EXPECTED: &'static str = "a string";

    fn parse_value(raw: &str) -> Option<Self> {
        Some(raw.to_owned())
    }
}

impl FilterValue for DateTime<Utc> {
    const EXPECTED: &'static str = "an RFC 3339 timestamp";

    fn parse_value(raw: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|instant| instant.with_timezone(&Utc))
    }
}

impl FilterValue for NaiveDate {
    const EXPECTED: &'static str = "a date (YYYY-MM-DD)";

    fn parse_value(raw: &str) -> Option<Self> {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
    }
}

pub(crate) fn parse_one<T: FilterValue>(field: &str, operator: &str, raw: &str) -> Result<T, FilterParseError> {
    T::parse_value(raw).ok_or_else(|| FilterParseError {
        field: field.to_owned(),
        operator: operator.to_owned(),
        value: raw.to_owned(),
        expected: T::EXPECTED,
    })
}

/// Comma separated list, e.g. `in=1,2,3`.
fn parse_list<T: FilterValue>(
    field: &str,
    operator: &str,
    raw: &str,
) -> Result<Vec<T>, FilterParseError> {
    raw.split(',')
        .map(|item| parse_one(field, operator, item))
        .collect()
}

/// Binds one `operator=value` pair onto a filter.
pub trait ParseFilter: Default {
    /// Returns `Ok(false)` when the operator is not supported by this filter.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterParseError`] when the value does not parse into the
    /// filter's scalar type.
    fn apply(&mut self, field: &str, operator: &str, raw: &str) -> Result<bool, FilterParseError>;
}

impl<T: FilterValue> ParseFilter for Filter<T> {
    fn apply(&mut self, field: &str, operator: &str, raw: &str) -> Result<bool, FilterParseError> {
        match operator {
            "equals" => self.equals = Some(parse_one(field, operator, raw)?),
            "notEquals" => self.not_equals = Some(parse_one(field, operator, raw)?),
            // Repeated parameters accumulate into the same set
            "in" => {
                let values = parse_list(field, operator, raw)?;
                self.in_list.get_or_insert_with(Vec::new).extend(values);
            }
            "notIn" => {
                let values = parse_list(field, operator, raw)?;
                self.not_in_list.get_or_insert_with(Vec::new).extend(values);
            }
            "specified" => self.specified = Some(parse_one(field, operator, raw)?),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl<T: FilterValue> ParseFilter for RangeFilter<T> {
    fn apply(&mut self, field: &str, operator: &str, raw: &str) -> Result<bool, FilterParseError> {
        match operator {
            "greaterThan" => self.greater_than = Some(parse_one(field, operator, raw)?),
            "greaterThanOrEqual" => {
                self.greater_than_or_equal = Some(parse_one(field, operator, raw)?);
            }
            "lessThan" => self.less_than = Some(parse_one(field, operator, raw)?),
            "lessThanOrEqual" => self.less_than_or_equal = Some(parse_one(field, operator, raw)?),
            _ => return self.filter.apply(field, operator, raw),
        }
        Ok(true)
    }
}

impl ParseFilter for StringFilter {
    fn apply(&mut self, field: &str, operator: &str, raw: &str) -> Result<bool, FilterParseError> {
        match operator {
            "contains" => self.contains = Some(raw.to_owned()),
            "doesNotContain" | "notContains" => self.does_not_contain = Some(raw.to_owned()),
            _ => return self.filter.apply(field, operator, raw),
        }
        Ok(true)
    }
}

/// Applies `operator=raw` to the filter in `slot`, creating it on first use.
///
/// Unsupported operators leave `slot` untouched so that an unknown operator
/// never turns an absent filter into an empty present one.
///
/// # Errors
///
/// Propagates the [`FilterParseError`] of a value that does not parse.
pub fn bind_filter<F: ParseFilter>(
    slot: &mut Option<F>,
    field: &str,
    operator: &str,
    raw: &str,
) -> Result<bool, FilterParseError> {
    let was_present = slot.is_some();
    let mut filter = slot.take().unwrap_or_default();
    let result = filter.apply(field, operator, raw);
    if was_present || matches!(result, Ok(true)) {
        *slot = Some(filter);
    }
    result
}
