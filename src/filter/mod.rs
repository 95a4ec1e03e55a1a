//! # Typed Field Filters
//!
//! Every queryable attribute of a resource is described by an optional filter.
//! A filter carries zero or more operator values; each operator that is set
//! contributes one clause, and all clauses of one filter are combined with AND.
//!
//! | Operator             | Query parameter                  | Available on            |
//! |----------------------|----------------------------------|-------------------------|
//! | equality             | `field.equals=v`                 | all filters             |
//! | inequality           | `field.notEquals=v`              | all filters             |
//! | set membership       | `field.in=a,b`                   | all filters             |
//! | set exclusion        | `field.notIn=a,b`                | all filters             |
//! | null check           | `field.specified=true\|false`    | all filters             |
//! | ordering             | `field.greaterThan=v` (and `greaterThanOrEqual`, `lessThan`, `lessThanOrEqual`) | [`RangeFilter`] |
//! | substring            | `field.contains=s`, `field.doesNotContain=s` | [`StringFilter`] |
//!
//! ```rust
//! use books_api::filter::{DoubleFilter, StringFilter};
//!
//! let price = DoubleFilter::new().greater_than_or_equal(10.0).less_than(20.0);
//! let title = StringFilter::new().contains("Tolkien");
//! assert!(!price.is_empty());
//! assert!(!title.is_empty());
//! ```

pub mod conditions;
pub mod query_parser;

use chrono::{DateTime, NaiveDate, Utc};

pub use conditions::{build_range_specification, build_specification, build_string_specification};
pub use query_parser::{FilterParseError, FilterValue, ParseFilter};

/// Base filter with the operators every scalar type supports.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<T> {
    pub equals: Option<T>,
    pub not_equals: Option<T>,
    pub in_list: Option<Vec<T>>,
    pub not_in_list: Option<Vec<T>>,
    /// `true` means "is not null", `false` means "is null".
    pub specified: Option<bool>,
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self {
            equals: None,
            not_equals: None,
            in_list: None,
            not_in_list: None,
            specified: None,
        }
    }
}

impl<T> Filter<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equals(mut self, value: impl Into<T>) -> Self {
        self.equals = Some(value.into());
        self
    }

    #[must_use]
    pub fn not_equals(mut self, value: impl Into<T>) -> Self {
        self.not_equals = Some(value.into());
        self
    }

    #[must_use]
    pub fn in_list<V: Into<T>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.in_list = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn not_in_list<V: Into<T>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.not_in_list = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn specified(mut self, specified: bool) -> Self {
        self.specified = Some(specified);
        self
    }

    /// True when no operator is set, i.e. the filter constrains nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.equals.is_none()
            && self.not_equals.is_none()
            && self.in_list.is_none()
            && self.not_in_list.is_none()
            && self.specified.is_none()
    }
}

/// Builder methods that forward to the embedded base [`Filter`].
macro_rules! forward_base_builders {
    ($value:ty) => {
        #[must_use]
        pub fn equals(mut self, value: impl Into<$value>) -> Self {
            self.filter = self.filter.equals(value);
            self
        }

        #[must_use]
        pub fn not_equals(mut self, value: impl Into<$value>) -> Self {
            self.filter = self.filter.not_equals(value);
            self
        }

        #[must_use]
        pub fn in_list<V: Into<$value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
            self.filter = self.filter.in_list(values);
            self
        }

        #[must_use]
        pub fn not_in_list<V: Into<$value>>(
            mut self,
            values: impl IntoIterator<Item = V>,
        ) -> Self {
            self.filter = self.filter.not_in_list(values);
            self
        }

        #[must_use]
        pub fn specified(mut self, specified: bool) -> Self {
            self.filter = self.filter.specified(specified);
            self
        }
    };
}

/// Filter for ordered types: numbers, instants and dates.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter<T> {
    pub filter: Filter<T>,
    pub greater_than: Option<T>,
    pub greater_than_or_equal: Option<T>,
    pub less_than: Option<T>,
    pub less_than_or_equal: Option<T>,
}

impl<T> Default for RangeFilter<T> {
    fn default() -> Self {
        Self {
            filter: Filter::default(),
            greater_than: None,
            greater_than_or_equal: None,
            less_than: None,
            less_than_or_equal: None,
        }
    }
}

impl<T> RangeFilter<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    forward_base_builders!(T);

    #[must_use]
    pub fn greater_than(mut self, value: impl Into<T>) -> Self {
        self.greater_than = Some(value.into());
        self
    }

    #[must_use]
    pub fn greater_than_or_equal(mut self, value: impl Into<T>) -> Self {
        self.greater_than_or_equal = Some(value.into());
        self
    }

    #[must_use]
    pub fn less_than(mut self, value: impl Into<T>) -> Self {
        self.less_than = Some(value.into());
        self
    }

    #[must_use]
    pub fn less_than_or_equal(mut self, value: impl Into<T>) -> Self {
        self.less_than_or_equal = Some(value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
            && self.greater_than.is_none()
            && self.greater_than_or_equal.is_none()
            && self.less_than.is_none()
            && self.less_than_or_equal.is_none()
    }
}

/// Filter for text attributes, adding substring matching.
///
/// Substring matching follows the collation of the storage engine; on
/// `SQLite` `LIKE` ignores ASCII case, on `PostgreSQL` it does not.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringFilter {
    pub filter: Filter<String>,
    pub contains: Option<String>,
    pub does_not_contain: Option<String>,
}

impl StringFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    forward_base_builders!(String);

    #[must_use]
    pub fn contains(mut self, value: impl Into<String>) -> Self {
        self.contains = Some(value.into());
        self
    }

    #[must_use]
    pub fn does_not_contain(mut self, value: impl Into<String>) -> Self {
        self.does_not_contain = Some(value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filter.is_empty() && self.contains.is_none() && self.does_not_contain.is_none()
    }
}

pub type BooleanFilter = Filter<bool>;
pub type IntegerFilter = RangeFilter<i32>;
pub type LongFilter = RangeFilter<i64>;
pub type DoubleFilter = RangeFilter<f64>;
pub type InstantFilter = RangeFilter<DateTime<Utc>>;
pub type LocalDateFilter = RangeFilter<NaiveDate>;
