use sea_orm::{
    ColumnTrait, Condition, Value,
    sea_query::{LikeExpr, SimpleExpr},
};

use super::{Filter, RangeFilter, StringFilter};

const LIKE_ESCAPE: char = '!';

/// Wraps `value` in `%..%`, escaping `LIKE` metacharacters so they match literally.
fn contains_pattern(value: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape(LIKE_ESCAPE)
}

fn base_clauses<C, T>(filter: &Filter<T>, column: C) -> Vec<SimpleExpr>
where
    C: ColumnTrait,
    T: Clone + Into<Value>,
{
    [
        filter.equals.clone().map(|value| column.eq(value)),
        filter.not_equals.clone().map(|value| column.ne(value)),
        filter.in_list.clone().map(|values| column.is_in(values)),
        filter.not_in_list.clone().map(|values| column.is_not_in(values)),
        filter.specified.map(|specified| {
            if specified {
                column.is_not_null()
            } else {
                column.is_null()
            }
        }),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn conjunction(clauses: impl IntoIterator<Item = SimpleExpr>) -> Condition {
    clauses.into_iter().fold(Condition::all(), Condition::add)
}

/// Conditions for the operators every filter supports.
///
/// `notEquals` and `notIn` compile to plain `<>` / `NOT IN`, so rows where the
/// column is `NULL` never match them.
pub fn build_specification<C, T>(filter: &Filter<T>, column: C) -> Condition
where
    C: ColumnTrait,
    T: Clone + Into<Value>,
{
    conjunction(base_clauses(filter, column))
}

/// Conditions for an ordered filter: base operators plus range bounds.
pub fn build_range_specification<C, T>(filter: &RangeFilter<T>, column: C) -> Condition
where
    C: ColumnTrait,
    T: Clone + Into<Value>,
{
    let bounds = [
        filter.greater_than.clone().map(|value| column.gt(value)),
        filter.greater_than_or_equal.clone().map(|value| column.gte(value)),
        filter.less_than.clone().map(|value| column.lt(value)),
        filter.less_than_or_equal.clone().map(|value| column.lte(value)),
    ];

    conjunction(
        base_clauses(&filter.filter, column)
            .into_iter()
            .chain(bounds.into_iter().flatten()),
    )
}

/// Conditions for a text filter: base operators plus substring matching.
pub fn build_string_specification<C>(filter: &StringFilter, column: C) -> Condition
where
    C: ColumnTrait,
{
    let substrings = [
        filter
            .contains
            .as_deref()
            .map(|value| column.like(contains_pattern(value))),
        filter
            .does_not_contain
            .as_deref()
            .map(|value| column.not_like(contains_pattern(value))),
    ];

    conjunction(
        base_clauses(&filter.filter, column)
            .into_iter()
            .chain(substrings.into_iter().flatten()),
    )
}
