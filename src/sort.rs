use sea_orm::Order;
use std::fmt;

/// A `sort` parameter named a property that is not sortable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortError {
    pub property: String,
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot sort by unknown property '{}'", self.property)
    }
}

impl std::error::Error for SortError {}

/// Convert a direction segment to Order; `None` if the segment is not a direction.
fn parse_order(direction: &str) -> Option<Order> {
    if direction.eq_ignore_ascii_case("asc") {
        Some(Order::Asc)
    } else if direction.eq_ignore_ascii_case("desc") {
        Some(Order::Desc)
    } else {
        None
    }
}

/// Parses one `sort` value: `property[,property...][,asc|desc]`.
///
/// The trailing direction, if any, applies to every property of the value.
/// Blank segments are skipped.
///
/// # Errors
///
/// Returns [`SortError`] when `resolve` does not know a property.
pub fn parse_sort_value<C, R>(value: &str, resolve: &R) -> Result<Vec<(C, Order)>, SortError>
where
    R: Fn(&str) -> Option<C>,
{
    let mut segments: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();

    let order = match segments.last().and_then(|last| parse_order(last)) {
        Some(order) => {
            segments.pop();
            order
        }
        None => Order::Asc,
    };

    segments
        .into_iter()
        .map(|property| {
            resolve(property)
                .map(|column| (column, order.clone()))
                .ok_or_else(|| SortError {
                    property: property.to_string(),
                })
        })
        .collect()
}

/// Parses every `sort` value in request order, e.g. `sort=price,desc&sort=id`.
///
/// # Errors
///
/// Returns [`SortError`] for the first unknown property.
pub fn parse_sorting<'a, C, R>(
    values: impl IntoIterator<Item = &'a str>,
    resolve: R,
) -> Result<Vec<(C, Order)>, SortError>
where
    R: Fn(&str) -> Option<C>,
{
    let mut sort = Vec::new();
    for value in values {
        sort.extend(parse_sort_value(value, &resolve)?);
    }
    Ok(sort)
}
