//! Comparator construction and pagination for query results

use crate::model::Notification;
use std::cmp::Ordering;

/// Known sortable fields for notification queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Default ordering; also the tie-breaker for every other field.
    Timestamp,
    /// Order by notification name.
    Notification,
}

impl SortField {
    /// Map a field-name token to a comparator field. Unrecognized tokens
    /// fall back to [`SortField::Timestamp`], the documented default, so
    /// the same input always produces the same ordering.
    pub fn parse(token: Option<&str>) -> Self {
        match token {
            Some(t) if t.eq_ignore_ascii_case("notification") => SortField::Notification,
            _ => SortField::Timestamp,
        }
    }

    fn compare(&self, a: &Notification, b: &Notification) -> Ordering {
        match self {
            SortField::Timestamp => a.timestamp.cmp(&b.timestamp),
            SortField::Notification => a
                .notification
                .cmp(&b.notification)
                .then(a.timestamp.cmp(&b.timestamp)),
        }
    }
}

/// Sort direction; `Desc` reverses the field comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Case-insensitive "desc" selects descending; anything else,
    /// including `None`, is ascending.
    pub fn parse(token: Option<&str>) -> Self {
        match token {
            Some(t) if t.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

/// Sort, then paginate with `skip`/`take`.
///
/// `skip` at or beyond the sequence length yields an empty page. A `take`
/// of `None` or `0` yields the full remaining sequence.
pub fn order_and_limit(
    mut items: Vec<Notification>,
    field: SortField,
    order: SortOrder,
    skip: Option<usize>,
    take: Option<usize>,
) -> Vec<Notification> {
    items.sort_by(|a, b| field.compare(a, b));
    if order == SortOrder::Desc {
        items.reverse();
    }

    let skip = skip.unwrap_or(0);
    if skip >= items.len() {
        return Vec::new();
    }
    let rest = items.split_off(skip);
    match take {
        Some(n) if n > 0 => rest.into_iter().take(n).collect(),
        _ => rest,
    }
}
