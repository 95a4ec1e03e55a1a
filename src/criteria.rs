//! Filtering criteria for the Books resource.
//!
//! A request such as
//! `/api/books?id.greaterThan=5&title.contains=Ring&authorId.specified=false`
//! is bound into a [`BooksCriteria`], which [`create_specification`] compiles
//! into a single [`Specification`].

use std::fmt;

use crate::entities::{author, book};
use crate::filter::{
    DoubleFilter, FilterParseError, LongFilter, StringFilter, build_range_specification,
    build_string_specification,
    query_parser::{bind_filter, parse_one},
};
use crate::specification::Specification;

/// Logical attributes of a book that can be filtered or sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Id,
    Title,
    Price,
    AuthorId,
}

impl BookField {
    pub const ALL: [Self; 4] = [Self::Id, Self::Title, Self::Price, Self::AuthorId];

    /// Name used in query parameters and JSON.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Price => "price",
            Self::AuthorId => "authorId",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Column on the `books` table backing this field.
    #[must_use]
    pub const fn column(self) -> book::Column {
        match self {
            Self::Id => book::Column::Id,
            Self::Title => book::Column::Title,
            Self::Price => book::Column::Price,
            Self::AuthorId => book::Column::AuthorId,
        }
    }
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One optional filter per queryable attribute of a book.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooksCriteria {
    pub id: Option<LongFilter>,
    pub title: Option<StringFilter>,
    pub price: Option<DoubleFilter>,
    pub author_id: Option<LongFilter>,
    pub distinct: Option<bool>,
}

impl BooksCriteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `field.operator=value` pairs. Parameters that are not filters
    /// (`page`, `sort`, unknown fields or operators) are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterParseError`] for the first value that does not parse
    /// into its field's type.
    pub fn from_query<K, V>(params: &[(K, V)]) -> Result<Self, FilterParseError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut criteria = Self::default();
        for (key, value) in params {
            criteria.bind(key.as_ref(), value.as_ref())?;
        }
        Ok(criteria)
    }

    fn bind(&mut self, key: &str, raw: &str) -> Result<(), FilterParseError> {
        if key == "distinct" {
            self.distinct = Some(parse_one::<bool>(key, "", raw)?);
            return Ok(());
        }

        let Some((name, operator)) = key.split_once('.') else {
            return Ok(());
        };
        let Some(field) = BookField::from_name(name) else {
            return Ok(());
        };

        let applied = match field {
            BookField::Id => bind_filter(&mut self.id, name, operator, raw)?,
            BookField::Title => bind_filter(&mut self.title, name, operator, raw)?,
            BookField::Price => bind_filter(&mut self.price, name, operator, raw)?,
            BookField::AuthorId => bind_filter(&mut self.author_id, name, operator, raw)?,
        };
        if !applied {
            tracing::debug!(field = name, operator, "Ignoring unsupported filter operator");
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.title.is_none()
            && self.price.is_none()
            && self.author_id.is_none()
            && self.distinct.is_none()
    }
}

impl fmt::Display for BooksCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BooksCriteria{")?;
        if let Some(id) = &self.id {
            write!(f, "id={id:?}, ")?;
        }
        if let Some(title) = &self.title {
            write!(f, "title={title:?}, ")?;
        }
        if let Some(price) = &self.price {
            write!(f, "price={price:?}, ")?;
        }
        if let Some(author_id) = &self.author_id {
            write!(f, "authorId={author_id:?}, ")?;
        }
        if let Some(distinct) = self.distinct {
            write!(f, "distinct={distinct}, ")?;
        }
        f.write_str("}")
    }
}

/// Compiles criteria into one conjunctive specification.
///
/// `distinct` is set before any relation join is added so the directive
/// covers the joined row set.
#[must_use]
pub fn create_specification(criteria: &BooksCriteria) -> Specification<book::Entity> {
    let spec = Specification::all().distinct(criteria.distinct.unwrap_or(false));

    let own_fields = [
        criteria
            .id
            .as_ref()
            .map(|filter| build_range_specification(filter, BookField::Id.column())),
        criteria
            .title
            .as_ref()
            .map(|filter| build_string_specification(filter, BookField::Title.column())),
        criteria
            .price
            .as_ref()
            .map(|filter| build_range_specification(filter, BookField::Price.column())),
    ];
    let spec = own_fields.into_iter().flatten().fold(spec, Specification::and);

    match &criteria.author_id {
        Some(filter) => spec
            .join(book::Relation::Author)
            .and(build_range_specification(filter, author::Column::Id)),
        None => spec,
    }
}
