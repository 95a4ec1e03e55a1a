//! Composable query predicates.
//!
//! A [`Specification`] is the compiled form of a criteria object: a
//! conjunctive [`Condition`] over the entity, the relations that must be
//! left-joined for the condition to resolve, and whether the final row set is
//! de-duplicated. List, page and count queries are all derived from the same
//! [`Specification::select`], so they can never disagree on which rows match.

use sea_orm::{
    Condition, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait, Select,
};
use std::fmt;

pub struct Specification<E: EntityTrait> {
    condition: Condition,
    joins: Vec<E::Relation>,
    distinct: bool,
}

impl<E: EntityTrait> Specification<E> {
    /// The universal predicate: matches every row.
    #[must_use]
    pub fn all() -> Self {
        Self {
            condition: Condition::all(),
            joins: Vec::new(),
            distinct: false,
        }
    }

    /// AND `condition` onto this specification. Empty conditions are skipped.
    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        if !condition.is_empty() {
            self.condition = self.condition.add(condition);
        }
        self
    }

    #[must_use]
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Requires a LEFT OUTER JOIN on `relation`; joining twice is a no-op.
    #[must_use]
    pub fn join(mut self, relation: E::Relation) -> Self
    where
        E::Relation: PartialEq,
    {
        if !self.joins.contains(&relation) {
            self.joins.push(relation);
        }
        self
    }

    #[must_use]
    pub fn joins(&self) -> &[E::Relation] {
        &self.joins
    }

    #[must_use]
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// True when the specification places no constraint on the rows.
    #[must_use]
    pub fn is_universal(&self) -> bool {
        self.condition.is_empty()
    }

    /// The filtered `SELECT` shared by every execution mode.
    #[must_use]
    pub fn select(&self) -> Select<E> {
        let select = self
            .joins
            .iter()
            .fold(E::find(), |select, relation| {
                select.join(JoinType::LeftJoin, relation.def())
            })
            .filter(self.condition.clone());

        if self.distinct {
            select.distinct()
        } else {
            select
        }
    }
}

impl<E: EntityTrait> Default for Specification<E> {
    fn default() -> Self {
        Self::all()
    }
}

impl<E> Clone for Specification<E>
where
    E: EntityTrait,
    E::Relation: Clone,
{
    fn clone(&self) -> Self {
        Self {
            condition: self.condition.clone(),
            joins: self.joins.clone(),
            distinct: self.distinct,
        }
    }
}

impl<E: EntityTrait> fmt::Debug for Specification<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("condition", &self.condition)
            .field("joins", &self.joins)
            .field("distinct", &self.distinct)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{author, book};
    use sea_orm::{ColumnTrait, DbBackend, QueryTrait};

    fn sql(spec: &Specification<book::Entity>) -> String {
        spec.select().build(DbBackend::Sqlite).to_string()
    }

    #[test]
    fn test_all_has_no_where_clause() {
        let spec = Specification::<book::Entity>::all();
        assert!(spec.is_universal());
        assert!(!sql(&spec).contains("WHERE"));
    }

    #[test]
    fn test_and_skips_empty_conditions() {
        let spec = Specification::<book::Entity>::all()
            .and(Condition::all())
            .and(Condition::all());
        assert!(spec.is_universal());
    }

    #[test]
    fn test_and_is_conjunctive() {
        let spec = Specification::<book::Entity>::all()
            .and(Condition::all().add(book::Column::Title.eq("Dune")))
            .and(Condition::all().add(book::Column::Price.lt(5.0)));
        let sql = sql(&spec);

        assert!(sql.contains(r#""books"."title" = 'Dune'"#), "{sql}");
        assert!(sql.contains(r#""books"."price" < 5"#), "{sql}");
        assert!(sql.contains(" AND "), "{sql}");
        assert!(!sql.contains(" OR "), "{sql}");
    }

    #[test]
    fn test_join_is_left_outer_and_deduplicated() {
        let spec = Specification::<book::Entity>::all()
            .join(book::Relation::Author)
            .join(book::Relation::Author)
            .and(Condition::all().add(author::Column::Id.eq(5)));
        let sql = sql(&spec);

        assert_eq!(spec.joins().len(), 1);
        assert_eq!(sql.matches("LEFT JOIN").count(), 1, "{sql}");
        assert!(sql.contains(r#""author"."id" = 5"#), "{sql}");
    }

    #[test]
    fn test_distinct_applies_to_final_select() {
        let spec = Specification::<book::Entity>::all()
            .distinct(true)
            .join(book::Relation::Author);
        let sql = sql(&spec);

        assert!(spec.is_distinct());
        assert!(sql.starts_with("SELECT DISTINCT"), "{sql}");
        assert!(sql.contains("LEFT JOIN"), "{sql}");
    }
}
