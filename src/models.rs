use sea_orm::{ActiveValue::NotSet, DbErr, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::criteria::{BooksCriteria, create_specification};
use crate::entities::book;
use crate::errors::ApiError;
use crate::specification::Specification;
use crate::traits::{CRUDResource, MergeIntoActiveModel};

/// A book as exposed by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub author_id: Option<i64>,
}

impl From<book::Model> for Book {
    fn from(model: book::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            price: model.price,
            author_id: model.author_id,
        }
    }
}

/// Request body of `POST` and `PUT`.
///
/// Every field is optional on the wire so that missing values are reported as
/// validation errors instead of opaque deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub author_id: Option<i64>,
}

/// A validated book without an id, used for inserts and full replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub price: f64,
    pub author_id: Option<i64>,
}

fn check_price(price: f64, errors: &mut Vec<String>) {
    if !price.is_finite() {
        errors.push("price must be a finite number".to_string());
    }
}

impl BookPayload {
    /// # Errors
    ///
    /// Returns [`ApiError::ValidationFailed`] listing every missing or invalid field.
    pub fn validate(self) -> Result<NewBook, ApiError> {
        let mut errors = Vec::new();
        if self.title.is_none() {
            errors.push("title is required".to_string());
        }
        match self.price {
            Some(price) => check_price(price, &mut errors),
            None => errors.push("price is required".to_string()),
        }

        match (self.title, self.price) {
            (Some(title), Some(price)) if errors.is_empty() => Ok(NewBook {
                title,
                price,
                author_id: self.author_id,
            }),
            _ => Err(ApiError::validation_failed(errors)),
        }
    }
}

impl From<NewBook> for book::ActiveModel {
    fn from(new: NewBook) -> Self {
        Self {
            id: NotSet,
            title: Set(new.title),
            price: Set(new.price),
            author_id: Set(new.author_id),
        }
    }
}

impl MergeIntoActiveModel<book::ActiveModel> for NewBook {
    fn merge_into_activemodel(self, mut existing: book::ActiveModel) -> Result<book::ActiveModel, DbErr> {
        existing.title = Set(self.title);
        existing.price = Set(self.price);
        existing.author_id = Set(self.author_id);
        Ok(existing)
    }
}

/// Request body of `PATCH`: absent fields are left unchanged.
///
/// `authorId` distinguishes absent (keep) from `null` (clear).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub price: Option<f64>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub author_id: Option<Option<i64>>,
}

impl BookPatch {
    /// # Errors
    ///
    /// Returns [`ApiError::ValidationFailed`] when a provided price is not finite.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if let Some(price) = self.price {
            check_price(price, &mut errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_failed(errors))
        }
    }
}

impl MergeIntoActiveModel<book::ActiveModel> for BookPatch {
    fn merge_into_activemodel(self, mut existing: book::ActiveModel) -> Result<book::ActiveModel, DbErr> {
        if let Some(title) = self.title {
            existing.title = Set(title);
        }
        if let Some(price) = self.price {
            existing.price = Set(price);
        }
        if let Some(author_id) = self.author_id {
            existing.author_id = Set(author_id);
        }
        Ok(existing)
    }
}

impl CRUDResource for Book {
    type EntityType = book::Entity;
    type ColumnType = book::Column;
    type ActiveModelType = book::ActiveModel;
    type CreateModel = NewBook;
    type Criteria = BooksCriteria;

    const ID_COLUMN: Self::ColumnType = book::Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "book";
    const RESOURCE_NAME_PLURAL: &'static str = "books";

    fn create_specification(criteria: &BooksCriteria) -> Specification<book::Entity> {
        create_specification(criteria)
    }
}
