use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;

use crate::broker::{MessageProducer, PUBLISH_BOOK, publish_detached};
use crate::criteria::{BookField, BooksCriteria};
use crate::models::{Book, BookPatch, NewBook};
use crate::pagination::{Page, PageRequest};
use crate::traits::CRUDResource;

/// Business operations on books: persistence through [`CRUDResource`] plus
/// the create notification.
#[derive(Clone)]
pub struct BooksService {
    db: DatabaseConnection,
    producer: Arc<dyn MessageProducer>,
    topic: String,
}

impl BooksService {
    pub fn new(db: DatabaseConnection, producer: Arc<dyn MessageProducer>) -> Self {
        Self::with_topic(db, producer, PUBLISH_BOOK)
    }

    pub fn with_topic(
        db: DatabaseConnection,
        producer: Arc<dyn MessageProducer>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            db,
            producer,
            topic: topic.into(),
        }
    }

    /// Inserts the book, then announces it on the configured topic.
    ///
    /// The announcement runs detached and cannot fail the save.
    ///
    /// # Errors
    ///
    /// Returns the [`DbErr`] of a failed insert; nothing is published then.
    pub async fn save(&self, new: NewBook) -> Result<Book, DbErr> {
        tracing::debug!(?new, "Request to save Book");
        let book = Book::create(&self.db, new).await?;

        match serde_json::to_vec(&book) {
            Ok(payload) => {
                tracing::info!(id = book.id, topic = %self.topic, "Publishing created book");
                publish_detached(Arc::clone(&self.producer), self.topic.clone(), payload);
            }
            Err(err) => tracing::warn!(id = book.id, error = %err, "Could not serialize book for publishing"),
        }

        Ok(book)
    }

    /// Replaces title, price and author. `Ok(None)` if the book does not exist.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn update(&self, id: i64, book: NewBook) -> Result<Option<Book>, DbErr> {
        tracing::debug!(id, ?book, "Request to update Book");
        Book::update(&self.db, id, book).await
    }

    /// Applies the fields present in `patch`. `Ok(None)` if the book does not exist.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn partial_update(&self, id: i64, patch: BookPatch) -> Result<Option<Book>, DbErr> {
        tracing::debug!(id, ?patch, "Request to partially update Book");
        Book::update(&self.db, id, patch).await
    }

    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn find_all(&self, page: &PageRequest<BookField>) -> Result<Page<Book>, DbErr> {
        tracing::debug!("Request to get all Books");
        self.find_page_by_criteria(&BooksCriteria::default(), page).await
    }

    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn find_one(&self, id: i64) -> Result<Option<Book>, DbErr> {
        tracing::debug!(id, "Request to get Book");
        Book::get_one(&self.db, id).await
    }

    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn exists(&self, id: i64) -> Result<bool, DbErr> {
        Book::exists(&self.db, id).await
    }

    /// Deleting a book that does not exist is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn delete(&self, id: i64) -> Result<(), DbErr> {
        tracing::debug!(id, "Request to delete Book");
        let deleted = Book::delete(&self.db, id).await?;
        if deleted == 0 {
            tracing::debug!(id, "Book already absent");
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn find_by_criteria(&self, criteria: &BooksCriteria) -> Result<Vec<Book>, DbErr> {
        Book::find_by_criteria(&self.db, criteria).await
    }

    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn find_page_by_criteria(
        &self,
        criteria: &BooksCriteria,
        page: &PageRequest<BookField>,
    ) -> Result<Page<Book>, DbErr> {
        let columns = PageRequest {
            page: page.page,
            size: page.size,
            sort: page
                .sort
                .iter()
                .map(|(field, order)| (field.column(), order.clone()))
                .collect(),
        };
        Book::find_page_by_criteria(&self.db, criteria, &columns).await
    }

    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn count_by_criteria(&self, criteria: &BooksCriteria) -> Result<u64, DbErr> {
        Book::count_by_criteria(&self.db, criteria).await
    }
}
