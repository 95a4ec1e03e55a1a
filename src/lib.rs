//! # books-api
//!
//! REST backend for a Books resource on Axum and Sea-ORM, built around a
//! criteria query layer: open-ended `field.operator=value` request parameters
//! are bound into [`criteria::BooksCriteria`] and compiled into a single
//! [`specification::Specification`] that drives list, page and count queries
//! alike.
//!
//! ```text
//! GET /api/books?price.greaterThanOrEqual=10&title.contains=Ring&sort=price,desc
//! GET /api/books/count?authorId.specified=false
//! ```

pub mod broker;
pub mod config;
pub mod criteria;
pub mod entities;
pub mod errors;
pub mod filter;
pub mod migration;
pub mod models;
pub mod openapi;
pub mod pagination;
pub mod routes;
pub mod service;
pub mod sort;
pub mod specification;
pub mod traits;

pub use errors::ApiError;
pub use traits::CRUDResource;
