//! # Catalog Demo Domain
//!
//! A seeded book catalog wired to the loader core, demonstrating the N+1
//! problem and its elimination. The in-memory [`store::CatalogStore`] plays
//! the storage collaborator; [`scope::CatalogScope`] is the per-request
//! scope factory with one loader per relation.

pub mod models;
pub mod scope;
pub mod store;

pub use models::{average_rating, Author, Book, BookWithRelations, Review};
pub use scope::{
    resolve_page_naive, CatalogScope, AUTHOR_BY_ID, BOOKS_BY_AUTHOR_ID, REVIEWS_BY_BOOK_ID,
};
pub use store::{AuthorsById, BooksByAuthorId, CatalogStore, ReviewsByBookId};
