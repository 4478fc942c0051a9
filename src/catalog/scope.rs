//! Per-request resolution scope for the catalog.
//!
//! The scope bundles one fresh loader (scheduler + cache) per relation and
//! lives exactly as long as one logical request: create it when the request
//! arrives, drop it when the response is done. Sibling lookups issued while
//! resolving a page coalesce into one bulk fetch per relation, and repeated
//! keys are served from the scope cache. The naive strategy is kept
//! alongside for comparison; it is the textbook N+1 shape.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;

use crate::config::LoaderConfig;
use crate::error::LoadResult;
use crate::loader::Loader;
use crate::metrics::FlushObserver;

use super::models::{average_rating, Author, Book, BookWithRelations, Review};
use super::store::{AuthorsById, BooksByAuthorId, CatalogStore, ReviewsByBookId};

/// Relation name for resolving an author by id
pub const AUTHOR_BY_ID: &str = "author_by_id";
/// Relation name for resolving a book's reviews
pub const REVIEWS_BY_BOOK_ID: &str = "reviews_by_book_id";
/// Relation name for resolving an author's books
pub const BOOKS_BY_AUTHOR_ID: &str = "books_by_author_id";

/// One logical request's worth of loaders over the catalog.
///
/// Never shared across requests; dropping the scope discards all cached
/// outcomes and rejects any still-pending loads.
pub struct CatalogScope {
    store: Arc<CatalogStore>,
    authors: Loader<i64, Option<Author>>,
    reviews_by_book: Loader<i64, Vec<Review>>,
    books_by_author: Loader<i64, Vec<Book>>,
}

impl CatalogScope {
    /// Create a fresh scope with one loader per relation
    pub fn new(
        store: Arc<CatalogStore>,
        observer: Arc<dyn FlushObserver>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            authors: Loader::new(
                AUTHOR_BY_ID,
                Arc::new(AuthorsById::new(Arc::clone(&store))),
                Arc::clone(&observer),
                config.clone(),
            ),
            reviews_by_book: Loader::new(
                REVIEWS_BY_BOOK_ID,
                Arc::new(ReviewsByBookId::new(Arc::clone(&store))),
                Arc::clone(&observer),
                config.clone(),
            ),
            books_by_author: Loader::new(
                BOOKS_BY_AUTHOR_ID,
                Arc::new(BooksByAuthorId::new(Arc::clone(&store))),
                observer,
                config,
            ),
            store,
        }
    }

    /// Load an author by id, coalesced with sibling author lookups
    pub fn author(&self, id: i64) -> impl Future<Output = LoadResult<Option<Author>>> + Send {
        self.authors.load(id)
    }

    /// Load a book's reviews, coalesced with sibling review lookups
    pub fn reviews_for_book(&self, book_id: i64) -> impl Future<Output = LoadResult<Vec<Review>>> + Send {
        self.reviews_by_book.load(book_id)
    }

    /// Load an author's books, coalesced with sibling shelf lookups
    pub fn books_for_author(&self, author_id: i64) -> impl Future<Output = LoadResult<Vec<Book>>> + Send {
        self.books_by_author.load(author_id)
    }

    /// Resolve one book's relations through the scope's loaders
    pub async fn book_with_relations(&self, book: Book) -> LoadResult<BookWithRelations> {
        let author = self.author(book.author_id);
        let reviews = self.reviews_for_book(book.id);
        let (author, reviews) = tokio::join!(author, reviews);
        let reviews = reviews?;
        Ok(BookWithRelations {
            author: author?,
            average_rating: average_rating(&reviews),
            book,
            reviews,
        })
    }

    /// Resolve a page of books with authors and reviews.
    ///
    /// The fan-out runs in one synchronous burst, so all author lookups land
    /// in one flush and all review lookups in another: one storage round
    /// trip per relation instead of two per book.
    pub async fn books_page_with_relations(
        &self,
        limit: usize,
        offset: usize,
    ) -> LoadResult<Vec<BookWithRelations>> {
        let books = self.store.books_page(limit, offset);
        let resolutions = books.into_iter().map(|book| self.book_with_relations(book));
        join_all(resolutions).await.into_iter().collect()
    }
}

/// Naive per-item resolution: one author fetch and one review fetch per
/// book, the N+1 pattern the loader exists to eliminate
pub fn resolve_page_naive(
    store: &CatalogStore,
    limit: usize,
    offset: usize,
) -> Vec<BookWithRelations> {
    store
        .books_page(limit, offset)
        .into_iter()
        .map(|book| {
            let author = store.author(book.author_id);
            let reviews = store.reviews_for_book(book.id);
            BookWithRelations {
                author,
                average_rating: average_rating(&reviews),
                book,
                reviews,
            }
        })
        .collect()
}
