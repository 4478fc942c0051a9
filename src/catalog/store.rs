//! In-memory catalog store.
//!
//! Stands in for the relational storage collaborator: point lookups for the
//! naive per-item strategy, aligned bulk lookups for the batched one, and a
//! fetch counter so a measurement harness can see exactly how many storage
//! round trips each strategy performed. Every public lookup counts as one
//! fetch, mirroring one query against a real backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::batch_fn::{BatchFetchMany, BatchFetchOne};
use crate::error::BatchError;

use super::models::{Author, Book, Review};

#[derive(Debug, Default)]
pub struct CatalogStore {
    authors: Vec<Author>,
    books: Vec<Book>,
    reviews: Vec<Review>,
    fetch_count: AtomicU64,
}

impl CatalogStore {
    pub fn new(authors: Vec<Author>, books: Vec<Book>, reviews: Vec<Review>) -> Self {
        Self {
            authors,
            books,
            reviews,
            fetch_count: AtomicU64::new(0),
        }
    }

    /// Store seeded with the demo dataset: 10 authors, 30 books, 100 reviews
    pub fn seeded() -> Self {
        Self::new(seed_authors(), seed_books(), seed_reviews())
    }

    /// Reset the fetch counter to zero
    pub fn reset_fetch_count(&self) {
        self.fetch_count.store(0, Ordering::Relaxed);
    }

    /// Number of fetches executed since the last reset
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    fn record_fetch(&self, query: &str) {
        let total = self.fetch_count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(query = %query, total, "catalog fetch");
    }

    /// Page of books in id order
    pub fn books_page(&self, limit: usize, offset: usize) -> Vec<Book> {
        self.record_fetch("SELECT * FROM books LIMIT ? OFFSET ?");
        self.books.iter().skip(offset).take(limit).cloned().collect()
    }

    pub fn book(&self, id: i64) -> Option<Book> {
        self.record_fetch("SELECT * FROM books WHERE id = ?");
        self.books.iter().find(|b| b.id == id).cloned()
    }

    pub fn author(&self, id: i64) -> Option<Author> {
        self.record_fetch("SELECT * FROM authors WHERE id = ?");
        self.authors.iter().find(|a| a.id == id).cloned()
    }

    pub fn reviews_for_book(&self, book_id: i64) -> Vec<Review> {
        self.record_fetch("SELECT * FROM reviews WHERE book_id = ?");
        self.reviews
            .iter()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect()
    }

    pub fn books_for_author(&self, author_id: i64) -> Vec<Book> {
        self.record_fetch("SELECT * FROM books WHERE author_id = ?");
        self.books
            .iter()
            .filter(|b| b.author_id == author_id)
            .cloned()
            .collect()
    }

    /// One bulk fetch; results re-aligned to the requested id order
    pub fn authors_by_ids(&self, ids: &[i64]) -> Vec<Option<Author>> {
        self.record_fetch("SELECT * FROM authors WHERE id IN (...)");
        let by_id: HashMap<i64, &Author> = self.authors.iter().map(|a| (a.id, a)).collect();
        ids.iter().map(|id| by_id.get(id).map(|a| (*a).clone())).collect()
    }

    /// One bulk fetch; reviews grouped per requested book id, empty if none
    pub fn reviews_by_book_ids(&self, ids: &[i64]) -> Vec<Vec<Review>> {
        self.record_fetch("SELECT * FROM reviews WHERE book_id IN (...)");
        let mut grouped: HashMap<i64, Vec<Review>> = HashMap::new();
        for review in self.reviews.iter().filter(|r| ids.contains(&r.book_id)) {
            grouped.entry(review.book_id).or_default().push(review.clone());
        }
        ids.iter().map(|id| grouped.remove(id).unwrap_or_default()).collect()
    }

    /// One bulk fetch; books grouped per requested author id, empty if none
    pub fn books_by_author_ids(&self, ids: &[i64]) -> Vec<Vec<Book>> {
        self.record_fetch("SELECT * FROM books WHERE author_id IN (...)");
        let mut grouped: HashMap<i64, Vec<Book>> = HashMap::new();
        for book in self.books.iter().filter(|b| ids.contains(&b.author_id)) {
            grouped.entry(book.author_id).or_default().push(book.clone());
        }
        ids.iter().map(|id| grouped.remove(id).unwrap_or_default()).collect()
    }
}

/// Batch function resolving authors by id
#[derive(Debug, Clone)]
pub struct AuthorsById {
    store: Arc<CatalogStore>,
}

impl AuthorsById {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BatchFetchOne<i64, Author> for AuthorsById {
    async fn fetch_one(&self, keys: &[i64]) -> Result<Vec<Option<Author>>, BatchError> {
        Ok(self.store.authors_by_ids(keys))
    }
}

/// Batch function resolving each book's reviews
#[derive(Debug, Clone)]
pub struct ReviewsByBookId {
    store: Arc<CatalogStore>,
}

impl ReviewsByBookId {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BatchFetchMany<i64, Review> for ReviewsByBookId {
    async fn fetch_many(&self, keys: &[i64]) -> Result<Vec<Vec<Review>>, BatchError> {
        Ok(self.store.reviews_by_book_ids(keys))
    }
}

/// Batch function resolving each author's books
#[derive(Debug, Clone)]
pub struct BooksByAuthorId {
    store: Arc<CatalogStore>,
}

impl BooksByAuthorId {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BatchFetchMany<i64, Book> for BooksByAuthorId {
    async fn fetch_many(&self, keys: &[i64]) -> Result<Vec<Vec<Book>>, BatchError> {
        Ok(self.store.books_by_author_ids(keys))
    }
}

fn seed_authors() -> Vec<Author> {
    let rows: [(i64, &str, &str, &str); 10] = [
        (1, "Isaac Asimov", "Prolific writer, father of robot fiction and creator of the Foundation saga.", "American"),
        (2, "Frank Herbert", "Creator of the Dune universe, blending ecology, politics and religion.", "American"),
        (3, "Philip K. Dick", "Master of paranoid science fiction, questioning reality and identity.", "American"),
        (4, "Arthur C. Clarke", "Visionary of the space age, co-creator of 2001: A Space Odyssey.", "British"),
        (5, "Ursula K. Le Guin", "Pioneer of social and anthropological science fiction.", "American"),
        (6, "Ray Bradbury", "Poet of the genre, author of Fahrenheit 451 and The Martian Chronicles.", "American"),
        (7, "Stanislaw Lem", "Polish philosopher and satirist, author of Solaris.", "Polish"),
        (8, "H.G. Wells", "Founding father of modern science fiction.", "British"),
        (9, "Jules Verne", "Pioneer of the scientific adventure novel.", "French"),
        (10, "Aldous Huxley", "Author of Brave New World, a founding dystopia.", "British"),
    ];
    rows.into_iter()
        .map(|(id, name, bio, nationality)| Author {
            id,
            name: name.to_string(),
            bio: bio.to_string(),
            nationality: nationality.to_string(),
        })
        .collect()
}

fn seed_books() -> Vec<Book> {
    let rows: [(i64, &str, i32, &str, i64); 30] = [
        (1, "Foundation", 1951, "Science fiction", 1),
        (2, "Foundation and Empire", 1952, "Science fiction", 1),
        (3, "Second Foundation", 1953, "Science fiction", 1),
        (4, "I, Robot", 1950, "Science fiction", 1),
        (5, "Dune", 1965, "Science fiction", 2),
        (6, "Dune Messiah", 1969, "Science fiction", 2),
        (7, "Children of Dune", 1976, "Science fiction", 2),
        (8, "Ubik", 1969, "Science fiction", 3),
        (9, "The Man in the High Castle", 1962, "Alternate history", 3),
        (10, "Do Androids Dream of Electric Sheep?", 1968, "Science fiction", 3),
        (11, "2001: A Space Odyssey", 1968, "Science fiction", 4),
        (12, "Rendezvous with Rama", 1973, "Science fiction", 4),
        (13, "The Fountains of Paradise", 1979, "Science fiction", 4),
        (14, "The Left Hand of Darkness", 1969, "Science fiction", 5),
        (15, "The Dispossessed", 1974, "Science fiction", 5),
        (16, "The Word for World Is Forest", 1972, "Science fiction", 5),
        (17, "Fahrenheit 451", 1953, "Dystopia", 6),
        (18, "The Martian Chronicles", 1950, "Science fiction", 6),
        (19, "The Illustrated Man", 1951, "Short stories", 6),
        (20, "Solaris", 1961, "Science fiction", 7),
        (21, "The Futurological Congress", 1971, "Science fiction", 7),
        (22, "Tales of Pirx the Pilot", 1968, "Science fiction", 7),
        (23, "The Time Machine", 1895, "Science fiction", 8),
        (24, "The War of the Worlds", 1898, "Science fiction", 8),
        (25, "The Island of Doctor Moreau", 1896, "Science fiction", 8),
        (26, "Twenty Thousand Leagues Under the Seas", 1870, "Adventure", 9),
        (27, "From the Earth to the Moon", 1865, "Adventure", 9),
        (28, "Journey to the Center of the Earth", 1864, "Adventure", 9),
        (29, "Brave New World", 1932, "Dystopia", 10),
        (30, "Island", 1962, "Utopia", 10),
    ];
    rows.into_iter()
        .map(|(id, title, year, genre, author_id)| Book {
            id,
            title: title.to_string(),
            year,
            genre: genre.to_string(),
            author_id,
        })
        .collect()
}

fn seed_reviews() -> Vec<Review> {
    let reviewers = [
        "Alice Martin",
        "Bob Dupont",
        "Claire Lefevre",
        "David Moreau",
        "Emma Bernard",
        "Francois Petit",
        "Gabrielle Roux",
        "Hugo Lambert",
        "Ines Fontaine",
        "Julien Mercier",
    ];
    let texts = [
        "An absolute masterpiece.",
        "Captivating from start to finish.",
        "Excellent, worth rereading.",
        "Interesting but dated.",
        "A little long in places.",
    ];

    let mut reviews = Vec::new();
    let mut review_id = 1;
    // First ten books get four reviews, the rest three, for 100 total.
    for book_id in 1..=30_i64 {
        let count: i64 = if book_id <= 10 { 4 } else { 3 };
        for r in 0..count {
            let rating = (((book_id + r) % 5) + 1) as u8;
            reviews.push(Review {
                id: review_id,
                book_id,
                reviewer: reviewers[((book_id + r) as usize) % reviewers.len()].to_string(),
                text: texts[(rating as usize - 1) % texts.len()].to_string(),
                rating,
            });
            review_id += 1;
        }
    }
    reviews
}
