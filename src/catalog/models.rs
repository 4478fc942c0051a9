//! Book catalog data model.
//!
//! A small library domain with the classic N+1 shape: books point at
//! authors, reviews point at books.

use serde::{Deserialize, Serialize};

/// An author record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub bio: String,
    pub nationality: String,
}

/// A book with the reference to its author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub author_id: i64,
}

/// A reader review of one book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub book_id: i64,
    pub reviewer: String,
    pub text: String,
    pub rating: u8,
}

/// A book enriched with its author and reviews
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookWithRelations {
    pub book: Book,
    pub author: Option<Author>,
    pub reviews: Vec<Review>,
    /// Mean review rating rounded to one decimal; `None` without reviews
    pub average_rating: Option<f64>,
}

/// Mean rating rounded to one decimal place
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    Some((f64::from(sum) / reviews.len() as f64 * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: 1,
            book_id: 1,
            reviewer: "Alice Martin".to_string(),
            text: "Captivating from start to finish.".to_string(),
            rating,
        }
    }

    #[test]
    fn test_average_rating_rounds_to_one_decimal() {
        let reviews = vec![review(5), review(4), review(4)];
        assert_eq!(average_rating(&reviews), Some(4.3));
        assert_eq!(average_rating(&[review(3)]), Some(3.0));
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn test_models_serialize() {
        let book = Book {
            id: 5,
            title: "Dune".to_string(),
            year: 1965,
            genre: "Science fiction".to_string(),
            author_id: 2,
        };
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["author_id"], 2);

        let parsed: Book = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, book);
    }
}
