// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

pub mod entity;
pub mod error;
pub mod import;
pub mod models;

use anyhow::Error;
use std::collections::HashMap;

pub use entity::{Entity, ToTable};
pub use error::ErrorKind;
pub use models::{Book, NewReview, Review};

pub type Result<T> = std::result::Result<T, Error>;
pub type MapedRatings<K = i32, Value = i32> = HashMap<K, Vec<Value>>;

pub trait Controller {
    /// Get all books, in storage order
    fn books(&self) -> Result<Vec<Book>>;

    /// Get a single book, fails with `ErrorKind::NotFoundById` if it doesn't exist
    fn book_by_id(&self, id: i32) -> Result<Book>;

    /// Get at most `limit` books whose title or author contains `text` (ignoring case)
    fn books_matching(&self, text: &str, limit: usize) -> Result<Vec<Book>> {
        let needle = text.to_lowercase();
        let books = self
            .books()?
            .into_iter()
            .filter(|book| book.matches(&needle))
            .take(limit)
            .collect();

        Ok(books)
    }

    /// Get the reviews of a book, newest first
    fn reviews_for(&self, book_id: i32) -> Result<Vec<Review>>;

    /// Get every rating grouped by book, i.e. maps Book::Id => [rating]
    fn maped_ratings(&self) -> Result<MapedRatings>;

    /// Insert a new review, fails with `ErrorKind::MissingBook` if the book doesn't exist
    fn insert_review(&self, review: NewReview) -> Result<Review>;

    /// Insert books as they come, ids included
    fn insert_books(&self, books: &[Book]) -> Result<usize>;

    /// Insert already existing reviews, ids and timestamps included
    fn insert_reviews(&self, reviews: &[Review]) -> Result<usize>;

    /// Remove a book together with all of its reviews
    fn delete_book(&self, id: i32) -> Result<Book>;

    /// Remove every review and every book
    fn clear(&self) -> Result<()>;
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn books(&self) -> Result<Vec<Book>> {
        (**self).books()
    }

    fn book_by_id(&self, id: i32) -> Result<Book> {
        (**self).book_by_id(id)
    }

    fn books_matching(&self, text: &str, limit: usize) -> Result<Vec<Book>> {
        (**self).books_matching(text, limit)
    }

    fn reviews_for(&self, book_id: i32) -> Result<Vec<Review>> {
        (**self).reviews_for(book_id)
    }

    fn maped_ratings(&self) -> Result<MapedRatings> {
        (**self).maped_ratings()
    }

    fn insert_review(&self, review: NewReview) -> Result<Review> {
        (**self).insert_review(review)
    }

    fn insert_books(&self, books: &[Book]) -> Result<usize> {
        (**self).insert_books(books)
    }

    fn insert_reviews(&self, reviews: &[Review]) -> Result<usize> {
        (**self).insert_reviews(reviews)
    }

    fn delete_book(&self, id: i32) -> Result<Book> {
        (**self).delete_book(id)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}
