// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

//! A `Controller` living entirely in process memory.
//!
//! Mirrors what the PostgreSQL schema enforces: reviews must point to an
//! existing book and removing a book removes its reviews.

use anyhow::Error;
use controller::{error::ErrorKind, Book, Controller, MapedRatings, NewReview, Review};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Store {
    books: Vec<Book>,
    reviews: Vec<Review>,
    last_review_id: i32,
}

impl Store {
    fn has_book(&self, id: i32) -> bool {
        self.books.iter().any(|book| book.id == id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryController {
    store: Mutex<Store>,
}

impl MemoryController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a controller already holding `books` and `reviews`
    pub fn with_data(books: &[Book], reviews: &[Review]) -> Result<Self, Error> {
        let controller = Self::new();
        controller.insert_books(books)?;
        controller.insert_reviews(reviews)?;
        Ok(controller)
    }

    fn store(&self) -> Result<MutexGuard<'_, Store>, ErrorKind> {
        self.store.lock().map_err(|_| ErrorKind::PoisonedStore)
    }
}

impl Controller for MemoryController {
    fn books(&self) -> Result<Vec<Book>, Error> {
        Ok(self.store()?.books.clone())
    }

    fn book_by_id(&self, id: i32) -> Result<Book, Error> {
        self.store()?
            .books
            .iter()
            .find(|book| book.id == id)
            .cloned()
            .ok_or_else(|| ErrorKind::NotFoundById(id).into())
    }

    fn reviews_for(&self, book_id: i32) -> Result<Vec<Review>, Error> {
        let mut reviews: Vec<_> = self
            .store()?
            .reviews
            .iter()
            .filter(|review| review.book_id == book_id)
            .cloned()
            .collect();

        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    fn maped_ratings(&self) -> Result<MapedRatings, Error> {
        let store = self.store()?;

        let mut maped_ratings = HashMap::new();
        for review in &store.reviews {
            maped_ratings
                .entry(review.book_id)
                .or_insert_with(Vec::new)
                .push(review.rating);
        }

        Ok(maped_ratings)
    }

    fn insert_review(&self, review: NewReview) -> Result<Review, Error> {
        let mut store = self.store()?;
        if !store.has_book(review.book_id) {
            return Err(ErrorKind::MissingBook(review.book_id).into());
        }

        store.last_review_id += 1;
        let created_at = review.timestamp();
        let review = Review {
            id: store.last_review_id,
            book_id: review.book_id,
            rating: review.rating,
            review_text: review.review_text,
            created_at,
        };

        store.reviews.push(review.clone());
        Ok(review)
    }

    fn insert_books(&self, books: &[Book]) -> Result<usize, Error> {
        let mut store = self.store()?;

        // Nothing is stored unless the whole batch is valid
        let mut seen = HashSet::new();
        for book in books {
            if store.has_book(book.id) || !seen.insert(book.id) {
                return Err(ErrorKind::DuplicatedBook(book.id).into());
            }
        }

        store.books.extend_from_slice(books);
        store.books.sort_by_key(|book| book.id);
        Ok(books.len())
    }

    fn insert_reviews(&self, reviews: &[Review]) -> Result<usize, Error> {
        let mut store = self.store()?;
        if let Some(review) = reviews.iter().find(|review| !store.has_book(review.book_id)) {
            return Err(ErrorKind::MissingBook(review.book_id).into());
        }

        for review in reviews {
            store.last_review_id = store.last_review_id.max(review.id);
            store.reviews.push(review.clone());
        }

        Ok(reviews.len())
    }

    fn delete_book(&self, id: i32) -> Result<Book, Error> {
        let mut store = self.store()?;
        let position = store
            .books
            .iter()
            .position(|book| book.id == id)
            .ok_or(ErrorKind::NotFoundById(id))?;

        let book = store.books.remove(position);
        let before = store.reviews.len();
        store.reviews.retain(|review| review.book_id != id);
        log::debug!(
            "Removed book({}) and {} of its reviews",
            id,
            before - store.reviews.len()
        );

        Ok(book)
    }

    fn clear(&self) -> Result<(), Error> {
        let mut store = self.store()?;
        store.reviews.clear();
        store.books.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Error;
    use chrono::{TimeZone, Utc};

    fn controller() -> Result<MemoryController, Error> {
        let books = vec![
            Book::new(1, "Anna Karenina", "Leo Tolstoy"),
            Book::new(2, "The Idiot", "Fyodor Dostoevsky"),
        ];

        let controller = MemoryController::with_data(&books, &[])?;
        for (book_id, rating, day) in &[(1, 5, 1), (1, 3, 3), (1, 4, 2), (2, 2, 1)] {
            controller.insert_review(NewReview {
                created_at: Some(Utc.with_ymd_and_hms(2024, 3, *day, 12, 0, 0).unwrap()),
                ..NewReview::new(*book_id, *rating, None)
            })?;
        }

        Ok(controller)
    }

    #[test]
    fn book_by_missing_id() -> Result<(), Error> {
        let controller = controller()?;
        let err = controller.book_by_id(42).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::NotFoundById(42))
        ));

        Ok(())
    }

    #[test]
    fn reviews_newest_first() -> Result<(), Error> {
        let controller = controller()?;
        let ratings: Vec<_> = controller
            .reviews_for(1)?
            .into_iter()
            .map(|review| review.rating)
            .collect();

        assert_eq!(ratings, vec![3, 4, 5]);

        Ok(())
    }

    #[test]
    fn review_for_missing_book() -> Result<(), Error> {
        let controller = controller()?;
        let err = controller
            .insert_review(NewReview::new(99, 5, None))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::MissingBook(99))
        ));

        Ok(())
    }

    #[test]
    fn review_ids_are_assigned() -> Result<(), Error> {
        let controller = controller()?;
        let review = controller.insert_review(NewReview::new(2, 5, Some("Great".into())))?;

        assert_eq!(review.id, 5);
        assert_eq!(review.review_text.as_deref(), Some("Great"));

        Ok(())
    }

    #[test]
    fn delete_cascades_to_reviews() -> Result<(), Error> {
        let controller = controller()?;
        let deleted = controller.delete_book(1)?;

        assert_eq!(deleted.title, "Anna Karenina");
        assert!(controller.reviews_for(1)?.is_empty());
        assert!(!controller.maped_ratings()?.contains_key(&1));
        assert_eq!(controller.reviews_for(2)?.len(), 1);

        Ok(())
    }

    #[test]
    fn match_ignores_case() -> Result<(), Error> {
        let controller = controller()?;
        let books = controller.books_matching("TOLSTOY", 10)?;

        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, 1);

        Ok(())
    }

    #[test]
    fn duplicated_books_are_rejected() -> Result<(), Error> {
        let controller = controller()?;
        let err = controller
            .insert_books(&[Book::new(2, "Demons", "Fyodor Dostoevsky")])
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::DuplicatedBook(2))
        ));

        Ok(())
    }

    #[test]
    fn same_timestamp_newest_id_first() -> Result<(), Error> {
        let book = Book::new(1, "Oblomov", "Ivan Goncharov");
        let controller = MemoryController::with_data(&[book], &[])?;
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        for rating in 1..=3 {
            controller.insert_review(NewReview {
                created_at: Some(created_at),
                ..NewReview::new(1, rating, None)
            })?;
        }

        let ids: Vec<_> = controller
            .reviews_for(1)?
            .into_iter()
            .map(|review| review.id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);

        Ok(())
    }

    #[test]
    fn rejected_batch_stores_nothing() -> Result<(), Error> {
        let controller = controller()?;
        let batch = vec![
            Book::new(5, "Demons", "Fyodor Dostoevsky"),
            Book::new(3, "Dead Souls", "Nikolai Gogol"),
            Book::new(2, "The Idiot", "Fyodor Dostoevsky"),
        ];

        assert!(controller.insert_books(&batch).is_err());
        let twins = vec![
            Book::new(7, "Fathers and Sons", "Ivan Turgenev"),
            Book::new(7, "Rudin", "Ivan Turgenev"),
        ];
        assert!(controller.insert_books(&twins).is_err());

        let ids: Vec<_> = controller.books()?.into_iter().map(|book| book.id).collect();
        assert_eq!(ids, vec![1, 2]);

        // Storage order stays ascending by id
        controller.insert_books(&batch[..2])?;
        let ids: Vec<_> = controller.books()?.into_iter().map(|book| book.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 5]);

        Ok(())
    }
}
