// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

pub mod error;
pub mod ratings;

use anyhow::Error;
use config::CatalogConfig;
use controller::{Book, Controller, Entity, NewReview, Review};
use rand::{seq::SliceRandom, Rng};
use std::cmp::Ordering;
use std::collections::HashMap;

pub use error::{ErrorKind, Failure};
pub use ratings::{average, mean, parse_rating, validate_rating};

/// A book together with its rating summary
#[derive(Debug, Clone, PartialEq)]
pub struct RatedBook {
    pub book: Book,
    /// Rounded to 2 decimals
    pub average: Option<f64>,
    pub reviews: usize,
    /// Unrounded mean, 0 for unrated books
    pub score: f64,
}

impl RatedBook {
    pub fn new(book: Book, ratings: &[i32]) -> Self {
        Self {
            book,
            average: average(ratings),
            reviews: ratings.len(),
            score: mean(ratings).unwrap_or(0.0),
        }
    }

    /// Value used to rank books
    pub fn rank(&self) -> f64 {
        self.score
    }
}

impl Entity for RatedBook {
    type Id = i32;

    fn get_id(&self) -> Self::Id {
        self.book.id
    }

    fn get_data(&self) -> HashMap<String, String> {
        let average = match self.average {
            Some(average) => format!("{:.2}", average),
            None => "No ratings".into(),
        };

        let mut data = self.book.get_data();
        data.insert("average".into(), average);
        data.insert("reviews".into(), self.reviews.to_string());
        data
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookDetail {
    pub book: Book,
    pub average: Option<f64>,
    /// Newest first
    pub reviews: Vec<Review>,
}

pub struct Engine<C> {
    controller: C,
    catalog: CatalogConfig,
}

impl<C: Controller> Engine<C> {
    pub fn with_controller(controller: C) -> Self {
        Self::with_config(controller, &CatalogConfig::default())
    }

    pub fn with_config(controller: C, catalog: &CatalogConfig) -> Self {
        Self {
            controller,
            catalog: catalog.clone(),
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn catalog(&self) -> &CatalogConfig {
        &self.catalog
    }

    /// Every book with its average rating, in storage order
    pub fn books_with_average(&self) -> Result<Vec<RatedBook>, Error> {
        let books = self.controller.books()?;
        let maped_ratings = self.controller.maped_ratings()?;

        let rated = books
            .into_iter()
            .map(|book| {
                let ratings = maped_ratings
                    .get(&book.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();

                RatedBook::new(book, ratings)
            })
            .collect();

        Ok(rated)
    }

    pub fn book_detail(&self, book_id: i32) -> Result<BookDetail, Error> {
        let book = self.controller.book_by_id(book_id)?;
        let reviews = self.controller.reviews_for(book_id)?;

        let ratings: Vec<_> = reviews.iter().map(|review| review.rating).collect();
        Ok(BookDetail {
            book,
            average: average(&ratings),
            reviews,
        })
    }

    /// Books whose title or author contains `text`, ignoring case
    pub fn search(&self, text: &str) -> Result<Vec<Book>, Error> {
        let books = self
            .controller
            .books_matching(text.trim(), self.catalog.search_limit)?;

        log::debug!("Search for '{}' matched {} books", text.trim(), books.len());
        Ok(books)
    }

    /// The `n` best rated books, ties keep storage order
    pub fn top(&self, n: usize) -> Result<Vec<RatedBook>, Error> {
        let mut books = self.books_with_average()?;

        // sort_by is stable
        books.sort_by(|a, b| b.rank().partial_cmp(&a.rank()).unwrap_or(Ordering::Equal));
        books.truncate(n);

        Ok(books)
    }

    pub fn random_book(&self) -> Result<Book, Error> {
        self.random_book_with(&mut rand::thread_rng())
    }

    pub fn random_book_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Book, Error> {
        let books = self.controller.books()?;
        books
            .choose(rng)
            .cloned()
            .ok_or_else(|| ErrorKind::EmptyCatalog.into())
    }

    /// Validate and store a review, it's timestamped with the insertion time
    pub fn add_review(
        &self,
        book_id: i32,
        rating: i64,
        review_text: Option<String>,
    ) -> Result<Review, Error> {
        let rating = validate_rating(rating)?;

        // Fail with NotFound instead of leaving it to the store
        self.controller.book_by_id(book_id)?;

        let review = self
            .controller
            .insert_review(NewReview::new(book_id, rating, review_text))?;

        log::info!(
            "Added review({}) for book({}) with rating {}",
            review.id,
            book_id,
            rating
        );

        Ok(review)
    }
}
