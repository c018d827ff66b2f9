#[macro_use]
extern crate diesel;

pub mod models;
pub mod schema;

use crate::models::books::{BookRow, NewBook};
use crate::models::reviews::{ImportedReview, NewReview, ReviewRow};
use crate::schema::{books, reviews};
use anyhow::Error;
use config::Config;
use controller::{error::ErrorKind, Book, Controller, MapedRatings, Review};
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{delete, insert_into};
use std::collections::HashMap;

const CREATE_TABLES: &str = include_str!("../migrations/2020-06-01-000000_create_books/up.sql");
const INSERT_CHUNK: usize = 10_000;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub fn establish_pool(url: &str, size: u32) -> Result<PgPool, Error> {
    let manager = ConnectionManager::<PgConnection>::new(url);
    Ok(Pool::builder().max_size(size).build(manager)?)
}

/// Escape `%`, `_` and `\` so `text` is matched literally inside an ILIKE pattern
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Clone)]
pub struct BooksController {
    pool: PgPool,
}

impl BooksController {
    pub fn new() -> Result<Self, Error> {
        Self::with_url("postgres://postgres:@localhost/bookshelf", 4)
    }

    pub fn with_url(url: &str, pool_size: u32) -> Result<Self, Error> {
        let pool = establish_pool(url, pool_size)?;
        Ok(Self { pool })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Self::with_url(&config.database.url, config.database.pool_size)
    }

    /// Create the tables (and the cascade between them) if they don't exist yet
    pub fn create_tables(&self) -> Result<(), Error> {
        self.session(|conn| Ok(conn.batch_execute(CREATE_TABLES)?))?;
        log::info!("Tables books and reviews are ready");
        Ok(())
    }

    // Every call leases its own connection, it goes back to the pool when `f` returns
    fn session<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&PgConnection) -> Result<T, Error>,
    {
        let conn = self.pool.get()?;
        f(&*conn)
    }
}

impl Controller for BooksController {
    fn books(&self) -> Result<Vec<Book>, Error> {
        self.session(|conn| {
            let books = books::table
                .order(books::id)
                .load::<BookRow>(conn)?
                .into_iter()
                .map(Book::from)
                .collect();

            Ok(books)
        })
    }

    fn book_by_id(&self, id: i32) -> Result<Book, Error> {
        self.session(|conn| {
            books::table
                .find(id)
                .first::<BookRow>(conn)
                .optional()?
                .map(Book::from)
                .ok_or_else(|| ErrorKind::NotFoundById(id).into())
        })
    }

    fn books_matching(&self, text: &str, limit: usize) -> Result<Vec<Book>, Error> {
        let pattern = like_pattern(text);

        self.session(|conn| {
            let books = books::table
                .filter(
                    books::title
                        .ilike(pattern.as_str())
                        .or(books::author.ilike(pattern.as_str())),
                )
                .order(books::id)
                .limit(limit as i64)
                .load::<BookRow>(conn)?
                .into_iter()
                .map(Book::from)
                .collect();

            Ok(books)
        })
    }

    fn reviews_for(&self, book_id: i32) -> Result<Vec<Review>, Error> {
        self.session(|conn| {
            let reviews = reviews::table
                .filter(reviews::book_id.eq(book_id))
                .order((reviews::created_at.desc(), reviews::id.desc()))
                .load::<ReviewRow>(conn)?
                .into_iter()
                .map(Review::from)
                .collect();

            Ok(reviews)
        })
    }

    fn maped_ratings(&self) -> Result<MapedRatings, Error> {
        let ratings = self.session(|conn| {
            Ok(reviews::table
                .select((reviews::book_id, reviews::rating))
                .load::<(i32, i32)>(conn)?)
        })?;

        let mut maped_ratings = HashMap::new();
        for (book_id, rating) in ratings {
            maped_ratings
                .entry(book_id)
                .or_insert_with(Vec::new)
                .push(rating);
        }

        Ok(maped_ratings)
    }

    fn insert_review(&self, review: controller::NewReview) -> Result<Review, Error> {
        let book_id = review.book_id;
        let row = NewReview::from(&review);

        self.session(|conn| {
            let inserted = insert_into(reviews::table)
                .values(&row)
                .get_result::<ReviewRow>(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        Error::from(ErrorKind::MissingBook(book_id))
                    }
                    e => Error::from(e),
                })?;

            Ok(Review::from(inserted))
        })
    }

    fn insert_books(&self, books: &[Book]) -> Result<usize, Error> {
        let rows: Vec<NewBook> = books.iter().map(NewBook::from).collect();

        self.session(|conn| {
            let mut inserted = 0;
            for chunk in rows.chunks(INSERT_CHUNK) {
                inserted += insert_into(books::table).values(chunk).execute(conn)?;
            }

            Ok(inserted)
        })
    }

    fn insert_reviews(&self, reviews: &[Review]) -> Result<usize, Error> {
        let rows: Vec<ImportedReview> = reviews.iter().map(ImportedReview::from).collect();

        self.session(|conn| {
            let mut inserted = 0;
            for chunk in rows.chunks(INSERT_CHUNK) {
                inserted += insert_into(reviews::table).values(chunk).execute(conn)?;
            }

            // Explicit ids don't advance the serial, move it past them
            diesel::sql_query(
                "SELECT setval(pg_get_serial_sequence('reviews', 'id'), COALESCE(MAX(id), 0) + 1, false) FROM reviews",
            )
            .execute(conn)?;

            Ok(inserted)
        })
    }

    fn delete_book(&self, id: i32) -> Result<Book, Error> {
        self.session(|conn| {
            let book = books::table
                .find(id)
                .first::<BookRow>(conn)
                .optional()?
                .ok_or(ErrorKind::NotFoundById(id))?;

            let deleted = delete(books::table.find(id)).execute(conn)?;
            log::debug!("Deleted book({}), {} row(s)", id, deleted);
            Ok(Book::from(book))
        })
    }

    fn clear(&self) -> Result<(), Error> {
        self.session(|conn| {
            let removed_reviews = delete(reviews::table).execute(conn)?;
            let removed_books = delete(books::table).execute(conn)?;
            log::info!(
                "Removed {} books and {} reviews",
                removed_books,
                removed_reviews
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_is_literal() {
        assert_eq!(like_pattern("tolstoy"), "%tolstoy%");
        assert_eq!(like_pattern("100%_"), "%100\\%\\_%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}

#[cfg(feature = "test-controller")]
#[cfg(test)]
mod db_tests {
    use super::*;
    use anyhow::Error;
    use controller::NewReview;
    use std::collections::HashMap;

    fn controller() -> Result<BooksController, Error> {
        let vars: HashMap<String, String> = dotenv::vars().collect();
        let controller = match vars.get("DATABASE_URL") {
            Some(url) => BooksController::with_url(url, 2)?,
            None => BooksController::new()?,
        };

        controller.create_tables()?;
        Ok(controller)
    }

    #[test]
    fn missing_book_by_id() -> Result<(), Error> {
        let controller = controller()?;
        let err = controller.book_by_id(-1).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::NotFoundById(-1))
        ));

        Ok(())
    }

    #[test]
    fn review_for_missing_book() -> Result<(), Error> {
        let controller = controller()?;
        let err = controller
            .insert_review(NewReview::new(-2, 5, None))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::MissingBook(-2))
        ));

        Ok(())
    }

    #[test]
    fn delete_cascades_to_reviews() -> Result<(), Error> {
        let controller = controller()?;
        let book = Book::new(910_001, "War and Peace", "Leo Tolstoy");
        controller.insert_books(&[book.clone()])?;

        for rating in &[5, 3, 4] {
            controller.insert_review(NewReview::new(book.id, *rating, None))?;
        }

        assert_eq!(controller.reviews_for(book.id)?.len(), 3);
        assert_eq!(controller.maped_ratings()?[&book.id].len(), 3);

        let deleted = controller.delete_book(book.id)?;
        assert_eq!(deleted, book);
        assert!(controller.reviews_for(book.id)?.is_empty());
        assert!(!controller.maped_ratings()?.contains_key(&book.id));

        Ok(())
    }

    #[test]
    fn search_ignores_case_and_wildcards() -> Result<(), Error> {
        let controller = controller()?;
        let book = Book::new(910_002, "100% Tolstoy_Stories", "Leo Tolstoy");
        controller.insert_books(&[book.clone()])?;

        let by_author = controller.books_matching("TOLSTOY", 1000)?;
        let literal = controller.books_matching("100%", 1000)?;
        let no_wildcard = controller.books_matching("100_", 1000)?;
        controller.delete_book(book.id)?;

        assert!(by_author.contains(&book));
        assert!(literal.contains(&book));
        assert!(!no_wildcard.contains(&book));

        Ok(())
    }
}
