// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

//! Readers for the bulk import files.
//!
//! `books.csv` has the header `id,title,author` and `reviews.csv` the header
//! `id,book_id,rating,review_text,created_at`.

use crate::error::ErrorKind;
use crate::models::{Book, Review};
use anyhow::Error;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct BookRecord {
    id: i32,
    title: String,
    author: String,
}

#[derive(Debug, Deserialize)]
struct ReviewRecord {
    id: i32,
    book_id: i32,
    rating: i32,
    review_text: Option<String>,
    created_at: String,
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ErrorKind> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ErrorKind::InvalidTimestamp(raw.to_string()))
}

pub fn books_from_reader<R: Read>(reader: R) -> Result<Vec<Book>, Error> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .from_reader(reader);

    let mut books = Vec::new();
    for record in csv.deserialize::<BookRecord>() {
        let BookRecord { id, title, author } = record?;
        books.push(Book { id, title, author });
    }

    Ok(books)
}

pub fn reviews_from_reader<R: Read>(reader: R) -> Result<Vec<Review>, Error> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .from_reader(reader);

    let mut reviews = Vec::new();
    for record in csv.deserialize::<ReviewRecord>() {
        let record = record?;
        let review_text = record.review_text.filter(|text| !text.is_empty());

        reviews.push(Review {
            id: record.id,
            book_id: record.book_id,
            rating: record.rating,
            review_text,
            created_at: parse_timestamp(&record.created_at)?,
        });
    }

    Ok(reviews)
}

pub fn read_books(path: impl AsRef<Path>) -> Result<Vec<Book>, Error> {
    books_from_reader(std::fs::File::open(path)?)
}

pub fn read_reviews(path: impl AsRef<Path>) -> Result<Vec<Review>, Error> {
    reviews_from_reader(std::fs::File::open(path)?)
}
