// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use crate::schema::reviews;
use chrono::{DateTime, Utc};
use controller::{NewReview as Proto, Review};

// To query data from the database
#[derive(Debug, Clone, Queryable)]
pub struct ReviewRow {
    pub id: i32,
    pub book_id: i32,
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            book_id: row.book_id,
            rating: row.rating,
            review_text: row.review_text,
            created_at: row.created_at,
        }
    }
}

// To insert a new review, id comes from the serial
#[derive(Debug, Clone, Insertable)]
#[table_name = "reviews"]
pub struct NewReview<'a> {
    pub book_id: i32,
    pub rating: i32,
    pub review_text: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Proto> for NewReview<'a> {
    fn from(proto: &'a Proto) -> Self {
        NewReview {
            book_id: proto.book_id,
            rating: proto.rating,
            review_text: proto.review_text.as_deref(),
            created_at: proto.timestamp(),
        }
    }
}

// To import reviews that already have an id
#[derive(Debug, Clone, Insertable)]
#[table_name = "reviews"]
pub struct ImportedReview<'a> {
    pub id: i32,
    pub book_id: i32,
    pub rating: i32,
    pub review_text: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Review> for ImportedReview<'a> {
    fn from(review: &'a Review) -> Self {
        ImportedReview {
            id: review.id,
            book_id: review.book_id,
            rating: review.rating,
            review_text: review.review_text.as_deref(),
            created_at: review.created_at,
        }
    }
}
