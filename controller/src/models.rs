// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use crate::entity::Entity;
use chrono::{DateTime, Utc};
use common_macros::hash_map;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
}

impl Book {
    pub fn new(id: i32, title: &str, author: &str) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
        }
    }

    /// Case-insensitive substring match on title or author, `needle` must be lowercase
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.author.to_lowercase().contains(needle)
    }
}

impl Entity for Book {
    type Id = i32;

    fn get_id(&self) -> Self::Id {
        self.id
    }

    fn get_data(&self) -> HashMap<String, String> {
        hash_map! {
            "title".into() => self.title.clone(),
            "author".into() => self.author.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: i32,
    pub book_id: i32,
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Review {
    type Id = i32;

    fn get_id(&self) -> Self::Id {
        self.id
    }

    fn get_data(&self) -> HashMap<String, String> {
        hash_map! {
            "book_id".into() => self.book_id.to_string(),
            "rating".into() => self.rating.to_string(),
            "review_text".into() => self.review_text.clone().unwrap_or_default(),
            "created_at".into() => self.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

// To insert a new review, id is assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub book_id: i32,
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewReview {
    pub fn new(book_id: i32, rating: i32, review_text: Option<String>) -> Self {
        Self {
            book_id,
            rating,
            review_text,
            created_at: None,
        }
    }

    /// Timestamp to store, insertion time unless one was given
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or_else(Utc::now)
    }
}
