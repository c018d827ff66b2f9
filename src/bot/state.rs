// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

/// What the bot expects next from one user
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Conversation {
    Idle,
    /// Free text is a search query
    Searching,
    /// A book was picked for review, waiting for the rating
    AwaitingRating { book_id: i32 },
    /// Rating chosen, free text is the review itself
    AwaitingText { book_id: i32, rating: i32 },
}

impl Default for Conversation {
    fn default() -> Self {
        Conversation::Idle
    }
}

impl Conversation {
    pub fn review_in_progress(&self) -> Option<i32> {
        match self {
            Conversation::AwaitingRating { book_id } | Conversation::AwaitingText { book_id, .. } => {
                Some(*book_id)
            }
            _ => None,
        }
    }
}
