// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use thiserror::Error as DError;

#[derive(Debug, Clone, DError)]
pub enum ErrorKind {
    #[error("Couldn't found book with id({0})")]
    NotFoundById(i32),

    #[error("Couldn't insert review, there's no book with id({0})")]
    MissingBook(i32),

    #[error("Book with id({0}) already exists")]
    DuplicatedBook(i32),

    #[error("Couldn't parse timestamp ({0})")]
    InvalidTimestamp(String),

    #[error("Store lock was poisoned")]
    PoisonedStore,
}
