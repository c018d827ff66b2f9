// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use anyhow::Error;
use controller::error::ErrorKind as StoreErrorKind;
use thiserror::Error as DError;

#[derive(Debug, Clone, DError)]
pub enum ErrorKind {
    #[error("Enter a valid number in the rating field")]
    RatingNotANumber(String),

    #[error("Rating must be a number from 1 to 5")]
    RatingOutOfRange(i64),

    #[error("There are no books in the catalog")]
    EmptyCatalog,
}

/// How a failed operation should be reported to whoever asked for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    NotFound(String),
    Validation(String),
    Internal,
}

impl Failure {
    pub fn of(err: &Error) -> Self {
        if let Some(kind) = err.downcast_ref::<ErrorKind>() {
            return match kind {
                ErrorKind::EmptyCatalog => Failure::NotFound(kind.to_string()),
                ErrorKind::RatingNotANumber(_) | ErrorKind::RatingOutOfRange(_) => {
                    Failure::Validation(kind.to_string())
                }
            };
        }

        if let Some(kind) = err.downcast_ref::<StoreErrorKind>() {
            if matches!(
                kind,
                StoreErrorKind::NotFoundById(_) | StoreErrorKind::MissingBook(_)
            ) {
                return Failure::NotFound(kind.to_string());
            }
        }

        Failure::Internal
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Failure::Internal)
    }
}
