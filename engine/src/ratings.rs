// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use crate::error::ErrorKind;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Exact mean of `ratings`, `None` when there are no ratings at all
pub fn mean(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }

    let sum: i64 = ratings.iter().map(|&rating| i64::from(rating)).sum();
    Some(sum as f64 / ratings.len() as f64)
}

/// Mean rounded to 2 decimals, for display
pub fn average(ratings: &[i32]) -> Option<f64> {
    mean(ratings).map(|mean| round_to(mean, 2))
}

pub fn parse_rating(raw: &str) -> Result<i64, ErrorKind> {
    raw.trim()
        .parse()
        .map_err(|_| ErrorKind::RatingNotANumber(raw.to_string()))
}

pub fn validate_rating(rating: i64) -> Result<i32, ErrorKind> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating as i32)
    } else {
        Err(ErrorKind::RatingOutOfRange(rating))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Error;
    use assert_approx_eq::*;

    #[test]
    fn average_of_reviews() {
        assert_eq!(average(&[5, 3, 4]), Some(4.0));
        assert_approx_eq!(average(&[5, 4, 4]).unwrap_or_default(), 4.33);
        assert_approx_eq!(average(&[1, 2]).unwrap_or_default(), 1.5);
    }

    #[test]
    fn no_reviews_is_no_average() {
        assert_eq!(average(&[]), None);
    }

    #[test]
    fn parse_user_input() -> Result<(), Error> {
        assert_eq!(parse_rating(" 4 ")?, 4);
        assert!(matches!(
            parse_rating("abc"),
            Err(ErrorKind::RatingNotANumber(_))
        ));
        assert!(matches!(
            parse_rating("3.5"),
            Err(ErrorKind::RatingNotANumber(_))
        ));

        Ok(())
    }

    #[test]
    fn rating_range() {
        for rating in 1..=5 {
            assert_eq!(validate_rating(rating).ok(), Some(rating as i32));
        }

        assert!(matches!(validate_rating(0), Err(ErrorKind::RatingOutOfRange(0))));
        assert!(matches!(validate_rating(6), Err(ErrorKind::RatingOutOfRange(6))));
    }
}
