// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res, opt, recognize},
    sequence::{pair, preceded, separated_pair},
    IResult,
};
use std::fmt::{self, Display};

/// Action attached to an inline button
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Callback {
    Book(i32),
    Review(i32),
    SetRating { book_id: i32, rating: i32 },
    SkipReview,
    Back,
}

impl Callback {
    pub fn parse(input: &str) -> Option<Self> {
        all_consuming(parse_callback)(input.trim())
            .ok()
            .map(|(_, callback)| callback)
    }
}

impl Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Book(id) => write!(f, "book_{}", id),
            Callback::Review(id) => write!(f, "review_{}", id),
            Callback::SetRating { book_id, rating } => write!(f, "setrating_{}_{}", book_id, rating),
            Callback::SkipReview => write!(f, "skip_review"),
            Callback::Back => write!(f, "back"),
        }
    }
}

fn parse_number(input: &str) -> IResult<&str, i32> {
    map_res(recognize(pair(opt(char('-')), digit1)), |number: &str| {
        number.parse::<i32>()
    })(input)
}

fn parse_set_rating(input: &str) -> IResult<&str, Callback> {
    map(
        preceded(
            tag("setrating_"),
            separated_pair(parse_number, char('_'), parse_number),
        ),
        |(book_id, rating)| Callback::SetRating { book_id, rating },
    )(input)
}

fn parse_callback(input: &str) -> IResult<&str, Callback> {
    alt((
        map(preceded(tag("book_"), parse_number), Callback::Book),
        map(preceded(tag("review_"), parse_number), Callback::Review),
        parse_set_rating,
        map(tag("skip_review"), |_| Callback::SkipReview),
        map(tag("back"), |_| Callback::Back),
    ))(input)
}
