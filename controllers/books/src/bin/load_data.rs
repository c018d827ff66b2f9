// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use anyhow::Error;
use books::BooksController;
use config::Config;
use controller::import::{read_books, read_reviews};
use controller::Controller;
use indicatif::ProgressIterator;
use std::collections::HashMap;

const CHUNK_SIZE: usize = 1_000;

fn insert_books(controller: &BooksController, path: &str) -> Result<usize, Error> {
    println!("Collecting records for books...");
    let books = read_books(path)?;

    println!("Pushing books by chunks");
    let mut inserted = 0;
    for chunk in books.chunks(CHUNK_SIZE).progress() {
        inserted += controller.insert_books(chunk)?;
    }

    Ok(inserted)
}

fn insert_reviews(controller: &BooksController, path: &str) -> Result<usize, Error> {
    println!("Collecting records for reviews...");
    let reviews = read_reviews(path)?;

    println!("Pushing reviews by chunks");
    let mut inserted = 0;
    for chunk in reviews.chunks(CHUNK_SIZE).progress() {
        inserted += controller.insert_reviews(chunk)?;
    }

    Ok(inserted)
}

fn main() -> Result<(), Error> {
    let vars: HashMap<String, String> = dotenv::vars().collect();
    let path = vars
        .get("BOOKSHELF_CONFIG")
        .map(String::as_str)
        .unwrap_or("bookshelf.toml");

    let mut config = Config::load_or_default(path)?;
    config.apply_env(&vars);

    let controller = BooksController::from_config(&config)?;
    controller.create_tables()?;

    println!("Removing previous reviews and books");
    controller.clear()?;

    let books = insert_books(&controller, &config.import.books)?;
    let reviews = insert_reviews(&controller, &config.import.reviews)?;
    println!("Imported {} books and {} reviews", books, reviews);

    Ok(())
}
