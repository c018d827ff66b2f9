// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use crate::schema::books;
use controller::Book;

// To query data from the database
#[derive(Debug, Clone, Queryable)]
pub struct BookRow {
    pub id: i32,
    pub title: String,
    pub author: String,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            title: row.title,
            author: row.author,
        }
    }
}

// To insert a new book into the database
#[derive(Debug, Clone, Insertable)]
#[table_name = "books"]
pub struct NewBook<'a> {
    pub id: i32,
    pub title: &'a str,
    pub author: &'a str,
}

impl<'a> From<&'a Book> for NewBook<'a> {
    fn from(book: &'a Book) -> Self {
        NewBook {
            id: book.id,
            title: &book.title,
            author: &book.author,
        }
    }
}
