// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use prettytable::{cell, format::consts::FORMAT_NO_LINESEP, row, table, Table};
use std::collections::{BTreeMap, HashMap};

pub trait Entity {
    type Id;

    fn get_id(&self) -> Self::Id;
    fn get_data(&self) -> HashMap<String, String> {
        Default::default()
    }
}

pub trait ToTable {
    fn to_table(&self) -> Table;
}

impl<I: ToString, E: Entity<Id = I>> ToTable for E {
    fn to_table(&self) -> Table {
        let mut table = table![["id", self.get_id()]];

        // Sorted, so the same entity always prints the same way
        let data: BTreeMap<_, _> = self.get_data().into_iter().collect();
        for (key, val) in data {
            table.add_row(row![key, val]);
        }

        table.set_format(*FORMAT_NO_LINESEP);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Book;

    #[test]
    fn book_as_table() {
        let book = Book::new(7, "War and Peace", "Leo Tolstoy");
        let rendered = book.to_table().to_string();

        assert!(rendered.contains("War and Peace"));
        assert!(rendered.contains("Leo Tolstoy"));
        assert!(rendered.find("author") < rendered.find("title"));
    }
}
