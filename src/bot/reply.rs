// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use super::callback::Callback;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Button {
    pub label: String,
    pub callback: Callback,
}

impl Button {
    pub fn new(label: impl Into<String>, callback: Callback) -> Self {
        Self {
            label: label.into(),
            callback,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Markup {
    None,
    /// Buttons under the message, rows of them
    Inline(Vec<Vec<Button>>),
    /// Persistent keyboard, pressing a key sends its label as text
    Menu(Vec<String>),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Reply {
    pub text: String,
    pub html: bool,
    pub markup: Markup,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: false,
            markup: Markup::None,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            html: true,
            ..Self::text(text)
        }
    }

    pub fn with_buttons(mut self, rows: Vec<Vec<Button>>) -> Self {
        self.markup = Markup::Inline(rows);
        self
    }

    pub fn with_menu(mut self, keys: &[&str]) -> Self {
        self.markup = Markup::Menu(keys.iter().map(|key| key.to_string()).collect());
        self
    }

    /// Inline buttons, row by row
    pub fn buttons(&self) -> Vec<&Button> {
        match &self.markup {
            Markup::Inline(rows) => rows.iter().flatten().collect(),
            _ => Vec::new(),
        }
    }
}
