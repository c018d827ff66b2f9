// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

//! Chat front end.
//!
//! Turns user updates (commands, free text, button presses) into replies, it
//! knows nothing about the transport carrying them.

pub mod callback;
pub mod reply;
pub mod state;

pub use callback::Callback;
pub use reply::{Button, Markup, Reply};
pub use state::Conversation;

use crate::html::escape;
use anyhow::Error;
use controller::{Book, Controller};
use engine::{validate_rating, BookDetail, Engine, Failure, RatedBook};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

pub const SEARCH_KEY: &str = "🔍 Search book";
pub const TOP_KEY: &str = "⭐ Top 10 books";
pub const RANDOM_KEY: &str = "🎲 Random book";

const NOT_FOUND: &str = "Book not found 😔";
const NO_BOOKS: &str = "There are no books yet 😔";
const INTERNAL: &str = "Something went wrong, please try again later.";

pub type UserId = i64;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Command {
    Start,
    Top,
    Random,
    Search,
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "/top@some_bot" is how group chats address a command
        let name = s.trim().split('@').next().unwrap_or_default();

        match name {
            "/start" => Ok(Command::Start),
            "/top" => Ok(Command::Top),
            "/random" => Ok(Command::Random),
            "/search" => Ok(Command::Search),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Update {
    Command(Command),
    Text(String),
    Callback(String),
}

impl Update {
    /// A typed message, either a known command or plain text
    pub fn message(text: &str) -> Self {
        match text.parse() {
            Ok(command) => Update::Command(command),
            Err(_) => Update::Text(text.to_string()),
        }
    }
}

pub fn render_stars(rating: i32) -> String {
    let filled = rating.max(0).min(5) as usize;
    format!("{}{}", "⭐".repeat(filled), "☆".repeat(5 - filled))
}

fn short_average(average: Option<f64>) -> String {
    match average {
        Some(average) => format!("{:.1}", average),
        None => "—".into(),
    }
}

fn rating_keyboard(book_id: i32) -> Vec<Vec<Button>> {
    let row = (1..=5)
        .map(|rating| {
            Button::new(
                format!("⭐{}", rating),
                Callback::SetRating { book_id, rating },
            )
        })
        .collect();

    vec![row]
}

fn review_added(book_id: i32) -> Reply {
    Reply::text("✅ Review added!").with_buttons(vec![
        vec![Button::new("⬅ Back to the book", Callback::Book(book_id))],
        vec![Button::new("🏠 Main menu", Callback::Back)],
    ])
}

pub struct Bot<C> {
    engine: Arc<Engine<C>>,
    conversations: HashMap<UserId, Conversation>,
}

impl<C: Controller> Bot<C> {
    pub fn new(engine: Arc<Engine<C>>) -> Self {
        Self {
            engine,
            conversations: HashMap::new(),
        }
    }

    pub fn conversation(&self, user: UserId) -> Conversation {
        self.conversations.get(&user).copied().unwrap_or_default()
    }

    fn set_conversation(&mut self, user: UserId, conversation: Conversation) {
        if conversation == Conversation::Idle {
            self.conversations.remove(&user);
        } else {
            self.conversations.insert(user, conversation);
        }
    }

    pub fn handle(&mut self, user: UserId, update: Update) -> Reply {
        match update {
            Update::Command(command) => self.command(user, command),
            Update::Text(text) => self.text(user, text.trim()),
            Update::Callback(data) => match Callback::parse(&data) {
                Some(callback) => self.callback(user, callback),
                None => {
                    log::warn!("User {} sent an unknown callback '{}'", user, data);
                    Reply::text("Unknown action, use /start to see the menu.")
                }
            },
        }
    }

    fn command(&mut self, user: UserId, command: Command) -> Reply {
        match command {
            Command::Start => self.start(user),
            Command::Search => self.start_search(user),
            Command::Top => {
                self.set_conversation(user, Conversation::Idle);
                self.top(user)
            }
            Command::Random => {
                self.set_conversation(user, Conversation::Idle);
                self.random(user)
            }
        }
    }

    fn text(&mut self, user: UserId, text: &str) -> Reply {
        match self.conversation(user) {
            Conversation::AwaitingText { book_id, rating } => {
                self.set_conversation(user, Conversation::Idle);
                self.save_review(user, book_id, rating, Some(text.to_string()))
            }

            conversation => match text {
                SEARCH_KEY => self.start_search(user),
                TOP_KEY => self.command(user, Command::Top),
                RANDOM_KEY => self.command(user, Command::Random),
                query if conversation == Conversation::Searching => self.search(user, query),
                rating => match conversation {
                    Conversation::AwaitingRating { book_id } => {
                        self.typed_rating(user, book_id, rating)
                    }
                    _ => Reply::text("I didn't get that 🤔. Pick an action.")
                        .with_menu(&[SEARCH_KEY, TOP_KEY, RANDOM_KEY]),
                },
            },
        }
    }

    fn callback(&mut self, user: UserId, callback: Callback) -> Reply {
        match callback {
            Callback::Book(book_id) => {
                self.set_conversation(user, Conversation::Idle);
                self.book_card(user, book_id)
            }

            Callback::Review(book_id) => {
                self.set_conversation(user, Conversation::AwaitingRating { book_id });
                log::info!("User {} started a review for book({})", user, book_id);
                Reply::text("Rate the book:").with_buttons(rating_keyboard(book_id))
            }

            Callback::SetRating { book_id, rating } => self.choose_rating(user, book_id, rating),

            Callback::SkipReview => match self.conversation(user) {
                Conversation::AwaitingText { book_id, rating } => {
                    self.set_conversation(user, Conversation::Idle);
                    self.save_review(user, book_id, rating, None)
                }
                _ => Reply::text("There's no review in progress."),
            },

            Callback::Back => self.start(user),
        }
    }

    fn start(&mut self, user: UserId) -> Reply {
        if let Some(book_id) = self.conversation(user).review_in_progress() {
            log::debug!("User {} dropped the review for book({})", user, book_id);
        }

        self.set_conversation(user, Conversation::Idle);
        log::info!("User {} opened the main menu", user);

        Reply::text("📚 Hi! I'm the book bot.\nPick an action.")
            .with_menu(&[SEARCH_KEY, TOP_KEY, RANDOM_KEY])
    }

    fn start_search(&mut self, user: UserId) -> Reply {
        self.set_conversation(user, Conversation::Searching);
        log::info!("User {} switched to search mode", user);

        Reply::text("Enter a title or an author:")
    }

    fn choose_rating(&mut self, user: UserId, book_id: i32, rating: i32) -> Reply {
        match validate_rating(i64::from(rating)) {
            Ok(rating) => {
                self.set_conversation(user, Conversation::AwaitingText { book_id, rating });
                log::info!("User {} rated book({}) with {}", user, book_id, rating);

                Reply::text("Now write your review or press 'Skip review':").with_buttons(vec![
                    vec![Button::new("Skip review", Callback::SkipReview)],
                ])
            }
            Err(_) => self.rating_prompt(user, book_id),
        }
    }

    fn typed_rating(&mut self, user: UserId, book_id: i32, raw: &str) -> Reply {
        match engine::parse_rating(raw) {
            Ok(rating) if rating >= i64::from(i32::MIN) && rating <= i64::from(i32::MAX) => {
                self.choose_rating(user, book_id, rating as i32)
            }
            _ => self.rating_prompt(user, book_id),
        }
    }

    fn rating_prompt(&mut self, user: UserId, book_id: i32) -> Reply {
        self.set_conversation(user, Conversation::AwaitingRating { book_id });
        Reply::text("Please pick a rating from 1 to 5:").with_buttons(rating_keyboard(book_id))
    }

    fn save_review(
        &mut self,
        user: UserId,
        book_id: i32,
        rating: i32,
        review_text: Option<String>,
    ) -> Reply {
        match self
            .engine
            .add_review(book_id, i64::from(rating), review_text.clone())
        {
            Ok(_) => {
                let preview: String = review_text
                    .as_deref()
                    .unwrap_or_default()
                    .chars()
                    .take(50)
                    .collect();
                log::info!(
                    "User {} reviewed book({}) with {}: '{}'",
                    user,
                    book_id,
                    rating,
                    preview
                );

                review_added(book_id)
            }
            Err(e) => match Failure::of(&e) {
                Failure::Validation(_) => self.rating_prompt(user, book_id),
                _ => self.failure(user, e),
            },
        }
    }

    fn search(&mut self, user: UserId, query: &str) -> Reply {
        match self.engine.search(query) {
            Ok(books) => {
                log::info!("User {} searched '{}', {} results", user, query, books.len());

                if books.is_empty() {
                    return Reply::text("Nothing found 😔");
                }

                let rows = books
                    .iter()
                    .map(|book| {
                        vec![Button::new(
                            format!("{} — {}", book.title, book.author),
                            Callback::Book(book.id),
                        )]
                    })
                    .collect();

                Reply::text("📚 Found:").with_buttons(rows)
            }
            Err(e) => self.failure(user, e),
        }
    }

    fn top(&mut self, user: UserId) -> Reply {
        let n = self.engine.catalog().top_n;
        match self.engine.top(n) {
            Ok(books) if books.is_empty() => Reply::text(NO_BOOKS),
            Ok(books) => {
                log::info!("User {} asked for the top {}", user, n);
                Reply::html(format!("🏆 <b>Top {} books:</b>", n)).with_buttons(top_rows(&books))
            }
            Err(e) => self.failure(user, e),
        }
    }

    fn random(&mut self, user: UserId) -> Reply {
        match self.engine.random_book() {
            Ok(book) => {
                log::info!("User {} asked for a random book, got book({})", user, book.id);
                self.book_card(user, book.id)
            }
            Err(e) => match Failure::of(&e) {
                Failure::NotFound(_) => Reply::text(NO_BOOKS),
                _ => self.failure(user, e),
            },
        }
    }

    fn book_card(&mut self, user: UserId, book_id: i32) -> Reply {
        match self.engine.book_detail(book_id) {
            Ok(detail) => {
                log::info!("User {} opened book({})", user, book_id);
                let latest = self.engine.catalog().latest_reviews;

                Reply::html(card_text(&detail, latest)).with_buttons(vec![vec![Button::new(
                    "✍️ Leave a review",
                    Callback::Review(detail.book.id),
                )]])
            }
            Err(e) => self.failure(user, e),
        }
    }

    fn failure(&mut self, user: UserId, e: Error) -> Reply {
        self.set_conversation(user, Conversation::Idle);

        match Failure::of(&e) {
            Failure::NotFound(_) => Reply::text(NOT_FOUND),
            Failure::Validation(message) => Reply::text(message),
            Failure::Internal => {
                log::error!("Failed to answer user {}: {:?}", user, e);
                Reply::text(INTERNAL)
            }
        }
    }
}

fn top_rows(books: &[RatedBook]) -> Vec<Vec<Button>> {
    books
        .iter()
        .enumerate()
        .map(|(i, rated)| {
            let Book { id, title, author } = &rated.book;
            vec![Button::new(
                format!(
                    "{}. {} — {} ⭐{}",
                    i + 1,
                    title,
                    author,
                    short_average(rated.average)
                ),
                Callback::Book(*id),
            )]
        })
        .collect()
}

fn card_text(detail: &BookDetail, latest: usize) -> String {
    let mut text = format!(
        "📖 <b>{}</b>\nAuthor: {}\nRating: ⭐{}\n\n💬 <b>Latest reviews:</b>\n\n",
        escape(&detail.book.title),
        escape(&detail.book.author),
        short_average(detail.average)
    );

    for review in detail.reviews.iter().take(latest) {
        text.push_str(&format!(
            "{} {}\n{}\n\n",
            review.created_at.format("%Y-%m-%d"),
            render_stars(review.rating),
            escape(review.review_text.as_deref().unwrap_or_default())
        ));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use controller::Review;
    use memory::MemoryController;

    const USER: UserId = 42;

    fn bot() -> Result<Bot<MemoryController>, Error> {
        let books = vec![
            Book::new(1, "Anna Karenina", "Leo Tolstoy"),
            Book::new(2, "War and Peace", "Leo Tolstoy"),
            Book::new(3, "Dead Souls", "Nikolai Gogol"),
        ];

        let reviews: Vec<_> = (1..=4)
            .map(|id| Review {
                id,
                book_id: 1,
                rating: id,
                review_text: Some(format!("take {}", id)),
                created_at: Utc.with_ymd_and_hms(2024, 1, id as u32, 8, 0, 0).unwrap(),
            })
            .collect();

        let controller = MemoryController::with_data(&books, &reviews)?;
        Ok(Bot::new(Arc::new(Engine::with_controller(controller))))
    }

    fn press(bot: &mut Bot<MemoryController>, callback: Callback) -> Reply {
        bot.handle(USER, Update::Callback(callback.to_string()))
    }

    fn say(bot: &mut Bot<MemoryController>, text: &str) -> Reply {
        bot.handle(USER, Update::message(text))
    }

    fn reviews(bot: &Bot<MemoryController>, book_id: i32) -> Result<Vec<Review>, Error> {
        bot.engine.controller().reviews_for(book_id)
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Update::message("/top"), Update::Command(Command::Top));
        assert_eq!(
            Update::message("/search@books_bot"),
            Update::Command(Command::Search)
        );
        assert_eq!(Update::message("/nope"), Update::Text("/nope".into()));
    }

    #[test]
    fn start_shows_menu() -> Result<(), Error> {
        let mut bot = bot()?;
        let reply = say(&mut bot, "/start");

        assert_eq!(
            reply.markup,
            Markup::Menu(vec![SEARCH_KEY.into(), TOP_KEY.into(), RANDOM_KEY.into()])
        );
        assert_eq!(bot.conversation(USER), Conversation::Idle);

        Ok(())
    }

    #[test]
    fn search_mode() -> Result<(), Error> {
        let mut bot = bot()?;
        say(&mut bot, SEARCH_KEY);
        assert_eq!(bot.conversation(USER), Conversation::Searching);

        let reply = say(&mut bot, "tolstoy");
        let targets: Vec<_> = reply.buttons().iter().map(|b| b.callback).collect();
        assert_eq!(targets, vec![Callback::Book(1), Callback::Book(2)]);
        assert_eq!(reply.buttons()[0].label, "Anna Karenina — Leo Tolstoy");

        // Stays in search mode until something else is picked
        assert_eq!(say(&mut bot, "pushkin").text, "Nothing found 😔");
        assert_eq!(bot.conversation(USER), Conversation::Searching);

        Ok(())
    }

    #[test]
    fn text_outside_any_mode() -> Result<(), Error> {
        let mut bot = bot()?;
        let reply = say(&mut bot, "tolstoy");

        assert!(reply.text.starts_with("I didn't get that"));
        assert!(reply.buttons().is_empty());

        Ok(())
    }

    #[test]
    fn top_list() -> Result<(), Error> {
        let mut bot = bot()?;
        let reply = say(&mut bot, "/top");

        assert!(reply.html);
        let labels: Vec<_> = reply.buttons().iter().map(|b| b.label.clone()).collect();
        assert_eq!(
            labels,
            vec![
                "1. Anna Karenina — Leo Tolstoy ⭐2.5",
                "2. War and Peace — Leo Tolstoy ⭐—",
                "3. Dead Souls — Nikolai Gogol ⭐—",
            ]
        );

        Ok(())
    }

    #[test]
    fn book_card_shows_latest_reviews() -> Result<(), Error> {
        let mut bot = bot()?;
        let reply = press(&mut bot, Callback::Book(1));

        assert!(reply.text.contains("<b>Anna Karenina</b>"));
        assert!(reply.text.contains("2024-01-04 ⭐⭐⭐⭐☆\ntake 4"));
        assert!(reply.text.contains("take 2"));
        assert!(!reply.text.contains("take 1"));
        assert_eq!(reply.buttons()[0].callback, Callback::Review(1));

        Ok(())
    }

    #[test]
    fn missing_book_card() -> Result<(), Error> {
        let mut bot = bot()?;
        assert_eq!(press(&mut bot, Callback::Book(9)).text, NOT_FOUND);

        Ok(())
    }

    #[test]
    fn review_with_text() -> Result<(), Error> {
        let mut bot = bot()?;

        press(&mut bot, Callback::Review(3));
        assert_eq!(
            bot.conversation(USER),
            Conversation::AwaitingRating { book_id: 3 }
        );

        press(&mut bot, Callback::SetRating { book_id: 3, rating: 5 });
        assert_eq!(
            bot.conversation(USER),
            Conversation::AwaitingText {
                book_id: 3,
                rating: 5
            }
        );

        // Menu labels are review text at this point
        let reply = say(&mut bot, TOP_KEY);
        assert_eq!(reply.text, "✅ Review added!");
        assert_eq!(bot.conversation(USER), Conversation::Idle);

        let stored = reviews(&bot, 3)?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].rating, 5);
        assert_eq!(stored[0].review_text.as_deref(), Some(TOP_KEY));

        Ok(())
    }

    #[test]
    fn review_skipping_text() -> Result<(), Error> {
        let mut bot = bot()?;

        press(&mut bot, Callback::Review(2));
        press(&mut bot, Callback::SetRating { book_id: 2, rating: 3 });
        let reply = press(&mut bot, Callback::SkipReview);

        assert_eq!(reply.text, "✅ Review added!");
        assert_eq!(reviews(&bot, 2)?[0].review_text, None);

        Ok(())
    }

    #[test]
    fn skip_without_review() -> Result<(), Error> {
        let mut bot = bot()?;
        let reply = press(&mut bot, Callback::SkipReview);

        assert_eq!(reply.text, "There's no review in progress.");
        assert!(reviews(&bot, 2)?.is_empty());

        Ok(())
    }

    #[test]
    fn invalid_rating_prompts_again() -> Result<(), Error> {
        let mut bot = bot()?;

        press(&mut bot, Callback::Review(3));
        let reply = press(&mut bot, Callback::SetRating { book_id: 3, rating: 9 });
        assert_eq!(reply.buttons().len(), 5);
        assert_eq!(
            bot.conversation(USER),
            Conversation::AwaitingRating { book_id: 3 }
        );

        say(&mut bot, "abc");
        say(&mut bot, "0");
        assert_eq!(
            bot.conversation(USER),
            Conversation::AwaitingRating { book_id: 3 }
        );

        // A typed rating works too
        say(&mut bot, "4");
        assert_eq!(
            bot.conversation(USER),
            Conversation::AwaitingText {
                book_id: 3,
                rating: 4
            }
        );

        Ok(())
    }

    #[test]
    fn review_for_deleted_book() -> Result<(), Error> {
        let mut bot = bot()?;

        press(&mut bot, Callback::Review(3));
        press(&mut bot, Callback::SetRating { book_id: 3, rating: 4 });
        bot.engine.controller().delete_book(3)?;

        assert_eq!(press(&mut bot, Callback::SkipReview).text, NOT_FOUND);
        assert_eq!(bot.conversation(USER), Conversation::Idle);

        Ok(())
    }

    #[test]
    fn users_are_independent() -> Result<(), Error> {
        let mut bot = bot()?;

        say(&mut bot, "/search");
        bot.handle(7, Update::Callback("review_1".into()));

        assert_eq!(bot.conversation(USER), Conversation::Searching);
        assert_eq!(bot.conversation(7), Conversation::AwaitingRating { book_id: 1 });

        Ok(())
    }

    #[test]
    fn random_from_empty_catalog() {
        let mut bot = Bot::new(Arc::new(Engine::with_controller(MemoryController::new())));

        assert_eq!(bot.handle(USER, Update::Command(Command::Random)).text, NO_BOOKS);
        assert_eq!(bot.handle(USER, Update::Command(Command::Top)).text, NO_BOOKS);
    }

    #[test]
    fn unknown_callback() -> Result<(), Error> {
        let mut bot = bot()?;
        let reply = bot.handle(USER, Update::Callback("launch_rockets".into()));

        assert!(reply.text.starts_with("Unknown action"));

        Ok(())
    }

    #[test]
    fn storage_failures_stay_opaque() -> Result<(), Error> {
        use crate::testing::{Unreachable, SECRET};

        let mut bot = Bot::new(Arc::new(Engine::with_controller(Unreachable)));

        bot.handle(USER, Update::Callback("review_1".into()));
        bot.handle(USER, Update::Callback("setrating_1_4".into()));
        assert_eq!(
            bot.conversation(USER),
            Conversation::AwaitingText {
                book_id: 1,
                rating: 4
            }
        );

        let reply = bot.handle(USER, Update::message("Loved it"));
        assert_eq!(reply.text, INTERNAL);
        assert_eq!(bot.conversation(USER), Conversation::Idle);

        bot.handle(USER, Update::message(SEARCH_KEY));
        for update in vec![
            Update::message("tolstoy"),
            Update::Command(Command::Top),
            Update::Command(Command::Random),
            Update::Callback("book_1".into()),
        ] {
            let reply = bot.handle(USER, update);
            assert_eq!(reply.text, INTERNAL);
            assert!(!reply.text.contains(SECRET));
            assert_eq!(bot.conversation(USER), Conversation::Idle);
        }

        Ok(())
    }

    #[test]
    fn stars() {
        assert_eq!(render_stars(3), "⭐⭐⭐☆☆");
        assert_eq!(render_stars(5), "⭐⭐⭐⭐⭐");
    }
}
