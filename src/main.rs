// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

mod bot;
mod chat;
mod html;
mod logging;
mod telegram;
#[cfg(test)]
mod testing;
mod web;

use anyhow::{anyhow, Error};
use books::BooksController;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use config::Config;
use controller::import::{read_books, read_reviews};
use controller::{Controller, ToTable};
use engine::Engine;
use memory::MemoryController;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

const VERSION: &str = env!("CARGO_PKG_VERSION");

type Store = Box<dyn Controller + Send + Sync>;

fn app() -> App<'static, 'static> {
    App::new("bookshelf")
        .version(VERSION)
        .about("Book catalog with reviews, served on the web and through a chat bot")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .takes_value(true)
                .default_value("bookshelf.toml")
                .help("Configuration file, defaults are used if it doesn't exist"),
        )
        .arg(
            Arg::with_name("memory")
                .long("memory")
                .help("Keep everything in memory, seeded from the import files if present"),
        )
        .subcommand(
            SubCommand::with_name("serve")
                .about("Run the web front end")
                .arg(
                    Arg::with_name("bind")
                        .long("bind")
                        .value_name("ADDR")
                        .takes_value(true)
                        .help("Address to listen on, overrides [web].bind"),
                ),
        )
        .subcommand(
            SubCommand::with_name("chat")
                .about("Talk to the chat bot from the terminal")
                .arg(
                    Arg::with_name("user")
                        .long("user")
                        .value_name("ID")
                        .takes_value(true)
                        .default_value("1")
                        .help("User id the bot sees"),
                ),
        )
        .subcommand(SubCommand::with_name("bot").about("Run the chat bot on Telegram"))
        .subcommand(SubCommand::with_name("books").about("Print every book with its average rating"))
        .subcommand(
            SubCommand::with_name("book")
                .about("Print a book with its reviews")
                .arg(Arg::with_name("id").required(true).value_name("ID")),
        )
        .subcommand(SubCommand::with_name("init-db").about("Create the tables if they don't exist"))
}

fn load_config(matches: &ArgMatches) -> Result<Config, Error> {
    let vars: HashMap<String, String> = dotenv::vars().collect();
    let path = matches.value_of("config").unwrap_or("bookshelf.toml");

    let mut config = Config::load_or_default(path)?;
    config.apply_env(&vars);
    Ok(config)
}

fn seeded_memory(config: &Config) -> Result<MemoryController, Error> {
    let controller = MemoryController::new();

    if Path::new(&config.import.books).exists() {
        let books = controller.insert_books(&read_books(&config.import.books)?)?;
        log::info!("Seeded {} books from {}", books, config.import.books);

        if Path::new(&config.import.reviews).exists() {
            let reviews = controller.insert_reviews(&read_reviews(&config.import.reviews)?)?;
            log::info!("Seeded {} reviews from {}", reviews, config.import.reviews);
        }
    } else {
        log::warn!("No {} to seed from, starting empty", config.import.books);
    }

    Ok(controller)
}

fn open_store(config: &Config, in_memory: bool) -> Result<Store, Error> {
    if in_memory {
        Ok(Box::new(seeded_memory(config)?))
    } else {
        Ok(Box::new(BooksController::from_config(config)?))
    }
}

fn parse_id<T: std::str::FromStr>(raw: Option<&str>, what: &str) -> Result<T, Error> {
    let raw = raw.ok_or_else(|| anyhow!("Missing {}", what))?;
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("Invalid {} '{}'", what, raw))
}

fn runtime() -> Result<tokio::runtime::Runtime, Error> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn serve(engine: Engine<Store>, bind: &str) -> Result<(), Error> {
    runtime()?.block_on(web::serve(Arc::new(engine), bind))
}

fn run_bot(engine: Engine<Store>, config: &Config) -> Result<(), Error> {
    let bot = bot::Bot::new(Arc::new(engine));
    runtime()?.block_on(telegram::run(bot, &config.bot))
}

fn print_books(engine: &Engine<Store>) -> Result<(), Error> {
    let books = engine.books_with_average()?;
    if books.is_empty() {
        println!("No books found");
    }

    for book in books {
        println!("{}", book.to_table());
    }

    Ok(())
}

fn print_book(engine: &Engine<Store>, id: i32) -> Result<(), Error> {
    let detail = match engine.book_detail(id) {
        Ok(detail) => detail,
        Err(e) => match engine::Failure::of(&e) {
            engine::Failure::NotFound(_) => {
                println!("No book with id({})", id);
                return Ok(());
            }
            _ => return Err(e),
        },
    };

    println!("{}", detail.book.to_table());
    match detail.average {
        Some(average) => println!("Average rating: {:.2}", average),
        None => println!("No ratings yet"),
    }

    for review in detail.reviews {
        println!("{}", review.to_table());
    }

    Ok(())
}

fn main() -> Result<(), Error> {
    let matches = app().get_matches();
    let config = load_config(&matches)?;
    let in_memory = matches.is_present("memory");

    // The chat prompt owns the terminal, log to the file only
    let console = matches.subcommand_name() != Some("chat");
    logging::init(&config.log, console)?;

    if matches.subcommand_name() == Some("init-db") {
        if in_memory {
            println!("Nothing to create for an in-memory catalog");
            return Ok(());
        }

        BooksController::from_config(&config)?.create_tables()?;
        println!("Tables are ready");
        return Ok(());
    }

    let engine = Engine::with_config(open_store(&config, in_memory)?, &config.catalog);

    match matches.subcommand() {
        ("serve", Some(args)) => {
            let bind = args.value_of("bind").unwrap_or(&config.web.bind);
            serve(engine, bind)
        }

        ("chat", Some(args)) => {
            let user = parse_id(args.value_of("user"), "user id")?;
            println!("Welcome to bookshelf {}, :h for help", VERSION);

            let mut bot = bot::Bot::new(Arc::new(engine));
            chat::run(&mut bot, user)
        }

        ("bot", _) => run_bot(engine, &config),

        ("books", _) => print_books(&engine),

        ("book", Some(args)) => {
            let id = parse_id(args.value_of("id"), "book id")?;
            print_book(&engine, id)
        }

        (other, _) => Err(anyhow!("Unknown command '{}'", other)),
    }
}
