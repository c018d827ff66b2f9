// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

//! Terminal driver for the chat bot, handy to talk to it without a messenger.

use crate::bot::{Bot, Button, Markup, Reply, Update, UserId};
use crate::html::strip_tags;
use anyhow::Error;
use controller::Controller;

const PROMPT: &str = "you> ";

macro_rules! prompt {
    ($ed:ident) => {{
        use rustyline::error::ReadlineError;

        match $ed.readline(PROMPT) {
            Ok(line) => {
                $ed.add_history_entry(line.as_str());
                Ok(line)
            }

            Err(ReadlineError::Interrupted) => {
                continue;
            }

            Err(ReadlineError::Eof) => {
                println!("Exiting...Good bye!");
                break;
            }

            Err(e) => Err(e),
        }
    }};
}

/// Number pressed after `:`, counting from 1
fn button_index(line: &str) -> Option<usize> {
    let index: usize = line.strip_prefix(':')?.trim().parse().ok()?;
    index.checked_sub(1)
}

fn print_reply(reply: &Reply) {
    let text = if reply.html {
        strip_tags(&reply.text)
    } else {
        reply.text.clone()
    };

    println!("bot> {}", text.trim_end());

    match &reply.markup {
        Markup::Inline(_) => {
            for (i, Button { label, .. }) in reply.buttons().into_iter().enumerate() {
                println!("  [:{}] {}", i + 1, label);
            }
        }

        Markup::Menu(keys) => println!("  menu: {}", keys.join(" | ")),

        Markup::None => {}
    }
}

fn print_help() {
    println!("Chat help:");
    println!(":h | :help      Shows this help");
    println!(":q | :quit      Quit");
    println!(":N              Press the N-th button of the last reply");
    println!("Anything else is sent to the bot, /start opens the menu");
}

pub fn run<C: Controller>(bot: &mut Bot<C>, user: UserId) -> Result<(), Error> {
    let mut rl = rustyline::Editor::<()>::new();
    let mut last = bot.handle(user, Update::message("/start"));
    print_reply(&last);

    loop {
        let line: String = prompt!(rl)?;

        let update = match line.trim() {
            ":h" | ":help" => {
                print_help();
                continue;
            }

            ":q" | ":quit" => {
                println!("Bye!");
                break;
            }

            empty if empty.is_empty() => continue,

            line => match button_index(line) {
                Some(index) => match last.buttons().get(index) {
                    Some(button) => Update::Callback(button.callback.to_string()),
                    None => {
                        println!("There's no button {}", line);
                        continue;
                    }
                },
                None => Update::message(line),
            },
        };

        last = bot.handle(user, update);
        print_reply(&last);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_numbers() {
        assert_eq!(button_index(":1"), Some(0));
        assert_eq!(button_index(": 3"), Some(2));
        assert_eq!(button_index(":0"), None);
        assert_eq!(button_index(":x"), None);
        assert_eq!(button_index("3"), None);
    }
}
