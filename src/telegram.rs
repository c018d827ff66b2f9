// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

//! Telegram transport for the chat bot, long polling the Bot API.

use crate::bot::{Bot, Markup, Reply, Update, UserId};
use anyhow::{anyhow, Error};
use config::BotConfig;
use controller::Controller;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::time::Duration;

const RETRY_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

/// An update the bot understands, with where its answer goes
#[derive(Debug, Clone, PartialEq)]
pub struct Incoming {
    pub chat_id: i64,
    pub user: UserId,
    pub update: Update,
    /// Button presses must be acknowledged
    pub callback_id: Option<String>,
}

/// `None` for anything that's neither a text message nor a button press
pub fn incoming(update: TgUpdate) -> Option<Incoming> {
    if let Some(query) = update.callback_query {
        let chat_id = query
            .message
            .as_ref()
            .map(|message| message.chat.id)
            .unwrap_or(query.from.id);

        return Some(Incoming {
            chat_id,
            user: query.from.id,
            update: Update::Callback(query.data.unwrap_or_default()),
            callback_id: Some(query.id),
        });
    }

    let message = update.message?;
    let text = message.text?;
    let user = message.from.map(|from| from.id).unwrap_or(message.chat.id);

    Some(Incoming {
        chat_id: message.chat.id,
        user,
        update: Update::message(&text),
        callback_id: None,
    })
}

pub fn reply_markup(markup: &Markup) -> Option<Value> {
    match markup {
        Markup::None => None,

        Markup::Inline(rows) => {
            let keyboard: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| {
                            json!({
                                "text": button.label,
                                "callback_data": button.callback.to_string(),
                            })
                        })
                        .collect()
                })
                .collect();

            Some(json!({ "inline_keyboard": keyboard }))
        }

        Markup::Menu(keys) => {
            let keyboard: Vec<Vec<Value>> = keys
                .iter()
                .map(|key| vec![json!({ "text": key })])
                .collect();

            Some(json!({ "keyboard": keyboard, "resize_keyboard": true }))
        }
    }
}

/// Body of a sendMessage call carrying `reply`
pub fn send_message(chat_id: i64, reply: &Reply) -> Value {
    let mut body = json!({ "chat_id": chat_id, "text": reply.text });

    if reply.html {
        body["parse_mode"] = json!("HTML");
    }

    if let Some(markup) = reply_markup(&reply.markup) {
        body["reply_markup"] = markup;
    }

    body
}

pub struct Telegram {
    client: reqwest::Client,
    base: String,
    poll_timeout: u64,
}

impl Telegram {
    pub fn new(config: &BotConfig) -> Result<Self, Error> {
        if config.token.is_empty() {
            return Err(anyhow!("No bot token, set [bot].token or BOT_TOKEN"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout + 10))
            .build()?;

        Ok(Self {
            client,
            base: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.token
            ),
            poll_timeout: config.poll_timeout,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, Error> {
        // The url holds the token, keep it out of errors and logs
        let response: ApiResponse<T> = self
            .client
            .post(format!("{}/{}", self.base, method))
            .json(body)
            .send()
            .await
            .map_err(|e| anyhow!("{} failed: {}", method, e.without_url()))?
            .json()
            .await
            .map_err(|e| anyhow!("{} answered garbage: {}", method, e.without_url()))?;

        match response {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(anyhow!(
                "{} was rejected: {}",
                method,
                description.unwrap_or_default()
            )),
        }
    }

    pub async fn updates(&self, offset: i64) -> Result<Vec<TgUpdate>, Error> {
        let body = json!({
            "offset": offset,
            "timeout": self.poll_timeout,
            "allowed_updates": ["message", "callback_query"],
        });

        self.call("getUpdates", &body).await
    }

    pub async fn send(&self, chat_id: i64, reply: &Reply) -> Result<(), Error> {
        let _: Value = self.call("sendMessage", &send_message(chat_id, reply)).await?;
        Ok(())
    }

    pub async fn answer_callback(&self, id: &str) -> Result<(), Error> {
        let body = json!({ "callback_query_id": id });
        let _: Value = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }
}

/// Poll for updates and answer them until ctrl-c, needs a multi-thread runtime
pub async fn run<C: Controller>(mut bot: Bot<C>, config: &BotConfig) -> Result<(), Error> {
    let telegram = Telegram::new(config)?;
    let mut offset = 0;
    log::info!("Polling Telegram for updates");

    loop {
        let updates = tokio::select! {
            updates = telegram.updates(offset) => updates,
            _ = tokio::signal::ctrl_c() => {
                log::info!("Bot stopped");
                return Ok(());
            }
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                log::error!("Couldn't get updates: {}", e);
                tokio::time::sleep(RETRY_AFTER).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Incoming {
                chat_id,
                user,
                update,
                callback_id,
            } = match incoming(update) {
                Some(incoming) => incoming,
                None => continue,
            };

            if let Some(id) = callback_id {
                if let Err(e) = telegram.answer_callback(&id).await {
                    log::warn!("Couldn't acknowledge a button press: {}", e);
                }
            }

            // Storage calls block
            let reply = tokio::task::block_in_place(|| bot.handle(user, update));
            if let Err(e) = telegram.send(chat_id, &reply).await {
                log::error!("Couldn't answer chat {}: {}", chat_id, e);
            }
        }
    }
}
