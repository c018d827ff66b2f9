// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use anyhow::Error;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://postgres:@localhost/bookshelf".into(),
            pool_size: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WebConfig {
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Max number of books returned by a search
    pub search_limit: usize,
    /// Size of the ranking shown by "top"
    pub top_n: usize,
    /// Reviews shown on a chat book card
    pub latest_reviews: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            search_limit: 10,
            top_n: 10,
            latest_reviews: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: String,
    /// Size at which the log file is rotated
    pub max_bytes: usize,
    /// Rotated files kept around
    pub backups: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: "bookshelf.log".into(),
            max_bytes: 5 * 1024 * 1024,
            backups: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    pub token: String,
    pub api_url: String,
    /// Long polling timeout for getUpdates, in seconds
    pub poll_timeout: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: "https://api.telegram.org".into(),
            poll_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    pub books: String,
    pub reviews: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            books: "data/books.csv".into(),
            reviews: "data/reviews.csv".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub catalog: CatalogConfig,
    pub log: LogConfig,
    pub import: ImportConfig,
    pub bot: BotConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let parsed: Self = toml::from_str(&contents)?;
        Ok(parsed)
    }

    /// Like `load`, but a missing file just yields the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Error> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Override file values with the ones found in the environment (or `.env`)
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) {
        if let Some(url) = vars.get("DATABASE_URL") {
            self.database.url = url.clone();
        }

        if let Some(bind) = vars.get("BIND_ADDR") {
            self.web.bind = bind.clone();
        }

        if let Some(level) = vars.get("LOG_LEVEL") {
            self.log.level = level.clone();
        }

        if let Some(token) = vars.get("BOT_TOKEN") {
            self.bot.token = token.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Error;
    use common_macros::hash_map;

    #[test]
    fn load_example_config() -> Result<(), Error> {
        let expected = Config {
            database: DatabaseConfig {
                url: "postgres://postgres:@localhost/bookshelf".into(),
                pool_size: 4,
            },
            web: WebConfig {
                bind: "127.0.0.1:8080".into(),
            },
            catalog: CatalogConfig {
                search_limit: 10,
                top_n: 10,
                latest_reviews: 3,
            },
            log: LogConfig {
                level: "debug".into(),
                file: "bookshelf.log".into(),
                max_bytes: 1_048_576,
                backups: 3,
            },
            import: ImportConfig {
                books: "data/books.csv".into(),
                reviews: "data/reviews.csv".into(),
            },
            bot: BotConfig {
                token: String::new(),
                api_url: "https://api.telegram.org".into(),
                poll_timeout: 20,
            },
        };

        let loaded = Config::load("example.toml")?;
        assert_eq!(expected, loaded);

        Ok(())
    }

    #[test]
    fn partial_config_keeps_defaults() -> Result<(), Error> {
        let parsed: Config = toml::from_str("[catalog]\nsearch_limit = 5\n")?;

        assert_eq!(parsed.catalog.search_limit, 5);
        assert_eq!(parsed.catalog.top_n, 10);
        assert_eq!(parsed.web, WebConfig::default());

        Ok(())
    }

    #[test]
    fn missing_file_is_default() -> Result<(), Error> {
        let loaded = Config::load_or_default("does-not-exist.toml")?;
        assert_eq!(loaded, Config::default());

        Ok(())
    }

    #[test]
    fn env_overrides_file() {
        let mut config = Config::default();
        let vars: HashMap<String, String> = hash_map! {
            "DATABASE_URL".into() => "postgres://reader:@db/catalog".into(),
            "LOG_LEVEL".into() => "warn".into(),
            "BOT_TOKEN".into() => "123:abc".into(),
        };

        config.apply_env(&vars);

        assert_eq!(config.database.url, "postgres://reader:@db/catalog");
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.bot.token, "123:abc");
        assert_eq!(config.web, WebConfig::default());
    }
}
