//! Upstream API clients for the command bot.
//!
//! Lookups that users repeat (Steam profiles, Minecraft servers, Wynncraft
//! players, search tokens) go through an [`EntityResolver`], which caches
//! records under a canonical key and remembers every alias the record was
//! reached by. The remaining clients are thin and uncached.

pub mod dictionary;
pub mod duckduckgo;
pub mod error;
mod http;
pub mod minecraft;
pub mod resolver;
pub mod steam;
pub mod trivia;
pub mod wynncraft;
pub mod xkcd;

pub use dictionary::{DictionaryClient, WordEntry};
pub use duckduckgo::{
    ImageColor, ImageLayout, ImageLicense, ImageOptions, ImageResult, ImageSize, ImageType,
    SafeSearch, SearchClient, SearchOptions, SearchResult, TimeRange,
};
pub use error::FetchError;
pub use minecraft::{Edition, MinecraftClient, MinecraftServer};
pub use resolver::{CachePolicy, EntityResolver, EntitySource, Resolved};
pub use steam::{NameChange, SteamClient, SteamProfile};
pub use trivia::{Difficulty, TriviaClient, TriviaQuestion};
pub use wynncraft::{WynnClass, WynnPlayer, WynncraftClient};
pub use xkcd::{Comic, XkcdClient};
