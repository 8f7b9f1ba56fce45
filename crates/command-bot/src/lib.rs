//! Discord utility command bot.
//!
//! Discord delivers every slash command and button press to one HTTP
//! endpoint. Commands are acknowledged right away and answered in the
//! background by editing the deferred response. Lookups go through the
//! cached resolvers in `api-clients`; interactive replies are driven by the
//! sessions in `interactive`.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod throttle;

pub use config::Config;
pub use error::{AppError, AppResult};
