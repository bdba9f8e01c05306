//! Discord side of the Sobasa bot: the gateway connection, a cache of the
//! guilds the bot is in, and REST message delivery.

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod model;
pub mod rest;

pub use cache::{GuildCache, OccupancyChange};
pub use config::DiscordConfig;
pub use dispatch::DiscordEvent;
pub use error::DiscordError;
pub use gateway::{run_gateway, GatewayCommand, GatewayHandle};
pub use rest::RestClient;
