//! Bot handlers module
//!
//! Telegram update handlers organized by type:
//! - Command handlers for master bot commands
//! - Callback handlers for inline keyboard interactions
//! - Message handlers for plain text messages
//! - Client handlers reused by every spawned client bot dispatcher

pub mod commands;
pub mod callbacks;
pub mod messages;
pub mod client;

pub use commands::{Command, handle_command};
pub use callbacks::handle_callback_query;
pub use messages::handle_message;
