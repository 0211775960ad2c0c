//! Database repositories
//!
//! One repository per table.

pub mod member;
pub mod broadcast;
pub mod client_bot;
pub mod client_user;

pub use member::MemberRepository;
pub use broadcast::BroadcastRepository;
pub use client_bot::ClientBotRepository;
pub use client_user::ClientUserRepository;
