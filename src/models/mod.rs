//! Data models
//!
//! Database row types and request structures.

pub mod member;
pub mod broadcast;
pub mod client_bot;

pub use member::{Member, TrackMemberRequest};
pub use broadcast::{
    BroadcastScope, BroadcastRecord, CreateBroadcastRecord, BroadcastOutcome, BroadcastStats,
    PendingBroadcast,
};
pub use client_bot::{
    ClientBot, RegisterBotRequest, ClientBotStats, ClientBotUser, TrackClientUserRequest,
};
