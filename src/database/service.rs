//! Database service layer
//!
//! This module provides a high-level interface to database operations

use crate::database::connection::DatabasePool;
use crate::database::repositories::{
    BroadcastRepository, ClientBotRepository, ClientUserRepository, MemberRepository,
};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub members: MemberRepository,
    pub broadcasts: BroadcastRepository,
    pub client_bots: ClientBotRepository,
    pub client_users: ClientUserRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            members: MemberRepository::new(pool.clone()),
            broadcasts: BroadcastRepository::new(pool.clone()),
            client_bots: ClientBotRepository::new(pool.clone()),
            client_users: ClientUserRepository::new(pool),
        }
    }
}
