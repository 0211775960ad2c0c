//! Admin notification service
//!
//! Pushes operational events (new members, pending registrations) to the
//! configured admin accounts over the master bot.

use teloxide::{Bot, types::ChatId, prelude::*};
use tracing::{debug, warn};
use crate::models::client_bot::ClientBot;
use crate::models::member::Member;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct AdminNotifier {
    bot: Bot,
    admin_ids: Vec<i64>,
}

impl AdminNotifier {
    pub fn new(bot: Bot, admin_ids: Vec<i64>) -> Self {
        Self { bot, admin_ids }
    }

    /// Announce a first-contact member to all admins
    pub async fn notify_new_member(&self, member: &Member, total_members: i64) -> Result<()> {
        let username = member
            .username
            .as_deref()
            .map(|u| format!("@{}", u))
            .unwrap_or_else(|| "no username".to_string());

        let text = format!(
            "🎉 New member joined!\n\nName: {}\nUser ID: {}\nUsername: {}\nTotal members: {}",
            member.display_name(),
            member.telegram_id,
            username,
            total_members
        );

        self.send_to_admins(&text).await
    }

    /// Announce a client bot registration awaiting approval
    pub async fn notify_registration(&self, bot: &ClientBot) -> Result<()> {
        let username = bot
            .bot_username
            .as_deref()
            .map(|u| format!("@{}", u))
            .unwrap_or_else(|| "unknown".to_string());

        let text = format!(
            "🤖 New client bot registered!\n\nBot: {}\nBot ID: {}\nOwner ID: {}\n\nApprove with /approvebot {}",
            username, bot.id, bot.owner_id, bot.id
        );

        self.send_to_admins(&text).await
    }

    /// Best-effort delivery to every admin; failures are logged, not raised
    async fn send_to_admins(&self, text: &str) -> Result<()> {
        if self.admin_ids.is_empty() {
            warn!("No admin IDs configured for admin notifications");
            return Ok(());
        }

        for &admin_id in &self.admin_ids {
            match self.bot.send_message(ChatId(admin_id), text).await {
                Ok(_) => {
                    debug!(admin_id = admin_id, "Admin notification sent");
                }
                Err(e) => {
                    warn!(admin_id = admin_id, error = %e, "Failed to send admin notification");
                }
            }
        }

        Ok(())
    }
}
