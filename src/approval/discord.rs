//! Discord rendering of the approval workflow.

use crate::approval::card::display_value;
use crate::approval::channel::{split_message, MESSAGE_LIMIT};
use crate::approval::{
    ApprovalDecision, ApprovalWorkflow, ChatChannel, Click, MessageRef, ReviewCard,
};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serenity::all::{
    ButtonStyle, ChannelId, Client, Colour, ComponentInteraction, Context, CreateActionRow,
    CreateButton, CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage,
    CreateMessage, EditMessage, EventHandler, GatewayIntents, Http, Interaction, Mentionable,
    MessageId, Ready,
};
use std::future::Future;
use std::sync::Arc;

pub struct DiscordChannel {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl DiscordChannel {
    pub fn new(bot_token: &str, channel_id: u64) -> Result<Self> {
        if channel_id == 0 {
            return Err(AppError::Configuration(
                "DISCORD_CHANNEL_ID must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            http: Arc::new(Http::new(bot_token)),
            channel_id: ChannelId::new(channel_id),
        })
    }
}

#[async_trait]
impl ChatChannel for DiscordChannel {
    async fn send_card(&self, request_id: &str, card: &ReviewCard) -> Result<MessageRef> {
        let embed = card.fields.iter().fold(
            CreateEmbed::new().title(&card.title).colour(Colour::BLUE),
            |embed, (name, value)| embed.field(name, display_value(value), false),
        );
        let controls = CreateActionRow::Buttons(vec![
            CreateButton::new(ApprovalDecision::Approve.custom_id(request_id))
                .label("Approve")
                .style(ButtonStyle::Success),
            CreateButton::new(ApprovalDecision::Reject.custom_id(request_id))
                .label("Reject")
                .style(ButtonStyle::Danger),
        ]);

        let message = self
            .channel_id
            .send_message(
                &self.http,
                CreateMessage::new().embed(embed).components(vec![controls]),
            )
            .await
            .map_err(|e| AppError::Chat(format!("Failed to send review card: {}", e)))?;

        Ok(MessageRef {
            channel_id: message.channel_id.get(),
            message_id: message.id.get(),
        })
    }

    async fn close_card(&self, message: &MessageRef, text: &str) -> Result<()> {
        ChannelId::new(message.channel_id)
            .edit_message(
                &self.http,
                MessageId::new(message.message_id),
                EditMessage::new().content(text).components(Vec::new()),
            )
            .await
            .map_err(|e| AppError::Chat(format!("Failed to edit review card: {}", e)))?;
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        for chunk in split_message(text, MESSAGE_LIMIT) {
            self.channel_id
                .say(&self.http, chunk)
                .await
                .map_err(|e| AppError::Chat(format!("Failed to send message: {}", e)))?;
        }
        Ok(())
    }
}

/// Gateway handler turning button clicks into decisions.
pub struct ApprovalHandler {
    workflow: ApprovalWorkflow,
}

impl ApprovalHandler {
    pub fn new(workflow: ApprovalWorkflow) -> Self {
        Self { workflow }
    }

    async fn on_click(&self, ctx: &Context, component: &ComponentInteraction) {
        let click = self.workflow.click(&component.data.custom_id);

        let response = match click.notice() {
            Some(notice) => CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(notice)
                    .ephemeral(true),
            ),
            None => CreateInteractionResponse::Acknowledge,
        };
        if let Err(e) = component.create_response(&ctx.http, response).await {
            tracing::warn!(
                custom_id = %component.data.custom_id,
                error = %e,
                "Failed to answer click"
            );
        }

        if let Click::Claimed(claimed) = click {
            let mention = component.user.mention().to_string();
            // settle reports its own failures to the channel
            let _ = self.workflow.settle(claimed, &mention).await;
        }
    }
}

#[serenity::async_trait]
impl EventHandler for ApprovalHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, "Discord bot connected");
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            self.on_click(&ctx, &component).await;
        }
    }
}

/// Run the gateway connection until `shutdown` resolves.
pub async fn run_bot(
    bot_token: &str,
    handler: ApprovalHandler,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let mut client = Client::builder(bot_token, GatewayIntents::GUILDS)
        .event_handler(handler)
        .await
        .map_err(|e| AppError::Chat(format!("Failed to create Discord client: {}", e)))?;

    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        _ = shutdown => {
            tracing::info!("Discord bot shutting down");
            shard_manager.shutdown_all().await;
            Ok(())
        }
        result = client.start() => {
            result.map_err(|e| AppError::Chat(format!("Discord client error: {}", e)))
        }
    }
}
