//! Live-event cache maintenance
//!
//! A small set of dispatch events keeps the shared entity cache current
//! between bootstraps. Each application runs as its own task off the read
//! loop; everything funnels through the cache's atomic merge operations, so
//! racing a concurrently-processed bootstrap batch is safe.

use std::sync::Arc;

use serde_json::Value;

use concord_core::{
    ChannelData, EntityCache, GuildData, Message, MessageData, PresenceData, Snowflake,
};

use crate::events::GatewayEventType;

/// Apply one live event's side effects to the cache
pub(crate) async fn apply_cache_event(
    cache: Arc<dyn EntityCache>,
    event: GatewayEventType,
    data: Value,
) {
    let result = match event {
        GatewayEventType::MessageCreate | GatewayEventType::MessageUpdate => {
            cache_message(&cache, data).await
        }
        GatewayEventType::ChannelCreate | GatewayEventType::ChannelUpdate => {
            match serde_json::from_value::<ChannelData>(data) {
                Ok(channel) => cache.upsert_channel(&channel).await.map(|_| ()),
                Err(error) => {
                    tracing::debug!(%event, %error, "Undecodable channel payload");
                    return;
                }
            }
        }
        GatewayEventType::ChannelDelete => {
            if let Some(id) = entity_id(&data) {
                cache.remove_channel(id).await;
            }
            Ok(())
        }
        GatewayEventType::GuildCreate | GatewayEventType::GuildUpdate => {
            match serde_json::from_value::<GuildData>(data) {
                Ok(guild) => cache.register_guild(&guild).await.map(|_| ()),
                Err(error) => {
                    tracing::debug!(%event, %error, "Undecodable guild payload");
                    return;
                }
            }
        }
        GatewayEventType::GuildDelete => {
            if let Some(id) = entity_id(&data) {
                cache.remove_guild(id).await;
            }
            Ok(())
        }
        GatewayEventType::PresenceUpdate => {
            match serde_json::from_value::<PresenceData>(data) {
                Ok(presence) => cache.upsert_user(&presence.as_user_data()).await.map(|_| ()),
                Err(error) => {
                    tracing::debug!(%event, %error, "Undecodable presence payload");
                    return;
                }
            }
        }
        _ => return,
    };

    if let Err(error) = result {
        tracing::debug!(%event, %error, "Cache maintenance skipped event");
    }
}

/// Cache a created/edited message and its author
async fn cache_message(
    cache: &Arc<dyn EntityCache>,
    data: Value,
) -> concord_core::CacheResult<()> {
    let data: MessageData = match serde_json::from_value(data) {
        Ok(data) => data,
        Err(error) => {
            tracing::debug!(%error, "Undecodable message payload");
            return Ok(());
        }
    };

    if let Some(author) = &data.author {
        cache.upsert_user(author).await?;
    }

    let Some(id) = data.id else {
        return Err(concord_core::DomainError::MissingIdentity);
    };
    let message = match cache.lookup_message(id).await {
        Some(mut existing) => {
            existing.apply(&data);
            existing
        }
        None => Message::from_data(&data)?,
    };
    cache.insert_message(message).await;
    Ok(())
}

/// Extract the `id` field of a deletion payload
fn entity_id(data: &Value) -> Option<Snowflake> {
    serde_json::from_value(data.get("id")?.clone()).ok()
}
