//! Bootstrap reconciliation integration tests
//!
//! Exercises the two-phase reconciler against the real in-memory cache.
//!
//! Run with: cargo test -p integration-tests --test bootstrap_tests

use std::sync::Arc;

use concord_cache::MemoryCache;
use concord_core::{EntityCache, Snowflake};
use concord_gateway::BootstrapReconciler;
use integration_tests::{
    parse_ready, parse_supplemental, ready_two_guilds, supplemental_two_guilds,
};
use serde_json::json;

fn setup() -> (BootstrapReconciler, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::new());
    (BootstrapReconciler::new(cache.clone()), cache)
}

// ============================================================================
// Positional correlation
// ============================================================================

#[tokio::test]
async fn test_members_attach_by_position_despite_length_mismatches() {
    let (mut reconciler, cache) = setup();

    // Fewer relationships than guilds, fewer users than either: positions
    // join by index, missing positions are absent.
    reconciler.reconcile_ready(&ready_two_guilds()).await;
    reconciler
        .reconcile_supplemental(&supplemental_two_guilds())
        .await;

    // G1 has m1, G2 has {m2, m3}
    let first = cache.guild_members(Snowflake::new(10)).await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].user_id, Snowflake::new(100));

    let second = cache.guild_members(Snowflake::new(20)).await;
    let mut ids: Vec<i64> = second.iter().map(|m| m.user_id.into_inner()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![200, 300]);
}

#[tokio::test]
async fn test_supplemental_fragment_updates_registered_guild() {
    let (mut reconciler, cache) = setup();

    reconciler.reconcile_ready(&ready_two_guilds()).await;
    reconciler
        .reconcile_supplemental(&supplemental_two_guilds())
        .await;

    let guild = cache.lookup_guild(Snowflake::new(20)).await.unwrap();
    // Name from the primary payload, member count from the fragment
    assert_eq!(guild.name.as_deref(), Some("Second"));
    assert_eq!(guild.member_count, Some(2));
}

#[tokio::test]
async fn test_guild_without_member_batch_still_registers() {
    let (mut reconciler, cache) = setup();

    reconciler
        .reconcile_ready(&parse_ready(&json!({
            "guilds": [{"id": "10"}, {"id": "20"}]
        })))
        .await;
    let report = reconciler
        .reconcile_supplemental(&parse_supplemental(&json!({
            "guilds": [{"id": "10"}, {"id": "20"}],
            "merged_members": [
                [{"user_id": "100"}]
            ]
        })))
        .await;

    // Index 1 has no batch: registered, skipped for attachment, gap reported
    assert!(cache.lookup_guild(Snowflake::new(20)).await.is_some());
    assert!(cache.guild_members(Snowflake::new(20)).await.is_empty());
    assert_eq!(report.gaps.len(), 1);
    assert_eq!(report.gaps[0].guild_index, 1);
    assert_eq!(report.gaps[0].guild_id, Some(Snowflake::new(20)));
}

// ============================================================================
// Identity resolution
// ============================================================================

#[tokio::test]
async fn test_friend_who_is_also_member_keeps_one_identity() {
    let (mut reconciler, cache) = setup();

    // User 100 arrives as a top-level user, a friend relationship, a guild
    // member, and a presence - one cached identity at the end.
    reconciler.reconcile_ready(&ready_two_guilds()).await;
    reconciler
        .reconcile_supplemental(&supplemental_two_guilds())
        .await;

    assert!(cache.lookup_user(Snowflake::new(100)).await.is_some());
    let user = cache.lookup_user(Snowflake::new(100)).await.unwrap();
    assert_eq!(user.username.as_deref(), Some("ada"));
    // Presence merged into the same identity
    assert_eq!(user.status.as_deref(), Some("online"));
}

#[tokio::test]
async fn test_relationship_types_route_to_lists() {
    let (mut reconciler, cache) = setup();

    reconciler.reconcile_ready(&ready_two_guilds()).await;

    let friends = cache.friends().await;
    let blocked = cache.blocked().await;
    assert_eq!(friends, vec![Snowflake::new(100)]);
    assert_eq!(blocked, vec![Snowflake::new(300)]);
    // The blocked user is cached but never listed as a friend
    assert!(cache.lookup_user(Snowflake::new(300)).await.is_some());
    assert!(!friends.contains(&Snowflake::new(300)));
}

// ============================================================================
// Idempotency
// ============================================================================

#[tokio::test]
async fn test_double_feed_produces_identical_state() {
    let (mut reconciler, cache) = setup();

    reconciler.reconcile_ready(&ready_two_guilds()).await;
    reconciler
        .reconcile_supplemental(&supplemental_two_guilds())
        .await;

    let users = cache.user_count();
    let guilds = cache.guild_count();
    let members_g1 = cache.member_count(Snowflake::new(10));
    let members_g2 = cache.member_count(Snowflake::new(20));
    let friends = cache.friends().await.len();

    reconciler.reconcile_ready(&ready_two_guilds()).await;
    reconciler
        .reconcile_supplemental(&supplemental_two_guilds())
        .await;

    assert_eq!(cache.user_count(), users);
    assert_eq!(cache.guild_count(), guilds);
    assert_eq!(cache.member_count(Snowflake::new(10)), members_g1);
    assert_eq!(cache.member_count(Snowflake::new(20)), members_g2);
    assert_eq!(cache.friends().await.len(), friends);
}

// ============================================================================
// Private channels
// ============================================================================

#[tokio::test]
async fn test_private_channels_cached_with_recipients() {
    let (mut reconciler, cache) = setup();

    reconciler.reconcile_ready(&ready_two_guilds()).await;

    let dm = cache.lookup_channel(Snowflake::new(30)).await.unwrap();
    assert!(dm.channel_type.is_private());
    assert_eq!(dm.recipient_ids, vec![Snowflake::new(100)]);
}
