//! Bootstrap reconciler
//!
//! The platform splits the initial snapshot across two events. The primary
//! payload carries top-level entity arrays; the supplemental payload carries
//! guild fragments and member/presence batches that correlate to the primary
//! payload **by array position** - the fragments may omit the id needed for
//! a direct lookup at the time they are processed.
//!
//! The reconciler builds explicit index-keyed tables instead of iterating
//! the arrays in lockstep: length mismatches are then safe (missing
//! positions are absent, not errors) and the join logic is independently
//! testable.
//!
//! Every resolution is an atomic existing-or-new merge against the shared
//! cache, which makes the whole pass idempotent: feeding the same payload
//! pair twice yields the same set of identities.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use concord_core::{EntityCache, GuildData, MemberData, Snowflake};

use crate::events::{ReadyPayload, ReadySupplementalPayload};

/// A correlation failure for one indexed guild
///
/// Reportable but non-fatal: the guild is still registered (the client can
/// receive per-member updates later via live events), only member attachment
/// is skipped.
#[derive(Debug, Clone)]
pub struct ReconciliationGap {
    pub guild_index: usize,
    pub guild_id: Option<Snowflake>,
    pub reason: String,
}

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct ReconciliationReport {
    pub guilds_registered: usize,
    pub channels_cached: usize,
    pub users_cached: usize,
    pub relationships_recorded: usize,
    pub members_attached: usize,
    pub presences_merged: usize,
    pub gaps: Vec<ReconciliationGap>,
}

/// Two-phase bootstrap reconciler
///
/// The correlation tables live only across the two bootstrap events of one
/// connection; they are dropped once supplemental reconciliation completes
/// and never persisted.
pub struct BootstrapReconciler {
    cache: Arc<dyn EntityCache>,
    /// index -> member fragments, concatenated across both payloads
    members_by_index: HashMap<usize, Vec<MemberData>>,
    /// index -> supplemental guild fragment
    guilds_by_index: BTreeMap<usize, GuildData>,
}

impl BootstrapReconciler {
    /// Create a reconciler against the shared entity cache
    pub fn new(cache: Arc<dyn EntityCache>) -> Self {
        Self {
            cache,
            members_by_index: HashMap::new(),
            guilds_by_index: BTreeMap::new(),
        }
    }

    /// Reconcile the primary bootstrap payload
    ///
    /// Walks the four top-level arrays position by position up to the longest
    /// length, treating missing positions as absent. Member batches are only
    /// recorded into the correlation table here; attachment waits for the
    /// supplemental guild fragments.
    pub async fn reconcile_ready(&mut self, payload: &ReadyPayload) -> ReconciliationReport {
        let mut report = ReconciliationReport::default();

        for index in 0..payload.longest_len() {
            if let Some(guild) = payload.guilds.get(index) {
                match self.cache.register_guild(guild).await {
                    Ok(_) => report.guilds_registered += 1,
                    Err(error) => report.gaps.push(ReconciliationGap {
                        guild_index: index,
                        guild_id: guild.id,
                        reason: format!("guild rejected by cache: {error}"),
                    }),
                }
            }

            if let Some(channel) = payload.private_channels.get(index) {
                match self.cache.upsert_channel(channel).await {
                    Ok(_) => report.channels_cached += 1,
                    Err(error) => {
                        tracing::warn!(index, %error, "Skipping private channel without identity");
                    }
                }
            }

            if let Some(user) = payload.users.get(index) {
                match self.cache.upsert_user(user).await {
                    Ok(_) => report.users_cached += 1,
                    Err(error) => {
                        tracing::warn!(index, %error, "Skipping user without identity");
                    }
                }
            }

            if let Some(relationship) = payload.relationships.get(index) {
                // Both friends and blocks populate the shared user cache
                if self
                    .cache
                    .upsert_user(&relationship.as_user_data())
                    .await
                    .is_ok()
                    && self.cache.record_relationship(relationship).await.is_ok()
                {
                    report.relationships_recorded += 1;
                } else {
                    tracing::warn!(index, "Skipping relationship without identity");
                }
            }
        }

        for (index, batch) in payload.merged_members.iter().enumerate() {
            self.members_by_index
                .entry(index)
                .or_default()
                .extend(batch.iter().cloned());
        }

        tracing::info!(
            guilds = report.guilds_registered,
            users = report.users_cached,
            relationships = report.relationships_recorded,
            "Primary bootstrap payload reconciled"
        );
        report
    }

    /// Reconcile the supplemental bootstrap payload
    ///
    /// Completes the positional join: supplemental guild fragments resolve
    /// against already-registered guilds, accumulated member batches attach
    /// to them, and merged presences fold into the user cache. The
    /// correlation tables are destroyed on completion.
    pub async fn reconcile_supplemental(
        &mut self,
        payload: &ReadySupplementalPayload,
    ) -> ReconciliationReport {
        let mut report = ReconciliationReport::default();

        // Steps 1-2: extend the correlation tables
        for (index, batch) in payload.merged_members.iter().enumerate() {
            self.members_by_index
                .entry(index)
                .or_default()
                .extend(batch.iter().cloned());
        }
        for (index, fragment) in payload.guilds.iter().enumerate() {
            self.guilds_by_index.insert(index, fragment.clone());
        }

        // Steps 3-4: resolve each indexed fragment and attach its members
        let indexes: Vec<usize> = self.guilds_by_index.keys().copied().collect();
        for index in indexes {
            let fragment = self.guilds_by_index[&index].clone();
            self.resolve_indexed_guild(index, &fragment, &mut report)
                .await;
        }

        // Step 5: presences merge into the user cache independently, then
        // any presence-derived member batch attaches to its indexed guild
        for (index, batch) in payload.merged_presences.guilds.iter().enumerate() {
            let guild_id = self
                .guilds_by_index
                .get(&index)
                .and_then(|fragment| fragment.id);
            for presence in batch {
                if self
                    .cache
                    .upsert_user(&presence.as_user_data())
                    .await
                    .is_ok()
                {
                    report.presences_merged += 1;
                } else {
                    tracing::warn!(index, "Skipping presence without identity");
                    continue;
                }

                let Some(user_id) = presence.identity() else {
                    continue;
                };
                let derived = MemberData {
                    user_id: Some(user_id),
                    ..MemberData::default()
                };
                self.members_by_index
                    .entry(index)
                    .or_default()
                    .push(derived.clone());
                if let Some(guild_id) = guild_id {
                    if self.cache.attach_member(guild_id, &derived).await.is_ok() {
                        report.members_attached += 1;
                    }
                }
            }
        }

        for friend in &payload.merged_presences.friends {
            match self.cache.upsert_user(&friend.as_user_data()).await {
                Ok(_) => report.presences_merged += 1,
                Err(error) => tracing::warn!(%error, "Skipping friend presence without identity"),
            }
        }

        for gap in &report.gaps {
            tracing::warn!(
                guild_index = gap.guild_index,
                guild_id = ?gap.guild_id,
                reason = %gap.reason,
                "Bootstrap correlation gap"
            );
        }
        tracing::info!(
            guilds = report.guilds_registered,
            members = report.members_attached,
            presences = report.presences_merged,
            gaps = report.gaps.len(),
            "Supplemental bootstrap payload reconciled"
        );

        // The context lives only across the two bootstrap events
        self.members_by_index.clear();
        self.guilds_by_index.clear();

        report
    }

    /// Resolve one indexed guild fragment and attach its member batch
    async fn resolve_indexed_guild(
        &mut self,
        index: usize,
        fragment: &GuildData,
        report: &mut ReconciliationReport,
    ) {
        let Some(guild_id) = fragment.id else {
            report.gaps.push(ReconciliationGap {
                guild_index: index,
                guild_id: None,
                reason: "supplemental guild fragment carries no id".to_string(),
            });
            return;
        };

        // Existing guilds take the fragment as a partial update; unknown
        // ones are constructed and registered.
        match self.cache.register_guild(fragment).await {
            Ok(_) => report.guilds_registered += 1,
            Err(error) => {
                report.gaps.push(ReconciliationGap {
                    guild_index: index,
                    guild_id: Some(guild_id),
                    reason: format!("guild rejected by cache: {error}"),
                });
                return;
            }
        }

        let Some(batch) = self.members_by_index.get(&index) else {
            report.gaps.push(ReconciliationGap {
                guild_index: index,
                guild_id: Some(guild_id),
                reason: "no member batch at this index".to_string(),
            });
            return;
        };

        for member in batch {
            if member.identity().is_none() {
                report.gaps.push(ReconciliationGap {
                    guild_index: index,
                    guild_id: Some(guild_id),
                    reason: "member fragment carries no identity".to_string(),
                });
                continue;
            }
            // Per-member identity resolution against the shared user cache
            // prevents duplicate identities for a user who is both a cached
            // friend and a guild member.
            if let Err(error) = self.cache.upsert_user(&member.as_user_data()).await {
                tracing::warn!(index, %error, "Member user merge failed");
                continue;
            }
            match self.cache.attach_member(guild_id, member).await {
                Ok(_) => report.members_attached += 1,
                Err(error) => tracing::warn!(index, %error, "Member attachment failed"),
            }
        }
    }
}
