//! Inactivity sweep: demote members who stopped playing.
//!
//! The sweep decides who is stale and how many places they lose, following the
//! ladder's `inactivity_period_days` and `demotion_inc`. A stale member only
//! sinks past active members, so idle members never swap among themselves.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use storage::LadderEngine;
use storage::repository::LadderStore;
use uuid::Uuid;

use crate::error::{AdminError, Result};

#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    pub as_of: DateTime<Utc>,
    /// Only report who would be demoted.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepEntry {
    pub player_id: Uuid,
    pub rank_before: Option<i32>,
    pub rank_after: Option<i32>,
    /// Places the player is due to lose.
    pub planned: i32,
    /// Places actually lost; stops early above another idle member.
    pub applied: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub ladder_id: Uuid,
    pub dry_run: bool,
    pub entries: Vec<SweepEntry>,
}

impl SweepReport {
    pub fn demotions(&self) -> i32 {
        self.entries.iter().map(|e| e.applied).sum()
    }
}

/// Apply the ladder's inactivity penalty to every stale member, worst rank first.
pub async fn sweep_inactive<S: LadderStore>(
    engine: &LadderEngine<S>,
    ladder_id: Uuid,
    options: SweepOptions,
) -> Result<SweepReport> {
    let ladder = engine.ladder(ladder_id).await?;
    let Some(period) = ladder.inactivity_period_days else {
        return Err(AdminError::InvalidArgument(format!(
            "ladder '{}' has no inactivity policy",
            ladder.name
        )));
    };
    let steps = ladder.demotion_inc.unwrap_or(1);

    let stale = engine.inactive_players(ladder_id, options.as_of).await?;
    tracing::info!(
        "{} members of '{}' idle for more than {} days as of {}",
        stale.len(),
        ladder.name,
        period,
        options.as_of
    );

    let mut report = SweepReport {
        ladder_id,
        dry_run: options.dry_run,
        entries: Vec::with_capacity(stale.len()),
    };

    let idle: HashSet<Uuid> = stale.iter().map(|r| r.player_id).collect();

    for ranking in stale {
        let entry = if options.dry_run {
            SweepEntry {
                player_id: ranking.player_id,
                rank_before: ranking.rank,
                rank_after: ranking.rank,
                planned: steps,
                applied: 0,
            }
        } else {
            let demotion = engine
                .demote_inactive(ranking.player_id, ladder_id, steps, &idle)
                .await?;
            SweepEntry {
                player_id: ranking.player_id,
                rank_before: Some(demotion.rank_before),
                rank_after: Some(demotion.rank_after),
                planned: steps,
                applied: demotion.places(),
            }
        };

        tracing::debug!(
            "Player {} (rank {:?}): {} of {} demotions applied",
            entry.player_id,
            entry.rank_before,
            entry.applied,
            steps
        );
        report.entries.push(entry);
    }

    Ok(report)
}
