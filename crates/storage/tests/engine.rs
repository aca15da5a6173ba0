use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use storage::engine::{GameReport, LadderEngine};
use storage::error::{LadderError, StorageError};
use storage::models::{GameResult, NewLadder, NewPlayer, Ranking};
use storage::rank_table::RankTable;
use storage::repository::{LadderStore, LadderTx};
use storage::MemoryStore;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

struct Club {
    engine: LadderEngine<MemoryStore>,
    ladder_id: Uuid,
    players: Vec<Uuid>,
}

impl Club {
    async fn new(ladder: NewLadder, members: usize) -> Self {
        let engine = LadderEngine::new(MemoryStore::new());
        let ladder_id = engine.create_ladder(&ladder).await.unwrap().ladder_id;

        let mut players = Vec::with_capacity(members);
        for n in 0..members {
            let player = engine
                .create_player(&NewPlayer {
                    user_id: format!("member-{n}"),
                    is_member: Some(true),
                })
                .await
                .unwrap();
            engine.join_ladder(player.player_id, ladder_id, None).await.unwrap();
            players.push(player.player_id);
        }

        Self {
            engine,
            ladder_id,
            players,
        }
    }

    async fn fide(members: usize) -> Self {
        Self::new(NewLadder::new("Thursday Ladder", "fide"), members).await
    }

    async fn report(&self, white: usize, black: usize, result: GameResult, played_at: DateTime<Utc>) {
        self.engine
            .report_game(GameReport::new(
                self.ladder_id,
                self.players[white],
                self.players[black],
                result,
                played_at,
            ))
            .await
            .unwrap();
    }

    async fn rank(&self, player: usize) -> Option<i32> {
        self.engine
            .current_rank(self.players[player], self.ladder_id)
            .await
            .unwrap()
    }

    async fn ranks(&self) -> Vec<Option<i32>> {
        let mut ranks = Vec::with_capacity(self.players.len());
        for player in 0..self.players.len() {
            ranks.push(self.rank(player).await);
        }
        ranks
    }

    async fn rating(&self, player: usize) -> Decimal {
        self.engine
            .current_rating(self.players[player], self.ladder_id)
            .await
            .unwrap()
    }

    async fn stale(&self, as_of: DateTime<Utc>) -> Vec<Uuid> {
        self.engine
            .inactive_players(self.ladder_id, as_of)
            .await
            .unwrap()
            .iter()
            .map(|r| r.player_id)
            .collect()
    }

    async fn assert_dense(&self) {
        let mut tx = self.engine.store().begin(self.ladder_id).await.unwrap();
        let rankings = tx.rankings().await.unwrap();
        RankTable::from_rankings(&rankings).expect("active ranks must be exactly 1..N");
    }

    async fn rating_rows(&self) -> Vec<(Uuid, Decimal, DateTime<Utc>, Option<Uuid>)> {
        let mut tx = self.engine.store().begin(self.ladder_id).await.unwrap();
        tx.ratings(None)
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.player_id, r.rating, r.rated_at, r.game_id))
            .collect()
    }
}

#[tokio::test]
async fn equal_provisional_players_white_wins() {
    let club = Club::fide(2).await;

    club.report(0, 1, GameResult::WhiteWins, at(1, 19)).await;

    assert_eq!(club.rating(0).await, dec("1216.000"));
    assert_eq!(club.rating(1).await, dec("1184.000"));

    let games = club.engine.games(club.ladder_id).await.unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].white_rating, Some(dec("1200")));
    assert_eq!(games[0].black_rating, Some(dec("1200")));
}

#[tokio::test]
async fn winner_from_below_takes_the_losers_place() {
    let club = Club::fide(3).await;

    club.report(2, 0, GameResult::WhiteWins, at(1, 19)).await;

    assert_eq!(club.ranks().await, vec![Some(2), Some(3), Some(1)]);
    club.assert_dense().await;
}

#[tokio::test]
async fn black_winner_from_below_moves_above_white() {
    let club = Club::fide(4).await;

    club.report(1, 3, GameResult::BlackWins, at(1, 19)).await;

    assert_eq!(club.ranks().await, vec![Some(1), Some(3), Some(4), Some(2)]);
    club.assert_dense().await;
}

#[tokio::test]
async fn favourite_winning_keeps_ranks() {
    let club = Club::fide(3).await;

    club.report(0, 2, GameResult::WhiteWins, at(1, 19)).await;
    club.report(1, 0, GameResult::BlackWins, at(2, 19)).await;

    assert_eq!(club.ranks().await, vec![Some(1), Some(2), Some(3)]);
}

#[tokio::test]
async fn adjacent_draw_changes_nothing() {
    let club = Club::fide(5).await;

    club.report(3, 4, GameResult::Draw, at(1, 19)).await;

    assert_eq!(
        club.ranks().await,
        vec![Some(1), Some(2), Some(3), Some(4), Some(5)]
    );
}

#[tokio::test]
async fn draw_lifts_lower_white_under_black() {
    let club = Club::fide(5).await;

    club.report(4, 1, GameResult::Draw, at(1, 19)).await;

    assert_eq!(
        club.ranks().await,
        vec![Some(1), Some(2), Some(4), Some(5), Some(3)]
    );
    club.assert_dense().await;
}

#[tokio::test]
async fn leaving_closes_the_gap() {
    let club = Club::fide(5).await;

    club.engine
        .leave_ladder(club.players[1], club.ladder_id)
        .await
        .unwrap();

    assert_eq!(
        club.ranks().await,
        vec![Some(1), None, Some(2), Some(3), Some(4)]
    );
    let status = club
        .engine
        .member_status(club.players[1], club.ladder_id)
        .await
        .unwrap();
    assert!(!status.is_active);
    assert_eq!(status.rank, None);
    club.assert_dense().await;
}

#[tokio::test]
async fn rejoining_lands_at_the_bottom() {
    let club = Club::fide(8).await;
    club.engine
        .leave_ladder(club.players[7], club.ladder_id)
        .await
        .unwrap();

    let rank = club
        .engine
        .rejoin_ladder(club.players[7], club.ladder_id)
        .await
        .unwrap();

    assert_eq!(rank, 8);
    club.assert_dense().await;
}

#[tokio::test]
async fn invalid_membership_transitions() {
    let club = Club::fide(3).await;
    let stranger = Uuid::new_v4();

    let err = club.engine.leave_ladder(stranger, club.ladder_id).await.unwrap_err();
    assert!(matches!(err, LadderError::InvalidState(_)));

    let err = club
        .engine
        .rejoin_ladder(club.players[0], club.ladder_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::InvalidState(_)));

    club.engine.leave_ladder(club.players[0], club.ladder_id).await.unwrap();
    let err = club
        .engine
        .leave_ladder(club.players[0], club.ladder_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::InvalidState(_)));

    let err = club
        .engine
        .join_ladder(club.players[1], club.ladder_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Validation(_)));

    let err = club
        .engine
        .join_ladder(stranger, club.ladder_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Validation(_)));

    club.assert_dense().await;
}

#[tokio::test]
async fn rejected_games_leave_no_trace() {
    let club = Club::fide(2).await;
    let outsider = club
        .engine
        .create_player(&NewPlayer {
            user_id: "visitor".into(),
            is_member: None,
        })
        .await
        .unwrap();

    let self_play = GameReport::new(
        club.ladder_id,
        club.players[0],
        club.players[0],
        GameResult::Draw,
        at(1, 19),
    );
    let err = club.engine.report_game(self_play).await.unwrap_err();
    assert!(matches!(err, LadderError::Validation(_)));

    let unranked = GameReport::new(
        club.ladder_id,
        club.players[0],
        outsider.player_id,
        GameResult::WhiteWins,
        at(1, 19),
    );
    let err = club.engine.report_game(unranked).await.unwrap_err();
    assert!(matches!(err, LadderError::Validation(_)));

    assert!(club.engine.games(club.ladder_id).await.unwrap().is_empty());
    assert!(club.rating_rows().await.is_empty());
    assert_eq!(club.rating(0).await, dec("1200"));
}

#[tokio::test]
async fn games_outside_the_window_are_rejected() {
    let ladder = NewLadder::new("Spring Tournament", "fide").with_window(
        NaiveDate::from_ymd_opt(2024, 5, 1),
        NaiveDate::from_ymd_opt(2024, 5, 31),
    );
    let club = Club::new(ladder, 2).await;

    let late = GameReport::new(
        club.ladder_id,
        club.players[0],
        club.players[1],
        GameResult::WhiteWins,
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
    );
    let err = club.engine.report_game(late).await.unwrap_err();
    assert!(matches!(err, LadderError::Validation(_)));

    club.report(0, 1, GameResult::WhiteWins, at(31, 23)).await;
    assert_eq!(club.engine.games(club.ladder_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn playing_reawakens_inactive_members() {
    let club = Club::fide(4).await;
    club.engine.leave_ladder(club.players[0], club.ladder_id).await.unwrap();
    club.engine.leave_ladder(club.players[1], club.ladder_id).await.unwrap();

    // Both come back at the bottom, white first; black then wins and moves up.
    club.report(0, 1, GameResult::BlackWins, at(2, 19)).await;

    assert_eq!(
        club.ranks().await,
        vec![Some(4), Some(3), Some(1), Some(2)]
    );
    club.assert_dense().await;
}

#[tokio::test]
async fn backdated_game_does_not_change_current_rating() {
    let club = Club::fide(2).await;

    club.report(0, 1, GameResult::WhiteWins, at(10, 19)).await;
    let current = club.rating(0).await;

    club.report(0, 1, GameResult::BlackWins, at(3, 19)).await;

    assert_eq!(club.rating(0).await, current);
    let history = club
        .engine
        .rating_history(club.players[0], club.ladder_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].rated_at, at(3, 19));
}

#[tokio::test]
async fn crunch_is_idempotent_and_matches_incremental_reporting() {
    let club = Club::fide(4).await;
    club.report(0, 1, GameResult::WhiteWins, at(1, 19)).await;
    club.report(2, 3, GameResult::Draw, at(1, 19)).await;
    club.report(1, 2, GameResult::BlackWins, at(2, 19)).await;
    club.report(3, 0, GameResult::WhiteWins, at(3, 19)).await;

    let incremental = club.rating_rows().await;
    let ranks = club.ranks().await;

    let first = club.engine.crunch_ratings(club.ladder_id).await.unwrap();
    assert_eq!(first.games_replayed, 4);
    assert_eq!(first.ratings_deleted, 8);
    assert_eq!(first.ratings_written, 8);
    let once = club.rating_rows().await;

    club.engine.crunch_ratings(club.ladder_id).await.unwrap();
    let twice = club.rating_rows().await;

    assert_eq!(once, twice);
    assert_eq!(once, incremental);
    assert_eq!(club.ranks().await, ranks);
}

#[tokio::test]
async fn crunch_repairs_out_of_order_reports() {
    let club = Club::fide(2).await;
    club.report(0, 1, GameResult::WhiteWins, at(10, 19)).await;
    club.report(0, 1, GameResult::WhiteWins, at(3, 19)).await;

    club.engine.crunch_ratings(club.ladder_id).await.unwrap();

    let games = club.engine.games(club.ladder_id).await.unwrap();
    assert_eq!(games[0].played_at, at(3, 19));
    assert_eq!(games[0].white_rating, Some(dec("1200")));
    assert_eq!(games[1].white_rating, Some(dec("1216")));
    assert_eq!(club.rating(0).await, dec("1230.720"));
}

#[tokio::test]
async fn ratings_beyond_the_storable_range_are_rejected() {
    let mut ladder = NewLadder::new("Marathon", "fixed_increment").with_params(json!({ "step": 20 }));
    ladder.default_initial_rating = dec("9999990");
    let club = Club::new(ladder, 2).await;

    let err = club
        .engine
        .report_game(GameReport::new(
            club.ladder_id,
            club.players[0],
            club.players[1],
            GameResult::WhiteWins,
            at(1, 19),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Validation(_)));
    assert!(club.engine.games(club.ladder_id).await.unwrap().is_empty());
    assert!(club.rating_rows().await.is_empty());

    let newcomer = club
        .engine
        .create_player(&NewPlayer { user_id: "newcomer".into(), is_member: None })
        .await
        .unwrap();
    let err = club
        .engine
        .join_ladder(newcomer.player_id, club.ladder_id, Some(dec("10000000")))
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Validation(_)));
}

#[tokio::test]
async fn rating_at_a_past_moment() {
    let club = Club::fide(2).await;
    club.report(0, 1, GameResult::WhiteWins, at(3, 19)).await;
    club.report(0, 1, GameResult::WhiteWins, at(10, 19)).await;

    let mut seen = Vec::new();
    for when in [at(1, 19), at(3, 19), at(9, 0), at(11, 0)] {
        seen.push(
            club.engine
                .current_rating_at(club.players[0], club.ladder_id, when)
                .await
                .unwrap(),
        );
    }
    assert_eq!(
        seen,
        vec![dec("1200"), dec("1216"), dec("1216"), club.rating(0).await]
    );
    assert!(seen[3] > seen[2]);

    let err = club
        .engine
        .current_rating_at(Uuid::new_v4(), club.ladder_id, at(11, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::InvalidState(_)));
}

#[tokio::test]
async fn players_are_found_by_id() {
    let club = Club::fide(1).await;

    let player = club.engine.player(club.players[0]).await.unwrap();
    assert_eq!(player.user_id, "member-0");

    let err = club.engine.player(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, LadderError::Storage(StorageError::NotFound)));
}

#[tokio::test]
async fn fixed_increment_ladder() {
    let ladder = NewLadder::new("Blitz", "fixed_increment").with_params(json!({ "step": 5 }));
    let club = Club::new(ladder, 2).await;

    club.report(1, 0, GameResult::WhiteWins, at(1, 19)).await;
    club.report(0, 1, GameResult::Draw, at(1, 20)).await;

    assert_eq!(club.rating(1).await, dec("1204"));
    assert_eq!(club.rating(0).await, dec("1196"));
}

#[tokio::test]
async fn ladder_creation_checks_the_algorithm() {
    let engine = LadderEngine::new(MemoryStore::new());

    let err = engine
        .create_ladder(&NewLadder::new("Mystery", "glicko"))
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::InvalidState(_)));

    let err = engine
        .create_ladder(&NewLadder::new("Typo", "fide").with_params(json!({ "k": 10 })))
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Validation(_)));

    assert!(engine.list_ladders().await.unwrap().is_empty());
}

#[tokio::test]
async fn inactivity_penalty_swaps_one_place() {
    let club = Club::fide(3).await;

    let demotion = club
        .engine
        .apply_inactivity_penalty(club.players[0], club.ladder_id)
        .await
        .unwrap();
    assert!(demotion.moved());
    assert_eq!((demotion.rank_before, demotion.rank_after), (1, 2));
    assert_eq!(club.ranks().await, vec![Some(2), Some(1), Some(3)]);

    let demotion = club
        .engine
        .apply_inactivity_penalty(club.players[2], club.ladder_id)
        .await
        .unwrap();
    assert!(!demotion.moved());
    assert_eq!(demotion.rank_after, 3);
    assert_eq!(club.ranks().await, vec![Some(2), Some(1), Some(3)]);
}

#[tokio::test]
async fn inactive_demotion_stops_above_other_idle_members() {
    let club = Club::fide(5).await;
    let idle: HashSet<Uuid> = [club.players[0], club.players[3]].into_iter().collect();

    let demotion = club
        .engine
        .demote_inactive(club.players[0], club.ladder_id, 5, &idle)
        .await
        .unwrap();
    assert_eq!((demotion.rank_before, demotion.rank_after), (1, 3));
    assert_eq!(
        club.ranks().await,
        vec![Some(3), Some(1), Some(2), Some(4), Some(5)]
    );

    let demotion = club
        .engine
        .demote_inactive(club.players[3], club.ladder_id, 3, &idle)
        .await
        .unwrap();
    assert_eq!(demotion.places(), 1);
    assert_eq!(
        club.ranks().await,
        vec![Some(3), Some(1), Some(2), Some(5), Some(4)]
    );
    club.assert_dense().await;
}

#[tokio::test]
async fn rejoined_member_starts_a_fresh_inactivity_period() {
    let ladder = NewLadder::new("Club", "fide").with_inactivity_policy(14, 1);
    let club = Club::new(ladder, 3).await;

    // Everyone's active stretch began two months ago.
    let mut tx = club.engine.store().begin(club.ladder_id).await.unwrap();
    let backdated: Vec<Ranking> = tx
        .rankings()
        .await
        .unwrap()
        .into_iter()
        .map(|r| Ranking {
            active_since: Utc::now() - chrono::Duration::days(60),
            ..r
        })
        .collect();
    tx.update_rankings(&backdated).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(club.stale(Utc::now()).await.len(), 3);

    club.engine.leave_ladder(club.players[0], club.ladder_id).await.unwrap();
    club.engine.rejoin_ladder(club.players[0], club.ladder_id).await.unwrap();

    assert_eq!(club.stale(Utc::now()).await, vec![club.players[2], club.players[1]]);
    assert_eq!(
        club.stale(Utc::now() + chrono::Duration::days(20)).await,
        vec![club.players[0], club.players[2], club.players[1]]
    );
}

#[tokio::test]
async fn inactive_players_are_listed_worst_first() {
    let ladder = NewLadder::new("Club", "fide").with_inactivity_policy(14, 2);
    let club = Club::new(ladder, 4).await;
    club.report(1, 2, GameResult::Draw, Utc::now()).await;

    let stale = club
        .engine
        .inactive_players(club.ladder_id, Utc::now() + chrono::Duration::days(10))
        .await
        .unwrap();
    assert!(stale.is_empty());

    let stale = club
        .engine
        .inactive_players(club.ladder_id, Utc::now() + chrono::Duration::days(30))
        .await
        .unwrap();
    let ids: Vec<Uuid> = stale.iter().map(|r| r.player_id).collect();
    assert_eq!(
        ids,
        vec![club.players[3], club.players[2], club.players[1], club.players[0]]
    );
}

#[tokio::test]
async fn standings_follow_rank_order() {
    let club = Club::fide(3).await;
    club.report(2, 0, GameResult::WhiteWins, at(1, 19)).await;

    let standings = club.engine.standings(club.ladder_id).await.unwrap();

    let order: Vec<(i32, Uuid)> = standings.iter().map(|s| (s.rank, s.player_id)).collect();
    assert_eq!(
        order,
        vec![
            (1, club.players[2]),
            (2, club.players[0]),
            (3, club.players[1]),
        ]
    );
    assert_eq!(standings[0].int_rating, 1216);
    assert_eq!(standings[0].games_played, 1);
    assert_eq!(standings[2].games_played, 0);
}

#[tokio::test]
async fn corrupted_ranks_quarantine_the_ladder_until_repaired() {
    let club = Club::fide(3).await;

    let mut tx = club.engine.store().begin(club.ladder_id).await.unwrap();
    let mut broken = tx.rankings().await.unwrap();
    broken[1].rank = Some(7);
    tx.update_rankings(&broken[1..2]).await.unwrap();
    tx.commit().await.unwrap();

    let err = club.engine.standings(club.ladder_id).await.unwrap_err();
    assert!(matches!(err, LadderError::Consistency(_)));
    assert!(club.engine.is_quarantined(club.ladder_id));

    let err = club
        .engine
        .apply_inactivity_penalty(club.players[0], club.ladder_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Consistency(_)));

    let repaired = club.engine.repair_ranks(club.ladder_id).await.unwrap();
    assert_eq!(repaired, 2);
    assert!(!club.engine.is_quarantined(club.ladder_id));
    assert_eq!(club.ranks().await, vec![Some(1), Some(3), Some(2)]);
    club.assert_dense().await;
}

#[tokio::test]
async fn busy_ladder_reports_lock_timeout() {
    let engine = LadderEngine::new(MemoryStore::with_lock_timeout(Duration::from_millis(20)));
    let ladder = engine
        .create_ladder(&NewLadder::new("Club", "fide"))
        .await
        .unwrap();

    let _held = engine.store().begin(ladder.ladder_id).await.unwrap();
    let err = engine.standings(ladder.ladder_id).await.unwrap_err();

    assert!(matches!(err, LadderError::LockTimeout(id) if id == ladder.ladder_id));
}
