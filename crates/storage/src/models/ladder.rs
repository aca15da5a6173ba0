use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ladder_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LadderKind {
    #[default]
    Ladder,
    Tournament,
}

/// A competitive pool with its own rating algorithm and rank order.
///
/// `algorithm` names an entry of the [`AlgorithmRegistry`](crate::rating::AlgorithmRegistry)
/// and `algorithm_params` holds that entry's parameters as a JSON object.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Ladder {
    pub ladder_id: Uuid,
    pub name: String,
    pub kind: LadderKind,
    pub description: Option<String>,
    pub location: Option<String>,
    pub algorithm: String,
    #[schema(value_type = Object)]
    pub algorithm_params: Json<serde_json::Value>,
    pub default_initial_rating: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Days without a game before the inactivity penalty applies.
    pub inactivity_period_days: Option<i32>,
    /// Rank places lost per inactivity penalty.
    pub demotion_inc: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Ladder {
    /// Whether a game played at `at` falls inside the ladder's activity window.
    pub fn accepts_games_on(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        let after_start = self.start_date.is_none_or(|start| day >= start);
        let before_end = self.end_date.is_none_or(|end| day <= end);
        after_start && before_end
    }
}

#[derive(Debug, Clone)]
pub struct NewLadder {
    pub name: String,
    pub kind: LadderKind,
    pub description: Option<String>,
    pub location: Option<String>,
    pub algorithm: String,
    pub algorithm_params: serde_json::Value,
    pub default_initial_rating: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub inactivity_period_days: Option<i32>,
    pub demotion_inc: Option<i32>,
}

impl NewLadder {
    pub const DEFAULT_INITIAL_RATING: Decimal = Decimal::from_parts(1200, 0, 0, false, 0);

    /// A plain ladder with the default starting rating and no inactivity policy.
    pub fn new(name: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LadderKind::Ladder,
            description: None,
            location: None,
            algorithm: algorithm.into(),
            algorithm_params: serde_json::Value::Object(Default::default()),
            default_initial_rating: Self::DEFAULT_INITIAL_RATING,
            start_date: None,
            end_date: None,
            inactivity_period_days: None,
            demotion_inc: None,
        }
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.algorithm_params = params;
        self
    }

    pub fn with_inactivity_policy(mut self, period_days: i32, demotion_inc: i32) -> Self {
        self.inactivity_period_days = Some(period_days);
        self.demotion_inc = Some(demotion_inc);
        self
    }

    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }
}
