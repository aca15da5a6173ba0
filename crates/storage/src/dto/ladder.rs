use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{LadderKind, NewLadder};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LadderResponse {
    pub ladder_id: Uuid,
    pub name: String,
    pub kind: LadderKind,
    pub description: Option<String>,
    pub location: Option<String>,
    pub algorithm: String,
    #[schema(value_type = Object)]
    pub algorithm_params: serde_json::Value,
    pub default_initial_rating: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub inactivity_period_days: Option<i32>,
    pub demotion_inc: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a ladder
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateLadderRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Ladder name must be between 1 and 255 characters"
    ))]
    pub name: String,

    #[serde(default)]
    pub kind: LadderKind,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Algorithm name is required"))]
    pub algorithm: String,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub algorithm_params: serde_json::Value,

    #[validate(custom(function = "crate::dto::member::validate_rating"))]
    pub default_initial_rating: Option<Decimal>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    #[validate(range(min = 1, message = "Inactivity period must be at least one day"))]
    pub inactivity_period_days: Option<i32>,

    #[validate(range(min = 1, message = "Demotion increment must be at least one place"))]
    pub demotion_inc: Option<i32>,
}

impl CreateLadderRequest {
    pub fn validate_dates(&self) -> Result<(), &'static str> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            return Err("start_date must not be after end_date");
        }
        Ok(())
    }
}

impl From<CreateLadderRequest> for NewLadder {
    fn from(request: CreateLadderRequest) -> Self {
        let mut ladder = NewLadder::new(request.name, request.algorithm)
            .with_params(request.algorithm_params)
            .with_window(request.start_date, request.end_date);
        ladder.kind = request.kind;
        ladder.description = request.description;
        ladder.location = request.location;
        ladder.inactivity_period_days = request.inactivity_period_days;
        ladder.demotion_inc = request.demotion_inc;
        if let Some(rating) = request.default_initial_rating {
            ladder.default_initial_rating = rating;
        }
        ladder
    }
}

impl From<crate::models::Ladder> for LadderResponse {
    fn from(ladder: crate::models::Ladder) -> Self {
        Self {
            ladder_id: ladder.ladder_id,
            name: ladder.name,
            kind: ladder.kind,
            description: ladder.description,
            location: ladder.location,
            algorithm: ladder.algorithm,
            algorithm_params: ladder.algorithm_params.0,
            default_initial_rating: ladder.default_initial_rating,
            start_date: ladder.start_date,
            end_date: ladder.end_date,
            inactivity_period_days: ladder.inactivity_period_days,
            demotion_inc: ladder.demotion_inc,
            created_at: ladder.created_at,
        }
    }
}
