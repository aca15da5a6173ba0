use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Rating;

/// Request payload for joining a ladder
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct JoinLadderRequest {
    pub player_id: Uuid,

    /// Starting rating; the ladder default when omitted
    #[validate(custom(function = "validate_rating"))]
    pub initial_rating: Option<Decimal>,
}

/// Rank of a member after a rank mutation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RankResponse {
    pub player_id: Uuid,
    pub ladder_id: Uuid,
    pub rank: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatingResponse {
    pub rating: Decimal,
    pub int_rating: i64,
    pub rated_at: DateTime<Utc>,
    pub game_id: Option<Uuid>,
}

pub(crate) fn validate_rating(rating: &Decimal) -> Result<(), validator::ValidationError> {
    if rating.is_sign_negative() {
        return Err(validator::ValidationError::new("negative_rating"));
    }
    if *rating > crate::rating::MAX_RATING {
        return Err(validator::ValidationError::new("rating_too_large"));
    }
    Ok(())
}

impl From<Rating> for RatingResponse {
    fn from(rating: Rating) -> Self {
        Self {
            int_rating: rating.int_rating(),
            rating: rating.rating,
            rated_at: rating.rated_at,
            game_id: rating.game_id,
        }
    }
}
