pub mod common;
pub mod game;
pub mod ladder;
pub mod member;
pub mod player;

pub use common::{PaginatedResponse, PaginationMeta, PaginationParams};
pub use game::{GameResponse, ReportGameRequest};
pub use ladder::{CreateLadderRequest, LadderResponse};
pub use member::{JoinLadderRequest, RankResponse, RatingResponse};
pub use player::{CreatePlayerRequest, PlayerResponse};
