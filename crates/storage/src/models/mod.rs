pub mod game;
pub mod ladder;
pub mod player;
pub mod ranking;
pub mod rating;

pub use game::{Game, GameResult, NewGame};
pub use ladder::{Ladder, LadderKind, NewLadder};
pub use player::{NewPlayer, Player};
pub use ranking::Ranking;
pub use rating::{NewRating, Rating};
