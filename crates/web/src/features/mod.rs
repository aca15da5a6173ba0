pub mod games;
pub mod ladders;
pub mod members;
pub mod players;
