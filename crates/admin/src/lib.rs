pub mod error;
pub mod sweep;

pub use error::{AdminError, Result};
pub use sweep::{SweepEntry, SweepOptions, SweepReport, sweep_inactive};
