use std::sync::Arc;

use storage::{LadderEngine, PgLadderStore};

pub type Engine = LadderEngine<PgLadderStore>;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
