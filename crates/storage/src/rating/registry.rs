use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use rust_decimal::Decimal;

use super::{
    FideLike, FideParams, FixedIncrement, FixedIncrementParams, MAX_ADJUSTMENT, RatingAlgorithm,
};
use crate::error::{LadderError, LadderResult};

/// Builds a configured algorithm from a ladder's stored parameters.
pub type AlgorithmBuilder = fn(&serde_json::Value) -> LadderResult<Arc<dyn RatingAlgorithm>>;

/// Closed table of rating algorithms keyed by the name stored on a ladder.
#[derive(Clone)]
pub struct AlgorithmRegistry {
    builders: BTreeMap<&'static str, AlgorithmBuilder>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(FideLike::NAME, build_fide);
        registry.register(FixedIncrement::NAME, build_fixed_increment);
        registry
    }
}

impl AlgorithmRegistry {
    pub fn empty() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, builder: AlgorithmBuilder) {
        self.builders.insert(name, builder);
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builders.keys().copied()
    }

    pub fn resolve(
        &self,
        name: &str,
        params: &serde_json::Value,
    ) -> LadderResult<Arc<dyn RatingAlgorithm>> {
        let builder = self.builders.get(name).ok_or_else(|| {
            LadderError::invalid_state(format!("unknown rating algorithm '{name}'"))
        })?;
        builder(params)
    }
}

fn parse_params<P: DeserializeOwned + Default>(
    algorithm: &str,
    params: &serde_json::Value,
) -> LadderResult<P> {
    if params.is_null() {
        return Ok(P::default());
    }
    P::deserialize(params).map_err(|e| {
        LadderError::validation(format!("invalid parameters for '{algorithm}': {e}"))
    })
}

fn check_adjustment(field: &str, value: Decimal) -> LadderResult<()> {
    if value.is_sign_negative() || value > MAX_ADJUSTMENT {
        return Err(LadderError::validation(format!(
            "{field} must be between 0 and {MAX_ADJUSTMENT}"
        )));
    }
    Ok(())
}

fn build_fide(params: &serde_json::Value) -> LadderResult<Arc<dyn RatingAlgorithm>> {
    let params: FideParams = parse_params(FideLike::NAME, params)?;
    check_adjustment("provisional_k", params.provisional_k)?;
    check_adjustment("standard_k", params.standard_k)?;
    Ok(Arc::new(FideLike::new(params)))
}

fn build_fixed_increment(params: &serde_json::Value) -> LadderResult<Arc<dyn RatingAlgorithm>> {
    let params: FixedIncrementParams = parse_params(FixedIncrement::NAME, params)?;
    check_adjustment("step", params.step)?;
    check_adjustment("draw_step", params.draw_step)?;
    Ok(Arc::new(FixedIncrement::new(params)))
}
