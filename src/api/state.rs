use std::sync::Arc;

use crate::recommend::ModelContext;

/// Shared application state
///
/// The model is loaded once before the server starts accepting requests
/// and never written afterwards, so handlers share it through a plain
/// `Arc` with no locking.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelContext>,
    /// How many recommendations each request returns
    pub top_n: usize,
}

impl AppState {
    pub fn new(model: ModelContext, top_n: usize) -> Self {
        Self {
            model: Arc::new(model),
            top_n,
        }
    }
}
