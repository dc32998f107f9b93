pub mod engine;
pub mod fallback;

pub use engine::{Recommendation, Recommender};
pub use fallback::{recommend_with_fallback, FallbackStage, RecommendationOutcome};

use std::collections::HashMap;

use nalgebra::DMatrix;

use crate::artifacts::ArtifactStore;
use crate::error::{AppError, AppResult};
use crate::models::{IdIndex, Movie};
use crate::pipeline::genres::GenreFeatures;

/// Read-only model state shared by all request handlers
///
/// Loaded once at startup and never mutated afterwards, so handlers can
/// share it without locking.
#[derive(Debug)]
pub struct ModelContext {
    pub user_factors: DMatrix<f64>,
    pub item_components: DMatrix<f64>,
    pub user_index: IdIndex,
    pub movie_index: IdIndex,
    pub genre_features: GenreFeatures,
    pub catalog: Vec<Movie>,
    catalog_by_id: HashMap<u32, usize>,
}

impl ModelContext {
    /// Assembles a context from its parts, validating that the matrices
    /// and id maps agree on their dimensions
    pub fn new(
        user_factors: DMatrix<f64>,
        item_components: DMatrix<f64>,
        user_index: IdIndex,
        movie_index: IdIndex,
        genre_features: GenreFeatures,
        catalog: Vec<Movie>,
    ) -> AppResult<Self> {
        if user_factors.nrows() != user_index.len() {
            return Err(AppError::Data(format!(
                "user factor rows ({}) do not match user map entries ({})",
                user_factors.nrows(),
                user_index.len()
            )));
        }
        if item_components.ncols() != movie_index.len() {
            return Err(AppError::Data(format!(
                "item component columns ({}) do not match movie map entries ({})",
                item_components.ncols(),
                movie_index.len()
            )));
        }
        if user_factors.ncols() != item_components.nrows() {
            return Err(AppError::Data(format!(
                "factor rank mismatch: user side {}, item side {}",
                user_factors.ncols(),
                item_components.nrows()
            )));
        }

        let catalog_by_id = catalog
            .iter()
            .enumerate()
            .map(|(pos, movie)| (movie.movie_id, pos))
            .collect();

        Ok(ModelContext {
            user_factors,
            item_components,
            user_index,
            movie_index,
            genre_features,
            catalog,
            catalog_by_id,
        })
    }

    /// Loads every artifact from the store and assembles the context
    ///
    /// Called once at server startup; any missing or inconsistent
    /// artifact aborts with an error naming the problem.
    pub fn load(store: &ArtifactStore) -> AppResult<Self> {
        let user_factors = store.load_user_factors()?;
        let item_components = store.load_item_components()?;
        let user_index = store.load_user_map()?;
        let movie_index = store.load_movie_map()?;
        let genre_features = store.load_genre_features()?;
        let catalog = store.load_catalog()?;
        let manifest = store.load_manifest()?;

        let context = ModelContext::new(
            user_factors,
            item_components,
            user_index,
            movie_index,
            genre_features,
            catalog,
        )?;

        tracing::info!(
            users = context.user_index.len(),
            rated_movies = context.movie_index.len(),
            catalog_movies = context.catalog.len(),
            rank = context.rank(),
            model_created_at = %manifest.created_at,
            "Model artifacts loaded"
        );
        Ok(context)
    }

    pub fn rank(&self) -> usize {
        self.user_factors.ncols()
    }

    /// Catalog row for a movie id, if the catalog contains it
    pub fn movie_by_id(&self, movie_id: u32) -> Option<&Movie> {
        self.catalog_by_id
            .get(&movie_id)
            .and_then(|&pos| self.catalog.get(pos))
    }
}
