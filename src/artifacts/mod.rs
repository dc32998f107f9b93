pub mod factors;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{IdIndex, Movie};
use crate::pipeline::genres::GenreFeatures;
use crate::pipeline::svd::LatentFactors;

use factors::FactorMatrix;

pub const USER_FACTORS_FILE: &str = "user_factors.bin";
pub const ITEM_COMPONENTS_FILE: &str = "item_components.bin";
pub const USER_MAP_FILE: &str = "user_map.csv";
pub const MOVIE_MAP_FILE: &str = "movie_map.csv";
pub const GENRE_FEATURES_FILE: &str = "genre_features.csv";
pub const CATALOG_FILE: &str = "movies.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Run metadata written next to the model artifacts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub created_at: DateTime<Utc>,
    pub rank: usize,
    pub n_users: usize,
    pub n_rated_movies: usize,
    pub n_catalog_movies: usize,
    pub vocabulary_size: usize,
    pub seed: u64,
}

/// One row of a persisted id map table
#[derive(Debug, Serialize, Deserialize)]
struct MapRow {
    id: u32,
    index: usize,
}

/// Reads and writes the model artifact directory
///
/// The factorizer writes all seven files in one `save` call, overwriting
/// previous runs. The server reads them back at startup; a missing file
/// is reported by name so a half-finished or absent model directory is
/// obvious.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArtifactStore { dir: dir.into() }
    }

    /// Persists a complete model run
    pub fn save(
        &self,
        factors: &LatentFactors,
        users: &IdIndex,
        movies: &IdIndex,
        features: &GenreFeatures,
        catalog: &[Movie],
        manifest: &Manifest,
    ) -> AppResult<()> {
        fs::create_dir_all(&self.dir)?;
        self.write_factor_matrix(USER_FACTORS_FILE, &factors.user_factors)?;
        self.write_factor_matrix(ITEM_COMPONENTS_FILE, &factors.item_components)?;
        self.write_id_map(USER_MAP_FILE, users)?;
        self.write_id_map(MOVIE_MAP_FILE, movies)?;
        self.write_genre_features(features)?;
        self.write_catalog(catalog)?;
        self.write_manifest(manifest)?;
        Ok(())
    }

    pub fn load_user_factors(&self) -> AppResult<DMatrix<f64>> {
        self.read_factor_matrix(USER_FACTORS_FILE)
    }

    pub fn load_item_components(&self) -> AppResult<DMatrix<f64>> {
        self.read_factor_matrix(ITEM_COMPONENTS_FILE)
    }

    pub fn load_user_map(&self) -> AppResult<IdIndex> {
        self.read_id_map(USER_MAP_FILE)
    }

    pub fn load_movie_map(&self) -> AppResult<IdIndex> {
        self.read_id_map(MOVIE_MAP_FILE)
    }

    pub fn load_genre_features(&self) -> AppResult<GenreFeatures> {
        let path = self.existing(GENRE_FEATURES_FILE)?;
        let mut reader = csv::Reader::from_path(&path)?;
        let headers = reader.headers()?.clone();
        let vocabulary: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut movie_ids = Vec::new();
        let mut counts = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut fields = record.iter();
            let id_field = fields.next().ok_or_else(|| {
                AppError::Data("empty row in genre feature table".to_string())
            })?;
            movie_ids.push(parse_field::<u32>(id_field, &path)?);
            for field in fields {
                counts.push(parse_field::<u32>(field, &path)?);
            }
        }
        GenreFeatures::from_parts(vocabulary, movie_ids, counts)
    }

    pub fn load_catalog(&self) -> AppResult<Vec<Movie>> {
        let path = self.existing(CATALOG_FILE)?;
        let mut reader = csv::Reader::from_path(&path)?;
        let movies: Vec<Movie> = reader.deserialize().collect::<Result<_, _>>()?;
        Ok(movies)
    }

    pub fn load_manifest(&self) -> AppResult<Manifest> {
        let path = self.existing(MANIFEST_FILE)?;
        let reader = BufReader::new(File::open(path)?);
        let manifest = serde_json::from_reader(reader)?;
        Ok(manifest)
    }

    fn write_factor_matrix(&self, name: &str, matrix: &DMatrix<f64>) -> AppResult<()> {
        let path = self.dir.join(name);
        let writer = BufWriter::new(File::create(&path)?);
        bincode::serialize_into(writer, &FactorMatrix::from_matrix(matrix))?;
        tracing::debug!(path = %path.display(), "Artifact written");
        Ok(())
    }

    fn read_factor_matrix(&self, name: &str) -> AppResult<DMatrix<f64>> {
        let path = self.existing(name)?;
        let reader = BufReader::new(File::open(path)?);
        let stored: FactorMatrix = bincode::deserialize_from(reader)?;
        stored.into_matrix()
    }

    fn write_id_map(&self, name: &str, index: &IdIndex) -> AppResult<()> {
        let path = self.dir.join(name);
        let mut writer = csv::Writer::from_path(&path)?;
        for (id, position) in index.iter() {
            writer.serialize(MapRow {
                id,
                index: position,
            })?;
        }
        writer.flush()?;
        tracing::debug!(path = %path.display(), entries = index.len(), "Artifact written");
        Ok(())
    }

    fn read_id_map(&self, name: &str) -> AppResult<IdIndex> {
        let path = self.existing(name)?;
        let mut reader = csv::Reader::from_path(&path)?;
        let mut pairs = Vec::new();
        for row in reader.deserialize() {
            let row: MapRow = row?;
            pairs.push((row.id, row.index));
        }
        IdIndex::from_pairs(pairs)
    }

    fn write_genre_features(&self, features: &GenreFeatures) -> AppResult<()> {
        let path = self.dir.join(GENRE_FEATURES_FILE);
        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = Vec::with_capacity(features.vocabulary().len() + 1);
        header.push("movieId".to_string());
        header.extend(features.vocabulary().iter().cloned());
        writer.write_record(&header)?;

        for (row, movie_id) in features.movie_ids().iter().enumerate() {
            let mut record = Vec::with_capacity(header.len());
            record.push(movie_id.to_string());
            record.extend(features.counts_row(row).iter().map(u32::to_string));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        tracing::debug!(path = %path.display(), rows = features.n_movies(), "Artifact written");
        Ok(())
    }

    fn write_catalog(&self, catalog: &[Movie]) -> AppResult<()> {
        let path = self.dir.join(CATALOG_FILE);
        let mut writer = csv::Writer::from_path(&path)?;
        for movie in catalog {
            writer.serialize(movie)?;
        }
        writer.flush()?;
        tracing::debug!(path = %path.display(), rows = catalog.len(), "Artifact written");
        Ok(())
    }

    fn write_manifest(&self, manifest: &Manifest) -> AppResult<()> {
        let path = self.dir.join(MANIFEST_FILE);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, manifest)?;
        writer.flush()?;
        tracing::debug!(path = %path.display(), "Artifact written");
        Ok(())
    }

    /// Resolves an artifact path, failing with the file name if absent
    fn existing(&self, name: &str) -> AppResult<PathBuf> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Err(AppError::MissingArtifact(path));
        }
        Ok(path)
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, path: &Path) -> AppResult<T> {
    field.parse::<T>().map_err(|_| {
        AppError::Data(format!(
            "unparseable value {:?} in {}",
            field,
            path.display()
        ))
    })
}
