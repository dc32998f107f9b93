use std::collections::HashMap;

use crate::error::{AppError, AppResult};

/// Bidirectional mapping between raw ids and dense matrix indices
///
/// The factorizer assigns indices in first-occurrence order over the
/// ratings file; the server needs both directions (raw id to matrix row
/// for lookups, matrix row back to raw id when joining scores with the
/// catalog). Keeping both in one type prevents the two maps from
/// drifting apart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdIndex {
    forward: HashMap<u32, usize>,
    reverse: Vec<u32>,
}

impl IdIndex {
    /// Builds an index assigning positions in first-occurrence order,
    /// ignoring repeats
    pub fn from_first_occurrence<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let mut index = IdIndex::default();
        for id in ids {
            if !index.forward.contains_key(&id) {
                index.forward.insert(id, index.reverse.len());
                index.reverse.push(id);
            }
        }
        index
    }

    /// Rebuilds an index from persisted (id, position) pairs
    ///
    /// Positions must form a contiguous 0..n range with no duplicate ids;
    /// anything else means the artifact is corrupt.
    pub fn from_pairs(pairs: Vec<(u32, usize)>) -> AppResult<Self> {
        let n = pairs.len();
        let mut forward = HashMap::with_capacity(n);
        let mut reverse = vec![None; n];
        for (id, pos) in pairs {
            if pos >= n {
                return Err(AppError::Data(format!(
                    "index map position {} out of range for {} entries",
                    pos, n
                )));
            }
            if forward.insert(id, pos).is_some() {
                return Err(AppError::Data(format!("duplicate id {} in index map", id)));
            }
            if reverse[pos].replace(id).is_some() {
                return Err(AppError::Data(format!(
                    "duplicate position {} in index map",
                    pos
                )));
            }
        }
        let reverse = reverse
            .into_iter()
            .collect::<Option<Vec<u32>>>()
            .ok_or_else(|| AppError::Data("index map positions are not contiguous".to_string()))?;
        Ok(IdIndex { forward, reverse })
    }

    /// Looks up the matrix index for a raw id
    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.forward.get(&id).copied()
    }

    /// Looks up the raw id stored at a matrix index
    pub fn id_at(&self, index: usize) -> Option<u32> {
        self.reverse.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// Iterates (id, position) pairs in position order
    pub fn iter(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.reverse.iter().enumerate().map(|(pos, id)| (*id, pos))
    }
}
