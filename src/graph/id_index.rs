use std::hash::Hash;

use hashbrown::HashMap;

/// Dense zero-based position of an entity (node, edge, or type) in its table.
pub type Iloc = usize;

/// Returned by [`ExternalIdIndex::to_iloc`] for IDs that are not in the index.
pub const INVALID_ILOC: Iloc = Iloc::MAX;

/// Bidirectional mapping between external IDs and dense ilocs.
///
/// Ilocs are assigned in order of first appearance. Lookups of unknown IDs do
/// not fail; they yield [`INVALID_ILOC`] so that a whole batch can be checked
/// with [`ExternalIdIndex::is_valid`] and reported at once.
#[derive(Debug, Clone)]
pub struct ExternalIdIndex<K> {
    ids: Vec<K>,
    positions: HashMap<K, Iloc>,
}

impl<K> Default for ExternalIdIndex<K> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone> ExternalIdIndex<K> {
    pub fn new<I: IntoIterator<Item = K>>(ids: I) -> Self {
        let mut index = Self::default();
        for id in ids {
            index.insert(id);
        }
        index
    }

    /// Insert `id` if absent, returning its iloc either way.
    pub fn insert(&mut self, id: K) -> Iloc {
        if let Some(&iloc) = self.positions.get(&id) {
            return iloc;
        }
        let iloc = self.ids.len();
        self.positions.insert(id.clone(), iloc);
        self.ids.push(id);
        iloc
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.positions.contains_key(id)
    }

    pub fn get<Q>(&self, id: &Q) -> Option<Iloc>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.positions.get(id).copied()
    }

    /// Vectorised lookup; unknown IDs map to [`INVALID_ILOC`].
    pub fn to_iloc<'a, Q, I>(&self, ids: I) -> Vec<Iloc>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized + 'a,
        I: IntoIterator<Item = &'a Q>,
    {
        ids.into_iter()
            .map(|id| self.get(id).unwrap_or(INVALID_ILOC))
            .collect()
    }

    /// Element-wise validity mask for the output of [`ExternalIdIndex::to_iloc`].
    pub fn is_valid(&self, ilocs: &[Iloc]) -> Vec<bool> {
        ilocs.iter().map(|&iloc| iloc < self.ids.len()).collect()
    }

    pub fn from_iloc(&self, iloc: Iloc) -> Option<&K> {
        self.ids.get(iloc)
    }

    /// Map ilocs back to IDs; `None` for out-of-range ilocs.
    pub fn from_ilocs(&self, ilocs: &[Iloc]) -> Vec<Option<&K>> {
        ilocs.iter().map(|&iloc| self.ids.get(iloc)).collect()
    }

    pub fn ids(&self) -> &[K] {
        &self.ids
    }
}
