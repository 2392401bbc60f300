//! Handle-based surface over indexes and frequency maps.
//!
//! A [`CoreService`] owns every index and frequency map it creates. Callers
//! hold move-only handles; destroying a handle consumes it, so a handle
//! cannot be destroyed twice. The scoped guards destroy on drop, which
//! covers early returns and `?` paths. Variable-length results come back as
//! [`OwnedArray`] values that free themselves; bulk inputs are borrowed
//! slices copied during the call.
//!
//! The service takes `&mut self` everywhere and has no internal locking. Share
//! it across threads only behind external synchronization.

use crate::error::{Result, SearchError};
use crate::frequency::{FrequencyMap, FrequencyRecord};
use crate::index::{IndexBuilder, InvertedIndex};
use crate::query::{to_postfix, to_postfix_bytes, Token};
use crate::tokenizer::{Identity, Normalizer};
use crate::{persist, DocId, Evaluator};
use std::fmt;
use std::ops::Deref;
use std::path::Path;
use std::sync::{Arc, Weak};

/// Immutable, self-freeing buffer returned across the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedArray<T>(Box<[T]>);

pub type IdArray = OwnedArray<DocId>;
pub type FreqArray = OwnedArray<FreqPair>;
pub type RecordArray = OwnedArray<FrequencyRecord>;

impl<T> OwnedArray<T> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.0.into_vec()
    }
}

impl<T> From<Vec<T>> for OwnedArray<T> {
    fn from(v: Vec<T>) -> Self {
        Self(v.into_boxed_slice())
    }
}

impl<T> Deref for OwnedArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> IntoIterator for OwnedArray<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl<'a, T> IntoIterator for &'a OwnedArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreqPair {
    pub stem: String,
    pub frequency: u64,
}

struct ServiceToken;

struct RawHandle {
    owner: Weak<ServiceToken>,
    slot: usize,
    generation: u32,
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.slot, self.generation)
    }
}

/// Opaque reference to an index owned by a [`CoreService`].
#[derive(Debug)]
pub struct IndexHandle(RawHandle);

/// Opaque reference to a frequency map owned by a [`CoreService`].
#[derive(Debug)]
pub struct FreqMapHandle(RawHandle);

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena with generation checks; freed slots are reused under a new
/// generation so stale handles never alias a live value.
struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Self { slots: Vec::new(), free: Vec::new() }
    }

    fn insert(&mut self, value: T) -> (usize, u32) {
        if let Some(slot) = self.free.pop() {
            let s = &mut self.slots[slot];
            s.value = Some(value);
            (slot, s.generation)
        } else {
            self.slots.push(Slot { generation: 0, value: Some(value) });
            (self.slots.len() - 1, 0)
        }
    }

    fn get_mut(&mut self, slot: usize, generation: u32) -> Option<&mut T> {
        self.slots
            .get_mut(slot)
            .filter(|s| s.generation == generation)
            .and_then(|s| s.value.as_mut())
    }

    fn remove(&mut self, slot: usize, generation: u32) -> Option<T> {
        let s = self.slots.get_mut(slot).filter(|s| s.generation == generation)?;
        let value = s.value.take()?;
        s.generation = s.generation.wrapping_add(1);
        self.free.push(slot);
        Some(value)
    }

    fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

enum IndexState {
    Building(IndexBuilder),
    Sealed(InvertedIndex),
}

/// Explicitly constructed owner of every handle-addressed resource.
pub struct CoreService {
    token: Arc<ServiceToken>,
    indexes: Arena<IndexState>,
    freq_maps: Arena<FrequencyMap>,
    normalizer: Box<dyn Normalizer>,
}

impl Default for CoreService {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreService {
    /// Service whose queries look operands up verbatim.
    pub fn new() -> Self {
        Self::with_normalizer(Box::new(Identity))
    }

    /// Service that runs every query operand through `normalizer` first.
    pub fn with_normalizer(normalizer: Box<dyn Normalizer>) -> Self {
        Self { token: Arc::new(ServiceToken), indexes: Arena::new(), freq_maps: Arena::new(), normalizer }
    }

    pub fn live_indexes(&self) -> usize {
        self.indexes.live()
    }

    pub fn live_freq_maps(&self) -> usize {
        self.freq_maps.live()
    }

    fn mint(&self, (slot, generation): (usize, u32)) -> RawHandle {
        RawHandle { owner: Arc::downgrade(&self.token), slot, generation }
    }

    fn owns(&self, raw: &RawHandle) -> Result<()> {
        if std::ptr::eq(raw.owner.as_ptr(), Arc::as_ptr(&self.token)) {
            Ok(())
        } else {
            Err(SearchError::ResourceLifecycle(format!("handle {raw:?} was issued by a different service")))
        }
    }

    fn index_state(&mut self, h: &IndexHandle) -> Result<&mut IndexState> {
        self.owns(&h.0)?;
        self.indexes
            .get_mut(h.0.slot, h.0.generation)
            .ok_or_else(|| SearchError::ResourceLifecycle(format!("index handle {:?} is no longer live", h.0)))
    }

    fn freq_map(&mut self, h: &FreqMapHandle) -> Result<&mut FrequencyMap> {
        self.owns(&h.0)?;
        self.freq_maps
            .get_mut(h.0.slot, h.0.generation)
            .ok_or_else(|| SearchError::ResourceLifecycle(format!("frequency map handle {:?} is no longer live", h.0)))
    }

    // --- indexes ---

    pub fn create_index(&mut self) -> IndexHandle {
        let slot = self.indexes.insert(IndexState::Building(IndexBuilder::new()));
        let raw = self.mint(slot);
        tracing::debug!(handle = ?raw, "index created");
        IndexHandle(raw)
    }

    /// Loads a persisted index; the result is sealed.
    pub fn load_index<P: AsRef<Path>>(&mut self, path: P) -> Result<IndexHandle> {
        let index = persist::load_index(path)?;
        let slot = self.indexes.insert(IndexState::Sealed(index));
        let raw = self.mint(slot);
        tracing::debug!(handle = ?raw, "index loaded into service");
        Ok(IndexHandle(raw))
    }

    /// Adds one document's stems. `stems` is only read during the call.
    pub fn add_document<S: AsRef<str>>(&mut self, h: &IndexHandle, doc_id: DocId, stems: &[S]) -> Result<()> {
        match self.index_state(h)? {
            IndexState::Building(builder) => {
                builder.add_document(doc_id, stems);
                Ok(())
            }
            IndexState::Sealed(_) => Err(SearchError::ResourceLifecycle(
                "index is sealed; rebuild it instead of adding documents".into(),
            )),
        }
    }

    /// Finishes the build. Idempotent.
    pub fn seal_index(&mut self, h: &IndexHandle) -> Result<&InvertedIndex> {
        let state = self.index_state(h)?;
        if let IndexState::Building(builder) = state {
            let builder = std::mem::take(builder);
            *state = IndexState::Sealed(builder.finish());
        }
        match state {
            IndexState::Sealed(index) => Ok(&*index),
            IndexState::Building(_) => Err(SearchError::ResourceLifecycle("index failed to seal".into())),
        }
    }

    pub fn save_index<P: AsRef<Path>>(&mut self, h: &IndexHandle, path: P) -> Result<()> {
        let index = self.seal_index(h)?;
        persist::save_index(index, path)
    }

    pub fn search_index(&mut self, h: &IndexHandle, query: &str) -> Result<IdArray> {
        let postfix = to_postfix(query)?;
        self.run(h, &postfix)
    }

    pub fn search_index_bytes(&mut self, h: &IndexHandle, query: &[u8]) -> Result<IdArray> {
        let postfix = to_postfix_bytes(query)?;
        self.run(h, &postfix)
    }

    fn run(&mut self, h: &IndexHandle, postfix: &[Token]) -> Result<IdArray> {
        self.seal_index(h)?;
        let Some(IndexState::Sealed(index)) = self.indexes.get_mut(h.0.slot, h.0.generation) else {
            return Err(SearchError::ResourceLifecycle(format!("index handle {:?} is no longer live", h.0)));
        };
        let ids = Evaluator::new(index, self.normalizer.as_ref()).evaluate(postfix)?;
        Ok(IdArray::from(ids))
    }

    /// Releases the index. Consumes the handle.
    pub fn destroy_index(&mut self, h: IndexHandle) -> Result<()> {
        self.owns(&h.0)?;
        self.indexes
            .remove(h.0.slot, h.0.generation)
            .map(|_| tracing::debug!(handle = ?h.0, "index destroyed"))
            .ok_or_else(|| SearchError::ResourceLifecycle(format!("index handle {:?} was already released", h.0)))
    }

    pub fn scoped_index(&mut self) -> ScopedIndex<'_> {
        let handle = self.create_index();
        ScopedIndex { service: self, handle: Some(handle) }
    }

    pub fn scoped_loaded_index<P: AsRef<Path>>(&mut self, path: P) -> Result<ScopedIndex<'_>> {
        let handle = self.load_index(path)?;
        Ok(ScopedIndex { service: self, handle: Some(handle) })
    }

    // --- frequency maps ---

    pub fn create_freq_map(&mut self) -> FreqMapHandle {
        let slot = self.freq_maps.insert(FrequencyMap::new());
        let raw = self.mint(slot);
        tracing::debug!(handle = ?raw, "frequency map created");
        FreqMapHandle(raw)
    }

    pub fn add_stems<S: AsRef<str>>(&mut self, h: &FreqMapHandle, stems: &[S]) -> Result<()> {
        self.freq_map(h)?.add(stems);
        Ok(())
    }

    /// (stem, frequency) pairs, frequency descending, ties by stem.
    pub fn freq_map_as_array(&mut self, h: &FreqMapHandle) -> Result<FreqArray> {
        let pairs = self.freq_map(h)?.snapshot();
        Ok(pairs.into_iter().map(|(stem, frequency)| FreqPair { stem, frequency }).collect::<Vec<_>>().into())
    }

    pub fn ranked_records(&mut self, h: &FreqMapHandle) -> Result<RecordArray> {
        Ok(self.freq_map(h)?.ranked().into())
    }

    pub fn destroy_freq_map(&mut self, h: FreqMapHandle) -> Result<()> {
        self.owns(&h.0)?;
        self.freq_maps
            .remove(h.0.slot, h.0.generation)
            .map(|_| tracing::debug!(handle = ?h.0, "frequency map destroyed"))
            .ok_or_else(|| SearchError::ResourceLifecycle(format!("frequency map handle {:?} was already released", h.0)))
    }

    pub fn scoped_freq_map(&mut self) -> ScopedFreqMap<'_> {
        let handle = self.create_freq_map();
        ScopedFreqMap { service: self, handle: Some(handle) }
    }
}

/// Index handle that is destroyed when the guard goes out of scope.
pub struct ScopedIndex<'s> {
    service: &'s mut CoreService,
    handle: Option<IndexHandle>,
}

impl ScopedIndex<'_> {
    fn parts(&mut self) -> Result<(&mut CoreService, &IndexHandle)> {
        match self.handle.as_ref() {
            Some(h) => Ok((&mut *self.service, h)),
            None => Err(SearchError::ResourceLifecycle("scoped index already released".into())),
        }
    }

    pub fn add_document<S: AsRef<str>>(&mut self, doc_id: DocId, stems: &[S]) -> Result<()> {
        let (svc, h) = self.parts()?;
        svc.add_document(h, doc_id, stems)
    }

    pub fn seal(&mut self) -> Result<&InvertedIndex> {
        let (svc, h) = self.parts()?;
        svc.seal_index(h)
    }

    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let (svc, h) = self.parts()?;
        svc.save_index(h, path)
    }

    pub fn search(&mut self, query: &str) -> Result<IdArray> {
        let (svc, h) = self.parts()?;
        svc.search_index(h, query)
    }

    pub fn search_bytes(&mut self, query: &[u8]) -> Result<IdArray> {
        let (svc, h) = self.parts()?;
        svc.search_index_bytes(h, query)
    }
}

impl Drop for ScopedIndex<'_> {
    fn drop(&mut self) {
        if let Some(h) = self.handle.take() {
            if let Err(e) = self.service.destroy_index(h) {
                tracing::warn!(error = %e, "failed to release scoped index");
            }
        }
    }
}

/// Frequency-map handle that is destroyed when the guard goes out of scope.
pub struct ScopedFreqMap<'s> {
    service: &'s mut CoreService,
    handle: Option<FreqMapHandle>,
}

impl ScopedFreqMap<'_> {
    fn parts(&mut self) -> Result<(&mut CoreService, &FreqMapHandle)> {
        match self.handle.as_ref() {
            Some(h) => Ok((&mut *self.service, h)),
            None => Err(SearchError::ResourceLifecycle("scoped frequency map already released".into())),
        }
    }

    pub fn add_stems<S: AsRef<str>>(&mut self, stems: &[S]) -> Result<()> {
        let (svc, h) = self.parts()?;
        svc.add_stems(h, stems)
    }

    pub fn as_array(&mut self) -> Result<FreqArray> {
        let (svc, h) = self.parts()?;
        svc.freq_map_as_array(h)
    }

    pub fn ranked(&mut self) -> Result<RecordArray> {
        let (svc, h) = self.parts()?;
        svc.ranked_records(h)
    }
}

impl Drop for ScopedFreqMap<'_> {
    fn drop(&mut self) {
        if let Some(h) = self.handle.take() {
            if let Err(e) = self.service.destroy_freq_map(h) {
                tracing::warn!(error = %e, "failed to release scoped frequency map");
            }
        }
    }
}
