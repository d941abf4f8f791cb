use indexmap::IndexMap;

use rowsink_core::types::{ObjectId, TargetObject};

pub type Batch = IndexMap<ObjectId, TargetObject>;

/// Pending objects of one writer, unique by id.
///
/// A later object with an id already present replaces the earlier one but
/// keeps its position, so submission order is first-insertion order.
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    objects: Batch,
}

impl BatchAccumulator {
    pub fn new() -> Self { Self::default() }

    /// Returns the size after insertion.
    pub fn add(&mut self, object: TargetObject) -> usize {
        self.objects.insert(object.id.clone(), object);
        self.objects.len()
    }

    pub fn len(&self) -> usize { self.objects.len() }

    pub fn is_empty(&self) -> bool { self.objects.is_empty() }

    pub fn contains(&self, id: &str) -> bool { self.objects.contains_key(id) }

    /// Ids in submission order.
    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> { self.objects.keys() }

    /// Current contents in submission order, leaving the accumulator untouched.
    pub fn snapshot(&self) -> Vec<TargetObject> { self.objects.values().cloned().collect() }

    pub fn remove(&mut self, id: &str) -> Option<TargetObject> { self.objects.shift_remove(id) }

    pub fn clear(&mut self) { self.objects.clear(); }

    /// Returns the current contents and leaves the accumulator empty.
    pub fn drain(&mut self) -> Batch { std::mem::take(&mut self.objects) }
}
