//! In-process `StoreClient` that keeps objects in memory.
//!
//! Failures can be scripted: whole-batch failures for the next N calls,
//! per-object validation errors for the next N submissions of an id, and
//! submissions of an id that get no outcome at all. Every call is recorded so
//! tests can assert what was sent.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;

use rowsink_core::traits::StoreClient;
use rowsink_core::types::{BatchFailure, BatchResult, ObjectError, ObjectId, ObjectOutcome, TargetObject};

#[derive(Default)]
struct Inner {
    objects: IndexMap<ObjectId, TargetObject>,
    submissions: Vec<Vec<ObjectId>>,
    batch_failures: Vec<String>,
    rejections: HashMap<ObjectId, (u32, String)>,
    unanswered: HashMap<ObjectId, u32>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> MutexGuard<'_, Inner> { self.inner.lock().unwrap_or_else(PoisonError::into_inner) }

    /// The next `times` calls fail as a whole with `message`.
    pub fn fail_next_batches(&self, times: u32, message: &str) {
        let mut inner = self.lock();
        for _ in 0..times {
            inner.batch_failures.push(message.to_string());
        }
    }

    /// The next `times` submissions of `id` get a validation error.
    pub fn reject(&self, id: &str, times: u32, message: &str) {
        self.lock().rejections.insert(id.to_string(), (times, message.to_string()));
    }

    /// The next `times` submissions of `id` are neither stored nor answered.
    pub fn ignore(&self, id: &str, times: u32) {
        self.lock().unanswered.insert(id.to_string(), times);
    }

    /// Ids sent by each call, in call order.
    pub fn submissions(&self) -> Vec<Vec<ObjectId>> { self.lock().submissions.clone() }

    pub fn objects(&self) -> Vec<TargetObject> { self.lock().objects.values().cloned().collect() }

    pub fn get(&self, id: &str) -> Option<TargetObject> { self.lock().objects.get(id).cloned() }

    pub fn len(&self) -> usize { self.lock().objects.len() }

    pub fn is_empty(&self) -> bool { self.lock().objects.is_empty() }
}

impl StoreClient for MemoryStore {
    fn submit_batch(&self, objects: &[TargetObject]) -> BatchResult {
        let mut inner = self.lock();
        inner.submissions.push(objects.iter().map(|o| o.id.clone()).collect());
        if !inner.batch_failures.is_empty() {
            let message = inner.batch_failures.remove(0);
            return Err(BatchFailure::new(message));
        }

        let mut outcomes = Vec::with_capacity(objects.len());
        for object in objects {
            if let Some(left) = inner.unanswered.get_mut(&object.id) {
                if *left > 0 {
                    *left -= 1;
                    continue;
                }
            }
            if let Some((left, message)) = inner.rejections.get_mut(&object.id) {
                if *left > 0 {
                    *left -= 1;
                    outcomes.push(ObjectOutcome::failed(object.id.clone(), ObjectError::new(message.clone())));
                    continue;
                }
            }
            inner.objects.insert(object.id.clone(), object.clone());
            outcomes.push(ObjectOutcome::ok(object.id.clone()));
        }
        Ok(outcomes)
    }
}
