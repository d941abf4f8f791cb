use crate::types::{BatchResult, TargetObject};

/// Blocking client for the target object store.
///
/// `submit_batch` sends all objects in one call. A store-level failure is an
/// `Err(BatchFailure)`; otherwise one outcome is returned per submitted id.
pub trait StoreClient: Send + Sync {
    fn submit_batch(&self, objects: &[TargetObject]) -> BatchResult;
}

impl<S: StoreClient + ?Sized> StoreClient for &S {
    fn submit_batch(&self, objects: &[TargetObject]) -> BatchResult { (**self).submit_batch(objects) }
}

impl<S: StoreClient + ?Sized> StoreClient for Box<S> {
    fn submit_batch(&self, objects: &[TargetObject]) -> BatchResult { (**self).submit_batch(objects) }
}
