use std::sync::Arc;

/// Dependency record for an effect keyed on the identity of a shared value.
///
/// `changed` reports true on the first call and whenever the value is a
/// different allocation than last time. Equal contents in a new allocation
/// count as a change.
#[derive(Debug)]
pub struct EffectDeps<T: ?Sized> {
    previous: Option<Option<Arc<T>>>,
}

impl<T: ?Sized> Default for EffectDeps<T> {
    fn default() -> Self {
        Self { previous: None }
    }
}

impl<T: ?Sized> EffectDeps<T> {
    pub fn changed(&mut self, next: Option<&Arc<T>>) -> bool {
        let changed = match &self.previous {
            None => true,
            Some(prev) => match (prev, next) {
                (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
                (None, None) => false,
                _ => true,
            },
        };
        self.previous = Some(next.cloned());
        changed
    }
}
