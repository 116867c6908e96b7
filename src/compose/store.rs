use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// Shared header → section text map.
///
/// Every write goes through [`ContentStore::update`], which hands the closure
/// the store as it is at the moment of the write. Completions that race each
/// other therefore never overwrite one another's keys. Entries are never
/// removed during a session.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: HashMap<String, String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(snapshot)),
        }
    }

    /// Apply `f` to the latest state under the store lock.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let mut map = self.inner.lock().expect("content store lock poisoned");
        f(&mut map);
    }

    /// Set one header's text, leaving every other key as it currently is.
    pub fn merge(&self, header: impl Into<String>, text: impl Into<String>) {
        let header = header.into();
        let text = text.into();
        self.update(move |map| {
            map.insert(header, text);
        });
    }

    /// Fold a fetched snapshot into the store.
    ///
    /// Keys in `snapshot` overwrite local ones; local keys missing from the
    /// snapshot are kept.
    pub fn merge_all(&self, snapshot: HashMap<String, String>) {
        self.update(move |map| map.extend(snapshot));
    }

    pub fn get(&self, header: &str) -> Option<String> {
        self.inner
            .lock()
            .expect("content store lock poisoned")
            .get(header)
            .cloned()
    }

    pub fn contains(&self, header: &str) -> bool {
        self.inner
            .lock()
            .expect("content store lock poisoned")
            .contains_key(header)
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner
            .lock()
            .expect("content store lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("content store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle that does not keep the store alive.
    pub fn downgrade(&self) -> WeakContentStore {
        WeakContentStore {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Non-owning [`ContentStore`] handle, for work that must not outlive its view.
#[derive(Debug, Clone)]
pub struct WeakContentStore {
    inner: Weak<Mutex<HashMap<String, String>>>,
}

impl WeakContentStore {
    pub fn upgrade(&self) -> Option<ContentStore> {
        self.inner.upgrade().map(|inner| ContentStore { inner })
    }
}
