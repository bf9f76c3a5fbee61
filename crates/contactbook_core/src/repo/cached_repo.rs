//! Read-through contact cache in front of any `ContactRepository`.
//!
//! # Responsibility
//! - Serve repeated get-by-id reads from a bounded LRU.
//! - Invalidate cached entries explicitly on every write to that id.
//!
//! # Invariants
//! - A cached entry is never newer than nor different from the last value
//!   read from the inner repository after the last write to that id.
//! - List and duplicate queries always reach the inner repository.

use crate::model::contact::{Address, Contact, ContactId};
use crate::repo::contact_repo::{ContactListQuery, ContactRepository, RepoResult};
use log::debug;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Bounded, thread-safe contact cache shared across requests.
///
/// A capacity of zero disables caching; every call becomes a no-op.
pub struct ContactCache {
    entries: Option<Mutex<LruCache<ContactId, Contact>>>,
}

impl ContactCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn disabled() -> Self {
        Self { entries: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn get(&self, id: ContactId) -> Option<Contact> {
        self.lock().and_then(|mut entries| entries.get(&id).cloned())
    }

    pub fn put(&self, contact: &Contact) {
        let Some(id) = contact.id else {
            return;
        };
        if let Some(mut entries) = self.lock() {
            entries.put(id, contact.clone());
        }
    }

    pub fn invalidate(&self, id: ContactId) {
        if let Some(mut entries) = self.lock() {
            entries.pop(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Option<MutexGuard<'_, LruCache<ContactId, Contact>>> {
        // Poisoning is ignored: each critical section is a single LRU call.
        self.entries
            .as_ref()
            .map(|entries| entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

/// Repository decorator that consults a `ContactCache` for id lookups.
pub struct CachedContactRepository<'cache, R: ContactRepository> {
    inner: R,
    cache: &'cache ContactCache,
}

impl<'cache, R: ContactRepository> CachedContactRepository<'cache, R> {
    pub fn new(inner: R, cache: &'cache ContactCache) -> Self {
        Self { inner, cache }
    }
}

impl<R: ContactRepository> ContactRepository for CachedContactRepository<'_, R> {
    fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId> {
        self.inner.insert_contact(contact)
    }

    fn update_contact(&self, contact: &Contact) -> RepoResult<()> {
        let result = self.inner.update_contact(contact);
        if let Some(id) = contact.id {
            self.cache.invalidate(id);
        }
        result
    }

    fn update_address(&self, id: ContactId, address: &Address) -> RepoResult<()> {
        let result = self.inner.update_address(id, address);
        self.cache.invalidate(id);
        result
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        if let Some(contact) = self.cache.get(id) {
            debug!("event=contact_cache module=cache status=hit id={id}");
            return Ok(Some(contact));
        }

        let loaded = self.inner.get_contact(id)?;
        if let Some(contact) = loaded.as_ref() {
            self.cache.put(contact);
        }
        Ok(loaded)
    }

    fn contact_exists(&self, id: ContactId) -> RepoResult<bool> {
        if self.cache.get(id).is_some() {
            return Ok(true);
        }
        self.inner.contact_exists(id)
    }

    fn find_duplicate(&self, contact: &Contact) -> RepoResult<Option<ContactId>> {
        self.inner.find_duplicate(contact)
    }

    fn list_contacts(&self, query: &ContactListQuery) -> RepoResult<Vec<Contact>> {
        self.inner.list_contacts(query)
    }

    fn delete_contact(&self, id: ContactId) -> RepoResult<()> {
        let result = self.inner.delete_contact(id);
        self.cache.invalidate(id);
        result
    }

    fn count_contacts(&self) -> RepoResult<u64> {
        self.inner.count_contacts()
    }
}
