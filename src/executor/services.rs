//! Collaborator interfaces consumed by the executor
//!
//! The content store is authoritative; the search index only ever hands out
//! ids. Permission checks and read locks are owned by their own services.
//! In-memory implementations are provided for embedding and tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ServiceError;

/// Result type for collaborator calls
pub type ServiceResult<T> = Result<T, ServiceError>;

/// A fully hydrated repository object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentObject {
    pub id: String,
    /// Object type id
    pub type_id: String,
    /// Secondary types applied to this object
    #[serde(default)]
    pub secondary_type_ids: Vec<String>,
    /// Set property values keyed by property id
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl ContentObject {
    pub fn new(id: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            secondary_type_ids: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, property_id: impl Into<String>, value: Value) -> Self {
        self.properties.insert(property_id.into(), value);
        self
    }

    pub fn with_secondary_type(mut self, type_id: impl Into<String>) -> Self {
        self.secondary_type_ids.push(type_id.into());
        self
    }

    /// Value of a set property
    pub fn property(&self, property_id: &str) -> Option<&Value> {
        self.properties.get(property_id)
    }
}

/// The identity a query runs as
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// The principal id followed by its groups
    pub fn authorities(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str()).chain(self.groups.iter().map(String::as_str))
    }
}

/// A read lock on one object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadLock {
    pub object_id: String,
}

/// Authoritative object lookup
pub trait ContentStore: Send + Sync {
    /// Returns the object, or `None` when it does not exist
    fn get_by_id(&self, id: &str) -> ServiceResult<Option<ContentObject>>;
}

/// Access control
pub trait PermissionService: Send + Sync {
    /// Keeps the objects `principal` may read, in input order
    fn filter_readable(
        &self,
        principal: &Principal,
        objects: Vec<ContentObject>,
    ) -> ServiceResult<Vec<ContentObject>>;
}

/// Object locking
pub trait LockService: Send + Sync {
    /// The read locks needed for `objects`
    fn read_locks(&self, objects: &[ContentObject]) -> Vec<ReadLock> {
        objects
            .iter()
            .map(|o| ReadLock {
                object_id: o.id.clone(),
            })
            .collect()
    }

    fn bulk_lock(&self, locks: &[ReadLock]) -> ServiceResult<()>;

    fn bulk_unlock(&self, locks: &[ReadLock]) -> ServiceResult<()>;
}

/// Content store backed by a map
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    objects: RwLock<HashMap<String, ContentObject>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, object: ContentObject) {
        self.objects.write().insert(object.id.clone(), object);
    }

    pub fn remove(&self, id: &str) -> Option<ContentObject> {
        self.objects.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ContentStore for MemoryContentStore {
    fn get_by_id(&self, id: &str) -> ServiceResult<Option<ContentObject>> {
        Ok(self.objects.read().get(id).cloned())
    }
}

/// Lets every principal read everything
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl PermissionService for AllowAll {
    fn filter_readable(
        &self,
        _principal: &Principal,
        objects: Vec<ContentObject>,
    ) -> ServiceResult<Vec<ContentObject>> {
        Ok(objects)
    }
}

/// Per-object read grants to principals or groups; objects without grants are unreadable
#[derive(Debug, Default)]
pub struct AclPermissionService {
    grants: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl AclPermissionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `authority` (principal id or group) read `object_id`
    pub fn grant(&self, object_id: impl Into<String>, authority: impl Into<String>) {
        self.grants
            .write()
            .entry(object_id.into())
            .or_default()
            .insert(authority.into());
    }

    pub fn can_read(&self, principal: &Principal, object_id: &str) -> bool {
        self.grants
            .read()
            .get(object_id)
            .map(|granted| principal.authorities().any(|a| granted.contains(a)))
            .unwrap_or(false)
    }
}

impl PermissionService for AclPermissionService {
    fn filter_readable(
        &self,
        principal: &Principal,
        objects: Vec<ContentObject>,
    ) -> ServiceResult<Vec<ContentObject>> {
        Ok(objects
            .into_iter()
            .filter(|o| self.can_read(principal, &o.id))
            .collect())
    }
}

/// Shared read locks counted per object
#[derive(Debug, Default)]
pub struct MemoryLockService {
    held: Mutex<HashMap<String, usize>>,
}

impl MemoryLockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read locks currently held on `object_id`
    pub fn holders(&self, object_id: &str) -> usize {
        self.held.lock().get(object_id).copied().unwrap_or(0)
    }

    /// Read locks currently held across all objects
    pub fn total_held(&self) -> usize {
        self.held.lock().values().sum()
    }
}

impl LockService for MemoryLockService {
    fn bulk_lock(&self, locks: &[ReadLock]) -> ServiceResult<()> {
        let mut held = self.held.lock();
        for lock in locks {
            *held.entry(lock.object_id.clone()).or_insert(0) += 1;
        }
        Ok(())
    }

    fn bulk_unlock(&self, locks: &[ReadLock]) -> ServiceResult<()> {
        let mut held = self.held.lock();
        for lock in locks {
            match held.get_mut(&lock.object_id) {
                Some(count) if *count > 1 => *count -= 1,
                Some(_) => {
                    held.remove(&lock.object_id);
                }
                None => {
                    return Err(ServiceError::new(
                        "locks",
                        format!("object {} is not locked", lock.object_id),
                    ))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_lookup() {
        let store = MemoryContentStore::new();
        store.insert(ContentObject::new("d1", "cmis:document").with_property("cmis:name", json!("a")));

        let found = store.get_by_id("d1").unwrap().unwrap();
        assert_eq!(found.property("cmis:name"), Some(&json!("a")));
        assert!(store.get_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_acl_grants_by_group() {
        let acl = AclPermissionService::new();
        acl.grant("d1", "editors");
        acl.grant("d2", "alice");

        let bob = Principal::new("bob").with_group("editors");
        let readable = acl
            .filter_readable(
                &bob,
                vec![
                    ContentObject::new("d1", "cmis:document"),
                    ContentObject::new("d2", "cmis:document"),
                    ContentObject::new("d3", "cmis:document"),
                ],
            )
            .unwrap();
        let ids: Vec<_> = readable.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["d1"]);
    }

    #[test]
    fn test_lock_counting() {
        let locks = MemoryLockService::new();
        let objects = vec![ContentObject::new("d1", "cmis:document")];
        let handles = locks.read_locks(&objects);

        locks.bulk_lock(&handles).unwrap();
        locks.bulk_lock(&handles).unwrap();
        assert_eq!(locks.holders("d1"), 2);

        locks.bulk_unlock(&handles).unwrap();
        locks.bulk_unlock(&handles).unwrap();
        assert_eq!(locks.total_held(), 0);
        assert!(locks.bulk_unlock(&handles).is_err());
    }

    #[test]
    fn test_content_object_deserializes_with_defaults() {
        let object: ContentObject =
            serde_json::from_value(json!({"id": "d1", "type_id": "cmis:document"})).unwrap();
        assert!(object.properties.is_empty());
        assert!(object.secondary_type_ids.is_empty());
    }
}
