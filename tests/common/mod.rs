//! Shared fixtures for the integration tests
//!
//! A small repository: one custom document type, one secondary type, an
//! in-memory index and content store kept in step, ACL permissions and
//! counted read locks.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cmis_query::executor::{
    AclPermissionService, ContentObject, ContentStore, LockService, MemoryContentStore,
    MemoryLockService, PermissionService, Principal, ReadLock, ServiceError, ServiceResult,
};
use cmis_query::index::fields::{BASE_TYPE_FIELD, FULLTEXT_FIELD, PARENT_FIELD, TYPE_FIELD};
use cmis_query::index::{IndexValue, IndexedDocument, MemoryIndex, SearchIndex};
use cmis_query::query::{
    ColumnReference, ColumnToken, ParseError, ParseResult, ParsedQuery, QueryParser,
};
use cmis_query::types::{
    BaseTypeKind, PropertyDefinition, PropertyType, TypeDefinition, TypeManager, TypeRegistry,
    TypeRegistryBuilder,
};
use cmis_query::{QueryConfig, QueryEngine, QueryServices};
use parking_lot::Mutex;
use serde_json::json;

pub const DOC_TYPE: &str = "acme:doc";
pub const AUDITED_TYPE: &str = "acme:audited";

/// Base types plus `acme:doc` (tags, pages) and the `acme:audited` secondary type
pub fn registry() -> TypeRegistry {
    let mut builder = TypeRegistryBuilder::with_base_types();
    builder
        .register(
            TypeDefinition::subtype(DOC_TYPE, BaseTypeKind::Document, "cmis:document")
                .with_property(PropertyDefinition::multi("acme:tags", PropertyType::String))
                .with_property(PropertyDefinition::single("acme:pages", PropertyType::Integer)),
        )
        .unwrap();
    builder
        .register(
            TypeDefinition::subtype(AUDITED_TYPE, BaseTypeKind::Secondary, "cmis:secondary")
                .with_property(PropertyDefinition::single("acme:auditor", PropertyType::String)),
        )
        .unwrap();
    builder.build().unwrap()
}

/// Binds `type_id`'s `property` into `query` and returns the column token
pub fn column(
    types: &dyn TypeManager,
    query: &mut ParsedQuery,
    type_id: &str,
    property: &str,
) -> ColumnToken {
    let owner = types.type_by_id(type_id).unwrap().clone();
    let definition = owner.property(property).unwrap();
    query.bind_column(ColumnReference::from_definition(&owner, definition))
}

/// Parser returning canned queries by statement text
#[derive(Default)]
pub struct ScriptedParser {
    statements: Mutex<HashMap<String, ParsedQuery>>,
}

impl ScriptedParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, statement: &str, query: ParsedQuery) {
        self.statements.lock().insert(statement.to_string(), query);
    }
}

impl QueryParser for ScriptedParser {
    fn parse(&self, statement: &str) -> ParseResult<ParsedQuery> {
        self.statements
            .lock()
            .get(statement)
            .cloned()
            .ok_or_else(|| ParseError::at(0, format!("unexpected statement '{}'", statement)))
    }
}

/// Lock service recording every batch it sees
#[derive(Default)]
pub struct CountingLocks {
    pub lock_calls: AtomicUsize,
    pub unlock_calls: AtomicUsize,
    pub inner: MemoryLockService,
}

impl CountingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_calls(&self) -> usize {
        self.lock_calls.load(Ordering::SeqCst)
    }

    pub fn unlock_calls(&self) -> usize {
        self.unlock_calls.load(Ordering::SeqCst)
    }
}

impl LockService for CountingLocks {
    fn bulk_lock(&self, locks: &[ReadLock]) -> ServiceResult<()> {
        self.lock_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.bulk_lock(locks)
    }

    fn bulk_unlock(&self, locks: &[ReadLock]) -> ServiceResult<()> {
        self.unlock_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.bulk_unlock(locks)
    }
}

/// Permission service that always fails
pub struct BrokenPermissions;

impl PermissionService for BrokenPermissions {
    fn filter_readable(
        &self,
        _principal: &Principal,
        _objects: Vec<ContentObject>,
    ) -> ServiceResult<Vec<ContentObject>> {
        Err(ServiceError::new("acl", "permission store offline"))
    }
}

/// Content store that always fails
pub struct BrokenContentStore;

impl ContentStore for BrokenContentStore {
    fn get_by_id(&self, _id: &str) -> ServiceResult<Option<ContentObject>> {
        Err(ServiceError::new("content", "disk unavailable"))
    }
}

/// Index and content store kept in step
pub struct Repository {
    pub types: Arc<TypeRegistry>,
    pub index: Arc<MemoryIndex>,
    pub content: Arc<MemoryContentStore>,
    pub acl: Arc<AclPermissionService>,
    pub locks: Arc<CountingLocks>,
    pub parser: Arc<ScriptedParser>,
}

impl Repository {
    pub fn new() -> Self {
        Self {
            types: Arc::new(registry()),
            index: Arc::new(MemoryIndex::new()),
            content: Arc::new(MemoryContentStore::new()),
            acl: Arc::new(AclPermissionService::new()),
            locks: Arc::new(CountingLocks::new()),
            parser: Arc::new(ScriptedParser::new()),
        }
    }

    /// Adds an `acme:doc` named `name` under `parent`, readable by `everyone`
    pub fn add_document(&self, id: &str, name: &str, parent: &str) {
        self.add_document_for(id, name, parent, "everyone");
    }

    /// Adds an `acme:doc` readable only by `authority`
    pub fn add_document_for(&self, id: &str, name: &str, parent: &str, authority: &str) {
        self.index.insert(
            IndexedDocument::new(id)
                .with_text(TYPE_FIELD, DOC_TYPE)
                .with_text(BASE_TYPE_FIELD, "cmis:document")
                .with_text("name", name)
                .with_text(PARENT_FIELD, parent)
                .with_text(FULLTEXT_FIELD, name),
        );
        self.content.insert(
            ContentObject::new(id, DOC_TYPE)
                .with_property("cmis:name", json!(name))
                .with_property("cmis:objectTypeId", json!(DOC_TYPE)),
        );
        self.acl.grant(id, authority);
    }

    /// Adds a folder under `parent`
    pub fn add_folder(&self, id: &str, parent: &str) {
        self.index.insert(
            IndexedDocument::new(id)
                .with_value(TYPE_FIELD, IndexValue::text("cmis:folder"))
                .with_value(BASE_TYPE_FIELD, IndexValue::text("cmis:folder"))
                .with_value(PARENT_FIELD, IndexValue::text(parent)),
        );
        self.content.insert(ContentObject::new(id, "cmis:folder"));
        self.acl.grant(id, "everyone");
    }

    pub fn services(&self) -> QueryServices {
        QueryServices {
            parser: self.parser.clone(),
            types: self.types.clone(),
            index: self.index.clone() as Arc<dyn SearchIndex>,
            content: self.content.clone(),
            permissions: self.acl.clone(),
            locks: self.locks.clone(),
        }
    }

    pub fn engine(&self, config: QueryConfig) -> QueryEngine {
        QueryEngine::new(self.services(), config).unwrap()
    }
}

/// A principal holding the `everyone` authority
pub fn reader(id: &str) -> Principal {
    Principal::new(id).with_group("everyone")
}
