//! Type metadata registry
//!
//! A registry is assembled with [`TypeRegistryBuilder`], which resolves property
//! inheritance and the descendant graph, and is only handed out once complete.
//! The published [`TypeRegistry`] is immutable and can be shared across threads.

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::base::base_type;
use super::definition::{BaseTypeKind, PropertyDefinition, TypeDefinition};
use super::errors::{TypeRegistryError, TypeRegistryResult};

/// Read-only type metadata consumed by the planner and executor
pub trait TypeManager: Send + Sync {
    /// Looks up a type by id
    fn type_by_id(&self, id: &str) -> Option<&TypeDefinition>;

    /// Looks up a type by its query name
    fn type_by_query_name(&self, query_name: &str) -> Option<&TypeDefinition>;

    /// All transitive descendants of a type, excluding the type itself
    fn type_descendants(&self, id: &str) -> Vec<&TypeDefinition>;

    /// Looks up a property of a type by property id
    fn property_definition(&self, type_id: &str, property_id: &str) -> Option<&PropertyDefinition>;

    /// Looks up a property by query name across all types
    fn property_by_query_name(&self, query_name: &str) -> Option<&PropertyDefinition>;
}

/// Immutable registry of type definitions
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDefinition>,
    by_query_name: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,
    properties_by_query_name: HashMap<String, PropertyDefinition>,
}

impl TypeRegistry {
    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over all types in id order
    pub fn iter(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }
}

impl TypeManager for TypeRegistry {
    fn type_by_id(&self, id: &str) -> Option<&TypeDefinition> {
        self.types.get(id)
    }

    fn type_by_query_name(&self, query_name: &str) -> Option<&TypeDefinition> {
        self.by_query_name
            .get(query_name)
            .and_then(|id| self.types.get(id))
    }

    fn type_descendants(&self, id: &str) -> Vec<&TypeDefinition> {
        let mut result = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(id);

        while let Some(current) = queue.pop_front() {
            if let Some(children) = self.children.get(current) {
                for child in children {
                    if let Some(def) = self.types.get(child) {
                        result.push(def);
                        queue.push_back(child);
                    }
                }
            }
        }

        result
    }

    fn property_definition(&self, type_id: &str, property_id: &str) -> Option<&PropertyDefinition> {
        self.types.get(type_id).and_then(|t| t.property(property_id))
    }

    fn property_by_query_name(&self, query_name: &str) -> Option<&PropertyDefinition> {
        self.properties_by_query_name.get(query_name)
    }
}

/// Builder collecting type definitions before publication
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    pending: BTreeMap<String, TypeDefinition>,
}

impl TypeRegistryBuilder {
    /// Creates an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder pre-populated with the six standard base types
    pub fn with_base_types() -> Self {
        let mut pending = BTreeMap::new();
        for kind in BaseTypeKind::all() {
            let def = base_type(kind);
            pending.insert(def.id.clone(), def);
        }
        Self { pending }
    }

    /// Registers a type definition.
    ///
    /// A subtype lists only its own properties; inherited ones are merged by [`build`](Self::build).
    pub fn register(&mut self, definition: TypeDefinition) -> TypeRegistryResult<&mut Self> {
        if self.pending.contains_key(&definition.id) {
            return Err(TypeRegistryError::DuplicateType(definition.id));
        }
        self.pending.insert(definition.id.clone(), definition);
        Ok(self)
    }

    /// Resolves inheritance and publishes the registry.
    pub fn build(self) -> TypeRegistryResult<TypeRegistry> {
        let mut resolved: BTreeMap<String, TypeDefinition> = BTreeMap::new();
        let mut remaining: Vec<TypeDefinition> = self.pending.into_values().collect();

        // Parents are resolved before their children; a pass without progress
        // means the remaining parents are missing or cyclic.
        while !remaining.is_empty() {
            let before = remaining.len();
            let mut deferred = Vec::new();

            for mut def in remaining {
                match def.parent_id.clone() {
                    None => {
                        resolved.insert(def.id.clone(), def);
                    }
                    Some(parent_id) => match resolved.get(&parent_id) {
                        Some(parent) => {
                            let own = std::mem::take(&mut def.properties);
                            let mut properties = parent.properties.clone();
                            for property in own {
                                if properties.iter().any(|p| p.id == property.id) {
                                    return Err(TypeRegistryError::DuplicateProperty {
                                        type_id: def.id.clone(),
                                        property_id: property.id,
                                    });
                                }
                                properties.push(property);
                            }
                            def.properties = properties;
                            resolved.insert(def.id.clone(), def);
                        }
                        None => deferred.push(def),
                    },
                }
            }

            if deferred.len() == before {
                let def = &deferred[0];
                return Err(TypeRegistryError::UnknownParent {
                    type_id: def.id.clone(),
                    parent_id: def.parent_id.clone().unwrap_or_default(),
                });
            }
            remaining = deferred;
        }

        let mut by_query_name = HashMap::new();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut properties_by_query_name: HashMap<String, PropertyDefinition> = HashMap::new();

        for def in resolved.values() {
            if by_query_name
                .insert(def.query_name.clone(), def.id.clone())
                .is_some()
            {
                return Err(TypeRegistryError::DuplicateQueryName(def.query_name.clone()));
            }

            if let Some(parent_id) = &def.parent_id {
                children
                    .entry(parent_id.clone())
                    .or_default()
                    .push(def.id.clone());
            }

            for property in &def.properties {
                match properties_by_query_name.get(&property.query_name) {
                    Some(existing) if existing.property_type != property.property_type => {
                        return Err(TypeRegistryError::ConflictingPropertyType {
                            query_name: property.query_name.clone(),
                            first: existing.property_type.to_string(),
                            second: property.property_type.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        properties_by_query_name
                            .insert(property.query_name.clone(), property.clone());
                    }
                }
            }
        }

        Ok(TypeRegistry {
            types: resolved,
            by_query_name,
            children,
            properties_by_query_name,
        })
    }
}
