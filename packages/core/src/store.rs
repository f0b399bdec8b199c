//! Accumulated reflection metadata.

use crate::classifier::TypePattern;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Plain,
    AliasRef,
    Method,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn is_alias_ref(&self) -> bool {
        self.kind == FieldKind::AliasRef
    }

    pub fn is_method(&self) -> bool {
        self.kind == FieldKind::Method
    }
}

/// A reflected type and its fields in capture order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecord {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl TypeRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Appends `field` unless a field of that name is already present.
    /// The first descriptor seen for a name wins.
    pub fn insert(&mut self, field: FieldDescriptor) -> bool {
        if self.field(&field.name).is_some() {
            return false;
        }
        self.fields.push(field);
        true
    }
}

/// Template instantiations that need their own registration blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxInstantiations {
    pub string_capacities: BTreeSet<u32>,
    pub sequence_elements: BTreeSet<String>,
}

impl AuxInstantiations {
    pub fn record(&mut self, pattern: TypePattern) -> bool {
        match pattern {
            TypePattern::FixedString(capacity) => self.string_capacities.insert(capacity),
            TypePattern::Sequence(element) => self.sequence_elements.insert(element),
        }
    }

    pub fn merge(&mut self, other: AuxInstantiations) {
        self.string_capacities.extend(other.string_capacities);
        self.sequence_elements.extend(other.sequence_elements);
    }

    pub fn is_empty(&self) -> bool {
        self.string_capacities.is_empty() && self.sequence_elements.is_empty()
    }
}

/// Everything the renderer needs, accumulated over all scanned files.
///
/// Type records keep first-discovery order; auxiliary sets and includes are
/// kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataStore {
    types: Vec<TypeRecord>,
    index: HashMap<String, usize>,
    pub aux: AuxInstantiations,
    pub includes: BTreeSet<String>,
    /// Include that contributed each captured field, keyed by (type, field)
    origins: HashMap<(String, String), String>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &[TypeRecord] {
        &self.types
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeRecord> {
        self.index.get(type_name).map(|&i| &self.types[i])
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.aux.is_empty()
    }

    fn record_mut(&mut self, type_name: &str) -> &mut TypeRecord {
        let next = self.types.len();
        let i = *self.index.entry(type_name.to_string()).or_insert(next);
        if i == next {
            self.types.push(TypeRecord::new(type_name));
        }
        &mut self.types[i]
    }

    /// Adds a field to `type_name`, creating the record on first use.
    /// Returns `false` when the field name was already captured.
    pub fn add_field(&mut self, type_name: &str, field: FieldDescriptor) -> bool {
        self.record_mut(type_name).insert(field)
    }

    /// Like [`add_field`](Self::add_field), and includes `include` when the
    /// field is new.
    pub fn add_field_from(
        &mut self,
        type_name: &str,
        field: FieldDescriptor,
        include: impl Into<String>,
    ) -> bool {
        let key = (type_name.to_string(), field.name.clone());
        if !self.add_field(type_name, field) {
            return false;
        }
        let include = include.into();
        self.includes.insert(include.clone());
        self.origins.insert(key, include);
        true
    }

    pub fn add_include(&mut self, path: impl Into<String>) -> bool {
        self.includes.insert(path.into())
    }

    /// Folds a later partial result into this one, keeping first-seen fields.
    /// An include is carried over only with a field it contributed.
    pub fn merge(&mut self, mut other: MetadataStore) {
        for record in other.types {
            for field in record.fields {
                let key = (record.name.clone(), field.name.clone());
                let inserted = self.add_field(&record.name, field);
                if !inserted {
                    continue;
                }
                if let Some(include) = other.origins.remove(&key) {
                    self.includes.insert(include.clone());
                    self.origins.insert(key, include);
                }
            }
        }
        self.aux.merge(other.aux);
    }
}
