//! Object schemas
//!
//! A schema names an object type and its properties. Every property is a
//! mixed slot; one of them may be the primary key, which identifies the
//! object across replicas.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared shape of one object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSchema {
    /// Type name
    pub name: String,
    /// Property holding the object's identity, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Property names in declaration order
    pub properties: Vec<String>,
}

impl ObjectSchema {
    /// Schema without a primary key
    pub fn new<I, S>(name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ObjectSchema {
            name: name.into(),
            primary_key: None,
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the primary key property
    pub fn with_primary_key(mut self, property: impl Into<String>) -> Self {
        self.primary_key = Some(property.into());
        self
    }

    /// Whether `property` is declared
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }

    /// Whether `property` is the primary key
    pub fn is_primary_key(&self, property: &str) -> bool {
        self.primary_key.as_deref() == Some(property)
    }

    /// Fail with `NoSuchProperty` for undeclared names
    pub fn require_property(&self, property: &str) -> Result<()> {
        if self.has_property(property) {
            Ok(())
        } else {
            Err(EngineError::no_such_property(&self.name, property))
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| EngineError::InvalidSchema {
            object_type: self.name.clone(),
            reason,
        };
        if self.name.is_empty() {
            return Err(invalid("type name is empty".into()));
        }
        for (i, p) in self.properties.iter().enumerate() {
            if p.is_empty() {
                return Err(invalid("property name is empty".into()));
            }
            if self.properties[..i].contains(p) {
                return Err(invalid(format!("property '{}' declared twice", p)));
            }
        }
        if let Some(pk) = &self.primary_key {
            if !self.has_property(pk) {
                return Err(invalid(format!("primary key '{}' is not a property", pk)));
            }
        }
        Ok(())
    }
}

/// Validated set of schemas, keyed by type name
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    types: BTreeMap<String, ObjectSchema>,
}

impl SchemaSet {
    /// Validate and index a list of schemas
    pub fn new(schemas: impl IntoIterator<Item = ObjectSchema>) -> Result<Self> {
        let mut types = BTreeMap::new();
        for schema in schemas {
            schema.validate()?;
            if types.contains_key(&schema.name) {
                return Err(EngineError::InvalidSchema {
                    object_type: schema.name,
                    reason: "type declared twice".into(),
                });
            }
            types.insert(schema.name.clone(), schema);
        }
        Ok(SchemaSet { types })
    }

    /// Schema for `object_type`, or `NoSuchType`
    pub fn get(&self, object_type: &str) -> Result<&ObjectSchema> {
        self.types
            .get(object_type)
            .ok_or_else(|| EngineError::NoSuchType(object_type.to_string()))
    }

    /// All declared type names
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}
