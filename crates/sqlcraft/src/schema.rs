//! Entity metadata consumed by the statement builder.
//!
//! The builder never inspects Rust types itself. It asks a [`SchemaResolver`]
//! for an [`EntityDescriptor`] once per statement and entity type, then only
//! reads the descriptor. [`SchemaRegistry`] is the stock resolver, filled from
//! [`TableMeta`] implementations or hand-built descriptors.
//!
//! # Example
//!
//! ```ignore
//! use sqlcraft::schema::{SchemaRegistry, TableMeta};
//!
//! struct User;
//! impl TableMeta for User {
//!     fn table_name() -> &'static str { "users" }
//!     fn columns() -> &'static [&'static str] { &["id", "name", "email"] }
//!     fn primary_key() -> &'static [&'static str] { &["id"] }
//!     fn auto_generated() -> &'static [&'static str] { &["id"] }
//! }
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register::<User>();
//! ```

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Hook turning a field value into the value stored in the column.
pub type Converter = fn(Value) -> OrmResult<Value>;

/// Static table metadata for an entity type.
pub trait TableMeta: 'static {
    /// The database table name.
    fn table_name() -> &'static str;

    /// Column names, in declaration order.
    fn columns() -> &'static [&'static str];

    /// Primary-key columns.
    fn primary_key() -> &'static [&'static str] {
        &[]
    }

    /// Columns filled in by the database (identity, defaults).
    fn auto_generated() -> &'static [&'static str] {
        &[]
    }

    /// Build a descriptor from the metadata above.
    fn descriptor() -> EntityDescriptor {
        let mut desc = EntityDescriptor::new(Self::table_name());
        for name in Self::columns() {
            let mut col = ColumnDef::new(*name);
            col.is_primary_key = Self::primary_key().contains(name);
            col.is_auto_generated = Self::auto_generated().contains(name);
            desc.columns.push(col);
        }
        desc
    }
}

/// Field access for entity instances written by `values_entity` and
/// `update_entity`.
pub trait EntityRow: 'static {
    /// Value of the field mapped to `property`, or `None` if there is none.
    fn property_value(&self, property: &str) -> Option<Value>;
}

/// Column information for one mapped property.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Logical property name.
    pub property: String,
    /// Column name in the table.
    pub name: String,
    /// Whether this column is part of the primary key.
    pub is_primary_key: bool,
    /// Whether the database generates this column's value.
    pub is_auto_generated: bool,
    converter: Option<Converter>,
}

impl ColumnDef {
    /// Column whose property name equals the column name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            property: name.clone(),
            name,
            is_primary_key: false,
            is_auto_generated: false,
            converter: None,
        }
    }

    /// Map a differently-named property onto this column.
    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = property.into();
        self
    }

    /// Mark as primary-key column.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Mark as database-generated.
    pub fn auto_generated(mut self) -> Self {
        self.is_auto_generated = true;
        self
    }

    /// Install a value-conversion hook.
    pub fn converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Convert a field value into its column value.
    pub fn convert(&self, value: Value) -> OrmResult<Value> {
        match self.converter {
            Some(f) => f(value),
            None => Ok(value),
        }
    }
}

/// Table name and ordered columns of an entity.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    /// Table name.
    pub table: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
}

impl EntityDescriptor {
    /// Create an empty descriptor for `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    /// Add a column.
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Look up the column mapped to `property`.
    pub fn column(&self, property: &str) -> OrmResult<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.property == property)
            .ok_or_else(|| {
                OrmError::unmapped(format!(
                    "property '{property}' has no column in table '{}'",
                    self.table
                ))
            })
    }

    /// Primary-key columns.
    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }

    /// Columns an insert must supply.
    pub fn insertable(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| !c.is_auto_generated)
    }

    /// Columns an update may overwrite.
    pub fn updatable(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns
            .iter()
            .filter(|c| !c.is_primary_key && !c.is_auto_generated)
    }

    /// Check if this table has a column with the given name.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

/// Resolves a logical entity type to its descriptor.
pub trait SchemaResolver: fmt::Debug + Send + Sync {
    /// Descriptor for the type identified by `entity`; `type_name` is for errors.
    fn resolve(&self, entity: TypeId, type_name: &'static str)
    -> OrmResult<Arc<EntityDescriptor>>;
}

/// Registry of entity descriptors keyed by Rust type.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: HashMap<TypeId, Arc<EntityDescriptor>>,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity from its [`TableMeta`].
    pub fn register<T: TableMeta>(&mut self) -> &mut Self {
        self.register_descriptor::<T>(T::descriptor())
    }

    /// Register a hand-built descriptor for `T`.
    pub fn register_descriptor<T: 'static>(&mut self, descriptor: EntityDescriptor) -> &mut Self {
        self.entities
            .insert(TypeId::of::<T>(), Arc::new(descriptor));
        self
    }

    /// Get the descriptor registered for `T`.
    pub fn get<T: 'static>(&self) -> Option<&EntityDescriptor> {
        self.entities.get(&TypeId::of::<T>()).map(|d| d.as_ref())
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity is registered.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl SchemaResolver for SchemaRegistry {
    fn resolve(
        &self,
        entity: TypeId,
        type_name: &'static str,
    ) -> OrmResult<Arc<EntityDescriptor>> {
        self.entities
            .get(&entity)
            .cloned()
            .ok_or_else(|| OrmError::unmapped(format!("{type_name} is not registered")))
    }
}

/// Resolve `T` through `resolver`.
pub fn resolve<T: 'static>(resolver: &dyn SchemaResolver) -> OrmResult<Arc<EntityDescriptor>> {
    resolver.resolve(TypeId::of::<T>(), type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account;

    impl TableMeta for Account {
        fn table_name() -> &'static str {
            "accounts"
        }
        fn columns() -> &'static [&'static str] {
            &["id", "owner", "balance"]
        }
        fn primary_key() -> &'static [&'static str] {
            &["id"]
        }
        fn auto_generated() -> &'static [&'static str] {
            &["id"]
        }
    }

    struct Unregistered;

    #[test]
    fn descriptor_from_table_meta() {
        let desc = Account::descriptor();
        assert_eq!(desc.table, "accounts");
        assert_eq!(desc.primary_keys().count(), 1);
        let insertable: Vec<_> = desc.insertable().map(|c| c.name.as_str()).collect();
        assert_eq!(insertable, ["owner", "balance"]);
        assert!(desc.has_column("balance"));
    }

    #[test]
    fn unknown_property_is_unmapped() {
        let desc = Account::descriptor();
        assert!(matches!(
            desc.column("nickname"),
            Err(OrmError::UnmappedSchema(_))
        ));
    }

    #[test]
    fn registry_resolves_registered_types_only() {
        let mut registry = SchemaRegistry::new();
        registry.register::<Account>();
        assert_eq!(resolve::<Account>(&registry).unwrap().table, "accounts");
        let err = resolve::<Unregistered>(&registry).unwrap_err();
        assert!(err.to_string().contains("Unregistered"));
    }

    #[test]
    fn converter_runs_on_convert() {
        fn cents(v: Value) -> OrmResult<Value> {
            match v {
                Value::Float(f) => Ok(Value::Int((f * 100.0).round() as i64)),
                other => Ok(other),
            }
        }
        let col = ColumnDef::new("balance").converter(cents);
        assert_eq!(col.convert(Value::Float(1.25)).unwrap(), Value::Int(125));
    }
}
