//! Clauses driven by entity descriptors from the schema resolver.

use super::{State, Statement};
use crate::error::{OrmError, OrmResult};
use crate::schema::{EntityDescriptor, EntityRow};
use crate::value::Value;
use std::sync::Arc;

impl Statement {
    /// Select every mapped column of `T` and remember `T` so a following
    /// `where_*`/`order_by` can supply `FROM` on its own.
    pub fn select_all<T: 'static>(&mut self) -> OrmResult<&mut Self> {
        let desc = self.entity::<T>()?;
        if desc.columns.is_empty() {
            self.select_raw("*")?;
        }
        for col in &desc.columns {
            self.select(&col.name)?;
        }
        self.frame.entity = Some(desc);
        Ok(self)
    }

    /// `FROM` the table mapped to `T`.
    pub fn from_entity<T: 'static>(&mut self, alias: Option<&str>) -> OrmResult<&mut Self> {
        let desc = self.entity::<T>()?;
        match alias {
            Some(alias) => self.from_as(&desc.table, alias)?,
            None => self.from(&desc.table)?,
        };
        self.frame.entity = Some(desc);
        Ok(self)
    }

    /// `INSERT INTO` the table mapped to `T`, listing its non-generated columns.
    pub fn insert_entity<T: 'static>(&mut self) -> OrmResult<&mut Self> {
        let desc = self.entity::<T>()?;
        let columns: Vec<&str> = desc.insertable().map(|c| c.name.as_str()).collect();
        self.insert(&desc.table, &columns)?;
        self.frame.entity = Some(Arc::clone(&desc));
        Ok(self)
    }

    /// Append a `VALUES` row read from `entity`, passing each field through
    /// its column converter.
    pub fn values_entity<E: EntityRow>(&mut self, entity: &E) -> OrmResult<&mut Self> {
        let desc = self.entity::<E>()?;
        let insertable: Vec<&str> = desc.insertable().map(|c| c.name.as_str()).collect();
        if insertable != self.frame.insert_columns {
            return Err(OrmError::protocol("values_entity", self.frame.state));
        }
        let row = entity_values(&desc, entity, desc.insertable())?;
        self.values_row("values_entity", &row)?;
        Ok(self)
    }

    /// Upsert keyed on `T`'s primary key.
    pub fn upsert_entity<T: 'static>(&mut self) -> OrmResult<&mut Self> {
        let desc = self.entity::<T>()?;
        let keys: Vec<&str> = desc.primary_keys().map(|c| c.name.as_str()).collect();
        if keys.is_empty() {
            return Err(OrmError::unmapped(format!(
                "table '{}' has no primary key to upsert on",
                desc.table
            )));
        }
        self.upsert(&keys)
    }

    /// `UPDATE` every non-key column of `entity`'s row, matched on its primary key.
    pub fn update_entity<E: EntityRow>(&mut self, entity: &E) -> OrmResult<&mut Self> {
        let desc = self.entity::<E>()?;
        if desc.primary_keys().next().is_none() {
            return Err(OrmError::unmapped(format!(
                "table '{}' has no primary key to update by",
                desc.table
            )));
        }
        self.expect("update_entity", &[State::Start])?;

        let updates = entity_values(&desc, entity, desc.updatable())?;
        let keys = entity_values(&desc, entity, desc.primary_keys())?;

        self.update(&desc.table)?;
        for (col, value) in desc.updatable().zip(updates) {
            self.set(&col.name, value)?;
        }
        for (col, value) in desc.primary_keys().zip(keys) {
            self.where_col(&col.name)?.eq(value)?;
        }
        self.frame.entity = Some(desc);
        Ok(self)
    }

    /// `DELETE FROM` the table mapped to `T`. Conditions follow via
    /// [`Statement::where_prop`] or [`Statement::where_col`].
    pub fn delete_entity<T: 'static>(&mut self) -> OrmResult<&mut Self> {
        let desc = self.entity::<T>()?;
        self.delete(&desc.table)?;
        self.frame.entity = Some(desc);
        Ok(self)
    }

    /// Start a condition on the column mapped to `T::property`.
    pub fn where_prop<T: 'static>(&mut self, property: &str) -> OrmResult<&mut Self> {
        let desc = self.entity::<T>()?;
        let column = desc.column(property)?;
        self.where_col(&column.name)
    }
}

fn entity_values<'a, E: EntityRow>(
    desc: &EntityDescriptor,
    entity: &E,
    columns: impl Iterator<Item = &'a crate::schema::ColumnDef>,
) -> OrmResult<Vec<Value>> {
    columns
        .map(|col| {
            let raw = entity.property_value(&col.property).ok_or_else(|| {
                OrmError::unmapped(format!(
                    "entity has no value for property '{}' of table '{}'",
                    col.property, desc.table
                ))
            })?;
            col.convert(raw)
        })
        .collect()
}
