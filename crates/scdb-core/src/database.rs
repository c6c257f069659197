//! The in-memory record store.
//!
//! [`Database`] owns the catalog, one record sequence per table, the unique
//! index and the many-to-many relation graph. Every value enters through
//! [`FieldValidator`], both on insert and on update.

use std::collections::HashMap;

use scdb_proto::Value;
use tracing::debug;

use crate::catalog::{Catalog, EnumDef, FieldDef, FieldKind, TableDef};
use crate::constraint::{check_kind, FieldValidator, UniqueIndex};
use crate::error::{Error, SchemaError};
use crate::query::{ScanFilter, ScanResult};
use crate::relation::RelationGraph;
use crate::storage::{Record, RecordKey, TableData};

/// An embedded, schema-driven record store.
#[derive(Debug, Clone, Default)]
pub struct Database {
    catalog: Catalog,
    data: HashMap<String, TableData>,
    unique: UniqueIndex,
    relations: RelationGraph,
}

impl Database {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enum from `(label, value)` pairs.
    pub fn register_enum<L, V>(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = (L, V)>,
    ) -> Result<&EnumDef, Error>
    where
        L: Into<String>,
        V: Into<Value>,
    {
        let def = EnumDef::new(name, members)?;
        Ok(self.catalog.register_enum(def)?)
    }

    /// Register an already-built enum definition.
    pub fn register_enum_def(&mut self, def: EnumDef) -> Result<&EnumDef, Error> {
        Ok(self.catalog.register_enum(def)?)
    }

    /// Register a table and prepare its record sequence and join slots.
    ///
    /// Relation targets may name tables that are registered later; they are
    /// bound when the first record is inserted.
    pub fn register_table(
        &mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDef>,
    ) -> Result<&TableDef, Error> {
        let name = name.into();
        let table = self.catalog.register_table(name.clone(), fields)?;

        for field in table.many_to_many_fields() {
            if let Some(target) = field.kind.target_table() {
                self.relations.declare(&table.name, target);
            }
        }
        self.data.insert(name, TableData::new());
        Ok(table)
    }

    /// The schema catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The many-to-many relation graph.
    pub fn relations(&self) -> &RelationGraph {
        &self.relations
    }

    /// Get a table definition by name.
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.catalog.table(name)
    }

    /// Get an enum definition by name.
    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.catalog.enum_def(name)
    }

    /// Total number of stored records.
    pub fn record_count(&self) -> usize {
        self.data.values().map(TableData::len).sum()
    }

    fn table_data(&self, table: &str) -> Result<&TableData, Error> {
        self.data
            .get(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()).into())
    }

    fn table_def(&self, table: &str) -> Result<&TableDef, Error> {
        self.catalog
            .table(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()).into())
    }

    /// Build a validated record without storing it.
    ///
    /// Omitted fields take their default, else null. Unknown field names are
    /// rejected.
    pub fn build_record<K>(
        &self,
        table: &str,
        values: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Record, Error>
    where
        K: Into<String>,
    {
        let def = self.catalog.bind_table(table)?;

        let mut slots: Vec<Option<Value>> = vec![None; def.fields().len()];
        for (name, value) in values {
            let name = name.into();
            let idx = def
                .field_index(&name)
                .ok_or_else(|| SchemaError::UnknownField {
                    table: table.to_string(),
                    field: name,
                })?;
            slots[idx] = Some(value);
        }

        let validator = FieldValidator::new(&self.catalog);
        let fields = def
            .fields()
            .iter()
            .zip(slots)
            .map(|(field, slot)| -> Result<(String, Value), Error> {
                let value = slot
                    .or_else(|| field.default.clone())
                    .unwrap_or(Value::Null);
                let value = validator.validate(table, field, value)?;
                Ok((field.name.clone(), value))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Record::new(table, fields))
    }

    /// Validate and append a record to a table.
    pub fn insert<K>(
        &mut self,
        table: &str,
        values: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<&Record, Error>
    where
        K: Into<String>,
    {
        let record = self.build_record(table, values)?;
        self.store(table, record)
    }

    /// Insert several records, stopping at the first failure.
    ///
    /// Records inserted before the failure stay in place.
    pub fn insert_many<K, R>(
        &mut self,
        table: &str,
        records: impl IntoIterator<Item = R>,
    ) -> Result<usize, Error>
    where
        K: Into<String>,
        R: IntoIterator<Item = (K, Value)>,
    {
        let mut count = 0;
        for values in records {
            self.insert(table, values)?;
            count += 1;
        }
        Ok(count)
    }

    fn store(&mut self, table: &str, record: Record) -> Result<&Record, Error> {
        let def = self
            .catalog
            .table(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?;
        let data = self
            .data
            .get_mut(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?;

        let position = data.len();
        let key = record_key(def, &record, position);

        let unique_fields: Vec<(&FieldDef, &Value)> = def
            .fields()
            .iter()
            .zip(record.fields())
            .filter(|(field, _)| field.unique)
            .map(|(field, (_, value))| (field, value))
            .collect();
        for (field, value) in &unique_fields {
            self.unique.check(table, &field.name, value, position)?;
        }
        for (field, value) in &unique_fields {
            self.unique.insert(table, &field.name, value, position)?;
        }

        for (field, (_, value)) in def.fields().iter().zip(record.fields()) {
            if let FieldKind::ManyToMany { target_table } = &field.kind {
                assign_join(&mut self.relations, table, target_table, key.clone(), value);
            }
        }

        debug!(table, position, key = %key, "Inserted record");

        data.push(key, record);
        Ok(&data.records()[position])
    }

    /// Validate and assign one field of a stored record.
    ///
    /// The record is addressed by key: its primary key value, or its position
    /// when the table has no primary key. The primary key itself cannot be
    /// changed.
    pub fn update(
        &mut self,
        table: &str,
        key: impl Into<RecordKey>,
        field: &str,
        value: Value,
    ) -> Result<&Record, Error> {
        let key = key.into();
        let def = self.catalog.bind_table(table)?;
        let keyed = def.primary_key().is_some();
        let idx = def
            .field_index(field)
            .ok_or_else(|| SchemaError::UnknownField {
                table: table.to_string(),
                field: field.to_string(),
            })?;
        let field_def = &def.fields()[idx];
        if field_def.primary_key {
            return Err(SchemaError::ImmutablePrimaryKey {
                table: table.to_string(),
                field: field.to_string(),
            }
            .into());
        }

        let value = FieldValidator::new(&self.catalog).validate(table, field_def, value)?;

        let data = self
            .data
            .get_mut(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?;
        let position = data
            .position_of(&key, keyed)
            .ok_or_else(|| Error::RecordNotFound {
                table: table.to_string(),
                key: key.to_string(),
            })?;
        let record = data.get_mut(position).ok_or_else(|| Error::RecordNotFound {
            table: table.to_string(),
            key: key.to_string(),
        })?;

        if field_def.unique {
            self.unique.check(table, field, &value, position)?;
            if let Some(old) = record.value_at(idx) {
                self.unique.remove(table, field, old);
            }
            self.unique.insert(table, field, &value, position)?;
        }

        if let FieldKind::ManyToMany { target_table } = &field_def.kind {
            assign_join(&mut self.relations, table, target_table, key.clone(), &value);
        }

        debug!(table, field, key = %key, "Updated record");

        record.set_at(idx, value);
        Ok(record)
    }

    /// All records of a table in insertion order.
    pub fn all(&self, table: &str) -> Result<&[Record], Error> {
        Ok(self.table_data(table)?.records())
    }

    /// Records of a table, or `None` if the table is unknown.
    pub fn records(&self, table: &str) -> Option<&[Record]> {
        self.data.get(table).map(TableData::records)
    }

    fn filter<K>(
        &self,
        table: &str,
        criteria: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<ScanFilter, Error>
    where
        K: AsRef<str>,
    {
        let def = self.table_def(table)?;
        let mut filter = ScanFilter::new();
        for (name, value) in criteria {
            let name = name.as_ref();
            let idx = def
                .field_index(name)
                .ok_or_else(|| SchemaError::UnknownField {
                    table: table.to_string(),
                    field: name.to_string(),
                })?;
            filter = filter.with_criterion(idx, self.canonical_criterion(&def.fields()[idx], value));
        }
        Ok(filter)
    }

    // Criteria compare against canonical values, so textual dates and the
    // like are parsed the same way inserted values are. A criterion the field
    // would reject is kept as given and simply never matches.
    fn canonical_criterion(&self, field: &FieldDef, value: Value) -> Value {
        if value.is_null() {
            return value;
        }
        let enum_def = match &field.kind {
            FieldKind::Enum { enum_name } => self.catalog.enum_def(enum_name),
            _ => None,
        };
        check_kind(&field.kind, value.clone(), enum_def).unwrap_or(value)
    }

    /// Linear equality scan over a table.
    ///
    /// The result collapses by match count: nothing, the single match, or
    /// every match in insertion order.
    pub fn scan<K>(
        &self,
        table: &str,
        criteria: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<ScanResult<'_>, Error>
    where
        K: AsRef<str>,
    {
        let filter = self.filter(table, criteria)?;
        Ok(filter.scan(self.table_data(table)?.records()))
    }

    /// First record matching every criterion.
    pub fn first<K>(
        &self,
        table: &str,
        criteria: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Option<&Record>, Error>
    where
        K: AsRef<str>,
    {
        let filter = self.filter(table, criteria)?;
        Ok(filter.first(self.table_data(table)?.records()))
    }

    /// Point lookup by key. Returns the first record carrying the key.
    pub fn find(&self, table: &str, key: impl Into<RecordKey>) -> Result<Option<&Record>, Error> {
        let keyed = self.table_def(table)?.primary_key().is_some();
        Ok(self.table_data(table)?.find(&key.into(), keyed))
    }

    /// Records related to an owner through a many-to-many join.
    ///
    /// Targets are returned in assignment order; keys with no matching
    /// record are skipped. An owner with no entry yields an empty list.
    pub fn related(
        &self,
        owner_table: &str,
        owner_key: impl Into<RecordKey>,
        target_table: &str,
    ) -> Result<Vec<&Record>, Error> {
        let owner_key = owner_key.into();
        let targets = self
            .relations
            .targets(owner_table, target_table, &owner_key)
            .ok_or_else(|| SchemaError::UnknownRelation {
                owner: owner_table.to_string(),
                target: target_table.to_string(),
            })?;

        let keyed = self.table_def(target_table)?.primary_key().is_some();
        let data = self.table_data(target_table)?;
        Ok(targets
            .iter()
            .filter_map(|key| data.find(key, keyed))
            .collect())
    }

    /// Follow a foreign key or relation field to the record it references.
    pub fn resolve(&self, record: &Record, field: &str) -> Result<Option<&Record>, Error> {
        let def = self.table_def(record.table())?;
        let field_def = def.field(field).ok_or_else(|| SchemaError::UnknownField {
            table: record.table().to_string(),
            field: field.to_string(),
        })?;
        let Some(target) = field_def
            .kind
            .target_table()
            .filter(|_| field_def.kind.is_single_reference())
        else {
            return Err(SchemaError::UnknownRelation {
                owner: record.table().to_string(),
                target: field.to_string(),
            }
            .into());
        };

        match record.get(field).and_then(RecordKey::from_value) {
            Some(key) => self.find(target, key),
            None => Ok(None),
        }
    }
}

/// Identity of a record about to be stored at `position`.
fn record_key(def: &TableDef, record: &Record, position: usize) -> RecordKey {
    def.primary_key()
        .and_then(|(idx, _)| record.value_at(idx))
        .and_then(RecordKey::from_value)
        .unwrap_or_else(|| RecordKey::position(position))
}

fn assign_join(
    relations: &mut RelationGraph,
    owner_table: &str,
    target_table: &str,
    owner: RecordKey,
    value: &Value,
) {
    match value.as_array() {
        Some(items) => {
            let targets = items.iter().filter_map(RecordKey::from_value).collect();
            relations.assign(owner_table, target_table, owner, targets);
        }
        None => relations.clear(owner_table, target_table, &owner),
    }
}
