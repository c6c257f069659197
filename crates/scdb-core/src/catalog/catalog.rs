//! Registry of table and enum definitions.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::{EnumDef, FieldDef, FieldKind, TableDef};
use crate::error::SchemaError;

/// The schema registry.
///
/// Tables and enums are kept in registration order, which is also the order
/// the codec writes them in. Relation targets are held as plain names so a
/// table may name a target registered after it; [`Catalog::bind`] checks
/// that every named target eventually exists.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    tables: Vec<TableDef>,
    #[serde(skip)]
    table_index: HashMap<String, usize>,
    enums: Vec<EnumDef>,
    #[serde(skip)]
    enum_index: HashMap<String, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table from its ordered field list.
    pub fn register_table(
        &mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDef>,
    ) -> Result<&TableDef, SchemaError> {
        let name = name.into();
        if self.table_index.contains_key(&name) {
            return Err(SchemaError::DuplicateTableRegistration(name));
        }
        let table = TableDef::new(name, fields)?;

        debug!(
            table = %table.name,
            fields = table.fields().len(),
            "Registered table"
        );

        let idx = self.tables.len();
        self.table_index.insert(table.name.clone(), idx);
        self.tables.push(table);
        Ok(&self.tables[idx])
    }

    /// Register an enum.
    pub fn register_enum(&mut self, def: EnumDef) -> Result<&EnumDef, SchemaError> {
        if self.enum_index.contains_key(&def.name) {
            return Err(SchemaError::DuplicateEnumRegistration(def.name));
        }

        debug!(
            enum_name = %def.name,
            members = def.members().len(),
            "Registered enum"
        );

        let idx = self.enums.len();
        self.enum_index.insert(def.name.clone(), idx);
        self.enums.push(def);
        Ok(&self.enums[idx])
    }

    /// Get a table by name.
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.table_index.get(name).map(|&i| &self.tables[i])
    }

    /// Get an enum by name.
    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enum_index.get(name).map(|&i| &self.enums[i])
    }

    /// Registration position of a table.
    pub fn table_position(&self, name: &str) -> Option<usize> {
        self.table_index.get(name).copied()
    }

    /// All tables in registration order.
    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    /// All enums in registration order.
    pub fn enums(&self) -> &[EnumDef] {
        &self.enums
    }

    /// List all table names in registration order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Check that every relation target and enum named by any table is registered.
    pub fn bind(&self) -> Result<(), SchemaError> {
        for table in &self.tables {
            self.bind_fields(table)?;
        }
        Ok(())
    }

    /// Check that every relation target and enum named by one table is registered.
    pub fn bind_table(&self, name: &str) -> Result<&TableDef, SchemaError> {
        let table = self
            .table(name)
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))?;
        self.bind_fields(table)?;
        Ok(table)
    }

    fn bind_fields(&self, table: &TableDef) -> Result<(), SchemaError> {
        for field in table.fields() {
            match &field.kind {
                FieldKind::Enum { enum_name } => {
                    if self.enum_def(enum_name).is_none() {
                        return Err(SchemaError::UnknownEnum(enum_name.clone()));
                    }
                }
                kind => {
                    if let Some(target) = kind.target_table() {
                        if self.table(target).is_none() {
                            return Err(SchemaError::UnresolvedTarget {
                                table: table.name.clone(),
                                field: field.name.clone(),
                                target: target.to_string(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Check that every foreign key or relation target is registered no later
    /// than the table referencing it. Self references are allowed.
    pub fn check_order(&self) -> Result<(), SchemaError> {
        for (pos, table) in self.tables.iter().enumerate() {
            for field in table.fields().iter().filter(|f| f.kind.is_single_reference()) {
                let Some(target) = field.kind.target_table() else {
                    continue;
                };
                match self.table_position(target) {
                    Some(target_pos) if target_pos <= pos => {}
                    Some(_) => {
                        return Err(SchemaError::ForwardReference {
                            table: table.name.clone(),
                            field: field.name.clone(),
                            target: target.to_string(),
                        })
                    }
                    None => {
                        return Err(SchemaError::UnresolvedTarget {
                            table: table.name.clone(),
                            field: field.name.clone(),
                            target: target.to_string(),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    /// Table names ordered so that every foreign key or relation target comes
    /// before the tables referencing it. Ties keep registration order.
    pub fn dependency_order(&self) -> Result<Vec<&str>, SchemaError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Visiting,
            Done,
        }

        fn visit<'a>(
            catalog: &'a Catalog,
            idx: usize,
            marks: &mut [Mark],
            order: &mut Vec<&'a str>,
        ) -> Result<(), SchemaError> {
            let table = &catalog.tables[idx];
            match marks[idx] {
                Mark::Done => return Ok(()),
                Mark::Visiting => return Err(SchemaError::RelationCycle(table.name.clone())),
                Mark::Unvisited => {}
            }
            marks[idx] = Mark::Visiting;

            for field in table.fields().iter().filter(|f| f.kind.is_single_reference()) {
                let Some(target) = field.kind.target_table() else {
                    continue;
                };
                if target == table.name {
                    continue;
                }
                let target_idx =
                    catalog
                        .table_position(target)
                        .ok_or_else(|| SchemaError::UnresolvedTarget {
                            table: table.name.clone(),
                            field: field.name.clone(),
                            target: target.to_string(),
                        })?;
                visit(catalog, target_idx, marks, order)?;
            }

            marks[idx] = Mark::Done;
            order.push(table.name.as_str());
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.tables.len()];
        let mut order = Vec::with_capacity(self.tables.len());
        for idx in 0..self.tables.len() {
            visit(self, idx, &mut marks, &mut order)?;
        }
        Ok(order)
    }
}
