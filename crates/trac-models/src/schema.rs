use serde::{Deserialize, Serialize};

use crate::value::BasicType;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    Table,
}

/// One column of a TABLE schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub field_name: String,
    pub field_order: u32,
    pub field_type: BasicType,
    #[serde(default)]
    pub business_key: bool,
    #[serde(default)]
    pub categorical: bool,
    #[serde(default)]
    pub nullable: bool,
    pub label: Option<String>,
    pub format_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<FieldSchema>,
}

/// A standalone schema definition, either embedded in a DATA object or
/// stored as its own SCHEMA object and referenced by selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub schema_type: SchemaType,
    pub table: TableSchema,
}

impl SchemaDefinition {
    pub fn field_names(&self) -> Vec<&str> {
        self.table
            .fields
            .iter()
            .map(|f| f.field_name.as_str())
            .collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.table.fields.iter().find(|f| f.field_name == name)
    }

    /// Checks whether `other` is a compatible successor schema: field
    /// additions are permitted, but removals or type changes are not.
    pub fn is_compatible_update(&self, other: &SchemaDefinition) -> Result<(), String> {
        if self.schema_type != other.schema_type {
            return Err("schema type changed".to_string());
        }
        for field in &self.table.fields {
            match other.field(&field.field_name) {
                None => {
                    return Err(format!("field '{}' was removed", field.field_name));
                }
                Some(new_field) if new_field.field_type != field.field_type => {
                    return Err(format!(
                        "field '{}' changed type from {:?} to {:?}",
                        field.field_name, field.field_type, new_field.field_type
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
