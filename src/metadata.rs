use serde::Serialize;

/// Mutable target a self-describing type populates with its mapping.
///
/// The driver never inspects a sink; it only conveys it to the type's
/// descriptor.
pub trait MetadataSink {
    fn set_table_name(&mut self, table: &str);
    fn map_field(&mut self, field: FieldMapping);
    fn map_association(&mut self, association: AssociationMapping);
}

/// Capability of a type that describes its own persistence mapping.
///
/// A registry record carrying a descriptor marks the type as an entity;
/// records without one are transient.
pub trait SelfDescribing: Send + Sync {
    fn load_metadata(&self, sink: &mut dyn MetadataSink);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    pub name: String,
    pub sql_type: String,
    pub column: String,
    pub id: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssociationKind {
    ManyToOne,
    OneToMany,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationMapping {
    pub field: String,
    pub target_class: String,
    pub kind: AssociationKind,
}

/// Collected mapping for one class: the standard sink implementation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassMetadata {
    pub class_name: String,
    pub table_name: String,
    pub fields: Vec<FieldMapping>,
    pub associations: Vec<AssociationMapping>,
}

impl ClassMetadata {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn id_fields(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields.iter().filter(|f| f.id)
    }
}

impl MetadataSink for ClassMetadata {
    fn set_table_name(&mut self, table: &str) {
        self.table_name = table.to_string();
    }

    fn map_field(&mut self, field: FieldMapping) {
        self.fields.push(field);
    }

    fn map_association(&mut self, association: AssociationMapping) {
        self.associations.push(association);
    }
}

/// One mapping call extracted from a metadata method body.
///
/// A field without an explicit column defaults to its own name when applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MappingDirective {
    SetTableName {
        table: String,
    },
    MapIdField {
        name: String,
        sql_type: String,
    },
    MapField {
        name: String,
        sql_type: String,
        column: Option<String>,
    },
    MapManyToOne {
        field: String,
        target_class: String,
    },
    MapOneToMany {
        field: String,
        target_class: String,
    },
}

impl MappingDirective {
    pub fn apply(&self, sink: &mut dyn MetadataSink) {
        match self {
            Self::SetTableName { table } => sink.set_table_name(table),
            Self::MapIdField { name, sql_type } => sink.map_field(FieldMapping {
                name: name.clone(),
                sql_type: sql_type.clone(),
                column: name.clone(),
                id: true,
            }),
            Self::MapField {
                name,
                sql_type,
                column,
            } => sink.map_field(FieldMapping {
                name: name.clone(),
                sql_type: sql_type.clone(),
                column: column.clone().unwrap_or_else(|| name.clone()),
                id: false,
            }),
            Self::MapManyToOne {
                field,
                target_class,
            } => sink.map_association(AssociationMapping {
                field: field.clone(),
                target_class: target_class.clone(),
                kind: AssociationKind::ManyToOne,
            }),
            Self::MapOneToMany {
                field,
                target_class,
            } => sink.map_association(AssociationMapping {
                field: field.clone(),
                target_class: target_class.clone(),
                kind: AssociationKind::OneToMany,
            }),
        }
    }
}

/// Replays a recorded directive sequence, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct MetadataDescriptor {
    directives: Vec<MappingDirective>,
}

impl MetadataDescriptor {
    pub fn new(directives: Vec<MappingDirective>) -> Self {
        Self { directives }
    }
}

impl SelfDescribing for MetadataDescriptor {
    fn load_metadata(&self, sink: &mut dyn MetadataSink) {
        for directive in &self.directives {
            directive.apply(sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_populate_sink_in_order() {
        let descriptor = MetadataDescriptor::new(vec![
            MappingDirective::SetTableName {
                table: "users".to_string(),
            },
            MappingDirective::MapIdField {
                name: "id".to_string(),
                sql_type: "bigint".to_string(),
            },
            MappingDirective::MapField {
                name: "email".to_string(),
                sql_type: "varchar".to_string(),
                column: Some("email_address".to_string()),
            },
            MappingDirective::MapManyToOne {
                field: "group".to_string(),
                target_class: "org.example.Group".to_string(),
            },
        ]);

        let mut metadata = ClassMetadata::new("org.example.User");
        descriptor.load_metadata(&mut metadata);

        assert_eq!(metadata.table_name, "users");
        assert_eq!(metadata.fields.len(), 2);
        assert_eq!(metadata.fields[0].name, "id");
        assert!(metadata.fields[0].id);
        assert_eq!(metadata.fields[1].column, "email_address");
        assert!(!metadata.fields[1].id);
        assert_eq!(metadata.associations.len(), 1);
        assert_eq!(metadata.associations[0].kind, AssociationKind::ManyToOne);
        assert_eq!(metadata.id_fields().count(), 1);
    }

    #[test]
    fn field_column_defaults_to_field_name() {
        let mut metadata = ClassMetadata::new("org.example.Note");
        MappingDirective::MapField {
            name: "body".to_string(),
            sql_type: "text".to_string(),
            column: None,
        }
        .apply(&mut metadata);

        assert_eq!(metadata.fields[0].column, "body");
    }

    #[test]
    fn empty_descriptor_leaves_sink_untouched() {
        let descriptor = MetadataDescriptor::default();
        let mut metadata = ClassMetadata::new("org.example.Marker");
        descriptor.load_metadata(&mut metadata);

        assert_eq!(metadata.class_name, "org.example.Marker");
        assert!(metadata.table_name.is_empty());
        assert!(metadata.fields.is_empty());
        assert!(metadata.associations.is_empty());
    }

    #[test]
    fn class_metadata_serializes_for_cli_output() {
        let mut metadata = ClassMetadata::new("org.example.User");
        metadata.set_table_name("users");

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["class_name"], "org.example.User");
        assert_eq!(json["table_name"], "users");
    }
}
