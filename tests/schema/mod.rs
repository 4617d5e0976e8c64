use crate::common::fixtures::{schema, shared_schema};
use molar_core::schema::{SchemaSource, StaticSchemaSource};

#[test]
fn test_describe_lists_tables_in_name_order() {
    let summaries = schema().describe();
    let tables: Vec<&str> = summaries.iter().map(|summary| summary.table.as_str()).collect();
    assert_eq!(
        tables,
        vec!["calculation", "conformer", "molecule", "molecule_type", "software"]
    );

    let calculation = &summaries[0];
    assert_eq!(calculation.primary_key, vec!["calculation_id"]);
    assert_eq!(calculation.references, vec!["conformer", "conformer", "software"]);
}

#[test]
fn test_relationships_are_found_in_both_directions() {
    let schema = schema();

    let forward = schema.relationships_between("molecule", "molecule_type");
    let backward = schema.relationships_between("molecule_type", "molecule");
    assert_eq!(forward, backward);
    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].referencing, "molecule");
    assert_eq!(
        forward[0].to_string(),
        "molecule.molecule_type_id -> molecule_type.molecule_type_id"
    );

    assert_eq!(schema.relationships_between("calculation", "conformer").len(), 2);
    assert!(schema.relationships_between("software", "molecule").is_empty());
}

#[test]
fn test_attribute_lookup() {
    let schema = schema();
    assert!(schema.attribute("molecule", "metadata").unwrap().column_type.is_json());
    assert!(schema.attribute("molecule", "nope").is_none());
    assert!(schema.attribute("nope", "smiles").is_none());
    assert_eq!(
        schema.entity("software").unwrap().row_id_column().unwrap().name,
        "software_id"
    );
}

#[tokio::test]
async fn test_static_source_ignores_schema_filter() {
    let source = StaticSchemaSource::new(shared_schema().as_ref().clone());
    let loaded = source.load(&["nothing".to_string()]).await.unwrap();
    assert_eq!(loaded.len(), 5);
    assert!(loaded.contains("conformer"));
}
