use crate::common::fixtures::schema;
use molar_core::query_builder::{ComparisonOp, FilterSpec, QueryBuilder, QuerySpec};
use molar_core::MolarError;
use serde_json::json;

fn where_clause(spec: &QuerySpec) -> String {
    let schema = schema();
    let sql = QueryBuilder::new(&schema)
        .build_unbounded(spec)
        .unwrap()
        .sql()
        .to_string();
    sql.split(" WHERE ")
        .nth(1)
        .map(str::to_string)
        .unwrap_or_default()
}

#[test]
fn test_column_to_column_comparison() {
    let spec = QuerySpec::new(&["calculation.energy"]).filter(FilterSpec::leaf(
        "calculation.conformer_id",
        ComparisonOp::Eq,
        json!("calculation.output_conformer_id"),
    ));
    assert_eq!(
        where_clause(&spec),
        "\"calculation\".\"conformer_id\" = \"calculation\".\"output_conformer_id\""
    );
}

#[test]
fn test_json_field_on_the_right_is_a_column_reference() {
    let spec = QuerySpec::new(&["molecule.smiles"]).filter(FilterSpec::leaf(
        "molecule.smiles",
        ComparisonOp::Eq,
        json!("molecule.metadata.smiles"),
    ));
    assert_eq!(
        where_clause(&spec),
        "\"molecule\".\"smiles\" = (\"molecule\".\"metadata\" ->> 'smiles')"
    );
}

#[test]
fn test_unresolvable_strings_are_literals() {
    let spec = QuerySpec::new(&["molecule.smiles"]).filter(FilterSpec::leaf(
        "molecule.smiles",
        ComparisonOp::Eq,
        json!("CC(=O)O"),
    ));
    assert_eq!(where_clause(&spec), "\"molecule\".\"smiles\" = 'CC(=O)O'");
}

#[test]
fn test_explicit_literal_tag_keeps_path_like_strings() {
    let spec = QuerySpec::new(&["molecule.smiles"]).filter(FilterSpec::leaf(
        "molecule.smiles",
        ComparisonOp::Eq,
        json!({"literal": "molecule.smiles"}),
    ));
    assert_eq!(where_clause(&spec), "\"molecule\".\"smiles\" = 'molecule.smiles'");
}

#[test]
fn test_nested_groups_and_json_fields() {
    let spec: QuerySpec = serde_json::from_value(json!({
        "types": "molecule.smiles",
        "filters": {
            "op": "and",
            "filters": [
                {"type": "molecule.smiles", "op": "like", "value": "C%"},
                {
                    "op": "or",
                    "filters": [
                        {"type": "molecule.metadata.source", "value": "pubchem"},
                        {"type": "molecule.molecule_type_id", "op": "==", "value": null}
                    ]
                }
            ]
        }
    }))
    .unwrap();

    assert_eq!(
        where_clause(&spec),
        "(\"molecule\".\"smiles\" LIKE 'C%' AND \
         ((\"molecule\".\"metadata\" ->> 'source') = 'pubchem' \
         OR \"molecule\".\"molecule_type_id\" IS NULL))"
    );
}

#[test]
fn test_membership_operators() {
    let spec = QuerySpec::new(&["software"]).filter(FilterSpec::and(vec![
        FilterSpec::leaf("software.name", ComparisonOp::In, json!(["psi4", "xtb"])),
        FilterSpec::leaf("software.version", ComparisonOp::NotIn, json!([])),
    ]));
    assert_eq!(
        where_clause(&spec),
        "(\"software\".\"name\" IN ('psi4', 'xtb') AND TRUE)"
    );

    let schema = schema();
    let err = QueryBuilder::new(&schema)
        .build(&QuerySpec::new(&["software"]).filter(FilterSpec::leaf(
            "software.name",
            ComparisonOp::In,
            json!("psi4"),
        )))
        .unwrap_err();
    assert!(matches!(err, MolarError::InvalidQuery(_)));
}

#[test]
fn test_filtered_tables_join_the_from_clause() {
    let schema = schema();
    let plan = QueryBuilder::new(&schema)
        .build_unbounded(&QuerySpec::new(&["molecule.smiles"]).filter(FilterSpec::leaf(
            "software.name",
            ComparisonOp::Eq,
            json!("psi4"),
        )))
        .unwrap();
    assert!(plan
        .sql()
        .contains("FROM \"public\".\"molecule\", \"public\".\"software\" WHERE"));
}

#[test]
fn test_filter_errors() {
    let schema = schema();
    let builder = QueryBuilder::new(&schema);

    let err = builder
        .build(&QuerySpec::new(&["molecule"]).filter(FilterSpec::leaf(
            "molecule",
            ComparisonOp::Eq,
            json!(1),
        )))
        .unwrap_err();
    assert!(matches!(err, MolarError::InvalidQuery(_)));

    let err = builder
        .build(&QuerySpec::new(&["molecule"]).filter(FilterSpec::leaf(
            "molecule.created_on",
            ComparisonOp::Gt,
            json!(null),
        )))
        .unwrap_err();
    assert!(matches!(err, MolarError::InvalidQuery(_)));

    let spec: QuerySpec = serde_json::from_value(json!({
        "types": ["molecule"],
        "filters": {"op": "xor", "filters": []}
    }))
    .unwrap();
    let err = builder.build(&spec).unwrap_err();
    assert!(matches!(err, MolarError::UnsupportedOperator { op } if op == "xor"));
}
