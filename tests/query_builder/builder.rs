use crate::common::fixtures::schema;
use molar_core::config::QueryConfig;
use molar_core::query_builder::{
    ComparisonOp, FilterSpec, JoinKind, JoinSpec, QueryBuilder, QuerySpec, ResolvedTarget,
    SortOrder,
};
use molar_core::MolarError;
use serde_json::json;

#[test]
fn test_join_is_inferred_from_the_single_foreign_key() {
    let schema = schema();
    let plan = QueryBuilder::new(&schema)
        .build(
            &QuerySpec::new(&["molecule.smiles", "molecule_type.name"])
                .join(JoinSpec::new("molecule_type")),
        )
        .unwrap();

    assert_eq!(
        plan.sql(),
        "SELECT to_jsonb(\"molecule\".\"smiles\") AS \"t0\", \
         to_jsonb(\"molecule_type\".\"name\") AS \"t1\" \
         FROM \"public\".\"molecule\" \
         INNER JOIN \"public\".\"molecule_type\" \
         ON \"molecule\".\"molecule_type_id\" = \"molecule_type\".\"molecule_type_id\" \
         ORDER BY \"molecule\".\"updated_on\" ASC LIMIT 10"
    );
}

#[test]
fn test_outer_join_attaches_to_the_referenced_side() {
    let schema = schema();
    let plan = QueryBuilder::new(&schema)
        .build(
            &QuerySpec::new(&["molecule", "conformer"])
                .join(JoinSpec::new("conformer").kind(JoinKind::Outer)),
        )
        .unwrap();

    assert!(plan.sql().contains(
        "FROM \"public\".\"molecule\" LEFT OUTER JOIN \"public\".\"conformer\" \
         ON \"conformer\".\"molecule_id\" = \"molecule\".\"molecule_id\""
    ));
    assert_eq!(plan.projections.len(), 2);
}

#[test]
fn test_full_join_renders() {
    let schema = schema();
    let plan = QueryBuilder::new(&schema)
        .build(&QuerySpec::new(&["software"]).join(JoinSpec::new("calculation").kind(JoinKind::Full)))
        .unwrap();
    assert!(plan.sql().contains(
        "FULL OUTER JOIN \"public\".\"calculation\" \
         ON \"calculation\".\"software_id\" = \"software\".\"software_id\""
    ));
}

#[test]
fn test_ambiguous_join_requires_an_on_clause() {
    let schema = schema();
    let builder = QueryBuilder::new(&schema);

    let err = builder
        .build(&QuerySpec::new(&["calculation"]).join(JoinSpec::new("conformer")))
        .unwrap_err();
    let MolarError::AmbiguousRelationship { candidates, .. } = err else {
        panic!("expected an ambiguous relationship, got {err:?}");
    };
    assert_eq!(candidates.len(), 2);

    let plan = builder
        .build(
            &QuerySpec::new(&["calculation"]).join(
                JoinSpec::new("conformer")
                    .on("calculation.output_conformer_id", "conformer.conformer_id"),
            ),
        )
        .unwrap();
    assert!(plan.sql().contains(
        "INNER JOIN \"public\".\"conformer\" \
         ON \"calculation\".\"output_conformer_id\" = \"conformer\".\"conformer_id\""
    ));
}

#[test]
fn test_unrelated_join_fails() {
    let schema = schema();
    let err = QueryBuilder::new(&schema)
        .build(&QuerySpec::new(&["software"]).join(JoinSpec::new("molecule")))
        .unwrap_err();
    assert!(matches!(err, MolarError::NoRelationship { .. }));
}

#[test]
fn test_joining_the_only_requested_table_is_a_duplicate() {
    let schema = schema();
    let builder = QueryBuilder::new(&schema);

    let err = builder
        .build(&QuerySpec::new(&["molecule"]).join(JoinSpec::new("molecule")))
        .unwrap_err();
    assert!(matches!(err, MolarError::DuplicateField { .. }));

    let err = builder
        .build(
            &QuerySpec::new(&["molecule"])
                .join(JoinSpec::new("conformer"))
                .join(JoinSpec::new("conformer")),
        )
        .unwrap_err();
    assert!(matches!(err, MolarError::DuplicateField { field } if field == "conformer"));
}

#[test]
fn test_join_target_must_be_a_table() {
    let schema = schema();
    let err = QueryBuilder::new(&schema)
        .build(&QuerySpec::new(&["molecule"]).join(JoinSpec::new("conformer.x")))
        .unwrap_err();
    assert!(matches!(err, MolarError::InvalidQuery(_)));
}

#[test]
fn test_aliased_self_join() {
    let schema = schema();
    let plan = QueryBuilder::new(&schema)
        .build(
            &QuerySpec::new(&["molecule.smiles", "m.smiles"])
                .alias("molecule", "m")
                .join(JoinSpec::new("m").on("m.molecule_type_id", "molecule.molecule_type_id")),
        )
        .unwrap();

    assert!(plan.sql().contains(
        "FROM \"public\".\"molecule\" INNER JOIN \"public\".\"molecule\" AS \"m\" \
         ON \"m\".\"molecule_type_id\" = \"molecule\".\"molecule_type_id\""
    ));
    assert!(plan.sql().contains("to_jsonb(\"m\".\"smiles\") AS \"t1\""));
}

#[test]
fn test_alias_collisions_are_rejected() {
    let schema = schema();
    let builder = QueryBuilder::new(&schema);

    let err = builder
        .build(&QuerySpec::new(&["molecule"]).alias("molecule", "software"))
        .unwrap_err();
    assert!(matches!(err, MolarError::InvalidQuery(_)));

    let err = builder
        .build(
            &QuerySpec::new(&["molecule"])
                .alias("molecule", "m")
                .alias("conformer", "m"),
        )
        .unwrap_err();
    assert!(matches!(err, MolarError::InvalidQuery(_)));
}

#[test]
fn test_json_sub_field_wins_over_aliases() {
    let schema = schema();
    let plan = QueryBuilder::new(&schema)
        .build(&QuerySpec::new(&["molecule.metadata.source"]).alias("software.name", "source"))
        .unwrap();

    assert!(matches!(
        &plan.projections[0].target,
        ResolvedTarget::JsonField { key, .. } if key == "source"
    ));
    assert!(plan
        .sql()
        .starts_with("SELECT to_jsonb((\"molecule\".\"metadata\" ->> 'source')) AS \"t0\""));
}

#[test]
fn test_unresolvable_paths_report_the_full_path() {
    let schema = schema();
    let builder = QueryBuilder::new(&schema);

    for path in ["molecule.nope", "nope", "molecule.smiles.deeper", "molecule..smiles"] {
        let err = builder.build(&QuerySpec::new(&[path])).unwrap_err();
        assert!(
            matches!(&err, MolarError::TypeNotFound { path: reported } if reported == path),
            "{path}: {err:?}"
        );
    }
}

#[test]
fn test_aliases_are_not_looked_up_below_a_plain_column() {
    let schema = schema();
    let builder = QueryBuilder::new(&schema);

    let path = "molecule.smiles.c";
    let err = builder
        .build(&QuerySpec::new(&[path]).alias("conformer", "c"))
        .unwrap_err();
    assert!(
        matches!(&err, MolarError::TypeNotFound { path: reported } if reported == path),
        "{err:?}"
    );

    let plan = builder
        .build(&QuerySpec::new(&["molecule.metadata.c"]).alias("conformer", "c"))
        .unwrap();
    assert!(matches!(
        &plan.projections[0].target,
        ResolvedTarget::JsonField { key, .. } if key == "c"
    ));
}

#[test]
fn test_repeated_filters_are_combined() {
    let schema = schema();
    let plan = QueryBuilder::new(&schema)
        .build_unbounded(
            &QuerySpec::new(&["molecule.smiles"])
                .filter(FilterSpec::leaf("molecule.smiles", ComparisonOp::Eq, json!("C")))
                .filter(FilterSpec::leaf(
                    "molecule.metadata.source",
                    ComparisonOp::Eq,
                    json!("pubchem"),
                )),
        )
        .unwrap();

    let (_, predicate) = plan.sql().split_once(" WHERE ").unwrap();
    assert!(predicate.contains("\"molecule\".\"smiles\" = 'C'"), "{predicate}");
    assert!(
        predicate.contains("(\"molecule\".\"metadata\" ->> 'source') = 'pubchem'"),
        "{predicate}"
    );
    assert!(predicate.contains(" AND "), "{predicate}");
}

#[test]
fn test_explicit_order_replaces_the_default() {
    let schema = schema();
    let builder = QueryBuilder::new(&schema);

    let plan = builder
        .build(
            &QuerySpec::new(&["molecule"])
                .order_by("molecule.smiles", SortOrder::Desc)
                .order_by("molecule.created_on", SortOrder::Asc)
                .limit(5),
        )
        .unwrap();
    assert!(plan.sql().ends_with(
        "ORDER BY \"molecule\".\"smiles\" DESC, \"molecule\".\"created_on\" ASC LIMIT 5"
    ));

    let err = builder
        .build(&QuerySpec::new(&["molecule"]).order_by("molecule", SortOrder::Asc))
        .unwrap_err();
    assert!(matches!(err, MolarError::InvalidQuery(_)));
}

#[test]
fn test_limits_are_clamped() {
    let schema = schema();
    let builder = QueryBuilder::new(&schema).with_limits(QueryConfig {
        default_limit: 25,
        max_limit: 100,
    });

    let plan = builder.build(&QuerySpec::new(&["software"])).unwrap();
    assert!(plan.sql().ends_with(" LIMIT 25"));

    let plan = builder
        .build(&QuerySpec::new(&["software"]).limit(1000).offset(3))
        .unwrap();
    assert!(plan.sql().ends_with(" LIMIT 100 OFFSET 3"));
}

#[test]
fn test_multi_type_projection_keys_must_not_collide() {
    let schema = schema();
    let builder = QueryBuilder::new(&schema);

    assert!(builder
        .build(&QuerySpec::new(&["molecule", "conformer"]))
        .is_ok());

    let err = builder
        .build(&QuerySpec::new(&["molecule", "molecule.smiles"]))
        .unwrap_err();
    assert!(matches!(err, MolarError::DuplicateField { .. }));
}

#[test]
fn test_compilation_is_deterministic() {
    let schema = schema();
    let spec = QuerySpec::new(&["molecule", "molecule_type.name"])
        .join(JoinSpec::new("molecule_type"))
        .order_by("molecule_type.name", SortOrder::Asc);

    let first = QueryBuilder::new(&schema).build(&spec).unwrap();
    let second = QueryBuilder::new(&schema).build(&spec).unwrap();
    assert_eq!(first.sql(), second.sql());
}
