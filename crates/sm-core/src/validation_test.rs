use super::*;
use crate::migration_id::MigrationId;
use crate::procedure::ProcedureDef;
use crate::procedure_name::ProcedureName;
use std::collections::BTreeMap;

fn instruction(procedure: &str, table: &str, options: &[(&str, Value)]) -> Instruction {
    Instruction::new(
        ProcedureName::new(procedure),
        vec![Value::from(table)],
        options
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn migration(up: Vec<Instruction>, down: Vec<Instruction>) -> Migration {
    Migration::new(
        MigrationId::parse("20190513123000").unwrap(),
        "test_migration",
        up,
        down,
    )
}

#[test]
fn test_drop_index_with_column_is_valid() {
    let registry = ProcedureRegistry::builtin();
    let i = instruction("drop_index", "payments", &[("column", Value::from("payer"))]);
    assert!(validate_instruction(&registry, &i));
}

#[test]
fn test_drop_index_with_name_is_valid() {
    let registry = ProcedureRegistry::builtin();
    let i = instruction(
        "drop_index",
        "payments",
        &[("name", Value::from("index_payments_on_payer"))],
    );
    assert!(validate_instruction(&registry, &i));
}

#[test]
fn test_drop_index_without_target_is_invalid() {
    let registry = ProcedureRegistry::builtin();
    let i = instruction("drop_index", "payments", &[("algorithm", Value::from("concurrently"))]);
    assert!(!validate_instruction(&registry, &i));
}

#[test]
fn test_unvalidated_procedure_always_passes() {
    let registry = ProcedureRegistry::builtin();
    assert!(validate_instruction(&registry, &instruction("create_table", "users", &[])));
    assert!(validate_instruction(
        &ProcedureRegistry::empty(),
        &instruction("drop_index", "payments", &[])
    ));
}

#[test]
fn test_add_column_rules() {
    let registry = ProcedureRegistry::builtin();
    let check = |options: &[(&str, Value)]| {
        validate_instruction(&registry, &instruction("add_column", "users", options))
    };

    assert!(check(&[]));
    assert!(check(&[("null", Value::from(true))]));
    assert!(check(&[("null", Value::from(false)), ("default", Value::from(0))]));
    assert!(!check(&[("null", Value::from(false))]));
    assert!(!check(&[("null", Value::from(false)), ("default", Value::Null)]));
    assert!(!check(&[("unique", Value::from(true))]));
}

#[test]
fn test_require_any_option() {
    let validator = Validator::RequireAnyOption(vec!["after".to_string(), "before".to_string()]);
    assert!(validator.check(&instruction("add_enum_value", "status", &[("before", Value::from("x"))])));
    assert!(!validator.check(&instruction("add_enum_value", "status", &[])));
    assert_eq!(
        validator.requirement(),
        "requires one of the options `after`, `before`"
    );
}

#[test]
fn test_custom_validator() {
    let mut registry = ProcedureRegistry::builtin();
    registry
        .register(
            ProcedureDef::new("rename_table", LockClass::Exclusive).with_validator(
                Validator::custom("rename_table needs a target table", |i| {
                    i.positional_args().len() == 2
                }),
            ),
        )
        .unwrap();

    let ok = Instruction::new(
        ProcedureName::new("rename_table"),
        vec![Value::from("users"), Value::from("accounts")],
        BTreeMap::new(),
    );
    assert!(validate_instruction(&registry, &ok));
    assert!(!validate_instruction(&registry, &instruction("rename_table", "users", &[])));
    assert!(format!("{:?}", registry.validator("rename_table").unwrap()).contains("Custom"));
}

#[test]
fn test_validate_migration_reports_drop_index_requirement() {
    let registry = ProcedureRegistry::builtin();
    let m = migration(vec![instruction("drop_index", "payments", &[])], vec![]);

    let errors = validate_migration(&m, &registry);
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        CompileError::ValidationFailure {
            target,
            requirement,
        } => {
            assert_eq!(target, "up #1 drop_index");
            assert!(requirement.contains("`name`"));
            assert!(requirement.contains("`column`"));
        }
        other => panic!("expected ValidationFailure, got {other:?}"),
    }
}

#[test]
fn test_validate_migration_collects_all_failures() {
    let registry = ProcedureRegistry::builtin();
    let m = migration(
        vec![
            instruction("drop_index", "payments", &[]),
            instruction("add_column", "payments", &[("unique", Value::from(true))]),
        ],
        vec![instruction("drop_index", "payments", &[])],
    );
    assert_eq!(validate_migration(&m, &registry).len(), 3);
}

#[test]
fn test_valid_migration_has_no_errors() {
    let registry = ProcedureRegistry::builtin();
    let m = migration(
        vec![instruction("drop_index", "payments", &[("column", Value::from("payer"))])],
        vec![instruction("add_index", "payments", &[])],
    );
    assert!(validate_migration(&m, &registry).is_empty());
}

#[test]
fn test_concurrent_operation_must_be_alone() {
    let registry = ProcedureRegistry::builtin();
    let m = migration(
        vec![
            instruction("add_index", "payments", &[]),
            instruction("create_table", "payments", &[]),
        ],
        vec![],
    );
    let errors = validate_migration(&m, &registry);
    assert_eq!(errors.len(), 1);
    let message = errors[0].to_string();
    assert!(message.contains("migration 20190513123000 (up)"));
    assert!(message.contains("add_index"));
}

#[test]
fn test_exclusive_locks_on_multiple_tables_rejected() {
    let registry = ProcedureRegistry::builtin();
    let m = migration(
        vec![
            instruction("remove_column", "users", &[]),
            instruction("remove_column", "payments", &[]),
        ],
        vec![],
    );
    let errors = validate_migration(&m, &registry);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("payments, users"));
}

#[test]
fn test_exclusive_locks_on_one_table_allowed() {
    let registry = ProcedureRegistry::builtin();
    let m = migration(
        vec![
            instruction("add_column", "users", &[]),
            instruction("change_column_default", "users", &[]),
        ],
        vec![instruction("remove_column", "users", &[])],
    );
    assert!(validate_migration(&m, &registry).is_empty());
}
