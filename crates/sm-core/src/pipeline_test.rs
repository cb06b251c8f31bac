use super::*;
use crate::timeout::ResolvedTimeouts;
use std::cell::RefCell;
use std::path::Path;

/// Renders each instruction as `procedure lock/statement`
struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, migration: &Migration) -> Result<String, CollaboratorError> {
        let mut out = format!("{}\n", migration.name());
        for (position, instruction) in migration.instructions() {
            let timeouts = instruction.timeouts().ok_or("unresolved instruction")?;
            out.push_str(&format!(
                "{} {}/{}\n",
                position, timeouts.lock_timeout, timeouts.statement_timeout
            ));
        }
        Ok(out)
    }
}

struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn render(&self, _migration: &Migration) -> Result<String, CollaboratorError> {
        Err("template exploded".into())
    }
}

struct Uppercase;

impl PostProcessor for Uppercase {
    fn process(&self, rendered: &str) -> Result<String, CollaboratorError> {
        Ok(rendered.to_uppercase())
    }
}

struct RejectingHook;

impl PostProcessor for RejectingHook {
    fn process(&self, _rendered: &str) -> Result<String, CollaboratorError> {
        Err("formatter crashed".into())
    }
}

#[derive(Default)]
struct MemoryWriter {
    written: RefCell<Vec<(String, String)>>,
}

impl MigrationWriter for MemoryWriter {
    fn write(&self, migration: &Migration, text: &str) -> Result<PathBuf, CollaboratorError> {
        self.written
            .borrow_mut()
            .push((migration.id().to_string(), text.to_string()));
        Ok(output_path(migration))
    }

    fn existing(
        &self,
        migration: &Migration,
    ) -> Result<Option<(PathBuf, String)>, CollaboratorError> {
        let written = self.written.borrow();
        Ok(written
            .iter()
            .rev()
            .find(|(id, _)| id == migration.id().as_str())
            .map(|(_, text)| (output_path(migration), text.clone())))
    }
}

fn output_path(migration: &Migration) -> PathBuf {
    Path::new("out").join(format!("{}_{}.rb", migration.id(), migration.slug()))
}

struct FailingWriter;

impl MigrationWriter for FailingWriter {
    fn write(&self, _migration: &Migration, _text: &str) -> Result<PathBuf, CollaboratorError> {
        Err("disk full".into())
    }
}

fn source(id: &str, slug: &str, content: &str) -> MigrationSource {
    MigrationSource {
        id: MigrationId::parse(id).unwrap(),
        slug: slug.to_string(),
        path: PathBuf::from(format!("db/safe_migrations/{}_{}.yml", id, slug)),
        content: content.to_string(),
    }
}

const DROP_PAYER_INDEX: &str = r#"
up:
  - procedure: drop_index
    args: [payments]
    options: { column: payer }
"#;

const DROP_INDEX_WITHOUT_TARGET: &str = r#"
up:
  - procedure: drop_index
    args: [payments]
"#;

const CONCURRENT_WITH_OVERRIDES: &str = r#"
lock_timeout: 9000000
statement_timeout: 100
up:
  - procedure: add_index
    args: [payments, [payer]]
"#;

#[test]
fn test_drop_index_with_column_compiles_with_exclusive_defaults() {
    let registry = ProcedureRegistry::builtin();
    let policy = TimeoutPolicy::default();
    let writer = MemoryWriter::default();
    let compiler = Compiler::new(&registry, &policy, &PlainRenderer, &writer);

    let migration = compiler
        .build(&source("20190513123000", "drop_payer_index", DROP_PAYER_INDEX))
        .unwrap();
    assert_eq!(
        migration.up()[0].timeouts(),
        Some(ResolvedTimeouts {
            lock_timeout: 5_000,
            statement_timeout: 1_500,
        })
    );
}

#[test]
fn test_drop_index_without_target_fails_before_resolution() {
    let registry = ProcedureRegistry::builtin();
    let policy = TimeoutPolicy::default();
    let writer = MemoryWriter::default();
    let compiler = Compiler::new(&registry, &policy, &PlainRenderer, &writer);

    let errors = compiler
        .build(&source("20190513123000", "bad", DROP_INDEX_WITHOUT_TARGET))
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        CompileError::ValidationFailure { target, requirement } => {
            assert!(target.contains("drop_index"));
            assert!(requirement.contains("`name` or `column`"));
        }
        other => panic!("expected ValidationFailure, got {other:?}"),
    }
}

#[test]
fn test_concurrent_statement_below_floor_fails() {
    let registry = ProcedureRegistry::builtin();
    let policy = TimeoutPolicy::default();
    let writer = MemoryWriter::default();
    let compiler = Compiler::new(&registry, &policy, &PlainRenderer, &writer);

    let errors = compiler
        .build(&source("20190513123000", "index", CONCURRENT_WITH_OVERRIDES))
        .unwrap_err();
    // The 9_000_000ms lock timeout is accepted; only the statement timeout fails
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        CompileError::TimeoutOutOfBounds {
            kind,
            bound,
            limit,
            value,
            ..
        } => {
            assert_eq!(*kind, crate::timeout::TimeoutKind::Statement);
            assert_eq!(*bound, crate::timeout::Bound::Minimum);
            assert_eq!(*limit, 3_600_000);
            assert_eq!(*value, 100);
        }
        other => panic!("expected TimeoutOutOfBounds, got {other:?}"),
    }
}

#[test]
fn test_reversible_index_with_long_statement_timeout_compiles() {
    let registry = ProcedureRegistry::builtin();
    let policy = TimeoutPolicy::default();
    let writer = MemoryWriter::default();
    let compiler = Compiler::new(&registry, &policy, &PlainRenderer, &writer);

    let migration = compiler
        .build(&source(
            "20190513123000",
            "add_payer_index",
            r#"
statement_timeout: 7200000
up:
  - procedure: add_index
    args: [payments, [payer]]
down:
  - procedure: drop_index
    args: [payments]
    options: { column: payer }
"#,
        ))
        .unwrap();
    assert_eq!(
        migration.up()[0].timeouts(),
        Some(ResolvedTimeouts {
            lock_timeout: 3_600_000,
            statement_timeout: 7_200_000,
        })
    );
    assert_eq!(
        migration.down()[0].timeouts(),
        Some(ResolvedTimeouts {
            lock_timeout: 5_000,
            statement_timeout: 1_500,
        })
    );
}

#[test]
fn test_batch_continues_past_failures() {
    let registry = ProcedureRegistry::builtin();
    let policy = TimeoutPolicy::default();
    let writer = MemoryWriter::default();
    let compiler = Compiler::new(&registry, &policy, &PlainRenderer, &writer);
    let mut lockfile = Lockfile::new();

    let sources = vec![
        source("20190601000000", "third", DROP_PAYER_INDEX),
        source("20190513123000", "first", DROP_PAYER_INDEX),
        source("20190520000000", "second", DROP_INDEX_WITHOUT_TARGET),
    ];
    let report = compiler.compile(&sources, &mut lockfile);

    assert!(!report.is_success());
    assert_eq!(report.error_count(), 1);
    let compiled: Vec<&str> = report.compiled.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(compiled, vec!["20190513123000", "20190601000000"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "20190520000000");

    assert!(lockfile.contains("20190513123000"));
    assert!(lockfile.contains("20190601000000"));
    assert!(!lockfile.contains("20190520000000"));
    assert_eq!(writer.written.borrow().len(), 2);
}

#[test]
fn test_unchanged_sources_are_skipped() {
    let registry = ProcedureRegistry::builtin();
    let policy = TimeoutPolicy::default();
    let writer = MemoryWriter::default();
    let mut lockfile = Lockfile::new();
    let sources = vec![source("20190513123000", "first", DROP_PAYER_INDEX)];

    let compiler = Compiler::new(&registry, &policy, &PlainRenderer, &writer);
    let first = compiler.compile(&sources, &mut lockfile);
    assert_eq!(first.compiled.len(), 1);

    let second = compiler.compile(&sources, &mut lockfile);
    assert!(second.compiled.is_empty());
    assert_eq!(second.skipped.len(), 1);

    let forced = Compiler::new(&registry, &policy, &PlainRenderer, &writer)
        .force(true)
        .compile(&sources, &mut lockfile);
    assert_eq!(forced.compiled.len(), 1);
    assert_eq!(writer.written.borrow().len(), 2);
}

#[test]
fn test_changed_source_recompiles() {
    let registry = ProcedureRegistry::builtin();
    let policy = TimeoutPolicy::default();
    let writer = MemoryWriter::default();
    let compiler = Compiler::new(&registry, &policy, &PlainRenderer, &writer);
    let mut lockfile = Lockfile::new();

    compiler.compile(
        &[source("20190513123000", "first", DROP_PAYER_INDEX)],
        &mut lockfile,
    );
    let edited = DROP_PAYER_INDEX.replace("payer", "payee");
    let report = compiler.compile(&[source("20190513123000", "first", &edited)], &mut lockfile);
    assert_eq!(report.compiled.len(), 1);
}

#[test]
fn test_hand_edited_output_is_not_overwritten() {
    let registry = ProcedureRegistry::builtin();
    let policy = TimeoutPolicy::default();
    let writer = MemoryWriter::default();
    let compiler = Compiler::new(&registry, &policy, &PlainRenderer, &writer);
    let mut lockfile = Lockfile::new();

    compiler.compile(
        &[source("20190513123000", "first", DROP_PAYER_INDEX)],
        &mut lockfile,
    );
    writer.written.borrow_mut()[0].1.push_str("# tuned by hand\n");

    let edited = [source(
        "20190513123000",
        "first",
        &DROP_PAYER_INDEX.replace("payer", "payee"),
    )];
    let report = compiler.compile(&edited, &mut lockfile);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].errors[0].code(), "C007");
    assert!(report.failed[0].errors[0]
        .to_string()
        .contains("20190513123000_first.rb"));
    assert_eq!(writer.written.borrow().len(), 1);
    assert!(lockfile.needs_compile(&edited[0].id, &edited[0].content));

    let forced = Compiler::new(&registry, &policy, &PlainRenderer, &writer)
        .force(true)
        .compile(&edited, &mut lockfile);
    assert!(forced.is_success());
    assert_eq!(writer.written.borrow().len(), 2);
}

#[test]
fn test_post_processor_output_is_written_and_recorded() {
    let registry = ProcedureRegistry::builtin();
    let policy = TimeoutPolicy::default();
    let writer = MemoryWriter::default();
    let compiler =
        Compiler::new(&registry, &policy, &PlainRenderer, &writer).with_post_processor(&Uppercase);
    let mut lockfile = Lockfile::new();
    let src = source("20190513123000", "drop_payer_index", DROP_PAYER_INDEX);

    let report = compiler.compile(std::slice::from_ref(&src), &mut lockfile);
    assert!(report.is_success());

    let written = writer.written.borrow();
    assert_eq!(written[0].1, "DROPPAYERINDEX\nUP #1 DROP_INDEX 5000/1500\n");
    assert_eq!(
        lockfile.check_drift(&src.id, &written[0].1),
        crate::lockfile::DriftStatus::Clean
    );
}

#[test]
fn test_collaborator_failures_leave_lockfile_untouched() {
    let registry = ProcedureRegistry::builtin();
    let policy = TimeoutPolicy::default();
    let memory = MemoryWriter::default();
    let sources = vec![source("20190513123000", "first", DROP_PAYER_INDEX)];

    let cases: Vec<(Compiler<'_>, &str)> = vec![
        (
            Compiler::new(&registry, &policy, &FailingRenderer, &memory),
            "C004",
        ),
        (
            Compiler::new(&registry, &policy, &PlainRenderer, &memory)
                .with_post_processor(&RejectingHook),
            "C005",
        ),
        (
            Compiler::new(&registry, &policy, &PlainRenderer, &FailingWriter),
            "C006",
        ),
    ];

    for (compiler, code) in cases {
        let mut lockfile = Lockfile::new();
        let report = compiler.compile(&sources, &mut lockfile);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].errors[0].code(), code);
        assert!(lockfile.is_empty());
    }
    assert!(memory.written.borrow().is_empty());
}

#[test]
fn test_unparsable_definition_is_reported() {
    let registry = ProcedureRegistry::builtin();
    let policy = TimeoutPolicy::default();
    let writer = MemoryWriter::default();
    let compiler = Compiler::new(&registry, &policy, &PlainRenderer, &writer);
    let mut lockfile = Lockfile::new();

    let report = compiler.compile(
        &[source("20190513123000", "broken", "up: [")],
        &mut lockfile,
    );
    assert_eq!(report.failed[0].errors[0].code(), "C003");
    assert!(report.failed[0].source.ends_with("20190513123000_broken.yml"));
}
