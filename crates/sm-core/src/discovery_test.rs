use super::*;
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

#[test]
fn test_parse_file_name() {
    let (id, slug) = parse_file_name("20190513123000_add_payer_index.yml").unwrap();
    assert_eq!(id, "20190513123000");
    assert_eq!(slug, "add_payer_index");

    assert!(parse_file_name("20190513123000_add_payer_index.yaml").is_some());
    assert!(parse_file_name("2019051312300_short.yml").is_none());
    assert!(parse_file_name("20190513123000_AddPayer.yml").is_none());
    assert!(parse_file_name("20190513123000_add_payer_index.rb").is_none());
    assert!(parse_file_name("notes.yml").is_none());
}

#[test]
fn test_output_file_name_and_class_name() {
    let source = MigrationSource {
        id: MigrationId::parse("20190513123000").unwrap(),
        slug: "add_payer_index".to_string(),
        path: PathBuf::from("db/safe_migrations/20190513123000_add_payer_index.yml"),
        content: String::new(),
    };
    assert_eq!(source.class_name(), "AddPayerIndex");
    assert_eq!(
        source.output_file_name("rb"),
        "20190513123000_add_payer_index.rb"
    );
}

#[test]
fn test_discover_all_sorted() {
    let dir = project(&[
        ("20190601000000_second.yml", "up: []"),
        ("20190513123000_first.yaml", "up: [first]"),
        ("README.md", "ignored"),
        ("draft.yml", "ignored"),
    ]);
    let sources = DirectoryDiscovery::new(dir.path())
        .discover(&FileSelection::All)
        .unwrap();

    let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["20190513123000", "20190601000000"]);
    assert_eq!(sources[0].slug, "first");
    assert_eq!(sources[0].content, "up: [first]");
}

#[test]
fn test_discover_with_range() {
    let dir = project(&[
        ("20181231000000_old.yml", ""),
        ("20190513123000_mid.yml", ""),
        ("20200101000000_new.yml", ""),
    ]);
    let selection = FileSelection::parse(">=2019,<=2019").unwrap();
    let sources = DirectoryDiscovery::new(dir.path()).discover(&selection).unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].slug, "mid");
}

#[test]
fn test_discover_with_timestamp_prefix() {
    let dir = project(&[
        ("20190513123000_a.yml", ""),
        ("20190513130000_b.yml", ""),
        ("20190514000000_c.yml", ""),
    ]);
    let selection = FileSelection::parse("20190513").unwrap();
    let sources = DirectoryDiscovery::new(dir.path()).discover(&selection).unwrap();
    assert_eq!(sources.len(), 2);
}

#[test]
fn test_duplicate_ids_rejected() {
    let dir = project(&[
        ("20190513123000_a.yml", ""),
        ("20190513123000_b.yml", ""),
    ]);
    let err = DirectoryDiscovery::new(dir.path())
        .discover(&FileSelection::All)
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateMigrationId { ref id, .. } if id == "20190513123000"));
}

#[test]
fn test_missing_directory() {
    let dir = TempDir::new().unwrap();
    let err = DirectoryDiscovery::new(dir.path().join("nope"))
        .discover(&FileSelection::All)
        .unwrap_err();
    assert!(matches!(err, CoreError::MigrationDirectoryNotFound { .. }));
}

#[test]
fn test_parse_porcelain() {
    let stdout = "\
 M db/safe_migrations/20190513123000_a.yml
?? db/safe_migrations/20190601000000_b.yml
 D db/safe_migrations/20190101000000_gone.yml
R  db/safe_migrations/20180101000000_old.yml -> db/safe_migrations/20190701000000_renamed.yml
A  \"db/safe_migrations/20190801000000_quoted.yml\"
";
    let changed = parse_porcelain(stdout);
    assert!(changed.contains("20190513123000_a.yml"));
    assert!(changed.contains("20190601000000_b.yml"));
    assert!(changed.contains("20190701000000_renamed.yml"));
    assert!(changed.contains("20190801000000_quoted.yml"));
    assert!(!changed.contains("20190101000000_gone.yml"));
    assert!(!changed.contains("20180101000000_old.yml"));
    assert_eq!(changed.len(), 4);
}

#[test]
fn test_parse_porcelain_empty() {
    assert!(parse_porcelain("").is_empty());
}
