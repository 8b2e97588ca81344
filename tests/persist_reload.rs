use std::fs;

use tempfile::TempDir;

use moviecat::{
    codec,
    config::CatalogConfig,
    core::catalog::Catalog,
    movie::{MovieDraft, MovieRecord},
    persist::{CatalogSink, PersistError, flat_file::FlatFileSink},
};

fn draft(title: &str, year: i32) -> MovieDraft {
    MovieDraft {
        title: title.to_string(),
        year,
        director: "Someone, Jr.".to_string(),
        genre: "Drama".to_string(),
        cast: vec!["A \"star\"".to_string(), "B".to_string()],
        plot_summary: "Line one.\nLine two, with {braces}.".to_string(),
    }
}

#[test]
fn missing_store_file_opens_empty() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");

    let catalog = Catalog::open(CatalogConfig::with_store_path(&path)).expect("open");
    assert!(catalog.is_empty());
    assert!(!catalog.is_dirty());
    drop(catalog);
    assert!(!path.exists(), "an untouched catalog writes nothing");
}

#[test]
fn libraries_and_annotations_survive_reopen() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");

    let mut catalog = Catalog::open(CatalogConfig::with_store_path(&path)).expect("open");
    catalog.add_movie("alice", draft("Dune", 1984));
    catalog.add_movie("alice", draft("Heat", 1995));
    catalog.add_movie("bob", draft("Alien", 1979));
    catalog.rate_movie("alice", "Dune", 4).expect("rate");
    catalog.rate_movie("alice", "Dune", 2).expect("rate");
    catalog.review_movie("bob", "Alien", "Tense, \"claustrophobic\".").expect("review");
    let before = catalog.export_snapshot();
    catalog.shutdown().expect("shutdown");

    let reopened = Catalog::open(CatalogConfig::with_store_path(&path)).expect("reopen");
    assert_eq!(reopened.export_snapshot(), before);
    assert_eq!(reopened.usernames(), ["alice", "bob"]);
    assert_eq!(reopened.search_movie("alice", "Dune").unwrap().ratings_by("alice"), [4, 2]);
    assert!(reopened.load_report().skipped.is_empty());
}

#[test]
fn drop_persists_unsaved_changes() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");

    {
        let mut catalog = Catalog::open(CatalogConfig::with_store_path(&path)).expect("open");
        catalog.add_movie("carol", draft("Brazil", 1985));
    }

    let reopened = Catalog::open(CatalogConfig::with_store_path(&path)).expect("reopen");
    assert_eq!(reopened.library("carol").len(), 1);
}

#[test]
fn drop_without_persist_on_drop_discards_changes() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");
    let config = CatalogConfig {
        persist_on_drop: false,
        ..CatalogConfig::with_store_path(&path)
    };

    {
        let mut catalog = Catalog::open(config).expect("open");
        catalog.add_movie("carol", draft("Brazil", 1985));
    }
    assert!(!path.exists());
}

#[test]
fn legacy_untagged_lines_load_into_default_library() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");
    let legacy = concat!(
        r#"{"title": "Heat", "year": 1995, "director": "Michael Mann", "genre": "Crime", "cast": ["Al Pacino", "Robert De Niro"], "plotSummary": "Cops and robbers."}"#,
        "\n",
        r#"{"title": "Alien", "year": 1979, "director": "Ridley Scott", "genre": "Horror", "cast": [], "plotSummary": "Stowaway."}"#,
        "\n",
    );
    fs::write(&path, legacy).expect("write legacy");

    let catalog = Catalog::open(CatalogConfig::with_store_path(&path)).expect("open");
    let titles: Vec<_> = catalog.library("default").iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Heat", "Alien"]);
}

#[test]
fn custom_default_library_receives_untagged_lines() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");
    let rec = MovieRecord::from(draft("Solaris", 1972));
    fs::write(&path, format!("{}\n", codec::encode(&rec))).expect("write");

    let config = CatalogConfig {
        default_library: "archive".to_string(),
        ..CatalogConfig::with_store_path(&path)
    };
    let catalog = Catalog::open(config).expect("open");
    assert_eq!(catalog.library("archive"), [rec]);
    assert!(catalog.library("default").is_empty());
}

#[test]
fn bad_store_lines_are_skipped_and_reported() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");
    let good = codec::encode_entry("alice", &MovieRecord::from(draft("Dune", 1984)));
    let text = format!("{good}\n{{\"title\": \"Broken\", \"year\": \n{good}\n");
    fs::write(&path, text).expect("write");

    let catalog = Catalog::open(CatalogConfig::with_store_path(&path)).expect("open");
    assert_eq!(catalog.library("alice").len(), 2);
    assert_eq!(catalog.load_report().accepted, 2);
    assert_eq!(catalog.load_report().skipped.len(), 1);
    assert_eq!(catalog.load_report().skipped[0].line_no, 2);
}

#[test]
fn sink_writes_one_tagged_line_per_record() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");

    let mut source = Catalog::new();
    source.add_movie("bob", draft("Alien", 1979));
    source.add_movie("alice", draft("Dune", 1984));
    source.add_movie("alice", draft("Heat", 1995));

    let mut sink = FlatFileSink::new(&path);
    let written = sink.save(&source.export_snapshot()).expect("save");
    assert_eq!(written, 3);

    let text = fs::read_to_string(&path).expect("read");
    let libraries: Vec<_> = text
        .lines()
        .map(|line| codec::decode_entry(line).expect("decode").0)
        .collect();
    assert_eq!(
        libraries,
        [Some("alice".to_string()), Some("alice".to_string()), Some("bob".to_string())]
    );

    let (entries, report) = sink.load().expect("load");
    assert_eq!(entries.len(), 3);
    assert_eq!(report.accepted, 3);
}

#[test]
fn undecodable_store_lines_survive_the_next_save() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");
    let broken = r#"{"title": "Broken", "year": "#;
    fs::write(&path, format!("{broken}\n")).expect("write");

    let mut catalog = Catalog::open(CatalogConfig::with_store_path(&path)).expect("open");
    assert_eq!(catalog.load_report().skipped.len(), 1);
    catalog.add_movie("a", draft("X", 2000));
    catalog.shutdown().expect("shutdown");

    let text = fs::read_to_string(&path).expect("read");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(codec::decode_entry(lines[0]).expect("decode").0.as_deref(), Some("a"));
    assert_eq!(lines[1], broken);

    let reopened = Catalog::open(CatalogConfig::with_store_path(&path)).expect("reopen");
    assert_eq!(reopened.library("a").len(), 1);
    assert_eq!(reopened.load_report().skipped[0].line_no, 2);
}

#[test]
fn save_replaces_the_store_and_leaves_no_stray_files() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");

    let mut catalog = Catalog::open(CatalogConfig::with_store_path(&path)).expect("open");
    catalog.add_movie("alice", draft("Dune", 1984));
    catalog.add_movie("alice", draft("Heat", 1995));
    catalog.save().expect("first save");
    catalog.delete_movie("alice", "Heat");
    assert_eq!(catalog.save().expect("second save"), 1);

    assert_eq!(fs::read_to_string(&path).expect("read").lines().count(), 1);
    let names: Vec<_> = fs::read_dir(tmp.path())
        .expect("list")
        .map(|entry| entry.expect("entry").file_name())
        .collect();
    assert_eq!(names, ["movies.json"]);
}

#[test]
fn failed_save_reports_io_and_keeps_the_catalog_dirty() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");
    let config = CatalogConfig {
        persist_on_drop: false,
        ..CatalogConfig::with_store_path(&path)
    };
    let mut catalog = Catalog::open(config).expect("open");
    catalog.add_movie("alice", draft("Dune", 1984));

    // A non-empty directory squatting on the store path makes the final rename fail.
    fs::create_dir(&path).expect("block store path");
    fs::write(path.join("keep"), "x").expect("fill directory");
    assert!(matches!(catalog.save(), Err(PersistError::Io(_))));
    assert!(catalog.is_dirty());

    assert_eq!(fs::read_to_string(path.join("keep")).expect("read keep"), "x");
    let names: Vec<_> = fs::read_dir(tmp.path())
        .expect("list")
        .map(|entry| entry.expect("entry").file_name())
        .collect();
    assert_eq!(names, ["movies.json"], "temporary file is cleaned up");
}

#[test]
fn empty_title_added_in_memory_is_kept_verbatim_but_not_reloaded() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("movies.json");

    let mut catalog = Catalog::open(CatalogConfig::with_store_path(&path)).expect("open");
    catalog.add_movie("alice", draft("", 2000));
    catalog.add_movie("alice", draft("Dune", 1984));
    catalog.shutdown().expect("shutdown");

    let reopened = Catalog::open(CatalogConfig::with_store_path(&path)).expect("reopen");
    assert_eq!(reopened.library("alice").len(), 1);
    assert_eq!(reopened.load_report().skipped.len(), 1);
    assert_eq!(reopened.load_report().skipped[0].line_no, 1);
    drop(reopened);
    assert_eq!(fs::read_to_string(&path).expect("read").lines().count(), 2);
}
