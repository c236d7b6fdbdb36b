//! Heading-shift and title-extraction runs against a file-backed workspace.

use omni_doctor::{
    Doctor, DoctorAction, DoctorOptions, DocumentOutcome, FsNoteStore, NoteKey, NoteStore,
    load_workspace_config,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_file(path: &Path, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn setup_workspace(tmp: &TempDir) -> Result<FsNoteStore, Box<dyn std::error::Error>> {
    write_file(
        &tmp.path().join("workspace.yaml"),
        "vaults:\n  - fs_path: vault\n",
    )?;
    write_file(
        &tmp.path().join("vault/foo.md"),
        "# Foo Header\n## Foo Content\n",
    )?;
    write_file(
        &tmp.path().join("vault/bar.md"),
        "# Bar Header\n## Bar Content\n",
    )?;
    let config = load_workspace_config(tmp.path(), None)?;
    Ok(FsNoteStore::new(config.workspace))
}

fn body_of(store: &FsNoteStore, name: &str) -> Result<String, Box<dyn std::error::Error>> {
    let note = store
        .get_note(&NoteKey::new("vault", name))?
        .ok_or_else(|| format!("note {name} is missing"))?;
    Ok(note.body)
}

#[test]
fn test_heading_shift_rewrites_every_note() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let store = setup_workspace(&tmp)?;

    let report = Doctor::new(store.workspace(), &store)
        .run(&DoctorOptions::new(DoctorAction::HeadingShift))?;

    assert_eq!(report.modified_count, 2);
    assert_eq!(body_of(&store, "foo")?, "## Foo Header\n### Foo Content\n");
    assert_eq!(body_of(&store, "bar")?, "## Bar Header\n### Bar Content\n");
    Ok(())
}

#[test]
fn test_heading_shift_limited_to_candidates() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let store = setup_workspace(&tmp)?;

    let options = DoctorOptions::new(DoctorAction::HeadingShift)
        .with_candidates(vec![NoteKey::new("vault", "foo")]);
    let report = Doctor::new(store.workspace(), &store).run(&options)?;

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(body_of(&store, "foo")?, "## Foo Header\n### Foo Content\n");
    assert_eq!(body_of(&store, "bar")?, "# Bar Header\n## Bar Content\n");
    Ok(())
}

#[test]
fn test_heading_shift_dry_run_leaves_files() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let store = setup_workspace(&tmp)?;
    let before = fs::read_to_string(tmp.path().join("vault/foo.md"))?;

    let options = DoctorOptions::new(DoctorAction::HeadingShift).with_dry_run(true);
    let report = Doctor::new(store.workspace(), &store).run(&options)?;

    assert!(report.dry_run);
    assert_eq!(
        report.outcome(&NoteKey::new("vault", "foo")),
        Some(&DocumentOutcome::Modified {
            title: "Foo".to_string(),
            body: "## Foo Header\n### Foo Content\n".to_string(),
        })
    );
    assert_eq!(fs::read_to_string(tmp.path().join("vault/foo.md"))?, before);
    Ok(())
}

#[test]
fn test_heading_shift_skips_code_fences() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let store = setup_workspace(&tmp)?;
    write_file(
        &tmp.path().join("vault/code.md"),
        "```sh\n# comment\n```\n# Real\n",
    )?;

    let options = DoctorOptions::new(DoctorAction::HeadingShift)
        .with_candidates(vec![NoteKey::new("vault", "code")]);
    Doctor::new(store.workspace(), &store).run(&options)?;

    assert_eq!(body_of(&store, "code")?, "```sh\n# comment\n```\n## Real\n");
    Ok(())
}

#[test]
fn test_title_extract_moves_heading_into_title() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let store = setup_workspace(&tmp)?;

    let report = Doctor::new(store.workspace(), &store)
        .run(&DoctorOptions::new(DoctorAction::TitleExtract))?;

    assert_eq!(report.modified_count, 2);
    let foo = store
        .get_note(&NoteKey::new("vault", "foo"))?
        .ok_or("foo is missing")?;
    assert_eq!(foo.title, "Foo Header");
    assert_eq!(foo.body, "## Foo Content\n");
    Ok(())
}

#[test]
fn test_title_extract_candidates_only() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let store = setup_workspace(&tmp)?;

    let options = DoctorOptions::new(DoctorAction::TitleExtract)
        .with_candidates(vec![NoteKey::new("vault", "foo")]);
    Doctor::new(store.workspace(), &store).run(&options)?;

    let foo = store
        .get_note(&NoteKey::new("vault", "foo"))?
        .ok_or("foo is missing")?;
    let bar = store
        .get_note(&NoteKey::new("vault", "bar"))?
        .ok_or("bar is missing")?;
    assert_eq!(foo.title, "Foo Header");
    assert_eq!(bar.title, "Bar");
    assert_eq!(bar.body, "# Bar Header\n## Bar Content\n");
    Ok(())
}

#[test]
fn test_title_extract_skips_notes_without_headings() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let store = setup_workspace(&tmp)?;
    write_file(&tmp.path().join("vault/plain.md"), "just text\n")?;

    let options = DoctorOptions::new(DoctorAction::TitleExtract)
        .with_candidates(vec![NoteKey::new("vault", "plain")]);
    let report = Doctor::new(store.workspace(), &store).run(&options)?;

    assert_eq!(
        report.outcome(&NoteKey::new("vault", "plain")),
        Some(&DocumentOutcome::Unchanged)
    );
    assert_eq!(
        fs::read_to_string(tmp.path().join("vault/plain.md"))?,
        "just text\n"
    );
    Ok(())
}

#[test]
fn test_missing_candidate_is_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let store = setup_workspace(&tmp)?;

    let options = DoctorOptions::new(DoctorAction::HeadingShift).with_candidates(vec![
        NoteKey::new("vault", "ghost"),
        NoteKey::new("vault", "foo"),
    ]);
    let report = Doctor::new(store.workspace(), &store).run(&options)?;

    assert_eq!(report.skipped(), vec![&NoteKey::new("vault", "ghost")]);
    assert_eq!(report.modified_count, 1);
    Ok(())
}
