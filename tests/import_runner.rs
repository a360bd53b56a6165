//! Background imports through the application layer.

use parking_lot::Mutex;
use resip::app::{AppState, FixedTmpDirPolicy, ImportContext, ImportRunner, ImportStatus, Prefs};
use resip::common::ProgressLevel;
use std::path::Path;
use std::sync::Arc;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn prefs(work_dir: &Path) -> Prefs {
    init_tracing();
    Prefs {
        work_dir: work_dir.to_path_buf(),
        progress_step: 1,
        ..Default::default()
    }
}

#[test]
fn test_disk_import_installs_normalized_work() {
    let dir = tempfile::tempdir().unwrap();
    let fonds = dir.path().join("fonds");
    write(&fonds.join("2023/minutes.txt"), "minutes");
    write(&fonds.join("2023/Thumbs.db"), "junk");
    write(&fonds.join("readme.txt"), "readme");

    let state = AppState::shared(prefs(&dir.path().join("work")));
    let runner = ImportRunner::new(Arc::clone(&state), Arc::new(FixedTmpDirPolicy::Cancel));
    let context = ImportContext::disk(vec![fonds], &state.lock().prefs);
    let report = runner.start(context).unwrap().join().unwrap();

    assert_eq!(report.status, ImportStatus::Succeeded, "{:?}", report.error);
    assert!(report.final_line.starts_with("-> Disk import: 3 ArchiveUnit(s)"));
    let state = state.lock();
    assert_eq!(state.prefs.import_dir.as_deref(), Some(dir.path()));
    let work = state.work().unwrap();
    assert_eq!(work.package.binary_data_object_count(), 2);
    let normalized = format!("\nNormalized package: {}", work.package.description());
    assert!(report.final_line.ends_with(&normalized), "{}", report.final_line);
    assert!(work.package.pending_binary_data_objects().is_empty());
    assert!(matches!(work.creation_context, ImportContext::Disk { .. }));
}

#[test]
fn test_failed_import_keeps_previous_work() {
    let dir = tempfile::tempdir().unwrap();
    let fonds = dir.path().join("fonds");
    write(&fonds.join("a.txt"), "a");
    let tree = dir.path().join("tree.csv");
    write(&tree, "Cote;Title;FatherCote;DescriptionLevel\n1;Root;;\n1.1;Child;9;\n");

    let lines = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink_lines = Arc::clone(&lines);
    let state = AppState::shared(prefs(&dir.path().join("work")));
    let runner = ImportRunner::new(Arc::clone(&state), Arc::new(FixedTmpDirPolicy::Cancel)).with_progress_sink(
        ProgressLevel::Step,
        Arc::new(move |_, line: &str| sink_lines.lock().push(line.to_string())),
    );

    let first = runner
        .start(ImportContext::disk(vec![fonds], &Prefs::default()))
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(first.status, ImportStatus::Succeeded);
    let previous_summary = state.lock().work().unwrap().summary.clone();

    let second = runner
        .start(ImportContext::csv_tree(&tree, &Prefs::default()))
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(second.status, ImportStatus::Failed);
    assert_eq!(second.final_line, "-> Error during import, data was not modified.");
    assert_eq!(state.lock().work().unwrap().summary, previous_summary);

    let lines = lines.lock();
    let failure = lines.iter().find(|l| l.starts_with("Import impossible")).unwrap();
    assert!(failure.contains("unknown father cote [9]"));
    assert_eq!(lines.last().unwrap(), "-> Error during import, data was not modified.");
}

#[test]
fn test_sip_import_with_existing_tmpdir() {
    let dir = tempfile::tempdir().unwrap();
    let fonds = dir.path().join("fonds");
    write(&fonds.join("letters/letter.txt"), "Dear all");
    let work_dir = dir.path().join("work");
    let state = AppState::shared(prefs(&work_dir));

    // Build a SIP from a disk import
    let runner = ImportRunner::new(Arc::clone(&state), Arc::new(FixedTmpDirPolicy::Clean));
    runner
        .start(ImportContext::disk(vec![fonds], &Prefs::default()))
        .unwrap()
        .join()
        .unwrap();
    let sip = dir.path().join("letters.zip");
    {
        let state = state.lock();
        let work = state.work().unwrap();
        resip::inout::SipExporter::new(&work.package, &work.export_context.global_metadata)
            .export(&sip, &resip::common::ProgressLogger::silent())
            .unwrap();
    }

    // A stale extraction directory is cleaned after the resolver decision
    write(&work_dir.join("letters.zip-tmpdir/stale.txt"), "stale");
    let report = runner.start(ImportContext::sip(&sip)).unwrap().join().unwrap();
    assert_eq!(report.status, ImportStatus::Succeeded, "{:?}", report.error);
    assert!(!work_dir.join("letters.zip-tmpdir/stale.txt").exists());
    assert!(work_dir.join("letters.zip-tmpdir/manifest.xml").exists());
    {
        let state = state.lock();
        let work = state.work().unwrap();
        assert_eq!(work.package.archive_unit_count(), 2);
        assert!(matches!(work.creation_context, ImportContext::Sip { .. }));
    }

    // With a cancelling resolver the run stops and the work stays
    let cancelling = ImportRunner::new(Arc::clone(&state), Arc::new(FixedTmpDirPolicy::Cancel));
    let report = cancelling.start(ImportContext::sip(&sip)).unwrap().join().unwrap();
    assert_eq!(report.status, ImportStatus::Cancelled);
    assert_eq!(report.final_line, "-> data was not modified.");
    assert!(matches!(
        state.lock().work().unwrap().creation_context,
        ImportContext::Sip { .. }
    ));
}
