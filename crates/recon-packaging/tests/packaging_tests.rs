use std::io::Write;
use std::path::Path;

use recon_core::{ReconError, RunMetadata, SubjectId};
use recon_packaging::{archive_name, archive_subject, extract_prior_run, membership, metadata_document, write_metadata};
use serde_json::json;
use uuid::Uuid;

fn tree(root: &Path) {
    for (rel, body) in [("sub-01/mri/aseg.mgz", "aseg"),
                        ("sub-01/stats/aseg.stats", "# stats"),
                        ("sub-01/surf/lh.pial", "pial"),
                        ("sub-01/derived/convert_stats/sub-01_aseg_stats_vol_mm3.csv", "a,b\n")]
    {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }
}

fn sub() -> SubjectId {
    SubjectId::sanitize("sub-01").unwrap()
}

#[test]
fn archive_name_is_deterministic() {
    let run = Uuid::nil();
    assert_eq!(archive_name(&sub(), run),
               "freesurfer-recon-all_sub-01_00000000-0000-0000-0000-000000000000.zip");
}

#[test]
fn archive_contains_whole_subject_tree() {
    let subjects = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    tree(subjects.path());

    let target = out.path().join(archive_name(&sub(), Uuid::new_v4()));
    let summary = archive_subject(subjects.path(), &sub(), &target).unwrap();

    assert!(summary.entries.contains(&"sub-01/".to_string()));
    assert!(summary.entries.contains(&"sub-01/surf/lh.pial".to_string()));
    assert!(summary.entries.contains(&"sub-01/derived/convert_stats/sub-01_aseg_stats_vol_mm3.csv".to_string()));
    assert_eq!(membership(&target).unwrap(), summary.entries);
}

#[test]
fn archiving_twice_yields_identical_membership() {
    let subjects = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    tree(subjects.path());

    let a = archive_subject(subjects.path(), &sub(), &out.path().join("a.zip")).unwrap();
    let b = archive_subject(subjects.path(), &sub(), &out.path().join("b.zip")).unwrap();
    assert_eq!(a.entries, b.entries);
    assert_eq!(a.digest, b.digest);
    assert_eq!(membership(&a.path).unwrap(), membership(&b.path).unwrap());
}

#[test]
fn missing_subject_tree_is_a_packaging_error() {
    let subjects = tempfile::tempdir().unwrap();
    let err = archive_subject(subjects.path(), &sub(), &subjects.path().join("x.zip")).unwrap_err();
    assert!(matches!(err, ReconError::Packaging(_)));
}

#[test]
fn prior_run_round_trips_through_extraction() {
    let original = tempfile::tempdir().unwrap();
    let input = tempfile::tempdir().unwrap();
    tree(original.path());
    let archive = input.path().join("freesurfer-recon-all_sub-01_prev.zip");
    archive_subject(original.path(), &sub(), &archive).unwrap();

    let subjects = tempfile::tempdir().unwrap();
    let subject = extract_prior_run(&archive, subjects.path(), None).unwrap();
    assert_eq!(subject, sub());
    assert_eq!(std::fs::read_to_string(subjects.path().join("sub-01/stats/aseg.stats")).unwrap(),
               "# stats");
}

#[test]
fn archived_subject_wins_over_configured_one() {
    let original = tempfile::tempdir().unwrap();
    tree(original.path());
    let archive = original.path().join("prev.zip");
    archive_subject(original.path(), &sub(), &archive).unwrap();

    let subjects = tempfile::tempdir().unwrap();
    let other = SubjectId::sanitize("someone_else").unwrap();
    assert_eq!(extract_prior_run(&archive, subjects.path(), Some(&other)).unwrap(), sub());
}

#[test]
fn archive_with_two_subjects_is_rejected_before_extraction() {
    let original = tempfile::tempdir().unwrap();
    tree(original.path());
    let archive = original.path().join("two.zip");
    {
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&archive).unwrap());
        for name in ["sub-A/stats/aseg.stats", "sub-B/stats/aseg.stats"] {
            writer.start_file(name, zip::write::SimpleFileOptions::default()).unwrap();
            writer.write_all(b"# stats").unwrap();
        }
        writer.finish().unwrap();
    }

    let subjects = tempfile::tempdir().unwrap();
    let err = extract_prior_run(&archive, subjects.path(), None).unwrap_err();
    assert!(matches!(&err, ReconError::PriorRunUnavailable(msg) if msg.contains("sub-A, sub-B")));
    assert!(!subjects.path().join("sub-A").exists());
    assert!(!subjects.path().join("sub-B").exists());
}

#[test]
fn unreadable_archive_is_prior_run_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("freesurfer-recon-all_x.zip");
    std::fs::write(&bogus, "not a zip").unwrap();
    let err = extract_prior_run(&bogus, dir.path(), None).unwrap_err();
    assert!(matches!(err, ReconError::PriorRunUnavailable(_)));
}

#[test]
fn metadata_file_nests_under_analysis_info() {
    let dir = tempfile::tempdir().unwrap();
    let mut metadata = RunMetadata::new();
    metadata.insert("ThalamicNuclei.v12.T1.volumes".into(), json!({"Right-Whole_thalamus": 7476.300538}));
    let path = write_metadata(dir.path(), &metadata).unwrap();
    assert!(path.ends_with(".metadata.json"));

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(written, metadata_document(&metadata));
    assert_eq!(written["analysis"]["info"]["ThalamicNuclei.v12.T1.volumes"]["Right-Whole_thalamus"],
               json!(7476.300538));
}
