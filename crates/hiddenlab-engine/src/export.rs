use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hiddenlab_core::traits::DecisionStore;
use serde::Serialize;
use tar::{Archive, Builder, Header};
use tracing::{debug, info, warn};

use crate::classify::FilterRule;
use crate::results::{evaluate, Evaluation};
use crate::store::atomic::temp_sibling;

/// Name of the manifest written at the archive root.
pub const MANIFEST_NAME: &str = "manifest.json";

#[derive(Debug, Clone, Serialize)]
pub struct ExportManifest {
    pub generated_at: DateTime<Utc>,
    pub scope: String,
    pub rule: FilterRule,
    pub count: usize,
    pub instances: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub archive: PathBuf,
    pub scope: String,
    pub rule: FilterRule,
    pub count: usize,
    /// Unreadable decision files plus qualifying instances that could not be archived.
    pub skipped: usize,
    pub instances: Vec<String>,
}

/// Write a tar archive of every instance under `scope` that matches `rule`.
///
/// Each instance directory is stored under its `app/screen/gesture/number`
/// path; a manifest listing the archived instances sits at the archive root.
/// An instance whose files cannot be read is logged and left out, like an
/// unreadable decision file during the walk. The archive is built in a temp
/// file and renamed into place.
pub fn export_archive(
    store: &dyn DecisionStore,
    root: &Path,
    scope: &str,
    rule: FilterRule,
    out: &Path,
) -> Result<ExportReport> {
    let evaluation = evaluate(store, root, scope, rule)?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let temp_path = temp_sibling(out);
    let result = write_archive(root, &evaluation, scope, rule, &temp_path).and_then(|instances| {
        std::fs::rename(&temp_path, out)
            .with_context(|| format!("cannot move archive to {}", out.display()))?;
        Ok(instances)
    });
    let instances = match result {
        Ok(instances) => instances,
        Err(e) => {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }
    };

    let skipped = evaluation.skipped + (evaluation.count() - instances.len());
    info!(archive = %out.display(), count = instances.len(), skipped, %rule, "export written");
    Ok(ExportReport {
        archive: out.to_path_buf(),
        scope: scope.to_string(),
        rule,
        count: instances.len(),
        skipped,
        instances,
    })
}

/// Archive the qualifying instances of `evaluation` and return the ones written.
fn write_archive(
    root: &Path,
    evaluation: &Evaluation,
    scope: &str,
    rule: FilterRule,
    temp_path: &Path,
) -> Result<Vec<String>> {
    let file = File::create(temp_path)
        .with_context(|| format!("cannot create archive {}", temp_path.display()))?;
    let mut builder = Builder::new(file);
    let mut instances = Vec::new();

    for path in evaluation.qualifying() {
        let staged = match stage_instance(root, &path.relative()) {
            Ok(staged) => staged,
            Err(e) => {
                warn!(instance = %path, error = %e, "excluding instance from export");
                continue;
            }
        };
        copy_entries(&mut builder, &staged).with_context(|| format!("cannot archive {path}"))?;
        debug!(instance = %path, "archived");
        instances.push(path.to_string());
    }

    let manifest = ExportManifest {
        generated_at: Utc::now(),
        scope: scope.to_string(),
        rule,
        count: instances.len(),
        instances,
    };
    let bytes = serde_json::to_vec_pretty(&manifest)?;
    let mut header = Header::new_gnu();
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(u64::try_from(manifest.generated_at.timestamp()).unwrap_or(0));
    builder
        .append_data(&mut header, MANIFEST_NAME, bytes.as_slice())
        .context("cannot write export manifest")?;

    let file = builder.into_inner().context("cannot finish archive")?;
    file.sync_all()?;
    Ok(manifest.instances)
}

/// Read one instance directory into an in-memory tar, so a file that fails
/// halfway leaves nothing of the instance in the export.
fn stage_instance(root: &Path, rel: &Path) -> io::Result<Vec<u8>> {
    let mut staged = Builder::new(Vec::new());
    staged.append_dir_all(rel, root.join(rel))?;
    staged.into_inner()
}

fn copy_entries<W: Write>(builder: &mut Builder<W>, staged: &[u8]) -> io::Result<()> {
    let mut archive = Archive::new(staged);
    for entry in archive.entries()? {
        let mut entry = entry?;
        let mut header = entry.header().clone();
        let path = entry.path()?.into_owned();
        builder.append_data(&mut header, path, &mut entry)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsDecisionStore;
    use std::collections::BTreeSet;
    use std::io::Read;

    fn seed(root: &Path, rel: &str, decisions: &str) {
        let dir = root.join(rel);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("decision.txt"), decisions).unwrap();
        std::fs::write(dir.join("before.png"), b"png").unwrap();
    }

    fn archive_entries(path: &Path) -> (BTreeSet<String>, serde_json::Value) {
        let mut archive = tar::Archive::new(File::open(path).unwrap());
        let mut names = BTreeSet::new();
        let mut manifest = serde_json::Value::Null;
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().to_string();
            if name == MANIFEST_NAME {
                let mut buf = String::new();
                entry.read_to_string(&mut buf).unwrap();
                manifest = serde_json::from_str(&buf).unwrap();
            }
            names.insert(name);
        }
        (names, manifest)
    }

    #[test]
    fn exports_only_qualifying_instances() {
        let data = tempfile::tempdir().unwrap();
        let root = data.path();
        seed(root, "shop/home/double_tap/0", r#"[{"type":"isCorrect","decision":"o"}]"#);
        seed(root, "shop/home/double_tap/1", r#"[{"type":"isCorrect","decision":"x"}]"#);
        seed(
            root,
            "news/feed/tap/0",
            r#"[{"type":"isCorrect","decision":"o"},{"type":"elementType","decision":{"selectedOptions":["imageOrVideo"]}}]"#,
        );
        let store = FsDecisionStore::new(root, "decision.txt");

        let out_dir = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("exports/filtered.tar");
        let report =
            export_archive(&store, root, "", FilterRule::ValidatedHidden, &out).unwrap();

        assert_eq!(report.count, 2);
        assert_eq!(
            report.instances,
            vec!["news/feed/tap/0", "shop/home/double_tap/0"]
        );

        let (names, manifest) = archive_entries(&out);
        assert!(names.contains("shop/home/double_tap/0/decision.txt"));
        assert!(names.contains("news/feed/tap/0/before.png"));
        assert!(!names.iter().any(|n| n.starts_with("shop/home/double_tap/1")));
        assert_eq!(manifest["count"], 2);
        assert_eq!(manifest["rule"], "validated-hidden");
    }

    #[test]
    fn scoped_export_keeps_full_paths() {
        let data = tempfile::tempdir().unwrap();
        let root = data.path();
        seed(root, "shop/home/long_press/3", r#"[{"type":"isCorrect","decision":"o"}]"#);
        seed(root, "news/feed/long_press/0", r#"[{"type":"isCorrect","decision":"o"}]"#);
        let store = FsDecisionStore::new(root, "decision.txt");

        let out_dir = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("shop.tar");
        let report =
            export_archive(&store, root, "shop", FilterRule::ValidatedHidden, &out).unwrap();
        assert_eq!(report.instances, vec!["shop/home/long_press/3"]);

        let (names, _) = archive_entries(&out);
        assert!(names.contains("shop/home/long_press/3/before.png"));
        assert!(!names.iter().any(|n| n.starts_with("news")));
    }

    #[test]
    fn empty_export_still_has_manifest() {
        let data = tempfile::tempdir().unwrap();
        seed(data.path(), "shop/home/tap/0", "[]");
        let store = FsDecisionStore::new(data.path(), "decision.txt");

        let out_dir = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("none.tar");
        let report =
            export_archive(&store, data.path(), "", FilterRule::ValidatedHidden, &out).unwrap();
        assert_eq!(report.count, 0);

        let (names, manifest) = archive_entries(&out);
        assert_eq!(names.len(), 1);
        assert_eq!(manifest["instances"], serde_json::json!([]));
    }

    #[cfg(unix)]
    #[test]
    fn unarchivable_instance_is_skipped_not_fatal() {
        let data = tempfile::tempdir().unwrap();
        let root = data.path();
        seed(root, "a/s/double_tap/0", r#"[{"type":"isCorrect","decision":"o"}]"#);
        seed(root, "a/s/double_tap/1", r#"[{"type":"isCorrect","decision":"o"}]"#);
        std::os::unix::fs::symlink(
            root.join("missing.png"),
            root.join("a/s/double_tap/1/after.png"),
        )
        .unwrap();
        let store = FsDecisionStore::new(root, "decision.txt");

        let out_dir = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("partial.tar");
        let report =
            export_archive(&store, root, "", FilterRule::ValidatedHidden, &out).unwrap();

        assert_eq!(report.instances, vec!["a/s/double_tap/0"]);
        assert_eq!(report.count, 1);
        assert_eq!(report.skipped, 1);

        let (names, manifest) = archive_entries(&out);
        assert!(names.contains("a/s/double_tap/0/before.png"));
        assert!(!names.iter().any(|n| n.starts_with("a/s/double_tap/1")));
        assert_eq!(manifest["count"], 1);
        assert_eq!(manifest["instances"], serde_json::json!(["a/s/double_tap/0"]));
    }

    #[test]
    fn export_agrees_with_count_and_list() {
        let data = tempfile::tempdir().unwrap();
        let root = data.path();
        seed(root, "shop/home/double_tap/0", r#"[{"type":"isCorrect","decision":"o"}]"#);
        seed(
            root,
            "shop/home/tap/0",
            r#"[{"type":"isCorrect","decision":"o"},{"type":"elementType","decision":{"selectedOptions":["border"]}}]"#,
        );
        seed(
            root,
            "shop/cart/swipe_left/0",
            r#"[{"type":"isCorrect","decision":"o"},{"type":"isHidden","decision":"o"}]"#,
        );
        seed(
            root,
            "news/feed/long_press/2",
            r#"[{"type":"isCorrect","decision":"o"},{"type":"D/A","decision":["during"]}]"#,
        );
        seed(root, "news/feed/scroll_up/0", r#"[{"type":"isCorrect","decision":"o"}]"#);
        seed(root, "news/feed/scroll_up/1", "not json");
        let store = FsDecisionStore::new(root, "decision.txt");
        let out_dir = tempfile::tempdir().unwrap();

        for rule in [FilterRule::ValidatedHidden, FilterRule::AllMarkedYes] {
            let listed: Vec<String> = crate::results::list(&store, root, "", rule)
                .unwrap()
                .iter()
                .map(|p| p.to_string())
                .collect();
            let counted = crate::results::count(&store, root, "", rule).unwrap();

            let out = out_dir.path().join(format!("{rule}.tar"));
            let report = export_archive(&store, root, "", rule, &out).unwrap();
            let (_, manifest) = archive_entries(&out);

            assert_eq!(report.instances, listed, "rule {rule}");
            assert_eq!(report.count, counted, "rule {rule}");
            assert_eq!(manifest["instances"], serde_json::json!(listed), "rule {rule}");
            assert_eq!(report.skipped, 1, "rule {rule}");
        }
    }
}
