use std::path::Path;

use anyhow::{bail, Context, Result};
use hiddenlab_core::path::{segments, InstancePath};
use tracing::warn;

use super::listing::{natural_cmp, resolve};

/// Depth of instance directories below the dataset root.
const INSTANCE_DEPTH: usize = 4;

/// Enumerate instance directories (`app/screen/gesture/number`) under `scope`.
///
/// `scope` may name the root, an app, a screen, a gesture folder, or a single
/// instance. Sub-directories that cannot be read are logged and skipped so one
/// bad folder does not hide the rest of the dataset.
pub fn walk_instances(root: &Path, scope: &str) -> Result<Vec<InstancePath>> {
    let start = resolve(root, scope)?;
    let prefix: Vec<String> = segments(scope).iter().map(|s| s.to_string()).collect();

    if prefix.len() > INSTANCE_DEPTH {
        bail!("scope is deeper than an instance: {scope}");
    }
    if !start.is_dir() {
        bail!("no such dataset folder: {}", start.display());
    }
    if prefix.len() == INSTANCE_DEPTH {
        return Ok(vec![instance_from(&prefix)]);
    }

    let mut out = Vec::new();
    let names = sorted_dirs(&start).with_context(|| format!("cannot read {}", start.display()))?;
    for name in names {
        let mut next = prefix.clone();
        next.push(name);
        descend(root, next, &mut out);
    }
    Ok(out)
}

fn descend(root: &Path, prefix: Vec<String>, out: &mut Vec<InstancePath>) {
    if prefix.len() == INSTANCE_DEPTH {
        out.push(instance_from(&prefix));
        return;
    }

    let dir = prefix.iter().fold(root.to_path_buf(), |p, s| p.join(s));
    match sorted_dirs(&dir) {
        Ok(names) => {
            for name in names {
                let mut next = prefix.clone();
                next.push(name);
                descend(root, next, out);
            }
        }
        Err(e) => warn!(path = %prefix.join("/"), error = %e, "skipping unreadable folder"),
    }
}

fn sorted_dirs(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort_by(|a, b| natural_cmp(a, b));
    Ok(names)
}

fn instance_from(parts: &[String]) -> InstancePath {
    InstancePath::new(&parts[0], &parts[1], &parts[2], &parts[3])
}
