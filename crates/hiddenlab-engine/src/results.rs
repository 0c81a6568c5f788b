use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use hiddenlab_core::path::InstancePath;
use hiddenlab_core::traits::DecisionStore;
use hiddenlab_core::types::Gesture;
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::FilterRule;
use crate::dataset::{list_folders, walk_instances};

/// Classification of one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceOutcome {
    pub path: InstancePath,
    pub gesture: Gesture,
    pub qualifies: bool,
}

/// Outcome of walking a dataset scope.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub outcomes: Vec<InstanceOutcome>,
    /// Instances left out because their decisions could not be read.
    pub skipped: usize,
}

impl Evaluation {
    pub fn qualifying(&self) -> impl Iterator<Item = &InstancePath> {
        self.outcomes
            .iter()
            .filter(|o| o.qualifies)
            .map(|o| &o.path)
    }

    pub fn count(&self) -> usize {
        self.qualifying().count()
    }
}

/// Qualifying instances grouped by app.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsSummary {
    pub scope: String,
    pub rule: FilterRule,
    pub total: usize,
    pub skipped: usize,
    pub by_app: BTreeMap<String, Vec<String>>,
}

/// Classify every instance under `scope` with `rule`.
///
/// The gesture comes from each instance's path. Instances whose decision
/// file cannot be read or parsed are logged and excluded.
pub fn evaluate(
    store: &dyn DecisionStore,
    root: &Path,
    scope: &str,
    rule: FilterRule,
) -> Result<Evaluation> {
    let mut evaluation = Evaluation::default();

    for path in walk_instances(root, scope)? {
        let records = match store.read(&path) {
            Ok(r) => r,
            Err(e) => {
                warn!(instance = %path, error = %e, "excluding instance");
                evaluation.skipped += 1;
                continue;
            }
        };
        let gesture = path.gesture();
        let qualifies = rule.matches(gesture, &records);
        debug!(instance = %path, %gesture, qualifies, "classified");
        evaluation.outcomes.push(InstanceOutcome {
            path,
            gesture,
            qualifies,
        });
    }
    Ok(evaluation)
}

/// Number of qualifying instances under `scope`.
pub fn count(store: &dyn DecisionStore, root: &Path, scope: &str, rule: FilterRule) -> Result<usize> {
    Ok(evaluate(store, root, scope, rule)?.count())
}

/// Qualifying instances under `scope`, in walk order.
pub fn list(
    store: &dyn DecisionStore,
    root: &Path,
    scope: &str,
    rule: FilterRule,
) -> Result<Vec<InstancePath>> {
    let evaluation = evaluate(store, root, scope, rule)?;
    Ok(evaluation.qualifying().cloned().collect())
}

/// Qualifying instances grouped by app. Apps without any qualifying instance
/// are listed with an empty group.
pub fn summary(
    store: &dyn DecisionStore,
    root: &Path,
    scope: &str,
    rule: FilterRule,
) -> Result<ResultsSummary> {
    let evaluation = evaluate(store, root, scope, rule)?;
    let mut by_app: BTreeMap<String, Vec<String>> = BTreeMap::new();

    if hiddenlab_core::path::segments(scope).is_empty() {
        for app in list_folders(root, "")? {
            by_app.entry(app).or_default();
        }
    }
    for outcome in &evaluation.outcomes {
        let group = by_app.entry(outcome.path.app.clone()).or_default();
        if outcome.qualifies {
            group.push(outcome.path.to_string());
        }
    }

    Ok(ResultsSummary {
        scope: scope.to_string(),
        rule,
        total: evaluation.count(),
        skipped: evaluation.skipped,
        by_app,
    })
}
