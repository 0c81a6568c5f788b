#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use hiddenlab_core::config::{ReviewConfig, ROOT_ENV, WORKSPACE_CONFIG};
use hiddenlab_core::errors::EditError;
use hiddenlab_core::path::InstancePath;
use hiddenlab_core::record::RecordList;
use hiddenlab_core::traits::DecisionStore;
use hiddenlab_core::types::{Mark, RecordKind};
use hiddenlab_engine::classify::{is_validated_hidden, FilterRule};
use hiddenlab_engine::dataset;
use hiddenlab_engine::export::export_archive;
use hiddenlab_engine::results;
use hiddenlab_engine::store::FsDecisionStore;

#[derive(Parser)]
#[command(
    name = "hlab",
    version,
    about = "Review recorded gesture instances and export validated hidden interactions."
)]
struct Cli {
    /// Dataset root (overrides HIDDENLAB_DATASET_ROOT and the workspace config).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Write .hiddenlab/config.json with default settings.
    Init,

    /// List the apps in the dataset.
    Apps {
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// List sub-folders of a dataset path.
    Folders {
        /// Dataset-relative path (app, app/screen, ...).
        #[arg(default_value = "")]
        path: String,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the screenshots of an instance in review order.
    Images {
        /// Instance path: app/screen/gesture/number.
        instance: String,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Group recorded navigation paths by content and screen.
    Paths {
        /// Dataset-relative scope.
        #[arg(default_value = "")]
        path: String,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Dump every raw decision file under a scope.
    Decisions {
        /// Dataset-relative scope.
        #[arg(default_value = "")]
        path: String,
    },

    /// Show an instance's decisions and verdict.
    Show {
        /// Instance path: app/screen/gesture/number.
        instance: String,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Answer "is correct" or "is hidden" for an instance.
    Mark {
        /// Instance path: app/screen/gesture/number.
        instance: String,

        /// Question: correct, hidden.
        #[arg(long)]
        kind: String,

        /// Answer: o, x, none.
        #[arg(long)]
        value: String,

        /// Write the value even if it is already the current answer.
        #[arg(long)]
        set: bool,
    },

    /// Toggle element categories or set the free-form category text.
    Tag {
        /// Instance path: app/screen/gesture/number.
        instance: String,

        /// Categories to toggle (border, text, icon, imageOrVideo, emptySpace, ...).
        #[arg(long = "option", value_delimiter = ',')]
        options: Vec<String>,

        /// Free-form category text ("" clears it).
        #[arg(long)]
        others: Option<String>,
    },

    /// Toggle a during/after frame for long-press and pinch instances.
    Frame {
        /// Instance path: app/screen/gesture/number.
        instance: String,

        /// Frame name without extension (during, after).
        stem: String,
    },

    /// Count validated hidden interactions.
    Count {
        /// Dataset-relative scope.
        #[arg(default_value = "")]
        path: String,

        /// Filter rule: validated-hidden, all-marked-yes.
        #[arg(long, default_value = "validated-hidden")]
        rule: FilterRule,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// List validated hidden interactions grouped by app.
    Results {
        /// Dataset-relative scope.
        #[arg(default_value = "")]
        path: String,

        /// Restrict to one app (instead of PATH).
        #[arg(long, conflicts_with = "path")]
        app: Option<String>,

        /// Filter rule: validated-hidden, all-marked-yes.
        #[arg(long, default_value = "validated-hidden")]
        rule: FilterRule,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Archive validated hidden interactions into a tar file.
    Export {
        /// Dataset-relative scope.
        #[arg(default_value = "")]
        path: String,

        /// Archive to write.
        #[arg(short, long)]
        out: PathBuf,

        /// Filter rule: validated-hidden, all-marked-yes.
        #[arg(long, default_value = "validated-hidden")]
        rule: FilterRule,

        /// Output JSON report.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    if let Cmd::Init = cli.cmd {
        return cmd_init(cli.root);
    }

    let ws = Workspace::open(cli.root)?;
    match cli.cmd {
        Cmd::Init => Ok(()),

        Cmd::Apps { json } => cmd_folders(&ws, "", json),

        Cmd::Folders { path, json } => cmd_folders(&ws, &path, json),

        Cmd::Images { instance, json } => cmd_images(&ws, &instance, json),

        Cmd::Paths { path, json } => cmd_paths(&ws, &path, json),

        Cmd::Decisions { path } => cmd_decisions(&ws, &path),

        Cmd::Show { instance, json } => cmd_show(&ws, &instance, json),

        Cmd::Mark {
            instance,
            kind,
            value,
            set,
        } => cmd_mark(&ws, &instance, &kind, &value, set),

        Cmd::Tag {
            instance,
            options,
            others,
        } => cmd_tag(&ws, &instance, &options, others.as_deref()),

        Cmd::Frame { instance, stem } => cmd_frame(&ws, &instance, &stem),

        Cmd::Count { path, rule, json } => cmd_count(&ws, &path, rule, json),

        Cmd::Results {
            path,
            app,
            rule,
            json,
        } => cmd_results(&ws, &path, app.as_deref(), rule, json),

        Cmd::Export {
            path,
            out,
            rule,
            json,
        } => cmd_export(&ws, &path, &out, rule, json),
    }
}

/// Initialize tracing on stderr so stdout stays parseable.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

/// Resolved config plus the decision store rooted at the dataset.
struct Workspace {
    config: ReviewConfig,
    store: FsDecisionStore,
}

impl Workspace {
    fn open(root_flag: Option<PathBuf>) -> Result<Self> {
        let config = ReviewConfig::load_workspace(Path::new("."))?
            .with_root_override(root_flag, std::env::var(ROOT_ENV).ok());
        let store = FsDecisionStore::new(&config.dataset_root, &config.decision_file);
        tracing::debug!(root = %config.dataset_root.display(), "dataset root resolved");
        Ok(Self { config, store })
    }

    fn root(&self) -> &Path {
        &self.config.dataset_root
    }

    fn instance(&self, raw: &str) -> Result<InstancePath> {
        let instance = InstancePath::parse(raw)?;
        let dir = self.store.instance_dir(&instance);
        if !dir.is_dir() {
            bail!("no such instance: {instance} (looked in {})", dir.display());
        }
        Ok(instance)
    }

    /// Read, edit, and write back the full record list of one instance.
    fn edit<T>(
        &self,
        raw: &str,
        f: impl FnOnce(&InstancePath, &mut RecordList) -> Result<T>,
    ) -> Result<(RecordList, T)> {
        let instance = self.instance(raw)?;
        let mut records = self.store.read(&instance)?;
        let out = f(&instance, &mut records)?;
        self.store.write(&instance, &records)?;
        eprintln!("  wrote {instance}");
        Ok((records, out))
    }
}

fn cmd_init(root_flag: Option<PathBuf>) -> Result<()> {
    let path = Path::new(WORKSPACE_CONFIG);
    if path.exists() {
        bail!("{WORKSPACE_CONFIG} already exists");
    }
    let config = ReviewConfig::default().with_root_override(root_flag, None);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&config)?;
    std::fs::write(path, json).with_context(|| format!("cannot write {WORKSPACE_CONFIG}"))?;
    eprintln!("created {WORKSPACE_CONFIG}");
    Ok(())
}

fn cmd_folders(ws: &Workspace, path: &str, json_out: bool) -> Result<()> {
    let folders = dataset::list_folders(ws.root(), path)?;
    if json_out {
        let out = serde_json::json!({ "path": path, "folders": folders });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if folders.is_empty() {
        println!("(no folders)");
    } else {
        for folder in folders {
            println!("{folder}");
        }
    }
    Ok(())
}

fn cmd_images(ws: &Workspace, raw: &str, json_out: bool) -> Result<()> {
    let instance = ws.instance(raw)?;
    let images = dataset::list_images(ws.root(), &instance.to_string(), &ws.config)?;
    if json_out {
        println!("{}", serde_json::to_string_pretty(&images)?);
    } else {
        for image in images {
            println!("{}", image.path);
        }
    }
    Ok(())
}

fn cmd_paths(ws: &Workspace, path: &str, json_out: bool) -> Result<()> {
    let entries = dataset::list_files_named(ws.root(), path, &ws.config.path_file)?;
    let groups = dataset::group_paths(&entries, &ws.config.path_file);
    if json_out {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }
    if groups.is_empty() {
        println!("(no paths found)");
    }
    for group in groups {
        println!(
            "[{}] {} ({} instance(s))",
            group.screen,
            group.content.trim(),
            group.file_paths.len()
        );
        for file in group.file_paths {
            println!("    {file}");
        }
    }
    Ok(())
}

fn cmd_decisions(ws: &Workspace, path: &str) -> Result<()> {
    let files = dataset::list_files_named(ws.root(), path, &ws.config.decision_file)?;
    let out = serde_json::json!({ "filePath": path, "files": files });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_show(ws: &Workspace, raw: &str, json_out: bool) -> Result<()> {
    let instance = ws.instance(raw)?;
    let records = ws.store.read(&instance)?;
    let gesture = instance.gesture();
    let verdict = is_validated_hidden(gesture, &records);

    if json_out {
        let out = serde_json::json!({
            "instance": instance.to_string(),
            "gesture": gesture,
            "decisions": records,
            "validated_hidden": verdict,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mark = |kind| records.mark(kind).map_or("-", Mark::as_str);
    println!("  Instance:   {instance}");
    println!("  Gesture:    {gesture}");
    println!("  isCorrect:  {}", mark(RecordKind::IsCorrect));
    println!("  isHidden:   {}", mark(RecordKind::IsHidden));
    match records.element_selection() {
        Some(sel) => {
            let others = sel.others_text.as_deref().unwrap_or("");
            println!(
                "  Elements:   {} {others}",
                sel.selected_options.join(", ")
            );
        }
        None => println!("  Elements:   -"),
    }
    if gesture.supports_frame_selection() {
        let frames = records.frames().unwrap_or_default();
        println!("  Frames:     {}", frames.join(", "));
    }
    println!(
        "  Validated hidden: {}",
        if verdict { "yes" } else { "no" }
    );
    Ok(())
}

fn parse_mark_kind(kind: &str) -> Result<RecordKind> {
    match kind {
        "correct" | "isCorrect" => Ok(RecordKind::IsCorrect),
        "hidden" | "isHidden" => Ok(RecordKind::IsHidden),
        _ => bail!("unknown question '{kind}' (use: correct, hidden)"),
    }
}

fn cmd_mark(ws: &Workspace, raw: &str, kind: &str, value: &str, set: bool) -> Result<()> {
    let kind = parse_mark_kind(kind)?;
    let mark: Mark = value
        .parse()
        .map_err(|_| anyhow!("unknown answer '{value}' (use: o, x, none)"))?;

    let (records, applied) = ws.edit(raw, |_, records| {
        if set {
            records.set_mark(kind, mark)?;
            Ok(mark)
        } else {
            Ok(records.toggle_mark(kind, mark)?)
        }
    })?;
    eprintln!("  {kind} = {applied}");
    println!("{}", records.to_json()?);
    Ok(())
}

fn cmd_tag(ws: &Workspace, raw: &str, options: &[String], others: Option<&str>) -> Result<()> {
    if options.is_empty() && others.is_none() {
        bail!("specify --option or --others");
    }
    let (records, _) = ws.edit(raw, |_, records| {
        for option in options {
            records.toggle_element_option(option);
        }
        if let Some(text) = others {
            records.set_others_text(text);
        }
        Ok(())
    })?;
    println!("{}", records.to_json()?);
    Ok(())
}

fn cmd_frame(ws: &Workspace, raw: &str, stem: &str) -> Result<()> {
    let config = &ws.config;
    let (records, frames) = ws.edit(raw, |instance, records| {
        let gesture = instance.gesture();
        if !gesture.supports_frame_selection() {
            return Err(EditError::NoFrameSelection(gesture).into());
        }
        if !config.is_selectable_frame(stem) {
            return Err(EditError::FrameNotSelectable(stem.into()).into());
        }
        Ok(records.toggle_frame(stem))
    })?;
    eprintln!("  frames: [{}]", frames.join(", "));
    println!("{}", records.to_json()?);
    Ok(())
}

fn cmd_count(ws: &Workspace, path: &str, rule: FilterRule, json_out: bool) -> Result<()> {
    let count = results::count(&ws.store, ws.root(), path, rule)?;
    if json_out {
        let out = serde_json::json!({ "scope": path, "rule": rule, "count": count });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{count}");
    }
    Ok(())
}

fn cmd_results(
    ws: &Workspace,
    path: &str,
    app: Option<&str>,
    rule: FilterRule,
    json_out: bool,
) -> Result<()> {
    let scope = app.unwrap_or(path);
    let summary = results::summary(&ws.store, ws.root(), scope, rule)?;

    if json_out {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let w_app = summary
        .by_app
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(3)
        .max(3);
    println!("{:<w_app$}  COUNT", "APP");
    println!("{:<w_app$}  -----", "-".repeat(w_app));
    for (app, paths) in &summary.by_app {
        println!("{app:<w_app$}  {}", paths.len());
    }
    println!();
    for paths in summary.by_app.values() {
        for p in paths {
            println!("{p}");
        }
    }
    eprintln!(
        "\n{} validated hidden interaction(s), {} skipped",
        summary.total, summary.skipped
    );
    Ok(())
}

fn cmd_export(ws: &Workspace, path: &str, out: &Path, rule: FilterRule, json_out: bool) -> Result<()> {
    let report = export_archive(&ws.store, ws.root(), path, rule, out)?;
    if json_out {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!(
            "wrote {} ({} instance(s), rule {})",
            report.archive.display(),
            report.count,
            report.rule
        );
    }
    Ok(())
}
