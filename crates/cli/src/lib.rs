use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_model::Annotation;
use pdf_markup_core::AnnotationStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use storage::Storage;

#[derive(Debug, Parser)]
#[command(name = "markup-cli")]
#[command(about = "Inspect and manage PDF markup sidecars")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print a machine-readable summary of a PDF's annotations.
    Summary {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print annotations as a JSON array.
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Only this 1-based page
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Remove annotations, for one page or the whole document.
    Clear {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Print effective overlay preferences.
    Prefs {
        /// Preferences directory instead of the platform data directory
        #[arg(long)]
        root: Option<PathBuf>,
        /// Write the defaults when no preferences file exists
        #[arg(long)]
        init: bool,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryOutput {
    path: String,
    sidecar: String,
    version: u32,
    pages: usize,
    annotations: usize,
    by_type: BTreeMap<String, usize>,
    next_sequence_number: u32,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Summary { file } => run_summary(&file),
        Commands::Export { file, page, output } => run_export(&file, page, output.as_deref()),
        Commands::Clear { file, page } => run_clear(&file, page),
        Commands::Prefs { root, init } => run_prefs(root, init),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_summary(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let sidecar = storage::read_sidecar(file)
        .context("failed to read annotations")?
        .with_context(|| format!("no annotations for {}", file.display()))?;
    let store = load_store(sidecar.annotations);

    let mut by_type = BTreeMap::new();
    for annotation in store.annotations() {
        let name = serde_json::to_value(annotation.annotation_type())?
            .as_str()
            .unwrap_or_default()
            .to_owned();
        *by_type.entry(name).or_insert(0) += 1;
    }

    let payload = SummaryOutput {
        path: file.display().to_string(),
        sidecar: storage::sidecar_path(file)?.display().to_string(),
        version: sidecar.version,
        pages: store.export_by_page().len(),
        annotations: store.len(),
        by_type,
        next_sequence_number: store.next_sequence_number(),
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");
    Ok(())
}

fn run_export(file: &Path, page: Option<u32>, output: Option<&Path>) -> Result<()> {
    ensure_pdf_exists(file)?;
    check_page(page)?;

    let annotations =
        storage::load_annotations(file).context("failed to read annotations")?.unwrap_or_default();
    let store = load_store(annotations);
    let annotations: Vec<&Annotation> = match page {
        Some(page) => store.annotations_for_page(page),
        None => store.annotations().iter().collect(),
    };
    let json = serde_json::to_string_pretty(&annotations)?;

    match output {
        Some(output) => {
            if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(output, json).with_context(|| format!("failed to write {}", output.display()))?;
            println!("{}", output.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_clear(file: &Path, page: Option<u32>) -> Result<()> {
    ensure_pdf_exists(file)?;
    check_page(page)?;

    let Some(page) = page else {
        let removed = storage::delete_annotations(file).context("failed to delete annotations")?;
        println!("{}", if removed { "removed" } else { "nothing to remove" });
        return Ok(());
    };

    let Some(annotations) = storage::load_annotations(file).context("failed to read annotations")? else {
        println!("nothing to remove");
        return Ok(());
    };
    let mut store = load_store(annotations);
    let ids: Vec<_> = store.annotations_for_page(page).iter().map(|a| a.id).collect();
    for id in &ids {
        store.delete_annotation(*id);
    }

    storage::save_annotations(file, &store.export_by_page()).context("failed to write annotations")?;
    tracing::info!(page, removed = ids.len(), "page annotations cleared");
    println!("removed {} from page {page}", ids.len());
    Ok(())
}

fn run_prefs(root: Option<PathBuf>, init: bool) -> Result<()> {
    let storage = match root {
        Some(root) => Storage::with_root(root),
        None => Storage::from_default_project()?,
    };

    let preferences = storage.load_preferences().context("failed to load preferences")?;
    if init && !storage.preferences_path().exists() {
        storage.save_preferences(&preferences).context("failed to write preferences")?;
    }

    let json = serde_json::to_string_pretty(&preferences)?;
    println!("{json}");
    Ok(())
}

fn load_store(annotations: storage::AnnotationsByPage) -> AnnotationStore {
    let mut store = AnnotationStore::default();
    store.load(annotations);
    store
}

fn check_page(page: Option<u32>) -> Result<()> {
    if page == Some(0) {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }
    Ok(())
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
