use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use locsync::app::export::{ExportFormat, ExportOptions, Exporter};
use locsync::app::reconcile::Reconciler;
use locsync::app::scan::{ScanResult, Scanner};
use locsync::app::selection::{SelectionSet, name_matcher};
use locsync::domain::model::{NodeId, RecordOutcome};
use locsync::infra::config::Config;
use locsync::infra::document::DesignDocument;
use locsync::infra::host::{NodeTree, VariableStore};
use locsync::infra::notify::{ConsoleNotifier, NotificationSink};
use locsync::ui::bridge::{self, UiBridge};
use locsync::ui::messages::{CoreEvent, UiRequest};

#[derive(Parser)]
#[command(
    name = "locsync",
    version,
    about = "Sync text layers of a design document into localization variables"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the designated container and list its text layers
    Scan {
        /// Design document to operate on
        #[arg(long)]
        doc: PathBuf,
        /// Scan this node instead of the document's recorded selection
        #[arg(long)]
        node: Option<String>,
        /// Print the raw text-layers event as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create or update variables for the selected layers and bind them
    Sync {
        #[arg(long)]
        doc: PathBuf,
        #[arg(long)]
        node: Option<String>,
        /// Select every layer, including hidden and already-bound ones
        #[arg(long, conflicts_with = "only")]
        all: bool,
        /// Select only layers whose name matches these globs
        #[arg(long)]
        only: Vec<String>,
        /// Deselect layers whose name matches these globs
        #[arg(long)]
        skip: Vec<String>,
        /// Write into this collection instead of the configured one
        #[arg(long)]
        collection: Option<String>,
    },
    /// Render the scanned layers as CSV or a markdown report
    Export {
        #[arg(long)]
        doc: PathBuf,
        #[arg(long)]
        node: Option<String>,
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Leave out layers that are already bound
        #[arg(long)]
        skip_bound: bool,
        /// Keep layers hidden in the document
        #[arg(long)]
        include_hidden: bool,
    },
    /// Pump protocol messages over stdio, one JSON object per line
    Serve {
        #[arg(long)]
        doc: PathBuf,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    locsync::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { doc, node, json } => run_scan(&doc, node, json),
        Commands::Sync {
            doc,
            node,
            all,
            only,
            skip,
            collection,
        } => run_sync(&doc, node, all, &only, &skip, collection),
        Commands::Export {
            doc,
            node,
            format,
            output,
            skip_bound,
            include_hidden,
        } => run_export(&doc, node, format, output, skip_bound, include_hidden),
        Commands::Serve { doc } => run_serve(&doc),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "locsync", &mut io::stdout());
            Ok(())
        }
    }
}

/// Root to scan: an explicit node wins over the document's selection.
fn designated_root(document: &DesignDocument, node: Option<String>) -> Option<NodeId> {
    node.map(NodeId::new)
        .or_else(|| document.selection().into_iter().next())
}

fn run_scan(doc: &Path, node: Option<String>, json: bool) -> Result<()> {
    let document = DesignDocument::load(doc)?;
    let root = designated_root(&document, node);
    let scan = Scanner::new().scan(&document, root.as_ref());

    if json {
        let event = CoreEvent::TextLayers {
            records: scan.records,
            container_name: scan.container_name,
        };
        println!("{}", serde_json::to_string_pretty(&event)?);
        return Ok(());
    }

    print_scan(&scan);
    Ok(())
}

fn print_scan(scan: &ScanResult) {
    let Some(name) = &scan.container_name else {
        println!("Nothing to scan: designate a container node first.");
        return;
    };
    println!("Container: {name}");
    for record in &scan.records {
        let mut flags = Vec::new();
        if record.is_bound {
            flags.push("bound");
        }
        if !record.visible {
            flags.push("hidden");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        let mark = if record.selected { "x" } else { " " };
        println!("  [{mark}] {}{flags}  {:?}", record.name, record.content);
    }
    println!("{} text layer(s)", scan.records.len());
}

fn run_sync(
    doc: &Path,
    node: Option<String>,
    all: bool,
    only: &[String],
    skip: &[String],
    collection: Option<String>,
) -> Result<()> {
    let config = Config::load()?;
    let mut document = DesignDocument::load(doc)?;
    let root = designated_root(&document, node);
    let scan = Scanner::new().scan(&document, root.as_ref());

    let mut selection = SelectionSet::from_scan(&scan);
    if all {
        selection.select_all();
    }
    if !only.is_empty() {
        let matcher = name_matcher(only)?;
        selection.deselect_all();
        selection.override_matching(&matcher, true);
    }
    if !skip.is_empty() {
        let matcher = name_matcher(skip)?;
        selection.override_matching(&matcher, false);
    }

    let reconciler = match collection {
        Some(name) => Reconciler::new(name, config.defaults.mode.clone()),
        None => Reconciler::from_config(&config),
    };
    let summary =
        reconciler.reconcile(&mut document, root.as_ref(), &selection.effective_records())?;

    if summary.is_empty() {
        println!("No layers selected; nothing to sync.");
        return Ok(());
    }

    document.save(doc)?;

    println!("Collection \"{}\":", reconciler.collection_name());
    for outcome in &summary.outcomes {
        match outcome {
            RecordOutcome::Bound { name, key } => println!("  {name} -> {key}"),
            RecordOutcome::Failed { name, reason } => println!("  {name} failed: {reason}"),
        }
    }
    ConsoleNotifier.notify(bridge::summary_notice(&summary));
    Ok(())
}

fn run_export(
    doc: &Path,
    node: Option<String>,
    format: Option<ExportFormat>,
    output: Option<PathBuf>,
    skip_bound: bool,
    include_hidden: bool,
) -> Result<()> {
    let config = Config::load()?;
    let document = DesignDocument::load(doc)?;
    let root = designated_root(&document, node);
    let scan = Scanner::new().scan(&document, root.as_ref());

    let mut options = ExportOptions::resolve(&config, format);
    if skip_bound {
        options.include_bound = false;
    }
    if include_hidden {
        options.include_hidden = true;
    }
    options.output_path = output;

    let exporter = Exporter::new()?;
    if options.output_path.is_some() {
        let result = exporter.export(&scan, &options)?;
        ConsoleNotifier.notify(bridge::export_notice(true));
        if let Some(path) = result.output_path {
            println!("Wrote {} record(s) to {}", result.records, path.display());
        }
    } else {
        let rendered = exporter.render(&scan, &options)?;
        print!("{rendered}");
    }
    Ok(())
}

fn run_serve(doc: &Path) -> Result<()> {
    let config = Config::load()?;
    let document = DesignDocument::load(doc)?;
    let mut bridge = UiBridge::new(document, &config, Box::new(ConsoleNotifier));
    bridge.startup();
    flush_events(&mut bridge)?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read request line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let request: UiRequest = match serde_json::from_str(trimmed) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed request");
                continue;
            }
        };

        let persist = matches!(request, UiRequest::RequestReconcile { .. });
        bridge.handle(request);
        if persist {
            bridge.host().save(doc)?;
        }
        flush_events(&mut bridge)?;
    }
    Ok(())
}

fn flush_events<H: NodeTree + VariableStore>(bridge: &mut UiBridge<H>) -> Result<()> {
    for event in bridge.drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
