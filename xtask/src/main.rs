use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use locsync::domain::model::NodeId;
use locsync::infra::document::{
    CollectionRecord, DesignDocument, ModeRecord, NodeRecord, VariableRecord,
};
use locsync::infra::host::{CollectionId, ModeId, NodeKind, VariableId};

#[derive(Parser)]
#[command(author, version, about = "Workspace automation tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full test suite with cargo nextest
    Nextest {
        /// Nextest profile to use
        #[arg(long)]
        profile: Option<String>,
        /// Build artifacts in release mode
        #[arg(long)]
        release: bool,
    },
    /// Regenerate the committed card fixture document
    Fixture {
        /// Where to write the fixture
        #[arg(long, default_value = "crates/locsync/tests/fixtures/card.json")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release),
        Commands::Fixture { out } => write_fixture(&out),
    }
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.args(["--profile", &profile]);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status().context("failed to invoke cargo nextest")?;
    if !status.success() {
        bail!("cargo nextest failed with status {status}");
    }
    Ok(())
}

fn write_fixture(out: &Path) -> Result<()> {
    let document = card_document();
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut data =
        serde_json::to_string_pretty(&document).context("failed to serialize fixture")?;
    data.push('\n');
    fs::write(out, data).with_context(|| format!("failed to write {}", out.display()))?;
    println!("wrote {}", out.display());
    Ok(())
}

/// Card document used across the integration tests: two layers sharing a
/// name, plus a subtitle already bound to a legacy variable.
fn card_document() -> DesignDocument {
    let mut document = DesignDocument::new();
    document.selection = vec![NodeId::new("1:1")];
    document.insert_node(
        "1:1",
        NodeRecord::container(
            "Card",
            NodeKind::Frame,
            vec![NodeId::new("1:2"), NodeId::new("1:3"), NodeId::new("1:4")],
        ),
    );
    document.insert_node("1:2", NodeRecord::text("Title", "Hello"));
    document.insert_node("1:3", NodeRecord::text("Title", "World"));
    document.insert_node(
        "1:4",
        NodeRecord::text("Subtitle", "Bye").bound_to(VariableId::new("var:1")),
    );
    document.collections.push(CollectionRecord {
        id: CollectionId::new("col:1"),
        name: "Localized".to_owned(),
        modes: vec![ModeRecord {
            id: ModeId::new("mode:1"),
            name: "Default".to_owned(),
        }],
        variables: vec![VariableRecord {
            id: VariableId::new("var:1"),
            name: "Legacy/Subtitle".to_owned(),
            values: [(ModeId::new("mode:1"), "Bye".to_owned())].into(),
        }],
    });
    document
}
