use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use depo_analyst::{
    config::Config,
    export::{verify_report_hash, HTML_EXPORT_FILENAME, JSON_EXPORT_FILENAME},
    gemini::GeminiClient,
    model::{AnalysisNode, Indicator, Veracity},
    session::SessionController,
    storage::SqliteStorage,
};

#[derive(Parser)]
#[command(name = "depo-analyst", version, about = "Deposition analysis engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a deposition transcript, replacing the current session
    Analyze {
        /// Plain-text transcript to analyze
        text_file: PathBuf,
        /// Original source document (e.g. the PDF) to hash instead of
        /// the transcript text
        #[arg(long)]
        source_pdf: Option<PathBuf>,
    },
    /// Print the summary dashboard for the current analysis
    Summary,
    /// Search and filter the analysis tree
    Search {
        /// Free-text query over titles, content and notes
        query: Option<String>,
        /// Restrict to nodes with one of these veracity values
        #[arg(long)]
        veracity: Vec<String>,
        /// Restrict to nodes carrying one of these indicators
        #[arg(long)]
        indicator: Vec<String>,
    },
    /// Select or deselect nodes for export
    Select {
        /// Node ids to toggle
        ids: Vec<String>,
        /// Select every node
        #[arg(long, conflicts_with = "none")]
        all: bool,
        /// Clear the selection
        #[arg(long)]
        none: bool,
        /// Deselect the given ids instead of selecting them
        #[arg(long)]
        remove: bool,
    },
    /// Fetch a counter-argument for a node
    Explore {
        /// Node id
        id: String,
    },
    /// Fact-check a node with search grounding
    FactCheck {
        /// Node id
        id: String,
    },
    /// Set the private note on a node
    Note {
        /// Node id
        id: String,
        /// Note text (empty clears the note)
        text: String,
    },
    /// Draft a motion document for a suggested motion
    Motion {
        /// Index of the motion in the summary's suggested list
        index: usize,
        /// Write the draft here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export the selected nodes as verifiable JSON
    ExportJson {
        /// Output path (defaults to the standard export filename)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export the selected nodes as a standalone HTML report
    ExportHtml {
        /// Output path (defaults to the standard export filename)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a previously exported JSON analysis
    Import {
        /// Exported JSON file
        file: PathBuf,
    },
    /// Verify the self-referential report hash of an exported JSON file
    Verify {
        /// Exported JSON file
        file: PathBuf,
    },
    /// Discard the current session
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    // Verify needs no session or provider.
    if let Command::Verify { file } = &cli.command {
        let text = std::fs::read_to_string(file)?;
        let verification = verify_report_hash(&text)?;
        if verification.is_valid() {
            println!("OK: report hash {} verified", verification.stored);
            return Ok(());
        }
        println!(
            "MISMATCH: stored {} but computed {}",
            verification.stored, verification.computed
        );
        std::process::exit(1);
    }

    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    let client = GeminiClient::new(&config.gemini, config.request.clone())?;
    let mut session = SessionController::new(client, storage);
    session.restore().await?;

    match cli.command {
        Command::Analyze {
            text_file,
            source_pdf,
        } => {
            let text = std::fs::read_to_string(&text_file)?;
            let source_bytes = match &source_pdf {
                Some(path) => std::fs::read(path)?,
                None => text.clone().into_bytes(),
            };
            let file_name = source_pdf
                .as_deref()
                .unwrap_or(&text_file)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            session.load_document(file_name, text, &source_bytes);
            session.analyze().await?;
            session.save().await?;

            if let Some(banner) = &session.state.last_error {
                eprintln!("{}", banner);
            }
            if let Some(root) = &session.state.analysis {
                print_tree(root, 0);
            }
        }
        Command::Summary => match &session.state.summary {
            Some(summary) => println!("{}", serde_json::to_string_pretty(summary)?),
            None => println!("No analysis in the current session."),
        },
        Command::Search {
            query,
            veracity,
            indicator,
        } => {
            session.set_search_query(query.unwrap_or_default());
            for v in veracity {
                let parsed: Veracity = v.parse().map_err(anyhow::Error::msg)?;
                session.toggle_veracity_filter(parsed);
            }
            for i in indicator {
                let parsed: Indicator = i.parse().map_err(anyhow::Error::msg)?;
                session.toggle_indicator_filter(parsed);
            }
            match session.filtered_view() {
                Some(view) => print_tree(&view, 0),
                None => println!("No matching nodes."),
            }
        }
        Command::Select {
            ids,
            all,
            none,
            remove,
        } => {
            if all {
                session.select_all();
            } else if none {
                session.select_none();
            } else {
                for id in &ids {
                    session.select(id, !remove)?;
                }
            }
            session.save().await?;
            println!("{} node(s) selected", session.state.selected_ids.len());
        }
        Command::Explore { id } => {
            session.explore(&id).await?;
            session.save().await?;
            if let Some(root) = &session.state.analysis {
                if let Some(node) = depo_analyst::tree::find(root, &id) {
                    if let Some(alternative) = &node.alternative {
                        println!("{}", alternative);
                    }
                }
            }
        }
        Command::FactCheck { id } => {
            session.fact_check(&id).await?;
            session.save().await?;
            if let Some(root) = &session.state.analysis {
                if let Some(node) = depo_analyst::tree::find(root, &id) {
                    if let Some(grounding) = &node.grounding {
                        println!("{}", grounding.summary);
                        for source in &grounding.sources {
                            println!("  - {} ({})", source.title, source.uri);
                        }
                    }
                }
            }
        }
        Command::Note { id, text } => {
            session.update_note(&id, text)?;
            session.save().await?;
        }
        Command::Motion { index, out } => {
            let document = session.generate_motion(index).await?;
            match out {
                Some(path) => std::fs::write(path, document)?,
                None => println!("{}", document),
            }
        }
        Command::ExportJson { out } => {
            match session.export_json(Utc::now()) {
                Some(text) => {
                    let path = out.unwrap_or_else(|| PathBuf::from(JSON_EXPORT_FILENAME));
                    std::fs::write(&path, text)?;
                    println!("Wrote {}", path.display());
                }
                None => {
                    eprintln!("Nothing selected; select nodes before exporting.");
                    std::process::exit(1);
                }
            };
        }
        Command::ExportHtml { out } => {
            match session.export_html() {
                Some(text) => {
                    let path = out.unwrap_or_else(|| PathBuf::from(HTML_EXPORT_FILENAME));
                    std::fs::write(&path, text)?;
                    println!("Wrote {}", path.display());
                }
                None => {
                    eprintln!("Nothing selected; select nodes before exporting.");
                    std::process::exit(1);
                }
            };
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(file)?;
            session.import_json(&text)?;
            session.save().await?;
            if let Some(root) = &session.state.analysis {
                println!(
                    "Imported {} node(s)",
                    depo_analyst::tree::count(root)
                );
            }
        }
        Command::Verify { .. } => unreachable!("handled above"),
        Command::Reset => {
            session.start_new_session().await?;
            println!("Session cleared.");
        }
    }

    Ok(())
}

/// Print a node and its subtree with two-space indentation.
fn print_tree(node: &AnalysisNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let mut line = format!("{}[{}] {}", indent, node.id, node.title);
    if let Some(veracity) = node.veracity {
        line.push_str(&format!(" ({})", veracity));
    }
    if node.is_selected {
        line.push_str(" *");
    }
    println!("{}", line);
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        depo_analyst::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        depo_analyst::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
