//! 命令行入口：对一份英文稿件运行一次自动处理周期

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use autoprocess::env::{self, EnvVar};
use autoprocess::pipeline::{
    AuthoredContent, Collaborators, ConfigManager, CycleOrchestrator, CycleOutcome,
    DebouncedTrigger, EditorSession, HttpCollaborators, PipelineSettings,
};

#[derive(Parser, Debug)]
#[command(
    name = "autoprocess",
    version,
    about = "Format, translate (Khmer) and analyze article drafts"
)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one processing cycle on a draft (use '-' for stdin)
    Run {
        input: PathBuf,

        /// Existing Khmer text to start from
        #[arg(long)]
        kh: Option<PathBuf>,

        /// Article id forwarded to the formatting service
        #[arg(long)]
        article_id: Option<String>,

        /// Configuration file (TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        no_format: bool,

        #[arg(long)]
        no_translate: bool,

        #[arg(long)]
        no_analyze: bool,
    },
    /// Write an example configuration file
    InitConfig { path: PathBuf },
    /// Print environment variable documentation
    EnvDocs {
        /// Also summarize the variables currently set
        #[arg(long)]
        current: bool,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        env::core::LogLevel::get_or_default("info".to_string())
    };
    let max_level = level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: &PathBuf) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(path)
    }
}

fn load_settings(config: Option<&PathBuf>) -> Result<PipelineSettings, Box<dyn std::error::Error>> {
    let manager = match config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };
    Ok(manager.into_settings())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run {
            input,
            kh,
            article_id,
            config,
            no_format,
            no_translate,
            no_analyze,
        } => {
            let settings = load_settings(config.as_ref())?;

            let mut toggles = settings.auto_processing();
            toggles.auto_format &= !no_format;
            toggles.auto_translate &= !no_translate;
            toggles.auto_analyze &= !no_analyze;

            let en = read_input(&input)?;
            let kh = match kh {
                Some(path) => read_input(&path)?,
                None => String::new(),
            };

            let services = Collaborators::from_shared(Arc::new(HttpCollaborators::new(&settings)?));
            let session = EditorSession::with_content(AuthoredContent::new(en, kh));
            let orchestrator =
                Arc::new(CycleOrchestrator::new(session.clone(), services, settings));
            let trigger = DebouncedTrigger::new(orchestrator, toggles, article_id);

            let outcome = trigger.process_now().await;
            let stats = session.stats().snapshot();

            let output = json!({
                "outcome": describe(&outcome),
                "content": session.content(),
                "analysis": session.analysis(),
                "status": session.status(),
                "stats": stats,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);

            if let CycleOutcome::Aborted(e) = outcome {
                return Err(Box::new(e) as Box<dyn std::error::Error>);
            }
        }
        Command::InitConfig { path } => {
            ConfigManager::generate_example_config(&path)?;
            eprintln!("Wrote {}", path.display());
        }
        Command::EnvDocs { current } => {
            print!("{}", env::generate_env_docs());
            if current {
                println!();
                env::EnvConfig::from_env()?.print_summary();
            }
        }
    }

    Ok(())
}

fn describe(outcome: &CycleOutcome) -> serde_json::Value {
    match outcome {
        CycleOutcome::Completed(summary) => json!({
            "result": "completed",
            "cycle": summary.cycle_id,
            "formatted": summary.formatted,
            "translated": summary.translated,
            "analyzed": summary.analyzed,
            "elapsed_ms": summary.elapsed.as_millis() as u64,
        }),
        CycleOutcome::Aborted(e) => json!({ "result": "aborted", "error": e.to_string() }),
        CycleOutcome::Superseded => json!({ "result": "superseded" }),
        CycleOutcome::Skipped(reason) => json!({
            "result": "skipped",
            "reason": format!("{:?}", reason),
        }),
    }
}
