//! Command-line front end for brewing and browsing sticker packs.

mod progress;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use log::{debug, info};
use progress::ProgressPrinter;
use snapstix::core::{
    ShareError, ShareRequest, ShareTarget, SnapStix, UnsupportedShareTarget, export_sticker,
    open_collection,
};
use snapstix::config::SnapstixConfig;
use snapstix::protocol::{SlotState, Sticker};
use snapstix::{init_logging, read_source_image};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line options for the SnapStix client.
#[derive(Parser)]
#[command(name = "snapstix", version, about = "Turn a photo into a sticker pack")]
struct Cli {
    /// Optional path to a snapstix.json5 config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Brew a sticker pack from a photo
    Brew {
        /// Source photo (png, jpg, webp, gif, heic)
        #[arg(long)]
        image: PathBuf,
        /// Character theme, e.g. "Space Cat"
        #[arg(long, default_value = "")]
        theme: String,
        /// Offer a retry for each failed slot once the pack settles
        #[arg(long)]
        retry_failed: bool,
    },
    /// List stickers in the collection, newest first
    Gallery,
    /// Save a sticker image to disk
    Export {
        /// Sticker id as shown by `gallery`
        id: String,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Hand a sticker to the platform share mechanism
    Share {
        /// Sticker id as shown by `gallery`
        id: String,
    },
}

/// Entry point for the SnapStix CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    info!("starting snapstix (config_set={})", cli.config.is_some());
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Brew {
            image,
            theme,
            retry_failed,
        } => brew(config, image, theme, retry_failed).await,
        Command::Gallery => gallery(&config),
        Command::Export { id, out } => {
            let sticker = find_sticker(&config, &id)?;
            let path = export_sticker(&sticker, &out).context("failed to export sticker")?;
            println!("Saved {}", path.display());
            Ok(())
        }
        Command::Share { id } => {
            let sticker = find_sticker(&config, &id)?;
            let request = ShareRequest::for_sticker(&sticker).context("failed to read sticker")?;
            match UnsupportedShareTarget.share(&request) {
                Ok(()) => {
                    println!("Shared {}", request.file_name);
                    Ok(())
                }
                Err(ShareError::Unsupported) => {
                    println!("Sharing not supported on this platform. Try exporting!");
                    Ok(())
                }
                Err(err) => Err(err.into()),
            }
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SnapstixConfig> {
    if let Some(path) = path {
        return SnapstixConfig::load_from_path(path).context("failed to load config");
    }
    let cwd = std::env::current_dir().context("cwd")?;
    let layered = SnapstixConfig::load_layered(&cwd).context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    Ok(layered.config)
}

async fn brew(
    config: SnapstixConfig,
    image: PathBuf,
    theme: String,
    retry_failed: bool,
) -> anyhow::Result<()> {
    let source = read_source_image(&image)?;
    let printer = Arc::new(ProgressPrinter::new(config.brew.expressions.clone()));
    let app = SnapStix::builder(config)
        .event_sink(printer)
        .build()
        .context("failed to start snapstix")?;

    let report = app.brew(&source, &theme).await?;
    if let Some(message) = report.outcome.message() {
        println!("{message}");
    }
    if retry_failed {
        retry_failed_slots(&app, &report.slots, confirm).await?;
    }
    let snapshot = app.orchestrator().snapshot();
    let succeeded = snapshot.slots.iter().filter(|slot| slot.is_succeeded()).count();
    if succeeded == 0 {
        bail!("no stickers were brewed");
    }
    if retry_failed {
        println!("{succeeded}/{} stickers in this pack", snapshot.total);
    }
    Ok(())
}

/// Offer one manual retry per failed slot, including after a fully failed pack.
async fn retry_failed_slots(
    app: &SnapStix,
    slots: &[SlotState],
    mut ask: impl FnMut(&str) -> anyhow::Result<bool>,
) -> anyhow::Result<()> {
    for (index, slot) in slots.iter().enumerate() {
        let SlotState::Failed { label, .. } = slot else {
            continue;
        };
        if !ask(&format!("Retry {label}?"))? {
            continue;
        }
        match app.retry(index).await? {
            SlotState::Succeeded { sticker_id, .. } => println!("Recovered {label} ({sticker_id})"),
            SlotState::Failed { reason, .. } => println!("{label} failed again: {reason}"),
            other => debug!("unexpected slot state after retry (slot={index}, state={other:?})"),
        }
    }
    Ok(())
}

fn gallery(config: &SnapstixConfig) -> anyhow::Result<()> {
    let collection = open_collection(config).context("failed to open collection")?;
    let stickers = collection.snapshot();
    if stickers.is_empty() {
        println!("Your collection is empty. Brew a pack first!");
        return Ok(());
    }
    for sticker in stickers {
        let created = sticker
            .created_at_utc()
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("{}  {created}  {}", sticker.id, sticker.label);
    }
    Ok(())
}

fn find_sticker(config: &SnapstixConfig, id: &str) -> anyhow::Result<Sticker> {
    let collection = open_collection(config).context("failed to open collection")?;
    collection
        .get(id)
        .ok_or_else(|| anyhow!("no sticker with id {id}"))
}

/// Ask a yes/no question on stdin; anything but `y`/`yes` is no.
fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use snapstix::config::BrewConfig;
    use snapstix::core::BatchOutcome;
    use snapstix::genai::GenerationError;
    use snapstix::protocol::default_expressions;
    use snapstix_test_utils::{
        CountLimitedStore, RESULT_DATA_URL, SOURCE_DATA_URL, ScriptedGenerator,
    };

    fn app_with(generator: ScriptedGenerator) -> SnapStix {
        let config = SnapstixConfig::builder()
            .brew(BrewConfig {
                stagger_ms: 0,
                ..BrewConfig::default()
            })
            .build();
        SnapStix::builder(config)
            .generator(Arc::new(generator))
            .backend(Arc::new(CountLimitedStore::new(10)))
            .build()
            .expect("app")
    }

    #[tokio::test]
    async fn fully_failed_pack_is_still_offered_retries() {
        let generator = default_expressions().into_iter().fold(
            ScriptedGenerator::succeeding(RESULT_DATA_URL),
            |generator, expression| {
                generator.once(
                    expression.label,
                    Err(GenerationError::EmptyResponse("blocked".to_string())),
                )
            },
        );
        let app = app_with(generator);
        let report = app.brew(SOURCE_DATA_URL, "Dragon").await.expect("brew");
        assert_eq!(report.outcome, BatchOutcome::AllFailed);

        let mut asked = Vec::new();
        retry_failed_slots(&app, &report.slots, |question| {
            asked.push(question.to_string());
            Ok(true)
        })
        .await
        .expect("retries");

        assert_eq!(asked.len(), 5);
        assert_eq!(asked[0], "Retry Dragon (Happy)?");
        assert!(app.orchestrator().snapshot().slots.iter().all(SlotState::is_succeeded));
        assert_eq!(app.gallery().len(), 5);
    }

    #[tokio::test]
    async fn declined_retries_leave_slots_failed() {
        let generator = ScriptedGenerator::succeeding(RESULT_DATA_URL).once(
            "Cool",
            Err(GenerationError::UpstreamFailure("busy".to_string())),
        );
        let app = app_with(generator);
        let report = app.brew(SOURCE_DATA_URL, "Dragon").await.expect("brew");

        retry_failed_slots(&app, &report.slots, |_| Ok(false))
            .await
            .expect("retries");

        assert!(app.orchestrator().snapshot().slots[2].is_failed());
        assert_eq!(app.gallery().len(), 4);
    }
}
