use clap::{Args, Parser, Subcommand};
use colored::*;
use anyhow::{bail, Result};
use tracing::{info, warn};

mod app;
mod config;
mod error;
mod handler;
mod logging;
mod question;
mod quran;
mod range;
mod session;
mod timer;
mod tui;
mod ui;

use app::App;
use config::Config;
use error::QuizError;
use question::{clamp_source_page, generate, QuizMode};
use quran::{PageFetcher, QuranClient};
use range::{resolve, PageRange, RangePreset, MAX_PAGE, MIN_PAGE};

/// Attempts `card` makes before giving up on a page range
const MAX_REROLLS: usize = 5;

#[derive(Parser)]
#[command(name = "quran-flashcards")]
#[command(about = "Flashcards for memorizing the Quran page by page")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Default)]
struct QuizArgs {
    /// Quiz mode (first, last, previous, surah, pageNumber, ayahCount, nextPageFirst, prevPageFirst)
    #[arg(short, long)]
    mode: Option<String>,
    /// Page range preset (all, first100, juz1, juz30, baqarah, imran, zahrawain, custom)
    #[arg(short, long)]
    range: Option<String>,
    /// First page of a custom range
    #[arg(long)]
    min: Option<String>,
    /// Last page of a custom range
    #[arg(long)]
    max: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive flashcards (default)
    Play {
        #[command(flatten)]
        quiz: QuizArgs,
        /// Seconds per card, 0 for untimed
        #[arg(short, long)]
        timer: Option<u64>,
    },
    /// Print a single card
    Card {
        #[command(flatten)]
        quiz: QuizArgs,
        /// Also print the answer
        #[arg(long)]
        reveal: bool,
    },
    /// Print the ayat of a page
    Page {
        /// Page number (1-604)
        number: u16,
    },
    /// List quiz modes
    Modes,
    /// List page range presets
    Ranges,
}

/// Layer command-line choices over the saved config
fn apply_overrides(config: &mut Config, quiz: &QuizArgs) -> Result<()> {
    if let Some(mode) = &quiz.mode {
        let Some(mode) = QuizMode::from_str(mode) else {
            bail!("Unknown quiz mode '{}'. Run `quran-flashcards modes` for the list.", mode);
        };
        config.mode = Some(mode.as_str().to_string());
    }
    if let Some(range) = &quiz.range {
        let Some(preset) = RangePreset::from_str(range) else {
            bail!("Unknown range '{}'. Run `quran-flashcards ranges` for the list.", range);
        };
        config.range = Some(preset.as_str().to_string());
    }
    if quiz.min.is_some() || quiz.max.is_some() {
        // Bounds imply a custom range
        config.range = Some(RangePreset::Custom.as_str().to_string());
        config.custom_min = quiz.min.clone().or(config.custom_min.take());
        config.custom_max = quiz.max.clone().or(config.custom_max.take());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Play {
        quiz: QuizArgs::default(),
        timer: None,
    });

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("{}: {}", "Ignoring unreadable config".yellow(), e);
        Config::new()
    });

    match command {
        Commands::Play { quiz, timer } => {
            let _guard = logging::init_file(cli.verbose)?;
            apply_overrides(&mut config, &quiz)?;
            if timer.is_some() {
                config.timer_seconds = timer;
            }
            run_tui(config).await
        }
        Commands::Card { quiz, reveal } => {
            logging::init_stderr(cli.verbose);
            apply_overrides(&mut config, &quiz)?;
            print_card(&config, reveal).await
        }
        Commands::Page { number } => {
            logging::init_stderr(cli.verbose);
            print_page(&config, number).await
        }
        Commands::Modes => {
            list_modes();
            Ok(())
        }
        Commands::Ranges => {
            list_ranges();
            Ok(())
        }
    }
}

async fn run_tui(mut config: Config) -> Result<()> {
    info!("Starting interactive session");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(&config);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event)?,
                None => break,
            }
        }
        anyhow::Ok(())
    }
    .await;

    tui::restore()?;
    app.save_selection(&mut config);
    println!("النتيجة: {}", app.session.score());
    result
}

async fn print_card(config: &Config, reveal: bool) -> Result<()> {
    let mode = config.quiz_mode();
    let range = resolve(
        config.range_preset(),
        config.custom_min.as_deref().unwrap_or(""),
        config.custom_max.as_deref().unwrap_or(""),
    );
    let mut fetcher = PageFetcher::new(QuranClient::new(config.api_base(), config.edition()));
    let mut rng = rand::thread_rng();

    let mut last_error = None;
    for attempt in 1..=MAX_REROLLS {
        let page = clamp_source_page(mode, range.sample(&mut rng));
        let verses = fetcher.get_page(page).await?;

        let adjacent = match mode.adjacent_page(page) {
            Some(other) if !verses.is_empty() => Some(fetcher.get_page(other).await?),
            _ => None,
        };

        match generate(&mut rng, mode, &verses, page, adjacent.as_deref()) {
            Some(card) => {
                println!("{}", mode.help_text().dimmed());
                println!();
                println!("{}  {}", "س:".bold().cyan(), card.question);
                if reveal {
                    println!("{}  {}", "ج:".bold().green(), card.answer);
                    println!("{}", format!("صفحة {}", card.source_page).dimmed());
                }
                return Ok(());
            }
            None => {
                warn!(attempt, page, "page cannot produce a question, re-rolling");
                last_error = Some(QuizError::GenerationImpossible { mode, page });
            }
        }
    }

    match last_error {
        Some(err) => Err(err.into()),
        None => bail!("No card generated"),
    }
}

async fn print_page(config: &Config, number: u16) -> Result<()> {
    if !PageRange::new(MIN_PAGE, MAX_PAGE).contains(number) {
        bail!("Page must be between {} and {}", MIN_PAGE, MAX_PAGE);
    }

    let mut fetcher = PageFetcher::new(QuranClient::new(config.api_base(), config.edition()));
    let verses = fetcher.get_page(number).await?;

    println!("\n{}", format!("📖 صفحة {}", number).bold().green());
    println!("{}", "=".repeat(50).dimmed());

    let mut current_surah = "";
    for verse in verses.iter() {
        if verse.surah_name != current_surah {
            current_surah = &verse.surah_name;
            let english = verse.surah_english_name.as_deref().unwrap_or_default();
            println!("\n{} {}", current_surah.bold().blue(), english.dimmed());
        }
        let number = verse
            .number_in_surah
            .map(|n| n.to_string())
            .unwrap_or_else(|| (verse.position + 1).to_string());
        println!("{}  {}", format!("({})", number).bold().yellow(), verse.text);
    }

    println!("\n{}", "=".repeat(50).dimmed());
    println!("{} ayat", verses.len().to_string().bold());
    Ok(())
}

fn list_modes() {
    println!("\n{}", "Quiz modes".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    for mode in QuizMode::all() {
        println!("  • {} — {}", mode.as_str().green(), mode.label());
        println!("    {}", mode.description().dimmed());
    }
}

fn list_ranges() {
    println!("\n{}", "Page ranges".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    for preset in RangePreset::all() {
        match preset.bounds() {
            Some(bounds) => println!(
                "  • {} — {} ({}-{}, {} pages)",
                preset.as_str().green(),
                preset.display_name(),
                bounds.min,
                bounds.max,
                bounds.len()
            ),
            None => println!(
                "  • {} — {} (--min/--max)",
                preset.as_str().green(),
                preset.display_name()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_default_to_play() {
        let cli = Cli::try_parse_from(["quran-flashcards"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_card_args() {
        let cli = Cli::try_parse_from([
            "quran-flashcards", "-vv", "card", "--mode", "ayahCount", "--range", "juz30", "--reveal",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Card { quiz, reveal }) => {
                assert!(reveal);
                assert_eq!(quiz.mode.as_deref(), Some("ayahCount"));
                assert_eq!(quiz.range.as_deref(), Some("juz30"));
            }
            _ => panic!("expected card command"),
        }
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let mut config = Config::new();
        let quiz = QuizArgs {
            mode: Some("next-page-first".to_string()),
            min: Some("700".to_string()),
            ..QuizArgs::default()
        };
        apply_overrides(&mut config, &quiz).unwrap();
        assert_eq!(config.quiz_mode(), QuizMode::NextPageFirst);
        assert_eq!(config.range_preset(), RangePreset::Custom);
        assert_eq!(config.custom_min.as_deref(), Some("700"));
        assert_eq!(config.custom_max, None);
    }

    #[test]
    fn test_overrides_reject_unknown_mode() {
        let mut config = Config::new();
        let quiz = QuizArgs {
            mode: Some("hardest".to_string()),
            ..QuizArgs::default()
        };
        assert!(apply_overrides(&mut config, &quiz).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
