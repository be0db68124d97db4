use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing_subscriber::EnvFilter;

use vocab_battle::backend::ResultBackend;
use vocab_battle::catalog::{Catalog, Descriptor};
use vocab_battle::config::Config;
use vocab_battle::engine::selector::PowerTier;
use vocab_battle::session::battle::{AnswerOutcome, BattleOutcome, BattlePhase, Combatant};
use vocab_battle::session::{BattleSession, ResultReporter, SessionSettings};
use vocab_battle::store::json_store::JsonStore;
use vocab_battle::vocabulary::{self, VocabularyItem};

const QUIT_COMMAND: &str = ":quit";

#[derive(Parser)]
#[command(name = "vocab-battle", version, about = "Turn-based vocabulary battles in the terminal")]
struct Cli {
    #[arg(long, help = "Hero id (skips the hero prompt)")]
    hero: Option<String>,

    #[arg(long, help = "Location id (skips the location prompt)")]
    location: Option<String>,

    #[arg(long, help = "Enemy id (skips the enemy prompt)")]
    enemy: Option<String>,

    #[arg(short, long, help = "Built-in vocabulary language (es, fr)")]
    language: Option<String>,

    #[arg(long, help = "Vocabulary JSON file: [{\"term\": ..., \"translation\": ...}]")]
    vocab: Option<PathBuf>,

    #[arg(short = 'n', long, help = "Number of words offered per turn")]
    count: Option<usize>,

    #[arg(long, help = "Seed for damage rolls and word shuffling")]
    seed: Option<u64>,

    #[arg(long, help = "Ranking backend endpoint; results are stored locally without one")]
    backend_url: Option<String>,

    #[arg(long, help = "Persist the effective settings to the config file")]
    save_config: bool,

    #[arg(short, long, help = "Log engine transitions to stderr")]
    verbose: bool,
}

type Lines<'a> = io::Lines<io::StdinLock<'a>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().unwrap_or_default();
    if let Some(language) = cli.language.clone() {
        config.language = language;
    }
    if let Some(path) = &cli.vocab {
        config.vocabulary_path = Some(path.to_string_lossy().to_string());
    }
    if let Some(count) = cli.count {
        config.action_count = count;
    }
    if let Some(url) = cli.backend_url.clone() {
        config.backend_url = Some(url);
    }
    config.normalize();
    if cli.save_config {
        config.save()?;
    }

    let vocabulary = load_vocabulary(&config)?;
    let catalog = Arc::new(Catalog::builtin());
    let rng = match cli.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let mut session = BattleSession::new(
        SessionSettings::from(&config),
        Arc::clone(&catalog),
        vocabulary,
        rng,
    );
    let reporter = ResultReporter::new(make_backend(&config)?);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut presets = (cli.hero.clone(), cli.location.clone(), cli.enemy.clone());

    loop {
        session.start_selection();
        let (hero, location, enemy) = std::mem::take(&mut presets);
        if !pick(&mut lines, "hero", &catalog.heroes, hero, |id| session.select_hero(id))?
            || !pick(&mut lines, "location", &catalog.locations, location, |id| {
                session.select_location(id)
            })?
            || !pick(&mut lines, "enemy", &catalog.enemies, enemy, |id| session.select_enemy(id))?
        {
            return Ok(());
        }

        session.begin_battle()?;
        if !play(&mut lines, &mut session).await? {
            return Ok(());
        }

        match session.report_outcome(&reporter).await {
            Ok(Some(report)) => println!(
                "Earned {} XP (accuracy {:.0}%).",
                report.xp_earned, report.accuracy
            ),
            Ok(None) => {}
            Err(err) => eprintln!("Could not submit the battle result: {err}"),
        }

        if !confirm(&mut lines, "Play again? [y/N] ")? {
            return Ok(());
        }
        session.reset();
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "vocab_battle=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_vocabulary(config: &Config) -> Result<Vec<VocabularyItem>> {
    if let Some(path) = &config.vocabulary_path {
        return vocabulary::load_from_path(Path::new(path));
    }
    vocabulary::builtin(&config.language)
        .with_context(|| format!("no built-in vocabulary for language '{}'", config.language))
}

fn make_backend(config: &Config) -> Result<Box<dyn ResultBackend>> {
    if let Some(backend) = remote_backend(config)? {
        return Ok(backend);
    }
    let store = JsonStore::with_base_dir(PathBuf::from(&config.data_dir))?;
    Ok(Box::new(store))
}

#[cfg(feature = "network")]
fn remote_backend(config: &Config) -> Result<Option<Box<dyn ResultBackend>>> {
    match &config.backend_url {
        Some(url) => Ok(Some(Box::new(vocab_battle::backend::HttpBackend::new(url)?))),
        None => Ok(None),
    }
}

#[cfg(not(feature = "network"))]
fn remote_backend(config: &Config) -> Result<Option<Box<dyn ResultBackend>>> {
    if config.backend_url.is_some() {
        tracing::warn!("built without the network feature, storing results locally");
    }
    Ok(None)
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    io::stdout().flush()?;
    Ok(())
}

fn read_line(lines: &mut Lines<'_>) -> Result<Option<String>> {
    match lines.next() {
        Some(line) => Ok(Some(line?)),
        None => Ok(None),
    }
}

/// Apply a preset id if it is accepted, otherwise ask until one is.
/// Returns `false` when input ends or the player quits.
fn pick(
    lines: &mut Lines<'_>,
    label: &str,
    options: &[Descriptor],
    preset: Option<String>,
    mut select: impl FnMut(&str) -> bool,
) -> Result<bool> {
    if let Some(id) = preset {
        if select(&id) {
            return Ok(true);
        }
        eprintln!("Unknown {label} '{id}'.");
    }

    println!("Choose a {label}:");
    for (i, option) in options.iter().enumerate() {
        println!("  {}. {} ({}, x{:.1})", i + 1, option.name, option.id, option.multiplier);
    }
    loop {
        prompt("> ")?;
        let Some(line) = read_line(lines)? else {
            return Ok(false);
        };
        let choice = line.trim();
        if choice == QUIT_COMMAND {
            return Ok(false);
        }
        let id = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| options.get(idx))
            .map_or(choice, |option| option.id.as_str());
        if select(id) {
            return Ok(true);
        }
        println!("No {label} called '{choice}'.");
    }
}

fn health_bar(combatant: Combatant) -> String {
    const WIDTH: u64 = 20;
    let filled = (u64::from(combatant.health) * WIDTH)
        .div_ceil(u64::from(combatant.max_health))
        .min(WIDTH);
    format!(
        "[{}{}] {}/{}",
        "#".repeat(filled as usize),
        "-".repeat((WIDTH - filled) as usize),
        combatant.health,
        combatant.max_health
    )
}

/// Run the turn loop until the battle ends. Returns `false` if the player quit.
async fn play(lines: &mut Lines<'_>, session: &mut BattleSession) -> Result<bool> {
    while session.battle().phase() == BattlePhase::Playing {
        let battle = session.battle();
        println!();
        println!("You   {}", health_bar(battle.player()));
        println!("Enemy {}", health_bar(battle.enemy()));
        if battle.streak() > 1 {
            println!("Streak: {}", battle.streak());
        }
        println!("Translate one of:");
        for action in battle.actions() {
            let marker = match action.power {
                PowerTier::Power => " *power*",
                PowerTier::Basic => "",
            };
            println!("  {}{marker}", action.term);
        }

        prompt("> ")?;
        let Some(line) = read_line(lines)? else {
            return Ok(false);
        };
        if line.trim() == QUIT_COMMAND {
            return Ok(false);
        }
        let Some(turn) = session.resolve_player_turn(&line) else {
            continue;
        };

        match &turn.resolution.outcome {
            AnswerOutcome::Hit { term, damage, .. } => {
                println!("Correct! '{term}' hits for {damage}.");
            }
            AnswerOutcome::Miss { term, expected } => {
                println!("Miss. '{term}' means '{expected}'.");
            }
        }

        if let Some(ticket) = turn.enemy_turn {
            tokio::time::sleep(ticket.delay).await;
            if let Some(strike) = session.resolve_enemy_turn(ticket) {
                println!("The enemy strikes for {}.", strike.damage);
            }
        }
    }

    match session.battle().outcome() {
        Some(BattleOutcome::Victory) => println!("\nVictory!"),
        Some(BattleOutcome::Defeat) => println!("\nDefeat."),
        None => {}
    }
    Ok(true)
}

fn confirm(lines: &mut Lines<'_>, text: &str) -> Result<bool> {
    prompt(text)?;
    Ok(read_line(lines)?
        .map(|answer| answer.trim().eq_ignore_ascii_case("y"))
        .unwrap_or(false))
}
