//! Flipper Table entry point
//!
//! Natively this is a headless runner: it loads a level (or the built-in
//! table), plays a scripted session on the rapier backend and reports the
//! outcome. The web build is driven from JavaScript through `web::WebTable`.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs::File;
    use std::path::PathBuf;

    use anyhow::{Context, Result, bail};
    use clap::Parser;

    use flipper_table::consts::SIM_DT;
    use flipper_table::input::InputState;
    use flipper_table::level::{DirLevelStore, LevelStore};
    use flipper_table::sim::{FrameClock, GamePhase, PlaySession, RapierWorld, ScoreEvent};
    use flipper_table::{Level, Settings};

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Headless pinball table runner", long_about = None)]
    struct Args {
        /// Level JSON file to play (defaults to the built-in table)
        level: Option<PathBuf>,

        /// Level directory with an index.json; plays the entry named by --name
        #[arg(long, conflicts_with = "level")]
        levels_dir: Option<PathBuf>,

        /// Display name of the level to play from --levels-dir
        #[arg(long, requires = "levels_dir")]
        name: Option<String>,

        /// Print the levels in --levels-dir and exit
        #[arg(long, requires = "levels_dir")]
        list: bool,

        /// Settings file (created with defaults if missing)
        #[arg(long, default_value = "flipper-settings.json")]
        settings: PathBuf,

        /// Number of display frames to simulate
        #[arg(long, default_value_t = 3600)]
        frames: u32,

        /// Fixed launch-jitter seed (overrides settings)
        #[arg(long)]
        seed: Option<u64>,

        /// Write the final snapshot as JSON
        #[arg(long)]
        snapshot_json: Option<PathBuf>,

        /// Write the built-in table as a level file and exit
        #[arg(long)]
        export_classic: Option<PathBuf>,
    }

    fn load_level(args: &Args) -> Result<Level> {
        if let Some(path) = &args.level {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            return Level::from_json(&json).with_context(|| format!("loading {}", path.display()));
        }
        if let Some(dir) = &args.levels_dir {
            let store = DirLevelStore::new(dir);
            let entries = store.list();
            let entry = match &args.name {
                Some(name) => entries.iter().find(|e| &e.name == name),
                None => entries.first(),
            };
            let Some(entry) = entry else {
                bail!("no matching level in {}", dir.display());
            };
            return store.load(entry).with_context(|| format!("loading {}", entry.filename));
        }
        Ok(Level::classic())
    }

    /// Scripted player: launch whenever the ball is served, alternate the
    /// flippers every quarter second
    fn script(input: &mut InputState, frame: u32, serve: bool) {
        if serve {
            input.key_down(" ");
        } else {
            input.key_up(" ");
        }
        let left_phase = (frame / 15) % 2 == 0;
        if left_phase {
            input.key_down("z");
            input.key_up("/");
        } else {
            input.key_up("z");
            input.key_down("/");
        }
    }

    pub fn run() -> Result<()> {
        let args = Args::parse();

        let settings = Settings::load_from(&args.settings);
        env_logger::Builder::new()
            .filter_level(settings.log_level_filter())
            .parse_default_env()
            .init();

        if args.list {
            if let Some(dir) = &args.levels_dir {
                for entry in DirLevelStore::new(dir).list() {
                    println!("{}\t{}", entry.name, entry.filename);
                }
            }
            return Ok(());
        }

        if let Some(path) = &args.export_classic {
            std::fs::write(path, Level::classic().to_json_pretty()?)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote the built-in table to {}", path.display());
            return Ok(());
        }

        let level = load_level(&args)?;
        let fresh_seed = chrono::Utc::now().timestamp_millis().unsigned_abs();
        let mut options = settings.session_options(fresh_seed);
        if let Some(seed) = args.seed {
            options.seed = seed;
        }

        let mut session = PlaySession::new(RapierWorld::default(), &level, options);
        let mut input = InputState::new(settings.bindings.clone());
        let mut clock = FrameClock::default();
        let mut serve = true;
        let mut jackpots = 0u32;

        for frame in 0..args.frames {
            script(&mut input, frame, serve);
            serve = false;
            for _ in 0..clock.advance(SIM_DT) {
                session.tick(&input.tick_input());
            }
            for event in session.drain_events() {
                log::debug!("Frame {}: {:?}", frame, event);
                match event {
                    ScoreEvent::BallLost { .. } => serve = true,
                    ScoreEvent::Jackpot => jackpots += 1,
                    _ => {}
                }
            }
            if session.phase() == GamePhase::GameOver {
                log::info!("Game over after {} frames", frame + 1);
                break;
            }
        }

        let snapshot = session.snapshot();
        if let Some(path) = args.snapshot_json.as_deref() {
            let file = File::create(path)?;
            serde_json::to_writer_pretty(file, &snapshot)?;
            println!("Wrote final snapshot to {}", path.display());
        }

        if !args.settings.exists() {
            settings.save_to(&args.settings);
        }

        println!("Level: {}", level.name);
        println!("Seed: {}", options.seed);
        println!("Ticks: {}", snapshot.tick);
        println!("Score: {}", snapshot.score);
        println!("Lives: {}", snapshot.lives);
        println!("Jackpots: {}", jackpots);
        match snapshot.phase {
            GamePhase::GameOver => println!("Game over"),
            GamePhase::Playing => println!("Still playing"),
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start in the library
}
