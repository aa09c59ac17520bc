//! Cube Survivor headless driver
//!
//! Runs a seeded session for a fixed amount of simulated time with a scripted
//! movement pattern and prints a summary. Progress is saved to `--save-dir`.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use clap::Parser;
    use glam::Vec2;

    use cube_survivor::consts::SIM_DT;
    use cube_survivor::persistence::{JsonFileStore, ProgressStore};
    use cube_survivor::sim::{AttributeKind, GameEvent, GamePhase, MoveInput, TickInput, Topic};
    use cube_survivor::{Session, Tuning};

    #[derive(Debug, Parser)]
    #[command(name = "cube-survivor", about = "Run a headless cube-survivor session")]
    struct Args {
        /// RNG seed
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Simulated seconds to run
        #[arg(long, default_value_t = 120)]
        seconds: u32,
        /// JSON tuning file (defaults built in)
        #[arg(long)]
        tuning: Option<PathBuf>,
        /// Directory for progress and settings records
        #[arg(long, default_value = "saves")]
        save_dir: PathBuf,
        /// Attribute to play with (None, Fire, Ice, Lightning, Earth)
        #[arg(long)]
        attribute: Option<String>,
    }

    /// Circle around the origin, hopping every few seconds
    fn scripted_input(tick: u64) -> TickInput {
        let t = tick as f32 * SIM_DT;
        TickInput {
            movement: MoveInput {
                direction: Vec2::new(t.cos(), t.sin()),
                jump: tick % 300 == 0,
            },
            pause: false,
        }
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        cube_survivor::init_logging();
        let args = Args::parse();

        let tuning = match &args.tuning {
            Some(path) => Tuning::load(path)?,
            None => Tuning::default(),
        };

        let store = JsonFileStore::new(&args.save_dir);
        let previous = store.load_progress().unwrap_or_default();
        log::info!(
            "Cube Survivor starting (seed {}, {:.0}s played so far)",
            args.seed,
            previous.play_time
        );

        let mut session = Session::new(tuning, args.seed, Box::new(store));
        if let Some(name) = &args.attribute {
            match AttributeKind::parse(name) {
                Some(attribute) => session.set_attribute(attribute),
                None => log::warn!(
                    "Unknown attribute {name}; keeping {}",
                    session.state().player.attribute()
                ),
            }
        }

        session.subscribe(Topic::Wave, |event| {
            if let GameEvent::WaveChanged { wave } = event {
                println!("wave {wave}");
            }
        });
        session.subscribe(Topic::Evolution, |event| {
            if let GameEvent::EvolutionComplete { stage } = event {
                println!("evolved into {}", stage.name);
            }
        });

        session.start();
        let ticks = u64::from(args.seconds) * (1.0 / SIM_DT).round() as u64;
        for tick in 0..ticks {
            session.step(&scripted_input(tick));
            if session.phase() == GamePhase::Ended {
                break;
            }
        }
        if session.phase() != GamePhase::Ended {
            session.end();
        }

        let state = session.state();
        let snapshot = session.snapshot();
        println!("--- run summary ---");
        println!("survived      {:.1}s", state.director.elapsed_time());
        println!("wave          {}", state.director.current_wave());
        println!("difficulty    {:.2}", state.director.current_difficulty());
        println!("kills         {}", state.director.kill_count());
        println!("level         {}", state.player.level());
        println!("gold          {}", state.player.gold());
        println!("enemies alive {}", state.enemies.active_count());
        println!("pooled        {}", state.enemies.total_instances());
        println!("total played  {:.1}s", snapshot.play_time);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = native::run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library; there is no standalone wasm entry point
    cube_survivor::init_logging();
}
