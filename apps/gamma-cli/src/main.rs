use anyhow::Context;
use clap::{Parser, Subcommand};
use gamma_input::InputEvent;
use gamma_kernel::{Session, SessionConfig, TickOutcome};
use gamma_persist::{FileSlotStore, SlotStore};
use gamma_project::Project;
use gamma_render::{DebugTextRenderer, RenderFrame, Renderer};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gamma", about = "Inspect, validate and run gamma projects")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and a summary of a project
    Info {
        /// Project document (JSON)
        project: Option<PathBuf>,
    },
    /// Check a project for authoring mistakes
    Validate {
        project: PathBuf,
    },
    /// Run a project headless for a fixed number of ticks
    Run {
        project: PathBuf,
        /// Scene to start in (defaults to the first scene)
        #[arg(short, long)]
        scene: Option<String>,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "60")]
        ticks: u64,
        /// Seconds per tick
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f64,
        /// Keys held down for the whole run
        #[arg(long = "hold")]
        hold: Vec<String>,
        /// Print a frame every N ticks (0 prints only the last)
        #[arg(long, default_value = "0")]
        print_every: u64,
        /// Directory for save slots (in-memory when absent)
        #[arg(long)]
        saves: Option<PathBuf>,
        /// Shake jitter seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Manage save slots on disk
    Saves {
        /// Save directory
        dir: PathBuf,
        #[command(subcommand)]
        command: SavesCommand,
    },
}

#[derive(Subcommand)]
enum SavesCommand {
    /// List stored slots
    List,
    /// Delete a slot
    Clear { slot: String },
}

const SAVE_PREFIX: &str = "gamma_save_";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info { project } => {
            println!("gamma v{}", env!("CARGO_PKG_VERSION"));
            if let Some(path) = project {
                let project = load(&path)?;
                let s = &project.settings;
                println!("title: {:?} {}", s.title, s.version);
                println!("resolution: {}x{}", s.resolution.width, s.resolution.height);
                println!("sounds: {}", project.assets.sounds.len());
                println!("images: {}", project.sprite_sources().len());
                for scene in &project.scenes {
                    println!(
                        "  scene {} {:?}: {} layers, {} objects, {} events",
                        scene.id,
                        scene.name,
                        scene.layers.len(),
                        scene.objects.len(),
                        scene.all_events().len()
                    );
                }
            }
        }
        Commands::Validate { project } => {
            let project = load(&project)?;
            let issues = gamma_project::lint(&project);
            for issue in &issues {
                println!("{issue}");
            }
            if !issues.is_empty() {
                anyhow::bail!("{} issue(s) found", issues.len());
            }
            println!("OK");
        }
        Commands::Run {
            project,
            scene,
            ticks,
            dt,
            hold,
            print_every,
            saves,
            seed,
        } => {
            let project = load(&project)?;
            let mut config = SessionConfig::from_settings(&project.settings).with_save_prefix(SAVE_PREFIX);
            if let Some(seed) = seed {
                config = config.with_shake_seed(seed);
            }
            let mut session = Session::new(project, config)?;
            if let Some(dir) = saves {
                let store = FileSlotStore::open(&dir)
                    .with_context(|| format!("opening save directory {}", dir.display()))?;
                session = session.with_slot_store(Box::new(store));
            }
            session.initialize(scene.as_deref())?;
            for key in hold {
                session.handle_input(InputEvent::key_down(key));
            }

            let renderer = DebugTextRenderer::new();
            for n in 1..=ticks {
                match session.tick(dt) {
                    TickOutcome::SceneChanged(id) => println!("tick {n}: scene -> {id}"),
                    TickOutcome::Loaded(slot) => println!("tick {n}: loaded {slot}"),
                    TickOutcome::Paused if session.popup().is_some() => {
                        println!("tick {n}: popup open, dismissing");
                        session.dismiss_popup();
                    }
                    TickOutcome::Advanced | TickOutcome::Paused | TickOutcome::Closed => {}
                }
                if print_every > 0 && n % print_every == 0 {
                    print!("{}", renderer.render(&RenderFrame::build(&session)));
                }
            }
            if print_every == 0 {
                print!("{}", renderer.render(&RenderFrame::build(&session)));
            }
            for (name, value) in session.globals() {
                println!("global {name} = {value}");
            }
            session.teardown();
        }
        Commands::Saves { dir, command } => {
            let mut store = FileSlotStore::open(&dir)?;
            match command {
                SavesCommand::List => {
                    for key in store.keys()? {
                        if let Some(slot) = key.strip_prefix(SAVE_PREFIX) {
                            println!("{slot}");
                        }
                    }
                }
                SavesCommand::Clear { slot } => {
                    store.remove(&format!("{SAVE_PREFIX}{slot}"))?;
                    println!("cleared {slot}");
                }
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> anyhow::Result<Project> {
    Project::load(path).with_context(|| format!("loading project {}", path.display()))
}
