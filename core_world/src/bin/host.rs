use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use core_world::{
    load_world_presets_from_env, SettlementCategory, SpecialDay, TimeSpeed, World, WorldConfig,
};
use world_proto::{RecordStore, HEADER_SIZE, MAGIC};

/// Thin host around the Meridian world core: seed input, erosion toggle,
/// save/load triggers and a couple of query commands for poking at a
/// generated world from the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about = "Meridian world host", long_about = None)]
struct Cli {
    /// Directory the record store keeps save blobs in.
    #[arg(long, default_value = "saves")]
    store: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a world and optionally save it.
    Generate {
        /// World seed; random when omitted.
        #[arg(long)]
        seed: Option<u32>,
        #[arg(long, default_value_t = 256)]
        width: u32,
        #[arg(long, default_value_t = 256)]
        height: u32,
        /// Preset id from the catalog (see `WORLD_PRESETS_PATH`).
        #[arg(long)]
        preset: Option<String>,
        /// Skip the erosion post-process.
        #[arg(long)]
        no_erosion: bool,
        /// Record id to save the world under.
        #[arg(long)]
        save: Option<String>,
    },
    /// Load a saved world and print its summary.
    Load {
        /// Record id; the newest record when omitted.
        #[arg(long)]
        id: Option<String>,
    },
    /// Query the road network for the shortest travel route.
    Travel {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
    },
    /// Print the in-game calendar date of a saved world.
    Date {
        #[arg(long)]
        id: Option<String>,
        /// Simulate this many wall-clock milliseconds of play first.
        #[arg(long, default_value_t = 0.0)]
        simulate_ms: f64,
        /// Time speed used for the simulated span.
        #[arg(long, default_value_t = 1)]
        speed: u32,
    },
}

/// Minimal directory-backed record store: one `<id>.mwld` file per
/// record, newest-first resolution by the creation timestamp stamped into
/// the save envelope.
struct DirStore {
    root: PathBuf,
}

impl DirStore {
    fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.mwld"))
    }
}

impl RecordStore for DirStore {
    fn put(&mut self, id: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path_for(id), bytes)
    }

    fn get(&self, id: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn latest(&self) -> io::Result<Option<(String, Vec<u8>)>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        let mut best: Option<(u64, String, Vec<u8>)> = None;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let Some(id) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".mwld"))
                .map(str::to_owned)
            else {
                continue;
            };
            let bytes = fs::read(&path)?;
            if bytes.len() < HEADER_SIZE || bytes[..4] != MAGIC {
                continue;
            }
            let created_at = u64::from_le_bytes([
                bytes[12], bytes[13], bytes[14], bytes[15], bytes[16], bytes[17], bytes[18],
                bytes[19],
            ]);
            let newer = match &best {
                Some((best_at, best_id, _)) => {
                    created_at > *best_at || (created_at == *best_at && id > *best_id)
                }
                None => true,
            };
            if newer {
                best = Some((created_at, id, bytes));
            }
        }
        Ok(best.map(|(_, id, bytes)| (id, bytes)))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn load_world(store: &DirStore, id: Option<&str>) -> Result<(String, World)> {
    let (id, bytes) = match id {
        Some(id) => {
            let bytes = store
                .get(id)?
                .with_context(|| format!("no record stored under id {id:?}"))?;
            (id.to_owned(), bytes)
        }
        None => store
            .latest()?
            .context("the record store is empty; generate a world with --save first")?,
    };
    let world = World::decode(&bytes).with_context(|| format!("record {id:?} failed to load"))?;
    Ok((id, world))
}

fn print_summary(world: &World) {
    let config = world.config();
    let (mut cities, mut towns, mut villages) = (0usize, 0usize, 0usize);
    for s in world.settlements() {
        match s.category {
            SettlementCategory::City => cities += 1,
            SettlementCategory::Town => towns += 1,
            SettlementCategory::Village => villages += 1,
        }
    }
    println!(
        "seed {} | {}x{} cells | erosion {}",
        config.seed,
        config.width,
        config.height,
        if config.enable_erosion { "on" } else { "off" }
    );
    println!(
        "land {} cells across {} islands (largest {})",
        world.height_field().land_cells(config.coast_threshold),
        world.islands().island_count(),
        world.islands().max_area
    );
    println!(
        "{} settlements ({cities} cities, {towns} towns, {villages} villages), {} roads",
        world.settlements().len(),
        world.roads().len()
    );
    println!("day {} of the calendar", world.total_days());
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut store = DirStore::new(cli.store);

    match cli.command {
        Command::Generate {
            seed,
            width,
            height,
            preset,
            no_erosion,
            save,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            let mut config = match preset {
                Some(ref id) => {
                    let presets = load_world_presets_from_env();
                    let Some(preset) = presets.get(id) else {
                        bail!(
                            "unknown preset {id:?}; available: {}",
                            presets.ids().join(", ")
                        );
                    };
                    preset.to_config(seed)
                }
                None => WorldConfig {
                    seed,
                    width,
                    height,
                    ..WorldConfig::default()
                },
            };
            if no_erosion {
                config.enable_erosion = false;
            }

            let world = World::build(config)?;
            print_summary(&world);

            if let Some(id) = save {
                let bytes = world.encode(now_ms())?;
                store.put(&id, &bytes)?;
                info!(target: "meridian::host", id = %id, bytes = bytes.len(), "record.saved");
                println!("saved as {id:?} ({} bytes)", bytes.len());
            }
        }
        Command::Load { id } => {
            let (id, world) = load_world(&store, id.as_deref())?;
            println!("loaded record {id:?}");
            print_summary(&world);
        }
        Command::Travel { id, from, to } => {
            let (_, world) = load_world(&store, id.as_deref())?;
            match world.shortest_path(from, to) {
                Some(path) => {
                    println!(
                        "route {from} -> {to}: {} hops, distance {:.1}",
                        path.nodes.len() - 1,
                        path.distance
                    );
                    println!("via {:?}", path.nodes);
                    println!("polyline of {} points", path.polyline.len());
                }
                None => println!("no route between {from} and {to}"),
            }
        }
        Command::Date {
            id,
            simulate_ms,
            speed,
        } => {
            let (_, mut world) = load_world(&store, id.as_deref())?;
            if simulate_ms > 0.0 {
                world.set_time_speed(TimeSpeed::from_u32(speed)?);
                world.tick(1.0);
                world.tick(1.0 + simulate_ms);
            }
            let date = world.current_date();
            match date.special {
                SpecialDay::Normal => println!(
                    "year {}, month {}, day {} (weekday {})",
                    date.year, date.month, date.day, date.weekday
                ),
                SpecialDay::Leap => println!("year {}, the leap-day", date.year),
                SpecialDay::Year => println!("year {}, the year-day", date.year),
            }
        }
    }

    Ok(())
}
