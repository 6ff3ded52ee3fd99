/// Preview — interactive shell for trying a filter against a catalog.
///
/// Usage: preview --filter <path> --catalog <path> [--seed <n>]
///
/// Commands:
///   show                       — aggregated tags and qualifying entries
///   pick [n]                   — select n entries (default 1)
///   angle <deg>                — place the attacker at <deg> around the victim
///   skeleton <attacker|victim> <path>
///   flag <attacker|victim> <name> <on|off>
///   hostile <n>                — add n other hostile actors near the victim
///   calm                       — remove the other hostile actors
///   expand <from> <tag>...     — add tags to an existing tag expansion
///   seed <n>                   — reseed the selection generator
///   reload                     — reload the filter file
///   help                       — list commands
///   quit                       — exit

use killmove_filter::core::config::LoadMode;
use killmove_filter::core::pipeline::FilterPipeline;
use killmove_filter::schema::actor::{ActorFlags, ActorSnapshot, SceneSnapshot};
use killmove_filter::schema::candidate::{load_catalog, CandidateEntry};
use killmove_filter::schema::subject::{Encounter, SubjectId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

const ATTACKER: u64 = 1;
const VICTIM: u64 = 2;
const DISTANCE: f32 = 100.0;
const HUMAN: &str = "Actors\\Character\\Character Assets\\skeleton.nif";

/// Synthetic encounter state edited by the shell.
struct Session {
    attacker: ActorSnapshot,
    victim: ActorSnapshot,
    others: usize,
}

impl Session {
    fn new() -> Self {
        let mut session = Self {
            attacker: ActorSnapshot::new(ATTACKER).with_skeleton(HUMAN),
            victim: ActorSnapshot::new(VICTIM)
                .with_skeleton(HUMAN)
                .hostile_to(SubjectId(ATTACKER)),
            others: 0,
        };
        session.place_attacker(0.0);
        session
    }

    /// Victim stays at the origin facing +y; the attacker circles it.
    fn place_attacker(&mut self, degrees: f32) {
        let radians = degrees.to_radians();
        self.attacker.position.x = DISTANCE * radians.sin();
        self.attacker.position.y = DISTANCE * radians.cos();
        self.attacker.heading = radians + std::f32::consts::PI;
    }

    fn scene(&self) -> SceneSnapshot {
        let mut actors = vec![self.attacker.clone(), self.victim.clone()];
        for n in 0..self.others {
            let id = 10 + n as u64;
            actors.push(
                ActorSnapshot::new(id)
                    .at(-200.0 - 50.0 * n as f32, 0.0, 0.0)
                    .hostile_to(SubjectId(ATTACKER)),
            );
        }
        SceneSnapshot {
            primary: Some(SubjectId(ATTACKER)),
            actors,
        }
    }

    fn actor_mut(&mut self, which: &str) -> Option<&mut ActorSnapshot> {
        match which {
            "attacker" | "a" => Some(&mut self.attacker),
            "victim" | "v" => Some(&mut self.victim),
            _ => None,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut filter_path = None;
    let mut catalog_path = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--filter" if i + 1 < args.len() => {
                i += 1;
                filter_path = Some(args[i].clone());
            }
            "--catalog" if i + 1 < args.len() => {
                i += 1;
                catalog_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let (Some(filter_path), Some(catalog_path)) = (filter_path, catalog_path) else {
        print_usage();
        std::process::exit(1);
    };

    let mut pipeline = FilterPipeline::new();
    load_filter(&mut pipeline, &filter_path);

    let catalog = match load_catalog(Path::new(&catalog_path)) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("ERROR: Failed to load catalog: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Loaded {} taggers, {} tag expansions, {} catalog entries",
        pipeline.classifiers().len(),
        pipeline.aliases().len(),
        catalog.len()
    );
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let mut session = Session::new();
    let mut rng = StdRng::seed_from_u64(seed);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "show" | "s" => {
                show(&pipeline, &session, &catalog);
            }
            "pick" | "p" => {
                let count: usize = parts.get(1).and_then(|n| n.parse().ok()).unwrap_or(1);
                let scene = session.scene();
                let encounter = Encounter::new(&session.attacker, &session.victim, &scene);
                for _ in 0..count {
                    match pipeline.select_with_rng(&encounter, &catalog, &mut rng) {
                        Some(entry) => println!("  {}", entry.id),
                        None => {
                            println!("  (nothing qualifies)");
                            break;
                        }
                    }
                }
            }
            "angle" => match parts.get(1).and_then(|d| d.parse::<f32>().ok()) {
                Some(degrees) => {
                    session.place_attacker(degrees);
                    println!("Attacker at {} degrees", degrees);
                }
                None => println!("Usage: angle <degrees>"),
            },
            "skeleton" => {
                if parts.len() < 3 {
                    println!("Usage: skeleton <attacker|victim> <path>");
                    continue;
                }
                let path = parts[2..].join(" ");
                match session.actor_mut(parts[1]) {
                    Some(actor) => actor.skeleton = path,
                    None => println!("Unknown actor: {}", parts[1]),
                }
            }
            "flag" => {
                if parts.len() < 4 {
                    println!("Usage: flag <attacker|victim> <name> <on|off>");
                    println!("  names: loaded, dead, paired, mounted, bleedout, ragdoll, protected, essential");
                    continue;
                }
                let value = matches!(parts[3], "on" | "true" | "1");
                let Some(actor) = session.actor_mut(parts[1]) else {
                    println!("Unknown actor: {}", parts[1]);
                    continue;
                };
                if !set_flag(&mut actor.flags, parts[2], value) {
                    println!("Unknown flag: {}", parts[2]);
                }
            }
            "hostile" => {
                let count: usize = parts.get(1).and_then(|n| n.parse().ok()).unwrap_or(1);
                session.others += count;
                println!("{} other hostile actors nearby", session.others);
            }
            "calm" => {
                session.others = 0;
                println!("No other hostile actors nearby");
            }
            "expand" => {
                if parts.len() < 3 {
                    println!("Usage: expand <from> <tag>...");
                    continue;
                }
                match pipeline.aliases_mut().get_mut(parts[1]) {
                    Some(to) => {
                        to.extend(parts[2..].iter().copied());
                        println!("{} -> {}", parts[1], to.join());
                    }
                    None => println!("No tag expansion named {}", parts[1]),
                }
            }
            "seed" => match parts.get(1).and_then(|n| n.parse::<u64>().ok()) {
                Some(n) => {
                    rng = StdRng::seed_from_u64(n);
                    println!("Seed set to {}", n);
                }
                None => println!("Usage: seed <n>"),
            },
            "reload" => {
                load_filter(&mut pipeline, &filter_path);
                println!("Loaded {} taggers", pipeline.classifiers().len());
            }
            _ => {
                println!("Unknown command: {}. Type 'help' for commands.", cmd);
            }
        }
    }
}

fn load_filter(pipeline: &mut FilterPipeline, path: &str) {
    match pipeline.load_file(Path::new(path), LoadMode::Replace) {
        Ok(report) => {
            for diagnostic in &report.diagnostics {
                eprintln!("  WARNING {}", diagnostic);
            }
        }
        Err(e) => {
            eprintln!("ERROR: Failed to load filter file: {}", e);
        }
    }
}

fn show(pipeline: &FilterPipeline, session: &Session, catalog: &[CandidateEntry]) {
    let scene = session.scene();
    let encounter = Encounter::new(&session.attacker, &session.victim, &scene);

    for (index, classifier) in pipeline.classifiers().iter().enumerate() {
        println!(
            "  [{}] {:<18} {}",
            index,
            classifier.condition_name(),
            classifier.test(&encounter)
        );
    }

    let constraints = pipeline.aggregate(&encounter);
    println!("Required: {}", constraints.required.join());
    println!("Banned:   {}", constraints.banned.join());

    let qualifying = pipeline.filter(&encounter, catalog);
    println!("Qualifying ({} of {}):", qualifying.len(), catalog.len());
    for entry in qualifying {
        println!("  {}", entry.id);
    }
}

fn set_flag(flags: &mut ActorFlags, name: &str, value: bool) -> bool {
    let slot = match name {
        "loaded" => &mut flags.loaded,
        "dead" => &mut flags.dead,
        "paired" => &mut flags.paired_animation,
        "mounted" => &mut flags.mounted,
        "bleedout" => &mut flags.bleeding_out,
        "ragdoll" => &mut flags.ragdolling,
        "protected" => &mut flags.protected,
        "essential" => &mut flags.essential,
        _ => return false,
    };
    *slot = value;
    true
}

fn print_usage() {
    println!("Usage: preview --filter <path> --catalog <path> [--seed <n>]");
}

fn print_help() {
    println!("Commands:");
    println!("  show                              — aggregated tags and qualifying entries");
    println!("  pick [n]                          — select n entries (default 1)");
    println!("  angle <deg>                       — place the attacker around the victim");
    println!("  skeleton <attacker|victim> <path> — set a skeleton path");
    println!("  flag <attacker|victim> <name> <on|off>");
    println!("  hostile [n]                       — add other hostile actors");
    println!("  calm                              — remove other hostile actors");
    println!("  expand <from> <tag>...            — add tags to a tag expansion");
    println!("  seed <n>                          — reseed selection");
    println!("  reload                            — reload the filter file");
    println!("  help                              — this list");
    println!("  quit                              — exit");
}
