/// Arena — a host-style integration: its own actor type, a custom rule,
/// and a few rounds of killmove selection.
///
/// Run with: cargo run --example arena

use killmove_filter::core::classifier::{Classifier, ClassifierOutcome};
use killmove_filter::core::condition::{Condition, ConditionRegistry};
use killmove_filter::core::params::Params;
use killmove_filter::core::pipeline::FilterPipeline;
use killmove_filter::schema::candidate::CandidateEntry;
use killmove_filter::schema::subject::{Encounter, Position, Subject, SubjectId, World};
use killmove_filter::schema::tag::TagSet;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// The host's own actor record.
#[derive(Clone)]
struct Fighter {
    id: u64,
    name: &'static str,
    team: u8,
    position: Position,
    heading: f32,
    skeleton: &'static str,
    health: f32,
    staggered: bool,
}

impl Subject for Fighter {
    fn id(&self) -> SubjectId {
        SubjectId(self.id)
    }
    fn position(&self) -> Position {
        self.position
    }
    fn heading(&self) -> f32 {
        self.heading
    }
    fn skeleton_path(&self) -> &str {
        self.skeleton
    }
    fn is_loaded(&self) -> bool {
        true
    }
    fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
    fn is_in_paired_animation(&self) -> bool {
        false
    }
    fn is_on_mount(&self) -> bool {
        false
    }
    fn is_bleeding_out(&self) -> bool {
        self.staggered && self.health < 0.1
    }
    fn is_ragdolling(&self) -> bool {
        false
    }
    fn is_protected(&self) -> bool {
        false
    }
    fn is_essential(&self) -> bool {
        false
    }
    fn is_hostile_to(&self, other: &dyn Subject) -> bool {
        // Team lookup by ID convention: IDs below 100 are team 0.
        let other_team = if other.id().0 < 100 { 0 } else { 1 };
        other_team != self.team
    }
}

struct Arena {
    fighters: Vec<Fighter>,
}

impl World for Arena {
    fn primary(&self) -> Option<&dyn Subject> {
        self.fighters.first().map(|f| f as &dyn Subject)
    }

    fn actors_near(&self, origin: Position, range: f32) -> Vec<&dyn Subject> {
        self.fighters
            .iter()
            .filter(|f| f.position.distance(&origin) <= range)
            .map(|f| f as &dyn Subject)
            .collect()
    }
}

/// Host-specific rule registered next to the built-ins.
struct Staggered;

impl Condition for Staggered {
    fn name(&self) -> &'static str {
        "Staggered"
    }

    fn hint(&self) -> &'static str {
        "True if the victim (or attacker) is bleeding out after a stagger."
    }

    fn default_params(&self) -> Params {
        Params::new().with("check_attacker", false)
    }

    fn evaluate(&self, params: &Params, encounter: &Encounter<'_>) -> bool {
        let subject = encounter.pick(params.bool("check_attacker").unwrap_or(false));
        subject.is_bleeding_out()
    }
}

fn tags(list: &str) -> TagSet {
    TagSet::split(list)
}

fn build_pipeline() -> FilterPipeline {
    let mut registry = ConditionRegistry::builtin();
    registry.register(Staggered);
    let mut pipeline = FilterPipeline::with_registry(Arc::new(registry));

    let rules = [
        Classifier::new(pipeline.registry(), "Unconditional")
            .map(|c| c.on_true(ClassifierOutcome::new(tags("killmove"), TagSet::new()))),
        Classifier::new(pipeline.registry(), "Staggered").map(|c| {
            c.on_true(ClassifierOutcome::new(tags("finisher"), TagSet::new()))
                .on_false(ClassifierOutcome::new(TagSet::new(), tags("finisher")))
        }),
        Classifier::with_params(
            pipeline.registry(),
            "Relative Angle",
            Params::new().with("angle_min", 135.0).with("angle_max", 225.0),
        )
        .map(|c| {
            c.on_true(ClassifierOutcome::new(tags("back"), TagSet::new()))
                .on_false(ClassifierOutcome::new(TagSet::new(), tags("back")))
        }),
        Classifier::new(pipeline.registry(), "Last Hostile")
            .map(|c| c.on_false(ClassifierOutcome::new(TagSet::new(), tags("cinematic")))),
    ];

    for rule in rules {
        match rule {
            Ok(classifier) => pipeline.push_classifier(classifier),
            Err(e) => eprintln!("skipping rule: {}", e),
        }
    }

    pipeline.set_alias("sword_front", tags("killmove cinematic"));
    pipeline.set_alias("sword_back", tags("killmove back cinematic"));
    pipeline.set_alias("sword_finish", tags("killmove finisher"));
    pipeline
}

fn catalog() -> Vec<CandidateEntry> {
    vec![
        CandidateEntry::new("SwordDecapitate", tags("sword_front")),
        CandidateEntry::new("SwordThroatSlit", tags("sword_back")),
        CandidateEntry::new("SwordStab", tags("killmove")),
        CandidateEntry::new("SwordFinisher", tags("sword_finish")),
    ]
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let pipeline = build_pipeline();
    let catalog = catalog();

    let hero = Fighter {
        id: 1,
        name: "hero",
        team: 0,
        position: Position::new(0.0, 100.0, 0.0),
        heading: std::f32::consts::PI,
        skeleton: "Actors\\Character\\Character Assets\\skeleton.nif",
        health: 1.0,
        staggered: false,
    };

    let rounds: [(&str, Position, f32, bool, bool); 4] = [
        ("duel, facing", Position::new(0.0, 0.0, 0.0), 0.0, false, false),
        ("duel, from behind", Position::new(0.0, 0.0, 0.0), std::f32::consts::PI, false, false),
        ("crowded", Position::new(0.0, 0.0, 0.0), 0.0, false, true),
        ("staggered", Position::new(0.0, 0.0, 0.0), 0.0, true, false),
    ];

    for (label, position, heading, staggered, crowded) in rounds {
        let mut fighters = vec![hero.clone()];
        fighters.push(Fighter {
            id: 100,
            name: "bandit",
            team: 1,
            position,
            heading,
            skeleton: "Actors\\Character\\Character Assets\\skeleton.nif",
            health: if staggered { 0.05 } else { 0.5 },
            staggered,
        });
        if crowded {
            fighters.push(Fighter {
                id: 101,
                name: "bandit archer",
                team: 1,
                position: Position::new(400.0, -300.0, 0.0),
                heading: 0.0,
                skeleton: "Actors\\Character\\Character Assets\\skeleton.nif",
                health: 1.0,
                staggered: false,
            });
        }

        let arena = Arena { fighters };
        let attacker = &arena.fighters[0];
        let victim = &arena.fighters[1];
        let encounter = Encounter::new(attacker, victim, &arena);

        let names: Vec<&str> = pipeline
            .filter(&encounter, &catalog)
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        let chosen = pipeline.select(&encounter, &catalog).map(|c| c.id.as_str());
        println!(
            "{:<18} {} vs {}: qualifying [{}], chosen {:?}",
            label,
            attacker.name,
            victim.name,
            names.join(", "),
            chosen
        );
    }

    match pipeline.to_ron_string() {
        Ok(text) => println!("\n{}", text),
        Err(e) => eprintln!("could not serialize filter: {}", e),
    }
}
