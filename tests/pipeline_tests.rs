/// Pipeline integration tests — filter file to chosen animation.

use killmove_filter::core::classifier::{Classifier, ClassifierOutcome};
use killmove_filter::core::config::{LoadMode, Location};
use killmove_filter::core::params::Params;
use killmove_filter::core::pipeline::FilterPipeline;
use killmove_filter::core::preset::{list_presets, preset_path};
use killmove_filter::schema::actor::{ActorFlags, ActorSnapshot, SceneSnapshot};
use killmove_filter::schema::candidate::{load_catalog, CandidateEntry};
use killmove_filter::schema::subject::{Encounter, SubjectId};
use killmove_filter::schema::tag::TagSet;
use std::collections::HashSet;
use std::path::Path;

const HUMAN: &str = "Actors\\Character\\Character Assets\\skeleton.nif";
const DRAUGR: &str = "Actors\\Draugr\\Character Assets\\skeleton.nif";

fn default_pipeline() -> FilterPipeline {
    let mut pipeline = FilterPipeline::new();
    let report = pipeline
        .load_file(Path::new("tests/fixtures/default_filter.ron"), LoadMode::Replace)
        .unwrap();
    assert!(report.is_ok(), "{:?}", report.diagnostics);
    pipeline
}

fn catalog() -> Vec<CandidateEntry> {
    load_catalog(Path::new("tests/fixtures/catalog.ron")).unwrap()
}

fn player() -> ActorSnapshot {
    ActorSnapshot::new(1).at(0.0, 100.0, 0.0).with_skeleton(HUMAN)
}

fn bandit() -> ActorSnapshot {
    ActorSnapshot::new(2).with_skeleton(HUMAN).hostile_to(SubjectId(1))
}

fn scene(actors: Vec<ActorSnapshot>) -> SceneSnapshot {
    SceneSnapshot {
        primary: Some(SubjectId(1)),
        actors,
    }
}

fn qualifying(pipeline: &FilterPipeline, attacker: &ActorSnapshot, victim: &ActorSnapshot, world: &SceneSnapshot) -> HashSet<String> {
    let catalog = catalog();
    let encounter = Encounter::new(attacker, victim, world);
    pipeline
        .filter(&encounter, &catalog)
        .into_iter()
        .map(|c| c.id.clone())
        .collect()
}

fn ids(list: &[&str]) -> HashSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn tags(list: &[&str]) -> TagSet {
    list.iter().copied().collect()
}

#[test]
fn frontal_kill_on_last_human_hostile() {
    let pipeline = default_pipeline();
    let (attacker, victim) = (player(), bandit());
    let world = scene(vec![attacker.clone(), victim.clone()]);
    assert_eq!(
        qualifying(&pipeline, &attacker, &victim, &world),
        ids(&["pa_1HMKillMoveShortA", "pa_1HMKillMoveShortB", "pa_1HMStagger"])
    );
}

#[test]
fn other_hostiles_nearby_ban_cinematic_moves() {
    let pipeline = default_pipeline();
    let (attacker, victim) = (player(), bandit());
    let other = ActorSnapshot::new(3).at(300.0, 0.0, 0.0).hostile_to(SubjectId(1));
    let world = scene(vec![attacker.clone(), victim.clone(), other]);
    assert_eq!(
        qualifying(&pipeline, &attacker, &victim, &world),
        ids(&["pa_1HMKillMoveShortA", "pa_1HMStagger"])
    );
}

#[test]
fn essential_victims_only_get_non_lethal_moves() {
    let pipeline = default_pipeline();
    let attacker = player();
    let victim = bandit().with_flags(ActorFlags {
        essential: true,
        ..ActorFlags::default()
    });
    let world = scene(vec![attacker.clone(), victim.clone()]);
    assert_eq!(qualifying(&pipeline, &attacker, &victim, &world), ids(&["pa_1HMStagger"]));
}

#[test]
fn bleeding_out_victim_gets_bleedout_kill() {
    let pipeline = default_pipeline();
    let attacker = player();
    let victim = bandit().with_flags(ActorFlags {
        bleeding_out: true,
        ..ActorFlags::default()
    });
    let world = scene(vec![attacker.clone(), victim.clone()]);
    assert_eq!(
        qualifying(&pipeline, &attacker, &victim, &world),
        ids(&["pa_1HMKillMoveBleedOutKill"])
    );
}

#[test]
fn attack_from_behind_gets_back_stab() {
    let pipeline = default_pipeline();
    let attacker = ActorSnapshot::new(1).at(0.0, -100.0, 0.0).with_skeleton(HUMAN);
    let victim = bandit();
    let world = scene(vec![attacker.clone(), victim.clone()]);
    assert_eq!(
        qualifying(&pipeline, &attacker, &victim, &world),
        ids(&["pa_1HMKillMoveBackStab"])
    );
}

#[test]
fn draugr_victim_gets_draugr_kill() {
    let pipeline = default_pipeline();
    let attacker = player();
    let victim = ActorSnapshot::new(2).with_skeleton(DRAUGR).hostile_to(SubjectId(1));
    let world = scene(vec![attacker.clone(), victim.clone()]);
    let catalog = catalog();
    let encounter = Encounter::new(&attacker, &victim, &world);
    for _ in 0..20 {
        let chosen = pipeline.select(&encounter, &catalog).unwrap();
        assert_eq!(chosen.id, "pa_KillMoveDraugrShortA");
    }
}

#[test]
fn select_only_returns_members_of_the_qualifying_set() {
    let pipeline = default_pipeline();
    let (attacker, victim) = (player(), bandit());
    let world = scene(vec![attacker.clone(), victim.clone()]);
    let expected = qualifying(&pipeline, &attacker, &victim, &world);
    let catalog = catalog();
    let encounter = Encounter::new(&attacker, &victim, &world);

    let mut seen = HashSet::new();
    for _ in 0..300 {
        let chosen = pipeline.select(&encounter, &catalog).unwrap();
        assert!(expected.contains(&chosen.id));
        seen.insert(chosen.id.clone());
    }
    // Uniform choice over three members: missing one in 300 draws is ~1e-52.
    assert_eq!(seen, expected);
}

#[test]
fn save_then_load_round_trips_through_a_file() {
    let mut pipeline = default_pipeline();
    let mut extra = Classifier::with_params(
        pipeline.registry(),
        "Ragdoll",
        Params::new().with("check_attacker", true),
    )
    .unwrap()
    .on_false(ClassifierOutcome::new(TagSet::new(), tags(&["ragdoll"])));
    extra.comment = "attacker knocked over".to_string();
    pipeline.push_classifier(extra);
    pipeline.set_alias("2hm_front", tags(&["killmove", "human", "2h"]));

    let dir = tempfile::tempdir().unwrap();
    let path = preset_path(dir.path(), "round_trip").unwrap();
    pipeline.save_file(&path).unwrap();

    let mut reloaded = FilterPipeline::new();
    let report = reloaded.load_file(&path, LoadMode::Replace).unwrap();
    assert!(report.is_ok(), "{:?}", report.diagnostics);
    assert_eq!(reloaded.classifiers(), pipeline.classifiers());
    assert_eq!(reloaded.aliases(), pipeline.aliases());

    let order: Vec<&str> = reloaded.aliases().iter().map(|a| a.from.as_str()).collect();
    assert_eq!(order, vec!["1hm_front", "1hm_back", "1hm_bleedout", "draugr_front", "2hm_front"]);
    assert_eq!(list_presets(dir.path()).unwrap(), vec!["round_trip"]);
}

#[test]
fn save_to_unwritable_destination_fails() {
    let pipeline = default_pipeline();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing_dir").join("filter.ron");
    assert!(pipeline.save_file(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn missing_file_fails_without_touching_pipeline() {
    let mut pipeline = default_pipeline();
    let before = pipeline.classifiers().len();
    assert!(pipeline
        .load_file(Path::new("tests/fixtures/does_not_exist.ron"), LoadMode::Replace)
        .is_err());
    assert_eq!(pipeline.classifiers().len(), before);
}

#[test]
fn one_unknown_rule_drops_only_that_tagger() {
    let text = std::fs::read_to_string("tests/fixtures/default_filter.ron")
        .unwrap()
        .replace("\"Essential\"", "\"Immortal\"");
    let mut pipeline = FilterPipeline::new();
    let report = pipeline.load_str(&text, LoadMode::Replace).unwrap();
    assert!(!report.is_ok());
    assert_eq!(report.classifiers_loaded, 5);
    assert_eq!(pipeline.classifiers().len(), 5);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].location, Location::Tagger(5));
    assert_eq!(pipeline.aliases().len(), 4);
}
