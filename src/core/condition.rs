/// Condition catalog — named, stateless predicates over an attacker/victim pair.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::params::{Mismatch, Params};
use crate::schema::subject::{Encounter, Subject};

/// A predicate type. Implementations hold no per-use state; everything an
/// instance needs arrives through `params`.
pub trait Condition: Send + Sync {
    /// Identifier used in configuration files.
    fn name(&self) -> &'static str;

    /// Short description shown next to the condition in editors.
    fn hint(&self) -> &'static str;

    /// Default parameters. Also the schema that stored parameters must match.
    fn default_params(&self) -> Params;

    fn check_params(&self, params: &Params) -> Result<(), Mismatch> {
        params.check_structure(&self.default_params())
    }

    fn evaluate(&self, params: &Params, encounter: &Encounter<'_>) -> bool;
}

impl fmt::Debug for dyn Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Condition").field(&self.name()).finish()
    }
}

/// Name-keyed registry of conditions.
#[derive(Default)]
pub struct ConditionRegistry {
    conditions: FxHashMap<&'static str, Arc<dyn Condition>>,
    order: Vec<&'static str>,
}

impl ConditionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in condition.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Unconditional);
        registry.register(AnimationPlayable);
        registry.register(Bleedout);
        registry.register(Ragdoll);
        registry.register(Protected);
        registry.register(Essential);
        registry.register(RelativeAngle);
        registry.register(LastHostile);
        registry.register(SkeletonMatch);
        registry
    }

    /// Register a condition, replacing any previous one with the same name.
    pub fn register<C: Condition + 'static>(&mut self, condition: C) {
        let name = condition.name();
        if self.conditions.insert(name, Arc::new(condition)).is_none() {
            self.order.push(name);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Condition>> {
        self.conditions.get(name).cloned()
    }

    /// Whether `params` fits the named condition's schema. Unknown names
    /// never validate.
    pub fn validate(&self, name: &str, params: &Params) -> bool {
        self.conditions
            .get(name)
            .is_some_and(|c| c.check_params(params).is_ok())
    }

    /// Condition names in registration order.
    pub fn names(&self) -> &[&'static str] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionRegistry")
            .field("conditions", &self.order)
            .finish()
    }
}

static BUILTIN: Lazy<Arc<ConditionRegistry>> = Lazy::new(|| Arc::new(ConditionRegistry::builtin()));

/// The process-wide registry of built-in conditions.
pub fn builtin_registry() -> Arc<ConditionRegistry> {
    Arc::clone(&BUILTIN)
}

// --- Built-in conditions -----------------------------------------------------

fn single_actor_params() -> Params {
    Params::new().with("check_attacker", false)
}

fn picked<'a>(params: &Params, encounter: &Encounter<'a>) -> &'a dyn Subject {
    encounter.pick(params.bool("check_attacker").unwrap_or(false))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unconditional;

impl Condition for Unconditional {
    fn name(&self) -> &'static str {
        "Unconditional"
    }

    fn hint(&self) -> &'static str {
        "Always returns the configured value."
    }

    fn default_params(&self) -> Params {
        Params::new().with("value", true)
    }

    fn evaluate(&self, params: &Params, _encounter: &Encounter<'_>) -> bool {
        params.bool("value").unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationPlayable;

impl Condition for AnimationPlayable {
    fn name(&self) -> &'static str {
        "Animation Playable"
    }

    fn hint(&self) -> &'static str {
        "True if the actor can play paired animations: loaded, alive, not already in a paired animation and not mounted."
    }

    fn default_params(&self) -> Params {
        single_actor_params()
    }

    fn evaluate(&self, params: &Params, encounter: &Encounter<'_>) -> bool {
        let actor = picked(params, encounter);
        actor.is_loaded() && !actor.is_dead() && !actor.is_in_paired_animation() && !actor.is_on_mount()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Bleedout;

impl Condition for Bleedout {
    fn name(&self) -> &'static str {
        "Bleedout"
    }

    fn hint(&self) -> &'static str {
        "True if the actor is bleeding out."
    }

    fn default_params(&self) -> Params {
        single_actor_params()
    }

    fn evaluate(&self, params: &Params, encounter: &Encounter<'_>) -> bool {
        picked(params, encounter).is_bleeding_out()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ragdoll;

impl Condition for Ragdoll {
    fn name(&self) -> &'static str {
        "Ragdoll"
    }

    fn hint(&self) -> &'static str {
        "True if the actor is ragdolling."
    }

    fn default_params(&self) -> Params {
        single_actor_params()
    }

    fn evaluate(&self, params: &Params, encounter: &Encounter<'_>) -> bool {
        picked(params, encounter).is_ragdolling()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Protected;

impl Condition for Protected {
    fn name(&self) -> &'static str {
        "Protected"
    }

    fn hint(&self) -> &'static str {
        "True if the actor is flagged protected."
    }

    fn default_params(&self) -> Params {
        single_actor_params()
    }

    fn evaluate(&self, params: &Params, encounter: &Encounter<'_>) -> bool {
        picked(params, encounter).is_protected()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Essential;

impl Condition for Essential {
    fn name(&self) -> &'static str {
        "Essential"
    }

    fn hint(&self) -> &'static str {
        "True if the actor is flagged essential."
    }

    fn default_params(&self) -> Params {
        single_actor_params()
    }

    fn evaluate(&self, params: &Params, encounter: &Encounter<'_>) -> bool {
        picked(params, encounter).is_essential()
    }
}

/// Attacker bearing relative to the victim's facing, in degrees clockwise,
/// normalized into `[-180, 180)`.
pub fn relative_angle(attacker: &dyn Subject, victim: &dyn Subject) -> f32 {
    let from = victim.position();
    let to = attacker.position();
    let bearing = (to.x - from.x).atan2(to.y - from.y);
    let degrees = (bearing - victim.heading()).to_degrees();
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RelativeAngle;

impl Condition for RelativeAngle {
    fn name(&self) -> &'static str {
        "Relative Angle"
    }

    fn hint(&self) -> &'static str {
        "True if the attacker is between two angles relative to the victim's facing. Ranges from -360 to 360 degrees clockwise, 0 being straight ahead."
    }

    fn default_params(&self) -> Params {
        Params::new().with("angle_min", -45.0).with("angle_max", 45.0)
    }

    fn evaluate(&self, params: &Params, encounter: &Encounter<'_>) -> bool {
        let (Some(min), Some(max)) = (params.float("angle_min"), params.float("angle_max")) else {
            return false;
        };
        let angle = f64::from(relative_angle(encounter.attacker, encounter.victim));
        [angle, angle - 360.0, angle + 360.0]
            .iter()
            .any(|a| min <= *a && *a < max)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LastHostile;

impl Condition for LastHostile {
    fn name(&self) -> &'static str {
        "Last Hostile"
    }

    fn hint(&self) -> &'static str {
        "True if the victim is the last hostile actor within a certain distance (1024 ~= 15 m / 48 ft) of the attacker, the victim or the player."
    }

    fn default_params(&self) -> Params {
        Params::new().with("range", 1024.0)
    }

    fn evaluate(&self, params: &Params, encounter: &Encounter<'_>) -> bool {
        let range = params.float("range").unwrap_or(1024.0) as f32;
        let primary = encounter.world.primary();

        let mut origins = vec![encounter.attacker, encounter.victim];
        origins.extend(primary);
        let involved: Vec<_> = origins.iter().map(|s| s.id()).collect();

        for origin in &origins {
            for other in encounter.world.actors_near(origin.position(), range) {
                if involved.contains(&other.id()) || other.is_dead() {
                    continue;
                }
                let hostile = other.is_hostile_to(encounter.attacker)
                    || primary.is_some_and(|p| other.is_hostile_to(p));
                if hostile {
                    return false;
                }
            }
        }
        true
    }
}

/// Skeleton categories recognised by [`SkeletonMatch`], keyed by the actor
/// folder that appears in the skeleton model path.
pub const SKELETON_CATEGORIES: &[(&str, &str)] = &[
    ("actors\\character\\", "human"),
    ("actors\\draugr\\", "draugr"),
    ("actors\\dlc02\\riekling\\", "riekling"),
    ("actors\\falmer\\", "falmer"),
    ("actors\\giant\\", "giant"),
    ("actors\\troll\\", "troll"),
    ("actors\\bear\\", "bear"),
    ("actors\\sabrecat\\", "sabrecat"),
    ("actors\\canine\\", "canine"),
    ("actors\\werewolfbeast\\", "werewolf"),
    ("actors\\vampirelord\\", "vampirelord"),
    ("actors\\dragon\\", "dragon"),
    ("actors\\frostbitespider\\", "spider"),
    ("actors\\chaurus\\", "chaurus"),
    ("actors\\spriggan\\", "spriggan"),
    ("actors\\hagraven\\", "hagraven"),
    ("actors\\dwarvenspider\\", "dwarvenspider"),
    ("actors\\dwarvensteamcenturion\\", "centurion"),
    ("actors\\atronachfrost\\", "frostatronach"),
];

/// Category for a skeleton model path, `"other"` when none matches.
/// Matching is case-insensitive and accepts either slash direction.
pub fn skeleton_category(path: &str) -> &'static str {
    let normalized = path.to_ascii_lowercase().replace('/', "\\");
    SKELETON_CATEGORIES
        .iter()
        .find(|(folder, _)| normalized.contains(folder))
        .map(|(_, category)| *category)
        .unwrap_or("other")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SkeletonMatch;

impl Condition for SkeletonMatch {
    fn name(&self) -> &'static str {
        "Skeleton"
    }

    fn hint(&self) -> &'static str {
        "True if the actor's skeleton category matches. For race checks."
    }

    fn default_params(&self) -> Params {
        single_actor_params().with("skeleton", "")
    }

    fn evaluate(&self, params: &Params, encounter: &Encounter<'_>) -> bool {
        let wanted = params.str("skeleton").unwrap_or_default();
        skeleton_category(picked(params, encounter).skeleton_path()) == wanted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::actor::{ActorFlags, ActorSnapshot, SceneSnapshot};
    use crate::schema::subject::{EmptyWorld, SubjectId};
    use std::f32::consts::PI;

    fn eval(name: &str, params: &Params, attacker: &ActorSnapshot, victim: &ActorSnapshot) -> bool {
        let registry = ConditionRegistry::builtin();
        let condition = registry.lookup(name).unwrap();
        condition.evaluate(params, &Encounter::new(attacker, victim, &EmptyWorld))
    }

    #[test]
    fn builtin_registry_lists_all_conditions() {
        let registry = builtin_registry();
        assert_eq!(registry.len(), 9);
        assert_eq!(registry.names()[0], "Unconditional");
        for name in registry.names() {
            let condition = registry.lookup(name).unwrap();
            assert_eq!(condition.name(), *name);
            assert!(!condition.hint().is_empty());
            assert!(registry.validate(name, &condition.default_params()));
        }
    }

    #[test]
    fn unknown_condition_never_validates() {
        let registry = ConditionRegistry::builtin();
        assert!(registry.lookup("Nope").is_none());
        assert!(!registry.validate("Nope", &Params::new()));
    }

    #[test]
    fn reregistering_replaces_without_duplicating() {
        let mut registry = ConditionRegistry::builtin();
        registry.register(Unconditional);
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn validate_uses_structure_of_defaults() {
        let registry = ConditionRegistry::builtin();
        assert!(registry.validate("Relative Angle", &Params::new().with("angle_min", 90.0).with("angle_max", 270.0)));
        assert!(!registry.validate("Relative Angle", &Params::new().with("angle_min", 90.0)));
        assert!(!registry.validate("Bleedout", &Params::new().with("value", true)));
    }

    #[test]
    fn unconditional_returns_value() {
        let a = ActorSnapshot::new(1);
        let v = ActorSnapshot::new(2);
        assert!(eval("Unconditional", &Params::new().with("value", true), &a, &v));
        assert!(!eval("Unconditional", &Params::new().with("value", false), &a, &v));
    }

    #[test]
    fn single_actor_conditions_pick_subject() {
        let attacker = ActorSnapshot::new(1);
        let victim = ActorSnapshot::new(2).with_flags(ActorFlags {
            bleeding_out: true,
            essential: true,
            ..ActorFlags::default()
        });
        let on_victim = Params::new().with("check_attacker", false);
        let on_attacker = Params::new().with("check_attacker", true);

        assert!(eval("Bleedout", &on_victim, &attacker, &victim));
        assert!(!eval("Bleedout", &on_attacker, &attacker, &victim));
        assert!(eval("Essential", &on_victim, &attacker, &victim));
        assert!(!eval("Protected", &on_victim, &attacker, &victim));
        assert!(!eval("Ragdoll", &on_victim, &attacker, &victim));
    }

    #[test]
    fn playable_requires_loaded_alive_free_actor() {
        let attacker = ActorSnapshot::new(1);
        let params = Params::new().with("check_attacker", false);

        let ok = ActorSnapshot::new(2);
        assert!(eval("Animation Playable", &params, &attacker, &ok));

        for flags in [
            ActorFlags { loaded: false, ..ActorFlags::default() },
            ActorFlags { dead: true, ..ActorFlags::default() },
            ActorFlags { paired_animation: true, ..ActorFlags::default() },
            ActorFlags { mounted: true, ..ActorFlags::default() },
        ] {
            let victim = ActorSnapshot::new(2).with_flags(flags);
            assert!(!eval("Animation Playable", &params, &attacker, &victim));
        }
    }

    #[test]
    fn relative_angle_measures_clockwise_from_facing() {
        let victim = ActorSnapshot::new(2);
        let ahead = ActorSnapshot::new(1).at(0.0, 100.0, 0.0);
        let right = ActorSnapshot::new(1).at(100.0, 0.0, 0.0);
        let left = ActorSnapshot::new(1).at(-100.0, 0.0, 0.0);
        let behind = ActorSnapshot::new(1).at(0.0, -100.0, 0.0);

        assert!(relative_angle(&ahead, &victim).abs() < 1e-3);
        assert!((relative_angle(&right, &victim) - 90.0).abs() < 1e-3);
        assert!((relative_angle(&left, &victim) + 90.0).abs() < 1e-3);
        assert!((relative_angle(&behind, &victim) + 180.0).abs() < 1e-3);

        // A victim facing +x sees the attacker on +x dead ahead.
        let turned = ActorSnapshot::new(2).facing(PI / 2.0);
        assert!(relative_angle(&right, &turned).abs() < 1e-3);
    }

    #[test]
    fn relative_angle_range_is_half_open() {
        let victim = ActorSnapshot::new(2);
        let right = ActorSnapshot::new(1).at(100.0, 0.0, 0.0);
        let params = |min: f64, max: f64| Params::new().with("angle_min", min).with("angle_max", max);

        assert!(!eval("Relative Angle", &params(-45.0, 45.0), &right, &victim));
        assert!(eval("Relative Angle", &params(45.0, 135.0), &right, &victim));
        assert!(!eval("Relative Angle", &params(0.0, 89.5), &right, &victim));
        assert!(eval("Relative Angle", &params(89.5, 90.5), &right, &victim));
        assert!(!eval("Relative Angle", &params(45.0, 45.0), &right, &victim));
    }

    #[test]
    fn relative_angle_range_can_wrap_behind() {
        let victim = ActorSnapshot::new(2);
        let behind_left = ActorSnapshot::new(1).at(-50.0, -100.0, 0.0);
        let behind_right = ActorSnapshot::new(1).at(50.0, -100.0, 0.0);
        let front = ActorSnapshot::new(1).at(0.0, 100.0, 0.0);
        let behind = Params::new().with("angle_min", 135.0).with("angle_max", 225.0);

        assert!(eval("Relative Angle", &behind, &behind_left, &victim));
        assert!(eval("Relative Angle", &behind, &behind_right, &victim));
        assert!(!eval("Relative Angle", &behind, &front, &victim));
    }

    #[test]
    fn last_hostile_ignores_involved_and_dead_actors() {
        let player = ActorSnapshot::new(1);
        let victim = ActorSnapshot::new(2).at(50.0, 0.0, 0.0).hostile_to(SubjectId(1));
        let corpse = ActorSnapshot::new(3)
            .at(60.0, 0.0, 0.0)
            .hostile_to(SubjectId(1))
            .with_flags(ActorFlags { dead: true, ..ActorFlags::default() });
        let scene = SceneSnapshot {
            primary: Some(SubjectId(1)),
            actors: vec![player.clone(), victim.clone(), corpse],
        };
        let condition = LastHostile;
        let params = condition.default_params();
        assert!(condition.evaluate(&params, &Encounter::new(&player, &victim, &scene)));
    }

    #[test]
    fn last_hostile_false_with_living_hostile_nearby() {
        let player = ActorSnapshot::new(1);
        let victim = ActorSnapshot::new(2).at(50.0, 0.0, 0.0);
        let bandit = ActorSnapshot::new(3).at(900.0, 0.0, 0.0).hostile_to(SubjectId(1));
        let scene = SceneSnapshot {
            primary: Some(SubjectId(1)),
            actors: vec![player.clone(), victim.clone(), bandit],
        };
        let condition = LastHostile;
        let encounter = Encounter::new(&player, &victim, &scene);
        assert!(!condition.evaluate(&Params::new().with("range", 1024.0), &encounter));
        assert!(condition.evaluate(&Params::new().with("range", 500.0), &encounter));
    }

    #[test]
    fn last_hostile_checks_around_primary_too() {
        let player = ActorSnapshot::new(1).at(5000.0, 0.0, 0.0);
        let follower = ActorSnapshot::new(4);
        let victim = ActorSnapshot::new(2).at(50.0, 0.0, 0.0);
        let bandit = ActorSnapshot::new(3).at(5100.0, 0.0, 0.0).hostile_to(SubjectId(1));
        let scene = SceneSnapshot {
            primary: Some(SubjectId(1)),
            actors: vec![player, follower.clone(), victim.clone(), bandit],
        };
        let encounter = Encounter::new(&follower, &victim, &scene);
        assert!(!LastHostile.evaluate(&Params::new().with("range", 500.0), &encounter));
    }

    #[test]
    fn skeleton_categories() {
        assert_eq!(skeleton_category("Actors\\Character\\Character Assets\\skeleton.nif"), "human");
        assert_eq!(skeleton_category("actors/draugr/character assets/skeleton.nif"), "draugr");
        assert_eq!(skeleton_category("Meshes\\Custom\\thing.nif"), "other");
        assert_eq!(skeleton_category(""), "other");
    }

    #[test]
    fn skeleton_condition_matches_category() {
        let attacker = ActorSnapshot::new(1).with_skeleton("Actors\\Character\\skeleton.nif");
        let victim = ActorSnapshot::new(2).with_skeleton("Actors\\Troll\\skeleton.nif");
        let troll = Params::new().with("check_attacker", false).with("skeleton", "troll");
        let human_attacker = Params::new().with("check_attacker", true).with("skeleton", "human");
        assert!(eval("Skeleton", &troll, &attacker, &victim));
        assert!(eval("Skeleton", &human_attacker, &attacker, &victim));
        assert!(!eval("Skeleton", &troll, &victim, &attacker));
    }
}
