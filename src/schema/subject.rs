/// The view of the actor model that conditions evaluate against.
///
/// The engine never owns actors. Hosts implement [`Subject`] for whatever
/// their actor handle is and [`World`] for the surrounding scene.
use serde::{Deserialize, Serialize};

/// Newtype wrapper for actor IDs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub u64);

/// World-space position in game units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let (dx, dy, dz) = (other.x - self.x, other.y - self.y, other.z - self.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Facts about a single actor.
///
/// `heading` is the yaw in radians, clockwise, with 0 facing +y.
pub trait Subject {
    fn id(&self) -> SubjectId;
    fn position(&self) -> Position;
    fn heading(&self) -> f32;

    /// Path of the actor's skeleton model, e.g. `Actors\Character\...`.
    fn skeleton_path(&self) -> &str;

    fn is_loaded(&self) -> bool;
    fn is_dead(&self) -> bool;
    fn is_in_paired_animation(&self) -> bool;
    fn is_on_mount(&self) -> bool;
    fn is_bleeding_out(&self) -> bool;
    fn is_ragdolling(&self) -> bool;
    fn is_protected(&self) -> bool;
    fn is_essential(&self) -> bool;

    fn is_hostile_to(&self, other: &dyn Subject) -> bool;
}

/// Scene-level queries.
pub trait World {
    /// The always-considered primary actor (the player), if any.
    fn primary(&self) -> Option<&dyn Subject>;

    /// Actors within `range` of `origin`. May include the queried actors
    /// themselves; callers filter.
    fn actors_near(&self, origin: Position, range: f32) -> Vec<&dyn Subject>;
}

/// A world with no other actors in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyWorld;

impl World for EmptyWorld {
    fn primary(&self) -> Option<&dyn Subject> {
        None
    }

    fn actors_near(&self, _origin: Position, _range: f32) -> Vec<&dyn Subject> {
        Vec::new()
    }
}

/// The pair a selection is made for, plus the world they live in.
#[derive(Clone, Copy)]
pub struct Encounter<'a> {
    pub attacker: &'a dyn Subject,
    pub victim: &'a dyn Subject,
    pub world: &'a dyn World,
}

impl<'a> Encounter<'a> {
    pub fn new(attacker: &'a dyn Subject, victim: &'a dyn Subject, world: &'a dyn World) -> Self {
        Self {
            attacker,
            victim,
            world,
        }
    }

    /// Picks the attacker when `check_attacker` is set, the victim otherwise.
    pub fn pick(&self, check_attacker: bool) -> &'a dyn Subject {
        if check_attacker {
            self.attacker
        } else {
            self.victim
        }
    }
}
