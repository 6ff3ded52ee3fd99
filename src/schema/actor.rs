use serde::{Deserialize, Serialize};

use super::subject::{Position, Subject, SubjectId, World};

/// A plain-data snapshot of an actor.
///
/// Hosts with a live actor model implement [`Subject`] on their own handles;
/// this type serves tools, tests and hosts that copy state out per event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: SubjectId,
    #[serde(default)]
    pub position: Position,
    /// Yaw in radians, clockwise, 0 facing +y.
    #[serde(default)]
    pub heading: f32,
    #[serde(default)]
    pub skeleton: String,
    /// Actors this one is hostile to.
    #[serde(default)]
    pub hostile_to: Vec<SubjectId>,
    #[serde(default)]
    pub flags: ActorFlags,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorFlags {
    pub loaded: bool,
    pub dead: bool,
    pub paired_animation: bool,
    pub mounted: bool,
    pub bleeding_out: bool,
    pub ragdolling: bool,
    pub protected: bool,
    pub essential: bool,
}

impl Default for ActorFlags {
    fn default() -> Self {
        Self {
            loaded: true,
            dead: false,
            paired_animation: false,
            mounted: false,
            bleeding_out: false,
            ragdolling: false,
            protected: false,
            essential: false,
        }
    }
}

impl ActorSnapshot {
    pub fn new(id: u64) -> Self {
        Self {
            id: SubjectId(id),
            ..Self::default()
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Position::new(x, y, z);
        self
    }

    pub fn facing(mut self, heading: f32) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_skeleton(mut self, path: &str) -> Self {
        self.skeleton = path.to_string();
        self
    }

    pub fn hostile_to(mut self, other: SubjectId) -> Self {
        self.hostile_to.push(other);
        self
    }

    pub fn with_flags(mut self, flags: ActorFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl Subject for ActorSnapshot {
    fn id(&self) -> SubjectId {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }

    fn heading(&self) -> f32 {
        self.heading
    }

    fn skeleton_path(&self) -> &str {
        &self.skeleton
    }

    fn is_loaded(&self) -> bool {
        self.flags.loaded
    }

    fn is_dead(&self) -> bool {
        self.flags.dead
    }

    fn is_in_paired_animation(&self) -> bool {
        self.flags.paired_animation
    }

    fn is_on_mount(&self) -> bool {
        self.flags.mounted
    }

    fn is_bleeding_out(&self) -> bool {
        self.flags.bleeding_out
    }

    fn is_ragdolling(&self) -> bool {
        self.flags.ragdolling
    }

    fn is_protected(&self) -> bool {
        self.flags.protected
    }

    fn is_essential(&self) -> bool {
        self.flags.essential
    }

    fn is_hostile_to(&self, other: &dyn Subject) -> bool {
        self.hostile_to.contains(&other.id())
    }
}

/// A scene made of snapshots. The primary actor is looked up by ID among
/// `actors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    #[serde(default)]
    pub primary: Option<SubjectId>,
    #[serde(default)]
    pub actors: Vec<ActorSnapshot>,
}

impl World for SceneSnapshot {
    fn primary(&self) -> Option<&dyn Subject> {
        let id = self.primary?;
        self.actors
            .iter()
            .find(|actor| actor.id == id)
            .map(|actor| actor as &dyn Subject)
    }

    fn actors_near(&self, origin: Position, range: f32) -> Vec<&dyn Subject> {
        self.actors
            .iter()
            .filter(|actor| actor.position.distance(&origin) <= range)
            .map(|actor| actor as &dyn Subject)
            .collect()
    }
}
