//! # Actor Addressing
//!
//! ## Key Concepts
//! - `ActorId`: identity of one spawned actor, never reused
//! - `ActorPath`: hierarchical, human readable location of an actor
//!
//! ## Path Format
//! Follows a URI-like structure: `roost://system/user/parent/child`.
//! A name is unique among its parent's live children, so a path is unique
//! among live actors. Once an actor stops, its name may be reused by a new
//! actor with a different `ActorId`.

use std::fmt;

use uuid::Uuid;

/// Scheme prefix of every actor path.
pub const PATH_SCHEME: &str = "roost";
/// Path segment under which all user actors live.
pub const USER_GUARDIAN: &str = "user";

/// Unique identity of a spawned actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Hierarchical location of an actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorPath {
    /// Full path string, e.g. `roost://bookings/user/supervisor/first`
    path: String,
    /// Number of segments below the user guardian (1 for top-level actors)
    depth: usize,
}

impl ActorPath {
    /// Path of a top-level actor named `name` in `system`.
    pub fn top_level(system: &str, name: &str) -> Self {
        Self {
            path: format!("{PATH_SCHEME}://{system}/{USER_GUARDIAN}/{name}"),
            depth: 1,
        }
    }

    /// Path of a child named `name` below this path.
    pub fn child(&self, name: &str) -> Self {
        Self {
            path: format!("{}/{}", self.path, name),
            depth: self.depth + 1,
        }
    }

    /// Last segment of the path.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Path of the parent actor, `None` for top-level actors.
    pub fn parent(&self) -> Option<ActorPath> {
        if self.depth <= 1 {
            return None;
        }
        self.path.rsplit_once('/').map(|(parent, _)| ActorPath {
            path: parent.to_string(),
            depth: self.depth - 1,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_top_level(&self) -> bool {
        self.depth == 1
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Validate a user supplied actor name.
    ///
    /// Names must be non-empty, must not contain `/` or whitespace, and must
    /// not start with `$`, which is reserved for generated names.
    pub fn validate_name(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("actor name must not be empty".to_string());
        }
        if name.starts_with('$') {
            return Err(format!("actor name '{name}' must not start with '$'"));
        }
        if name.contains('/') || name.chars().any(char::is_whitespace) {
            return Err(format!("actor name '{name}' contains '/' or whitespace"));
        }
        Ok(())
    }
}

impl fmt::Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
