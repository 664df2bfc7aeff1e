//! Collision reports and the allowed-collision matrix.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BodyKind {
    RobotLink,
    WorldObject,
}

/// A pair of bodies in contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub body_1: String,
    pub kind_1: BodyKind,
    pub body_2: String,
    pub kind_2: BodyKind,
}

impl Contact {
    pub fn new(
        body_1: impl Into<String>,
        kind_1: BodyKind,
        body_2: impl Into<String>,
        kind_2: BodyKind,
    ) -> Self {
        Self {
            body_1: body_1.into(),
            kind_1,
            body_2: body_2.into(),
            kind_2,
        }
    }

    /// Name of the world object side of the contact, if any.
    pub fn world_object(&self) -> Option<&str> {
        if self.kind_1 == BodyKind::WorldObject {
            Some(&self.body_1)
        } else if self.kind_2 == BodyKind::WorldObject {
            Some(&self.body_2)
        } else {
            None
        }
    }
}

/// Contacts found by one collision query. Never cached between queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    contacts: Vec<Contact>,
}

impl CollisionReport {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }

    pub fn clear() -> Self {
        Self::default()
    }

    pub fn is_colliding(&self) -> bool {
        !self.contacts.is_empty()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// First contact partner that is a world object.
    pub fn first_world_object(&self) -> Option<&str> {
        self.contacts.iter().find_map(Contact::world_object)
    }
}

/// Which collisions a validity check enforces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionMode {
    /// Robot links against each other and against world objects.
    #[default]
    Full,
    /// Self-collision only; world objects are ignored.
    SelfOnly,
}

/// Unordered body pairs whose contacts are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedCollisionMatrix {
    entries: BTreeSet<(String, String)>,
}

impl AllowedCollisionMatrix {
    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    pub fn allow(&mut self, a: &str, b: &str) {
        self.entries.insert(Self::key(a, b));
    }

    pub fn disallow(&mut self, a: &str, b: &str) {
        self.entries.remove(&Self::key(a, b));
    }

    pub fn is_allowed(&self, a: &str, b: &str) -> bool {
        self.entries.contains(&Self::key(a, b))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
