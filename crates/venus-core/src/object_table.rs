//! Driver-side object lifetime tracking.
//!
//! Ids are allocated before the create command is encoded, so the renderer
//! learns each object's identity from the command stream itself. The table
//! tracks what the renderer believes exists; a lookup after destroy or with
//! the wrong type is a driver bug surfaced as an error.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use venus_protocol::{ObjectId, ObjectType};

use crate::error::CoreError;

/// Allocates renderer-visible object ids. Starts at 1; 0 is the null
/// object.
pub struct ObjectIdAllocator {
    next: AtomicU64,
}

impl ObjectIdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn alloc(&self) -> ObjectId {
        ObjectId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ObjectIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
struct ObjectRecord {
    object_type: ObjectType,
    live: bool,
}

/// Registry of every object the renderer knows about.
pub struct ObjectTable {
    objects: DashMap<ObjectId, ObjectRecord>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
        }
    }

    /// Register a freshly created object. The id must be unused.
    pub fn register(&self, id: ObjectId, object_type: ObjectType) -> Result<(), CoreError> {
        if id.is_null() {
            return Err(CoreError::ObjectNotFound(id));
        }
        match self.objects.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(CoreError::DuplicateObject(id)),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(ObjectRecord {
                    object_type,
                    live: true,
                });
                Ok(())
            }
        }
    }

    /// Validate that `id` names a live object of the expected type.
    pub fn lookup(&self, id: ObjectId, expected: ObjectType) -> Result<(), CoreError> {
        let record = self
            .objects
            .get(&id)
            .ok_or(CoreError::ObjectNotFound(id))?;
        if record.object_type != expected {
            return Err(CoreError::ObjectTypeMismatch {
                id,
                expected,
                actual: record.object_type,
            });
        }
        if !record.live {
            return Err(CoreError::ObjectDestroyed(id));
        }
        Ok(())
    }

    /// Mark an object destroyed. Destroy is single-shot.
    pub fn destroy(&self, id: ObjectId, expected: ObjectType) -> Result<(), CoreError> {
        let mut record = self
            .objects
            .get_mut(&id)
            .ok_or(CoreError::ObjectNotFound(id))?;
        if record.object_type != expected {
            return Err(CoreError::ObjectTypeMismatch {
                id,
                expected,
                actual: record.object_type,
            });
        }
        if !record.live {
            return Err(CoreError::ObjectDestroyed(id));
        }
        record.live = false;
        Ok(())
    }

    /// Live objects, for leak checks at teardown.
    pub fn live_count(&self) -> usize {
        self.objects.iter().filter(|entry| entry.live).count()
    }
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}
