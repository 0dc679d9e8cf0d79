//! Actor Registry
//!
//! Identity for actors and the table through which an actor system owns
//! the cells it created.

use crate::metrics::CellStats;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique actor identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId {
    id: Uuid,
}

impl ActorId {
    /// Create new actor ID
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// Create from UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self { id }
    }

    /// Get UUID
    pub fn uuid(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.id.simple())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

/// Message-type-independent view of a registered cell
pub trait CellEntry: Send + Sync {
    fn id(&self) -> &ActorId;
    fn stats(&self) -> CellStats;
    fn is_idle(&self) -> bool;
    fn pending_messages(&self) -> usize;
    /// Idle with queued work that no processing task will pick up
    fn is_stranded(&self) -> bool;
}

/// Cells owned by an actor system
#[derive(Default)]
pub struct ActorRegistry {
    cells: RwLock<HashMap<ActorId, Arc<dyn CellEntry>>>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cell under its own id
    pub fn register(&self, cell: Arc<dyn CellEntry>) {
        tracing::debug!("Registering actor: {}", cell.id());
        self.cells.write().insert(cell.id().clone(), cell);
    }

    /// Drop the registry's ownership of a cell. Returns false if unknown.
    pub fn unregister(&self, id: &ActorId) -> bool {
        let removed = self.cells.write().remove(id).is_some();
        if removed {
            tracing::debug!("Unregistered actor: {}", id);
        } else {
            tracing::warn!("Attempted to unregister unknown actor: {}", id);
        }
        removed
    }

    pub fn get(&self, id: &ActorId) -> Option<Arc<dyn CellEntry>> {
        self.cells.read().get(id).cloned()
    }

    pub fn contains(&self, id: &ActorId) -> bool {
        self.cells.read().contains_key(id)
    }

    pub fn ids(&self) -> Vec<ActorId> {
        self.cells.read().keys().cloned().collect()
    }

    /// Snapshot of every registered cell
    pub fn entries(&self) -> Vec<Arc<dyn CellEntry>> {
        self.cells.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }
}

impl fmt::Debug for ActorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRegistry")
            .field("actors", &self.len())
            .finish()
    }
}
