use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::domain::utils::id::{NodeId, VehicleId};

/// A vehicle bound to an aircraft it was dispatched to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub aircraft_node: NodeId,
    pub vehicle_id: VehicleId,
}

/// In-flight charging sessions keyed by aircraft node. At most one per node.
#[derive(Debug, Default)]
pub struct ActiveSessionRegistry {
    sessions: DashMap<NodeId, VehicleId>,
}

impl ActiveSessionRegistry {
    pub fn new() -> Self {
        ActiveSessionRegistry { sessions: DashMap::new() }
    }

    /// # Returns
    /// `true` if the session was recorded, `false` if the node already has one.
    pub fn insert_if_absent(&self, aircraft_node: NodeId, vehicle_id: VehicleId) -> bool {
        match self.sessions.entry(aircraft_node) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(vehicle_id);
                true
            }
        }
    }

    pub fn get(&self, aircraft_node: &NodeId) -> Option<VehicleId> {
        self.sessions.get(aircraft_node).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, aircraft_node: &NodeId) -> bool {
        self.sessions.contains_key(aircraft_node)
    }

    /// Removes and returns the session. Only one of several concurrent callers gets `Some`.
    pub fn remove(&self, aircraft_node: &NodeId) -> Option<Session> {
        self.sessions.remove(aircraft_node).map(|(aircraft_node, vehicle_id)| Session { aircraft_node, vehicle_id })
    }

    /// Removes the session only while `predicate` holds for the vehicle serving it.
    ///
    /// The predicate runs under the registry's lock for that node, so no other caller
    /// can replace the session between the check and the removal.
    pub fn remove_if(&self, aircraft_node: &NodeId, predicate: impl FnOnce(&VehicleId) -> bool) -> Option<Session> {
        self.sessions
            .remove_if(aircraft_node, |_, vehicle_id| predicate(vehicle_id))
            .map(|(aircraft_node, vehicle_id)| Session { aircraft_node, vehicle_id })
    }

    /// Removes the session only if `vehicle_id` still holds it.
    pub fn remove_if_held_by(&self, aircraft_node: &NodeId, vehicle_id: &VehicleId) -> Option<Session> {
        self.remove_if(aircraft_node, |held_by| held_by == vehicle_id)
    }

    /// Aircraft node currently served by `vehicle_id`, if any.
    pub fn find_by_vehicle(&self, vehicle_id: &VehicleId) -> Option<NodeId> {
        self.sessions.iter().find(|entry| entry.value() == vehicle_id).map(|entry| entry.key().clone())
    }

    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions.iter().map(|entry| Session { aircraft_node: entry.key().clone(), vehicle_id: entry.value().clone() }).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
