use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

use crate::domain::utils::id::{NodeId, VehicleId};
use crate::domain::vehicle::vehicle::Vehicle;

/// Every vehicle registered with ground control. Vehicles are never removed.
#[derive(Debug, Default)]
pub struct VehiclePool {
    vehicles: DashMap<VehicleId, Arc<Vehicle>>,
}

impl VehiclePool {
    pub fn new() -> Self {
        VehiclePool { vehicles: DashMap::new() }
    }

    /// Adds the vehicle unless its id is already taken.
    ///
    /// # Returns
    /// `true` if the vehicle was inserted.
    pub fn insert_if_absent(&self, vehicle: Vehicle) -> bool {
        match self.vehicles.entry(vehicle.id().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(vehicle));
                true
            }
        }
    }

    pub fn get(&self, vehicle_id: &VehicleId) -> Option<Arc<Vehicle>> {
        self.vehicles.get(vehicle_id).map(|entry| entry.value().clone())
    }

    /// Copy of the current pool. No shard lock is held once this returns.
    pub fn snapshot(&self) -> Vec<Arc<Vehicle>> {
        self.vehicles.iter().map(|entry| entry.value().clone()).collect()
    }

    /// First Free vehicle able to serve `aircraft_node`, in whatever order the pool yields.
    ///
    /// The result is only a candidate: it still has to be won with `Vehicle::try_acquire`.
    pub fn find_free_for(&self, aircraft_node: &NodeId) -> Option<Arc<Vehicle>> {
        self.vehicles.iter().find(|entry| entry.is_free() && entry.serves(aircraft_node)).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}
