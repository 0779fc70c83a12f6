//! Serialization utilities for simulation state.

use crate::world::Snapshot;

/// Serialize a snapshot to JSON bytes.
pub fn snapshot_to_json(snapshot: &Snapshot) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(snapshot)
}

/// Deserialize a snapshot from JSON bytes.
pub fn snapshot_from_json(data: &[u8]) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_slice(data)
}

/// Deserialize a snapshot from a JSON string.
pub fn snapshot_from_json_string(data: &str) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_str(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Faction, UnitClass};
    use crate::world::AgentSnapshot;

    #[test]
    fn test_snapshot_json_uses_readable_enums() {
        let snapshot = Snapshot {
            tick: 42,
            time: 1.4,
            phase: 6,
            agents: vec![AgentSnapshot {
                id: 1,
                faction: Faction::Red,
                class: UnitClass::Vehicle,
                x: 10.0,
                y: 20.0,
                z: 0.0,
                heading: 0.0,
                target: Some(9),
                vertical_aim_offset: 0.8,
                searching: false,
                cached_blockers: 2,
            }],
        };

        let bytes = snapshot_to_json(&snapshot).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"Red\""));
        assert!(text.contains("\"Vehicle\""));

        let restored = snapshot_from_json(&bytes).unwrap();
        assert_eq!(restored.phase, 6);
        assert_eq!(restored.agents[0], snapshot.agents[0]);
        assert!(snapshot_from_json_string("{ \"tick\": 1 }").is_err());
    }
}
