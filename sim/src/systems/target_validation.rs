//! Target validation - sends agents whose target vanished back to searching.

use crate::components::*;
use bevy_ecs::prelude::*;
use tracing::trace;

/// System that releases targets that were despawned or stopped being agents.
///
/// ## Data Access
/// - Reads: Faction (on targets)
/// - Writes: TargetEntity
/// - Deferred: TrackingTarget -> NeedsEnemyTarget
pub fn target_validation_system(
    mut commands: Commands,
    mut trackers: Query<(Entity, &mut TargetEntity), With<TrackingTarget>>,
    agents: Query<(), With<Faction>>,
) {
    for (entity, mut record) in trackers.iter_mut() {
        if record.entity.is_some_and(|target| agents.contains(target)) {
            continue;
        }

        trace!(agent = ?entity, lost = ?record.entity, "target_released");
        record.clear_target();
        commands.entity(entity).remove::<TrackingTarget>().insert(NeedsEnemyTarget);
    }
}
