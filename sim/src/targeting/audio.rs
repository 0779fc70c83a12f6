//! Audio fallback for agents that found nothing to shoot at.

use crate::components::{Faction, MoveTarget, MovementAction, Transform};
use crate::perception::SoundPerception;
use glam::Vec3;

/// Turn an idle agent toward the nearest recent hostile sound.
///
/// Only agents that are standing and already facing their move target are
/// redirected, so an agent with orders keeps executing them. Returns the
/// sound source when the move target was replaced.
pub fn face_recent_sound<S: SoundPerception + ?Sized>(
    transform: &Transform,
    faction: Faction,
    move_target: &mut MoveTarget,
    sounds: &S,
) -> Option<Vec3> {
    let source = sounds.recent_hostile_sound_near(transform.translation, faction)?;

    if !transform.is_facing(move_target.forward) || !move_target.is_standing() {
        return None;
    }

    let heading = (source - transform.translation).normalize_or_zero();
    if heading == Vec3::ZERO {
        return None;
    }

    move_target.create_new_action(MovementAction::Stand);
    move_target.center = transform.translation;
    move_target.forward = heading;
    Some(source)
}
