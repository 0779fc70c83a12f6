//! Perception collaborators consumed by the target finder.
//!
//! The finder never owns world geometry or the sound model. It sees them
//! through `VisibilityProbe` and `SoundPerception`, which are read-only for
//! the whole pass and may be queried from any worker.

use crate::components::Faction;
use crate::systems::clock::DeltaTime;
use bevy_ecs::prelude::*;
use glam::Vec3;

/// Swept-sphere occlusion test against static world geometry.
pub trait VisibilityProbe: Sync {
    /// True if a sphere of `radius` moving from `start` to `end` hits something.
    fn trace_blocked(&self, start: Vec3, end: Vec3, radius: f32) -> bool;
}

/// Probe for worlds without static geometry: nothing is ever in the way.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearLineOfSight;

impl VisibilityProbe for ClearLineOfSight {
    fn trace_blocked(&self, _start: Vec3, _end: Vec3, _radius: f32) -> bool {
        false
    }
}

/// Source of recently heard hostile sounds.
pub trait SoundPerception: Sync {
    /// Nearest recent sound made by `listener`'s opponents that is audible at `position`.
    fn recent_hostile_sound_near(&self, position: Vec3, listener: Faction) -> Option<Vec3>;
}

/// A sound made by an agent (gunfire, engines).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundEvent {
    pub source: Vec3,
    pub faction: Faction,
    /// Distance at which the sound can still be heard.
    pub audible_radius: f32,
    /// Seconds until the sound is forgotten.
    pub remaining: f32,
}

/// Resource holding every sound still being remembered.
#[derive(Resource, Debug, Clone, Default)]
pub struct SoundField {
    sounds: Vec<SoundEvent>,
}

impl SoundField {
    pub fn emit(&mut self, source: Vec3, faction: Faction, audible_radius: f32, lifetime: f32) {
        self.sounds.push(SoundEvent {
            source,
            faction,
            audible_radius,
            remaining: lifetime,
        });
    }

    /// Age sounds by `dt` seconds and drop the expired ones.
    pub fn decay(&mut self, dt: f32) {
        for sound in &mut self.sounds {
            sound.remaining -= dt;
        }
        self.sounds.retain(|s| s.remaining > 0.0);
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

impl SoundPerception for SoundField {
    fn recent_hostile_sound_near(&self, position: Vec3, listener: Faction) -> Option<Vec3> {
        let hostile = listener.opponent();
        self.sounds
            .iter()
            .filter(|s| s.faction == hostile && s.remaining > 0.0)
            .map(|s| (s, s.source.distance_squared(position)))
            .filter(|(s, dist_sq)| *dist_sq <= s.audible_radius * s.audible_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, _)| s.source)
    }
}

/// System that forgets old sounds.
pub fn sound_decay_system(dt: Res<DeltaTime>, mut sounds: ResMut<SoundField>) {
    sounds.decay(dt.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_hostile_sounds_are_heard() {
        let mut field = SoundField::default();
        field.emit(Vec3::new(10.0, 0.0, 0.0), Faction::Blue, 50.0, 2.0);
        field.emit(Vec3::new(30.0, 0.0, 0.0), Faction::Red, 50.0, 2.0);

        let heard = field.recent_hostile_sound_near(Vec3::ZERO, Faction::Blue);
        assert_eq!(heard, Some(Vec3::new(30.0, 0.0, 0.0)));

        let heard = field.recent_hostile_sound_near(Vec3::ZERO, Faction::Red);
        assert_eq!(heard, Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_out_of_earshot() {
        let mut field = SoundField::default();
        field.emit(Vec3::new(100.0, 0.0, 0.0), Faction::Red, 50.0, 2.0);
        assert!(field.recent_hostile_sound_near(Vec3::ZERO, Faction::Blue).is_none());
    }

    #[test]
    fn test_nearest_hostile_wins() {
        let mut field = SoundField::default();
        field.emit(Vec3::new(40.0, 0.0, 0.0), Faction::Red, 100.0, 2.0);
        field.emit(Vec3::new(0.0, -15.0, 0.0), Faction::Red, 100.0, 2.0);
        assert_eq!(
            field.recent_hostile_sound_near(Vec3::ZERO, Faction::Blue),
            Some(Vec3::new(0.0, -15.0, 0.0))
        );
    }

    #[test]
    fn test_sound_decay_system() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0));
        let mut field = SoundField::default();
        field.emit(Vec3::ZERO, Faction::Red, 10.0, 1.5);
        field.emit(Vec3::ZERO, Faction::Red, 10.0, 0.5);
        world.insert_resource(field);

        let mut schedule = Schedule::default();
        schedule.add_systems(sound_decay_system);
        schedule.run(&mut world);

        assert_eq!(world.resource::<SoundField>().len(), 1);
        schedule.run(&mut world);
        assert!(world.resource::<SoundField>().is_empty());
    }
}
