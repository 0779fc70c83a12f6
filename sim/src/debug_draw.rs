//! Fire-and-forget debug visualization.
//!
//! The finder pushes shapes into a channel owned by whoever renders them. A
//! closed or missing receiver is ignored; drawing never changes results.

use crate::geometry::SearchArea;
use bevy_ecs::prelude::*;
use glam::Vec3;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

/// Something worth drawing for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugShape {
    /// Sub-cell inspected by an agent this pass.
    SearchArea {
        area: SearchArea,
        phase: u8,
        candidates: usize,
    },
    /// An agent that is still looking for a target.
    Searching { position: Vec3 },
    /// Arrow from an agent toward the hostile sound it turned to face.
    SoundHeading { from: Vec3, to: Vec3 },
}

/// Resource that forwards debug shapes to an external renderer.
///
/// `Sender` is not `Sync`, so workers share it behind a mutex.
#[derive(Resource, Default)]
pub struct DebugDrawSink {
    sender: Option<Mutex<Sender<DebugShape>>>,
}

impl DebugDrawSink {
    /// Connected sink plus the receiving end for the renderer.
    pub fn channel() -> (Self, Receiver<DebugShape>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                sender: Some(Mutex::new(tx)),
            },
            rx,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn emit(&self, shape: DebugShape) {
        let Some(sender) = &self.sender else {
            return;
        };
        let sender = match sender.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Receiver may have hung up
        let _ = sender.send(shape);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sink_drops_shapes() {
        let sink = DebugDrawSink::default();
        assert!(!sink.is_enabled());
        sink.emit(DebugShape::Searching { position: Vec3::ZERO });
    }

    #[test]
    fn test_channel_delivers_in_order() {
        let (sink, rx) = DebugDrawSink::channel();
        sink.emit(DebugShape::Searching { position: Vec3::X });
        sink.emit(DebugShape::SoundHeading {
            from: Vec3::ZERO,
            to: Vec3::Y,
        });

        let shapes: Vec<_> = rx.try_iter().collect();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0], DebugShape::Searching { position: Vec3::X });
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (sink, rx) = DebugDrawSink::channel();
        drop(rx);
        sink.emit(DebugShape::Searching { position: Vec3::ZERO });
    }
}
