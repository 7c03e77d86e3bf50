//! Path Following
//!
//! The movement capability the navigation task drives. [`PathFollower`] is
//! the per-agent state; [`MoverHandle`] pairs it with the agent's position.

use bevy_ecs::prelude::*;

use village_events::Vec3;

use crate::components::Position;
use crate::terrain::Path;

/// Movement capability consumed by the navigation task.
pub trait Mover {
    fn start_following(&mut self, path: Path, speed: f32);

    fn stop(&mut self);

    fn is_idle(&self) -> bool;

    fn current_path(&self) -> Option<&Path>;

    /// Whether the agent has not yet got past the first node of its path.
    fn is_near_path_start(&self) -> bool;

    fn teleport_to(&mut self, pos: Vec3);

    fn position(&self) -> Vec3;
}

/// Component: an agent's progress along its current path
#[derive(Component, Debug, Clone, Default)]
pub struct PathFollower {
    path: Option<Path>,
    /// Index of the node the agent is heading for
    next_node: usize,
    /// Fractional tiles carried over between ticks
    progress: f32,
    speed: f32,
}

impl PathFollower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn next_node(&self) -> usize {
        self.next_node
    }
}

/// Borrowed view of one agent's follower and position
pub struct MoverHandle<'a> {
    pub follower: &'a mut PathFollower,
    pub position: &'a mut Position,
}

impl<'a> MoverHandle<'a> {
    pub fn new(follower: &'a mut PathFollower, position: &'a mut Position) -> Self {
        Self { follower, position }
    }

    /// Moves `speed` tiles along the path. Finishing the path leaves the follower idle.
    pub fn advance(&mut self) {
        let Some(path) = self.follower.path.as_ref() else {
            return;
        };
        self.follower.progress += self.follower.speed;
        while self.follower.progress >= 1.0 && self.follower.next_node < path.len() {
            self.position.pos = path.nodes[self.follower.next_node].bottom_center();
            self.follower.next_node += 1;
            self.follower.progress -= 1.0;
        }
        if self.follower.next_node >= path.len() {
            self.stop();
        }
    }
}

impl Mover for MoverHandle<'_> {
    fn start_following(&mut self, path: Path, speed: f32) {
        self.follower.path = Some(path);
        self.follower.next_node = 0;
        self.follower.progress = 0.0;
        self.follower.speed = speed;
    }

    fn stop(&mut self) {
        self.follower.path = None;
        self.follower.next_node = 0;
        self.follower.progress = 0.0;
    }

    fn is_idle(&self) -> bool {
        self.follower.path.is_none()
    }

    fn current_path(&self) -> Option<&Path> {
        self.follower.path.as_ref()
    }

    fn is_near_path_start(&self) -> bool {
        !self.is_idle() && self.follower.next_node <= 1
    }

    /// Relocates the agent and abandons the current path.
    fn teleport_to(&mut self, pos: Vec3) {
        self.position.pos = pos;
        self.stop();
    }

    fn position(&self) -> Vec3 {
        self.position.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use village_events::TilePos;

    fn straight_path() -> Path {
        let nodes = (0..4).map(|x| TilePos::new(x, 64, 0)).collect();
        Path::new(nodes, TilePos::new(3, 64, 0), true)
    }

    #[test]
    fn test_follows_path_to_the_end() {
        let mut follower = PathFollower::new();
        let mut position = Position::at_tile(TilePos::new(0, 64, 0));
        let mut mover = MoverHandle::new(&mut follower, &mut position);

        mover.start_following(straight_path(), 1.0);
        assert!(mover.is_near_path_start());
        for _ in 0..4 {
            mover.advance();
        }

        assert!(mover.is_idle());
        assert!(!mover.is_near_path_start());
        assert_eq!(mover.position().tile(), TilePos::new(3, 64, 0));
    }

    #[test]
    fn test_slow_speed_carries_progress() {
        let mut follower = PathFollower::new();
        let mut position = Position::at_tile(TilePos::new(0, 64, 0));
        let mut mover = MoverHandle::new(&mut follower, &mut position);

        mover.start_following(straight_path(), 0.5);
        mover.advance();
        assert_eq!(mover.follower.next_node(), 0);
        mover.advance();
        mover.advance();
        mover.advance();
        assert_eq!(mover.follower.next_node(), 2);
        assert!(!mover.is_near_path_start());
    }

    #[test]
    fn test_teleport_stops_following() {
        let mut follower = PathFollower::new();
        let mut position = Position::at_tile(TilePos::new(0, 64, 0));
        let mut mover = MoverHandle::new(&mut follower, &mut position);

        mover.start_following(straight_path(), 1.0);
        mover.teleport_to(Vec3::new(10.5, 64.0, 10.5));
        assert!(mover.is_idle());
        assert_eq!(position.tile(), TilePos::new(10, 64, 10));
    }
}
