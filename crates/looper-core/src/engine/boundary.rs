//! Loop geometry and boundary resolution
//!
//! A loop region is `loop_start..=loop_end` inside the first `buffered`
//! samples of a channel buffer. When `loop_start + loop_length` runs past the
//! captured length the region wraps through the physical end of the buffer and
//! `loop_end < loop_start`; this is the *inverted* regime, where the gap
//! `(loop_end, loop_start)` is the forbidden zone.
//!
//! [`resolve_boundary`] is pure: it takes a candidate position and reports
//! what happened at the boundary together with the corrected position. The
//! head applies the result.

use serde::{Deserialize, Serialize};

/// Shortest loop the geometry accepts (1ms at 48kHz)
pub const MIN_LOOP_LENGTH: i32 = 48;

/// Playback direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// +1.0 or -1.0
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// How a head behaves when it meets the loop boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    /// Wrap to the opposite boundary
    #[default]
    Normal,
    /// Reflect off the boundary and reverse
    Pendulum,
    /// Wrap like `Normal`, with random direction changes
    Drunk,
}

/// What the head must do after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Still inside the region
    None,
    /// Wrapped to the opposite boundary
    Loop,
    /// Reflected; direction must flip
    Invert,
    /// Non-looping head reached its fade-out zone
    Stop,
}

/// Result of [`resolve_boundary`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub action: LoopAction,
    pub position: f64,
}

impl Boundary {
    fn none(position: f64) -> Self {
        Self {
            action: LoopAction::None,
            position,
        }
    }

    fn new(action: LoopAction, position: f64) -> Self {
        Self { action, position }
    }
}

/// Loop region inside the captured part of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopGeometry {
    /// Number of valid samples in the buffer
    pub buffered: i32,
    pub start: i32,
    pub length: i32,
    /// Derived from `start` and `length`
    pub end: i32,
}

impl LoopGeometry {
    /// Loop spanning the whole captured region
    pub fn spanning(buffered: i32) -> Self {
        let buffered = buffered.max(1);
        Self {
            buffered,
            start: 0,
            length: buffered,
            end: buffered - 1,
        }
    }

    /// Build a geometry, clamping `start` and `length` into range
    pub fn new(buffered: i32, start: i32, length: i32) -> Self {
        let mut geometry = Self::spanning(buffered);
        geometry.set_start(start);
        geometry.set_length(length);
        geometry
    }

    /// Shortest loop allowed for this buffer
    #[inline]
    pub fn min_length(&self) -> i32 {
        MIN_LOOP_LENGTH.min(self.buffered)
    }

    /// Clamp and apply a new loop start, returning the applied value
    pub fn set_start(&mut self, start: i32) -> i32 {
        self.start = start.max(0).min(self.buffered - 1);
        self.end = calculate_loop_end(self.buffered, self.start, self.length);
        self.start
    }

    /// Clamp and apply a new loop length, returning the applied value
    pub fn set_length(&mut self, length: i32) -> i32 {
        self.length = length.max(self.min_length()).min(self.buffered);
        self.end = calculate_loop_end(self.buffered, self.start, self.length);
        self.length
    }

    /// Change the captured length, keeping start/length valid
    pub fn set_buffered(&mut self, buffered: i32) {
        self.buffered = buffered.max(1);
        self.set_start(self.start);
        self.set_length(self.length);
    }

    /// The region wraps through the physical end of the buffer
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    /// Whether an index lies in the active region
    #[inline]
    pub fn contains(&self, index: i32) -> bool {
        if self.is_inverted() {
            (index >= self.start && index < self.buffered) || (index >= 0 && index <= self.end)
        } else {
            index >= self.start && index <= self.end
        }
    }

    /// Index of the last valid sample
    #[inline]
    pub fn frame(&self) -> i32 {
        self.buffered - 1
    }

    /// Offset of `index` from `start` measured along the region
    #[inline]
    pub fn offset_of(&self, index: i32) -> i32 {
        (index - self.start).rem_euclid(self.buffered)
    }

    /// Natural start position for a direction
    #[inline]
    pub fn origin(&self, direction: Direction) -> i32 {
        match direction {
            Direction::Forward => self.start,
            Direction::Backward => self.end,
        }
    }
}

/// Last sample of a loop, wrapping through the end of the buffer
pub fn calculate_loop_end(buffered: i32, start: i32, length: i32) -> i32 {
    if start + length > buffered {
        start + length - buffered - 1
    } else {
        start + length - 1
    }
}

/// Head state that affects boundary handling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub direction: Direction,
    pub movement: Movement,
    pub looping: bool,
    /// A stop fade is already in progress
    pub stopping: bool,
    pub samples_to_fade: i32,
}

/// Resolve a candidate position against the loop boundaries
pub fn resolve_boundary(geometry: &LoopGeometry, motion: &Motion, position: f64) -> Boundary {
    if geometry.buffered <= 0 {
        return Boundary::none(0.0);
    }
    if geometry.is_inverted() {
        resolve_inverted(geometry, motion, position)
    } else {
        resolve_normal(geometry, motion, position)
    }
}

fn reflects(motion: &Motion) -> bool {
    motion.looping && motion.movement == Movement::Pendulum
}

fn resolve_normal(g: &LoopGeometry, motion: &Motion, pos: f64) -> Boundary {
    let start = g.start as f64;
    let end = g.end as f64;
    let length = g.length as f64;
    let index = pos.floor() as i32;

    let crossed = match motion.direction {
        Direction::Forward => index > g.end,
        Direction::Backward => index < g.start,
    };

    if crossed {
        if reflects(motion) {
            let reflected = match motion.direction {
                Direction::Forward => 2.0 * end + 1.0 - pos,
                Direction::Backward => 2.0 * start - 1.0 - pos,
            };
            return Boundary::new(LoopAction::Invert, reflected.max(start).min(end));
        }
        if motion.looping {
            let wrapped = start + (pos - start).rem_euclid(length);
            return Boundary::new(LoopAction::Loop, wrapped.max(start).min(end));
        }
        let edge = match motion.direction {
            Direction::Forward => end,
            Direction::Backward => start,
        };
        let action = if motion.stopping {
            LoopAction::None
        } else {
            LoopAction::Stop
        };
        return Boundary::new(action, edge);
    }

    if !motion.looping && !motion.stopping && approaching(g, motion, index) {
        return Boundary::new(LoopAction::Stop, pos);
    }

    Boundary::none(pos)
}

fn resolve_inverted(g: &LoopGeometry, motion: &Motion, pos: f64) -> Boundary {
    let buffered = g.buffered as f64;
    let frame = g.frame() as f64;
    let start = g.start as f64;
    let end = g.end as f64;

    // The physical ends of the buffer are inside the region: rotate
    let pos = if pos >= buffered {
        (pos - buffered).min(frame)
    } else if pos < 0.0 {
        (pos + buffered).max(0.0)
    } else {
        pos
    };
    let index = pos.floor() as i32;

    let in_gap = index > g.end && index < g.start;
    if in_gap {
        let stop_action = if motion.stopping {
            LoopAction::None
        } else {
            LoopAction::Stop
        };
        return match motion.direction {
            Direction::Forward => {
                if reflects(motion) {
                    Boundary::new(LoopAction::Invert, (2.0 * end + 1.0 - pos).max(0.0))
                } else if motion.looping {
                    Boundary::new(LoopAction::Loop, (start + (pos - end - 1.0)).min(frame))
                } else {
                    Boundary::new(stop_action, end)
                }
            }
            Direction::Backward => {
                if reflects(motion) {
                    Boundary::new(LoopAction::Invert, (2.0 * start - 1.0 - pos).min(frame))
                } else if motion.looping {
                    Boundary::new(LoopAction::Loop, (end - (start - pos) + 1.0).max(0.0))
                } else {
                    Boundary::new(stop_action, start)
                }
            }
        };
    }

    if !motion.looping && !motion.stopping && approaching(g, motion, index) {
        return Boundary::new(LoopAction::Stop, pos);
    }

    Boundary::none(pos)
}

/// Within the fade-out zone before the boundary in the travel direction
fn approaching(g: &LoopGeometry, motion: &Motion, index: i32) -> bool {
    let offset = g.offset_of(index);
    let distance = match motion.direction {
        Direction::Forward => g.length - 1 - offset,
        Direction::Backward => offset,
    };
    distance < motion.samples_to_fade
}

/// Map any integer index onto a valid buffer index
///
/// Identity inside the active region. A pendulum head mirrors indices past
/// either boundary back into the region, the same way its position reflects.
/// Otherwise indices past the region fold to the opposite boundary in the
/// direction of travel and anything else is clamped into the buffer.
pub fn wrap_index(geometry: &LoopGeometry, motion: &Motion, index: i32) -> i32 {
    let g = geometry;
    if g.buffered <= 0 {
        return 0;
    }
    if g.contains(index) {
        return index;
    }

    let pendulum = motion.movement == Movement::Pendulum;
    let forward = motion.direction == Direction::Forward;

    if g.is_inverted() {
        let rotated = index.rem_euclid(g.buffered);
        if g.contains(rotated) {
            return rotated;
        }
        let past_end = rotated - g.end;
        let before_start = g.start - rotated;
        if pendulum {
            // Mirror about the nearer boundary of the gap
            return if past_end <= before_start {
                (2 * g.end + 1 - rotated).max(0)
            } else {
                (2 * g.start - 1 - rotated).min(g.frame())
            };
        }
        return if forward {
            (g.start + past_end - 1).min(g.frame())
        } else {
            (g.end - before_start + 1).max(0)
        };
    }

    if pendulum {
        let mirrored = if index > g.end {
            2 * g.end + 1 - index
        } else {
            2 * g.start - 1 - index
        };
        return mirrored.max(g.start).min(g.end);
    }

    let fold_forward = index > g.end && forward;
    let fold_backward = index < g.start && !forward;
    let folded = if fold_forward || fold_backward {
        g.start + (index - g.start).rem_euclid(g.length)
    } else {
        index
    };
    folded.max(0).min(g.frame())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn motion(direction: Direction, movement: Movement, looping: bool) -> Motion {
        Motion {
            direction,
            movement,
            looping,
            stopping: false,
            samples_to_fade: 1200,
        }
    }

    #[test]
    fn test_full_buffer_geometry() {
        let g = LoopGeometry::spanning(48000);
        assert_eq!(g.length, 48000);
        assert_eq!(g.end, 47999);
        assert!(!g.is_inverted());
    }

    #[test]
    fn test_normal_loop_end() {
        let g = LoopGeometry::new(48000, 1000, 500);
        assert_eq!(g.end, 1499);
        assert!(!g.is_inverted());
    }

    #[test]
    fn test_inverted_loop_end() {
        let g = LoopGeometry::new(48000, 47500, 1000);
        assert_eq!(g.end, 499);
        assert!(g.is_inverted());
    }

    #[test]
    fn test_loop_end_always_in_buffer() {
        let buffered = 997;
        for start in (0..buffered).step_by(7) {
            for length in (MIN_LOOP_LENGTH..=buffered).step_by(13) {
                let g = LoopGeometry::new(buffered, start, length);
                assert!(
                    g.end >= 0 && g.end < buffered,
                    "start={} length={} end={}",
                    start,
                    length,
                    g.end
                );
            }
        }
    }

    #[test]
    fn test_setters_clamp() {
        let mut g = LoopGeometry::spanning(1000);
        assert_eq!(g.set_length(3), MIN_LOOP_LENGTH);
        assert_eq!(g.set_length(5000), 1000);
        assert_eq!(g.set_start(-20), 0);
        assert_eq!(g.set_start(2000), 999);
    }

    #[test]
    fn test_tiny_buffer_min_length_yields_to_buffered() {
        let mut g = LoopGeometry::spanning(10);
        assert_eq!(g.set_length(1), 10);
        assert_eq!(g.end, 9);
    }

    #[test]
    fn test_forward_loop_wraps_to_start() {
        let g = LoopGeometry::new(48000, 1000, 500);
        let m = motion(Direction::Forward, Movement::Normal, true);
        let b = resolve_boundary(&g, &m, 1500.0);
        assert_eq!(b.action, LoopAction::Loop);
        assert_eq!(b.position.floor() as i32, 1000);
    }

    #[test]
    fn test_loop_preserves_overshoot() {
        let g = LoopGeometry::new(48000, 1000, 500);
        let m = motion(Direction::Forward, Movement::Normal, true);
        let b = resolve_boundary(&g, &m, 1501.25);
        assert_relative_eq!(b.position, 1001.25);

        let m = motion(Direction::Backward, Movement::Normal, true);
        let b = resolve_boundary(&g, &m, 999.5);
        assert_eq!(b.action, LoopAction::Loop);
        assert_relative_eq!(b.position, 1499.5);
    }

    #[test]
    fn test_pendulum_reflects() {
        let g = LoopGeometry::new(48000, 1000, 500);
        let m = motion(Direction::Forward, Movement::Pendulum, true);
        let b = resolve_boundary(&g, &m, 1500.0);
        assert_eq!(b.action, LoopAction::Invert);
        assert_eq!(b.position.floor() as i32, 1499);

        let m = motion(Direction::Backward, Movement::Pendulum, true);
        let b = resolve_boundary(&g, &m, 999.0);
        assert_eq!(b.action, LoopAction::Invert);
        assert_eq!(b.position.floor() as i32, 1000);
    }

    #[test]
    fn test_drunk_wraps_like_normal() {
        let g = LoopGeometry::new(48000, 1000, 500);
        let m = motion(Direction::Forward, Movement::Drunk, true);
        let b = resolve_boundary(&g, &m, 1500.0);
        assert_eq!(b.action, LoopAction::Loop);
        assert_eq!(b.position.floor() as i32, 1000);
    }

    #[test]
    fn test_inside_region_is_untouched() {
        let g = LoopGeometry::new(48000, 1000, 500);
        let m = motion(Direction::Forward, Movement::Normal, true);
        let b = resolve_boundary(&g, &m, 1234.5);
        assert_eq!(b, Boundary::none(1234.5));
    }

    #[test]
    fn test_non_looping_stops_once_near_end() {
        let g = LoopGeometry::new(48000, 0, 10000);
        let mut m = motion(Direction::Forward, Movement::Normal, false);
        m.samples_to_fade = 100;

        assert_eq!(resolve_boundary(&g, &m, 9800.0).action, LoopAction::None);
        assert_eq!(resolve_boundary(&g, &m, 9900.0).action, LoopAction::Stop);

        m.stopping = true;
        assert_eq!(resolve_boundary(&g, &m, 9950.0).action, LoopAction::None);
    }

    #[test]
    fn test_non_looping_overshoot_clamps() {
        let g = LoopGeometry::new(48000, 0, 10000);
        let mut m = motion(Direction::Forward, Movement::Normal, false);
        m.stopping = true;
        let b = resolve_boundary(&g, &m, 10003.0);
        assert_eq!(b.action, LoopAction::None);
        assert_relative_eq!(b.position, 9999.0);
    }

    #[test]
    fn test_non_looping_pendulum_does_not_reflect() {
        let g = LoopGeometry::new(48000, 1000, 500);
        let m = motion(Direction::Forward, Movement::Pendulum, false);
        let b = resolve_boundary(&g, &m, 1500.0);
        assert_eq!(b.action, LoopAction::Stop);
        assert_relative_eq!(b.position, 1499.0);
    }

    #[test]
    fn test_inverted_forward_rotates_through_buffer_end() {
        let g = LoopGeometry::new(48000, 47500, 1000);
        let m = motion(Direction::Forward, Movement::Normal, true);
        let b = resolve_boundary(&g, &m, 48000.0);
        assert_eq!(b.action, LoopAction::None);
        assert_eq!(b.position.floor() as i32, 0);
    }

    #[test]
    fn test_inverted_backward_rotates_through_buffer_start() {
        let g = LoopGeometry::new(48000, 47500, 1000);
        let m = motion(Direction::Backward, Movement::Normal, true);
        let b = resolve_boundary(&g, &m, -1.0);
        assert_eq!(b.action, LoopAction::None);
        assert_eq!(b.position.floor() as i32, 47999);
    }

    #[test]
    fn test_inverted_gap_loops() {
        let g = LoopGeometry::new(48000, 47500, 1000);

        let m = motion(Direction::Forward, Movement::Normal, true);
        let b = resolve_boundary(&g, &m, 500.0);
        assert_eq!(b.action, LoopAction::Loop);
        assert_eq!(b.position.floor() as i32, 47500);

        let m = motion(Direction::Backward, Movement::Normal, true);
        let b = resolve_boundary(&g, &m, 47499.5);
        assert_eq!(b.action, LoopAction::Loop);
        assert_eq!(b.position.floor() as i32, 499);
    }

    #[test]
    fn test_inverted_gap_reflects() {
        let g = LoopGeometry::new(48000, 47500, 1000);

        let m = motion(Direction::Forward, Movement::Pendulum, true);
        let b = resolve_boundary(&g, &m, 500.0);
        assert_eq!(b.action, LoopAction::Invert);
        assert_eq!(b.position.floor() as i32, 499);

        let m = motion(Direction::Backward, Movement::Pendulum, true);
        let b = resolve_boundary(&g, &m, 47499.0);
        assert_eq!(b.action, LoopAction::Invert);
        assert_eq!(b.position.floor() as i32, 47500);
    }

    #[test]
    fn test_inverted_positions_stay_in_buffer() {
        // Very small region right at the end of the buffer
        let g = LoopGeometry::new(100, 99, 48);
        assert!(g.is_inverted());
        for &direction in &[Direction::Forward, Direction::Backward] {
            for &movement in &[Movement::Normal, Movement::Pendulum] {
                let m = motion(direction, movement, true);
                let mut p = -150.0;
                while p < 250.0 {
                    let b = resolve_boundary(&g, &m, p);
                    assert!(b.position >= 0.0 && b.position < 100.0, "{:?}", b);
                    p += 0.75;
                }
            }
        }
    }

    #[test]
    fn test_inverted_approach_distance() {
        let g = LoopGeometry::new(48000, 47500, 1000);
        let mut m = motion(Direction::Forward, Movement::Normal, false);
        m.samples_to_fade = 100;
        assert_eq!(resolve_boundary(&g, &m, 47999.0).action, LoopAction::None);
        assert_eq!(resolve_boundary(&g, &m, 450.0).action, LoopAction::Stop);

        m.direction = Direction::Backward;
        assert_eq!(resolve_boundary(&g, &m, 47550.0).action, LoopAction::Stop);
        assert_eq!(resolve_boundary(&g, &m, 200.0).action, LoopAction::None);
    }

    #[test]
    fn test_wrap_index_identity_inside_region() {
        let regions = [
            LoopGeometry::new(48000, 1000, 500),
            LoopGeometry::new(48000, 47500, 1000),
        ];
        let m = motion(Direction::Forward, Movement::Normal, true);
        for g in &regions {
            for i in 0..g.buffered {
                if g.contains(i) {
                    let once = wrap_index(g, &m, i);
                    assert_eq!(once, i);
                    assert_eq!(wrap_index(g, &m, once), once);
                }
            }
        }
    }

    #[test]
    fn test_wrap_index_folds_in_travel_direction() {
        let g = LoopGeometry::new(48000, 1000, 500);
        let fwd = motion(Direction::Forward, Movement::Normal, true);
        assert_eq!(wrap_index(&g, &fwd, 1500), 1000);
        assert_eq!(wrap_index(&g, &fwd, 1501), 1001);

        let bwd = motion(Direction::Backward, Movement::Normal, true);
        assert_eq!(wrap_index(&g, &bwd, 999), 1499);

        let inv = LoopGeometry::new(48000, 47500, 1000);
        assert_eq!(wrap_index(&inv, &fwd, 48000), 0);
        assert_eq!(wrap_index(&inv, &fwd, 500), 47500);
        assert_eq!(wrap_index(&inv, &bwd, -1), 47999);
        assert_eq!(wrap_index(&inv, &bwd, 47499), 499);
    }

    #[test]
    fn test_wrap_index_mirrors_for_pendulum() {
        let g = LoopGeometry::new(48000, 1000, 500);
        for &direction in &[Direction::Forward, Direction::Backward] {
            let m = motion(direction, Movement::Pendulum, true);
            assert_eq!(wrap_index(&g, &m, 1500), 1499);
            assert_eq!(wrap_index(&g, &m, 1502), 1497);
            assert_eq!(wrap_index(&g, &m, 999), 1000);
            assert_eq!(wrap_index(&g, &m, 997), 1002);
            // Far overshoot stays inside the region
            assert_eq!(wrap_index(&g, &m, 9000), 1000);
        }

        // Inverted: gap is (499, 47500)
        let inv = LoopGeometry::new(48000, 47500, 1000);
        let m = motion(Direction::Forward, Movement::Pendulum, true);
        assert_eq!(wrap_index(&inv, &m, 500), 499);
        assert_eq!(wrap_index(&inv, &m, 502), 497);
        assert_eq!(wrap_index(&inv, &m, 47499), 47500);
        assert_eq!(wrap_index(&inv, &m, 47497), 47502);
        // Physical ends are inside the region, not boundaries
        assert_eq!(wrap_index(&inv, &m, 48000), 0);
        assert_eq!(wrap_index(&inv, &m, -1), 47999);
    }

    #[test]
    fn test_wrap_index_always_valid() {
        let regions = [
            LoopGeometry::new(1000, 100, 300),
            LoopGeometry::new(1000, 900, 300),
            LoopGeometry::new(1000, 999, 48),
        ];
        for g in &regions {
            for &direction in &[Direction::Forward, Direction::Backward] {
                for &movement in &[Movement::Normal, Movement::Pendulum] {
                    let m = motion(direction, movement, true);
                    for i in -2500..2500 {
                        let w = wrap_index(g, &m, i);
                        assert!(w >= 0 && w < g.buffered, "{:?} {} -> {}", g, i, w);
                    }
                }
            }
        }
    }
}
