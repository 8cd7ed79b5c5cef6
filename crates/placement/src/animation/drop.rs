//! Scripted drop-and-settle motion: fall, bounce train, decaying wobble.

use std::f32::consts::TAU;

use glam::Vec3;
use tracing::debug;

use super::easing::{bounce_arc, ease_in_out_quad};

pub const GRAVITY: f32 = 9.81;
/// Fall distances at or below this skip the animation entirely
pub const SETTLE_EPSILON: f32 = 0.001;
/// Bounces lower than this end the bounce train
pub const MIN_BOUNCE_HEIGHT: f32 = 0.005;
/// Masses below this are clamped up
pub const MIN_MASS: f32 = 0.1;
const MIN_FALL_MS: f32 = 200.0;
const MAX_FALL_MS: f32 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPhase {
    Falling,
    Bouncing,
    Wobbling,
    Done,
}

/// Curve parameters derived from fall distance and mass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropCurve {
    pub fall_distance: f32,
    pub fall_ms: f32,
    pub bounce_height: f32,
    pub bounce_count: u32,
    /// Multiplier applied to the bounce height after each bounce
    pub damping: f32,
    pub wobble_ms: f32,
    pub wobble_amplitude: f32,
    pub wobble_hz: f32,
}

impl DropCurve {
    pub fn new(start_y: f32, target_y: f32, mass: f32) -> Self {
        let fall_distance = (start_y - target_y).abs();
        let settled = fall_distance <= SETTLE_EPSILON;
        Self {
            fall_distance,
            fall_ms: if settled { 0.0 } else { Self::fall_time_ms(fall_distance) },
            bounce_height: Self::bounce_height(fall_distance, mass),
            bounce_count: Self::bounce_count(mass),
            damping: Self::damping(mass),
            wobble_ms: 800.0 + mass * 100.0,
            wobble_amplitude: (1.0 / mass.max(MIN_MASS) * 0.06).min(0.1),
            wobble_hz: 6.0 + 3.0 / mass.max(MIN_MASS),
        }
    }

    /// Free-fall time, sped up and clamped to [200, 800] ms
    pub fn fall_time_ms(distance: f32) -> f32 {
        ((2.0 * distance / GRAVITY).sqrt() * 0.7 * 1000.0).clamp(MIN_FALL_MS, MAX_FALL_MS)
    }

    /// First bounce height; never grows with mass
    pub fn bounce_height(fall_distance: f32, mass: f32) -> f32 {
        0.15 * fall_distance * (1.0 / mass.max(MIN_MASS) * 0.8).min(1.0)
    }

    pub fn bounce_count(mass: f32) -> u32 {
        (2.0 + 1.5 / mass.max(MIN_MASS)).floor() as u32
    }

    pub fn damping(mass: f32) -> f32 {
        0.7 + (mass - 1.0) * 0.05
    }

    /// Up-and-down time of a bounce reaching `height`
    pub fn bounce_duration_ms(height: f32) -> f32 {
        2.0 * (2.0 * height.max(0.0) / GRAVITY).sqrt() * 1000.0
    }

    pub fn is_settled(&self) -> bool {
        self.fall_distance <= SETTLE_EPSILON
    }
}

/// State written to the animated node for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropFrame {
    pub y: f32,
    pub rotation: Vec3,
    pub phase: DropPhase,
}

/// One in-flight drop. Advanced by frame deltas, never by wall clock.
#[derive(Debug, Clone)]
pub struct DropAnimation {
    start_y: f32,
    target_y: f32,
    initial_rotation: Vec3,
    curve: DropCurve,
    phase: DropPhase,
    elapsed: f32,
    phase_start: f32,
    touchdown_at: Option<f32>,
    current_bounce: u32,
    current_bounce_height: f32,
    active: bool,
}

impl DropAnimation {
    pub fn new(start_y: f32, target_y: f32, mass: f32, initial_rotation: Vec3) -> Self {
        let curve = DropCurve::new(start_y, target_y, mass);
        Self {
            start_y,
            target_y,
            initial_rotation,
            curve,
            phase: DropPhase::Falling,
            elapsed: 0.0,
            phase_start: 0.0,
            touchdown_at: None,
            current_bounce: 0,
            current_bounce_height: curve.bounce_height,
            active: true,
        }
    }

    pub fn curve(&self) -> &DropCurve {
        &self.curve
    }

    pub fn phase(&self) -> DropPhase {
        self.phase
    }

    pub fn target_y(&self) -> f32 {
        self.target_y
    }

    pub fn current_bounce(&self) -> u32 {
        self.current_bounce
    }

    pub fn current_bounce_height(&self) -> f32 {
        self.current_bounce_height
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stop writing; later `advance` calls return None
    pub fn cancel(&mut self) {
        self.active = false;
    }

    /// Advance by `dt_ms` and return the frame to apply.
    ///
    /// Returns None once the `Done` frame has been handed out or after
    /// `cancel`. Overflow time carries across phase boundaries.
    pub fn advance(&mut self, dt_ms: f32) -> Option<DropFrame> {
        if !self.active || self.phase == DropPhase::Done {
            return None;
        }
        self.elapsed += dt_ms.max(0.0);

        let mut y = self.target_y;
        loop {
            match self.phase {
                DropPhase::Falling => {
                    let t = self.elapsed - self.phase_start;
                    if t < self.curve.fall_ms {
                        let p = ease_in_out_quad(t / self.curve.fall_ms);
                        y = self.start_y + (self.target_y - self.start_y) * p;
                        break;
                    }
                    self.phase_start += self.curve.fall_ms;
                    self.touchdown_at = Some(self.phase_start);
                    let next = self.after_fall();
                    self.enter(next);
                }
                DropPhase::Bouncing => {
                    let duration = DropCurve::bounce_duration_ms(self.current_bounce_height);
                    let t = self.elapsed - self.phase_start;
                    if t < duration {
                        y = self.target_y + self.current_bounce_height * bounce_arc(t / duration);
                        break;
                    }
                    self.phase_start += duration;
                    self.current_bounce += 1;
                    self.current_bounce_height *= self.curve.damping;
                    if self.current_bounce >= self.curve.bounce_count
                        || self.current_bounce_height <= MIN_BOUNCE_HEIGHT
                    {
                        self.enter(DropPhase::Wobbling);
                    }
                }
                DropPhase::Wobbling => {
                    if self.wobble_elapsed() >= self.curve.wobble_ms {
                        self.enter(DropPhase::Done);
                    }
                    break;
                }
                DropPhase::Done => break,
            }
        }

        if self.phase == DropPhase::Done {
            return Some(DropFrame {
                y: self.target_y,
                rotation: self.initial_rotation,
                phase: DropPhase::Done,
            });
        }

        Some(DropFrame {
            y,
            rotation: self.wobble_rotation(),
            phase: self.phase,
        })
    }

    fn after_fall(&self) -> DropPhase {
        if self.curve.is_settled() {
            DropPhase::Done
        } else if self.curve.bounce_count > 0 && self.current_bounce_height > MIN_BOUNCE_HEIGHT {
            DropPhase::Bouncing
        } else {
            DropPhase::Wobbling
        }
    }

    fn enter(&mut self, phase: DropPhase) {
        debug!(from = ?self.phase, to = ?phase, elapsed_ms = self.elapsed, "drop phase");
        self.phase = phase;
    }

    fn wobble_elapsed(&self) -> f32 {
        self.touchdown_at.map_or(0.0, |t| self.elapsed - t)
    }

    fn wobble_rotation(&self) -> Vec3 {
        if self.touchdown_at.is_none() {
            return self.initial_rotation;
        }
        let t = self.wobble_elapsed();
        let progress = (t / self.curve.wobble_ms).min(1.0);
        let decay = (1.0 - progress) * (1.0 - progress);
        let amplitude = self.curve.wobble_amplitude * decay;
        let secs = t / 1000.0;
        let hz = self.curve.wobble_hz;

        Vec3::new(
            self.initial_rotation.x + amplitude * (TAU * hz * secs).sin(),
            self.initial_rotation.y,
            self.initial_rotation.z + amplitude * 0.7 * (TAU * hz * 1.3 * secs).sin(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_MS: f32 = 16.0;

    /// Run to completion; returns (frames, done frames seen, last frame)
    fn run(anim: &mut DropAnimation, max_frames: usize) -> (usize, usize, Option<DropFrame>) {
        let mut frames = 0;
        let mut done = 0;
        let mut last = None;
        while frames < max_frames {
            match anim.advance(FRAME_MS) {
                Some(frame) => {
                    frames += 1;
                    if frame.phase == DropPhase::Done {
                        done += 1;
                    }
                    last = Some(frame);
                }
                None => break,
            }
        }
        (frames, done, last)
    }

    #[test]
    fn test_fall_time_clamped() {
        assert_eq!(DropCurve::fall_time_ms(0.01), 200.0);
        assert_eq!(DropCurve::fall_time_ms(100.0), 800.0);
        let mid = DropCurve::fall_time_ms(1.0);
        let expected = (2.0 / GRAVITY).sqrt() * 700.0;
        assert!((mid - expected).abs() < 1e-3);
    }

    #[test]
    fn test_bounce_height_non_increasing_in_mass() {
        let heights: Vec<f32> = [0.5, 1.0, 2.0, 5.0]
            .iter()
            .map(|&m| DropCurve::bounce_height(2.0, m))
            .collect();
        for pair in heights.windows(2) {
            assert!(pair[1] <= pair[0], "{heights:?}");
        }
        assert!((heights[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_bounce_count_formula() {
        assert_eq!(DropCurve::bounce_count(1.0), 3);
        assert_eq!(DropCurve::bounce_count(0.5), 5);
        assert_eq!(DropCurve::bounce_count(10.0), 2);
        // tiny masses are floored at 0.1, not clamped further
        assert_eq!(DropCurve::bounce_count(0.01), 17);
    }

    #[test]
    fn test_settled_completes_first_tick() {
        let rot = Vec3::new(0.1, 0.2, 0.3);
        let mut anim = DropAnimation::new(1.0005, 1.0, 1.0, rot);
        let frame = anim.advance(FRAME_MS).unwrap();
        assert_eq!(frame.phase, DropPhase::Done);
        assert_eq!(frame.y, 1.0);
        assert_eq!(frame.rotation, rot);
        assert_eq!(anim.current_bounce(), 0);
        assert!(anim.advance(FRAME_MS).is_none());
    }

    #[test]
    fn test_settled_completes_on_zero_delta() {
        let mut anim = DropAnimation::new(0.0, 0.0, 1.0, Vec3::ZERO);
        assert_eq!(anim.advance(0.0).unwrap().phase, DropPhase::Done);
    }

    #[test]
    fn test_completes_exactly_once_for_all_inputs() {
        let rot = Vec3::new(0.0, 1.2, -0.4);
        for &start in &[0.0_f32, 0.5, 1.0, 3.0, 25.0] {
            for &target in &[0.0_f32, -0.25, 0.75] {
                for &mass in &[0.05_f32, 0.5, 1.0, 2.0, 5.0, 40.0] {
                    let mut anim = DropAnimation::new(start, target, mass, rot);
                    let (frames, done, last) = run(&mut anim, 100_000);
                    assert!(frames > 0);
                    assert_eq!(done, 1, "start={start} target={target} mass={mass}");
                    let last = last.unwrap();
                    assert_eq!(last.phase, DropPhase::Done);
                    assert_eq!(last.y, target);
                    assert_eq!(last.rotation, rot);
                }
            }
        }
    }

    #[test]
    fn test_falls_monotonically_then_bounces() {
        let mut anim = DropAnimation::new(2.0, 0.0, 1.0, Vec3::ZERO);
        let fall_ms = anim.curve().fall_ms;
        let mut last_y = 2.0;
        let mut t = 0.0;
        while t + FRAME_MS < fall_ms {
            let frame = anim.advance(FRAME_MS).unwrap();
            t += FRAME_MS;
            assert_eq!(frame.phase, DropPhase::Falling);
            assert!(frame.y <= last_y);
            assert_eq!(frame.rotation, Vec3::ZERO);
            last_y = frame.y;
        }

        let mut saw_bounce = false;
        while let Some(frame) = anim.advance(FRAME_MS) {
            if frame.phase == DropPhase::Bouncing {
                saw_bounce = true;
                assert!(frame.y >= 0.0);
                assert!(frame.y <= anim.curve().bounce_height + 1e-6);
            }
        }
        assert!(saw_bounce);
    }

    #[test]
    fn test_wobble_starts_at_touchdown() {
        let mut anim = DropAnimation::new(2.0, 0.0, 1.0, Vec3::ZERO);
        let fall_ms = anim.curve().fall_ms;
        let frame = anim.advance(fall_ms + 10.0).unwrap();
        assert_eq!(frame.phase, DropPhase::Bouncing);
        assert_ne!(frame.rotation.x, 0.0);
        assert_eq!(frame.rotation.y, 0.0);
    }

    #[test]
    fn test_bounce_train_ends_on_count() {
        let mut anim = DropAnimation::new(5.0, 0.0, 1.0, Vec3::ZERO);
        while let Some(frame) = anim.advance(FRAME_MS) {
            if frame.phase != DropPhase::Falling && frame.phase != DropPhase::Bouncing {
                break;
            }
        }
        assert!(
            anim.current_bounce() >= anim.curve().bounce_count
                || anim.current_bounce_height() <= MIN_BOUNCE_HEIGHT
        );
    }

    #[test]
    fn test_cancel_stops_writes() {
        let mut anim = DropAnimation::new(2.0, 0.0, 1.0, Vec3::ZERO);
        assert!(anim.advance(FRAME_MS).is_some());
        anim.cancel();
        assert!(!anim.is_active());
        assert!(anim.advance(FRAME_MS).is_none());
    }

    #[test]
    fn test_single_huge_step_finishes() {
        let mut anim = DropAnimation::new(3.0, 0.0, 0.5, Vec3::ZERO);
        let frame = anim.advance(1.0e6).unwrap();
        assert_eq!(frame.phase, DropPhase::Done);
        assert_eq!(frame.y, 0.0);
    }
}
