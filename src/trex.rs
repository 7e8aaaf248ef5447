//! The player character: jump physics and run/crash animation.

use crate::config::{self, RunnerConfig};
use crate::draw::{BACKGROUND, Canvas, INK};

pub const WIDTH: f64 = 44.0;
pub const HEIGHT: f64 = 47.0;
/// Fixed horizontal position on the canvas.
pub const X_POS: f64 = 25.0;

/// Animation frame interval while running, in ms.
const RUN_FRAME_MS: f64 = 100.0;
/// Blink-ish idle frame interval, in ms.
const WAIT_FRAME_MS: f64 = 1000.0 / 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Waiting,
    Running,
    Jumping,
    Crashed,
}

/// The subset of tunables the actor owns; debug overrides propagate here.
#[derive(Clone, Copy, Debug)]
pub struct TrexConfig {
    pub gravity: f64,
    pub min_jump_height: f64,
    pub speed_drop_coefficient: f64,
    pub drop_velocity: f64,
}

pub struct Trex {
    pub config: TrexConfig,
    pub x_pos: f64,
    pub y_pos: f64,
    ground_y: f64,
    pub status: Status,
    pub jumping: bool,
    pub speed_drop: bool,
    pub jump_count: u32,
    jump_velocity: f64,
    initial_jump_velocity: f64,
    reached_min_height: bool,
    anim_timer: f64,
    anim_frame: usize,
}

impl Trex {
    pub fn new(config: &RunnerConfig) -> Self {
        let ground_y = config::HEIGHT - HEIGHT - config.bottom_pad;
        Self {
            config: TrexConfig {
                gravity: config.gravity,
                min_jump_height: config.min_jump_height,
                speed_drop_coefficient: config.speed_drop_coefficient,
                drop_velocity: -config.initial_jump_velocity / 2.0,
            },
            x_pos: X_POS,
            y_pos: ground_y,
            ground_y,
            status: Status::Waiting,
            jumping: false,
            speed_drop: false,
            jump_count: 0,
            jump_velocity: 0.0,
            // Negative velocity is upwards in canvas coordinates.
            initial_jump_velocity: -config.initial_jump_velocity,
            reached_min_height: false,
            anim_timer: 0.0,
            anim_frame: 0,
        }
    }

    pub fn start_jump(&mut self) {
        if !self.jumping {
            self.status = Status::Jumping;
            self.jump_velocity = self.initial_jump_velocity;
            self.jumping = true;
            self.reached_min_height = false;
            self.speed_drop = false;
            self.jump_count += 1;
        }
    }

    /// Releasing the jump early caps the ascent, giving variable jump
    /// height.
    pub fn end_jump(&mut self) {
        if self.reached_min_height && self.jump_velocity < self.config.drop_velocity {
            self.jump_velocity = self.config.drop_velocity;
        }
    }

    /// Accelerated descent while airborne.
    pub fn set_speed_drop(&mut self) {
        self.speed_drop = true;
        self.jump_velocity = 1.0;
    }

    pub fn set_jump_velocity(&mut self, velocity: f64) {
        self.initial_jump_velocity = -velocity;
        self.config.drop_velocity = -velocity / 2.0;
    }

    /// Integrate the jump by wall-clock delta, expressed in nominal frames
    /// so the tunables keep their per-frame meaning.
    pub fn update_jump(&mut self, delta: f64, ms_per_frame: f64) {
        let frames = delta / ms_per_frame;
        if self.speed_drop {
            self.y_pos += self.jump_velocity * self.config.speed_drop_coefficient * frames;
        } else {
            self.y_pos += self.jump_velocity * frames;
        }
        self.jump_velocity += self.config.gravity * frames;

        if self.y_pos < self.ground_y - self.config.min_jump_height || self.speed_drop {
            self.reached_min_height = true;
        }
        if self.y_pos >= self.ground_y {
            // Back on the ground.
            self.y_pos = self.ground_y;
            self.jump_velocity = 0.0;
            self.jumping = false;
            self.speed_drop = false;
            self.status = Status::Running;
        }
    }

    /// Advance the idle/run animation, optionally forcing a status.
    pub fn update(&mut self, delta: f64, status: Option<Status>) {
        if let Some(status) = status {
            self.status = status;
            self.anim_timer = 0.0;
            self.anim_frame = 0;
        }
        self.anim_timer += delta;
        let frame_ms = match self.status {
            Status::Waiting => WAIT_FRAME_MS,
            Status::Running => RUN_FRAME_MS,
            Status::Jumping | Status::Crashed => return,
        };
        if self.anim_timer >= frame_ms {
            self.anim_timer = 0.0;
            self.anim_frame = (self.anim_frame + 1) % 2;
        }
    }

    pub fn reset(&mut self) {
        self.y_pos = self.ground_y;
        self.jump_velocity = 0.0;
        self.jumping = false;
        self.speed_drop = false;
        self.jump_count = 0;
        self.reached_min_height = false;
        self.update(0.0, Some(Status::Running));
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        let x = self.x_pos;
        let y = self.y_pos;

        // Tail and body.
        canvas.rect(x, y + 18.0, 8.0, 10.0, INK);
        canvas.rect(x + 6.0, y + 14.0, 20.0, 20.0, INK);
        // Neck and head.
        canvas.rect(x + 20.0, y + 8.0, 8.0, 10.0, INK);
        canvas.rect(x + 22.0, y, 20.0, 13.0, INK);
        // Arm.
        canvas.rect(x + 26.0, y + 20.0, 7.0, 3.0, INK);

        if self.status == Status::Crashed {
            // Wide-open eye and dropped jaw.
            canvas.rect(x + 27.0, y + 3.0, 5.0, 5.0, BACKGROUND);
            canvas.rect(x + 29.0, y + 5.0, 2.0, 2.0, INK);
            canvas.rect(x + 32.0, y + 10.0, 10.0, 3.0, BACKGROUND);
        } else {
            canvas.rect(x + 28.0, y + 3.0, 3.0, 3.0, BACKGROUND);
        }

        // Legs: alternate while running, both planted otherwise.
        let (back_up, front_up) = match self.status {
            Status::Running => (self.anim_frame == 0, self.anim_frame == 1),
            _ => (false, false),
        };
        let back_h = if back_up { 9.0 } else { 13.0 };
        let front_h = if front_up { 9.0 } else { 13.0 };
        canvas.rect(x + 10.0, y + 34.0, 4.0, back_h, INK);
        canvas.rect(x + 20.0, y + 34.0, 4.0, front_h, INK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trex() -> Trex {
        Trex::new(&RunnerConfig::default())
    }

    #[test]
    fn start_jump_only_from_ground() {
        let mut t = trex();
        assert!(!t.jumping);
        t.start_jump();
        assert!(t.jumping);
        assert_eq!(t.jump_count, 1);
        t.start_jump();
        assert_eq!(t.jump_count, 1, "restart of an in-flight jump");
    }

    #[test]
    fn jump_rises_then_lands() {
        let config = RunnerConfig::default();
        let mut t = trex();
        let ground = t.y_pos;
        t.start_jump();
        t.update_jump(16.0, config.ms_per_frame());
        assert!(t.y_pos < ground, "first integration step moves up");
        let mut steps = 0;
        while t.jumping && steps < 1000 {
            t.update_jump(16.0, config.ms_per_frame());
            steps += 1;
        }
        assert!(!t.jumping);
        assert_eq!(t.y_pos, ground);
        assert_eq!(t.status, Status::Running);
    }

    #[test]
    fn early_release_caps_ascent() {
        let config = RunnerConfig::default();
        let mut full = trex();
        let mut short = trex();
        full.start_jump();
        short.start_jump();

        let mut full_peak = full.y_pos;
        let mut short_peak = short.y_pos;
        let mut released = false;
        for _ in 0..1000 {
            if full.jumping {
                full.update_jump(16.0, config.ms_per_frame());
                full_peak = full_peak.min(full.y_pos);
            }
            if short.jumping {
                if !released && short.reached_min_height {
                    short.end_jump();
                    released = true;
                }
                short.update_jump(16.0, config.ms_per_frame());
                short_peak = short_peak.min(short.y_pos);
            }
            if !full.jumping && !short.jumping {
                break;
            }
        }
        assert!(released);
        assert!(
            short_peak > full_peak,
            "early release should peak lower (higher y)"
        );
    }

    #[test]
    fn speed_drop_falls_faster() {
        let config = RunnerConfig::default();
        let mut t = trex();
        t.start_jump();
        // A couple of airborne frames first, so the drop step cannot be
        // swallowed by the landing clamp.
        t.update_jump(16.0, config.ms_per_frame());
        t.update_jump(16.0, config.ms_per_frame());
        t.set_speed_drop();
        assert!(t.speed_drop);
        let before = t.y_pos;
        t.update_jump(16.0, config.ms_per_frame());
        assert!(t.y_pos > before, "speed drop descends immediately");
        assert!(t.jumping, "one drop step keeps the actor airborne");
    }

    #[test]
    fn reset_restores_ground_state() {
        let mut t = trex();
        t.start_jump();
        t.set_speed_drop();
        t.reset();
        assert!(!t.jumping);
        assert!(!t.speed_drop);
        assert_eq!(t.jump_count, 0);
        assert_eq!(t.status, Status::Running);
    }
}
