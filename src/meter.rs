//! Score readout: rolling distance, achievement flashes, session high score.

use crate::draw::{Dimensions, FADED, INK, PixelBuf, draw_text};

/// Displayed distance is the raw distance scaled down.
const COEFFICIENT: f64 = 0.025;
/// Digits shown; also caps the representable score.
const MAX_DISTANCE_UNITS: u32 = 5;
/// Every multiple of this (in display units) is an achievement.
const ACHIEVEMENT_DISTANCE: u32 = 100;
/// Flash cadence and repetition after an achievement.
const FLASH_DURATION: f64 = 250.0;
const FLASH_ITERATIONS: u32 = 3;
/// Logical width reserved per digit.
const DIGIT_DEST_WIDTH: f64 = 11.0;
const Y_POS: f64 = 10.0;

pub struct DistanceMeter {
    pub x_pos: f64,
    pub max_score: u32,
    display_value: u32,
    high_score: Option<u32>,
    achievement: bool,
    flash_timer: f64,
    flash_iterations: u32,
}

impl DistanceMeter {
    pub fn new(width: f64) -> Self {
        let mut meter = Self {
            x_pos: 0.0,
            max_score: 10u32.pow(MAX_DISTANCE_UNITS) - 1,
            display_value: 0,
            high_score: None,
            achievement: false,
            flash_timer: 0.0,
            flash_iterations: 0,
        };
        meter.calc_x_pos(width);
        meter
    }

    /// Right-align the readout to the canvas width.
    pub fn calc_x_pos(&mut self, width: f64) {
        self.x_pos = width - DIGIT_DEST_WIDTH * (MAX_DISTANCE_UNITS + 1) as f64;
    }

    /// Raw distance to display units.
    pub fn get_actual_distance(&self, distance: f64) -> u32 {
        (distance * COEFFICIENT).round() as u32
    }

    /// Advance the readout. Returns true exactly when a new achievement
    /// milestone is crossed, so the caller can play the score cue.
    pub fn update(&mut self, delta: f64, distance: u32) -> bool {
        let mut play_sound = false;
        if !self.achievement {
            let actual = self.get_actual_distance(distance as f64);
            if actual > 0 && actual % ACHIEVEMENT_DISTANCE == 0 && actual != self.display_value {
                self.achievement = true;
                self.flash_timer = 0.0;
                self.flash_iterations = 0;
                play_sound = true;
            }
            self.display_value = actual;
        } else {
            // Flash: the readout holds the milestone value and blinks.
            self.flash_timer += delta;
            if self.flash_timer >= FLASH_DURATION * 2.0 {
                self.flash_timer = 0.0;
                self.flash_iterations += 1;
                if self.flash_iterations >= FLASH_ITERATIONS {
                    self.achievement = false;
                }
            }
        }
        play_sound
    }

    /// Stop an in-progress flash (the crash readout should hold steady).
    pub fn cancel_flash(&mut self) {
        self.achievement = false;
    }

    /// Record a new session best, in raw distance units.
    pub fn set_high_score(&mut self, raw: u32) {
        self.high_score = Some(self.get_actual_distance(raw as f64));
    }

    pub fn reset(&mut self) {
        self.display_value = 0;
        self.achievement = false;
        self.flash_timer = 0.0;
        self.flash_iterations = 0;
    }

    pub fn draw(&self, buf: &mut PixelBuf, dims: &Dimensions) {
        let px = dims.glyph_px();
        let x = (self.x_pos * dims.scale).round() as i32;
        let y = (Y_POS * dims.scale).round() as i32;

        let flashing_off = self.achievement && self.flash_timer >= FLASH_DURATION;
        if !flashing_off {
            let score = format!("{:0width$}", self.display_value, width = MAX_DISTANCE_UNITS as usize);
            draw_text(buf, x, y, &score, px, INK);
        }

        if let Some(high) = self.high_score {
            let label = format!("HI {:0width$}", high, width = MAX_DISTANCE_UNITS as usize);
            let hi_x = (self.high_score_x() * dims.scale).round() as i32;
            draw_text(buf, hi_x, y, &label, px, FADED);
        }
    }

    /// Logical x of the "HI" readout: one label width plus a two-slot gap
    /// left of the score.
    fn high_score_x(&self) -> f64 {
        self.x_pos - DIGIT_DEST_WIDTH * (MAX_DISTANCE_UNITS + 5) as f64
    }
}
