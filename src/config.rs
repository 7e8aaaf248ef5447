//! Tunable game constants.
//!
//! Everything simulates in logical canvas units: the canvas is always 150
//! units tall and the terminal size only changes the device scale, so the
//! tunables below keep their original meaning on any screen.

/// Logical canvas height.
pub const HEIGHT: f64 = 150.0;

/// Reference canvas width. Narrower screens get the mobile speed scaling.
pub const DEFAULT_WIDTH: f64 = 600.0;

/// Nominal frame rate the per-frame tunables are expressed in.
pub const FPS: f64 = 60.0;

/// Duration of the intro width-expansion, in ms.
pub const INTRO_DURATION: f64 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerConfig {
    pub acceleration: f64,
    pub bg_cloud_speed: f64,
    pub bottom_pad: f64,
    pub clear_time: f64,
    pub cloud_frequency: f64,
    pub gameover_clear_time: f64,
    pub gap_coefficient: f64,
    pub gravity: f64,
    pub initial_jump_velocity: f64,
    pub max_clouds: usize,
    pub max_obstacle_length: u32,
    pub max_speed: f64,
    pub min_jump_height: f64,
    pub mobile_speed_coefficient: f64,
    pub speed: f64,
    pub speed_drop_coefficient: f64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            acceleration: 0.001,
            bg_cloud_speed: 0.2,
            bottom_pad: 10.0,
            clear_time: 3000.0,
            cloud_frequency: 0.5,
            gameover_clear_time: 750.0,
            gap_coefficient: 0.6,
            gravity: 0.6,
            initial_jump_velocity: 12.0,
            max_clouds: 6,
            max_obstacle_length: 3,
            max_speed: 12.0,
            min_jump_height: 35.0,
            mobile_speed_coefficient: 1.2,
            speed: 6.0,
            speed_drop_coefficient: 3.0,
        }
    }
}

impl RunnerConfig {
    pub fn ms_per_frame(&self) -> f64 {
        1000.0 / FPS
    }

    /// Debug override: returns a new config with the named setting replaced,
    /// or `None` for an unknown setting name. Settings go by uppercase
    /// names so tuning keys and logs read the same.
    pub fn with_setting(&self, name: &str, value: f64) -> Option<Self> {
        let mut config = *self;
        match name {
            "ACCELERATION" => config.acceleration = value,
            "BG_CLOUD_SPEED" => config.bg_cloud_speed = value,
            "BOTTOM_PAD" => config.bottom_pad = value,
            "CLEAR_TIME" => config.clear_time = value,
            "CLOUD_FREQUENCY" => config.cloud_frequency = value,
            "GAMEOVER_CLEAR_TIME" => config.gameover_clear_time = value,
            "GAP_COEFFICIENT" => config.gap_coefficient = value,
            "GRAVITY" => config.gravity = value,
            "INITIAL_JUMP_VELOCITY" => config.initial_jump_velocity = value,
            "MAX_SPEED" => config.max_speed = value,
            "MIN_JUMP_HEIGHT" => config.min_jump_height = value,
            "MOBILE_SPEED_COEFFICIENT" => config.mobile_speed_coefficient = value,
            "SPEED" => config.speed = value,
            "SPEED_DROP_COEFFICIENT" => config.speed_drop_coefficient = value,
            _ => return None,
        }
        Some(config)
    }
}
