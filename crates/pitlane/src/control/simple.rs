use super::driver::Driver;
use super::pid::Pid;
use crate::net::{AngleLayout, DriveCommand, TRACK_SENSOR_COUNT, VehicleState, WHEEL_COUNT};

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Consecutive ticks with a large heading angle before the car counts as stuck.
    pub stuck_ticks: u32,
    /// rad
    pub stuck_angle: f64,
    /// rad, maximum wheel angle the server maps a steering command of 1 onto.
    pub steer_lock: f64,

    /// rpm above which to shift up, indexed by current gear - 1.
    pub gear_up: [f64; 6],
    /// rpm below which to shift down, indexed by current gear - 1.
    pub gear_down: [f64; 6],

    /// m, a straight is assumed when the centre sensor sees further than this.
    pub max_speed_dist: f64,
    /// km/h
    pub max_speed: f64,
    pub sin5: f64,
    pub cos5: f64,
    /// Accelerator used while off the track.
    pub off_track_accel: f64,

    /// m, front-left, front-right, rear-left, rear-right.
    pub wheel_radius: [f64; WHEEL_COUNT],
    /// m/s
    pub abs_slip: f64,
    pub abs_range: f64,
    /// m/s
    pub abs_min_speed: f64,

    pub clutch_max: f64,
    pub clutch_delta: f64,
    pub clutch_dec: f64,
    /// Multiplier on the clutch decay in first gear and neutral.
    pub clutch_low_gear_factor: f64,
    /// s, lap time until which the clutch is held at its maximum in first gear.
    pub clutch_max_time: f64,

    pub steer_kp: f64,
    pub steer_ki: f64,
    pub steer_kd: f64,
    /// s, one server tick.
    pub steer_dt: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            stuck_ticks: 25,
            stuck_angle: 0.523598775,
            steer_lock: 0.785398,

            gear_up: [5000.0, 6000.0, 6000.0, 6500.0, 7000.0, 0.0],
            gear_down: [0.0, 2500.0, 3000.0, 3000.0, 3500.0, 3500.0],

            max_speed_dist: 70.0,
            max_speed: 300.0,
            sin5: 0.08716,
            cos5: 0.99619,
            off_track_accel: 0.3,

            wheel_radius: [0.3179, 0.3179, 0.3276, 0.3276],
            abs_slip: 2.0,
            abs_range: 3.0,
            abs_min_speed: 3.0,

            clutch_max: 0.5,
            clutch_delta: 0.05,
            clutch_dec: 0.01,
            clutch_low_gear_factor: 50.0,
            clutch_max_time: 1.5,

            steer_kp: 4.0,
            steer_ki: 1.5,
            steer_kd: 0.01,
            steer_dt: 0.1,
        }
    }
}

/// Heuristic racing policy: rpm-table gear shifts, PID steering toward the track axis,
/// speed targets from the forward range finders, ABS, and a stuck-car recovery.
#[derive(Debug, Clone)]
pub struct SimpleDriver {
    config: DriverConfig,
    steer_pid: Pid,
    stuck: u32,
    clutch: f64,
}

impl Default for SimpleDriver {
    fn default() -> Self {
        Self::new(DriverConfig::default())
    }
}

impl SimpleDriver {
    pub fn new(config: DriverConfig) -> Self {
        let steer_pid = Pid::new(
            config.steer_kp,
            config.steer_ki,
            config.steer_kd,
            0.0,
            config.steer_dt,
        );

        Self {
            config,
            steer_pid,
            stuck: 0,
            clutch: 0.0,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn stuck_ticks(&self) -> u32 {
        self.stuck
    }

    pub fn is_recovering(&self) -> bool {
        self.stuck > self.config.stuck_ticks
    }

    pub fn clutch(&self) -> f64 {
        self.clutch
    }

    fn gear(&self, state: &VehicleState) -> i32 {
        if state.gear < 1 {
            return 1;
        }

        let gear = state.gear.min(6);
        let index = (gear - 1) as usize;

        if gear < 6 && state.rpm >= self.config.gear_up[index] {
            gear + 1
        } else if gear > 1 && state.rpm <= self.config.gear_down[index] {
            gear - 1
        } else {
            gear
        }
    }

    fn steer(&mut self, state: &VehicleState) -> f64 {
        let track = &state.track;
        let measured = state.angle / std::f64::consts::PI
            + (track[6] - track[12]) / 180.0
            + (track[7] - track[11]) / 250.0
            - state.track_position / 7.0;

        let output = self.steer_pid.compute(measured);
        (-output / 4.0).clamp(-1.0, 1.0)
    }

    /// Positive values are throttle, negative values are brake demand.
    fn accel(&self, state: &VehicleState) -> f64 {
        let cfg = &self.config;
        if state.track_position.abs() >= 1.0 {
            return cfg.off_track_accel;
        }

        let right = state.track[10];
        let centre = state.track[9];
        let left = state.track[8];

        let target_speed = if centre > cfg.max_speed_dist || (centre >= right && centre >= left) {
            cfg.max_speed
        } else {
            // approximate the turn angle toward the more open side
            let side = right.max(left);
            let h = centre * cfg.sin5;
            let b = side - centre * cfg.cos5;
            let sin_angle = b * b / (h * h + b * b);
            cfg.max_speed * (centre * sin_angle / cfg.max_speed_dist)
        };

        2.0 / (1.0 + (state.speed_x - target_speed).exp()) - 1.0
    }

    fn filter_abs(&self, state: &VehicleState, brake: f64) -> f64 {
        let cfg = &self.config;
        let speed = state.speed_x / 3.6;
        if speed < cfg.abs_min_speed {
            return brake;
        }

        let wheel_speed: f64 = state
            .wheel_spin_velocity
            .iter()
            .zip(cfg.wheel_radius.iter())
            .map(|(spin, radius)| spin * radius)
            .sum();
        let slip = speed - wheel_speed / WHEEL_COUNT as f64;

        let brake = if slip > cfg.abs_slip {
            brake - (slip - cfg.abs_slip) / cfg.abs_range
        } else {
            brake
        };

        brake.max(0.0)
    }

    fn update_clutch(&mut self, state: &VehicleState) {
        let cfg = &self.config;
        let mut delta = cfg.clutch_delta;

        if state.gear < 2 {
            delta *= cfg.clutch_low_gear_factor;
            if state.current_lap_time < cfg.clutch_max_time {
                self.clutch = cfg.clutch_max;
            }
        }

        if self.clutch != cfg.clutch_max {
            self.clutch = (self.clutch - delta).max(0.0);
        } else {
            self.clutch -= cfg.clutch_dec;
        }
    }

    fn recover(&mut self, state: &VehicleState) -> DriveCommand {
        let mut steering = -state.angle / self.config.steer_lock;
        let mut gear = -1;

        // pointing back toward the track: drive forward instead of reversing
        if state.angle * state.track_position > 0.0 {
            gear = 1;
            steering = -steering;
        }

        self.update_clutch(state);

        DriveCommand {
            accelerator: 1.0,
            brake: 0.0,
            clutch: self.clutch,
            gear,
            steering,
            ..DriveCommand::default()
        }
    }
}

impl Driver for SimpleDriver {
    /// Dense around the forward direction, 15° steps toward the sides.
    fn init_angles(&self) -> AngleLayout {
        let mut angles = [0.0; TRACK_SENSOR_COUNT];
        let last = TRACK_SENSOR_COUNT - 1;

        for i in 0..5 {
            angles[i] = -90.0 + i as f64 * 15.0;
            angles[last - i] = 90.0 - i as f64 * 15.0;
        }
        for i in 5..9 {
            angles[i] = -20.0 + (i - 5) as f64 * 5.0;
            angles[last - i] = 20.0 - (i - 5) as f64 * 5.0;
        }
        angles[9] = 0.0;
        angles
    }

    fn control(&mut self, state: &VehicleState) -> DriveCommand {
        if state.angle.abs() > self.config.stuck_angle {
            self.stuck = self.stuck.saturating_add(1);
        } else {
            self.stuck = 0;
        }

        if self.is_recovering() {
            if self.stuck == self.config.stuck_ticks + 1 {
                log::info!("Car stuck at angle {:.3} rad, starting recovery", state.angle);
            }
            return self.recover(state);
        }

        let accel_and_brake = self.accel(state);
        let gear = self.gear(state);
        let steering = self.steer(state);

        let (accelerator, brake) = if accel_and_brake > 0.0 {
            (accel_and_brake, 0.0)
        } else {
            (0.0, self.filter_abs(state, -accel_and_brake))
        };

        self.update_clutch(state);

        DriveCommand {
            accelerator,
            brake,
            clutch: self.clutch,
            gear,
            steering,
            ..DriveCommand::default()
        }
    }
}
