/// Single-variable PID filter driven once per simulation tick.
///
/// The sampling interval is fixed at construction rather than measured between calls,
/// since the server advances the simulation at a constant tick rate.
#[derive(Debug, Clone)]
pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,
    set_point: f64,
    dt: f64,
    max_integral: f64,
    max_derivative: f64,
    integral: f64,
    derivative: f64,
    last_error: f64,
}

impl Pid {
    pub const DEFAULT_TERM_LIMIT: f64 = 1.0;

    pub fn new(kp: f64, ki: f64, kd: f64, set_point: f64, dt: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            set_point,
            dt,
            max_integral: Self::DEFAULT_TERM_LIMIT,
            max_derivative: Self::DEFAULT_TERM_LIMIT,
            integral: 0.0,
            derivative: 0.0,
            last_error: 0.0,
        }
    }

    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.max_integral = limit.abs();
        self
    }

    pub fn with_derivative_limit(mut self, limit: f64) -> Self {
        self.max_derivative = limit.abs();
        self
    }

    pub fn compute(&mut self, measured: f64) -> f64 {
        let error = self.set_point - measured;

        self.integral = (self.integral + error * self.dt).clamp(-self.max_integral, self.max_integral);
        self.derivative =
            ((error - self.last_error) / self.dt).clamp(-self.max_derivative, self.max_derivative);
        self.last_error = error;

        self.kp * error + self.ki * self.integral + self.kd * self.derivative
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.derivative = 0.0;
        self.last_error = 0.0;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn derivative(&self) -> f64 {
        self.derivative
    }

    pub fn last_error(&self) -> f64 {
        self.last_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_settles_at_set_point() {
        let mut pid = Pid::new(4.0, 1.5, 0.01, 0.0, 0.1);

        let mut output = f64::MAX;
        for _ in 0..50 {
            output = pid.compute(0.0);
        }

        assert_eq!(output, 0.0);
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.derivative(), 0.0);
    }

    #[test]
    fn test_integral_stops_growing_once_error_vanishes() {
        let mut pid = Pid::new(4.0, 1.5, 0.01, 0.0, 0.1);

        pid.compute(0.3);
        pid.compute(0.3);
        let held = pid.integral();

        for _ in 0..20 {
            pid.compute(0.0);
            assert_eq!(pid.integral(), held);
        }
    }

    #[test]
    fn test_integral_windup_is_bounded() {
        let mut pid = Pid::new(4.0, 1.5, 0.01, 0.0, 0.1);

        for _ in 0..10_000 {
            pid.compute(-5.0);
            assert!(pid.integral() <= 1.0);
        }
        assert_eq!(pid.integral(), 1.0);

        for _ in 0..10_000 {
            pid.compute(5.0);
            assert!(pid.integral() >= -1.0);
        }
        assert_eq!(pid.integral(), -1.0);
    }

    #[test]
    fn test_derivative_is_clamped() {
        let mut pid = Pid::new(0.0, 0.0, 1.0, 0.0, 0.1);

        // error jumps from 0 to -10 in one tick: raw derivative -100
        let output = pid.compute(10.0);

        assert_eq!(pid.derivative(), -1.0);
        assert_eq!(output, -1.0);
    }

    #[test]
    fn test_custom_limits() {
        let mut pid = Pid::new(0.0, 1.0, 0.0, 0.0, 1.0)
            .with_integral_limit(0.25)
            .with_derivative_limit(2.0);

        pid.compute(-3.0);
        assert_eq!(pid.integral(), 0.25);
        assert_eq!(pid.derivative(), 2.0);
    }

    #[test]
    fn test_proportional_response() {
        let mut pid = Pid::new(2.0, 0.0, 0.0, 1.0, 0.1);
        assert!((pid.compute(0.5) - 1.0).abs() < 1e-12);
        assert!((pid.last_error() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reset_clears_memory() {
        let mut pid = Pid::new(4.0, 1.5, 0.01, 0.0, 0.1);
        pid.compute(0.7);
        pid.reset();

        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.last_error(), 0.0);
    }
}
