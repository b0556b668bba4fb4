use std::fmt::Write;

/// Actuator demands for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveCommand {
    pub accelerator: f64,
    pub brake: f64,
    pub clutch: f64,
    pub gear: i32,
    pub steering: f64,
    pub restart: bool,
    /// Focus sensor direction, degrees.
    pub focus: i32,
}

impl Default for DriveCommand {
    fn default() -> Self {
        Self {
            accelerator: 0.0,
            brake: 0.0,
            clutch: 0.0,
            gear: 0,
            steering: 0.0,
            restart: false,
            focus: 0,
        }
    }
}

impl DriveCommand {
    pub const MIN_GEAR: i32 = -1;
    pub const MAX_GEAR: i32 = 6;
    pub const MAX_FOCUS: i32 = 90;

    /// Copy of the command with every field forced into its legal range.
    ///
    /// NaN pedals or steering become 0.
    pub fn clamped(&self) -> Self {
        Self {
            accelerator: clamp_unit(self.accelerator, 0.0),
            brake: clamp_unit(self.brake, 0.0),
            clutch: clamp_unit(self.clutch, 0.0),
            gear: self.gear.clamp(Self::MIN_GEAR, Self::MAX_GEAR),
            steering: clamp_unit(self.steering, -1.0),
            restart: self.restart,
            focus: self.focus.clamp(-Self::MAX_FOCUS, Self::MAX_FOCUS),
        }
    }

    /// Clamps and renders the command as one wire line, replacing the contents of `out`.
    pub fn encode_into(&self, out: &mut String) {
        let c = self.clamped();
        out.clear();
        let _ = write!(
            out,
            "(accel {}) (brake {}) (clutch {}) (gear {}) (steer {}) (meta {}) (focus {})",
            c.accelerator,
            c.brake,
            c.clutch,
            c.gear,
            c.steering,
            u8::from(c.restart),
            c.focus
        );
    }

    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(96);
        self.encode_into(&mut out);
        out
    }
}

// negative zero is folded into 0 so the wire never carries "-0"
fn clamp_unit(value: f64, min: f64) -> f64 {
    if value.is_nan() || value == 0.0 {
        0.0
    } else {
        value.clamp(min, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<'a>(line: &'a str, key: &str) -> &'a str {
        let start = line.find(&format!("({} ", key)).unwrap() + key.len() + 2;
        let end = start + line[start..].find(')').unwrap();
        &line[start..end]
    }

    #[test]
    fn test_encode_clamps_and_formats() {
        let command = DriveCommand {
            accelerator: 5.0,
            brake: 0.5,
            clutch: 0.35,
            gear: 5,
            steering: 1.0,
            restart: false,
            focus: 45,
        };

        assert_eq!(
            command.encode(),
            "(accel 1) (brake 0.5) (clutch 0.35) (gear 5) (steer 1) (meta 0) (focus 45)"
        );
    }

    #[test]
    fn test_encode_restart_flag() {
        let command = DriveCommand {
            restart: true,
            ..DriveCommand::default()
        };
        assert_eq!(
            command.encode(),
            "(accel 0) (brake 0) (clutch 0) (gear 0) (steer 0) (meta 1) (focus 0)"
        );
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let wild = [
            (-3.0, 7.0, -0.1, -4, -2.5, -180),
            (1.5, -1.0, 2.0, 9, 3.0, 135),
            (f64::NAN, f64::INFINITY, f64::NEG_INFINITY, i32::MIN, f64::NAN, i32::MAX),
        ];

        for (accelerator, brake, clutch, gear, steering, focus) in wild {
            let line = DriveCommand {
                accelerator,
                brake,
                clutch,
                gear,
                steering,
                restart: false,
                focus,
            }
            .encode();

            for key in ["accel", "brake", "clutch"] {
                let value: f64 = field(&line, key).parse().unwrap();
                assert!((0.0..=1.0).contains(&value), "{} out of range in {}", key, line);
            }
            let steer: f64 = field(&line, "steer").parse().unwrap();
            assert!((-1.0..=1.0).contains(&steer));
            let gear: i32 = field(&line, "gear").parse().unwrap();
            assert!((-1..=6).contains(&gear));
            let focus: i32 = field(&line, "focus").parse().unwrap();
            assert!((-90..=90).contains(&focus));
            assert_eq!(field(&line, "meta"), "0");
        }
    }

    #[test]
    fn test_encode_into_reuses_buffer() {
        let mut out = String::from("stale contents");
        DriveCommand {
            steering: -0.25,
            gear: -1,
            ..DriveCommand::default()
        }
        .encode_into(&mut out);

        assert!(out.starts_with("(accel 0) "));
        assert!(out.contains("(gear -1)"));
        assert!(out.contains("(steer -0.25)"));
        assert!(!out.contains("stale"));
    }

    #[test]
    fn test_negative_zero_encodes_as_zero() {
        let command = DriveCommand {
            accelerator: -0.0,
            brake: -0.0,
            clutch: -0.0,
            steering: -0.0,
            ..DriveCommand::default()
        };
        assert_eq!(
            command.encode(),
            "(accel 0) (brake 0) (clutch 0) (gear 0) (steer 0) (meta 0) (focus 0)"
        );
    }

    #[test]
    fn test_fractions_keep_full_precision() {
        let command = DriveCommand {
            accelerator: 0.123456789012,
            ..DriveCommand::default()
        };
        let line = command.encode();
        let accel: f64 = field(&line, "accel").parse().unwrap();
        assert_eq!(accel, 0.123456789012);
    }
}
