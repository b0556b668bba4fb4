use std::str::FromStr;

use super::protocol::{FOCUS_SENSOR_COUNT, OPPONENT_SENSOR_COUNT, TRACK_SENSOR_COUNT, WHEEL_COUNT};

/// Per-tick sensor snapshot sent by the server.
///
/// One instance lives for the whole session and is decoded into in place; keys absent
/// from a message keep the value of the previous tick.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub gear: i32,
    pub race_position: i32,
    /// Angle between the car heading and the track axis, radians.
    pub angle: f64,
    pub current_lap_time: f64,
    pub damage: f64,
    pub distance_from_start: f64,
    pub distance_raced: f64,
    pub fuel: f64,
    pub last_lap_time: f64,
    pub rpm: f64,
    /// km/h
    pub speed_x: f64,
    pub speed_y: f64,
    pub speed_z: f64,
    /// 0 on the track axis, -1/+1 on the right/left edge, beyond that off the track.
    pub track_position: f64,
    pub z: f64,
    pub focus: [f64; FOCUS_SENSOR_COUNT],
    pub track: [f64; TRACK_SENSOR_COUNT],
    pub opponents: [f64; OPPONENT_SENSOR_COUNT],
    /// rad/s, front-left, front-right, rear-left, rear-right.
    pub wheel_spin_velocity: [f64; WHEEL_COUNT],
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            gear: 0,
            race_position: 0,
            angle: 0.0,
            current_lap_time: 0.0,
            damage: 0.0,
            distance_from_start: 0.0,
            distance_raced: 0.0,
            fuel: 0.0,
            last_lap_time: 0.0,
            rpm: 0.0,
            speed_x: 0.0,
            speed_y: 0.0,
            speed_z: 0.0,
            track_position: 0.0,
            z: 0.0,
            focus: [0.0; FOCUS_SENSOR_COUNT],
            track: [0.0; TRACK_SENSOR_COUNT],
            opponents: [0.0; OPPONENT_SENSOR_COUNT],
            wheel_spin_velocity: [0.0; WHEEL_COUNT],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unterminated group starting at byte {offset}")]
    Unterminated { offset: usize },
    #[error("{key}[{index}]: missing value")]
    MissingValue { key: String, index: usize },
    #[error("{key}[{index}]: invalid value {value:?}")]
    InvalidValue {
        key: String,
        index: usize,
        value: String,
    },
    #[error("{key}: expected {expected} value(s), found {found}")]
    UnexpectedArity {
        key: String,
        expected: usize,
        found: usize,
    },
}

/// What a single call to [`VehicleState::decode`] managed to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Recognised groups written into the snapshot.
    pub applied: usize,
    /// Groups whose key is not known to this client.
    pub ignored: usize,
    /// Scalars or array slots replaced with zero because their value was unusable.
    pub substituted: usize,
    /// Decoding stopped at a `(` without a matching `)`.
    pub unterminated: bool,
}

impl DecodeSummary {
    pub fn is_clean(&self) -> bool {
        self.substituted == 0 && !self.unterminated
    }
}

enum Slot<'a> {
    Int(&'a mut i32),
    Float(&'a mut f64),
    Array(&'a mut [f64]),
}

impl VehicleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best-effort decode of one `(key v1 .. vn)(key ..)` message.
    ///
    /// Never fails: unusable values are zeroed and logged, unknown keys are skipped, and
    /// an unterminated group ends the scan with everything before it already applied.
    pub fn decode(&mut self, message: &str) -> DecodeSummary {
        let mut summary = DecodeSummary::default();
        let mut offset = 0;

        while let Some(open) = message[offset..].find('(') {
            let start = offset + open + 1;
            let Some(len) = message[start..].find(')') else {
                log::warn!(
                    "{}",
                    DecodeError::Unterminated {
                        offset: start - 1
                    }
                );
                summary.unterminated = true;
                break;
            };

            self.apply_group(&message[start..start + len], &mut summary);
            offset = start + len + 1;
        }

        summary
    }

    fn slot(&mut self, key: &str) -> Option<Slot<'_>> {
        let slot = match key {
            "gear" => Slot::Int(&mut self.gear),
            "racePos" => Slot::Int(&mut self.race_position),
            "angle" => Slot::Float(&mut self.angle),
            "curLapTime" => Slot::Float(&mut self.current_lap_time),
            "damage" => Slot::Float(&mut self.damage),
            "distFromStart" => Slot::Float(&mut self.distance_from_start),
            "distRaced" => Slot::Float(&mut self.distance_raced),
            "fuel" => Slot::Float(&mut self.fuel),
            "lastLapTime" => Slot::Float(&mut self.last_lap_time),
            "rpm" => Slot::Float(&mut self.rpm),
            "speedX" => Slot::Float(&mut self.speed_x),
            "speedY" => Slot::Float(&mut self.speed_y),
            "speedZ" => Slot::Float(&mut self.speed_z),
            "trackPos" => Slot::Float(&mut self.track_position),
            "z" => Slot::Float(&mut self.z),
            "focus" => Slot::Array(&mut self.focus),
            "opponents" => Slot::Array(&mut self.opponents),
            "track" => Slot::Array(&mut self.track),
            "wheelSpinVel" => Slot::Array(&mut self.wheel_spin_velocity),
            _ => return None,
        };
        Some(slot)
    }

    fn apply_group(&mut self, group: &str, summary: &mut DecodeSummary) {
        let mut tokens = group.split_whitespace();
        let Some(key) = tokens.next() else {
            return;
        };
        let values: Vec<&str> = tokens.collect();
        if values.is_empty() {
            return;
        }

        let Some(slot) = self.slot(key) else {
            log::trace!("ignoring unknown key {:?}", key);
            summary.ignored += 1;
            return;
        };
        summary.applied += 1;

        match slot {
            Slot::Int(field) => {
                *field = parse_scalar(key, &values).unwrap_or_else(|err| {
                    log::warn!("{}", err);
                    summary.substituted += 1;
                    0
                });
            }
            Slot::Float(field) => {
                *field = parse_scalar(key, &values).unwrap_or_else(|err| {
                    log::warn!("{}", err);
                    summary.substituted += 1;
                    0.0
                });
            }
            Slot::Array(slots) => {
                for (index, slot) in slots.iter_mut().enumerate() {
                    *slot = parse_element(key, index, values.get(index).copied())
                        .unwrap_or_else(|err| {
                            log::warn!("{}", err);
                            summary.substituted += 1;
                            0.0
                        });
                }
            }
        }
    }
}

fn parse_scalar<T: FromStr>(key: &str, values: &[&str]) -> Result<T, DecodeError> {
    match values {
        [raw] => raw.parse().map_err(|_| DecodeError::InvalidValue {
            key: key.to_string(),
            index: 0,
            value: raw.to_string(),
        }),
        _ => Err(DecodeError::UnexpectedArity {
            key: key.to_string(),
            expected: 1,
            found: values.len(),
        }),
    }
}

fn parse_element(key: &str, index: usize, raw: Option<&str>) -> Result<f64, DecodeError> {
    let raw = raw.ok_or_else(|| DecodeError::MissingValue {
        key: key.to_string(),
        index,
    })?;
    raw.parse().map_err(|_| DecodeError::InvalidValue {
        key: key.to_string(),
        index,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "(angle 0.00837035)(curLapTime -0.982)(damage 0)(distFromStart 2042.29)\
(distRaced 0)(fuel 94)(gear 0)(lastLapTime 0)\
(opponents 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200 200)\
(racePos 1)(rpm 942.478)(speedX 0.0021)(speedY -0.0005)(speedZ 0.0003)\
(track 7.33 7.64 8.58 10.65 14.97 19.24 26.57 41.65 63.89 200 72.28 35.97 23.98 16.36 12.57 9.14 7.48 6.75 6.46)\
(trackPos -0.333)(wheelSpinVel 0 0 0 0)(z 0.345)(focus -1 -1 -1 -1 -1)";

    #[test]
    fn test_decode_full_message() {
        let mut state = VehicleState::new();
        let summary = state.decode(SAMPLE);

        assert!(summary.is_clean());
        assert_eq!(summary.applied, 19);
        assert_eq!(summary.ignored, 0);

        assert_eq!(state.gear, 0);
        assert_eq!(state.race_position, 1);
        assert!((state.angle - 0.00837035).abs() < 1e-12);
        assert!((state.current_lap_time + 0.982).abs() < 1e-12);
        assert!((state.distance_from_start - 2042.29).abs() < 1e-9);
        assert_eq!(state.fuel, 94.0);
        assert!((state.rpm - 942.478).abs() < 1e-9);
        assert!((state.speed_y + 0.0005).abs() < 1e-12);
        assert!((state.track_position + 0.333).abs() < 1e-12);
        assert!((state.z - 0.345).abs() < 1e-12);
        assert_eq!(state.track[9], 200.0);
        assert_eq!(state.track[18], 6.46);
        assert!(state.opponents.iter().all(|&o| o == 200.0));
        assert_eq!(state.focus, [-1.0; FOCUS_SENSOR_COUNT]);
        assert_eq!(state.wheel_spin_velocity, [0.0; WHEEL_COUNT]);
    }

    #[test]
    fn test_bad_vector_element_is_zeroed_and_decoding_continues() {
        let mut state = VehicleState::new();
        state.wheel_spin_velocity = [9.0; WHEEL_COUNT];

        let summary = state.decode("(wheelSpinVel 1.5 oops 3.5 4.5)(rpm 5100)(gear 3)");

        assert_eq!(state.wheel_spin_velocity, [1.5, 0.0, 3.5, 4.5]);
        assert_eq!(state.rpm, 5100.0);
        assert_eq!(state.gear, 3);
        assert_eq!(summary.substituted, 1);
        assert_eq!(summary.applied, 3);
        assert!(!summary.unterminated);
    }

    #[test]
    fn test_bad_scalar_is_zeroed() {
        let mut state = VehicleState::new();
        state.angle = 0.5;
        state.gear = 4;

        let summary = state.decode("(angle nan-ish)(gear 2.0)(fuel 12)");

        assert_eq!(state.angle, 0.0);
        assert_eq!(state.gear, 0);
        assert_eq!(state.fuel, 12.0);
        assert_eq!(summary.substituted, 2);
    }

    #[test]
    fn test_scalar_with_extra_values_is_zeroed() {
        let mut state = VehicleState::new();
        state.damage = 3.0;

        let summary = state.decode("(damage 1 2)");

        assert_eq!(state.damage, 0.0);
        assert_eq!(summary.substituted, 1);
    }

    #[test]
    fn test_short_vector_zero_fills_missing_slots() {
        let mut state = VehicleState::new();
        state.focus = [5.0; FOCUS_SENSOR_COUNT];

        let summary = state.decode("(focus 1 2 3)");

        assert_eq!(state.focus, [1.0, 2.0, 3.0, 0.0, 0.0]);
        assert_eq!(summary.substituted, 2);
    }

    #[test]
    fn test_long_vector_ignores_extra_values() {
        let mut state = VehicleState::new();
        let summary = state.decode("(wheelSpinVel 1 2 3 4 5 6)");

        assert_eq!(state.wheel_spin_velocity, [1.0, 2.0, 3.0, 4.0]);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_unterminated_group_leaves_state_untouched() {
        let mut state = VehicleState::new();
        state.decode(SAMPLE);
        let before = state.clone();

        let summary = state.decode("(speedX 120.5 (gear 4");

        assert!(summary.unterminated);
        assert_eq!(summary.applied, 0);
        assert_eq!(state, before);
    }

    #[test]
    fn test_groups_before_unterminated_one_are_kept() {
        let mut state = VehicleState::new();
        state.gear = 2;

        let summary = state.decode("(rpm 4000)(gear 5");

        assert!(summary.unterminated);
        assert_eq!(state.rpm, 4000.0);
        assert_eq!(state.gear, 2);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let mut state = VehicleState::new();
        let summary = state.decode("(turbo 1 2 3)(fuel 50)(pitStop yes)");

        assert_eq!(state.fuel, 50.0);
        assert_eq!(summary.ignored, 2);
        assert_eq!(summary.applied, 1);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_empty_groups_and_noise_are_skipped() {
        let mut state = VehicleState::new();
        state.fuel = 7.0;

        let summary = state.decode("junk ()(fuel)(  ) trailing (z 1.25) tail");

        assert_eq!(state.fuel, 7.0);
        assert_eq!(state.z, 1.25);
        assert_eq!(summary.applied, 1);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_groups_need_no_separator_and_tolerate_extra_whitespace() {
        let mut state = VehicleState::new();
        state.decode("( speedX   10 )(speedY\t-2) (speedZ 0.5)");

        assert_eq!(state.speed_x, 10.0);
        assert_eq!(state.speed_y, -2.0);
        assert_eq!(state.speed_z, 0.5);
    }
}
