use std::time::Duration;
use std::{fmt, iter, ops};

use enum_map::{EnumMap, enum_map};
use serde::{Deserialize, Serialize};

use crate::force::Force;


#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TimeControl {
    // Both must be a whole number of seconds.
    pub starting_time: Duration,
    // Added to the mover's clock after each completed move (Fischer increment).
    pub increment: Duration,
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_duration_to_mss(self.starting_time, f)?;
        if !self.increment.is_zero() {
            write!(f, "+{}", self.increment.as_secs())?;
        }
        Ok(())
    }
}

const MILLIS_PER_SEC: u64 = 1000;
const MILLIS_PER_DECI: u64 = MILLIS_PER_SEC / 10;

pub fn duration_to_mss(d: Duration) -> String {
    let mut ret = String::new();
    // Writing to a `String` cannot fail.
    let _ = format_duration_to_mss(d, &mut ret);
    ret
}

fn format_duration_to_mss(d: Duration, f: &mut impl fmt::Write) -> fmt::Result {
    let s = d.as_secs();
    let minutes = s / 60;
    let seconds = s % 60;
    write!(f, "{minutes}:{seconds:02}")
}


// Class similar to `std::time::Duration`, but with milliseconds precision. All game time is rounded
// to milliseconds, so that a saved game restores to exactly the same clock readings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct MillisDuration {
    ms: u64,
}

// Time since game start.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct GameInstant {
    elapsed_since_start: MillisDuration,
}

impl MillisDuration {
    pub const ZERO: Self = MillisDuration { ms: 0 };

    pub fn from_millis(ms: u64) -> Self { MillisDuration { ms } }
    pub fn from_secs(s: u64) -> Self { MillisDuration::from_millis(s * MILLIS_PER_SEC) }

    pub fn is_zero(self) -> bool { self.ms == 0 }
    pub fn as_millis(self) -> u64 { self.ms }
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        Some(MillisDuration { ms: self.ms.checked_sub(other.ms)? })
    }
    pub fn saturating_sub(self, other: Self) -> Self {
        MillisDuration { ms: self.ms.saturating_sub(other.ms) }
    }
}

impl ops::Add for MillisDuration {
    type Output = Self;
    fn add(self, other: Self) -> Self { MillisDuration { ms: self.ms + other.ms } }
}
impl ops::Sub for MillisDuration {
    type Output = Self;
    fn sub(self, other: Self) -> Self { MillisDuration { ms: self.ms - other.ms } }
}
impl iter::Sum for MillisDuration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MillisDuration::ZERO, ops::Add::add)
    }
}

impl From<Duration> for MillisDuration {
    fn from(d: Duration) -> Self { MillisDuration::from_millis(d.as_millis() as u64) }
}
impl From<MillisDuration> for Duration {
    fn from(d: MillisDuration) -> Self { Duration::from_millis(d.as_millis()) }
}

impl GameInstant {
    pub const fn game_start() -> Self { GameInstant { elapsed_since_start: MillisDuration::ZERO } }
    pub fn from_millis_duration(elapsed_since_start: MillisDuration) -> Self {
        GameInstant { elapsed_since_start }
    }
    pub fn from_duration(elapsed_since_start: Duration) -> Self {
        GameInstant::from_millis_duration(elapsed_since_start.into())
    }

    pub fn elapsed_since_start(self) -> MillisDuration { self.elapsed_since_start }

    // Saturates: the wall-clock collaborator may hand out slightly out-of-order timestamps.
    pub fn duration_since(self, earlier: GameInstant) -> MillisDuration {
        self.elapsed_since_start.saturating_sub(earlier.elapsed_since_start)
    }
}


#[derive(Clone, Debug)]
pub struct ClockShowing {
    pub is_active: bool,
    pub out_of_time: bool,
    pub time_breakdown: TimeBreakdown,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimeBreakdown {
    NormalTime { minutes: u32, seconds: u32 },
    LowTime { seconds: u32, deciseconds: u32 },
}

impl ClockShowing {
    pub fn ui_string(&self) -> String {
        match self.time_breakdown {
            TimeBreakdown::NormalTime { minutes, seconds } => format!("{:02}:{:02}", minutes, seconds),
            TimeBreakdown::LowTime { seconds, deciseconds } => {
                format!("{:02}.{}", seconds, deciseconds)
            }
        }
    }
}

impl From<MillisDuration> for TimeBreakdown {
    fn from(time: MillisDuration) -> Self {
        // Always round the time up, so that we never show "0.00" for a player who has not lost by
        // flag.
        let millis = time.as_millis();
        let ds_ceil = millis.div_ceil(MILLIS_PER_DECI);
        if ds_ceil < 200 {
            TimeBreakdown::LowTime {
                seconds: (ds_ceil / 10) as u32,
                deciseconds: (ds_ceil % 10) as u32,
            }
        } else {
            let s_ceil = millis.div_ceil(MILLIS_PER_SEC);
            TimeBreakdown::NormalTime {
                minutes: (s_ceil / 60) as u32,
                seconds: (s_ceil % 60) as u32,
            }
        }
    }
}


// Pull-based chess clock: time is only committed when a turn ends or the clock is stopped.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Clock {
    control: TimeControl,
    turn_state: Option<(Force, GameInstant)>, // force, start time
    remaining_time: EnumMap<Force, MillisDuration>,
}

impl Clock {
    pub fn new(control: TimeControl) -> Self {
        let remaining_time = enum_map! { _ => control.starting_time.into() };
        Self { control, turn_state: None, remaining_time }
    }

    pub fn control(&self) -> &TimeControl { &self.control }
    pub fn is_active(&self) -> bool { self.turn_state.is_some() }
    pub fn active_force(&self) -> Option<Force> { self.turn_state.map(|st| st.0) }
    pub fn turn_start(&self) -> Option<GameInstant> { self.turn_state.map(|st| st.1) }

    pub fn time_left(&self, force: Force, now: GameInstant) -> MillisDuration {
        let mut ret = self.remaining_time[force];
        if let Some((current_force, current_start)) = self.turn_state {
            if force == current_force {
                ret = ret.saturating_sub(now.duration_since(current_start));
            }
        }
        ret
    }

    pub fn is_out_of_time(&self, force: Force, now: GameInstant) -> bool {
        self.time_left(force, now).is_zero()
    }

    pub fn showing_for(&self, force: Force, now: GameInstant) -> ClockShowing {
        let time = self.time_left(force, now);
        ClockShowing {
            is_active: self.active_force() == Some(force),
            out_of_time: time.is_zero(),
            time_breakdown: time.into(),
        }
    }

    // Time the side to move has spent on the current turn.
    pub fn turn_elapsed(&self, now: GameInstant) -> MillisDuration {
        self.turn_start().map_or(MillisDuration::ZERO, |start| now.duration_since(start))
    }

    // Ends the current turn (if any), crediting the increment to the player who moved, and starts
    // the turn of `new_force`.
    pub fn new_turn(&mut self, new_force: Force, now: GameInstant) {
        if let Some((prev_force, _)) = self.turn_state {
            let remaining = self.time_left(prev_force, now);
            self.remaining_time[prev_force] = remaining + self.control.increment.into();
        }
        self.turn_state = Some((new_force, now));
    }

    pub fn stop(&mut self, now: GameInstant) {
        if let Some((prev_force, _)) = self.turn_state {
            let remaining = self.time_left(prev_force, now);
            self.remaining_time[prev_force] = remaining;
        }
        self.turn_state = None;
    }
}


#[cfg(test)]
#[macro_export]
macro_rules! game_d {
    (0) => {
        $crate::clock::MillisDuration::ZERO
    };
    ($ms:literal ms) => {
        $crate::clock::MillisDuration::from_millis($ms)
    };
    ($s:literal s) => {
        $crate::clock::MillisDuration::from_secs($s)
    };
    ($m:literal m) => {
        $crate::clock::MillisDuration::from_secs($m * 60)
    };
}

#[cfg(test)]
#[macro_export]
macro_rules! game_t {
    ($($arg:tt)*) => {
        $crate::clock::GameInstant::from_millis_duration($crate::game_d!($($arg)*))
    };
}
