use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::TimeControl;


#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DrawRules {
    // Number of occurrences of the same position that ends the game.
    pub repetition_count: u32,
    // Plies without a capture or a pawn move that end the game. The official fifty-move rule is
    // 50 moves by each side, i.e. 100 plies.
    pub move_rule_plies: u32,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ChessRules {
    pub time_control: TimeControl,
    pub rated: bool,
    pub draw_rules: DrawRules,
}

// Match options in the shape they arrive from the lobby: `{"timeControlSeconds": 300, ...}`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOptions {
    pub time_control_seconds: u64,
    #[serde(default)]
    pub increment_seconds: u64,
    #[serde(default)]
    pub is_ranked: bool,
}

impl DrawRules {
    pub fn official() -> Self {
        DrawRules {
            repetition_count: 3,
            move_rule_plies: 100,
        }
    }
}

impl ChessRules {
    pub fn blitz() -> Self {
        Self {
            time_control: TimeControl {
                starting_time: Duration::from_secs(300),
                increment: Duration::ZERO,
            },
            rated: true,
            draw_rules: DrawRules::official(),
        }
    }

    pub fn rapid() -> Self {
        Self {
            time_control: TimeControl {
                starting_time: Duration::from_secs(600),
                increment: Duration::from_secs(5),
            },
            rated: true,
            draw_rules: DrawRules::official(),
        }
    }

    pub fn from_options(options: &GameOptions) -> Self {
        Self {
            time_control: TimeControl {
                starting_time: Duration::from_secs(options.time_control_seconds),
                increment: Duration::from_secs(options.increment_seconds),
            },
            rated: options.is_ranked,
            draw_rules: DrawRules::official(),
        }
    }

    pub fn verify(&self) -> Result<(), String> {
        if self.time_control.starting_time.is_zero() {
            return Err("Starting time must be positive".to_owned());
        }
        if self.draw_rules.repetition_count < 2 {
            return Err("Repetition count must be at least 2".to_owned());
        }
        if self.draw_rules.move_rule_plies == 0 {
            return Err("Move rule must allow at least one ply".to_owned());
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_json() {
        let options: GameOptions =
            serde_json::from_str(r#"{"timeControlSeconds": 180, "incrementSeconds": 2}"#).unwrap();
        let rules = ChessRules::from_options(&options);
        assert_eq!(rules.time_control.starting_time, Duration::from_secs(180));
        assert_eq!(rules.time_control.increment, Duration::from_secs(2));
        assert!(!rules.rated);
        assert_eq!(rules.draw_rules, DrawRules::official());
        assert!(rules.verify().is_ok());
    }

    #[test]
    fn verify() {
        assert!(ChessRules::blitz().verify().is_ok());
        assert!(ChessRules::rapid().verify().is_ok());
        let mut rules = ChessRules::blitz();
        rules.time_control.starting_time = Duration::ZERO;
        assert!(rules.verify().is_err());
        let mut rules = ChessRules::blitz();
        rules.draw_rules.repetition_count = 1;
        assert!(rules.verify().is_err());
    }
}
