use enum_map::{EnumMap, enum_map};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::board::Board;
use crate::chess_move::{MoveInput, MoveRequest, ResolvedMove};
use crate::clock::{Clock, GameInstant, MillisDuration};
use crate::error::TurnError;
use crate::fen;
use crate::force::Force;
use crate::pgn;
use crate::rules::ChessRules;
use crate::utc_time::UtcDateTime;
use crate::validator::MoveValidator;


#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PlayerInGame {
    pub id: String,
    pub force: Force,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    Active,
    Finished,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VictoryReason {
    Checkmate,
    Timeout,
    Resignation,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    Stalemate,
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
    Agreement,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    Victory(Force, VictoryReason),
    Draw(DrawReason),
}

impl GameResult {
    pub fn is_over(self) -> bool { self != GameResult::Ongoing }

    pub fn winner(self) -> Option<Force> {
        match self {
            GameResult::Victory(force, _) => Some(force),
            GameResult::Ongoing | GameResult::Draw(_) => None,
        }
    }

    // Stable identifier, e.g. "checkmate" or "threefold_repetition".
    pub fn reason(self) -> Option<&'static str> {
        match self {
            GameResult::Ongoing => None,
            GameResult::Victory(_, reason) => Some(reason.into()),
            GameResult::Draw(reason) => Some(reason.into()),
        }
    }

    pub fn pgn_token(self) -> &'static str {
        match self {
            GameResult::Ongoing => "*",
            GameResult::Victory(Force::White, _) => "1-0",
            GameResult::Victory(Force::Black, _) => "0-1",
            GameResult::Draw(_) => "1/2-1/2",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub moves: u32,
    pub captures: u32,
    pub checks: u32,
    pub castles: u32,
    pub promotions: u32,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct GameStats {
    pub plies: u32,
    pub by_force: EnumMap<Force, PlayerStats>,
}

impl GameStats {
    fn record(&mut self, mv: &ResolvedMove) {
        self.plies += 1;
        let stats = &mut self.by_force[mv.force];
        stats.moves += 1;
        stats.captures += u32::from(mv.flags.capture);
        stats.checks += u32::from(mv.flags.check);
        stats.castles += u32::from(mv.flags.castling.is_some());
        stats.promotions += u32::from(mv.flags.promotion.is_some());
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MoveRecord {
    pub mv: ResolvedMove,
    pub time: GameInstant,
    // Time the mover spent on this move.
    pub elapsed: MillisDuration,
}

// Error in the shape it is sent to clients.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
}

impl From<TurnError> for ErrorReport {
    fn from(err: TurnError) -> Self {
        ErrorReport {
            code: err.code().to_owned(),
            message: err.message().to_owned(),
        }
    }
}

// Everything a client needs to render the game. Persisting it is the caller's job.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub status: GameStatus,
    pub result: GameResult,
    pub result_reason: Option<String>,
    pub current_turn: Force,
    pub move_number: u32,
    pub board_position_key: String,
    pub fen: String,
    pub players: EnumMap<Force, PlayerInGame>,
    pub move_history: Vec<String>,
    pub stats: GameStats,
    pub clocks: EnumMap<Force, MillisDuration>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MoveResponse {
    pub success: bool,
    #[serde(rename = "move")]
    pub mv: Option<ResolvedMove>,
    pub error: Option<ErrorReport>,
    pub snapshot: GameState,
}


// One match between two players. Owns the board and is the only thing that mutates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChessGame {
    rules: ChessRules,
    players: EnumMap<Force, PlayerInGame>,
    // Set when the game did not start from the standard position.
    starting_fen: Option<String>,
    created_at: UtcDateTime,
    board: Board,
    clock: Clock,
    history: Vec<MoveRecord>,
    stats: GameStats,
    status: GameStatus,
    result: GameResult,
}

impl ChessGame {
    // Creates a game that is already running, with the clock started at `GameInstant::game_start`.
    pub fn new(white_id: impl Into<String>, black_id: impl Into<String>, rules: ChessRules) -> Self {
        let mut game = Self::new_waiting(white_id, black_id, rules);
        game.activate(GameInstant::game_start());
        game
    }

    pub fn new_waiting(
        white_id: impl Into<String>, black_id: impl Into<String>, rules: ChessRules,
    ) -> Self {
        Self::with_board(white_id.into(), black_id.into(), rules, Board::new(), None)
    }

    // Starts from an arbitrary position. The game is waiting until `start` is called.
    pub fn from_board(
        white_id: impl Into<String>, black_id: impl Into<String>, rules: ChessRules, board: Board,
    ) -> Result<Self, String> {
        board.verify_integrity()?;
        let starting_fen = Some(board.to_fen());
        Ok(Self::with_board(white_id.into(), black_id.into(), rules, board, starting_fen))
    }

    pub fn from_fen(
        white_id: impl Into<String>, black_id: impl Into<String>, rules: ChessRules, fen: &str,
    ) -> Result<Self, String> {
        Self::from_board(white_id, black_id, rules, fen::fen_to_board(fen)?)
    }

    fn with_board(
        white_id: String, black_id: String, rules: ChessRules, board: Board,
        starting_fen: Option<String>,
    ) -> Self {
        let clock = Clock::new(rules.time_control.clone());
        ChessGame {
            rules,
            players: enum_map! {
                Force::White => PlayerInGame { id: white_id.clone(), force: Force::White },
                Force::Black => PlayerInGame { id: black_id.clone(), force: Force::Black },
            },
            starting_fen,
            created_at: UtcDateTime::now(),
            board,
            clock,
            history: Vec::new(),
            stats: GameStats::default(),
            status: GameStatus::Waiting,
            result: GameResult::Ongoing,
        }
    }

    pub fn rules(&self) -> &ChessRules { &self.rules }
    pub fn players(&self) -> &EnumMap<Force, PlayerInGame> { &self.players }
    pub fn player(&self, force: Force) -> &PlayerInGame { &self.players[force] }
    pub fn starting_fen(&self) -> Option<&str> { self.starting_fen.as_deref() }
    pub fn created_at(&self) -> UtcDateTime { self.created_at }
    pub fn board(&self) -> &Board { &self.board }
    pub fn clock(&self) -> &Clock { &self.clock }
    pub fn history(&self) -> &[MoveRecord] { &self.history }
    pub fn last_move(&self) -> Option<&MoveRecord> { self.history.last() }
    pub fn stats(&self) -> &GameStats { &self.stats }
    pub fn status(&self) -> GameStatus { self.status }
    pub fn result(&self) -> GameResult { self.result }
    pub fn is_active(&self) -> bool { self.status == GameStatus::Active }
    pub fn current_turn(&self) -> Force { self.board.active_force() }
    pub fn move_number(&self) -> u32 { self.board.full_move_number() }

    pub fn find_player(&self, player_id: &str) -> Option<Force> {
        self.players.values().find(|p| p.id == player_id).map(|p| p.force)
    }

    // Only a waiting game can be started.
    pub fn start(&mut self, now: GameInstant) -> Result<(), TurnError> {
        if self.status != GameStatus::Waiting {
            return Err(TurnError::GameNotActive);
        }
        self.activate(now);
        Ok(())
    }

    fn activate(&mut self, now: GameInstant) {
        self.status = GameStatus::Active;
        self.clock.new_turn(self.board.active_force(), now);
        info!(
            "Game started: {} (white) vs {} (black), {}, {}",
            self.players[Force::White].id,
            self.players[Force::Black].id,
            self.rules.time_control,
            if self.rules.rated { "rated" } else { "unrated" },
        );
    }

    fn finish(&mut self, result: GameResult, now: GameInstant) {
        self.status = GameStatus::Finished;
        self.result = result;
        self.clock.stop(now);
        info!("Game over: {} ({})", result.pgn_token(), result.reason().unwrap_or("?"));
    }

    // Returns the force `player_id` plays for, provided that it is their turn.
    fn mover_force(&self, player_id: &str) -> Result<Force, TurnError> {
        if self.status != GameStatus::Active {
            return Err(TurnError::GameNotActive);
        }
        let force = self.board.active_force();
        if self.players[force].id == player_id {
            Ok(force)
        } else if self.players[force.opponent()].id == player_id {
            Err(TurnError::NotYourTurn)
        } else {
            Err(TurnError::UnknownPlayer)
        }
    }

    // Does not test flag on its own: call `test_flag` first to end the game if the player to move
    // has run out of time before making this move.
    pub fn try_turn(
        &mut self, player_id: &str, input: &MoveInput, now: GameInstant,
    ) -> Result<ResolvedMove, TurnError> {
        let result = self
            .mover_force(player_id)
            .and_then(|force| input.to_request(force))
            .and_then(|request| self.apply_request(&request, now));
        if let Err(err) = result {
            debug!("Rejected move {:?} by {}: {}", input, player_id, err.code());
        }
        result
    }

    // Same as `try_turn`, but takes standard algebraic notation, e.g. "Nf3" or "O-O".
    pub fn try_turn_algebraic(
        &mut self, player_id: &str, notation: &str, now: GameInstant,
    ) -> Result<ResolvedMove, TurnError> {
        let result = self
            .mover_force(player_id)
            .and_then(|force| MoveValidator::new(&self.board).resolve_algebraic(notation, force))
            .and_then(|request| self.apply_request(&request, now));
        if let Err(err) = result {
            debug!("Rejected move {:?} by {}: {}", notation, player_id, err.code());
        }
        result
    }

    pub fn make_move(&mut self, player_id: &str, input: &MoveInput, now: GameInstant) -> MoveResponse {
        let (mv, error) = match self.try_turn(player_id, input, now) {
            Ok(mv) => (Some(mv), None),
            Err(err) => (None, Some(err.into())),
        };
        MoveResponse {
            success: mv.is_some(),
            mv,
            error,
            snapshot: self.game_state(now),
        }
    }

    fn apply_request(
        &mut self, request: &MoveRequest, now: GameInstant,
    ) -> Result<ResolvedMove, TurnError> {
        let mv = MoveValidator::new(&self.board).validate(request)?;
        let force = mv.force;
        let elapsed = self.clock.turn_elapsed(now);
        self.board.apply_move(&mv);
        let occurrences = self.board.record_position();
        self.stats.record(&mv);
        self.history.push(MoveRecord { mv: mv.clone(), time: now, elapsed });

        if let Some(result) = self.terminal_result(&mv, occurrences) {
            self.finish(result, now);
        } else if self.clock.is_out_of_time(force, now) {
            self.finish(GameResult::Victory(force.opponent(), VictoryReason::Timeout), now);
        } else {
            self.clock.new_turn(force.opponent(), now);
        }
        Ok(mv)
    }

    // Checked in priority order right after a move has been applied.
    fn terminal_result(&self, mv: &ResolvedMove, occurrences: u32) -> Option<GameResult> {
        let draw_rules = &self.rules.draw_rules;
        if mv.flags.checkmate {
            Some(GameResult::Victory(mv.force, VictoryReason::Checkmate))
        } else if mv.flags.stalemate {
            Some(GameResult::Draw(DrawReason::Stalemate))
        } else if occurrences >= draw_rules.repetition_count {
            Some(GameResult::Draw(DrawReason::ThreefoldRepetition))
        } else if self.board.half_move_clock() >= draw_rules.move_rule_plies {
            Some(GameResult::Draw(DrawReason::FiftyMoveRule))
        } else if self.board.has_insufficient_material() {
            Some(GameResult::Draw(DrawReason::InsufficientMaterial))
        } else {
            None
        }
    }

    pub fn resign(&mut self, player_id: &str, now: GameInstant) -> Result<(), TurnError> {
        let force = self.participant_force(player_id)?;
        self.finish(GameResult::Victory(force.opponent(), VictoryReason::Resignation), now);
        Ok(())
    }

    // There is no negotiation: an offer is accepted on the spot.
    pub fn offer_draw(&mut self, player_id: &str, now: GameInstant) -> Result<(), TurnError> {
        self.participant_force(player_id)?;
        self.finish(GameResult::Draw(DrawReason::Agreement), now);
        Ok(())
    }

    fn participant_force(&self, player_id: &str) -> Result<Force, TurnError> {
        if self.status != GameStatus::Active {
            return Err(TurnError::GameNotActive);
        }
        self.find_player(player_id).ok_or(TurnError::UnknownPlayer)
    }

    // Ends the game if the player to move has run out of time. Meant to be called by whoever owns
    // the wall clock, since the game itself only looks at the time when a move arrives.
    pub fn test_flag(&mut self, now: GameInstant) {
        if self.status != GameStatus::Active {
            return;
        }
        let force = self.board.active_force();
        if self.clock.is_out_of_time(force, now) {
            self.finish(GameResult::Victory(force.opponent(), VictoryReason::Timeout), now);
        }
    }

    pub fn game_state(&self, now: GameInstant) -> GameState {
        GameState {
            status: self.status,
            result: self.result,
            result_reason: self.result.reason().map(str::to_owned),
            current_turn: self.board.active_force(),
            move_number: self.board.full_move_number(),
            board_position_key: self.board.position_key(),
            fen: self.board.to_fen(),
            players: self.players.clone(),
            move_history: self.history.iter().map(|record| record.mv.notation.clone()).collect(),
            stats: self.stats.clone(),
            clocks: enum_map! { force => self.clock.time_left(force, now) },
        }
    }

    pub fn to_pgn(&self) -> String { pgn::export_to_pgn(self) }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::coord::Coord;
    use crate::{game_d, game_t};

    fn input(from: Coord, to: Coord) -> MoveInput { MoveInput::new(from, to, None) }

    fn new_game() -> ChessGame { ChessGame::new("alice", "bob", ChessRules::blitz()) }

    #[test]
    fn turn_order() {
        let mut game = new_game();
        assert_eq!(
            game.try_turn("bob", &input(Coord::E7, Coord::E5), game_t!(1 s)),
            Err(TurnError::NotYourTurn)
        );
        assert_eq!(
            game.try_turn("carol", &input(Coord::E2, Coord::E4), game_t!(1 s)),
            Err(TurnError::UnknownPlayer)
        );
        game.try_turn("alice", &input(Coord::E2, Coord::E4), game_t!(1 s)).unwrap();
        assert_eq!(game.current_turn(), Force::Black);
        assert_eq!(
            game.try_turn("alice", &input(Coord::D2, Coord::D4), game_t!(2 s)),
            Err(TurnError::NotYourTurn)
        );
    }

    #[test]
    fn waiting_game_rejects_moves() {
        let mut game = ChessGame::new_waiting("alice", "bob", ChessRules::blitz());
        assert_eq!(game.status(), GameStatus::Waiting);
        assert_eq!(
            game.try_turn("alice", &input(Coord::E2, Coord::E4), game_t!(0)),
            Err(TurnError::GameNotActive)
        );
        assert_eq!(game.resign("alice", game_t!(0)), Err(TurnError::GameNotActive));
        game.start(game_t!(0)).unwrap();
        assert_eq!(game.start(game_t!(0)), Err(TurnError::GameNotActive));
        assert!(game.try_turn("alice", &input(Coord::E2, Coord::E4), game_t!(1 s)).is_ok());
    }

    #[test]
    fn rejected_move_changes_nothing() {
        let mut game = new_game();
        let state_before = game.game_state(game_t!(1 s));
        let response = game.make_move("alice", &input(Coord::E2, Coord::E5), game_t!(1 s));
        assert!(!response.success);
        assert_eq!(response.error.unwrap().code, "invalid_piece_move");
        assert_eq!(response.snapshot, state_before);
    }

    #[test]
    fn clock_is_deducted_with_increment() {
        let mut game = ChessGame::new("alice", "bob", ChessRules::rapid());
        game.try_turn("alice", &input(Coord::E2, Coord::E4), game_t!(7 s)).unwrap();
        assert_eq!(game.clock().time_left(Force::White, game_t!(7 s)), game_d!(598 s));
        assert_eq!(game.history()[0].elapsed, game_d!(7 s));
        game.try_turn("bob", &input(Coord::E7, Coord::E5), game_t!(10 s)).unwrap();
        assert_eq!(game.clock().time_left(Force::Black, game_t!(10 s)), game_d!(602 s));
        assert_eq!(game.history()[1].elapsed, game_d!(3 s));
    }

    #[test]
    fn timeout_on_move() {
        let mut game = new_game();
        game.try_turn("alice", &input(Coord::E2, Coord::E4), game_t!(301 s)).unwrap();
        assert_eq!(game.status(), GameStatus::Finished);
        assert_eq!(game.result(), GameResult::Victory(Force::Black, VictoryReason::Timeout));
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn timeout_via_test_flag() {
        let mut game = new_game();
        game.test_flag(game_t!(299 s));
        assert!(game.is_active());
        game.test_flag(game_t!(300 s));
        assert_eq!(game.result(), GameResult::Victory(Force::Black, VictoryReason::Timeout));
        assert_eq!(game.game_state(game_t!(400 s)).result_reason.as_deref(), Some("timeout"));
    }

    #[test]
    fn resign_and_draw() {
        let mut game = new_game();
        assert_eq!(game.resign("carol", game_t!(0)), Err(TurnError::UnknownPlayer));
        // Resigning out of turn is allowed.
        game.resign("bob", game_t!(1 s)).unwrap();
        assert_eq!(game.result(), GameResult::Victory(Force::White, VictoryReason::Resignation));
        assert_eq!(game.offer_draw("alice", game_t!(2 s)), Err(TurnError::GameNotActive));

        let mut game = new_game();
        game.offer_draw("alice", game_t!(1 s)).unwrap();
        assert_eq!(game.result(), GameResult::Draw(DrawReason::Agreement));
        assert_eq!(game.result().pgn_token(), "1/2-1/2");
    }

    #[test]
    fn stats() {
        let mut game = new_game();
        for (player, notation) in [("alice", "e4"), ("bob", "d5"), ("alice", "exd5"), ("bob", "Qxd5")] {
            game.try_turn_algebraic(player, notation, game_t!(0)).unwrap();
        }
        let stats = game.stats();
        assert_eq!(stats.plies, 4);
        assert_eq!(stats.by_force[Force::White].captures, 1);
        assert_eq!(stats.by_force[Force::Black].captures, 1);
        assert_eq!(stats.by_force[Force::Black].moves, 2);
    }

    #[test]
    fn custom_position_must_be_valid() {
        assert!(ChessGame::from_fen("a", "b", ChessRules::blitz(), "8/8/8/8/8/8/8/4K3 w - - 0 1").is_err());
        let game =
            ChessGame::from_fen("a", "b", ChessRules::blitz(), "4k3/8/8/8/8/8/4P3/4K3 b - - 0 1")
                .unwrap();
        assert_eq!(game.status(), GameStatus::Waiting);
        assert_eq!(game.current_turn(), Force::Black);
        assert_eq!(game.starting_fen(), Some("4k3/8/8/8/8/8/4P3/4K3 b - - 0 1"));
    }
}
