//! Turn loop for one match between two agents

use crate::agent::{AgentLink, ReadOutcome};
use crate::config::MatchConfig;
use crate::timebank::Timebank;
use serde::Serialize;
use std::fmt;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uttt_core::{
    AgentReply, BoardState, Directive, MatchStatus, Move, Player, RefereeError, Result,
};

/// How a match ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Type", rename_all = "PascalCase")]
pub enum MatchOutcome {
    Draw,
    Win {
        winner: Player,
        name: String,
    },
    /// The loser faulted (timeout, bad reply, illegal move, broken pipe)
    Forfeit {
        winner: Player,
        name: String,
        loser: Player,
        reason: String,
    },
}

impl MatchOutcome {
    pub fn winner(&self) -> Option<Player> {
        match self {
            MatchOutcome::Draw => None,
            MatchOutcome::Win { winner, .. } | MatchOutcome::Forfeit { winner, .. } => {
                Some(*winner)
            }
        }
    }

    pub fn is_forfeit(&self) -> bool {
        matches!(self, MatchOutcome::Forfeit { .. })
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOutcome::Draw => write!(f, "It's a draw!"),
            MatchOutcome::Win { winner, name } => write!(f, "Player {} wins! ({})", winner, name),
            MatchOutcome::Forfeit { winner, name, .. } => {
                write!(f, "Player {} wins by forfeit! ({})", winner, name)
            }
        }
    }
}

/// One applied move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayedMove {
    pub player: Player,
    pub row: usize,
    pub col: usize,
}

/// Summary of a finished match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub outcome: MatchOutcome,
    pub players: [String; 2],
    pub rounds: u32,
    pub moves: Vec<PlayedMove>,
    pub final_timebank_ms: [u64; 2],
}

struct Seat<A> {
    agent: A,
    name: String,
    player: Player,
    timebank: Timebank,
}

/// An agent fault tagged with the seat that caused it
struct Fault {
    player: Player,
    error: RefereeError,
}

/// Referee for a single match
pub struct MatchOrchestrator<A: AgentLink> {
    seats: [Seat<A>; 2],
    config: MatchConfig,
    board: BoardState,
    round: u32,
    move_number: u32,
    whose_turn: Player,
    moves: Vec<PlayedMove>,
}

impl<A: AgentLink> MatchOrchestrator<A> {
    /// Seat `first` as player 1 and `second` as player 2
    pub fn new(first: A, second: A, config: MatchConfig) -> Result<Self> {
        config.validate()?;
        let seat = |agent: A, player| Seat {
            name: agent.name().to_string(),
            agent,
            player,
            timebank: Timebank::new(config.max_timebank, config.time_per_move),
        };
        let seats = [seat(first, Player::One), seat(second, Player::Two)];
        Ok(Self {
            seats,
            config,
            board: BoardState::new(),
            round: 0,
            move_number: 0,
            whose_turn: Player::One,
            moves: Vec::new(),
        })
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    /// Play the match to the end and release both agents.
    ///
    /// Agent faults end the match as a forfeit for the faulting agent; only
    /// referee-side failures are returned as errors.
    pub async fn run(mut self) -> Result<MatchReport> {
        info!(
            "Match starting: {} (player 1) vs {} (player 2)",
            self.seats[0].name, self.seats[1].name
        );

        let played = self.play().await;
        self.shutdown_agents().await;

        let outcome = match played {
            Ok(()) => self.outcome_from_board()?,
            Err(Fault { player, error }) if error.is_agent_fault() => {
                warn!(
                    "Player {} ({}) forfeits: {}",
                    player,
                    self.seats[player.index()].name,
                    error
                );
                let winner = player.opponent();
                MatchOutcome::Forfeit {
                    winner,
                    name: self.seats[winner.index()].name.clone(),
                    loser: player,
                    reason: error.to_string(),
                }
            }
            Err(Fault { error, .. }) => return Err(error),
        };

        info!("Match over after {} moves: {}", self.moves.len(), outcome);
        Ok(MatchReport {
            outcome,
            players: [self.seats[0].name.clone(), self.seats[1].name.clone()],
            rounds: self.round,
            final_timebank_ms: [
                millis(self.seats[0].timebank.remaining()),
                millis(self.seats[1].timebank.remaining()),
            ],
            moves: self.moves,
        })
    }

    async fn play(&mut self) -> std::result::Result<(), Fault> {
        for player in [Player::One, Player::Two] {
            self.send_settings(player).await.map_err(|error| Fault { player, error })?;
        }

        while !self.board.is_finished() {
            let player = self.whose_turn;
            self.take_turn()
                .await
                .map_err(|error| Fault { player, error })?;
        }
        Ok(())
    }

    async fn send_settings(&mut self, player: Player) -> Result<()> {
        let directives = [
            Directive::Timebank {
                max_ms: millis(self.config.max_timebank),
            },
            Directive::TimePerMove {
                increment_ms: millis(self.config.time_per_move),
            },
            Directive::PlayerNames {
                first: self.seats[0].name.clone(),
                second: self.seats[1].name.clone(),
            },
            Directive::YourBot {
                name: self.seats[player.index()].name.clone(),
            },
            Directive::YourBotId { id: player.id() },
        ];
        let seat = &mut self.seats[player.index()];
        for directive in directives {
            seat.agent.send_line(&directive.to_string()).await?;
        }
        Ok(())
    }

    async fn take_turn(&mut self) -> Result<()> {
        let [field, macro_board] = Directive::board_updates(&self.board);
        let updates = [
            Directive::Round { round: self.round },
            Directive::MoveNumber {
                number: self.move_number,
            },
            field,
            macro_board,
        ];

        let seat = &mut self.seats[self.whose_turn.index()];
        for update in updates {
            seat.agent.send_line(&update.to_string()).await?;
        }

        let allowed = seat.timebank.replenish();
        debug!(
            "Requesting move from {} with {}ms",
            seat.name,
            allowed.as_millis()
        );
        seat.agent
            .send_line(
                &Directive::ActionMove {
                    timebank_ms: millis(allowed),
                }
                .to_string(),
            )
            .await?;

        let started = Instant::now();
        let outcome = seat.agent.read_line(allowed).await?;
        let elapsed = started.elapsed();

        let timed_out = || RefereeError::AgentTimeout {
            agent: seat.name.clone(),
            elapsed_ms: millis(elapsed),
            allowed_ms: millis(allowed),
        };
        let line = match outcome {
            ReadOutcome::Line(line) => line,
            ReadOutcome::TimedOut => {
                seat.timebank.charge(elapsed);
                return Err(timed_out());
            }
            ReadOutcome::Closed => {
                return Err(RefereeError::AgentProtocol {
                    agent: seat.name.clone(),
                    reason: "output closed before a move was sent".into(),
                });
            }
        };
        if seat.timebank.charge(elapsed).is_none() {
            return Err(timed_out());
        }

        let reply: AgentReply = line.parse().map_err(|e| RefereeError::AgentProtocol {
            agent: seat.name.clone(),
            reason: format!("{} (line {:?})", e, line),
        })?;
        let mv = reply.into_move();
        let player = seat.player;

        self.board.apply(mv)?;
        self.record(player, mv);
        Ok(())
    }

    fn record(&mut self, player: Player, mv: Move) {
        debug!("Player {} played {}\n{}", player, mv, self.board);
        debug_assert_eq!(
            self.board.clone().audit_dead_boards(),
            0,
            "apply left a full sub-board undecided"
        );

        self.moves.push(PlayedMove {
            player,
            row: mv.row(),
            col: mv.col(),
        });
        self.move_number += 1;
        self.whose_turn = self.whose_turn.opponent();
        if self.whose_turn == Player::One {
            self.round += 1;
        }
    }

    fn outcome_from_board(&self) -> Result<MatchOutcome> {
        match self.board.status() {
            MatchStatus::Draw => Ok(MatchOutcome::Draw),
            MatchStatus::Won(winner) => Ok(MatchOutcome::Win {
                winner,
                name: self.seats[winner.index()].name.clone(),
            }),
            MatchStatus::Ongoing => Err(RefereeError::NotFinished),
        }
    }

    async fn shutdown_agents(&mut self) {
        for seat in &mut self.seats {
            if let Err(e) = seat.agent.shutdown().await {
                warn!("Shutting down {} failed: {}", seat.name, e);
            }
        }
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
