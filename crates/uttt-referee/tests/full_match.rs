//! Complete matches against scripted in-memory agents.

use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf, duplex, split,
};
use tokio::task::JoinHandle;
use uttt_core::{BoardState, MatchStatus, Move, Player, RefereeError};
use uttt_referee::{LineAgent, MatchConfig, MatchOrchestrator, MatchOutcome, MatchReport};

type MemoryAgent = LineAgent<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

#[derive(Debug, Clone, Copy)]
enum Behaviour {
    /// Plays the first empty cell of the first available sub-board
    FirstLegal,
    /// Like `FirstLegal`, after thinking for a while
    Slow(Duration),
    /// Reads everything, never answers
    Silent,
    /// Answers with something that is not a move
    Garbage,
    /// Always asks for the top-left cell
    AlwaysCorner,
    /// Closes its output when asked for a move
    HangUp,
}

fn memory_agent(name: &str, behaviour: Behaviour) -> (MemoryAgent, JoinHandle<Vec<String>>) {
    let (referee_side, bot_side) = duplex(64 * 1024);
    let (reader, writer) = split(referee_side);
    let agent = LineAgent::new(name, reader, writer, Duration::from_secs(5));
    let bot = tokio::spawn(run_bot(bot_side, behaviour));
    (agent, bot)
}

/// Reference bot: tracks the board from the referee's updates
async fn run_bot(stream: DuplexStream, behaviour: Behaviour) -> Vec<String> {
    let (reader, mut writer) = split(stream);
    let mut lines = BufReader::new(reader).lines();
    let mut received = Vec::new();
    let mut field = vec![0u8; 81];
    let mut macro_board = vec![-1i8; 9];

    while let Ok(Some(line)) = lines.next_line().await {
        received.push(line.clone());
        if let Some(values) = line.strip_prefix("update game field ") {
            field = values.split(',').map(|v| v.parse().unwrap()).collect();
        } else if let Some(values) = line.strip_prefix("update game macroboard ") {
            macro_board = values.split(',').map(|v| v.parse().unwrap()).collect();
        } else if line.starts_with("action move ") {
            let reply = match behaviour {
                Behaviour::FirstLegal => Some(first_legal(&field, &macro_board)),
                Behaviour::Slow(delay) => {
                    tokio::time::sleep(delay).await;
                    Some(first_legal(&field, &macro_board))
                }
                Behaviour::Silent => None,
                Behaviour::Garbage => Some("place_move banana".to_string()),
                Behaviour::AlwaysCorner => Some("place_move 0 0".to_string()),
                Behaviour::HangUp => return received,
            };
            if let Some(reply) = reply {
                if writer
                    .write_all(format!("{}\n", reply).as_bytes())
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }
    }
    received
}

fn first_legal(field: &[u8], macro_board: &[i8]) -> String {
    for (board, status) in macro_board.iter().enumerate() {
        if *status != -1 {
            continue;
        }
        let (macro_row, macro_col) = (board / 3, board % 3);
        for r in 0..3 {
            for c in 0..3 {
                let (row, col) = (macro_row * 3 + r, macro_col * 3 + c);
                if field[row * 9 + col] == 0 {
                    return format!("place_move {} {}", col, row);
                }
            }
        }
    }
    panic!("referee asked for a move with no available cell");
}

async fn referee(
    first: Behaviour,
    second: Behaviour,
    config: MatchConfig,
) -> (MatchReport, Vec<String>, Vec<String>) {
    let (alpha, alpha_bot) = memory_agent("alpha", first);
    let (beta, beta_bot) = memory_agent("beta", second);
    let report = MatchOrchestrator::new(alpha, beta, config)
        .unwrap()
        .run()
        .await
        .unwrap();
    // Both bots see end-of-input once the referee shuts the agents down
    let alpha_lines = alpha_bot.await.unwrap();
    let beta_lines = beta_bot.await.unwrap();
    (report, alpha_lines, beta_lines)
}

fn replay(report: &MatchReport) -> BoardState {
    let mut board = BoardState::new();
    for played in &report.moves {
        assert_eq!(played.player, board.player_to_move());
        board.apply(Move::new(played.row, played.col).unwrap()).unwrap();
    }
    board
}

#[tokio::test]
async fn test_full_match_between_legal_bots() {
    let (report, alpha_lines, beta_lines) = referee(
        Behaviour::FirstLegal,
        Behaviour::FirstLegal,
        MatchConfig::default(),
    )
    .await;

    let board = replay(&report);
    assert!(board.is_finished());
    match (&report.outcome, board.status()) {
        (MatchOutcome::Draw, MatchStatus::Draw) => {}
        (MatchOutcome::Win { winner, name }, MatchStatus::Won(p)) => {
            assert_eq!(*winner, p);
            assert_eq!(name, &report.players[p.index()]);
        }
        (outcome, status) => panic!("report {:?} disagrees with board {:?}", outcome, status),
    }

    let second_moves = report
        .moves
        .iter()
        .filter(|m| m.player == Player::Two)
        .count();
    assert_eq!(report.rounds as usize, second_moves);
    assert_eq!(report.players, ["alpha".to_string(), "beta".to_string()]);

    assert_eq!(
        &alpha_lines[..5],
        &[
            "settings timebank 10000",
            "settings time_per_move 500",
            "settings player_names alpha,beta",
            "settings your_bot alpha",
            "settings your_botid 1",
        ]
    );
    assert_eq!(beta_lines[3], "settings your_bot beta");
    assert_eq!(beta_lines[4], "settings your_botid 2");

    let zeros = vec!["0"; 81].join(",");
    assert_eq!(alpha_lines[5], "update game round 0");
    assert_eq!(alpha_lines[6], "update game move 0");
    assert_eq!(alpha_lines[7], format!("update game field {}", zeros));
    assert_eq!(alpha_lines[8], "update game macroboard -1,-1,-1,-1,-1,-1,-1,-1,-1");
    assert_eq!(alpha_lines[9], "action move 10000");

    // Player two's first turn is move 1 of round 0
    assert_eq!(beta_lines[5], "update game round 0");
    assert_eq!(beta_lines[6], "update game move 1");
    // Player one's second turn starts round 1
    assert_eq!(alpha_lines[10], "update game round 1");
    assert_eq!(alpha_lines[11], "update game move 2");
}

#[tokio::test(start_paused = true)]
async fn test_timebank_is_charged_and_replenished() {
    let (report, alpha_lines, _) = referee(
        Behaviour::Slow(Duration::from_millis(600)),
        Behaviour::FirstLegal,
        MatchConfig::default(),
    )
    .await;

    let offered: Vec<&String> = alpha_lines
        .iter()
        .filter(|l| l.starts_with("action move "))
        .collect();
    assert_eq!(offered[0], "action move 10000");
    assert_eq!(offered[1], "action move 9900");
    assert_eq!(offered[2], "action move 9800");

    let alpha_turns = report
        .moves
        .iter()
        .filter(|m| m.player == Player::One)
        .count() as u64;
    assert_eq!(report.final_timebank_ms[0], 9400 - 100 * (alpha_turns - 1));
    assert_eq!(report.final_timebank_ms[1], 10000);
}

#[tokio::test(start_paused = true)]
async fn test_silent_agent_forfeits_on_timeout() {
    let (report, _, beta_lines) = referee(
        Behaviour::FirstLegal,
        Behaviour::Silent,
        MatchConfig::default(),
    )
    .await;

    match &report.outcome {
        MatchOutcome::Forfeit {
            winner,
            name,
            loser,
            reason,
        } => {
            assert_eq!(*winner, Player::One);
            assert_eq!(name, "alpha");
            assert_eq!(*loser, Player::Two);
            assert!(reason.contains("timed out"), "reason: {}", reason);
        }
        other => panic!("Expected forfeit, got {:?}", other),
    }
    assert_eq!(report.moves.len(), 1);
    assert_eq!(report.final_timebank_ms[1], 0);
    assert_eq!(beta_lines.last().unwrap(), "action move 10000");
}

#[tokio::test]
async fn test_malformed_reply_forfeits() {
    let (report, _, _) = referee(
        Behaviour::Garbage,
        Behaviour::FirstLegal,
        MatchConfig::default(),
    )
    .await;

    match &report.outcome {
        MatchOutcome::Forfeit { winner, reason, .. } => {
            assert_eq!(*winner, Player::Two);
            assert!(reason.contains("Protocol error"), "reason: {}", reason);
            assert!(reason.contains("banana"), "reason: {}", reason);
        }
        other => panic!("Expected forfeit, got {:?}", other),
    }
    assert!(report.moves.is_empty());
}

#[tokio::test]
async fn test_illegal_move_forfeits() {
    let (report, _, _) = referee(
        Behaviour::AlwaysCorner,
        Behaviour::AlwaysCorner,
        MatchConfig::default(),
    )
    .await;

    // Player one takes (0, 0); player two asks for the same cell
    assert_eq!(report.moves.len(), 1);
    match &report.outcome {
        MatchOutcome::Forfeit {
            winner,
            loser,
            reason,
            ..
        } => {
            assert_eq!(*winner, Player::One);
            assert_eq!(*loser, Player::Two);
            assert!(reason.contains("Illegal move"), "reason: {}", reason);
        }
        other => panic!("Expected forfeit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_closed_output_forfeits() {
    let (report, _, _) = referee(
        Behaviour::FirstLegal,
        Behaviour::HangUp,
        MatchConfig::default(),
    )
    .await;

    match &report.outcome {
        MatchOutcome::Forfeit { loser, reason, .. } => {
            assert_eq!(*loser, Player::Two);
            assert!(reason.contains("output closed"), "reason: {}", reason);
        }
        other => panic!("Expected forfeit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_play() {
    let (alpha, alpha_bot) = memory_agent("alpha", Behaviour::FirstLegal);
    let (beta, beta_bot) = memory_agent("beta", Behaviour::FirstLegal);
    let config = MatchConfig::default()
        .with_max_timebank(Duration::from_millis(100))
        .with_time_per_move(Duration::from_millis(500));

    let result = MatchOrchestrator::new(alpha, beta, config);
    assert!(matches!(result, Err(RefereeError::Configuration(_))));
    drop(result);

    // Nothing was sent to either bot
    assert!(alpha_bot.await.unwrap().is_empty());
    assert!(beta_bot.await.unwrap().is_empty());
}
