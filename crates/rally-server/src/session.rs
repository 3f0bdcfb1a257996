use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use rally_core::net::messages::{
    MatchEndMsg, MatchOutcome, MatchStartMsg, PhaseStateMsg, PowerDownMsg, ProgramCardMsg,
    RoundEndMsg, ServerMessage,
};
use rally_core::net::protocol::encode_server_message;
use rally_core::player::{Player, PlayerId};
use rally_engine::board::{Board, BoardDef};
use rally_engine::config::MatchConfig;
use rally_engine::{PhaseReport, RallyMatch, SetupError};

/// Commands sent from the transport layer into the match task.
#[derive(Debug)]
pub enum MatchCommand {
    ProgramCard(ProgramCardMsg),
    PowerDown(PowerDownMsg),
    PlayerLeft { player_number: PlayerId },
    Stop,
}

/// Broadcasts from the match task to all connected clients.
#[derive(Debug, Clone)]
pub enum MatchBroadcast {
    /// Pre-encoded `ServerMessage` bytes. `Bytes` clones are zero-copy
    /// across per-player send queues.
    EncodedMessage(Bytes),
    /// The match is over and the task has exited.
    MatchEnded,
}

/// Everything needed to start a match session.
pub struct MatchSessionConfig {
    pub board: BoardDef,
    pub players: Vec<Player>,
    pub match_config: MatchConfig,
}

/// Validate the board and roster, then spawn the match task.
///
/// The task is the only owner of all mutable match state: commands go in
/// through the returned sender, encoded broadcasts come out the receiver.
/// Setup failures (malformed board, missing start markers) are returned
/// here, before the turn loop ever starts.
pub fn spawn_match_session(
    config: MatchSessionConfig,
) -> Result<
    (
        mpsc::UnboundedSender<MatchCommand>,
        mpsc::UnboundedReceiver<MatchBroadcast>,
        JoinHandle<()>,
    ),
    SetupError,
> {
    let board = Board::from_def(&config.board)?;
    let game = RallyMatch::new(board, &config.players, &config.match_config)?;

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(run_match_loop(game, config.players, cmd_rx, broadcast_tx));
    Ok((cmd_tx, broadcast_rx, handle))
}

/// The authoritative match loop: suspend on the readiness gate, resolve a
/// round, broadcast each phase, repeat until game over.
async fn run_match_loop(
    mut game: RallyMatch,
    players: Vec<Player>,
    mut cmd_rx: mpsc::UnboundedReceiver<MatchCommand>,
    broadcast_tx: mpsc::UnboundedSender<MatchBroadcast>,
) {
    broadcast(
        &broadcast_tx,
        &ServerMessage::MatchStart(MatchStartMsg {
            board_name: game.board().name().to_string(),
            flag_count: game.board().flag_count(),
            players,
        }),
    );

    loop {
        // The "all moves received" gate. The task suspends here; each
        // incoming card fills one register slot, and the gate opens only
        // once every active, non-forfeited, non-powered-down robot has a
        // full program. Receiving is the sole entry point for external
        // state, so registers are never touched mid-resolution.
        while !game.all_programs_ready() {
            match cmd_rx.recv().await {
                Some(MatchCommand::ProgramCard(msg)) => {
                    if let Err(e) = game.submit_card(&msg) {
                        tracing::warn!(
                            player = msg.player_number,
                            error = %e,
                            "Rejected program card"
                        );
                    }
                },
                Some(MatchCommand::PowerDown(msg)) => {
                    game.announce_power_down(msg.player_number, msg.announce);
                },
                Some(MatchCommand::PlayerLeft { player_number }) => {
                    // Forfeit: already-programmed cards still execute, the
                    // gate stops waiting on this player.
                    game.forfeit(player_number);
                },
                Some(MatchCommand::Stop) | None => {
                    end_match(&broadcast_tx, None, MatchOutcome::Aborted);
                    return;
                },
            }
        }

        if game.robots().iter().all(|r| r.forfeited) {
            end_match(&broadcast_tx, None, MatchOutcome::Aborted);
            return;
        }

        game.play_round(|report| {
            broadcast(&broadcast_tx, &ServerMessage::PhaseState(phase_state(report)));
        });
        broadcast(
            &broadcast_tx,
            &ServerMessage::RoundEnd(RoundEndMsg {
                round: game.round(),
            }),
        );

        // Game over is the session's call, not the engine's.
        if let Some(winner) = game.winner() {
            end_match(
                &broadcast_tx,
                Some(winner),
                MatchOutcome::AllFlagsCollected,
            );
            return;
        }
        if game.surviving_players() < 2 {
            let winner = game.robots().first().map(|r| r.player_number);
            end_match(&broadcast_tx, winner, MatchOutcome::LastRobotStanding);
            return;
        }
    }
}

fn phase_state(report: &PhaseReport) -> PhaseStateMsg {
    PhaseStateMsg {
        round: report.round,
        register: report.register,
        phase: report.phase,
        robots: report.robots.clone(),
        lasers: report.lasers.clone(),
    }
}

fn broadcast(tx: &mpsc::UnboundedSender<MatchBroadcast>, msg: &ServerMessage) {
    match encode_server_message(msg) {
        Ok(data) => {
            let _ = tx.send(MatchBroadcast::EncodedMessage(Bytes::from(data)));
        },
        Err(e) => tracing::error!(error = %e, "Failed to encode broadcast"),
    }
}

fn end_match(
    tx: &mpsc::UnboundedSender<MatchBroadcast>,
    winner: Option<PlayerId>,
    outcome: MatchOutcome,
) {
    broadcast(tx, &ServerMessage::MatchEnd(MatchEndMsg { winner, outcome }));
    let _ = tx.send(MatchBroadcast::MatchEnded);
}
