pub mod board;
pub mod cards;
pub mod config;
pub mod hazards;
pub mod movement;
pub mod respawn;
pub mod robot;

use rand::SeedableRng;
use rand::rngs::StdRng;

use rally_core::cards::{CardError, ProgramCard, Rotate};
use rally_core::grid::Pos;
use rally_core::net::messages::{LaserOverlayCell, Phase, ProgramCardMsg, RobotStatus};
use rally_core::player::{MAX_PLAYERS, Player, PlayerId};

use board::{Board, BoardError};
use cards::Deck;
use config::MatchConfig;
use movement::MoveOutcome;
use robot::{DAMAGE_LIMIT, REGISTER_COUNT, Robot};

/// Events emitted while a phase resolves (wall impacts for the audio
/// collaborator, hits, eliminations, checkpoints).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    WallImpact {
        player: PlayerId,
    },
    LaserHit {
        shooter: Option<PlayerId>,
        target: PlayerId,
    },
    CheckpointCollected {
        player: PlayerId,
        flag: u8,
    },
    RobotEliminated {
        player: PlayerId,
        lives_left: u8,
    },
    RobotDestroyed {
        player: PlayerId,
    },
    RoundComplete {
        round: u32,
    },
}

/// Everything an observer needs after one completed phase.
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub round: u32,
    /// Register index 0..=4; `REGISTER_COUNT` for the cleanup report.
    pub register: u8,
    pub phase: Phase,
    pub events: Vec<EngineEvent>,
    pub robots: Vec<RobotStatus>,
    pub lasers: Vec<LaserOverlayCell>,
}

/// Match setup failures. These abort before the turn loop ever starts.
#[derive(Debug)]
pub enum SetupError {
    Board(BoardError),
    NoPlayers,
    TooManyPlayers(usize),
    MissingStartPosition(PlayerId),
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Board(e) => write!(f, "malformed board: {e}"),
            Self::NoPlayers => write!(f, "a match needs at least one robot"),
            Self::TooManyPlayers(n) => write!(f, "{n} players exceed the {MAX_PLAYERS} slots"),
            Self::MissingStartPosition(n) => {
                write!(f, "board has no start marker for player {n}")
            },
        }
    }
}

impl std::error::Error for SetupError {}

impl From<BoardError> for SetupError {
    fn from(e: BoardError) -> Self {
        Self::Board(e)
    }
}

/// Why a submitted card was refused. Never fatal: the register slot stays
/// empty and resolution proceeds.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitError {
    UnknownPlayer(PlayerId),
    InvalidCard(CardError),
    ProgramFull(PlayerId),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPlayer(n) => write!(f, "no active robot for player {n}"),
            Self::InvalidCard(e) => write!(f, "invalid card: {e}"),
            Self::ProgramFull(n) => write!(f, "player {n} already has five cards"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// The authoritative match state and turn engine.
///
/// Drives the fixed phase sequence for each of the five registers:
/// reveal/move, express belts, all belts, rotate pads, player lasers,
/// board lasers, checkpoints, then round cleanup. All mutation happens on
/// the single task that calls [`RallyMatch::play_round`]; a phase runs to
/// completion before any state is observable.
pub struct RallyMatch {
    board: Board,
    robots: Vec<Robot>,
    pending_respawn: Vec<Robot>,
    destroyed: Vec<Robot>,
    deck: Deck,
    rng: StdRng,
    round: u32,
    events: Vec<EngineEvent>,
}

impl RallyMatch {
    pub fn new(board: Board, players: &[Player], config: &MatchConfig) -> Result<Self, SetupError> {
        let active: Vec<&Player> = players.iter().filter(|p| !p.is_spectator).collect();
        if active.is_empty() {
            return Err(SetupError::NoPlayers);
        }
        if active.len() > MAX_PLAYERS {
            return Err(SetupError::TooManyPlayers(active.len()));
        }

        let mut robots = Vec::with_capacity(active.len());
        for player in active {
            let start = board
                .start_position(player.number)
                .ok_or(SetupError::MissingStartPosition(player.number))?;
            robots.push(Robot::new(player.number, start, config.life_tokens));
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let deck = Deck::standard(&mut rng);

        let mut game = Self {
            board,
            robots,
            pending_respawn: Vec::new(),
            destroyed: Vec::new(),
            deck,
            rng,
            round: 0,
            events: Vec::new(),
        };
        game.deal_hands();
        Ok(game)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Active robots, in roster order.
    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    /// Look up a robot anywhere: active, awaiting respawn, or destroyed.
    pub fn robot(&self, number: PlayerId) -> Option<&Robot> {
        self.robots
            .iter()
            .chain(&self.pending_respawn)
            .chain(&self.destroyed)
            .find(|r| r.player_number == number)
    }

    /// Robots still in the match (active or awaiting respawn).
    pub fn surviving_players(&self) -> usize {
        self.robots.len() + self.pending_respawn.len()
    }

    /// The player who has collected every flag, if any.
    pub fn winner(&self) -> Option<PlayerId> {
        let goal = self.board.flag_count();
        if goal == 0 {
            return None;
        }
        self.robots
            .iter()
            .chain(&self.pending_respawn)
            .find(|r| r.flags_collected.len() as u8 >= goal)
            .map(|r| r.player_number)
    }

    /// Accept one programmed card into the sender's next open register.
    /// Malformed cards are rejected and the slot stays empty.
    pub fn submit_card(&mut self, msg: &ProgramCardMsg) -> Result<(), SubmitError> {
        let card = ProgramCard {
            priority: msg.priority,
            distance: msg.distance,
            rotate: msg.rotation,
            name: msg.name.clone(),
        };
        card.validate().map_err(SubmitError::InvalidCard)?;

        let robot = self
            .robots
            .iter_mut()
            .find(|r| r.player_number == msg.player_number)
            .ok_or(SubmitError::UnknownPlayer(msg.player_number))?;
        if !robot.registers.add(card) {
            return Err(SubmitError::ProgramFull(msg.player_number));
        }
        Ok(())
    }

    /// The "all moves received" gate: true once every robot expected to act
    /// this round has a full program. Forfeited and powered-down robots are
    /// not waited on.
    pub fn all_programs_ready(&self) -> bool {
        self.robots
            .iter()
            .filter(|r| !r.forfeited && !r.powered_down)
            .all(|r| r.registers.is_full())
    }

    /// Mark a disconnected player. Cards already programmed still execute;
    /// the readiness gate stops waiting on them.
    pub fn forfeit(&mut self, number: PlayerId) {
        for robot in self
            .robots
            .iter_mut()
            .chain(self.pending_respawn.iter_mut())
        {
            if robot.player_number == number {
                robot.forfeited = true;
            }
        }
    }

    /// Announce (or withdraw) a power-down taking effect at next cleanup.
    pub fn announce_power_down(&mut self, number: PlayerId, announce: bool) {
        for robot in self
            .robots
            .iter_mut()
            .chain(self.pending_respawn.iter_mut())
        {
            if robot.player_number == number {
                robot.announced_power_down = announce;
            }
        }
    }

    /// Current per-robot state, ordered by player number.
    pub fn snapshot(&self) -> Vec<RobotStatus> {
        let mut robots: Vec<RobotStatus> = self.robots.iter().map(robot_status).collect();
        robots.sort_by_key(|r| r.player_number);
        robots
    }

    /// Resolve one full round: five registers of the fixed phase sequence,
    /// then cleanup. `on_phase` observes every completed phase.
    pub fn play_round(&mut self, mut on_phase: impl FnMut(&PhaseReport)) {
        self.round += 1;
        for register in 0..REGISTER_COUNT {
            let reg = register as u8;

            self.reveal_move(register);
            self.report(&mut on_phase, reg, Phase::RevealMove);

            hazards::run_belts(&self.board, &mut self.robots, true);
            self.check_eliminations();
            self.report(&mut on_phase, reg, Phase::ExpressBelts);

            hazards::run_belts(&self.board, &mut self.robots, false);
            self.check_eliminations();
            self.report(&mut on_phase, reg, Phase::AllBelts);

            hazards::run_rotate_pads(&self.board, &mut self.robots);
            self.report(&mut on_phase, reg, Phase::RotatePads);

            hazards::fire_player_lasers(&mut self.board, &mut self.robots, &mut self.events);
            self.check_eliminations();
            self.report(&mut on_phase, reg, Phase::PlayerLasers);
            self.board.clear_lasers();

            if !self.board.emitters().is_empty() {
                hazards::fire_board_lasers(&mut self.board, &mut self.robots, &mut self.events);
                self.check_eliminations();
            }
            self.report(&mut on_phase, reg, Phase::BoardLasers);
            self.board.clear_lasers();

            self.touch_checkpoints();
            self.report(&mut on_phase, reg, Phase::Checkpoints);
        }

        self.round_cleanup();
        self.report(&mut on_phase, REGISTER_COUNT as u8, Phase::Cleanup);
    }

    fn report(&mut self, on_phase: &mut impl FnMut(&PhaseReport), register: u8, phase: Phase) {
        let lasers = self
            .board
            .laser_overlay()
            .into_iter()
            .map(|(pos, o)| LaserOverlayCell {
                pos,
                vertical: o.vertical,
                horizontal: o.horizontal,
            })
            .collect();
        let report = PhaseReport {
            round: self.round,
            register,
            phase,
            events: std::mem::take(&mut self.events),
            robots: self.snapshot(),
            lasers,
        };
        on_phase(&report);
    }

    /// Reveal and execute register `register` for every robot holding a
    /// card there, in descending card priority. Equal priorities resolve
    /// by ascending player number.
    fn reveal_move(&mut self, register: usize) {
        let mut order: Vec<(u32, PlayerId)> = self
            .robots
            .iter()
            .filter(|r| !r.powered_down)
            .filter_map(|r| {
                r.registers
                    .card(register)
                    .map(|c| (c.priority, r.player_number))
            })
            .collect();
        order.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        for (_, number) in order {
            // The robot may have been eliminated by an earlier card.
            let Some(idx) = self.robots.iter().position(|r| r.player_number == number) else {
                continue;
            };
            let Some(card) = self.robots[idx].registers.card(register).cloned() else {
                continue;
            };
            self.play_card(idx, &card);
            self.check_eliminations();
        }
    }

    fn play_card(&mut self, idx: usize, card: &ProgramCard) {
        match card.rotate {
            Rotate::Left => {
                self.robots[idx].facing = self.robots[idx].facing.turn_left();
            },
            Rotate::Right => {
                self.robots[idx].facing = self.robots[idx].facing.turn_right();
            },
            Rotate::UTurn => {
                self.robots[idx].facing = self.robots[idx].facing.opposite();
            },
            Rotate::None => {
                // Back-up moves against the facing without turning.
                let direction = if card.distance < 0 {
                    self.robots[idx].facing.opposite()
                } else {
                    self.robots[idx].facing
                };
                for _ in 0..card.distance.unsigned_abs() {
                    let outcome = movement::attempt_move(
                        &self.board,
                        &mut self.robots,
                        idx,
                        direction,
                        &mut self.events,
                    );
                    if outcome == MoveOutcome::Blocked {
                        break;
                    }
                }
            },
        }
    }

    fn touch_checkpoints(&mut self) {
        for robot in &mut self.robots {
            let Some(flag) = self.board.flag_at(robot.pos) else {
                continue;
            };
            if robot.collect_flag(flag) {
                // A collected checkpoint becomes the new safe spot.
                robot.set_backup(robot.pos, robot.facing);
                self.events.push(EngineEvent::CheckpointCollected {
                    player: robot.player_number,
                    flag,
                });
            }
        }
    }

    /// Remove robots over the damage limit or off the board. Runs only at
    /// the phase boundaries defined by the turn sequence.
    fn check_eliminations(&mut self) {
        let mut i = 0;
        while i < self.robots.len() {
            let pos = self.robots[i].pos;
            let gone = !self.board.inside(pos) || self.board.is_hole(pos);
            if self.robots[i].damage < DAMAGE_LIMIT && !gone {
                i += 1;
                continue;
            }

            let mut robot = self.robots.remove(i);
            robot.lives = robot.lives.saturating_sub(1);
            robot.damage = 0;
            robot.belt_push = None;
            robot.last_belt_dir = None;
            self.deck.discard_all(robot.registers.clear_all());
            self.deck.discard_all(robot.hand.drain(..));
            self.events.push(EngineEvent::RobotEliminated {
                player: robot.player_number,
                lives_left: robot.lives,
            });
            if robot.is_destroyed() {
                self.events.push(EngineEvent::RobotDestroyed {
                    player: robot.player_number,
                });
                self.destroyed.push(robot);
            } else {
                self.pending_respawn.push(robot);
            }
        }
    }

    fn round_cleanup(&mut self) {
        for mut robot in std::mem::take(&mut self.pending_respawn) {
            let occupied: Vec<Pos> = self.robots.iter().map(|r| r.pos).collect();
            let (pos, facing) = respawn::place_at_backup(&self.board, &occupied, &robot, &mut self.rng);
            robot.pos = pos;
            robot.facing = facing;
            self.robots.push(robot);
        }

        for robot in &mut self.robots {
            if robot.announced_power_down {
                // Powering down repairs everything.
                robot.powered_down = true;
                robot.announced_power_down = false;
                robot.damage = 0;
            } else if robot.powered_down {
                robot.powered_down = false;
            }

            robot.registers.lock_from_damage(robot.damage);
            let returned = robot.registers.clear_unlocked();
            self.deck.discard_all(returned);
            let hand: Vec<ProgramCard> = robot.hand.drain(..).collect();
            self.deck.discard_all(hand);
        }

        self.deal_hands();
        self.events.push(EngineEvent::RoundComplete { round: self.round });
    }

    fn deal_hands(&mut self) {
        for idx in 0..self.robots.len() {
            let want = self.robots[idx].cards_dealt();
            while self.robots[idx].hand.len() < want {
                match self.deck.draw(&mut self.rng) {
                    Some(card) => self.robots[idx].hand.push(card),
                    None => break,
                }
            }
        }
    }
}

fn robot_status(robot: &Robot) -> RobotStatus {
    RobotStatus {
        player_number: robot.player_number,
        pos: robot.pos,
        facing: robot.facing,
        damage: robot.damage,
        lives: robot.lives,
        flags_collected: robot.flags_collected.len() as u8,
        powered_down: robot.powered_down,
    }
}
