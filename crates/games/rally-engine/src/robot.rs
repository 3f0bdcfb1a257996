use rally_core::cards::ProgramCard;
use rally_core::grid::{Direction, Pos};
use rally_core::player::PlayerId;

/// Number of program registers each robot fills per round.
pub const REGISTER_COUNT: usize = 5;

/// Damage at which a robot loses a life token.
pub const DAMAGE_LIMIT: u8 = 10;

/// Cards dealt to an undamaged robot.
pub const BASE_HAND_SIZE: u8 = 9;

/// A pending belt movement, held only between intent collection and
/// application within a single belt phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeltPush {
    pub direction: Direction,
    pub to: Pos,
}

/// The five program register slots. Slots lock from the back as damage
/// grows; a locked slot keeps its card across round cleanup.
#[derive(Debug, Clone, Default)]
pub struct Registers {
    slots: [Option<ProgramCard>; REGISTER_COUNT],
    locked: [bool; REGISTER_COUNT],
}

impl Registers {
    /// Place a card in the first open slot. Returns false when the program
    /// is already full.
    pub fn add(&mut self, card: ProgramCard) -> bool {
        for slot in &mut self.slots {
            if slot.is_none() {
                *slot = Some(card);
                return true;
            }
        }
        false
    }

    pub fn card(&self, register: usize) -> Option<&ProgramCard> {
        self.slots.get(register).and_then(|s| s.as_ref())
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }

    pub fn is_locked(&self, register: usize) -> bool {
        self.locked.get(register).copied().unwrap_or(false)
    }

    /// Re-derive slot locks from the robot's damage: 5 damage locks
    /// register 5, 6 locks register 4, and so on up to 9 locking them all.
    pub fn lock_from_damage(&mut self, damage: u8) {
        for (i, locked) in self.locked.iter_mut().enumerate() {
            *locked = damage >= DAMAGE_LIMIT - (i as u8 + 1);
        }
    }

    /// Empty the unlocked slots, returning their cards for the discard pile.
    pub fn clear_unlocked(&mut self) -> Vec<ProgramCard> {
        let mut returned = Vec::new();
        for (slot, &locked) in self.slots.iter_mut().zip(&self.locked) {
            if !locked && let Some(card) = slot.take() {
                returned.push(card);
            }
        }
        returned
    }

    /// Empty every slot regardless of locks (elimination cleanup).
    pub fn clear_all(&mut self) -> Vec<ProgramCard> {
        self.locked = [false; REGISTER_COUNT];
        self.slots.iter_mut().filter_map(Option::take).collect()
    }
}

/// Per-robot mutable state.
#[derive(Debug, Clone)]
pub struct Robot {
    pub player_number: PlayerId,
    pub pos: Pos,
    pub facing: Direction,
    pub damage: u8,
    pub lives: u8,
    pub backup_pos: Pos,
    pub backup_facing: Direction,
    pub flags_collected: Vec<u8>,
    pub registers: Registers,
    pub hand: Vec<ProgramCard>,
    /// Power-down requested for the upcoming round.
    pub announced_power_down: bool,
    /// Sitting out the current round; repaired, deals no cards, fires no laser.
    pub powered_down: bool,
    /// Disconnected: no further cards arrive, already-programmed ones still run.
    pub forfeited: bool,
    pub belt_push: Option<BeltPush>,
    /// Direction of the most recent belt push, until the next programmed move.
    pub last_belt_dir: Option<Direction>,
}

impl Robot {
    pub fn new(player_number: PlayerId, pos: Pos, lives: u8) -> Self {
        Self {
            player_number,
            pos,
            facing: Direction::East,
            damage: 0,
            lives,
            backup_pos: pos,
            backup_facing: Direction::East,
            flags_collected: Vec::new(),
            registers: Registers::default(),
            hand: Vec::new(),
            announced_power_down: false,
            powered_down: false,
            forfeited: false,
            belt_push: None,
            last_belt_dir: None,
        }
    }

    pub fn apply_damage(&mut self) {
        self.damage = (self.damage + 1).min(DAMAGE_LIMIT);
    }

    pub fn is_destroyed(&self) -> bool {
        self.lives == 0
    }

    /// Hand size for the next deal: `9 − damage`, floored at zero.
    /// Powered-down robots are dealt nothing.
    pub fn cards_dealt(&self) -> usize {
        if self.powered_down {
            return 0;
        }
        BASE_HAND_SIZE.saturating_sub(self.damage) as usize
    }

    /// The flag number this robot needs next.
    pub fn next_flag(&self) -> u8 {
        self.flags_collected.len() as u8 + 1
    }

    /// Collect `flag` if it is the next one in order. Out-of-order flags
    /// are ignored without penalty.
    pub fn collect_flag(&mut self, flag: u8) -> bool {
        if flag == self.next_flag() {
            self.flags_collected.push(flag);
            true
        } else {
            false
        }
    }

    pub fn set_backup(&mut self, pos: Pos, facing: Direction) {
        self.backup_pos = pos;
        self.backup_facing = facing;
    }
}
