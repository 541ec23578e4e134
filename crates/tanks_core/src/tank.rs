//! Tanks and their movement/cooldown state machine.

use serde::{Deserialize, Serialize};

use crate::action::ActionRequest;
use crate::board::GameBoard;
use crate::direction::Direction;
use crate::geometry::Point;

/// Turns a tank must wait after firing before it may fire again.
pub const SHOOT_COOLDOWN: u8 = 4;

/// Turns a backward request stays pending before the tank moves.
pub const BACKWARD_DELAY: u8 = 2;

/// Shells a tank carries when the game does not say otherwise.
pub const DEFAULT_SHELLS: u32 = 16;

/// Progress of a backward move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackwardState {
    /// No backward move requested.
    Idle {
        /// The last move was a committed backward move, so the next backward
        /// request moves at once.
        continuous: bool,
    },
    /// Waiting out the backward delay.
    Pending {
        /// Turns spent waiting so far, including the request turn.
        counter: u8,
        /// Cell the tank will reverse into, fixed at request time.
        target: Point,
    },
}

impl Default for BackwardState {
    fn default() -> Self {
        Self::Idle { continuous: false }
    }
}

/// Side effect of an action that the game has to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankEffect {
    /// Nothing beyond the tank's own state changed.
    None,
    /// A shell must be spawned at the tank's cell, facing its direction.
    Fire,
    /// The tank's player must be handed a battlefield view.
    BattleInfo,
}

/// Result of applying one action to a tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TankResponse {
    /// Whether the request was honored.
    pub applied: bool,
    /// What the game must do next.
    pub effect: TankEffect,
}

impl TankResponse {
    const fn applied() -> Self {
        Self {
            applied: true,
            effect: TankEffect::None,
        }
    }

    const fn ignored() -> Self {
        Self {
            applied: false,
            effect: TankEffect::None,
        }
    }

    const fn with_effect(effect: TankEffect) -> Self {
        Self {
            applied: true,
            effect,
        }
    }
}

/// A tank on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tank {
    player_id: u8,
    tank_index: usize,
    position: Point,
    previous_position: Point,
    direction: Direction,
    shells: u32,
    cooldown: u8,
    backward: BackwardState,
    destroyed: bool,
}

impl Tank {
    /// Create a tank at rest.
    #[must_use]
    pub fn new(
        player_id: u8,
        tank_index: usize,
        position: Point,
        direction: Direction,
        shells: u32,
    ) -> Self {
        Self {
            player_id,
            tank_index,
            position,
            previous_position: position,
            direction,
            shells,
            cooldown: 0,
            backward: BackwardState::default(),
            destroyed: false,
        }
    }

    /// Owning player.
    #[must_use]
    pub const fn player_id(&self) -> u8 {
        self.player_id
    }

    /// Index of this tank among its player's tanks.
    #[must_use]
    pub const fn tank_index(&self) -> usize {
        self.tank_index
    }

    /// Current cell.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Cell at the start of the current turn.
    #[must_use]
    pub const fn previous_position(&self) -> Point {
        self.previous_position
    }

    /// Facing.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Shells left.
    #[must_use]
    pub const fn shells(&self) -> u32 {
        self.shells
    }

    /// Turns until the tank may fire again.
    #[must_use]
    pub const fn cooldown(&self) -> u8 {
        self.cooldown
    }

    /// Backward movement progress.
    #[must_use]
    pub const fn backward_state(&self) -> BackwardState {
        self.backward
    }

    /// Whether a backward move is waiting out its delay.
    #[must_use]
    pub const fn is_backward_pending(&self) -> bool {
        matches!(self.backward, BackwardState::Pending { .. })
    }

    /// Whether the tank has been destroyed.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Mark the tank destroyed.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    /// Start a new turn from the current cell.
    pub fn settle(&mut self) {
        self.previous_position = self.position;
    }

    /// Whether the tank may fire right now.
    #[must_use]
    pub const fn can_shoot(&self) -> bool {
        !self.destroyed && self.cooldown == 0 && self.shells > 0
    }

    /// Spend a shell and start the cooldown. Returns `false` if the tank
    /// cannot fire.
    pub fn shoot(&mut self) -> bool {
        if !self.can_shoot() {
            return false;
        }
        self.shells -= 1;
        self.cooldown = SHOOT_COOLDOWN;
        true
    }

    /// Count down the firing cooldown by one turn.
    pub fn update_cooldowns(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    /// Apply a requested action.
    ///
    /// Movement is checked against the board's walls; everything else about
    /// the destination is left to collision resolution.
    pub fn apply_action(&mut self, action: ActionRequest, board: &GameBoard) -> TankResponse {
        if self.destroyed {
            return TankResponse::ignored();
        }

        if let BackwardState::Pending { counter, target } = self.backward {
            return self.apply_while_pending(action, board, counter, target);
        }

        match action {
            ActionRequest::MoveForward => self.move_forward(board),
            ActionRequest::MoveBackward => self.request_backward(board),
            ActionRequest::RotateLeft45 => self.rotate(self.direction.rotate_left(false)),
            ActionRequest::RotateRight45 => self.rotate(self.direction.rotate_right(false)),
            ActionRequest::RotateLeft90 => self.rotate(self.direction.rotate_left(true)),
            ActionRequest::RotateRight90 => self.rotate(self.direction.rotate_right(true)),
            ActionRequest::Shoot => {
                if self.shoot() {
                    self.backward = BackwardState::Idle { continuous: false };
                    TankResponse::with_effect(TankEffect::Fire)
                } else {
                    TankResponse::ignored()
                }
            }
            ActionRequest::GetBattleInfo => TankResponse::with_effect(TankEffect::BattleInfo),
            ActionRequest::DoNothing => TankResponse::applied(),
        }
    }

    fn apply_while_pending(
        &mut self,
        action: ActionRequest,
        board: &GameBoard,
        counter: u8,
        target: Point,
    ) -> TankResponse {
        // Refused forward moves and shots never reach the backward sequence.
        match action {
            ActionRequest::MoveForward => {
                let ahead = board.wrap_position(self.position + self.direction.delta());
                if !board.can_move_to(ahead) {
                    return TankResponse::ignored();
                }
                self.backward = BackwardState::Idle { continuous: false };
                self.position = ahead;
                return TankResponse::applied();
            }
            ActionRequest::Shoot if !self.can_shoot() => return TankResponse::ignored(),
            _ => {}
        }

        let counter = counter + 1;
        if counter > BACKWARD_DELAY {
            self.position = target;
            self.backward = BackwardState::Idle { continuous: true };
            tracing::trace!(
                player = self.player_id,
                tank = self.tank_index,
                to = %target,
                "Backward move committed"
            );
        } else {
            self.backward = BackwardState::Pending { counter, target };
        }

        if action == ActionRequest::DoNothing {
            TankResponse::applied()
        } else {
            TankResponse::ignored()
        }
    }

    fn move_forward(&mut self, board: &GameBoard) -> TankResponse {
        let ahead = board.wrap_position(self.position + self.direction.delta());
        if !board.can_move_to(ahead) {
            return TankResponse::ignored();
        }
        self.position = ahead;
        self.backward = BackwardState::Idle { continuous: false };
        TankResponse::applied()
    }

    fn request_backward(&mut self, board: &GameBoard) -> TankResponse {
        let behind = board.wrap_position(self.position + self.direction.opposite().delta());
        if !board.can_move_to(behind) {
            return TankResponse::ignored();
        }

        if self.backward == (BackwardState::Idle { continuous: true }) {
            self.position = behind;
        } else {
            self.backward = BackwardState::Pending {
                counter: 1,
                target: behind,
            };
        }
        TankResponse::applied()
    }

    fn rotate(&mut self, to: Direction) -> TankResponse {
        self.direction = to;
        self.backward = BackwardState::Idle { continuous: false };
        TankResponse::applied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::CellType;

    fn tank_at(x: i32, y: i32, direction: Direction) -> Tank {
        Tank::new(1, 0, Point::new(x, y), direction, DEFAULT_SHELLS)
    }

    #[test]
    fn test_move_forward_wraps() {
        let board = GameBoard::new(5, 5).unwrap();
        let mut tank = tank_at(0, 2, Direction::Left);
        let response = tank.apply_action(ActionRequest::MoveForward, &board);
        assert!(response.applied);
        assert_eq!(tank.position(), Point::new(4, 2));
        assert_eq!(tank.previous_position(), Point::new(0, 2));
    }

    #[test]
    fn test_move_into_wall_is_ignored() {
        let mut board = GameBoard::new(5, 5).unwrap();
        board.set_cell_type(Point::new(3, 2), CellType::Wall);
        let mut tank = tank_at(2, 2, Direction::Right);
        let response = tank.apply_action(ActionRequest::MoveForward, &board);
        assert!(!response.applied);
        assert_eq!(tank.position(), Point::new(2, 2));
    }

    #[test]
    fn test_backward_takes_three_turns() {
        let board = GameBoard::new(10, 10).unwrap();
        let mut tank = tank_at(5, 5, Direction::Up);
        let start = tank.position();

        assert!(tank.apply_action(ActionRequest::MoveBackward, &board).applied);
        assert_eq!(tank.position(), start);
        assert!(tank.is_backward_pending());

        assert!(!tank.apply_action(ActionRequest::MoveBackward, &board).applied);
        assert_eq!(tank.position(), start);

        assert!(!tank.apply_action(ActionRequest::MoveBackward, &board).applied);
        assert_eq!(tank.position(), Point::new(5, 6));
        assert_eq!(
            tank.backward_state(),
            BackwardState::Idle { continuous: true }
        );

        // Continuous backward moves right away.
        assert!(tank.apply_action(ActionRequest::MoveBackward, &board).applied);
        assert_eq!(tank.position(), Point::new(5, 7));
    }

    #[test]
    fn test_forward_cancels_pending_backward() {
        let board = GameBoard::new(10, 10).unwrap();
        let mut tank = tank_at(5, 5, Direction::Up);

        tank.apply_action(ActionRequest::MoveBackward, &board);
        let response = tank.apply_action(ActionRequest::MoveForward, &board);
        assert!(response.applied);
        assert_eq!(tank.position(), Point::new(5, 4));
        assert_eq!(tank.backward_state(), BackwardState::default());

        // The old request is gone.
        tank.apply_action(ActionRequest::DoNothing, &board);
        assert_eq!(tank.position(), Point::new(5, 4));
    }

    #[test]
    fn test_other_actions_while_pending_are_ignored_but_count() {
        let board = GameBoard::new(10, 10).unwrap();
        let mut tank = tank_at(5, 5, Direction::Right);

        tank.apply_action(ActionRequest::MoveBackward, &board);
        assert!(!tank.apply_action(ActionRequest::RotateLeft90, &board).applied);
        assert_eq!(tank.direction(), Direction::Right);

        let response = tank.apply_action(ActionRequest::Shoot, &board);
        assert!(!response.applied);
        assert_eq!(response.effect, TankEffect::None);
        assert_eq!(tank.shells(), DEFAULT_SHELLS);
        assert_eq!(tank.position(), Point::new(4, 5));
    }

    #[test]
    fn test_blocked_forward_while_pending_does_not_count() {
        let mut board = GameBoard::new(10, 10).unwrap();
        board.set_cell_type(Point::new(5, 4), CellType::Wall);
        let mut tank = tank_at(5, 5, Direction::Up);

        tank.apply_action(ActionRequest::MoveBackward, &board);
        assert!(!tank.apply_action(ActionRequest::MoveForward, &board).applied);
        tank.apply_action(ActionRequest::DoNothing, &board);
        assert_eq!(tank.position(), Point::new(5, 5));
        assert!(tank.is_backward_pending());

        tank.apply_action(ActionRequest::DoNothing, &board);
        assert_eq!(tank.position(), Point::new(5, 6));
    }

    #[test]
    fn test_refused_shot_while_pending_does_not_count() {
        let board = GameBoard::new(10, 10).unwrap();
        let mut tank = tank_at(5, 5, Direction::Up);

        tank.apply_action(ActionRequest::Shoot, &board);
        assert!(tank.cooldown() > 0);
        tank.apply_action(ActionRequest::MoveBackward, &board);
        assert!(!tank.apply_action(ActionRequest::Shoot, &board).applied);
        tank.apply_action(ActionRequest::DoNothing, &board);
        assert_eq!(tank.position(), Point::new(5, 5));

        tank.apply_action(ActionRequest::DoNothing, &board);
        assert_eq!(tank.position(), Point::new(5, 6));
        assert_eq!(tank.shells(), DEFAULT_SHELLS - 1);
    }

    #[test]
    fn test_do_nothing_while_pending_is_applied() {
        let board = GameBoard::new(10, 10).unwrap();
        let mut tank = tank_at(5, 5, Direction::Right);
        tank.apply_action(ActionRequest::MoveBackward, &board);
        assert!(tank.apply_action(ActionRequest::DoNothing, &board).applied);
        assert!(tank.apply_action(ActionRequest::DoNothing, &board).applied);
        assert_eq!(tank.position(), Point::new(4, 5));
    }

    #[test]
    fn test_rotation_clears_continuous_backward() {
        let board = GameBoard::new(10, 10).unwrap();
        let mut tank = tank_at(5, 5, Direction::Up);
        for _ in 0..3 {
            tank.apply_action(ActionRequest::MoveBackward, &board);
        }
        tank.apply_action(ActionRequest::RotateRight45, &board);
        assert_eq!(tank.direction(), Direction::UpRight);

        tank.apply_action(ActionRequest::MoveBackward, &board);
        assert!(tank.is_backward_pending());
        assert_eq!(tank.position(), Point::new(5, 6));
    }

    #[test]
    fn test_shoot_cooldown_and_ammo() {
        let board = GameBoard::new(5, 5).unwrap();
        let mut tank = Tank::new(2, 0, Point::new(1, 1), Direction::Right, 1);

        let response = tank.apply_action(ActionRequest::Shoot, &board);
        assert_eq!(response.effect, TankEffect::Fire);
        assert_eq!(tank.cooldown(), SHOOT_COOLDOWN);
        assert_eq!(tank.shells(), 0);

        for _ in 0..SHOOT_COOLDOWN {
            tank.update_cooldowns();
        }
        assert_eq!(tank.cooldown(), 0);
        assert!(!tank.can_shoot());
        assert!(!tank.apply_action(ActionRequest::Shoot, &board).applied);
    }

    #[test]
    fn test_get_battle_info_requests_view() {
        let board = GameBoard::new(5, 5).unwrap();
        let mut tank = tank_at(1, 1, Direction::Up);
        let response = tank.apply_action(ActionRequest::GetBattleInfo, &board);
        assert_eq!(response.effect, TankEffect::BattleInfo);

        tank.apply_action(ActionRequest::MoveBackward, &board);
        let response = tank.apply_action(ActionRequest::GetBattleInfo, &board);
        assert!(!response.applied);
        assert_eq!(response.effect, TankEffect::None);
    }

    #[test]
    fn test_destroyed_tank_does_nothing() {
        let board = GameBoard::new(5, 5).unwrap();
        let mut tank = tank_at(1, 1, Direction::Up);
        tank.destroy();
        assert!(!tank.apply_action(ActionRequest::MoveForward, &board).applied);
        assert!(!tank.can_shoot());
        assert_eq!(tank.position(), Point::new(1, 1));
    }
}
