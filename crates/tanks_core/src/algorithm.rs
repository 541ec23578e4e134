//! Contracts between the game and the code that drives tanks.
//!
//! Each tank is driven by a [`TankAlgorithm`] built by a
//! [`TankAlgorithmFactory`]. When a tank asks for battle info, its
//! [`Player`] receives a [`SatelliteView`] of the step's snapshot and decides
//! what to pass on.

use serde::{Deserialize, Serialize};

use crate::action::ActionRequest;
use crate::board::{CellType, GameBoard};
use crate::error::Result;
use crate::geometry::Point;
use crate::satellite::{self, SatelliteView};

/// Decision logic for a single tank.
pub trait TankAlgorithm {
    /// Action for the coming turn.
    fn get_action(&mut self) -> ActionRequest;

    /// Receive battlefield information requested earlier.
    fn update_battle_info(&mut self, info: &BattleInfo);
}

/// Coordinates the tanks of one player.
pub trait Player {
    /// Hand `tank` whatever it should know about the battlefield.
    fn update_tank_with_battle_info(
        &mut self,
        tank: &mut dyn TankAlgorithm,
        view: &dyn SatelliteView,
    );
}

/// Builds an algorithm for each tank when the game starts.
pub trait TankAlgorithmFactory {
    /// Algorithm for the `tank_index`-th tank of `player_id`.
    fn create(&self, player_id: u8, tank_index: usize) -> Box<dyn TankAlgorithm>;
}

impl<F> TankAlgorithmFactory for F
where
    F: Fn(u8, usize) -> Box<dyn TankAlgorithm>,
{
    fn create(&self, player_id: u8, tank_index: usize) -> Box<dyn TankAlgorithm> {
        self(player_id, tank_index)
    }
}

/// What a player learned from a satellite view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleInfo {
    /// Terrain as seen; tank and shell cells read as empty.
    pub board: GameBoard,
    /// Requesting tank, if it appeared in the view.
    pub own_position: Option<Point>,
    /// Other tanks of the same player.
    pub friendly_tanks: Vec<Point>,
    /// Tanks of every other player.
    pub enemy_tanks: Vec<Point>,
    /// Shells in flight.
    pub shells: Vec<Point>,
}

impl BattleInfo {
    /// Read a whole `width` x `height` view from `player_id`'s side.
    ///
    /// # Errors
    ///
    /// Fails only for unusable dimensions.
    pub fn from_view(
        view: &dyn SatelliteView,
        player_id: u8,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        let mut info = Self {
            board: GameBoard::new(width, height)?,
            own_position: None,
            friendly_tanks: Vec::new(),
            enemy_tanks: Vec::new(),
            shells: Vec::new(),
        };

        for y in 0..height {
            for x in 0..width {
                let cell = Point::new(x as i32, y as i32);
                match view.object_at(x, y) {
                    satellite::WALL_CHAR => info.board.set_cell_type(cell, CellType::Wall),
                    satellite::MINE_CHAR => info.board.set_cell_type(cell, CellType::Mine),
                    satellite::REQUESTER_CHAR => info.own_position = Some(cell),
                    satellite::SHELL_CHAR => info.shells.push(cell),
                    digit @ '1'..='9' => {
                        if digit as u8 - b'0' == player_id {
                            info.friendly_tanks.push(cell);
                        } else {
                            info.enemy_tanks.push(cell);
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(info)
    }
}

/// A player that forwards the full view to every tank that asks.
#[derive(Debug, Clone)]
pub struct BasicPlayer {
    player_id: u8,
    width: usize,
    height: usize,
}

impl BasicPlayer {
    /// Player `player_id` on a `width` x `height` board.
    #[must_use]
    pub const fn new(player_id: u8, width: usize, height: usize) -> Self {
        Self {
            player_id,
            width,
            height,
        }
    }
}

impl Player for BasicPlayer {
    fn update_tank_with_battle_info(
        &mut self,
        tank: &mut dyn TankAlgorithm,
        view: &dyn SatelliteView,
    ) {
        match BattleInfo::from_view(view, self.player_id, self.width, self.height) {
            Ok(info) => tank.update_battle_info(&info),
            Err(err) => tracing::warn!(player = self.player_id, %err, "Could not read satellite view"),
        }
    }
}
