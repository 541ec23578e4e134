//! ASCII battle visualizer.
//!
//! Renders a game world as a framed character grid for quick terminal review.

use std::collections::BTreeMap;

use tanks_core::board::{BoardLayout, CellType, WALL_STARTING_HEALTH};
use tanks_core::direction::Direction;
use tanks_core::game::World;
use tanks_core::geometry::Point;
use tanks_core::tank::Tank;

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Show tank counts legend.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            use_color: true,
        }
    }
}

/// Symbol for a damaged wall.
pub const DAMAGED_WALL_CHAR: char = '+';

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";

    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const GRAY: &str = "\x1b[90m";
}

fn player_color(player_id: u8) -> &'static str {
    match player_id % 4 {
        1 => colors::BLUE,
        2 => colors::YELLOW,
        3 => colors::GREEN,
        _ => colors::MAGENTA,
    }
}

/// Character and color for one cell.
fn cell_glyph(world: &World, position: Point) -> (char, &'static str) {
    if let Some(tank) = world
        .tanks
        .iter()
        .find(|t| !t.is_destroyed() && t.position() == position)
    {
        let digit = char::from(b'0' + tank.player_id());
        return (digit, player_color(tank.player_id()));
    }
    if world
        .shells
        .iter()
        .any(|s| !s.is_destroyed() && s.position() == position)
    {
        return ('*', colors::RED);
    }
    match world.board.cell_type(position) {
        CellType::Wall if world.board.wall_health(position) < WALL_STARTING_HEALTH => {
            (DAMAGED_WALL_CHAR, colors::GRAY)
        }
        CellType::Wall => ('#', colors::GRAY),
        CellType::Mine => ('@', colors::CYAN),
        CellType::Empty => (' ', ""),
    }
}

/// World as it stands before the first step, for previewing a board.
pub fn initial_world(layout: BoardLayout, shells: u32) -> World {
    let mut tanks: Vec<Tank> = Vec::with_capacity(layout.tank_positions.len());
    for (player_id, position) in layout.tank_positions {
        let index = tanks.iter().filter(|t| t.player_id() == player_id).count();
        tanks.push(Tank::new(
            player_id,
            index,
            position,
            Direction::initial_for_player(player_id),
            shells,
        ));
    }
    World {
        board: layout.board,
        tanks,
        shells: Vec::new(),
    }
}

/// Render a world as ASCII art under a title line.
pub fn render_ascii(world: &World, title: &str, config: &AsciiConfig) -> String {
    let width = world.board.width();
    let (bold, reset) = if config.use_color {
        (colors::BOLD, colors::RESET)
    } else {
        ("", "")
    };

    let mut output = format!("{bold}== {title} =={reset}\n");
    output.push('+');
    output.push_str(&"-".repeat(width));
    output.push_str("+\n");

    for y in 0..world.board.height() {
        output.push('|');
        for x in 0..width {
            let (ch, color) = cell_glyph(world, Point::new(x as i32, y as i32));
            if config.use_color && !color.is_empty() {
                output.push_str(color);
                output.push(ch);
                output.push_str(colors::RESET);
            } else {
                output.push(ch);
            }
        }
        output.push_str("|\n");
    }

    output.push('+');
    output.push_str(&"-".repeat(width));
    output.push_str("+\n");

    if config.show_legend {
        let mut alive: BTreeMap<u8, (usize, u32)> = BTreeMap::new();
        for tank in world.tanks.iter().filter(|t| !t.is_destroyed()) {
            let entry = alive.entry(tank.player_id()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += tank.shells();
        }
        output.push_str("# wall, + damaged wall, @ mine, * shell\n");
        for (player, (tanks, shells)) in alive {
            output.push_str(&format!(
                "Player {player}: {tanks} tanks, {shells} shells\n"
            ));
        }
        let in_flight = world.shells.iter().filter(|s| !s.is_destroyed()).count();
        output.push_str(&format!("Shells in flight: {in_flight}\n"));
    }

    output
}
