//! ASCII floor rendering.
//!
//! Renders the cell grid and the connection-point graph as text for the CLI,
//! debugging, and test failure messages. Each cell kind gets a distinct glyph.

use crate::carver::{CellGrid, CellKind};
use crate::grid::PointCoord;
use crate::topology::{EdgeSet, PointGrid, PointKind};

fn cell_glyph(kind: CellKind) -> char {
    match kind {
        CellKind::Nothing => ' ',
        CellKind::Floor => '.',
        CellKind::Wall => '#',
        CellKind::WallDark => '%',
        CellKind::WallDarkDark => ':',
        CellKind::FloorAndChest => 'c',
        CellKind::FloorAndChestBonus => 'C',
        CellKind::FloorAndDoorVertical => '|',
        CellKind::FloorAndDoorHorizontal => '-',
        CellKind::FloorAndDoorExitVertical | CellKind::FloorAndDoorExitHorizontal => 'X',
        CellKind::FloorAndDoorBonusVertical | CellKind::FloorAndDoorBonusHorizontal => '$',
        CellKind::FloorAndMonster => 'm',
        CellKind::FloorAndMonsterBoss => 'B',
        CellKind::LadderUp => '^',
        CellKind::LadderDown => 'v',
        CellKind::LadderLeft => '<',
        CellKind::LadderRight => '>',
    }
}

fn point_glyph(kind: PointKind) -> char {
    match kind {
        PointKind::None => ' ',
        PointKind::Corner => '+',
        PointKind::RoomUsual => 'o',
        PointKind::RoomEntrance => 'E',
        PointKind::RoomExit => 'X',
        PointKind::RoomBoss => 'B',
        PointKind::RoomBonus => '$',
    }
}

/// One line per cell row
pub fn render_cells(cells: &CellGrid) -> String {
    let size = cells.size();
    let mut out = String::with_capacity(size * (size + 1));
    for (cell, kind) in cells.iter() {
        out.push(cell_glyph(kind));
        if cell.x + 1 == size {
            out.push('\n');
        }
    }
    out
}

/// Points with their corridors drawn between them
pub fn render_points(points: &PointGrid, edges: &EdgeSet) -> String {
    let n = points.size();
    let mut out = String::new();
    for y in 0..n {
        let mut row = String::new();
        let mut below = String::new();
        for x in 0..n {
            let p = PointCoord::new(x, y);
            row.push(point_glyph(points.kind(p)));
            if x + 1 < n {
                let right = edges.contains(p, PointCoord::new(x + 1, y));
                row.push(if right { '-' } else { ' ' });
            }
            if y + 1 < n {
                let down = edges.contains(p, PointCoord::new(x, y + 1));
                below.push(if down { '|' } else { ' ' });
                if x + 1 < n {
                    below.push(' ');
                }
            }
        }
        out.push_str(row.trim_end());
        out.push('\n');
        if y + 1 < n {
            out.push_str(below.trim_end());
            out.push('\n');
        }
    }
    out
}
