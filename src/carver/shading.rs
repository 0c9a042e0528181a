//! Four-pass wall halo.
//!
//! Each pass snapshots its source cells first, then writes into empty
//! 8-neighbours only. A cell is written at most once across all passes; the
//! pass number is kept in the grid for verification and rendering.

use serde::Serialize;

use super::{CellGrid, CellKind};
use crate::grid::CellCoord;
use crate::rng::FloorRng;

/// Cells written by each shading pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShadeReport {
    pub written: [usize; 4],
}

impl ShadeReport {
    pub fn total(&self) -> usize {
        self.written.iter().sum()
    }
}

fn random_tier(rng: &mut FloorRng) -> CellKind {
    let roll = rng.roll();
    if roll < 25.0 {
        CellKind::Wall
    } else if roll < 50.0 {
        CellKind::WallDark
    } else {
        CellKind::WallDarkDark
    }
}

impl CellGrid {
    /// Run one pass: every source spreads into its empty neighbours, using
    /// `paint` to pick the written kind (`None` means the source does not spread)
    fn shade_pass_from(
        &mut self,
        pass: u8,
        sources: Vec<CellCoord>,
        mut paint: impl FnMut(CellKind) -> Option<CellKind>,
    ) -> usize {
        let mut written_this_pass = vec![false; self.kinds.len()];
        let mut written = 0;
        for source in sources {
            let source_kind = self.kind(source);
            for target in source.neighbors8(self.size) {
                let idx = self.index(target);
                if written_this_pass[idx] || self.kinds[idx] != CellKind::Nothing {
                    continue;
                }
                let Some(kind) = paint(source_kind) else {
                    break;
                };
                self.kinds[idx] = kind;
                self.shade_pass[idx] = pass;
                written_this_pass[idx] = true;
                written += 1;
            }
        }
        written
    }

    fn cells_where(&self, pred: impl Fn(usize, CellKind) -> bool) -> Vec<CellCoord> {
        self.iter()
            .enumerate()
            .filter(|(i, (_, kind))| pred(*i, *kind))
            .map(|(_, (cell, _))| cell)
            .collect()
    }
}

/// Surround all walkable space with progressively darker wall rings
pub fn shade_walls(cells: &mut CellGrid, rng: &mut FloorRng) -> ShadeReport {
    let mut report = ShadeReport::default();

    let floor = cells.cells_where(|_, kind| kind.is_floor_bearing());
    report.written[0] = cells.shade_pass_from(1, floor, |_| Some(CellKind::Wall));

    let walls = cells.cells_where(|_, kind| kind.is_wall());
    report.written[1] = cells.shade_pass_from(2, walls, |_| Some(random_tier(rng)));

    let second = cells.cells_where(|i, _| cells.shade_pass[i] == 2);
    report.written[2] = cells.shade_pass_from(3, second, |kind| match kind {
        CellKind::Wall => Some(CellKind::WallDark),
        CellKind::WallDark => Some(CellKind::WallDarkDark),
        _ => None,
    });

    let third = cells.cells_where(|i, _| cells.shade_pass[i] == 3);
    report.written[3] = cells.shade_pass_from(4, third, |kind| match kind {
        CellKind::WallDark => Some(CellKind::WallDarkDark),
        _ => None,
    });

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_floor() -> CellGrid {
        let mut cells = CellGrid::new(11);
        cells.set(CellCoord::new(5, 5), CellKind::Floor);
        cells
    }

    #[test]
    fn test_first_ring_is_plain_wall() {
        let mut cells = single_floor();
        let mut rng = FloorRng::seeded(3);
        let report = shade_walls(&mut cells, &mut rng);
        assert_eq!(report.written[0], 8);
        for n in CellCoord::new(5, 5).neighbors8(11) {
            assert_eq!(cells.kind(n), CellKind::Wall);
            assert_eq!(cells.shade_pass(n), 1);
        }
        assert_eq!(report.written[1], 16, "Second ring is 5x5 minus 3x3");
    }

    #[test]
    fn test_each_cell_written_once() {
        let mut cells = single_floor();
        cells.set(CellCoord::new(2, 2), CellKind::Floor);
        let mut rng = FloorRng::seeded(17);
        let report = shade_walls(&mut cells, &mut rng);
        let shaded = cells
            .iter()
            .filter(|(c, _)| cells.shade_pass(*c) > 0)
            .count();
        assert_eq!(shaded, report.total());
        for (cell, kind) in cells.iter() {
            if cells.shade_pass(cell) > 0 {
                assert!(kind.is_wall(), "Shaded cell {:?} is {:?}", cell, kind);
            }
        }
    }

    #[test]
    fn test_dark_tiers_never_brighten_outward() {
        let mut cells = single_floor();
        let mut rng = FloorRng::seeded(99);
        shade_walls(&mut cells, &mut rng);
        for (cell, kind) in cells.iter() {
            if cells.shade_pass(cell) == 4 {
                assert_eq!(kind, CellKind::WallDarkDark);
            }
        }
        assert!(cells.count(CellKind::Nothing) > 0, "Halo must stay bounded");
    }
}
