//! Reachability queries at point and cell granularity.
//!
//! Both searches are iterative depth-first walks with an explicit stack and a
//! visited set, so they terminate on cyclic graphs and never recurse.
//! - point level: over the `EdgeSet`, optionally skipping reserved points and
//!   refusing to cross point pairs that carry a door
//! - cell level: over walkable cells of the `CellGrid`; doors are not walkable
//!
//! `point_distances` is the one breadth-first walk, for corridor hop counts.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::carver::CellGrid;
use crate::doors::DoorDescriptor;
use crate::grid::{CellCoord, PointCoord};
use crate::topology::EdgeSet;

/// Points and corridors a point-level search may not use
#[derive(Debug, Clone, Default)]
pub struct ReachFilter {
    excluded: HashSet<PointCoord>,
    blocked: HashSet<(PointCoord, PointCoord)>,
}

fn pair(a: PointCoord, b: PointCoord) -> (PointCoord, PointCoord) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl ReachFilter {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn excluding(mut self, point: PointCoord) -> Self {
        self.excluded.insert(point);
        self
    }

    pub fn blocking(mut self, a: PointCoord, b: PointCoord) -> Self {
        self.blocked.insert(pair(a, b));
        self
    }

    /// Block every corridor that already carries one of `doors`
    pub fn blocking_doors<'a>(mut self, doors: impl IntoIterator<Item = &'a DoorDescriptor>) -> Self {
        for door in doors {
            self.blocked.insert(pair(door.from, door.to));
        }
        self
    }

    pub fn is_excluded(&self, point: PointCoord) -> bool {
        self.excluded.contains(&point)
    }

    pub fn is_blocked(&self, a: PointCoord, b: PointCoord) -> bool {
        self.blocked.contains(&pair(a, b))
    }
}

/// Is `to` reachable from `from` through the edge set under `filter`?
pub fn point_reachable(
    edges: &EdgeSet,
    from: PointCoord,
    to: PointCoord,
    filter: &ReachFilter,
) -> bool {
    if filter.is_excluded(from) || filter.is_excluded(to) {
        return false;
    }
    if from == to {
        return true;
    }

    let mut visited = HashSet::from([from]);
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        for next in edges.neighbors(current) {
            if filter.is_blocked(current, next) {
                continue;
            }
            if next == to {
                return true;
            }
            if !filter.is_excluded(next) && visited.insert(next) {
                stack.push(next);
            }
        }
    }
    false
}

/// Every point reachable from `from` under `filter`, including `from` itself
pub fn reachable_points(
    edges: &EdgeSet,
    from: PointCoord,
    filter: &ReachFilter,
) -> BTreeSet<PointCoord> {
    let mut visited = BTreeSet::new();
    if filter.is_excluded(from) {
        return visited;
    }
    visited.insert(from);
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        for next in edges.neighbors(current) {
            if filter.is_blocked(current, next) || filter.is_excluded(next) {
                continue;
            }
            if visited.insert(next) {
                stack.push(next);
            }
        }
    }
    visited
}

/// Corridor hops from `from` to every point reachable under `filter`
pub fn point_distances(
    edges: &EdgeSet,
    from: PointCoord,
    filter: &ReachFilter,
) -> BTreeMap<PointCoord, usize> {
    let mut dist = BTreeMap::new();
    if filter.is_excluded(from) {
        return dist;
    }
    dist.insert(from, 0);
    let mut queue = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        let hops = dist[&current] + 1;
        for next in edges.neighbors(current) {
            if filter.is_blocked(current, next) || filter.is_excluded(next) {
                continue;
            }
            if !dist.contains_key(&next) {
                dist.insert(next, hops);
                queue.push_back(next);
            }
        }
    }
    dist
}

/// Is `to` reachable from `from` moving orthogonally through walkable cells?
pub fn cell_reachable(cells: &CellGrid, from: CellCoord, to: CellCoord) -> bool {
    if from == to {
        return true;
    }
    if !cells.kind(from).is_walkable() || !cells.kind(to).is_walkable() {
        return false;
    }

    let size = cells.size();
    let mut visited = vec![false; size * size];
    visited[cells.index(from)] = true;
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        for next in current.neighbors4(size) {
            if next == to {
                return true;
            }
            let idx = cells.index(next);
            if !visited[idx] && cells.kind(next).is_walkable() {
                visited[idx] = true;
                stack.push(next);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carver::CellKind;

    fn p(x: usize, y: usize) -> PointCoord {
        PointCoord::new(x, y)
    }

    /// Square cycle 0,0 - 1,0 - 1,1 - 0,1 plus a tail 1,1 - 2,1
    fn ring() -> EdgeSet {
        let mut edges = EdgeSet::new();
        edges.insert(p(0, 0), p(1, 0));
        edges.insert(p(1, 0), p(1, 1));
        edges.insert(p(1, 1), p(0, 1));
        edges.insert(p(0, 1), p(0, 0));
        edges.insert(p(1, 1), p(2, 1));
        edges
    }

    #[test]
    fn test_reachable_on_cycle() {
        let edges = ring();
        assert!(point_reachable(&edges, p(0, 0), p(2, 1), &ReachFilter::none()));
        assert!(!point_reachable(&edges, p(0, 0), p(3, 3), &ReachFilter::none()));
    }

    #[test]
    fn test_excluded_point_cuts_path() {
        let edges = ring();
        let filter = ReachFilter::none().excluding(p(1, 1));
        assert!(!point_reachable(&edges, p(0, 0), p(2, 1), &filter));
        assert!(point_reachable(&edges, p(0, 0), p(0, 1), &filter));
    }

    #[test]
    fn test_blocked_pair_forces_detour() {
        let edges = ring();
        let one_door = ReachFilter::none().blocking(p(1, 0), p(0, 0));
        assert!(
            point_reachable(&edges, p(0, 0), p(1, 0), &one_door),
            "Cycle should route around a single door"
        );
        let two_doors = one_door.blocking(p(0, 1), p(1, 1));
        assert!(!point_reachable(&edges, p(0, 0), p(2, 1), &two_doors));
    }

    #[test]
    fn test_reachable_points_set() {
        let edges = ring();
        let all = reachable_points(&edges, p(0, 0), &ReachFilter::none());
        assert_eq!(all.len(), 5);
        let cut = reachable_points(&edges, p(2, 1), &ReachFilter::none().blocking(p(1, 1), p(2, 1)));
        assert_eq!(cut.into_iter().collect::<Vec<_>>(), vec![p(2, 1)]);
    }

    #[test]
    fn test_point_distances_take_shortest_route() {
        let edges = ring();
        let dist = point_distances(&edges, p(0, 0), &ReachFilter::none());
        assert_eq!(dist[&p(0, 0)], 0);
        assert_eq!(dist[&p(1, 1)], 2);
        assert_eq!(dist[&p(2, 1)], 3);
        assert!(!dist.contains_key(&p(3, 3)));

        let detour = point_distances(&edges, p(0, 0), &ReachFilter::none().excluding(p(0, 1)));
        assert_eq!(detour[&p(1, 1)], 2);
        assert!(!detour.contains_key(&p(0, 1)));
        let cut = point_distances(&edges, p(0, 0), &ReachFilter::none().blocking(p(0, 0), p(1, 0)));
        assert_eq!(cut[&p(1, 0)], 3, "Blocked corridor forces the long way round");
    }

    #[test]
    fn test_cell_reachable_respects_walls_and_doors() {
        let mut cells = CellGrid::new(5);
        for x in 0..5 {
            cells.set(CellCoord::new(x, 2), CellKind::Floor);
        }
        assert!(cell_reachable(&cells, CellCoord::new(0, 2), CellCoord::new(4, 2)));
        cells.set(CellCoord::new(2, 2), CellKind::FloorAndDoorVertical);
        assert!(!cell_reachable(&cells, CellCoord::new(0, 2), CellCoord::new(4, 2)));
        cells.set(CellCoord::new(2, 2), CellKind::Wall);
        assert!(!cell_reachable(&cells, CellCoord::new(0, 2), CellCoord::new(4, 2)));
        assert!(cell_reachable(&cells, CellCoord::new(0, 2), CellCoord::new(1, 2)));
    }
}
