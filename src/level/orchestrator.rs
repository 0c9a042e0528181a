//! Generation stage sequence and the whole-floor retry loop.
//!
//! One attempt runs every stage in order on a fresh `FloorDraft`. A structural
//! failure abandons the attempt and the next one starts from an empty grid,
//! drawing from the same random stream (no reseeding). Doors and population
//! run only after every structural check has passed, so nothing past
//! `PlaceDoors` is ever retried.

use tracing::{debug, info, trace, warn};

use super::{FloorDraft, Level};
use crate::carver::{carve_tunnel, destroy_room, shade_walls};
use crate::config::{FloorParams, GenerationConfig};
use crate::connectivity::{point_reachable, ReachFilter};
use crate::doors::distribute_doors;
use crate::error::{AttemptFailure, GenerationError, Result};
use crate::grid::GridGeometry;
use crate::logging::TimingSpan;
use crate::population::{populate, Population};
use crate::rng::FloorRng;
use crate::topology::{
    check_isolated_points, connect_all_points, place_bonus, place_entrance, place_exit_and_boss,
    repair_dead_corners, resolve_remaining_points, PointKind,
};

/// Stages of one generation attempt, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationStage {
    PlaceEntrance,
    PlaceExitAndBoss,
    PlaceBonus,
    ResolveRemainingPoints,
    ConnectAllPoints,
    RepairDeadCorners,
    ValidateEntranceToBoss,
    ValidateEntranceToBonus,
    DestroyUnreachableRooms,
    CarveTunnels,
    ShadeWalls,
    PlaceDoors,
    PopulateCells,
}

impl GenerationStage {
    /// Stage at which a failure abandons the attempt
    pub fn of_failure(failure: AttemptFailure) -> Self {
        match failure {
            AttemptFailure::EntranceNotPlaced => Self::PlaceEntrance,
            AttemptFailure::ExitNotPlaced => Self::PlaceExitAndBoss,
            AttemptFailure::BonusNotPlaced => Self::PlaceBonus,
            AttemptFailure::IsolatedPoint { .. } | AttemptFailure::BonusEdgeCount(_) => {
                Self::ConnectAllPoints
            }
            AttemptFailure::BossUnreachable => Self::ValidateEntranceToBoss,
            AttemptFailure::BonusUnreachable => Self::ValidateEntranceToBonus,
        }
    }
}

fn require(ok: bool, failure: AttemptFailure) -> std::result::Result<(), AttemptFailure> {
    if ok {
        Ok(())
    } else {
        Err(failure)
    }
}

/// Run every stage up to and including door placement
pub fn attempt_layout(
    config: &GenerationConfig,
    params: FloorParams,
    rng: &mut FloorRng,
) -> std::result::Result<FloorDraft, AttemptFailure> {
    let mut draft = FloorDraft::new(config, params);

    require(place_entrance(&mut draft, rng), AttemptFailure::EntranceNotPlaced)?;
    require(place_exit_and_boss(&mut draft, rng), AttemptFailure::ExitNotPlaced)?;
    require(place_bonus(&mut draft, rng), AttemptFailure::BonusNotPlaced)?;
    resolve_remaining_points(&mut draft, rng);

    connect_all_points(&mut draft, rng);
    if let Some(bonus) = draft.bonus() {
        let degree = draft.edges.degree(bonus);
        require(degree == 1, AttemptFailure::BonusEdgeCount(degree))?;
    }
    check_isolated_points(&draft)?;

    let repaired = repair_dead_corners(&mut draft, rng);
    trace!(repaired, "dead corners widened");

    let entrance = draft.entrance().ok_or(AttemptFailure::EntranceNotPlaced)?;
    let open = ReachFilter::none();
    let boss = draft.boss().ok_or(AttemptFailure::ExitNotPlaced)?;
    require(
        point_reachable(&draft.edges, entrance, boss, &open),
        AttemptFailure::BossUnreachable,
    )?;
    let bonus = draft.bonus().ok_or(AttemptFailure::BonusNotPlaced)?;
    require(
        point_reachable(&draft.edges, entrance, bonus, &open),
        AttemptFailure::BonusUnreachable,
    )?;

    let unreachable: Vec<_> = draft
        .points
        .iter()
        .filter(|(p, kind)| {
            *kind != PointKind::None && !point_reachable(&draft.edges, entrance, *p, &open)
        })
        .map(|(p, _)| p)
        .collect();
    for p in &unreachable {
        destroy_room(&mut draft, *p);
    }
    trace!(destroyed = unreachable.len(), "unreachable points removed");

    for (a, b) in draft.edges.edges() {
        let from = draft.geometry.point_center(a);
        let to = draft.geometry.point_center(b);
        if !carve_tunnel(&mut draft.cells, from, to) {
            trace!(?a, ?b, "corridor endpoints are not aligned");
        }
    }

    let shading = shade_walls(&mut draft.cells, rng);
    trace!(written = shading.total(), "walls shaded");

    distribute_doors(&mut draft, rng);
    Ok(draft)
}

/// One full attempt: layout, doors, then population
pub fn attempt_generate(
    config: &GenerationConfig,
    params: FloorParams,
    rng: &mut FloorRng,
) -> std::result::Result<(FloorDraft, Population), AttemptFailure> {
    let mut draft = attempt_layout(config, params, rng)?;
    let population = populate(&mut draft, rng);
    Ok((draft, population))
}

/// Mandatory rooms for a floor: entrance, boss, bonus, and an exit unless terminal
fn required_points(params: &FloorParams) -> usize {
    if params.is_terminal() {
        3
    } else {
        4
    }
}

fn check_inputs(config: &GenerationConfig, params: &FloorParams) -> Result<()> {
    config.validate()?;
    let n = config.points_per_axis();
    let required = required_points(params);
    if n * n < required {
        return Err(GenerationError::GridTooSmall {
            points_per_axis: n,
            required,
        });
    }
    if let Some(anchor) = params.entrance_anchor {
        if !GridGeometry::new(n).contains_point(anchor) {
            return Err(GenerationError::AnchorOutOfGrid {
                x: anchor.x,
                y: anchor.y,
                points_per_axis: n,
            });
        }
    }
    Ok(())
}

/// Generate a complete floor, retrying whole attempts up to
/// `config.max_attempts` times
pub fn generate_level(
    config: &GenerationConfig,
    params: FloorParams,
    rng: &mut FloorRng,
) -> Result<Level> {
    check_inputs(config, &params)?;
    let _span = TimingSpan::new("generate_level");

    let mut last = None;
    for attempt in 1..=config.max_attempts {
        match attempt_generate(config, params.clone(), rng) {
            Ok((draft, population)) => {
                let level = Level::assemble(draft, population, attempt);
                info!(
                    depth = level.params.depth,
                    attempts = attempt,
                    rooms = level.points.iter().filter(|(_, k)| k.is_room()).count(),
                    doors = level.door_descriptors.len(),
                    creatures = level.creatures.len(),
                    chests = level.chests.len(),
                    "floor generated"
                );
                return Ok(level);
            }
            Err(failure) => {
                debug!(
                    attempt,
                    stage = ?GenerationStage::of_failure(failure),
                    %failure,
                    "generation attempt abandoned"
                );
                last = Some(failure);
            }
        }
    }

    let last = last.unwrap_or(AttemptFailure::EntranceNotPlaced);
    warn!(attempts = config.max_attempts, %last, "retry budget exhausted");
    Err(GenerationError::AttemptsExhausted {
        attempts: config.max_attempts,
        last,
    })
}
