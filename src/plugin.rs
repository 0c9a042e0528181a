//! Bevy integration.
//!
//! Generation is synchronous; a request event is answered within the same
//! `Update` by replacing the `ActiveFloor` resource and emitting either
//! `FloorReadyEvent` or `FloorFailedEvent`.

use bevy::prelude::*;

use crate::config::{FloorParams, GenerationConfig, LadderDirection};
use crate::level::{generate_level, Level};
use crate::rng::FloorRng;
use crate::topology::PointKind;

pub struct DungeonPlugin;

impl Plugin for DungeonPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DungeonConfig>()
            .add_event::<GenerateFloorRequest>()
            .add_event::<FloorReadyEvent>()
            .add_event::<FloorFailedEvent>()
            .add_systems(Update, handle_floor_requests);
    }
}

/// Generation settings plus the dungeon-wide seed every floor derives from
#[derive(Resource, Debug, Clone)]
pub struct DungeonConfig {
    pub generation: GenerationConfig,
    pub base_seed: u64,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            base_seed: 42,
        }
    }
}

/// The floor the player is currently on
#[derive(Resource, Debug)]
pub struct ActiveFloor {
    pub level: Level,
}

impl ActiveFloor {
    /// Parameters for the floor below, entered where this one's exit sits.
    /// `None` on the terminal floor.
    pub fn next_floor_params(&self, next_exit: LadderDirection) -> Option<FloorParams> {
        let exit = self.level.points.find(PointKind::RoomExit)?;
        Some(self.level.params.next_floor(exit, next_exit))
    }
}

/// Event: build the floor described by `params`
#[derive(Event, Debug, Clone)]
pub struct GenerateFloorRequest {
    pub params: FloorParams,
}

/// Event: `ActiveFloor` now holds a new floor
#[derive(Event, Debug, Clone)]
pub struct FloorReadyEvent {
    pub depth: u32,
    pub attempts: u32,
}

#[derive(Event, Debug, Clone)]
pub struct FloorFailedEvent {
    pub depth: u32,
    pub reason: String,
}

/// System: answer floor requests
pub fn handle_floor_requests(
    mut requests: EventReader<GenerateFloorRequest>,
    mut ready: EventWriter<FloorReadyEvent>,
    mut failed: EventWriter<FloorFailedEvent>,
    config: Res<DungeonConfig>,
    mut active_floor: Option<ResMut<ActiveFloor>>,
    mut commands: Commands,
) {
    for request in requests.read() {
        let depth = request.params.depth;
        let mut rng = FloorRng::for_floor(config.base_seed, depth);
        match generate_level(&config.generation, request.params.clone(), &mut rng) {
            Ok(level) => {
                let attempts = level.attempts;
                if let Some(ref mut floor) = active_floor {
                    floor.level = level;
                } else {
                    commands.insert_resource(ActiveFloor { level });
                }
                ready.send(FloorReadyEvent { depth, attempts });
                info!("Floor {} ready after {} attempts", depth, attempts);
            }
            Err(err) => {
                warn!("Floor {} failed: {}", depth, err);
                failed.send(FloorFailedEvent {
                    depth,
                    reason: err.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(DungeonPlugin);
        app.insert_resource(DungeonConfig {
            generation: GenerationConfig::for_difficulty(Difficulty::Easy),
            base_seed: 7,
        });
        app
    }

    #[test]
    fn test_request_inserts_active_floor() {
        let mut app = app();
        app.world_mut().send_event(GenerateFloorRequest {
            params: FloorParams::first_floor(LadderDirection::Down),
        });
        app.update();

        let floor = app
            .world()
            .get_resource::<ActiveFloor>()
            .expect("floor inserted");
        assert_eq!(floor.level.params.depth, 1);
        let ready = app.world().resource::<Events<FloorReadyEvent>>();
        assert_eq!(ready.iter_current_update_events().count(), 1);
    }

    #[test]
    fn test_next_floor_request_replaces_floor() {
        let mut app = app();
        app.world_mut().send_event(GenerateFloorRequest {
            params: FloorParams::first_floor(LadderDirection::Down),
        });
        app.update();

        let next = app
            .world()
            .resource::<ActiveFloor>()
            .next_floor_params(LadderDirection::NoLadder)
            .expect("first floor has an exit");
        app.world_mut().send_event(GenerateFloorRequest { params: next });
        app.update();

        let floor = app.world().resource::<ActiveFloor>();
        assert_eq!(floor.level.params.depth, 2);
        assert!(floor.level.is_terminal());
        assert!(floor.level.exit.is_none());
    }

    #[test]
    fn test_impossible_grid_reports_failure() {
        let mut app = app();
        app.insert_resource(DungeonConfig {
            generation: GenerationConfig {
                points_per_axis_override: Some(1),
                ..GenerationConfig::default()
            },
            base_seed: 1,
        });
        app.world_mut().send_event(GenerateFloorRequest {
            params: FloorParams::first_floor(LadderDirection::Down),
        });
        app.update();

        assert!(app.world().get_resource::<ActiveFloor>().is_none());
        let failed = app.world().resource::<Events<FloorFailedEvent>>();
        assert_eq!(failed.iter_current_update_events().count(), 1);
    }
}
