//! Monte-Carlo generation survey
//!
//! Generates many floors from consecutive seeds in parallel and aggregates:
//! - retry-loop pressure (mean and worst attempts per floor)
//! - entity counts per floor
//! - every `Level::verify` defect, with the seed that produced it
//!
//! Uses rayon for parallel execution across CPU cores.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{Difficulty, FloorParams, GenerationConfig, LadderDirection};
use crate::level::{generate_level, LevelDefect};
use crate::rng::{floor_seed, FloorRng};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    pub difficulty: Difficulty,
    pub floors: u64,
    pub base_seed: u64,
    pub depth: u32,
    pub exit: LadderDirection,
    pub max_attempts: u32,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            floors: 1_000,
            base_seed: 42,
            depth: 1,
            exit: LadderDirection::Down,
            max_attempts: crate::constants::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Outcome of one surveyed floor
#[derive(Debug, Clone)]
enum FloorSample {
    Built {
        attempts: u32,
        creatures: usize,
        chests: usize,
        doors: usize,
        defects: Vec<LevelDefect>,
    },
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurveyReport {
    pub floors: u64,
    pub failed: u64,
    pub avg_attempts: f32,
    pub max_attempts: u32,
    pub avg_creatures: f32,
    pub avg_chests: f32,
    pub avg_doors: f32,
    /// (seed, defect) pairs; empty for a healthy generator
    pub violations: Vec<(u64, LevelDefect)>,
}

impl SurveyReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.violations.is_empty()
    }
}

fn sample(config: &GenerationConfig, survey: &SurveyConfig, seed: u64) -> FloorSample {
    let mut params = FloorParams::first_floor(survey.exit);
    params.depth = survey.depth;
    let mut rng = FloorRng::seeded(seed);
    match generate_level(config, params, &mut rng) {
        Ok(level) => FloorSample::Built {
            attempts: level.attempts,
            creatures: level.creatures.len(),
            chests: level.chests.len(),
            doors: level.door_descriptors.len(),
            defects: level.verify(),
        },
        Err(_) => FloorSample::Failed,
    }
}

/// Run the survey with rayon parallelism
pub fn run_survey(survey: &SurveyConfig) -> SurveyReport {
    let config = GenerationConfig {
        max_attempts: survey.max_attempts,
        ..GenerationConfig::for_difficulty(survey.difficulty)
    };
    let seeds: Vec<u64> = (0..survey.floors)
        .map(|i| floor_seed(survey.base_seed.wrapping_add(i), survey.depth))
        .collect();

    let samples: Vec<(u64, FloorSample)> = seeds
        .par_iter()
        .map(|seed| (*seed, sample(&config, survey, *seed)))
        .collect();

    summarize(&samples)
}

fn summarize(samples: &[(u64, FloorSample)]) -> SurveyReport {
    let mut report = SurveyReport {
        floors: samples.len() as u64,
        failed: 0,
        avg_attempts: 0.0,
        max_attempts: 0,
        avg_creatures: 0.0,
        avg_chests: 0.0,
        avg_doors: 0.0,
        violations: Vec::new(),
    };
    let mut built = 0usize;
    let (mut attempts, mut creatures, mut chests, mut doors) = (0u64, 0usize, 0usize, 0usize);

    for (seed, sample) in samples {
        match sample {
            FloorSample::Built {
                attempts: a,
                creatures: c,
                chests: ch,
                doors: d,
                defects,
            } => {
                built += 1;
                attempts += *a as u64;
                report.max_attempts = report.max_attempts.max(*a);
                creatures += c;
                chests += ch;
                doors += d;
                report
                    .violations
                    .extend(defects.iter().cloned().map(|defect| (*seed, defect)));
            }
            FloorSample::Failed => report.failed += 1,
        }
    }

    if built > 0 {
        let n = built as f32;
        report.avg_attempts = attempts as f32 / n;
        report.avg_creatures = creatures as f32 / n;
        report.avg_chests = chests as f32 / n;
        report.avg_doors = doors as f32 / n;
    }
    report
}
