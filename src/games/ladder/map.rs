//! Ladder map generation.

use im::Vector;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::config::LadderConfig;
use crate::core::rng::RandomSource;

/// What an obstacle does to the runner that hits it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    /// Repeated forced lane swaps.
    Spinner,
    Rocket,
    Lightning,
    /// Shuffles every lane at once.
    Tornado,
    Freeze,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 5] = [
        ObstacleKind::Spinner,
        ObstacleKind::Rocket,
        ObstacleKind::Lightning,
        ObstacleKind::Tornado,
        ObstacleKind::Freeze,
    ];
}

/// An obstacle bound to one lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Obstacle {
    #[serde(rename = "type")]
    pub kind: ObstacleKind,
    pub lane: usize,
}

/// Obstacles indexed by level.
///
/// Empty until the first race generates it. Most levels hold zero or one
/// obstacle, hence the inline storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LadderMap {
    levels: Vector<SmallVec<[Obstacle; 2]>>,
}

impl LadderMap {
    /// `levels` empty levels.
    #[must_use]
    pub fn blank(levels: usize) -> Self {
        Self {
            levels: std::iter::repeat(SmallVec::new()).take(levels).collect(),
        }
    }

    /// Lay out obstacles for `lanes` lanes.
    ///
    /// Each lane gets `config.obstacles_per_lane(lanes)` obstacles on
    /// distinct levels drawn from the eligible range, each of a uniformly
    /// random kind.
    pub fn generate(lanes: usize, config: &LadderConfig, rng: &mut dyn RandomSource) -> Self {
        let mut map = Self::blank(config.levels);
        let per_lane = config.obstacles_per_lane(lanes);
        let last = config.last_obstacle_level.min(config.levels.saturating_sub(1));

        for lane in 0..lanes {
            let levels = rng.sample_distinct(config.first_obstacle_level as i64, last as i64, per_lane);
            for level in levels {
                let kind = ObstacleKind::ALL[rng.pick(ObstacleKind::ALL.len())];
                map.place(level as usize, Obstacle { kind, lane });
            }
        }
        map
    }

    /// Put an obstacle on a level. Ignored past the top.
    pub fn place(&mut self, level: usize, obstacle: Obstacle) {
        if let Some(slot) = self.levels.get_mut(level) {
            slot.push(obstacle);
        }
    }

    /// Number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Has the map been generated?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Obstacles on a level; empty past the top.
    #[must_use]
    pub fn obstacles_at(&self, level: usize) -> &[Obstacle] {
        self.levels.get(level).map(|slot| slot.as_slice()).unwrap_or(&[])
    }

    /// Every obstacle with its level, bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Obstacle)> + '_ {
        self.levels
            .iter()
            .enumerate()
            .flat_map(|(level, slot)| slot.iter().map(move |o| (level, o)))
    }
}

/// Outcome bound to a lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneResult {
    Win,
    Pass,
}

/// One `Win` on a uniformly random lane, `Pass` everywhere else.
pub fn generate_results(lanes: usize, rng: &mut dyn RandomSource) -> Vec<LaneResult> {
    let mut results = vec![LaneResult::Pass; lanes];
    if lanes > 0 {
        results[rng.pick(lanes)] = LaneResult::Win;
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::{GameRng, ScriptedRng};

    #[test]
    fn test_generate_shape() {
        let config = LadderConfig::default();
        let mut rng = GameRng::new(7);

        for lanes in 2..=10 {
            let map = LadderMap::generate(lanes, &config, &mut rng);
            assert_eq!(map.len(), 90);

            let per_lane = config.obstacles_per_lane(lanes);
            for lane in 0..lanes {
                let levels: Vec<usize> = map
                    .iter()
                    .filter(|(_, o)| o.lane == lane)
                    .map(|(level, _)| level)
                    .collect();
                assert_eq!(levels.len(), per_lane);
                assert!(levels.iter().all(|&l| (8..=81).contains(&l)));
            }
            assert!(map.iter().all(|(_, o)| o.lane < lanes));
        }
    }

    #[test]
    fn test_obstacles_at_past_top() {
        let map = LadderMap::blank(90);
        assert!(map.obstacles_at(89).is_empty());
        assert!(map.obstacles_at(500).is_empty());
        assert!(LadderMap::default().is_empty());
    }

    #[test]
    fn test_results_have_one_win() {
        let mut rng = GameRng::new(3);
        for lanes in 1..=10 {
            let results = generate_results(lanes, &mut rng);
            assert_eq!(results.len(), lanes);
            assert_eq!(results.iter().filter(|r| **r == LaneResult::Win).count(), 1);
        }
        assert!(generate_results(0, &mut rng).is_empty());
    }

    #[test]
    fn test_results_win_lane_is_drawn() {
        let mut rng = ScriptedRng::new(0).with_ints([2]);
        let results = generate_results(4, &mut rng);
        assert_eq!(
            results,
            vec![LaneResult::Pass, LaneResult::Pass, LaneResult::Win, LaneResult::Pass]
        );
    }

    #[test]
    fn test_serialization() {
        let mut map = LadderMap::blank(3);
        map.place(
            1,
            Obstacle {
                kind: ObstacleKind::Tornado,
                lane: 2,
            },
        );
        map.place(7, Obstacle { kind: ObstacleKind::Rocket, lane: 0 });
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json[1][0]["type"], "tornado");
        assert_eq!(json[1][0]["lane"], 2);
        assert_eq!(json[0].as_array().unwrap().len(), 0);
    }
}
