//! Parameter grid for the host optimizer

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::config::StrategyParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamGrid {
    pub windows: Vec<usize>,
    pub entries: Vec<f64>,
    pub exits: Vec<f64>,
    pub atr_mults: Vec<f64>,
    pub vol_targets: Vec<f64>,
    pub cooldowns: Vec<i64>,
    pub time_stops: Vec<i64>,
}

impl ParamGrid {
    /// Quick: 1×3×2×3×1×1×2 = 36 combinations
    pub fn quick() -> Self {
        Self {
            windows: vec![20],
            entries: vec![1.5, 2.0, 2.5],
            exits: vec![0.5, 1.0],
            atr_mults: vec![2.0, 2.5, 3.0],
            vol_targets: vec![0.01],
            cooldowns: vec![3],
            time_stops: vec![10, 15],
        }
    }

    /// Full: 3×4×4×4×3×3×4, 6480 after dropping exit >= entry
    pub fn full() -> Self {
        Self {
            windows: vec![10, 20, 30],
            entries: vec![1.5, 2.0, 2.5, 3.0],
            exits: vec![0.0, 0.5, 1.0, 1.5],
            atr_mults: vec![1.5, 2.0, 2.5, 3.0],
            vol_targets: vec![0.005, 0.01, 0.015],
            cooldowns: vec![0, 3, 5],
            time_stops: vec![5, 10, 15, 20],
        }
    }

    /// Every valid combination, other fields taken from `base`
    pub fn generate(&self, base: &StrategyParams) -> Vec<StrategyParams> {
        iproduct!(
            &self.windows,
            &self.entries,
            &self.exits,
            &self.atr_mults,
            &self.vol_targets,
            &self.cooldowns,
            &self.time_stops
        )
        .filter_map(|(&window, &entry, &exit, &atr_mult, &vol_target, &cooldown, &time_stop)| {
            if exit >= entry {
                return None;
            }
            let params = StrategyParams {
                window,
                entry,
                exit,
                atr_mult,
                vol_target,
                cooldown,
                time_stop,
                ..base.clone()
            };
            params.validate().ok().map(|_| params)
        })
        .collect()
    }

    pub fn total_combinations(&self) -> usize {
        let entry_exit_pairs = iproduct!(&self.entries, &self.exits)
            .filter(|(entry, exit)| exit < entry)
            .count();
        self.windows.len()
            * entry_exit_pairs
            * self.atr_mults.len()
            * self.vol_targets.len()
            * self.cooldowns.len()
            * self.time_stops.len()
    }
}
