//! Grid command implementation

use anyhow::Result;
use mean_reversion_core::grid::ParamGrid;
use tracing::info;

pub fn run(config_path: String, full: bool, top: usize) -> Result<()> {
    let config = super::load_config(&config_path, &[])?;
    let grid = if full {
        ParamGrid::full()
    } else {
        ParamGrid::quick()
    };

    let combos = grid.generate(&config.strategy);
    info!(
        "{} grid: {} combinations",
        if full { "Full" } else { "Quick" },
        grid.total_combinations()
    );

    println!("\n{}", "=".repeat(60));
    println!("PARAMETER GRID ({} combinations)", combos.len());
    println!("{}", "=".repeat(60));
    for (i, params) in combos.iter().take(top).enumerate() {
        println!(
            "  #{:<4} window={:<3} entry={:<4} exit={:<4} atr_mult={:<4} vol_target={:<6} cooldown={:<2} time_stop={}",
            i + 1,
            params.window,
            params.entry,
            params.exit,
            params.atr_mult,
            params.vol_target,
            params.cooldown,
            params.time_stop
        );
    }
    if combos.len() > top {
        println!("  ... {} more", combos.len() - top);
    }
    println!("{}", "-".repeat(60));

    Ok(())
}
