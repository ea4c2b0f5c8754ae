// Console Report: fixed-width summary of the averaged sweep

use aloha_sweep::{HarnessConfig, ResultTable};

pub fn print_header(cfg: &HarnessConfig) {
    let exp = &cfg.experiment;
    println!("\n  Slotted ALOHA Sweep");
    println!(
        "  Engine: {} {} | N={} M={} r={} | Trials/cell: {}",
        cfg.engine.program,
        cfg.engine.args.join(" "),
        exp.node_count,
        exp.max_slots,
        exp.repetitions,
        exp.trials,
    );
    println!(
        "  Grid: W={:?} x p={:?} ({} cells)\n",
        exp.windows,
        exp.probabilities,
        exp.cell_count()
    );
}

/// One line per cell with the two plotted fields.
pub fn format_table(table: &ResultTable) -> Vec<String> {
    let mut lines = Vec::with_capacity(table.cells().count() + 2);
    lines.push(format!(
        "  {:>6} {:>10} {:>14} {:>14} {:>8}",
        "W", "p", "field[3]", "field[4]", "Fields"
    ));
    lines.push(format!("  {}", "-".repeat(56)));
    for cell in table.cells() {
        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"));
        lines.push(format!(
            "  {:>6} {:>10} {:>14} {:>14} {:>8}",
            cell.window(),
            cell.probability(),
            fmt(cell.mean.throughput_proxy()),
            fmt(cell.mean.delay_proxy()),
            cell.mean.len(),
        ));
    }
    lines
}

pub fn print_table(table: &ResultTable, output: &std::path::Path) {
    for line in format_table(table) {
        println!("{line}");
    }
    println!("\n  Figure saved to: {}\n", output.display());
}
