use std::env;
use std::path::PathBuf;

use taberr_core::{Column, Table};
use taberr_inject::output::{write_mask_csv, write_table_csv};
use taberr_inject::{LogFormat, create_errors_from_plan, evaluate, init_tracing};
use taberr_plan::load_plan;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let plan_path = args.next().map(PathBuf::from).ok_or("missing plan path")?;
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("out"));
    std::fs::create_dir_all(&out_dir)?;

    init_tracing(LogFormat::Pretty)?;

    let table = demo_table()?;
    let plan = load_plan(&plan_path)?;
    let (dirty, error_mask, report) = create_errors_from_plan(&table, &plan)?;

    let table_bytes = write_table_csv(&out_dir.join("dirty.csv"), &dirty)?;
    let mask_bytes = write_mask_csv(&out_dir.join("error_mask.csv"), &error_mask)?;
    let metrics = evaluate(&table, &dirty, &error_mask)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!(
        "wrote {table_bytes} + {mask_bytes} bytes, {} cells flagged, {} changed",
        metrics.masked, metrics.changed
    );
    Ok(())
}

fn demo_table() -> Result<Table, taberr_core::Error> {
    let rows = 100;
    Table::new(vec![
        Column::ints("id", 0..rows),
        Column::floats("price", (0..rows).map(|row| 10.0 + (row % 17) as f64 * 2.5)),
        Column::texts("city", (0..rows).map(|row| ["Berlin", "Lisboa", "Recife", "Porto"][row as usize % 4])),
        Column::categorical("tier", (0..rows).map(|row| ["gold", "silver", "bronze"][row as usize % 3])),
    ])
}
