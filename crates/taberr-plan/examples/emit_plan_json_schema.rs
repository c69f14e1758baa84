use std::env;
use std::fs;

use taberr_plan::plan_json_schema;

/// Print the plan JSON Schema, or write it to the path given as argument.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&plan_json_schema())?;
    match env::args().nth(1) {
        Some(path) => fs::write(&path, format!("{json}\n"))?,
        None => println!("{json}"),
    }
    Ok(())
}
