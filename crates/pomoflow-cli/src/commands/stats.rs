use chrono::Local;
use pomoflow_core::{history, Config};

use super::open_database;

pub fn run(recent: usize, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database(config)?;
    let summary = history::summary(&db, Local::now().date_naive(), recent)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
