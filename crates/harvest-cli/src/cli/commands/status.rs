//! `harvest status` – ask the running harvest for its progress.

use anyhow::Result;
use harvest_core::config;

use crate::cli::control_socket;

pub async fn run_status() -> Result<()> {
    let path = config::control_socket_path()?;
    let Some(status) = control_socket::request_status(&path).await? else {
        println!("No harvest running.");
        return Ok(());
    };

    println!(
        "workers {}  stopped {}  offset {}  fetched {}  saved {}",
        status["worker_num"], status["stop_num"], status["offset"], status["fetched_num"], status["saved_num"]
    );
    if let Some(rows) = status["workers"].as_array() {
        println!(
            "{:<4} {:<8} {:>8} {:>8} {:>8}  {}",
            "ID", "STATUS", "OFFSET", "FETCHED", "SAVED", "JOB"
        );
        for r in rows {
            println!(
                "{:<4} {:<8} {:>8} {:>8} {:>8}  {}",
                r["id"],
                r["status"].as_str().unwrap_or("-"),
                r["offset"],
                r["fetched"],
                r["saved"],
                r["job"].as_str().unwrap_or("-")
            );
        }
    }
    Ok(())
}
