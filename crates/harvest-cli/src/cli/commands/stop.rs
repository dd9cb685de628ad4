//! `harvest stop` – stop the running harvest.

use anyhow::Result;
use harvest_core::config;

use crate::cli::control_socket;

pub async fn run_stop() -> Result<()> {
    let path = config::control_socket_path()?;
    if control_socket::send_stop(&path).await? {
        println!("Stop requested.");
    } else {
        println!("No harvest running.");
    }
    Ok(())
}
