//! `sourcecheck stop` – ask a running check to stop.

use anyhow::Result;

use crate::cli::control_socket;

pub async fn run_stop() -> Result<()> {
    let path = sourcecheck_core::control::default_control_socket_path()?;
    if control_socket::send_stop(&path).await? {
        println!("Stop requested");
    } else {
        println!("No check is running");
    }
    Ok(())
}
