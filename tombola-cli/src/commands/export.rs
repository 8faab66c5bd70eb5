use std::path::PathBuf;
use tombola_core::{export, Result, StoreHub};

/// Read-only CSV export of the current winner list.
pub async fn handle_export(hub: &StoreHub, output: Option<PathBuf>) -> Result<()> {
    let state = super::load_state(hub).await?;
    if state.winners.is_empty() {
        println!("No winner slots to export");
        return Ok(());
    }

    let csv = export::winners_csv(&state);
    let path =
        output.unwrap_or_else(|| PathBuf::from(export::default_export_name(&state.event_name)));
    tokio::fs::write(&path, csv).await?;
    println!(
        "Exported {} winner slots to {}",
        state.winners.len(),
        path.display()
    );
    Ok(())
}
