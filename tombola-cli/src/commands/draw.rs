use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use tombola_core::{pool, Lottery, LotteryState, Result, StoreHub};

#[derive(Subcommand)]
pub enum DrawCommands {
    /// Select prizes and rebuild the winner slots
    Select {
        /// Prize IDs to include
        #[arg(required = true)]
        prizes: Vec<String>,
    },
    /// Run a global draw: animate on the display, settle on confirmation
    Run {
        /// Prize IDs to draw; defaults to the current selection
        prizes: Vec<String>,
    },
    /// Redraw a single winner slot
    Redraw {
        /// Winner slot ID
        winner_id: String,
    },
    /// Confirm a settled winner
    Confirm {
        /// Winner slot ID
        winner_id: String,
    },
    /// Clear all winner slots and the session state
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Show the current draw session
    Status,
}

pub async fn handle_draw_command(cmd: DrawCommands, hub: &StoreHub) -> Result<()> {
    // Status is read-only so it cannot disturb a panel running elsewhere.
    if let DrawCommands::Status = cmd {
        let state = super::load_state(hub).await?;
        print_status(&state);
        return Ok(());
    }

    let lottery = Lottery::open(hub.attach()).await?;

    match cmd {
        DrawCommands::Select { prizes } => {
            lottery.select_prizes_for_draw(&prizes).await?;
            let state = lottery.snapshot().await;
            println!(
                "{} winner slots ready across {} prizes",
                state.winners.len(),
                state.selected_prize_ids.len()
            );
        }

        DrawCommands::Run { prizes } => {
            let prizes = if prizes.is_empty() {
                lottery.snapshot().await.selected_prize_ids
            } else {
                prizes
            };
            lottery.start_global_drawing(&prizes).await?;
            println!("Drawing... the display window is animating");

            let stop = Confirm::new()
                .with_prompt("Stop the draw and settle the winners?")
                .default(true)
                .interact()?;
            if !stop {
                lottery.clear_winners().await?;
                println!("Draw abandoned, winner slots cleared");
                return Ok(());
            }

            let finals = lottery.sample_final_numbers().await;
            lottery.stop_global_drawing(&finals).await?;

            let state = lottery.snapshot().await;
            print_winners(&state);
            println!("Confirm each slot with 'tombola draw confirm <winner-id>'");
        }

        DrawCommands::Redraw { winner_id } => {
            lottery.start_individual_redraw(&winner_id).await?;
            if lottery.snapshot().await.current_redraw_winner_id.is_none() {
                println!("No such winner slot: {}", winner_id);
                return Ok(());
            }
            println!("Redrawing... the display window is animating this slot");

            let _ = Confirm::new()
                .with_prompt("Stop the redraw and settle this slot?")
                .default(true)
                .interact()?;

            let pool = lottery.current_pool().await;
            let value = pool::sample_one(&pool, &mut rand::thread_rng());
            lottery.stop_individual_redraw(&winner_id, &value).await?;
            if value.is_empty() {
                println!("Participant pool was empty, the slot is back to unset");
            } else {
                println!("Slot settled on '{}'", value);
            }
        }

        DrawCommands::Confirm { winner_id } => {
            lottery.confirm_winner(&winner_id).await?;
            println!("Winner confirmed");
        }

        DrawCommands::Clear { force } => {
            if !force {
                let confirmed = Confirm::new()
                    .with_prompt("Clear all winner slots?")
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Aborted");
                    return Ok(());
                }
            }
            lottery.clear_winners().await?;
            println!("Winner slots cleared");
        }

        DrawCommands::Status => unreachable!("handled above"),
    }

    Ok(())
}

fn print_status(state: &LotteryState) {
    if state.is_global_drawing {
        println!("Session: global draw running");
    } else if let Some(id) = &state.current_redraw_winner_id {
        println!("Session: redrawing slot {}", id);
    } else if state.winners.is_empty() {
        println!("Session: idle, no winner slots");
    } else {
        println!("Session: {} slots ready", state.winners.len());
    }
    print_winners(state);
}

fn print_winners(state: &LotteryState) {
    if state.winners.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Slot", "Prize", "Participant", "Confirmed", "ID"]);
    for winner in &state.winners {
        table.add_row(vec![
            winner.slot_index.to_string(),
            winner.prize_name.clone(),
            if winner.participant_number.is_empty() {
                "-".to_string()
            } else {
                winner.participant_number.clone()
            },
            if winner.confirmed { "yes" } else { "no" }.to_string(),
            winner.id.clone(),
        ]);
    }
    println!("{table}");
}
