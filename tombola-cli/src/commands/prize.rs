use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use std::path::PathBuf;
use tombola_core::{Lottery, Result, StoreHub};

#[derive(Subcommand)]
pub enum PrizeCommands {
    /// Add a prize
    Add {
        /// Display name
        name: String,
        /// Number of winners for this prize
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// PNG or JPEG picture shown next to the prize
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// List all prizes
    List,
    /// Update a prize
    Update {
        /// Prize ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        quantity: Option<u32>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Delete a prize and every winner slot referencing it
    Delete {
        /// Prize ID
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_prize_command(cmd: PrizeCommands, hub: &StoreHub) -> Result<()> {
    let lottery = Lottery::open(hub.attach()).await?;

    match cmd {
        PrizeCommands::Add {
            name,
            quantity,
            image,
        } => {
            let bytes = read_image(image).await?;
            let prize = lottery.add_prize(&name, quantity, bytes.as_deref()).await?;

            println!("Added prize '{}' ({} winners)", prize.name, prize.quantity);
            println!("  ID: {}", prize.id);
        }

        PrizeCommands::List => {
            let state = lottery.snapshot().await;
            if state.prizes.is_empty() {
                println!("No prizes yet. Add one with 'tombola prize add'");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["ID", "Name", "Winners", "Image"]);
            for prize in &state.prizes {
                table.add_row(vec![
                    prize.id.clone(),
                    prize.name.clone(),
                    prize.quantity.to_string(),
                    if prize.image.is_some() { "yes" } else { "-" }.to_string(),
                ]);
            }
            println!("{table}");
        }

        PrizeCommands::Update {
            id,
            name,
            quantity,
            image,
        } => {
            let bytes = read_image(image).await?;
            lottery
                .update_prize(&id, name.as_deref(), quantity, bytes.as_deref())
                .await?;
            println!("Updated prize {}", id);
        }

        PrizeCommands::Delete { id, force } => {
            if !force {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Delete prize {} and all of its winner slots?",
                        id
                    ))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Aborted");
                    return Ok(());
                }
            }

            lottery.delete_prize(&id).await?;
            println!("Deleted prize {}", id);
        }
    }

    Ok(())
}

async fn read_image(path: Option<PathBuf>) -> Result<Option<Vec<u8>>> {
    match path {
        Some(path) => Ok(Some(tokio::fs::read(path).await?)),
        None => Ok(None),
    }
}
