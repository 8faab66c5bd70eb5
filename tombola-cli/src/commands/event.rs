use clap::Subcommand;
use std::path::PathBuf;
use tombola_core::{pool, DrawMode, Lottery, Result, StoreHub, TombolaError};

#[derive(Subcommand)]
pub enum EventCommands {
    /// Set the event title shown on the display
    SetName {
        name: String,
    },
    /// Set the number-mode participant range: N, a-b, or a comma list
    SetRange {
        range: String,
    },
    /// Load the name-mode participant list from a file, one name per line
    SetNames {
        file: PathBuf,
    },
    /// Switch between number and name mode
    Mode {
        /// "number" or "name"
        mode: String,
    },
    /// Set or clear the display background picture
    Background {
        /// PNG or JPEG file; omit together with --clear to remove it
        path: Option<PathBuf>,
        #[arg(long)]
        clear: bool,
    },
    /// Show the current settings
    Show,
}

pub async fn handle_event_command(cmd: EventCommands, hub: &StoreHub) -> Result<()> {
    let lottery = Lottery::open(hub.attach()).await?;

    match cmd {
        EventCommands::SetName { name } => {
            lottery.set_event_name(&name).await?;
            println!("Event name set to '{}'", name.trim());
        }

        EventCommands::SetRange { range } => {
            lottery.set_participant_range(&range).await?;
            let pool = pool::parse_range_spec(&range);
            println!("Participant range set, {} numbers in the pool", pool.len());
        }

        EventCommands::SetNames { file } => {
            let names = tokio::fs::read_to_string(&file).await?;
            let parsed = pool::parse_name_list(&names);
            if parsed.is_empty() {
                return Err(TombolaError::validation(format!(
                    "no participant names found in {}",
                    file.display()
                )));
            }
            lottery.set_participant_names(&names).await?;
            println!("Loaded {} participant names", parsed.len());
        }

        EventCommands::Mode { mode } => {
            let mode = match mode.as_str() {
                "number" => DrawMode::Number,
                "name" => DrawMode::Name,
                other => {
                    return Err(TombolaError::validation(format!(
                        "unknown draw mode '{}', expected 'number' or 'name'",
                        other
                    )))
                }
            };
            lottery.set_draw_mode(mode).await?;
            println!("Draw mode set to {:?}", mode);
        }

        EventCommands::Background { path, clear } => match (path, clear) {
            (Some(path), false) => {
                let bytes = tokio::fs::read(&path).await?;
                lottery.set_background_image(Some(&bytes)).await?;
                println!("Background picture set from {}", path.display());
            }
            (None, true) => {
                lottery.set_background_image(None).await?;
                println!("Background picture cleared");
            }
            _ => {
                return Err(TombolaError::validation(
                    "pass a picture file or --clear, not both",
                ))
            }
        },

        EventCommands::Show => {
            let state = lottery.snapshot().await;
            println!("Event:      {}", or_dash(&state.event_name));
            println!("Draw mode:  {:?}", state.draw_mode);
            println!("Range:      {}", or_dash(&state.participant_range));
            println!(
                "Names:      {} loaded",
                pool::parse_name_list(&state.participant_names).len()
            );
            println!(
                "Background: {}",
                if state.background_image.is_some() { "set" } else { "-" }
            );
            println!("Prizes:     {}", state.prizes.len());
            println!("Slots:      {}", state.winners.len());
        }
    }

    Ok(())
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
