use std::time::Duration;
use tombola_core::{DisplayFrame, DisplayWindow, Result, SlotPhase, StoreHub};

/// Long-running audience display. Re-renders only when the projection
/// content actually changes.
pub async fn run_display(hub: &StoreHub, poll_ms: u64) -> Result<()> {
    let mut window = DisplayWindow::with_poll(hub.attach(), Duration::from_millis(poll_ms));
    println!("Display window running, Ctrl-C to exit");
    window.run(print_frame).await
}

fn print_frame(frame: DisplayFrame) {
    println!();
    if !frame.event_name.is_empty() {
        println!("== {} ==", frame.event_name);
    }

    if frame.groups.is_empty() {
        println!("Waiting for prizes from the control panel...");
        return;
    }

    for group in &frame.groups {
        let slots: Vec<String> = group
            .slots
            .iter()
            .map(|slot| match slot.phase {
                SlotPhase::Animating => format!("~{}~", slot.value),
                SlotPhase::Settled if frame.celebrating.contains(&slot.winner_id) => {
                    format!("*{}*", slot.value)
                }
                _ => format!("[{}]", slot.value),
            })
            .collect();
        println!("{:<24} {}", group.prize.name, slots.join("  "));
    }

    if frame.is_drawing {
        println!("DRAWING...");
    } else if !frame.celebrating.is_empty() {
        println!("CONGRATULATIONS!");
    }
}
