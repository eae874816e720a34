use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "MIDI clock generator", long_about = None)]
pub struct Args {
    /// List available MIDI output ports
    #[arg(long)]
    pub list_ports: bool,

    /// Pick the MIDI output port from an interactive list
    #[arg(long)]
    pub choose_port: bool,

    /// MIDI output port index (negative selects the device default)
    #[arg(short, long)]
    pub port: Option<i64>,

    /// Tempo in beats per minute, clamped to 20-300
    #[arg(short, long)]
    pub bpm: Option<f64>,

    /// Start the clock immediately
    #[arg(long)]
    pub play: bool,

    /// Hide the status readout
    #[arg(long)]
    pub no_debug: bool,

    /// Settings file (toml, json, yaml, ini)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Coarse-sleep guard band before each pulse, in microseconds
    #[arg(long)]
    pub guard_band_us: Option<u64>,

    /// Pulses the scheduler may fall behind before it resynchronizes
    #[arg(long)]
    pub drift_threshold: Option<u32>,
}

pub fn handle_port_list() -> Vec<String> {
    crate::midi::list_output_ports()
}

/// Renders the port list the way `--list-ports` prints it
pub fn format_port_list(ports: &[String]) -> String {
    if ports.is_empty() {
        return "No MIDI output ports available\n".to_string();
    }
    let mut listing = String::from("Available MIDI output ports:\n");
    for (index, name) in ports.iter().enumerate() {
        listing.push_str(&format!("  {}: {}\n", index, name));
    }
    listing
}
