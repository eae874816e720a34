use clap::Parser;
use crossbeam::channel::unbounded;
use dialoguer::Select;
use midiclockrs::{
    cli::{format_port_list, handle_port_list, Args},
    config::{Settings, DEFAULT_PORT_INDEX},
    event_loop::EventLoop,
    logging,
    midi::{DefaultSink, OutputPort},
    tui::{run_input_loop, CONTROLS_HELP},
    ui::StatusDisplay,
    MidiClock,
};
use std::error::Error;
use std::thread;

const CLIENT_NAME: &str = "midiclockrs";

fn main() {
    initialize_logging();
    let args = Args::parse();

    if let Err(e) = run(args) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn initialize_logging() {
    match logging::init_logger() {
        Ok(path) => log::info!("Application starting, logging to {}", path.display()),
        Err(e) => eprintln!("Logging disabled: {}", e),
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load(&args)?;

    if args.list_ports {
        print!("{}", format_port_list(&handle_port_list()));
        return Ok(());
    }

    let port = if args.choose_port {
        choose_port()?
    } else {
        settings.port.unwrap_or(DEFAULT_PORT_INDEX)
    };

    let mut sink = DefaultSink::new(CLIENT_NAME);
    if let Err(e) = sink.open_port(port) {
        // The clock still runs; bytes are dropped until a reconnect succeeds
        log::warn!("No MIDI output connected: {}", e);
        eprintln!("No MIDI output connected: {}", e);
    }

    let clock = MidiClock::with_config(sink, settings.scheduler_config());
    clock.set_bpm(settings.bpm);
    if settings.play {
        clock.play();
    }

    println!("{}\n", CONTROLS_HELP);

    let (message_tx, message_rx) = unbounded();
    let input = thread::Builder::new()
        .name("input".to_string())
        .spawn(move || {
            if let Err(e) = run_input_loop(message_tx) {
                log::error!("Input loop failed: {}", e);
            }
        })?;

    let mut event_loop = EventLoop::new(clock, message_rx, StatusDisplay::new(settings.debug));
    event_loop.run();

    if input.join().is_err() {
        log::error!("Input thread panicked");
    }
    log::info!("Application exiting");
    Ok(())
}

fn choose_port() -> Result<usize, Box<dyn Error>> {
    let ports = handle_port_list();
    if ports.is_empty() {
        return Err("No MIDI output ports available".into());
    }

    let selection = Select::new()
        .with_prompt("MIDI output port")
        .items(&ports)
        .default(DEFAULT_PORT_INDEX.min(ports.len() - 1))
        .interact_opt()?;

    Ok(selection.unwrap_or(DEFAULT_PORT_INDEX))
}
