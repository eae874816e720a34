use simplelog::{CombinedLogger, Config, ConfigBuilder, LevelFilter, ThreadLogMode, WriteLogger};
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "midiclockrs.log";

/// `$HOME/.local/share/midiclockrs/logs`
pub fn log_dir() -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("midiclockrs")
        .join("logs"))
}

/// simplelog prints thread names at the given level and every more verbose
/// one, so `Error` puts the name on all lines and the clock thread can be
/// told apart from the control threads
fn log_config() -> Config {
    ConfigBuilder::new()
        .set_thread_level(LevelFilter::Error)
        .set_thread_mode(ThreadLogMode::Names)
        .set_target_level(LevelFilter::Error)
        .build()
}

/// Routes the `log` facade to the application log file. Returns the file
/// path. Safe to call more than once.
pub fn init_logger() -> Result<PathBuf, Error> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join(LOG_FILE_NAME);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let config = log_config();

    INIT.call_once(|| {
        if CombinedLogger::init(vec![WriteLogger::new(LevelFilter::Debug, config, log_file)])
            .is_ok()
        {
            LOGGER_INITIALIZED.store(true, Ordering::SeqCst);
        }
    });

    if LOGGER_INITIALIZED.load(Ordering::SeqCst) {
        Ok(log_path)
    } else {
        Err(Error::new(ErrorKind::Other, "Logger initialization failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Record};
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_every_level_carries_thread_name() {
        let buffer = SharedBuffer::default();
        let logger = WriteLogger::new(LevelFilter::Debug, log_config(), buffer.clone());

        thread::Builder::new()
            .name("midi-clock".to_string())
            .spawn(move || {
                for level in [Level::Warn, Level::Info, Level::Debug] {
                    logger.log(
                        &Record::builder()
                            .args(format_args!("MIDI clock drift detected"))
                            .level(level)
                            .target("midiclockrs")
                            .build(),
                    );
                }
            })
            .unwrap()
            .join()
            .unwrap();

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            assert!(line.contains("midi-clock"), "no thread name in {:?}", line);
        }
    }
}
