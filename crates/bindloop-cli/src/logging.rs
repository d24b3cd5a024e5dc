use crate::error::{CliError, Result};
use crate::ui::UiEvent;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, MakeWriter, writer::BoxMakeWriter},
    prelude::*,
};

/// Console log sink that prints above the progress bars instead of through them.
#[derive(Clone)]
pub struct UiLogWriter {
    sender: mpsc::Sender<UiEvent>,
}

impl UiLogWriter {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }
}

impl Write for UiLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = String::from_utf8_lossy(buf).trim_end().to_string();
        if !line.is_empty() {
            // Once the UI has shut down, fall back to plain stderr.
            if let Err(e) = self.sender.try_send(UiEvent::Log(line)) {
                if let UiEvent::Log(line) = e.into_inner() {
                    eprintln!("{}", line);
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for UiLogWriter {
    type Writer = UiLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

pub fn setup_logging(
    verbosity: u8,
    quiet: bool,
    log_file: Option<PathBuf>,
    ui_sender: Option<mpsc::Sender<UiEvent>>,
) -> Result<()> {
    let level_filter = if quiet {
        LevelFilter::ERROR
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let console_writer = match ui_sender {
        Some(sender) => BoxMakeWriter::new(UiLogWriter::new(sender)),
        None => BoxMakeWriter::new(std::io::stderr),
    };
    let console_layer = fmt::layer()
        .with_writer(console_writer)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(level_filter)
        .with(console_layer);

    if let Some(path) = log_file {
        let file = File::create(&path).map_err(CliError::Io)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_target(true);

        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
    }

    Ok(())
}
