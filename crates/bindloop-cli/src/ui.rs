use bindloop::engine::progress::{Progress, ProgressCallback};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::warn;

const EVENT_QUEUE: usize = 1024;
const TICK: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum UiEvent {
    Progress(Progress),
    Log(String),
}

/// Renders design-loop progress on stderr.
///
/// One phase is shown at a time: a spinner while a trajectory is generated and
/// scored, turned into a candidate counter once redesign starts validating.
pub struct UiManager {
    multi: MultiProgress,
    events: mpsc::Receiver<UiEvent>,
    shutdown: watch::Receiver<bool>,
    phase: Option<Phase>,
}

struct Phase {
    name: String,
    bar: ProgressBar,
}

impl UiManager {
    pub fn new() -> (Self, mpsc::Sender<UiEvent>, watch::Sender<bool>) {
        let (event_sender, events) = mpsc::channel(EVENT_QUEUE);
        let (shutdown_sender, shutdown) = watch::channel(false);
        let manager = Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
            events,
            shutdown,
            phase: None,
        };
        (manager, event_sender, shutdown_sender)
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(event) = self.events.recv() => self.handle_event(event),
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
        self.close_phase();
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log(line) => self.print(line),
            UiEvent::Progress(progress) => self.handle_progress(progress),
        }
    }

    fn handle_progress(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.close_phase();
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(spinner_style());
                bar.set_message(name.clone());
                bar.enable_steady_tick(TICK);
                self.phase = Some(Phase { name, bar });
            }
            Progress::PhaseFinish => {
                if let Some(name) = self.close_phase() {
                    self.print(format!("✓ {}", name));
                }
            }
            Progress::TaskStart { total_steps } => {
                if let Some(phase) = &self.phase {
                    phase.bar.disable_steady_tick();
                    phase.bar.set_style(candidate_style());
                    phase.bar.set_length(total_steps);
                    phase.bar.reset();
                }
            }
            Progress::TaskIncrement => {
                if let Some(phase) = &self.phase {
                    phase.bar.inc(1);
                }
            }
            Progress::TaskFinish => {
                if let Some(phase) = &self.phase {
                    phase.bar.finish();
                }
            }
            Progress::Message(msg) => self.print(format!("  {}", msg)),
        }
    }

    /// Clears the current bar and returns the name of the phase it showed.
    fn close_phase(&mut self) -> Option<String> {
        let phase = self.phase.take()?;
        phase.bar.finish_and_clear();
        self.multi.remove(&phase.bar);
        Some(phase.name)
    }

    fn print(&self, line: String) {
        if self.multi.println(&line).is_err() {
            eprintln!("{}", line);
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn candidate_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<40} {wide_bar:.cyan/blue} {pos}/{len} candidates")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Forwards engine progress into the UI channel.
#[derive(Clone)]
pub struct CliProgressHandler {
    sender: mpsc::Sender<UiEvent>,
}

impl CliProgressHandler {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let sender = self.sender.clone();
        Box::new(move |progress: Progress| {
            if let Err(e) = sender.try_send(UiEvent::Progress(progress)) {
                warn!("Dropped a progress update: {}", e);
            }
        })
    }
}
