use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use qfold::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// One open phase. An attempt's phases ("Evolution", "Replicates", ...) nest inside the batch
/// phase "Discovery", each with its own optional step counter.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    name: &'static str,
    length: Option<u64>,
    position: u64,
}

/// Renders engine progress on stderr as a single line whose prefix is the innermost open
/// phase. Closing a nested phase restores the counter of the phase around it. Attempt
/// messages are printed above the line.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: ProgressBar,
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Tracks phases without drawing anything, for `--quiet` runs.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target).with_style(spinner_style());
        Self {
            bar,
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let handler = self.clone();
        Box::new(move |progress| handler.handle(progress))
    }

    fn handle(&self, progress: Progress) {
        let Ok(mut frames) = self.frames.lock() else {
            warn!("Progress state mutex was poisoned. Cannot update progress.");
            return;
        };

        match progress {
            Progress::PhaseStart { name } => {
                frames.push(Frame {
                    name,
                    length: None,
                    position: 0,
                });
                self.show(&frames);
            }
            Progress::PhaseFinish => {
                let finished = frames.pop();
                if frames.is_empty() {
                    self.bar.disable_steady_tick();
                    let name = finished.map_or("Discovery", |f| f.name);
                    self.bar.finish_with_message(format!("{name} complete"));
                } else {
                    self.show(&frames);
                }
            }
            Progress::TaskStart { total_steps } => {
                if let Some(top) = frames.last_mut() {
                    top.length = Some(total_steps);
                    top.position = 0;
                }
                self.show(&frames);
            }
            Progress::TaskIncrement => {
                if let Some(top) = frames.last_mut() {
                    top.position += 1;
                }
                self.bar.inc(1);
            }
            Progress::TaskFinish => {
                if let Some(top) = frames.last_mut() {
                    if let Some(length) = top.length {
                        top.position = length;
                    }
                }
                self.show(&frames);
            }
            Progress::StatusUpdate { text } => self.bar.set_message(text),
            Progress::Message(text) => self.bar.println(format!("  {text}")),
        }
    }

    /// Redraws the line for the innermost phase.
    fn show(&self, frames: &[Frame]) {
        let Some(top) = frames.last() else {
            return;
        };
        self.bar.set_prefix(top.name);
        self.bar.set_message("");
        match top.length {
            Some(length) => {
                self.bar.disable_steady_tick();
                self.bar.set_style(counter_style());
                self.bar.set_length(length);
                self.bar.set_position(top.position);
            }
            None => {
                self.bar.set_style(spinner_style());
                self.bar.unset_length();
                self.bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
        }
    }

    #[cfg(test)]
    fn phase_names(&self) -> Vec<&'static str> {
        self.frames.lock().unwrap().iter().map(|f| f.name).collect()
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn counter_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>20.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn handler_starts_with_no_open_phase() {
        let handler = CliProgressHandler::hidden();
        assert!(handler.phase_names().is_empty());
        assert_eq!(handler.bar.position(), 0);
    }

    #[test]
    fn closing_an_attempt_phase_restores_the_batch_counter() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Discovery" });
        callback(Progress::TaskStart { total_steps: 3 });
        callback(Progress::TaskIncrement);

        callback(Progress::PhaseStart { name: "Replicates" });
        callback(Progress::TaskStart { total_steps: 20 });
        for _ in 0..7 {
            callback(Progress::TaskIncrement);
        }
        assert_eq!(handler.phase_names(), vec!["Discovery", "Replicates"]);
        assert_eq!(handler.bar.prefix(), "Replicates");
        assert_eq!(handler.bar.length(), Some(20));
        assert_eq!(handler.bar.position(), 7);

        callback(Progress::TaskFinish);
        callback(Progress::PhaseFinish);
        assert_eq!(handler.phase_names(), vec!["Discovery"]);
        assert_eq!(handler.bar.prefix(), "Discovery");
        assert_eq!(handler.bar.length(), Some(3));
        assert_eq!(handler.bar.position(), 1);
        assert!(!handler.bar.is_finished());

        callback(Progress::TaskIncrement);
        callback(Progress::TaskIncrement);
        callback(Progress::TaskFinish);
        callback(Progress::PhaseFinish);
        assert!(handler.phase_names().is_empty());
        assert!(handler.bar.is_finished());
        assert_eq!(handler.bar.message(), "Discovery complete");
    }

    #[test]
    fn status_updates_and_messages_leave_the_phases_alone() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Evolution" });
        callback(Progress::StatusUpdate {
            text: "Evolution: change 3.10e-4".to_string(),
        });
        callback(Progress::Message(
            "KKKKKKKKKKKK: rejected, failed gates: quality".to_string(),
        ));
        assert_eq!(handler.phase_names(), vec!["Evolution"]);
        assert_eq!(handler.bar.message(), "Evolution: change 3.10e-4");
    }

    #[test]
    fn callbacks_from_worker_threads_share_one_line() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();
        callback(Progress::PhaseStart { name: "Discovery" });
        callback(Progress::TaskStart { total_steps: 4 });

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handler = handler.clone();
                thread::spawn(move || {
                    let callback = handler.get_callback();
                    callback(Progress::Message("attempt finished".to_string()));
                    callback(Progress::TaskIncrement);
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(handler.bar.position(), 4);
        callback(Progress::PhaseFinish);
        assert!(handler.bar.is_finished());
    }
}
