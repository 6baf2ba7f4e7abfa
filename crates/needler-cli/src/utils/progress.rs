use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use needler::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;
const SEARCH_PHASE: &str = "Searching";

/// What the terminal shows for one optimize run.
struct DisplayState {
    pb: ProgressBar,
    phase: Option<&'static str>,
    search_started: Option<Instant>,
    best: Option<usize>,
    improvements: u32,
}

impl DisplayState {
    fn in_search(&self) -> bool {
        self.phase == Some(SEARCH_PHASE)
    }

    fn search_elapsed(&self) -> Duration {
        self.search_started.map_or(Duration::ZERO, |t| t.elapsed())
    }

    fn search_message(&self) -> String {
        match self.best {
            Some(best) => format!(
                "{SEARCH_PHASE} · best {best} proteins ({} improvements)",
                self.improvements
            ),
            None => format!("{SEARCH_PHASE} · no selection yet"),
        }
    }

    fn start_phase(&mut self, name: &'static str) {
        self.phase = Some(name);
        self.pb.reset();
        self.pb.set_length(0);
        self.pb.set_style(spinner_style());
        self.pb
            .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        if name == SEARCH_PHASE {
            self.search_started = Some(Instant::now());
            self.best = None;
            self.improvements = 0;
            let message = self.search_message();
            self.pb.set_message(message);
        } else {
            self.pb.set_message(name);
        }
    }

    fn finish_phase(&mut self) {
        self.pb.disable_steady_tick();
        let message = if self.in_search() {
            match self.best {
                Some(best) => format!(
                    "✓ Best: {best} proteins after {} improvements in {:.1}s",
                    self.improvements,
                    self.search_elapsed().as_secs_f64()
                ),
                None => "✓ Search ended without a feasible selection".to_string(),
            }
        } else {
            match self.phase {
                Some(name) => format!("✓ {name}"),
                None => "✓ Done".to_string(),
            }
        };
        self.pb.finish_with_message(message);
        self.phase = None;
    }

    fn record_improvement(&mut self, protein_target: usize) {
        self.best = Some(protein_target);
        self.improvements += 1;
        self.pb.println(format!(
            "  ↑ {protein_target} proteins targeted after {:.1}s",
            self.search_elapsed().as_secs_f64()
        ));
        let message = self.search_message();
        self.pb.set_message(message);
    }
}

/// Renders workflow [`Progress`] events on stderr: a spinner per phase, a bar for counted
/// model-building tasks, and a running best count while the search improves.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<DisplayState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(DisplayState {
                pb,
                phase: None,
                search_started: None,
                best: None,
                improvements: 0,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress display mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => state.start_phase(name),
                Progress::PhaseFinish => state.finish_phase(),
                Progress::TaskStart { total_steps } => {
                    state.pb.disable_steady_tick();
                    state.pb.reset();
                    state.pb.set_length(total_steps);
                    state.pb.set_position(0);
                    state.pb.set_style(bar_style());
                }
                Progress::TaskIncrement => state.pb.inc(1),
                Progress::TaskFinish => {
                    let len = state.pb.length().unwrap_or(0);
                    if state.pb.position() < len {
                        state.pb.set_position(len);
                    }
                    state.pb.finish();
                }
                Progress::Improved { protein_target } => state.record_improvement(protein_target),
                Progress::Message(msg) => {
                    if state.pb.is_finished() {
                        state.pb.set_message(msg);
                    } else {
                        state.pb.println(format!("  {msg}"));
                    }
                }
            }
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<28} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key(
            "eta",
            |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
            },
        )
        .progress_chars("##-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = CliProgressHandler::new();
        let state = handler.state.lock().unwrap();
        assert_eq!(state.pb.length(), Some(0));
        assert!(state.pb.is_finished());
        assert_eq!(state.phase, None);
        assert_eq!(state.best, None);
    }

    #[test]
    fn model_building_tasks_drive_the_bar() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Building Constraint Model",
        });
        {
            let state = handler.state.lock().unwrap();
            assert_eq!(state.pb.message(), "Building Constraint Model");
            assert!(!state.pb.is_finished());
        }

        callback(Progress::TaskStart { total_steps: 40 });
        callback(Progress::TaskIncrement);
        {
            let state = handler.state.lock().unwrap();
            assert_eq!(state.pb.length(), Some(40));
            assert_eq!(state.pb.position(), 1);
        }

        callback(Progress::TaskFinish);
        {
            let state = handler.state.lock().unwrap();
            assert!(state.pb.is_finished());
            assert_eq!(state.pb.position(), 40);
        }

        callback(Progress::PhaseFinish);
        assert_eq!(
            handler.state.lock().unwrap().pb.message(),
            "✓ Building Constraint Model"
        );
    }

    #[test]
    fn search_tracks_best_count_and_improvements() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Searching" });
        assert_eq!(
            handler.state.lock().unwrap().pb.message(),
            "Searching · no selection yet"
        );

        callback(Progress::Improved { protein_target: 12 });
        callback(Progress::Improved { protein_target: 17 });
        {
            let state = handler.state.lock().unwrap();
            assert_eq!(state.best, Some(17));
            assert_eq!(state.improvements, 2);
            assert_eq!(
                state.pb.message(),
                "Searching · best 17 proteins (2 improvements)"
            );
        }

        callback(Progress::PhaseFinish);
        let state = handler.state.lock().unwrap();
        assert!(state.pb.is_finished());
        assert!(
            state
                .pb
                .message()
                .starts_with("✓ Best: 17 proteins after 2 improvements in ")
        );
    }

    #[test]
    fn new_search_phase_resets_the_tally() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Searching" });
        callback(Progress::Improved { protein_target: 3 });
        callback(Progress::PhaseFinish);
        callback(Progress::PhaseStart { name: "Searching" });
        callback(Progress::PhaseFinish);

        let state = handler.state.lock().unwrap();
        assert_eq!(state.best, None);
        assert_eq!(state.improvements, 0);
        assert_eq!(
            state.pb.message(),
            "✓ Search ended without a feasible selection"
        );
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Searching" });
            callback(Progress::Improved { protein_target: 1 });
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        let state = handler.state.lock().unwrap();
        assert!(state.pb.is_finished());
        assert_eq!(state.best, Some(1));
    }
}
