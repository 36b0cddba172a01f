pub mod config;
pub mod presenter;
pub mod runner;
pub mod sampler;
pub mod session_log;
#[cfg(test)]
pub(crate) mod testing;

pub use config::{ExperimentConfig, load_or_init};
pub use presenter::{PresenterSettings, TrialPresenter};
pub use runner::{ExperimentRunner, SessionSettings, SessionSummary};
pub use sampler::{generate_trials, sample_choices};
pub use session_log::{HEADER, LogRecord, SessionLog, format_record, parse_record, read_records};
