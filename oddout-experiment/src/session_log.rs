use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use oddout_core::{ExperimentError, Result, Slot, StimulusResolver, TrialResult};
use tracing::debug;

pub const HEADER: &str = "image1, image2, image3, clicked_image, display_time, click_time";

const SEPARATOR: &str = ", ";

/// Append-only result file for one session.
#[derive(Debug)]
pub struct SessionLog {
    path: PathBuf,
}

/// First of `base.ext`, `base_1.ext`, `base_2.ext`, ... not present in `dir`.
pub fn unique_path(dir: &Path, base_name: &str, extension: &str) -> PathBuf {
    let extension = extension.trim_start_matches('.');
    let mut candidate = dir.join(format!("{}.{}", base_name, extension));
    let mut counter = 1usize;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}.{}", base_name, counter, extension));
        counter += 1;
    }
    candidate
}

impl SessionLog {
    /// Creates a fresh log file in `dir` and writes the header line.
    pub fn open(dir: impl AsRef<Path>, base_name: &str, extension: &str) -> Result<Self> {
        let path = unique_path(dir.as_ref(), base_name, extension);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| ExperimentError::io(&path, e))?;
        write_line(&mut file, HEADER).map_err(|e| ExperimentError::io(&path, e))?;
        debug!(path = %path.display(), "Session log created");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line and syncs it before returning.
    pub fn append(&self, record: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| ExperimentError::io(&self.path, e))?;
        write_line(&mut file, record).map_err(|e| ExperimentError::io(&self.path, e))
    }
}

fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()?;
    file.sync_data()
}

/// `label0, label1, label2, selected, display_ms, response_ms`; no selection leaves the field empty.
///
/// Timings use the shortest form that parses back to the same `f64`.
pub fn format_record<R>(result: &TrialResult, resolver: &R) -> String
where
    R: StimulusResolver + ?Sized,
{
    let [a, b, c] = *result.trial.items();
    let selected = result
        .selected
        .map(|slot| slot.index().to_string())
        .unwrap_or_default();
    format!(
        "{}, {}, {}, {}, {}, {}",
        resolver.label(a),
        resolver.label(b),
        resolver.label(c),
        selected,
        result.display_latency_ms,
        result.response_time_ms
    )
}

/// One parsed result line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub images: [String; 3],
    pub selected: Option<Slot>,
    pub display_time_ms: f64,
    pub click_time_ms: f64,
}

pub fn parse_record(line: &str) -> Result<LogRecord> {
    let malformed = |why: &str| ExperimentError::MalformedRecord(format!("{}: {:?}", why, line));

    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(SEPARATOR).collect();
    let &[a, b, c, selected, display, click] = fields.as_slice() else {
        return Err(malformed("expected 6 fields"));
    };
    if [a, b, c].iter().any(|label| label.is_empty()) {
        return Err(malformed("empty image label"));
    }
    let selected = match selected {
        "" => None,
        s => Some(
            s.parse::<usize>()
                .ok()
                .and_then(Slot::from_index)
                .ok_or_else(|| malformed("clicked_image out of range"))?,
        ),
    };
    let display_time_ms = display
        .parse()
        .map_err(|_| malformed("display_time is not a number"))?;
    let click_time_ms = click
        .parse()
        .map_err(|_| malformed("click_time is not a number"))?;

    Ok(LogRecord {
        images: [a.to_string(), b.to_string(), c.to_string()],
        selected,
        display_time_ms,
        click_time_ms,
    })
}

/// Parses a whole session file, checking the header first.
pub fn read_records(path: &Path) -> Result<Vec<LogRecord>> {
    let contents = fs::read_to_string(path).map_err(|e| ExperimentError::io(path, e))?;
    let mut lines = contents.lines();
    match lines.next() {
        Some(HEADER) => {}
        Some(other) => {
            return Err(ExperimentError::MalformedRecord(format!(
                "unexpected header {:?}",
                other
            )));
        }
        None => {
            return Err(ExperimentError::io(
                path,
                std::io::Error::new(ErrorKind::UnexpectedEof, "empty session log"),
            ));
        }
    }
    lines.filter(|l| !l.is_empty()).map(parse_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oddout_core::{ItemId, StimulusPool, Trial};

    fn result(items: [usize; 3], selected: Option<Slot>, display: f64, rt: f64) -> TrialResult {
        TrialResult {
            trial: Trial::new(items.map(ItemId)).unwrap(),
            selected,
            display_latency_ms: display,
            response_time_ms: rt,
        }
    }

    #[test]
    fn first_log_takes_the_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::open(dir.path(), "log", "csv").unwrap();
        assert_eq!(log.path(), dir.path().join("log.csv"));
        assert_eq!(fs::read_to_string(log.path()).unwrap(), format!("{}\n", HEADER));
    }

    #[test]
    fn collisions_get_an_incrementing_suffix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("log.csv"), "old").unwrap();
        let second = SessionLog::open(dir.path(), "log", ".csv").unwrap();
        assert_eq!(second.path(), dir.path().join("log_1.csv"));

        let third = SessionLog::open(dir.path(), "log", "csv").unwrap();
        assert_eq!(third.path(), dir.path().join("log_2.csv"));
        assert_eq!(fs::read_to_string(dir.path().join("log.csv")).unwrap(), "old");
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionLog::open(dir.path().join("absent"), "log", "csv").unwrap_err();
        assert!(matches!(err, ExperimentError::Io { .. }));
    }

    #[test]
    fn appended_results_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let pool = StimulusPool::new("imgs", "im", "png");
        let log = SessionLog::open(dir.path(), "log", "csv").unwrap();
        let results = [
            result([7, 12, 1853], Some(Slot::Center), 0.0, 812.25),
            result([3, 0, 44], Some(Slot::Left), 1112.000_123_456_7, 95.333_333_333_333_33),
            result([9, 8, 6], None, 2000.0, 0.5),
        ];
        for r in &results {
            log.append(&format_record(r, &pool)).unwrap();
        }

        let text = fs::read_to_string(log.path()).unwrap();
        assert_eq!(text.lines().count(), 1 + results.len());
        assert_eq!(
            text.lines().nth(1).unwrap(),
            "im0007.png, im0012.png, im1853.png, 1, 0, 812.25"
        );
        assert_eq!(
            text.lines().nth(3).unwrap(),
            "im0009.png, im0008.png, im0006.png, , 2000, 0.5"
        );

        let records = read_records(log.path()).unwrap();
        for (record, written) in records.iter().zip(&results) {
            let ids: Vec<_> = record
                .images
                .iter()
                .map(|name| pool.parse_file_name(name).unwrap())
                .collect();
            assert_eq!(ids, written.trial.items().to_vec());
            assert_eq!(record.selected, written.selected);
            assert_eq!(record.display_time_ms, written.display_latency_ms);
            assert_eq!(record.click_time_ms, written.response_time_ms);
        }
    }

    #[test]
    fn malformed_lines_are_rejected() {
        for line in [
            "a, b, c, 1, 2.0",
            "a, b, c, 3, 1.0, 2.0",
            "a, b, c, x, 1.0, 2.0",
            "a, , c, 0, 1.0, 2.0",
            "a, b, c, 0, soon, 2.0",
        ] {
            assert!(
                matches!(parse_record(line), Err(ExperimentError::MalformedRecord(_))),
                "{}",
                line
            );
        }
    }

    #[test]
    fn wrong_header_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "a,b,c\n").unwrap();
        assert!(matches!(
            read_records(&path),
            Err(ExperimentError::MalformedRecord(_))
        ));
    }
}
