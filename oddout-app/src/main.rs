mod backend;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use oddout_core::ExperimentError;
use oddout_experiment::{
    ExperimentRunner, PresenterSettings, SessionSettings, TrialPresenter, generate_trials,
    load_or_init,
};
use oddout_render::load_font;
use oddout_timing::HighPrecisionTimer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::backend::WindowBackend;

const DEFAULT_CONFIG: &str = "oddout.json";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, PartialEq)]
struct Args {
    config: PathBuf,
}

/// `oddout-app [--config PATH | PATH]`; `None` when help was requested.
fn parse_args<I>(args: I) -> Result<Option<Args>>
where
    I: IntoIterator<Item = String>,
{
    let mut config: Option<PathBuf> = None;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--help" || arg == "-h" {
            return Ok(None);
        } else if arg == "--config" || arg == "-c" {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("expected value after {}", arg))?;
            config = Some(value.into());
        } else if let Some(value) = arg.strip_prefix("--config=") {
            config = Some(value.into());
        } else if !arg.starts_with('-') && config.is_none() {
            config = Some(arg.into());
        } else {
            return Err(anyhow!("unexpected argument: {}", arg));
        }
    }
    Ok(Some(Args {
        config: config.unwrap_or_else(|| DEFAULT_CONFIG.into()),
    }))
}

fn find_font(configured: Option<&Path>) -> Option<PathBuf> {
    configured.map(Path::to_path_buf).or_else(|| {
        SYSTEM_FONTS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("oddout=info")),
        )
        .init();

    let Some(args) = parse_args(std::env::args().skip(1))? else {
        println!("usage: oddout-app [--config PATH]   (default {})", DEFAULT_CONFIG);
        return Ok(());
    };

    info!(platform = std::env::consts::OS, arch = std::env::consts::ARCH, "=== ODD ONE OUT ===");

    let config = load_or_init(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    config.validate()?;

    for dir in [&config.log_dir, &config.image_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }

    let mut rng = config.rng();
    let trials = generate_trials(
        &mut rng,
        config.pool_size,
        config.trial_count,
        config.choice_count,
    )?;

    let pool = config.stimulus_pool();
    info!(dir = %pool.dir().display(), "Stimulus pool");
    if let Some((item, path)) = pool.first_missing(trials.iter().flat_map(|t| t.items())) {
        return Err(ExperimentError::MissingAsset {
            item,
            path,
            reason: "file not found".into(),
        }
        .into());
    }

    let font = match find_font(config.font_path.as_deref()) {
        Some(path) => Some(load_font(&path)?),
        None => {
            warn!("No font found; set font_path to draw the question");
            None
        }
    };

    let backend = WindowBackend::open(&config, font)?;
    let presenter = TrialPresenter::new(
        backend,
        pool,
        HighPrecisionTimer::new(),
        PresenterSettings::from(&config),
    );
    let runner = ExperimentRunner::new(presenter, SessionSettings::from(&config));
    let summary = runner.run(&trials)?;

    info!(
        summary = %serde_json::to_string(&summary)?,
        "Results saved to {}. Thank you!",
        summary.log_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Option<Args>> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_to_local_config() {
        assert_eq!(
            args(&[]).unwrap(),
            Some(Args {
                config: DEFAULT_CONFIG.into()
            })
        );
    }

    #[test]
    fn accepts_config_in_every_form() {
        for form in [
            vec!["--config", "a.json"],
            vec!["-c", "a.json"],
            vec!["--config=a.json"],
            vec!["a.json"],
        ] {
            let parsed = args(&form).unwrap().unwrap();
            assert_eq!(parsed.config, PathBuf::from("a.json"), "{:?}", form);
        }
    }

    #[test]
    fn help_and_errors() {
        assert_eq!(args(&["--help"]).unwrap(), None);
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).is_err());
        assert!(args(&["a.json", "b.json"]).is_err());
    }

    #[test]
    fn configured_font_wins() {
        let configured = Path::new("fonts/custom.ttf");
        assert_eq!(find_font(Some(configured)), Some(configured.to_path_buf()));
    }
}
