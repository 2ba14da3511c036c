// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stilwerk — restyle a PDF over a blurred, film-grain cover photo.
//
// Entry point. Initialises logging, loads the optional configuration file and
// restyles `input.pdf` over `background.jpg` into `restyled.pdf`, all in the
// working directory.

use std::path::Path;
use std::process::ExitCode;

use stilwerk_core::RestyleConfig;
use stilwerk_document::Restyler;

const INPUT_PDF: &str = "input.pdf";
const COVER_IMAGE: &str = "background.jpg";
const OUTPUT_PDF: &str = "restyled.pdf";
const CONFIG_FILE: &str = "stilwerk.json";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Stilwerk starting");

    let config = load_config(Path::new(CONFIG_FILE));
    let restyler = match Restyler::new(config) {
        Ok(restyler) => restyler,
        Err(e) => {
            tracing::error!(error = %e, "configuration rejected");
            return ExitCode::FAILURE;
        }
    };

    match restyler.restyle_file(INPUT_PDF, COVER_IMAGE, OUTPUT_PDF) {
        Ok(summary) => {
            for report in summary.reports.iter().filter(|r| r.skipped() > 0) {
                tracing::warn!(
                    page = report.number,
                    skipped = report.skipped(),
                    "elements dropped while restyling"
                );
            }
            tracing::info!(pages = summary.pages, output = OUTPUT_PDF, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "restyling failed");
            ExitCode::FAILURE
        }
    }
}

/// Read the configuration file if present, falling back to defaults.
fn load_config(path: &Path) -> RestyleConfig {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no configuration file, using defaults");
        return RestyleConfig::default();
    }
    match RestyleConfig::load(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "configuration loaded");
            config
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid configuration, using defaults");
            RestyleConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_config(&dir.path().join(CONFIG_FILE)),
            RestyleConfig::default()
        );
    }

    #[test]
    fn config_file_overrides_and_invalid_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        std::fs::write(&path, r#"{ "blur_radius": 4.0, "seed": 9 }"#).unwrap();
        let config = load_config(&path);
        assert_eq!(config.blur_radius, 4.0);
        assert_eq!(config.seed, Some(9));

        std::fs::write(&path, r#"{ "grain_strength": 3.0 }"#).unwrap();
        assert_eq!(load_config(&path), RestyleConfig::default());

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(load_config(&path), RestyleConfig::default());
    }
}
