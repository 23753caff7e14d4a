use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{ensure, Context, Result};
use maze_chase_core::Tuning;
use maze_chase_system_commentary::DEFAULT_TIMEOUT;
use maze_chase_world::grid::Layout;
use serde::Deserialize;

/// Fully resolved settings for a run.
#[derive(Clone, Debug)]
pub(crate) struct Settings {
    /// Tuned simulation constants.
    pub(crate) tuning: Tuning,
    /// Maze to play on.
    pub(crate) layout: Layout,
    /// Upper bound on a commentary fetch.
    pub(crate) commentary_timeout: Duration,
    /// Artificial delay of the offline commentator.
    pub(crate) commentary_latency: Duration,
}

impl Settings {
    /// Resolves settings from an optional config file and command-line overrides.
    pub(crate) fn load(
        config_path: Option<&Path>,
        layout_override: Option<&Path>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let (file, base) = match config_path {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config at {}", path.display()))?;
                let file = parse_config(&contents)
                    .with_context(|| format!("invalid config at {}", path.display()))?;
                let base = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                (file, base)
            }
            None => (ConfigFile::default(), PathBuf::from(".")),
        };

        let layout_path = match layout_override {
            Some(path) => Some(path.to_path_buf()),
            None => file.layout.as_ref().map(|relative| base.join(relative)),
        };
        let layout = match layout_path {
            Some(path) => load_layout(&path)?,
            None => Layout::standard(),
        };

        let mut tuning = file.tuning;
        if let Some(seed) = seed {
            tuning.seed = seed;
        }
        validate_tuning(&tuning)?;

        Ok(Self {
            tuning,
            layout,
            commentary_timeout: Duration::from_millis(file.commentary.timeout_ms),
            commentary_latency: Duration::from_millis(file.commentary.latency_ms),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    layout: Option<PathBuf>,
    tuning: Tuning,
    commentary: CommentarySection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CommentarySection {
    timeout_ms: u64,
    latency_ms: u64,
}

impl Default for CommentarySection {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            latency_ms: 0,
        }
    }
}

fn parse_config(contents: &str) -> Result<ConfigFile> {
    toml::from_str(contents).context("failed to parse config toml contents")
}

/// Rejects tunings the motion model cannot honour: every speed must stay
/// below half a tile per tick.
fn validate_tuning(tuning: &Tuning) -> Result<()> {
    ensure!(
        tuning.tile_length.is_finite() && tuning.tile_length > 0.0,
        "tile_length must be positive, got {}",
        tuning.tile_length
    );
    let limit = tuning.tile_length / 2.0;
    for (name, speed) in [
        ("player_speed", tuning.player_speed),
        ("adversary_speed", tuning.adversary_speed),
        ("scared_speed", tuning.scared_speed),
    ] {
        ensure!(
            speed > 0.0 && speed < limit,
            "{name} must be positive and below half a tile ({limit}), got {speed}"
        );
    }
    ensure!(
        tuning.snap_threshold >= 0.0 && tuning.snap_threshold < limit,
        "snap_threshold must lie in [0, {limit}), got {}",
        tuning.snap_threshold
    );
    Ok(())
}

fn load_layout(path: &Path) -> Result<Layout> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read layout at {}", path.display()))?;
    Layout::parse(&text).with_context(|| format!("invalid layout at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_core::CellCoord;

    #[test]
    fn empty_config_uses_defaults() {
        let file = parse_config("").expect("empty config parses");
        assert_eq!(file.tuning, Tuning::default());
        assert_eq!(file.commentary.timeout_ms, 5_000);
        assert!(file.layout.is_none());
    }

    #[test]
    fn partial_tables_override_individual_values() {
        let file = parse_config(
            "[tuning]\nstarting_lives = 5\n\n[commentary]\nlatency_ms = 250\n",
        )
        .expect("config parses");
        assert_eq!(file.tuning.starting_lives, 5);
        assert_eq!(file.tuning.breach_threshold, 20);
        assert_eq!(file.commentary.latency_ms, 250);
        assert_eq!(file.commentary.timeout_ms, 5_000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("speed = 3\n").is_err());
    }

    #[test]
    fn layout_path_resolves_relative_to_config() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("tiny.txt"), "#####\n#P.G#\n#####\n").expect("write layout");
        let config = dir.path().join("maze.toml");
        fs::write(&config, "layout = \"tiny.txt\"\n[tuning]\nseed = 3\n").expect("write config");

        let settings = Settings::load(Some(&config), None, Some(11)).expect("settings load");

        assert_eq!(settings.layout.columns(), 5);
        assert_eq!(settings.layout.player_spawn(), CellCoord::new(1, 1));
        assert_eq!(settings.tuning.seed, 11);
    }

    #[test]
    fn malformed_layout_reports_its_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let layout = dir.path().join("broken.txt");
        fs::write(&layout, "####\n#..#\n####\n").expect("write layout");

        let error = Settings::load(None, Some(&layout), None).expect_err("layout is invalid");

        assert!(format!("{error:#}").contains("broken.txt"));
        assert!(format!("{error:#}").contains("player spawn"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.toml");
        assert!(Settings::load(Some(&missing), None, None).is_err());
    }

    #[test]
    fn default_tuning_is_accepted() {
        assert!(validate_tuning(&Tuning::default()).is_ok());
    }

    #[test]
    fn speeds_of_half_a_tile_or_more_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = dir.path().join("fast.toml");
        fs::write(&config, "[tuning]\nplayer_speed = 25.0\n").expect("write config");

        let error = Settings::load(Some(&config), None, None).expect_err("speed is too high");
        assert!(format!("{error:#}").contains("player_speed"));

        let edge = Tuning {
            scared_speed: 10.0,
            ..Tuning::default()
        };
        assert!(validate_tuning(&edge).is_err());
    }

    #[test]
    fn non_positive_tile_length_is_rejected() {
        let flat = Tuning {
            tile_length: 0.0,
            ..Tuning::default()
        };
        assert!(format!("{:#}", validate_tuning(&flat).expect_err("zero tile"))
            .contains("tile_length"));

        let stalled = Tuning {
            adversary_speed: 0.0,
            ..Tuning::default()
        };
        assert!(validate_tuning(&stalled).is_err());
    }
}
