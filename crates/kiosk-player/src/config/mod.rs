use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::media::SlotId;

fn default_true() -> bool {
    true
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("/home/tech")
}

fn default_lines() -> Vec<u32> {
    vec![17, 27, 22]
}

fn default_debounce_secs() -> f64 {
    2.0
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_gpio_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub base_dir: PathBuf,
    /// Defaults to `<base_dir>/uploads`.
    pub uploads_dir: Option<PathBuf>,
    /// Defaults to `<base_dir>/default_image.png`.
    pub image: Option<PathBuf>,
    /// Videos by slot: entry N is slot N+1. Defaults to
    /// `<base_dir>/default_video{1..3}.mp4`.
    pub videos: Vec<PathBuf>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            uploads_dir: None,
            image: None,
            videos: Vec::new(),
        }
    }
}

impl MediaConfig {
    pub fn uploads_path(&self) -> PathBuf {
        self.uploads_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("uploads"))
    }

    pub fn image_path(&self) -> PathBuf {
        self.image
            .clone()
            .unwrap_or_else(|| self.base_dir.join("default_image.png"))
    }

    pub fn slot_paths(&self) -> BTreeMap<SlotId, PathBuf> {
        if self.videos.is_empty() {
            return (1..=3)
                .map(|i| {
                    (
                        i as SlotId,
                        self.base_dir.join(format!("default_video{i}.mp4")),
                    )
                })
                .collect();
        }
        self.videos
            .iter()
            .enumerate()
            .map(|(i, p)| ((i + 1) as SlotId, p.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Input lines in slot order: the first line triggers slot 1.
    pub lines: Vec<u32>,
    pub debounce_secs: f64,
    pub poll_interval_ms: u64,
    /// Buttons wired with pull-ups read low when pressed.
    pub active_low: bool,
    pub gpio_root: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            lines: default_lines(),
            debounce_secs: default_debounce_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            active_low: true,
            gpio_root: default_gpio_root(),
        }
    }
}

impl InputConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_secs_f64(self.debounce_secs.max(0.0))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Also sweep same-named processes we did not spawn; a previous crash
    /// may have leaked one that still owns the display.
    #[serde(default = "default_true")]
    pub kill_strays: bool,
}

impl RendererConfig {
    pub fn default_viewer() -> Self {
        Self {
            program: "fbi".into(),
            args: vec!["--noverbose".into(), "-T".into(), "1".into(), "-a".into()],
            env: BTreeMap::new(),
            kill_strays: true,
        }
    }

    pub fn default_player() -> Self {
        let mut env = BTreeMap::new();
        env.insert("SDL_VIDEODRIVER".into(), "drm".into());
        env.insert("DISPLAY".into(), String::new());
        Self {
            program: "mpv".into(),
            args: [
                "--vo=gpu",
                "--gpu-context=drm",
                "--gpu-api=opengl",
                "--drm-connector=HDMI-A-1",
                "--fullscreen",
                "--no-osc",
                "--loop=no",
                "--no-osd-bar",
                "--no-terminal",
                "--really-quiet",
                "--msg-level=all=no",
                "--audio-device=alsa/hdmi:CARD=vc4hdmi0,DEV=0",
                "--volume=100",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            env,
            kill_strays: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub media: MediaConfig,
    pub input: InputConfig,
    #[serde(default = "RendererConfig::default_viewer")]
    pub viewer: RendererConfig,
    #[serde(default = "RendererConfig::default_player")]
    pub player: RendererConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media: MediaConfig::default(),
            input: InputConfig::default(),
            viewer: RendererConfig::default_viewer(),
            player: RendererConfig::default_player(),
        }
    }
}

pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using built-in defaults");
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| Error::config(format!("invalid config {}: {e}", path.display())))?;
    validate(&cfg)?;
    Ok(cfg)
}

// Slot ids are position-based and fit a u8; more entries than that would
// wrap the mapping instead of failing.
fn validate(cfg: &Config) -> Result<()> {
    let max = usize::from(SlotId::MAX);
    if cfg.media.videos.len() > max {
        return Err(Error::config(format!(
            "too many videos: {} configured, at most {max} slots",
            cfg.media.videos.len()
        )));
    }
    if cfg.input.lines.len() > max {
        return Err(Error::config(format!(
            "too many input lines: {} configured, at most {max} slots",
            cfg.input.lines.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.input.lines, vec![17, 27, 22]);
        assert_eq!(cfg.input.debounce_secs, 2.0);
        assert_eq!(cfg.input.poll_interval_ms, 50);
        assert!(cfg.input.active_low);
        assert_eq!(cfg.viewer.program, "fbi");
        assert_eq!(cfg.player.program, "mpv");
        assert!(cfg.player.kill_strays);
        assert_eq!(
            cfg.media.image_path(),
            PathBuf::from("/home/tech/default_image.png")
        );
        let slots = cfg.media.slot_paths();
        assert_eq!(slots.len(), 3);
        assert_eq!(
            slots.get(&2),
            Some(&PathBuf::from("/home/tech/default_video2.mp4"))
        );
    }

    #[test]
    fn overrides_are_honoured() {
        let cfg: Config = toml::from_str(
            r#"
[media]
base_dir = "/srv/kiosk"
videos = ["/srv/kiosk/a.mp4", "/srv/kiosk/b.mp4"]

[input]
lines = [5, 6]
debounce_secs = 0.5
poll_interval_ms = 10

[player]
program = "mpv"
args = ["--fullscreen"]
kill_strays = false
"#,
        )
        .unwrap();

        assert_eq!(cfg.media.uploads_path(), PathBuf::from("/srv/kiosk/uploads"));
        let slots = cfg.media.slot_paths();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.get(&1), Some(&PathBuf::from("/srv/kiosk/a.mp4")));
        assert_eq!(cfg.input.debounce_window(), Duration::from_millis(500));
        assert_eq!(cfg.input.poll_interval(), Duration::from_millis(10));
        assert_eq!(cfg.player.args, vec!["--fullscreen"]);
        assert!(!cfg.player.kill_strays);
        // Untouched sections keep their defaults.
        assert_eq!(cfg.viewer.program, "fbi");
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let cfg = load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(cfg.viewer.program, "fbi");
    }

    #[test]
    fn more_entries_than_slot_ids_fail_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiosk.toml");

        let videos: Vec<String> = (0..256).map(|i| format!("\"/v/{i}.mp4\"")).collect();
        fs::write(&path, format!("[media]\nvideos = [{}]\n", videos.join(", "))).unwrap();
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("too many videos"));

        let lines: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        fs::write(&path, format!("[input]\nlines = [{}]\n", lines.join(", "))).unwrap();
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("too many input lines"));

        // 255 entries is the last valid count.
        let videos: Vec<String> = (0..255).map(|i| format!("\"/v/{i}.mp4\"")).collect();
        fs::write(&path, format!("[media]\nvideos = [{}]\n", videos.join(", "))).unwrap();
        let cfg = load(&path).unwrap();
        assert_eq!(cfg.media.slot_paths().len(), 255);
    }
}
