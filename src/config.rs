//! Popup settings.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! command line overrides. Everything is resolved once at start-up; the popup
//! never re-reads its settings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gtk4::gdk::RGBA;
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

pub const APP_DIR: &str = "areyouhappy";
const CONFIG_FILE: &str = "config.toml";
const ASSETS_ENV: &str = "AREYOUHAPPY_ASSETS";
/// GLib timeouts take their interval as a `u32` of milliseconds.
const MAX_DELAY_MS: u64 = u32::MAX as u64;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid colour for `{field}`: {value:?}")]
    Colour { field: &'static str, value: String },

    #[error("opacity must be between 0.0 and 1.0, got {0}")]
    Opacity(f64),

    #[error("`{field}` must be at most {max} ms, got {value}")]
    Delay {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("at least one question is required")]
    NoQuestions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Regular toplevel window.
    #[default]
    Window,
    /// Layer-shell overlay anchored to the top-right corner.
    Overlay,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChromeSettings {
    pub window_background: String,
    pub content_background: String,
    pub opacity: f64,
}

impl Default for ChromeSettings {
    fn default() -> Self {
        Self {
            window_background: "rgba(255,255,255,1.0)".to_string(),
            content_background: "rgba(255,255,255,0.0)".to_string(),
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub greeting: String,
    pub questions: Vec<String>,
    /// 0 disables rotation.
    pub rotate_interval_ms: u64,
    /// 0 exits as soon as a button is pressed.
    pub exit_delay_ms: u64,
    /// Base name of the animated asset, without extension.
    pub image: String,
    pub assets_dir: Option<PathBuf>,
    pub stylesheet: Option<PathBuf>,
    pub placement: Placement,
    pub chrome: ChromeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            greeting: "Hi!".to_string(),
            questions: vec!["Are you happy?".to_string()],
            rotate_interval_ms: 0,
            exit_delay_ms: 0,
            image: "heart".to_string(),
            assets_dir: None,
            stylesheet: None,
            placement: Placement::Window,
            chrome: ChromeSettings::default(),
        }
    }
}

/// Command line values that take precedence over the settings file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub exit_delay_ms: Option<u64>,
    pub image: Option<String>,
    pub assets_dir: Option<PathBuf>,
    pub stylesheet: Option<PathBuf>,
    pub overlay: bool,
}

/// Window-level presentation applied when the popup first lands on a window.
#[derive(Debug, Clone)]
pub struct Chrome {
    pub window_background: RGBA,
    pub content_background: RGBA,
    pub opacity: f64,
}

impl Chrome {
    /// Stylesheet fragment carrying the background colours.
    pub fn to_css(&self) -> String {
        format!(
            "window.popup-window.attached {{ background-color: {}; }}\n\
             window.popup-window.attached .popup-content {{ background-color: {}; }}\n",
            self.window_background.to_str(),
            self.content_background.to_str(),
        )
    }
}

impl PartialEq for Chrome {
    fn eq(&self, other: &Self) -> bool {
        fn channels(c: &RGBA) -> [f32; 4] {
            [c.red(), c.green(), c.blue(), c.alpha()]
        }
        channels(&self.window_background) == channels(&other.window_background)
            && channels(&self.content_background) == channels(&other.content_background)
            && self.opacity == other.opacity
    }
}

impl Default for Chrome {
    fn default() -> Self {
        Self {
            window_background: RGBA::new(1.0, 1.0, 1.0, 1.0),
            content_background: RGBA::new(1.0, 1.0, 1.0, 0.0),
            opacity: 1.0,
        }
    }
}

impl Settings {
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` if given, otherwise the per-user settings file when it
    /// exists, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("no settings file, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        info!("loading settings from {:?}", path);
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&content, &path)
    }

    /// Picks up the assets directory from the environment, over the file.
    pub fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(ASSETS_ENV) {
            debug!("assets directory from {}", ASSETS_ENV);
            self.assets_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(delay) = overrides.exit_delay_ms {
            self.exit_delay_ms = delay;
        }
        if let Some(image) = overrides.image {
            self.image = image;
        }
        if overrides.assets_dir.is_some() {
            self.assets_dir = overrides.assets_dir;
        }
        if overrides.stylesheet.is_some() {
            self.stylesheet = overrides.stylesheet;
        }
        if overrides.overlay {
            self.placement = Placement::Overlay;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.questions.is_empty() {
            return Err(ConfigError::NoQuestions);
        }
        check_delay("exit_delay_ms", self.exit_delay_ms)?;
        check_delay("rotate_interval_ms", self.rotate_interval_ms)?;
        self.chrome().map(|_| ())
    }

    pub fn chrome(&self) -> Result<Chrome, ConfigError> {
        let chrome = &self.chrome;
        if !(0.0..=1.0).contains(&chrome.opacity) {
            return Err(ConfigError::Opacity(chrome.opacity));
        }
        Ok(Chrome {
            window_background: parse_colour(
                "chrome.window_background",
                &chrome.window_background,
            )?,
            content_background: parse_colour(
                "chrome.content_background",
                &chrome.content_background,
            )?,
            opacity: chrome.opacity,
        })
    }

    pub fn exit_delay(&self) -> Duration {
        Duration::from_millis(self.exit_delay_ms)
    }

    pub fn rotate_interval(&self) -> Option<Duration> {
        if self.rotate_interval_ms == 0 || self.questions.len() < 2 {
            None
        } else {
            Some(Duration::from_millis(self.rotate_interval_ms))
        }
    }

    /// Directory holding the bundled animations.
    pub fn assets_dir(&self) -> PathBuf {
        if let Some(dir) = &self.assets_dir {
            return dir.clone();
        }
        match dirs::config_dir().map(|dir| dir.join(APP_DIR).join("assets")) {
            Some(dir) if dir.is_dir() => dir,
            _ => PathBuf::from("assets"),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

fn check_delay(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value > MAX_DELAY_MS {
        return Err(ConfigError::Delay {
            field,
            value,
            max: MAX_DELAY_MS,
        });
    }
    Ok(())
}

fn parse_colour(field: &'static str, value: &str) -> Result<RGBA, ConfigError> {
    RGBA::parse(value).map_err(|_| ConfigError::Colour {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Settings, ConfigError> {
        Settings::from_toml(content, Path::new("test.toml"))
    }

    #[test]
    fn defaults_match_solid_popup() {
        let settings = Settings::default();
        assert_eq!(settings.greeting, "Hi!");
        assert_eq!(settings.questions, vec!["Are you happy?".to_string()]);
        assert_eq!(settings.exit_delay(), Duration::ZERO);
        assert_eq!(settings.rotate_interval(), None);

        let chrome = settings.chrome().unwrap();
        assert_eq!(chrome.window_background.alpha(), 1.0);
        assert_eq!(chrome.window_background.red(), 1.0);
        assert_eq!(chrome.content_background.alpha(), 0.0);
        assert_eq!(chrome.opacity, 1.0);
    }

    #[test]
    fn file_values_replace_defaults() {
        let settings = parse(
            r#"
            exit_delay_ms = 1000
            placement = "overlay"

            [chrome]
            window_background = "rgba(102,102,102,0.4)"
            content_background = "rgba(255,255,255,0.95)"
            "#,
        )
        .unwrap();

        assert_eq!(settings.exit_delay(), Duration::from_secs(1));
        assert_eq!(settings.placement, Placement::Overlay);
        assert_eq!(settings.greeting, "Hi!");

        let chrome = settings.chrome().unwrap();
        assert!((chrome.window_background.alpha() - 0.4).abs() < 1e-6);
        assert!((chrome.content_background.alpha() - 0.95).abs() < 1e-6);
        assert_eq!(chrome.opacity, 1.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(parse("colour = 1"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn overrides_win_over_file() {
        let mut settings = parse("exit_delay_ms = 1000\nimage = \"plus\"").unwrap();
        settings.apply(Overrides {
            exit_delay_ms: Some(0),
            overlay: true,
            ..Overrides::default()
        });

        assert_eq!(settings.exit_delay(), Duration::ZERO);
        assert_eq!(settings.image, "plus");
        assert_eq!(settings.placement, Placement::Overlay);
    }

    #[test]
    fn bad_colour_is_reported() {
        let settings = parse("[chrome]\nwindow_background = \"not-a-colour\"").unwrap();
        match settings.validate() {
            Err(ConfigError::Colour { field, value }) => {
                assert_eq!(field, "chrome.window_background");
                assert_eq!(value, "not-a-colour");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn opacity_out_of_range_is_reported() {
        let settings = parse("[chrome]\nopacity = 1.5").unwrap();
        assert!(matches!(settings.validate(), Err(ConfigError::Opacity(o)) if o == 1.5));
    }

    #[test]
    fn empty_question_list_is_reported() {
        let settings = parse("questions = []").unwrap();
        assert!(matches!(settings.validate(), Err(ConfigError::NoQuestions)));
    }

    #[test]
    fn delays_beyond_timer_range_are_rejected() {
        let settings = parse("exit_delay_ms = 4294967296").unwrap();
        match settings.validate() {
            Err(ConfigError::Delay { field, value, max }) => {
                assert_eq!(field, "exit_delay_ms");
                assert_eq!(value, 1 << 32);
                assert_eq!(max, u32::MAX as u64);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let settings = parse("rotate_interval_ms = 4294968296").unwrap();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Delay {
                field: "rotate_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn longest_timer_delay_is_accepted() {
        let mut settings = Settings::default();
        settings.exit_delay_ms = u32::MAX as u64;
        settings.rotate_interval_ms = u32::MAX as u64;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn oversized_cli_delay_is_rejected() {
        let mut settings = Settings::default();
        settings.apply(Overrides {
            exit_delay_ms: Some(u32::MAX as u64 + 1),
            ..Overrides::default()
        });
        assert!(matches!(settings.validate(), Err(ConfigError::Delay { .. })));
    }

    #[test]
    fn rotation_needs_several_questions() {
        let mut settings = parse("rotate_interval_ms = 2500").unwrap();
        assert_eq!(settings.rotate_interval(), None);

        settings.questions.push("Did you drink water?".to_string());
        assert_eq!(settings.rotate_interval(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn explicit_assets_dir_is_used() {
        let mut settings = Settings::default();
        settings.assets_dir = Some(PathBuf::from("/opt/popup/assets"));
        assert_eq!(settings.assets_dir(), PathBuf::from("/opt/popup/assets"));
    }

    #[test]
    fn chrome_css_targets_attached_window() {
        let css = Chrome::default().to_css();
        assert!(css.contains("window.popup-window.attached"));
        assert!(css.contains(".popup-content"));
    }
}
