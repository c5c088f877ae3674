use crate::commands::Command;
use crate::events::AppEvent;
use async_channel::Sender;
use directories::ProjectDirs;
use mkctl::wm::ShellCommand;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumIter, EnumString};
use thiserror::Error;

/// Which slot table applies, chosen by what was under the pointer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    SerializeDisplay,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum ContextKind {
    Background,
    Text,
    Image,
    Link,
    Submit,
    Edit,
}

impl ContextKind {
    /// Text selection wins over everything else. Links and images are not
    /// detected yet, so anything without a selection is background.
    pub fn resolve(has_selection: bool) -> Self {
        if has_selection { Self::Text } else { Self::Background }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    SerializeDisplay,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
pub enum ModifierKey {
    #[default]
    #[strum(to_string = "none")]
    None,
    #[strum(to_string = "ctrl", serialize = "control")]
    Ctrl,
    #[strum(to_string = "alt")]
    Alt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
}

impl ModifierKey {
    pub fn is_held(&self, modifiers: Modifiers) -> bool {
        match self {
            Self::None => true,
            Self::Ctrl => modifiers.ctrl,
            Self::Alt => modifiers.alt,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    SerializeDisplay,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
pub enum MouseButton {
    #[strum(to_string = "left", serialize = "0")]
    Left,
    #[strum(to_string = "middle", serialize = "1")]
    Middle,
    #[default]
    #[strum(to_string = "right", serialize = "2")]
    Right,
}

/// One slot of a binding table. An empty string leaves the slot unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, SerializeDisplay, DeserializeFromStr)]
pub struct Binding(pub Option<Command>);

impl FromStr for Binding {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("null") {
            return Ok(Self(None));
        }
        Ok(Self(Some(Command::from_id(s).unwrap_or_else(|| {
            log::warn!("Unknown command '{}', slot will do nothing", s);
            Command::Noop
        }))))
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(cmd) => write!(f, "{}", cmd),
            None => Ok(()),
        }
    }
}

pub type SlotTable = [Binding; 8];

fn table(ids: [&str; 8]) -> SlotTable {
    ids.map(|id| id.parse().unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Bindings {
    pub background: SlotTable,
    pub text: SlotTable,
    pub image: SlotTable,
    pub link: SlotTable,
    pub submit: SlotTable,
    pub edit: SlotTable,
}

impl Bindings {
    pub fn table(&self, context: ContextKind) -> &SlotTable {
        match context {
            ContextKind::Background => &self.background,
            ContextKind::Text => &self.text,
            ContextKind::Image => &self.image,
            ContextKind::Link => &self.link,
            ContextKind::Submit => &self.submit,
            ContextKind::Edit => &self.edit,
        }
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            background: table([
                "prev-tab", "top", "next-tab", "forward", "new-tab", "bottom", "home", "back",
            ]),
            text: table([
                "search-0", "search-1", "search-2", "search-3", "search-4", "search-5",
                "search-6", "search-7",
            ]),
            image: table([
                "copy-alt",
                "copy-img",
                "view-img",
                "view-img",
                "save-img",
                "copy-img-loc",
                "view-img-info",
                "send-img",
            ]),
            link: table([
                "bookmark",
                "copy-link-text",
                "open-new-tab",
                "open-new-win",
                "save-link",
                "copy-link",
                "send-link",
                "select-link",
            ]),
            submit: table([
                "",
                "",
                "submit-new-tab",
                "submit-new-win",
                "",
                "copy-submit-loc",
                "",
                "",
            ]),
            edit: table(["", "", "", "", "add-search", "", "", ""]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SearchEngine {
    pub name: String,
    /// `%s` is replaced with the selected text.
    pub url: String,
}

impl SearchEngine {
    fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

fn default_search_engines() -> Vec<SearchEngine> {
    vec![
        SearchEngine::new("Amazon", "https://www.amazon.com/s/?field-keywords=%s"),
        SearchEngine::new("Google", "https://www.google.com/search?q=%s"),
        SearchEngine::new("Google Images", "https://www.google.com/search?tbm=isch&q=%s"),
        SearchEngine::new("Google Maps", "https://maps.google.com/maps?q=%s"),
        SearchEngine::new("Google Translate", "https://translate.google.com/?sl=auto&tl=en&text=%s"),
        SearchEngine::new("IMDb", "https://www.imdb.com/find?q=%s"),
        SearchEngine::new(
            "Wikipedia",
            "https://en.wikipedia.org/w/index.php?title=Special%3ASearch&search=%s",
        ),
        SearchEngine::new("YouTube", "https://www.youtube.com/results?search_query=%s"),
    ]
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FontConfig {
    /// Point size.
    pub size: f64,
    /// CSS-style family list; the first entry is used.
    pub family: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            size: 9.0,
            family: "Arial, Helvetica, sans-serif".to_string(),
        }
    }
}

impl FontConfig {
    pub fn primary_family(&self) -> &str {
        self.family
            .split(',')
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
            .find(|f| !f.is_empty())
            .unwrap_or("sans-serif")
    }

    pub fn size_px(&self) -> f64 {
        self.size * 96.0 / 72.0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BorderConfig {
    pub width: f64,
    /// Top, right, bottom, left.
    pub colors: [String; 4],
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            width: 1.0,
            colors: ["#666", "#666", "#666", "#666"].map(String::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RayConfig {
    pub color: String,
    pub width: f64,
    pub opacity: f64,
    pub border_color: String,
    pub border_width: f64,
    pub border_opacity: f64,
}

impl Default for RayConfig {
    fn default() -> Self {
        Self {
            color: "#000".to_string(),
            width: 2.0,
            opacity: 1.0,
            border_color: "#f6f6f6".to_string(),
            border_width: 3.0,
            border_opacity: 1.0,
        }
    }
}

/// Shell templates the background host runs for each request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostActions {
    pub scroll_top: ShellCommand,
    pub scroll_bottom: ShellCommand,
    pub back: ShellCommand,
    pub forward: ShellCommand,
    pub home: ShellCommand,
    pub new_tab: ShellCommand,
    pub next_tab: ShellCommand,
    pub prev_tab: ShellCommand,
    pub new_window: ShellCommand,
    /// `%s` is replaced with the quoted url.
    pub open_url: ShellCommand,
}

fn shortcut(keys: &str) -> ShellCommand {
    ShellCommand::new(format!("hyprctl dispatch sendshortcut {}, activewindow", keys))
}

impl Default for HostActions {
    fn default() -> Self {
        Self {
            scroll_top: shortcut("CTRL, Home"),
            scroll_bottom: shortcut("CTRL, End"),
            back: shortcut("ALT, Left"),
            forward: shortcut("ALT, Right"),
            home: shortcut("ALT, Home"),
            new_tab: shortcut("CTRL, T"),
            next_tab: shortcut("CTRL, Tab"),
            prev_tab: shortcut("CTRL SHIFT, Tab"),
            new_window: shortcut("CTRL, N"),
            open_url: ShellCommand::from("xdg-open %s"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub font: FontConfig,
    pub background: [String; 2],
    pub foreground: [String; 2],
    pub active_background: String,
    pub active_foreground: String,
    pub border: BorderConfig,
    /// Empty for no shadow.
    pub shadow: String,
    pub opacity: f64,
    pub item_spacing: f64,
    /// Vertical, horizontal.
    pub item_padding: [f64; 2],
    pub ray: RayConfig,
    pub animation: bool,
    pub popup_delay_ms: u64,
    pub hide_delay_ms: u64,
    pub modifier: ModifierKey,
    pub mouse_button: MouseButton,
    pub bindings: Bindings,
    pub search_engines: Vec<SearchEngine>,
    pub actions: HostActions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font: FontConfig::default(),
            background: ["#f7f7f7", "#c6c6c6"].map(String::from),
            foreground: ["#000", "#000"].map(String::from),
            active_background: "#b8bfd3".to_string(),
            active_foreground: "#000".to_string(),
            border: BorderConfig::default(),
            shadow: "rgba(0,0,0,0.7)".to_string(),
            opacity: 1.0,
            item_spacing: 2.0,
            item_padding: [4.0, 30.0],
            ray: RayConfig::default(),
            animation: true,
            popup_delay_ms: 200,
            hide_delay_ms: 200,
            modifier: ModifierKey::None,
            mouse_button: MouseButton::Right,
            bindings: Bindings::default(),
            search_engines: default_search_engines(),
            actions: HostActions::default(),
        }
    }
}

impl Config {
    pub fn popup_delay(&self) -> Duration {
        Duration::from_millis(self.popup_delay_ms)
    }

    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    pub fn search_engine(&self, index: usize) -> Option<&SearchEngine> {
        self.search_engines.get(index)
    }
}

/// The current configuration, readable from the background runtime. A reload
/// swaps in a new value; nothing mutates a loaded `Config` in place.
pub type SharedConfig = Arc<RwLock<Arc<Config>>>;

pub fn share(config: Arc<Config>) -> SharedConfig {
    Arc::new(RwLock::new(config))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Preference store: the synced file in the config directory, with a
/// machine-local file in the data directory as fallback.
#[derive(Debug, Clone)]
pub struct Preferences {
    synced: PathBuf,
    local: PathBuf,
}

impl Preferences {
    pub fn new(synced: PathBuf, local: PathBuf) -> Self {
        Self { synced, local }
    }

    pub fn locate() -> Result<Self, ConfigError> {
        let dirs =
            ProjectDirs::from("org", "mkmenu", "mkmenu").ok_or(ConfigError::ConfigDirNotFound)?;
        Ok(Self::new(
            dirs.config_dir().join("config.toml"),
            dirs.data_local_dir().join("config.toml"),
        ))
    }

    pub fn synced_path(&self) -> &Path {
        &self.synced
    }

    pub fn get(&self) -> Result<Config, ConfigError> {
        if self.synced.exists() {
            return read_config(&self.synced);
        }
        if self.local.exists() {
            let config = read_config(&self.local)?;
            self.save(&config)?;
            log::info!(
                "Migrated preferences from {} to {}",
                self.local.display(),
                self.synced.display()
            );
            return Ok(config);
        }
        Ok(Config::default())
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.synced.parent() {
            fs_err::create_dir_all(parent)?;
        }
        fs_err::write(&self.synced, toml::to_string_pretty(config)?)?;
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path.to_path_buf()).required(true))
        .add_source(config::Environment::with_prefix("MKMENU"))
        .build()?;

    Ok(s.try_deserialize()?)
}

/// Loads the preferences, seeding the synced file with defaults on first
/// start. Never fails: a broken file falls back to the defaults.
pub fn load_or_default() -> Config {
    let prefs = match Preferences::locate() {
        Ok(p) => p,
        Err(e) => {
            log::error!("{}", e);
            return Config::default();
        }
    };

    match prefs.get() {
        Ok(config) => {
            if !prefs.synced_path().exists()
                && let Err(e) = prefs.save(&config)
            {
                log::warn!("Failed to write default config: {}", e);
            }
            config
        }
        Err(e) => {
            log::error!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    }
}

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match Preferences::locate() {
        Ok(p) => p.synced_path().to_path_buf(),
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let config_dir = match config_path.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let touches_config = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) && event.paths.iter().any(|p| p == &config_path);

                if touches_config && tx.send(AppEvent::ConfigReload).await.is_err() {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn prefs_in(dir: &TempDir) -> Preferences {
        Preferences::new(
            dir.path().join("sync").join("config.toml"),
            dir.path().join("local").join("config.toml"),
        )
    }

    #[test]
    fn default_tables_have_eight_slots_each() {
        let b = Bindings::default();
        assert_eq!(b.background[1], Binding(Some(Command::Top)));
        assert_eq!(b.background[4], Binding(Some(Command::NewTab)));
        assert_eq!(b.text[3], Binding(Some(Command::Search(3))));
        assert_eq!(b.submit[0], Binding(None));
        assert_eq!(b.edit[4], Binding(Some(Command::AddSearch)));
    }

    #[test]
    fn binding_parsing() {
        let cases = vec![
            ("\"\"", Binding(None)),
            ("\"null\"", Binding(None)),
            ("\"cmdTop\"", Binding(Some(Command::Top))),
            ("\"new-tab\"", Binding(Some(Command::NewTab))),
            ("\"cmdSearch5\"", Binding(Some(Command::Search(5)))),
            ("\"cmdDoesNotExist\"", Binding(Some(Command::Noop))),
        ];

        for (json, expected) in cases {
            let deserialized: Binding = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected, "{json}");
        }
    }

    #[test]
    fn legacy_button_ids_parse() {
        let right: MouseButton = serde_json::from_str("\"2\"").unwrap();
        let middle: MouseButton = serde_json::from_str("\"Middle\"").unwrap();
        let ctrl: ModifierKey = serde_json::from_str("\"CTRL\"").unwrap();
        assert_eq!(right, MouseButton::Right);
        assert_eq!(middle, MouseButton::Middle);
        assert_eq!(ctrl, ModifierKey::Ctrl);
    }

    #[test]
    fn modifier_requirements() {
        let none = Modifiers::default();
        let ctrl = Modifiers {
            ctrl: true,
            alt: false,
        };
        assert!(ModifierKey::None.is_held(none));
        assert!(ModifierKey::None.is_held(ctrl));
        assert!(ModifierKey::Ctrl.is_held(ctrl));
        assert!(!ModifierKey::Alt.is_held(ctrl));
    }

    #[test]
    fn context_resolution_prefers_selection() {
        assert_eq!(ContextKind::resolve(true), ContextKind::Text);
        assert_eq!(ContextKind::resolve(false), ContextKind::Background);
    }

    #[test]
    fn font_family_takes_first_entry() {
        let font = FontConfig {
            size: 12.0,
            family: "'DejaVu Sans', sans-serif".to_string(),
        };
        assert_eq!(font.primary_family(), "DejaVu Sans");
        assert_eq!(font.size_px(), 16.0);
    }

    #[test]
    fn missing_store_yields_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(prefs_in(&dir).get().unwrap(), Config::default());
    }

    #[test]
    fn saved_config_reads_back() {
        let dir = TempDir::new().unwrap();
        let prefs = prefs_in(&dir);
        let mut config = Config::default();
        config.popup_delay_ms = 350;
        config.mouse_button = MouseButton::Middle;
        config.bindings.background[0] = Binding(None);
        config.shadow = String::new();

        prefs.save(&config).unwrap();
        let read = prefs.get().unwrap();
        assert!(read.shadow.is_empty());
        assert_eq!(read, config);
    }

    #[test]
    fn local_store_is_migrated() {
        let dir = TempDir::new().unwrap();
        let prefs = prefs_in(&dir);
        let local = dir.path().join("local").join("config.toml");
        fs_err::create_dir_all(local.parent().unwrap()).unwrap();
        fs_err::write(&local, "popup_delay_ms = 500\nmodifier = \"alt\"\n").unwrap();

        let config = prefs.get().unwrap();
        assert_eq!(config.popup_delay_ms, 500);
        assert_eq!(config.modifier, ModifierKey::Alt);
        assert_eq!(config.hide_delay_ms, 200);
        assert!(prefs.synced_path().exists());
    }
}
