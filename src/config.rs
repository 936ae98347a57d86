use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::game::session::{EndCondition, PlayMode, SessionConfig};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub library: LibrarySource,
    pub catalog: CatalogConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub game: GameDefaults,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Config> {
        let cfg: Config = toml::from_str(contents).with_context(|| "Failed to parse config TOML")?;
        cfg.game
            .resolve(None, None)
            .validate()
            .with_context(|| "Invalid [game] defaults")?;
        Ok(cfg)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LibrarySource {
    pub roots: Vec<PathBuf>,
    pub follow_symlinks: bool,
    #[serde(default)]
    pub ignored_dirs: Vec<PathBuf>,
}

/// Where the answer key lives and how it is built.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub shuffle: bool,
    /// Ask Wikipedia for the release year of files without a year tag.
    #[serde(default)]
    pub wiki_lookup: bool,
}

/// Session settings used when a start request does not choose its own.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct GameDefaults {
    pub mode: PlayMode,
    pub end_condition: Option<EndCondition>,
}

impl Default for GameDefaults {
    fn default() -> Self {
        Self {
            mode: PlayMode::FreePlay,
            end_condition: None,
        }
    }
}

impl GameDefaults {
    /// Fills whatever the caller left open. A timed round without an
    /// explicit condition runs against the clock, free play until the
    /// catalog runs out.
    pub fn resolve(
        &self,
        mode: Option<PlayMode>,
        end_condition: Option<EndCondition>,
    ) -> SessionConfig {
        let mode = mode.unwrap_or(self.mode);
        let end_condition = end_condition
            .or(self.end_condition.filter(|_| mode == self.mode))
            .unwrap_or(match mode {
                PlayMode::FreePlay => EndCondition::CatalogExhausted,
                PlayMode::TimedRound => EndCondition::TimeLimit,
            });
        SessionConfig {
            mode,
            end_condition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_config_toml() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[library]
roots = ["/home/party/Music"]
follow_symlinks = true
ignored_dirs = ['C:\Users\party\Music\Podcasts']

[catalog]
path = "catalog.json"
shuffle = true

[http]
bind_addr = "127.0.0.1"
port = 8000

[game]
mode = "free_play"
end_condition = { kind = "target_score", points = 10 }
"#;

        let cfg = Config::parse(toml_str)?;

        assert_eq!(cfg.version, 1);

        assert_eq!(
            cfg.library.roots,
            vec![PathBuf::from("/home/party/Music")]
        );
        assert!(cfg.library.follow_symlinks);
        assert_eq!(cfg.library.ignored_dirs.len(), 1);

        assert_eq!(cfg.catalog.path, PathBuf::from("catalog.json"));
        assert!(cfg.catalog.shuffle);
        assert!(!cfg.catalog.wiki_lookup);

        assert_eq!(cfg.http.port, 8000);

        assert_eq!(cfg.game.mode, PlayMode::FreePlay);
        assert_eq!(
            cfg.game.end_condition,
            Some(EndCondition::TargetScore { points: 10 })
        );

        Ok(())
    }

    #[test]
    fn test_game_section_is_optional() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[library]
roots = ["music"]
follow_symlinks = false

[catalog]
path = "catalog.json"

[http]
bind_addr = "127.0.0.1"
port = 8000
"#;

        let cfg = Config::parse(toml_str)?;

        assert!(cfg.library.ignored_dirs.is_empty());
        assert!(!cfg.catalog.shuffle);
        assert_eq!(cfg.game, GameDefaults::default());

        Ok(())
    }

    #[test]
    fn test_invalid_game_defaults_are_rejected() {
        let base = r#"
version = 1

[library]
roots = ["music"]
follow_symlinks = false

[catalog]
path = "catalog.json"
wiki_lookup = true

[http]
bind_addr = "127.0.0.1"
port = 8000
"#;

        for game in [
            "[game]\nmode = \"free_play\"\nend_condition = { kind = \"target_score\", points = 0 }\n",
            "[game]\nmode = \"free_play\"\nend_condition = { kind = \"time_limit\" }\n",
            "[game]\nmode = \"timed_round\"\nend_condition = { kind = \"catalog_exhausted\" }\n",
        ] {
            let err = Config::parse(&format!("{base}{game}")).unwrap_err();
            assert!(format!("{err:#}").contains("Invalid [game] defaults"), "{err:#}");
        }

        let cfg = Config::parse(&format!("{base}[game]\nmode = \"timed_round\"\n")).unwrap();
        assert!(cfg.catalog.wiki_lookup);
        assert_eq!(cfg.game.mode, PlayMode::TimedRound);
    }

    #[test]
    fn test_resolve_session_config() {
        let defaults = GameDefaults {
            mode: PlayMode::FreePlay,
            end_condition: Some(EndCondition::TargetScore { points: 10 }),
        };

        assert_eq!(
            defaults.resolve(None, None),
            SessionConfig::free_play(EndCondition::TargetScore { points: 10 })
        );
        assert_eq!(
            defaults.resolve(Some(PlayMode::TimedRound), None),
            SessionConfig::timed_round()
        );
        assert_eq!(
            defaults.resolve(None, Some(EndCondition::CatalogExhausted)),
            SessionConfig::free_play(EndCondition::CatalogExhausted)
        );
        assert_eq!(
            GameDefaults::default().resolve(None, None),
            SessionConfig::free_play(EndCondition::CatalogExhausted)
        );
    }
}
