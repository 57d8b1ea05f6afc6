use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};

pub const DEFAULT_INTERVAL_MS: u64 = 100;

///where process information comes from
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    ///procfs with ps fallback on unix, sysinfo elsewhere
    #[default]
    Auto,
    Procfs,
    Ps,
    Sysinfo,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Backend::Auto),
            "procfs" | "proc" => Ok(Backend::Procfs),
            "ps" => Ok(Backend::Ps),
            "sysinfo" => Ok(Backend::Sysinfo),
            other => Err(format!(
                "unknown backend `{other}` (expected auto, procfs, ps or sysinfo)"
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Auto => "auto",
            Backend::Procfs => "procfs",
            Backend::Ps => "ps",
            Backend::Sysinfo => "sysinfo",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub interval_ms: u64,
    pub backend: Backend,
    pub exact: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            interval_ms: DEFAULT_INTERVAL_MS,
            backend: Backend::Auto,
            exact: false,
        }
    }
}

impl Config {
    pub fn load() -> Config {
        Self::load_from(&get_home_config())
    }

    ///missing file is the normal case, anything else unusable is warned about
    pub fn load_from(path: &Path) -> Config {
        if !path.exists() {
            return Config::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => return config,
                Err(err) => log::warn!("ignoring invalid config {}: {}", path.display(), err),
            },
            Err(err) => log::warn!("ignoring unreadable config {}: {}", path.display(), err),
        }
        Config::default()
    }

    ///poll interval, never zero
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

fn get_home_config() -> PathBuf {
    //home directory
    if let Some(mut dir) = dirs::home_dir() {
        dir.push(".config");
        dir.push("mempeak");
        dir.push("config.toml");
        return dir;
    }
    //should not happen, but just in case
    PathBuf::from("mempeak.toml")
}
