//! Command-line flags (`--key=value`), parsed leniently: bad values warn and
//! keep the default.

use std::path::PathBuf;

use corelib::{clock::ClockMode, path::ParamPolicy};

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// OBJ file to load; without it only the camera path runs.
    pub obj: Option<PathBuf>,
    /// Control-point table; the built-in balloon loop when absent.
    pub path_file: Option<PathBuf>,
    pub duration_secs: f32,
    pub frames: u32,
    pub policy: ParamPolicy,
    pub scale: f32,
    pub mode: ClockMode,
    /// Projectiles fired during the run.
    pub shots: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            obj: None,
            path_file: None,
            duration_secs: 20.0,
            frames: 8,
            policy: ParamPolicy::Clamp,
            scale: corelib::path::DEFAULT_SCALE,
            mode: ClockMode::Looping,
            shots: 0,
            width: 1280,
            height: 720,
        }
    }
}

impl AppConfig {
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::default();
        for arg in args {
            let arg = arg.as_ref();
            if arg == "--once" {
                config.mode = ClockMode::Once;
            } else if let Some(v) = arg.strip_prefix("--obj=") {
                config.obj = Some(PathBuf::from(v));
            } else if let Some(v) = arg.strip_prefix("--path=") {
                config.path_file = Some(PathBuf::from(v));
            } else if let Some(v) = arg.strip_prefix("--duration=") {
                match v.parse::<f32>() {
                    Ok(d) if d > 0.0 => config.duration_secs = d,
                    _ => log::warn!("Invalid duration '{}', keeping {}s", v, config.duration_secs),
                }
            } else if let Some(v) = arg.strip_prefix("--frames=") {
                match v.parse::<u32>() {
                    Ok(n) if n > 0 => config.frames = n,
                    _ => log::warn!("Invalid frame count '{}', keeping {}", v, config.frames),
                }
            } else if let Some(v) = arg.strip_prefix("--t-policy=") {
                config.policy = match v.to_ascii_lowercase().as_str() {
                    "clamp" => ParamPolicy::Clamp,
                    "wrap" => ParamPolicy::Wrap,
                    "reject" => ParamPolicy::Reject,
                    other => {
                        log::warn!("Unknown t-policy '{}', falling back to clamp.", other);
                        ParamPolicy::Clamp
                    }
                };
            } else if let Some(v) = arg.strip_prefix("--scale=") {
                match v.parse::<f32>() {
                    Ok(s) if s.is_finite() => config.scale = s,
                    _ => log::warn!("Invalid scale '{}', keeping {}", v, config.scale),
                }
            } else if let Some(v) = arg.strip_prefix("--shots=") {
                match v.parse::<u32>() {
                    Ok(n) => config.shots = n,
                    Err(_) => log::warn!("Invalid shot count '{}'", v),
                }
            } else if let Some(v) = arg.strip_prefix("--size=") {
                if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                    if let (Ok(w), Ok(h)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                        config.width = w.max(1);
                        config.height = h.max(1);
                        continue;
                    }
                }
                log::warn!("Invalid size '{}', expected WxH", v);
            } else {
                log::warn!("Ignoring unknown argument '{}'", arg);
            }
        }
        // A one-shot run ends exactly on t = 1, which only clamping evaluates
        // as the end of the path.
        if config.mode == ClockMode::Once && config.policy != ParamPolicy::Clamp {
            log::warn!(
                "t-policy {:?} cannot reach the end of a --once run, using clamp",
                config.policy
            );
            config.policy = ParamPolicy::Clamp;
        }
        config
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_args() {
        let config = AppConfig::from_args(Vec::<String>::new());
        assert_eq!(config, AppConfig::default());
        assert!((config.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn parses_all_flags() {
        let config = AppConfig::from_args([
            "--obj=assets/Hot Air Balloon.obj",
            "--path=loop.txt",
            "--duration=12.5",
            "--frames=30",
            "--t-policy=Wrap",
            "--scale=1",
            "--shots=3",
            "--size=800X600",
        ]);
        assert_eq!(config.obj, Some(PathBuf::from("assets/Hot Air Balloon.obj")));
        assert_eq!(config.path_file, Some(PathBuf::from("loop.txt")));
        assert_eq!(config.duration_secs, 12.5);
        assert_eq!(config.frames, 30);
        assert_eq!(config.policy, ParamPolicy::Wrap);
        assert_eq!(config.scale, 1.0);
        assert_eq!(config.mode, ClockMode::Looping);
        assert_eq!(config.shots, 3);
        assert_eq!((config.width, config.height), (800, 600));
    }

    #[test]
    fn once_forces_clamped_end() {
        for policy in ["--t-policy=reject", "--t-policy=wrap"] {
            let config = AppConfig::from_args(["--once", policy]);
            assert_eq!(config.mode, ClockMode::Once);
            assert_eq!(config.policy, ParamPolicy::Clamp);
        }
        let looping = AppConfig::from_args(["--t-policy=reject"]);
        assert_eq!(looping.policy, ParamPolicy::Reject);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = AppConfig::from_args([
            "--duration=-1",
            "--frames=zero",
            "--t-policy=bounce",
            "--size=big",
            "--verbose",
        ]);
        assert_eq!(config, AppConfig::default());
    }
}
