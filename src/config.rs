use crate::av::StreamKind;
use crate::error::{DemuxError, Result};
use crate::format::ts::types::PID_MAX;
use std::env;
use std::fs;
use std::path::Path;

const CONFIG_PATHS: [&str; 2] = ["./tsdemux.toml", "./tsdemux_config.toml"];

/// Which PID to demultiplex and what it is expected to carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemuxConfig {
    pub pid: u16,
    pub stream_kind: StreamKind,
    /// TS cells requested from the reader per read
    pub read_cells: usize,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            pid: 0x100,
            stream_kind: StreamKind::H264Video,
            read_cells: 64,
        }
    }
}

impl DemuxConfig {
    /// Defaults, overridden by the first config file found, overridden by environment
    /// variables (`TSDEMUX_PID`, `TSDEMUX_STREAM_KIND`, `TSDEMUX_READ_CELLS`).
    pub fn load() -> Result<Self> {
        let mut config = DemuxConfig::default();

        for path in &CONFIG_PATHS {
            if let Ok(content) = fs::read_to_string(path) {
                log::debug!("loading demux config from {}", path);
                config.apply_file(&content)?;
                break;
            }
        }

        if let Ok(pid) = env::var("TSDEMUX_PID") {
            config.set("pid", &pid)?;
        }
        if let Ok(kind) = env::var("TSDEMUX_STREAM_KIND") {
            config.set("stream_kind", &kind)?;
        }
        if let Ok(cells) = env::var("TSDEMUX_READ_CELLS") {
            config.set("read_cells", &cells)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Applies `key = value` lines; `#` starts a comment, unknown keys are ignored.
    pub fn apply_file(&mut self, content: &str) -> Result<()> {
        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if !value.is_empty() {
                    self.set(key.trim(), value)?;
                }
            }
        }
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "pid" => self.pid = parse_pid(value)?,
            "stream_kind" => self.stream_kind = value.parse()?,
            "read_cells" => self.read_cells = value.trim().parse()?,
            other => log::debug!("ignoring unknown config key {}", other),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pid > PID_MAX {
            return Err(DemuxError::Config(format!(
                "pid 0x{:x} exceeds 13 bits",
                self.pid
            )));
        }
        if self.read_cells == 0 {
            return Err(DemuxError::Config("read_cells must be positive".into()));
        }
        Ok(())
    }
}

/// Accepts decimal or `0x`-prefixed hexadecimal.
fn parse_pid(value: &str) -> Result<u16> {
    let value = value.trim();
    let pid = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16)?,
        None => value.parse()?,
    };
    Ok(pid)
}

/// Creates a default config template file if it doesn't exist
pub fn create_default_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        let template = r#"# tsdemux configuration
# PID carrying the elementary stream, decimal or 0x-prefixed hex
pid = 0x100

# One of: h262, h264, h265, ac3, mp2
stream_kind = "h264"

# TS cells requested from the reader per read
read_cells = 64
"#;
        fs::write(path, template)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_file() {
        let mut config = DemuxConfig::default();
        config
            .apply_file("# comment\npid = 0x1FF\nstream_kind = 'ac3' # trailing\nother = 1\n")
            .unwrap();
        assert_eq!(config.pid, 0x1ff);
        assert_eq!(config.stream_kind, StreamKind::Ac3Audio);
        assert_eq!(config.read_cells, 64);
    }

    #[test]
    fn test_bad_values() {
        let mut config = DemuxConfig::default();
        assert!(config.apply_file("pid = zz").is_err());
        assert!(config.apply_file("stream_kind = flac").is_err());

        config.pid = 0x2000;
        assert!(config.validate().is_err());

        let config = DemuxConfig {
            read_cells: 0,
            ..DemuxConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_pid() {
        assert_eq!(parse_pid("256").unwrap(), 256);
        assert_eq!(parse_pid(" 0x100 ").unwrap(), 256);
        assert!(parse_pid("0xgg").is_err());
    }

    #[test]
    fn test_template_round_trip() {
        let path = std::env::temp_dir().join(format!("tsdemux-template-{}.toml", std::process::id()));
        let _ = fs::remove_file(&path);
        create_default_config_template(&path).unwrap();

        let mut config = DemuxConfig {
            pid: 1,
            stream_kind: StreamKind::Mp2Audio,
            read_cells: 1,
        };
        config.apply_file(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config, DemuxConfig::default());
        fs::remove_file(&path).unwrap();
    }
}
