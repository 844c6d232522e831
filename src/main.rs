//! voxview - interactive voxel map viewer

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use winit::event_loop::EventLoop;

use voxview::core::{logging, Error};
use voxview::viewer::{ViewerApp, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "voxview")]
#[command(about = "Interactive viewer for voxelized octree occupancy maps")]
struct Args {
    /// Octree file or `{voxels, resolution}` JSON payload to open
    file: Option<PathBuf>,

    /// JSON config file; CLI flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Octree-to-JSON converter executable
    #[arg(long)]
    converter: Option<PathBuf>,

    /// Directory for exported PLY files
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Tone-mapping exposure
    #[arg(long)]
    exposure: Option<f32>,

    /// Background colour as RRGGBB hex
    #[arg(long, value_parser = parse_hex_color)]
    background: Option<u32>,

    /// Window width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Control server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Disable the control server
    #[arg(long)]
    no_control: bool,

    /// Write the effective config to this path and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

fn parse_hex_color(s: &str) -> Result<u32, String> {
    let hex = s.trim_start_matches('#').trim_start_matches("0x");
    if hex.len() != 6 {
        return Err(format!("expected RRGGBB, got {:?}", s));
    }
    u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
}

impl Args {
    /// Config file (or defaults) with CLI overrides applied
    fn resolve_config(&self) -> Result<ViewerConfig, Error> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };

        if let Some(converter) = &self.converter {
            config.converter = converter.clone();
        }
        if let Some(dir) = &self.export_dir {
            config.export_dir = dir.clone();
        }
        if let Some(exposure) = self.exposure {
            config.exposure = exposure;
        }
        if let Some(background) = self.background {
            config.background = background;
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        if let Some(port) = self.port {
            config.control.port = port;
        }
        if self.no_control {
            config.control.enabled = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn run(args: Args) -> Result<(), Error> {
    let config = args.resolve_config()?;

    if let Some(path) = &args.dump_config {
        config.save(path)?;
        log::info!("Config written to {}", path.display());
        return Ok(());
    }

    let event_loop = EventLoop::new().map_err(|e| Error::Window(e.to_string()))?;
    let mut app = ViewerApp::new(config, args.file);

    event_loop
        .run_app(&mut app)
        .map_err(|e| Error::Window(e.to_string()))?;

    app.shutdown();
    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    logging::init();
    log::info!("voxview starting...");

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("f0f0f0"), Ok(0xF0F0F0));
        assert_eq!(parse_hex_color("#DDFF00"), Ok(0xDDFF00));
        assert!(parse_hex_color("fff").is_err());
        assert!(parse_hex_color("zzzzzz").is_err());
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let args = Args::parse_from(["voxview", "scan.ot", "--exposure", "2.5", "--no-control", "--port", "9000"]);
        let config = args.resolve_config().unwrap();
        assert_eq!(args.file, Some(PathBuf::from("scan.ot")));
        assert_eq!(config.exposure, 2.5);
        assert!(!config.control.enabled);
        assert_eq!(config.control.port, 9000);
        assert_eq!(config.background, 0xF0F0F0);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(&path, r#"{"exposure": 1.0, "export_dir": "/tmp/out"}"#).unwrap();

        let args = Args::parse_from(["voxview", "--config", path.to_str().unwrap(), "--exposure", "3"]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.exposure, 3.0);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
    }
}
