use std::path::PathBuf;

use anyhow::Context;
use eframe::egui;
use measurex::app::MeasurexApp;
use measurex::AnnotatorConfig;

const USAGE: &str = "Usage: measurex [--config <file.json>] [image ...]";

struct Args {
    config: Option<PathBuf>,
    images: Vec<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        config: None,
        images: Vec::new(),
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            "--config" => {
                let path = args.next().context("--config needs a file argument")?;
                parsed.config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => anyhow::bail!("unknown option {flag}\n{USAGE}"),
            path => parsed.images.push(PathBuf::from(path)),
        }
    }
    Ok(parsed)
}

fn main() -> anyhow::Result<()> {
    measurex::init_logging()?;

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => AnnotatorConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AnnotatorConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_title("Measurex"),
        ..Default::default()
    };

    eframe::run_native(
        "Measurex",
        options,
        Box::new(move |_cc| Ok(Box::new(MeasurexApp::new(config, &args.images)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run eframe: {e}"))
}
