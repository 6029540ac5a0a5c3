use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use schedule_capture::platform::{CliHost, DeviceMetrics};
use schedule_capture::report::ReportFile;
use schedule_capture::rendering::SoftwareRasterizer;
use schedule_capture::{CaptureConfig, CapturePipeline};

/// Render an exam schedule into a PNG
#[derive(Parser, Debug)]
#[command(name = "schedule-capture", version, about)]
struct Args {
    /// Report JSON: {"title", "metadata", "rows": [{date, time, courseCode, section, classroom}]}
    #[arg(short, long)]
    input: PathBuf,

    /// Directory the PNG is saved into
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Capture configuration JSON; unspecified fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the report title
    #[arg(short, long)]
    title: Option<String>,

    /// Screen width of the emulated viewing device, in css px
    #[arg(long, default_value_t = 1280)]
    screen_width: u32,

    /// Screen height of the emulated viewing device, in css px
    #[arg(long, default_value_t = 720)]
    screen_height: u32,

    /// Device pixel ratio of the emulated viewing device
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,

    /// Override the downloaded file name
    #[arg(long)]
    file_name: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CaptureConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CaptureConfig::default(),
    };
    if let Some(name) = args.file_name {
        config.file_name = name;
    }

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let file: ReportFile = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.input.display()))?;
    let mut document = file.into_document("Exam Schedule");
    if let Some(title) = args.title {
        document.title = title;
    }

    let metrics = DeviceMetrics {
        width: args.screen_width,
        height: args.screen_height,
        dpr: args.dpr,
        touch: false,
    };
    let host = CliHost::new(&args.out, metrics);
    let rasterizer = SoftwareRasterizer::with_max_dimension(config.max_canvas_dimension);
    let pipeline = CapturePipeline::new(config, &host)?.with_rasterizer(&rasterizer);

    let output = pipeline.capture(&document).await?;
    println!(
        "{} ({}x{}, {} pass{})",
        args.out.join(&output.file_name).display(),
        output.image.width,
        output.image.height,
        output.passes,
        if output.passes == 1 { "" } else { "es" }
    );
    Ok(())
}
