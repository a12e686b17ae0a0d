//! Replays a recorded pointer script against a shape button and prints what the
//! button did with it.
//!
//! ```text
//! hit_probe <config.toml> <script.json> [--width W] [--height H]
//! ```
//!
//! Without `--width`/`--height` the button is laid out at the texture's own size.

use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use shape_button::dispatch::PointerDispatch;
use shape_button::utils::Rectangle;
use shape_button::{Reply, ShapeButton, ShapeButtonConfig};
use shape_button_input::{PointerState, ReplayScript};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hit_probe", about = "Replay a pointer script against a shape button")]
struct Args {
    /// Button config (TOML)
    config: PathBuf,
    /// Replay script (JSON)
    script: PathBuf,
    /// Button width; defaults to the texture width
    #[arg(long)]
    width: Option<f32>,
    /// Button height; defaults to the texture height
    #[arg(long)]
    height: Option<f32>,
}

fn log_callback(label: &'static str) -> Option<Box<dyn Fn()>> {
    Some(Box::new(move || info!("{label}")))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ShapeButtonConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let script_json = fs::read_to_string(&args.script)
        .with_context(|| format!("reading {}", args.script.display()))?;
    let Some(script) = ReplayScript::from_json(&script_json) else {
        bail!("{} is not a valid replay script", args.script.display());
    };

    let texture = config.load_texture()?;
    let (texture_width, texture_height) = texture
        .as_ref()
        .map(|t| (t.width() as f32, t.height() as f32))
        .unwrap_or((100.0, 100.0));
    let rect = Rectangle::new(
        0.0,
        0.0,
        args.width.unwrap_or(texture_width),
        args.height.unwrap_or(texture_height),
    );

    let button = ShapeButton::from_config(&config, rect)?;
    button.set_on_clicked(log_callback("clicked"));
    button.set_on_pressed(log_callback("pressed"));
    button.set_on_released(log_callback("released"));
    button.set_on_hovered(log_callback("hovered"));
    button.set_on_unhovered(log_callback("unhovered"));

    let mut input = PointerState::default();
    let mut swallowed = 0usize;
    for (frame, record) in script.frames.iter().enumerate() {
        record.apply_to(&mut input);
        button.set_occluded(record.occluded);
        for (event, reply) in button.update(&input, script.frame_seconds) {
            let is_press = matches!(
                event,
                PointerDispatch::Pressed(_) | PointerDispatch::DoubleClicked(_)
            );
            if is_press && reply == Reply::Unhandled {
                swallowed += 1;
                info!(
                    "frame {frame}: press at ({}, {}) swallowed",
                    record.mouse_x, record.mouse_y
                );
            }
        }
        println!(
            "frame {frame:>4} ({:>7.1}, {:>7.1}) hovered={} can_hover={} buffer_ready={}",
            record.mouse_x,
            record.mouse_y,
            button.is_hovered(),
            button.can_hover(),
            button.is_buffer_ready()
        );
    }
    println!("{} frames, {swallowed} presses swallowed", script.frames.len());
    Ok(())
}
