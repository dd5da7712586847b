// What you SEE now:
// • The live feed rendered as black-on-white ASCII glyph cells.
// • P toggles a raw-feed preview inset (top-right).
// • F flips the grid's row axis (the image mirrors vertically).
// • SPACE pauses the animation clock. ESC quits.

use ascii_mosaic::atlas::{CharAtlas, DEFAULT_RAMP};
use ascii_mosaic::clock::Ticker;
use ascii_mosaic::draw::Presenter;
use ascii_mosaic::error::Error;
use ascii_mosaic::grid::AsciiGrid;
use ascii_mosaic::material::Material;
use ascii_mosaic::sampler::FrameSampler;
use ascii_mosaic::source::{CameraSource, FrameSource, ImageSource, SequenceSource};
use ascii_mosaic::types::GridSettings;
use std::path::Path;
use std::time::{Duration, Instant};

const GRID_SIZE: usize = 128; // cells per side; also the sample resolution
const CELL_PX: usize = 5;     // window pixels per cell
const CELL_SIZE: f32 = 1.0;   // world-space cell edge
const CAMERA_WIDTH: u32 = 640;
const CAMERA_HEIGHT: u32 = 480;

const USAGE: &str = "usage: ascii-mosaic [--camera N | --image PATH | --frames DIR [--fps F]] [--grid N]";

fn main() -> Result<(), Error> {
    /* --- Command line ---
       Default is the webcam; --image and --frames swap the feed. */
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut grid_size = GRID_SIZE;
    let mut fps = SequenceSource::DEFAULT_FPS;
    let mut camera_index = 0u32;
    let mut image_path: Option<String> = None;
    let mut frames_dir: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--image" => {
                image_path = Some(arg_value(&args, i, "--image")?);
                i += 2;
            }
            "--frames" => {
                frames_dir = Some(arg_value(&args, i, "--frames")?);
                i += 2;
            }
            "--fps" => {
                fps = parse_num(&arg_value(&args, i, "--fps")?, "--fps")?;
                i += 2;
            }
            "--camera" => {
                camera_index = parse_num(&arg_value(&args, i, "--camera")?, "--camera")?;
                i += 2;
            }
            "--grid" => {
                grid_size = parse_num(&arg_value(&args, i, "--grid")?, "--grid")?;
                i += 2;
            }
            other => {
                return Err(Error::Config(format!("unknown argument {other}; {USAGE}")));
            }
        }
    }

    /* --- Frame source ---
       Visual: nothing yet; the camera stream opens / files decode here. */
    let source: Box<dyn FrameSource> = if let Some(path) = &image_path {
        Box::new(ImageSource::open(Path::new(path))?)
    } else if let Some(dir) = &frames_dir {
        Box::new(SequenceSource::open(Path::new(dir), fps, true)?)
    } else {
        Box::new(CameraSource::open(camera_index, CAMERA_WIDTH, CAMERA_HEIGHT)?)
    };
    println!("Source: {} | grid: {grid_size}x{grid_size}", source.tag());

    /* --- Sampler: one pixel per cell ---
       Only the width is given; the sampling region is forced square. */
    let mut sampler = FrameSampler::new(source);
    sampler.set_sample_size(Some(grid_size as u32), None);

    /* --- Grid + material --- */
    let chars = CharAtlas::from_ramp(DEFAULT_RAMP)?;
    let material = Material::ascii(chars, [grid_size as f32, grid_size as f32]);
    let mut settings = GridSettings { size: grid_size, cell_size: CELL_SIZE, flip_rows: true };
    let mut grid = AsciiGrid::new(settings, &sampler, material)?;

    /* --- Window + clock --- */
    let mut presenter = Presenter::new("ASCII Mosaic", grid_size, CELL_PX)?;
    let mut ticker = Ticker::new();

    /* --- HUD / FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while presenter.is_open() && !presenter.esc_pressed() {
        let tick = ticker.tick();

        /* 1) Inputs */
        if presenter.p_pressed_once() {
            presenter.toggle_preview(); // visual: raw-feed inset appears/disappears
        }
        if presenter.space_pressed_once() {
            ticker.toggle_pause(); // visual: the mosaic freezes in place
        }
        if presenter.f_pressed_once() {
            settings.flip_rows = !settings.flip_rows;
            grid.apply_settings(settings)?; // visual: the image mirrors vertically
        }

        /* 2) Per-frame update: sample the feed into the scale attribute.
           Skipped while paused so the previous frame's cells stay up. */
        if !ticker.is_paused() {
            grid.update(&tick, &mut sampler)?;
        }

        /* 3) HUD line */
        let mut hud = format!("{} | {}", sampler.tag(), hud_fps_text);
        if ticker.is_paused() {
            hud.push_str(" | PAUSED");
        }
        if presenter.preview_shown() {
            hud.push_str(" | PREV");
        }

        /* 4) Present; cells redraw only when a buffer was marked dirty. */
        presenter.present(&mut grid, &sampler, &hud)?;

        /* 5) FPS counter (prints to terminal + HUD once per second) */
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps_now = frames_this_second as f32 / secs;
            println!("FPS: {:.1}", fps_now);
            hud_fps_text = format!("FPS: {:.1}", fps_now);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}

fn arg_value(args: &[String], i: usize, flag: &str) -> Result<String, Error> {
    args.get(i + 1)
        .cloned()
        .ok_or_else(|| Error::Config(format!("{flag} needs a value; {USAGE}")))
}

fn parse_num<T: std::str::FromStr>(value: &str, flag: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Config(format!("{flag}: {e}")))
}
