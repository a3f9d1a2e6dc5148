use clap::Parser;
use log::info;
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use rca_rs::{
    engine::{DrawMode, Engine, OverheadStyle, RenderConfig, draw_overhead},
    map::load_level,
    renderer::Software,
    sim::{InputCmd, InputSource, MouseLook, MoveSpeeds, SIM_FPS, TicRunner},
    world::Level,
};

/// Interactive software-rendered viewer.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Level file (`.lvl` text or `.rcal` binary); the built-in demo if omitted
    #[arg(long, value_name = "FILE")]
    level: Option<PathBuf>,

    /// Rays cast per frame
    #[arg(long, default_value_t = 256)]
    columns: usize,

    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 60.0)]
    fov: f64,

    /// Draw every wall in one pass instead of walking the BSP
    #[arg(long)]
    direct: bool,

    #[arg(long, default_value_t = 960)]
    width: usize,

    #[arg(long, default_value_t = 600)]
    height: usize,
}

/// Key state and pointer motion of a minifb window as an input snapshot.
struct Controls<'w> {
    win: &'w Window,
    mouse: &'w mut MouseLook,
}

impl InputSource for Controls<'_> {
    fn snapshot(&mut self) -> InputCmd {
        let win = self.win;
        let down = |keys: &[Key]| keys.iter().any(|&k| win.is_key_down(k));
        let axis = |pos: &[Key], neg: &[Key]| down(pos) as i32 as f64 - down(neg) as i32 as f64;

        InputCmd {
            forward: axis(&[Key::Up, Key::W], &[Key::Down, Key::S]),
            strafe: axis(&[Key::D], &[Key::A]),
            turn: axis(&[Key::Right, Key::E], &[Key::Left, Key::Q]),
            look: win
                .get_mouse_pos(MouseMode::Pass)
                .map_or(0.0, |(x, _)| self.mouse.step(x)),
            run: down(&[Key::LeftShift, Key::RightShift]),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let level = match &opts.level {
        Some(path) => load_level(path)?,
        None => Level::demo(),
    };
    info!(
        "level `{}`: {} sectors, {} walls, bsp: {}",
        level.name,
        level.sectors.len(),
        level.wall_count(),
        level.bsp.is_some()
    );

    let mut engine = Engine::new(RenderConfig {
        columns: opts.columns,
        fov: opts.fov,
        mode: if opts.direct { DrawMode::Direct } else { DrawMode::Bsp },
        ..RenderConfig::default()
    });
    let mut style = OverheadStyle::default();
    let mut show_map = false;

    let mut camera = level.spawn;
    let mut sim = TicRunner::new(MoveSpeeds::default());
    let mut mouse = MouseLook::default();
    let mut sw = Software::new(opts.width, opts.height);

    let mut win = Window::new(
        "rca_rs software view",
        opts.width,
        opts.height,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )?;
    win.set_target_fps(SIM_FPS as usize * 2);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now();

        /* toggles ---------------------------------------------------------- */
        if win.is_key_pressed(Key::M, KeyRepeat::No) {
            show_map = !show_map;
        }
        if win.is_key_pressed(Key::R, KeyRepeat::No) {
            style.show_rays = !style.show_rays;
        }

        /* simulation ------------------------------------------------------- */
        let mut controls = Controls {
            win: &win,
            mouse: &mut mouse,
        };
        sim.pump(&mut controls, &mut camera);

        /* draw ------------------------------------------------------------- */
        let (w, h) = win.get_size();
        sw.resize(w.max(1), h.max(1));
        if show_map {
            draw_overhead(&mut sw, &level, &camera, &engine.cfg, &style);
        } else {
            engine.render_frame(&mut sw, &level, &camera);
        }
        acc_time += t0.elapsed();
        acc_frames += 1;
        win.update_with_buffer(sw.pixels(), w.max(1), h.max(1))?;

        if last_print.elapsed() >= Duration::from_secs(3) && acc_frames > 0 {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            info!("avg render: {:.2} ms  ({:.1} FPS)", avg_ms, 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}
