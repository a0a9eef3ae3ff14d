use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use cosmos::canvas::{SUBPIXELS_X, SUBPIXELS_Y};
use cosmos::term::{draw_help, Presenter, TerminalGuard};
use cosmos::{BigBang, View};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal,
};

const HUD_ROWS: u16 = 1;

#[derive(Parser, Debug)]
#[command(name = "bigbang")]
#[command(about = "Explosion, nebula, star formation and a solar system, on loop")]
struct Cli {
    /// Frame cap
    #[arg(long, default_value_t = 60)]
    fps: u64,

    /// RNG seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Write debug logs to this file
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log {
        cosmos::logging::init_file(path)?;
    }
    let seed = cli.seed.unwrap_or_else(cosmos::clock_seed);

    let mut guard = TerminalGuard::enter()?;
    let res = run(&cli, seed);
    guard.leave()?;
    res
}

fn run(cli: &Cli, seed: u64) -> Result<()> {
    let (w, h) = terminal::size()?;
    let mut presenter = Presenter::new(w.max(10), h.max(4), HUD_ROWS);
    let mut view = View::new(BigBang::new(seed));
    mount(&mut view, &presenter);

    let frame_dt = Duration::from_secs_f64(1.0 / cli.fps.clamp(1, 240) as f64);
    let mut paused = false;
    let mut show_help = false;
    let mut last = Instant::now();
    let mut out = io::stdout();

    'main: loop {
        let frame_start = Instant::now();

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => match k.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => break 'main,
                    KeyCode::Char(' ') => paused = !paused,
                    KeyCode::Char('h') | KeyCode::Char('H') => {
                        show_help = !show_help;
                        presenter.invalidate();
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') => view.scene_mut().restart(),
                    _ => {}
                },
                Event::Resize(w, h) => {
                    presenter.resize(w.max(10), h.max(4))?;
                    mount(&mut view, &presenter);
                }
                _ => {}
            }
        }

        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;

        if paused {
            view.redraw();
        } else {
            view.tick(dt);
        }

        let bb = view.scene();
        let phase = bb.phase();
        let left = phase.duration() - bb.phase_elapsed();
        let hud = vec![format!(
            "bigbang  phase:{}  t:{:>5.1}s  next:{} in {:.1}s{}  (H help, Q quit)",
            phase.name(),
            bb.elapsed(),
            phase.next().name(),
            left.max(0.0),
            if paused { "  [paused]" } else { "" }
        )];
        if let Some(canvas) = view.surface() {
            presenter.present(&mut out, canvas, &hud)?;
        }
        if show_help {
            draw_help(
                &mut out,
                presenter.cols() as usize,
                presenter.rows() as usize,
                "HELP",
                &[
                    "Q / Esc      Quit",
                    "Space        Pause",
                    "R            Restart from the explosion",
                    "H            Toggle this overlay",
                ],
            )?;
        }

        let spent = frame_start.elapsed();
        if spent < frame_dt {
            std::thread::sleep(frame_dt - spent);
        }
    }

    view.unmount();
    Ok(())
}

fn mount(view: &mut View<BigBang>, presenter: &Presenter) {
    view.mount(
        presenter.cols() as usize * SUBPIXELS_X,
        presenter.field_rows() as usize * SUBPIXELS_Y,
    );
}
