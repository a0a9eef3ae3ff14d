mod settings;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use cosmos::term::{draw_help, Presenter, TerminalGuard};
use cosmos::{StarField, Theme, View};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal,
};

use crate::settings::{load_prefs, prefs_path, save_prefs_atomic, Prefs};

const HUD_ROWS: u16 = 1;

#[derive(Parser, Debug)]
#[command(name = "starfield")]
#[command(about = "Twinkling starfield with the occasional meteor")]
struct Cli {
    /// Frame cap
    #[arg(long, default_value_t = 60)]
    fps: u64,

    /// RNG seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// light or dark; overrides the saved preference for this run
    #[arg(long, value_parser = parse_theme)]
    theme: Option<Theme>,

    /// Write debug logs to this file
    #[arg(long)]
    log: Option<PathBuf>,
}

fn parse_theme(s: &str) -> Result<Theme, String> {
    Theme::parse(s).ok_or_else(|| format!("unknown theme '{s}' (expected light or dark)"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log {
        cosmos::logging::init_file(path)?;
    }

    let prefs_file = prefs_path().ok();
    let prefs = prefs_file.as_deref().map(load_prefs).unwrap_or_default();
    let theme = cli.theme.unwrap_or_else(|| prefs.theme.into());
    let seed = cli.seed.unwrap_or_else(cosmos::clock_seed);

    let mut guard = TerminalGuard::enter()?;
    let res = run(&cli, theme, seed, prefs_file);
    guard.leave()?;
    res
}

fn run(cli: &Cli, theme: Theme, seed: u64, prefs_file: Option<PathBuf>) -> Result<()> {
    let (w, h) = terminal::size()?;
    let mut presenter = Presenter::new(w.max(10), h.max(4), HUD_ROWS);
    let mut view = View::new(StarField::new(theme, seed));
    mount(&mut view, &presenter);

    let frame_dt = Duration::from_secs_f64(1.0 / cli.fps.clamp(1, 240) as f64);
    let mut paused = false;
    let mut show_help = false;
    let mut last = Instant::now();
    let mut fps_smooth = 60.0_f32;
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
                    KeyCode::Char('t') | KeyCode::Char('T') => {
                        let next = view.scene().theme().toggle();
                        view.scene_mut().set_theme(next);
                        if let Some(path) = &prefs_file {
                            let prefs = Prefs { theme: next.into() };
                            if let Err(e) = save_prefs_atomic(path, &prefs) {
                                tracing::warn!("saving theme preference failed: {e:#}");
                            }
                        }
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') => view.scene_mut().reseed(),
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
        if dt > 0.0 {
            fps_smooth = fps_smooth * 0.9 + (1.0 / dt) * 0.1;
        }

        if paused {
            view.redraw();
        } else {
            view.tick(dt);
        }

        let field = view.scene();
        let hud = vec![format!(
            "starfield  stars:{}  meteors:{}  theme:{}  fps:{:.0}{}  (H help, Q quit)",
            field.stars().len(),
            field.meteors().len(),
            field.theme().name(),
            fps_smooth,
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
                    "T            Toggle light/dark (saved)",
                    "R            Reseed",
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

fn mount(view: &mut View<StarField>, presenter: &Presenter) {
    view.mount(
        presenter.cols() as usize * cosmos::canvas::SUBPIXELS_X,
        presenter.field_rows() as usize * cosmos::canvas::SUBPIXELS_Y,
    );
}
