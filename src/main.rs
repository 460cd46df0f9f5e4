use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use gtk4::{prelude::*, Application};
use log::debug;

use app::{App, GlibScheduler, GtkLifecycle};
use app_state::AppState;
use config::{Chrome, Overrides, Settings};
use popup_window::PopupWindow;

mod animation;
mod app;
mod app_state;
mod config;
mod popup_window;

const APP_ID: &str = "com.example.areyouhappy";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Settings file, defaults to <config dir>/areyouhappy/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Milliseconds to wait after an answer before quitting
    #[arg(long)]
    exit_delay_ms: Option<u64>,
    /// Base name of the animation to show
    #[arg(long)]
    image: Option<String>,
    /// Directory holding the animations
    #[arg(long)]
    assets: Option<PathBuf>,
    /// Extra stylesheet loaded over the built-in one
    #[arg(long)]
    stylesheet: Option<PathBuf>,
    /// Show as a layer-shell overlay in the top-right corner
    #[arg(long)]
    overlay: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            exit_delay_ms: self.exit_delay_ms,
            image: self.image.clone(),
            assets_dir: self.assets.clone(),
            stylesheet: self.stylesheet.clone(),
            overlay: self.overlay,
        }
    }
}

fn resolve_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).context("could not load settings")?;
    settings.apply_env();
    settings.apply(cli.overrides());
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

fn activate(gtk_app: &Application, settings: &Settings, chrome: &Chrome) {
    if let Some(window) = gtk_app.active_window() {
        debug!("already showing, raising the popup");
        window.present();
        return;
    }

    let popup = Rc::new(PopupWindow::build(gtk_app, settings));
    let state = AppState::new(
        chrome.clone(),
        settings.exit_delay(),
        settings.questions.len(),
        settings.rotate_interval(),
    );
    let app = App::new(
        state,
        popup.clone(),
        Rc::new(GtkLifecycle::new(gtk_app.clone())),
        Rc::new(GlibScheduler),
    );
    popup.connect(&app);
    app.start();
    popup.present();
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let chrome = settings.chrome()?;
    debug!("settings: {:?}", settings);

    let app = Application::builder().application_id(APP_ID).build();
    app.connect_activate(move |gtk_app| activate(gtk_app, &settings, &chrome));

    // GTK only sees the program name; our flags are already parsed.
    let program = std::env::args().next().unwrap_or_else(|| "areyouhappy".to_string());
    let code = app.run_with_args(&[program]);
    if code != glib::ExitCode::SUCCESS {
        anyhow::bail!("GTK main loop exited with {:?}", code);
    }
    Ok(())
}
