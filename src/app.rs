use gtk4::prelude::*;
use gtk4::Application;
use std::path::PathBuf;

use crate::config::DesktopConfig;
use crate::error::DesktopError;
use crate::layout::AutoLayout;
use crate::session::DesktopSessionState;
use crate::ui::boot::run_boot;
use crate::ui::{dialogs, DesktopWindow};

const APP_ID: &str = "io.github.fauxdesk.Desktop";

pub struct FauxdeskApp {
    app: Application,
}

impl FauxdeskApp {
    pub fn new() -> Self {
        let app = Application::builder().application_id(APP_ID).build();

        app.connect_activate(Self::on_activate);

        Self { app }
    }

    pub fn run(&self) -> i32 {
        self.app.run().into()
    }

    fn on_activate(app: &Application) {
        // A second launch only raises what is already on screen.
        if let Some(window) = app.active_window() {
            window.present();
            return;
        }

        let app_for_desktop = app.clone();
        run_boot(app, move || Self::start_desktop(&app_for_desktop));
    }

    /// Loads the configuration, running first-time setup when there is none.
    fn start_desktop(app: &Application) {
        let config_path = match DesktopConfig::default_path() {
            Ok(path) => path,
            Err(err) => return Self::fatal(app, &err),
        };

        match DesktopConfig::load(&config_path) {
            Ok(Some(config)) => Self::launch(app, config_path, config),
            Ok(None) => {
                tracing::info!("No configuration at {:?}; running setup", config_path);
                let app_for_setup = app.clone();
                dialogs::run_setup(app, move |result| match result {
                    Some(config) => match config.save(&config_path) {
                        Ok(()) => Self::launch(&app_for_setup, config_path, config),
                        Err(err) => Self::fatal(&app_for_setup, &err),
                    },
                    None => Self::fatal(&app_for_setup, &DesktopError::RootUnset),
                });
            }
            Err(err) => Self::fatal(app, &err),
        }
    }

    fn launch(app: &Application, config_path: PathBuf, config: DesktopConfig) {
        if let Err(err) = config.validate_root() {
            return Self::fatal(app, &err);
        }

        let mut session = DesktopSessionState::new(config_path, config, AutoLayout::default());
        let build_error = session.rebuild().err();
        tracing::info!(
            "Desktop ready at {:?} with {} icons",
            session.root(),
            session.icons().len()
        );

        let window = DesktopWindow::new(app, session);
        window.present();
        // Keep the window alive by storing it on the Application.
        unsafe {
            app.set_data("main-window", window);
        }

        match build_error {
            Some(err) if err.is_fatal() => Self::fatal(app, &err),
            Some(err) => dialogs::show_error(app.active_window().as_ref(), &err),
            None => {}
        }
    }

    /// Configuration errors end the session once the user has read them.
    fn fatal(app: &Application, err: &DesktopError) {
        tracing::error!(error = %err, "Cannot start desktop");
        let guard = app.hold();
        let app = app.clone();
        dialogs::show_message(None, err.dialog_title(), &err.to_string(), move || {
            drop(guard);
            app.quit();
        });
    }
}

impl Default for FauxdeskApp {
    fn default() -> Self {
        Self::new()
    }
}
