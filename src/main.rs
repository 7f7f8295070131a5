mod app;
mod config;
mod error;
mod fs_ops;
mod image_loader;
mod interaction;
mod layout;
mod models;
mod session;
mod shell;
mod ui;

use app::FauxdeskApp;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fauxdesk=info".parse().unwrap()),
        )
        .init();

    let app = FauxdeskApp::new();
    std::process::exit(app.run());
}
