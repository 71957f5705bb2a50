mod api;
mod app;
mod graph;
mod interact;
mod settings;
mod sim;
mod theme;

use api::DataClient;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    let client = DataClient::from_env();

    let doc = match client.fetch_graph() {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(error = %e, "could not load graph document");
            std::process::exit(1);
        }
    };

    // The date picker degrades to empty when the session list is missing.
    let session_names = match client.fetch_session_names() {
        Ok(names) => names,
        Err(e) => {
            tracing::warn!(error = %e, "could not load session list");
            Vec::new()
        }
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("Mixgraph"),
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native(
        "mixgraph",
        options,
        Box::new(move |cc| Ok(Box::new(app::MixGraphApp::new(cc, doc, session_names)))),
    )
}
