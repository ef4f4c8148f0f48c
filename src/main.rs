use filestamp::app::FileStampApp;
use filestamp::constant;
use filestamp::ui;

fn main() -> eframe::Result {
    tracing_subscriber::fmt::init();

    let options = ui::viewport::build_viewport();
    eframe::run_native(
        constant::DEFAULT_WINDOW_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(FileStampApp::new(cc)))),
    )
}
