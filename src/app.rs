use crate::catalog::{Catalog, NodeId, WalkStatus, Walker};
use crate::config::Config;
use crate::constant::WALK_BATCH_SIZE;
use crate::stamp_backend::OsStampBackend;
use crate::stamp_record::StampRecord;
use crate::style::configure_style;
use crate::ui::stamp_dialog::{DialogAction, StampDialog};
use crate::ui::tree_view;
use std::path::Path;
use tracing::error;

pub struct FileStampApp {
    config: Config,
    src_dir: String,
    walker: Option<Walker>,
    catalog: Option<Catalog>,
    dialog: Option<StampDialog>,
    backend: OsStampBackend,
    status_error: Option<String>,
}

impl FileStampApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        configure_style(&cc.egui_ctx);
        let config = Config::default();
        let src_dir = config.settings.last_source_dir.clone();
        Self {
            config,
            src_dir,
            walker: None,
            catalog: None,
            dialog: None,
            backend: OsStampBackend,
            status_error: None,
        }
    }

    fn dir_valid(&self) -> bool {
        !self.src_dir.is_empty() && Path::new(&self.src_dir).is_dir()
    }

    fn start_load(&mut self) {
        self.catalog = None;
        self.dialog = None;
        self.status_error = None;
        match Walker::new(Path::new(&self.src_dir)) {
            Ok(walker) => self.walker = Some(walker),
            Err(e) => {
                error!("load failed: {}", e);
                self.status_error = Some(e.to_string());
            }
        }
    }

    fn open_editor(&mut self, node: NodeId) {
        let Some(catalog) = self.catalog.as_ref() else {
            return;
        };
        let Some(path) = catalog.resolve_path(node) else {
            return;
        };
        match StampRecord::load(&path, &self.backend) {
            Ok(record) => self.dialog = Some(StampDialog::new(node, record)),
            Err(e) => {
                error!("failed to read timestamps for {:?}: {}", path, e);
                self.status_error = Some(e.to_string());
            }
        }
    }
}

impl eframe::App for FileStampApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Source directory controls
        egui::TopBottomPanel::top("source_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Source:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.src_dir).desired_width(420.0),
                );
                if ui.button("Browse...").clicked() {
                    let mut picker = rfd::FileDialog::new();
                    if self.dir_valid() {
                        picker = picker.set_directory(&self.src_dir);
                    }
                    if let Some(dir) = picker.pick_folder() {
                        self.src_dir = dir.display().to_string();
                    }
                }
                let can_load = self.dir_valid() && self.walker.is_none();
                if ui.add_enabled(can_load, egui::Button::new("Load")).clicked() {
                    self.start_load();
                }
            });
            if let Some(msg) = &self.status_error {
                ui.colored_label(egui::Color32::RED, msg);
            }
        });

        // Advance the walk one batch per frame so the UI stays responsive
        // and cancellation is observed between batches.
        let mut walk_done = false;
        if let Some(walker) = self.walker.as_mut() {
            let status = walker.step(WALK_BATCH_SIZE);

            let mut cancel_clicked = false;
            egui::Window::new("Finding Files...")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(format!(
                            "{} entries scanned, {} files found",
                            walker.visited(),
                            walker.files_found()
                        ));
                    });
                    if ui.button("Cancel").clicked() {
                        cancel_clicked = true;
                    }
                });
            if cancel_clicked {
                walker.cancel();
            }

            walk_done = status == WalkStatus::Done;
            if !walk_done {
                ctx.request_repaint();
            }
        }
        if walk_done {
            if let Some(walker) = self.walker.take() {
                self.catalog = Some(walker.finish());
            }
        }

        // Catalog tree
        let mut activated = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.walker.is_some() {
                ui.label("Scanning...");
            } else if let Some(catalog) = self.catalog.as_mut() {
                activated = tree_view::show(ui, catalog, &self.backend);
            } else {
                ui.label("Select a source directory and press Load.");
            }
        });
        if let Some(node) = activated {
            self.open_editor(node);
        }

        // Editor dialog
        let mut closed: Option<(NodeId, bool)> = None;
        if let Some(dialog) = self.dialog.as_mut() {
            if let DialogAction::Closed { saved } = dialog.show(ctx, &self.backend) {
                closed = Some((dialog.node(), saved));
            }
        }
        if let Some((node, saved)) = closed {
            if saved {
                if let Some(catalog) = self.catalog.as_mut() {
                    catalog.reload_stamps(node, &self.backend);
                }
            }
            self.dialog = None;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.settings.last_source_dir = self.src_dir.clone();
        if let Err(e) = self.config.save() {
            error!("Failed to save config on exit: {}", e);
        }
    }
}
