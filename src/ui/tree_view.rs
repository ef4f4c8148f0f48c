//! Tree rendering for the catalog: collapsing headers for directories,
//! one row per file with the four timestamp columns.

use crate::catalog::{Catalog, NodeId, NodeKind};
use crate::constant::STAMP_FORMAT;
use crate::stamp_backend::{StampBackend, TimestampKind};
use egui::Ui;

const NAME_COLUMN_WIDTH: f32 = 240.0;
const STAMP_COLUMN_WIDTH: f32 = 150.0;

/// Returns the file node the user double-clicked this frame, if any.
pub fn show<B: StampBackend>(ui: &mut Ui, catalog: &mut Catalog, backend: &B) -> Option<NodeId> {
    let mut activated = None;

    match catalog.root() {
        Some(root) => {
            header_row(ui);
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                show_dir(ui, catalog, backend, root, &mut activated);
            });
        }
        None => {
            ui.label("No files found under the selected directory.");
        }
    }

    activated
}

fn header_row(ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [NAME_COLUMN_WIDTH, 0.0],
            egui::Label::new(egui::RichText::new("Name").strong()),
        );
        for kind in TimestampKind::ALL {
            ui.add_sized(
                [STAMP_COLUMN_WIDTH, 0.0],
                egui::Label::new(egui::RichText::new(kind.label()).strong()),
            );
        }
    });
}

fn show_dir<B: StampBackend>(
    ui: &mut Ui,
    catalog: &mut Catalog,
    backend: &B,
    id: NodeId,
    activated: &mut Option<NodeId>,
) {
    let rel_path = catalog.node(id).rel_path.clone();
    let children = catalog.node(id).children.clone();

    egui::CollapsingHeader::new(&rel_path)
        .id_salt(&rel_path)
        .default_open(true)
        .show(ui, |ui| {
            for child in children {
                match catalog.node(child).kind {
                    NodeKind::Dir => show_dir(ui, catalog, backend, child, activated),
                    NodeKind::File => show_file(ui, catalog, backend, child, activated),
                }
            }
        });
}

fn show_file<B: StampBackend>(
    ui: &mut Ui,
    catalog: &mut Catalog,
    backend: &B,
    id: NodeId,
    activated: &mut Option<NodeId>,
) {
    catalog.ensure_stamps(id, backend);
    let node = catalog.node(id);
    let stamps = node.stamps.unwrap_or_default();

    ui.horizontal(|ui| {
        let response = ui.add_sized(
            [NAME_COLUMN_WIDTH, 0.0],
            egui::SelectableLabel::new(false, &node.name),
        );
        for kind in TimestampKind::ALL {
            let text = stamps
                .get(kind)
                .map(|t| t.format(STAMP_FORMAT).to_string())
                .unwrap_or_else(|| "-".to_string());
            ui.add_sized([STAMP_COLUMN_WIDTH, 0.0], egui::Label::new(text));
        }
        if response.double_clicked() {
            *activated = Some(id);
        }
    });
}
