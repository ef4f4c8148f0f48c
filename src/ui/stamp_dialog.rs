//! The timestamp editor dialog for one file.
//!
//! Seeded from a freshly loaded `StampRecord`; edits stay in memory until
//! Save or Apply writes them through the backend. Per-field save failures
//! are listed inline instead of interrupting the save.

use crate::catalog::NodeId;
use crate::constant::STAMP_FORMAT;
use crate::stamp_backend::{StampBackend, TimestampKind};
use crate::stamp_record::{SaveReport, StampRecord};
use chrono::{DateTime, Local, NaiveDateTime};
use egui::Color32;

/// What the app should do with the dialog after this frame.
pub enum DialogAction {
    KeepOpen,
    /// `saved` is true when any field landed on disk during the session,
    /// so the caller can refresh the catalog row.
    Closed { saved: bool },
}

struct FieldState {
    kind: TimestampKind,
    buffer: String,
    valid: bool,
}

pub struct StampDialog {
    node: NodeId,
    record: StampRecord,
    fields: Vec<FieldState>,
    failures: Vec<(TimestampKind, String)>,
    saved_any: bool,
}

impl StampDialog {
    pub fn new(node: NodeId, record: StampRecord) -> Self {
        let mut dialog = Self {
            node,
            record,
            fields: TimestampKind::ALL
                .iter()
                .map(|kind| FieldState {
                    kind: *kind,
                    buffer: String::new(),
                    valid: true,
                })
                .collect(),
            failures: Vec::new(),
            saved_any: false,
        };
        dialog.sync_fields();
        dialog
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn show<B: StampBackend>(&mut self, ctx: &egui::Context, backend: &B) -> DialogAction {
        let mut open = true;
        let mut action = DialogAction::KeepOpen;

        egui::Window::new("Edit Timestamps")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(self.record.path().display().to_string());
                ui.separator();

                for field in &mut self.fields {
                    ui.horizontal(|ui| {
                        ui.add_sized(
                            [130.0, 0.0],
                            egui::Label::new(field.kind.label()),
                        );
                        let mut edit = egui::TextEdit::singleline(&mut field.buffer)
                            .hint_text("not available")
                            .desired_width(180.0);
                        if !field.valid {
                            edit = edit.text_color(Color32::RED);
                        }
                        if ui.add(edit).changed() {
                            match parse_stamp(&field.buffer) {
                                Some(when) => {
                                    field.valid = true;
                                    self.record.set(field.kind, when);
                                }
                                // Invalid text is flagged but never applied.
                                None => field.valid = false,
                            }
                        }
                        if self.record.field_dirty(field.kind) {
                            ui.label("*");
                        }
                    });
                }

                for (kind, msg) in &self.failures {
                    ui.colored_label(Color32::RED, format!("{}: {}", kind.label(), msg));
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Set all to oldest").clicked() {
                        self.record.set_all_to_oldest();
                        self.sync_fields();
                    }

                    let dirty = self.record.is_dirty();
                    if ui.add_enabled(dirty, egui::Button::new("Save")).clicked() {
                        let report = self.record.save(backend);
                        self.apply_report(&report);
                        if report.all_ok() {
                            action = DialogAction::Closed {
                                saved: self.saved_any,
                            };
                        }
                        self.sync_fields();
                    }
                    if ui.add_enabled(dirty, egui::Button::new("Apply")).clicked() {
                        let report = self.record.save(backend);
                        self.apply_report(&report);
                        // Re-seed from disk so the fields show what landed.
                        let _ = self.record.discard(backend);
                        self.sync_fields();
                    }
                    if ui
                        .add_enabled(dirty, egui::Button::new("Discard"))
                        .clicked()
                    {
                        let _ = self.record.discard(backend);
                        self.failures.clear();
                        self.sync_fields();
                    }
                    if ui.button("Cancel").clicked() {
                        action = DialogAction::Closed {
                            saved: self.saved_any,
                        };
                    }
                });
            });

        if !open {
            // Window closed from the title bar: same as Cancel, backing
            // storage untouched beyond what was already applied.
            action = DialogAction::Closed {
                saved: self.saved_any,
            };
        }
        action
    }

    fn apply_report(&mut self, report: &SaveReport) {
        if report.outcomes.iter().any(|o| o.result.is_ok()) {
            self.saved_any = true;
        }
        self.failures = report
            .failures()
            .map(|(kind, msg)| (kind, msg.to_string()))
            .collect();
    }

    /// Refresh the text buffers from the record.
    fn sync_fields(&mut self) {
        for field in &mut self.fields {
            field.buffer = self
                .record
                .get(field.kind)
                .map(|t| t.format(STAMP_FORMAT).to_string())
                .unwrap_or_default();
            field.valid = true;
        }
    }
}

fn parse_stamp(text: &str) -> Option<DateTime<Local>> {
    NaiveDateTime::parse_from_str(text.trim(), STAMP_FORMAT)
        .ok()?
        .and_local_timezone(Local)
        .single()
}
