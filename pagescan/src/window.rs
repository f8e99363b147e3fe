use crate::{
    export::ExportFormat,
    messages as msg,
    orchestrator::{Dialogs, Orchestrator},
};
use eframe::{egui, CreationContext, NativeOptions};
use egui::{Align2, Button, ColorImage, Context, Key, TextureHandle, TextureOptions, Vec2};
use libsane::Backend;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use std::{path::PathBuf, sync::Arc};

pub fn run(orchestrator: Orchestrator<Backend>) -> Result<(), eframe::Error> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([680.0, 820.0])
            .with_min_inner_size([400.0, 300.0])
            .with_title(msg::WINDOW_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        msg::WINDOW_TITLE,
        options,
        Box::new(|cc| Box::new(ScannerWindow::new(cc, orchestrator))),
    )
}

pub struct ScannerWindow {
    orchestrator: Orchestrator<Backend>,
    dialogs: NativeDialogs,
    preview: Option<TextureHandle>,
    typed_name: String,
}

impl ScannerWindow {
    pub fn new(cc: &CreationContext, mut orchestrator: Orchestrator<Backend>) -> Self {
        let ctx = cc.egui_ctx.clone();
        orchestrator.set_waker(Arc::new(move || ctx.request_repaint()));

        Self {
            orchestrator,
            dialogs: NativeDialogs,
            preview: None,
            typed_name: String::new(),
        }
    }

    fn update_preview(&mut self, ctx: &Context) {
        let Some(preview) = self.orchestrator.take_preview() else {
            return;
        };

        let size = [preview.width() as usize, preview.height() as usize];
        let image = ColorImage::from_rgba_unmultiplied(size, preview.as_raw());

        self.preview = Some(ctx.load_texture("preview", image, TextureOptions::default()));
    }

    fn buttons(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            let scan = Button::new(egui::RichText::new(msg::SCAN_BUTTON).size(18.0))
                .min_size(Vec2::new(260.0, 40.0));

            if ui.add_enabled(self.orchestrator.can_scan(), scan).clicked() {
                self.orchestrator.request_scan(&mut self.dialogs);
            }

            ui.add_space(10.0);

            ui.horizontal(|ui| {
                // Keep the pair centered under the scan button.
                ui.add_space((ui.available_width() - 2.0 * 170.0 - 10.0).max(0.0) / 2.0);

                for format in [ExportFormat::Png, ExportFormat::Pdf] {
                    let export =
                        Button::new(msg::EXPORT_BUTTON(format)).min_size(Vec2::new(170.0, 28.0));

                    if ui.add_enabled(self.orchestrator.can_export(), export).clicked() {
                        self.orchestrator.export(format, &mut self.dialogs);
                    }
                }
            });
        });
    }

    fn device_prompt(&mut self, ctx: &Context) {
        let Some(names) = self.orchestrator.device_prompt().map(<[String]>::to_vec) else {
            return;
        };

        let mut answer = None;

        egui::Window::new(msg::CHOOSE_SCANNER_TITLE)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(msg::CHOOSE_SCANNER(&names));

                let edit = ui.text_edit_singleline(&mut self.typed_name);
                edit.request_focus();

                ui.horizontal(|ui| {
                    let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));

                    if ui.button(msg::OK_BUTTON).clicked() || submitted {
                        answer = Some(Some(self.typed_name.clone()));
                    }

                    if ui.button(msg::CANCEL_BUTTON).clicked() {
                        answer = Some(None);
                    }
                });
            });

        if let Some(answer) = answer {
            self.typed_name.clear();
            self.orchestrator
                .choose_device(answer.as_deref(), &mut self.dialogs);
        }
    }
}

impl eframe::App for ScannerWindow {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.orchestrator.poll(&mut self.dialogs);
        self.update_preview(ctx);

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.orchestrator.is_scanning() {
                    ui.spinner();
                }
                ui.label(self.orchestrator.status().to_string());

                if let Some(image) = self.orchestrator.image() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(msg::IMAGE_SIZE(image.width(), image.height()));
                    });
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(10.0);
            self.buttons(ui);
            ui.add_space(10.0);
            ui.separator();

            egui::Frame::canvas(ui.style()).show(ui, |ui| {
                ui.set_min_size(ui.available_size());
                ui.centered_and_justified(|ui| {
                    if let Some(preview) = &self.preview {
                        ui.add(egui::Image::new(preview).shrink_to_fit());
                    }
                });
            });
        });

        self.device_prompt(ctx);
    }
}

/// Native blocking dialogs.
pub struct NativeDialogs;

impl NativeDialogs {
    fn show(&self, level: MessageLevel, title: &str, text: &str) {
        MessageDialog::new()
            .set_level(level)
            .set_title(title)
            .set_description(text)
            .set_buttons(MessageButtons::Ok)
            .show();
    }
}

impl Dialogs for NativeDialogs {
    fn info(&mut self, title: &str, text: &str) {
        self.show(MessageLevel::Info, title, text);
    }

    fn warning(&mut self, title: &str, text: &str) {
        self.show(MessageLevel::Warning, title, text);
    }

    fn error(&mut self, title: &str, text: &str) {
        self.show(MessageLevel::Error, title, text);
    }

    fn ask_save_path(&mut self, format: ExportFormat) -> Option<PathBuf> {
        FileDialog::new()
            .set_title(format.dialog_title())
            .set_file_name(format!("scan.{}", format.extension()))
            .add_filter(format.filter_name(), &[format.extension()])
            .add_filter(msg::ALL_FILES, &["*"])
            .save_file()
    }
}
