use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::model::Channel;
use crate::data::tolerance::{ToleranceSet, MAX_TOLERANCE, MIN_TOLERANCE};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – tolerance controls
// ---------------------------------------------------------------------------

/// Render the left tolerance panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Tolerance Controls");
    ui.separator();

    let defaults = ToleranceSet::default();
    for channel in Channel::ALL {
        ui.strong(format!("Δ{channel} Tolerance"));
        ui.horizontal(|ui: &mut Ui| {
            // No clamping here: out-of-range input is handed to the state,
            // which rejects it and keeps the old value.
            let mut value = state.tolerances.get(channel);
            let response = ui.add(
                egui::DragValue::new(&mut value)
                    .speed(0.005)
                    .fixed_decimals(2),
            );
            if response.changed() {
                state.set_tolerance(channel, value);
            }

            ui.label(
                RichText::new(format!("Current: {:.2}", state.tolerances.get(channel)))
                    .color(Color32::GRAY),
            );

            let at_default = state.tolerances.get(channel) == defaults.get(channel);
            if ui
                .add_enabled(!at_default, egui::Button::new("Reset").small())
                .clicked()
            {
                state.reset_tolerance(channel);
            }
        });
        ui.add_space(6.0);
    }

    ui.label(
        RichText::new(format!("Allowed range: {MIN_TOLERANCE:.2} – {MAX_TOLERANCE:.2}"))
            .small()
            .color(Color32::GRAY),
    );
    ui.separator();

    match &state.file_name {
        Some(name) => {
            ui.label(format!("File: {name}"));
        }
        None => {
            ui.label("No file loaded.");
        }
    }

    if state.records.is_some() && ui.button("Clear Data").clicked() {
        log::info!("Clearing loaded data");
        state.clear();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            let can_export = !state.groups.is_empty() && !state.is_grouping();
            if ui
                .add_enabled(can_export, egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_csv_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(can_export, egui::Button::new("Export JSON…"))
                .clicked()
            {
                export_json_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(state.records.is_some(), egui::Button::new("Clear data"))
                .clicked()
            {
                state.clear();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(records) = &state.records {
            ui.label(format!(
                "{} records loaded, {} groups",
                records.len(),
                state.groups.len()
            ));
        }

        if state.loading {
            ui.spinner();
            ui.label("Processing file...");
        } else if state.is_grouping() {
            ui.spinner();
            ui.label("Grouping colors...");
        }

        if let Some(msg) = &state.notice {
            ui.label(RichText::new(msg).color(Color32::LIGHT_BLUE));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open colour measurements")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        match crate::data::loader::load_file(&path) {
            Ok(records) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned());
                state.set_records(records, name);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}

fn export_csv_dialog(state: &mut AppState) {
    if let Some(dir) = rfd::FileDialog::new()
        .set_title("Export grouped data (CSV)")
        .pick_folder()
    {
        state.export_csv(&dir);
    }
}

fn export_json_dialog(state: &mut AppState) {
    let stem = crate::data::export::default_stem();
    if let Some(path) = rfd::FileDialog::new()
        .set_title("Export grouped data (JSON)")
        .set_file_name(format!("{stem}.json"))
        .add_filter("JSON", &["json"])
        .save_file()
    {
        state.export_json(&path);
    }
}
