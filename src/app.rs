use std::time::Duration;

use eframe::egui;

use crate::data::tolerance::ToleranceSet;
use crate::state::AppState;
use crate::ui::{panels, plot, table};

/// eframe storage key for the persisted tolerance set.
const TOLERANCES_KEY: &str = "tolerances";

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ShadeGrouperApp {
    pub state: AppState,
}

impl ShadeGrouperApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let tolerances = cc
            .storage
            .map(restore_tolerances)
            .unwrap_or_default();
        Self {
            state: AppState::with_tolerances(tolerances),
        }
    }
}

/// Read saved tolerances. Missing or invalid settings fall back to defaults.
fn restore_tolerances(storage: &dyn eframe::Storage) -> ToleranceSet {
    let Some(text) = storage.get_string(TOLERANCES_KEY) else {
        return ToleranceSet::default();
    };
    match serde_json::from_str(&text) {
        Ok(tolerances) => {
            log::info!("Restored tolerances {tolerances:?}");
            tolerances
        }
        Err(e) => {
            log::warn!("Ignoring saved tolerances ({e}); using defaults");
            ToleranceSet::default()
        }
    }
}

impl eframe::App for ShadeGrouperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_worker();
        if self.state.is_grouping() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: tolerances ----
        egui::SidePanel::left("tolerance_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: a*/b* scatter ----
        egui::TopBottomPanel::bottom("plot_panel")
            .default_height(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                plot::chromaticity_plot(ui, &self.state);
            });

        // ---- Central panel: results table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::results_table(ui, &mut self.state);
        });
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match serde_json::to_string(&self.state.tolerances) {
            Ok(text) => storage.set_string(TOLERANCES_KEY, text),
            Err(e) => log::error!("Failed to save tolerances: {e}"),
        }
    }
}
