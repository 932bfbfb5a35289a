use eframe::egui::Ui;
use egui_plot::{Plot, PlotPoints, Points};

use crate::color::generate_palette;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// a*/b* scatter (bottom panel)
// ---------------------------------------------------------------------------

/// Plot every measured reel in the a*/b* plane, one series per group.
pub fn chromaticity_plot(ui: &mut Ui, state: &AppState) {
    if state.groups.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Grouped reels will be plotted here.");
        });
        return;
    }

    let palette = generate_palette(state.groups.len());

    Plot::new("chromaticity_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label("a*")
        .y_axis_label("b*")
        .data_aspect(1.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (group, color) in state.groups.iter().zip(palette) {
                let points: PlotPoints = group
                    .members()
                    .iter()
                    .map(|r| [r.a, r.b])
                    .collect();

                let series = Points::new(points)
                    .name(format!("Group {}", group.id()))
                    .color(color)
                    .radius(3.0);

                plot_ui.points(series);
            }
        });
}
