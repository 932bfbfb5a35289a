use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::{group_swatch, lab_to_color32};
use crate::data::model::Channel;
use crate::state::AppState;

const ROW_HEIGHT: f32 = 20.0;

// ---------------------------------------------------------------------------
// Results table (central panel)
// ---------------------------------------------------------------------------

/// Group rows with expandable member rows, one page at a time.
pub fn results_table(ui: &mut Ui, state: &mut AppState) {
    if state.records.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data loaded. Open a measurement file to begin  (File → Open…)");
        });
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(format!("Total Groups: {}", state.groups.len())).strong());
        ui.label(RichText::new(format!("Total Reels: {}", state.total_members())).strong());
    });

    pager(ui, state);
    ui.separator();

    let mut toggled = None;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(60.0))
        .column(Column::auto().at_least(70.0))
        .columns(Column::auto().at_least(150.0), Channel::ALL.len())
        .column(Column::exact(30.0))
        .column(Column::remainder())
        .header(ROW_HEIGHT, |mut header| {
            header.col(|ui| {
                ui.strong("Group ID");
            });
            header.col(|ui| {
                ui.strong("Reel Count");
            });
            for channel in Channel::ALL {
                header.col(|ui| {
                    ui.strong(format!("{channel} Range (min-max)"));
                });
            }
            header.col(|ui| {
                ui.strong("Shade");
            });
            header.col(|_| {});
        })
        .body(|mut body| {
            for group in state.page_groups() {
                let expanded = state.expanded.contains(&group.id());
                body.row(ROW_HEIGHT, |mut row| {
                    row.col(|ui| {
                        ui.label(group.id().to_string());
                    });
                    row.col(|ui| {
                        ui.label(group.member_count().to_string());
                    });
                    for channel in Channel::ALL {
                        row.col(|ui| {
                            ui.label(group.summary().get(channel).to_string());
                        });
                    }
                    row.col(|ui| {
                        swatch(ui, group_swatch(group));
                    });
                    row.col(|ui| {
                        let text = if expanded { "Collapse" } else { "Expand" };
                        if ui.small_button(text).clicked() {
                            toggled = Some(group.id());
                        }
                    });
                });

                if !expanded {
                    continue;
                }
                for member in group.members() {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui| {
                            ui.weak(format!("  #{}", member.sequence_id));
                        });
                        row.col(|ui| {
                            ui.label(&member.label);
                        });
                        for channel in Channel::ALL {
                            row.col(|ui| {
                                ui.label(format!("{}", member.channel(channel)));
                            });
                        }
                        row.col(|ui| {
                            swatch(ui, lab_to_color32(member.l, member.a, member.b));
                        });
                        row.col(|_| {});
                    });
                }
            }
        });

    if let Some(id) = toggled {
        state.toggle_expanded(id);
    }
}

fn pager(ui: &mut Ui, state: &mut AppState) {
    let pages = state.page_count();
    if pages <= 1 {
        return;
    }
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(state.page > 0, egui::Button::new("◀ Prev"))
            .clicked()
        {
            state.set_page(state.page - 1);
        }
        ui.label(format!("Page {} of {pages}", state.page + 1));
        if ui
            .add_enabled(state.page + 1 < pages, egui::Button::new("Next ▶"))
            .clicked()
        {
            state.set_page(state.page + 1);
        }
    });
}

fn swatch(ui: &mut Ui, color: egui::Color32) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, 2.0, color);
}
