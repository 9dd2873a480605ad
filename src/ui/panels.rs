use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use darkpulse::data::loader::Source;
use darkpulse::data::model::Category;

use crate::state::{AppState, Flag};

// ---------------------------------------------------------------------------
// Left side panel – global filters
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Global Filters");
    ui.separator();

    let Some(table) = state.table.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            date_pickers(ui, state);
            ui.separator();

            // ---- Categorical pickers (collapsible) ----
            for category in Category::ALL {
                let values: Vec<String> =
                    table.unique_values(category).map(str::to_string).collect();
                let n_selected = state.criteria.allow_set(category).len();
                let header_text = if n_selected == 0 {
                    format!("{}  (all)", category.label())
                } else {
                    format!("{}  ({n_selected}/{})", category.label(), values.len())
                };

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(category.label())
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        if ui.small_button("Clear").clicked() {
                            state.clear_category(category);
                        }
                        for value in &values {
                            let mut checked = state.criteria.allow_set(category).contains(value);
                            if ui.checkbox(&mut checked, value.as_str()).changed() {
                                state.toggle_category(category, value);
                            }
                        }
                    });
            }
            ui.separator();

            casualty_slider(ui, state, table.casualty_ceiling());
            ui.separator();

            for flag in [Flag::Success, Flag::Suicide] {
                flag_picker(ui, state, flag);
            }
            ui.separator();

            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

fn date_pickers(ui: &mut Ui, state: &mut AppState) {
    let today = chrono::Local::now().date_naive();
    let mut changed = false;

    for (label, id) in [("Start Date", "start_date"), ("End Date", "end_date")] {
        let bound = if id == "start_date" {
            &mut state.criteria.start_date
        } else {
            &mut state.criteria.end_date
        };
        let mut date: NaiveDate = bound.unwrap_or(today);
        ui.horizontal(|ui: &mut Ui| {
            ui.label(label);
            if ui.add(DatePickerButton::new(&mut date).id_salt(id)).changed() {
                *bound = Some(date);
                changed = true;
            }
        });
    }

    if changed {
        state.refilter();
    }
}

fn casualty_slider(ui: &mut Ui, state: &mut AppState, ceiling: f64) {
    ui.strong("Casualty Range");
    let (mut lo, mut hi) = state
        .criteria
        .casualties
        .clone()
        .map(|r| r.into_inner())
        .unwrap_or((0.0, ceiling));

    let max = ceiling.max(1.0);
    let lo_changed = ui
        .add(egui::Slider::new(&mut lo, 0.0..=max).text("min").integer())
        .changed();
    let hi_changed = ui
        .add(egui::Slider::new(&mut hi, 0.0..=max).text("max").integer())
        .changed();

    if lo_changed || hi_changed {
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }
        state.criteria.casualties = Some(lo..=hi);
        state.refilter();
    }
}

fn flag_picker(ui: &mut Ui, state: &mut AppState, flag: Flag) {
    ui.strong(flag.label());
    ui.horizontal(|ui: &mut Ui| {
        for (value, text) in [(1, "Yes"), (0, "No")] {
            let selected = match flag {
                Flag::Success => &state.criteria.success,
                Flag::Suicide => &state.criteria.suicide,
            };
            let mut checked = selected.is_empty() || selected.contains(&value);
            if ui.checkbox(&mut checked, text).changed() {
                state.toggle_flag(flag, value);
            }
        }
    });
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
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} events loaded, {} visible",
                table.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open incident data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.open_source(Source::Local(path));
    }
}
