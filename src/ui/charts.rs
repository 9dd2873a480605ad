use std::collections::BTreeMap;
use std::f64::consts::TAU;

use eframe::egui::{self, Align2, Color32, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoint, PlotPoints, Points,
    Polygon, Text,
};

use darkpulse::data::aggregate::{ColorMode, Dashboard, GeoMarker, GeoPoint, Granularity, Summary};

use crate::color::{CategoryColors, heat_color};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 320.0;
const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the KPI row and every chart in the central panel.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if state.dashboard.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Loading dataset…  (File → Open… to pick another)");
        });
        return;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("DarkPulse: Where hidden patterns of terror come to light");
            if let Some(dash) = &state.dashboard {
                kpis(ui, &dash.summary);
            }
            ui.separator();

            // Selectors may recompute the projections, so the dashboard is
            // borrowed again after each one.
            ui.heading("Attacks Over Time");
            let mut granularity = state.granularity;
            egui::ComboBox::from_id_salt("granularity")
                .selected_text(granularity.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for g in Granularity::ALL {
                        ui.selectable_value(&mut granularity, g, g.label());
                    }
                });
            state.set_granularity(granularity);
            if let Some(dash) = &state.dashboard {
                trend_chart(ui, dash, state.granularity);
            }
            ui.separator();

            ui.heading("Global Distribution of Attacks");
            let mut mode = state.color_mode;
            egui::ComboBox::from_id_salt("color_by")
                .selected_text(format!("Color by: {}", mode.label()))
                .show_ui(ui, |ui: &mut Ui| {
                    for m in ColorMode::ALL {
                        ui.selectable_value(&mut mode, m, m.label());
                    }
                });
            state.set_color_mode(mode);

            let Some(dash) = &state.dashboard else {
                return;
            };
            let colors = state.attack_colors.as_ref();
            geo_chart(ui, &dash.geo, colors);
            ui.separator();

            ui.heading("Most Active Groups");
            groups_chart(ui, &dash.top_groups);
            ui.separator();

            ui.heading("Attack Types vs Fatalities");
            box_chart(ui, dash, colors);
            ui.separator();

            ui.heading("Target Types vs Weapon Types");
            heatmap(ui, dash);
            ui.separator();

            ui.heading("Seasonal Attack Pattern");
            seasonal_chart(ui, dash);
        });
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn kpis(ui: &mut Ui, summary: &Summary) {
    let metrics = [
        ("Total Attacks", thousands(summary.attacks as u64)),
        ("Total Fatalities", thousands(summary.fatalities as u64)),
        ("Total Wounded", thousands(summary.wounded as u64)),
        ("Deadliest Region", summary.deadliest_region.clone()),
    ];
    ui.columns(metrics.len(), |cols| {
        for (col, (label, value)) in cols.iter_mut().zip(metrics) {
            col.label(label);
            col.label(RichText::new(value).size(22.0).strong());
        }
    });
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn trend_chart(ui: &mut Ui, dash: &Dashboard, granularity: Granularity) {
    let points: PlotPoints = dash
        .trend
        .iter()
        .map(|(bucket, count)| [bucket.axis_value(), *count as f64])
        .collect();

    Plot::new("trend_plot")
        .height(CHART_HEIGHT)
        .x_axis_label(granularity.label())
        .y_axis_label("Attacks")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name("attacks").width(2.0));
        });
}

fn geo_chart(ui: &mut Ui, geo: &[GeoPoint], colors: Option<&CategoryColors>) {
    let max_casualty = geo
        .iter()
        .filter_map(|p| match p.marker {
            GeoMarker::Casualty(c) => Some(c),
            GeoMarker::AttackType(_) => None,
        })
        .fold(0.0, f64::max);

    // One series per legend entry or marker size class.
    let mut series: BTreeMap<String, (Color32, f32, Vec<[f64; 2]>)> = BTreeMap::new();
    for p in geo {
        let xy = [p.longitude, p.latitude];
        match &p.marker {
            GeoMarker::AttackType(kind) => {
                let label = kind.clone().unwrap_or_else(|| "Unknown".to_string());
                let color = colors.map_or(Color32::LIGHT_BLUE, |c| c.color_for(kind.as_deref()));
                series.entry(label).or_insert((color, 2.5, Vec::new())).2.push(xy);
            }
            GeoMarker::Casualty(c) => {
                let class = if max_casualty > 0.0 {
                    ((c / max_casualty).sqrt() * 5.0).round() as u32
                } else {
                    0
                };
                let radius = 2.0 + 3.0 * class as f32;
                series
                    .entry(format!("size {class}"))
                    .or_insert((Color32::from_rgb(220, 60, 40), radius, Vec::new()))
                    .2
                    .push(xy);
            }
        }
    }

    let hovered = Plot::new("geo_plot")
        .height(CHART_HEIGHT * 1.4)
        .legend(Legend::default())
        .data_aspect(1.0)
        .include_x(-180.0)
        .include_x(180.0)
        .include_y(-90.0)
        .include_y(90.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .show(ui, |plot_ui| {
            for (name, (color, radius, pts)) in series {
                let mut item = Points::new(pts).color(color).radius(radius);
                if !name.starts_with("size ") {
                    item = item.name(name);
                }
                plot_ui.points(item);
            }
            plot_ui.pointer_coordinate().and_then(|at| nearest(geo, at))
        })
        .inner;

    if let Some(p) = hovered {
        ui.label(hover_text(p));
    }
}

/// The point closest to `at`, if within a few degrees.
fn nearest(geo: &[GeoPoint], at: PlotPoint) -> Option<&GeoPoint> {
    geo.iter()
        .map(|p| {
            let dx = p.longitude - at.x;
            let dy = p.latitude - at.y;
            (p, dx * dx + dy * dy)
        })
        .filter(|(_, d2)| *d2 < 9.0)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(p, _)| p)
}

fn hover_text(p: &GeoPoint) -> String {
    let h = &p.hover;
    let mut parts = vec![h.country.clone().unwrap_or_else(|| "?".to_string())];
    if let Some(group) = &h.group {
        parts.push(format!("group: {group}"));
    }
    match &p.marker {
        GeoMarker::AttackType(kind) => {
            parts.push(format!("type: {}", kind.as_deref().unwrap_or("?")));
        }
        GeoMarker::Casualty(c) => {
            parts.push(format!("casualties: {c}"));
            if let Some(a) = &h.attack_type {
                parts.push(format!("type: {a}"));
            }
            if let Some(t) = &h.target_type {
                parts.push(format!("target: {t}"));
            }
        }
    }
    parts.push(format!("killed: {}  wounded: {}", h.kill, h.wound));
    parts.join("  |  ")
}

fn groups_chart(ui: &mut Ui, top: &[(String, usize)]) {
    let n = top.len();
    // Rank 1 is drawn at the top.
    let bars: Vec<Bar> = top
        .iter()
        .enumerate()
        .map(|(i, (name, count))| Bar::new((n - i) as f64, *count as f64).name(name))
        .collect();

    Plot::new("groups_plot")
        .height(CHART_HEIGHT * 1.5)
        .x_axis_label("Attacks")
        .show_y(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().color(Color32::from_rgb(200, 80, 60)));
            for (i, (name, count)) in top.iter().enumerate() {
                plot_ui.text(
                    Text::new(PlotPoint::new(*count as f64, (n - i) as f64), format!("  {name}"))
                        .anchor(Align2::LEFT_CENTER),
                );
            }
        });
}

fn box_chart(ui: &mut Ui, dash: &Dashboard, colors: Option<&CategoryColors>) {
    Plot::new("box_plot")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .y_axis_label("Fatalities")
        .show_x(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, b) in dash.boxes.iter().enumerate() {
                let color = colors.map_or(Color32::LIGHT_BLUE, |c| c.color_for(Some(b.category.as_str())));
                let elem = BoxElem::new(i as f64, BoxSpread::new(b.min, b.q1, b.median, b.q3, b.max))
                    .name(&b.category)
                    .box_width(0.5);
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&b.category).color(color));

                let pts: Vec<[f64; 2]> = dash
                    .distribution
                    .iter()
                    .filter(|(cat, _)| *cat == b.category)
                    .map(|(_, kills)| [i as f64, *kills])
                    .collect();
                plot_ui.points(Points::new(pts).color(color).radius(1.5));
            }
        });
}

fn heatmap(ui: &mut Ui, dash: &Dashboard) {
    let tab = &dash.cross_tab;
    if tab.row_labels.is_empty() {
        ui.label("No events with both target and weapon type.");
        return;
    }
    let max = tab.max_count().max(1) as f32;
    let n_rows = tab.row_labels.len() as f64;

    Plot::new("heatmap_plot")
        .height(CHART_HEIGHT * 1.3)
        .show_axes([false, false])
        .show_grid(false)
        .allow_scroll(false)
        .data_aspect(1.0)
        .show(ui, |plot_ui| {
            for (r, row) in tab.counts.iter().enumerate() {
                // First row label at the top.
                let y = n_rows - 1.0 - r as f64;
                for (c, count) in row.iter().enumerate() {
                    let x = c as f64;
                    let cell = vec![[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0]];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(cell))
                            .fill_color(heat_color(*count as f32 / max))
                            .stroke(Stroke::new(0.5, Color32::DARK_GRAY)),
                    );
                    plot_ui.text(Text::new(PlotPoint::new(x + 0.5, y + 0.5), count.to_string()));
                }
                plot_ui.text(
                    Text::new(PlotPoint::new(-0.1, y + 0.5), tab.row_labels[r].as_str())
                        .anchor(Align2::RIGHT_CENTER),
                );
            }
            for (c, label) in tab.col_labels.iter().enumerate() {
                plot_ui.text(
                    Text::new(PlotPoint::new(c as f64 + 0.5, n_rows + 0.1), label.as_str())
                        .anchor(Align2::CENTER_BOTTOM),
                );
            }
        });
}

fn seasonal_chart(ui: &mut Ui, dash: &Dashboard) {
    if dash.summary.attacks == 0 {
        ui.label("No events match the current filters.");
        return;
    }
    let radius_max = dash.seasonal.iter().copied().max().unwrap_or(0).max(1) as f64;

    // Clockwise from twelve o'clock, January first.
    let polar = |month: usize, r: f64| {
        let theta = TAU * month as f64 / 12.0;
        [r * theta.sin(), r * theta.cos()]
    };
    let mut outline: Vec<[f64; 2]> = dash
        .seasonal
        .iter()
        .enumerate()
        .map(|(m, count)| polar(m, *count as f64))
        .collect();
    outline.push(outline[0]);

    Plot::new("seasonal_plot")
        .height(CHART_HEIGHT * 1.2)
        .data_aspect(1.0)
        .show_axes([false, false])
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let ring: PlotPoints = (0..=120)
                .map(|i| {
                    let theta = TAU * i as f64 / 120.0;
                    [radius_max * theta.sin(), radius_max * theta.cos()]
                })
                .collect();
            plot_ui.line(Line::new(ring).color(Color32::GRAY).width(0.5));
            plot_ui.line(Line::new(PlotPoints::from(outline)).name("attacks").width(2.0));
            for (m, name) in MONTH_NAMES.iter().enumerate() {
                let [x, y] = polar(m, radius_max * 1.12);
                plot_ui.text(Text::new(PlotPoint::new(x, y), *name));
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(3692), "3,692");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
