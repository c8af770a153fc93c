use super::*;

impl TrafficDashboardApp {
    /// 하단 상태 표시줄.
    pub(super) fn render_status_bar(&mut self, ctx: &egui::Context) {
        let palette = *self.theme.palette();
        let decorations = *self.theme.decorations();
        let frame = egui::Frame {
            fill: palette.bg_panel,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.card_rounding),
            inner_margin: egui::Margin::symmetric(16.0, 6.0),
            ..Default::default()
        };
        egui::TopBottomPanel::bottom("status_bar")
            .frame(frame)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let status = self.simulation.status();
                    ui.label(
                        RichText::new(format!("● {}", status.label()))
                            .color(self.theme.status_color(status))
                            .strong(),
                    );
                    ui.separator();
                    let graph = self.editor_state.graph();
                    ui.label(
                        RichText::new(format!(
                            "노드 {} · 도로 {} · 선택 {}",
                            graph.node_count(),
                            graph.edge_count(),
                            self.editor_state.selection().len()
                        ))
                        .color(palette.fg_text_secondary),
                    );
                    ui.separator();
                    let engine = if self.simulation.engine_available() {
                        RichText::new("SUMO 사용 가능").color(palette.accent_ok)
                    } else {
                        RichText::new("SUMO 없음").color(palette.accent_warning)
                    };
                    ui.label(engine);
                    if self.simulation.status().is_active() {
                        ui.separator();
                        ui.label(
                            RichText::new(format!("진행률 {:.0}%", self.simulation.progress() * 100.0))
                                .color(palette.fg_text_secondary),
                        );
                    }
                });
            });
    }
}
