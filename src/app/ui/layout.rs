use super::*;

impl TrafficDashboardApp {
    /// 탭 선택 바를 렌더링한다.
    fn render_tab_selector(&mut self, ctx: &egui::Context) {
        let palette = *self.theme.palette();
        let decorations = *self.theme.decorations();
        let frame = egui::Frame {
            fill: palette.bg_panel,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.container_rounding),
            inner_margin: egui::Margin::symmetric(12.0, 8.0),
            ..Default::default()
        };
        egui::TopBottomPanel::top("tab_selector")
            .frame(frame)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing.x = 10.0;
                    let tabs = [
                        (AppTab::NetworkEditor, "🛣 네트워크 편집"),
                        (AppTab::Simulation, "🚗 시뮬레이션"),
                    ];
                    for (tab, label) in tabs {
                        let selected = self.active_tab == tab;
                        if ui.selectable_label(selected, label).clicked() {
                            self.active_tab = tab;
                        }
                    }
                });
            });
    }

    fn toolbar_frame(&self) -> egui::Frame {
        let palette = self.theme.palette();
        let decorations = self.theme.decorations();
        egui::Frame {
            fill: palette.bg_toolbar,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.toolbar_rounding),
            inner_margin: decorations.card_inner_margin,
            ..Default::default()
        }
    }

    /// 네트워크 편집 탭 전체 레이아웃을 렌더링한다.
    fn render_editor_view(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("editor_toolbar")
            .frame(self.toolbar_frame())
            .resizable(false)
            .show(ctx, |ui| {
                self.render_editor_toolbar(ui);
            });
        let mut editor_ui = NetworkEditorUi::new(
            &self.theme,
            &mut self.editor_state,
            &mut self.editor_panel,
            &mut self.last_error,
        );
        editor_ui.show(ctx);
    }

    /// 시뮬레이션 탭 전체 레이아웃을 렌더링한다.
    fn render_simulation_view(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("simulation_toolbar")
            .frame(self.toolbar_frame())
            .resizable(false)
            .show(ctx, |ui| {
                self.render_simulation_toolbar(ui);
            });
        let request = SimulationPanel::new(
            &self.theme,
            &mut self.simulation,
            &mut self.simulation_panel,
            &mut self.last_error,
        )
        .show(ctx);
        if let Some(request) = request {
            self.handle_simulation_request(request);
        }
    }
}

impl eframe::App for TrafficDashboardApp {
    /// egui 메인 루프에서 호출되어 UI를 갱신한다.
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        self.drain_events();
        self.render_tab_selector(ctx);
        self.render_status_bar(ctx);
        match self.active_tab {
            AppTab::NetworkEditor => self.render_editor_view(ctx),
            AppTab::Simulation => self.render_simulation_view(ctx),
        }
        if self.needs_repaint() {
            ctx.request_repaint_after(std::time::Duration::from_millis(30));
        }
    }
}
