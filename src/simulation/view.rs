use super::controller::SimulationController;
use super::overlay::ZOOM_PERCENT_RANGE;
use super::{
    DURATION_RANGE, SPEED_FACTOR_RANGE, STEP_LENGTH_RANGE, SimulationStatus, VEHICLE_COUNT_RANGE,
};
use crate::editor::paint_scene;
use crate::network::DepartureDistribution;
use crate::theme::Theme;
use eframe::egui::{self, RichText};
use std::collections::HashMap;

/// 패널이 앱에 요청하는 동작. 시작에는 네트워크와 런타임이 필요해 앱이 처리한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationRequest {
    Start,
    Stop,
}

/// 프레임 사이에 유지하는 패널 입력 상태.
#[derive(Debug, Default)]
pub struct SimulationPanelState {
    /// 신호등별 편집 중인 상태 문자열.
    light_drafts: HashMap<String, String>,
}

/// 시뮬레이션 탭 화면.
pub struct SimulationPanel<'a> {
    theme: &'a Theme,
    sim: &'a mut SimulationController,
    panel: &'a mut SimulationPanelState,
    last_error: &'a mut Option<String>,
}

impl<'a> SimulationPanel<'a> {
    pub fn new(
        theme: &'a Theme,
        sim: &'a mut SimulationController,
        panel: &'a mut SimulationPanelState,
        last_error: &'a mut Option<String>,
    ) -> Self {
        Self {
            theme,
            sim,
            panel,
            last_error,
        }
    }

    /// 제어/상태/캔버스 패널을 그리고 시작·중지 요청을 돌려준다.
    pub fn show(&mut self, ctx: &egui::Context) -> Option<SimulationRequest> {
        let palette = *self.theme.palette();
        let decorations = *self.theme.decorations();
        let side_frame = egui::Frame {
            fill: palette.bg_sidebar,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.container_rounding),
            inner_margin: decorations.card_inner_margin,
            ..Default::default()
        };
        let mut request = None;
        egui::SidePanel::left("simulation_controls")
            .frame(side_frame)
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    request = self.render_controls(ui);
                });
            });
        egui::SidePanel::right("simulation_status")
            .frame(side_frame)
            .resizable(false)
            .default_width(280.0)
            .show(ctx, |ui| {
                self.render_status(ui);
            });
        let canvas_frame = egui::Frame {
            fill: palette.bg_canvas,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.container_rounding),
            inner_margin: egui::Margin::same(0.0),
            ..Default::default()
        };
        egui::CentralPanel::default()
            .frame(canvas_frame)
            .show(ctx, |ui| {
                self.render_canvas(ui);
            });
        request
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) -> Option<SimulationRequest> {
        let palette = *self.theme.palette();
        let mut request = None;
        ui.heading("🚦 시뮬레이션 설정");
        ui.separator();
        if !self.sim.engine_available() {
            ui.colored_label(
                palette.accent_warning,
                "SUMO를 찾지 못했습니다. SUMO_HOME을 설정하면 시뮬레이션을 쓸 수 있습니다.",
            );
            ui.add_space(6.0);
        }

        let active = self.sim.status().is_active();
        ui.add_enabled_ui(!active, |ui| {
            let settings = &mut self.sim.settings;
            ui.add(egui::Slider::new(&mut settings.vehicle_count, VEHICLE_COUNT_RANGE).text("차량 수"));
            ui.add(
                egui::Slider::new(&mut settings.speed_factor, SPEED_FACTOR_RANGE)
                    .text("배속")
                    .suffix("x"),
            );
            ui.add(
                egui::Slider::new(&mut settings.duration, DURATION_RANGE)
                    .text("길이")
                    .suffix("s"),
            );
            ui.add(
                egui::Slider::new(&mut settings.step_length, STEP_LENGTH_RANGE)
                    .text("스텝")
                    .suffix("s"),
            );
            egui::ComboBox::from_label("출발 분포")
                .selected_text(settings.distribution.label())
                .show_ui(ui, |ui| {
                    for distribution in DepartureDistribution::ALL {
                        ui.selectable_value(
                            &mut settings.distribution,
                            distribution,
                            distribution.label(),
                        );
                    }
                });
            ui.checkbox(&mut settings.collect_data, "통계 출력 저장");
            ui.horizontal(|ui| {
                ui.label("TraCI 포트");
                ui.add(egui::DragValue::new(&mut settings.port).clamp_range(1024..=65535));
            });
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let can_start = self.sim.engine_available() && !active;
            if ui
                .add_enabled(can_start, egui::Button::new("▶ 시작"))
                .clicked()
            {
                request = Some(SimulationRequest::Start);
            }
            if ui.add_enabled(active, egui::Button::new("⏹ 중지")).clicked() {
                request = Some(SimulationRequest::Stop);
            }
        });

        ui.separator();
        ui.label("표시");
        let mut show_ids = self.sim.overlay.show_ids();
        if ui.checkbox(&mut show_ids, "차량 ID 표시").changed() {
            self.sim.overlay.set_show_ids(show_ids);
        }
        let mut by_speed = self.sim.overlay.color_by_speed();
        if ui.checkbox(&mut by_speed, "속도별 색상").changed() {
            self.sim.overlay.set_color_by_speed(by_speed);
        }
        let mut zoom = self.sim.overlay.zoom_percent();
        if ui
            .add(
                egui::Slider::new(&mut zoom, ZOOM_PERCENT_RANGE)
                    .text("배율")
                    .suffix("%"),
            )
            .changed()
        {
            self.sim.overlay.set_zoom_percent(zoom);
        }
        if ui.button("⛶ 보기 초기화").clicked() {
            let viewport = self.sim.viewport;
            self.sim.overlay.reset_view(viewport);
        }
        request
    }

    fn render_status(&mut self, ui: &mut egui::Ui) {
        let palette = *self.theme.palette();
        let status = self.sim.status().clone();
        ui.heading("📊 상태");
        ui.label(
            RichText::new(status.label())
                .color(self.theme.status_color(&status))
                .strong(),
        );
        ui.add_space(6.0);
        for line in self.sim.overlay.stats().lines() {
            ui.label(RichText::new(line).color(palette.fg_text_primary));
        }
        let ratio = self.sim.progress();
        ui.add(
            egui::ProgressBar::new(ratio)
                .fill(palette.accent_primary)
                .text(format!("{:.0}%", ratio * 100.0)),
        );
        if let Some(dir) = self.sim.work_dir() {
            ui.small(format!("작업 폴더 · {}", dir.display()));
        }

        ui.separator();
        ui.label("신호등");
        if self.sim.traffic_lights().is_empty() {
            ui.label(RichText::new("신호등 없음").color(palette.fg_text_secondary).italics());
        }
        let lights = self.sim.traffic_lights().to_vec();
        let running = matches!(status, SimulationStatus::Running);
        for light in lights {
            ui.horizontal(|ui| {
                ui.label(RichText::new(&light.id).strong());
                ui.label(RichText::new(&light.state).monospace());
            });
            let draft = self
                .panel
                .light_drafts
                .entry(light.id.clone())
                .or_insert_with(|| light.state.clone());
            let mut send = false;
            ui.horizontal(|ui| {
                let response = ui.add(egui::TextEdit::singleline(draft).desired_width(120.0));
                send = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                send |= ui.add_enabled(running, egui::Button::new("적용")).clicked();
            });
            if send && running {
                let state = draft.trim().to_string();
                if let Err(err) = self.sim.set_traffic_light(&light.id, &state) {
                    *self.last_error = Some(err.to_string());
                }
            }
        }

        ui.separator();
        egui::CollapsingHeader::new("📝 엔진 로그")
            .default_open(false)
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .max_height(240.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in self.sim.logs() {
                            ui.label(RichText::new(line).color(palette.fg_text_secondary).small());
                        }
                    });
            });
    }

    fn render_canvas(&mut self, ui: &mut egui::Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::drag());
        self.sim.viewport = rect.size();
        if response.dragged() {
            self.sim.overlay.view.offset += response.drag_delta();
        }
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, self.theme.palette().bg_canvas);
        paint_scene(&painter, self.sim.overlay.scene(), &self.sim.overlay.view, rect.center());
    }
}
