use super::*;

impl<'a> NetworkEditorUi<'a> {
    /// 그리기 도구와 보기 조작 버튼을 렌더링한다.
    pub(super) fn render_palette(&mut self, ui: &mut egui::Ui) {
        let palette = *self.theme().palette();
        ui.heading("🛣 네트워크 도구");
        ui.separator();

        let drawing = self.state.is_drawing();
        let label = if drawing {
            "✏ 그리기 모드 종료"
        } else {
            "✏ 그리기 모드"
        };
        let fill = if drawing {
            palette.accent_draw
        } else {
            palette.bg_panel
        };
        if ui
            .add_sized([ui.available_width(), 28.0], egui::Button::new(label).fill(fill))
            .clicked()
        {
            self.state.toggle_drawing_mode();
        }
        if drawing {
            let hint = match self.state.pending_start() {
                Some(_) => "다음 노드를 클릭하면 도로가 이어집니다. 우클릭/Esc로 끊기.",
                None => "빈 곳을 클릭해 노드를 만들거나 기존 노드를 클릭하세요.",
            };
            ui.colored_label(palette.accent_draw, hint);
        }
        ui.add_space(8.0);

        let selected = self.state.selection().len();
        if ui
            .add_enabled(selected > 0, egui::Button::new(format!("🗑 선택 삭제 ({selected})")))
            .clicked()
        {
            self.state.delete_selected();
        }
        if ui.button("🧹 전체 지우기").clicked() {
            self.state.clear();
        }

        ui.add_space(8.0);
        ui.label("보기");
        ui.horizontal(|ui| {
            if ui.button("➕").clicked() {
                self.state.zoom_in(egui::Vec2::ZERO);
            }
            if ui.button("➖").clicked() {
                self.state.zoom_out(egui::Vec2::ZERO);
            }
            if ui.button("⛶ 화면 맞춤").clicked() {
                let size = self.panel.canvas_size;
                self.state.fit_view(size);
            }
        });
        ui.small(format!("배율 {:.0}%", self.state.view.zoom * 100.0));

        ui.add_space(8.0);
        let mut threshold = self.state.snap_threshold();
        if ui
            .add(egui::Slider::new(&mut threshold, 5.0..=60.0).text("스냅 거리"))
            .changed()
        {
            self.state.set_snap_threshold(threshold);
        }

        ui.separator();
        let graph = self.state.graph();
        ui.label(format!("노드 {} · 도로 {}", graph.node_count(), graph.edge_count()));
        ui.add_space(6.0);
        ui.label("도로 등급");
        let scene = *self.state.palette();
        for class in [RoadClass::Highway, RoadClass::MainRoad, RoadClass::Local] {
            ui.horizontal(|ui| {
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(24.0, 10.0), egui::Sense::hover());
                ui.painter().line_segment(
                    [rect.left_center(), rect.right_center()],
                    egui::Stroke::new(3.0, class.color(&scene)),
                );
                ui.label(class.label());
            });
        }

        ui.add_space(6.0);
        ui.collapsing("단축키", |ui| {
            ui.small("Delete: 선택 삭제");
            ui.small("Esc: 그리기 취소");
            ui.small("+ / -: 확대/축소");
            ui.small("Shift+클릭: 다중 선택");
        });
    }
}
