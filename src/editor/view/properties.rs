use super::*;

impl<'a> NetworkEditorUi<'a> {
    /// 선택된 노드/도로의 속성 편집 패널을 렌더링한다.
    pub(super) fn render_properties(&mut self, ui: &mut egui::Ui) {
        ui.heading("⚙ 속성");
        ui.separator();
        let selection = self.state.selection();
        match selection.as_slice() {
            [] => {
                self.panel.rename_target = None;
                ui.label("노드나 도로를 클릭해 선택하세요.");
            }
            [only] => {
                let only = *only;
                self.sync_rename_buffer(only);
                egui::ScrollArea::vertical()
                    .auto_shrink([false; 2])
                    .show(ui, |ui| match only {
                        Selection::Node(key) => self.render_node_properties(ui, key),
                        Selection::Edge(key) => self.render_edge_properties(ui, key),
                    });
            }
            many => {
                self.panel.rename_target = None;
                ui.label(format!("{}개 항목이 선택되었습니다.", many.len()));
                if ui.button("🗑 선택 항목 삭제").clicked() {
                    self.state.delete_selected();
                }
            }
        }
    }

    /// 선택이 바뀌었으면 ID 입력란을 현재 ID로 채운다.
    fn sync_rename_buffer(&mut self, selection: Selection) {
        if self.panel.rename_target == Some(selection) {
            return;
        }
        let graph = self.state.graph();
        let id = match selection {
            Selection::Node(key) => graph.node(key).map(|n| n.id.clone()),
            Selection::Edge(key) => graph.edge(key).map(|e| e.id.clone()),
        };
        self.panel.rename_buffer = id.unwrap_or_default();
        self.panel.rename_target = Some(selection);
    }

    /// ID 입력란과 적용 버튼. 적용을 눌렀으면 `true`.
    fn render_rename_row(&mut self, ui: &mut egui::Ui) -> bool {
        let mut apply = false;
        ui.label("ID");
        ui.horizontal(|ui| {
            let response = ui.text_edit_singleline(&mut self.panel.rename_buffer);
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                apply = true;
            }
            if ui.button("변경").clicked() {
                apply = true;
            }
        });
        apply
    }

    fn render_node_properties(&mut self, ui: &mut egui::Ui, key: NodeKey) {
        let Some(node) = self.state.graph().node(key) else {
            return;
        };
        let mut position = node.position;
        let degree = node.edges.len();

        ui.label(egui::RichText::new("🔵 교차로").strong());
        if self.render_rename_row(ui) {
            let new_id = self.panel.rename_buffer.clone();
            match self.state.rename_node(key, &new_id) {
                Ok(()) => self.panel.rename_target = None,
                Err(err) => self.report_error(err),
            }
        }
        ui.add_space(6.0);
        ui.label("위치");
        let mut moved = false;
        ui.horizontal(|ui| {
            ui.label("x");
            moved |= ui.add(egui::DragValue::new(&mut position.x).speed(1.0)).changed();
            ui.label("y");
            moved |= ui.add(egui::DragValue::new(&mut position.y).speed(1.0)).changed();
        });
        if moved {
            self.state.move_node(key, position);
        }
        ui.label(format!("연결된 도로 {degree}개"));
        ui.add_space(10.0);
        if ui.button("🗑 노드 삭제").clicked() {
            self.state.delete_node(key);
        }
    }

    fn render_edge_properties(&mut self, ui: &mut egui::Ui, key: EdgeKey) {
        let graph = self.state.graph();
        let Some(edge) = graph.edge(key) else {
            return;
        };
        let endpoint = |k| graph.node(k).map(|n| n.id.clone()).unwrap_or_default();
        let from = endpoint(edge.source);
        let to = endpoint(edge.target);
        let mut lanes = edge.lanes;
        let mut speed = edge.speed;
        let class = edge.road_class();
        let scene = *self.state.palette();

        ui.label(egui::RichText::new("🛣 도로").strong());
        if self.render_rename_row(ui) {
            let new_id = self.panel.rename_buffer.clone();
            match self.state.rename_edge(key, &new_id) {
                Ok(()) => self.panel.rename_target = None,
                Err(err) => self.report_error(err),
            }
        }
        ui.add_space(6.0);
        ui.label(format!("{from} → {to}"));
        ui.colored_label(class.color(&scene), class.label());
        ui.add_space(6.0);

        let mut changed = ui
            .add(egui::Slider::new(&mut lanes, LANE_RANGE).text("차로 수"))
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut speed, SPEED_RANGE)
                    .text("제한 속도 (m/s)")
                    .fixed_decimals(2),
            )
            .changed();
        ui.small(format!("≈ {:.0} km/h", speed * 3.6));
        if changed {
            if let Err(err) = self.state.set_edge_properties(key, lanes, speed) {
                self.report_error(err);
            }
        }
        ui.add_space(10.0);
        if ui.button("🗑 도로 삭제").clicked() {
            self.state.delete_edge(key);
        }
    }
}
