use super::*;

impl TrafficDashboardApp {
    /// 네트워크 편집 탭 상단 툴바를 그린다.
    pub(super) fn render_editor_toolbar(&mut self, ui: &mut egui::Ui) {
        let palette = *self.theme.palette();
        let decorations = *self.theme.decorations();
        ui.vertical(|ui| {
            solid_section_header(ui, &self.theme, "🛣", "Network Editor");
            ui.add_space(4.0);
            let dirty = if self.editor_state.is_dirty() {
                " (수정됨)"
            } else {
                ""
            };
            let title = match &self.editor_state.current_file {
                Some(path) => format!("파일 · {}{dirty}", path.display()),
                None => format!("새 네트워크{dirty}"),
            };
            ui.label(RichText::new(title).color(palette.fg_text_secondary));
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = decorations.button_gap;
                if ui
                    .add(PrimaryButton::new(&self.theme, "새로 만들기").icon("🆕"))
                    .clicked()
                {
                    self.new_document();
                }
                if ui
                    .add(PrimaryButton::new(&self.theme, "열기").icon("📂"))
                    .clicked()
                {
                    self.open_document_dialog();
                }
                if ui
                    .add(PrimaryButton::new(&self.theme, "저장").icon("💾"))
                    .clicked()
                {
                    self.save_document(false);
                }
                if ui
                    .add(PrimaryButton::new(&self.theme, "다른 이름으로").icon("📝"))
                    .clicked()
                {
                    self.save_document(true);
                }
                ui.separator();
                if ui
                    .add(PrimaryButton::new(&self.theme, "net.xml 가져오기").icon("📥"))
                    .clicked()
                {
                    self.import_net_dialog();
                }
                let can_compile = self.can_compile();
                if ui
                    .add_enabled(
                        can_compile,
                        PrimaryButton::new(&self.theme, "net.xml 내보내기").icon("📤"),
                    )
                    .clicked()
                {
                    self.export_net_dialog();
                }
                ui.separator();
                let drawing = self.editor_state.is_drawing();
                if ui
                    .add(
                        PrimaryButton::new(&self.theme, "그리기")
                            .icon("✏")
                            .active(drawing),
                    )
                    .clicked()
                {
                    self.editor_state.toggle_drawing_mode();
                }
            });
            self.render_messages(ui);
        });
    }

    /// 시뮬레이션 탭 상단 툴바를 그린다.
    pub(super) fn render_simulation_toolbar(&mut self, ui: &mut egui::Ui) {
        let palette = *self.theme.palette();
        ui.vertical(|ui| {
            solid_section_header(ui, &self.theme, "🚗", "Traffic Simulation");
            ui.add_space(4.0);
            let source = match &self.net_file {
                Some(path) => format!("네트워크 · {}", path.display()),
                None => "net.xml을 내보내거나 가져오면 시뮬레이션을 시작할 수 있습니다.".to_string(),
            };
            ui.label(RichText::new(source).color(palette.fg_text_secondary));
            self.render_messages(ui);
        });
    }

    /// 오류 배너와 안내 문구.
    fn render_messages(&mut self, ui: &mut egui::Ui) {
        let palette = *self.theme.palette();
        if let Some(notice) = &self.last_notice {
            ui.label(RichText::new(notice).color(palette.accent_ok));
        }
        let mut dismiss = false;
        if let Some(err) = &self.last_error {
            ui.horizontal(|ui| {
                ui.label(RichText::new(err).color(palette.accent_error).strong());
                dismiss = ui.small_button("✖").clicked();
            });
        }
        if dismiss {
            self.last_error = None;
        }
    }
}
