use super::*;

/// 프레임 사이에 유지해야 하는 편집 패널 상태.
#[derive(Debug, Default)]
pub struct EditorPanelState {
    /// 마지막으로 그린 캔버스 크기. 화면 맞춤에 쓴다.
    pub(super) canvas_size: egui::Vec2,
    /// ID 입력란이 가리키는 선택 항목.
    pub(super) rename_target: Option<Selection>,
    /// ID 입력란 내용.
    pub(super) rename_buffer: String,
}

impl EditorPanelState {
    /// 마지막으로 그린 캔버스 크기를 반환한다.
    pub fn canvas_size(&self) -> egui::Vec2 {
        self.canvas_size
    }
}

/// 네트워크 편집 화면 전체를 담당하는 뷰이다.
pub struct NetworkEditorUi<'a> {
    /// 테마 참조.
    theme: &'a Theme,
    /// 에디터 상태 참조.
    pub(super) state: &'a mut NetworkEditorState,
    pub(super) panel: &'a mut EditorPanelState,
    /// 오류 배너에 표시할 메시지.
    last_error: &'a mut Option<String>,
}

impl<'a> NetworkEditorUi<'a> {
    /// 뷰 인스턴스를 생성한다.
    pub fn new(
        theme: &'a Theme,
        state: &'a mut NetworkEditorState,
        panel: &'a mut EditorPanelState,
        last_error: &'a mut Option<String>,
    ) -> Self {
        Self {
            theme,
            state,
            panel,
            last_error,
        }
    }

    pub(super) fn theme(&self) -> &Theme {
        self.theme
    }

    pub(super) fn report_error(&mut self, err: impl std::fmt::Display) {
        *self.last_error = Some(err.to_string());
    }

    /// 좌/중앙/우 패널을 구성한다.
    pub fn show(&mut self, ctx: &egui::Context) {
        let palette = *self.theme.palette();
        let decorations = *self.theme.decorations();
        let side_frame = side_frame(&palette, &decorations);
        egui::SidePanel::left("network_tools")
            .frame(side_frame)
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                self.render_palette(ui);
            });
        egui::SidePanel::right("network_properties")
            .frame(side_frame)
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| {
                self.render_properties(ui);
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
    }
}

fn side_frame(palette: &ThemePalette, decorations: &ThemeDecorations) -> egui::Frame {
    egui::Frame {
        fill: palette.bg_sidebar,
        stroke: egui::Stroke::new(1.0, palette.border_soft),
        rounding: egui::Rounding::same(decorations.container_rounding),
        inner_margin: decorations.card_inner_margin,
        ..Default::default()
    }
}
