use crate::simulation::SimulationStatus;
use eframe::egui::{self, Color32};

include!(concat!(env!("OUT_DIR"), "/custom_font.rs"));

/// 패널과 텍스트에 쓰이는 기본 색상 집합.
#[derive(Debug, Clone, Copy)]
pub struct ThemePalette {
    /// 메인 배경.
    pub bg_main: Color32,
    /// 사이드바 배경.
    pub bg_sidebar: Color32,
    /// 카드/패널 배경.
    pub bg_panel: Color32,
    /// 툴바 배경.
    pub bg_toolbar: Color32,
    /// 캔버스 배경.
    pub bg_canvas: Color32,
    /// 약한 테두리.
    pub border_soft: Color32,
    /// 주 텍스트.
    pub fg_text_primary: Color32,
    /// 보조 텍스트.
    pub fg_text_secondary: Color32,
    /// 강조 색상.
    pub accent_primary: Color32,
    /// 그리기 모드 강조 색상.
    pub accent_draw: Color32,
    /// 경고 색상.
    pub accent_warning: Color32,
    /// 오류 색상.
    pub accent_error: Color32,
    /// 정상 상태 색상.
    pub accent_ok: Color32,
}

/// 모서리, 여백 등 형태 관련 수치.
#[derive(Debug, Clone, Copy)]
pub struct ThemeDecorations {
    pub container_rounding: f32,
    pub card_rounding: f32,
    pub toolbar_rounding: f32,
    pub button_rounding: f32,
    pub button_height: f32,
    pub button_min_width: f32,
    pub button_gap: f32,
    pub card_inner_margin: egui::Margin,
    pub header_height: f32,
    pub header_fill: Color32,
    pub header_text: Color32,
}

/// 네트워크 캔버스와 시뮬레이션 오버레이에 그려지는 도형 색상.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenePalette {
    pub node_stroke: Color32,
    pub node_fill: Color32,
    pub node_active_stroke: Color32,
    pub glow_stroke: Color32,
    pub glow_fill: Color32,
    pub glow_selected_stroke: Color32,
    pub glow_selected_fill: Color32,
    pub node_label: Color32,
    pub edge_label: Color32,
    pub edge_selected: Color32,
    pub lane_marker: Color32,
    pub preview_line: Color32,
    pub banner: Color32,
    pub grid: Color32,
    pub decoration: Color32,
    pub coordinate_label: Color32,
    pub origin_marker: Color32,
    pub highway: Color32,
    pub main_road: Color32,
    pub local_road: Color32,
    pub junction_stroke: Color32,
    pub junction_fill: Color32,
    pub vehicle_outline: Color32,
    pub vehicle_default: Color32,
    pub vehicle_label: Color32,
}

impl ScenePalette {
    /// 어두운 배경에 네온 계열 색을 쓰는 기본 팔레트.
    pub fn sci_fi() -> Self {
        Self {
            node_stroke: Color32::from_rgb(0x00, 0xFF, 0xFF),
            node_fill: Color32::from_rgba_unmultiplied(0, 255, 255, 100),
            node_active_stroke: Color32::from_rgb(0xFF, 0x00, 0xFF),
            glow_stroke: Color32::TRANSPARENT,
            glow_fill: Color32::from_rgba_unmultiplied(0, 255, 255, 50),
            glow_selected_stroke: Color32::from_rgba_unmultiplied(255, 0, 255, 100),
            glow_selected_fill: Color32::from_rgba_unmultiplied(255, 0, 255, 70),
            node_label: Color32::from_rgb(0x00, 0xFF, 0xFF),
            edge_label: Color32::from_rgb(0x00, 0xFF, 0xAA),
            edge_selected: Color32::from_rgb(0xFF, 0x00, 0xFF),
            lane_marker: Color32::WHITE,
            preview_line: Color32::from_rgb(0xFF, 0x00, 0xFF),
            banner: Color32::from_rgb(0xFF, 0x00, 0xFF),
            grid: Color32::from_rgb(0x20, 0x20, 0x40),
            decoration: Color32::from_rgb(0x00, 0xFF, 0xFF),
            coordinate_label: Color32::from_rgb(0x00, 0xFF, 0xAA),
            origin_marker: Color32::from_rgb(0xFF, 0xFF, 0x00),
            highway: Color32::from_rgb(0xFF, 0x33, 0x00),
            main_road: Color32::from_rgb(0xFF, 0xAA, 0x00),
            local_road: Color32::from_rgb(0x00, 0xFF, 0xAA),
            junction_stroke: Color32::from_rgb(0x40, 0x40, 0xBF),
            junction_fill: Color32::from_rgba_unmultiplied(64, 64, 191, 100),
            vehicle_outline: Color32::WHITE,
            vehicle_default: Color32::from_rgb(0xFF, 0xFF, 0x00),
            vehicle_label: Color32::WHITE,
        }
    }
}

impl Default for ScenePalette {
    fn default() -> Self {
        Self::sci_fi()
    }
}

/// UI 전체에서 참조할 공통 테마 정보.
pub struct Theme {
    palette: ThemePalette,
    decorations: ThemeDecorations,
    scene: ScenePalette,
}

impl Default for Theme {
    /// 기본 테마 색상을 정의한다.
    fn default() -> Self {
        let palette = ThemePalette {
            bg_main: Color32::from_rgb(0x10, 0x10, 0x20),
            bg_sidebar: Color32::from_rgb(0x1A, 0x1A, 0x2E),
            bg_panel: Color32::from_rgb(0x22, 0x22, 0x3A),
            bg_toolbar: Color32::from_rgb(0x16, 0x16, 0x28),
            bg_canvas: Color32::from_rgb(0x10, 0x10, 0x20),
            border_soft: Color32::from_rgb(0x40, 0x40, 0xBF),
            fg_text_primary: Color32::from_rgb(0xE0, 0xF8, 0xFF),
            fg_text_secondary: Color32::from_rgb(0x80, 0x80, 0xFF),
            accent_primary: Color32::from_rgb(0x00, 0x99, 0xCC),
            accent_draw: Color32::from_rgb(0xFF, 0x00, 0xFF),
            accent_warning: Color32::from_rgb(0xFF, 0x99, 0x00),
            accent_error: Color32::from_rgb(0xFF, 0x44, 0x66),
            accent_ok: Color32::from_rgb(0x00, 0xFF, 0x00),
        };
        let decorations = ThemeDecorations {
            container_rounding: 6.0,
            card_rounding: 6.0,
            toolbar_rounding: 0.0,
            button_rounding: 4.0,
            button_height: 30.0,
            button_min_width: 96.0,
            button_gap: 8.0,
            card_inner_margin: egui::Margin::same(12.0),
            header_height: 32.0,
            header_fill: Color32::from_rgb(0x2A, 0x2A, 0x4A),
            header_text: Color32::from_rgb(0x00, 0xFF, 0xFF),
        };
        Self {
            palette,
            decorations,
            scene: ScenePalette::sci_fi(),
        }
    }
}

impl Theme {
    pub fn palette(&self) -> &ThemePalette {
        &self.palette
    }

    pub fn decorations(&self) -> &ThemeDecorations {
        &self.decorations
    }

    pub fn scene(&self) -> &ScenePalette {
        &self.scene
    }

    /// egui Context에 테마 기반 스타일을 적용한다.
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.window_rounding = egui::Rounding::same(self.decorations.container_rounding);
        visuals.widgets.inactive.bg_fill = self.palette.bg_panel;
        visuals.panel_fill = self.palette.bg_main;
        visuals.selection.bg_fill = self.palette.accent_primary;
        visuals.hyperlink_color = self.palette.fg_text_secondary;
        ctx.set_visuals(visuals);
    }

    /// 시뮬레이션 상태에 대응하는 색상을 반환한다.
    pub fn status_color(&self, status: &SimulationStatus) -> Color32 {
        match status {
            SimulationStatus::Ready => self.palette.accent_ok,
            SimulationStatus::Starting => self.palette.fg_text_secondary,
            SimulationStatus::Running => self.palette.accent_warning,
            SimulationStatus::Finished(_) => self.palette.accent_primary,
        }
    }
}

/// 두 색을 `t` 비율로 섞는다.
pub fn blend_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgba_premultiplied(
        mix(a.r(), b.r()),
        mix(a.g(), b.g()),
        mix(a.b(), b.b()),
        mix(a.a(), b.a()),
    )
}

/// build.rs에서 찾은 폰트를 egui에 등록한다.
pub fn install_custom_font(ctx: &egui::Context) {
    if let Some(bytes) = embedded_font_bytes() {
        let mut fonts = egui::FontDefinitions::default();
        fonts
            .font_data
            .insert("custom".into(), egui::FontData::from_static(bytes));
        fonts
            .families
            .entry(egui::FontFamily::Proportional)
            .or_default()
            .insert(0, "custom".into());
        fonts
            .families
            .entry(egui::FontFamily::Monospace)
            .or_default()
            .push("custom".into());
        ctx.set_fonts(fonts);
    }
}
