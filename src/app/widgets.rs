use crate::theme::{Theme, blend_color};
use eframe::egui::{self, RichText, Widget};

/// 툴바에 쓰는 단색 버튼. `active`이면 그리기 강조색으로 채운다.
pub(super) struct PrimaryButton<'a> {
    theme: &'a Theme,
    label: &'a str,
    icon: &'a str,
    active: bool,
}

impl<'a> PrimaryButton<'a> {
    pub(super) fn new(theme: &'a Theme, label: &'a str) -> Self {
        Self {
            theme,
            label,
            icon: "",
            active: false,
        }
    }

    pub(super) fn icon(mut self, icon: &'a str) -> Self {
        self.icon = icon;
        self
    }

    pub(super) fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

impl Widget for PrimaryButton<'_> {
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let decorations = self.theme.decorations();
        let palette = self.theme.palette();
        let enabled = ui.is_enabled();

        let text = if self.icon.is_empty() {
            self.label.to_string()
        } else {
            format!("{}  {}", self.icon, self.label)
        };
        let font_size = 15.0;
        let rich = RichText::new(text).size(font_size).strong().color(if enabled {
            egui::Color32::WHITE
        } else {
            blend_color(palette.fg_text_secondary, palette.bg_panel, 0.4)
        });

        // 글꼴 높이에 맞춰 버튼 높이를 늘린다
        let text_height = ui.ctx().fonts(|f| {
            f.row_height(&egui::FontId::new(font_size, egui::FontFamily::Proportional))
        });
        let base = if self.active {
            palette.accent_draw
        } else {
            palette.accent_primary
        };
        let fill = if enabled {
            base
        } else {
            blend_color(base, palette.border_soft, 0.5)
        };
        let response = ui.add(
            egui::Button::new(rich)
                .min_size(egui::vec2(
                    decorations.button_min_width,
                    decorations.button_height.max(text_height + 6.0),
                ))
                .rounding(egui::Rounding::same(decorations.button_rounding))
                .fill(fill),
        );
        if enabled && response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }
        response
    }
}

/// 탭 제목 머리띠.
pub(super) fn solid_section_header(ui: &mut egui::Ui, theme: &Theme, icon: &str, title: &str) {
    let decorations = theme.decorations();
    let palette = theme.palette();
    let size = egui::vec2(ui.available_width(), decorations.header_height);
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let rounding = egui::Rounding::same(decorations.card_rounding);
    ui.painter().rect_filled(rect, rounding, decorations.header_fill);
    ui.painter().rect_stroke(
        rect,
        rounding,
        egui::Stroke::new(1.0, blend_color(decorations.header_fill, palette.bg_panel, 0.4)),
    );
    let content_rect = rect.shrink2(egui::vec2(14.0, 0.0));
    ui.allocate_ui_at_rect(content_rect, |ui| {
        ui.with_layout(egui::Layout::left_to_right(egui::Align::Center), |ui| {
            if !icon.is_empty() {
                ui.label(RichText::new(icon).size(18.0).color(decorations.header_text));
                ui.add_space(6.0);
            }
            ui.label(
                RichText::new(title)
                    .size(17.0)
                    .color(decorations.header_text)
                    .strong(),
            );
        });
    });
}
