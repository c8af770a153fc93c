use eframe::egui::{self, Pos2, Rect, Vec2};

/// 한 번의 확대/축소 단계에 적용하는 배율이다.
pub const ZOOM_STEP: f32 = 1.2;

/// 씬 좌표를 화면 좌표로 바꾸는 변환 정보이다.
///
/// 화면 좌표는 캔버스 중심(`origin`)을 기준으로 `offset`만큼 이동한 뒤
/// `zoom` 배율을 곱해 계산한다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// 화면 중심 기준 이동량(포인트 단위).
    pub offset: Vec2,
    /// 확대 배율.
    pub zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    /// 씬 좌표를 화면 좌표로 변환한다.
    pub fn to_screen(&self, origin: Pos2, scene: Pos2) -> Pos2 {
        origin + self.offset + scene.to_vec2() * self.zoom
    }

    /// 화면 좌표를 씬 좌표로 변환한다.
    pub fn to_scene(&self, origin: Pos2, screen: Pos2) -> Pos2 {
        ((screen - origin - self.offset) / self.zoom).to_pos2()
    }

    /// 화면 기준 이동량만큼 팬한다.
    pub fn pan(&mut self, screen_delta: Vec2) {
        self.offset += screen_delta;
    }

    /// `anchor`(화면 중심 기준 상대 좌표) 아래의 씬 좌표를 고정한 채 배율을 곱한다.
    ///
    /// 최소/최대 배율 제한은 두지 않는다.
    pub fn zoom_at(&mut self, factor: f32, anchor: Vec2) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.offset = anchor - (anchor - self.offset) * factor;
        self.zoom *= factor;
    }

    /// 콘텐츠 사각형이 뷰포트에 가로세로 비율을 유지하며 꽉 차도록 맞춘다.
    pub fn fit(content: Rect, viewport: Vec2) -> Self {
        if !content.is_positive() || viewport.x <= 0.0 || viewport.y <= 0.0 {
            let offset = if content.is_finite() {
                -content.center().to_vec2()
            } else {
                Vec2::ZERO
            };
            return Self { offset, zoom: 1.0 };
        }
        let zoom = (viewport.x / content.width()).min(viewport.y / content.height());
        Self {
            offset: -content.center().to_vec2() * zoom,
            zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 화면 변환과 역변환이 같은 점으로 돌아오는지 확인한다.
    #[test]
    fn screen_and_scene_are_inverse() {
        let view = ViewTransform {
            offset: egui::vec2(30.0, -12.0),
            zoom: 2.5,
        };
        let origin = egui::pos2(400.0, 300.0);
        let scene = egui::pos2(-17.0, 42.0);
        let back = view.to_scene(origin, view.to_screen(origin, scene));
        assert!((back - scene).length() < 1e-4);
    }

    /// 앵커 아래의 씬 좌표가 줌 전후로 유지되는지 확인한다.
    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut view = ViewTransform::default();
        let origin = egui::pos2(0.0, 0.0);
        let anchor = egui::vec2(120.0, 80.0);
        let before = view.to_scene(origin, origin + anchor);
        view.zoom_at(ZOOM_STEP, anchor);
        view.zoom_at(ZOOM_STEP, anchor);
        let after = view.to_scene(origin, origin + anchor);
        assert!((before - after).length() < 1e-3);
        assert!((view.zoom - 1.44).abs() < 1e-5);
    }

    /// fit 결과가 콘텐츠 중심을 화면 중심에 두는지 확인한다.
    #[test]
    fn fit_centers_content() {
        let content = Rect::from_min_max(egui::pos2(100.0, 100.0), egui::pos2(300.0, 200.0));
        let view = ViewTransform::fit(content, egui::vec2(400.0, 400.0));
        assert!((view.zoom - 2.0).abs() < 1e-5);
        let origin = egui::pos2(0.0, 0.0);
        let center = view.to_screen(origin, content.center());
        assert!(center.to_vec2().length() < 1e-3);
    }
}
