use super::*;

/// 이보다 작게 보이는 텍스트는 그리지 않는다.
const MIN_TEXT_SIZE: f32 = 3.0;
const DASH_LENGTH: f32 = 8.0;
const GAP_LENGTH: f32 = 5.0;

/// 씬 아이템을 z 순서대로 화면에 그린다.
///
/// `origin`은 씬 원점이 놓이는 화면 좌표(보통 캔버스 중심)이다.
/// 선 두께와 글자 크기도 배율에 맞춰 함께 커진다.
pub fn paint_scene(painter: &egui::Painter, scene: &Scene, view: &ViewTransform, origin: egui::Pos2) {
    let clip = painter.clip_rect();
    let zoom = view.zoom;
    let map = |p: egui::Pos2| view.to_screen(origin, p);
    for (_, item) in scene.ordered_items() {
        if !item.visible {
            continue;
        }
        let bounds = item.shape.bounds().expand(item.stroke.width);
        let screen_bounds = egui::Rect::from_two_pos(map(bounds.min), map(bounds.max));
        if !clip.intersects(screen_bounds) {
            continue;
        }
        let stroke = egui::Stroke::new(item.stroke.width * zoom, item.stroke.color);
        match &item.shape {
            SceneShape::Circle { center, radius } => {
                painter.circle(map(*center), radius * zoom, item.fill, stroke);
            }
            SceneShape::Line { from, to } => {
                painter.line_segment([map(*from), map(*to)], stroke);
            }
            SceneShape::DashedLine { from, to } => {
                painter.extend(egui::Shape::dashed_line(
                    &[map(*from), map(*to)],
                    stroke,
                    DASH_LENGTH,
                    GAP_LENGTH,
                ));
            }
            SceneShape::Polyline { points } => {
                let points: Vec<egui::Pos2> = points.iter().map(|p| map(*p)).collect();
                painter.add(egui::Shape::line(points, stroke));
            }
            SceneShape::Rect { rect } => {
                painter.rect(
                    egui::Rect::from_two_pos(map(rect.min), map(rect.max)),
                    0.0,
                    item.fill,
                    stroke,
                );
            }
            SceneShape::Text { anchor, text, size } => {
                let size = size * zoom;
                if size < MIN_TEXT_SIZE {
                    continue;
                }
                painter.text(
                    map(*anchor),
                    egui::Align2::LEFT_TOP,
                    text,
                    egui::FontId::proportional(size),
                    item.fill,
                );
            }
        }
    }
}
