use eframe::egui::{self, Pos2, Stroke};

use super::scene::{ItemHandle, Scene, SceneItem, SceneShape};
use super::sync::layer;
use crate::theme::ScenePalette;

/// 배경 그리드 한 변의 길이.
pub const GRID_EXTENT: f32 = 5000.0;
/// 그리드 간격.
pub const GRID_SPACING: f32 = 50.0;
const CORNER_X: f32 = 2400.0;
const CORNER_Y: f32 = 1800.0;
const CORNER_SIZE: f32 = 100.0;

/// 그리기 모드 배너 위치.
pub const BANNER_ANCHOR: Pos2 = egui::pos2(-2350.0, 1830.0);
/// 그리기 모드 배너 문구.
pub const BANNER_TEXT: &str = "DRAWING MODE";

/// 그리드, 모서리 장식, 좌표 라벨, 원점 표시, 방위 표시를 씬에 추가한다.
pub fn render_decorations(scene: &mut Scene, palette: &ScenePalette) -> Vec<ItemHandle> {
    let mut handles = Vec::new();
    let half = GRID_EXTENT / 2.0;
    let grid = Stroke::new(1.0, palette.grid);
    let steps = (GRID_EXTENT / GRID_SPACING) as i32;
    for i in 0..=steps {
        let v = -half + i as f32 * GRID_SPACING;
        handles.push(scene.add(
            SceneItem::new(SceneShape::Line {
                from: egui::pos2(-half, v),
                to: egui::pos2(half, v),
            })
            .stroke(grid)
            .z(layer::GRID),
        ));
        handles.push(scene.add(
            SceneItem::new(SceneShape::Line {
                from: egui::pos2(v, -half),
                to: egui::pos2(v, half),
            })
            .stroke(grid)
            .z(layer::GRID),
        ));
    }

    let corner = Stroke::new(2.0, palette.decoration);
    for (sx, sy) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
        let tip = egui::pos2(sx * CORNER_X, sy * CORNER_Y);
        let points = vec![
            egui::pos2(tip.x - sx * CORNER_SIZE, tip.y),
            tip,
            egui::pos2(tip.x, tip.y - sy * CORNER_SIZE),
        ];
        handles.push(scene.add(
            SceneItem::new(SceneShape::Polyline { points })
                .stroke(corner)
                .z(layer::DECORATION),
        ));
    }

    for x in (-2000..=2000).step_by(1000).filter(|x| *x != 0) {
        handles.push(scene.add(
            SceneItem::text(
                egui::pos2(x as f32 - 20.0, 10.0),
                format!("x: {x}"),
                8.0,
                palette.coordinate_label,
            )
            .z(layer::DECORATION),
        ));
    }
    for y in (-1500..=1500).step_by(1000).filter(|y| *y != 0) {
        handles.push(scene.add(
            SceneItem::text(
                egui::pos2(10.0, y as f32 - 10.0),
                format!("y: {y}"),
                8.0,
                palette.coordinate_label,
            )
            .z(layer::DECORATION),
        ));
    }

    let origin = Stroke::new(1.0, palette.origin_marker);
    handles.push(scene.add(
        SceneItem::new(SceneShape::Circle {
            center: Pos2::ZERO,
            radius: 5.0,
        })
        .stroke(origin)
        .z(layer::DECORATION),
    ));
    handles.push(scene.add(
        SceneItem::new(SceneShape::Line {
            from: egui::pos2(-20.0, 0.0),
            to: egui::pos2(20.0, 0.0),
        })
        .stroke(origin)
        .z(layer::DECORATION),
    ));
    handles.push(scene.add(
        SceneItem::new(SceneShape::Line {
            from: egui::pos2(0.0, -20.0),
            to: egui::pos2(0.0, 20.0),
        })
        .stroke(origin)
        .z(layer::DECORATION),
    ));

    handles.push(scene.add(
        SceneItem::text(egui::pos2(-2350.0, -1850.0), "N", 14.0, palette.decoration)
            .z(layer::DECORATION),
    ));
    handles.push(scene.add(
        SceneItem::new(SceneShape::Polyline {
            points: vec![
                egui::pos2(-2320.0, -1835.0),
                egui::pos2(-2320.0, -1865.0),
                egui::pos2(-2330.0, -1850.0),
                egui::pos2(-2320.0, -1835.0),
            ],
        })
        .stroke(Stroke::new(1.0, palette.decoration))
        .z(layer::DECORATION),
    ));
    handles
}

/// 그리기 모드 배너 아이템을 만든다.
pub fn banner_item(palette: &ScenePalette) -> SceneItem {
    SceneItem::text(BANNER_ANCHOR, BANNER_TEXT, 12.0, palette.banner).z(layer::BANNER)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 배경 장식이 그리드와 라벨을 포함해 모두 노드보다 아래 레이어에 놓인다.
    #[test]
    fn decorations_stay_below_network() {
        let mut scene = Scene::new();
        let handles = render_decorations(&mut scene, &ScenePalette::sci_fi());
        // 그리드 202 + 모서리 4 + 좌표 라벨 8 + 원점 3 + 방위 2
        assert_eq!(handles.len(), 219);
        assert!(handles
            .iter()
            .filter_map(|h| scene.get(*h))
            .all(|item| item.z < layer::EDGE && item.owner.is_none()));
    }
}
