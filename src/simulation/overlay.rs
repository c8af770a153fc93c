use crate::editor::model::{
    ItemHandle, RoadClass, Scene, SceneItem, SceneShape, ViewTransform, stroke_width,
};
use crate::engine::{NetworkBounds, VehicleState};
use crate::network::NetworkSnapshot;
use crate::theme::ScenePalette;
use eframe::egui::{self, Color32, Pos2, Stroke, Vec2};
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;
use tracing::debug;

/// 이 속도(m/s) 이상은 가장 붉게 칠한다.
const SPEED_COLOR_MAX: f64 = 30.0;
const VEHICLE_SIZE: Vec2 = egui::vec2(6.0, 4.0);
const VEHICLE_LABEL_OFFSET: Vec2 = egui::vec2(5.0, -10.0);
const VEHICLE_LABEL_SIZE: f32 = 6.0;
const JUNCTION_RADIUS: f32 = 6.0;
/// 화면 맞춤 시 콘텐츠 둘레 여백.
const FIT_MARGIN: f32 = 20.0;
pub const ZOOM_PERCENT_RANGE: RangeInclusive<f32> = 50.0..=200.0;

mod layer {
    pub const ROAD: f32 = 0.0;
    pub const JUNCTION: f32 = 1.0;
    pub const VEHICLE: f32 = 2.0;
    pub const LABEL: f32 = 3.0;
}

/// 한 번의 대조 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

/// 마지막 대조 후 집계 값.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverlayStats {
    pub vehicle_count: usize,
    /// m/s. 차량이 없으면 0.
    pub average_speed: f64,
    pub simulation_time: f64,
}

impl OverlayStats {
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Vehicles: {}", self.vehicle_count),
            format!("Average Speed: {:.2} m/s", self.average_speed),
            format!("Simulation Time: {:.1} s", self.simulation_time),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
struct VehicleGlyph {
    body: ItemHandle,
    label: Option<ItemHandle>,
}

/// 속도 비율에 따라 초록(정지)에서 빨강(고속)으로 바뀌는 색.
pub fn speed_color(speed: f64) -> Color32 {
    let ratio = if speed.is_finite() {
        (speed / SPEED_COLOR_MAX).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Color32::from_rgb(
        (255.0 * ratio) as u8,
        (255.0 * (1.0 - ratio)) as u8,
        100,
    )
}

fn body_rect(position: Pos2) -> egui::Rect {
    egui::Rect::from_min_size(position - VEHICLE_SIZE / 2.0, VEHICLE_SIZE)
}

fn vehicle_position(state: &VehicleState) -> Pos2 {
    egui::pos2(state.position.0 as f32, state.position.1 as f32)
}

/// 틱마다 받은 차량 스냅샷을 유지형 씬의 글리프에 맞춰 반영한다.
pub struct VehicleOverlay {
    scene: Scene,
    palette: ScenePalette,
    glyphs: HashMap<String, VehicleGlyph>,
    backdrop: Vec<ItemHandle>,
    stats: OverlayStats,
    show_ids: bool,
    color_by_speed: bool,
    /// 맞춤 결과. 배율 슬라이더는 이 값을 기준으로 곱한다.
    fitted: ViewTransform,
    zoom_percent: f32,
    pub view: ViewTransform,
}

impl VehicleOverlay {
    pub fn new(palette: ScenePalette) -> Self {
        Self {
            scene: Scene::new(),
            palette,
            glyphs: HashMap::new(),
            backdrop: Vec::new(),
            stats: OverlayStats::default(),
            show_ids: true,
            color_by_speed: true,
            fitted: ViewTransform::default(),
            zoom_percent: 100.0,
            view: ViewTransform::default(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn stats(&self) -> OverlayStats {
        self.stats
    }

    pub fn show_ids(&self) -> bool {
        self.show_ids
    }

    pub fn color_by_speed(&self) -> bool {
        self.color_by_speed
    }

    pub fn zoom_percent(&self) -> f32 {
        self.zoom_percent
    }

    /// 현재 추적 중인 차량 ID 목록(정렬).
    pub fn tracked_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.glyphs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn body_fill(&self, speed: f64) -> Color32 {
        if self.color_by_speed {
            speed_color(speed)
        } else {
            self.palette.vehicle_default
        }
    }

    fn label_item(&self, id: &str, position: Pos2) -> SceneItem {
        SceneItem::text(
            position + VEHICLE_LABEL_OFFSET,
            id,
            VEHICLE_LABEL_SIZE,
            self.palette.vehicle_label,
        )
        .z(layer::LABEL)
    }

    /// 스냅샷에 맞춰 글리프를 생성, 갱신, 제거한다.
    ///
    /// 끝나면 추적 중인 ID 집합은 스냅샷 키 집합과 정확히 같다.
    pub fn reconcile(
        &mut self,
        snapshot: &BTreeMap<String, VehicleState>,
        simulation_time: f64,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let departed: Vec<String> = self
            .glyphs
            .keys()
            .filter(|id| !snapshot.contains_key(*id))
            .cloned()
            .collect();
        for id in departed {
            if let Some(glyph) = self.glyphs.remove(&id) {
                self.scene.remove(glyph.body);
                if let Some(label) = glyph.label {
                    self.scene.remove(label);
                }
                report.removed += 1;
            }
        }

        for (id, state) in snapshot {
            let position = vehicle_position(state);
            let fill = self.body_fill(state.speed);
            match self.glyphs.get(id).copied() {
                Some(glyph) => {
                    self.scene.update(glyph.body, |item| {
                        item.shape = SceneShape::Rect {
                            rect: body_rect(position),
                        };
                        item.fill = fill;
                    });
                    let label = self.sync_label(id, glyph.label, position);
                    if let Some(entry) = self.glyphs.get_mut(id) {
                        entry.label = label;
                    }
                    report.updated += 1;
                }
                None => {
                    let body = self.scene.add(
                        SceneItem::new(SceneShape::Rect {
                            rect: body_rect(position),
                        })
                        .stroke(Stroke::new(1.0, self.palette.vehicle_outline))
                        .fill(fill)
                        .z(layer::VEHICLE),
                    );
                    let label = self.sync_label(id, None, position);
                    self.glyphs.insert(id.clone(), VehicleGlyph { body, label });
                    report.created += 1;
                }
            }
        }

        let total_speed: f64 = snapshot.values().map(|state| state.speed).sum();
        self.stats = OverlayStats {
            vehicle_count: snapshot.len(),
            average_speed: if snapshot.is_empty() {
                0.0
            } else {
                total_speed / snapshot.len() as f64
            },
            simulation_time,
        };
        debug!(
            created = report.created,
            updated = report.updated,
            removed = report.removed,
            "차량 글리프 대조"
        );
        report
    }

    /// 라벨을 표시 설정에 맞춘다. 켜져 있을 때만 새로 만들고, 꺼지면 숨긴다.
    fn sync_label(
        &mut self,
        id: &str,
        label: Option<ItemHandle>,
        position: Pos2,
    ) -> Option<ItemHandle> {
        match label {
            Some(handle) => {
                let anchor = position + VEHICLE_LABEL_OFFSET;
                let show = self.show_ids;
                self.scene.update(handle, |item| {
                    if let SceneShape::Text { anchor: a, .. } = &mut item.shape {
                        *a = anchor;
                    }
                    item.visible = show;
                });
                Some(handle)
            }
            None if self.show_ids => {
                let item = self.label_item(id, position);
                Some(self.scene.add(item))
            }
            None => None,
        }
    }

    /// ID 라벨 표시를 바꾸고 기존 글리프에 바로 적용한다.
    pub fn set_show_ids(&mut self, show: bool) {
        self.show_ids = show;
        for glyph in self.glyphs.values() {
            if let Some(label) = glyph.label {
                self.scene.set_visible(label, show);
            }
        }
    }

    /// 속도 색상 사용 여부. 다음 대조부터 반영된다.
    pub fn set_color_by_speed(&mut self, enabled: bool) {
        self.color_by_speed = enabled;
    }

    /// 모든 차량 글리프를 지우고 통계를 초기화한다.
    pub fn clear_vehicles(&mut self) {
        self.reconcile(&BTreeMap::new(), 0.0);
    }

    /// 정적 도로망 배경을 새로 그리고 화면을 맞춘다. 호출할 때마다 전부 다시 그린다.
    pub fn draw_network(&mut self, snapshot: &NetworkSnapshot, viewport: Vec2) {
        for handle in self.backdrop.drain(..) {
            self.scene.remove(handle);
        }
        let positions: HashMap<&str, Pos2> = snapshot
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), egui::pos2(node.x, node.y)))
            .collect();
        for edge in &snapshot.edges {
            let (Some(from), Some(to)) = (
                positions.get(edge.from.as_str()),
                positions.get(edge.to.as_str()),
            ) else {
                continue;
            };
            let color = RoadClass::from_speed(edge.speed).color(&self.palette);
            self.backdrop.push(
                self.scene.add(
                    SceneItem::new(SceneShape::Line {
                        from: *from,
                        to: *to,
                    })
                    .stroke(Stroke::new(stroke_width(edge.lanes), color))
                    .z(layer::ROAD),
                ),
            );
        }
        for node in &snapshot.nodes {
            self.backdrop.push(
                self.scene.add(
                    SceneItem::new(SceneShape::Circle {
                        center: egui::pos2(node.x, node.y),
                        radius: JUNCTION_RADIUS,
                    })
                    .stroke(Stroke::new(1.0, self.palette.junction_stroke))
                    .fill(self.palette.junction_fill)
                    .z(layer::JUNCTION),
                ),
            );
        }
        self.fit_to_content(viewport);
    }

    /// 배경이 없을 때 엔진이 알려준 경계로 화면을 맞춘다.
    pub fn fit_bounds(&mut self, bounds: NetworkBounds, viewport: Vec2) {
        if !self.backdrop.is_empty() {
            return;
        }
        let rect = egui::Rect::from_two_pos(
            egui::pos2(bounds.min_x as f32, bounds.min_y as f32),
            egui::pos2(bounds.max_x as f32, bounds.max_y as f32),
        );
        self.fitted = ViewTransform::fit(rect.expand(FIT_MARGIN), viewport);
        self.apply_zoom();
    }

    fn fit_to_content(&mut self, viewport: Vec2) {
        self.fitted = match self.scene.bounding_rect(|_| true) {
            Some(rect) => ViewTransform::fit(rect.expand(FIT_MARGIN), viewport),
            None => ViewTransform::default(),
        };
        self.apply_zoom();
    }

    /// 맞춤 배율에 대한 백분율(50..200)을 설정한다.
    pub fn set_zoom_percent(&mut self, percent: f32) {
        self.zoom_percent = percent.clamp(*ZOOM_PERCENT_RANGE.start(), *ZOOM_PERCENT_RANGE.end());
        self.apply_zoom();
    }

    /// 배율을 100%로 되돌리고 다시 맞춘다.
    pub fn reset_view(&mut self, viewport: Vec2) {
        self.zoom_percent = 100.0;
        self.fit_to_content(viewport);
    }

    fn apply_zoom(&mut self) {
        let factor = self.zoom_percent / 100.0;
        self.view = ViewTransform {
            offset: self.fitted.offset * factor,
            zoom: self.fitted.zoom * factor,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{EdgeRecord, NodeRecord};

    fn vehicle(x: f64, y: f64, speed: f64) -> VehicleState {
        VehicleState {
            position: (x, y),
            speed,
            ..Default::default()
        }
    }

    fn snapshot(entries: &[(&str, f64)]) -> BTreeMap<String, VehicleState> {
        entries
            .iter()
            .enumerate()
            .map(|(i, (id, speed))| (id.to_string(), vehicle(i as f64 * 10.0, 5.0, *speed)))
            .collect()
    }

    /// 같은 스냅샷을 두 번 대조하면 두 번째는 갱신만 일어난다.
    #[test]
    fn reconcile_is_idempotent() {
        let mut overlay = VehicleOverlay::new(ScenePalette::default());
        let snap = snapshot(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        let first = overlay.reconcile(&snap, 1.0);
        assert_eq!(first.created, 3);
        let items = overlay.scene().len();
        let second = overlay.reconcile(&snap, 1.1);
        assert_eq!(
            second,
            ReconcileReport {
                created: 0,
                updated: 3,
                removed: 0
            }
        );
        assert_eq!(overlay.scene().len(), items);
    }

    /// 대조 후 추적 집합은 스냅샷 키 집합과 같고, 떠난 차량 글리프는 씬에서 빠진다.
    #[test]
    fn tracked_ids_match_snapshot_keys() {
        let mut overlay = VehicleOverlay::new(ScenePalette::default());
        overlay.reconcile(&snapshot(&[("a", 1.0), ("b", 2.0)]), 0.0);
        let report = overlay.reconcile(&snapshot(&[("b", 2.0), ("c", 4.0)]), 0.1);
        assert_eq!(report.removed, 1);
        assert_eq!(report.created, 1);
        assert_eq!(overlay.tracked_ids(), vec!["b", "c"]);
        // 차량당 본체 + 라벨
        assert_eq!(overlay.scene().len(), 4);

        overlay.clear_vehicles();
        assert!(overlay.tracked_ids().is_empty());
        assert!(overlay.scene().is_empty());
        assert_eq!(overlay.stats().average_speed, 0.0);
    }

    #[test]
    fn speed_color_interpolates_red_green() {
        assert_eq!(speed_color(0.0), Color32::from_rgb(0, 255, 100));
        assert_eq!(speed_color(45.0), Color32::from_rgb(255, 0, 100));
        assert_eq!(speed_color(15.0), Color32::from_rgb(127, 127, 100));
    }

    #[test]
    fn stats_report_mean_speed_and_clock() {
        let mut overlay = VehicleOverlay::new(ScenePalette::default());
        overlay.reconcile(&snapshot(&[("a", 10.0), ("b", 20.0)]), 12.34);
        let stats = overlay.stats();
        assert_eq!(stats.vehicle_count, 2);
        assert!((stats.average_speed - 15.0).abs() < 1e-9);
        assert_eq!(stats.lines()[1], "Average Speed: 15.00 m/s");
        assert_eq!(stats.lines()[2], "Simulation Time: 12.3 s");
    }

    /// 라벨은 꺼져 있으면 만들지 않고, 이미 있으면 숨기기만 한다.
    #[test]
    fn labels_are_lazy_and_hidden_not_destroyed() {
        let mut overlay = VehicleOverlay::new(ScenePalette::default());
        overlay.set_show_ids(false);
        overlay.reconcile(&snapshot(&[("a", 1.0)]), 0.0);
        assert_eq!(overlay.scene().len(), 1);

        overlay.set_show_ids(true);
        overlay.reconcile(&snapshot(&[("a", 1.0)]), 0.1);
        assert_eq!(overlay.scene().len(), 2);

        overlay.set_show_ids(false);
        assert_eq!(overlay.scene().len(), 2);
        let hidden = overlay
            .scene()
            .ordered_items()
            .iter()
            .filter(|(_, item)| !item.visible)
            .count();
        assert_eq!(hidden, 1);
    }

    #[test]
    fn uncolored_vehicles_use_default_fill() {
        let palette = ScenePalette::default();
        let mut overlay = VehicleOverlay::new(palette);
        overlay.set_color_by_speed(false);
        overlay.set_show_ids(false);
        overlay.reconcile(&snapshot(&[("a", 25.0)]), 0.0);
        let (_, body) = overlay.scene().ordered_items()[0];
        assert_eq!(body.fill, palette.vehicle_default);
    }

    /// 배경은 호출마다 전부 다시 그린다.
    #[test]
    fn draw_network_replaces_previous_backdrop() {
        let mut overlay = VehicleOverlay::new(ScenePalette::default());
        let network = NetworkSnapshot {
            nodes: vec![
                NodeRecord { id: "a".into(), x: 0.0, y: 0.0 },
                NodeRecord { id: "b".into(), x: 400.0, y: 0.0 },
            ],
            edges: vec![EdgeRecord {
                id: "ab".into(),
                from: "a".into(),
                to: "b".into(),
                lanes: 2,
                speed: 30.0,
            }],
        };
        let viewport = egui::vec2(800.0, 600.0);
        overlay.draw_network(&network, viewport);
        overlay.draw_network(&network, viewport);
        assert_eq!(overlay.scene().len(), 3);
        assert!(overlay.view.zoom > 1.0);

        let fitted = overlay.view;
        overlay.set_zoom_percent(200.0);
        assert!((overlay.view.zoom - fitted.zoom * 2.0).abs() < 1e-4);
        overlay.reset_view(viewport);
        assert_eq!(overlay.view, fitted);
    }

    /// 교차로 글리프는 노드 레코드마다 하나씩 입력 순서대로 그린다.
    #[test]
    fn junctions_follow_snapshot_order() {
        let mut overlay = VehicleOverlay::new(ScenePalette::default());
        let network = NetworkSnapshot {
            nodes: vec![
                NodeRecord { id: "c".into(), x: 50.0, y: 50.0 },
                NodeRecord { id: "a".into(), x: 0.0, y: 0.0 },
                NodeRecord { id: "a".into(), x: 10.0, y: 0.0 },
            ],
            edges: Vec::new(),
        };
        overlay.draw_network(&network, egui::vec2(800.0, 600.0));
        let centers: Vec<Pos2> = overlay
            .scene()
            .ordered_items()
            .into_iter()
            .filter_map(|(_, item)| match item.shape {
                SceneShape::Circle { center, .. } => Some(center),
                _ => None,
            })
            .collect();
        assert_eq!(
            centers,
            vec![
                egui::pos2(50.0, 50.0),
                egui::pos2(0.0, 0.0),
                egui::pos2(10.0, 0.0)
            ]
        );
    }
}
