use eframe::egui::{self, Color32, Pos2, Rect, Stroke};
use std::collections::BTreeMap;

use super::edge::EdgeKey;
use super::node::NodeKey;

/// 라인 계열 도형 히트 테스트 시 허용하는 최소 거리이다.
const HIT_TOLERANCE: f32 = 3.0;

/// 씬에 등록된 그래픽 아이템을 가리키는 비소유 핸들이다.
///
/// 핸들 값은 재사용되지 않으므로 이미 제거된 아이템을 가리키는 핸들로
/// 호출하면 항상 아무 일도 일어나지 않는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemHandle(u64);

/// 아이템이 어떤 도메인 엔티티의 주 도형인지 나타낸다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOwner {
    /// 노드 본체.
    Node(NodeKey),
    /// 엣지 본체.
    Edge(EdgeKey),
}

/// 씬 좌표계에서 정의되는 도형이다.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneShape {
    /// 원.
    Circle { center: Pos2, radius: f32 },
    /// 실선.
    Line { from: Pos2, to: Pos2 },
    /// 점선.
    DashedLine { from: Pos2, to: Pos2 },
    /// 열린 폴리라인.
    Polyline { points: Vec<Pos2> },
    /// 축 정렬 사각형.
    Rect { rect: Rect },
    /// 좌상단 기준 텍스트.
    Text { anchor: Pos2, text: String, size: f32 },
}

impl SceneShape {
    /// 도형이 차지하는 대략적인 경계 사각형을 반환한다.
    pub fn bounds(&self) -> Rect {
        match self {
            SceneShape::Circle { center, radius } => {
                Rect::from_center_size(*center, egui::vec2(radius * 2.0, radius * 2.0))
            }
            SceneShape::Line { from, to } | SceneShape::DashedLine { from, to } => {
                Rect::from_two_pos(*from, *to)
            }
            SceneShape::Polyline { points } => Rect::from_points(points),
            SceneShape::Rect { rect } => *rect,
            SceneShape::Text { anchor, text, size } => {
                Rect::from_min_size(*anchor, estimate_text_size(text, *size))
            }
        }
    }

    /// 점이 도형 위(또는 허용 거리 이내)에 있는지 검사한다.
    fn hit(&self, point: Pos2, stroke_width: f32) -> bool {
        let tolerance = (stroke_width / 2.0).max(HIT_TOLERANCE);
        match self {
            SceneShape::Circle { center, radius } => {
                center.distance(point) <= radius + stroke_width / 2.0
            }
            SceneShape::Line { from, to } | SceneShape::DashedLine { from, to } => {
                distance_to_segment(point, *from, *to) <= tolerance
            }
            SceneShape::Polyline { points } => points
                .windows(2)
                .any(|pair| distance_to_segment(point, pair[0], pair[1]) <= tolerance),
            SceneShape::Rect { rect } => rect.expand(stroke_width / 2.0).contains(point),
            SceneShape::Text { .. } => self.bounds().contains(point),
        }
    }
}

/// 텍스트 크기를 글자 수 기반으로 근사한다.
pub fn estimate_text_size(text: &str, size: f32) -> egui::Vec2 {
    egui::vec2(text.chars().count() as f32 * size * 0.6, size * 1.4)
}

/// 선분과 점 사이의 최단 거리를 계산한다.
pub fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

/// 씬에 보관되는 개별 그래픽 아이템이다.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneItem {
    /// 도형 정의.
    pub shape: SceneShape,
    /// 외곽선.
    pub stroke: Stroke,
    /// 채움 색상(텍스트는 글자색).
    pub fill: Color32,
    /// 그리기 순서. 값이 작을수록 뒤에 그려진다.
    pub z: f32,
    /// 표시 여부.
    pub visible: bool,
    /// 히트 테스트용 소유 엔티티.
    pub owner: Option<ItemOwner>,
}

impl SceneItem {
    /// 기본 속성으로 아이템을 만든다.
    pub fn new(shape: SceneShape) -> Self {
        Self {
            shape,
            stroke: Stroke::NONE,
            fill: Color32::TRANSPARENT,
            z: 0.0,
            visible: true,
            owner: None,
        }
    }

    /// 텍스트 아이템을 만든다.
    pub fn text(anchor: Pos2, text: impl Into<String>, size: f32, color: Color32) -> Self {
        Self::new(SceneShape::Text {
            anchor,
            text: text.into(),
            size,
        })
        .fill(color)
    }

    pub fn stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = stroke;
        self
    }

    pub fn fill(mut self, fill: Color32) -> Self {
        self.fill = fill;
        self
    }

    pub fn z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    pub fn owner(mut self, owner: ItemOwner) -> Self {
        self.owner = Some(owner);
        self
    }

    /// 히트 테스트를 수행한다. 숨김 아이템은 맞지 않는다.
    pub fn hit(&self, point: Pos2) -> bool {
        self.visible && self.shape.hit(point, self.stroke.width)
    }
}

/// 유지형(retained) 2D 씬 그래프이다.
///
/// 엔티티의 시각 표현은 모두 이 레지스트리가 소유하고, 엔티티 쪽은
/// [`ItemHandle`]만 보관한다.
#[derive(Debug, Default)]
pub struct Scene {
    items: BTreeMap<ItemHandle, SceneItem>,
    next_id: u64,
    #[cfg(test)]
    removal_log: Vec<ItemHandle>,
}

impl Scene {
    /// 빈 씬을 만든다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 아이템을 등록하고 핸들을 돌려준다.
    pub fn add(&mut self, item: SceneItem) -> ItemHandle {
        self.next_id += 1;
        let handle = ItemHandle(self.next_id);
        self.items.insert(handle, item);
        handle
    }

    /// 아이템을 제거한다. 이미 없으면 `false`를 반환한다.
    pub fn remove(&mut self, handle: ItemHandle) -> bool {
        let removed = self.items.remove(&handle).is_some();
        #[cfg(test)]
        if removed {
            self.removal_log.push(handle);
        }
        removed
    }

    /// 핸들이 현재 씬의 멤버인지 확인한다.
    pub fn contains(&self, handle: ItemHandle) -> bool {
        self.items.contains_key(&handle)
    }

    pub fn get(&self, handle: ItemHandle) -> Option<&SceneItem> {
        self.items.get(&handle)
    }

    pub fn get_mut(&mut self, handle: ItemHandle) -> Option<&mut SceneItem> {
        self.items.get_mut(&handle)
    }

    /// 살아 있는 아이템에만 변경을 적용한다.
    pub fn update(&mut self, handle: ItemHandle, apply: impl FnOnce(&mut SceneItem)) -> bool {
        match self.items.get_mut(&handle) {
            Some(item) => {
                apply(item);
                true
            }
            None => false,
        }
    }

    /// 표시 여부를 바꾼다.
    pub fn set_visible(&mut self, handle: ItemHandle, visible: bool) -> bool {
        self.update(handle, |item| item.visible = visible)
    }

    /// 모든 아이템을 제거한다. 기존 핸들은 모두 무효가 된다.
    pub fn clear(&mut self) {
        #[cfg(test)]
        self.removal_log.extend(self.items.keys().copied());
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 그리기 순서(z, 등록 순)로 정렬된 아이템 목록을 반환한다.
    pub fn ordered_items(&self) -> Vec<(ItemHandle, &SceneItem)> {
        let mut ordered: Vec<(ItemHandle, &SceneItem)> =
            self.items.iter().map(|(h, item)| (*h, item)).collect();
        ordered.sort_by(|a, b| a.1.z.total_cmp(&b.1.z).then(a.0.cmp(&b.0)));
        ordered
    }

    /// 점 아래의 아이템을 위에 그려진 것부터 반환한다.
    pub fn items_at(&self, point: Pos2) -> Vec<ItemHandle> {
        let mut hits: Vec<(ItemHandle, &SceneItem)> = self
            .ordered_items()
            .into_iter()
            .filter(|(_, item)| item.hit(point))
            .collect();
        hits.reverse();
        hits.into_iter().map(|(handle, _)| handle).collect()
    }

    /// 점 아래에서 소유자가 있는 최상단 아이템의 소유자를 찾는다.
    pub fn owner_at(&self, point: Pos2, accept: impl Fn(&ItemOwner) -> bool) -> Option<ItemOwner> {
        self.items_at(point)
            .into_iter()
            .filter_map(|handle| self.get(handle).and_then(|item| item.owner))
            .find(|owner| accept(owner))
    }

    /// 조건을 만족하는 표시 아이템 전체의 경계 사각형을 계산한다.
    pub fn bounding_rect(&self, include: impl Fn(&SceneItem) -> bool) -> Option<Rect> {
        self.items
            .values()
            .filter(|item| item.visible && include(item))
            .map(|item| item.shape.bounds().expand(item.stroke.width / 2.0))
            .reduce(|acc, rect| acc.union(rect))
    }

    #[cfg(test)]
    pub(crate) fn removal_log(&self) -> &[ItemHandle] {
        &self.removal_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(x: f32, y: f32, r: f32) -> SceneItem {
        SceneItem::new(SceneShape::Circle {
            center: egui::pos2(x, y),
            radius: r,
        })
    }

    /// 제거된 핸들로 다시 제거해도 오류 없이 false가 반환되는지 확인한다.
    #[test]
    fn removing_stale_handle_is_noop() {
        let mut scene = Scene::new();
        let handle = scene.add(circle(0.0, 0.0, 5.0));
        assert!(scene.remove(handle));
        assert!(!scene.remove(handle));
        assert!(!scene.contains(handle));
        assert!(!scene.set_visible(handle, false));
    }

    /// clear 이후 새로 추가한 아이템이 과거 핸들과 충돌하지 않는지 확인한다.
    #[test]
    fn handles_are_not_reused_after_clear() {
        let mut scene = Scene::new();
        let old = scene.add(circle(0.0, 0.0, 5.0));
        scene.clear();
        let fresh = scene.add(circle(0.0, 0.0, 5.0));
        assert_ne!(old, fresh);
        assert!(!scene.contains(old));
        assert!(scene.contains(fresh));
    }

    /// 히트 테스트가 z 순서상 위에 있는 아이템을 먼저 돌려주는지 확인한다.
    #[test]
    fn items_at_returns_topmost_first() {
        let mut scene = Scene::new();
        let back = scene.add(circle(0.0, 0.0, 10.0).z(-1.0));
        let front = scene.add(circle(0.0, 0.0, 10.0).z(1.0));
        let hidden = scene.add(circle(0.0, 0.0, 10.0).z(2.0));
        scene.set_visible(hidden, false);
        assert_eq!(scene.items_at(egui::pos2(2.0, 2.0)), vec![front, back]);
        assert!(scene.items_at(egui::pos2(50.0, 50.0)).is_empty());
    }

    /// 선 도형은 허용 거리 안쪽 클릭만 맞는 것으로 판단한다.
    #[test]
    fn line_hit_uses_tolerance() {
        let item = SceneItem::new(SceneShape::Line {
            from: egui::pos2(0.0, 0.0),
            to: egui::pos2(100.0, 0.0),
        })
        .stroke(Stroke::new(2.0, Color32::WHITE));
        assert!(item.hit(egui::pos2(50.0, 2.5)));
        assert!(!item.hit(egui::pos2(50.0, 6.0)));
    }

    /// 경계 사각형이 표시 중인 아이템만 포함하는지 확인한다.
    #[test]
    fn bounding_rect_ignores_hidden_items() {
        let mut scene = Scene::new();
        scene.add(circle(0.0, 0.0, 5.0));
        let far = scene.add(circle(500.0, 500.0, 5.0));
        scene.set_visible(far, false);
        let rect = scene.bounding_rect(|_| true).expect("경계 없음");
        assert_eq!(rect, Rect::from_min_max(egui::pos2(-5.0, -5.0), egui::pos2(5.0, 5.0)));
    }
}
