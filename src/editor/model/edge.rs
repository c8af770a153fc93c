use eframe::egui::{self, Color32, Pos2, Vec2};

use super::node::NodeKey;
use super::scene::ItemHandle;
use crate::theme::ScenePalette;

/// 엣지 기본 제한 속도(m/s, 약 50km/h).
pub const DEFAULT_SPEED: f32 = 13.89;
/// 엣지 기본 차로 수.
pub const DEFAULT_LANES: u32 = 1;
/// 고속도로로 분류되는 속도 하한(m/s, 100km/h).
pub const HIGHWAY_SPEED: f32 = 27.78;
/// 간선 도로로 분류되는 속도 하한(m/s, 50km/h).
pub const MAIN_ROAD_SPEED: f32 = 13.89;
/// 속성 편집에서 허용하는 차로 범위.
pub const LANE_RANGE: std::ops::RangeInclusive<u32> = 1..=6;
/// 속성 편집에서 허용하는 속도 범위.
pub const SPEED_RANGE: std::ops::RangeInclusive<f32> = 5.0..=50.0;

/// 엣지 라벨 글자 크기.
pub const EDGE_LABEL_SIZE: f32 = 8.0;
/// 선 중앙 기준 라벨 위치.
pub const EDGE_LABEL_OFFSET: Vec2 = egui::vec2(5.0, -15.0);

/// 차로 표시를 그리기 위한 최소 선 길이.
pub const LANE_MARKER_MIN_LENGTH: f32 = 50.0;
/// 한 엣지에 그리는 차로 표시 최대 개수.
pub const LANE_MARKER_MAX: usize = 5;
const LANE_MARKER_HALF_LENGTH: f32 = 5.0;
const LANE_MARKER_WING: f32 = 3.0;

/// 그래프 내부에서 엣지를 가리키는 키이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(pub(crate) u64);

/// 속도에 따른 도로 등급.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadClass {
    Highway,
    MainRoad,
    Local,
}

impl RoadClass {
    pub fn from_speed(speed: f32) -> Self {
        if speed > HIGHWAY_SPEED {
            RoadClass::Highway
        } else if speed > MAIN_ROAD_SPEED {
            RoadClass::MainRoad
        } else {
            RoadClass::Local
        }
    }

    pub fn color(self, palette: &ScenePalette) -> Color32 {
        match self {
            RoadClass::Highway => palette.highway,
            RoadClass::MainRoad => palette.main_road,
            RoadClass::Local => palette.local_road,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RoadClass::Highway => "고속도로",
            RoadClass::MainRoad => "간선도로",
            RoadClass::Local => "지역도로",
        }
    }
}

/// 차로 수에 따른 선 두께.
pub fn stroke_width(lanes: u32) -> f32 {
    1.0 + lanes as f32
}

/// 엣지가 씬에 보유한 그래픽 핸들 묶음이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeVisual {
    /// 본체 선.
    pub line: ItemHandle,
    /// ID 라벨.
    pub label: Option<ItemHandle>,
    /// 차로 방향 표시.
    pub lane_markers: Vec<ItemHandle>,
}

/// 두 노드를 잇는 도로 엣지.
#[derive(Debug, Clone)]
pub struct Edge {
    pub key: EdgeKey,
    pub id: String,
    /// 시작 노드.
    pub source: NodeKey,
    /// 도착 노드.
    pub target: NodeKey,
    /// 차로 수(1 이상).
    pub lanes: u32,
    /// 제한 속도(m/s).
    pub speed: f32,
    pub selected: bool,
    pub visual: Option<EdgeVisual>,
}

impl Edge {
    pub fn new(
        key: EdgeKey,
        id: impl Into<String>,
        source: NodeKey,
        target: NodeKey,
        lanes: u32,
        speed: f32,
    ) -> Self {
        Self {
            key,
            id: id.into(),
            source,
            target,
            lanes: lanes.max(1),
            speed,
            selected: false,
            visual: None,
        }
    }

    pub fn road_class(&self) -> RoadClass {
        RoadClass::from_speed(self.speed)
    }

    pub fn stroke_width(&self) -> f32 {
        stroke_width(self.lanes)
    }

    /// 노드 키가 이 엣지의 양 끝 중 하나인지 확인한다.
    pub fn touches(&self, node: NodeKey) -> bool {
        self.source == node || self.target == node
    }
}

/// 선 중앙 기준 라벨 위치를 계산한다.
pub fn edge_label_anchor(from: Pos2, to: Pos2) -> Pos2 {
    from.lerp(to, 0.5) + EDGE_LABEL_OFFSET
}

/// 차로 방향 표시 폴리라인 목록을 계산한다.
///
/// 각 표시는 `밑점 -> 끝점 -> 날개1 -> 끝점 -> 날개2` 순서의 다섯 점으로 구성된다.
/// 차로가 1개 이하이거나 선 길이가 최소 길이보다 짧으면 빈 목록을 반환한다.
pub fn lane_marker_polylines(from: Pos2, to: Pos2, lanes: u32) -> Vec<[Pos2; 5]> {
    if lanes <= 1 {
        return Vec::new();
    }
    let delta = to - from;
    let length = delta.length();
    if !length.is_finite() || length < LANE_MARKER_MIN_LENGTH {
        return Vec::new();
    }
    let dir = delta / length;
    let perp = egui::vec2(-dir.y, dir.x);
    let segments = ((length / LANE_MARKER_MIN_LENGTH) as usize).min(LANE_MARKER_MAX);

    (0..segments)
        .map(|i| {
            let t = (i + 1) as f32 / (segments + 1) as f32;
            let center = from + delta * t;
            let base = center - dir * LANE_MARKER_HALF_LENGTH;
            let tip = center + dir * LANE_MARKER_HALF_LENGTH;
            let wing1 = tip - dir * LANE_MARKER_WING + perp * LANE_MARKER_WING;
            let wing2 = tip - dir * LANE_MARKER_WING - perp * LANE_MARKER_WING;
            [base, tip, wing1, tip, wing2]
        })
        .collect()
}
