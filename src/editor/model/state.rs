use eframe::egui::{self, CursorIcon, Pos2, Stroke, Vec2};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, info};

use super::decor::{banner_item, render_decorations};
use super::draw_mode::DrawMode;
use super::edge::{DEFAULT_LANES, DEFAULT_SPEED, EdgeKey, LANE_RANGE, SPEED_RANGE};
use super::error::EditorError;
use super::graph::NetworkGraph;
use super::node::NodeKey;
use super::scene::{ItemHandle, ItemOwner, Scene, SceneItem, SceneShape};
use super::sync::{SceneSync, layer};
use super::viewport::{ViewTransform, ZOOM_STEP};
use crate::theme::ScenePalette;

/// 스냅 임계 거리 기본값.
pub const DEFAULT_SNAP_THRESHOLD: f32 = 20.0;

static SUMO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.:#-]+$").expect("정규식 컴파일 실패"));

/// SUMO가 받아들이는 ID인지 검사한다.
pub fn validate_id(id: &str) -> Result<(), EditorError> {
    if SUMO_ID.is_match(id) {
        Ok(())
    } else {
        Err(EditorError::InvalidId(id.to_string()))
    }
}

/// 선택 가능한 엔티티.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Node(NodeKey),
    Edge(EdgeKey),
}

impl From<ItemOwner> for Selection {
    fn from(owner: ItemOwner) -> Self {
        match owner {
            ItemOwner::Node(key) => Selection::Node(key),
            ItemOwner::Edge(key) => Selection::Edge(key),
        }
    }
}

/// Idle 모드 드래그 대상.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DragTarget {
    Node { key: NodeKey, moved: bool },
    Canvas,
}

/// 네트워크 편집기 전체 상태를 보관하는 파사드이다.
///
/// 노드/엣지 그래프와 씬을 단독으로 소유하며, 구조를 바꾸는 공개 연산은
/// 완료 후 정확히 한 번 변경 알림(`revision` 증가)을 남긴다.
#[derive(Debug)]
pub struct NetworkEditorState {
    pub(crate) graph: NetworkGraph,
    pub(crate) scene: Scene,
    pub(crate) palette: ScenePalette,
    pub(crate) decorations: Vec<ItemHandle>,
    pub(crate) mode: DrawMode,
    pub(crate) banner: Option<ItemHandle>,
    pub(crate) preview: Option<ItemHandle>,
    pub(crate) drag: Option<DragTarget>,
    pub(crate) snap_threshold: f32,
    /// 캔버스 보기 변환.
    pub view: ViewTransform,
    /// 현재 문서 경로.
    pub current_file: Option<PathBuf>,
    revision: u64,
    dirty: bool,
}

impl Default for NetworkEditorState {
    fn default() -> Self {
        Self::new(ScenePalette::default(), DEFAULT_SNAP_THRESHOLD)
    }
}

impl NetworkEditorState {
    /// 빈 네트워크와 배경 장식을 가진 편집기를 만든다.
    pub fn new(palette: ScenePalette, snap_threshold: f32) -> Self {
        let mut scene = Scene::new();
        let decorations = render_decorations(&mut scene, &palette);
        Self {
            graph: NetworkGraph::new(),
            scene,
            palette,
            decorations,
            mode: DrawMode::Idle,
            banner: None,
            preview: None,
            drag: None,
            snap_threshold,
            view: ViewTransform::default(),
            current_file: None,
            revision: 0,
            dirty: false,
        }
    }

    pub(crate) fn sync(&mut self) -> SceneSync<'_> {
        SceneSync::new(&mut self.scene, &mut self.graph, &self.palette)
    }

    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn palette(&self) -> &ScenePalette {
        &self.palette
    }

    /// 변경 알림 횟수. 외부 구독자는 이 값의 변화를 감지한다.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 저장 완료 후 dirty 플래그를 내린다.
    pub fn mark_saved(&mut self, path: Option<PathBuf>) {
        if path.is_some() {
            self.current_file = path;
        }
        self.dirty = false;
    }

    pub(crate) fn notify_changed(&mut self) {
        self.revision += 1;
        self.dirty = true;
        debug!(revision = self.revision, "네트워크 변경");
    }

    pub fn snap_threshold(&self) -> f32 {
        self.snap_threshold
    }

    pub fn set_snap_threshold(&mut self, threshold: f32) {
        self.snap_threshold = threshold.max(0.0);
    }

    /// 노드를 만들고 씬에 붙인다. ID를 주지 않으면 `node_{개수}`가 된다.
    pub fn create_node(&mut self, position: Pos2, id: Option<String>) -> NodeKey {
        let key = self.add_node(position, id);
        self.notify_changed();
        key
    }

    pub(crate) fn add_node(&mut self, position: Pos2, id: Option<String>) -> NodeKey {
        let id = id.unwrap_or_else(|| format!("node_{}", self.graph.node_count()));
        let key = self.graph.insert_node(id, position);
        self.sync().attach_node(key);
        key
    }

    /// 두 노드를 잇는 엣지를 만든다. ID를 주지 않으면 `edge_{개수}`가 된다.
    pub fn create_edge(
        &mut self,
        source: NodeKey,
        target: NodeKey,
        id: Option<String>,
        lanes: u32,
        speed: f32,
    ) -> Result<EdgeKey, EditorError> {
        let key = self.add_edge(source, target, id, lanes, speed)?;
        self.notify_changed();
        Ok(key)
    }

    pub(crate) fn add_edge(
        &mut self,
        source: NodeKey,
        target: NodeKey,
        id: Option<String>,
        lanes: u32,
        speed: f32,
    ) -> Result<EdgeKey, EditorError> {
        let id = id.unwrap_or_else(|| format!("edge_{}", self.graph.edge_count()));
        let key = self.graph.insert_edge(id, source, target, lanes, speed)?;
        self.sync().attach_edge(key);
        Ok(key)
    }

    /// 기본 차로 수와 속도로 엣지를 만든다.
    pub fn create_default_edge(
        &mut self,
        source: NodeKey,
        target: NodeKey,
    ) -> Result<EdgeKey, EditorError> {
        self.create_edge(source, target, None, DEFAULT_LANES, DEFAULT_SPEED)
    }

    /// 엣지 그래픽을 떼어낸 뒤 그래프에서 제거한다.
    pub(crate) fn remove_edge_entity(&mut self, key: EdgeKey) -> bool {
        self.sync().detach_edge(key);
        self.graph.remove_edge(key).is_some()
    }

    /// 연결 엣지를 먼저 모두 제거한 뒤 노드를 제거한다.
    pub(crate) fn remove_node_entity(&mut self, key: NodeKey) -> bool {
        for edge in self.graph.incident_edges(key) {
            self.remove_edge_entity(edge);
        }
        self.sync().detach_node(key);
        if self.pending_start() == Some(key) {
            self.cancel_pending();
        }
        self.graph.remove_node(key).is_some()
    }

    pub fn delete_node(&mut self, key: NodeKey) -> bool {
        let removed = self.remove_node_entity(key);
        if removed {
            self.notify_changed();
        }
        removed
    }

    pub fn delete_edge(&mut self, key: EdgeKey) -> bool {
        let removed = self.remove_edge_entity(key);
        if removed {
            self.notify_changed();
        }
        removed
    }

    /// 선택된 엣지와 노드를 모두 삭제하고 변경 알림을 한 번 남긴다.
    pub fn delete_selected(&mut self) -> usize {
        let selected = self.selection();
        let mut removed = 0;
        for item in &selected {
            let done = match *item {
                Selection::Node(key) => self.remove_node_entity(key),
                Selection::Edge(key) => self.remove_edge_entity(key),
            };
            if done {
                removed += 1;
            }
        }
        info!(removed, "선택 항목 삭제");
        self.notify_changed();
        removed
    }

    /// 모든 엔티티와 그래픽을 지우고 배경 장식을 다시 그린다.
    pub fn clear(&mut self) {
        self.reset_network();
        self.notify_changed();
    }

    pub(crate) fn reset_network(&mut self) {
        let edges: Vec<EdgeKey> = self.graph.edges().iter().map(|e| e.key).collect();
        let nodes: Vec<NodeKey> = self.graph.nodes().iter().map(|n| n.key).collect();
        {
            let mut sync = self.sync();
            for edge in edges {
                sync.detach_edge(edge);
            }
            for node in nodes {
                sync.detach_node(node);
            }
        }
        self.graph.clear();
        self.scene.clear();
        self.preview = None;
        self.banner = None;
        self.drag = None;
        if let DrawMode::Drawing { pending_start } = &mut self.mode {
            *pending_start = None;
        }
        self.decorations = render_decorations(&mut self.scene, &self.palette);
        if self.is_drawing() {
            self.show_banner();
        }
    }

    /// 노드를 지정 위치로 옮긴다.
    pub fn move_node(&mut self, key: NodeKey, position: Pos2) {
        if self.reposition_node(key, position) {
            self.notify_changed();
        }
    }

    pub(crate) fn reposition_node(&mut self, key: NodeKey, position: Pos2) -> bool {
        let Some(node) = self.graph.node_mut(key) else {
            return false;
        };
        node.position = position;
        self.sync().on_node_moved(key);
        true
    }

    /// 엣지의 차로 수와 제한 속도를 바꾸고 스타일과 차로 표시를 다시 만든다.
    pub fn set_edge_properties(
        &mut self,
        key: EdgeKey,
        lanes: u32,
        speed: f32,
    ) -> Result<(), EditorError> {
        if !LANE_RANGE.contains(&lanes) {
            return Err(EditorError::OutOfRange {
                field: "lanes",
                value: lanes.to_string(),
            });
        }
        if !SPEED_RANGE.contains(&speed) {
            return Err(EditorError::OutOfRange {
                field: "speed",
                value: speed.to_string(),
            });
        }
        let edge = self
            .graph
            .edge_mut(key)
            .ok_or_else(|| EditorError::UnknownEdge(format!("{key:?}")))?;
        edge.lanes = lanes;
        edge.speed = speed;
        self.sync().refresh_edge_style(key);
        self.notify_changed();
        Ok(())
    }

    /// 노드 ID를 바꾼다.
    pub fn rename_node(&mut self, key: NodeKey, new_id: &str) -> Result<(), EditorError> {
        let new_id = new_id.trim();
        validate_id(new_id)?;
        let current = self
            .graph
            .node(key)
            .ok_or_else(|| EditorError::UnknownNode(format!("{key:?}")))?;
        if current.id == new_id {
            return Ok(());
        }
        if self.graph.node_by_id(new_id).is_some() {
            return Err(EditorError::DuplicateId(new_id.to_string()));
        }
        if let Some(node) = self.graph.node_mut(key) {
            node.id = new_id.to_string();
        }
        self.sync().refresh_node_label(key);
        self.notify_changed();
        Ok(())
    }

    /// 엣지 ID를 바꾼다.
    pub fn rename_edge(&mut self, key: EdgeKey, new_id: &str) -> Result<(), EditorError> {
        let new_id = new_id.trim();
        validate_id(new_id)?;
        let current = self
            .graph
            .edge(key)
            .ok_or_else(|| EditorError::UnknownEdge(format!("{key:?}")))?;
        if current.id == new_id {
            return Ok(());
        }
        if self.graph.edge_by_id(new_id).is_some() {
            return Err(EditorError::DuplicateId(new_id.to_string()));
        }
        if let Some(edge) = self.graph.edge_mut(key) {
            edge.id = new_id.to_string();
        }
        self.sync().refresh_edge_label(key);
        self.notify_changed();
        Ok(())
    }

    /// 현재 선택된 엔티티 목록(노드 먼저, 삽입 순).
    pub fn selection(&self) -> Vec<Selection> {
        let nodes = self
            .graph
            .nodes()
            .iter()
            .filter(|n| n.selected)
            .map(|n| Selection::Node(n.key));
        let edges = self
            .graph
            .edges()
            .iter()
            .filter(|e| e.selected)
            .map(|e| Selection::Edge(e.key));
        nodes.chain(edges).collect()
    }

    /// 단일 선택 항목이 있으면 반환한다.
    pub fn single_selection(&self) -> Option<Selection> {
        let selection = self.selection();
        match selection.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn set_selected(&mut self, item: Selection, selected: bool) {
        match item {
            Selection::Node(key) => self.sync().on_node_selection_changed(key, selected),
            Selection::Edge(key) => self.sync().on_edge_selection_changed(key, selected),
        }
    }

    pub fn clear_selection(&mut self) {
        for item in self.selection() {
            self.set_selected(item, false);
        }
    }

    /// 기존 선택을 지우고 하나만 선택한다.
    pub fn select_only(&mut self, item: Selection) {
        for current in self.selection() {
            if current != item {
                self.set_selected(current, false);
            }
        }
        self.set_selected(item, true);
    }

    pub fn is_selected(&self, item: Selection) -> bool {
        match item {
            Selection::Node(key) => self.graph.node(key).map(|n| n.selected).unwrap_or(false),
            Selection::Edge(key) => self.graph.edge(key).map(|e| e.selected).unwrap_or(false),
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.mode, DrawMode::Drawing { .. })
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// 그리기 모드에서 체인 시작점으로 잡힌 노드.
    pub fn pending_start(&self) -> Option<NodeKey> {
        match self.mode {
            DrawMode::Drawing { pending_start } => pending_start,
            DrawMode::Idle => None,
        }
    }

    pub fn preview_line(&self) -> Option<ItemHandle> {
        self.preview
    }

    pub fn banner(&self) -> Option<ItemHandle> {
        self.banner
    }

    /// 그리기 모드에 들어간다. 이미 그리기 중이면 배너만 보장한다.
    pub fn enter_drawing_mode(&mut self) {
        if !self.is_drawing() {
            self.mode = DrawMode::Drawing {
                pending_start: None,
            };
            self.drag = None;
            info!("그리기 모드 진입");
        }
        self.show_banner();
    }

    /// 그리기 모드를 끝내고 진행 중인 미리보기와 시작점을 버린다.
    pub fn exit_drawing_mode(&mut self) {
        if !self.is_drawing() {
            return;
        }
        self.cancel_pending();
        self.mode = DrawMode::Idle;
        if let Some(banner) = self.banner {
            self.scene.set_visible(banner, false);
        }
        info!("그리기 모드 종료");
    }

    pub fn toggle_drawing_mode(&mut self) {
        if self.is_drawing() {
            self.exit_drawing_mode();
        } else {
            self.enter_drawing_mode();
        }
    }

    fn show_banner(&mut self) {
        match self.banner {
            Some(banner) if self.scene.contains(banner) => {
                self.scene.set_visible(banner, true);
            }
            _ => {
                let item = banner_item(&self.palette);
                self.banner = Some(self.scene.add(item));
            }
        }
    }

    /// 시작점 강조와 미리보기 선을 모두 해제한다.
    pub(crate) fn cancel_pending(&mut self) {
        let start = match &mut self.mode {
            DrawMode::Drawing { pending_start } => pending_start.take(),
            DrawMode::Idle => None,
        };
        if let Some(start) = start {
            self.sync().set_node_active(start, false);
        }
        self.discard_preview();
    }

    pub(crate) fn discard_preview(&mut self) {
        if let Some(preview) = self.preview.take() {
            if self.scene.contains(preview) {
                self.scene.remove(preview);
            }
        }
    }

    pub(crate) fn replace_preview(&mut self, from: Pos2, to: Pos2) {
        self.discard_preview();
        let item = SceneItem::new(SceneShape::DashedLine { from, to })
            .stroke(Stroke::new(2.0, self.palette.preview_line))
            .z(layer::PREVIEW);
        self.preview = Some(self.scene.add(item));
    }

    /// 그리기 모드에서는 십자 커서를 쓴다.
    pub fn cursor_icon(&self) -> CursorIcon {
        if self.is_drawing() {
            CursorIcon::Crosshair
        } else {
            CursorIcon::Default
        }
    }

    /// 빈 캔버스 드래그로 화면 이동이 가능한지 여부.
    pub fn pan_enabled(&self) -> bool {
        !self.is_drawing()
    }

    pub fn zoom_in(&mut self, anchor: Vec2) {
        self.view.zoom_at(ZOOM_STEP, anchor);
    }

    pub fn zoom_out(&mut self, anchor: Vec2) {
        self.view.zoom_at(1.0 / ZOOM_STEP, anchor);
    }

    /// 네트워크 전체가 보이도록 보기를 맞춘다. 네트워크가 비어 있으면 원점으로 돌아간다.
    pub fn fit_view(&mut self, viewport: Vec2) {
        let content = self
            .scene
            .bounding_rect(|item| item.owner.is_some())
            .map(|rect| rect.expand(40.0));
        self.view = match content {
            Some(rect) => ViewTransform::fit(rect, viewport),
            None => ViewTransform::default(),
        };
    }

    /// 클릭 위치의 노드를 찾는다. 직접 히트가 없으면 임계 거리 안의 가장 가까운 노드를 쓴다.
    pub fn node_at(&self, point: Pos2) -> Option<NodeKey> {
        let hit = self
            .scene
            .owner_at(point, |owner| matches!(owner, ItemOwner::Node(_)));
        match hit {
            Some(ItemOwner::Node(key)) => Some(key),
            _ => self.graph.nearest_node(point, self.snap_threshold),
        }
    }

    /// 클릭 위치의 엔티티를 노드 우선으로 찾는다.
    pub fn entity_at(&self, point: Pos2) -> Option<Selection> {
        self.scene
            .owner_at(point, |owner| matches!(owner, ItemOwner::Node(_)))
            .or_else(|| {
                self.scene
                    .owner_at(point, |owner| matches!(owner, ItemOwner::Edge(_)))
            })
            .map(Selection::from)
    }

    /// 엔티티마다 그래픽이 연결되어 있고, 씬의 소유 아이템이 살아 있는 엔티티만 가리키는지 검사한다.
    #[cfg(test)]
    pub(crate) fn visuals_consistent(&self) -> bool {
        let nodes_ok = self.graph.nodes().iter().all(|node| {
            node.visual
                .as_ref()
                .map(|v| v.handles().all(|h| self.scene.contains(h)))
                .unwrap_or(false)
        });
        let edges_ok = self.graph.edges().iter().all(|edge| {
            edge.visual
                .as_ref()
                .map(|v| {
                    self.scene.contains(v.line)
                        && v.label.map(|h| self.scene.contains(h)).unwrap_or(true)
                        && v.lane_markers.iter().all(|h| self.scene.contains(*h))
                })
                .unwrap_or(false)
        });
        let owned = self
            .scene
            .ordered_items()
            .into_iter()
            .filter_map(|(_, item)| item.owner)
            .all(|owner| match owner {
                ItemOwner::Node(key) => self.graph.node(key).is_some(),
                ItemOwner::Edge(key) => self.graph.edge(key).is_some(),
            });
        let expected_items: usize = self
            .graph
            .nodes()
            .iter()
            .filter_map(|n| n.visual.as_ref())
            .map(|v| v.handles().count())
            .sum::<usize>()
            + self
                .graph
                .edges()
                .iter()
                .filter_map(|e| e.visual.as_ref())
                .map(|v| 1 + v.label.iter().count() + v.lane_markers.len())
                .sum::<usize>()
            + self.decorations.len()
            + self.banner.iter().count()
            + self.preview.iter().count();
        nodes_ok && edges_ok && owned && expected_items == self.scene.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::model::draw_mode::{CanvasInput, EditorKey};

    fn editor() -> NetworkEditorState {
        NetworkEditorState::default()
    }

    /// 생성과 삭제를 반복해도 그래픽 집합이 엔티티 집합과 항상 일치한다.
    #[test]
    fn visuals_track_entities_through_mutations() {
        let mut ed = editor();
        let a = ed.create_node(egui::pos2(0.0, 0.0), None);
        assert!(ed.visuals_consistent());
        let b = ed.create_node(egui::pos2(200.0, 0.0), None);
        let c = ed.create_node(egui::pos2(200.0, 200.0), None);
        let ab = ed.create_edge(a, b, None, 3, DEFAULT_SPEED).expect("ab");
        ed.create_edge(b, c, None, 1, 30.0).expect("bc");
        assert!(ed.visuals_consistent());
        assert!(ed.delete_edge(ab));
        assert!(ed.visuals_consistent());
        assert!(ed.delete_node(b));
        assert!(ed.visuals_consistent());
        assert!(ed.graph().incidence_consistent());
        assert_eq!(ed.graph().edge_count(), 0);
        assert_eq!(ed.graph().node_count(), 2);
    }

    /// 노드 삭제 시 연결 엣지 그래픽이 노드 그래픽보다 먼저 제거된다.
    #[test]
    fn node_delete_removes_edge_visuals_first() {
        let mut ed = editor();
        let a = ed.create_node(egui::pos2(0.0, 0.0), None);
        let b = ed.create_node(egui::pos2(300.0, 0.0), None);
        let e = ed.create_edge(a, b, None, 4, DEFAULT_SPEED).expect("edge");
        let edge_visual = ed.graph().edge(e).and_then(|e| e.visual.clone()).expect("edge visual");
        let node_visual = ed.graph().node(a).and_then(|n| n.visual.clone()).expect("node visual");
        assert_eq!(edge_visual.lane_markers.len(), 5);

        let before = ed.scene().removal_log().len();
        ed.delete_node(a);
        let log = &ed.scene().removal_log()[before..];
        let position = |h: ItemHandle| log.iter().position(|x| *x == h).expect("removed");
        let last_edge = edge_visual
            .lane_markers
            .iter()
            .copied()
            .chain(edge_visual.label)
            .chain(std::iter::once(edge_visual.line))
            .map(position)
            .max()
            .expect("edge handles");
        let first_node = node_visual.handles().map(position).min().expect("node handles");
        assert!(last_edge < first_node);
        assert_eq!(position(edge_visual.line), position(edge_visual.lane_markers[0]) + 6);
    }

    /// 공개 변경 연산은 한 번씩만 알림을 남긴다.
    #[test]
    fn each_mutation_notifies_once() {
        let mut ed = editor();
        let a = ed.create_node(egui::pos2(0.0, 0.0), None);
        assert_eq!(ed.revision(), 1);
        let b = ed.create_node(egui::pos2(100.0, 0.0), None);
        let e = ed.create_default_edge(a, b).expect("edge");
        assert_eq!(ed.revision(), 3);
        let c = ed.create_node(egui::pos2(0.0, 100.0), None);
        ed.select_only(Selection::Node(c));
        ed.set_selected(Selection::Edge(e), true);
        assert_eq!(ed.revision(), 4);
        assert_eq!(ed.delete_selected(), 2);
        assert_eq!(ed.revision(), 5);
        assert_eq!(ed.delete_selected(), 0);
        assert_eq!(ed.revision(), 6);
        ed.clear();
        assert_eq!(ed.revision(), 7);
        assert!(ed.is_dirty());
    }

    /// 선택이 비어 있어도 Delete 키는 알림을 정확히 한 번 남긴다.
    #[test]
    fn delete_key_with_empty_selection_notifies_once() {
        let mut ed = editor();
        ed.create_node(egui::pos2(0.0, 0.0), None);
        ed.clear_selection();
        let revision = ed.revision();
        ed.handle_input(CanvasInput::Key(EditorKey::Delete))
            .expect("delete");
        assert_eq!(ed.revision(), revision + 1);
        assert_eq!(ed.graph().node_count(), 1);
    }

    fn label_anchors(ed: &NetworkEditorState) -> Vec<(String, Pos2)> {
        let mut labels: Vec<_> = ed
            .scene()
            .ordered_items()
            .into_iter()
            .filter_map(|(_, item)| match &item.shape {
                SceneShape::Text { anchor, text, .. } => Some((text.clone(), *anchor)),
                _ => None,
            })
            .collect();
        labels.sort_by(|a, b| a.0.cmp(&b.0));
        labels
    }

    /// 같은 위치로 두 번 이동 동기화해도 씬 구성이 그대로다.
    #[test]
    fn repeated_move_sync_is_idempotent() {
        let mut ed = editor();
        let a = ed.create_node(egui::pos2(0.0, 0.0), None);
        let b = ed.create_node(egui::pos2(300.0, 0.0), None);
        let e = ed.create_edge(a, b, None, 4, DEFAULT_SPEED).expect("edge");
        let markers = |ed: &NetworkEditorState| {
            ed.graph()
                .edge(e)
                .and_then(|edge| edge.visual.as_ref())
                .map(|v| v.lane_markers.len())
                .unwrap_or(0)
        };

        ed.move_node(b, egui::pos2(300.0, 40.0));
        let first = (ed.scene().len(), markers(&ed), label_anchors(&ed));
        assert!(ed.visuals_consistent());

        ed.sync().on_node_moved(b);
        let second = (ed.scene().len(), markers(&ed), label_anchors(&ed));
        assert!(ed.visuals_consistent());
        assert_eq!(first, second);
        assert_eq!(second.1, 5);

        ed.move_node(b, egui::pos2(300.0, 40.0));
        assert_eq!((ed.scene().len(), markers(&ed), label_anchors(&ed)), second);
        assert!(ed.visuals_consistent());
    }

    /// clear 이후 엔티티가 비고 배경 장식만 남는다.
    #[test]
    fn clear_restores_decorations_only() {
        let mut ed = editor();
        let base = ed.scene().len();
        let a = ed.create_node(egui::pos2(0.0, 0.0), None);
        let b = ed.create_node(egui::pos2(100.0, 0.0), None);
        ed.create_default_edge(a, b).expect("edge");
        ed.enter_drawing_mode();
        ed.clear();
        assert_eq!(ed.graph().node_count(), 0);
        assert_eq!(ed.pending_start(), None);
        assert_eq!(ed.preview_line(), None);
        // 그리기 모드 배너가 다시 만들어진다.
        assert_eq!(ed.scene().len(), base + 1);
        assert!(ed.visuals_consistent());
    }

    /// 다른 엣지가 이미 쓰는 ID로 바꾸면 실패하고 모델은 그대로다.
    #[test]
    fn rename_edge_rejects_duplicates() {
        let mut ed = editor();
        let a = ed.create_node(egui::pos2(0.0, 0.0), None);
        let b = ed.create_node(egui::pos2(100.0, 0.0), None);
        let c = ed.create_node(egui::pos2(100.0, 100.0), None);
        let e0 = ed.create_default_edge(a, b).expect("e0");
        ed.create_default_edge(b, c).expect("e1");
        let revision = ed.revision();
        assert!(matches!(
            ed.rename_edge(e0, "edge_1"),
            Err(EditorError::DuplicateId(_))
        ));
        assert!(matches!(
            ed.rename_edge(e0, "bad id"),
            Err(EditorError::InvalidId(_))
        ));
        assert_eq!(ed.graph().edge(e0).map(|e| e.id.as_str()), Some("edge_0"));
        assert_eq!(ed.revision(), revision);
        ed.rename_edge(e0, "main:1").expect("rename");
        assert_eq!(ed.graph().edge_by_id("main:1").map(|e| e.key), Some(e0));
    }

    /// 차로 수 변경 시 차로 표시가 재생성되고 이전 핸들은 씬에서 사라진다.
    #[test]
    fn edge_properties_regenerate_markers() {
        let mut ed = editor();
        let a = ed.create_node(egui::pos2(0.0, 0.0), None);
        let b = ed.create_node(egui::pos2(200.0, 0.0), None);
        let e = ed.create_default_edge(a, b).expect("edge");
        ed.set_edge_properties(e, 3, 20.0).expect("props");
        let markers = ed
            .graph()
            .edge(e)
            .and_then(|e| e.visual.clone())
            .map(|v| v.lane_markers)
            .unwrap_or_default();
        assert_eq!(markers.len(), 4);
        ed.set_edge_properties(e, 1, 20.0).expect("props");
        let after = ed.graph().edge(e).and_then(|e| e.visual.clone()).expect("visual");
        assert!(after.lane_markers.is_empty());
        assert!(markers.iter().all(|h| !ed.scene().contains(*h)));
        assert!(ed.set_edge_properties(e, 7, 20.0).is_err());
        assert!(ed.set_edge_properties(e, 2, 60.0).is_err());
    }

    /// 그리기 모드 진입과 종료가 커서와 팬 상태를 바꾸고 배너를 재사용한다.
    #[test]
    fn drawing_mode_toggles_cursor_and_banner() {
        let mut ed = editor();
        assert!(ed.pan_enabled());
        ed.enter_drawing_mode();
        assert_eq!(ed.cursor_icon(), CursorIcon::Crosshair);
        assert!(!ed.pan_enabled());
        let banner = ed.banner().expect("banner");
        ed.exit_drawing_mode();
        assert!(ed.pan_enabled());
        assert_eq!(ed.cursor_icon(), CursorIcon::Default);
        assert!(ed.scene().get(banner).map(|b| !b.visible).unwrap_or(false));
        ed.enter_drawing_mode();
        assert_eq!(ed.banner(), Some(banner));
        assert!(ed.scene().get(banner).map(|b| b.visible).unwrap_or(false));
    }
}
