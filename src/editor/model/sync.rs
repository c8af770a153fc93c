use eframe::egui::{Pos2, Stroke};
use tracing::debug;

use super::edge::{
    EDGE_LABEL_SIZE, EdgeKey, EdgeVisual, edge_label_anchor, lane_marker_polylines,
};
use super::graph::NetworkGraph;
use super::node::{GLOW_RADIUS, NODE_LABEL_SIZE, NODE_RADIUS, NodeKey, NodeVisual};
use super::scene::{ItemOwner, Scene, SceneItem, SceneShape};
use crate::theme::ScenePalette;

/// 씬 레이어 순서.
pub mod layer {
    pub const GRID: f32 = -1.0;
    pub const DECORATION: f32 = -0.5;
    pub const EDGE: f32 = 0.0;
    pub const LANE_MARKER: f32 = 0.5;
    pub const EDGE_LABEL: f32 = 0.6;
    pub const GLOW: f32 = 1.0;
    pub const NODE: f32 = 2.0;
    pub const NODE_LABEL: f32 = 3.0;
    pub const PREVIEW: f32 = 4.0;
    pub const BANNER: f32 = 5.0;
}

/// 논리 엔티티와 씬 그래픽 사이의 대응을 유지한다.
///
/// 모든 연산은 대상 엔티티나 그래픽이 이미 사라진 경우 아무 일도 하지 않는다.
pub struct SceneSync<'a> {
    scene: &'a mut Scene,
    graph: &'a mut NetworkGraph,
    palette: &'a ScenePalette,
}

impl<'a> SceneSync<'a> {
    pub fn new(scene: &'a mut Scene, graph: &'a mut NetworkGraph, palette: &'a ScenePalette) -> Self {
        Self {
            scene,
            graph,
            palette,
        }
    }

    /// 씬에 등록된 노드에 본체, 글로우, 라벨 그래픽을 만든다.
    pub fn attach_node(&mut self, key: NodeKey) {
        let Some(node) = self.graph.node(key) else {
            return;
        };
        if node.visual.is_some() {
            debug!(node = %node.id, "이미 그래픽이 연결된 노드");
            return;
        }
        let center = node.center();
        let label_anchor = node.label_anchor();
        let id = node.id.clone();

        let glow = self.scene.add(
            SceneItem::new(SceneShape::Circle {
                center,
                radius: GLOW_RADIUS,
            })
            .z(layer::GLOW),
        );
        let shape = self.scene.add(
            SceneItem::new(SceneShape::Circle {
                center,
                radius: NODE_RADIUS,
            })
            .z(layer::NODE)
            .owner(ItemOwner::Node(key)),
        );
        let label = self.scene.add(
            SceneItem::text(label_anchor, id, NODE_LABEL_SIZE, self.palette.node_label)
                .z(layer::NODE_LABEL),
        );
        if let Some(node) = self.graph.node_mut(key) {
            node.visual = Some(NodeVisual {
                shape,
                glow: Some(glow),
                label: Some(label),
            });
        }
        self.apply_node_style(key);
    }

    /// 양 끝 노드가 등록된 엣지에 선, 라벨, 차로 표시를 만든다.
    pub fn attach_edge(&mut self, key: EdgeKey) {
        let Some(edge) = self.graph.edge(key) else {
            return;
        };
        if edge.visual.is_some() {
            debug!(edge = %edge.id, "이미 그래픽이 연결된 엣지");
            return;
        }
        let id = edge.id.clone();
        let Some((from, to)) = self.graph.edge_endpoints(key) else {
            return;
        };
        let line = self.scene.add(
            SceneItem::new(SceneShape::Line { from, to })
                .z(layer::EDGE)
                .owner(ItemOwner::Edge(key)),
        );
        let label = self.scene.add(
            SceneItem::text(
                edge_label_anchor(from, to),
                id,
                EDGE_LABEL_SIZE,
                self.palette.edge_label,
            )
            .z(layer::EDGE_LABEL),
        );
        if let Some(edge) = self.graph.edge_mut(key) {
            edge.visual = Some(EdgeVisual {
                line,
                label: Some(label),
                lane_markers: Vec::new(),
            });
        }
        self.refresh_edge_style(key);
    }

    /// 노드 이동 후 글로우, 라벨, 연결 엣지의 형상과 차로 표시를 갱신한다.
    pub fn on_node_moved(&mut self, key: NodeKey) {
        let Some(node) = self.graph.node(key) else {
            return;
        };
        let center = node.center();
        let label_anchor = node.label_anchor();
        let incident = node.edges.clone();
        if let Some(visual) = node.visual.clone() {
            self.scene.update(visual.shape, |item| move_circle(item, center));
            if let Some(glow) = visual.glow {
                self.scene.update(glow, |item| move_circle(item, center));
            }
            if let Some(label) = visual.label {
                self.scene.update(label, |item| move_text(item, label_anchor));
            }
        }
        for edge in incident {
            self.update_edge_geometry(edge);
        }
    }

    /// 선택 상태를 반영해 노드와 글로우 색상을 바꾼다.
    pub fn on_node_selection_changed(&mut self, key: NodeKey, selected: bool) {
        if let Some(node) = self.graph.node_mut(key) {
            node.selected = selected;
        } else {
            return;
        }
        self.apply_node_style(key);
    }

    /// 그리기 모드 시작점 강조를 켜거나 끈다.
    pub fn set_node_active(&mut self, key: NodeKey, active: bool) {
        if let Some(node) = self.graph.node_mut(key) {
            node.active = active;
        } else {
            return;
        }
        self.apply_node_style(key);
    }

    pub fn on_edge_selection_changed(&mut self, key: EdgeKey, selected: bool) {
        if let Some(edge) = self.graph.edge_mut(key) {
            edge.selected = selected;
        } else {
            return;
        }
        self.apply_edge_style(key);
    }

    /// 노드 그래픽을 제거한다. 남아 있는 연결 엣지 그래픽이 먼저 제거된다.
    pub fn detach_node(&mut self, key: NodeKey) {
        for edge in self.graph.incident_edges(key) {
            self.detach_edge(edge);
        }
        let Some(node) = self.graph.node_mut(key) else {
            return;
        };
        if let Some(visual) = node.visual.take() {
            for handle in visual.handles().collect::<Vec<_>>() {
                self.scene.remove(handle);
            }
        }
    }

    /// 엣지 그래픽을 차로 표시, 라벨, 선 순서로 제거한다.
    pub fn detach_edge(&mut self, key: EdgeKey) {
        let Some(edge) = self.graph.edge_mut(key) else {
            return;
        };
        if let Some(visual) = edge.visual.take() {
            for marker in visual.lane_markers {
                self.scene.remove(marker);
            }
            if let Some(label) = visual.label {
                self.scene.remove(label);
            }
            self.scene.remove(visual.line);
        }
    }

    /// 엣지 선 두께와 색상을 다시 계산하고 차로 표시를 재생성한다.
    pub fn refresh_edge_style(&mut self, key: EdgeKey) {
        self.apply_edge_style(key);
        self.rebuild_lane_markers(key);
    }

    /// 노드 라벨 텍스트를 현재 ID로 바꾼다.
    pub fn refresh_node_label(&mut self, key: NodeKey) {
        let Some(node) = self.graph.node(key) else {
            return;
        };
        let id = node.id.clone();
        if let Some(label) = node.visual.as_ref().and_then(|v| v.label) {
            self.scene.update(label, |item| set_text(item, id));
        }
    }

    pub fn refresh_edge_label(&mut self, key: EdgeKey) {
        let Some(edge) = self.graph.edge(key) else {
            return;
        };
        let id = edge.id.clone();
        if let Some(label) = edge.visual.as_ref().and_then(|v| v.label) {
            self.scene.update(label, |item| set_text(item, id));
        }
    }

    /// 기존 차로 표시를 모두 지우고 현재 형상 기준으로 다시 만든다.
    pub fn rebuild_lane_markers(&mut self, key: EdgeKey) {
        let Some(edge) = self.graph.edge_mut(key) else {
            return;
        };
        let lanes = edge.lanes;
        let Some(visual) = edge.visual.as_mut() else {
            return;
        };
        let old = std::mem::take(&mut visual.lane_markers);
        for marker in old {
            if self.scene.contains(marker) {
                self.scene.remove(marker);
            }
        }
        let Some((from, to)) = self.graph.edge_endpoints(key) else {
            return;
        };
        let stroke = Stroke::new(1.0, self.palette.lane_marker);
        let markers: Vec<_> = lane_marker_polylines(from, to, lanes)
            .into_iter()
            .map(|points| {
                self.scene.add(
                    SceneItem::new(SceneShape::Polyline {
                        points: points.to_vec(),
                    })
                    .stroke(stroke)
                    .z(layer::LANE_MARKER),
                )
            })
            .collect();
        if let Some(visual) = self.graph.edge_mut(key).and_then(|e| e.visual.as_mut()) {
            visual.lane_markers = markers;
        }
    }

    fn update_edge_geometry(&mut self, key: EdgeKey) {
        let Some((from, to)) = self.graph.edge_endpoints(key) else {
            return;
        };
        let Some(visual) = self.graph.edge(key).and_then(|e| e.visual.clone()) else {
            return;
        };
        self.scene.update(visual.line, |item| {
            item.shape = SceneShape::Line { from, to };
        });
        if let Some(label) = visual.label {
            self.scene
                .update(label, |item| move_text(item, edge_label_anchor(from, to)));
        }
        self.rebuild_lane_markers(key);
    }

    fn apply_node_style(&mut self, key: NodeKey) {
        let Some(node) = self.graph.node(key) else {
            return;
        };
        let Some(visual) = node.visual.clone() else {
            return;
        };
        let palette = self.palette;
        let (stroke, glow_stroke, glow_fill) = if node.highlighted() {
            (
                Stroke::new(3.0, palette.node_active_stroke),
                Stroke::new(2.0, palette.glow_selected_stroke),
                palette.glow_selected_fill,
            )
        } else {
            (
                Stroke::new(2.0, palette.node_stroke),
                Stroke::new(0.0, palette.glow_stroke),
                palette.glow_fill,
            )
        };
        self.scene.update(visual.shape, |item| {
            item.stroke = stroke;
            item.fill = palette.node_fill;
        });
        if let Some(glow) = visual.glow {
            self.scene.update(glow, |item| {
                item.stroke = glow_stroke;
                item.fill = glow_fill;
            });
        }
    }

    fn apply_edge_style(&mut self, key: EdgeKey) {
        let Some(edge) = self.graph.edge(key) else {
            return;
        };
        let Some(line) = edge.visual.as_ref().map(|v| v.line) else {
            return;
        };
        let color = if edge.selected {
            self.palette.edge_selected
        } else {
            edge.road_class().color(self.palette)
        };
        let stroke = Stroke::new(edge.stroke_width(), color);
        self.scene.update(line, |item| item.stroke = stroke);
    }
}

fn move_circle(item: &mut SceneItem, to: Pos2) {
    if let SceneShape::Circle { center, .. } = &mut item.shape {
        *center = to;
    }
}

fn move_text(item: &mut SceneItem, to: Pos2) {
    if let SceneShape::Text { anchor, .. } = &mut item.shape {
        *anchor = to;
    }
}

fn set_text(item: &mut SceneItem, value: String) {
    if let SceneShape::Text { text, .. } = &mut item.shape {
        *text = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui;

    fn setup() -> (Scene, NetworkGraph, ScenePalette) {
        (Scene::new(), NetworkGraph::new(), ScenePalette::sci_fi())
    }

    /// 노드를 두 번 attach 해도 그래픽은 한 벌만 생긴다.
    #[test]
    fn attach_node_twice_keeps_single_visual() {
        let (mut scene, mut graph, palette) = setup();
        let a = graph.insert_node("a", egui::pos2(0.0, 0.0));
        let mut sync = SceneSync::new(&mut scene, &mut graph, &palette);
        sync.attach_node(a);
        sync.attach_node(a);
        assert_eq!(scene.len(), 3);
    }

    /// 노드 이동 시 연결 엣지 선과 차로 표시가 새 위치를 따라간다.
    #[test]
    fn moving_node_updates_edge_geometry() {
        let (mut scene, mut graph, palette) = setup();
        let a = graph.insert_node("a", egui::pos2(0.0, 0.0));
        let b = graph.insert_node("b", egui::pos2(40.0, 0.0));
        let e = graph.insert_edge("e", a, b, 3, 13.89).expect("edge");
        {
            let mut sync = SceneSync::new(&mut scene, &mut graph, &palette);
            sync.attach_node(a);
            sync.attach_node(b);
            sync.attach_edge(e);
        }
        let short = graph.edge(e).and_then(|edge| edge.visual.clone()).expect("visual");
        assert!(short.lane_markers.is_empty());

        if let Some(node) = graph.node_mut(b) {
            node.position = egui::pos2(200.0, 0.0);
        }
        SceneSync::new(&mut scene, &mut graph, &palette).on_node_moved(b);

        let visual = graph.edge(e).and_then(|e| e.visual.clone()).expect("visual");
        assert_eq!(visual.lane_markers.len(), 4);
        let line = scene.get(visual.line).expect("line");
        assert_eq!(
            line.shape,
            SceneShape::Line {
                from: egui::pos2(0.0, 0.0),
                to: egui::pos2(200.0, 0.0)
            }
        );
    }

    /// 선택 상태가 바뀌면 본체 펜 두께와 색이 바뀐다.
    #[test]
    fn selection_swaps_palette() {
        let (mut scene, mut graph, palette) = setup();
        let a = graph.insert_node("a", egui::pos2(0.0, 0.0));
        let mut sync = SceneSync::new(&mut scene, &mut graph, &palette);
        sync.attach_node(a);
        sync.on_node_selection_changed(a, true);
        let shape = graph.node(a).and_then(|n| n.visual.clone()).expect("visual").shape;
        let item = scene.get(shape).expect("shape");
        assert_eq!(item.stroke, Stroke::new(3.0, palette.node_active_stroke));
    }

    /// detach를 두 번 호출해도 오류 없이 그래픽이 한 번만 제거된다.
    #[test]
    fn double_detach_is_noop() {
        let (mut scene, mut graph, palette) = setup();
        let a = graph.insert_node("a", egui::pos2(0.0, 0.0));
        let b = graph.insert_node("b", egui::pos2(100.0, 0.0));
        let e = graph.insert_edge("e", a, b, 2, 13.89).expect("edge");
        let mut sync = SceneSync::new(&mut scene, &mut graph, &palette);
        sync.attach_node(a);
        sync.attach_node(b);
        sync.attach_edge(e);
        sync.detach_node(a);
        sync.detach_node(a);
        sync.detach_edge(e);
        // b의 본체, 글로우, 라벨만 남는다.
        assert_eq!(scene.len(), 3);
        let removed = scene.removal_log().len();
        let unique: std::collections::HashSet<_> = scene.removal_log().iter().collect();
        assert_eq!(removed, unique.len());
    }
}
