use eframe::egui::Pos2;

use super::edge::{Edge, EdgeKey};
use super::error::EditorError;
use super::node::{Node, NodeKey};

/// 노드와 엣지를 삽입 순서대로 보관하는 네트워크 그래프이다.
///
/// 엣지는 두 노드가 모두 존재할 때만 생성되며, 생성 시 양 끝 노드의
/// 역참조 목록에 스스로를 등록한다.
#[derive(Debug, Default)]
pub struct NetworkGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    next_node_key: u64,
    next_edge_key: u64,
}

impl NetworkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.iter().find(|node| node.key == key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.key == key)
    }

    pub fn edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.key == key)
    }

    pub fn edge_mut(&mut self, key: EdgeKey) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|edge| edge.key == key)
    }

    /// 사용자 ID로 노드를 찾는다. 중복 ID가 있으면 먼저 만들어진 노드를 돌려준다.
    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge_by_id(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    /// 노드를 추가하고 키를 반환한다.
    pub fn insert_node(&mut self, id: impl Into<String>, position: Pos2) -> NodeKey {
        self.next_node_key += 1;
        let key = NodeKey(self.next_node_key);
        self.nodes.push(Node::new(key, id, position));
        key
    }

    /// 두 노드 사이에 엣지를 추가하고 양 끝 노드에 등록한다.
    pub fn insert_edge(
        &mut self,
        id: impl Into<String>,
        source: NodeKey,
        target: NodeKey,
        lanes: u32,
        speed: f32,
    ) -> Result<EdgeKey, EditorError> {
        let id = id.into();
        if source == target {
            return Err(EditorError::SelfLoop(id));
        }
        if self.node(source).is_none() || self.node(target).is_none() {
            return Err(EditorError::UnknownNode(id));
        }
        self.next_edge_key += 1;
        let key = EdgeKey(self.next_edge_key);
        self.edges
            .push(Edge::new(key, id, source, target, lanes, speed));
        for endpoint in [source, target] {
            if let Some(node) = self.node_mut(endpoint) {
                node.attach_edge(key);
            }
        }
        Ok(key)
    }

    /// 엣지를 양 끝 노드에서 분리한 뒤 제거한다.
    pub fn remove_edge(&mut self, key: EdgeKey) -> Option<Edge> {
        let index = self.edges.iter().position(|edge| edge.key == key)?;
        let edge = self.edges.remove(index);
        for endpoint in [edge.source, edge.target] {
            if let Some(node) = self.node_mut(endpoint) {
                node.detach_edge(key);
            }
        }
        Some(edge)
    }

    /// 노드를 제거한다. 남아 있는 연결 엣지도 함께 제거된다.
    pub fn remove_node(&mut self, key: NodeKey) -> Option<Node> {
        let incident = self.node(key)?.edges.clone();
        for edge in incident {
            self.remove_edge(edge);
        }
        let index = self.nodes.iter().position(|node| node.key == key)?;
        Some(self.nodes.remove(index))
    }

    /// 노드에 연결된 엣지 키의 복사본을 반환한다.
    pub fn incident_edges(&self, key: NodeKey) -> Vec<EdgeKey> {
        self.node(key)
            .map(|node| node.edges.clone())
            .unwrap_or_default()
    }

    /// 모든 노드와 엣지를 제거한다. 키 카운터는 유지한다.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// 임계 거리 이내에서 가장 가까운 노드를 찾는다.
    pub fn nearest_node(&self, point: Pos2, threshold: f32) -> Option<NodeKey> {
        self.nodes
            .iter()
            .map(|node| (node.key, node.center().distance(point)))
            .filter(|(_, dist)| *dist <= threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(key, _)| key)
    }

    /// 엣지 양 끝 노드의 중심 좌표를 반환한다.
    pub fn edge_endpoints(&self, key: EdgeKey) -> Option<(Pos2, Pos2)> {
        let edge = self.edge(key)?;
        let from = self.node(edge.source)?.center();
        let to = self.node(edge.target)?.center();
        Some((from, to))
    }

    /// 모든 노드의 역참조 목록이 실제 엣지 집합과 일치하는지 검사한다.
    #[cfg(test)]
    pub(crate) fn incidence_consistent(&self) -> bool {
        self.nodes.iter().all(|node| {
            let mut expected: Vec<EdgeKey> = self
                .edges
                .iter()
                .filter(|edge| edge.touches(node.key))
                .map(|edge| edge.key)
                .collect();
            let mut actual = node.edges.clone();
            expected.sort();
            actual.sort();
            expected == actual
        }) && self
            .edges
            .iter()
            .all(|edge| self.node(edge.source).is_some() && self.node(edge.target).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui;

    /// 없는 노드나 자기 자신을 잇는 엣지는 만들어지지 않는다.
    #[test]
    fn insert_edge_requires_two_distinct_nodes() {
        let mut graph = NetworkGraph::new();
        let a = graph.insert_node("a", egui::pos2(0.0, 0.0));
        assert!(matches!(
            graph.insert_edge("e", a, a, 1, 13.89),
            Err(EditorError::SelfLoop(_))
        ));
        assert!(matches!(
            graph.insert_edge("e", a, NodeKey(99), 1, 13.89),
            Err(EditorError::UnknownNode(_))
        ));
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.incidence_consistent());
    }

    /// 노드 제거 시 연결 엣지가 함께 사라지고 반대편 역참조도 정리된다.
    #[test]
    fn removing_node_cascades_edges() {
        let mut graph = NetworkGraph::new();
        let a = graph.insert_node("a", egui::pos2(0.0, 0.0));
        let b = graph.insert_node("b", egui::pos2(100.0, 0.0));
        let c = graph.insert_node("c", egui::pos2(200.0, 0.0));
        graph.insert_edge("ab", a, b, 1, 13.89).expect("ab");
        graph.insert_edge("bc", b, c, 1, 13.89).expect("bc");
        assert!(graph.remove_node(b).is_some());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.node(a).map(|n| n.edges.is_empty()).unwrap_or(false));
        assert!(graph.incidence_consistent());
    }

    /// 임계 거리 안에서 가장 가까운 노드를 고른다.
    #[test]
    fn nearest_node_respects_threshold() {
        let mut graph = NetworkGraph::new();
        let a = graph.insert_node("a", egui::pos2(0.0, 0.0));
        let b = graph.insert_node("b", egui::pos2(30.0, 0.0));
        assert_eq!(graph.nearest_node(egui::pos2(18.0, 0.0), 20.0), Some(b));
        assert_eq!(graph.nearest_node(egui::pos2(-5.0, 0.0), 20.0), Some(a));
        assert_eq!(graph.nearest_node(egui::pos2(100.0, 100.0), 20.0), None);
    }
}
