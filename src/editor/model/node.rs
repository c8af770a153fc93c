use eframe::egui::{self, Pos2, Vec2};

use super::edge::EdgeKey;
use super::scene::ItemHandle;

/// 노드 본체 원의 반지름.
pub const NODE_RADIUS: f32 = 8.0;
/// 글로우 원의 반지름.
pub const GLOW_RADIUS: f32 = 12.0;
/// 노드 중심 기준 라벨 위치.
pub const NODE_LABEL_OFFSET: Vec2 = egui::vec2(10.0, -10.0);
/// 라벨 글자 크기.
pub const NODE_LABEL_SIZE: f32 = 8.0;

/// 그래프 내부에서 노드를 가리키는 키이다. 사용자 ID와 별개로 재사용되지 않는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub(crate) u64);

/// 노드가 씬에 보유한 그래픽 핸들 묶음이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeVisual {
    /// 본체 원.
    pub shape: ItemHandle,
    /// 선택 강조용 글로우.
    pub glow: Option<ItemHandle>,
    /// ID 라벨.
    pub label: Option<ItemHandle>,
}

impl NodeVisual {
    /// 보유한 모든 핸들을 순회한다.
    pub fn handles(&self) -> impl Iterator<Item = ItemHandle> + '_ {
        self.glow
            .iter()
            .chain(self.label.iter())
            .copied()
            .chain(std::iter::once(self.shape))
    }
}

/// 교차로를 나타내는 노드.
#[derive(Debug, Clone)]
pub struct Node {
    pub key: NodeKey,
    /// 사용자에게 보이는 ID.
    pub id: String,
    /// 씬 좌표상의 중심.
    pub position: Pos2,
    /// 이 노드에 연결된 엣지 키 목록(역참조).
    pub edges: Vec<EdgeKey>,
    /// 선택 여부.
    pub selected: bool,
    /// 그리기 모드에서 시작점으로 강조 중인지 여부.
    pub active: bool,
    /// 씬에 붙은 그래픽. 씬에 등록되기 전에는 `None`이다.
    pub visual: Option<NodeVisual>,
}

impl Node {
    pub fn new(key: NodeKey, id: impl Into<String>, position: Pos2) -> Self {
        Self {
            key,
            id: id.into(),
            position,
            edges: Vec::new(),
            selected: false,
            active: false,
            visual: None,
        }
    }

    pub fn center(&self) -> Pos2 {
        self.position
    }

    /// 선택 또는 시작점 강조 상태인지 반환한다.
    pub fn highlighted(&self) -> bool {
        self.selected || self.active
    }

    pub fn label_anchor(&self) -> Pos2 {
        self.position + NODE_LABEL_OFFSET
    }

    pub(crate) fn attach_edge(&mut self, edge: EdgeKey) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    pub(crate) fn detach_edge(&mut self, edge: EdgeKey) {
        self.edges.retain(|key| *key != edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 같은 엣지를 두 번 연결해도 역참조가 한 번만 기록되는지 확인한다.
    #[test]
    fn attach_edge_is_idempotent() {
        let mut node = Node::new(NodeKey(1), "node_0", egui::pos2(0.0, 0.0));
        node.attach_edge(EdgeKey(7));
        node.attach_edge(EdgeKey(7));
        assert_eq!(node.edges, vec![EdgeKey(7)]);
        node.detach_edge(EdgeKey(7));
        assert!(node.edges.is_empty());
    }
}
