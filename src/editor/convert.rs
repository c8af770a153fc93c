use super::model::{NetworkEditorState, NodeKey};
use crate::network::{EdgeRecord, NetworkSnapshot, NodeRecord};
use eframe::egui;
use std::collections::HashMap;
use tracing::{info, warn};

/// 가져오기 결과 요약.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub nodes: usize,
    pub edges: usize,
    /// 끝점 노드를 찾지 못해 건너뛴 엣지 수.
    pub skipped_edges: usize,
}

impl NetworkEditorState {
    /// 현재 네트워크를 삽입 순서대로 스냅샷으로 만든다.
    pub fn export_snapshot(&self) -> NetworkSnapshot {
        let graph = self.graph();
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| NodeRecord {
                id: node.id.clone(),
                x: node.position.x,
                y: node.position.y,
            })
            .collect();
        let edges = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let from = graph.node(edge.source)?;
                let to = graph.node(edge.target)?;
                Some(EdgeRecord {
                    id: edge.id.clone(),
                    from: from.id.clone(),
                    to: to.id.clone(),
                    lanes: edge.lanes,
                    speed: edge.speed,
                })
            })
            .collect();
        NetworkSnapshot { nodes, edges }
    }

    /// 네트워크를 비운 뒤 스냅샷을 불러온다.
    ///
    /// 알 수 없는 노드를 참조하는 엣지는 로그만 남기고 건너뛴다.
    pub fn import_snapshot(&mut self, snapshot: &NetworkSnapshot) -> ImportReport {
        self.reset_network();
        let mut lookup: HashMap<&str, NodeKey> = HashMap::new();
        for record in &snapshot.nodes {
            let key = self.add_node(egui::pos2(record.x, record.y), Some(record.id.clone()));
            lookup.entry(record.id.as_str()).or_insert(key);
        }
        let mut report = ImportReport {
            nodes: snapshot.nodes.len(),
            ..Default::default()
        };
        for record in &snapshot.edges {
            let endpoints = (
                lookup.get(record.from.as_str()),
                lookup.get(record.to.as_str()),
            );
            let (Some(&source), Some(&target)) = endpoints else {
                warn!(edge = %record.id, from = %record.from, to = %record.to, "알 수 없는 노드를 참조하는 엣지 건너뜀");
                report.skipped_edges += 1;
                continue;
            };
            match self.add_edge(
                source,
                target,
                Some(record.id.clone()),
                record.lanes.max(1),
                record.speed,
            ) {
                Ok(_) => report.edges += 1,
                Err(err) => {
                    warn!(edge = %record.id, %err, "엣지 가져오기 실패");
                    report.skipped_edges += 1;
                }
            }
        }
        info!(
            nodes = report.nodes,
            edges = report.edges,
            skipped = report.skipped_edges,
            "네트워크 가져오기 완료"
        );
        self.notify_changed();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NetworkSnapshot {
        NetworkSnapshot {
            nodes: vec![
                NodeRecord { id: "a".into(), x: 0.0, y: 0.0 },
                NodeRecord { id: "b".into(), x: 250.5, y: -10.25 },
                NodeRecord { id: "c".into(), x: 250.5, y: 300.0 },
            ],
            edges: vec![
                EdgeRecord {
                    id: "ab".into(),
                    from: "a".into(),
                    to: "b".into(),
                    lanes: 3,
                    speed: 30.0,
                },
                EdgeRecord {
                    id: "bc".into(),
                    from: "b".into(),
                    to: "c".into(),
                    lanes: 1,
                    speed: 8.33,
                },
            ],
        }
    }

    /// 가져온 뒤 내보낸 스냅샷이 입력과 정확히 같다.
    #[test]
    fn import_then_export_round_trips() {
        let mut editor = NetworkEditorState::default();
        let input = sample();
        let report = editor.import_snapshot(&input);
        assert_eq!(report.edges, 2);
        assert_eq!(editor.export_snapshot(), input);
        assert!(editor.visuals_consistent());
    }

    /// 알 수 없는 노드를 참조하는 엣지는 결과에서 빠진다.
    #[test]
    fn edges_with_unknown_endpoints_are_dropped() {
        let mut editor = NetworkEditorState::default();
        let mut input = sample();
        input.edges.push(EdgeRecord {
            id: "ghost".into(),
            from: "a".into(),
            to: "zz".into(),
            lanes: 2,
            speed: 13.89,
        });
        let report = editor.import_snapshot(&input);
        assert_eq!(report.skipped_edges, 1);
        let exported = editor.export_snapshot();
        assert!(exported.edges.iter().all(|e| e.id != "ghost"));
        input.edges.pop();
        assert_eq!(exported, input);
    }

    /// 가져오기는 기존 네트워크를 비우고 변경 알림을 한 번만 남긴다.
    #[test]
    fn import_replaces_existing_network() {
        let mut editor = NetworkEditorState::default();
        let x = editor.create_node(egui::pos2(5.0, 5.0), None);
        let y = editor.create_node(egui::pos2(50.0, 5.0), None);
        editor.create_default_edge(x, y).expect("edge");
        let revision = editor.revision();
        editor.import_snapshot(&sample());
        assert_eq!(editor.revision(), revision + 1);
        assert_eq!(editor.graph().node_count(), 3);
        assert!(editor.graph().node_by_id("node_0").is_none());
        assert!(editor.graph().incidence_consistent());
    }
}
