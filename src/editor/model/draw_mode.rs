use eframe::egui::{Pos2, Vec2};
use tracing::{debug, warn};

use super::edge::{DEFAULT_LANES, DEFAULT_SPEED};
use super::error::EditorError;
use super::node::NodeKey;
use super::scene::ItemOwner;
use super::state::{DragTarget, NetworkEditorState, Selection};

/// 캔버스 상호작용 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// 선택과 화면 이동.
    Idle,
    /// 클릭으로 노드와 엣지를 이어 그린다.
    Drawing { pending_start: Option<NodeKey> },
}

/// 편집기가 처리하는 키 입력.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Escape,
    Delete,
    ZoomIn,
    ZoomOut,
}

/// 툴킷과 무관한 캔버스 입력 이벤트. 좌표는 모두 씬 좌표이다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasInput {
    PrimaryClick { pos: Pos2, shift: bool },
    SecondaryClick { pos: Pos2 },
    PointerMoved { pos: Pos2 },
    DragStart { pos: Pos2 },
    /// `screen_delta`는 화면 포인트 단위 이동량이다.
    DragMove { pos: Pos2, screen_delta: Vec2 },
    DragEnd,
    Key(EditorKey),
    /// `anchor`는 캔버스 중심 기준 포인터 위치이다.
    Scroll { delta: f32, anchor: Vec2 },
}

impl NetworkEditorState {
    /// 캔버스 입력 하나를 현재 모드에 맞게 처리한다.
    pub fn handle_input(&mut self, input: CanvasInput) -> Result<(), EditorError> {
        match input {
            CanvasInput::PrimaryClick { pos, shift } => {
                if self.is_drawing() {
                    return self.drawing_click(pos);
                }
                self.idle_click(pos, shift);
            }
            CanvasInput::SecondaryClick { .. } => {
                if self.is_drawing() {
                    self.cancel_pending();
                }
            }
            CanvasInput::PointerMoved { pos } => {
                if let Some(start) = self.pending_start() {
                    if let Some(from) = self.graph.node(start).map(|n| n.center()) {
                        self.replace_preview(from, pos);
                    }
                }
            }
            CanvasInput::DragStart { pos } => self.drag_start(pos),
            CanvasInput::DragMove { pos, screen_delta } => self.drag_move(pos, screen_delta),
            CanvasInput::DragEnd => {
                if let Some(DragTarget::Node { moved: true, key }) = self.drag.take() {
                    debug!(?key, "노드 이동 완료");
                    self.notify_changed();
                }
            }
            CanvasInput::Key(key) => self.handle_key(key),
            CanvasInput::Scroll { delta, anchor } => {
                if delta > 0.0 {
                    self.zoom_in(anchor);
                } else if delta < 0.0 {
                    self.zoom_out(anchor);
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: EditorKey) {
        match key {
            EditorKey::Escape => {
                if self.is_drawing() {
                    self.cancel_pending();
                }
            }
            EditorKey::Delete => {
                self.delete_selected();
            }
            EditorKey::ZoomIn => self.zoom_in(Vec2::ZERO),
            EditorKey::ZoomOut => self.zoom_out(Vec2::ZERO),
        }
    }

    /// 그리기 모드 클릭. 가까운 노드를 재사용하거나 새 노드를 만들고 체인을 잇는다.
    fn drawing_click(&mut self, pos: Pos2) -> Result<(), EditorError> {
        let target = match self.node_at(pos) {
            Some(existing) => existing,
            None => self.create_node(pos, None),
        };
        let result = match self.pending_start() {
            None => {
                self.set_pending(Some(target));
                Ok(())
            }
            Some(start) if start == target => {
                self.cancel_pending();
                Ok(())
            }
            Some(start) => {
                let created =
                    self.create_edge(start, target, None, DEFAULT_LANES, DEFAULT_SPEED);
                if let Err(err) = &created {
                    warn!(%err, "엣지 생성 실패");
                }
                self.set_pending(Some(target));
                created.map(|_| ())
            }
        };
        self.discard_preview();
        result
    }

    /// 시작점을 바꾸고 이전 시작점 강조를 해제한다.
    fn set_pending(&mut self, next: Option<NodeKey>) {
        let previous = match &mut self.mode {
            DrawMode::Drawing { pending_start } => {
                std::mem::replace(pending_start, next)
            }
            DrawMode::Idle => return,
        };
        if let Some(previous) = previous {
            self.sync().set_node_active(previous, false);
        }
        if let Some(next) = next {
            self.sync().set_node_active(next, true);
        }
    }

    fn idle_click(&mut self, pos: Pos2, shift: bool) {
        match self.entity_at(pos) {
            Some(item) if shift => {
                let selected = self.is_selected(item);
                self.set_selected(item, !selected);
            }
            Some(item) => self.select_only(item),
            None if shift => {}
            None => self.clear_selection(),
        }
    }

    fn drag_start(&mut self, pos: Pos2) {
        if self.is_drawing() {
            self.drag = None;
            return;
        }
        let node = self
            .scene
            .owner_at(pos, |owner| matches!(owner, ItemOwner::Node(_)));
        self.drag = match node {
            Some(ItemOwner::Node(key)) => {
                if !self.is_selected(Selection::Node(key)) {
                    self.select_only(Selection::Node(key));
                }
                Some(DragTarget::Node { key, moved: false })
            }
            _ => Some(DragTarget::Canvas),
        };
    }

    fn drag_move(&mut self, pos: Pos2, screen_delta: Vec2) {
        match self.drag {
            Some(DragTarget::Node { key, .. }) => {
                if self.reposition_node(key, pos) {
                    self.drag = Some(DragTarget::Node { key, moved: true });
                }
            }
            Some(DragTarget::Canvas) => {
                if self.pan_enabled() {
                    self.view.pan(screen_delta);
                }
            }
            None => {}
        }
    }
}
