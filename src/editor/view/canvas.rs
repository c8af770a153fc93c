use super::*;

impl<'a> NetworkEditorUi<'a> {
    /// 캔버스를 그리고 포인터/키 입력을 편집기 입력으로 바꿔 전달한다.
    pub(super) fn render_canvas(&mut self, ui: &mut egui::Ui) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        self.panel.canvas_size = rect.size();
        let origin = rect.center();

        for input in self.collect_inputs(ui, &response, origin) {
            if let Err(err) = self.state.handle_input(input) {
                self.report_error(err);
            }
        }

        if response.hovered() {
            ui.ctx().set_cursor_icon(self.state.cursor_icon());
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, self.theme().palette().bg_canvas);
        paint_scene(&painter, self.state.scene(), &self.state.view, origin);
    }

    fn collect_inputs(
        &self,
        ui: &egui::Ui,
        response: &egui::Response,
        origin: egui::Pos2,
    ) -> Vec<CanvasInput> {
        let view = self.state.view;
        let to_scene = |p: egui::Pos2| view.to_scene(origin, p);
        let mut inputs = Vec::new();

        let (pointer, pointer_delta, press_origin, shift, wheel) = ui.input(|i| {
            (
                i.pointer.hover_pos(),
                i.pointer.delta(),
                i.pointer.press_origin(),
                i.modifiers.shift,
                wheel_steps(&i.events),
            )
        });

        if response.hovered() {
            if let Some(pos) = pointer {
                if pointer_delta != egui::Vec2::ZERO {
                    inputs.push(CanvasInput::PointerMoved { pos: to_scene(pos) });
                }
                for delta in wheel {
                    inputs.push(CanvasInput::Scroll {
                        delta,
                        anchor: pos - origin,
                    });
                }
            }
        }

        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = press_origin.or(pointer) {
                inputs.push(CanvasInput::DragStart { pos: to_scene(pos) });
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = pointer {
                inputs.push(CanvasInput::DragMove {
                    pos: to_scene(pos),
                    screen_delta: response.drag_delta(),
                });
            }
        }
        if response.drag_released_by(egui::PointerButton::Primary) {
            inputs.push(CanvasInput::DragEnd);
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                inputs.push(CanvasInput::PrimaryClick {
                    pos: to_scene(pos),
                    shift,
                });
            }
        }
        if response.secondary_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                inputs.push(CanvasInput::SecondaryClick { pos: to_scene(pos) });
            }
        }

        // 입력란에 포커스가 있으면 키는 그쪽 몫이다.
        if response.hovered() && !ui.ctx().wants_keyboard_input() {
            let keys = ui.input(|i| {
                let mut keys = Vec::new();
                if i.key_pressed(egui::Key::Escape) {
                    keys.push(EditorKey::Escape);
                }
                if i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace) {
                    keys.push(EditorKey::Delete);
                }
                if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
                    keys.push(EditorKey::ZoomIn);
                }
                if i.key_pressed(egui::Key::Minus) {
                    keys.push(EditorKey::ZoomOut);
                }
                keys
            });
            inputs.extend(keys.into_iter().map(CanvasInput::Key));
        }
        inputs
    }
}

/// 휠 이벤트 하나당 확대/축소 한 단계. 양은 버리고 방향만 남긴다.
fn wheel_steps(events: &[egui::Event]) -> Vec<f32> {
    events
        .iter()
        .filter_map(|event| match event {
            egui::Event::MouseWheel { delta, .. } if delta.y != 0.0 => Some(delta.y.signum()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wheel(y: f32) -> egui::Event {
        egui::Event::MouseWheel {
            unit: egui::MouseWheelUnit::Point,
            delta: egui::vec2(0.0, y),
            modifiers: egui::Modifiers::default(),
        }
    }

    /// 휠 한 칸은 양과 상관없이 정확히 한 단계다.
    #[test]
    fn one_wheel_event_is_one_zoom_step() {
        let events = vec![wheel(14.0), egui::Event::Scroll(egui::vec2(0.0, 14.0))];
        let steps = wheel_steps(&events);
        assert_eq!(steps, vec![1.0]);

        let mut state = NetworkEditorState::default();
        for delta in steps {
            state
                .handle_input(CanvasInput::Scroll {
                    delta,
                    anchor: egui::Vec2::ZERO,
                })
                .expect("스크롤 처리 실패");
        }
        assert!((state.view.zoom - 1.2).abs() < 1e-5);
    }

    #[test]
    fn wheel_direction_and_empty_frames() {
        assert!(wheel_steps(&[]).is_empty());
        assert!(wheel_steps(&[wheel(0.0)]).is_empty());
        assert_eq!(wheel_steps(&[wheel(-120.0), wheel(3.0)]), vec![-1.0, 1.0]);
    }
}
