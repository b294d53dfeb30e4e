use eframe::egui::{self, Key, Rect, Ui};

use super::super::ViewModel;
use super::super::render_utils::screen_to_world;
use super::view::NodeShape;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.1, 4.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Topmost shape under the pointer. Shapes are in draw order.
    pub(in crate::app) fn hovered_shape<'a>(
        ui: &Ui,
        shapes: &'a [NodeShape],
    ) -> Option<&'a NodeShape> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        shapes.iter().rev().find(|shape| shape.contains(pointer))
    }

    /// Starts or ends the hover trace when the pointer moves between people.
    pub(in crate::app) fn update_hover(&mut self, hovered: Option<&NodeShape>) {
        let next = hovered
            .filter(|shape| shape.is_person)
            .map(|shape| shape.id.clone());
        if next == self.hovered {
            return;
        }
        if self.hovered.is_some() {
            self.controller.hover_end();
        }
        if let Some(id) = &next {
            self.controller.hover(id);
        }
        self.hovered = next;
    }

    pub(in crate::app) fn handle_graph_click(
        &mut self,
        response: &egui::Response,
        hovered: Option<&NodeShape>,
    ) {
        if !response.clicked_by(egui::PointerButton::Primary) {
            return;
        }
        match hovered {
            Some(shape) => self.controller.activate(&shape.id),
            None => self.controller.clear_selection(),
        }
    }

    pub(in crate::app) fn handle_graph_keys(&mut self, ui: &Ui) {
        if ui.ctx().wants_keyboard_input() {
            return;
        }
        let (delete, pin, escape) = ui.input(|input| {
            (
                input.key_pressed(Key::D) || input.key_pressed(Key::Delete),
                input.key_pressed(Key::P),
                input.key_pressed(Key::Escape),
            )
        });

        if escape {
            self.controller.clear_selection();
            return;
        }
        let selected = self
            .controller
            .state()
            .borrow()
            .selected()
            .map(str::to_owned);
        let Some(selected) = selected else {
            return;
        };
        if pin {
            self.controller.toggle_pin(&selected);
        }
        if delete {
            if self.hovered.as_deref() == Some(selected.as_str()) {
                self.hovered = None;
            }
            self.controller.delete(&selected);
        }
    }
}
