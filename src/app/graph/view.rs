use std::collections::HashMap;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, vec2};

use arvore::tree::{EdgeKind, GraphNode, NodeKind, TreeState};

use super::super::ViewModel;
use super::super::render_utils::{
    draw_arrow_head, draw_background, draw_edge, edge_visible, exit_point, world_to_screen,
};

const UNION_RADIUS: f32 = 15.0;
const TRIGGER_RADIUS: f32 = 13.0;
const LINE_HEIGHT: f32 = 1.3;

/// Screen-space footprint of a node for one frame.
pub(in crate::app) struct NodeShape {
    pub id: String,
    pub is_person: bool,
    rect: Rect,
    round: bool,
}

impl NodeShape {
    pub fn contains(&self, pos: Pos2) -> bool {
        if self.round {
            self.rect.center().distance(pos) <= self.rect.width() / 2.0
        } else {
            self.rect.contains(pos)
        }
    }
}

fn draw_rank(node: &GraphNode) -> u8 {
    match node.kind {
        NodeKind::Union(_) => 0,
        NodeKind::Person(_) => 1,
        NodeKind::Trigger(_) => 2,
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let shapes = {
            let state = self.controller.state().borrow();
            let shapes = self.node_shapes(&state, rect);
            self.paint_edges(&painter, &state, &shapes, rect);
            self.paint_nodes(&painter, &state, &shapes);
            shapes
        };

        let hovered = Self::hovered_shape(ui, &shapes);
        if hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }
        self.update_hover(hovered);
        self.handle_graph_click(&response, hovered);
        self.handle_graph_keys(ui);
    }

    fn node_shapes(&self, state: &TreeState, rect: Rect) -> Vec<NodeShape> {
        let config = state.config();
        let mut nodes = state.store().nodes().iter().collect::<Vec<_>>();
        nodes.sort_by_key(|node| draw_rank(node));

        nodes
            .into_iter()
            .map(|node| {
                let center = world_to_screen(rect, self.pan, self.zoom, node.pos);
                let (size, round) = match &node.kind {
                    NodeKind::Person(person) => {
                        let growth = (node.font_size / config.label_font_size).clamp(0.0, 1.0);
                        let lines = person.label.lines().count().max(1) as f32;
                        let height = lines * config.label_font_size * LINE_HEIGHT + 14.0;
                        (vec2(config.person_width - 20.0, height) * self.zoom * growth, false)
                    }
                    NodeKind::Union(_) => (vec2(UNION_RADIUS, UNION_RADIUS) * 2.0 * self.zoom, true),
                    NodeKind::Trigger(_) => {
                        (vec2(TRIGGER_RADIUS, TRIGGER_RADIUS) * 2.0 * self.zoom, true)
                    }
                };
                NodeShape {
                    id: node.id.clone(),
                    is_person: node.is_person(),
                    rect: Rect::from_center_size(center, size),
                    round,
                }
            })
            .collect()
    }

    fn paint_edges(
        &self,
        painter: &egui::Painter,
        state: &TreeState,
        shapes: &[NodeShape],
        rect: Rect,
    ) {
        let bounds = shapes
            .iter()
            .map(|shape| (shape.id.as_str(), shape.rect))
            .collect::<HashMap<_, _>>();

        for edge in state.store().edges() {
            if !edge.style.visible {
                continue;
            }
            let (Some(from), Some(to)) = (bounds.get(edge.from.as_str()), bounds.get(edge.to.as_str()))
            else {
                continue;
            };
            let start = exit_point(*from, to.center());
            let end = exit_point(*to, from.center());
            if !edge_visible(rect, start, end, 8.0) {
                continue;
            }

            let stroke = Stroke::new(edge.style.width * self.zoom.clamp(0.5, 2.0), edge.style.color);
            draw_edge(painter, start, end, stroke, edge.style.dashed);
            if edge.kind == EdgeKind::Descent {
                draw_arrow_head(painter, end, start, 8.0 * self.zoom.clamp(0.5, 1.5), edge.style.color);
            }
        }
    }

    fn paint_nodes(&self, painter: &egui::Painter, state: &TreeState, shapes: &[NodeShape]) {
        for shape in shapes {
            let Some(node) = state.store().node(&shape.id) else {
                continue;
            };
            if shape.rect.width() < 1.0 || !painter.clip_rect().intersects(shape.rect) {
                continue;
            }

            let style = node.style;
            let fill = style.fill.gamma_multiply(style.fill_opacity);
            let border = Stroke::new(
                style.border_width * self.zoom.clamp(0.5, 2.0),
                style.border.gamma_multiply(style.fill_opacity.max(style.label_opacity)),
            );
            if shape.round {
                painter.circle(shape.rect.center(), shape.rect.width() / 2.0, fill, border);
            } else {
                painter.rect(shape.rect, 6.0 * self.zoom, fill, border, egui::StrokeKind::Inside);
            }

            let text_color = Color32::from_rgb(0x22, 0x22, 0x22);
            let font_size = (node.font_size * self.zoom).max(1.0);
            if font_size >= 4.0 {
                painter.text(
                    shape.rect.center(),
                    Align2::CENTER_CENTER,
                    node.label(),
                    FontId::proportional(font_size),
                    text_color.gamma_multiply(style.label_opacity),
                );
            }

            if node.pinned {
                let marker = shape.rect.left_top() + vec2(5.0, 5.0) * self.zoom;
                painter.circle_filled(marker, 3.5 * self.zoom, Color32::from_rgb(0xC0, 0x39, 0x2B));
            }
            if state.is_loading(&shape.id) {
                let marker = shape.rect.right_top() + vec2(-6.0, 6.0) * self.zoom;
                painter.circle_stroke(
                    marker,
                    4.0 * self.zoom,
                    Stroke::new(1.5, Color32::from_rgb(0xFF, 0xD7, 0x00)),
                );
            }
        }
    }
}
