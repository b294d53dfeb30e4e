use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2};

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(246, 246, 242));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(180, 180, 170, 60));

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    Rect::from_two_pos(start, end)
        .expand(padding)
        .intersects(rect)
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

/// Where the segment from `center` towards `toward` leaves `bounds`.
pub(super) fn exit_point(bounds: Rect, toward: Pos2) -> Pos2 {
    let center = bounds.center();
    let delta = toward - center;
    if delta.length_sq() <= f32::EPSILON {
        return center;
    }
    let half = bounds.size() / 2.0;
    let scale_x = if delta.x.abs() > f32::EPSILON { half.x / delta.x.abs() } else { f32::INFINITY };
    let scale_y = if delta.y.abs() > f32::EPSILON { half.y / delta.y.abs() } else { f32::INFINITY };
    center + delta * scale_x.min(scale_y).min(1.0)
}

pub(super) fn draw_edge(painter: &Painter, start: Pos2, end: Pos2, stroke: Stroke, dashed: bool) {
    if dashed {
        let dash = (stroke.width * 4.0).max(4.0);
        painter.extend(Shape::dashed_line(&[start, end], stroke, dash, dash));
    } else {
        painter.line_segment([start, end], stroke);
    }
}

pub(super) fn draw_arrow_head(painter: &Painter, tip: Pos2, from: Pos2, size: f32, color: Color32) {
    let direction = (tip - from).normalized();
    if !direction.is_finite() || direction == Vec2::ZERO {
        return;
    }
    let normal = direction.rot90();
    let base = tip - direction * size;
    painter.add(Shape::convex_polygon(
        vec![tip, base + normal * size * 0.5, base - normal * size * 0.5],
        color,
        Stroke::NONE,
    ));
}
