//! Canvas2D renderer.
//!
//! Draws the editor state to an HTML `<canvas>` via
//! `CanvasRenderingContext2d`: groups at the back, then connections, then
//! nodes in draw order. World-space content goes through one
//! `translate(pan) scale(scale)` transform; the grid and the rubber band
//! are drawn in screen space.

use ink_core::model::{Group, Node, NodeStatus};
use ink_core::{Rect, Viewport};
use ink_editor::Editor;
use ink_render::{Route, connection_route};
use web_sys::CanvasRenderingContext2d;

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub node_fill: &'static str,
    pub node_border: &'static str,
    pub node_title: &'static str,
    pub group_fill: &'static str,
    pub group_border: &'static str,
    pub group_title: &'static str,
    pub wire: &'static str,
    pub port: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            grid: "rgba(0, 0, 0, 0.06)",
            node_fill: "#FFFFFF",
            node_border: "rgba(0, 0, 0, 0.12)",
            node_title: "#1D1D1F",
            group_fill: "rgba(142, 142, 147, 0.08)",
            group_border: "rgba(142, 142, 147, 0.35)",
            group_title: "#6E6E73",
            wire: "#8E8E93",
            port: "#AEAEB2",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#1C1C1E",
            grid: "rgba(255, 255, 255, 0.05)",
            node_fill: "#2C2C2E",
            node_border: "rgba(255, 255, 255, 0.10)",
            node_title: "#F5F5F7",
            group_fill: "rgba(99, 99, 102, 0.12)",
            group_border: "rgba(99, 99, 102, 0.45)",
            group_title: "#98989D",
            wire: "#636366",
            port: "#8E8E93",
        }
    }
}

const SELECTION: &str = "#4FC3F7";
const CORNER_RADIUS: f64 = 16.0;
const GRID_SPACING: f32 = 24.0;

/// Render the whole editor state.
pub fn render_canvas(ctx: &CanvasRenderingContext2d, editor: &Editor, theme: &CanvasTheme) {
    let vp = &editor.viewport;
    let (w, h) = (vp.width as f64, vp.height as f64);

    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, w, h);
    draw_grid(ctx, vp, theme);

    ctx.save();
    let _ = ctx.set_transform(
        vp.scale as f64,
        0.0,
        0.0,
        vp.scale as f64,
        vp.pan_x as f64,
        vp.pan_y as f64,
    );

    let sel = &editor.selection;
    for group in &editor.graph.groups {
        draw_group(ctx, group, sel.group == Some(group.id), theme);
    }

    for conn in &editor.graph.connections {
        if let Some(route) = connection_route(&editor.graph, conn) {
            let selected = sel.connections.contains(conn);
            let color = if selected { SELECTION } else { theme.wire };
            draw_route(ctx, &route, color, if selected { 3.0 } else { 2.0 }, vp);
        }
    }

    for node in &editor.graph.nodes {
        draw_node(ctx, node, sel.contains_node(node.id), theme, vp);
    }

    if let Some(route) = editor.pending_connection() {
        let _ = ctx.set_line_dash(&dash(6.0, vp));
        draw_route(ctx, &route, SELECTION, 2.0, vp);
        let _ = ctx.set_line_dash(&js_sys::Array::new());
    }
    ctx.restore();

    if let Some(rect) = editor.selection_rect() {
        draw_marquee_rect(ctx, &rect);
    }
}

/// Dot grid that follows pan and zoom.
fn draw_grid(ctx: &CanvasRenderingContext2d, vp: &Viewport, theme: &CanvasTheme) {
    let spacing = GRID_SPACING * vp.scale;
    if spacing < 6.0 {
        return;
    }
    ctx.set_fill_style_str(theme.grid);
    let mut x = vp.pan_x.rem_euclid(spacing);
    while x < vp.width {
        let mut y = vp.pan_y.rem_euclid(spacing);
        while y < vp.height {
            ctx.fill_rect(x as f64, y as f64, 1.5, 1.5);
            y += spacing;
        }
        x += spacing;
    }
}

fn draw_group(ctx: &CanvasRenderingContext2d, group: &Group, selected: bool, theme: &CanvasTheme) {
    let (x, y, w, h) = (group.x as f64, group.y as f64, group.width as f64, group.height as f64);
    ctx.save();
    rounded_rect_path(ctx, x, y, w, h, CORNER_RADIUS * 1.5);
    ctx.set_fill_style_str(theme.group_fill);
    ctx.fill();
    ctx.set_stroke_style_str(if selected { SELECTION } else { theme.group_border });
    ctx.set_line_width(if selected { 2.0 } else { 1.0 });
    ctx.stroke();

    ctx.set_fill_style_str(theme.group_title);
    ctx.set_font("600 18px -apple-system, BlinkMacSystemFont, sans-serif");
    let _ = ctx.fill_text(&group.title, x + 20.0, y + 32.0);
    ctx.restore();
}

fn draw_node(
    ctx: &CanvasRenderingContext2d,
    node: &Node,
    selected: bool,
    theme: &CanvasTheme,
    vp: &Viewport,
) {
    let b = node.bounds();
    let (x, y, w, h) = (b.x as f64, b.y as f64, b.width as f64, b.height as f64);

    ctx.save();
    rounded_rect_path(ctx, x, y, w, h, CORNER_RADIUS);
    ctx.set_fill_style_str(theme.node_fill);
    ctx.fill();
    ctx.set_stroke_style_str(theme.node_border);
    ctx.set_line_width(1.0);
    ctx.stroke();

    // Title bar
    ctx.set_fill_style_str(theme.node_title);
    ctx.set_font("500 14px -apple-system, BlinkMacSystemFont, sans-serif");
    let _ = ctx.fill_text(&node.title, x + 16.0, y + 26.0);
    draw_status_dot(ctx, node.status, x + w - 20.0, y + 20.0);

    if let Some(message) = node.payload.error.as_deref() {
        ctx.set_fill_style_str("#FF453A");
        ctx.set_font("12px -apple-system, BlinkMacSystemFont, sans-serif");
        let _ = ctx.fill_text(message, x + 16.0, y + h - 16.0);
    }

    // Ports keep a constant on-screen size.
    let port_r = 6.0 / vp.scale as f64;
    for (px, py) in [node.input_anchor(), node.output_anchor()] {
        ctx.begin_path();
        let _ = ctx.arc(px as f64, py as f64, port_r, 0.0, std::f64::consts::TAU);
        ctx.set_fill_style_str(theme.port);
        ctx.fill();
    }

    if selected {
        ctx.set_stroke_style_str(SELECTION);
        ctx.set_line_width(2.0 / vp.scale as f64);
        rounded_rect_path(ctx, x - 2.0, y - 2.0, w + 4.0, h + 4.0, CORNER_RADIUS + 2.0);
        ctx.stroke();
        draw_resize_grip(ctx, &b, vp);
    }
    ctx.restore();
}

fn draw_status_dot(ctx: &CanvasRenderingContext2d, status: NodeStatus, cx: f64, cy: f64) {
    let color = match status {
        NodeStatus::Idle => return,
        NodeStatus::Working => "#FFD60A",
        NodeStatus::Success => "#30D158",
        NodeStatus::Error => "#FF453A",
    };
    ctx.begin_path();
    let _ = ctx.arc(cx, cy, 4.0, 0.0, std::f64::consts::TAU);
    ctx.set_fill_style_str(color);
    ctx.fill();
}

/// Diagonal hatch in the bottom-right corner.
fn draw_resize_grip(ctx: &CanvasRenderingContext2d, b: &Rect, vp: &Viewport) {
    let size = 12.0 / vp.scale as f64;
    let (r, btm) = (b.right() as f64 - 4.0, b.bottom() as f64 - 4.0);
    ctx.begin_path();
    ctx.move_to(r - size, btm);
    ctx.line_to(r, btm - size);
    ctx.move_to(r - size / 2.0, btm);
    ctx.line_to(r, btm - size / 2.0);
    ctx.stroke();
}

fn draw_route(ctx: &CanvasRenderingContext2d, route: &Route, color: &str, width: f64, vp: &Viewport) {
    let f = |(x, y): (f32, f32)| (x as f64, y as f64);
    let (sx, sy) = f(route.start);
    let (c1x, c1y) = f(route.ctrl1);
    let (c2x, c2y) = f(route.ctrl2);
    let (ex, ey) = f(route.end);

    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width / vp.scale as f64);
    ctx.begin_path();
    ctx.move_to(sx, sy);
    ctx.bezier_curve_to(c1x, c1y, c2x, c2y, ex, ey);
    ctx.stroke();
}

/// Draw the rubber-band selection rectangle (screen space).
fn draw_marquee_rect(ctx: &CanvasRenderingContext2d, rect: &Rect) {
    let (x, y, w, h) = (rect.x as f64, rect.y as f64, rect.width as f64, rect.height as f64);
    if w < 1.0 && h < 1.0 {
        return;
    }

    ctx.save();

    // Semi-transparent blue fill
    ctx.set_fill_style_str("rgba(79, 195, 247, 0.08)");
    ctx.fill_rect(x, y, w, h);

    // Dashed blue border
    ctx.set_stroke_style_str(SELECTION);
    ctx.set_line_width(1.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &wasm_bindgen::JsValue::from_f64(4.0),
        &wasm_bindgen::JsValue::from_f64(4.0),
    ));
    ctx.stroke_rect(x, y, w, h);
    ctx.restore();
}

/// Dash pattern of `len` screen pixels under the world transform.
fn dash(len: f64, vp: &Viewport) -> js_sys::Array {
    let world = wasm_bindgen::JsValue::from_f64(len / vp.scale as f64);
    js_sys::Array::of2(&world, &world)
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}
