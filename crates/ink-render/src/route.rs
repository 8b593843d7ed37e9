//! Connection geometry.
//!
//! A connection leaves the source's output anchor (right-edge midpoint) and
//! enters the target's input anchor (left-edge midpoint) as a cubic Bézier
//! whose control points sit half the horizontal distance along, level with
//! their endpoints. That gives an S-curve for any vertical offset.

use ink_core::geometry::Rect;
use ink_core::model::{Connection, Node};
use ink_core::Graph;
use kurbo::{CubicBez, ParamCurveExtrema, ParamCurveNearest, Point};
use std::fmt::Write;

/// Max error (world units) of the nearest-point search.
const NEAREST_ACCURACY: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub start: (f32, f32),
    pub ctrl1: (f32, f32),
    pub ctrl2: (f32, f32),
    pub end: (f32, f32),
}

impl Route {
    /// Curve between two anchor points.
    pub fn between(start: (f32, f32), end: (f32, f32)) -> Self {
        let half = (end.0 - start.0) * 0.5;
        Self {
            start,
            ctrl1: (start.0 + half, start.1),
            ctrl2: (end.0 - half, end.1),
            end,
        }
    }

    /// Curve from `from`'s output port to `to`'s input port.
    pub fn for_nodes(from: &Node, to: &Node) -> Self {
        Self::between(from.output_anchor(), to.input_anchor())
    }

    /// Preview while a connection is being dragged out of `from`.
    pub fn pending(from: &Node, pointer: (f32, f32)) -> Self {
        Self::between(from.output_anchor(), pointer)
    }

    pub fn to_cubic(&self) -> CubicBez {
        let p = |(x, y): (f32, f32)| Point::new(x as f64, y as f64);
        CubicBez::new(p(self.start), p(self.ctrl1), p(self.ctrl2), p(self.end))
    }

    /// Distance from `(px, py)` to the nearest point on the curve.
    pub fn distance_to(&self, px: f32, py: f32) -> f32 {
        let nearest = self
            .to_cubic()
            .nearest(Point::new(px as f64, py as f64), NEAREST_ACCURACY);
        nearest.distance_sq.sqrt() as f32
    }

    /// Tight bounding box of the curve.
    pub fn bounds(&self) -> Rect {
        let bb = self.to_cubic().bounding_box();
        Rect::new(bb.x0 as f32, bb.y0 as f32, bb.width() as f32, bb.height() as f32)
    }

    /// SVG path data: `M x y C c1x c1y c2x c2y x y`.
    pub fn svg_path(&self) -> String {
        let mut d = String::with_capacity(64);
        let _ = write!(
            d,
            "M {} {} C {} {} {} {} {} {}",
            self.start.0,
            self.start.1,
            self.ctrl1.0,
            self.ctrl1.1,
            self.ctrl2.0,
            self.ctrl2.1,
            self.end.0,
            self.end.1
        );
        d
    }
}

/// Route for a stored connection, or `None` if an endpoint is missing.
pub fn connection_route(graph: &Graph, conn: &Connection) -> Option<Route> {
    let from = graph.node(conn.from)?;
    let to = graph.node(conn.to)?;
    Some(Route::for_nodes(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ink_core::id::NodeId;
    use ink_core::model::NodeKind;

    fn node(name: &str, x: f32, y: f32, h: f32) -> Node {
        let mut n = Node::new(NodeId::intern(name), NodeKind::ImageGenerator, x, y);
        n.height = Some(h);
        n
    }

    #[test]
    fn controls_are_offset_by_half_the_distance() {
        let r = Route::for_nodes(&node("r1", 0.0, 0.0, 100.0), &node("r2", 820.0, 300.0, 100.0));
        assert_eq!(r.start, (420.0, 50.0));
        assert_eq!(r.end, (820.0, 350.0));
        assert_eq!(r.ctrl1, (620.0, 50.0));
        assert_eq!(r.ctrl2, (620.0, 350.0));
    }

    #[test]
    fn endpoints_lie_on_the_curve() {
        let r = Route::between((0.0, 0.0), (400.0, 200.0));
        assert!(r.distance_to(0.0, 0.0) < 0.01);
        assert!(r.distance_to(400.0, 200.0) < 0.01);
        // The S-curve passes through the midpoint by symmetry.
        assert!(r.distance_to(200.0, 100.0) < 0.01);
        assert!(r.distance_to(200.0, 250.0) > 50.0);
    }

    #[test]
    fn svg_path_format() {
        let r = Route::between((0.0, 10.0), (100.0, 30.0));
        assert_eq!(r.svg_path(), "M 0 10 C 50 10 50 30 100 30");
    }

    #[test]
    fn bounds_cover_endpoints() {
        let r = Route::between((10.0, 20.0), (210.0, 120.0));
        let b = r.bounds();
        assert!(b.contains(10.0, 20.0) && b.contains(210.0, 120.0));
    }

    #[test]
    fn missing_endpoint_has_no_route() {
        let mut g = Graph::new();
        g.add_node(node("only", 0.0, 0.0, 100.0));
        let conn = Connection::new(NodeId::intern("only"), NodeId::intern("missing"));
        assert!(connection_route(&g, &conn).is_none());
    }
}
