//! Outline pen feeding both zeno and kurbo
//!
//! Zeno rasterizes SVG path strings; kurbo gives exact bounds without
//! parsing them back. The pen flips y so paths come out in bitmap
//! orientation (y down), and can shear x for synthetic oblique.

use kurbo::{BezPath, Shape};

/// Horizontal shift per unit of height for synthetic oblique, tan(12°)
pub const OBLIQUE_SHEAR: f32 = 0.2126;

pub struct ZenoPen {
    commands: Vec<String>,
    path: BezPath,
    shear: f32,
}

impl ZenoPen {
    pub fn new(shear: f32) -> Self {
        Self {
            commands: Vec::new(),
            path: BezPath::new(),
            shear,
        }
    }

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (x + y * self.shear, -y)
    }

    /// SVG path data and pixel bounds `(x0, y0, x1, y1)`, or `None` for an
    /// empty outline
    pub fn finish(self) -> (String, Option<(f64, f64, f64, f64)>) {
        let bbox = self.path.bounding_box();
        let bounds = [bbox.x0, bbox.y0, bbox.x1, bbox.y1]
            .iter()
            .all(|v| v.is_finite())
            .then_some((bbox.x0, bbox.y0, bbox.x1, bbox.y1))
            .filter(|_| !self.commands.is_empty());
        (self.commands.join(" "), bounds)
    }
}

impl skrifa::outline::OutlinePen for ZenoPen {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.commands.push(format!("M {:.2},{:.2}", x, y));
        self.path.move_to((x as f64, y as f64));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.commands.push(format!("L {:.2},{:.2}", x, y));
        self.path.line_to((x as f64, y as f64));
    }

    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        let (cx, cy) = self.map(cx, cy);
        let (x, y) = self.map(x, y);
        self.commands
            .push(format!("Q {:.2},{:.2} {:.2},{:.2}", cx, cy, x, y));
        self.path.quad_to((cx as f64, cy as f64), (x as f64, y as f64));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let (cx0, cy0) = self.map(cx0, cy0);
        let (cx1, cy1) = self.map(cx1, cy1);
        let (x, y) = self.map(x, y);
        self.commands.push(format!(
            "C {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
            cx0, cy0, cx1, cy1, x, y
        ));
        self.path.curve_to(
            (cx0 as f64, cy0 as f64),
            (cx1 as f64, cy1 as f64),
            (x as f64, y as f64),
        );
    }

    fn close(&mut self) {
        self.commands.push("Z".to_string());
        self.path.close_path();
    }
}
