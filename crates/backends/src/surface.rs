//! Device-space drawing targets for the canvas backend.

use std::fmt::Write;

use command::{StyleKey, StyleValue};
use geometry::{DVec2, Matrix};
use handler::Image;
use serde::Serialize;

/// A device-space path renderer.
///
/// Path calls build the current path until `fill` or `stroke` paints
/// it; `begin_path` discards it. Points are already transformed.
pub trait Surface {
    /// Height in device units, for y-up views.
    fn height(&self) -> f64;

    fn clear(&mut self);

    fn set_style(&mut self, key: StyleKey, value: &StyleValue);

    fn begin_path(&mut self);

    fn move_to(&mut self, p: DVec2);

    fn line_to(&mut self, p: DVec2);

    fn cubic_to(&mut self, c1: DVec2, c2: DVec2, p: DVec2);

    fn close_path(&mut self);

    fn fill(&mut self);

    fn stroke(&mut self);

    /// Text laid out at the origin of `transform`.
    fn text(&mut self, text: &str, transform: Matrix);

    /// Image of `size` placed at the origin of `transform`.
    fn image(&mut self, image: &Image, transform: Matrix, size: DVec2);
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SurfaceCall {
    Clear,
    SetStyle { key: StyleKey, value: StyleValue },
    BeginPath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    CubicTo { c1: [f64; 2], c2: [f64; 2], x: f64, y: f64 },
    ClosePath,
    Fill,
    Stroke,
    Text { text: String, transform: [f64; 6] },
    Image { uri: String, transform: [f64; 6], width: f64, height: f64 },
}

/// Keeps every call, in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    pub height: f64,
    pub calls: Vec<SurfaceCall>,
}

impl RecordingSurface {
    pub fn new(height: f64) -> Self {
        Self {
            height,
            calls: Vec::new(),
        }
    }

    pub fn take(&mut self) -> Vec<SurfaceCall> {
        std::mem::take(&mut self.calls)
    }
}

impl Surface for RecordingSurface {
    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self) {
        self.calls.push(SurfaceCall::Clear);
    }

    fn set_style(&mut self, key: StyleKey, value: &StyleValue) {
        self.calls.push(SurfaceCall::SetStyle {
            key,
            value: value.clone(),
        });
    }

    fn begin_path(&mut self) {
        self.calls.push(SurfaceCall::BeginPath);
    }

    fn move_to(&mut self, p: DVec2) {
        self.calls.push(SurfaceCall::MoveTo { x: p.x, y: p.y });
    }

    fn line_to(&mut self, p: DVec2) {
        self.calls.push(SurfaceCall::LineTo { x: p.x, y: p.y });
    }

    fn cubic_to(&mut self, c1: DVec2, c2: DVec2, p: DVec2) {
        self.calls.push(SurfaceCall::CubicTo {
            c1: c1.to_array(),
            c2: c2.to_array(),
            x: p.x,
            y: p.y,
        });
    }

    fn close_path(&mut self) {
        self.calls.push(SurfaceCall::ClosePath);
    }

    fn fill(&mut self) {
        self.calls.push(SurfaceCall::Fill);
    }

    fn stroke(&mut self) {
        self.calls.push(SurfaceCall::Stroke);
    }

    fn text(&mut self, text: &str, transform: Matrix) {
        self.calls.push(SurfaceCall::Text {
            text: text.to_string(),
            transform: transform.to_array(),
        });
    }

    fn image(&mut self, image: &Image, transform: Matrix, size: DVec2) {
        self.calls.push(SurfaceCall::Image {
            uri: image.uri.clone(),
            transform: transform.to_array(),
            width: size.x,
            height: size.y,
        });
    }
}

/// Writes an SVG document, one `<path>` per paint call.
#[derive(Clone, Debug)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    style: command::Style,
    path: String,
    body: String,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            style: command::Style::default(),
            path: String::new(),
            body: String::new(),
        }
    }

    pub fn to_svg(&self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n{}</svg>\n",
            self.width, self.height, self.width, self.height, self.body
        )
    }

    fn paint(&self, key: StyleKey) -> String {
        let value = self.style.get(key);
        if value.is_invisible() {
            "none".to_string()
        } else {
            attr(value)
        }
    }

    fn stroke_attrs(&self) -> String {
        let mut attrs = format!(
            " stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"{}\" stroke-linejoin=\"{}\" stroke-miterlimit=\"{}\"",
            self.paint(StyleKey::Stroke),
            attr(self.style.get(StyleKey::LineWidth)),
            attr(self.style.get(StyleKey::LineCap)),
            attr(self.style.get(StyleKey::LineJoin)),
            attr(self.style.get(StyleKey::MiterLimit)),
        );
        if let StyleValue::List(dash) = self.style.get(StyleKey::Dash) {
            if !dash.is_empty() {
                let dash: Vec<String> = dash.iter().map(f64::to_string).collect();
                let _ = write!(
                    attrs,
                    " stroke-dasharray=\"{}\" stroke-dashoffset=\"{}\"",
                    dash.join(" "),
                    attr(self.style.get(StyleKey::DashOffset))
                );
            }
        }
        attrs
    }
}

fn attr(value: &StyleValue) -> String {
    match value {
        StyleValue::Number(n) => n.to_string(),
        StyleValue::Text(s) => s
            .replace('&', "&amp;")
            .replace('"', "&quot;")
            .replace('<', "&lt;"),
        StyleValue::List(list) => list
            .iter()
            .map(f64::to_string)
            .collect::<Vec<_>>()
            .join(" "),
        StyleValue::Shadow(shadow) => shadow.color.clone(),
    }
}

fn matrix_attr(m: &Matrix) -> String {
    format!("matrix({} {} {} {} {} {})", m.a, m.b, m.c, m.d, m.e, m.f)
}

impl Surface for SvgSurface {
    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self) {
        self.body.clear();
        self.path.clear();
    }

    fn set_style(&mut self, key: StyleKey, value: &StyleValue) {
        self.style.set(key, value.clone());
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, p: DVec2) {
        let _ = write!(self.path, "M{} {}", p.x, p.y);
    }

    fn line_to(&mut self, p: DVec2) {
        let _ = write!(self.path, "L{} {}", p.x, p.y);
    }

    fn cubic_to(&mut self, c1: DVec2, c2: DVec2, p: DVec2) {
        let _ = write!(self.path, "C{} {} {} {} {} {}", c1.x, c1.y, c2.x, c2.y, p.x, p.y);
    }

    fn close_path(&mut self) {
        self.path.push('Z');
    }

    fn fill(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let _ = writeln!(
            self.body,
            "<path d=\"{}\" fill=\"{}\" stroke=\"none\"/>",
            self.path,
            self.paint(StyleKey::Fill)
        );
    }

    fn stroke(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let attrs = self.stroke_attrs();
        let _ = writeln!(self.body, "<path d=\"{}\" fill=\"none\"{}/>", self.path, attrs);
    }

    fn text(&mut self, text: &str, transform: Matrix) {
        let escaped = attr(&StyleValue::text(text));
        let anchor = match self.style.get(StyleKey::HorizontalAnchor).as_str() {
            Some("center") => "middle",
            Some("right") => "end",
            _ => "start",
        };
        let _ = writeln!(
            self.body,
            "<text transform=\"{}\" style=\"font: {}\" fill=\"{}\" text-anchor=\"{}\">{}</text>",
            matrix_attr(&transform),
            attr(self.style.get(StyleKey::Font)),
            self.paint(StyleKey::Fill),
            anchor,
            escaped
        );
    }

    fn image(&mut self, image: &Image, transform: Matrix, size: DVec2) {
        let _ = writeln!(
            self.body,
            "<image href=\"{}\" transform=\"{}\" width=\"{}\" height=\"{}\"/>",
            attr(&StyleValue::text(image.uri.as_str())),
            matrix_attr(&transform),
            size.x,
            size.y
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_path_output() {
        let mut svg = SvgSurface::new(100.0, 50.0);
        svg.set_style(StyleKey::Fill, &StyleValue::text("red"));
        svg.begin_path();
        svg.move_to(DVec2::new(0.0, 0.0));
        svg.line_to(DVec2::new(10.0, 0.0));
        svg.close_path();
        svg.fill();
        svg.stroke();
        let out = svg.to_svg();
        assert!(out.contains("<path d=\"M0 0L10 0Z\" fill=\"red\" stroke=\"none\"/>"));
        assert!(out.contains("stroke=\"black\" stroke-width=\"1\""));
    }

    #[test]
    fn test_recording_serializes_calls() {
        let mut surface = RecordingSurface::new(10.0);
        surface.move_to(DVec2::new(1.0, 2.0));
        let json = serde_json::to_string(&surface.calls).unwrap();
        assert_eq!(json, r#"[{"op":"move_to","x":1.0,"y":2.0}]"#);
    }
}
