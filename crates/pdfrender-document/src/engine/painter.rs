// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream painter.
//
// Interprets the vector subset of a page content stream onto a tiny-skia
// pixmap: graphics state, path construction, fill/stroke/clip, and device
// colors. Text, images, shadings and XObjects are skipped.

use std::rc::Rc;

use lopdf::Object;
use lopdf::content::Operation;
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Stroke, Transform,
};
use tracing::trace;

#[derive(Clone)]
struct GraphicsState {
    ctm: Transform,
    fill: Color,
    stroke: Color,
    line_width: f32,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f32,
    clip: Option<Rc<Mask>>,
}

impl GraphicsState {
    fn new(ctm: Transform) -> Self {
        Self {
            ctm,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            clip: None,
        }
    }
}

/// What to do with the current path.
#[derive(Debug, Clone, Copy)]
struct PaintOp {
    close: bool,
    fill: Option<FillRule>,
    stroke: bool,
}

pub(crate) struct Painter<'a> {
    pixmap: &'a mut Pixmap,
    antialias: bool,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    path: PathBuilder,
    current: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
    pending_clip: Option<FillRule>,
}

impl<'a> Painter<'a> {
    pub(crate) fn new(pixmap: &'a mut Pixmap, base: Transform, antialias: bool) -> Self {
        Self {
            pixmap,
            antialias,
            state: GraphicsState::new(base),
            saved: Vec::new(),
            path: PathBuilder::new(),
            current: None,
            subpath_start: None,
            pending_clip: None,
        }
    }

    pub(crate) fn run(mut self, operations: &[Operation]) {
        for operation in operations {
            self.apply(operation);
        }
    }

    fn apply(&mut self, operation: &Operation) {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            // -- Graphics state -----------------------------------------------
            "q" => self.saved.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.saved.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some([a, b, c, d, e, f]) = numbers::<6>(operands) {
                    let matrix = Transform::from_row(a, b, c, d, e, f);
                    self.state.ctm = self.state.ctm.pre_concat(matrix);
                }
            }
            "w" => {
                if let Some([width]) = numbers::<1>(operands) {
                    self.state.line_width = width.max(0.0);
                }
            }
            "J" => {
                if let Some([cap]) = numbers::<1>(operands) {
                    self.state.line_cap = match cap as i32 {
                        1 => LineCap::Round,
                        2 => LineCap::Square,
                        _ => LineCap::Butt,
                    };
                }
            }
            "j" => {
                if let Some([join]) = numbers::<1>(operands) {
                    self.state.line_join = match join as i32 {
                        1 => LineJoin::Round,
                        2 => LineJoin::Bevel,
                        _ => LineJoin::Miter,
                    };
                }
            }
            "M" => {
                if let Some([limit]) = numbers::<1>(operands) {
                    self.state.miter_limit = limit.max(1.0);
                }
            }

            // -- Path construction --------------------------------------------
            "m" => {
                if let Some([x, y]) = numbers::<2>(operands) {
                    self.move_to(x, y);
                }
            }
            "l" => {
                if let Some([x, y]) = numbers::<2>(operands) {
                    self.line_to(x, y);
                }
            }
            "c" => {
                if let Some([x1, y1, x2, y2, x3, y3]) = numbers::<6>(operands) {
                    self.curve_to((x1, y1), (x2, y2), (x3, y3));
                }
            }
            "v" => {
                if let Some([x2, y2, x3, y3]) = numbers::<4>(operands) {
                    let start = self.current.unwrap_or((x2, y2));
                    self.curve_to(start, (x2, y2), (x3, y3));
                }
            }
            "y" => {
                if let Some([x1, y1, x3, y3]) = numbers::<4>(operands) {
                    self.curve_to((x1, y1), (x3, y3), (x3, y3));
                }
            }
            "h" => self.close_subpath(),
            "re" => {
                if let Some([x, y, width, height]) = numbers::<4>(operands) {
                    self.move_to(x, y);
                    self.line_to(x + width, y);
                    self.line_to(x + width, y + height);
                    self.line_to(x, y + height);
                    self.close_subpath();
                }
            }

            // -- Painting -----------------------------------------------------
            "f" | "F" => self.paint(PaintOp {
                close: false,
                fill: Some(FillRule::Winding),
                stroke: false,
            }),
            "f*" => self.paint(PaintOp {
                close: false,
                fill: Some(FillRule::EvenOdd),
                stroke: false,
            }),
            "S" => self.paint(PaintOp {
                close: false,
                fill: None,
                stroke: true,
            }),
            "s" => self.paint(PaintOp {
                close: true,
                fill: None,
                stroke: true,
            }),
            "B" => self.paint(PaintOp {
                close: false,
                fill: Some(FillRule::Winding),
                stroke: true,
            }),
            "B*" => self.paint(PaintOp {
                close: false,
                fill: Some(FillRule::EvenOdd),
                stroke: true,
            }),
            "b" => self.paint(PaintOp {
                close: true,
                fill: Some(FillRule::Winding),
                stroke: true,
            }),
            "b*" => self.paint(PaintOp {
                close: true,
                fill: Some(FillRule::EvenOdd),
                stroke: true,
            }),
            "n" => self.paint(PaintOp {
                close: false,
                fill: None,
                stroke: false,
            }),
            "W" => self.pending_clip = Some(FillRule::Winding),
            "W*" => self.pending_clip = Some(FillRule::EvenOdd),

            // -- Color ----------------------------------------------------------
            "g" | "rg" | "k" | "sc" | "scn" => {
                if let Some(color) = device_color(operands) {
                    self.state.fill = color;
                }
            }
            "G" | "RG" | "K" | "SC" | "SCN" => {
                if let Some(color) = device_color(operands) {
                    self.state.stroke = color;
                }
            }
            // Selecting a color space resets the color to its initial value.
            "cs" => self.state.fill = Color::BLACK,
            "CS" => self.state.stroke = Color::BLACK,

            other => trace!(operator = other, "skipping operator"),
        }
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to(x, y);
        self.current = Some((x, y));
        self.subpath_start = Some((x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        if self.current.is_none() {
            self.move_to(x, y);
            return;
        }
        self.path.line_to(x, y);
        self.current = Some((x, y));
    }

    fn curve_to(&mut self, c1: (f32, f32), c2: (f32, f32), end: (f32, f32)) {
        if self.current.is_none() {
            self.move_to(c1.0, c1.1);
        }
        self.path.cubic_to(c1.0, c1.1, c2.0, c2.1, end.0, end.1);
        self.current = Some(end);
    }

    fn close_subpath(&mut self) {
        if self.current.is_some() {
            self.path.close();
            self.current = self.subpath_start;
        }
    }

    fn paint(&mut self, op: PaintOp) {
        if op.close {
            self.close_subpath();
        }
        let builder = std::mem::take(&mut self.path);
        self.current = None;
        self.subpath_start = None;
        let clip = self.pending_clip.take();
        let Some(path) = builder.finish() else {
            return;
        };

        let ctm = self.state.ctm;
        let mask = self.state.clip.as_deref();
        if let Some(rule) = op.fill {
            let paint = self.paint_for(self.state.fill);
            self.pixmap.fill_path(&path, &paint, rule, ctm, mask);
        }
        if op.stroke {
            let paint = self.paint_for(self.state.stroke);
            let stroke = Stroke {
                width: self.state.line_width,
                miter_limit: self.state.miter_limit,
                line_cap: self.state.line_cap,
                line_join: self.state.line_join,
                dash: None,
            };
            self.pixmap.stroke_path(&path, &paint, &stroke, ctm, mask);
        }

        // W/W* take effect after the painting operator that ends the path.
        if let Some(rule) = clip {
            let next = match self.state.clip.as_deref() {
                Some(existing) => {
                    let mut mask = existing.clone();
                    mask.intersect_path(&path, rule, self.antialias, ctm);
                    Some(mask)
                }
                None => Mask::new(self.pixmap.width(), self.pixmap.height()).map(|mut mask| {
                    mask.fill_path(&path, rule, self.antialias, ctm);
                    mask
                }),
            };
            if let Some(mask) = next {
                self.state.clip = Some(Rc::new(mask));
            }
        }
    }

    fn paint_for(&self, color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = self.antialias;
        paint
    }
}

/// The first `N` operands as numbers, if there are at least `N` and they are
/// all numeric.
fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, operand) in out.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(out)
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// Device color from gray, RGB, or CMYK components. Pattern names and other
/// non-numeric operands are ignored.
fn device_color(operands: &[Object]) -> Option<Color> {
    let components: Vec<f32> = operands
        .iter()
        .filter_map(number)
        .map(|value| value.clamp(0.0, 1.0))
        .collect();
    let (r, g, b) = match components[..] {
        [gray] => (gray, gray, gray),
        [r, g, b] => (r, g, b),
        [c, m, y, k] => ((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k)),
        _ => return None,
    };
    Some(Color::from_rgba8(channel(r), channel(g), channel(b), 255))
}

fn channel(value: f32) -> u8 {
    (value * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(operator: &str, operands: &[f32]) -> Operation {
        Operation::new(
            operator,
            operands.iter().map(|value| Object::Real(*value as _)).collect(),
        )
    }

    fn canvas(size: u32) -> Pixmap {
        let mut pixmap = Pixmap::new(size, size).expect("pixmap");
        pixmap.fill(Color::WHITE);
        pixmap
    }

    fn rgb_at(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 3] {
        let pixel = pixmap.pixel(x, y).expect("in bounds").demultiply();
        [pixel.red(), pixel.green(), pixel.blue()]
    }

    #[test]
    fn fills_rectangle_with_device_rgb() {
        let mut pixmap = canvas(10);
        Painter::new(&mut pixmap, Transform::identity(), false).run(&[
            op("rg", &[0.0, 0.0, 1.0]),
            op("re", &[0.0, 0.0, 5.0, 10.0]),
            op("f", &[]),
        ]);
        assert_eq!(rgb_at(&pixmap, 2, 5), [0, 0, 255]);
        assert_eq!(rgb_at(&pixmap, 7, 5), [255, 255, 255]);
    }

    #[test]
    fn cmyk_black_is_black() {
        let color = device_color(&[
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(1),
        ])
        .expect("color");
        assert_eq!(color, Color::from_rgba8(0, 0, 0, 255));
        assert!(device_color(&[Object::Integer(1), Object::Integer(0)]).is_none());
    }

    #[test]
    fn restore_pops_transform() {
        let mut pixmap = canvas(10);
        Painter::new(&mut pixmap, Transform::identity(), false).run(&[
            op("q", &[]),
            op("cm", &[1.0, 0.0, 0.0, 1.0, 5.0, 0.0]),
            op("Q", &[]),
            op("g", &[0.0]),
            op("re", &[0.0, 0.0, 2.0, 2.0]),
            op("f", &[]),
        ]);
        assert_eq!(rgb_at(&pixmap, 1, 1), [0, 0, 0]);
        assert_eq!(rgb_at(&pixmap, 6, 1), [255, 255, 255]);
    }

    #[test]
    fn clip_limits_later_fills() {
        let mut pixmap = canvas(10);
        Painter::new(&mut pixmap, Transform::identity(), false).run(&[
            op("re", &[0.0, 0.0, 4.0, 10.0]),
            op("W", &[]),
            op("n", &[]),
            op("g", &[0.0]),
            op("re", &[0.0, 0.0, 10.0, 10.0]),
            op("f", &[]),
        ]);
        assert_eq!(rgb_at(&pixmap, 2, 5), [0, 0, 0]);
        assert_eq!(rgb_at(&pixmap, 8, 5), [255, 255, 255]);
    }

    #[test]
    fn stroke_uses_stroke_color() {
        let mut pixmap = canvas(10);
        Painter::new(&mut pixmap, Transform::identity(), false).run(&[
            op("RG", &[1.0, 0.0, 0.0]),
            op("w", &[2.0]),
            op("m", &[0.0, 5.0]),
            op("l", &[10.0, 5.0]),
            op("S", &[]),
        ]);
        assert_eq!(rgb_at(&pixmap, 5, 5), [255, 0, 0]);
        assert_eq!(rgb_at(&pixmap, 5, 1), [255, 255, 255]);
    }

    #[test]
    fn short_operand_lists_are_ignored() {
        assert!(numbers::<4>(&[Object::Integer(1)]).is_none());
        assert_eq!(
            numbers::<2>(&[Object::Integer(1), Object::Real(2.5)]),
            Some([1.0, 2.5])
        );
    }
}
