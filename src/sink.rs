//! sink.rs
//!
//! The abstract 2D output device the interpreter draws into. Every method
//! has a no-op default so a sink only implements what it consumes; a text
//! extractor overrides `draw_text_run` and ignores the rest. Calls arrive
//! in PDF stream order; coordinates stay in PDF's Y-up convention and the
//! sink decides whether to invert.

use crate::color::{Color, ColorSpace};
use crate::graphics::{
    BlendMode, FillRule, LineCapStyle, LineDashPattern, LineJoinStyle, TextRenderingMode,
};
use crate::matrix::Matrix;
use crate::shading::ShadingDescriptor;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathSegment {
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    CurveTo { c1: (f32, f32), c2: (f32, f32), p: (f32, f32) },
    Close,
}

/// One positioned glyph inside a text run.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphPos {
    pub code: u32,
    pub cid: u32,
    pub unicode: String,
    /// Advance along the writing direction, in text space units (includes
    /// character/word spacing and horizontal scaling).
    pub advance: f32,
}

/// A shown string: everything the sink needs to draw or extract it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Resource name of the font (`/F1`), for sinks that loaded the
    /// font program themselves.
    pub font_name: String,
    pub base_font: String,
    pub font_size: f32,
    pub text: String,
    pub glyphs: Vec<GlyphPos>,
    /// Text rendering matrix: text space → device space at the start of
    /// the run (CTM × Tm, with rise applied).
    pub transform: Matrix,
    pub render_mode: TextRenderingMode,
    pub vertical: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Decoded samples, packed per the bits-per-component.
    Raw,
    /// Undecoded JPEG (DCTDecode passthrough).
    Jpeg,
    /// Undecoded JPEG 2000 (JPXDecode passthrough).
    Jpx,
}

/// A colour-key mask: component ranges that render transparent.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorKeyMask {
    pub ranges: Vec<(u32, u32)>,
}

#[derive(Debug, Clone)]
pub enum ImageMask {
    ColorKey(ColorKeyMask),
    /// An explicit 1-bit stencil mask image.
    Stencil(Box<ImageData>),
}

#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub encoding: ImageEncoding,
    pub data: Vec<u8>,
    /// `None` for image masks (1-bit stencils painted in the fill colour).
    pub color_space: Option<ColorSpace>,
    pub is_image_mask: bool,
    pub decode: Option<Vec<f32>>,
    pub soft_mask: Option<Box<ImageData>>,
    pub mask: Option<ImageMask>,
    /// Unit square → device space.
    pub transform: Matrix,
}

/// The draw-call surface of the interpreter (§ graphics sink). Implementors
/// read colours and line parameters from the set_* calls that precede each
/// draw_* call.
pub trait GraphicsSink {
    fn push_state(&mut self) {}
    fn pop_state(&mut self) {}
    fn concat_ctm(&mut self, _m: Matrix) {}
    fn set_clip(&mut self, _path: &[PathSegment], _rule: FillRule) {}
    /// `fill.is_some()` fills with the given rule; `stroke` strokes; both
    /// may be set for `B`-family operators.
    fn draw_path(&mut self, _path: &[PathSegment], _fill: Option<FillRule>, _stroke: bool) {}
    fn set_fill_color(&mut self, _color: &Color) {}
    fn set_stroke_color(&mut self, _color: &Color) {}
    fn set_line_width(&mut self, _width: f32) {}
    fn set_line_cap(&mut self, _cap: LineCapStyle) {}
    fn set_line_join(&mut self, _join: LineJoinStyle) {}
    fn set_miter_limit(&mut self, _limit: f32) {}
    fn set_dash(&mut self, _pattern: &LineDashPattern) {}
    fn set_fill_alpha(&mut self, _alpha: f32) {}
    fn set_stroke_alpha(&mut self, _alpha: f32) {}
    fn set_blend_mode(&mut self, _mode: BlendMode) {}
    fn draw_text_run(&mut self, _run: &TextRun) {}
    fn draw_image(&mut self, _image: &ImageData) {}
    fn draw_shading(&mut self, _shading: &ShadingDescriptor) {}
    fn begin_form(&mut self, _bbox: Option<[f32; 4]>, _matrix: Matrix, _name: &str) {}
    fn end_form(&mut self) {}
}

/// Everything a [`RecordingSink`] captures, in call order.
#[derive(Debug, Clone)]
pub enum SinkEvent {
    PushState,
    PopState,
    ConcatCtm(Matrix),
    SetClip { rule: FillRule, segments: usize },
    DrawPath {
        path: Vec<PathSegment>,
        fill: Option<FillRule>,
        stroke: bool,
    },
    FillColor(Color),
    StrokeColor(Color),
    LineWidth(f32),
    LineCap(LineCapStyle),
    LineJoin(LineJoinStyle),
    MiterLimit(f32),
    Dash(LineDashPattern),
    FillAlpha(f32),
    StrokeAlpha(f32),
    Blend(BlendMode),
    Text(TextRun),
    Image {
        width: u32,
        height: u32,
        bits_per_component: u8,
        encoding: ImageEncoding,
        transform: Matrix,
    },
    Shading(ShadingDescriptor),
    BeginForm { name: String, matrix: Matrix },
    EndForm,
}

/// A sink that records every call, used by the test suite and handy for
/// geometry collection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> RecordingSink {
        RecordingSink::default()
    }

    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.events.iter().filter_map(|e| match e {
            SinkEvent::Text(run) => Some(run),
            _ => None,
        })
    }

    /// All extracted text, in stream order.
    pub fn text(&self) -> String {
        self.text_runs().map(|r| r.text.as_str()).collect()
    }

    pub fn draw_calls(&self) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    SinkEvent::DrawPath { .. }
                        | SinkEvent::Text(_)
                        | SinkEvent::Image { .. }
                        | SinkEvent::Shading(_)
                )
            })
            .count()
    }
}

impl GraphicsSink for RecordingSink {
    fn push_state(&mut self) {
        self.events.push(SinkEvent::PushState);
    }

    fn pop_state(&mut self) {
        self.events.push(SinkEvent::PopState);
    }

    fn concat_ctm(&mut self, m: Matrix) {
        self.events.push(SinkEvent::ConcatCtm(m));
    }

    fn set_clip(&mut self, path: &[PathSegment], rule: FillRule) {
        self.events.push(SinkEvent::SetClip {
            rule,
            segments: path.len(),
        });
    }

    fn draw_path(&mut self, path: &[PathSegment], fill: Option<FillRule>, stroke: bool) {
        self.events.push(SinkEvent::DrawPath {
            path: path.to_vec(),
            fill,
            stroke,
        });
    }

    fn set_fill_color(&mut self, color: &Color) {
        self.events.push(SinkEvent::FillColor(color.clone()));
    }

    fn set_stroke_color(&mut self, color: &Color) {
        self.events.push(SinkEvent::StrokeColor(color.clone()));
    }

    fn set_line_width(&mut self, width: f32) {
        self.events.push(SinkEvent::LineWidth(width));
    }

    fn set_line_cap(&mut self, cap: LineCapStyle) {
        self.events.push(SinkEvent::LineCap(cap));
    }

    fn set_line_join(&mut self, join: LineJoinStyle) {
        self.events.push(SinkEvent::LineJoin(join));
    }

    fn set_miter_limit(&mut self, limit: f32) {
        self.events.push(SinkEvent::MiterLimit(limit));
    }

    fn set_dash(&mut self, pattern: &LineDashPattern) {
        self.events.push(SinkEvent::Dash(pattern.clone()));
    }

    fn set_fill_alpha(&mut self, alpha: f32) {
        self.events.push(SinkEvent::FillAlpha(alpha));
    }

    fn set_stroke_alpha(&mut self, alpha: f32) {
        self.events.push(SinkEvent::StrokeAlpha(alpha));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.events.push(SinkEvent::Blend(mode));
    }

    fn draw_text_run(&mut self, run: &TextRun) {
        self.events.push(SinkEvent::Text(run.clone()));
    }

    fn draw_image(&mut self, image: &ImageData) {
        self.events.push(SinkEvent::Image {
            width: image.width,
            height: image.height,
            bits_per_component: image.bits_per_component,
            encoding: image.encoding,
            transform: image.transform,
        });
    }

    fn draw_shading(&mut self, shading: &ShadingDescriptor) {
        self.events.push(SinkEvent::Shading(shading.clone()));
    }

    fn begin_form(&mut self, _bbox: Option<[f32; 4]>, matrix: Matrix, name: &str) {
        self.events.push(SinkEvent::BeginForm {
            name: name.to_string(),
            matrix,
        });
    }

    fn end_form(&mut self) {
        self.events.push(SinkEvent::EndForm);
    }
}
