//! graphics.rs
//!
//! Graphics-state value types and the state records the interpreter pushes
//! and pops with `q`/`Q`. Everything here is cheap to clone; the save stack
//! is a plain vector of copies, never shared references.

use std::rc::Rc;

use serde_derive::{Deserialize, Serialize};

use crate::color::{Color, ColorSpace};
use crate::font::PdfFont;
use crate::matrix::Matrix;

/// Fill path using nonzero winding number rule
pub const OP_PATH_PAINT_FILL_NZ: &str = "f";
/// Fill path using even-odd rule
pub const OP_PATH_PAINT_FILL_EO: &str = "f*";
/// Current path is a clip path, non-zero winding order (usually in like `h W S`)
pub const OP_PATH_CONST_CLIP_NZ: &str = "W";
/// Current path is a clip path, even-odd winding order
pub const OP_PATH_CONST_CLIP_EO: &str = "W*";

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineCapStyle {
    #[default]
    Butt,
    Round,
    ProjectingSquare,
}

impl LineCapStyle {
    pub fn from_i64(v: i64) -> LineCapStyle {
        match v {
            1 => LineCapStyle::Round,
            2 => LineCapStyle::ProjectingSquare,
            _ => LineCapStyle::Butt,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            LineCapStyle::Butt => 0,
            LineCapStyle::Round => 1,
            LineCapStyle::ProjectingSquare => 2,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineJoinStyle {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoinStyle {
    pub fn from_i64(v: i64) -> LineJoinStyle {
        match v {
            1 => LineJoinStyle::Round,
            2 => LineJoinStyle::Bevel,
            _ => LineJoinStyle::Miter,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            LineJoinStyle::Miter => 0,
            LineJoinStyle::Round => 1,
            LineJoinStyle::Bevel => 2,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDashPattern {
    pub array: Vec<f32>,
    pub phase: f32,
}

impl LineDashPattern {
    pub fn solid() -> LineDashPattern {
        LineDashPattern::default()
    }

    pub fn is_solid(&self) -> bool {
        self.array.is_empty()
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextRenderingMode {
    #[default]
    Fill,
    Stroke,
    FillStroke,
    Invisible,
    FillClip,
    StrokeClip,
    FillStrokeClip,
    Clip,
}

impl TextRenderingMode {
    pub fn from_i64(v: i64) -> TextRenderingMode {
        use self::TextRenderingMode::*;
        match v {
            1 => Stroke,
            2 => FillStroke,
            3 => Invisible,
            4 => FillClip,
            5 => StrokeClip,
            6 => FillStrokeClip,
            7 => Clip,
            _ => Fill,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderingIntent {
    AbsoluteColorimetric,
    #[default]
    RelativeColorimetric,
    Saturation,
    Perceptual,
}

impl RenderingIntent {
    pub fn from_name(name: &[u8]) -> RenderingIntent {
        match name {
            b"AbsoluteColorimetric" => RenderingIntent::AbsoluteColorimetric,
            b"Saturation" => RenderingIntent::Saturation,
            b"Perceptual" => RenderingIntent::Perceptual,
            _ => RenderingIntent::RelativeColorimetric,
        }
    }
}

/// The nominal PDF blend mode, handed to the sink unchanged.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub fn from_name(name: &[u8]) -> BlendMode {
        match name {
            b"Multiply" => BlendMode::Multiply,
            b"Screen" => BlendMode::Screen,
            b"Overlay" => BlendMode::Overlay,
            b"Darken" => BlendMode::Darken,
            b"Lighten" => BlendMode::Lighten,
            b"ColorDodge" => BlendMode::ColorDodge,
            b"ColorBurn" => BlendMode::ColorBurn,
            b"HardLight" => BlendMode::HardLight,
            b"SoftLight" => BlendMode::SoftLight,
            b"Difference" => BlendMode::Difference,
            b"Exclusion" => BlendMode::Exclusion,
            b"Hue" => BlendMode::Hue,
            b"Saturation" => BlendMode::Saturation,
            b"Color" => BlendMode::Color,
            b"Luminosity" => BlendMode::Luminosity,
            _ => BlendMode::Normal,
        }
    }
}

/// Text parameters. `Tc`/`Tw`/`Tz`/`TL`/`Tf`/`Tr`/`Ts` live in the graphics
/// state and survive across text objects; the matrices exist only between
/// `BT` and `ET` and are reset by `BT`.
#[derive(Debug, Clone)]
pub struct TextState {
    pub char_spacing: f32,
    pub word_spacing: f32,
    /// `Tz`, percent.
    pub horizontal_scale: f32,
    pub leading: f32,
    pub font: Option<Rc<PdfFont>>,
    pub font_name: Option<String>,
    pub font_size: f32,
    pub render_mode: TextRenderingMode,
    pub rise: f32,
    pub tm: Matrix,
    pub tlm: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        TextState {
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 100.0,
            leading: 0.0,
            font: None,
            font_name: None,
            font_size: 0.0,
            render_mode: TextRenderingMode::Fill,
            rise: 0.0,
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
        }
    }
}

impl TextState {
    /// `BT`: both matrices restart at identity.
    pub fn begin_text(&mut self) {
        self.tm = Matrix::IDENTITY;
        self.tlm = Matrix::IDENTITY;
    }
}

/// The full graphics state, cloned wholesale by `q` and restored by `Q`.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    pub ctm: Matrix,
    pub fill_space: ColorSpace,
    pub stroke_space: ColorSpace,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub line_width: f32,
    pub line_cap: LineCapStyle,
    pub line_join: LineJoinStyle,
    pub miter_limit: f32,
    pub dash: LineDashPattern,
    pub rendering_intent: RenderingIntent,
    pub flatness: f32,
    pub fill_alpha: f32,
    pub stroke_alpha: f32,
    pub blend_mode: BlendMode,
    /// `/SMask` resource reference from an ExtGState, `None` for `/None`.
    pub soft_mask: Option<String>,
    pub text: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        GraphicsState {
            ctm: Matrix::IDENTITY,
            fill_space: ColorSpace::DeviceGray,
            stroke_space: ColorSpace::DeviceGray,
            fill_color: Color::black(),
            stroke_color: Color::black(),
            line_width: 1.0,
            line_cap: LineCapStyle::Butt,
            line_join: LineJoinStyle::Miter,
            miter_limit: 10.0,
            dash: LineDashPattern::solid(),
            rendering_intent: RenderingIntent::RelativeColorimetric,
            flatness: 1.0,
            fill_alpha: 1.0,
            stroke_alpha: 1.0,
            blend_mode: BlendMode::Normal,
            soft_mask: None,
            text: TextState::default(),
        }
    }
}

/// The save/restore stack. PDF 2.0 documents a nesting limit of 28; deeper
/// nesting still works but is reported to the caller as a warning.
pub const GS_STACK_NESTING_LIMIT: usize = 28;

#[derive(Debug, Default)]
pub struct GraphicsStateStack {
    stack: Vec<GraphicsState>,
}

impl GraphicsStateStack {
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Pushes a clone; returns false once past the documented limit.
    pub fn save(&mut self, state: &GraphicsState) -> bool {
        self.stack.push(state.clone());
        self.stack.len() <= GS_STACK_NESTING_LIMIT
    }

    /// Pops the saved state, or `None` for an unbalanced `Q`.
    pub fn restore(&mut self) -> Option<GraphicsState> {
        self.stack.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_restore_roundtrip() {
        let mut stack = GraphicsStateStack::default();
        let mut gs = GraphicsState::default();
        gs.line_width = 4.0;
        assert!(stack.save(&gs));
        gs.line_width = 9.0;
        let restored = stack.restore().unwrap();
        assert_eq!(restored.line_width, 4.0);
        assert!(stack.restore().is_none());
    }

    #[test]
    fn nesting_limit_is_soft() {
        let mut stack = GraphicsStateStack::default();
        let gs = GraphicsState::default();
        for _ in 0..GS_STACK_NESTING_LIMIT {
            assert!(stack.save(&gs));
        }
        // pushes past the limit still succeed, they just warn
        assert!(!stack.save(&gs));
        assert_eq!(stack.depth(), GS_STACK_NESTING_LIMIT + 1);
    }

    #[test]
    fn begin_text_resets_matrices() {
        let mut ts = TextState::default();
        ts.tm = Matrix::translate(5.0, 6.0);
        ts.tlm = ts.tm;
        ts.begin_text();
        assert_eq!(ts.tm, Matrix::IDENTITY);
        assert_eq!(ts.tlm, Matrix::IDENTITY);
    }

    #[test]
    fn style_ids_roundtrip() {
        for v in 0..3 {
            assert_eq!(LineCapStyle::from_i64(v).id(), v);
            assert_eq!(LineJoinStyle::from_i64(v).id(), v);
        }
    }
}
