//! interpreter.rs
//!
//! The content-stream virtual machine: a stack of graphics states, a path
//! builder, text-object bookkeeping and one big operator dispatch. Faulty
//! operators are logged into the warning list and skipped, so a page renders
//! as far as its content allows and never aborts mid-stream. Only caller
//! cancellation stops interpretation early.

use std::rc::Rc;

use crate::color::ColorSpace;
use crate::content::{ContentInstruction, ContentIter};
use crate::document::PdfDocument;
use crate::error::{Error, PdfWarnMsg};
use crate::filter;
use crate::font::PdfFont;
use crate::graphics::{
    BlendMode, FillRule, GraphicsState, GraphicsStateStack, LineCapStyle, LineDashPattern,
    LineJoinStyle, RenderingIntent, TextRenderingMode,
};
use crate::matrix::Matrix;
use crate::object::{Dictionary, Object, Stream};
use crate::sink::{
    ColorKeyMask, GlyphPos, GraphicsSink, ImageData, ImageEncoding, ImageMask, PathSegment,
    TextRun,
};

/// Form XObjects may nest; past this depth recursion is cut with a warning.
const MAX_FORM_DEPTH: usize = 12;

#[derive(Default)]
pub struct RenderOptions<'a> {
    /// Checked between content instructions; returning true aborts with
    /// [`Error::Cancelled`], leaving partial sink output in place.
    pub cancel: Option<&'a dyn Fn() -> bool>,
}

/// Interprets one page against a sink. Returns the non-fatal diagnostics
/// collected along the way.
pub fn render_page<S: GraphicsSink>(
    doc: &PdfDocument,
    page_index: usize,
    sink: &mut S,
    opts: &RenderOptions,
) -> Result<Vec<PdfWarnMsg>, Error> {
    let page_id = doc.page_id(page_index)?;
    let resources = doc.page_resources(page_id);
    let content = doc.page_content_bytes(page_id)?;

    let mut interp = Interpreter {
        doc,
        sink,
        page: page_index,
        gs: GraphicsState::default(),
        stack: GraphicsStateStack::default(),
        path: Vec::new(),
        current_point: None,
        subpath_start: None,
        pending_clip: None,
        in_text: false,
        warnings: Vec::new(),
        op_id: 0,
        form_depth: 0,
    };
    interp.run(&content, &resources, opts)?;

    // leave the sink's state stack as balanced as we found it
    while interp.stack.depth() > 0 {
        interp.stack.restore();
        interp.sink.pop_state();
        interp
            .warnings
            .push(PdfWarnMsg::warning(page_index, interp.op_id, "unbalanced q at end of page".into()));
    }
    Ok(interp.warnings)
}

struct Interpreter<'a, S: GraphicsSink> {
    doc: &'a PdfDocument,
    sink: &'a mut S,
    page: usize,
    gs: GraphicsState,
    stack: GraphicsStateStack,
    path: Vec<PathSegment>,
    current_point: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
    /// `W`/`W*` was seen; applied and cleared at the next paint operator.
    pending_clip: Option<FillRule>,
    in_text: bool,
    warnings: Vec<PdfWarnMsg>,
    op_id: usize,
    form_depth: usize,
}

impl<'a, S: GraphicsSink> Interpreter<'a, S> {
    fn run(
        &mut self,
        content: &[u8],
        resources: &Dictionary,
        opts: &RenderOptions,
    ) -> Result<(), Error> {
        for instr in ContentIter::new(content) {
            if let Some(cancel) = opts.cancel {
                if cancel() {
                    return Err(Error::Cancelled);
                }
            }
            self.op_id += 1;
            self.dispatch(&instr, resources, opts)?;
        }
        Ok(())
    }

    fn warn(&mut self, msg: String) {
        log::debug!("page {} op {}: {msg}", self.page, self.op_id);
        self.warnings.push(PdfWarnMsg::warning(self.page, self.op_id, msg));
    }

    fn f32_operand(&mut self, instr: &ContentInstruction, idx: usize) -> Option<f32> {
        match instr.operands.get(idx).and_then(|o| o.as_f32()) {
            Some(v) => Some(v),
            None => {
                self.warn(format!(
                    "operator {} expected a number at operand {idx}",
                    instr.operator
                ));
                None
            }
        }
    }

    fn floats(&self, instr: &ContentInstruction) -> Vec<f32> {
        instr.operands.iter().filter_map(|o| o.as_f32()).collect()
    }

    fn name_operand<'i>(&mut self, instr: &'i ContentInstruction, idx: usize) -> Option<&'i [u8]> {
        match instr.operands.get(idx).and_then(|o| o.as_name()) {
            Some(n) => Some(n),
            None => {
                self.warn(format!(
                    "operator {} expected a name at operand {idx}",
                    instr.operator
                ));
                None
            }
        }
    }

    fn dispatch(
        &mut self,
        instr: &ContentInstruction,
        resources: &Dictionary,
        opts: &RenderOptions,
    ) -> Result<(), Error> {
        match instr.operator.as_str() {
            // --- graphics state ---
            "q" => {
                if !self.stack.save(&self.gs) {
                    self.warn(format!(
                        "graphics state nested deeper than {}",
                        crate::graphics::GS_STACK_NESTING_LIMIT
                    ));
                }
                self.sink.push_state();
            }
            "Q" => match self.stack.restore() {
                Some(saved) => {
                    self.gs = saved;
                    self.sink.pop_state();
                }
                None => self.warn("Q with an empty graphics state stack".into()),
            },
            "cm" => {
                let v = self.floats(instr);
                if v.len() == 6 {
                    let m = Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]);
                    self.gs.ctm = m.multiply(&self.gs.ctm);
                    self.sink.concat_ctm(m);
                } else {
                    self.warn("cm expects 6 numbers".into());
                }
            }
            "w" => {
                if let Some(width) = self.f32_operand(instr, 0) {
                    self.gs.line_width = width;
                    self.sink.set_line_width(width);
                }
            }
            "J" => {
                if let Some(v) = self.f32_operand(instr, 0) {
                    self.gs.line_cap = LineCapStyle::from_i64(v as i64);
                    self.sink.set_line_cap(self.gs.line_cap);
                }
            }
            "j" => {
                if let Some(v) = self.f32_operand(instr, 0) {
                    self.gs.line_join = LineJoinStyle::from_i64(v as i64);
                    self.sink.set_line_join(self.gs.line_join);
                }
            }
            "M" => {
                if let Some(limit) = self.f32_operand(instr, 0) {
                    self.gs.miter_limit = limit;
                    self.sink.set_miter_limit(limit);
                }
            }
            "d" => {
                let array = instr
                    .operands
                    .first()
                    .and_then(|o| o.as_array())
                    .map(|a| a.iter().filter_map(|v| v.as_f32()).collect::<Vec<_>>());
                let phase = instr.operands.get(1).and_then(|o| o.as_f32());
                match (array, phase) {
                    (Some(array), Some(phase)) => {
                        self.gs.dash = LineDashPattern { array, phase };
                        self.sink.set_dash(&self.gs.dash);
                    }
                    _ => self.warn("d expects an array and a phase".into()),
                }
            }
            "i" => {
                if let Some(flatness) = self.f32_operand(instr, 0) {
                    self.gs.flatness = flatness;
                }
            }
            "ri" => {
                if let Some(name) = instr.operands.first().and_then(|o| o.as_name()) {
                    self.gs.rendering_intent = RenderingIntent::from_name(name);
                }
            }
            "gs" => {
                if let Some(name) = self.name_operand(instr, 0).map(<[u8]>::to_vec) {
                    self.apply_ext_gstate(resources, &name);
                }
            }

            // --- path construction ---
            "m" => {
                let v = self.floats(instr);
                if v.len() == 2 {
                    self.path.push(PathSegment::MoveTo { x: v[0], y: v[1] });
                    self.current_point = Some((v[0], v[1]));
                    self.subpath_start = Some((v[0], v[1]));
                } else {
                    self.warn("m expects 2 numbers".into());
                }
            }
            "l" => {
                let v = self.floats(instr);
                if v.len() == 2 {
                    self.path.push(PathSegment::LineTo { x: v[0], y: v[1] });
                    self.current_point = Some((v[0], v[1]));
                } else {
                    self.warn("l expects 2 numbers".into());
                }
            }
            "c" => {
                let v = self.floats(instr);
                if v.len() == 6 {
                    self.path.push(PathSegment::CurveTo {
                        c1: (v[0], v[1]),
                        c2: (v[2], v[3]),
                        p: (v[4], v[5]),
                    });
                    self.current_point = Some((v[4], v[5]));
                } else {
                    self.warn("c expects 6 numbers".into());
                }
            }
            "v" => {
                let v = self.floats(instr);
                if v.len() == 4 {
                    // current point doubles as the first control point
                    let c1 = self.current_point.unwrap_or((v[0], v[1]));
                    self.path.push(PathSegment::CurveTo {
                        c1,
                        c2: (v[0], v[1]),
                        p: (v[2], v[3]),
                    });
                    self.current_point = Some((v[2], v[3]));
                } else {
                    self.warn("v expects 4 numbers".into());
                }
            }
            "y" => {
                let v = self.floats(instr);
                if v.len() == 4 {
                    // the endpoint doubles as the second control point
                    self.path.push(PathSegment::CurveTo {
                        c1: (v[0], v[1]),
                        c2: (v[2], v[3]),
                        p: (v[2], v[3]),
                    });
                    self.current_point = Some((v[2], v[3]));
                } else {
                    self.warn("y expects 4 numbers".into());
                }
            }
            "h" => {
                self.path.push(PathSegment::Close);
                self.current_point = self.subpath_start;
            }
            "re" => {
                let v = self.floats(instr);
                if v.len() == 4 {
                    let (x, y, w, h) = (v[0], v[1], v[2], v[3]);
                    self.path.push(PathSegment::MoveTo { x, y });
                    self.path.push(PathSegment::LineTo { x: x + w, y });
                    self.path.push(PathSegment::LineTo { x: x + w, y: y + h });
                    self.path.push(PathSegment::LineTo { x, y: y + h });
                    self.path.push(PathSegment::Close);
                    self.current_point = Some((x, y));
                    self.subpath_start = Some((x, y));
                } else {
                    self.warn("re expects 4 numbers".into());
                }
            }

            // --- clipping ---
            "W" => self.pending_clip = Some(FillRule::NonZero),
            "W*" => self.pending_clip = Some(FillRule::EvenOdd),

            // --- path painting ---
            "S" => self.paint(None, true, false),
            "s" => self.paint(None, true, true),
            "f" | "F" => self.paint(Some(FillRule::NonZero), false, false),
            "f*" => self.paint(Some(FillRule::EvenOdd), false, false),
            "B" => self.paint(Some(FillRule::NonZero), true, false),
            "B*" => self.paint(Some(FillRule::EvenOdd), true, false),
            "b" => self.paint(Some(FillRule::NonZero), true, true),
            "b*" => self.paint(Some(FillRule::EvenOdd), true, true),
            "n" => self.paint(None, false, false),

            // --- colour ---
            "CS" => {
                if let Some(name) = self.name_operand(instr, 0).map(<[u8]>::to_vec) {
                    if let Some(space) = self.lookup_color_space(resources, &name) {
                        self.gs.stroke_color = space.initial_color();
                        self.gs.stroke_space = space;
                        self.sink.set_stroke_color(&self.gs.stroke_color);
                    }
                }
            }
            "cs" => {
                if let Some(name) = self.name_operand(instr, 0).map(<[u8]>::to_vec) {
                    if let Some(space) = self.lookup_color_space(resources, &name) {
                        self.gs.fill_color = space.initial_color();
                        self.gs.fill_space = space;
                        self.sink.set_fill_color(&self.gs.fill_color);
                    }
                }
            }
            "SC" | "SCN" => {
                let comps = self.floats(instr);
                // SCN may carry a trailing pattern name; the numeric
                // components (if any) colour an uncoloured pattern
                self.gs.stroke_color = self.gs.stroke_space.resolve(&comps);
                self.sink.set_stroke_color(&self.gs.stroke_color);
            }
            "sc" | "scn" => {
                let comps = self.floats(instr);
                self.gs.fill_color = self.gs.fill_space.resolve(&comps);
                self.sink.set_fill_color(&self.gs.fill_color);
            }
            "G" => {
                if let Some(v) = self.f32_operand(instr, 0) {
                    self.gs.stroke_space = ColorSpace::DeviceGray;
                    self.gs.stroke_color = self.gs.stroke_space.resolve(&[v]);
                    self.sink.set_stroke_color(&self.gs.stroke_color);
                }
            }
            "g" => {
                if let Some(v) = self.f32_operand(instr, 0) {
                    self.gs.fill_space = ColorSpace::DeviceGray;
                    self.gs.fill_color = self.gs.fill_space.resolve(&[v]);
                    self.sink.set_fill_color(&self.gs.fill_color);
                }
            }
            "RG" => {
                let v = self.floats(instr);
                if v.len() == 3 {
                    self.gs.stroke_space = ColorSpace::DeviceRgb;
                    self.gs.stroke_color = self.gs.stroke_space.resolve(&v);
                    self.sink.set_stroke_color(&self.gs.stroke_color);
                }
            }
            "rg" => {
                let v = self.floats(instr);
                if v.len() == 3 {
                    self.gs.fill_space = ColorSpace::DeviceRgb;
                    self.gs.fill_color = self.gs.fill_space.resolve(&v);
                    self.sink.set_fill_color(&self.gs.fill_color);
                }
            }
            "K" => {
                let v = self.floats(instr);
                if v.len() == 4 {
                    self.gs.stroke_space = ColorSpace::DeviceCmyk;
                    self.gs.stroke_color = self.gs.stroke_space.resolve(&v);
                    self.sink.set_stroke_color(&self.gs.stroke_color);
                }
            }
            "k" => {
                let v = self.floats(instr);
                if v.len() == 4 {
                    self.gs.fill_space = ColorSpace::DeviceCmyk;
                    self.gs.fill_color = self.gs.fill_space.resolve(&v);
                    self.sink.set_fill_color(&self.gs.fill_color);
                }
            }

            // --- text objects ---
            "BT" => {
                if self.in_text {
                    self.warn("BT inside a text object, resetting text state".into());
                }
                self.in_text = true;
                self.gs.text.begin_text();
            }
            "ET" => {
                if !self.in_text {
                    self.warn("ET outside a text object".into());
                }
                self.in_text = false;
            }
            "Tc" => {
                if let Some(v) = self.f32_operand(instr, 0) {
                    self.gs.text.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = self.f32_operand(instr, 0) {
                    self.gs.text.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = self.f32_operand(instr, 0) {
                    self.gs.text.horizontal_scale = v;
                }
            }
            "TL" => {
                if let Some(v) = self.f32_operand(instr, 0) {
                    self.gs.text.leading = v;
                }
            }
            "Tf" => {
                let name = self.name_operand(instr, 0).map(<[u8]>::to_vec);
                let size = self.f32_operand(instr, 1);
                if let (Some(name), Some(size)) = (name, size) {
                    self.gs.text.font = self.lookup_font(resources, &name);
                    if self.gs.text.font.is_none() {
                        self.warn(format!(
                            "font /{} not found in resources",
                            String::from_utf8_lossy(&name)
                        ));
                    }
                    self.gs.text.font_name = Some(String::from_utf8_lossy(&name).into_owned());
                    self.gs.text.font_size = size;
                }
            }
            "Tr" => {
                if let Some(v) = self.f32_operand(instr, 0) {
                    self.gs.text.render_mode = TextRenderingMode::from_i64(v as i64);
                }
            }
            "Ts" => {
                if let Some(v) = self.f32_operand(instr, 0) {
                    self.gs.text.rise = v;
                }
            }
            "Td" => {
                let v = self.floats(instr);
                if v.len() == 2 {
                    self.text_move(v[0], v[1]);
                } else {
                    self.warn("Td expects 2 numbers".into());
                }
            }
            "TD" => {
                let v = self.floats(instr);
                if v.len() == 2 {
                    self.gs.text.leading = -v[1];
                    self.text_move(v[0], v[1]);
                } else {
                    self.warn("TD expects 2 numbers".into());
                }
            }
            "Tm" => {
                let v = self.floats(instr);
                if v.len() == 6 {
                    let m = Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]);
                    self.gs.text.tm = m;
                    self.gs.text.tlm = m;
                } else {
                    self.warn("Tm expects 6 numbers".into());
                }
            }
            "T*" => {
                let leading = self.gs.text.leading;
                self.text_move(0.0, -leading);
            }
            "Tj" => {
                if let Some(bytes) = instr.operands.first().and_then(|o| o.as_string()) {
                    let bytes = bytes.to_vec();
                    self.show_text(&bytes);
                } else {
                    self.warn("Tj expects a string".into());
                }
            }
            "'" => {
                let leading = self.gs.text.leading;
                self.text_move(0.0, -leading);
                if let Some(bytes) = instr.operands.first().and_then(|o| o.as_string()) {
                    let bytes = bytes.to_vec();
                    self.show_text(&bytes);
                }
            }
            "\"" => {
                let aw = instr.operands.first().and_then(|o| o.as_f32());
                let ac = instr.operands.get(1).and_then(|o| o.as_f32());
                let bytes = instr.operands.get(2).and_then(|o| o.as_string()).map(<[u8]>::to_vec);
                match (aw, ac, bytes) {
                    (Some(aw), Some(ac), Some(bytes)) => {
                        self.gs.text.word_spacing = aw;
                        self.gs.text.char_spacing = ac;
                        let leading = self.gs.text.leading;
                        self.text_move(0.0, -leading);
                        self.show_text(&bytes);
                    }
                    _ => self.warn("\" expects two numbers and a string".into()),
                }
            }
            "TJ" => {
                let items = instr
                    .operands
                    .first()
                    .and_then(|o| o.as_array())
                    .cloned()
                    .unwrap_or_default();
                for item in &items {
                    match item {
                        Object::String(bytes, _) => self.show_text(bytes),
                        Object::Integer(_) | Object::Real(_) => {
                            let n = item.as_f32().unwrap_or(0.0);
                            self.apply_tj_offset(n);
                        }
                        other => self.warn(format!(
                            "TJ array holds a {}, expected strings and numbers",
                            other.type_name()
                        )),
                    }
                }
            }

            // --- XObjects, images, shadings ---
            "Do" => {
                if let Some(name) = self.name_operand(instr, 0).map(<[u8]>::to_vec) {
                    self.do_xobject(resources, &name, opts)?;
                }
            }
            "BI" => {
                let dict = instr.operands.first().and_then(|o| o.as_dict()).cloned();
                let data = instr.operands.get(1).and_then(|o| o.as_string()).map(<[u8]>::to_vec);
                if let (Some(dict), Some(data)) = (dict, data) {
                    self.draw_image_stream(resources, &Stream::new(dict, data));
                }
            }
            "sh" => {
                if let Some(name) = self.name_operand(instr, 0).map(<[u8]>::to_vec) {
                    let shading = self.resource_entry(resources, b"Shading", &name);
                    match shading {
                        Some(obj) => match crate::shading::parse_shading(self.doc, &obj) {
                            Ok(descriptor) => self.sink.draw_shading(&descriptor),
                            Err(e) => self.warn(format!("sh: {e}")),
                        },
                        None => self.warn(format!(
                            "shading /{} not found in resources",
                            String::from_utf8_lossy(&name)
                        )),
                    }
                }
            }

            // --- marked content and compatibility: recorded, skipped ---
            "BMC" | "BDC" | "EMC" | "MP" | "DP" | "BX" | "EX" => {}

            // Type3 glyph metrics only appear inside CharProcs
            "d0" | "d1" => {}

            other => {
                self.warn(format!("unhandled operator {other:?}"));
            }
        }
        Ok(())
    }

    /// Paints the current path, applying a pending clip afterwards, and
    /// resets the path state. `n` arrives with no fill and no stroke.
    fn paint(&mut self, fill: Option<FillRule>, stroke: bool, close_first: bool) {
        if close_first {
            self.path.push(PathSegment::Close);
        }
        if (fill.is_some() || stroke) && !self.path.is_empty() {
            self.sink.draw_path(&self.path, fill, stroke);
        }
        if let Some(rule) = self.pending_clip.take() {
            self.sink.set_clip(&self.path, rule);
        }
        self.path.clear();
        self.current_point = None;
        self.subpath_start = None;
    }

    fn text_move(&mut self, tx: f32, ty: f32) {
        let tlm = Matrix::translate(tx, ty).multiply(&self.gs.text.tlm);
        self.gs.text.tlm = tlm;
        self.gs.text.tm = tlm;
    }

    /// A `TJ` numeric adjustment: `-n/1000 · Tfs · Th` along the writing
    /// axis.
    fn apply_tj_offset(&mut self, n: f32) {
        let ts = &self.gs.text;
        if ts.font.as_ref().map(|f| f.is_vertical()).unwrap_or(false) {
            let ty = -n / 1000.0 * ts.font_size;
            self.gs.text.tm = Matrix::translate(0.0, ty).multiply(&self.gs.text.tm);
        } else {
            let tx = -n / 1000.0 * ts.font_size * (ts.horizontal_scale / 100.0);
            self.gs.text.tm = Matrix::translate(tx, 0.0).multiply(&self.gs.text.tm);
        }
    }

    fn show_text(&mut self, bytes: &[u8]) {
        if !self.in_text {
            self.warn("text shown outside BT/ET".into());
        }
        if bytes.is_empty() {
            return;
        }
        let font = match self.gs.text.font.clone() {
            Some(f) => f,
            None => {
                self.warn("text shown with no font selected".into());
                return;
            }
        };
        let ts = &self.gs.text;
        let fs = ts.font_size;
        let th = ts.horizontal_scale / 100.0;
        let vertical = font.is_vertical();

        let mut glyphs = Vec::new();
        let mut text = String::new();
        let mut advance_total = 0f32;
        for g in font.decode_runs(bytes) {
            let advance = if vertical {
                // vertical advance ignores Th
                g.width * fs + ts.char_spacing + if g.is_space { ts.word_spacing } else { 0.0 }
            } else {
                (g.width * fs + ts.char_spacing + if g.is_space { ts.word_spacing } else { 0.0 })
                    * th
            };
            advance_total += advance;
            text.push_str(&g.unicode);
            glyphs.push(GlyphPos {
                code: g.code,
                cid: g.cid,
                unicode: g.unicode,
                advance,
            });
        }

        // text rendering transform at the start of the run
        let trm = Matrix::new(fs * th, 0.0, 0.0, fs, 0.0, ts.rise)
            .multiply(&ts.tm)
            .multiply(&self.gs.ctm);
        let run = TextRun {
            font_name: ts.font_name.clone().unwrap_or_default(),
            base_font: font.base_font.clone(),
            font_size: fs,
            text,
            glyphs,
            transform: trm,
            render_mode: ts.render_mode,
            vertical,
        };
        if ts.render_mode != TextRenderingMode::Invisible {
            self.sink.draw_text_run(&run);
        }

        // advance the text matrix past the run
        self.gs.text.tm = if vertical {
            Matrix::translate(0.0, -advance_total).multiply(&self.gs.text.tm)
        } else {
            Matrix::translate(advance_total, 0.0).multiply(&self.gs.text.tm)
        };
    }

    /// Fetches `resources[category][name]`, resolving an indirect
    /// subdictionary along the way (form resources are raw, unmerged
    /// dictionaries and may reference their subdictionaries).
    fn resource_entry(&self, resources: &Dictionary, category: &[u8], name: &[u8]) -> Option<Object> {
        let sub = self.doc.resolve(resources.get(category)?).ok()?;
        sub.as_dict()?.get(name).cloned()
    }

    fn lookup_font(&mut self, resources: &Dictionary, name: &[u8]) -> Option<Rc<PdfFont>> {
        let entry = self.resource_entry(resources, b"Font", name)?;
        if let Some(id) = entry.as_reference() {
            if let Some(cached) = self.doc.font_cache.borrow().get(&id) {
                return Some(cached.clone());
            }
        }
        let dict = self.doc.resolve(&entry).ok()?.as_dict().cloned()?;
        match PdfFont::from_dict(self.doc, &dict) {
            Ok(font) => {
                let font = Rc::new(font);
                if let Some(id) = entry.as_reference() {
                    self.doc.font_cache.borrow_mut().insert(id, font.clone());
                }
                Some(font)
            }
            Err(e) => {
                self.warn(format!("font construction failed: {e}"));
                None
            }
        }
    }

    fn lookup_color_space(&mut self, resources: &Dictionary, name: &[u8]) -> Option<ColorSpace> {
        if let Some(space) = ColorSpace::from_name(name) {
            return Some(space);
        }
        let entry = self.resource_entry(resources, b"ColorSpace", name);
        match entry {
            Some(obj) => match ColorSpace::parse(self.doc, &obj) {
                Ok(space) => Some(space),
                Err(e) => {
                    self.warn(format!("colour space: {e}"));
                    None
                }
            },
            None => {
                self.warn(format!(
                    "colour space /{} not found in resources",
                    String::from_utf8_lossy(name)
                ));
                None
            }
        }
    }

    /// `gs`: merge the named ExtGState into the current state. Transfer,
    /// halftone and overprint entries are accepted and dropped.
    fn apply_ext_gstate(&mut self, resources: &Dictionary, name: &[u8]) {
        let dict = self
            .resource_entry(resources, b"ExtGState", name)
            .and_then(|s| self.doc.resolve(&s).ok())
            .and_then(|s| s.as_dict().cloned());
        let dict = match dict {
            Some(d) => d,
            None => {
                self.warn(format!(
                    "ExtGState /{} not found in resources",
                    String::from_utf8_lossy(name)
                ));
                return;
            }
        };
        for (key, value) in dict.iter() {
            match key.as_slice() {
                b"LW" => {
                    if let Some(v) = value.as_f32() {
                        self.gs.line_width = v;
                        self.sink.set_line_width(v);
                    }
                }
                b"LC" => {
                    if let Some(v) = value.as_i64() {
                        self.gs.line_cap = LineCapStyle::from_i64(v);
                        self.sink.set_line_cap(self.gs.line_cap);
                    }
                }
                b"LJ" => {
                    if let Some(v) = value.as_i64() {
                        self.gs.line_join = LineJoinStyle::from_i64(v);
                        self.sink.set_line_join(self.gs.line_join);
                    }
                }
                b"ML" => {
                    if let Some(v) = value.as_f32() {
                        self.gs.miter_limit = v;
                        self.sink.set_miter_limit(v);
                    }
                }
                b"D" => {
                    // [[array] phase]
                    if let Some(outer) = value.as_array() {
                        let array = outer
                            .first()
                            .and_then(|a| a.as_array())
                            .map(|a| a.iter().filter_map(|v| v.as_f32()).collect())
                            .unwrap_or_default();
                        let phase = outer.get(1).and_then(|p| p.as_f32()).unwrap_or(0.0);
                        self.gs.dash = LineDashPattern { array, phase };
                        self.sink.set_dash(&self.gs.dash);
                    }
                }
                b"RI" => {
                    if let Some(n) = value.as_name() {
                        self.gs.rendering_intent = RenderingIntent::from_name(n);
                    }
                }
                b"Font" => {
                    // [fontRef size]
                    if let Some(arr) = value.as_array() {
                        let font = arr
                            .first()
                            .and_then(|f| self.doc.resolve(f).ok())
                            .and_then(|f| f.as_dict().cloned())
                            .and_then(|d| PdfFont::from_dict(self.doc, &d).ok());
                        if let Some(font) = font {
                            self.gs.text.font = Some(Rc::new(font));
                        }
                        if let Some(size) = arr.get(1).and_then(|s| s.as_f32()) {
                            self.gs.text.font_size = size;
                        }
                    }
                }
                b"BM" => {
                    let mode = match value {
                        Object::Name(n) => BlendMode::from_name(n),
                        Object::Array(arr) => arr
                            .first()
                            .and_then(|m| m.as_name())
                            .map(BlendMode::from_name)
                            .unwrap_or_default(),
                        _ => BlendMode::Normal,
                    };
                    self.gs.blend_mode = mode;
                    self.sink.set_blend_mode(mode);
                }
                b"SMask" => {
                    self.gs.soft_mask = match value {
                        Object::Name(n) if n == b"None" => None,
                        Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
                        Object::Dictionary(_) | Object::Reference(_) => Some("<dict>".into()),
                        _ => None,
                    };
                }
                b"CA" => {
                    if let Some(v) = value.as_f32() {
                        self.gs.stroke_alpha = v;
                        self.sink.set_stroke_alpha(v);
                    }
                }
                b"ca" => {
                    if let Some(v) = value.as_f32() {
                        self.gs.fill_alpha = v;
                        self.sink.set_fill_alpha(v);
                    }
                }
                b"FL" => {
                    if let Some(v) = value.as_f32() {
                        self.gs.flatness = v;
                    }
                }
                // accepted but not modelled
                b"OP" | b"op" | b"OPM" | b"BG" | b"BG2" | b"UCR" | b"UCR2" | b"TR" | b"TR2"
                | b"HT" | b"SM" | b"SA" | b"AIS" | b"TK" | b"Type" => {}
                other => {
                    log::debug!(
                        "ignoring ExtGState key {:?}",
                        String::from_utf8_lossy(other)
                    );
                }
            }
        }
    }

    fn do_xobject(
        &mut self,
        resources: &Dictionary,
        name: &[u8],
        opts: &RenderOptions,
    ) -> Result<(), Error> {
        let entry = self.resource_entry(resources, b"XObject", name);
        let obj = match entry.as_ref().and_then(|e| self.doc.resolve(e).ok()) {
            Some(o) => o,
            None => {
                self.warn(format!(
                    "XObject /{} not found in resources",
                    String::from_utf8_lossy(name)
                ));
                return Ok(());
            }
        };
        let stream = match obj.as_stream() {
            Some(s) => s,
            None => {
                self.warn("XObject is not a stream".into());
                return Ok(());
            }
        };
        match stream.dict.get(b"Subtype").and_then(|s| s.as_name()) {
            Some(b"Image") => {
                self.draw_image_stream(resources, stream);
                Ok(())
            }
            Some(b"Form") => self.run_form(resources, name, stream, opts),
            other => {
                self.warn(format!(
                    "unsupported XObject subtype {:?}",
                    other.map(String::from_utf8_lossy)
                ));
                Ok(())
            }
        }
    }

    fn run_form(
        &mut self,
        parent_resources: &Dictionary,
        name: &[u8],
        stream: &Stream,
        opts: &RenderOptions,
    ) -> Result<(), Error> {
        if self.form_depth >= MAX_FORM_DEPTH {
            self.warn("form XObjects nested too deeply, skipping".into());
            return Ok(());
        }
        let matrix = stream
            .dict
            .get(b"Matrix")
            .and_then(|m| m.as_array())
            .and_then(|a| {
                let v: Vec<f32> = a.iter().filter_map(|x| x.as_f32()).collect();
                (v.len() == 6).then(|| Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]))
            })
            .unwrap_or(Matrix::IDENTITY);
        let bbox = stream
            .dict
            .get(b"BBox")
            .and_then(|b| self.doc.resolve(b).ok())
            .and_then(|b| {
                let arr = b.as_array()?;
                let v: Vec<f32> = arr.iter().filter_map(|x| x.as_f32()).collect();
                (v.len() == 4).then(|| [v[0], v[1], v[2], v[3]])
            });
        let form_resources = stream
            .dict
            .get(b"Resources")
            .and_then(|r| self.doc.resolve(r).ok())
            .and_then(|r| r.as_dict().cloned())
            .unwrap_or_else(|| parent_resources.clone());
        let content = match stream.decoded_content() {
            Ok(c) => c.to_vec(),
            Err(e) => {
                self.warn(format!("form content undecodable: {e}"));
                return Ok(());
            }
        };

        self.sink
            .begin_form(bbox, matrix, &String::from_utf8_lossy(name));
        self.stack.save(&self.gs);
        self.sink.push_state();
        if matrix != Matrix::IDENTITY {
            self.gs.ctm = matrix.multiply(&self.gs.ctm);
            self.sink.concat_ctm(matrix);
        }
        if let Some(bbox) = bbox {
            let clip = [
                PathSegment::MoveTo { x: bbox[0], y: bbox[1] },
                PathSegment::LineTo { x: bbox[2], y: bbox[1] },
                PathSegment::LineTo { x: bbox[2], y: bbox[3] },
                PathSegment::LineTo { x: bbox[0], y: bbox[3] },
                PathSegment::Close,
            ];
            self.sink.set_clip(&clip, FillRule::NonZero);
        }

        self.form_depth += 1;
        let result = self.run(&content, &form_resources, opts);
        self.form_depth -= 1;

        if let Some(saved) = self.stack.restore() {
            self.gs = saved;
        }
        self.sink.pop_state();
        self.sink.end_form();
        result
    }

    fn draw_image_stream(&mut self, resources: &Dictionary, stream: &Stream) {
        match self.build_image(resources, stream, self.gs.ctm) {
            Some(image) => self.sink.draw_image(&image),
            None => self.warn("image could not be decoded".into()),
        }
    }

    fn build_image(
        &mut self,
        resources: &Dictionary,
        stream: &Stream,
        transform: Matrix,
    ) -> Option<ImageData> {
        let dict = &stream.dict;
        let doc = self.doc;
        let resolve_i64 = |key: &[&[u8]]| -> Option<i64> {
            dict.get_any(key)
                .and_then(|v| doc.resolve(v).ok())
                .and_then(|v| v.as_i64())
        };
        let width = resolve_i64(&[b"Width", b"W"])? as u32;
        let height = resolve_i64(&[b"Height", b"H"])? as u32;
        let is_image_mask = dict
            .get_any(&[b"ImageMask", b"IM"])
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let bits_per_component = if is_image_mask {
            1
        } else {
            resolve_i64(&[b"BitsPerComponent", b"BPC"]).unwrap_or(8) as u8
        };

        let color_space = if is_image_mask {
            None
        } else {
            match dict.get_any(&[b"ColorSpace", b"CS"]) {
                Some(Object::Name(name)) => ColorSpace::from_name(name).or_else(|| {
                    self.resource_entry(resources, b"ColorSpace", name)
                        .and_then(|obj| ColorSpace::parse(self.doc, &obj).ok())
                }),
                Some(obj) => ColorSpace::parse(self.doc, obj).ok(),
                None => Some(ColorSpace::DeviceGray),
            }
        };

        let encoding = match filter::is_image_passthrough(dict) {
            Some("jpeg") => ImageEncoding::Jpeg,
            Some(_) => ImageEncoding::Jpx,
            None => ImageEncoding::Raw,
        };
        let data = match stream.decoded_content() {
            Ok(d) => d.to_vec(),
            Err(e) => {
                self.warn(format!("image stream: {e}"));
                return None;
            }
        };

        let decode = dict
            .get_any(&[b"Decode", b"D"])
            .and_then(|d| d.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_f32()).collect::<Vec<_>>());

        let soft_mask = dict
            .get(b"SMask")
            .and_then(|s| self.doc.resolve(s).ok())
            .and_then(|s| s.as_stream().cloned())
            .and_then(|s| self.build_image(resources, &s, Matrix::IDENTITY))
            .map(Box::new);

        let mask = match dict.get(b"Mask").map(|m| self.doc.resolve(m)) {
            Some(Ok(resolved)) => match &*resolved {
                Object::Array(ranges) => {
                    let values: Vec<u32> = ranges
                        .iter()
                        .filter_map(|v| v.as_i64())
                        .map(|v| v.max(0) as u32)
                        .collect();
                    let pairs = values
                        .chunks(2)
                        .filter(|c| c.len() == 2)
                        .map(|c| (c[0], c[1]))
                        .collect::<Vec<_>>();
                    Some(ImageMask::ColorKey(ColorKeyMask { ranges: pairs }))
                }
                Object::Stream(s) => self
                    .build_image(resources, s, Matrix::IDENTITY)
                    .map(|img| ImageMask::Stencil(Box::new(img))),
                _ => None,
            },
            _ => None,
        };

        Some(ImageData {
            width,
            height,
            bits_per_component,
            encoding,
            data,
            color_space,
            is_image_mask,
            decode,
            soft_mask,
            mask,
            transform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    /// Runs raw content bytes against a recording sink with empty
    /// resources (enough for path/state operators).
    fn run_content(content: &[u8]) -> RecordingSink {
        // a minimal single-page document to satisfy the interpreter
        let pdf = crate::writer::build_test_pdf(content, &[]);
        let doc = PdfDocument::open(pdf).unwrap();
        let mut sink = RecordingSink::new();
        render_page(&doc, 0, &mut sink, &RenderOptions::default()).unwrap();
        sink
    }

    #[test]
    fn balanced_q_produces_balanced_sink_calls() {
        let sink = run_content(b"q q Q Q");
        let pushes = sink
            .events
            .iter()
            .filter(|e| matches!(e, crate::sink::SinkEvent::PushState))
            .count();
        let pops = sink
            .events
            .iter()
            .filter(|e| matches!(e, crate::sink::SinkEvent::PopState))
            .count();
        assert_eq!(pushes, 2);
        assert_eq!(pops, 2);
    }

    #[test]
    fn unbalanced_q_is_repaired() {
        let sink = run_content(b"q q");
        let pops = sink
            .events
            .iter()
            .filter(|e| matches!(e, crate::sink::SinkEvent::PopState))
            .count();
        assert_eq!(pops, 2);
    }

    #[test]
    fn pending_clip_applies_at_paint() {
        let sink = run_content(b"0 0 10 10 re W n");
        let clip = sink
            .events
            .iter()
            .find(|e| matches!(e, crate::sink::SinkEvent::SetClip { .. }));
        assert!(clip.is_some());
        // n paints nothing
        assert_eq!(
            sink.events
                .iter()
                .filter(|e| matches!(e, crate::sink::SinkEvent::DrawPath { .. }))
                .count(),
            0
        );
    }

    #[test]
    fn rectangle_paths_and_fill_rules() {
        let sink = run_content(b"0 0 5 5 re f* 0 0 2 2 re S");
        let mut draws = sink.events.iter().filter_map(|e| match e {
            crate::sink::SinkEvent::DrawPath { fill, stroke, path } => {
                Some((*fill, *stroke, path.len()))
            }
            _ => None,
        });
        assert_eq!(draws.next(), Some((Some(FillRule::EvenOdd), false, 5)));
        assert_eq!(draws.next(), Some((None, true, 5)));
    }

    #[test]
    fn malformed_operator_is_skipped() {
        let sink = run_content(b"1 2 3 cm 0 0 m 5 5 l S");
        // the bad cm produced no ConcatCtm, the path still painted
        assert!(!sink
            .events
            .iter()
            .any(|e| matches!(e, crate::sink::SinkEvent::ConcatCtm(_))));
        assert_eq!(
            sink.events
                .iter()
                .filter(|e| matches!(e, crate::sink::SinkEvent::DrawPath { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn cancellation_stops_interpretation() {
        let pdf = crate::writer::build_test_pdf(b"q Q q Q", &[]);
        let doc = PdfDocument::open(pdf).unwrap();
        let mut sink = RecordingSink::new();
        let cancel = || true;
        let result = render_page(
            &doc,
            0,
            &mut sink,
            &RenderOptions {
                cancel: Some(&cancel),
            },
        );
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
