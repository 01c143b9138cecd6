//! # readpdf
//!
//! readpdf parses, interprets and edits PDF 1.x/2.0 documents. It owns the
//! whole chain from file bytes to draw calls: lexing and the object model,
//! cross-reference and object-stream resolution, standard-handler
//! decryption, fonts and character mappings, and a content-stream
//! interpreter that drives any [`GraphicsSink`]. On top of that sits an
//! instruction-level text editor that rewrites content streams while
//! keeping the document valid.
//!
//! # Getting started
//!
//! ## Reading and rendering
//!
//! ```no_run
//! use readpdf::{PdfDocument, RecordingSink, RenderOptions};
//!
//! let bytes = std::fs::read("input.pdf").unwrap();
//! let doc = PdfDocument::open(bytes).unwrap();
//! println!("{} pages", doc.page_count());
//!
//! // drive a sink; RecordingSink collects events, real backends rasterise
//! let mut sink = RecordingSink::new();
//! let warnings = readpdf::render_page(&doc, 0, &mut sink, &RenderOptions::default()).unwrap();
//! println!("text: {}", sink.text());
//! println!("{} warnings", warnings.len());
//! ```
//!
//! ## Editing text
//!
//! ```no_run
//! use readpdf::{EditOptions, PdfDocument, SaveOptions};
//!
//! let bytes = std::fs::read("input.pdf").unwrap();
//! let mut doc = PdfDocument::open(bytes).unwrap();
//! let n = readpdf::replace_text(&mut doc, 0, "draft", "final", &EditOptions::default()).unwrap();
//! println!("replaced {n} occurrences");
//! let out = doc.save(&SaveOptions { incremental: true }).unwrap();
//! std::fs::write("output.pdf", out).unwrap();
//! ```
//!
//! Encrypted files open through [`PdfDocument::open_with_password`]; the
//! empty password is tried automatically by [`PdfDocument::open`].

pub mod cmap;
pub mod color;
pub mod content;
pub mod document;
pub mod edit;
pub mod encoding;
pub mod encryption;
pub mod error;
pub mod filter;
pub mod font;
pub mod function;
pub mod graphics;
pub mod interpreter;
pub mod lexer;
pub mod matrix;
pub mod object;
pub mod shading;
pub mod sink;
pub mod writer;
pub mod xref;

pub use cmap::CMap;
pub use color::{Color, ColorSpace, Rgb};
pub use content::{ContentInstruction, ContentIter};
pub use document::{ParseOptions, PdfDocument};
pub use edit::{delete_text, insert_text, replace_text, EditOptions};
pub use encryption::Permissions;
pub use error::{Error, PdfWarnMsg};
pub use font::{DecodedGlyph, EmbeddedFontData, FontKind, PdfFont};
pub use function::PdfFunction;
pub use graphics::{
    BlendMode, FillRule, GraphicsState, LineCapStyle, LineDashPattern, LineJoinStyle,
    RenderingIntent, TextRenderingMode,
};
pub use interpreter::{render_page, RenderOptions};
pub use matrix::Matrix;
pub use object::{Dictionary, Object, ObjectId, Stream, StringFormat};
pub use shading::ShadingDescriptor;
pub use sink::{
    GlyphPos, GraphicsSink, ImageData, ImageEncoding, PathSegment, RecordingSink, SinkEvent,
    TextRun,
};
pub use writer::SaveOptions;
pub use xref::{XrefEntry, XrefTable};
