//! color.rs
//!
//! Colour spaces and their resolution to sink colours. The sink receives
//! either device RGB or, for Separation/DeviceN, the named tint plus an RGB
//! fallback it may override. CIE-based spaces are approximated by their
//! device cousins; Lab goes through a fixed D65 transform.

use std::rc::Rc;

use serde_derive::{Deserialize, Serialize};

use crate::document::PdfDocument;
use crate::error::Error;
use crate::function::PdfFunction;
use crate::object::{Dictionary, Object};

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Rgb {
        Rgb { r, g, b }
    }

    pub fn gray(v: f32) -> Rgb {
        Rgb { r: v, g: v, b: v }
    }

    pub fn from_cmyk(c: f32, m: f32, y: f32, k: f32) -> Rgb {
        Rgb {
            r: (1.0 - (c + k).min(1.0)).max(0.0),
            g: (1.0 - (m + k).min(1.0)).max(0.0),
            b: (1.0 - (y + k).min(1.0)).max(0.0),
        }
    }
}

/// A colour as handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Color {
    Rgb(Rgb),
    /// A Separation/DeviceN tint the sink may reproduce natively; `fallback`
    /// is the tint pushed through the alternate space.
    Tint {
        names: Vec<String>,
        tint: Vec<f32>,
        fallback: Rgb,
    },
}

impl Color {
    pub fn black() -> Color {
        Color::Rgb(Rgb::BLACK)
    }

    pub fn to_rgb(&self) -> Rgb {
        match self {
            Color::Rgb(rgb) => *rgb,
            Color::Tint { fallback, .. } => *fallback,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    CalGray,
    CalRgb,
    Lab {
        /// a*/b* range `[amin amax bmin bmax]`.
        range: [f32; 4],
    },
    IccBased {
        n: usize,
        alternate: Box<ColorSpace>,
    },
    Indexed {
        base: Box<ColorSpace>,
        hival: u32,
        lookup: Vec<u8>,
    },
    Separation {
        name: String,
        alternate: Box<ColorSpace>,
        tint: Rc<PdfFunction>,
    },
    DeviceN {
        names: Vec<String>,
        alternate: Box<ColorSpace>,
        tint: Rc<PdfFunction>,
    },
    /// Pattern colour space; the base space colours an uncoloured tiling
    /// pattern.
    Pattern {
        base: Option<Box<ColorSpace>>,
    },
}

impl Default for ColorSpace {
    fn default() -> Self {
        ColorSpace::DeviceGray
    }
}

impl ColorSpace {
    /// Direct names, including the inline-image abbreviations.
    pub fn from_name(name: &[u8]) -> Option<ColorSpace> {
        match name {
            b"DeviceGray" | b"G" | b"CalGray" => Some(ColorSpace::DeviceGray),
            b"DeviceRGB" | b"RGB" | b"CalRGB" => Some(ColorSpace::DeviceRgb),
            b"DeviceCMYK" | b"CMYK" => Some(ColorSpace::DeviceCmyk),
            b"Pattern" => Some(ColorSpace::Pattern { base: None }),
            _ => None,
        }
    }

    /// Parses a colour space object: a name, or one of the array forms.
    pub fn parse(doc: &PdfDocument, obj: &Object) -> Result<ColorSpace, Error> {
        let resolved = doc
            .resolve(obj)
            .map_err(|_| Error::CorruptStream("unresolvable colour space".into()))?;
        match &*resolved {
            Object::Name(name) => ColorSpace::from_name(name).ok_or_else(|| {
                Error::CorruptStream(format!(
                    "unknown colour space {:?}",
                    String::from_utf8_lossy(name)
                ))
            }),
            Object::Array(items) => Self::parse_array(doc, items),
            other => Err(Error::CorruptStream(format!(
                "colour space must be a name or array, found {}",
                other.type_name()
            ))),
        }
    }

    fn parse_array(doc: &PdfDocument, items: &[Object]) -> Result<ColorSpace, Error> {
        let family = items
            .first()
            .and_then(|f| doc.resolve(f).ok())
            .and_then(|f| f.as_name().map(|n| n.to_vec()))
            .ok_or_else(|| Error::CorruptStream("colour space array without a family".into()))?;
        match family.as_slice() {
            b"DeviceGray" | b"G" => Ok(ColorSpace::DeviceGray),
            b"DeviceRGB" | b"RGB" => Ok(ColorSpace::DeviceRgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorSpace::DeviceCmyk),
            b"CalGray" => Ok(ColorSpace::CalGray),
            b"CalRGB" => Ok(ColorSpace::CalRgb),
            b"Lab" => {
                let range = items
                    .get(1)
                    .and_then(|d| doc.resolve(d).ok())
                    .and_then(|d| d.as_dict().cloned())
                    .and_then(|d| {
                        let arr = doc.resolve_dict_value(&d, b"Range")?;
                        let arr = arr.as_array()?;
                        let mut range = [0f32; 4];
                        for (slot, v) in range.iter_mut().zip(arr) {
                            *slot = v.as_f32()?;
                        }
                        Some(range)
                    })
                    .unwrap_or([-100.0, 100.0, -100.0, 100.0]);
                Ok(ColorSpace::Lab { range })
            }
            b"ICCBased" => {
                let stream = items
                    .get(1)
                    .and_then(|s| doc.resolve(s).ok())
                    .ok_or_else(|| Error::CorruptStream("ICCBased without a stream".into()))?;
                let n = stream
                    .as_dict()
                    .and_then(|d| d.get(b"N"))
                    .and_then(|n| n.as_i64())
                    .unwrap_or(3) as usize;
                let alternate = match stream.as_dict().and_then(|d| d.get(b"Alternate")) {
                    Some(alt) => Box::new(ColorSpace::parse(doc, alt)?),
                    None => Box::new(match n {
                        1 => ColorSpace::DeviceGray,
                        4 => ColorSpace::DeviceCmyk,
                        _ => ColorSpace::DeviceRgb,
                    }),
                };
                Ok(ColorSpace::IccBased { n, alternate })
            }
            b"Indexed" | b"I" => {
                let base = items
                    .get(1)
                    .map(|b| ColorSpace::parse(doc, b))
                    .transpose()?
                    .unwrap_or(ColorSpace::DeviceRgb);
                let hival = items
                    .get(2)
                    .and_then(|h| doc.resolve(h).ok())
                    .and_then(|h| h.as_i64())
                    .unwrap_or(0)
                    .max(0) as u32;
                let lookup = match items.get(3).and_then(|l| doc.resolve(l).ok()).as_deref() {
                    Some(Object::String(bytes, _)) => bytes.clone(),
                    Some(Object::Stream(stream)) => stream.decoded_content()?.to_vec(),
                    _ => {
                        return Err(Error::CorruptStream(
                            "Indexed colour space without a lookup table".into(),
                        ))
                    }
                };
                Ok(ColorSpace::Indexed {
                    base: Box::new(base),
                    hival,
                    lookup,
                })
            }
            b"Separation" => {
                let name = items
                    .get(1)
                    .and_then(|n| doc.resolve(n).ok())
                    .and_then(|n| n.as_name_str().map(String::from))
                    .unwrap_or_default();
                let alternate = items
                    .get(2)
                    .map(|a| ColorSpace::parse(doc, a))
                    .transpose()?
                    .unwrap_or(ColorSpace::DeviceGray);
                let tint = items
                    .get(3)
                    .map(|t| PdfFunction::parse(doc, t))
                    .transpose()?
                    .ok_or_else(|| {
                        Error::CorruptStream("Separation without a tint transform".into())
                    })?;
                Ok(ColorSpace::Separation {
                    name,
                    alternate: Box::new(alternate),
                    tint: Rc::new(tint),
                })
            }
            b"DeviceN" => {
                let names = items
                    .get(1)
                    .and_then(|n| doc.resolve(n).ok())
                    .and_then(|n| n.as_array().cloned())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|n| n.as_name_str().map(String::from))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                let alternate = items
                    .get(2)
                    .map(|a| ColorSpace::parse(doc, a))
                    .transpose()?
                    .unwrap_or(ColorSpace::DeviceGray);
                let tint = items
                    .get(3)
                    .map(|t| PdfFunction::parse(doc, t))
                    .transpose()?
                    .ok_or_else(|| Error::CorruptStream("DeviceN without a tint transform".into()))?;
                Ok(ColorSpace::DeviceN {
                    names,
                    alternate: Box::new(alternate),
                    tint: Rc::new(tint),
                })
            }
            b"Pattern" => {
                let base = items
                    .get(1)
                    .map(|b| ColorSpace::parse(doc, b))
                    .transpose()?
                    .map(Box::new);
                Ok(ColorSpace::Pattern { base })
            }
            other => Err(Error::CorruptStream(format!(
                "unknown colour space family {:?}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    pub fn n_components(&self) -> usize {
        match self {
            ColorSpace::DeviceGray | ColorSpace::CalGray => 1,
            ColorSpace::DeviceRgb | ColorSpace::CalRgb | ColorSpace::Lab { .. } => 3,
            ColorSpace::DeviceCmyk => 4,
            ColorSpace::IccBased { n, .. } => *n,
            ColorSpace::Indexed { .. } => 1,
            ColorSpace::Separation { .. } => 1,
            ColorSpace::DeviceN { names, .. } => names.len(),
            ColorSpace::Pattern { .. } => 1,
        }
    }

    /// The colour selected by `CS`/`cs` before any `SC` operand arrives.
    pub fn initial_color(&self) -> Color {
        match self {
            ColorSpace::Separation { name, alternate, tint } => {
                let fallback = alternate.resolve_device(&tint.eval(&[1.0]));
                Color::Tint {
                    names: vec![name.clone()],
                    tint: vec![1.0],
                    fallback,
                }
            }
            ColorSpace::DeviceN { names, alternate, tint } => {
                let ones = vec![1.0; names.len()];
                let fallback = alternate.resolve_device(&tint.eval(&ones));
                Color::Tint {
                    names: names.clone(),
                    tint: ones,
                    fallback,
                }
            }
            _ => Color::black(),
        }
    }

    /// Resolves component values to a sink colour.
    pub fn resolve(&self, comps: &[f32]) -> Color {
        match self {
            ColorSpace::Separation { name, alternate, tint } => {
                let t = comps.first().copied().unwrap_or(1.0);
                let fallback = alternate.resolve_device(&tint.eval(&[t]));
                Color::Tint {
                    names: vec![name.clone()],
                    tint: vec![t],
                    fallback,
                }
            }
            ColorSpace::DeviceN { names, alternate, tint } => {
                let fallback = alternate.resolve_device(&tint.eval(comps));
                Color::Tint {
                    names: names.clone(),
                    tint: comps.to_vec(),
                    fallback,
                }
            }
            _ => Color::Rgb(self.resolve_device(comps)),
        }
    }

    fn resolve_device(&self, comps: &[f32]) -> Rgb {
        let c = |i: usize| comps.get(i).copied().unwrap_or(0.0);
        match self {
            ColorSpace::DeviceGray | ColorSpace::CalGray => Rgb::gray(c(0).clamp(0.0, 1.0)),
            ColorSpace::DeviceRgb | ColorSpace::CalRgb => Rgb::new(
                c(0).clamp(0.0, 1.0),
                c(1).clamp(0.0, 1.0),
                c(2).clamp(0.0, 1.0),
            ),
            ColorSpace::DeviceCmyk => Rgb::from_cmyk(c(0), c(1), c(2), c(3)),
            ColorSpace::Lab { .. } => lab_to_rgb(c(0), c(1), c(2)),
            ColorSpace::IccBased { alternate, .. } => alternate.resolve_device(comps),
            ColorSpace::Indexed {
                base,
                hival,
                lookup,
            } => {
                let index = (c(0).max(0.0) as u32).min(*hival) as usize;
                let n = base.n_components();
                let start = index * n;
                let base_comps: Vec<f32> = (0..n)
                    .map(|j| {
                        lookup
                            .get(start + j)
                            .map(|b| *b as f32 / 255.0)
                            .unwrap_or(0.0)
                    })
                    .collect();
                // Lab components in a lookup table are scaled to the range
                let base_comps = match &**base {
                    ColorSpace::Lab { range } => vec![
                        base_comps[0] * 100.0,
                        range[0] + base_comps.get(1).copied().unwrap_or(0.0) * (range[1] - range[0]),
                        range[2] + base_comps.get(2).copied().unwrap_or(0.0) * (range[3] - range[2]),
                    ],
                    _ => base_comps,
                };
                base.resolve_device(&base_comps)
            }
            ColorSpace::Separation { alternate, tint, .. } => {
                alternate.resolve_device(&tint.eval(&[c(0)]))
            }
            ColorSpace::DeviceN { alternate, tint, .. } => {
                alternate.resolve_device(&tint.eval(comps))
            }
            ColorSpace::Pattern { base } => match base {
                Some(b) => b.resolve_device(comps),
                None => Rgb::BLACK,
            },
        }
    }
}

/// CIE L*a*b* → sRGB, D65 white point.
fn lab_to_rgb(l: f32, a: f32, b: f32) -> Rgb {
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;
    let finv = |t: f32| {
        if t > 6.0 / 29.0 {
            t * t * t
        } else {
            3.0 * (6.0f32 / 29.0).powi(2) * (t - 4.0 / 29.0)
        }
    };
    // D65 reference white
    let x = 0.95047 * finv(fx);
    let y = 1.0 * finv(fy);
    let z = 1.08883 * finv(fz);

    let r = 3.2406 * x - 1.5372 * y - 0.4986 * z;
    let g = -0.9689 * x + 1.8758 * y + 0.0415 * z;
    let bb = 0.0557 * x - 0.2040 * y + 1.0570 * z;
    let gamma = |u: f32| {
        let u = u.clamp(0.0, 1.0);
        if u <= 0.0031308 {
            12.92 * u
        } else {
            1.055 * u.powf(1.0 / 2.4) - 0.055
        }
    };
    Rgb::new(gamma(r), gamma(g), gamma(bb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmyk_conversion() {
        assert_eq!(Rgb::from_cmyk(0.0, 0.0, 0.0, 0.0), Rgb::new(1.0, 1.0, 1.0));
        assert_eq!(Rgb::from_cmyk(0.0, 0.0, 0.0, 1.0), Rgb::BLACK);
        assert_eq!(Rgb::from_cmyk(1.0, 0.0, 0.0, 0.0), Rgb::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn device_resolution() {
        assert_eq!(
            ColorSpace::DeviceGray.resolve(&[0.5]),
            Color::Rgb(Rgb::gray(0.5))
        );
        assert_eq!(
            ColorSpace::DeviceRgb.resolve(&[1.0, 0.0, 0.25]),
            Color::Rgb(Rgb::new(1.0, 0.0, 0.25))
        );
    }

    #[test]
    fn indexed_lookup() {
        let space = ColorSpace::Indexed {
            base: Box::new(ColorSpace::DeviceRgb),
            hival: 1,
            lookup: vec![255, 0, 0, 0, 0, 255],
        };
        assert_eq!(space.resolve(&[0.0]), Color::Rgb(Rgb::new(1.0, 0.0, 0.0)));
        assert_eq!(space.resolve(&[1.0]), Color::Rgb(Rgb::new(0.0, 0.0, 1.0)));
        // out-of-range indices clamp to hival
        assert_eq!(space.resolve(&[9.0]), Color::Rgb(Rgb::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn lab_white_and_black() {
        let white = lab_to_rgb(100.0, 0.0, 0.0);
        assert!(white.r > 0.99 && white.g > 0.99 && white.b > 0.99);
        let black = lab_to_rgb(0.0, 0.0, 0.0);
        assert!(black.r < 0.01 && black.g < 0.01 && black.b < 0.01);
    }

    #[test]
    fn separation_carries_tint_and_fallback() {
        let tint = PdfFunction::Exponential {
            domain: vec![(0.0, 1.0)],
            c0: vec![1.0, 1.0, 1.0],
            c1: vec![1.0, 0.0, 0.0],
            n: 1.0,
        };
        let space = ColorSpace::Separation {
            name: "PANTONE Red".into(),
            alternate: Box::new(ColorSpace::DeviceRgb),
            tint: Rc::new(tint),
        };
        match space.resolve(&[1.0]) {
            Color::Tint { names, tint, fallback } => {
                assert_eq!(names, vec!["PANTONE Red".to_string()]);
                assert_eq!(tint, vec![1.0]);
                assert_eq!(fallback, Rgb::new(1.0, 0.0, 0.0));
            }
            other => panic!("expected a tint colour, got {other:?}"),
        }
    }
}
