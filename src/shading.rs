//! shading.rs
//!
//! Shading dictionaries resolved into sink-ready descriptors. Axial and
//! radial shadings keep their geometry plus a sampled colour ramp; the
//! function-based type is rasterised to an ARGB buffer (the only bitmap the
//! core ever allocates); the mesh types 4–7 triangulate into
//! colour-interpolated triangles.

use crate::color::{ColorSpace, Rgb};
use crate::document::PdfDocument;
use crate::error::Error;
use crate::function::PdfFunction;
use crate::matrix::Matrix;
use crate::object::{Dictionary, Object};

/// Samples per colour ramp handed to the sink.
const RAMP_SAMPLES: usize = 256;
/// Cap on the function-based raster, per axis.
const FUNCTION_RASTER_LIMIT: u32 = 256;
/// Subdivision of a Coons/tensor patch per axis.
const PATCH_GRID: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct MeshTriangle {
    pub points: [(f32, f32); 3],
    pub colors: [Rgb; 3],
}

#[derive(Debug, Clone)]
pub enum ShadingDescriptor {
    /// Type 1: sampled over the BBox to an ARGB buffer (row-major, top row
    /// first in domain orientation).
    FunctionBased {
        matrix: Matrix,
        domain: [f32; 4],
        width: u32,
        height: u32,
        argb: Vec<u32>,
    },
    /// Type 2: axis `[x0 y0 x1 y1]` plus a colour ramp over it.
    Axial {
        coords: [f32; 4],
        extend: (bool, bool),
        ramp: Vec<Rgb>,
        background: Option<Rgb>,
    },
    /// Type 3: circles `[x0 y0 r0 x1 y1 r1]` plus a colour ramp.
    Radial {
        coords: [f32; 6],
        extend: (bool, bool),
        ramp: Vec<Rgb>,
        background: Option<Rgb>,
    },
    /// Types 4–7, triangulated.
    Mesh { triangles: Vec<MeshTriangle> },
}

/// Resolves a `/Shading` resource (dictionary or stream) to a descriptor.
pub fn parse_shading(doc: &PdfDocument, obj: &Object) -> Result<ShadingDescriptor, Error> {
    let resolved = doc
        .resolve(obj)
        .map_err(|_| Error::CorruptStream("unresolvable shading".into()))?;
    let dict = resolved
        .as_dict()
        .ok_or_else(|| Error::CorruptStream("shading is not a dictionary".into()))?;
    let shading_type = doc
        .resolve_dict_value(dict, b"ShadingType")
        .and_then(|t| t.as_i64())
        .ok_or_else(|| Error::CorruptStream("shading without ShadingType".into()))?;

    let space = dict
        .get(b"ColorSpace")
        .map(|cs| ColorSpace::parse(doc, cs))
        .transpose()?
        .unwrap_or(ColorSpace::DeviceRgb);
    let functions = parse_functions(doc, dict);
    let background = float_array(doc, dict, b"Background")
        .map(|comps| space.resolve(&comps).to_rgb());

    match shading_type {
        1 => {
            let matrix = float_array(doc, dict, b"Matrix")
                .filter(|a| a.len() == 6)
                .map(|a| Matrix::new(a[0], a[1], a[2], a[3], a[4], a[5]))
                .unwrap_or(Matrix::IDENTITY);
            let domain = float_array(doc, dict, b"Domain")
                .filter(|a| a.len() == 4)
                .map(|a| [a[0], a[1], a[2], a[3]])
                .unwrap_or([0.0, 1.0, 0.0, 1.0]);
            Ok(rasterise_function_based(&space, &functions, matrix, domain))
        }
        2 => {
            let coords = float_array(doc, dict, b"Coords")
                .filter(|a| a.len() >= 4)
                .map(|a| [a[0], a[1], a[2], a[3]])
                .ok_or_else(|| Error::CorruptStream("axial shading without Coords".into()))?;
            let domain = float_array(doc, dict, b"Domain")
                .filter(|a| a.len() >= 2)
                .map(|a| (a[0], a[1]))
                .unwrap_or((0.0, 1.0));
            Ok(ShadingDescriptor::Axial {
                coords,
                extend: parse_extend(doc, dict),
                ramp: sample_ramp(&space, &functions, domain),
                background,
            })
        }
        3 => {
            let coords = float_array(doc, dict, b"Coords")
                .filter(|a| a.len() >= 6)
                .map(|a| [a[0], a[1], a[2], a[3], a[4], a[5]])
                .ok_or_else(|| Error::CorruptStream("radial shading without Coords".into()))?;
            let domain = float_array(doc, dict, b"Domain")
                .filter(|a| a.len() >= 2)
                .map(|a| (a[0], a[1]))
                .unwrap_or((0.0, 1.0));
            Ok(ShadingDescriptor::Radial {
                coords,
                extend: parse_extend(doc, dict),
                ramp: sample_ramp(&space, &functions, domain),
                background,
            })
        }
        4 | 5 | 6 | 7 => {
            let stream = resolved
                .as_stream()
                .ok_or_else(|| Error::CorruptStream("mesh shading must be a stream".into()))?;
            let data = stream.decoded_content()?.to_vec();
            let triangles = parse_mesh(doc, dict, shading_type, &space, &functions, &data)?;
            Ok(ShadingDescriptor::Mesh { triangles })
        }
        other => Err(Error::CorruptStream(format!(
            "unknown ShadingType {other}"
        ))),
    }
}

/// `/Function` may be one function with n outputs or an array of n
/// single-output functions.
fn parse_functions(doc: &PdfDocument, dict: &Dictionary) -> Vec<PdfFunction> {
    match doc.resolve_dict_value(dict, b"Function").as_deref() {
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|f| PdfFunction::parse(doc, f).ok())
            .collect(),
        Some(obj) => PdfFunction::parse(doc, obj).ok().into_iter().collect(),
        None => Vec::new(),
    }
}

fn eval_color(space: &ColorSpace, functions: &[PdfFunction], t: &[f32]) -> Rgb {
    let comps: Vec<f32> = match functions.len() {
        0 => t.to_vec(),
        1 => functions[0].eval(t),
        _ => functions.iter().map(|f| f.eval(t)[0]).collect(),
    };
    space.resolve(&comps).to_rgb()
}

fn sample_ramp(space: &ColorSpace, functions: &[PdfFunction], domain: (f32, f32)) -> Vec<Rgb> {
    (0..RAMP_SAMPLES)
        .map(|i| {
            let t = domain.0
                + (domain.1 - domain.0) * (i as f32 / (RAMP_SAMPLES - 1) as f32);
            eval_color(space, functions, &[t])
        })
        .collect()
}

fn parse_extend(doc: &PdfDocument, dict: &Dictionary) -> (bool, bool) {
    doc.resolve_dict_value(dict, b"Extend")
        .and_then(|e| e.as_array().cloned())
        .map(|a| {
            (
                a.first().and_then(|v| v.as_bool()).unwrap_or(false),
                a.get(1).and_then(|v| v.as_bool()).unwrap_or(false),
            )
        })
        .unwrap_or((false, false))
}

fn float_array(doc: &PdfDocument, dict: &Dictionary, key: &[u8]) -> Option<Vec<f32>> {
    doc.resolve_dict_value(dict, key)
        .and_then(|v| v.as_array().cloned())
        .map(|arr| arr.iter().filter_map(|v| v.as_f32()).collect())
}

fn rasterise_function_based(
    space: &ColorSpace,
    functions: &[PdfFunction],
    matrix: Matrix,
    domain: [f32; 4],
) -> ShadingDescriptor {
    let dw = (domain[1] - domain[0]).abs();
    let dh = (domain[3] - domain[2]).abs();
    let width = (dw.ceil() as u32).clamp(1, FUNCTION_RASTER_LIMIT);
    let height = (dh.ceil() as u32).clamp(1, FUNCTION_RASTER_LIMIT);
    let mut argb = Vec::with_capacity((width * height) as usize);
    for py in 0..height {
        let y = domain[2] + (domain[3] - domain[2]) * (py as f32 + 0.5) / height as f32;
        for px in 0..width {
            let x = domain[0] + (domain[1] - domain[0]) * (px as f32 + 0.5) / width as f32;
            let rgb = eval_color(space, functions, &[x, y]);
            let to8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
            argb.push(0xFF00_0000 | to8(rgb.r) << 16 | to8(rgb.g) << 8 | to8(rgb.b));
        }
    }
    ShadingDescriptor::FunctionBased {
        matrix,
        domain,
        width,
        height,
        argb,
    }
}

// ------------------------------------------------------------------ mesh

/// Big-endian bit cursor over the mesh stream.
struct BitReader<'a> {
    data: &'a [u8],
    pos: u64,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> BitReader<'a> {
        BitReader { data, pos: 0 }
    }

    fn read(&mut self, bits: u32) -> Option<u32> {
        if self.pos + bits as u64 > self.data.len() as u64 * 8 {
            return None;
        }
        let mut v = 0u64;
        for _ in 0..bits {
            let byte = (self.pos / 8) as usize;
            let bit = 7 - (self.pos % 8) as u32;
            v = v << 1 | ((self.data[byte] >> bit) & 1) as u64;
            self.pos += 1;
        }
        Some(v as u32)
    }

    /// Mesh data packs continuously across byte boundaries; flags are only
    /// byte-aligned by accident of the common 8-bit field widths.
    fn read_scaled(&mut self, bits: u32, lo: f32, hi: f32) -> Option<f32> {
        let raw = self.read(bits)?;
        let max = if bits >= 32 {
            u32::MAX as f32
        } else {
            ((1u64 << bits) - 1) as f32
        };
        Some(lo + (hi - lo) * raw as f32 / max)
    }
}

struct MeshParams {
    bits_coord: u32,
    bits_comp: u32,
    bits_flag: u32,
    decode: Vec<(f32, f32)>,
    n_color: usize,
}

fn mesh_params(
    doc: &PdfDocument,
    dict: &Dictionary,
    space: &ColorSpace,
    functions: &[PdfFunction],
) -> Result<MeshParams, Error> {
    let bits_coord = doc
        .resolve_dict_value(dict, b"BitsPerCoordinate")
        .and_then(|b| b.as_i64())
        .unwrap_or(16) as u32;
    let bits_comp = doc
        .resolve_dict_value(dict, b"BitsPerComponent")
        .and_then(|b| b.as_i64())
        .unwrap_or(8) as u32;
    let bits_flag = doc
        .resolve_dict_value(dict, b"BitsPerFlag")
        .and_then(|b| b.as_i64())
        .unwrap_or(8) as u32;
    let decode = float_array(doc, dict, b"Decode")
        .map(|a| a.chunks(2).filter(|c| c.len() == 2).map(|c| (c[0], c[1])).collect::<Vec<_>>())
        .ok_or_else(|| Error::CorruptStream("mesh shading without Decode".into()))?;
    let n_color = if functions.is_empty() {
        space.n_components()
    } else {
        1
    };
    if decode.len() < 2 + n_color {
        return Err(Error::CorruptStream("mesh Decode array too short".into()));
    }
    Ok(MeshParams {
        bits_coord,
        bits_comp,
        bits_flag,
        decode,
        n_color,
    })
}

impl MeshParams {
    fn read_vertex(
        &self,
        r: &mut BitReader,
        space: &ColorSpace,
        functions: &[PdfFunction],
    ) -> Option<((f32, f32), Rgb)> {
        let x = r.read_scaled(self.bits_coord, self.decode[0].0, self.decode[0].1)?;
        let y = r.read_scaled(self.bits_coord, self.decode[1].0, self.decode[1].1)?;
        let color = self.read_color(r, space, functions)?;
        Some(((x, y), color))
    }

    fn read_color(
        &self,
        r: &mut BitReader,
        space: &ColorSpace,
        functions: &[PdfFunction],
    ) -> Option<Rgb> {
        let mut comps = Vec::with_capacity(self.n_color);
        for i in 0..self.n_color {
            let (lo, hi) = self.decode[2 + i];
            comps.push(r.read_scaled(self.bits_comp, lo, hi)?);
        }
        Some(eval_color(space, functions, &comps))
    }
}

fn parse_mesh(
    doc: &PdfDocument,
    dict: &Dictionary,
    shading_type: i64,
    space: &ColorSpace,
    functions: &[PdfFunction],
    data: &[u8],
) -> Result<Vec<MeshTriangle>, Error> {
    let params = mesh_params(doc, dict, space, functions)?;
    let mut r = BitReader::new(data);
    let mut triangles = Vec::new();

    match shading_type {
        4 => {
            let mut prev: Vec<((f32, f32), Rgb)> = Vec::new();
            while let Some(flag) = r.read(params.bits_flag) {
                let v0 = match params.read_vertex(&mut r, space, functions) {
                    Some(v) => v,
                    None => break,
                };
                if flag == 0 {
                    let f1 = r.read(params.bits_flag);
                    let v1 = params.read_vertex(&mut r, space, functions);
                    let f2 = r.read(params.bits_flag);
                    let v2 = params.read_vertex(&mut r, space, functions);
                    if f1.is_none() || f2.is_none() {
                        break;
                    }
                    match (v1, v2) {
                        (Some(v1), Some(v2)) => {
                            prev = vec![v0, v1, v2];
                            push_triangle(&mut triangles, &prev);
                        }
                        _ => break,
                    }
                } else {
                    // flag 1 reuses the last two vertices, flag 2 the first
                    // and last
                    if prev.len() < 3 {
                        break;
                    }
                    let (a, b) = if flag == 1 {
                        (prev[1], prev[2])
                    } else {
                        (prev[0], prev[2])
                    };
                    prev = vec![a, b, v0];
                    push_triangle(&mut triangles, &prev);
                }
            }
        }
        5 => {
            let per_row = doc
                .resolve_dict_value(dict, b"VerticesPerRow")
                .and_then(|v| v.as_i64())
                .unwrap_or(2)
                .max(2) as usize;
            let mut rows: Vec<Vec<((f32, f32), Rgb)>> = Vec::new();
            'rows: loop {
                let mut row = Vec::with_capacity(per_row);
                for _ in 0..per_row {
                    match params.read_vertex(&mut r, space, functions) {
                        Some(v) => row.push(v),
                        None => break 'rows,
                    }
                }
                rows.push(row);
            }
            for pair in rows.windows(2) {
                for i in 0..per_row - 1 {
                    push_triangle(
                        &mut triangles,
                        &[pair[0][i], pair[0][i + 1], pair[1][i]],
                    );
                    push_triangle(
                        &mut triangles,
                        &[pair[0][i + 1], pair[1][i + 1], pair[1][i]],
                    );
                }
            }
        }
        6 | 7 => {
            let points_per_patch = if shading_type == 6 { 12 } else { 16 };
            let mut prev_patch: Option<([(f32, f32); 12], [Rgb; 4])> = None;
            while let Some(flag) = r.read(params.bits_flag) {
                let n_points = if flag == 0 {
                    points_per_patch
                } else {
                    points_per_patch - 4
                };
                let n_colors = if flag == 0 { 4 } else { 2 };
                let mut pts = Vec::with_capacity(points_per_patch);
                let mut ok = true;
                for _ in 0..n_points {
                    let x = r.read_scaled(params.bits_coord, params.decode[0].0, params.decode[0].1);
                    let y = r.read_scaled(params.bits_coord, params.decode[1].0, params.decode[1].1);
                    match (x, y) {
                        (Some(x), Some(y)) => pts.push((x, y)),
                        _ => {
                            ok = false;
                            break;
                        }
                    }
                }
                if !ok {
                    break;
                }
                let mut cols = Vec::with_capacity(4);
                for _ in 0..n_colors {
                    match params.read_color(&mut r, space, functions) {
                        Some(c) => cols.push(c),
                        None => {
                            ok = false;
                            break;
                        }
                    }
                }
                if !ok {
                    break;
                }
                // tensor patches: drop the 4 interior points
                pts.truncate(12.min(pts.len()));
                let patch = match assemble_patch(flag, &pts, &cols, prev_patch.as_ref()) {
                    Some(p) => p,
                    None => break,
                };
                triangulate_coons(&mut triangles, &patch.0, &patch.1);
                prev_patch = Some(patch);
            }
        }
        _ => unreachable!(),
    }
    Ok(triangles)
}

fn push_triangle(out: &mut Vec<MeshTriangle>, v: &[((f32, f32), Rgb)]) {
    out.push(MeshTriangle {
        points: [v[0].0, v[1].0, v[2].0],
        colors: [v[0].1, v[1].1, v[2].1],
    });
}

/// Rebuilds the full 12-point boundary for edge-sharing patches
/// (flags 1–3 inherit one edge and two corner colours).
fn assemble_patch(
    flag: u32,
    new_pts: &[(f32, f32)],
    new_cols: &[Rgb],
    prev: Option<&([(f32, f32); 12], [Rgb; 4])>,
) -> Option<([(f32, f32); 12], [Rgb; 4])> {
    if flag == 0 {
        if new_pts.len() < 12 || new_cols.len() < 4 {
            return None;
        }
        let mut pts = [(0.0, 0.0); 12];
        pts.copy_from_slice(&new_pts[..12]);
        let mut cols = [Rgb::BLACK; 4];
        cols.copy_from_slice(&new_cols[..4]);
        return Some((pts, cols));
    }
    let (ppts, pcols) = prev?;
    if new_pts.len() < 8 || new_cols.len() < 2 {
        return None;
    }
    // the shared edge of the previous patch, by flag
    let (shared, c0, c1) = match flag {
        1 => ([ppts[3], ppts[4], ppts[5], ppts[6]], pcols[1], pcols[2]),
        2 => ([ppts[6], ppts[7], ppts[8], ppts[9]], pcols[2], pcols[3]),
        _ => ([ppts[9], ppts[10], ppts[11], ppts[0]], pcols[3], pcols[0]),
    };
    let mut pts = [(0.0, 0.0); 12];
    pts[..4].copy_from_slice(&shared);
    pts[4..12].copy_from_slice(&new_pts[..8]);
    Some((pts, [c0, c1, new_cols[0], new_cols[1]]))
}

/// Samples the Coons surface on a regular grid and emits two triangles per
/// cell. Corner colours interpolate bilinearly.
fn triangulate_coons(out: &mut Vec<MeshTriangle>, pts: &[(f32, f32); 12], cols: &[Rgb; 4]) {
    let n = PATCH_GRID;
    let grid: Vec<Vec<((f32, f32), Rgb)>> = (0..=n)
        .map(|i| {
            let v = i as f32 / n as f32;
            (0..=n)
                .map(|j| {
                    let u = j as f32 / n as f32;
                    (coons_point(pts, u, v), bilinear_color(cols, u, v))
                })
                .collect()
        })
        .collect();
    for i in 0..n {
        for j in 0..n {
            let a = grid[i][j];
            let b = grid[i][j + 1];
            let c = grid[i + 1][j];
            let d = grid[i + 1][j + 1];
            push_triangle(out, &[a, b, c]);
            push_triangle(out, &[b, d, c]);
        }
    }
}

fn bezier(p0: (f32, f32), p1: (f32, f32), p2: (f32, f32), p3: (f32, f32), t: f32) -> (f32, f32) {
    let mt = 1.0 - t;
    let w0 = mt * mt * mt;
    let w1 = 3.0 * mt * mt * t;
    let w2 = 3.0 * mt * t * t;
    let w3 = t * t * t;
    (
        w0 * p0.0 + w1 * p1.0 + w2 * p2.0 + w3 * p3.0,
        w0 * p0.1 + w1 * p1.1 + w2 * p2.1 + w3 * p3.1,
    )
}

/// Coons bilinear blend of the four boundary Béziers. Control points
/// p0..p11 run around the patch boundary starting at the bottom-left
/// corner.
fn coons_point(p: &[(f32, f32); 12], u: f32, v: f32) -> (f32, f32) {
    // edges: D1 = p0..p3 (v=0 side along u? by construction: p0,p1,p2,p3),
    // C2 = p3..p6, D2 = reversed p9..p6, C1 = reversed p0..p11
    let c1 = bezier(p[0], p[11], p[10], p[9], v); // u = 0 edge
    let c2 = bezier(p[3], p[4], p[5], p[6], v); // u = 1 edge
    let d1 = bezier(p[0], p[1], p[2], p[3], u); // v = 0 edge
    let d2 = bezier(p[9], p[8], p[7], p[6], u); // v = 1 edge
    let sb = (
        (1.0 - v) * d1.0 + v * d2.0,
        (1.0 - v) * d1.1 + v * d2.1,
    );
    let sc = (
        (1.0 - u) * c1.0 + u * c2.0,
        (1.0 - u) * c1.1 + u * c2.1,
    );
    let corners = (
        (1.0 - u) * (1.0 - v) * p[0].0
            + u * (1.0 - v) * p[3].0
            + (1.0 - u) * v * p[9].0
            + u * v * p[6].0,
        (1.0 - u) * (1.0 - v) * p[0].1
            + u * (1.0 - v) * p[3].1
            + (1.0 - u) * v * p[9].1
            + u * v * p[6].1,
    );
    (sb.0 + sc.0 - corners.0, sb.1 + sc.1 - corners.1)
}

fn bilinear_color(cols: &[Rgb; 4], u: f32, v: f32) -> Rgb {
    // corner colours sit at the boundary corners: c0@p0, c1@p3, c2@p6, c3@p9
    let mix = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let bottom = Rgb::new(
        mix(cols[0].r, cols[1].r, u),
        mix(cols[0].g, cols[1].g, u),
        mix(cols[0].b, cols[1].b, u),
    );
    let top = Rgb::new(
        mix(cols[3].r, cols[2].r, u),
        mix(cols[3].g, cols[2].g, u),
        mix(cols[3].b, cols[2].b, u),
    );
    Rgb::new(
        mix(bottom.r, top.r, v),
        mix(bottom.g, top.g, v),
        mix(bottom.b, top.b, v),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_reader_crosses_byte_boundaries() {
        let mut r = BitReader::new(&[0b1010_1100, 0b0101_0011]);
        assert_eq!(r.read(3), Some(0b101));
        assert_eq!(r.read(6), Some(0b011000));
        assert_eq!(r.read(7), Some(0b1010011));
        assert_eq!(r.read(1), None);
    }

    #[test]
    fn bit_reader_scaling() {
        let mut r = BitReader::new(&[0xFF, 0x00]);
        assert_eq!(r.read_scaled(8, 0.0, 1.0), Some(1.0));
        assert_eq!(r.read_scaled(8, 0.0, 1.0), Some(0.0));
    }

    #[test]
    fn coons_flat_patch_is_bilinear() {
        // a unit square with straight edges: control points on the edges
        let third = 1.0 / 3.0;
        let p: [(f32, f32); 12] = [
            (0.0, 0.0),
            (third, 0.0),
            (2.0 * third, 0.0),
            (1.0, 0.0),
            (1.0, third),
            (1.0, 2.0 * third),
            (1.0, 1.0),
            (2.0 * third, 1.0),
            (third, 1.0),
            (0.0, 1.0),
            (0.0, 2.0 * third),
            (0.0, third),
        ];
        let center = coons_point(&p, 0.5, 0.5);
        assert!((center.0 - 0.5).abs() < 1e-5);
        assert!((center.1 - 0.5).abs() < 1e-5);
        let corner = coons_point(&p, 0.0, 0.0);
        assert!((corner.0).abs() < 1e-6 && (corner.1).abs() < 1e-6);
    }

    #[test]
    fn triangulation_covers_the_patch() {
        let third = 1.0 / 3.0;
        let p: [(f32, f32); 12] = [
            (0.0, 0.0),
            (third, 0.0),
            (2.0 * third, 0.0),
            (1.0, 0.0),
            (1.0, third),
            (1.0, 2.0 * third),
            (1.0, 1.0),
            (2.0 * third, 1.0),
            (third, 1.0),
            (0.0, 1.0),
            (0.0, 2.0 * third),
            (0.0, third),
        ];
        let cols = [Rgb::BLACK, Rgb::new(1.0, 0.0, 0.0), Rgb::new(0.0, 1.0, 0.0), Rgb::new(0.0, 0.0, 1.0)];
        let mut triangles = Vec::new();
        triangulate_coons(&mut triangles, &p, &cols);
        assert_eq!(triangles.len(), 2 * PATCH_GRID * PATCH_GRID);
        // total area of the triangles equals the square's area
        let area: f32 = triangles
            .iter()
            .map(|t| {
                let [(ax, ay), (bx, by), (cx, cy)] = t.points;
                ((bx - ax) * (cy - ay) - (cx - ax) * (by - ay)).abs() / 2.0
            })
            .sum();
        assert!((area - 1.0).abs() < 1e-3);
    }
}
