//! function.rs
//!
//! PDF function objects: sampled (type 0), exponential (type 2), stitching
//! (type 3) and the PostScript calculator subset (type 4). Shadings and
//! Separation/DeviceN tint transforms evaluate through these.

use crate::document::PdfDocument;
use crate::error::Error;
use crate::lexer::{Lexer, Token};
use crate::object::Object;

#[derive(Debug, Clone)]
pub enum PdfFunction {
    Sampled {
        domain: Vec<(f32, f32)>,
        range: Vec<(f32, f32)>,
        size: Vec<usize>,
        bits_per_sample: u32,
        encode: Vec<(f32, f32)>,
        decode: Vec<(f32, f32)>,
        samples: Vec<u8>,
    },
    Exponential {
        domain: Vec<(f32, f32)>,
        c0: Vec<f32>,
        c1: Vec<f32>,
        n: f32,
    },
    Stitching {
        domain: (f32, f32),
        functions: Vec<PdfFunction>,
        bounds: Vec<f32>,
        encode: Vec<(f32, f32)>,
    },
    PostScript {
        domain: Vec<(f32, f32)>,
        range: Vec<(f32, f32)>,
        program: Vec<PsOp>,
    },
}

/// One operation of a type 4 calculator program. Procedures (`{ … }`) are
/// flattened into the instruction list with skip targets.
#[derive(Debug, Clone, PartialEq)]
pub enum PsOp {
    Push(f32),
    Add,
    Sub,
    Mul,
    Div,
    Idiv,
    Mod,
    Neg,
    Abs,
    Ceiling,
    Floor,
    Round,
    Truncate,
    Sqrt,
    Sin,
    Cos,
    Atan,
    Exp,
    Ln,
    Log,
    Cvi,
    Cvr,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    And,
    Or,
    Xor,
    Not,
    Bitshift,
    True,
    False,
    Pop,
    Exch,
    Dup,
    Copy,
    Index,
    Roll,
    /// `(procedure) if`: body is the next `len` ops.
    If { len: usize },
    /// `(proc1) (proc2) ifelse`: then-branch `then_len`, else-branch `else_len`.
    IfElse { then_len: usize, else_len: usize },
}

impl PdfFunction {
    pub fn parse(doc: &PdfDocument, obj: &Object) -> Result<PdfFunction, Error> {
        let resolved = doc
            .resolve(obj)
            .map_err(|_| Error::CorruptStream("unresolvable function object".into()))?;
        let dict = resolved
            .as_dict()
            .ok_or_else(|| Error::CorruptStream("function is not a dictionary".into()))?;
        let function_type = doc
            .resolve_dict_value(dict, b"FunctionType")
            .and_then(|t| t.as_i64())
            .ok_or_else(|| Error::CorruptStream("function without FunctionType".into()))?;
        let domain = pairs(doc, dict, b"Domain").unwrap_or_else(|| vec![(0.0, 1.0)]);

        match function_type {
            0 => {
                let stream = resolved
                    .as_stream()
                    .ok_or_else(|| Error::CorruptStream("type 0 function must be a stream".into()))?;
                let size: Vec<usize> = doc
                    .resolve_dict_value(dict, b"Size")
                    .and_then(|s| s.as_array().cloned())
                    .map(|a| {
                        a.iter()
                            .filter_map(|v| v.as_i64())
                            .map(|v| v.max(1) as usize)
                            .collect()
                    })
                    .ok_or_else(|| Error::CorruptStream("type 0 function without Size".into()))?;
                let bits_per_sample = doc
                    .resolve_dict_value(dict, b"BitsPerSample")
                    .and_then(|b| b.as_i64())
                    .unwrap_or(8) as u32;
                let range = pairs(doc, dict, b"Range")
                    .ok_or_else(|| Error::CorruptStream("type 0 function without Range".into()))?;
                let encode = pairs(doc, dict, b"Encode").unwrap_or_else(|| {
                    size.iter().map(|s| (0.0, (*s - 1) as f32)).collect()
                });
                let decode = pairs(doc, dict, b"Decode").unwrap_or_else(|| range.clone());
                let samples = stream.decoded_content()?.to_vec();
                Ok(PdfFunction::Sampled {
                    domain,
                    range,
                    size,
                    bits_per_sample,
                    encode,
                    decode,
                    samples,
                })
            }
            2 => {
                let c0 = floats(doc, dict, b"C0").unwrap_or_else(|| vec![0.0]);
                let c1 = floats(doc, dict, b"C1").unwrap_or_else(|| vec![1.0]);
                let n = doc
                    .resolve_dict_value(dict, b"N")
                    .and_then(|n| n.as_f32())
                    .unwrap_or(1.0);
                Ok(PdfFunction::Exponential { domain, c0, c1, n })
            }
            3 => {
                let functions = doc
                    .resolve_dict_value(dict, b"Functions")
                    .and_then(|f| f.as_array().cloned())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|f| PdfFunction::parse(doc, f).ok())
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                if functions.is_empty() {
                    return Err(Error::CorruptStream(
                        "stitching function without sub-functions".into(),
                    ));
                }
                let bounds = floats(doc, dict, b"Bounds").unwrap_or_default();
                let encode = pairs(doc, dict, b"Encode")
                    .unwrap_or_else(|| functions.iter().map(|_| (0.0, 1.0)).collect());
                let d = domain.first().copied().unwrap_or((0.0, 1.0));
                Ok(PdfFunction::Stitching {
                    domain: d,
                    functions,
                    bounds,
                    encode,
                })
            }
            4 => {
                let stream = resolved
                    .as_stream()
                    .ok_or_else(|| Error::CorruptStream("type 4 function must be a stream".into()))?;
                let range = pairs(doc, dict, b"Range")
                    .ok_or_else(|| Error::CorruptStream("type 4 function without Range".into()))?;
                let program = parse_calculator(stream.decoded_content()?)?;
                Ok(PdfFunction::PostScript {
                    domain,
                    range,
                    program,
                })
            }
            other => Err(Error::CorruptStream(format!(
                "unknown FunctionType {other}"
            ))),
        }
    }

    pub fn output_arity(&self) -> usize {
        match self {
            PdfFunction::Sampled { range, .. } => range.len(),
            PdfFunction::Exponential { c0, .. } => c0.len(),
            PdfFunction::Stitching { functions, .. } => {
                functions.first().map(|f| f.output_arity()).unwrap_or(0)
            }
            PdfFunction::PostScript { range, .. } => range.len(),
        }
    }

    /// Evaluates the function, clamping inputs to `Domain` and outputs to
    /// `Range` where one is defined.
    pub fn eval(&self, inputs: &[f32]) -> Vec<f32> {
        match self {
            PdfFunction::Sampled {
                domain,
                range,
                size,
                bits_per_sample,
                encode,
                decode,
                samples,
            } => eval_sampled(
                inputs,
                domain,
                range,
                size,
                *bits_per_sample,
                encode,
                decode,
                samples,
            ),
            PdfFunction::Exponential { domain, c0, c1, n } => {
                let t = clamp_to(inputs.first().copied().unwrap_or(0.0), domain.first());
                c0.iter()
                    .zip(c1)
                    .map(|(a, b)| a + t.powf(*n) * (b - a))
                    .collect()
            }
            PdfFunction::Stitching {
                domain,
                functions,
                bounds,
                encode,
            } => {
                let t = inputs.first().copied().unwrap_or(0.0).clamp(domain.0, domain.1);
                let mut k = 0usize;
                while k < bounds.len() && t >= bounds[k] {
                    k += 1;
                }
                let low = if k == 0 { domain.0 } else { bounds[k - 1] };
                let high = if k == bounds.len() { domain.1 } else { bounds[k] };
                let (e0, e1) = encode.get(k).copied().unwrap_or((0.0, 1.0));
                let t = interpolate(t, low, high, e0, e1);
                functions
                    .get(k)
                    .map(|f| f.eval(&[t]))
                    .unwrap_or_default()
            }
            PdfFunction::PostScript {
                domain,
                range,
                program,
            } => {
                let clamped: Vec<f32> = inputs
                    .iter()
                    .enumerate()
                    .map(|(i, v)| clamp_to(*v, domain.get(i)))
                    .collect();
                let mut stack = clamped;
                exec_calculator(program, &mut stack);
                // the last `range.len()` stack values are the outputs
                let n = range.len();
                let start = stack.len().saturating_sub(n);
                let mut out: Vec<f32> = stack[start..].to_vec();
                while out.len() < n {
                    out.push(0.0);
                }
                for (i, v) in out.iter_mut().enumerate() {
                    *v = clamp_to(*v, range.get(i));
                }
                out
            }
        }
    }
}

fn clamp_to(v: f32, limits: Option<&(f32, f32)>) -> f32 {
    match limits {
        Some((lo, hi)) => v.clamp(*lo, *hi),
        None => v,
    }
}

fn interpolate(x: f32, x0: f32, x1: f32, y0: f32, y1: f32) -> f32 {
    if (x1 - x0).abs() < f32::EPSILON {
        y0
    } else {
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }
}

fn pairs(
    doc: &PdfDocument,
    dict: &crate::object::Dictionary,
    key: &[u8],
) -> Option<Vec<(f32, f32)>> {
    let values = floats(doc, dict, key)?;
    Some(values.chunks(2).filter(|c| c.len() == 2).map(|c| (c[0], c[1])).collect())
}

fn floats(doc: &PdfDocument, dict: &crate::object::Dictionary, key: &[u8]) -> Option<Vec<f32>> {
    doc.resolve_dict_value(dict, key)
        .and_then(|v| v.as_array().cloned())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| doc.resolve(v).ok().and_then(|v| v.as_f32()))
                .collect()
        })
}

// ---------------------------------------------------------------- type 0

/// Multilinear interpolation over the sample grid; 1,2,4,8,12,16,24,32-bit
/// samples packed big-endian.
#[allow(clippy::too_many_arguments)]
fn eval_sampled(
    inputs: &[f32],
    domain: &[(f32, f32)],
    range: &[(f32, f32)],
    size: &[usize],
    bits: u32,
    encode: &[(f32, f32)],
    decode: &[(f32, f32)],
    samples: &[u8],
) -> Vec<f32> {
    let m = size.len().min(domain.len()).max(1);
    let n_out = range.len();
    let max_sample = ((1u64 << bits.min(32)) - 1) as f32;

    // encoded, clamped grid coordinates
    let mut coords = Vec::with_capacity(m);
    for i in 0..m {
        let (d0, d1) = domain[i];
        let x = inputs.get(i).copied().unwrap_or(0.0).clamp(d0, d1);
        let (e0, e1) = encode.get(i).copied().unwrap_or((0.0, (size[i] - 1) as f32));
        let e = interpolate(x, d0, d1, e0, e1).clamp(0.0, (size[i] - 1) as f32);
        coords.push(e);
    }

    let sample_at = |grid: &[usize], out_idx: usize| -> f32 {
        // row-major with the first input varying fastest
        let mut index = 0usize;
        let mut stride = 1usize;
        for (i, g) in grid.iter().enumerate() {
            index += g * stride;
            stride *= size[i];
        }
        let bit_pos = (index * n_out + out_idx) as u64 * bits as u64;
        read_bits(samples, bit_pos, bits) as f32
    };

    // accumulate over the 2^m corners
    let corners = 1usize << m;
    let mut out = vec![0f32; n_out];
    let mut grid = vec![0usize; m];
    for corner in 0..corners {
        let mut weight = 1f32;
        for i in 0..m {
            let floor = coords[i].floor() as usize;
            let frac = coords[i] - floor as f32;
            let hi = (corner >> i) & 1 == 1;
            let g = if hi {
                (floor + 1).min(size[i] - 1)
            } else {
                floor
            };
            weight *= if hi { frac } else { 1.0 - frac };
            grid[i] = g;
        }
        if weight == 0.0 {
            continue;
        }
        for (j, slot) in out.iter_mut().enumerate() {
            *slot += weight * sample_at(&grid, j);
        }
    }

    out.iter()
        .enumerate()
        .map(|(j, raw)| {
            let (d0, d1) = decode.get(j).copied().unwrap_or((0.0, 1.0));
            let (r0, r1) = range[j];
            interpolate(*raw, 0.0, max_sample, d0, d1).clamp(r0.min(r1), r0.max(r1))
        })
        .collect()
}

fn read_bits(data: &[u8], bit_pos: u64, bits: u32) -> u32 {
    let mut value = 0u64;
    for i in 0..bits as u64 {
        let p = bit_pos + i;
        let byte = (p / 8) as usize;
        let bit = 7 - (p % 8) as u32;
        let b = data.get(byte).copied().unwrap_or(0);
        value = value << 1 | ((b >> bit) & 1) as u64;
    }
    value as u32
}

// ---------------------------------------------------------------- type 4

fn parse_calculator(data: &[u8]) -> Result<Vec<PsOp>, Error> {
    let mut lexer = Lexer::new(data);
    // the whole program is one outer procedure
    loop {
        match lexer.next_token() {
            Ok(Some(Token::ProcOpen)) => break,
            Ok(Some(_)) => continue,
            _ => {
                return Err(Error::CorruptStream(
                    "calculator function without a program body".into(),
                ))
            }
        }
    }
    parse_procedure(&mut lexer)
}

/// Parses to the matching `}`. Nested procedures followed by `if`/`ifelse`
/// become skip-encoded branches.
fn parse_procedure(lexer: &mut Lexer) -> Result<Vec<PsOp>, Error> {
    let mut ops = Vec::new();
    // procedures parsed but not yet consumed by if/ifelse: (start, len)
    let mut pending: Vec<Vec<PsOp>> = Vec::new();
    loop {
        let token = lexer
            .next_token()
            .map_err(|e| Error::CorruptStream(format!("calculator program: {e}")))?
            .ok_or_else(|| Error::CorruptStream("calculator program not closed".into()))?;
        match token {
            Token::ProcClose => {
                // unconsumed procedures are a malformed program; inline them
                for p in pending.drain(..) {
                    ops.extend(p);
                }
                return Ok(ops);
            }
            Token::ProcOpen => {
                pending.push(parse_procedure(lexer)?);
            }
            Token::Integer(i) => ops.push(PsOp::Push(i as f32)),
            Token::Real(r) => ops.push(PsOp::Push(r)),
            Token::Keyword(kw) => {
                let op = match kw.as_slice() {
                    b"if" => {
                        let body = pending.pop().ok_or_else(|| {
                            Error::CorruptStream("`if` without a procedure".into())
                        })?;
                        ops.push(PsOp::If { len: body.len() });
                        ops.extend(body);
                        continue;
                    }
                    b"ifelse" => {
                        let else_body = pending.pop().ok_or_else(|| {
                            Error::CorruptStream("`ifelse` without procedures".into())
                        })?;
                        let then_body = pending.pop().ok_or_else(|| {
                            Error::CorruptStream("`ifelse` without procedures".into())
                        })?;
                        ops.push(PsOp::IfElse {
                            then_len: then_body.len(),
                            else_len: else_body.len(),
                        });
                        ops.extend(then_body);
                        ops.extend(else_body);
                        continue;
                    }
                    b"add" => PsOp::Add,
                    b"sub" => PsOp::Sub,
                    b"mul" => PsOp::Mul,
                    b"div" => PsOp::Div,
                    b"idiv" => PsOp::Idiv,
                    b"mod" => PsOp::Mod,
                    b"neg" => PsOp::Neg,
                    b"abs" => PsOp::Abs,
                    b"ceiling" => PsOp::Ceiling,
                    b"floor" => PsOp::Floor,
                    b"round" => PsOp::Round,
                    b"truncate" => PsOp::Truncate,
                    b"sqrt" => PsOp::Sqrt,
                    b"sin" => PsOp::Sin,
                    b"cos" => PsOp::Cos,
                    b"atan" => PsOp::Atan,
                    b"exp" => PsOp::Exp,
                    b"ln" => PsOp::Ln,
                    b"log" => PsOp::Log,
                    b"cvi" => PsOp::Cvi,
                    b"cvr" => PsOp::Cvr,
                    b"eq" => PsOp::Eq,
                    b"ne" => PsOp::Ne,
                    b"gt" => PsOp::Gt,
                    b"ge" => PsOp::Ge,
                    b"lt" => PsOp::Lt,
                    b"le" => PsOp::Le,
                    b"and" => PsOp::And,
                    b"or" => PsOp::Or,
                    b"xor" => PsOp::Xor,
                    b"not" => PsOp::Not,
                    b"bitshift" => PsOp::Bitshift,
                    b"true" => PsOp::True,
                    b"false" => PsOp::False,
                    b"pop" => PsOp::Pop,
                    b"exch" => PsOp::Exch,
                    b"dup" => PsOp::Dup,
                    b"copy" => PsOp::Copy,
                    b"index" => PsOp::Index,
                    b"roll" => PsOp::Roll,
                    other => {
                        log::warn!(
                            "unknown calculator operator {:?}",
                            String::from_utf8_lossy(other)
                        );
                        continue;
                    }
                };
                ops.push(op);
            }
            _ => {}
        }
    }
}

fn exec_calculator(program: &[PsOp], stack: &mut Vec<f32>) {
    let mut pc = 0usize;
    let mut steps = 0u32;
    while pc < program.len() {
        steps += 1;
        if steps > 100_000 {
            log::warn!("calculator function exceeded its step budget");
            return;
        }
        let op = &program[pc];
        pc += 1;
        macro_rules! pop {
            () => {
                stack.pop().unwrap_or(0.0)
            };
        }
        match op {
            PsOp::Push(v) => stack.push(*v),
            PsOp::Add => {
                let (b, a) = (pop!(), pop!());
                stack.push(a + b);
            }
            PsOp::Sub => {
                let (b, a) = (pop!(), pop!());
                stack.push(a - b);
            }
            PsOp::Mul => {
                let (b, a) = (pop!(), pop!());
                stack.push(a * b);
            }
            PsOp::Div => {
                let (b, a) = (pop!(), pop!());
                stack.push(if b == 0.0 { 0.0 } else { a / b });
            }
            PsOp::Idiv => {
                let (b, a) = (pop!() as i64, pop!() as i64);
                stack.push(if b == 0 { 0.0 } else { (a / b) as f32 });
            }
            PsOp::Mod => {
                let (b, a) = (pop!() as i64, pop!() as i64);
                stack.push(if b == 0 { 0.0 } else { (a % b) as f32 });
            }
            PsOp::Neg => {
                let a = pop!();
                stack.push(-a);
            }
            PsOp::Abs => {
                let a = pop!();
                stack.push(a.abs());
            }
            PsOp::Ceiling => {
                let a = pop!();
                stack.push(a.ceil());
            }
            PsOp::Floor => {
                let a = pop!();
                stack.push(a.floor());
            }
            PsOp::Round => {
                let a = pop!();
                stack.push(a.round());
            }
            PsOp::Truncate => {
                let a = pop!();
                stack.push(a.trunc());
            }
            PsOp::Sqrt => {
                let a = pop!();
                stack.push(a.max(0.0).sqrt());
            }
            PsOp::Sin => {
                let a = pop!();
                stack.push(a.to_radians().sin());
            }
            PsOp::Cos => {
                let a = pop!();
                stack.push(a.to_radians().cos());
            }
            PsOp::Atan => {
                let (den, num) = (pop!(), pop!());
                let mut deg = num.atan2(den).to_degrees();
                if deg < 0.0 {
                    deg += 360.0;
                }
                stack.push(deg);
            }
            PsOp::Exp => {
                let (b, a) = (pop!(), pop!());
                stack.push(a.powf(b));
            }
            PsOp::Ln => {
                let a = pop!();
                stack.push(if a > 0.0 { a.ln() } else { 0.0 });
            }
            PsOp::Log => {
                let a = pop!();
                stack.push(if a > 0.0 { a.log10() } else { 0.0 });
            }
            PsOp::Cvi => {
                let a = pop!();
                stack.push(a.trunc());
            }
            PsOp::Cvr => {}
            PsOp::Eq => {
                let (b, a) = (pop!(), pop!());
                stack.push(bool_val(a == b));
            }
            PsOp::Ne => {
                let (b, a) = (pop!(), pop!());
                stack.push(bool_val(a != b));
            }
            PsOp::Gt => {
                let (b, a) = (pop!(), pop!());
                stack.push(bool_val(a > b));
            }
            PsOp::Ge => {
                let (b, a) = (pop!(), pop!());
                stack.push(bool_val(a >= b));
            }
            PsOp::Lt => {
                let (b, a) = (pop!(), pop!());
                stack.push(bool_val(a < b));
            }
            PsOp::Le => {
                let (b, a) = (pop!(), pop!());
                stack.push(bool_val(a <= b));
            }
            PsOp::And => {
                let (b, a) = (pop!() as i64, pop!() as i64);
                stack.push((a & b) as f32);
            }
            PsOp::Or => {
                let (b, a) = (pop!() as i64, pop!() as i64);
                stack.push((a | b) as f32);
            }
            PsOp::Xor => {
                let (b, a) = (pop!() as i64, pop!() as i64);
                stack.push((a ^ b) as f32);
            }
            PsOp::Not => {
                let a = pop!();
                // boolean not for 0/1, bitwise for integers
                stack.push(if a == 0.0 {
                    1.0
                } else if a == 1.0 {
                    0.0
                } else {
                    !(a as i64) as f32
                });
            }
            PsOp::Bitshift => {
                let (shift, a) = (pop!() as i64, pop!() as i64);
                let v = if shift >= 0 { a << shift.min(63) } else { a >> (-shift).min(63) };
                stack.push(v as f32);
            }
            PsOp::True => stack.push(1.0),
            PsOp::False => stack.push(0.0),
            PsOp::Pop => {
                pop!();
            }
            PsOp::Exch => {
                let (b, a) = (pop!(), pop!());
                stack.push(b);
                stack.push(a);
            }
            PsOp::Dup => {
                let a = stack.last().copied().unwrap_or(0.0);
                stack.push(a);
            }
            PsOp::Copy => {
                let n = pop!().max(0.0) as usize;
                let len = stack.len();
                if n <= len {
                    for i in len - n..len {
                        let v = stack[i];
                        stack.push(v);
                    }
                }
            }
            PsOp::Index => {
                let n = pop!().max(0.0) as usize;
                let v = stack
                    .len()
                    .checked_sub(n + 1)
                    .and_then(|i| stack.get(i).copied())
                    .unwrap_or(0.0);
                stack.push(v);
            }
            PsOp::Roll => {
                let j = pop!() as i64;
                let n = pop!().max(0.0) as usize;
                let len = stack.len();
                if n > 0 && n <= len {
                    let window = &mut stack[len - n..];
                    let j = j.rem_euclid(n as i64) as usize;
                    window.rotate_right(j);
                }
            }
            PsOp::If { len } => {
                let cond = pop!();
                if cond == 0.0 {
                    pc += len;
                }
            }
            PsOp::IfElse { then_len, else_len } => {
                let cond = pop!();
                if cond == 0.0 {
                    // fall into the else-branch after skipping the then-branch
                    pc += then_len;
                } else {
                    exec_calculator(&program[pc..pc + then_len], stack);
                    pc += then_len + else_len;
                }
            }
        }
    }
}

fn bool_val(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(src: &[u8], inputs: &[f32]) -> Vec<f32> {
        let program = parse_calculator(src).unwrap();
        let mut stack = inputs.to_vec();
        exec_calculator(&program, &mut stack);
        stack
    }

    #[test]
    fn calculator_arithmetic() {
        assert_eq!(exec(b"{ 2 3 add }", &[]), vec![5.0]);
        assert_eq!(exec(b"{ 10 4 sub 2 mul }", &[]), vec![12.0]);
        assert_eq!(exec(b"{ dup mul }", &[3.0]), vec![9.0]);
        assert_eq!(exec(b"{ exch }", &[1.0, 2.0]), vec![2.0, 1.0]);
    }

    #[test]
    fn calculator_if_and_ifelse() {
        assert_eq!(exec(b"{ 1 { 42 } if }", &[]), vec![42.0]);
        assert_eq!(exec(b"{ 0 { 42 } if }", &[]), Vec::<f32>::new());
        assert_eq!(exec(b"{ 1 { 10 } { 20 } ifelse }", &[]), vec![10.0]);
        assert_eq!(exec(b"{ 0 { 10 } { 20 } ifelse }", &[]), vec![20.0]);
        assert_eq!(
            exec(b"{ dup 0.5 lt { 0 } { 1 } ifelse }", &[0.7]),
            vec![0.7, 1.0]
        );
    }

    #[test]
    fn calculator_stack_ops() {
        assert_eq!(exec(b"{ 3 1 roll }", &[1.0, 2.0, 3.0]), vec![3.0, 1.0, 2.0]);
        assert_eq!(exec(b"{ 2 copy }", &[1.0, 2.0]), vec![1.0, 2.0, 1.0, 2.0]);
        assert_eq!(exec(b"{ 1 index }", &[5.0, 6.0]), vec![5.0, 6.0, 5.0]);
    }

    #[test]
    fn exponential_function() {
        let f = PdfFunction::Exponential {
            domain: vec![(0.0, 1.0)],
            c0: vec![0.0, 0.0],
            c1: vec![1.0, 0.5],
            n: 1.0,
        };
        assert_eq!(f.eval(&[0.0]), vec![0.0, 0.0]);
        assert_eq!(f.eval(&[1.0]), vec![1.0, 0.5]);
        assert_eq!(f.eval(&[0.5]), vec![0.5, 0.25]);
        // inputs clamp to the domain
        assert_eq!(f.eval(&[2.0]), vec![1.0, 0.5]);
    }

    #[test]
    fn stitching_function() {
        let f = PdfFunction::Stitching {
            domain: (0.0, 1.0),
            functions: vec![
                PdfFunction::Exponential {
                    domain: vec![(0.0, 1.0)],
                    c0: vec![0.0],
                    c1: vec![1.0],
                    n: 1.0,
                },
                PdfFunction::Exponential {
                    domain: vec![(0.0, 1.0)],
                    c0: vec![1.0],
                    c1: vec![0.0],
                    n: 1.0,
                },
            ],
            bounds: vec![0.5],
            encode: vec![(0.0, 1.0), (0.0, 1.0)],
        };
        assert_eq!(f.eval(&[0.25]), vec![0.5]);
        assert_eq!(f.eval(&[0.75]), vec![0.5]);
        assert_eq!(f.eval(&[0.0]), vec![0.0]);
    }

    #[test]
    fn sampled_function_linear() {
        // 1-in 1-out, two 8-bit samples 0 and 255 -> identity ramp
        let samples = vec![0u8, 255];
        let out = eval_sampled(
            &[0.5],
            &[(0.0, 1.0)],
            &[(0.0, 1.0)],
            &[2],
            8,
            &[(0.0, 1.0)],
            &[(0.0, 1.0)],
            &samples,
        );
        assert!((out[0] - 0.5).abs() < 1e-3);
        let ends = eval_sampled(
            &[1.0],
            &[(0.0, 1.0)],
            &[(0.0, 1.0)],
            &[2],
            8,
            &[(0.0, 1.0)],
            &[(0.0, 1.0)],
            &samples,
        );
        assert!((ends[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn read_bits_big_endian() {
        let data = [0b1011_0001, 0b1000_0000];
        assert_eq!(read_bits(&data, 0, 4), 0b1011);
        assert_eq!(read_bits(&data, 4, 4), 0b0001);
        assert_eq!(read_bits(&data, 4, 8), 0b0001_1000);
        assert_eq!(read_bits(&data, 0, 12), 0b1011_0001_1000);
    }
}
