//! Binary crate file (`.usdc`) reading.
//!
//! # File Format
//!
//! 1. **Bootstrap** (88 bytes): `PXR-USDC`, version bytes `major minor patch`,
//!    the table of contents offset as `i64`, then reserved words
//! 2. **Table of contents**: `u64` section count, then per section a 16 byte
//!    name, `i64` start and `i64` size
//! 3. **Sections**: `TOKENS`, `STRINGS`, `FIELDS`, `FIELDSETS`, `PATHS` and
//!    `SPECS`, plus the value data they point into
//!
//! Every spec is a path with a set of fields, and every field value is a
//! 64-bit value rep that is either inlined or points at data elsewhere in the
//! file. Structural tables are LZ4 compressed, integer tables are also delta
//! coded. All numbers are little-endian.
//!
//! Only what the prim tree needs is decoded: specifiers, type names, child
//! order, API schemas, composition arcs, attribute defaults and relationship
//! targets. Other values read as [`Value::Dictionary`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use robot_types::{NormalizeError, Result};

use crate::stage::{
    Attribute, CompositionArc, ListOp, Prim, Specifier, Stage, Value, arc_slot, is_true,
};

/// Magic bytes of a crate file.
pub(crate) const MAGIC: &[u8; 8] = b"PXR-USDC";

/// Magic, version, TOC offset and eight reserved words.
const BOOTSTRAP_SIZE: usize = 88;

/// Oldest version with compressed structural sections.
const MIN_VERSION: Version = Version(0, 4, 0);

const ARRAY_BIT: u64 = 1 << 63;
const INLINED_BIT: u64 = 1 << 62;
const COMPRESSED_BIT: u64 = 1 << 61;
const PAYLOAD_MASK: u64 = (1 << 48) - 1;

const SPEC_ATTRIBUTE: i32 = 1;
const SPEC_PRIM: i32 = 6;
const SPEC_PSEUDO_ROOT: i32 = 7;
const SPEC_RELATIONSHIP: i32 = 8;

// list op header bits
const IS_EXPLICIT: u8 = 1;
const HAS_EXPLICIT: u8 = 1 << 1;
const HAS_ADDED: u8 = 1 << 2;
const HAS_DELETED: u8 = 1 << 3;
const HAS_ORDERED: u8 = 1 << 4;
const HAS_PREPENDED: u8 = 1 << 5;
const HAS_APPENDED: u8 = 1 << 6;

/// Value type ids.
mod ty {
    pub const BOOL: u8 = 1;
    pub const UCHAR: u8 = 2;
    pub const INT: u8 = 3;
    pub const UINT: u8 = 4;
    pub const INT64: u8 = 5;
    pub const UINT64: u8 = 6;
    pub const HALF: u8 = 7;
    pub const FLOAT: u8 = 8;
    pub const DOUBLE: u8 = 9;
    pub const STRING: u8 = 10;
    pub const TOKEN: u8 = 11;
    pub const ASSET_PATH: u8 = 12;
    pub const MATRIX2D: u8 = 13;
    pub const MATRIX4D: u8 = 15;
    pub const QUATD: u8 = 16;
    pub const QUATF: u8 = 17;
    pub const QUATH: u8 = 18;
    pub const VEC2D: u8 = 19;
    pub const VEC4I: u8 = 30;
    pub const PATH_LIST_OP: u8 = 34;
    pub const REFERENCE_LIST_OP: u8 = 35;
    pub const PATH_VECTOR: u8 = 40;
    pub const TOKEN_VECTOR: u8 = 41;
    pub const SPECIFIER: u8 = 42;
    pub const VARIABILITY: u8 = 44;
    pub const PAYLOAD: u8 = 47;
    pub const VALUE_BLOCK: u8 = 51;
    pub const PAYLOAD_LIST_OP: u8 = 55;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Version(u8, u8, u8);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0, self.1, self.2)
    }
}

/// Read a crate file into an uncomposed layer.
pub(crate) fn read(bytes: &[u8]) -> Result<Stage> {
    let file = CrateFile::parse(bytes)?;
    tracing::debug!(
        version = %file.version,
        tokens = file.tokens.len(),
        paths = file.paths.len(),
        specs = file.specs.len(),
        "read crate file"
    );
    file.stage()
}

fn corrupt(message: impl fmt::Display) -> NormalizeError {
    NormalizeError::format(format!("malformed crate file: {message}"))
}

#[allow(clippy::cast_possible_truncation)]
fn type_id(rep: u64) -> u8 {
    ((rep >> 48) & 0xff) as u8
}

fn index(value: i32) -> Result<usize> {
    usize::try_from(value).map_err(|_| corrupt(format!("negative index {value}")))
}

/// Little-endian reader over a byte slice.
#[derive(Debug, Clone)]
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn at(data: &'a [u8], offset: u64) -> Result<Self> {
        let pos = usize::try_from(offset)
            .ok()
            .filter(|&pos| pos <= data.len())
            .ok_or_else(|| corrupt(format!("offset {offset} is past the end of the file")))?;
        Ok(Self { data, pos })
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| corrupt("unexpected end of data"))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(u8::from_le_bytes(self.array()?))
    }

    fn i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.array()?))
    }

    fn i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.array()?))
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// File offset stored as `i64`.
    fn offset(&mut self) -> Result<u64> {
        let offset = self.i64()?;
        u64::try_from(offset).map_err(|_| corrupt(format!("negative offset {offset}")))
    }

    /// Element count or byte size. LZ4 cannot expand more than 255 times, so
    /// anything larger than that over the whole file is corrupt.
    fn count(&mut self) -> Result<usize> {
        let n = self.u64()?;
        usize::try_from(n)
            .ok()
            .filter(|&n| n <= self.data.len().saturating_mul(255))
            .ok_or_else(|| corrupt(format!("implausible count {n}")))
    }
}

/// Undo `TfFastCompression`: a chunk count byte, then either one LZ4 block or
/// `i32`-sized chunks.
fn decompress(block: &[u8], max_size: usize) -> Result<Vec<u8>> {
    let (&chunks, mut rest) = block
        .split_first()
        .ok_or_else(|| corrupt("empty compressed block"))?;
    let mut out = vec![0u8; max_size];
    let mut written = 0;
    if chunks == 0 {
        written = lz4_block(rest, &mut out)?;
    } else {
        for _ in 0..chunks {
            let mut c = Cursor::new(rest);
            let size = index(c.i32()?)?;
            let chunk = c.take(size)?;
            written += lz4_block(chunk, &mut out[written..])?;
            rest = &rest[c.pos..];
        }
    }
    out.truncate(written);
    Ok(out)
}

fn lz4_block(input: &[u8], output: &mut [u8]) -> Result<usize> {
    lz4_flex::block::decompress_into(input, output).map_err(|e| corrupt(format!("LZ4 block: {e}")))
}

/// A `u64` compressed size, then `n` delta coded 32-bit integers.
fn compressed_ints(c: &mut Cursor<'_>, n: usize) -> Result<Vec<i32>> {
    let size = c.count()?;
    let block = c.take(size)?;
    if n == 0 {
        return Ok(Vec::new());
    }
    let encoded = decompress(block, 4 + n.div_ceil(4) + 4 * n)?;
    decode_ints(&encoded, n)
}

/// The common delta, two code bits per value, then the deltas that are not
/// the common one as `i8`, `i16` or `i32`.
fn decode_ints(encoded: &[u8], n: usize) -> Result<Vec<i32>> {
    let mut c = Cursor::new(encoded);
    let common = c.i32()?;
    let codes = c.take(n.div_ceil(4))?;
    let mut values = Vec::with_capacity(n);
    let mut previous = 0i32;
    for i in 0..n {
        let delta = match (codes[i / 4] >> (2 * (i % 4))) & 0b11 {
            0 => common,
            1 => i32::from(c.i8()?),
            2 => i32::from(c.i16()?),
            _ => c.i32()?,
        };
        previous = previous.wrapping_add(delta);
        values.push(previous);
    }
    Ok(values)
}

fn f16_to_f64(bits: u16) -> f64 {
    let sign = if bits & 0x8000 == 0 { 1.0 } else { -1.0 };
    let exponent = i32::from((bits >> 10) & 0x1f);
    let fraction = f64::from(bits & 0x3ff);
    sign * match exponent {
        0 => fraction * 2f64.powi(-24),
        31 if fraction == 0.0 => f64::INFINITY,
        31 => f64::NAN,
        _ => (1.0 + fraction / 1024.0) * 2f64.powi(exponent - 15),
    }
}

/// Component type of vectors, quaternions and matrices.
#[derive(Debug, Clone, Copy)]
enum Scalar {
    Double,
    Float,
    Half,
    Int,
}

impl Scalar {
    fn read(self, c: &mut Cursor<'_>) -> Result<f64> {
        Ok(match self {
            Self::Double => c.f64()?,
            Self::Float => f64::from(c.f32()?),
            Self::Half => f16_to_f64(c.u16()?),
            Self::Int => f64::from(c.i32()?),
        })
    }

    fn tuple(self, c: &mut Cursor<'_>, n: usize) -> Result<Value> {
        (0..n)
            .map(|_| self.read(c).map(Value::Number))
            .collect::<Result<Vec<_>>>()
            .map(Value::Tuple)
    }
}

/// Dimension and component type of the `VecNx` types, ids 19 to 30.
fn vector_type(id: u8) -> Option<(usize, Scalar)> {
    if !(ty::VEC2D..=ty::VEC4I).contains(&id) {
        return None;
    }
    let offset = id - ty::VEC2D;
    let scalar = match offset % 4 {
        0 => Scalar::Double,
        1 => Scalar::Float,
        2 => Scalar::Half,
        _ => Scalar::Int,
    };
    Some((usize::from(offset / 4) + 2, scalar))
}

fn quat_type(id: u8) -> Option<Scalar> {
    match id {
        ty::QUATD => Some(Scalar::Double),
        ty::QUATF => Some(Scalar::Float),
        ty::QUATH => Some(Scalar::Half),
        _ => None,
    }
}

/// Quaternions are stored imaginary part first; USDA writes the real part first.
fn read_quat(c: &mut Cursor<'_>, scalar: Scalar) -> Result<Value> {
    let Value::Tuple(mut items) = scalar.tuple(c, 4)? else {
        return Err(corrupt("quaternion"));
    };
    items.rotate_right(1);
    Ok(Value::Tuple(items))
}

fn read_matrix(c: &mut Cursor<'_>, dim: usize) -> Result<Value> {
    (0..dim)
        .map(|_| Scalar::Double.tuple(c, dim))
        .collect::<Result<Vec<_>>>()
        .map(Value::Tuple)
}

#[derive(Debug, Clone, Copy)]
struct Field {
    name: usize,
    rep: u64,
}

#[derive(Debug, Clone, Copy)]
struct Spec {
    kind: i32,
    field_set: usize,
}

#[derive(Debug)]
struct CrateFile<'a> {
    data: &'a [u8],
    version: Version,
    tokens: Vec<String>,
    strings: Vec<usize>,
    fields: Vec<Field>,
    field_sets: Vec<i32>,
    paths: Vec<String>,
    specs: HashMap<String, Spec>,
}

impl<'a> CrateFile<'a> {
    fn parse(data: &'a [u8]) -> Result<Self> {
        let mut c = Cursor::new(data);
        if c.take(MAGIC.len())? != MAGIC {
            return Err(corrupt("missing PXR-USDC magic"));
        }
        let [major, minor, patch, ..] = c.array::<8>()?;
        let version = Version(major, minor, patch);
        if version < MIN_VERSION {
            return Err(NormalizeError::format(format!(
                "crate file version {version} is older than {MIN_VERSION} and not supported"
            )));
        }
        let toc = c.offset()?;
        if data.len() < BOOTSTRAP_SIZE {
            return Err(corrupt("unexpected end of data"));
        }

        let mut c = Cursor::at(data, toc)?;
        let mut sections = BTreeMap::new();
        for _ in 0..c.count()? {
            let name = c.array::<16>()?;
            let name = name.split(|&b| b == 0).next().unwrap_or_default();
            let start = c.offset()?;
            c.offset()?;
            sections.insert(String::from_utf8_lossy(name).into_owned(), start);
        }
        let section = |name: &str| -> Result<Cursor<'a>> {
            let start = sections
                .get(name)
                .ok_or_else(|| corrupt(format!("no {name} section")))?;
            Cursor::at(data, *start)
        };

        let mut file = Self {
            data,
            version,
            tokens: Vec::new(),
            strings: Vec::new(),
            fields: Vec::new(),
            field_sets: Vec::new(),
            paths: Vec::new(),
            specs: HashMap::new(),
        };
        file.read_tokens(section("TOKENS")?)?;
        file.read_strings(section("STRINGS")?)?;
        file.read_fields(section("FIELDS")?)?;
        file.read_field_sets(section("FIELDSETS")?)?;
        file.read_paths(section("PATHS")?)?;
        file.read_specs(section("SPECS")?)?;
        Ok(file)
    }

    fn read_tokens(&mut self, mut c: Cursor<'_>) -> Result<()> {
        let count = c.count()?;
        let uncompressed = c.count()?;
        let compressed = c.count()?;
        let chars = decompress(c.take(compressed)?, uncompressed)?;
        self.tokens = chars
            .split(|&b| b == 0)
            .take(count)
            .map(|t| String::from_utf8_lossy(t).into_owned())
            .collect();
        if self.tokens.len() != count {
            return Err(corrupt(format!(
                "expected {count} tokens, found {}",
                self.tokens.len()
            )));
        }
        Ok(())
    }

    fn read_strings(&mut self, mut c: Cursor<'_>) -> Result<()> {
        let count = c.count()?;
        self.strings = (0..count)
            .map(|_| Ok(c.u32()? as usize))
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn read_fields(&mut self, mut c: Cursor<'_>) -> Result<()> {
        let count = c.count()?;
        let names = compressed_ints(&mut c, count)?;
        let size = c.count()?;
        let reps = decompress(c.take(size)?, count * 8)?;
        if reps.len() != count * 8 {
            return Err(corrupt("field value reps are short"));
        }
        let mut reps = Cursor::new(&reps);
        self.fields = names
            .into_iter()
            .map(|name| {
                Ok(Field {
                    name: index(name)?,
                    rep: reps.u64()?,
                })
            })
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn read_field_sets(&mut self, mut c: Cursor<'_>) -> Result<()> {
        let count = c.count()?;
        self.field_sets = compressed_ints(&mut c, count)?;
        Ok(())
    }

    /// The path tree is stored depth first. A positive jump or `-1` means the
    /// next entry is a child; a jump of zero or more points at the sibling.
    fn read_paths(&mut self, mut c: Cursor<'_>) -> Result<()> {
        let total = c.count()?;
        let encoded = c.count()?;
        let path_indexes = compressed_ints(&mut c, encoded)?;
        let element_tokens = compressed_ints(&mut c, encoded)?;
        let jumps = compressed_ints(&mut c, encoded)?;

        let mut paths = vec![String::new(); total];
        let mut pending: Vec<(usize, Option<String>)> = if encoded == 0 {
            Vec::new()
        } else {
            vec![(0, None)]
        };
        while let Some((mut next, mut parent)) = pending.pop() {
            loop {
                let this = next;
                next += 1;
                let get = |table: &[i32]| {
                    table
                        .get(this)
                        .copied()
                        .ok_or_else(|| corrupt(format!("path entry {this} is out of range")))
                };
                let path = match &parent {
                    None => "/".to_string(),
                    Some(parent) => {
                        let element = get(&element_tokens)?;
                        let name = self.token(element.unsigned_abs() as usize)?;
                        if element < 0 {
                            format!("{parent}.{name}")
                        } else if parent == "/" {
                            format!("/{name}")
                        } else {
                            format!("{parent}/{name}")
                        }
                    }
                };
                let slot = index(get(&path_indexes)?)?;
                *paths
                    .get_mut(slot)
                    .ok_or_else(|| corrupt(format!("path index {slot} is out of range")))? =
                    path.clone();

                let jump = get(&jumps)?;
                let has_child = jump > 0 || jump == -1;
                let has_sibling = jump >= 0;
                if has_child {
                    if has_sibling {
                        pending.push((this + index(jump)?, parent.clone()));
                    }
                    parent = Some(path);
                } else if parent.is_none() {
                    parent = Some(path);
                }
                if !has_child && !has_sibling {
                    break;
                }
            }
        }
        self.paths = paths;
        Ok(())
    }

    fn read_specs(&mut self, mut c: Cursor<'_>) -> Result<()> {
        let count = c.count()?;
        let path_indexes = compressed_ints(&mut c, count)?;
        let field_sets = compressed_ints(&mut c, count)?;
        let kinds = compressed_ints(&mut c, count)?;
        for ((path, field_set), kind) in path_indexes.into_iter().zip(field_sets).zip(kinds) {
            let path = self.path(index(path)?)?;
            let spec = Spec {
                kind,
                field_set: index(field_set)?,
            };
            self.specs.insert(path, spec);
        }
        Ok(())
    }

    fn token(&self, i: usize) -> Result<&str> {
        self.tokens
            .get(i)
            .map(String::as_str)
            .ok_or_else(|| corrupt(format!("token index {i} is out of range")))
    }

    fn string(&self, i: usize) -> Result<&str> {
        let token = self
            .strings
            .get(i)
            .ok_or_else(|| corrupt(format!("string index {i} is out of range")))?;
        self.token(*token)
    }

    fn path(&self, i: usize) -> Result<String> {
        self.paths
            .get(i)
            .cloned()
            .ok_or_else(|| corrupt(format!("path index {i} is out of range")))
    }

    fn spec(&self, path: &str, kind: i32) -> Result<Spec> {
        match self.specs.get(path) {
            Some(spec) if spec.kind == kind => Ok(*spec),
            Some(spec) => Err(corrupt(format!(
                "{path} has spec type {}, expected {kind}",
                spec.kind
            ))),
            None => Err(corrupt(format!("no spec for {path}"))),
        }
    }

    /// Field names and value reps of a spec, up to the set terminator.
    fn fields_of(&self, spec: Spec) -> Result<Vec<(&str, u64)>> {
        let mut out = Vec::new();
        for &field in self.field_sets.get(spec.field_set..).unwrap_or_default() {
            if field < 0 {
                return Ok(out);
            }
            let field = self
                .fields
                .get(index(field)?)
                .ok_or_else(|| corrupt(format!("field index {field} is out of range")))?;
            out.push((self.token(field.name)?, field.rep));
        }
        Err(corrupt("field set is not terminated"))
    }

    fn stage(&self) -> Result<Stage> {
        let mut stage = Stage::default();
        let mut children = Vec::new();
        for (name, rep) in self.fields_of(self.spec("/", SPEC_PSEUDO_ROOT)?)? {
            match name {
                "defaultPrim" => stage.default_prim = self.value(rep)?.as_str().map(str::to_string),
                "primChildren" => children = self.token_vector(rep)?,
                _ => {}
            }
        }
        for name in children {
            stage.roots.push(self.prim("", &name)?);
        }
        Ok(stage)
    }

    fn prim(&self, parent_path: &str, name: &str) -> Result<Prim> {
        let path = format!("{parent_path}/{name}");
        let mut prim = Prim {
            specifier: Specifier::Over,
            type_name: None,
            name: name.to_string(),
            path: path.clone(),
            line: None,
            api_schemas: Vec::new(),
            arcs: Vec::new(),
            instanceable: false,
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            children: Vec::new(),
        };
        let mut arcs: [Vec<CompositionArc>; 4] = Default::default();
        let mut children = Vec::new();
        let mut properties = Vec::new();

        for (field, rep) in self.fields_of(self.spec(&path, SPEC_PRIM)?)? {
            if let Some(slot) = arc_slot(field) {
                arcs[slot] = self.arcs(rep)?;
                continue;
            }
            match field {
                "specifier" => {
                    prim.specifier = match rep & PAYLOAD_MASK {
                        0 => Specifier::Def,
                        1 => Specifier::Over,
                        _ => Specifier::Class,
                    };
                }
                "typeName" => {
                    prim.type_name = self.value(rep)?.as_str().map(str::to_string);
                }
                "apiSchemas" => {
                    prim.api_schemas = self.list_op(rep, |f, c| Ok(f.token(c.u32()? as usize)?.to_string()))?;
                }
                "instanceable" => prim.instanceable = is_true(&self.value(rep)?),
                "primChildren" => children = self.token_vector(rep)?,
                "properties" => properties = self.token_vector(rep)?,
                _ => {}
            }
        }
        prim.arcs = arcs.into_iter().flatten().collect();

        for name in properties {
            self.property(&mut prim, name)?;
        }
        for name in children {
            let child = self.prim(&path, &name)?;
            prim.children.push(child);
        }
        Ok(prim)
    }

    fn property(&self, prim: &mut Prim, name: String) -> Result<()> {
        let path = format!("{}.{name}", prim.path);
        let spec = *self
            .specs
            .get(&path)
            .ok_or_else(|| corrupt(format!("no spec for {path}")))?;
        let fields = self.fields_of(spec)?;
        match spec.kind {
            SPEC_RELATIONSHIP => {
                let mut targets = Vec::new();
                for (field, rep) in fields {
                    if field == "targetPaths" {
                        targets = self.list_op(rep, |f, c| f.path(c.u32()? as usize))?;
                    }
                }
                prim.relationships.insert(name, targets);
            }
            SPEC_ATTRIBUTE => {
                let mut attribute = Attribute {
                    type_name: String::new(),
                    value: None,
                    line: None,
                };
                for (field, rep) in fields {
                    match field {
                        "typeName" => {
                            attribute.type_name =
                                self.value(rep)?.as_str().unwrap_or_default().to_string();
                        }
                        "default" => attribute.value = Some(self.value(rep)?),
                        _ => {}
                    }
                }
                prim.attributes.insert(name, attribute);
            }
            kind => {
                tracing::debug!(property = %path, kind, "skipping property spec");
            }
        }
        Ok(())
    }

    fn token_vector(&self, rep: u64) -> Result<Vec<String>> {
        let mut c = Cursor::at(self.data, rep & PAYLOAD_MASK)?;
        (0..c.count()?)
            .map(|_| Ok(self.token(c.u32()? as usize)?.to_string()))
            .collect()
    }

    /// Read a list op and resolve it against an empty list.
    fn list_op<T: PartialEq>(
        &self,
        rep: u64,
        mut item: impl FnMut(&Self, &mut Cursor<'a>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut c = Cursor::at(self.data, rep & PAYLOAD_MASK)?;
        let header = c.u8()?;
        let mut items = |c: &mut Cursor<'a>, bit: u8| -> Result<Vec<T>> {
            if header & bit == 0 {
                return Ok(Vec::new());
            }
            let n = c.count()?;
            (0..n).map(|_| item(self, c)).collect()
        };
        let explicit = items(&mut c, HAS_EXPLICIT)?;
        if header & (IS_EXPLICIT | HAS_EXPLICIT) != 0 {
            return Ok(explicit);
        }
        let added = items(&mut c, HAS_ADDED)?;
        let prepended = items(&mut c, HAS_PREPENDED)?;
        let appended = items(&mut c, HAS_APPENDED)?;
        let deleted = items(&mut c, HAS_DELETED)?;
        if header & HAS_ORDERED != 0 {
            tracing::trace!("ignoring list op reorder");
        }

        let mut out = Vec::new();
        ListOp::Prepend.apply(&mut out, prepended);
        ListOp::Append.apply(&mut out, added);
        ListOp::Append.apply(&mut out, appended);
        ListOp::Delete.apply(&mut out, deleted);
        Ok(out)
    }

    /// Composition arcs of a `references`, `payload`, `inherits` or
    /// `specializes` field.
    fn arcs(&self, rep: u64) -> Result<Vec<CompositionArc>> {
        let arcs = match type_id(rep) {
            ty::PATH_LIST_OP => self.list_op(rep, |f, c| Ok(arc("", f.path(c.u32()? as usize)?)))?,
            ty::REFERENCE_LIST_OP => self.list_op(rep, Self::reference)?,
            ty::PAYLOAD_LIST_OP => self.list_op(rep, Self::payload)?,
            ty::PAYLOAD => {
                let mut c = Cursor::at(self.data, rep & PAYLOAD_MASK)?;
                vec![self.payload(&mut c)?]
            }
            other => return Err(corrupt(format!("composition field of type {other}"))),
        };
        Ok(arcs.into_iter().flatten().collect())
    }

    /// Asset path, prim path, layer offset and custom data.
    fn reference(&self, c: &mut Cursor<'a>) -> Result<Option<CompositionArc>> {
        let asset = self.string(c.u32()? as usize)?.to_string();
        let prim = self.path(c.u32()? as usize)?;
        c.take(16)?;
        let entries = c.count()?;
        c.take(entries.saturating_mul(12))?;
        Ok(arc(&asset, prim))
    }

    fn payload(&self, c: &mut Cursor<'a>) -> Result<Option<CompositionArc>> {
        let asset = self.string(c.u32()? as usize)?.to_string();
        let prim = self.path(c.u32()? as usize)?;
        if self.version >= Version(0, 8, 0) {
            c.take(16)?;
        }
        Ok(arc(&asset, prim))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_precision_loss)]
    fn value(&self, rep: u64) -> Result<Value> {
        let id = type_id(rep);
        let payload = rep & PAYLOAD_MASK;
        if rep & ARRAY_BIT != 0 {
            return self.array(id, rep);
        }
        if rep & INLINED_BIT != 0 {
            let bytes = payload.to_le_bytes();
            let low = payload as u32;
            return Ok(match id {
                ty::BOOL => Value::Token(if low == 0 { "false" } else { "true" }.to_string()),
                ty::UCHAR | ty::UINT | ty::SPECIFIER..=ty::VARIABILITY => {
                    Value::Number(f64::from(low))
                }
                ty::INT => Value::Number(f64::from(low as i32)),
                ty::INT64 | ty::UINT64 => Value::Number(payload as f64),
                ty::HALF => Value::Number(f16_to_f64(low as u16)),
                // doubles that fit are stored as floats
                ty::FLOAT | ty::DOUBLE => Value::Number(f64::from(f32::from_bits(low))),
                ty::STRING => Value::String(self.string(low as usize)?.to_string()),
                ty::TOKEN => Value::Token(self.token(low as usize)?.to_string()),
                ty::ASSET_PATH => Value::Asset(self.token(low as usize)?.to_string(), None),
                ty::MATRIX2D..=ty::MATRIX4D => {
                    let dim = usize::from(id - ty::MATRIX2D) + 2;
                    Value::Tuple(
                        (0..dim)
                            .map(|row| {
                                Value::Tuple(
                                    (0..dim)
                                        .map(|col| {
                                            let d = if row == col { f64::from(bytes[row] as i8) } else { 0.0 };
                                            Value::Number(d)
                                        })
                                        .collect(),
                                )
                            })
                            .collect(),
                    )
                }
                ty::VALUE_BLOCK => Value::None,
                id => match vector_type(id) {
                    Some((n, _)) => Value::Tuple(
                        bytes[..n]
                            .iter()
                            .map(|&b| Value::Number(f64::from(b as i8)))
                            .collect(),
                    ),
                    None => Value::Dictionary,
                },
            });
        }

        let mut c = Cursor::at(self.data, payload)?;
        Ok(match id {
            ty::INT64 => Value::Number(c.i64()? as f64),
            ty::UINT64 => Value::Number(c.u64()? as f64),
            ty::DOUBLE => Value::Number(c.f64()?),
            ty::MATRIX2D..=ty::MATRIX4D => read_matrix(&mut c, usize::from(id - ty::MATRIX2D) + 2)?,
            ty::TOKEN_VECTOR => Value::List(
                self.token_vector(rep)?
                    .into_iter()
                    .map(Value::Token)
                    .collect(),
            ),
            ty::PATH_VECTOR => Value::List(
                (0..c.count()?)
                    .map(|_| Ok(Value::Path(self.path(c.u32()? as usize)?)))
                    .collect::<Result<_>>()?,
            ),
            id => match (quat_type(id), vector_type(id)) {
                (Some(scalar), _) => read_quat(&mut c, scalar)?,
                (None, Some((n, scalar))) => scalar.tuple(&mut c, n)?,
                (None, None) => Value::Dictionary,
            },
        })
    }

    /// Arrays start with their element count. Large numeric arrays may be
    /// compressed. Arrays of non-numeric value types stay opaque.
    fn array(&self, id: u8, rep: u64) -> Result<Value> {
        let payload = rep & PAYLOAD_MASK;
        if id > ty::VEC4I {
            return Ok(Value::Dictionary);
        }
        if payload == 0 {
            return Ok(Value::List(Vec::new()));
        }
        let mut c = Cursor::at(self.data, payload)?;
        if self.version < Version(0, 5, 0) {
            // shape rank
            c.u32()?;
        }
        let n = if self.version < Version(0, 7, 0) {
            c.u32()? as usize
        } else {
            c.count()?
        };

        if rep & COMPRESSED_BIT != 0 {
            let numbers = match id {
                ty::INT | ty::UINT => compressed_ints(&mut c, n)?
                    .into_iter()
                    .map(f64::from)
                    .collect(),
                ty::HALF => compressed_floats(&mut c, n, Scalar::Half)?,
                ty::FLOAT => compressed_floats(&mut c, n, Scalar::Float)?,
                ty::DOUBLE => compressed_floats(&mut c, n, Scalar::Double)?,
                _ => return Ok(Value::Dictionary),
            };
            return Ok(Value::List(numbers.into_iter().map(Value::Number).collect()));
        }

        (0..n)
            .map(|_| {
                Ok(match id {
                    ty::BOOL => Value::Token(if c.u8()? == 0 { "false" } else { "true" }.to_string()),
                    ty::UCHAR => Value::Number(f64::from(c.u8()?)),
                    ty::INT => Value::Number(f64::from(c.i32()?)),
                    ty::UINT => Value::Number(f64::from(c.u32()?)),
                    ty::HALF => Value::Number(Scalar::Half.read(&mut c)?),
                    ty::FLOAT => Value::Number(Scalar::Float.read(&mut c)?),
                    ty::DOUBLE => Value::Number(c.f64()?),
                    ty::STRING => Value::String(self.string(c.u32()? as usize)?.to_string()),
                    ty::TOKEN => Value::Token(self.token(c.u32()? as usize)?.to_string()),
                    ty::ASSET_PATH => Value::Asset(self.token(c.u32()? as usize)?.to_string(), None),
                    ty::MATRIX2D..=ty::MATRIX4D => {
                        read_matrix(&mut c, usize::from(id - ty::MATRIX2D) + 2)?
                    }
                    id => match (quat_type(id), vector_type(id)) {
                        (Some(scalar), _) => read_quat(&mut c, scalar)?,
                        (None, Some((dim, scalar))) => scalar.tuple(&mut c, dim)?,
                        (None, None) => return Err(corrupt(format!("array of type {id}"))),
                    },
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }
}

/// Floats coded as integers (`i`) or as indexes into a table (`t`).
fn compressed_floats(c: &mut Cursor<'_>, n: usize, scalar: Scalar) -> Result<Vec<f64>> {
    match c.u8()? {
        b'i' => Ok(compressed_ints(c, n)?.into_iter().map(f64::from).collect()),
        b't' => {
            let size = c.u32()? as usize;
            let table = (0..size)
                .map(|_| scalar.read(c))
                .collect::<Result<Vec<_>>>()?;
            compressed_ints(c, n)?
                .into_iter()
                .map(|i| {
                    table
                        .get(index(i)?)
                        .copied()
                        .ok_or_else(|| corrupt(format!("table index {i} is out of range")))
                })
                .collect()
        }
        code => Err(corrupt(format!("unknown float array coding {code}"))),
    }
}

/// An empty asset means the arc targets this layer.
fn arc(asset: &str, prim: String) -> Option<CompositionArc> {
    let prim = (!prim.is_empty()).then_some(prim);
    if asset.is_empty() {
        prim.map(CompositionArc::Internal)
    } else {
        Some(CompositionArc::External {
            asset: asset.to_string(),
            prim,
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
mod tests {
    use super::*;
    use crate::UsdNormalizer;
    use nalgebra::{Vector3, Vector4};
    use robot_types::{Geometry, Inertia, JointType, Normalizer};
    use std::collections::HashMap;

    const TOKEN_LIST_OP: u8 = 32;

    /// Builds small crate files: value data right after the bootstrap, then
    /// the sections, then the table of contents.
    #[derive(Default)]
    struct Writer {
        tokens: Vec<String>,
        strings: Vec<u32>,
        fields: Vec<(u32, u64)>,
        field_sets: Vec<i32>,
        paths: Vec<String>,
        specs: Vec<(i32, i32, i32)>,
        data: Vec<u8>,
    }

    fn compress(bytes: &[u8]) -> Vec<u8> {
        let mut out = vec![0];
        out.extend(lz4_flex::block::compress(bytes));
        out
    }

    fn put_u64(out: &mut Vec<u8>, n: usize) {
        out.extend((n as u64).to_le_bytes());
    }

    /// Every value as a full `i32` delta.
    fn put_ints(out: &mut Vec<u8>, values: &[i32]) {
        let mut encoded = 0i32.to_le_bytes().to_vec();
        encoded.extend(vec![0xff; values.len().div_ceil(4)]);
        let mut previous = 0i32;
        for &v in values {
            encoded.extend(v.wrapping_sub(previous).to_le_bytes());
            previous = v;
        }
        let packed = compress(&encoded);
        put_u64(out, packed.len());
        out.extend(packed);
    }

    fn parent_of(path: &str) -> &str {
        let last = path.rsplit('/').next().unwrap_or_default();
        if let Some(dot) = last.find('.') {
            return &path[..path.len() - last.len() + dot];
        }
        match path.rfind('/') {
            Some(0) | None => "/",
            Some(i) => &path[..i],
        }
    }

    fn leaf(path: &str) -> (&str, bool) {
        let last = path.rsplit('/').next().unwrap_or_default();
        match last.split_once('.') {
            Some((_, property)) => (property, true),
            None => (last, false),
        }
    }

    impl Writer {
        fn new() -> Self {
            let mut w = Self::default();
            w.token("");
            w.path("/");
            w
        }

        fn token(&mut self, s: &str) -> u32 {
            let i = self.tokens.iter().position(|t| t == s).unwrap_or_else(|| {
                self.tokens.push(s.to_string());
                self.tokens.len() - 1
            });
            i as u32
        }

        fn string(&mut self, s: &str) -> u32 {
            let token = self.token(s);
            let i = self.strings.iter().position(|&t| t == token).unwrap_or_else(|| {
                self.strings.push(token);
                self.strings.len() - 1
            });
            i as u32
        }

        fn path(&mut self, p: &str) -> u32 {
            let i = self.paths.iter().position(|q| q == p).unwrap_or_else(|| {
                self.paths.push(p.to_string());
                self.paths.len() - 1
            });
            i as u32
        }

        fn inline(id: u8, payload: u64) -> u64 {
            (u64::from(id) << 48) | INLINED_BIT | payload
        }

        fn stored(&mut self, id: u8, bytes: &[u8]) -> u64 {
            let offset = (BOOTSTRAP_SIZE + self.data.len()) as u64;
            self.data.extend_from_slice(bytes);
            (u64::from(id) << 48) | offset
        }

        fn token_inline(&mut self, s: &str) -> u64 {
            let t = self.token(s);
            Self::inline(ty::TOKEN, u64::from(t))
        }

        fn float_inline(v: f32) -> u64 {
            Self::inline(ty::FLOAT, u64::from(v.to_bits()))
        }

        fn token_list(&mut self, items: &[&str]) -> Vec<u8> {
            let mut out = Vec::new();
            put_u64(&mut out, items.len());
            for item in items {
                out.extend(self.token(item).to_le_bytes());
            }
            out
        }

        fn token_vector(&mut self, items: &[&str]) -> u64 {
            let bytes = self.token_list(items);
            self.stored(ty::TOKEN_VECTOR, &bytes)
        }

        fn token_array(&mut self, items: &[&str]) -> u64 {
            let bytes = self.token_list(items);
            self.stored(ty::TOKEN, &bytes) | ARRAY_BIT
        }

        fn prepended_tokens(&mut self, items: &[&str]) -> u64 {
            let mut bytes = vec![HAS_PREPENDED];
            bytes.extend(self.token_list(items));
            self.stored(TOKEN_LIST_OP, &bytes)
        }

        fn explicit_paths(&mut self, items: &[&str]) -> u64 {
            let mut bytes = vec![IS_EXPLICIT | HAS_EXPLICIT];
            put_u64(&mut bytes, items.len());
            for item in items {
                bytes.extend(self.path(item).to_le_bytes());
            }
            self.stored(ty::PATH_LIST_OP, &bytes)
        }

        fn prepended_reference(&mut self, target: &str) -> u64 {
            let mut bytes = vec![HAS_PREPENDED];
            put_u64(&mut bytes, 1);
            bytes.extend(self.string("").to_le_bytes());
            bytes.extend(self.path(target).to_le_bytes());
            bytes.extend(0f64.to_le_bytes());
            bytes.extend(1f64.to_le_bytes());
            put_u64(&mut bytes, 0);
            self.stored(ty::REFERENCE_LIST_OP, &bytes)
        }

        fn doubles(&mut self, id: u8, values: &[f64]) -> u64 {
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            self.stored(id, &bytes)
        }

        fn floats(&mut self, id: u8, values: &[f32]) -> u64 {
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            self.stored(id, &bytes)
        }

        fn spec(&mut self, path: &str, kind: i32, fields: &[(&str, u64)]) {
            let path = self.path(path) as i32;
            let set = self.field_sets.len() as i32;
            for &(name, rep) in fields {
                let name = self.token(name);
                self.fields.push((name, rep));
                self.field_sets.push(self.fields.len() as i32 - 1);
            }
            self.field_sets.push(-1);
            self.specs.push((path, set, kind));
        }

        fn prim(
            &mut self,
            path: &str,
            type_name: &str,
            children: &[&str],
            properties: &[&str],
            extra: &[(&str, u64)],
        ) {
            let mut fields = vec![("specifier", Self::inline(ty::SPECIFIER, 0))];
            if !type_name.is_empty() {
                fields.push(("typeName", self.token_inline(type_name)));
            }
            if !children.is_empty() {
                fields.push(("primChildren", self.token_vector(children)));
            }
            if !properties.is_empty() {
                fields.push(("properties", self.token_vector(properties)));
            }
            fields.extend_from_slice(extra);
            self.spec(path, SPEC_PRIM, &fields);
        }

        fn attribute(&mut self, path: &str, type_name: &str, default: u64) {
            let type_name = self.token_inline(type_name);
            self.spec(path, SPEC_ATTRIBUTE, &[("typeName", type_name), ("default", default)]);
        }

        fn relationship(&mut self, path: &str, targets: &[&str]) {
            let targets = self.explicit_paths(targets);
            self.spec(path, SPEC_RELATIONSHIP, &[("targetPaths", targets)]);
        }

        fn encode_paths(&mut self) -> (Vec<i32>, Vec<i32>, Vec<i32>) {
            let mut children: HashMap<String, Vec<String>> = HashMap::new();
            for path in self.paths.iter().filter(|p| *p != "/") {
                children.entry(parent_of(path).to_string()).or_default().push(path.clone());
            }
            fn size(path: &str, children: &HashMap<String, Vec<String>>) -> usize {
                1 + children.get(path).map_or(0, |c| c.iter().map(|c| size(c, children)).sum())
            }
            fn preorder(
                path: &str,
                has_sibling: bool,
                children: &HashMap<String, Vec<String>>,
                out: &mut Vec<(String, bool)>,
            ) {
                out.push((path.to_string(), has_sibling));
                if let Some(kids) = children.get(path) {
                    for (k, child) in kids.iter().enumerate() {
                        preorder(child, k + 1 < kids.len(), children, out);
                    }
                }
            }
            let mut order = Vec::new();
            preorder("/", false, &children, &mut order);

            let (mut indexes, mut elements, mut jumps) = (Vec::new(), Vec::new(), Vec::new());
            for (path, has_sibling) in &order {
                indexes.push(self.paths.iter().position(|p| p == path).unwrap() as i32);
                elements.push(if path == "/" {
                    0
                } else {
                    let (name, property) = leaf(path);
                    let t = self.token(name) as i32;
                    if property { -t } else { t }
                });
                let has_child = children.get(path).is_some_and(|c| !c.is_empty());
                jumps.push(match (has_child, *has_sibling) {
                    (true, true) => size(path, &children) as i32,
                    (true, false) => -1,
                    (false, true) => 0,
                    (false, false) => -2,
                });
            }
            (indexes, elements, jumps)
        }

        fn finish(mut self) -> Vec<u8> {
            let (path_indexes, elements, jumps) = self.encode_paths();
            let mut sections: Vec<(&str, Vec<u8>)> = Vec::new();

            let mut chars = Vec::new();
            for token in &self.tokens {
                chars.extend_from_slice(token.as_bytes());
                chars.push(0);
            }
            let packed = compress(&chars);
            let mut tokens = Vec::new();
            put_u64(&mut tokens, self.tokens.len());
            put_u64(&mut tokens, chars.len());
            put_u64(&mut tokens, packed.len());
            tokens.extend(packed);
            sections.push(("TOKENS", tokens));

            let mut strings = Vec::new();
            put_u64(&mut strings, self.strings.len());
            for s in &self.strings {
                strings.extend(s.to_le_bytes());
            }
            sections.push(("STRINGS", strings));

            let mut fields = Vec::new();
            put_u64(&mut fields, self.fields.len());
            let names: Vec<i32> = self.fields.iter().map(|f| f.0 as i32).collect();
            put_ints(&mut fields, &names);
            let reps: Vec<u8> = self.fields.iter().flat_map(|f| f.1.to_le_bytes()).collect();
            let packed = compress(&reps);
            put_u64(&mut fields, packed.len());
            fields.extend(packed);
            sections.push(("FIELDS", fields));

            let mut field_sets = Vec::new();
            put_u64(&mut field_sets, self.field_sets.len());
            put_ints(&mut field_sets, &self.field_sets);
            sections.push(("FIELDSETS", field_sets));

            let mut paths = Vec::new();
            put_u64(&mut paths, self.paths.len());
            put_u64(&mut paths, path_indexes.len());
            put_ints(&mut paths, &path_indexes);
            put_ints(&mut paths, &elements);
            put_ints(&mut paths, &jumps);
            sections.push(("PATHS", paths));

            let mut specs = Vec::new();
            put_u64(&mut specs, self.specs.len());
            put_ints(&mut specs, &self.specs.iter().map(|s| s.0).collect::<Vec<_>>());
            put_ints(&mut specs, &self.specs.iter().map(|s| s.1).collect::<Vec<_>>());
            put_ints(&mut specs, &self.specs.iter().map(|s| s.2).collect::<Vec<_>>());
            sections.push(("SPECS", specs));

            let body_start = BOOTSTRAP_SIZE + self.data.len();
            let (mut body, mut toc) = (Vec::new(), Vec::new());
            put_u64(&mut toc, sections.len());
            for (name, bytes) in &sections {
                let mut padded = [0u8; 16];
                padded[..name.len()].copy_from_slice(name.as_bytes());
                toc.extend(padded);
                toc.extend(((body_start + body.len()) as i64).to_le_bytes());
                toc.extend((bytes.len() as i64).to_le_bytes());
                body.extend_from_slice(bytes);
            }

            let mut file = MAGIC.to_vec();
            file.extend([0, 8, 0, 0, 0, 0, 0, 0]);
            file.extend(((body_start + body.len()) as i64).to_le_bytes());
            file.extend([0u8; 64]);
            file.extend(self.data);
            file.extend(body);
            file.extend(toc);
            file
        }
    }

    /// Two links, a hinge and an instanced collision box pulled in by reference.
    fn robot_layer() -> Vec<u8> {
        let mut w = Writer::new();
        let default_prim = w.token_inline("bot");
        let roots = w.token_vector(&["proto", "bot"]);
        w.spec("/", SPEC_PSEUDO_ROOT, &[("defaultPrim", default_prim), ("primChildren", roots)]);

        let children = w.token_vector(&["box"]);
        w.spec(
            "/proto",
            SPEC_PRIM,
            &[("specifier", Writer::inline(ty::SPECIFIER, 2)), ("primChildren", children)],
        );
        let schemas = w.prepended_tokens(&["PhysicsCollisionAPI"]);
        w.prim("/proto/box", "Cube", &[], &["size"], &[("apiSchemas", schemas)]);
        let size = w.doubles(ty::DOUBLE, &[0.25]);
        w.attribute("/proto/box.size", "double", size);

        w.prim(
            "/bot",
            "Xform",
            &["base", "tip", "joints"],
            &["isaac:physics:robotLinks", "isaac:physics:robotJoints"],
            &[],
        );
        w.relationship("/bot.isaac:physics:robotLinks", &["/bot/base", "/bot/tip"]);
        w.relationship("/bot.isaac:physics:robotJoints", &["/bot/joints/hinge"]);

        let schemas = w.prepended_tokens(&["PhysicsRigidBodyAPI", "PhysicsMassAPI"]);
        w.prim(
            "/bot/base",
            "Xform",
            &["collisions"],
            &["physics:mass", "physics:diagonalInertia"],
            &[("apiSchemas", schemas)],
        );
        w.attribute("/bot/base.physics:mass", "float", Writer::float_inline(2.0));
        w.attribute(
            "/bot/base.physics:diagonalInertia",
            "float3",
            Writer::inline(24, 0x03_02_01),
        );
        let reference = w.prepended_reference("/proto");
        w.prim(
            "/bot/base/collisions",
            "Xform",
            &[],
            &[],
            &[
                ("instanceable", Writer::inline(ty::BOOL, 1)),
                ("references", reference),
            ],
        );

        w.prim(
            "/bot/tip",
            "Xform",
            &[],
            &["xformOp:translate", "xformOpOrder"],
            &[],
        );
        let translate = w.doubles(23, &[0.0, 0.0, 0.5]);
        w.attribute("/bot/tip.xformOp:translate", "double3", translate);
        let order = w.token_array(&["xformOp:translate"]);
        w.attribute("/bot/tip.xformOpOrder", "token[]", order);

        w.prim("/bot/joints", "Scope", &["hinge"], &[], &[]);
        w.prim(
            "/bot/joints/hinge",
            "PhysicsRevoluteJoint",
            &[],
            &[
                "physics:body0",
                "physics:body1",
                "physics:axis",
                "physics:lowerLimit",
                "physics:upperLimit",
                "physics:localPos0",
                "physics:localRot0",
            ],
            &[],
        );
        w.relationship("/bot/joints/hinge.physics:body0", &["/bot/base"]);
        w.relationship("/bot/joints/hinge.physics:body1", &["/bot/tip"]);
        let axis = w.token_inline("Y");
        w.attribute("/bot/joints/hinge.physics:axis", "token", axis);
        w.attribute("/bot/joints/hinge.physics:lowerLimit", "float", Writer::float_inline(-90.0));
        w.attribute(
            "/bot/joints/hinge.physics:upperLimit",
            "double",
            Writer::inline(ty::DOUBLE, u64::from(90f32.to_bits())),
        );
        w.attribute(
            "/bot/joints/hinge.physics:localPos0",
            "point3f",
            Writer::inline(24, 0x01_00_00),
        );
        let rotation = w.floats(ty::QUATF, &[0.0, 0.0, 0.707_106_8, 0.707_106_8]);
        w.attribute("/bot/joints/hinge.physics:localRot0", "quatf", rotation);
        w.finish()
    }

    #[test]
    fn test_int_decoding() {
        // common delta 1, then one i8, one i16 and one i32 delta
        let mut encoded = 1i32.to_le_bytes().to_vec();
        encoded.push(0b11_10_01_00);
        encoded.push(0b00_00_00_00);
        encoded.push((-3i8) as u8);
        encoded.extend(300i16.to_le_bytes());
        encoded.extend(100_000i32.to_le_bytes());
        let values = decode_ints(&encoded, 5).unwrap();
        assert_eq!(values, [1, -2, 298, 100_298, 100_299]);
    }

    #[test]
    fn test_half_floats() {
        assert_eq!(f16_to_f64(0x3c00), 1.0);
        assert_eq!(f16_to_f64(0xc000), -2.0);
        assert_eq!(f16_to_f64(0x3800), 0.5);
        assert_eq!(f16_to_f64(0x0000), 0.0);
        assert!(f16_to_f64(0x7c00).is_infinite());
    }

    #[test]
    fn test_chunked_decompression() {
        let first = lz4_flex::block::compress(b"hello ");
        let second = lz4_flex::block::compress(b"world");
        let mut block = vec![2];
        for chunk in [&first, &second] {
            block.extend((chunk.len() as i32).to_le_bytes());
            block.extend(chunk);
        }
        assert_eq!(decompress(&block, 64).unwrap(), b"hello world");
    }

    #[test]
    fn test_prim_tree() {
        let stage = read(&robot_layer()).unwrap();
        assert_eq!(stage.default_prim.as_deref(), Some("bot"));
        let names: Vec<_> = stage.roots.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["proto", "bot"]);
        assert_eq!(stage.roots[0].specifier, Specifier::Class);

        let bot = stage.prim("/bot").unwrap();
        assert_eq!(bot.type_name.as_deref(), Some("Xform"));
        assert_eq!(bot.line, None);
        assert_eq!(bot.targets("isaac:physics:robotLinks"), ["/bot/base", "/bot/tip"]);

        let base = stage.prim("/bot/base").unwrap();
        assert_eq!(base.api_schemas, ["PhysicsRigidBodyAPI", "PhysicsMassAPI"]);
        assert_eq!(base.attr_f64("physics:mass").unwrap(), Some(2.0));
        assert_eq!(
            base.attr_vec3("physics:diagonalInertia").unwrap(),
            Some(Vector3::new(1.0, 2.0, 3.0))
        );

        let collisions = stage.prim("/bot/base/collisions").unwrap();
        assert!(collisions.instanceable);
        assert_eq!(collisions.arcs, [CompositionArc::Internal("/proto".into())]);
        // composition has not run yet
        assert!(collisions.children.is_empty());

        let tip = stage.prim("/bot/tip").unwrap();
        assert_eq!(tip.attr_tokens("xformOpOrder").unwrap().unwrap(), ["xformOp:translate"]);
        assert_eq!(tip.attributes["xformOp:translate"].type_name, "double3");

        let hinge = stage.prim("/bot/joints/hinge").unwrap();
        assert_eq!(hinge.attr_token("physics:axis").unwrap(), Some("Y"));
        assert_eq!(hinge.attr_f64("physics:upperLimit").unwrap(), Some(90.0));
        let rotation = hinge.attr_quat("physics:localRot0").unwrap().unwrap();
        assert_eq!(rotation.x, 0.0);
        assert!((rotation.w - 0.707_106_8).abs() < 1e-6);
        assert!((rotation.z - 0.707_106_8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_crate_robot() {
        let robot = UsdNormalizer.normalize_bytes(&robot_layer(), None).unwrap();
        assert_eq!(robot.name, "bot");
        assert_eq!(robot.links.len(), 2);

        let base = &robot.links["base"];
        let inertial = base.inertial.as_ref().unwrap();
        assert_eq!(inertial.mass, 2.0);
        assert_eq!(inertial.inertia, Inertia::diagonal(1.0, 2.0, 3.0));
        assert_eq!(base.source.line, None);
        assert_eq!(base.source.locator.as_deref(), Some("/bot/base"));

        assert_eq!(base.collisions.len(), 1);
        match base.collisions[0].geometry.as_ref().unwrap() {
            Geometry::Box(b) => assert_eq!(b.size, Vector3::repeat(0.25)),
            other => panic!("expected box, got {other:?}"),
        }
        assert_eq!(
            base.collisions[0].source.locator.as_deref(),
            Some("/bot/base/collisions/box")
        );

        let hinge = &robot.joints["hinge"];
        assert_eq!(hinge.joint_type, JointType::Revolute);
        assert_eq!((hinge.parent.as_str(), hinge.child.as_str()), ("base", "tip"));
        assert_eq!(hinge.axis, Vector3::y());
        assert_eq!(hinge.origin.xyz, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(hinge.origin.quat, Vector4::new(0.707107, 0.0, 0.0, 0.707107));
        let limit = hinge.limit.as_ref().unwrap();
        assert!((limit.lower + std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert!((limit.upper - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_truncated_and_corrupt_files() {
        let layer = robot_layer();
        let err = read(&layer[..40]).unwrap_err();
        assert!(matches!(err, NormalizeError::Format { .. }), "{err}");

        let mut old = layer.clone();
        old[9] = 3;
        let err = read(&old).unwrap_err();
        assert!(err.to_string().contains("version 0.3.0"), "{err}");

        let mut bad_toc = layer.clone();
        bad_toc[16..24].copy_from_slice(&(layer.len() as i64 * 2).to_le_bytes());
        assert!(read(&bad_toc).is_err());

        assert!(read(b"PXR-USDA").is_err());
    }
}
