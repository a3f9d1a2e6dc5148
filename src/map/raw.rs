//! # RCAL binary level format
//!
//! ```text
//! header   (byteorder, little-endian)
//!   magic      [u8; 4]   "RCAL"
//!   version    u16
//!   name_len   u16
//!   sectors    u32
//!   walls      u32       total over all sectors
//!   nodes      u32       0 = no BSP
//!   name       [u8; name_len]  UTF-8
//! records  (bincode 2, fixed-int, little-endian)
//!   RawSpawn
//!   { RawSector, RawWall × sector.wall_count } × sectors
//!   RawNode × nodes            arena order, node 0 is the root
//! ```

use std::io::{Read, Write};

use bincode::{
    Decode, Encode,
    config::{self, Config},
    decode_from_slice, encode_into_std_write,
};
use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};

use crate::{
    map::MapError,
    world::{BspNode, BspTree, Camera, Level, NodeId, Rgba, Sector, Segment, Wall, WallFlags},
};

pub const MAGIC: &[u8; 4] = b"RCAL";
pub const VERSION: u16 = 1;

/// Child slot with nothing in it.
const NO_CHILD: u32 = u32::MAX;
const KIND_INTERNAL: u8 = 0;
const KIND_LEAF: u8 = 1;

/// Upper bound on the bytes one record may claim while decoding.  Keeps a
/// corrupt string length from turning into a huge allocation.
const RECORD_LIMIT: usize = 1 << 20;

#[inline]
fn cfg() -> impl Config {
    config::standard()
        .with_fixed_int_encoding()
        .with_little_endian()
}

#[inline]
fn decode_cfg() -> impl Config {
    config::standard()
        .with_fixed_int_encoding()
        .with_little_endian()
        .with_limit::<RECORD_LIMIT>()
}

/*=======================================================================*/
/*                         Raw binary records                            */
/*=======================================================================*/

#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct RawSpawn {
    pub x: f64,
    pub y: f64,
    pub direction: f64,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct RawSector {
    pub name: String,
    pub wall_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct RawWall {
    pub line: [f64; 4],
    pub floor_height: f64,
    pub ceiling_height: f64,
    pub floor_slope: f64,
    pub ceiling_slope: f64,
    pub bottom: [u8; 4],
    pub middle: [u8; 4],
    pub top: [u8; 4],
    pub flags: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct RawNode {
    pub kind: u8,
    pub split: [f64; 4],
    pub front: u32,
    pub back: u32,
    pub sector: u16,
}

/*=======================================================================*/
/*                          Raw ↔ world helpers                          */
/*=======================================================================*/

fn rgba(c: [u8; 4]) -> Rgba {
    Rgba::new(c[0], c[1], c[2], c[3])
}

fn channels(c: Rgba) -> [u8; 4] {
    [c.r, c.g, c.b, c.a]
}

fn child(raw: u32) -> Option<NodeId> {
    (raw != NO_CHILD).then_some(raw)
}

impl From<&Camera> for RawSpawn {
    fn from(c: &Camera) -> Self {
        Self {
            x: c.pos().x,
            y: c.pos().y,
            direction: c.direction(),
        }
    }
}

impl From<RawSpawn> for Camera {
    fn from(r: RawSpawn) -> Self {
        Camera::new(r.x, r.y, r.direction)
    }
}

impl From<&Wall> for RawWall {
    fn from(w: &Wall) -> Self {
        let Segment { a, b } = w.line;
        Self {
            line: [a.x, a.y, b.x, b.y],
            floor_height: w.floor_height,
            ceiling_height: w.ceiling_height,
            floor_slope: w.floor_slope,
            ceiling_slope: w.ceiling_slope,
            bottom: channels(w.bottom),
            middle: channels(w.middle),
            top: channels(w.top),
            flags: w.flags.bits(),
        }
    }
}

impl From<RawWall> for Wall {
    fn from(r: RawWall) -> Self {
        let [x1, y1, x2, y2] = r.line;
        Wall {
            line: Segment::new(x1, y1, x2, y2),
            floor_height: r.floor_height,
            ceiling_height: r.ceiling_height,
            floor_slope: r.floor_slope,
            ceiling_slope: r.ceiling_slope,
            bottom: rgba(r.bottom),
            middle: rgba(r.middle),
            top: rgba(r.top),
            flags: WallFlags::from_bits_truncate(r.flags),
        }
    }
}

impl From<&BspNode> for RawNode {
    fn from(n: &BspNode) -> Self {
        match *n {
            BspNode::Internal { split, front, back } => Self {
                kind: KIND_INTERNAL,
                split: [split.a.x, split.a.y, split.b.x, split.b.y],
                front: front.unwrap_or(NO_CHILD),
                back: back.unwrap_or(NO_CHILD),
                sector: 0,
            },
            BspNode::Leaf { sector } => Self {
                kind: KIND_LEAF,
                split: [0.0; 4],
                front: NO_CHILD,
                back: NO_CHILD,
                sector,
            },
        }
    }
}

fn node_from(index: usize, r: RawNode) -> Result<BspNode, MapError> {
    match r.kind {
        KIND_INTERNAL => {
            let [x1, y1, x2, y2] = r.split;
            Ok(BspNode::Internal {
                split: Segment::new(x1, y1, x2, y2),
                front: child(r.front),
                back: child(r.back),
            })
        }
        KIND_LEAF => Ok(BspNode::Leaf { sector: r.sector }),
        kind => Err(MapError::NodeKind { index, kind }),
    }
}

/*=======================================================================*/
/*                               Decoding                                */
/*=======================================================================*/

/// Decode one record off the front of `bytes`.
fn decode<T: Decode<()>>(bytes: &mut &[u8], what: &'static str) -> Result<T, MapError> {
    let rest: &[u8] = *bytes;
    let (val, read) =
        decode_from_slice::<T, _>(rest, decode_cfg()).map_err(|source| MapError::Record { what, source })?;
    *bytes = &rest[read..];
    Ok(val)
}

/// Parse and validate an RCAL image.
pub fn from_bytes(bytes: &[u8]) -> Result<Level, MapError> {
    let mut cur = bytes;

    /*----------- 1. header ------------------------------------------*/
    let mut magic = [0u8; 4];
    cur.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(MapError::BadMagic);
    }
    let version = cur.read_u16::<LE>()?;
    if version != VERSION {
        return Err(MapError::Version(version));
    }
    let name_len = cur.read_u16::<LE>()? as usize;
    let sector_count = cur.read_u32::<LE>()? as usize;
    let wall_count = cur.read_u32::<LE>()? as usize;
    let node_count = cur.read_u32::<LE>()? as usize;

    let mut name = vec![0u8; name_len];
    cur.read_exact(&mut name)?;
    let name = String::from_utf8(name).map_err(|_| MapError::BadName)?;

    /*----------- 2. records -----------------------------------------*/
    let mut level = Level::new(name);
    level.spawn = decode::<RawSpawn>(&mut cur, "spawn")?.into();

    let mut walls_seen = 0usize;
    for _ in 0..sector_count {
        let raw: RawSector = decode(&mut cur, "sector")?;
        let mut sector = Sector::new(raw.name);
        for _ in 0..raw.wall_count {
            sector.append_wall(decode::<RawWall>(&mut cur, "wall")?.into());
        }
        walls_seen += raw.wall_count as usize;
        level.add_sector(sector);
    }
    if walls_seen != wall_count {
        return Err(MapError::WallCount {
            expected: wall_count,
            found: walls_seen,
        });
    }

    if node_count > 0 {
        let nodes = (0..node_count)
            .map(|i| node_from(i, decode(&mut cur, "node")?))
            .collect::<Result<Vec<_>, _>>()?;
        level.bsp = Some(BspTree::from_nodes(nodes));
    }

    if !cur.is_empty() {
        return Err(MapError::TrailingBytes(cur.len()));
    }

    level.validate()?;
    Ok(level)
}

/*=======================================================================*/
/*                               Encoding                                */
/*=======================================================================*/

/// Serialise `level` to an RCAL image.
pub fn to_bytes(level: &Level) -> Result<Vec<u8>, MapError> {
    let name = level.name.as_bytes();
    let name_len = u16::try_from(name.len()).map_err(|_| MapError::NameTooLong(name.len()))?;
    let nodes = level.bsp.as_ref().map_or(&[][..], BspTree::nodes);

    let mut out = Vec::new();
    out.write_all(MAGIC)?;
    out.write_u16::<LE>(VERSION)?;
    out.write_u16::<LE>(name_len)?;
    out.write_u32::<LE>(level.sectors.len() as u32)?;
    out.write_u32::<LE>(level.wall_count() as u32)?;
    out.write_u32::<LE>(nodes.len() as u32)?;
    out.write_all(name)?;

    encode_into_std_write(RawSpawn::from(&level.spawn), &mut out, cfg())?;
    for sector in &level.sectors {
        let raw = RawSector {
            name: sector.name.clone(),
            wall_count: sector.len() as u32,
        };
        encode_into_std_write(raw, &mut out, cfg())?;
        for wall in sector.walls() {
            encode_into_std_write(RawWall::from(wall), &mut out, cfg())?;
        }
    }
    for node in nodes {
        encode_into_std_write(RawNode::from(node), &mut out, cfg())?;
    }
    Ok(out)
}

/*=======================================================================*/
/*                                Tests                                  */
/*=======================================================================*/
