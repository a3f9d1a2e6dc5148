use bitflags::bitflags;
use thiserror::Error;

use crate::world::geometry::Segment;

/// Legacy marker: a bottom colour whose red channel equals this value asked
/// for a sloped floor.  Only the level loaders look at it.
pub const LEGACY_SLOPE_RED: u8 = 200;

/*--------------------------- colours --------------------------------*/

/// 8-bit RGBA colour.  `a == 0` means "nothing drawn here".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    #[inline]
    pub const fn is_visible(self) -> bool {
        self.a != 0
    }

    /// Add `offset` to every colour channel, saturating.  Alpha is kept.
    pub fn shaded(self, offset: i16) -> Self {
        let ch = |c: u8| (c as i16).saturating_add(offset).clamp(0, 255) as u8;
        Self::new(ch(self.r), ch(self.g), ch(self.b), self.a)
    }

    /// Pack as 0xAARRGGBB.
    #[inline]
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    #[inline]
    pub const fn from_argb(px: u32) -> Self {
        Self::new((px >> 16) as u8, (px >> 8) as u8, px as u8, (px >> 24) as u8)
    }
}

/*----------------------------- walls --------------------------------*/

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct WallFlags: u16 {
        /// Bottom extent follows `floor_slope` along the wall.
        const SLOPED_FLOOR   = 0x0001;
        /// Top extent follows `ceiling_slope` along the wall.
        const SLOPED_CEILING = 0x0002;
    }
}

/// One renderable wall segment.
///
/// Heights are percentages of the projected wall height: `floor_height`
/// shrinks the middle band up from the bottom edge, `ceiling_height` shrinks
/// it down from the top edge.  Slopes add `slope × t` to those percentages,
/// `t` running 0 → 1 from `line.a` to `line.b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wall {
    pub line: Segment,
    pub floor_height: f64,
    pub ceiling_height: f64,
    pub floor_slope: f64,
    pub ceiling_slope: f64,
    pub bottom: Rgba,
    pub middle: Rgba,
    pub top: Rgba,
    pub flags: WallFlags,
}

impl Wall {
    /// Zero-length wall used as the sector list head.
    pub const SENTINEL: Wall = Wall {
        line: Segment::new(0.0, 0.0, 0.0, 0.0),
        floor_height: 0.0,
        ceiling_height: 0.0,
        floor_slope: 0.0,
        ceiling_slope: 0.0,
        bottom: Rgba::TRANSPARENT,
        middle: Rgba::TRANSPARENT,
        top: Rgba::TRANSPARENT,
        flags: WallFlags::empty(),
    };

    /// Opaque white wall with flat floor and ceiling.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            line: Segment::new(x1, y1, x2, y2),
            bottom: Rgba::WHITE,
            middle: Rgba::WHITE,
            top: Rgba::WHITE,
            ..Self::SENTINEL
        }
    }

    pub fn with_heights(mut self, floor: f64, ceiling: f64) -> Self {
        self.floor_height = floor;
        self.ceiling_height = ceiling;
        self
    }

    pub fn with_colours(mut self, bottom: Rgba, middle: Rgba, top: Rgba) -> Self {
        self.bottom = bottom;
        self.middle = middle;
        self.top = top;
        self
    }

    pub fn with_floor_slope(mut self, slope: f64) -> Self {
        self.floor_slope = slope;
        self.flags.insert(WallFlags::SLOPED_FLOOR);
        self
    }

    pub fn with_ceiling_slope(mut self, slope: f64) -> Self {
        self.ceiling_slope = slope;
        self.flags.insert(WallFlags::SLOPED_CEILING);
        self
    }

    /// Convert the old "red channel 200" bottom-colour marker into
    /// [`WallFlags::SLOPED_FLOOR`].  Returns true when the flag was set.
    pub fn adopt_legacy_slope_marker(&mut self) -> bool {
        if self.bottom.r == LEGACY_SLOPE_RED {
            self.flags.insert(WallFlags::SLOPED_FLOOR);
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn has_floor_slope(&self) -> bool {
        self.flags.contains(WallFlags::SLOPED_FLOOR)
    }

    #[inline]
    pub fn has_ceiling_slope(&self) -> bool {
        self.flags.contains(WallFlags::SLOPED_CEILING)
    }

    /// Floor percentage at fraction `t` along the wall.
    pub fn floor_at(&self, t: f64) -> f64 {
        if self.has_floor_slope() {
            self.floor_height + self.floor_slope * t
        } else {
            self.floor_height
        }
    }

    /// Ceiling percentage at fraction `t` along the wall.
    pub fn ceiling_at(&self, t: f64) -> f64 {
        if self.has_ceiling_slope() {
            self.ceiling_height + self.ceiling_slope * t
        } else {
            self.ceiling_height
        }
    }

    /// Transparent middle band: farther geometry shows through it.
    #[inline]
    pub fn is_open(&self) -> bool {
        !self.middle.is_visible()
    }
}

/*---------------------------- sectors -------------------------------*/

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SectorError {
    #[error("cursor position {pos} out of range (sector holds {len} walls)")]
    CursorOutOfRange { pos: usize, len: usize },
}

/// Ordered wall list with an editing cursor.
///
/// Slot 0 is a permanent zero-length sentinel; real walls live in slots
/// `1..`.  The cursor is a slot index: `0` means "before the first wall".
#[derive(Clone, Debug)]
pub struct Sector {
    pub name: String,
    slots: Vec<Wall>,
    cursor: usize,
}

impl Default for Sector {
    fn default() -> Self {
        Self::new("")
    }
}

impl Sector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: vec![Wall::SENTINEL],
            cursor: 0,
        }
    }

    /// Build a sector by appending `walls` in order.
    pub fn with_walls(name: impl Into<String>, walls: impl IntoIterator<Item = Wall>) -> Self {
        let mut s = Self::new(name);
        for w in walls {
            s.append_wall(w);
        }
        s
    }

    /// Insert after the cursor and move the cursor onto the new wall.
    pub fn append_wall(&mut self, wall: Wall) {
        self.cursor += 1;
        self.slots.insert(self.cursor, wall);
    }

    /// Remove the wall under the cursor; the cursor falls back to its
    /// predecessor.  No-op on the sentinel.
    pub fn remove_wall(&mut self) -> Option<Wall> {
        if self.cursor == 0 {
            return None;
        }
        let removed = self.slots.remove(self.cursor);
        self.cursor -= 1;
        Some(removed)
    }

    /// Walls in list order, skipping the sentinel.  Restartable: every call
    /// starts from the first real wall.
    #[inline]
    pub fn walls(&self) -> impl ExactSizeIterator<Item = &Wall> + Clone + '_ {
        self.slots[1..].iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Wall under the cursor, `None` on the sentinel.
    pub fn current(&self) -> Option<&Wall> {
        (self.cursor != 0).then(|| &self.slots[self.cursor])
    }

    pub fn current_mut(&mut self) -> Option<&mut Wall> {
        if self.cursor == 0 {
            None
        } else {
            Some(&mut self.slots[self.cursor])
        }
    }

    /// Place the cursor on slot `pos` (0 = sentinel, `len()` = last wall).
    pub fn seek(&mut self, pos: usize) -> Result<(), SectorError> {
        if pos > self.len() {
            return Err(SectorError::CursorOutOfRange {
                pos,
                len: self.len(),
            });
        }
        self.cursor = pos;
        Ok(())
    }

    /// Cursor back to the sentinel.
    #[inline]
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Release every wall; the sentinel stays.
    pub fn clear(&mut self) {
        self.slots.truncate(1);
        self.cursor = 0;
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn wall(i: f64) -> Wall {
        Wall::new(i, 0.0, i + 1.0, 0.0)
    }

    #[test]
    fn new_sector_is_empty_with_sentinel_cursor() {
        let s = Sector::new("a");
        assert!(s.is_empty());
        assert_eq!(s.cursor(), 0);
        assert!(s.current().is_none());
        assert_eq!(s.walls().count(), 0);
    }

    #[test]
    fn append_inserts_after_cursor() {
        let mut s = Sector::new("a");
        s.append_wall(wall(0.0));
        s.append_wall(wall(2.0));
        s.seek(1).unwrap();
        s.append_wall(wall(1.0));
        assert_eq!(s.cursor(), 2);

        let xs: Vec<f64> = s.walls().map(|w| w.line.a.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn append_then_remove_restores_state() {
        let mut s = Sector::with_walls("a", [wall(0.0), wall(1.0), wall(2.0)]);
        s.seek(2).unwrap();
        let before = (s.len(), s.cursor());

        s.append_wall(wall(9.0));
        assert_eq!(s.len(), before.0 + 1);
        let removed = s.remove_wall().unwrap();
        assert_eq!(removed.line.a.x, 9.0);

        assert_eq!((s.len(), s.cursor()), before);
        let xs: Vec<f64> = s.walls().map(|w| w.line.a.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn sentinel_is_never_removed() {
        let mut s = Sector::with_walls("a", [wall(0.0)]);
        assert!(s.remove_wall().is_some());
        assert_eq!(s.cursor(), 0);
        assert!(s.remove_wall().is_none());
        assert!(s.remove_wall().is_none());
        assert!(s.is_empty());
    }

    #[test]
    fn seek_rejects_out_of_range() {
        let mut s = Sector::with_walls("a", [wall(0.0)]);
        assert_eq!(
            s.seek(2),
            Err(SectorError::CursorOutOfRange { pos: 2, len: 1 })
        );
        assert!(s.seek(1).is_ok());
        assert_eq!(s.current().map(|w| w.line.a.x), Some(0.0));
    }

    #[test]
    fn walls_iteration_is_restartable() {
        let s = Sector::with_walls("a", [wall(0.0), wall(1.0)]);
        let it = s.walls();
        assert_eq!(it.clone().count(), 2);
        assert_eq!(it.count(), 2);
        assert_eq!(s.walls().next().map(|w| w.line.a.x), Some(0.0));
    }

    #[test]
    fn clear_keeps_sentinel() {
        let mut s = Sector::with_walls("a", [wall(0.0), wall(1.0)]);
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.cursor(), 0);
        s.append_wall(wall(5.0));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn legacy_marker_becomes_flag() {
        let mut w = Wall::new(0.0, 0.0, 1.0, 0.0).with_colours(
            Rgba::opaque(LEGACY_SLOPE_RED, 0, 0),
            Rgba::WHITE,
            Rgba::WHITE,
        );
        assert!(!w.has_floor_slope());
        assert!(w.adopt_legacy_slope_marker());
        assert!(w.has_floor_slope());
        assert!(!Wall::new(0.0, 0.0, 1.0, 0.0).adopt_legacy_slope_marker());
    }

    #[test]
    fn slopes_interpolate_heights() {
        let w = Wall::new(0.0, 0.0, 10.0, 0.0)
            .with_heights(10.0, 20.0)
            .with_floor_slope(40.0);
        assert_eq!(w.floor_at(0.0), 10.0);
        assert_eq!(w.floor_at(0.5), 30.0);
        assert_eq!(w.ceiling_at(0.5), 20.0);

        let flat = Wall::new(0.0, 0.0, 10.0, 0.0).with_heights(10.0, 0.0);
        assert_eq!(flat.floor_at(1.0), 10.0);
    }

    #[test]
    fn colour_helpers() {
        let c = Rgba::new(250, 10, 128, 77);
        assert_eq!(c.shaded(10), Rgba::new(255, 20, 138, 77));
        assert_eq!(c.shaded(-20), Rgba::new(230, 0, 108, 77));
        assert_eq!(Rgba::from_argb(c.to_argb()), c);
        assert!(!Rgba::TRANSPARENT.is_visible());
    }
}
