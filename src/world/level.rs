use glam::{DVec2, dvec2};
use log::info;
use thiserror::Error;

use crate::world::{
    bsp::{Branch, BspError, BspTree, SectorId},
    camera::Camera,
    geometry::Segment,
    sector::{Rgba, Sector, Wall},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error(transparent)]
    Bsp(#[from] BspError),

    #[error("level has no sectors")]
    NoSectors,

    #[error("too many sectors ({0}); ids are 16-bit")]
    TooManySectors(usize),
}

/// Everything the renderer needs for one map: sectors, the optional BSP over
/// them, and where the viewer starts.
#[derive(Clone, Debug, Default)]
pub struct Level {
    pub name: String,
    pub sectors: Vec<Sector>,
    pub bsp: Option<BspTree>,
    pub spawn: Camera,
}

/// Axis-aligned bounds of all wall endpoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Level {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Store `sector` and return its id.
    pub fn add_sector(&mut self, sector: Sector) -> SectorId {
        self.sectors.push(sector);
        (self.sectors.len() - 1) as SectorId
    }

    #[inline]
    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.sectors.get(id as usize)
    }

    #[inline]
    pub fn sector_mut(&mut self, id: SectorId) -> Option<&mut Sector> {
        self.sectors.get_mut(id as usize)
    }

    pub fn sector_id(&self, name: &str) -> Option<SectorId> {
        self.sectors
            .iter()
            .position(|s| s.name == name)
            .map(|i| i as SectorId)
    }

    /// Every wall of every sector, sector by sector.
    pub fn walls(&self) -> impl Iterator<Item = &Wall> + Clone + '_ {
        self.sectors.iter().flat_map(|s| s.walls())
    }

    pub fn wall_count(&self) -> usize {
        self.sectors.iter().map(Sector::len).sum()
    }

    /// `None` for a level without walls.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut it = self.walls().flat_map(|w| [w.line.a, w.line.b]);
        let first = it.next()?;
        let (min, max) = it.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Bounds { min, max })
    }

    /// One-time load check: sector ids fit, the BSP is a proper tree and
    /// every leaf points at an existing sector.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.sectors.is_empty() {
            return Err(LevelError::NoSectors);
        }
        if self.sectors.len() > SectorId::MAX as usize + 1 {
            return Err(LevelError::TooManySectors(self.sectors.len()));
        }
        if let Some(bsp) = &self.bsp {
            bsp.validate(self.sectors.len())?;
        }

        info!(
            "level `{}`: {} sectors, {} walls, {} bsp nodes",
            self.name,
            self.sectors.len(),
            self.wall_count(),
            self.bsp.as_ref().map_or(0, BspTree::len)
        );
        Ok(())
    }

    /// Built-in twelve-sector map: two rooms (x 300‥640 and 640‥800) joined
    /// by a sunken green corridor between y = 225 and y = 275.
    pub fn demo() -> Self {
        let white = Rgba::WHITE;
        let grey = Rgba::opaque(100, 100, 100);
        let green = Rgba::opaque(0, 255, 0);
        let dark_green = Rgba::opaque(0, 100, 0);

        let wall = |x1, y1, x2, y2, floor: f64, c: Rgba| {
            Wall::new(x1, y1, x2, y2)
                .with_heights(floor, 0.0)
                .with_colours(c.shaded(-40), c, c.shaded(-40))
        };

        let mut lvl = Level::new("demo");
        let mut add = |name: &str, walls: Vec<Wall>| lvl.add_sector(Sector::with_walls(name, walls));

        let s1 = add(
            "sector_1",
            vec![
                wall(300.0, 200.0, 600.0, 200.0, 0.0, white),
                wall(300.0, 200.0, 300.0, 225.0, 0.0, grey),
            ],
        );
        let s2 = add("sector_2", vec![wall(600.0, 200.0, 640.0, 200.0, 0.0, white)]);
        let s3 = add("sector_3", vec![wall(600.0, 225.0, 640.0, 225.0, -55.0, green)]);
        let s4 = add("sector_4", vec![wall(300.0, 225.0, 300.0, 275.0, 0.0, grey)]);
        let s5 = add("sector_5", vec![wall(600.0, 225.0, 600.0, 275.0, -55.0, dark_green)]);
        let s6 = add(
            "sector_6",
            vec![
                wall(300.0, 275.0, 300.0, 400.0, 0.0, grey),
                wall(300.0, 400.0, 600.0, 400.0, 0.0, white),
            ],
        );
        let s7 = add("sector_7", vec![wall(600.0, 275.0, 640.0, 275.0, -55.0, green)]);
        let s8 = add("sector_8", vec![wall(600.0, 400.0, 640.0, 400.0, 0.0, white)]);
        let s9 = add(
            "sector_9",
            vec![
                wall(640.0, 200.0, 800.0, 200.0, 0.0, white),
                wall(800.0, 200.0, 800.0, 225.0, 0.0, grey),
            ],
        );
        let s10 = add("sector_10", vec![wall(640.0, 225.0, 640.0, 275.0, -55.0, dark_green)]);
        let s11 = add("sector_11", vec![wall(800.0, 225.0, 800.0, 275.0, 0.0, grey)]);
        let s12 = add(
            "sector_12",
            vec![
                wall(800.0, 275.0, 800.0, 400.0, 0.0, grey),
                wall(640.0, 400.0, 800.0, 400.0, 0.0, white),
            ],
        );

        let h = |y| Segment::new(0.0, y, 1219.0, y);
        let v = |x| Segment::new(x, 0.0, x, 719.0);

        lvl.bsp = Some(
            demo_tree(h, v, [s1, s2, s3, s4, s5, s6, s7, s8, s9, s10, s11, s12])
                .expect("demo tree is well-formed"),
        );
        lvl.spawn = Camera::new(640.0, 310.0, 270.0);
        lvl
    }
}

fn demo_tree(
    h: impl Fn(f64) -> Segment,
    v: impl Fn(f64) -> Segment,
    s: [SectorId; 12],
) -> Result<BspTree, BspError> {
    use Branch::{Back, Front};

    let mut t = BspTree::new(v(640.0));

    let f = t.add_split(0, Front, h(275.0))?;
    t.add_leaf(f, Front, s[11])?;
    let fb = t.add_split(f, Back, h(225.0))?;
    t.add_leaf(fb, Back, s[8])?;
    let fbf = t.add_split(fb, Front, v(700.0))?;
    t.add_leaf(fbf, Back, s[9])?;
    t.add_leaf(fbf, Front, s[10])?;

    let b = t.add_split(0, Back, h(275.0))?;
    let bf = t.add_split(b, Front, v(600.0))?;
    t.add_leaf(bf, Back, s[5])?;
    let bff = t.add_split(bf, Front, h(300.0))?;
    t.add_leaf(bff, Back, s[6])?;
    t.add_leaf(bff, Front, s[7])?;
    let bb = t.add_split(b, Back, h(225.0))?;
    let bbf = t.add_split(bb, Front, v(400.0))?;
    t.add_leaf(bbf, Back, s[3])?;
    t.add_leaf(bbf, Front, s[4])?;
    let bbb = t.add_split(bb, Back, v(600.0))?;
    t.add_leaf(bbb, Back, s[0])?;
    let bbbf = t.add_split(bbb, Front, h(210.0))?;
    t.add_leaf(bbbf, Back, s[1])?;
    t.add_leaf(bbbf, Front, s[2])?;

    Ok(t)
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_level_is_valid() {
        let lvl = Level::demo();
        assert_eq!(lvl.sectors.len(), 12);
        assert_eq!(lvl.wall_count(), 16);
        assert!(lvl.validate().is_ok());
        assert_eq!(lvl.spawn, Camera::new(640.0, 310.0, 270.0));

        let b = lvl.bounds().unwrap();
        assert_eq!(b.min, dvec2(300.0, 200.0));
        assert_eq!(b.max, dvec2(800.0, 400.0));
    }

    #[test]
    fn demo_tree_visits_every_sector_once() {
        let lvl = Level::demo();
        let bsp = lvl.bsp.as_ref().unwrap();
        let mut order = Vec::new();
        bsp.fill_draw_order(lvl.spawn.pos(), &mut order);
        order.sort_unstable();
        assert_eq!(order, (0..12).collect::<Vec<SectorId>>());
    }

    #[test]
    fn validate_reports_problems() {
        assert_eq!(Level::new("x").validate(), Err(LevelError::NoSectors));

        let mut lvl = Level::new("x");
        lvl.add_sector(Sector::new("a"));
        lvl.bsp = Some(BspTree::single(4));
        assert_eq!(
            lvl.validate(),
            Err(LevelError::Bsp(BspError::DanglingSector { node: 0, sector: 4 }))
        );
    }

    #[test]
    fn sector_lookup_by_name() {
        let lvl = Level::demo();
        assert_eq!(lvl.sector_id("sector_3"), Some(2));
        assert_eq!(lvl.sector_id("nope"), None);
        assert_eq!(lvl.sector(2).map(Sector::len), Some(1));
    }
}
