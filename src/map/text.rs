//! # `.lvl` text levels
//!
//! One command per line, `//` starts a comment:
//!
//! ```text
//! level  demo
//! spawn  640 310 270
//! sector hall
//! wall   300 200 600 200 floor=-55 bottom=#D7D7D7FF middle=#FFFFFFFF top=#D7D7D7FF
//! split  root 640 0 640 719
//! split  root.front 0 275 1219 275
//! leaf   root.back hall
//! ```
//!
//! * `wall` attributes: `floor=`, `ceil=`, `floor_slope=`, `ceil_slope=`,
//!   `bottom=` / `middle=` / `top=` as `#RRGGBBAA`, and the flags `sloped`
//!   `flat` and `ceil_sloped`.  Walls belong to the last `sector` line.
//! * Names with spaces (or empty ones) are written in double quotes.
//! * Node paths start at `root` and descend with `.front` / `.back`; a
//!   parent must be declared before its children.  Leaves name a sector.
//! * A bottom colour with red = 200 also switches the sloped floor on,
//!   unless the line says `sloped` or `flat` itself.

use std::{collections::HashMap, fmt};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    map::MapError,
    world::{
        Branch, BspNode, BspTree, Camera, Level, NodeId, Rgba, Sector, SectorId, Segment, Wall,
        LEGACY_SLOPE_RED, WallFlags,
    },
};

const NUM: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)";
const PATH: &str = r"root(?:\.(?:front|back))*";
const NAME: &str = r#""[^"]*"|\S+"#;

static LEVEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"^level\s+({NAME})$")).unwrap());
static SECTOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^sector\s+({NAME})$")).unwrap());
static SPAWN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^spawn\s+({NUM})\s+({NUM})\s+({NUM})$")).unwrap());
static WALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^wall\s+({NUM})\s+({NUM})\s+({NUM})\s+({NUM})((?:\s+\S+)*)$"
    ))
    .unwrap()
});
static SPLIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^split\s+({PATH})\s+({NUM})\s+({NUM})\s+({NUM})\s+({NUM})$"
    ))
    .unwrap()
});
static LEAF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^leaf\s+({PATH})\s+({NAME})$")).unwrap());
static NUM_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(floor|ceil|floor_slope|ceil_slope)=({NUM})$")).unwrap()
});
static COLOUR_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(bottom|middle|top)=#([0-9A-Fa-f]{8})$").unwrap());

/*=======================================================================*/
/*                                Parser                                 */
/*=======================================================================*/

fn syntax(line: usize, msg: impl Into<String>) -> MapError {
    MapError::Syntax {
        line,
        msg: msg.into(),
    }
}

fn num(line: usize, s: &str) -> Result<f64, MapError> {
    s.parse()
        .map_err(|_| syntax(line, format!("bad number `{s}`")))
}

fn colour(line: usize, hex: &str) -> Result<Rgba, MapError> {
    let v = u32::from_str_radix(hex, 16).map_err(|_| syntax(line, format!("bad colour `{hex}`")))?;
    let [r, g, b, a] = v.to_be_bytes();
    Ok(Rgba::new(r, g, b, a))
}

/// Strip the quotes a name may carry in the file.
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(s)
}

#[derive(Default)]
struct Parser {
    level: Level,
    current: Option<SectorId>,
    tree: Option<BspTree>,
    paths: HashMap<String, NodeId>,
}

impl Parser {
    fn line(&mut self, n: usize, line: &str) -> Result<(), MapError> {
        let cmd = line.split_whitespace().next().unwrap_or_default();
        let malformed = || syntax(n, format!("malformed `{cmd}` line"));

        match cmd {
            "level" => {
                let c = LEVEL_RE.captures(line).ok_or_else(malformed)?;
                self.level.name = unquote(&c[1]).to_owned();
            }
            "spawn" => {
                let c = SPAWN_RE.captures(line).ok_or_else(malformed)?;
                self.level.spawn = Camera::new(num(n, &c[1])?, num(n, &c[2])?, num(n, &c[3])?);
            }
            "sector" => {
                let c = SECTOR_RE.captures(line).ok_or_else(malformed)?;
                let name = unquote(&c[1]);
                if self.level.sector_id(name).is_some() {
                    return Err(syntax(n, format!("sector `{name}` defined twice")));
                }
                self.current = Some(self.level.add_sector(Sector::new(name)));
            }
            "wall" => {
                let c = WALL_RE.captures(line).ok_or_else(malformed)?;
                let id = self
                    .current
                    .ok_or_else(|| syntax(n, "`wall` before any `sector`"))?;
                let mut wall = Wall::new(
                    num(n, &c[1])?,
                    num(n, &c[2])?,
                    num(n, &c[3])?,
                    num(n, &c[4])?,
                );
                let mut explicit_floor = false;
                for tok in c[5].split_whitespace() {
                    explicit_floor |= Self::attribute(n, &mut wall, tok)?;
                }
                // `sloped` / `flat` override the legacy red-200 marker
                if !explicit_floor && wall.adopt_legacy_slope_marker() {
                    debug!("line {n}: bottom red 200, treating wall as sloped");
                }
                if let Some(sector) = self.level.sector_mut(id) {
                    sector.append_wall(wall);
                }
            }
            "split" => {
                let c = SPLIT_RE.captures(line).ok_or_else(malformed)?;
                let split = Segment::new(
                    num(n, &c[2])?,
                    num(n, &c[3])?,
                    num(n, &c[4])?,
                    num(n, &c[5])?,
                );
                self.node(n, &c[1], BspNode::Internal {
                    split,
                    front: None,
                    back: None,
                })?;
            }
            "leaf" => {
                let c = LEAF_RE.captures(line).ok_or_else(malformed)?;
                let name = unquote(&c[2]);
                let sector = self
                    .level
                    .sector_id(name)
                    .ok_or_else(|| syntax(n, format!("unknown sector `{name}`")))?;
                self.node(n, &c[1], BspNode::Leaf { sector })?;
            }
            _ => return Err(syntax(n, format!("unknown command `{cmd}`"))),
        }
        Ok(())
    }

    /// Apply one wall attribute.  Returns true for the tokens that fix the
    /// floor slope flag explicitly.
    fn attribute(n: usize, wall: &mut Wall, tok: &str) -> Result<bool, MapError> {
        if let Some(c) = NUM_ATTR_RE.captures(tok) {
            let v = num(n, &c[2])?;
            match &c[1] {
                "floor" => wall.floor_height = v,
                "ceil" => wall.ceiling_height = v,
                "floor_slope" => wall.floor_slope = v,
                _ => wall.ceiling_slope = v,
            }
        } else if let Some(c) = COLOUR_ATTR_RE.captures(tok) {
            let v = colour(n, &c[2])?;
            match &c[1] {
                "bottom" => wall.bottom = v,
                "middle" => wall.middle = v,
                _ => wall.top = v,
            }
        } else {
            match tok {
                "sloped" => wall.flags.insert(WallFlags::SLOPED_FLOOR),
                "flat" => wall.flags.remove(WallFlags::SLOPED_FLOOR),
                "ceil_sloped" => wall.flags.insert(WallFlags::SLOPED_CEILING),
                _ => return Err(syntax(n, format!("unknown wall attribute `{tok}`"))),
            }
            return Ok(tok != "ceil_sloped");
        }
        Ok(false)
    }

    fn node(&mut self, n: usize, path: &str, node: BspNode) -> Result<(), MapError> {
        let Some((parent, branch)) = path.rsplit_once('.') else {
            // the root
            if self.tree.is_some() {
                return Err(syntax(n, "`root` declared twice"));
            }
            self.tree = Some(BspTree::from_nodes(vec![node]));
            self.paths.insert(path.to_owned(), 0);
            return Ok(());
        };

        let branch = if branch == "front" {
            Branch::Front
        } else {
            Branch::Back
        };
        let (Some(tree), Some(&pid)) = (self.tree.as_mut(), self.paths.get(parent)) else {
            return Err(syntax(n, format!("parent node `{parent}` not declared")));
        };
        let id = match node {
            BspNode::Internal { split, .. } => tree.add_split(pid, branch, split),
            BspNode::Leaf { sector } => tree.add_leaf(pid, branch, sector),
        }
        .map_err(|source| MapError::Tree { line: n, source })?;
        self.paths.insert(path.to_owned(), id);
        Ok(())
    }
}

/// Parse and validate a text level.
pub fn parse(src: &str) -> Result<Level, MapError> {
    let mut p = Parser::default();
    for (i, raw) in src.lines().enumerate() {
        let line = raw.split("//").next().unwrap_or_default().trim();
        if !line.is_empty() {
            p.line(i + 1, line)?;
        }
    }
    p.level.bsp = p.tree;
    p.level.validate()?;
    Ok(p.level)
}

/*=======================================================================*/
/*                                Writer                                 */
/*=======================================================================*/

/// `Display` adaptor producing the text form of a level.  Use [`to_text`]
/// unless the names are known to be writable.
pub struct TextLevel<'a>(pub &'a Level);

/// A level or sector name as it appears in the file.
struct Name<'a>(&'a str);

impl fmt::Display for Name<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;
        if n.is_empty() || n.starts_with('"') || n.chars().any(char::is_whitespace) {
            write!(f, "\"{n}\"")
        } else {
            f.write_str(n)
        }
    }
}

/// Names the line format cannot carry, even quoted.
fn writable(name: &str) -> bool {
    !name.contains('"') && !name.contains("//") && !name.chars().any(char::is_control)
}

/// Text form of `level`, refusing names that would not parse back.
pub fn to_text(level: &Level) -> Result<String, MapError> {
    let mut names = std::iter::once(&level.name).chain(level.sectors.iter().map(|s| &s.name));
    if let Some(bad) = names.find(|n| !writable(n)) {
        return Err(MapError::UnwritableName(bad.clone()));
    }
    Ok(TextLevel(level).to_string())
}

fn hex(c: Rgba) -> String {
    format!("#{:02X}{:02X}{:02X}{:02X}", c.r, c.g, c.b, c.a)
}

fn write_wall(f: &mut fmt::Formatter<'_>, w: &Wall) -> fmt::Result {
    let (a, b) = (w.line.a, w.line.b);
    write!(f, "wall {} {} {} {}", a.x, a.y, b.x, b.y)?;
    write!(f, " floor={} ceil={}", w.floor_height, w.ceiling_height)?;
    if w.floor_slope != 0.0 {
        write!(f, " floor_slope={}", w.floor_slope)?;
    }
    if w.ceiling_slope != 0.0 {
        write!(f, " ceil_slope={}", w.ceiling_slope)?;
    }
    write!(f, " bottom={} middle={} top={}", hex(w.bottom), hex(w.middle), hex(w.top))?;
    if w.has_floor_slope() {
        f.write_str(" sloped")?;
    } else if w.bottom.r == LEGACY_SLOPE_RED {
        f.write_str(" flat")?;
    }
    if w.has_ceiling_slope() {
        f.write_str(" ceil_sloped")?;
    }
    writeln!(f)
}

impl TextLevel<'_> {
    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        tree: &BspTree,
        id: NodeId,
        path: &str,
    ) -> fmt::Result {
        match tree.node(id) {
            Some(BspNode::Internal { split, front, back }) => {
                let (a, b) = (split.a, split.b);
                writeln!(f, "split {path} {} {} {} {}", a.x, a.y, b.x, b.y)?;
                if let Some(c) = front {
                    self.write_node(f, tree, *c, &format!("{path}.front"))?;
                }
                if let Some(c) = back {
                    self.write_node(f, tree, *c, &format!("{path}.back"))?;
                }
                Ok(())
            }
            Some(BspNode::Leaf { sector }) => match self.0.sector(*sector) {
                Some(s) => writeln!(f, "leaf {path} {}", Name(&s.name)),
                None => writeln!(f, "// leaf {path}: missing sector {sector}"),
            },
            None => Ok(()),
        }
    }
}

impl fmt::Display for TextLevel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lvl = self.0;
        writeln!(f, "level {}", Name(&lvl.name))?;
        let spawn = lvl.spawn;
        writeln!(f, "spawn {} {} {}", spawn.pos().x, spawn.pos().y, spawn.direction())?;

        for sector in &lvl.sectors {
            writeln!(f)?;
            writeln!(f, "sector {}", Name(&sector.name))?;
            for w in sector.walls() {
                write_wall(f, w)?;
            }
        }

        if let Some(tree) = &lvl.bsp {
            writeln!(f)?;
            if let Some(root) = tree.root() {
                self.write_node(f, tree, root, "root")?;
            }
        }
        Ok(())
    }
}

/*=======================================================================*/
/*                                Tests                                  */
/*=======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    const TWO_ROOMS: &str = "
        // two halves split at x = 100
        level halves
        spawn 150 0 180

        sector west
        wall 80 -500 80 500 middle=#FF0000FF
        sector east
        wall 120 -500 120 500 floor=25 ceil=-10 middle=#0000FFFF   // trailing comment

        split root 100 -500 100 500
        leaf root.front east
        leaf root.back west
    ";

    #[test]
    fn parses_sectors_walls_and_tree() {
        let lvl = parse(TWO_ROOMS).unwrap();
        assert_eq!(lvl.name, "halves");
        assert_eq!(lvl.spawn, Camera::new(150.0, 0.0, 180.0));
        assert_eq!(lvl.sectors.len(), 2);

        let east = lvl.sector(lvl.sector_id("east").unwrap()).unwrap();
        let w = east.walls().next().unwrap();
        assert_eq!(w.floor_height, 25.0);
        assert_eq!(w.ceiling_height, -10.0);
        assert_eq!(w.middle, Rgba::opaque(0, 0, 255));
        assert_eq!(w.bottom, Rgba::WHITE);

        let tree = lvl.bsp.as_ref().unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.locate(dvec2(150.0, 0.0)), lvl.sector_id("east"));
        let mut order = Vec::new();
        tree.fill_draw_order(dvec2(150.0, 0.0), &mut order);
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn legacy_red_marker_turns_on_sloped_floor() {
        let lvl = parse(
            "sector s\n\
             wall 0 0 10 0 floor_slope=40 bottom=#C8000000\n\
             wall 0 0 10 0 floor_slope=40 sloped\n\
             wall 0 0 10 0 floor_slope=40\n",
        )
        .unwrap();
        let walls: Vec<_> = lvl.walls().collect();
        assert!(walls[0].has_floor_slope());
        assert!(walls[1].has_floor_slope());
        assert!(!walls[2].has_floor_slope());
        assert_eq!(walls[2].floor_at(1.0), 0.0);
        assert_eq!(walls[1].floor_at(1.0), 40.0);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = parse("level x\nwall 0 0 1 1\n").unwrap_err();
        assert!(matches!(err, MapError::Syntax { line: 2, .. }), "{err}");

        let err = parse("sector s\nwall 0 0 1 x\n").unwrap_err();
        assert!(matches!(err, MapError::Syntax { line: 2, .. }));

        let err = parse("sector s\nwall 0 0 1 1 shiny\n").unwrap_err();
        assert!(err.to_string().contains("shiny"));

        let err = parse("sector s\nteleport 1 2\n").unwrap_err();
        assert!(matches!(err, MapError::Syntax { line: 2, .. }));

        let err = parse("sector s\nsplit root 0 0 0 1\nleaf root.front.back s\n").unwrap_err();
        assert!(matches!(err, MapError::Syntax { line: 3, .. }));
    }

    #[test]
    fn occupied_slot_is_a_tree_error() {
        let err = parse(
            "sector a\nsector b\nsplit root 0 0 0 1\nleaf root.front a\nleaf root.front b\n",
        )
        .unwrap_err();
        assert!(matches!(err, MapError::Tree { line: 5, .. }));
    }

    #[test]
    fn loading_validates_the_level() {
        // a lone leaf is a whole tree; a level without sectors is not a level
        assert!(parse("sector a\nleaf root a\n").is_ok());
        let err = parse("level empty\n").unwrap_err();
        assert!(matches!(err, MapError::Level(_)));
    }

    #[test]
    fn demo_text_reparses_to_the_same_level() {
        let demo = Level::demo();
        let text = TextLevel(&demo).to_string();
        let back = parse(&text).unwrap();

        assert_eq!(back.spawn, demo.spawn);
        assert!(back.walls().eq(demo.walls()));
        let (mut a, mut b) = (Vec::new(), Vec::new());
        for eye in [dvec2(640.0, 310.0), dvec2(350.0, 250.0), dvec2(790.0, 210.0)] {
            back.bsp.as_ref().unwrap().fill_draw_order(eye, &mut a);
            demo.bsp.as_ref().unwrap().fill_draw_order(eye, &mut b);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn red_200_without_the_flag_stays_flat() {
        let red = Rgba::opaque(LEGACY_SLOPE_RED, 0, 0);
        let mut lvl = Level::new("ramp");
        lvl.add_sector(Sector::with_walls(
            "s",
            [
                Wall::new(0.0, 0.0, 10.0, 0.0).with_colours(red, red, red),
                Wall::new(10.0, 0.0, 10.0, 10.0)
                    .with_colours(red, red, red)
                    .with_floor_slope(40.0),
            ],
        ));
        // binary keeps the flags as they are
        let lvl = crate::map::from_bytes(&crate::map::to_bytes(&lvl).unwrap()).unwrap();

        let text = to_text(&lvl).unwrap();
        assert!(text.contains(" flat"));
        let back = parse(&text).unwrap();
        let walls: Vec<_> = back.walls().collect();
        assert!(!walls[0].has_floor_slope());
        assert!(walls[1].has_floor_slope());
        assert!(back.walls().eq(lvl.walls()));

        let hand = parse("sector s\nwall 0 0 10 0 bottom=#C8000000 flat\n").unwrap();
        assert!(!hand.walls().next().unwrap().has_floor_slope());
    }

    #[test]
    fn names_with_spaces_survive_text() {
        let mut lvl = Level::new("my level");
        lvl.add_sector(Sector::with_walls("north hall", [Wall::new(0.0, 0.0, 10.0, 0.0)]));
        lvl.add_sector(Sector::new(""));
        lvl.bsp = Some(BspTree::single(0));

        let text = to_text(&lvl).unwrap();
        assert!(text.starts_with("level \"my level\"\n"));
        let back = parse(&text).unwrap();
        assert_eq!(back.name, "my level");
        assert_eq!(back.sector_id("north hall"), Some(0));
        assert_eq!(back.sector_id(""), Some(1));
        assert_eq!(back.bsp.as_ref().unwrap().locate(dvec2(5.0, 5.0)), Some(0));
    }

    #[test]
    fn unwritable_names_are_refused() {
        for name in ["say \"hi\"", "a//b", "two\nlines"] {
            let mut lvl = Level::new("ok");
            lvl.add_sector(Sector::new(name));
            assert!(
                matches!(to_text(&lvl), Err(MapError::UnwritableName(ref n)) if n == name),
                "{name:?}"
            );
        }
    }
}
