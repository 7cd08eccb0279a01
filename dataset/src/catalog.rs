//! Built-in part and colour catalogs.
//!
//! Shapes are the LDraw bricks named `Brick<W>X<L>` followed by the ones named
//! `Brick<W>X<L>X<H>`. Colours follow the LDraw colour table in code order.

/// A brick shape from the LDraw part library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrickShape {
    /// LDraw part number, used as the shape identity in class names.
    pub part: &'static str,
    /// Library name, e.g. `Brick2X4` or `Brick1X2X5`.
    pub name: &'static str,
}

impl BrickShape {
    pub const fn new(part: &'static str, name: &'static str) -> Self {
        Self { part, name }
    }

    /// Stud footprint and height in bricks, parsed from the library name.
    /// Height defaults to 1 for two-dimension names.
    pub fn parse_dimensions(&self) -> Option<(u32, u32, u32)> {
        let dims = self.name.strip_prefix("Brick")?;
        let mut it = dims.split('X').map(|d| d.parse::<u32>().ok());
        let w = it.next()??;
        let l = it.next()??;
        let h = match it.next() {
            Some(h) => h?,
            None => 1,
        };
        if it.next().is_some() || w == 0 || l == 0 || h == 0 {
            return None;
        }
        Some((w, l, h))
    }

    /// Full built-in shape catalog.
    pub fn catalog() -> &'static [BrickShape] {
        BRICKS
    }
}

const BRICKS: &[BrickShape] = &[
    BrickShape::new("3005", "Brick1X1"),
    BrickShape::new("3004", "Brick1X2"),
    BrickShape::new("3622", "Brick1X3"),
    BrickShape::new("3010", "Brick1X4"),
    BrickShape::new("3009", "Brick1X6"),
    BrickShape::new("3008", "Brick1X8"),
    BrickShape::new("6111", "Brick1X10"),
    BrickShape::new("6112", "Brick1X12"),
    BrickShape::new("2465", "Brick1X16"),
    BrickShape::new("3003", "Brick2X2"),
    BrickShape::new("3002", "Brick2X3"),
    BrickShape::new("3001", "Brick2X4"),
    BrickShape::new("2456", "Brick2X6"),
    BrickShape::new("3007", "Brick2X8"),
    BrickShape::new("3006", "Brick2X10"),
    BrickShape::new("2453", "Brick1X1X5"),
    BrickShape::new("3245c", "Brick1X2X2"),
    BrickShape::new("2454", "Brick1X2X5"),
    BrickShape::new("3754", "Brick1X6X5"),
    BrickShape::new("30145", "Brick2X2X3"),
];

/// An LDraw colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub code: u16,
    pub name: &'static str,
    pub rgb: [u8; 3],
}

impl Color {
    pub const fn new(code: u16, name: &'static str, rgb: [u8; 3]) -> Self {
        Self { code, name, rgb }
    }

    /// The first `n` colours in code order. `n` is clamped to the table size.
    pub fn first(n: usize) -> &'static [Color] {
        &COLORS[..n.min(COLORS.len())]
    }

    pub fn catalog() -> &'static [Color] {
        COLORS
    }

    /// Components in `0.0..=1.0`.
    pub fn rgb_unit(&self) -> [f64; 3] {
        self.rgb.map(|c| f64::from(c) / 255.0)
    }
}

const COLORS: &[Color] = &[
    Color::new(0, "Black", [0x1b, 0x2a, 0x34]),
    Color::new(1, "Blue", [0x1e, 0x5a, 0xa8]),
    Color::new(2, "Green", [0x00, 0x85, 0x2b]),
    Color::new(3, "Dark_Turquoise", [0x06, 0x9d, 0x9f]),
    Color::new(4, "Red", [0xb4, 0x00, 0x00]),
    Color::new(5, "Dark_Pink", [0xd3, 0x35, 0x9d]),
    Color::new(6, "Brown", [0x54, 0x33, 0x24]),
    Color::new(7, "Light_Grey", [0x8a, 0x92, 0x8d]),
    Color::new(8, "Dark_Grey", [0x54, 0x59, 0x55]),
    Color::new(9, "Light_Blue", [0x97, 0xcb, 0xd9]),
    Color::new(10, "Bright_Green", [0x58, 0xab, 0x41]),
    Color::new(11, "Light_Turquoise", [0x00, 0xaa, 0xa4]),
    Color::new(12, "Salmon", [0xf0, 0x6d, 0x61]),
    Color::new(13, "Pink", [0xf6, 0xa9, 0xbb]),
    Color::new(14, "Yellow", [0xfa, 0xc8, 0x0a]),
    Color::new(15, "White", [0xf4, 0xf4, 0xf4]),
];
