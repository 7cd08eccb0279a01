//! POV-Ray scene composition.
//!
//! A scene is written as four blocks in a fixed order: the colour palette
//! include, the object geometry, one light source per rig light, and a trailer
//! holding the ground plane, background, ambient light and camera.

use std::io::{self, Write};

use crate::{
    lighting::{LightingRig, PointLight},
    pose::{PieceInstance, fmt_num},
};

pub const PALETTE_INCLUDE: &str = "#include \"colors.inc\"\n\n";

pub const TRAILER: &str = r#"
plane { <0, 1, 0>, -40
    pigment {
      rgb <0.1, 0.1, 0.1>
    }
  }
background { color Black }
global_settings {
  ambient_light rgb<1, 1, 1>
}
camera {
  location <-200.000000, 200.000000, 0.000000>
  look_at <0.000000, 0.000000, 0.000000>
  up y
  right x
  angle 40
}
"#;

/// Serializes object geometry. The composer treats the output as opaque text.
pub trait SceneWriter {
    fn write_pieces(&self, pieces: &[PieceInstance], out: &mut dyn Write) -> io::Result<()>;
}

/// Writes a complete scene for one piece under one rig.
pub fn compose_scene<S, W>(
    writer: &S,
    piece: &PieceInstance,
    rig: &LightingRig,
    out: &mut W,
) -> io::Result<()>
where
    S: SceneWriter + ?Sized,
    W: Write,
{
    out.write_all(PALETTE_INCLUDE.as_bytes())?;
    writer.write_pieces(std::slice::from_ref(piece), out)?;
    for light in &rig.lights {
        write_light(light, out)?;
    }
    writeln!(out, "{TRAILER}")?;
    Ok(())
}

fn write_light<W: Write + ?Sized>(light: &PointLight, out: &mut W) -> io::Result<()> {
    let [x, y, z] = light.position.map(fmt_num);
    writeln!(
        out,
        "
  light_source {{
    <{x}, {y}, {z}>, 1
    fade_distance {fade} fade_power 2
    area_light x*70, y*70, 20, 20 circular orient adaptive 0 jitter
  }}
",
        fade = fmt_num(light.fade_distance)
    )
}

/// LDraw units.
const STUD_PITCH: f64 = 20.0;
const BRICK_HEIGHT: f64 = 24.0;
const STUD_RADIUS: f64 = 6.0;
const STUD_HEIGHT: f64 = 4.0;

/// Builds each brick as CSG from its stud footprint. Coordinates follow LDraw
/// (origin at the top centre, Y down) and are flipped to POV-Ray's Y up.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrickCsgWriter;

impl SceneWriter for BrickCsgWriter {
    fn write_pieces(&self, pieces: &[PieceInstance], out: &mut dyn Write) -> io::Result<()> {
        for piece in pieces {
            write_brick(piece, out)?;
        }
        Ok(())
    }
}

fn write_brick(piece: &PieceInstance, out: &mut dyn Write) -> io::Result<()> {
    let Some((w, l, h)) = piece.shape.parse_dimensions() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no brick geometry for {} ({})", piece.shape.part, piece.shape.name),
        ));
    };
    let half_w = f64::from(w) * STUD_PITCH / 2.0;
    let half_l = f64::from(l) * STUD_PITCH / 2.0;
    let height = f64::from(h) * BRICK_HEIGHT;

    writeln!(out, "// {piece}")?;
    writeln!(out, "union {{")?;
    writeln!(
        out,
        "  box {{ <{}, 0, {}>, <{}, {}, {}> }}",
        fmt_num(-half_w),
        fmt_num(-half_l),
        fmt_num(half_w),
        fmt_num(height),
        fmt_num(half_l)
    )?;
    for i in 0..w {
        for j in 0..l {
            let sx = fmt_num(-half_w + STUD_PITCH / 2.0 + f64::from(i) * STUD_PITCH);
            let sz = fmt_num(-half_l + STUD_PITCH / 2.0 + f64::from(j) * STUD_PITCH);
            writeln!(
                out,
                "  cylinder {{ <{sx}, 0, {sz}>, <{sx}, {}, {sz}>, {} }}",
                fmt_num(-STUD_HEIGHT),
                fmt_num(STUD_RADIUS)
            )?;
        }
    }

    // POV-Ray multiplies row vectors, so the LDraw matrix goes in column by column.
    let m = piece.rotation.matrix();
    let cells: Vec<String> = m
        .iter()
        .chain(piece.position.iter())
        .map(|v| fmt_num(*v))
        .collect();
    writeln!(out, "  matrix <{}>", cells.join(", "))?;
    writeln!(out, "  matrix <1, 0, 0, 0, -1, 0, 0, 0, 1, 0, 0, 0>")?;

    let [r, g, b] = piece.color.rgb_unit().map(fmt_num);
    writeln!(out, "  pigment {{ rgb <{r}, {g}, {b}> }}")?;
    writeln!(out, "  finish {{ ambient 0.1 diffuse 0.8 phong 0.4 }}")?;
    writeln!(out, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{BrickShape, Color},
        lighting::RIGS,
        pose::Rotation,
    };

    fn piece() -> PieceInstance {
        PieceInstance::new(
            BrickShape::new("3001", "Brick2X4"),
            Color::first(5)[4],
            Rotation::new(0, 0, 90),
        )
    }

    fn compose(rig: &LightingRig) -> String {
        let mut buf = Vec::new();
        compose_scene(&BrickCsgWriter, &piece(), rig, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_blocks_in_order() {
        let scene = compose(&RIGS[0]);
        assert!(scene.starts_with(PALETTE_INCLUDE));
        let geometry = scene.find("union {").unwrap();
        let first_light = scene.find("light_source").unwrap();
        let camera = scene.find("camera {").unwrap();
        assert!(geometry < first_light);
        assert!(first_light < camera);
        assert!(scene.trim_end().ends_with('}'));
    }

    #[test]
    fn test_one_light_block_per_rig_light() {
        let scene = compose(&RIGS[5]);
        assert_eq!(scene.matches("light_source").count(), 2);
        assert!(scene.contains("<200, -200, 200>, 1"));
        assert!(scene.contains("<200, 200, 200>, 1"));
        assert!(scene.contains("fade_distance 5000 fade_power 2"));
    }

    #[test]
    fn test_camera_never_varies() {
        let a = compose(&RIGS[0]);
        let b = compose(&RIGS[7]);
        let tail = |s: &str| s[s.find("plane {").unwrap()..].to_string();
        assert_eq!(tail(&a), tail(&b));
    }

    #[test]
    fn test_brick_geometry() {
        let mut buf = Vec::new();
        BrickCsgWriter.write_pieces(&[piece()], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("// 1 4 0 0 0 0 -1 0 1 0 0 0 0 1 3001.dat"));
        assert!(text.contains("box { <-20, 0, -40>, <20, 24, 40> }"));
        assert_eq!(text.matches("cylinder").count(), 8);
        assert!(text.contains("cylinder { <-10, 0, -30>, <-10, -4, -30>, 6 }"));
        assert!(text.contains("matrix <0, 1, 0, -1, 0, 0, 0, 0, 1, 0, 0, 0>"));
        assert!(text.contains("pigment { rgb <0.705882, 0, 0> }"));
    }

    #[test]
    fn test_tall_brick_height() {
        let tall = PieceInstance::new(
            BrickShape::new("2454", "Brick1X2X5"),
            Color::first(1)[0],
            Rotation::default(),
        );
        let mut buf = Vec::new();
        BrickCsgWriter.write_pieces(&[tall], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("box { <-10, 0, -20>, <10, 120, 20> }"));
        assert_eq!(text.matches("cylinder").count(), 2);
    }

    #[test]
    fn test_unknown_geometry_is_an_error() {
        let plate = PieceInstance::new(
            BrickShape::new("3020", "Plate2X4"),
            Color::first(1)[0],
            Rotation::default(),
        );
        let mut buf = Vec::new();
        let err = BrickCsgWriter.write_pieces(&[plate], &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(buf.is_empty());
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("sink closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_errors_propagate() {
        let err = compose_scene(&BrickCsgWriter, &piece(), &RIGS[0], &mut FailingSink).unwrap_err();
        assert_eq!(err.to_string(), "sink closed");
    }
}
