use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::beam::Beam;
use crate::error::Result;
use crate::settings::{OutputFormat, Settings};

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Complex, Point3, Vector3};

    fn sample_beam() -> Beam {
        let mut beam = Beam::from_vertices(
            vec![
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(0.0, 1.0, 1.0),
            ],
            3.25,
        );
        beam.set_frame(Vector3::z(), Vector3::x()).unwrap();
        beam.push_back_path(5);
        beam.push_back_path(2);
        beam.set_jones_element(1, 0, Complex::new(0.25, -0.5));
        beam.set_front(-1.0);
        beam.set_internal(false);
        beam
    }

    #[test]
    fn json_replays_the_same_beam() {
        let beam = sample_beam();
        let settings = Settings {
            output_format: OutputFormat::Json,
            ..Settings::default()
        };

        let mut buffer = Vec::new();
        write_beam(&mut buffer, &beam, &settings).unwrap();
        let replayed = read_beam(buffer.as_slice()).unwrap();

        assert_eq!(replayed, beam);
    }

    #[test]
    fn text_layout() {
        let beam = sample_beam();
        let settings = Settings {
            output_format: OutputFormat::Text,
            precision: 2,
        };

        let mut buffer = Vec::new();
        write_beam(&mut buffer, &beam, &settings).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "beam");
        assert_eq!(lines[1], "internal false");
        assert_eq!(lines[2], "optical_path 3.25");
        assert_eq!(lines[3], "front -1.00");
        assert_eq!(lines[4], "prop 0.00 0.00 1.00");
        assert_eq!(lines[5], "e_perp 1.00 0.00 0.00");
        assert_eq!(
            lines[6],
            "jones 1.00 0.00 0.00 0.00 0.25 -0.50 1.00 0.00"
        );
        assert_eq!(lines[7], "path 2 5 2");
        assert_eq!(lines[8], "vertices 3");
        assert_eq!(lines[10], "1.00 0.00 1.00");
        assert_eq!(lines.len(), 12);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(read_beam("{\"vertices\": 3}".as_bytes()).is_err());
    }
}

/// Writes a beam in the format chosen by `settings`.
///
/// The text layout is one `key values...` line per field, then one line per
/// vertex. The JSON layout is a single line that [`read_beam`] reads back.
pub fn write_beam<W: Write>(writer: &mut W, beam: &Beam, settings: &Settings) -> Result<()> {
    match settings.output_format {
        OutputFormat::Text => write_text(writer, beam, settings.precision),
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, beam)?;
            writeln!(writer)?;
            Ok(())
        }
    }
}

/// Reads one JSON beam record.
pub fn read_beam<R: Read>(reader: R) -> Result<Beam> {
    Ok(serde_json::from_reader(reader)?)
}

/// Writes all beams to a file, one record after another.
pub fn writeup<P: AsRef<Path>>(path: P, beams: &[Beam], settings: &Settings) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for beam in beams {
        write_beam(&mut writer, beam, settings)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads a file of JSON beam records, one per line.
pub fn read_beams<P: AsRef<Path>>(path: P) -> Result<Vec<Beam>> {
    let reader = BufReader::new(File::open(path)?);
    let stream = serde_json::Deserializer::from_reader(reader).into_iter::<Beam>();

    let mut beams = Vec::new();
    for beam in stream {
        beams.push(beam?);
    }
    Ok(beams)
}

fn write_text<W: Write>(writer: &mut W, beam: &Beam, precision: usize) -> Result<()> {
    let p = precision;
    let prop = beam.prop();
    let e_perp = beam.e_perp();

    writeln!(writer, "beam")?;
    writeln!(writer, "internal {}", beam.is_internal())?;
    writeln!(writer, "optical_path {:.p$}", beam.optical_path())?;
    writeln!(writer, "front {:.p$}", beam.front())?;
    writeln!(writer, "prop {:.p$} {:.p$} {:.p$}", prop.x, prop.y, prop.z)?;
    writeln!(
        writer,
        "e_perp {:.p$} {:.p$} {:.p$}",
        e_perp.x, e_perp.y, e_perp.z
    )?;

    write!(writer, "jones")?;
    for row in 0..2 {
        for col in 0..2 {
            let value = beam.jones_element(row, col);
            write!(writer, " {:.p$} {:.p$}", value.re, value.im)?;
        }
    }
    writeln!(writer)?;

    write!(writer, "path {}", beam.path_len())?;
    for facet in beam.path() {
        write!(writer, " {}", facet)?;
    }
    writeln!(writer)?;

    writeln!(writer, "vertices {}", beam.num_vertices())?;
    for vertex in beam.vertices() {
        writeln!(writer, "{:.p$} {:.p$} {:.p$}", vertex.x, vertex.y, vertex.z)?;
    }

    Ok(())
}
