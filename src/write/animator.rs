use bytemuck::Pod;

use super::{StringTable, WriteError, offset};
use crate::animator::Animator;
use crate::channel::ChannelSpline;
use crate::chunk::ChunkWriter;
use crate::records::{self, tags};
use crate::spline::{Interpolate, Knot, Spline};

fn push_knots<T: Interpolate, K: Pod>(
    data: &mut Vec<u8>,
    spline: &Spline<T>,
    record: impl Fn(&Knot<T>) -> K,
) {
    for knot in spline.knots() {
        data.extend_from_slice(bytemuck::bytes_of(&record(knot)));
    }
}

fn encode_knots(data: &mut Vec<u8>, spline: &ChannelSpline) -> u8 {
    match spline {
        ChannelSpline::Bool(s) => {
            push_knots(data, s, |k| records::BoolKnot {
                time: k.time,
                value: k.value as u8,
            });
            records::Spline::BOOL
        }
        ChannelSpline::Float(s) => {
            push_knots(data, s, |k| records::FloatKnot {
                time: k.time,
                value: k.value,
            });
            records::Spline::FLOAT
        }
        ChannelSpline::Vec2(s) => {
            push_knots(data, s, |k| records::Vec2Knot {
                time: k.time,
                value: k.value.to_array(),
            });
            records::Spline::VEC2
        }
        ChannelSpline::Vec3(s) => {
            push_knots(data, s, |k| records::Vec3Knot {
                time: k.time,
                value: k.value.to_array(),
            });
            records::Spline::VEC3
        }
        ChannelSpline::Vec4(s) => {
            push_knots(data, s, |k| records::Vec4Knot {
                time: k.time,
                value: k.value.to_array(),
            });
            records::Spline::VEC4
        }
        ChannelSpline::Quat(s) => {
            push_knots(data, s, |k| records::QuatKnot {
                time: k.time,
                value: k.value.to_array(),
            });
            records::Spline::QUAT
        }
        ChannelSpline::Spectrum(s) => {
            push_knots(data, s, |k| records::SpectrumKnot {
                time: k.time,
                value: k.value.to_array(),
            });
            records::Spline::SPECTRUM
        }
        // Rows on disk, columns in memory.
        ChannelSpline::Mat4(s) => {
            push_knots(data, s, |k| records::Mat4Knot {
                time: k.time,
                value: k.value.transpose().to_cols_array(),
            });
            records::Spline::MAT4
        }
    }
}

/// Write the animator container. Splines are stored in path order so the
/// output does not depend on hash order.
pub fn write_animator(w: &mut ChunkWriter<'_>, animator: &Animator) -> Result<(), WriteError> {
    let mut strings = StringTable::default();
    let mut data = Vec::new();
    let mut splines = Vec::with_capacity(animator.len());
    for (path, spline) in animator.splines() {
        let (name_begin, path_begin) = strings.push(&path.resource)?;
        let (_, path_end) = strings.push(&path.channel)?;
        let data_begin = offset(tags::SPLINE_DATA, data.len())?;
        let kind = encode_knots(&mut data, spline);
        splines.push(records::Spline {
            name_begin,
            path_begin,
            path_end,
            data_begin,
            data_end: offset(tags::SPLINE_DATA, data.len())?,
            kind,
        });
    }
    w.write_container_with(tags::ANIMATOR, |w| {
        w.write_bytes(tags::STRINGS, &strings.bytes)?;
        w.write_bytes(tags::SPLINE_DATA, &data)?;
        w.write_records(tags::SPLINES, &splines)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::Path;
    use crate::chunk::ChunkReader;
    use crate::read::read_animator;
    use glam::{Mat4, Vec3};

    #[test]
    fn matrices_are_stored_row_major() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let mut data = Vec::new();
        let mut spline = Spline::new();
        spline.set(0.0, m);
        assert_eq!(encode_knots(&mut data, &ChannelSpline::Mat4(spline)), b'm');
        let knot: records::Mat4Knot = bytemuck::pod_read_unaligned(&data);
        let rows = knot.value;
        // Translation is the last column, so it ends each of the first three rows.
        assert_eq!(rows[3], 1.0);
        assert_eq!(rows[7], 2.0);
        assert_eq!(rows[11], 3.0);
    }

    #[test]
    fn animator_survives_a_round_trip() {
        let mut animator = Animator::new();
        animator.set(Path::new("cam", "transform.translation"), 0.0, Vec3::ZERO);
        animator.set(Path::new("cam", "transform.translation"), 2.0, Vec3::X);
        animator.set(Path::new("sun", "visible"), 1.0, false);

        let mut out = Vec::new();
        write_animator(&mut ChunkWriter::new(&mut out), &animator).unwrap();
        let mut input = &out[..];
        let read = read_animator(&mut ChunkReader::new(&mut input)).unwrap();
        assert_eq!(read, animator);
        assert!(input.is_empty());
    }
}
