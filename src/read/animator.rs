use std::mem::size_of;

use bytemuck::Pod;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use super::{AtOffset, ReadError, ReadErrorKind, Strings, check_length, checked_range};
use crate::HashSet;
use crate::animator::{Animator, Path};
use crate::channel::ChannelSpline;
use crate::chunk::ChunkReader;
use crate::header::ChunkHeader;
use crate::records::{self, tags};
use crate::spectrum::Spectrum;
use crate::spline::{Interpolate, Spline};

fn knots<K: Pod, T: Interpolate>(
    bytes: &[u8],
    convert: impl Fn(K) -> (f32, T),
) -> Result<Spline<T>, ReadErrorKind> {
    let record_size = size_of::<K>();
    if bytes.len() % record_size != 0 {
        return Err(ReadErrorKind::Misaligned {
            tag: tags::SPLINE_DATA,
            bytes: bytes.len(),
            record_size,
        });
    }
    Ok(bytemuck::pod_collect_to_vec::<u8, K>(bytes)
        .into_iter()
        .map(convert)
        .collect())
}

fn decode_spline(
    strings: &Strings,
    data: &[u8],
    rec: &records::Spline,
) -> Result<(Path, ChannelSpline), ReadErrorKind> {
    let (name_begin, path_begin, path_end) = (rec.name_begin, rec.path_begin, rec.path_end);
    let (data_begin, data_end) = (rec.data_begin, rec.data_end);
    let resource = strings.get("Spline resource", name_begin, path_begin)?;
    let channel = strings.get("Spline channel", path_begin, path_end)?;
    checked_range("Spline", "data", data_begin, data_end, data.len())?;
    let bytes = &data[data_begin as usize..data_end as usize];

    let spline = match rec.kind {
        records::Spline::BOOL => {
            ChannelSpline::Bool(knots(bytes, |k: records::BoolKnot| (k.time, k.value != 0))?)
        }
        records::Spline::FLOAT => {
            ChannelSpline::Float(knots(bytes, |k: records::FloatKnot| (k.time, k.value))?)
        }
        records::Spline::VEC2 => ChannelSpline::Vec2(knots(bytes, |k: records::Vec2Knot| {
            (k.time, Vec2::from_array(k.value))
        })?),
        records::Spline::VEC3 => ChannelSpline::Vec3(knots(bytes, |k: records::Vec3Knot| {
            (k.time, Vec3::from_array(k.value))
        })?),
        records::Spline::VEC4 => ChannelSpline::Vec4(knots(bytes, |k: records::Vec4Knot| {
            (k.time, Vec4::from_array(k.value))
        })?),
        records::Spline::QUAT => ChannelSpline::Quat(knots(bytes, |k: records::QuatKnot| {
            (k.time, Quat::from_array(k.value))
        })?),
        records::Spline::SPECTRUM => {
            ChannelSpline::Spectrum(knots(bytes, |k: records::SpectrumKnot| {
                (k.time, Spectrum::from_array(k.value))
            })?)
        }
        records::Spline::MAT4 => ChannelSpline::Mat4(knots(bytes, |k: records::Mat4Knot| {
            let rows = k.value;
            (k.time, Mat4::from_cols_array(&rows).transpose())
        })?),
        other => {
            return Err(ReadErrorKind::UnknownEnumerant {
                what: "Spline",
                field: "type",
                value: other,
            });
        }
    };
    Ok((Path::new(resource, channel), spline))
}

/// Read the animator container, leaving `r` just past it.
///
/// Unlike the scene container, a length mismatch here is always an error.
pub fn read_animator(r: &mut ChunkReader<'_>) -> Result<Animator, ReadError> {
    let start = r.offset();
    let header = r.read_container(tags::ANIMATOR)?;
    let declared = header.bytes;

    let strings = Strings(r.read_bytes(tags::STRINGS)?);
    let data = r.read_bytes(tags::SPLINE_DATA)?;
    let at = r.offset();
    let recs: Vec<records::Spline> = r.read_records(tags::SPLINES)?;

    let actual = r.offset() - start - ChunkHeader::encoded_len() as u64;
    check_length(tags::ANIMATOR, declared, actual).at(start)?;

    let mut animator = Animator::new();
    // Empty splines are never stored, so duplicates are tracked separately.
    let mut seen = HashSet::default();
    for rec in &recs {
        let (path, spline) = decode_spline(&strings, &data, rec).at(at)?;
        if !seen.insert(path.clone()) {
            return Err(ReadError::new(at, ReadErrorKind::DuplicatePath { path }));
        }
        animator.insert_spline(path, spline);
    }
    log::debug!("Read {} animated channels", animator.len());
    Ok(animator)
}
