//! Minimal GDSII skeleton
//!
//! Writes one library holding one structure. The structure carries one
//! channel-marker BOUNDARY per channel on [`CHANNEL_LAYER`], and optionally
//! every drawn polygon on [`GEOMETRY_LAYER`]. This is enough for a layout
//! viewer to place the channels. It does not cover the full stream format.
//!
//! ## Record Structure
//! Each record: [2-byte length][1-byte record type][1-byte data type][payload],
//! all big-endian. Coordinates are in 1 nm database units.

use std::io::{self, Write};

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::error::{Result, RpcError};
use crate::layout::{Component, LayoutDocument, Point};

/// Library and structure name.
pub const LIBRARY_NAME: &str = "RPC_INTERFACE";
/// GDS stream version written in the HEADER record.
pub const GDS_VERSION: i16 = 600;
/// Layer holding one marker per channel.
pub const CHANNEL_LAYER: i16 = 1;
/// Layer holding the full drawn geometry.
pub const GEOMETRY_LAYER: i16 = 2;
/// Property attribute number carrying the channel label.
pub const LABEL_PROPATTR: i16 = 1;

/// Database unit in user units (µm).
const DB_UNIT_IN_USER_UNITS: f64 = 1e-3;
/// Database unit in metres.
const DB_UNIT_IN_METERS: f64 = 1e-9;

mod record_type {
    pub const HEADER: u16 = 0x0002;
    pub const BGNLIB: u16 = 0x0102;
    pub const LIBNAME: u16 = 0x0206;
    pub const UNITS: u16 = 0x0305;
    pub const ENDLIB: u16 = 0x0400;
    pub const BGNSTR: u16 = 0x0502;
    pub const STRNAME: u16 = 0x0606;
    pub const ENDSTR: u16 = 0x0700;
    pub const BOUNDARY: u16 = 0x0800;
    pub const LAYER: u16 = 0x0D02;
    pub const DATATYPE: u16 = 0x0E02;
    pub const XY: u16 = 0x1003;
    pub const ENDEL: u16 = 0x1100;
    pub const PROPATTR: u16 = 0x2B02;
    pub const PROPVALUE: u16 = 0x2C06;
}

/// Render the skeleton for `document` into memory.
pub fn render(
    document: &LayoutDocument,
    full_geometry: bool,
    timestamp: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    GdsWriter::new(&mut buffer, timestamp).write(document, full_geometry)?;
    Ok(buffer)
}

/// Streams GDSII records to any writer.
pub struct GdsWriter<W: Write> {
    writer: W,
    timestamp: [i16; 12],
}

impl<W: Write> GdsWriter<W> {
    pub fn new(writer: W, timestamp: DateTime<Utc>) -> Self {
        let stamp = [
            timestamp.year() as i16,
            timestamp.month() as i16,
            timestamp.day() as i16,
            timestamp.hour() as i16,
            timestamp.minute() as i16,
            timestamp.second() as i16,
        ];
        let mut both = [0i16; 12];
        both[..6].copy_from_slice(&stamp);
        both[6..].copy_from_slice(&stamp);
        Self {
            writer,
            timestamp: both,
        }
    }

    /// Write the whole library.
    pub fn write(&mut self, document: &LayoutDocument, full_geometry: bool) -> io::Result<()> {
        let stamp = self.timestamp;
        self.write_i16_record(record_type::HEADER, &[GDS_VERSION])?;
        self.write_i16_record(record_type::BGNLIB, &stamp)?;
        self.write_string_record(record_type::LIBNAME, LIBRARY_NAME)?;
        self.write_real8_record(
            record_type::UNITS,
            &[DB_UNIT_IN_USER_UNITS, DB_UNIT_IN_METERS],
        )?;

        self.write_i16_record(record_type::BGNSTR, &stamp)?;
        self.write_string_record(record_type::STRNAME, LIBRARY_NAME)?;

        for channel in document.channels() {
            if let Some(bounds) = document.ring_bounds(channel.index) {
                let label = Some(channel.label.as_str());
                self.write_boundary(CHANNEL_LAYER, 0, &bounds.outline(), label)?;
            }
        }

        if full_geometry {
            for polygon in document.polygons() {
                self.write_boundary(
                    GEOMETRY_LAYER,
                    component_datatype(polygon.component),
                    &polygon.points,
                    None,
                )?;
            }
        }

        self.write_record(record_type::ENDSTR, &[])?;
        self.write_record(record_type::ENDLIB, &[])?;
        self.writer.flush()
    }

    fn write_boundary(
        &mut self,
        layer: i16,
        datatype: i16,
        points: &[Point],
        label: Option<&str>,
    ) -> io::Result<()> {
        let coords = points
            .iter()
            .flat_map(|p| [to_db_units(p.x), to_db_units(p.y)])
            .collect::<io::Result<Vec<i32>>>()?;

        self.write_record(record_type::BOUNDARY, &[])?;
        self.write_i16_record(record_type::LAYER, &[layer])?;
        self.write_i16_record(record_type::DATATYPE, &[datatype])?;
        self.write_i32_record(record_type::XY, &coords)?;
        if let Some(label) = label {
            self.write_i16_record(record_type::PROPATTR, &[LABEL_PROPATTR])?;
            self.write_string_record(record_type::PROPVALUE, label)?;
        }
        self.write_record(record_type::ENDEL, &[])
    }

    fn write_record(&mut self, record_type: u16, data: &[u8]) -> io::Result<()> {
        let total_len = u16::try_from(data.len() + 4).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("GDS record payload too large: {} bytes", data.len()),
            )
        })?;
        self.writer.write_all(&total_len.to_be_bytes())?;
        self.writer.write_all(&record_type.to_be_bytes())?;
        self.writer.write_all(data)
    }

    fn write_i16_record(&mut self, record_type: u16, values: &[i16]) -> io::Result<()> {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.write_record(record_type, &data)
    }

    fn write_i32_record(&mut self, record_type: u16, values: &[i32]) -> io::Result<()> {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.write_record(record_type, &data)
    }

    fn write_string_record(&mut self, record_type: u16, s: &str) -> io::Result<()> {
        let mut data: Vec<u8> = s.bytes().collect();
        // GDS strings are padded to even length
        if data.len() % 2 != 0 {
            data.push(0);
        }
        self.write_record(record_type, &data)
    }

    fn write_real8_record(&mut self, record_type: u16, values: &[f64]) -> io::Result<()> {
        let data: Vec<u8> = values.iter().flat_map(|v| f64_to_real8(*v)).collect();
        self.write_record(record_type, &data)
    }
}

/// µm to database units. Fails instead of saturating when out of `i32` range.
fn to_db_units(um: f64) -> io::Result<i32> {
    let db = (um / DB_UNIT_IN_USER_UNITS).round();
    if db.is_finite() && db >= i32::MIN as f64 && db <= i32::MAX as f64 {
        Ok(db as i32)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("coordinate {} µm does not fit in 32-bit GDS database units", um),
        ))
    }
}

fn component_datatype(component: Component) -> i16 {
    match component {
        Component::Bus => 0,
        Component::Ring => 1,
        Component::RingHole => 2,
        Component::Waveguide => 3,
        Component::Modulator => 4,
        Component::Detector => 5,
    }
}

/// Convert IEEE 754 f64 to GDSII excess-64 base-16 real.
fn f64_to_real8(value: f64) -> [u8; 8] {
    if value == 0.0 {
        return [0u8; 8];
    }

    let sign: u8 = if value < 0.0 { 0x80 } else { 0x00 };
    let mut mantissa = value.abs();
    let mut exponent: i32 = 0;

    // Normalise so 1/16 <= mantissa < 1
    while mantissa >= 1.0 {
        mantissa /= 16.0;
        exponent += 1;
    }
    while mantissa < 1.0 / 16.0 {
        mantissa *= 16.0;
        exponent -= 1;
    }

    let mut bits = (mantissa * (1u64 << 56) as f64).round() as u64;
    if bits >= 1u64 << 56 {
        bits >>= 4;
        exponent += 1;
    }

    let mut out = [0u8; 8];
    out[0] = sign | ((exponent + 64).clamp(0, 127) as u8);
    out[1..].copy_from_slice(&bits.to_be_bytes()[1..]);
    out
}

/// Convert a GDSII excess-64 real back to f64.
fn real8_to_f64(bytes: &[u8; 8]) -> f64 {
    if bytes.iter().all(|&b| b == 0) {
        return 0.0;
    }
    let sign = if bytes[0] & 0x80 != 0 { -1.0 } else { 1.0 };
    let exponent = (bytes[0] & 0x7F) as i32 - 64;

    let mut mantissa: u64 = 0;
    for &b in &bytes[1..] {
        mantissa = (mantissa << 8) | b as u64;
    }

    sign * (mantissa as f64 / (1u64 << 56) as f64) * 16f64.powi(exponent)
}

/// What a reader finds in a skeleton stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletonSummary {
    pub version: i16,
    pub library_name: String,
    pub structure_names: Vec<String>,
    /// Database unit in user units and in metres.
    pub units: (f64, f64),
    /// Labels of the channel-marker records, in stream order.
    pub channel_labels: Vec<String>,
    pub channel_records: usize,
    pub geometry_records: usize,
}

impl SkeletonSummary {
    /// Walk a skeleton stream and tally its records.
    ///
    /// Only the record types this crate writes are interpreted; anything
    /// else is skipped.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut summary = SkeletonSummary::default();
        let mut offset = 0usize;
        let mut first = true;
        let mut ended = false;

        let mut element_layer: Option<i16> = None;
        let mut element_label: Option<String> = None;

        while offset < bytes.len() {
            let record = read_record(bytes, offset)?;
            let at = offset as u64;
            offset += record.total_len;

            if first {
                if record.record_type != record_type::HEADER {
                    return Err(RpcError::InvalidSkeleton {
                        offset: at,
                        message: format!(
                            "expected HEADER, found record 0x{:04X}",
                            record.record_type
                        ),
                    });
                }
                first = false;
            }

            match record.record_type {
                record_type::HEADER => {
                    summary.version = record.i16_values().first().copied().unwrap_or_default()
                }
                record_type::LIBNAME => summary.library_name = record.string(),
                record_type::UNITS => {
                    let reals = record.real8_values();
                    if reals.len() == 2 {
                        summary.units = (reals[0], reals[1]);
                    }
                }
                record_type::STRNAME => summary.structure_names.push(record.string()),
                record_type::BOUNDARY => {
                    element_layer = None;
                    element_label = None;
                }
                record_type::LAYER => element_layer = record.i16_values().first().copied(),
                record_type::PROPVALUE => element_label = Some(record.string()),
                record_type::ENDEL => match element_layer.take() {
                    Some(CHANNEL_LAYER) => {
                        summary.channel_records += 1;
                        summary
                            .channel_labels
                            .push(element_label.take().unwrap_or_default());
                    }
                    Some(GEOMETRY_LAYER) => summary.geometry_records += 1,
                    _ => {}
                },
                record_type::ENDLIB => {
                    ended = true;
                    break;
                }
                _ => {}
            }
        }

        if !ended {
            return Err(RpcError::InvalidSkeleton {
                offset: offset as u64,
                message: "stream ended without ENDLIB".to_string(),
            });
        }
        Ok(summary)
    }
}

struct RawRecord<'a> {
    record_type: u16,
    data: &'a [u8],
    total_len: usize,
}

impl RawRecord<'_> {
    fn i16_values(&self) -> Vec<i16> {
        self.data
            .chunks_exact(2)
            .map(|c| i16::from_be_bytes([c[0], c[1]]))
            .collect()
    }

    fn real8_values(&self) -> Vec<f64> {
        self.data
            .chunks_exact(8)
            .map(|c| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(c);
                real8_to_f64(&raw)
            })
            .collect()
    }

    fn string(&self) -> String {
        String::from_utf8_lossy(self.data)
            .trim_end_matches('\0')
            .to_string()
    }
}

fn read_record(bytes: &[u8], offset: usize) -> Result<RawRecord<'_>> {
    let invalid = |message: String| RpcError::InvalidSkeleton {
        offset: offset as u64,
        message,
    };

    let header = bytes
        .get(offset..offset + 4)
        .ok_or_else(|| invalid("truncated record header".to_string()))?;
    let total_len = u16::from_be_bytes([header[0], header[1]]) as usize;
    if total_len < 4 {
        return Err(invalid(format!("record length {} is too small", total_len)));
    }
    let record_type = u16::from_be_bytes([header[2], header[3]]);
    let data = bytes
        .get(offset + 4..offset + total_len)
        .ok_or_else(|| invalid(format!("record 0x{:04X} runs past end of stream", record_type)))?;

    Ok(RawRecord {
        record_type,
        data,
        total_len,
    })
}
