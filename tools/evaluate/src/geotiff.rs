//! First-band GeoTIFF reader feeding [`ElevationGrid::load`](slope_core::ElevationGrid::load).

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use slope_core::{BandSource, GeoTransform, RasterBand, SlopeError};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

/// GeoTIFF tag numbers. `tiff` decodes these to named `Tag` variants, so look
/// them up via `Tag::from_u16_exhaustive` rather than `Tag::Unknown`.
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GDAL_NODATA: u16 = 42113;

/// An open GeoTIFF. The file handle lives until [`BandSource::read_band`]
/// consumes the source.
pub struct GeoTiffSource {
    path: PathBuf,
    reader: BufReader<File>,
    /// Pixel size to assume when the file carries no georeferencing tags.
    fallback_res: Option<f64>,
}

impl GeoTiffSource {
    pub fn open(path: &Path, fallback_res: Option<f64>) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening DEM {}", path.display()))?;
        Ok(Self { path: path.to_path_buf(), reader: BufReader::new(file), fallback_res })
    }
}

impl BandSource for GeoTiffSource {
    fn read_band(self) -> slope_core::Result<RasterBand> {
        let name = self.path.display().to_string();
        let fail = |what: &str, e: &dyn std::fmt::Display| SlopeError::Data(format!("{name}: {what}: {e}"));

        let mut decoder = Decoder::new(self.reader).map_err(|e| fail("not a valid TIFF", &e))?;
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.intermediate_buffer_size = 1024 * 1024 * 1024;
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions().map_err(|e| fail("dimensions", &e))?;
        let transform = match read_transform(&mut decoder) {
            Some(t) => t,
            None => match self.fallback_res {
                Some(res) => fallback_transform(height, res),
                None => {
                    return Err(SlopeError::Data(format!(
                        "{name}: no ModelPixelScale/ModelTiepoint or ModelTransformation tags; pass --res to set a pixel size"
                    )))
                }
            },
        };
        let nodata = read_nodata(&mut decoder);
        let samples_per_pixel = decoder.get_tag_u32(Tag::SamplesPerPixel).unwrap_or(1).max(1) as usize;
        let planar_separate = decoder.get_tag_u32(Tag::PlanarConfiguration).map(|v| v == 2).unwrap_or(false);
        let image = decoder.read_image().map_err(|e| fail("reading band", &e))?;
        let pixels = width as usize * height as usize;
        let data = first_band(to_f32(image), samples_per_pixel, planar_separate, pixels);
        debug!(path = %name, width, height, samples_per_pixel, ?nodata, "decoded GeoTIFF band");

        Ok(RasterBand { data, width: width as usize, height: height as usize, transform, nodata })
    }
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT)).ok();
    let scale = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE)).ok();
    let matrix = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION)).ok();
    transform_from_tags(tiepoint.as_deref(), scale.as_deref(), matrix.as_deref())
}

/// North-up transform from ModelTiepoint + ModelPixelScale, or from a
/// rotation-free ModelTransformation matrix. Rotated or sheared matrices
/// yield `None`.
fn transform_from_tags(tiepoint: Option<&[f64]>, scale: Option<&[f64]>, matrix: Option<&[f64]>) -> Option<GeoTransform> {
    if let (Some(tp), Some(sc)) = (tiepoint, scale) {
        if tp.len() >= 6 && sc.len() >= 2 {
            // Tiepoint: raster (i, j, k) ↔ model (x, y, z). Raster j grows southwards.
            let (i, j, x, y) = (tp[0], tp[1], tp[3], tp[4]);
            return Some(GeoTransform { origin_x: x - i * sc[0], origin_y: y + j * sc[1], resx: sc[0], resy: sc[1] });
        }
    }

    let m = matrix?;
    if m.len() >= 8 && m[1] == 0.0 && m[4] == 0.0 {
        return Some(GeoTransform { origin_x: m[3], origin_y: m[7], resx: m[0], resy: -m[5] });
    }
    None
}

/// Unreferenced raster: pixel `(0, 0)` is the north-west corner of a
/// `res`-metre grid whose south-west corner sits at the model origin.
fn fallback_transform(height: u32, res: f64) -> GeoTransform {
    GeoTransform { origin_x: 0.0, origin_y: height as f64 * res, resx: res, resy: res }
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
    let raw = decoder.get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA)).ok()?;
    parse_nodata(&raw)
}

/// GDAL writes the sentinel as text, sometimes NUL-terminated.
fn parse_nodata(raw: &str) -> Option<f32> {
    raw.trim_matches(|c: char| c == '\0' || c.is_whitespace()).parse().ok()
}

/// Keep sample 0 of each pixel. Chunky layouts interleave samples; planar
/// layouts store band 1 first.
fn first_band(mut data: Vec<f32>, samples_per_pixel: usize, planar_separate: bool, pixels: usize) -> Vec<f32> {
    if samples_per_pixel <= 1 {
        return data;
    }
    if planar_separate {
        data.truncate(pixels);
        data
    } else {
        data.into_iter().step_by(samples_per_pixel).collect()
    }
}

fn to_f32(image: DecodingResult) -> Vec<f32> {
    match image {
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U8(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
    }
}
