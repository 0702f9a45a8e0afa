//! Raw voxel-map storage and its binary format.
//!
//! The format is positional and big-endian, with no magic number or version:
//!
//! | field        | type        | count          |
//! |--------------|-------------|----------------|
//! | `nx, ny, nz` | `u16`       | 3              |
//! | `dx, dy, dz` | `f32`       | 3 (full widths)|
//! | values       | `f32`       | `nx * ny * nz` |
//!
//! Values are stored in index order `i + nx * (j + ny * k)`.
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

const HEADER_LEN: usize = 3 * 2 + 3 * 4;

/// A dense 3D raster of `f32` samples with its physical full widths.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelMap {
    n_voxels: [u16; 3],
    full_widths: [f32; 3],
    data: Vec<f32>,
}

impl VoxelMap {
    /// Creates a zero-filled map.
    pub fn new(n_voxels: [u16; 3], full_widths: [f32; 3]) -> Result<Self> {
        validate_shape(n_voxels, full_widths)?;
        let len = n_voxels.iter().map(|n| *n as usize).product();
        Ok(Self {
            n_voxels,
            full_widths,
            data: vec![0.0; len],
        })
    }

    /// Wraps existing samples; `data.len()` must equal `nx * ny * nz`.
    pub fn from_data(n_voxels: [u16; 3], full_widths: [f32; 3], data: Vec<f32>) -> Result<Self> {
        validate_shape(n_voxels, full_widths)?;
        let len: usize = n_voxels.iter().map(|n| *n as usize).product();
        if data.len() != len {
            return Err(Error::InvalidArgument(format!(
                "voxel map of {n_voxels:?} needs {len} values, got {}",
                data.len()
            )));
        }
        Ok(Self {
            n_voxels,
            full_widths,
            data,
        })
    }

    pub fn n_voxels(&self) -> [u16; 3] {
        self.n_voxels
    }

    pub fn full_widths(&self) -> [f32; 3] {
        self.full_widths
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Linear index of voxel `(i, j, k)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        let [nx, ny, _] = self.n_voxels.map(usize::from);
        i + nx * (j + ny * k)
    }

    /// Value of voxel `(i, j, k)`, or `None` outside the grid.
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<f32> {
        let [nx, ny, nz] = self.n_voxels.map(usize::from);
        if i >= nx || j >= ny || k >= nz {
            return None;
        }
        Some(self.data[self.index(i, j, k)])
    }

    /// The `nx * ny` values of z-slice `k`.
    pub fn slice_z(&self, k: usize) -> Option<&[f32]> {
        let [nx, ny, nz] = self.n_voxels.map(usize::from);
        if k >= nz {
            return None;
        }
        let start = nx * ny * k;
        Some(&self.data[start..start + nx * ny])
    }

    /// Serializes the map in the raw big-endian format.
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        let mut header = [0u8; HEADER_LEN];
        for (i, n) in self.n_voxels.iter().enumerate() {
            header[2 * i..2 * i + 2].copy_from_slice(&n.to_be_bytes());
        }
        for (i, d) in self.full_widths.iter().enumerate() {
            header[6 + 4 * i..10 + 4 * i].copy_from_slice(&d.to_be_bytes());
        }
        out.write_all(&header)?;

        let mut body = Vec::with_capacity(self.data.len() * 4);
        for v in &self.data {
            body.extend_from_slice(&v.to_be_bytes());
        }
        out.write_all(&body)?;
        out.flush()?;
        Ok(())
    }

    /// Parses a map from the raw big-endian format, rejecting truncated or trailing data.
    pub fn read_from<R: Read>(mut input: R) -> Result<Self> {
        let mut header = [0u8; HEADER_LEN];
        read_exact_or_malformed(&mut input, &mut header, "header")?;

        let mut n_voxels = [0u16; 3];
        for (i, n) in n_voxels.iter_mut().enumerate() {
            *n = u16::from_be_bytes([header[2 * i], header[2 * i + 1]]);
        }
        let mut full_widths = [0f32; 3];
        for (i, d) in full_widths.iter_mut().enumerate() {
            let o = 6 + 4 * i;
            *d = f32::from_be_bytes([header[o], header[o + 1], header[o + 2], header[o + 3]]);
        }
        validate_shape(n_voxels, full_widths).map_err(|e| Error::MalformedMap(e.to_string()))?;

        let len: usize = n_voxels.iter().map(|n| *n as usize).product();
        // Sized by the bytes present, never by the header alone.
        let expected = len as u64 * 4;
        let mut body = Vec::new();
        input.by_ref().take(expected).read_to_end(&mut body)?;
        if (body.len() as u64) < expected {
            return Err(Error::MalformedMap(format!(
                "truncated voxel values: expected {expected} bytes, found {}",
                body.len()
            )));
        }
        let data = body
            .chunks_exact(4)
            .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        let mut extra = [0u8; 1];
        if input.read(&mut extra)? != 0 {
            return Err(Error::MalformedMap(format!(
                "trailing data after {len} voxel values"
            )));
        }

        Ok(Self {
            n_voxels,
            full_widths,
            data,
        })
    }

    /// Writes the map to `path`. No file appears at `path` unless the write completes.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut pending = PendingFile::create(path.as_ref())?;
        self.write_to(pending.writer())?;
        pending.commit()
    }

    /// Reads a map from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::read_from(BufReader::new(file))
    }
}

fn validate_shape(n_voxels: [u16; 3], full_widths: [f32; 3]) -> Result<()> {
    if n_voxels.contains(&0) {
        return Err(Error::InvalidArgument(format!(
            "voxel counts must be >= 1, got {n_voxels:?}"
        )));
    }
    if full_widths.iter().any(|w| !w.is_finite() || *w <= 0.0) {
        return Err(Error::InvalidArgument(format!(
            "full widths must be finite and > 0, got {full_widths:?}"
        )));
    }
    Ok(())
}

fn read_exact_or_malformed<R: Read>(input: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    input.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => Error::MalformedMap(format!("truncated {what}")),
        _ => Error::Io(e),
    })
}

/// Output file staged under a unique sibling temporary name and renamed into
/// place on commit.
///
/// Dropping an uncommitted `PendingFile` removes the temporary file.
pub(crate) struct PendingFile {
    out: BufWriter<NamedTempFile>,
    dest: PathBuf,
}

impl PendingFile {
    pub(crate) fn create(dest: &Path) -> Result<Self> {
        let file_name = dest.file_name().ok_or_else(|| {
            Error::InvalidArgument(format!("'{}' does not name a file", dest.display()))
        })?;
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut prefix = OsString::from(".");
        prefix.push(file_name);
        let staged = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".partial")
            .tempfile_in(dir)?;
        Ok(Self {
            out: BufWriter::new(staged),
            dest: dest.to_path_buf(),
        })
    }

    pub(crate) fn writer(&mut self) -> &mut BufWriter<NamedTempFile> {
        &mut self.out
    }

    pub(crate) fn commit(self) -> Result<()> {
        let staged = self
            .out
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;
        staged.as_file().sync_all()?;
        staged.persist(&self.dest).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_map() -> VoxelMap {
        let n = [3u16, 4, 5];
        let mut map = VoxelMap::new(n, [30.0, 40.5, 50.25]).unwrap();
        for k in 0..5 {
            for j in 0..4 {
                for i in 0..3 {
                    let idx = map.index(i, j, k);
                    map.data_mut()[idx] = (100 * k + 10 * j + i) as f32 + 0.5;
                }
            }
        }
        map
    }

    #[test]
    fn file_roundtrip_preserves_every_voxel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.raw");
        let original = synthetic_map();
        original.save(&path).unwrap();

        let loaded = VoxelMap::load(&path).unwrap();
        assert_eq!(loaded.n_voxels(), [3, 4, 5]);
        assert_eq!(loaded.full_widths(), [30.0, 40.5, 50.25]);
        assert_eq!(loaded, original);
        assert_eq!(loaded.get(2, 3, 4), Some(432.5));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn encoding_is_big_endian_and_positional() {
        let map = VoxelMap::from_data([1, 2, 1], [1.0, 2.0, 3.0], vec![1.5, -2.0]).unwrap();
        let mut bytes = Vec::new();
        map.write_to(&mut bytes).unwrap();

        assert_eq!(bytes.len(), HEADER_LEN + 8);
        assert_eq!(&bytes[..6], &[0, 1, 0, 2, 0, 1]);
        assert_eq!(&bytes[6..10], &1.0f32.to_be_bytes());
        assert_eq!(&bytes[18..22], &1.5f32.to_be_bytes());
        assert_eq!(&bytes[22..26], &(-2.0f32).to_be_bytes());
    }

    #[test]
    fn truncated_and_trailing_input_is_malformed() {
        let mut bytes = Vec::new();
        synthetic_map().write_to(&mut bytes).unwrap();

        let short = &bytes[..bytes.len() - 3];
        assert!(matches!(
            VoxelMap::read_from(short),
            Err(Error::MalformedMap(_))
        ));

        let mut long = bytes.clone();
        long.push(0);
        assert!(matches!(
            VoxelMap::read_from(long.as_slice()),
            Err(Error::MalformedMap(_))
        ));

        assert!(matches!(
            VoxelMap::read_from(&bytes[..4]),
            Err(Error::MalformedMap(_))
        ));
    }

    #[test]
    fn oversized_header_with_short_body_is_malformed() {
        let mut bytes = Vec::new();
        for _ in 0..3 {
            bytes.extend_from_slice(&u16::MAX.to_be_bytes());
        }
        for _ in 0..3 {
            bytes.extend_from_slice(&1.0f32.to_be_bytes());
        }
        bytes.extend_from_slice(&[0u8; 8]);

        let err = VoxelMap::read_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, Error::MalformedMap(ref msg) if msg.contains("truncated")));
    }

    #[test]
    fn concurrent_pending_writes_do_not_share_staging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.raw");
        let first = VoxelMap::from_data([2, 2, 1], [1.0, 1.0, 1.0], vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        let second = VoxelMap::from_data([1, 1, 1], [1.0, 1.0, 1.0], vec![9.0]).unwrap();

        let mut a = PendingFile::create(&path).unwrap();
        let mut b = PendingFile::create(&path).unwrap();
        first.write_to(a.writer()).unwrap();
        a.commit().unwrap();
        assert_eq!(VoxelMap::load(&path).unwrap(), first);

        second.write_to(b.writer()).unwrap();
        b.commit().unwrap();
        assert_eq!(VoxelMap::load(&path).unwrap(), second);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn dropped_pending_write_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abandoned.raw");
        let mut pending = PendingFile::create(&path).unwrap();
        synthetic_map().write_to(pending.writer()).unwrap();
        drop(pending);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn shape_is_validated() {
        assert!(VoxelMap::new([0, 1, 1], [1.0, 1.0, 1.0]).is_err());
        assert!(VoxelMap::new([1, 1, 1], [1.0, -1.0, 1.0]).is_err());
        assert!(VoxelMap::from_data([2, 2, 2], [1.0, 1.0, 1.0], vec![0.0; 7]).is_err());
    }

    #[test]
    fn indexing_follows_x_fastest_order() {
        let map = synthetic_map();
        assert_eq!(map.index(1, 0, 0), 1);
        assert_eq!(map.index(0, 1, 0), 3);
        assert_eq!(map.index(0, 0, 1), 12);
        assert_eq!(map.get(3, 0, 0), None);
        assert_eq!(map.slice_z(1).unwrap()[0], 100.5);
    }

    #[test]
    fn unopenable_destination_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("map.raw");
        let err = synthetic_map().save(&path).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!path.exists());
    }
}
