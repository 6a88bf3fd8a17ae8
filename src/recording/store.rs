//! Recording serialization and disk I/O.
//!
//! Recordings are JSON documents. Files whose name ends in `.lz4` hold the
//! same JSON compressed with LZ4 (size-prepended block format).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::{Error, GridSize, Result, UVec3};
use crate::frame::ChangeTracker;
use crate::palette::{BlockCatalog, BlockStateCatalog};
use super::model::{Recording, RecordingFile};

/// File extension for plain recordings
pub const RECORDING_EXTENSION: &str = "json";
/// Extra extension marking compressed recordings
pub const COMPRESSED_EXTENSION: &str = "lz4";

/// Deterministic recording name for an iteration of a model
pub fn recording_name(model: &str, iteration: u32) -> String {
    let model = model.trim();
    let model = if model.is_empty() { "Untitled" } else { model };
    let safe: String = model
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{}_#{}", safe, iteration)
}

/// Encode one frame as `x y z value` quadruples
fn encode_frame(changes: &[crate::frame::BlockChange]) -> String {
    let mut out = String::with_capacity(changes.len() * 12);
    for change in changes {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!(
            "{} {} {} {}",
            change.cell.x, change.cell.y, change.cell.z, change.value
        ));
    }
    out
}

/// Parse one frame string into `(cell, value)` pairs.
///
/// Any fault rejects the whole frame.
fn decode_frame(text: &str, size: GridSize, palette_len: usize) -> std::result::Result<Vec<(UVec3, u16)>, String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() % 4 != 0 {
        return Err(format!("{} numbers, not a multiple of 4", tokens.len()));
    }

    let mut out = Vec::with_capacity(tokens.len() / 4);
    for quad in tokens.chunks_exact(4) {
        let mut nums = [0u32; 4];
        for (num, token) in nums.iter_mut().zip(quad) {
            *num = token.parse().map_err(|_| format!("invalid number {:?}", token))?;
        }
        let cell = UVec3::new(nums[0], nums[1], nums[2]);
        if !size.contains(cell) {
            return Err(format!("cell ({}, {}, {}) outside {}", cell.x, cell.y, cell.z, size));
        }
        if nums[3] as usize >= palette_len {
            return Err(format!("value {} outside palette of {}", nums[3], palette_len));
        }
        out.push((cell, nums[3] as u16));
    }
    Ok(out)
}

/// Convert a recording to its file form
pub fn encode(recording: &Recording) -> RecordingFile {
    let size = recording.size();
    RecordingFile {
        palette: recording.palette().to_vec(),
        size_x: size.x,
        size_y: size.y,
        size_z: size.z,
        frame_data: recording.frames().iter().map(|f| encode_frame(f)).collect(),
    }
}

/// Rebuild a recording from its file form, recomputing persistence.
///
/// A malformed frame loads as an empty frame; the rest still load. Memory
/// use follows the number of changes, so the header size alone never
/// forces a large allocation.
pub fn decode<C: BlockCatalog + ?Sized>(file: RecordingFile, catalog: &C) -> Result<Recording> {
    let size = GridSize::new(file.size_x, file.size_y, file.size_z);
    if size.volume() == 0 {
        return Err(Error::Recording(format!("Invalid recording size {}", size)));
    }
    if file.palette.len() > u16::MAX as usize + 1 {
        return Err(Error::Recording(format!("Palette too large: {}", file.palette.len())));
    }

    let mut tracker = ChangeTracker::new(size);
    let mut malformed = 0;

    for (index, text) in file.frame_data.iter().enumerate() {
        tracker.begin_frame();
        match decode_frame(text, size, file.palette.len()) {
            Ok(changes) => {
                for (cell, value) in changes {
                    tracker.push(cell, value);
                }
            }
            Err(reason) => {
                log::warn!("Malformed frame {}: {}, treating as empty", index, reason);
                malformed += 1;
            }
        }
    }

    if malformed > 0 || tracker.fault_count() > 0 {
        log::warn!(
            "Recording decoded with {} malformed frames and {} persistence faults",
            malformed,
            tracker.fault_count()
        );
    }

    Ok(Recording::new(file.palette, size, tracker.into_frames(), catalog))
}

/// Serialize to JSON bytes
pub fn to_bytes(recording: &Recording) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&encode(recording))?)
}

/// Parse JSON bytes
pub fn from_bytes<C: BlockCatalog + ?Sized>(bytes: &[u8], catalog: &C) -> Result<Recording> {
    let file: RecordingFile = serde_json::from_slice(bytes)?;
    decode(file, catalog)
}

fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == COMPRESSED_EXTENSION)
}

fn pack(bytes: Vec<u8>, compressed: bool) -> Vec<u8> {
    if compressed {
        lz4_flex::compress_prepend_size(&bytes)
    } else {
        bytes
    }
}

fn unpack(bytes: Vec<u8>, compressed: bool) -> Result<Vec<u8>> {
    if compressed {
        lz4_flex::decompress_size_prepended(&bytes)
            .map_err(|e| Error::Recording(format!("LZ4 decompression failed: {}", e)))
    } else {
        Ok(bytes)
    }
}

/// Directory of recordings
#[derive(Clone)]
pub struct RecordingStore {
    dir: PathBuf,
    compress: bool,
    catalog: Arc<dyn BlockCatalog + Send + Sync>,
}

impl RecordingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            compress: false,
            catalog: Arc::new(BlockStateCatalog),
        }
    }

    /// Write new recordings LZ4-compressed
    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn BlockCatalog + Send + Sync>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path a recording named `name` is saved to
    pub fn path_for(&self, name: &str) -> PathBuf {
        let file = if self.compress {
            format!("{}.{}.{}", name, RECORDING_EXTENSION, COMPRESSED_EXTENSION)
        } else {
            format!("{}.{}", name, RECORDING_EXTENSION)
        };
        self.dir.join(file)
    }

    /// Save to file (sync)
    pub fn save_sync(&self, name: &str, recording: &Recording) -> Result<PathBuf> {
        let path = self.path_for(name);
        let bytes = pack(to_bytes(recording)?, self.compress);
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, bytes)?;
        log::info!(
            "Recording saved to {}: {} frames, {} changes",
            path.display(),
            recording.frame_count(),
            recording.change_count()
        );
        Ok(path)
    }

    /// Load from file (sync)
    pub fn load_sync(&self, path: &Path) -> Result<Recording> {
        let bytes = unpack(std::fs::read(path)?, is_compressed(path))?;
        let recording = from_bytes(&bytes, self.catalog.as_ref())?;
        log::info!(
            "Recording loaded from {}: size {}, {} frames",
            path.display(),
            recording.size(),
            recording.frame_count()
        );
        Ok(recording)
    }

    /// Save to file
    pub async fn save(&self, name: &str, recording: &Recording) -> Result<PathBuf> {
        let path = self.path_for(name);
        let bytes = pack(to_bytes(recording)?, self.compress);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, bytes).await?;
        log::info!("Recording saved to {}", path.display());
        Ok(path)
    }

    /// Load from file
    pub async fn load(&self, path: &Path) -> Result<Recording> {
        let bytes = unpack(tokio::fs::read(path).await?, is_compressed(path))?;
        from_bytes(&bytes, self.catalog.as_ref())
    }
}

impl std::fmt::Debug for RecordingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingStore")
            .field("dir", &self.dir)
            .field("compress", &self.compress)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{BlockChange, FrameDiffer, GenerationFrame};
    use crate::palette::Rgb;
    use crate::recording::model::RecordingPaletteEntry;

    fn palette() -> Vec<RecordingPaletteEntry> {
        vec![
            RecordingPaletteEntry { symbol: Some('.'), color: Rgb::BLACK, block: None },
            RecordingPaletteEntry { symbol: Some('a'), color: Rgb::new(9, 9, 9), block: Some("stone".into()) },
        ]
    }

    fn file(frames: &[&str]) -> RecordingFile {
        RecordingFile {
            palette: palette(),
            size_x: 2,
            size_y: 2,
            size_z: 1,
            frame_data: frames.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_recording_name() {
        assert_eq!(recording_name("Maze", 3), "Maze_#3");
        assert_eq!(recording_name("  ", 1), "Untitled_#1");
        assert_eq!(recording_name("dir/Model", 2), "dir_Model_#2");
    }

    #[test]
    fn test_decode_recomputes_persistence() {
        let recording = decode(file(&["0 0 0 1", "", "0 0 0 0 1 1 0 1"]), &BlockStateCatalog).unwrap();

        assert_eq!(recording.frame_count(), 3);
        assert_eq!(recording.frames()[0][0].persistence, 2);
        assert!(recording.frames()[1].is_empty());
        assert!(recording.frames()[2].iter().all(BlockChange::is_permanent));
        assert_eq!(recording.frames()[2][1].cell, UVec3::new(1, 1, 0));
    }

    #[test]
    fn test_malformed_frame_is_skipped() {
        let recording = decode(
            file(&["0 0 0 1", "1 0 0", "1 1 0 1", "0 0 x 1", "5 0 0 1", "0 0 0 7"]),
            &BlockStateCatalog,
        )
        .unwrap();

        assert_eq!(recording.frame_count(), 6);
        assert_eq!(recording.frames()[0].len(), 1);
        assert!(recording.frames()[1].is_empty());
        assert_eq!(recording.frames()[2].len(), 1);
        assert!(recording.frames()[3].is_empty());
        assert!(recording.frames()[4].is_empty());
        assert!(recording.frames()[5].is_empty());
        // Cell (0,0,0) is never touched again by a valid frame
        assert!(recording.frames()[0][0].is_permanent());
    }

    #[test]
    fn test_decode_rejects_empty_grid() {
        let mut bad = file(&[]);
        bad.size_z = 0;
        assert!(matches!(decode(bad, &BlockStateCatalog), Err(Error::Recording(_))));
    }

    #[test]
    fn test_decode_huge_header_stays_small() {
        let mut huge = file(&["1023 1023 255 1", "1023 1023 255 0"]);
        huge.size_x = 1024;
        huge.size_y = 1024;
        huge.size_z = 256;

        let recording = decode(huge, &BlockStateCatalog).unwrap();
        assert_eq!(recording.size(), GridSize::new(1024, 1024, 256));
        assert_eq!(recording.change_count(), 2);
        assert_eq!(recording.frames()[0][0].persistence, 1);

        let json = r#"{"palette": [], "size_x": 4294967295, "size_y": 4294967295, "size_z": 4294967295, "frame_data": ["0 0 0 0"]}"#;
        let recording = from_bytes(json.as_bytes(), &BlockStateCatalog).unwrap();
        assert!(recording.frames()[0].is_empty());
    }

    #[test]
    fn test_bytes_roundtrip_preserves_changes() {
        let size = GridSize::new(2, 2, 1);
        let mut differ = FrameDiffer::new();
        for (step, values) in ["....", "a...", "aa..", ".a.a"].iter().enumerate() {
            differ
                .push_frame(GenerationFrame::new(values.chars().collect(), size, step as u32, '.').unwrap())
                .unwrap();
        }
        let log = differ.finish().unwrap();
        let original = Recording::new(palette(), size, log.frames, &BlockStateCatalog);

        let bytes = to_bytes(&original).unwrap();
        let loaded = from_bytes(&bytes, &BlockStateCatalog).unwrap();

        assert_eq!(loaded.frames(), original.frames());
        assert_eq!(loaded.palette(), original.palette());
        assert_eq!(loaded.meshes(), original.meshes());
    }

    #[test]
    fn test_save_and_load_sync() {
        let dir = tempfile::tempdir().unwrap();
        let recording = decode(file(&["0 0 0 1", "0 0 0 0"]), &BlockStateCatalog).unwrap();

        for compress in [false, true] {
            let store = RecordingStore::new(dir.path()).compressed(compress);
            let path = store.save_sync("Test_#1", &recording).unwrap();
            assert_eq!(path.extension().unwrap() == "lz4", compress);

            let loaded = store.load_sync(&path).unwrap();
            assert_eq!(loaded.frames(), recording.frames());
            assert_eq!(loaded.size(), recording.size());
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordingStore::new(dir.path());
        assert!(matches!(store.load_sync(&dir.path().join("nope.json")), Err(Error::Io(_))));
    }

    #[test]
    fn test_async_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordingStore::new(dir.path()).compressed(true);
        let recording = decode(file(&["1 0 0 1"]), &BlockStateCatalog).unwrap();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let loaded = runtime.block_on(async {
            let path = store.save("Async_#1", &recording).await.unwrap();
            store.load(&path).await.unwrap()
        });
        assert_eq!(loaded.frames(), recording.frames());
    }
}
