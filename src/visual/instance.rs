//! Block instances produced from frames, and their lifetimes.

use crate::core::{IVec3, UVec3};
use crate::frame::GenerationFrame;
use crate::palette::{MeshPaletteEntry, ResolvedPalette, Rgb};

/// How long an instance stays visible
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lifetime {
    /// Until the sink clears it
    Persistent,
    /// Seconds
    Timed(f32),
}

impl Lifetime {
    /// Lifetime of a recorded change. Non-positive persistence is permanent.
    pub fn from_persistence(persistence: i32, tick: f32) -> Self {
        if persistence <= 0 {
            Lifetime::Persistent
        } else {
            Lifetime::Timed(persistence as f32 * tick)
        }
    }

    pub fn seconds(&self) -> Option<f32> {
        match self {
            Lifetime::Persistent => None,
            Lifetime::Timed(s) => Some(*s),
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Lifetime::Persistent)
    }
}

/// One block placed in the world
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockInstance {
    pub position: IVec3,
    pub mesh: MeshPaletteEntry,
    pub lifetime: Lifetime,
}

/// Instances dispatched together
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisualBatch {
    /// Owning generation iteration; `None` for replay
    pub iteration: Option<u32>,
    /// Frame index within the iteration or recording
    pub frame: usize,
    pub instances: Vec<BlockInstance>,
}

impl VisualBatch {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// World offset of a grid cell. Grid z is world up.
pub fn world_offset(cell: UVec3) -> IVec3 {
    IVec3::new(cell.x as i32, cell.z as i32, cell.y as i32)
}

/// Instances for every visible cell of a full frame.
///
/// 3-D frames skip the empty symbol; flat frames keep it so the floor
/// stays visible.
pub fn frame_instances(
    frame: &GenerationFrame,
    palette: &ResolvedPalette,
    origin: IVec3,
    lifetime: Lifetime,
) -> Vec<BlockInstance> {
    let size = frame.size();
    let skip_empty = !size.is_flat();
    let empty = frame.empty_symbol();
    let mut unknown = 0usize;

    let instances = frame
        .values()
        .iter()
        .enumerate()
        .filter(|(_, symbol)| !(skip_empty && **symbol == empty))
        .map(|(index, &symbol)| {
            let mesh = palette.mesh(symbol).unwrap_or_else(|| {
                unknown += 1;
                MeshPaletteEntry::cube(Rgb::WHITE)
            });
            BlockInstance {
                position: origin + world_offset(size.cell(index)),
                mesh,
                lifetime,
            }
        })
        .collect();

    if unknown > 0 {
        log::warn!("{} cells use symbols missing from the palette", unknown);
    }
    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridSize;
    use crate::palette::{resolve, BasePalette, BlockStateCatalog, MappingItem};

    fn palette() -> ResolvedPalette {
        let base = BasePalette::from_json_str(
            r#"[{"symbol": "B", "value": "000000"}, {"symbol": "W", "value": "FFFFFF"}]"#,
        )
        .unwrap();
        let custom = [MappingItem::new('R', Rgb::new(255, 0, 0)).with_block("red_wool")];
        resolve(&base, &custom, &BlockStateCatalog)
    }

    #[test]
    fn test_lifetime_from_persistence() {
        assert_eq!(Lifetime::from_persistence(3, 0.5), Lifetime::Timed(1.5));
        assert!(Lifetime::from_persistence(0, 0.5).is_persistent());
        assert!(Lifetime::from_persistence(-1, 0.5).is_persistent());
        assert_eq!(Lifetime::Timed(2.0).seconds(), Some(2.0));
    }

    #[test]
    fn test_three_d_skips_empty() {
        let frame = GenerationFrame::new("BRBW".chars().collect(), GridSize::new(2, 1, 2), 0, 'B').unwrap();
        let instances = frame_instances(&frame, &palette(), IVec3::new(2, 0, 2), Lifetime::Persistent);

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].position, IVec3::new(3, 0, 2));
        assert_eq!(instances[0].mesh.mesh_index, 1);
        assert_eq!(instances[1].position, IVec3::new(3, 1, 2));
        assert!(instances[1].mesh.is_cube());
    }

    #[test]
    fn test_flat_keeps_empty() {
        let frame = GenerationFrame::new("BW".chars().collect(), GridSize::new(2, 1, 1), 0, 'B').unwrap();
        let instances = frame_instances(&frame, &palette(), IVec3::ZERO, Lifetime::Timed(0.1));
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].mesh.color, Rgb::BLACK);
        assert_eq!(instances[1].lifetime, Lifetime::Timed(0.1));
    }
}
