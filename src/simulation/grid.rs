use super::cell::CellStatus;
use super::error::{GridError, Result};
use super::fixed::{color_map, half, saturate, WALL_COLOR};

/// Number of parallel blocks in the shared region.
pub const BLOCK_COUNT: usize = 5;

/// Smallest width or height with at least one interior cell.
pub const MIN_DIMENSION: usize = 3;

const DEFAULT_WORD: i32 = CellStatus::Default.to_word();
const WALL_WORD: i32 = CellStatus::Wall.to_word();

/// One of the five blocks of the shared region, in layout order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Block {
    Image,
    Force,
    Status,
    Displacement,
    Velocity,
}

impl Block {
    /// All blocks in the order they are laid out.
    pub const ALL: [Block; BLOCK_COUNT] = [
        Block::Image,
        Block::Force,
        Block::Status,
        Block::Displacement,
        Block::Velocity,
    ];

    /// Position of the block within the region.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Word offsets of the five blocks inside a larger memory region.
///
/// Each block is `cell_count` words long and blocks follow each other
/// without gaps starting at `base_offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    base_offset: usize,
    width: usize,
    height: usize,
    cell_count: usize,
    end: usize,
}

impl GridLayout {
    /// Validate dimensions and compute the layout.
    pub fn new(base_offset: usize, width: usize, height: usize) -> Result<Self> {
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(GridError::Degenerate { width, height });
        }

        let too_large = GridError::TooLarge { width, height };
        let cell_count = width.checked_mul(height).ok_or(too_large.clone())?;
        let end = cell_count
            .checked_mul(BLOCK_COUNT)
            .and_then(|words| words.checked_add(base_offset))
            .ok_or(too_large)?;

        Ok(Self {
            base_offset,
            width,
            height,
            cell_count,
            end,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn base_offset(&self) -> usize {
        self.base_offset
    }

    /// First word of `block` within the region.
    pub fn block_offset(&self, block: Block) -> usize {
        self.base_offset + block.index() * self.cell_count
    }

    /// Minimum region length in words, including the base offset.
    pub fn required_words(&self) -> usize {
        self.end
    }

    /// Linear index of the cell at column `x`, row `y`.
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Linear index, or an error if the coordinates are off the grid.
    pub fn checked_index(&self, x: usize, y: usize) -> Result<usize> {
        if x < self.width && y < self.height {
            Ok(self.index(x, y))
        } else {
            Err(GridError::OutOfBounds { x, y })
        }
    }

    /// Whether `(x, y)` lies on the outer ring.
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }

    fn check_region(&self, available: usize) -> Result<()> {
        if available < self.end {
            return Err(GridError::RegionTooSmall {
                required: self.end,
                available,
            });
        }
        Ok(())
    }

    /// Split the region into five disjoint mutable blocks.
    pub fn blocks<'a>(&self, region: &'a mut [i32]) -> Result<GridBlocks<'a>> {
        self.check_region(region.len())?;
        let n = self.cell_count;
        let words = &mut region[self.base_offset..self.end];

        let (image, rest) = words.split_at_mut(n);
        let (force, rest) = rest.split_at_mut(n);
        let (status, rest) = rest.split_at_mut(n);
        let (displacement, velocity) = rest.split_at_mut(n);

        Ok(GridBlocks {
            image: bytemuck::cast_slice_mut(image),
            force,
            status,
            displacement,
            velocity,
        })
    }

    /// Split the region into five read-only blocks.
    pub fn view<'a>(&self, region: &'a [i32]) -> Result<GridView<'a>> {
        self.check_region(region.len())?;
        let n = self.cell_count;
        let words = &region[self.base_offset..self.end];

        let (image, rest) = words.split_at(n);
        let (force, rest) = rest.split_at(n);
        let (status, rest) = rest.split_at(n);
        let (displacement, velocity) = rest.split_at(n);

        Ok(GridView {
            image: bytemuck::cast_slice(image),
            force,
            status,
            displacement,
            velocity,
        })
    }
}

/// Mutable struct-of-slices over one grid's region.
pub struct GridBlocks<'a> {
    pub image: &'a mut [u32],
    pub force: &'a mut [i32],
    pub status: &'a mut [i32],
    pub displacement: &'a mut [i32],
    pub velocity: &'a mut [i32],
}

/// Read-only struct-of-slices over one grid's region.
#[derive(Clone, Copy)]
pub struct GridView<'a> {
    pub image: &'a [u32],
    pub force: &'a [i32],
    pub status: &'a [i32],
    pub displacement: &'a [i32],
    pub velocity: &'a [i32],
}

/// Simulation context for one grid living in a host-owned region.
///
/// The kernel holds only the layout. Cell data stays in the region the
/// host passes to every call, and `&mut` access makes each step the sole
/// writer for its duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveKernel {
    layout: GridLayout,
}

impl WaveKernel {
    /// Lay out a `width` x `height` grid at `base_offset` and mark its walls.
    ///
    /// The leading argument is accepted for interface compatibility and
    /// ignored. Only the status words of the outer ring are written; the
    /// host is expected to have zeroed the region beforehand.
    pub fn initialize(
        region: &mut [i32],
        _reserved: i32,
        base_offset: usize,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        let layout = GridLayout::new(base_offset, width, height).map_err(|err| {
            log::warn!("Rejected grid {}x{}: {}", width, height, err);
            err
        })?;

        let blocks = layout.blocks(region).map_err(|err| {
            log::warn!("Rejected grid {}x{}: {}", width, height, err);
            err
        })?;
        reassert_walls(&layout, blocks.status);

        log::debug!(
            "Initialized {}x{} grid at word {} ({} cells, offsets {:?})",
            width,
            height,
            layout.base_offset(),
            layout.cell_count(),
            Block::ALL.map(|block| layout.block_offset(block)),
        );

        Ok(Self { layout })
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Advance the simulation by one time unit.
    ///
    /// Fails only if `region` is shorter than the layout requires.
    pub fn step(&self, region: &mut [i32]) -> Result<()> {
        let blocks = self.layout.blocks(region)?;
        self.step_blocks(blocks)
    }

    /// Run the four passes over already split blocks.
    ///
    /// Passes are not fused: each one reads what the previous one
    /// committed for every cell. Every block must hold exactly
    /// `cell_count` words, otherwise nothing is touched and
    /// `BlockSizeMismatch` names the first offending block.
    pub fn step_blocks(&self, blocks: GridBlocks<'_>) -> Result<()> {
        let expected = self.layout.cell_count;
        let lengths = [
            (Block::Image, blocks.image.len()),
            (Block::Force, blocks.force.len()),
            (Block::Status, blocks.status.len()),
            (Block::Displacement, blocks.displacement.len()),
            (Block::Velocity, blocks.velocity.len()),
        ];
        if let Some(&(block, found)) = lengths.iter().find(|(_, len)| *len != expected) {
            return Err(GridError::BlockSizeMismatch {
                block,
                expected,
                found,
            });
        }

        log::trace!("Step {}x{}", self.layout.width, self.layout.height);

        reassert_walls(&self.layout, blocks.status);
        update_velocity(&self.layout, blocks.status, blocks.displacement, blocks.velocity);
        integrate(blocks.status, blocks.force, blocks.displacement, blocks.velocity);
        rasterize(blocks.status, blocks.displacement, blocks.image);
        Ok(())
    }
}

/// Write WALL on every cell of the outer ring.
fn reassert_walls(layout: &GridLayout, status: &mut [i32]) {
    let (w, h) = (layout.width, layout.height);
    for y in 0..h {
        status[y * w] = WALL_WORD;
        status[y * w + w - 1] = WALL_WORD;
    }
    for x in 0..w {
        status[x] = WALL_WORD;
        status[(h - 1) * w + x] = WALL_WORD;
    }
}

/// Accumulate the 4-neighbor Laplacian of displacement into velocity.
///
/// Only interior cells can be DEFAULT once the walls are reasserted, so
/// every neighbor read stays inside the block.
fn update_velocity(layout: &GridLayout, status: &[i32], u: &[i32], vel: &mut [i32]) {
    let w = layout.width;
    for y in 1..layout.height - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            if status[i] != DEFAULT_WORD {
                continue;
            }

            let center = u[i] as i64;
            let north = u[i - w] as i64;
            let south = u[i + w] as i64;
            let east = u[i + 1] as i64;
            let west = u[i - 1] as i64;

            let uxx = ((west + east) >> 1) - center;
            let uyy = ((north + south) >> 1) - center;
            vel[i] = saturate(vel[i] as i64 + (uxx >> 1) + (uyy >> 1));
        }
    }
}

/// Integrate velocity into displacement, add the force, then halve the force.
fn integrate(status: &[i32], force: &mut [i32], u: &mut [i32], vel: &[i32]) {
    for i in 0..status.len() {
        if status[i] != DEFAULT_WORD {
            continue;
        }
        let f = force[i];
        let moved = saturate(u[i] as i64 + vel[i] as i64);
        u[i] = saturate(f as i64 + moved as i64);
        force[i] = half(f);
    }
}

/// Render every cell: walls transparent, everything else by displacement.
fn rasterize(status: &[i32], u: &[i32], image: &mut [u32]) {
    for ((pixel, &word), &value) in image.iter_mut().zip(status).zip(u) {
        *pixel = if word == WALL_WORD {
            WALL_COLOR
        } else {
            color_map(value)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::fixed::{MAX_FIXED, MIN_FIXED};

    fn zeroed(layout: &GridLayout) -> Vec<i32> {
        vec![0; layout.required_words()]
    }

    fn setup(width: usize, height: usize) -> (WaveKernel, Vec<i32>) {
        let layout = GridLayout::new(0, width, height).unwrap();
        let mut region = zeroed(&layout);
        let kernel = WaveKernel::initialize(&mut region, 0, 0, width, height).unwrap();
        (kernel, region)
    }

    fn assert_walls(kernel: &WaveKernel, region: &[i32]) {
        let layout = kernel.layout();
        let view = layout.view(region).unwrap();
        for y in 0..layout.height() {
            for x in 0..layout.width() {
                if layout.is_border(x, y) {
                    assert_eq!(view.status[layout.index(x, y)], WALL_WORD, "({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn test_layout_offsets() {
        let layout = GridLayout::new(7, 4, 3).unwrap();
        assert_eq!(layout.cell_count(), 12);
        assert_eq!(layout.block_offset(Block::Image), 7);
        assert_eq!(layout.block_offset(Block::Force), 19);
        assert_eq!(layout.block_offset(Block::Status), 31);
        assert_eq!(layout.block_offset(Block::Displacement), 43);
        assert_eq!(layout.block_offset(Block::Velocity), 55);
        assert_eq!(layout.required_words(), 67);
    }

    #[test]
    fn test_degenerate_rejected() {
        assert_eq!(
            GridLayout::new(0, 2, 10),
            Err(GridError::Degenerate { width: 2, height: 10 })
        );
        assert_eq!(
            GridLayout::new(0, 10, 0),
            Err(GridError::Degenerate { width: 10, height: 0 })
        );
        assert!(GridLayout::new(0, 3, 3).is_ok());
    }

    #[test]
    fn test_too_large_rejected() {
        assert_eq!(
            GridLayout::new(0, usize::MAX, 3),
            Err(GridError::TooLarge { width: usize::MAX, height: 3 })
        );
        let side = 1usize << (usize::BITS / 2 - 1);
        assert!(matches!(
            GridLayout::new(0, side, side),
            Err(GridError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_region_too_small() {
        let mut region = vec![0; 124];
        let err = WaveKernel::initialize(&mut region, 0, 0, 5, 5).unwrap_err();
        assert_eq!(err, GridError::RegionTooSmall { required: 125, available: 124 });
    }

    #[test]
    fn test_checked_index() {
        let layout = GridLayout::new(0, 4, 3).unwrap();
        assert_eq!(layout.checked_index(3, 2), Ok(11));
        assert_eq!(layout.checked_index(4, 0), Err(GridError::OutOfBounds { x: 4, y: 0 }));
    }

    #[test]
    fn test_initialize_marks_only_ring() {
        let (kernel, region) = setup(6, 4);
        assert_walls(&kernel, &region);

        let layout = kernel.layout();
        let view = layout.view(&region).unwrap();
        for y in 1..3 {
            for x in 1..5 {
                assert_eq!(view.status[layout.index(x, y)], DEFAULT_WORD);
            }
        }
        // Nothing outside the status block was written
        let status_start = layout.block_offset(Block::Status);
        let status_end = layout.block_offset(Block::Displacement);
        for (i, word) in region.iter().enumerate() {
            if !(status_start..status_end).contains(&i) {
                assert_eq!(*word, 0, "word {} touched", i);
            }
        }
    }

    #[test]
    fn test_initialize_respects_base_offset() {
        let layout = GridLayout::new(10, 3, 3).unwrap();
        let mut region = vec![-7; layout.required_words() + 4];
        for word in &mut region[10..layout.required_words()] {
            *word = 0;
        }
        let kernel = WaveKernel::initialize(&mut region, 99, 10, 3, 3).unwrap();

        assert!(region[..10].iter().all(|&w| w == -7));
        assert!(region[layout.required_words()..].iter().all(|&w| w == -7));
        let view = kernel.layout().view(&region).unwrap();
        assert_eq!(view.status.iter().filter(|&&s| s == WALL_WORD).count(), 8);
        assert_eq!(view.status[4], DEFAULT_WORD);
    }

    #[test]
    fn test_walls_reasserted_each_step() {
        let (kernel, mut region) = setup(5, 5);
        {
            let blocks = kernel.layout().blocks(&mut region).unwrap();
            blocks.status[0] = DEFAULT_WORD;
            blocks.status[2] = CellStatus::PositiveTransmitter.to_word();
            blocks.status[24] = DEFAULT_WORD;
        }
        kernel.step(&mut region).unwrap();
        assert_walls(&kernel, &region);
    }

    #[test]
    fn test_rest_state_is_stable() {
        let (kernel, mut region) = setup(8, 6);
        for _ in 0..50 {
            kernel.step(&mut region).unwrap();
        }
        let view = kernel.layout().view(&region).unwrap();
        assert!(view.displacement.iter().all(|&u| u == 0));
        assert!(view.velocity.iter().all(|&v| v == 0));
        assert!(view.force.iter().all(|&f| f == 0));
        for (i, &pixel) in view.image.iter().enumerate() {
            let expected = if view.status[i] == WALL_WORD { 0 } else { 0xFF00_0000 };
            assert_eq!(pixel, expected);
        }
    }

    #[test]
    fn test_center_impulse_first_step() {
        let (kernel, mut region) = setup(5, 5);
        let center = kernel.layout().index(2, 2);
        kernel.layout().blocks(&mut region).unwrap().force[center] = 0x1000_0000;

        kernel.step(&mut region).unwrap();

        let view = kernel.layout().view(&region).unwrap();
        assert_eq!(view.displacement[center], 0x1000_0000);
        assert_eq!(view.velocity[center], 0);
        assert_eq!(view.force[center], 0x0800_0000);
        assert_eq!(view.image[center], 0xFF40_4040);
        for i in [center - 5, center + 5, center - 1, center + 1] {
            assert_eq!(view.displacement[i], 0);
            assert_eq!(view.velocity[i], 0);
            assert_eq!(view.image[i], 0xFF00_0000);
        }
    }

    #[test]
    fn test_center_impulse_second_step() {
        let (kernel, mut region) = setup(5, 5);
        let layout = *kernel.layout();
        let center = layout.index(2, 2);
        layout.blocks(&mut region).unwrap().force[center] = 0x1000_0000;

        kernel.step(&mut region).unwrap();
        kernel.step(&mut region).unwrap();

        let view = layout.view(&region).unwrap();
        assert_eq!(view.velocity[center], -0x1000_0000);
        assert_eq!(view.displacement[center], 0x0800_0000);
        assert_eq!(view.force[center], 0x0400_0000);

        let north = layout.index(2, 1);
        assert_eq!(view.velocity[north], 0x0400_0000);
        assert_eq!(view.displacement[north], 0x0400_0000);

        // Diagonals only see the impulse through already-moved neighbors
        let diagonal = layout.index(1, 1);
        assert_eq!(view.velocity[diagonal], 0);
        assert_eq!(view.displacement[diagonal], 0);
    }

    #[test]
    fn test_impulse_spreads_symmetrically() {
        let (kernel, mut region) = setup(9, 9);
        let layout = *kernel.layout();
        layout.blocks(&mut region).unwrap().force[layout.index(4, 4)] = 0x2000_0000;

        for _ in 0..12 {
            kernel.step(&mut region).unwrap();
        }

        let view = layout.view(&region).unwrap();
        for y in 0..9 {
            for x in 0..9 {
                let u = view.displacement[layout.index(x, y)];
                assert_eq!(u, view.displacement[layout.index(8 - x, y)]);
                assert_eq!(u, view.displacement[layout.index(x, 8 - y)]);
                assert_eq!(u, view.displacement[layout.index(y, x)]);
            }
        }
    }

    #[test]
    fn test_values_stay_clamped_under_heavy_forcing() {
        let (kernel, mut region) = setup(7, 7);
        let layout = *kernel.layout();
        for step in 0..40 {
            {
                let blocks = layout.blocks(&mut region).unwrap();
                let value = if step % 3 == 0 { i32::MAX } else { i32::MIN };
                for y in 1..6 {
                    for x in (1..6).step_by(2) {
                        blocks.force[layout.index(x, y)] = value;
                    }
                }
            }
            kernel.step(&mut region).unwrap();

            let view = layout.view(&region).unwrap();
            for i in 0..layout.cell_count() {
                assert!((MIN_FIXED..=MAX_FIXED).contains(&view.displacement[i]));
                assert!((MIN_FIXED..=MAX_FIXED).contains(&view.velocity[i]));
            }
        }
    }

    #[test]
    fn test_wall_color_ignores_displacement() {
        let (kernel, mut region) = setup(4, 4);
        let layout = *kernel.layout();
        {
            let blocks = layout.blocks(&mut region).unwrap();
            blocks.displacement.fill(MAX_FIXED);
        }
        kernel.step(&mut region).unwrap();

        let view = layout.view(&region).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let i = layout.index(x, y);
                if layout.is_border(x, y) {
                    assert_eq!(view.image[i], 0);
                    assert_eq!(view.displacement[i], MAX_FIXED);
                } else {
                    assert_ne!(view.image[i], 0);
                }
            }
        }
    }

    #[test]
    fn test_transmitters_rendered_but_not_moved() {
        let (kernel, mut region) = setup(5, 5);
        let layout = *kernel.layout();
        let i = layout.index(2, 2);
        {
            let blocks = layout.blocks(&mut region).unwrap();
            blocks.status[i] = CellStatus::NegativeTransmitter.to_word();
            blocks.displacement[i] = 3 << 22;
            blocks.force[i] = 1234;
        }
        kernel.step(&mut region).unwrap();

        let view = layout.view(&region).unwrap();
        assert_eq!(view.displacement[i], 3 << 22);
        assert_eq!(view.force[i], 1234);
        assert_eq!(view.image[i], 0xFF03_0303);
    }

    #[test]
    fn test_negative_force_decays_by_floor() {
        let (kernel, mut region) = setup(3, 3);
        let layout = *kernel.layout();
        layout.blocks(&mut region).unwrap().force[4] = -5;

        let mut seen = Vec::new();
        for _ in 0..4 {
            kernel.step(&mut region).unwrap();
            seen.push(layout.view(&region).unwrap().force[4]);
        }
        assert_eq!(seen, vec![-3, -2, -1, -1]);
    }

    #[test]
    fn test_step_rejects_short_region() {
        let (kernel, mut region) = setup(3, 3);
        region.pop();
        assert!(matches!(
            kernel.step(&mut region),
            Err(GridError::RegionTooSmall { .. })
        ));
    }

    #[test]
    fn test_step_blocks_rejects_wrong_lengths() {
        let (kernel, _) = setup(5, 5);
        let mut image = [0u32; 25];
        let mut force = [0; 9];
        let mut status = [0; 25];
        let mut displacement = [0; 25];
        let mut velocity = [0; 25];

        let result = kernel.step_blocks(GridBlocks {
            image: &mut image,
            force: &mut force,
            status: &mut status,
            displacement: &mut displacement,
            velocity: &mut velocity,
        });
        assert_eq!(
            result,
            Err(GridError::BlockSizeMismatch { block: Block::Force, expected: 25, found: 9 })
        );
        // Rejected before the walls pass
        assert!(status.iter().all(|&s| s == DEFAULT_WORD));
    }

    #[test]
    fn test_step_blocks_from_other_layout_rejected() {
        let (kernel, _) = setup(5, 5);
        let (_, mut small_region) = setup(3, 3);
        let small = GridLayout::new(0, 3, 3).unwrap();
        let blocks = small.blocks(&mut small_region).unwrap();
        assert!(matches!(
            kernel.step_blocks(blocks),
            Err(GridError::BlockSizeMismatch { block: Block::Image, expected: 25, found: 9 })
        ));
    }

    #[test]
    fn test_velocity_saturates_instead_of_wrapping() {
        let (kernel, mut region) = setup(3, 3);
        let layout = *kernel.layout();
        {
            let blocks = layout.blocks(&mut region).unwrap();
            // Walls hold the crest, the center sits in the deepest trough
            blocks.displacement.fill(MAX_FIXED);
            blocks.displacement[4] = MIN_FIXED;
            blocks.velocity[4] = MAX_FIXED;
        }
        kernel.step(&mut region).unwrap();

        let view = layout.view(&region).unwrap();
        // MAX_FIXED + 2 * 0x3FFF_FFFF would wrap negative in i32
        assert_eq!(view.velocity[4], MAX_FIXED);
        assert_eq!(view.displacement[4], MIN_FIXED + MAX_FIXED);
    }
}
