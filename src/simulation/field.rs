use super::cell::{Cell, CellStatus};
use super::error::Result;
use super::grid::{GridBlocks, GridLayout, GridView, WaveKernel};

/// Grid that owns its region: a zeroed word buffer plus its kernel.
///
/// This is the host side of the contract: it zeroes the region, writes
/// forces between steps and reads the image afterwards.
pub struct WaveField {
    kernel: WaveKernel,
    region: Vec<i32>,
}

/// Summary of the displacement field over all non-wall cells.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FieldStats {
    pub min: i32,
    pub max: i32,
    /// Mean of `|displacement|`, in fixed-point units
    pub mean_abs: f64,
    /// Cells with nonzero displacement or velocity
    pub active_cells: usize,
}

impl WaveField {
    /// Create a zeroed field of the given size.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let layout = GridLayout::new(0, width, height)?;
        let mut region = vec![0; layout.required_words()];
        let kernel = WaveKernel::initialize(&mut region, 0, 0, width, height)?;
        Ok(Self { kernel, region })
    }

    pub fn width(&self) -> usize {
        self.kernel.layout().width()
    }

    pub fn height(&self) -> usize {
        self.kernel.layout().height()
    }

    pub fn layout(&self) -> &GridLayout {
        self.kernel.layout()
    }

    /// Raw region, in block order.
    pub fn region(&self) -> &[i32] {
        &self.region
    }

    // The region is sized from the layout in `new` and never resized,
    // so splitting it cannot fail.
    fn view(&self) -> GridView<'_> {
        self.kernel
            .layout()
            .view(&self.region)
            .expect("owned region sized from layout")
    }

    fn blocks(&mut self) -> GridBlocks<'_> {
        let layout = *self.kernel.layout();
        layout
            .blocks(&mut self.region)
            .expect("owned region sized from layout")
    }

    /// Advance one time unit.
    pub fn step(&mut self) {
        let kernel = self.kernel;
        kernel
            .step_blocks(self.blocks())
            .expect("owned region sized from layout");
    }

    /// Zero every block and lay the walls down again.
    pub fn reset(&mut self) -> Result<()> {
        self.region.fill(0);
        let layout = *self.kernel.layout();
        self.kernel =
            WaveKernel::initialize(&mut self.region, 0, 0, layout.width(), layout.height())?;
        log::info!("Field reset ({}x{})", layout.width(), layout.height());
        Ok(())
    }

    /// Image written by the last step, one packed RGBA word per cell.
    pub fn image(&self) -> &[u32] {
        self.view().image
    }

    /// Image as bytes, `[R, G, B, A]` per cell on little-endian hosts.
    pub fn image_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.view().image)
    }

    /// Snapshot of one cell's fields.
    pub fn cell(&self, x: usize, y: usize) -> Result<Cell> {
        let i = self.layout().checked_index(x, y)?;
        let view = self.view();
        Ok(Cell {
            color: view.image[i],
            force: view.force[i],
            status: view.status[i],
            displacement: view.displacement[i],
            velocity: view.velocity[i],
        })
    }

    pub fn force(&self, x: usize, y: usize) -> Result<i32> {
        Ok(self.cell(x, y)?.force)
    }

    pub fn displacement(&self, x: usize, y: usize) -> Result<i32> {
        Ok(self.cell(x, y)?.displacement)
    }

    pub fn velocity(&self, x: usize, y: usize) -> Result<i32> {
        Ok(self.cell(x, y)?.velocity)
    }

    /// Decoded status, `None` for words outside the known set.
    pub fn status(&self, x: usize, y: usize) -> Result<Option<CellStatus>> {
        Ok(self.cell(x, y)?.status())
    }

    /// Overwrite the force of one cell.
    pub fn set_force(&mut self, x: usize, y: usize, value: i32) -> Result<()> {
        let i = self.layout().checked_index(x, y)?;
        self.blocks().force[i] = value;
        Ok(())
    }

    /// Add to the force of one cell, saturating at the `i32` range.
    pub fn add_force(&mut self, x: usize, y: usize, delta: i32) -> Result<()> {
        let i = self.layout().checked_index(x, y)?;
        let blocks = self.blocks();
        blocks.force[i] = blocks.force[i].saturating_add(delta);
        Ok(())
    }

    /// Change the status of one cell.
    ///
    /// Walls placed on the outer ring are the only ones that survive; any
    /// other status written there is replaced at the next step.
    pub fn set_status(&mut self, x: usize, y: usize, status: CellStatus) -> Result<()> {
        let i = self.layout().checked_index(x, y)?;
        if self.layout().is_border(x, y) && status != CellStatus::Wall {
            log::debug!(
                "({}, {}) is on the outer ring; {:?} lasts until the next step",
                x,
                y,
                status
            );
        }
        self.blocks().status[i] = status.to_word();
        Ok(())
    }

    /// Add `strength` to the force of every free cell within `radius` of
    /// `(cx, cy)`. Returns the number of cells touched.
    pub fn inject_disc(&mut self, cx: f32, cy: f32, radius: f32, strength: i32) -> usize {
        let layout = *self.layout();
        let blocks = self.blocks();

        let r = radius.max(0.0);
        let x0 = (cx - r).floor().max(0.0) as usize;
        let y0 = (cy - r).floor().max(0.0) as usize;
        let x1 = ((cx + r).ceil().max(0.0) as usize).min(layout.width() - 1);
        let y1 = ((cy + r).ceil().max(0.0) as usize).min(layout.height() - 1);

        let mut touched = 0;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy > r * r {
                    continue;
                }
                let i = layout.index(x, y);
                if blocks.status[i] != CellStatus::Default.to_word() {
                    continue;
                }
                blocks.force[i] = blocks.force[i].saturating_add(strength);
                touched += 1;
            }
        }
        touched
    }

    /// Displacement statistics over all non-wall cells.
    pub fn stats(&self) -> FieldStats {
        let view = self.view();
        let wall = CellStatus::Wall.to_word();

        let mut stats = FieldStats {
            min: i32::MAX,
            max: i32::MIN,
            ..Default::default()
        };
        let mut sum_abs = 0.0;
        let mut counted = 0usize;

        for i in 0..view.status.len() {
            if view.status[i] == wall {
                continue;
            }
            let u = view.displacement[i];
            stats.min = stats.min.min(u);
            stats.max = stats.max.max(u);
            sum_abs += (u as f64).abs();
            counted += 1;
            if u != 0 || view.velocity[i] != 0 {
                stats.active_cells += 1;
            }
        }

        if counted == 0 {
            return FieldStats::default();
        }
        stats.mean_abs = sum_abs / counted as f64;
        stats
    }
}
