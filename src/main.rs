mod app;
mod gpu;

use anyhow::Result;
use winit::event_loop::{ControlFlow, EventLoop};

use wave_field::config::{GRID_HEIGHT, GRID_WIDTH};
use wave_field::simulation::WaveField;

use crate::app::App;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let field = WaveField::new(GRID_WIDTH, GRID_HEIGHT)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(field);
    event_loop.run_app(&mut app)?;
    Ok(())
}
