mod app;
mod graph;
mod utils;

use std::process::ExitCode;

use app::{create_window, Application};
use graph::context::init_context;
use graph::teardown::shutdown;
use utils::Wait as _;
use winit::event_loop::ControlFlow;

const WIN_WIDTH: u32 = 800;
const WIN_HEIGHT: u32 = 600;
const WIN_TITLE: &str = "Clear Frame";

fn main() -> ExitCode {
    env_logger::init();

    let (event_loop, window) = match create_window(WIN_WIDTH, WIN_HEIGHT, WIN_TITLE) {
        Ok(pair) => pair,
        Err(error) => {
            log::error!("window initialization failed: {error}");
            return ExitCode::SUCCESS;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let bundle = match init_context(&window).wait() {
        Ok(bundle) => bundle,
        Err(error) => {
            log::error!("graphics initialization failed: {error}");
            return ExitCode::SUCCESS;
        }
    };

    let mut application = Application::new(&window, bundle);
    if let Err(error) = event_loop.run_app(&mut application) {
        log::error!("event loop terminated abnormally: {error}");
    }

    shutdown(application.into_bundle());
    drop(window);
    ExitCode::SUCCESS
}
