use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::graph::context::ContextBundle;
use crate::utils::time;

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("event loop creation failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window creation failed: {0}")]
    CreateWindow(#[from] winit::error::OsError),
}

/// Creates the process-wide event loop (fails if one already exists) and one
/// resizable top-level window of the given size, shown on creation.
pub fn create_window(
    width: u32,
    height: u32,
    title: &str,
) -> Result<(EventLoop<()>, Window), WindowError> {
    let event_loop = EventLoop::new()?;
    let attributes = Window::default_attributes()
        .with_title(title)
        .with_inner_size(PhysicalSize::new(width, height));
    #[allow(deprecated)]
    let window = event_loop.create_window(attributes)?;
    Ok((event_loop, window))
}

/// Window-system events the loop cares about. Everything else collapses to
/// `Other` and falls through to default handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    CloseRequested,
    RedrawRequested,
    Other,
}

/// What the handler should do after dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Render,
    Exit,
    Ignore,
}

/// The frame loop's whole state. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

impl LoopState {
    /// The only place the loop state is written. A close request stops the
    /// loop exactly once; after that every event is ignored, renders
    /// included.
    pub fn dispatch(&mut self, event: HostEvent) -> Command {
        match (*self, event) {
            (LoopState::Running, HostEvent::CloseRequested) => {
                *self = LoopState::Stopped;
                Command::Exit
            }
            (LoopState::Running, HostEvent::RedrawRequested) => Command::Render,
            (LoopState::Running, HostEvent::Other) | (LoopState::Stopped, _) => Command::Ignore,
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, LoopState::Running)
    }
}

pub struct Application<'window> {
    window: &'window Window,
    bundle: ContextBundle<'window>,
    state: LoopState,
    frame_counter: u64,
}

impl<'window> Application<'window> {
    pub fn new(window: &'window Window, bundle: ContextBundle<'window>) -> Self {
        Self {
            window,
            bundle,
            state: LoopState::Running,
            frame_counter: 0,
        }
    }

    /// Hands the GPU handles back for ordered teardown after the loop exits.
    pub fn into_bundle(self) -> ContextBundle<'window> {
        self.bundle
    }

    fn draw(&mut self) {
        if let Err(error) = self.bundle.surface.begin_drawing() {
            log::warn!("skipping frame: {error}");
            return;
        }

        let mut encoder = self
            .bundle
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        let render_pass = self.bundle.surface.create_render_pass(&mut encoder, CLEAR_COLOR);
        drop(render_pass);
        self.bundle.queue.submit([encoder.finish()]);

        self.window.pre_present_notify();
        self.bundle.surface.present();
    }
}

impl ApplicationHandler for Application<'_> {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let host_event = match event {
            WindowEvent::CloseRequested => HostEvent::CloseRequested,
            WindowEvent::RedrawRequested => HostEvent::RedrawRequested,
            _ => HostEvent::Other,
        };
        match self.state.dispatch(host_event) {
            Command::Render => {
                let (frame_time, ()) = time(|| self.draw());
                self.frame_counter = self.frame_counter.wrapping_add(1);
                log::trace!(
                    "frame {} time: {}s",
                    self.frame_counter,
                    frame_time.as_secs_f64()
                );
            }
            Command::Exit => event_loop.exit(),
            Command::Ignore => (),
        }
    }

    // Runs when the event queue is momentarily empty. Event draining always
    // has priority over rendering; with `ControlFlow::Poll` this is the
    // render slot of a non-blocking pump. Tunable: `ControlFlow::Wait` here
    // would make the loop event-driven instead.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.state.is_running() {
            self.window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_stream(events: &[HostEvent]) -> (LoopState, Vec<Command>) {
        let mut state = LoopState::Running;
        let commands = events.iter().map(|&event| state.dispatch(event)).collect();
        (state, commands)
    }

    #[test]
    fn stays_running_without_close_request() {
        let events = [
            HostEvent::Other,
            HostEvent::RedrawRequested,
            HostEvent::RedrawRequested,
            HostEvent::Other,
            HostEvent::RedrawRequested,
        ];
        let (state, commands) = run_stream(&events);
        assert_eq!(state, LoopState::Running);
        let renders = commands.iter().filter(|&&c| c == Command::Render).count();
        assert_eq!(renders, 3);
        assert!(!commands.contains(&Command::Exit));
    }

    #[test]
    fn close_request_stops_exactly_once_regardless_of_position() {
        let filler = [
            HostEvent::RedrawRequested,
            HostEvent::Other,
            HostEvent::RedrawRequested,
            HostEvent::RedrawRequested,
        ];
        for position in 0..=filler.len() {
            let mut events: Vec<HostEvent> = filler.to_vec();
            events.insert(position, HostEvent::CloseRequested);
            let (state, commands) = run_stream(&events);
            assert_eq!(state, LoopState::Stopped);
            let exits = commands.iter().filter(|&&c| c == Command::Exit).count();
            assert_eq!(exits, 1);
            // No render is performed after the close request was observed.
            assert!(
                commands[position + 1..]
                    .iter()
                    .all(|&c| c == Command::Ignore)
            );
        }
    }

    #[test]
    fn second_close_request_is_ignored() {
        let mut state = LoopState::Running;
        assert_eq!(state.dispatch(HostEvent::CloseRequested), Command::Exit);
        assert_eq!(state.dispatch(HostEvent::CloseRequested), Command::Ignore);
        assert_eq!(state, LoopState::Stopped);
    }

    #[test]
    fn other_events_are_ignored_while_running() {
        let mut state = LoopState::Running;
        assert_eq!(state.dispatch(HostEvent::Other), Command::Ignore);
        assert_eq!(state, LoopState::Running);
    }
}
