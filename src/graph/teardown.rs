//! Ordered release of the GPU handles.
//!
//! Release order is the exact reverse of acquisition: drain the queue, drop
//! device and queue, drop the surface, drop adapter and instance. The window
//! itself is dropped by the caller afterwards. The plan is computed from the
//! set of present handles so any subset releases cleanly.

use super::context::{ContextBundle, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReleaseStep {
    DrainQueue,
    ReleaseContext,
    ReleaseSurface,
    ReleaseDisplay,
}

/// Which handles are present. Everything defaults to absent.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct HandleSet {
    pub context: bool,
    pub surface: bool,
    pub display: bool,
}

pub(crate) fn release_plan(handles: HandleSet) -> Vec<ReleaseStep> {
    let mut plan = Vec::with_capacity(4);
    if handles.context {
        plan.push(ReleaseStep::DrainQueue);
        plan.push(ReleaseStep::ReleaseContext);
    }
    if handles.surface {
        plan.push(ReleaseStep::ReleaseSurface);
    }
    if handles.display {
        plan.push(ReleaseStep::ReleaseDisplay);
    }
    plan
}

/// Releases everything in `bundle`. Never fails; release errors are not
/// observable and submitted work is waited out before the device goes away.
pub fn shutdown(bundle: ContextBundle<'_>) {
    let mut parts = Parts::from(bundle);
    for step in release_plan(parts.handle_set()) {
        parts.release(step);
    }
    log::debug!("graphics context released");
}

struct Parts<'window> {
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    surface: Option<Surface<'window>>,
    display: Option<(wgpu::Adapter, wgpu::Instance)>,
}

impl<'window> From<ContextBundle<'window>> for Parts<'window> {
    fn from(bundle: ContextBundle<'window>) -> Self {
        Self {
            device: Some(bundle.device),
            queue: Some(bundle.queue),
            surface: Some(bundle.surface),
            display: Some((bundle.adapter, bundle.instance)),
        }
    }
}

impl Parts<'_> {
    fn handle_set(&self) -> HandleSet {
        HandleSet {
            context: self.device.is_some(),
            surface: self.surface.is_some(),
            display: self.display.is_some(),
        }
    }

    fn release(&mut self, step: ReleaseStep) {
        match step {
            ReleaseStep::DrainQueue => {
                if let Some(device) = &self.device {
                    device.poll(wgpu::MaintainBase::Wait);
                }
            }
            ReleaseStep::ReleaseContext => {
                self.queue.take();
                self.device.take();
            }
            ReleaseStep::ReleaseSurface => {
                self.surface.take();
            }
            ReleaseStep::ReleaseDisplay => {
                self.display.take();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_handle_set_releases_in_reverse_acquisition_order() {
        let plan = release_plan(HandleSet {
            context: true,
            surface: true,
            display: true,
        });
        assert_eq!(
            plan,
            [
                ReleaseStep::DrainQueue,
                ReleaseStep::ReleaseContext,
                ReleaseStep::ReleaseSurface,
                ReleaseStep::ReleaseDisplay,
            ]
        );
    }

    #[test]
    fn empty_handle_set_releases_nothing() {
        assert!(release_plan(HandleSet::default()).is_empty());
    }

    #[test]
    fn display_only_skips_context_and_surface_steps() {
        // Earliest-possible bootstrap failure: only the display connection
        // was ever acquired.
        let plan = release_plan(HandleSet {
            display: true,
            ..HandleSet::default()
        });
        assert_eq!(plan, [ReleaseStep::ReleaseDisplay]);
    }

    #[test]
    fn missing_surface_still_releases_context_and_display() {
        let plan = release_plan(HandleSet {
            context: true,
            surface: false,
            display: true,
        });
        assert_eq!(
            plan,
            [
                ReleaseStep::DrainQueue,
                ReleaseStep::ReleaseContext,
                ReleaseStep::ReleaseDisplay,
            ]
        );
    }
}
