/// VulkanDriver - Vulkan/winit implementation of the Driver boundary
///
/// Owns the winit event loop and one Vulkan context per window. The event
/// loop is pumped once per tick with a zero timeout, so a pump call never
/// blocks the scheduler.

use ash::vk;
use lumen_app_engine::lumen::driver::{
    BringUpStep, Driver, DriverResult, NativeCode, PumpStatus, WindowHandle,
};
use lumen_app_engine::{lumen_debug, lumen_info};
use rustc_hash::FxHashMap;
use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::EventLoopExtPumpEvents;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::vulkan_window::VulkanWindow;

/// Configuration for the Vulkan back-end
///
/// The shader binaries are SPIR-V bytes, typically materialized through the
/// engine's payload extractor or compiled into the binary.
pub struct DriverConfig {
    /// Application name reported to the Vulkan instance and window title
    pub app_name: String,
    /// SPIR-V vertex shader binary
    pub vertex_shader: Vec<u8>,
    /// SPIR-V fragment shader binary
    pub fragment_shader: Vec<u8>,
}

impl DriverConfig {
    pub fn new(
        app_name: impl Into<String>,
        vertex_shader: Vec<u8>,
        fragment_shader: Vec<u8>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            vertex_shader,
            fragment_shader,
        }
    }
}

/// One managed window: the native winit window plus its Vulkan context
struct WindowState {
    window: Window,
    vulkan: VulkanWindow,
}

/// Vulkan implementation of the driver boundary
pub struct VulkanDriver {
    config: DriverConfig,
    entry: Option<ash::Entry>,
    event_loop: Option<EventLoop<()>>,
    windows: FxHashMap<WindowHandle, WindowState>,
    window_ids: FxHashMap<WindowId, WindowHandle>,
    pending_close: Vec<WindowHandle>,
    next_window: u64,
}

/// Handler fed to `pump_app_events`; only close requests matter here, every
/// other event is redraw/focus noise the fixed-tick loop does not consume
struct EventCollector<'a> {
    close_requested: &'a mut Vec<WindowId>,
}

impl ApplicationHandler for EventCollector<'_> {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::CloseRequested = event {
            self.close_requested.push(window_id);
        }
    }
}

impl VulkanDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            entry: None,
            event_loop: None,
            windows: FxHashMap::default(),
            window_ids: FxHashMap::default(),
            pending_close: Vec::new(),
            next_window: 0,
        }
    }

    fn state_mut(&mut self, window: WindowHandle) -> std::result::Result<&mut WindowState, NativeCode> {
        self.windows
            .get_mut(&window)
            .ok_or(vk::Result::ERROR_UNKNOWN.as_raw())
    }

    fn build_event_loop() -> std::result::Result<EventLoop<()>, String> {
        #[cfg(target_os = "windows")]
        {
            use winit::platform::windows::EventLoopBuilderExtWindows;
            EventLoop::builder()
                .with_any_thread(true)
                .build()
                .map_err(|e| format!("Failed to create event loop: {}", e))
        }
        #[cfg(not(target_os = "windows"))]
        {
            EventLoop::new().map_err(|e| format!("Failed to create event loop: {}", e))
        }
    }
}

impl Driver for VulkanDriver {
    fn load(&mut self) -> std::result::Result<(), String> {
        // Bind the Vulkan loader; failure here means no usable ICD
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| format!("Failed to load Vulkan library: {}", e))?;

        let event_loop = Self::build_event_loop()?;

        lumen_info!("lumen::vulkan", "Vulkan library loaded");
        self.entry = Some(entry);
        self.event_loop = Some(event_loop);
        Ok(())
    }

    fn create_window(&mut self, width: u32, height: u32) -> DriverResult<WindowHandle> {
        let event_loop = self
            .event_loop
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED.as_raw())?;

        let attributes = WindowAttributes::default()
            .with_title(&self.config.app_name)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false)
            .with_visible(false);

        // winit 0.30 deprecates creating windows outside the ApplicationHandler
        // callbacks; the tick-driven model pumps the loop manually instead of
        // handing control to it, so this is the supported escape hatch
        #[allow(deprecated)]
        let window = event_loop
            .create_window(attributes)
            .map_err(|_| vk::Result::ERROR_INITIALIZATION_FAILED.as_raw())?;

        self.next_window += 1;
        let handle = WindowHandle::from_raw(self.next_window);
        self.window_ids.insert(window.id(), handle);
        self.windows.insert(
            handle,
            WindowState {
                window,
                vulkan: VulkanWindow::new(width, height),
            },
        );

        lumen_debug!("lumen::vulkan", "{}: created ({}x{})", handle, width, height);
        Ok(handle)
    }

    fn destroy_window(&mut self, window: WindowHandle) -> DriverResult<()> {
        let mut state = self
            .windows
            .remove(&window)
            .ok_or(vk::Result::ERROR_UNKNOWN.as_raw())?;
        self.window_ids.remove(&state.window.id());
        self.pending_close.retain(|&pending| pending != window);

        state.vulkan.destroy();
        drop(state);

        lumen_debug!("lumen::vulkan", "{}: destroyed", window);
        Ok(())
    }

    fn show_window(&mut self, window: WindowHandle) -> DriverResult<()> {
        let state = self.state_mut(window)?;
        state.window.set_visible(true);
        Ok(())
    }

    fn hide_window(&mut self, window: WindowHandle) -> DriverResult<()> {
        let state = self.state_mut(window)?;
        state.window.set_visible(false);
        Ok(())
    }

    fn pump(&mut self, window: WindowHandle) -> DriverResult<PumpStatus> {
        if !self.windows.contains_key(&window) {
            return Err(vk::Result::ERROR_UNKNOWN.as_raw());
        }
        let event_loop = self
            .event_loop
            .as_mut()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED.as_raw())?;

        // Drain whatever the platform has queued; events for other windows
        // are remembered until their own pump call
        let mut close_requested = Vec::new();
        let mut collector = EventCollector {
            close_requested: &mut close_requested,
        };
        event_loop.pump_app_events(Some(Duration::ZERO), &mut collector);

        for window_id in close_requested {
            if let Some(&handle) = self.window_ids.get(&window_id) {
                if !self.pending_close.contains(&handle) {
                    self.pending_close.push(handle);
                }
            }
        }

        if let Some(position) = self.pending_close.iter().position(|&h| h == window) {
            self.pending_close.remove(position);
            return Ok(PumpStatus::CloseRequested);
        }
        Ok(PumpStatus::Continue)
    }

    fn render(&mut self, window: WindowHandle) -> DriverResult<()> {
        let state = self.state_mut(window)?;
        state.vulkan.render().map_err(|e| e.as_raw())
    }

    fn run_bring_up_step(&mut self, window: WindowHandle, step: BringUpStep) -> DriverResult<()> {
        let entry = self
            .entry
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED.as_raw())?;
        let config = &self.config;
        let state = self
            .windows
            .get_mut(&window)
            .ok_or(vk::Result::ERROR_UNKNOWN.as_raw())?;

        let result = match step {
            BringUpStep::CreateInstance => {
                state
                    .vulkan
                    .create_instance(entry, &state.window, &config.app_name)
            }
            BringUpStep::CreateDebugger => state.vulkan.create_debugger(entry),
            BringUpStep::CreateSurface => state.vulkan.create_surface(entry, &state.window),
            BringUpStep::CreateLogicalDevice => state.vulkan.create_logical_device(),
            BringUpStep::CreateSwapchain => state.vulkan.create_swapchain(),
            BringUpStep::CreateCommandPool => state.vulkan.create_command_pool(),
            BringUpStep::AllocateCommandBuffers => state.vulkan.allocate_command_buffers(),
            BringUpStep::CreateHostBuffers => state.vulkan.create_host_buffers(),
            BringUpStep::CreateDeviceBuffers => state.vulkan.create_device_buffers(),
            BringUpStep::CreateDescriptorPool => state.vulkan.create_descriptor_pool(),
            BringUpStep::AllocateDescriptorSets => state.vulkan.allocate_descriptor_sets(),
            BringUpStep::CreateRenderPass => state.vulkan.create_render_pass(),
            BringUpStep::CreateFramebuffers => state.vulkan.create_framebuffers(),
            BringUpStep::CreatePipeline => state.vulkan.create_pipeline(config),
            BringUpStep::UploadInputData => state.vulkan.upload_input_data(),
            BringUpStep::RecordCommandBuffers => state.vulkan.record_command_buffers(),
            BringUpStep::CreateSemaphores => state.vulkan.create_semaphores(),
        };

        result.map_err(|e| e.as_raw())
    }
}
