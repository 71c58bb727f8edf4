/// VulkanWindow - per-window Vulkan context, populated step by step
///
/// Every field that a bring-up step produces starts out as `None` and is
/// filled in when the core dispatches that step. A step whose preconditions
/// are missing fails with `ERROR_INITIALIZATION_FAILED` instead of
/// panicking, so an out-of-order dispatch surfaces as a driver error the
/// core can report.

use ash::vk;
use gpu_allocator::vulkan::{
    Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc,
};
use gpu_allocator::MemoryLocation;
use lumen_app_engine::{lumen_error, lumen_warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CString;

use crate::vulkan_driver::DriverConfig;

/// Result of one bring-up step or per-tick call, carrying the raw Vulkan code
pub(crate) type StepResult<T = ()> = std::result::Result<T, vk::Result>;

const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Vertex layout of the built-in triangle geometry
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 2],
    color: [f32; 3],
}

const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [0.0, -0.5],
        color: [1.0, 0.0, 0.0],
    },
    Vertex {
        position: [0.5, 0.5],
        color: [0.0, 1.0, 0.0],
    },
    Vertex {
        position: [-0.5, 0.5],
        color: [0.0, 0.0, 1.0],
    },
];

/// Uniform data consumed by the vertex stage (a whole-scene tint)
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    tint: [f32; 4],
}

/// A buffer plus its gpu-allocator backing allocation
struct AllocatedBuffer {
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
}

/// Per-window Vulkan context
///
/// Owns every native object brought up for one window. Teardown happens in
/// [`VulkanWindow::destroy`], in reverse bring-up order.
pub(crate) struct VulkanWindow {
    width: u32,
    height: u32,

    instance: Option<ash::Instance>,
    #[cfg(feature = "vulkan-validation")]
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,

    surface: Option<vk::SurfaceKHR>,
    surface_loader: Option<ash::khr::surface::Instance>,

    physical_device: Option<vk::PhysicalDevice>,
    device: Option<ash::Device>,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    graphics_queue_family: u32,
    allocator: Option<Allocator>,

    swapchain_loader: Option<ash::khr::swapchain::Device>,
    swapchain: Option<vk::SwapchainKHR>,
    swapchain_images: Vec<vk::Image>,
    swapchain_image_views: Vec<vk::ImageView>,
    swapchain_format: vk::Format,
    swapchain_extent: vk::Extent2D,

    command_pool: Option<vk::CommandPool>,
    command_buffers: Vec<vk::CommandBuffer>,

    host_vertex_buffer: Option<AllocatedBuffer>,
    uniform_buffer: Option<AllocatedBuffer>,
    device_vertex_buffer: Option<AllocatedBuffer>,

    descriptor_pool: Option<vk::DescriptorPool>,
    descriptor_set_layout: Option<vk::DescriptorSetLayout>,
    descriptor_sets: Vec<vk::DescriptorSet>,

    render_pass: Option<vk::RenderPass>,
    framebuffers: Vec<vk::Framebuffer>,

    pipeline_layout: Option<vk::PipelineLayout>,
    pipeline: Option<vk::Pipeline>,

    image_available_semaphores: Vec<vk::Semaphore>,
    render_finished_semaphores: Vec<vk::Semaphore>,
    in_flight_fences: Vec<vk::Fence>,
    current_frame: usize,
}

fn require<T>(field: &Option<T>) -> StepResult<&T> {
    field.as_ref().ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
}

impl VulkanWindow {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            instance: None,
            #[cfg(feature = "vulkan-validation")]
            debug_messenger: None,
            surface: None,
            surface_loader: None,
            physical_device: None,
            device: None,
            graphics_queue: vk::Queue::null(),
            present_queue: vk::Queue::null(),
            graphics_queue_family: 0,
            allocator: None,
            swapchain_loader: None,
            swapchain: None,
            swapchain_images: Vec::new(),
            swapchain_image_views: Vec::new(),
            swapchain_format: vk::Format::UNDEFINED,
            swapchain_extent: vk::Extent2D::default(),
            command_pool: None,
            command_buffers: Vec::new(),
            host_vertex_buffer: None,
            uniform_buffer: None,
            device_vertex_buffer: None,
            descriptor_pool: None,
            descriptor_set_layout: None,
            descriptor_sets: Vec::new(),
            render_pass: None,
            framebuffers: Vec::new(),
            pipeline_layout: None,
            pipeline: None,
            image_available_semaphores: Vec::new(),
            render_finished_semaphores: Vec::new(),
            in_flight_fences: Vec::new(),
            current_frame: 0,
        }
    }

    // ===== Bring-up steps =====

    pub(crate) fn create_instance(
        &mut self,
        entry: &ash::Entry,
        window: &winit::window::Window,
        app_name: &str,
    ) -> StepResult {
        unsafe {
            let app_name = CString::new(app_name).unwrap_or_default();
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Lumen")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window
                .display_handle()
                .map_err(|_| vk::Result::ERROR_INITIALIZATION_FAILED)?;
            #[allow(unused_mut)]
            let mut extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())?.to_vec();

            #[cfg(feature = "vulkan-validation")]
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());

            #[cfg(feature = "vulkan-validation")]
            let layer_names = vec![c"VK_LAYER_KHRONOS_validation".as_ptr()];
            #[cfg(not(feature = "vulkan-validation"))]
            let layer_names: Vec<*const std::ffi::c_char> = vec![];

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).inspect_err(|e| {
                lumen_error!("lumen::vulkan", "Failed to create Vulkan instance: {:?}", e);
            })?;

            self.instance = Some(instance);
            Ok(())
        }
    }

    #[cfg(feature = "vulkan-validation")]
    pub(crate) fn create_debugger(&mut self, entry: &ash::Entry) -> StepResult {
        unsafe {
            let instance = require(&self.instance)?;
            let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);

            let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                .message_severity(
                    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                )
                .message_type(
                    vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                )
                .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

            let messenger = debug_utils
                .create_debug_utils_messenger(&debug_info, None)
                .inspect_err(|e| {
                    lumen_error!("lumen::vulkan", "Failed to create debug messenger: {:?}", e);
                })?;

            self.debug_messenger = Some((debug_utils, messenger));
            Ok(())
        }
    }

    #[cfg(not(feature = "vulkan-validation"))]
    pub(crate) fn create_debugger(&mut self, _entry: &ash::Entry) -> StepResult {
        // Validation support is compiled out; the step still requires the
        // instance so ordering violations are caught in both build flavors
        require(&self.instance)?;
        lumen_app_engine::lumen_debug!(
            "lumen::vulkan",
            "Validation disabled, debugger step is a no-op"
        );
        Ok(())
    }

    pub(crate) fn create_surface(
        &mut self,
        entry: &ash::Entry,
        window: &winit::window::Window,
    ) -> StepResult {
        unsafe {
            let instance = require(&self.instance)?;

            let display_handle = window
                .display_handle()
                .map_err(|_| vk::Result::ERROR_INITIALIZATION_FAILED)?;
            let window_handle = window
                .window_handle()
                .map_err(|_| vk::Result::ERROR_INITIALIZATION_FAILED)?;

            let surface = ash_window::create_surface(
                entry,
                instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .inspect_err(|e| {
                lumen_error!("lumen::vulkan", "Failed to create surface: {:?}", e);
            })?;

            self.surface_loader = Some(ash::khr::surface::Instance::new(entry, instance));
            self.surface = Some(surface);
            Ok(())
        }
    }

    pub(crate) fn create_logical_device(&mut self) -> StepResult {
        unsafe {
            let instance = require(&self.instance)?;
            let surface = *require(&self.surface)?;
            let surface_loader = require(&self.surface_loader)?;

            let physical_devices = instance.enumerate_physical_devices().inspect_err(|e| {
                lumen_error!("lumen::vulkan", "Failed to enumerate physical devices: {:?}", e);
            })?;

            // First device with a graphics family and a present-capable family
            let mut selected = None;
            'devices: for physical_device in physical_devices {
                let queue_families =
                    instance.get_physical_device_queue_family_properties(physical_device);
                let graphics_family = queue_families
                    .iter()
                    .enumerate()
                    .find(|(_, qf)| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                    .map(|(i, _)| i as u32);
                let Some(graphics_family) = graphics_family else {
                    continue;
                };
                for present_family in 0..queue_families.len() as u32 {
                    let supported = surface_loader
                        .get_physical_device_surface_support(
                            physical_device,
                            present_family,
                            surface,
                        )
                        .unwrap_or(false);
                    if supported {
                        selected = Some((physical_device, graphics_family, present_family));
                        break 'devices;
                    }
                }
            }

            let Some((physical_device, graphics_family, present_family)) = selected else {
                lumen_error!("lumen::vulkan", "No Vulkan-capable GPU with present support found");
                return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
            };

            let queue_priorities = [1.0];
            let queue_create_infos = if graphics_family == present_family {
                vec![vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(graphics_family)
                    .queue_priorities(&queue_priorities)]
            } else {
                vec![
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(graphics_family)
                        .queue_priorities(&queue_priorities),
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family)
                        .queue_priorities(&queue_priorities),
                ]
            };

            let device_extension_names = vec![ash::khr::swapchain::NAME.as_ptr()];
            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .inspect_err(|e| {
                    lumen_error!("lumen::vulkan", "Failed to create logical device: {:?}", e);
                })?;

            self.graphics_queue = device.get_device_queue(graphics_family, 0);
            self.present_queue = device.get_device_queue(present_family, 0);
            self.graphics_queue_family = graphics_family;

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                lumen_error!("lumen::vulkan", "Failed to create GPU allocator: {:?}", e);
                vk::Result::ERROR_OUT_OF_DEVICE_MEMORY
            })?;

            self.physical_device = Some(physical_device);
            self.device = Some(device);
            self.allocator = Some(allocator);
            Ok(())
        }
    }

    pub(crate) fn create_swapchain(&mut self) -> StepResult {
        unsafe {
            let instance = require(&self.instance)?;
            let device = require(&self.device)?;
            let physical_device = *require(&self.physical_device)?;
            let surface = *require(&self.surface)?;
            let surface_loader = require(&self.surface_loader)?;

            let surface_capabilities = surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)?;
            let surface_formats =
                surface_loader.get_physical_device_surface_formats(physical_device, surface)?;
            let surface_format = surface_formats
                .iter()
                .find(|f| {
                    f.format == vk::Format::B8G8R8A8_SRGB || f.format == vk::Format::R8G8B8A8_SRGB
                })
                .unwrap_or(&surface_formats[0]);

            let extent = if surface_capabilities.current_extent.width != u32::MAX {
                surface_capabilities.current_extent
            } else {
                vk::Extent2D {
                    width: self.width.clamp(
                        surface_capabilities.min_image_extent.width,
                        surface_capabilities.max_image_extent.width,
                    ),
                    height: self.height.clamp(
                        surface_capabilities.min_image_extent.height,
                        surface_capabilities.max_image_extent.height,
                    ),
                }
            };

            let image_count = surface_capabilities.min_image_count + 1;
            let image_count = if surface_capabilities.max_image_count > 0 {
                image_count.min(surface_capabilities.max_image_count)
            } else {
                image_count
            };

            let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(surface_capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true);

            let swapchain_loader = ash::khr::swapchain::Device::new(instance, device);
            let swapchain = swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .inspect_err(|e| {
                    lumen_error!("lumen::vulkan", "Failed to create swapchain: {:?}", e);
                })?;

            let swapchain_images = swapchain_loader.get_swapchain_images(swapchain)?;

            let swapchain_image_views: Vec<vk::ImageView> = swapchain_images
                .iter()
                .map(|&image| {
                    let create_info = vk::ImageViewCreateInfo::default()
                        .image(image)
                        .view_type(vk::ImageViewType::TYPE_2D)
                        .format(surface_format.format)
                        .subresource_range(vk::ImageSubresourceRange {
                            aspect_mask: vk::ImageAspectFlags::COLOR,
                            base_mip_level: 0,
                            level_count: 1,
                            base_array_layer: 0,
                            layer_count: 1,
                        });
                    device.create_image_view(&create_info, None)
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .inspect_err(|e| {
                    lumen_error!("lumen::vulkan", "Failed to create swapchain image views: {:?}", e);
                })?;

            self.swapchain_format = surface_format.format;
            self.swapchain_extent = extent;
            self.swapchain_loader = Some(swapchain_loader);
            self.swapchain = Some(swapchain);
            self.swapchain_images = swapchain_images;
            self.swapchain_image_views = swapchain_image_views;
            Ok(())
        }
    }

    pub(crate) fn create_command_pool(&mut self) -> StepResult {
        unsafe {
            let device = require(&self.device)?;
            let info = vk::CommandPoolCreateInfo::default()
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
                .queue_family_index(self.graphics_queue_family);

            let pool = device.create_command_pool(&info, None).inspect_err(|e| {
                lumen_error!("lumen::vulkan", "Failed to create command pool: {:?}", e);
            })?;
            self.command_pool = Some(pool);
            Ok(())
        }
    }

    pub(crate) fn allocate_command_buffers(&mut self) -> StepResult {
        unsafe {
            let device = require(&self.device)?;
            let pool = *require(&self.command_pool)?;
            if self.swapchain_images.is_empty() {
                return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
            }

            let info = vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(self.swapchain_images.len() as u32);

            self.command_buffers = device.allocate_command_buffers(&info).inspect_err(|e| {
                lumen_error!("lumen::vulkan", "Failed to allocate command buffers: {:?}", e);
            })?;
            Ok(())
        }
    }

    pub(crate) fn create_host_buffers(&mut self) -> StepResult {
        require(&self.device)?;

        // Staging vertex buffer, filled immediately from the CPU side
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&TRIANGLE);
        let mut staging = self.create_buffer(
            vertex_bytes.len() as u64,
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryLocation::CpuToGpu,
            "host vertex buffer",
        )?;
        Self::write_bytes(&mut staging, vertex_bytes)?;

        // Uniform buffer, stays host-visible for the lifetime of the window
        let uniforms = Uniforms {
            tint: [1.0, 1.0, 1.0, 1.0],
        };
        let mut uniform = self.create_buffer(
            std::mem::size_of::<Uniforms>() as u64,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            MemoryLocation::CpuToGpu,
            "uniform buffer",
        )?;
        Self::write_bytes(&mut uniform, bytemuck::bytes_of(&uniforms))?;

        self.host_vertex_buffer = Some(staging);
        self.uniform_buffer = Some(uniform);
        Ok(())
    }

    pub(crate) fn create_device_buffers(&mut self) -> StepResult {
        require(&self.device)?;

        let size = std::mem::size_of_val(&TRIANGLE) as u64;
        let buffer = self.create_buffer(
            size,
            vk::BufferUsageFlags::TRANSFER_DST | vk::BufferUsageFlags::VERTEX_BUFFER,
            MemoryLocation::GpuOnly,
            "device vertex buffer",
        )?;
        self.device_vertex_buffer = Some(buffer);
        Ok(())
    }

    pub(crate) fn create_descriptor_pool(&mut self) -> StepResult {
        unsafe {
            let device = require(&self.device)?;
            let pool_sizes = [vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 1,
            }];
            let info = vk::DescriptorPoolCreateInfo::default()
                .pool_sizes(&pool_sizes)
                .max_sets(1);

            let pool = device.create_descriptor_pool(&info, None).inspect_err(|e| {
                lumen_error!("lumen::vulkan", "Failed to create descriptor pool: {:?}", e);
            })?;
            self.descriptor_pool = Some(pool);
            Ok(())
        }
    }

    pub(crate) fn allocate_descriptor_sets(&mut self) -> StepResult {
        unsafe {
            let device = require(&self.device)?;
            let pool = *require(&self.descriptor_pool)?;
            let uniform = require(&self.uniform_buffer)?;

            let bindings = [vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX)];
            let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            let layout = device
                .create_descriptor_set_layout(&layout_info, None)
                .inspect_err(|e| {
                    lumen_error!("lumen::vulkan", "Failed to create descriptor set layout: {:?}", e);
                })?;

            let layouts = [layout];
            let alloc_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(pool)
                .set_layouts(&layouts);
            let sets = device.allocate_descriptor_sets(&alloc_info).inspect_err(|e| {
                lumen_error!("lumen::vulkan", "Failed to allocate descriptor sets: {:?}", e);
            })?;

            let buffer_info = [vk::DescriptorBufferInfo::default()
                .buffer(uniform.buffer)
                .offset(0)
                .range(std::mem::size_of::<Uniforms>() as u64)];
            let write = vk::WriteDescriptorSet::default()
                .dst_set(sets[0])
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_info);
            device.update_descriptor_sets(&[write], &[]);

            self.descriptor_set_layout = Some(layout);
            self.descriptor_sets = sets;
            Ok(())
        }
    }

    pub(crate) fn create_render_pass(&mut self) -> StepResult {
        unsafe {
            let device = require(&self.device)?;
            if self.swapchain_format == vk::Format::UNDEFINED {
                return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
            }

            let attachments = [vk::AttachmentDescription::default()
                .format(self.swapchain_format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)];

            let color_refs = [vk::AttachmentReference::default()
                .attachment(0)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];
            let subpasses = [vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&color_refs)];

            let dependencies = [vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)];

            let info = vk::RenderPassCreateInfo::default()
                .attachments(&attachments)
                .subpasses(&subpasses)
                .dependencies(&dependencies);

            let render_pass = device.create_render_pass(&info, None).inspect_err(|e| {
                lumen_error!("lumen::vulkan", "Failed to create render pass: {:?}", e);
            })?;
            self.render_pass = Some(render_pass);
            Ok(())
        }
    }

    pub(crate) fn create_framebuffers(&mut self) -> StepResult {
        unsafe {
            let device = require(&self.device)?;
            let render_pass = *require(&self.render_pass)?;
            if self.swapchain_image_views.is_empty() {
                return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
            }

            let mut framebuffers = Vec::with_capacity(self.swapchain_image_views.len());
            for &view in &self.swapchain_image_views {
                let attachments = [view];
                let info = vk::FramebufferCreateInfo::default()
                    .render_pass(render_pass)
                    .attachments(&attachments)
                    .width(self.swapchain_extent.width)
                    .height(self.swapchain_extent.height)
                    .layers(1);
                let framebuffer = device.create_framebuffer(&info, None).inspect_err(|e| {
                    lumen_error!("lumen::vulkan", "Failed to create framebuffer: {:?}", e);
                })?;
                framebuffers.push(framebuffer);
            }
            self.framebuffers = framebuffers;
            Ok(())
        }
    }

    pub(crate) fn create_pipeline(&mut self, config: &DriverConfig) -> StepResult {
        unsafe {
            let device = require(&self.device)?;
            let render_pass = *require(&self.render_pass)?;
            let set_layout = *require(&self.descriptor_set_layout)?;

            let vertex_code = ash::util::read_spv(&mut std::io::Cursor::new(&config.vertex_shader))
                .map_err(|e| {
                    lumen_error!("lumen::vulkan", "Invalid vertex shader binary: {}", e);
                    vk::Result::ERROR_INVALID_SHADER_NV
                })?;
            let fragment_code =
                ash::util::read_spv(&mut std::io::Cursor::new(&config.fragment_shader)).map_err(
                    |e| {
                        lumen_error!("lumen::vulkan", "Invalid fragment shader binary: {}", e);
                        vk::Result::ERROR_INVALID_SHADER_NV
                    },
                )?;

            let vertex_module = device.create_shader_module(
                &vk::ShaderModuleCreateInfo::default().code(&vertex_code),
                None,
            )?;
            let fragment_module = device.create_shader_module(
                &vk::ShaderModuleCreateInfo::default().code(&fragment_code),
                None,
            );
            let fragment_module = match fragment_module {
                Ok(module) => module,
                Err(e) => {
                    device.destroy_shader_module(vertex_module, None);
                    return Err(e);
                }
            };

            let stages = [
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::VERTEX)
                    .module(vertex_module)
                    .name(c"main"),
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::FRAGMENT)
                    .module(fragment_module)
                    .name(c"main"),
            ];

            let binding_descriptions = [vk::VertexInputBindingDescription::default()
                .binding(0)
                .stride(std::mem::size_of::<Vertex>() as u32)
                .input_rate(vk::VertexInputRate::VERTEX)];
            let attribute_descriptions = [
                vk::VertexInputAttributeDescription::default()
                    .location(0)
                    .binding(0)
                    .format(vk::Format::R32G32_SFLOAT)
                    .offset(0),
                vk::VertexInputAttributeDescription::default()
                    .location(1)
                    .binding(0)
                    .format(vk::Format::R32G32B32_SFLOAT)
                    .offset(8),
            ];
            let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(&binding_descriptions)
                .vertex_attribute_descriptions(&attribute_descriptions);

            let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(vk::PrimitiveTopology::TRIANGLE_LIST);

            let viewports = [vk::Viewport::default()
                .width(self.swapchain_extent.width as f32)
                .height(self.swapchain_extent.height as f32)
                .max_depth(1.0)];
            let scissors = [vk::Rect2D::default().extent(self.swapchain_extent)];
            let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                .viewports(&viewports)
                .scissors(&scissors);

            let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
                .polygon_mode(vk::PolygonMode::FILL)
                .cull_mode(vk::CullModeFlags::BACK)
                .front_face(vk::FrontFace::CLOCKWISE)
                .line_width(1.0);

            let multisample = vk::PipelineMultisampleStateCreateInfo::default()
                .rasterization_samples(vk::SampleCountFlags::TYPE_1);

            let blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)];
            let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
                .attachments(&blend_attachments);

            let set_layouts = [set_layout];
            let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
            let pipeline_layout = device.create_pipeline_layout(&layout_info, None);
            let pipeline_layout = match pipeline_layout {
                Ok(layout) => layout,
                Err(e) => {
                    device.destroy_shader_module(vertex_module, None);
                    device.destroy_shader_module(fragment_module, None);
                    return Err(e);
                }
            };

            let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&stages)
                .vertex_input_state(&vertex_input)
                .input_assembly_state(&input_assembly)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterization)
                .multisample_state(&multisample)
                .color_blend_state(&color_blend)
                .layout(pipeline_layout)
                .render_pass(render_pass)
                .subpass(0);

            let result = device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_info],
                None,
            );

            device.destroy_shader_module(vertex_module, None);
            device.destroy_shader_module(fragment_module, None);

            let pipelines = match result {
                Ok(pipelines) => pipelines,
                Err((_, e)) => {
                    lumen_error!("lumen::vulkan", "Failed to create graphics pipeline: {:?}", e);
                    device.destroy_pipeline_layout(pipeline_layout, None);
                    return Err(e);
                }
            };

            self.pipeline_layout = Some(pipeline_layout);
            self.pipeline = Some(pipelines[0]);
            Ok(())
        }
    }

    pub(crate) fn upload_input_data(&mut self) -> StepResult {
        unsafe {
            let device = require(&self.device)?;
            let pool = *require(&self.command_pool)?;
            let staging = require(&self.host_vertex_buffer)?;
            let target = require(&self.device_vertex_buffer)?;

            // One-shot command buffer for the staging copy
            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = device.allocate_command_buffers(&alloc_info)?[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device.begin_command_buffer(command_buffer, &begin_info)?;

            let region = vk::BufferCopy::default().size(std::mem::size_of_val(&TRIANGLE) as u64);
            device.cmd_copy_buffer(command_buffer, staging.buffer, target.buffer, &[region]);

            device.end_command_buffer(command_buffer)?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
            device.queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())?;
            device.queue_wait_idle(self.graphics_queue)?;

            device.free_command_buffers(pool, &command_buffers);
            Ok(())
        }
    }

    pub(crate) fn record_command_buffers(&mut self) -> StepResult {
        unsafe {
            let device = require(&self.device)?;
            let render_pass = *require(&self.render_pass)?;
            let pipeline = *require(&self.pipeline)?;
            let pipeline_layout = *require(&self.pipeline_layout)?;
            let vertex_buffer = require(&self.device_vertex_buffer)?.buffer;
            if self.command_buffers.len() != self.framebuffers.len()
                || self.descriptor_sets.is_empty()
            {
                return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
            }

            let clear_values = [vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.0, 0.0, 0.0, 1.0],
                },
            }];

            for (&command_buffer, &framebuffer) in
                self.command_buffers.iter().zip(self.framebuffers.iter())
            {
                let begin_info = vk::CommandBufferBeginInfo::default();
                device.begin_command_buffer(command_buffer, &begin_info)?;

                let render_pass_begin = vk::RenderPassBeginInfo::default()
                    .render_pass(render_pass)
                    .framebuffer(framebuffer)
                    .render_area(vk::Rect2D::default().extent(self.swapchain_extent))
                    .clear_values(&clear_values);

                device.cmd_begin_render_pass(
                    command_buffer,
                    &render_pass_begin,
                    vk::SubpassContents::INLINE,
                );
                device.cmd_bind_pipeline(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    pipeline,
                );
                device.cmd_bind_vertex_buffers(command_buffer, 0, &[vertex_buffer], &[0]);
                device.cmd_bind_descriptor_sets(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    pipeline_layout,
                    0,
                    &self.descriptor_sets,
                    &[],
                );
                device.cmd_draw(command_buffer, TRIANGLE.len() as u32, 1, 0, 0);
                device.cmd_end_render_pass(command_buffer);

                device.end_command_buffer(command_buffer)?;
            }
            Ok(())
        }
    }

    pub(crate) fn create_semaphores(&mut self) -> StepResult {
        unsafe {
            let device = require(&self.device)?;
            if self.swapchain_images.is_empty() {
                return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
            }

            let semaphore_info = vk::SemaphoreCreateInfo::default();
            let fence_info =
                vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);

            let mut image_available = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
            let mut in_flight = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
            for _ in 0..MAX_FRAMES_IN_FLIGHT {
                image_available.push(device.create_semaphore(&semaphore_info, None)?);
                in_flight.push(device.create_fence(&fence_info, None)?);
            }

            let mut render_finished = Vec::with_capacity(self.swapchain_images.len());
            for _ in 0..self.swapchain_images.len() {
                render_finished.push(device.create_semaphore(&semaphore_info, None)?);
            }

            self.image_available_semaphores = image_available;
            self.render_finished_semaphores = render_finished;
            self.in_flight_fences = in_flight;
            Ok(())
        }
    }

    // ===== Per-tick =====

    /// Submit one prerecorded frame: wait fence, acquire, submit, present
    ///
    /// An out-of-date swapchain skips the frame instead of failing the tick;
    /// the window is fixed-size so the condition is transient (minimize etc.).
    pub(crate) fn render(&mut self) -> StepResult {
        unsafe {
            let device = require(&self.device)?;
            let swapchain_loader = require(&self.swapchain_loader)?;
            let swapchain = *require(&self.swapchain)?;
            if self.in_flight_fences.is_empty() {
                return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
            }

            let frame = self.current_frame;
            device.wait_for_fences(&[self.in_flight_fences[frame]], true, u64::MAX)?;

            let acquired = swapchain_loader.acquire_next_image(
                swapchain,
                u64::MAX,
                self.image_available_semaphores[frame],
                vk::Fence::null(),
            );
            let image_index = match acquired {
                Ok((index, _suboptimal)) => index,
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    lumen_warn!("lumen::vulkan", "Swapchain out of date during acquire, skipping frame");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            device.reset_fences(&[self.in_flight_fences[frame]])?;

            let wait_semaphores = [self.image_available_semaphores[frame]];
            let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
            let command_buffers = [self.command_buffers[image_index as usize]];
            let signal_semaphores = [self.render_finished_semaphores[image_index as usize]];

            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            device.queue_submit(
                self.graphics_queue,
                &[submit_info],
                self.in_flight_fences[frame],
            )?;

            let swapchains = [swapchain];
            let image_indices = [image_index];
            let present_info = vk::PresentInfoKHR::default()
                .wait_semaphores(&signal_semaphores)
                .swapchains(&swapchains)
                .image_indices(&image_indices);

            match swapchain_loader.queue_present(self.present_queue, &present_info) {
                Ok(_) | Err(vk::Result::SUBOPTIMAL_KHR) => {}
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    lumen_warn!("lumen::vulkan", "Swapchain out of date during present, skipping frame");
                }
                Err(e) => {
                    self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;
                    return Err(e);
                }
            }

            self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;
            Ok(())
        }
    }

    // ===== Teardown =====

    /// Destroy every native object owned by this window, in reverse
    /// bring-up order. Idempotent: a second call finds everything taken.
    pub(crate) fn destroy(&mut self) {
        unsafe {
            let Some(device) = self.device.take() else {
                // Bring-up never reached the device; only instance-level
                // objects can exist
                self.destroy_instance_level();
                return;
            };

            device.device_wait_idle().ok();

            for semaphore in self.image_available_semaphores.drain(..) {
                device.destroy_semaphore(semaphore, None);
            }
            for semaphore in self.render_finished_semaphores.drain(..) {
                device.destroy_semaphore(semaphore, None);
            }
            for fence in self.in_flight_fences.drain(..) {
                device.destroy_fence(fence, None);
            }

            if let Some(pipeline) = self.pipeline.take() {
                device.destroy_pipeline(pipeline, None);
            }
            if let Some(layout) = self.pipeline_layout.take() {
                device.destroy_pipeline_layout(layout, None);
            }
            for framebuffer in self.framebuffers.drain(..) {
                device.destroy_framebuffer(framebuffer, None);
            }
            if let Some(render_pass) = self.render_pass.take() {
                device.destroy_render_pass(render_pass, None);
            }
            if let Some(layout) = self.descriptor_set_layout.take() {
                device.destroy_descriptor_set_layout(layout, None);
            }
            self.descriptor_sets.clear();
            if let Some(pool) = self.descriptor_pool.take() {
                device.destroy_descriptor_pool(pool, None);
            }

            // Buffers must be freed while the allocator is still alive
            if let Some(allocator) = self.allocator.as_mut() {
                for slot in [
                    &mut self.host_vertex_buffer,
                    &mut self.uniform_buffer,
                    &mut self.device_vertex_buffer,
                ] {
                    if let Some(mut allocated) = slot.take() {
                        if let Some(allocation) = allocated.allocation.take() {
                            allocator.free(allocation).ok();
                        }
                        device.destroy_buffer(allocated.buffer, None);
                    }
                }
            }
            drop(self.allocator.take());

            self.command_buffers.clear();
            if let Some(pool) = self.command_pool.take() {
                device.destroy_command_pool(pool, None);
            }

            for view in self.swapchain_image_views.drain(..) {
                device.destroy_image_view(view, None);
            }
            self.swapchain_images.clear();
            if let (Some(loader), Some(swapchain)) =
                (self.swapchain_loader.take(), self.swapchain.take())
            {
                loader.destroy_swapchain(swapchain, None);
            }

            device.destroy_device(None);
            self.physical_device = None;

            self.destroy_instance_level();
        }
    }

    unsafe fn destroy_instance_level(&mut self) {
        if let (Some(loader), Some(surface)) = (self.surface_loader.take(), self.surface.take()) {
            loader.destroy_surface(surface, None);
        }
        #[cfg(feature = "vulkan-validation")]
        if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
            debug_utils.destroy_debug_utils_messenger(messenger, None);
        }
        if let Some(instance) = self.instance.take() {
            instance.destroy_instance(None);
        }
    }

    // ===== Helpers =====

    fn create_buffer(
        &mut self,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        name: &str,
    ) -> StepResult<AllocatedBuffer> {
        unsafe {
            let device = require(&self.device)?.clone();
            let allocator = self
                .allocator
                .as_mut()
                .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)?;

            let info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let buffer = device.create_buffer(&info, None).inspect_err(|e| {
                lumen_error!("lumen::vulkan", "Failed to create {}: {:?}", name, e);
            })?;

            let requirements = device.get_buffer_memory_requirements(buffer);
            let allocation = allocator
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| {
                    lumen_error!("lumen::vulkan", "Failed to allocate memory for {}: {:?}", name, e);
                    device.destroy_buffer(buffer, None);
                    vk::Result::ERROR_OUT_OF_DEVICE_MEMORY
                })?;

            device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .inspect_err(|e| {
                    lumen_error!("lumen::vulkan", "Failed to bind memory for {}: {:?}", name, e);
                })?;

            Ok(AllocatedBuffer {
                buffer,
                allocation: Some(allocation),
            })
        }
    }

    /// Copy bytes into a host-visible allocation
    fn write_bytes(buffer: &mut AllocatedBuffer, bytes: &[u8]) -> StepResult {
        let allocation = buffer
            .allocation
            .as_mut()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)?;
        let mapped = allocation
            .mapped_slice_mut()
            .ok_or(vk::Result::ERROR_MEMORY_MAP_FAILED)?;
        mapped[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

impl Drop for VulkanWindow {
    fn drop(&mut self) {
        self.destroy();
    }
}
