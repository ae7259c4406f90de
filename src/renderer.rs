use log::{debug, info, trace};
use vulkanalia::vk::{
    DeviceV1_0, ExtDebugUtilsExtension, Handle, HasBuilder, InstanceV1_0, KhrSurfaceExtension,
    KhrSwapchainExtension,
};
use vulkanalia::window::create_surface;
use vulkanalia::{Device, Entry, Instance, vk};
use winit::window::Window;

use crate::commands::{DrawParams, create_command_pool, create_semaphore, record_command_buffers};
use crate::config::ViewConfig;
use crate::device::{QueueFamilyIndices, create_logical_device, pick_physical_device};
use crate::error::ViewError;
use crate::init::{create_instance, create_vulkan_entry};
use crate::pipeline::{create_framebuffers, create_graphics_pipeline, create_render_pass};
use crate::swapchain::{create_image_views, create_swap_chain};

/// Owns every Vulkan object needed to put the triangle on screen.
///
/// Objects are created in dependency order and destroyed in reverse when the renderer is
/// dropped. Anything not created yet is still a null handle and is skipped, so a renderer that
/// failed halfway through setup cleans up after itself too.
pub struct Renderer {
    _entry: Entry,
    instance: Instance,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    surface: vk::SurfaceKHR,
    device: Option<Device>,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    swap_chain: vk::SwapchainKHR,
    swap_chain_images: Vec<vk::Image>,
    swap_chain_format: vk::Format,
    swap_chain_extent: vk::Extent2D,
    image_views: Vec<vk::ImageView>,
    render_pass: vk::RenderPass,
    pipeline_layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
    framebuffers: Vec<vk::Framebuffer>,
    command_pool: vk::CommandPool,
    command_buffers: Vec<vk::CommandBuffer>,
    image_available: vk::Semaphore,
    render_finished: vk::Semaphore,
}

impl Renderer {
    /// Initializes Vulkan against `window`, ending with command buffers recorded for every
    /// swap chain image.
    pub fn new(window: &Window, config: &ViewConfig) -> Result<Self, ViewError> {
        let entry = create_vulkan_entry()?;
        let (instance, debug_messenger) = create_instance(window, &entry, config.validation)?;

        let mut renderer = Self {
            _entry: entry,
            instance,
            debug_messenger,
            surface: vk::SurfaceKHR::null(),
            device: None,
            graphics_queue: vk::Queue::null(),
            present_queue: vk::Queue::null(),
            swap_chain: vk::SwapchainKHR::null(),
            swap_chain_images: Vec::new(),
            swap_chain_format: vk::Format::UNDEFINED,
            swap_chain_extent: vk::Extent2D::default(),
            image_views: Vec::new(),
            render_pass: vk::RenderPass::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            pipeline: vk::Pipeline::null(),
            framebuffers: Vec::new(),
            command_pool: vk::CommandPool::null(),
            command_buffers: Vec::new(),
            image_available: vk::Semaphore::null(),
            render_finished: vk::Semaphore::null(),
        };

        renderer.init(window, config)?;
        Ok(renderer)
    }

    fn init(&mut self, window: &Window, config: &ViewConfig) -> Result<(), ViewError> {
        self.surface =
            unsafe { create_surface(&self.instance, window, window) }.map_err(ViewError::Surface)?;

        let physical_device = pick_physical_device(&self.instance, self.surface)?;
        let indices = QueueFamilyIndices::find(&self.instance, self.surface, physical_device)?;

        let (device, graphics_queue, present_queue) =
            create_logical_device(&self.instance, physical_device, &indices)?;
        self.graphics_queue = graphics_queue;
        self.present_queue = present_queue;
        let device = self.device.insert(device);

        let swap_chain = create_swap_chain(
            &self.instance,
            device,
            physical_device,
            self.surface,
            &indices,
            config.fallback_extent,
        )?;
        self.swap_chain = swap_chain.handle;
        create_image_views(device, &swap_chain, &mut self.image_views)?;
        self.swap_chain_images = swap_chain.images;
        self.swap_chain_format = swap_chain.format;
        self.swap_chain_extent = swap_chain.extent;

        self.render_pass = create_render_pass(device, self.swap_chain_format)?;

        let pipeline =
            create_graphics_pipeline(device, config, self.render_pass, self.swap_chain_extent)?;
        self.pipeline_layout = pipeline.layout;
        self.pipeline = pipeline.pipeline;

        create_framebuffers(
            device,
            self.render_pass,
            &self.image_views,
            self.swap_chain_extent,
            &mut self.framebuffers,
        )?;

        let graphics_family = indices
            .graphics_family
            .ok_or(ViewError::NoSuitableDevice)?;
        self.command_pool = create_command_pool(device, graphics_family)?;
        self.command_buffers = record_command_buffers(
            device,
            self.command_pool,
            &self.framebuffers,
            &DrawParams {
                render_pass: self.render_pass,
                pipeline: self.pipeline,
                extent: self.swap_chain_extent,
                clear_color: config.clear_color,
            },
        )?;

        self.image_available = create_semaphore(device)?;
        self.render_finished = create_semaphore(device)?;

        info!(
            "Renderer ready: {} swap chain images.",
            self.swap_chain_images.len()
        );
        Ok(())
    }

    /// Acquires the next swap chain image, submits its pre-recorded command buffer and presents
    /// it.
    ///
    /// Submission waits on `image_available` at COLOR_ATTACHMENT_OUTPUT and signals
    /// `render_finished`, which presentation waits on. There is no fence. Instead every frame
    /// ends by waiting for the present queue to go idle, so the pre-recorded command buffers and
    /// both semaphores are free again before the next call. This blocks the CPU once per frame.
    ///
    /// A swap chain that is out of date (a minimized window on some platforms) skips the frame
    /// rather than failing.
    pub fn draw_frame(&mut self) -> Result<(), ViewError> {
        let device = self.device.as_ref().ok_or(ViewError::NotInitialized)?;

        let acquired = unsafe {
            device.acquire_next_image_khr(
                self.swap_chain,
                u64::MAX,
                self.image_available,
                vk::Fence::null(),
            )
        };

        let image_index = match acquired {
            Ok((index, _)) => index,
            Err(e) if skips_frame(e) => {
                trace!("Swap chain out of date, skipping frame.");
                return Ok(());
            }
            Err(e) => return Err(ViewError::AcquireImage(e)),
        };

        let wait_semaphores = &[self.image_available];
        let wait_stages = &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = &[self.command_buffers[image_index as usize]];
        let signal_semaphores = &[self.render_finished];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(wait_semaphores)
            .wait_dst_stage_mask(wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(signal_semaphores);

        unsafe { device.queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null()) }
            .map_err(ViewError::Submit)?;

        let swapchains = &[self.swap_chain];
        let image_indices = &[image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(signal_semaphores)
            .swapchains(swapchains)
            .image_indices(image_indices);

        // SUBOPTIMAL is ignored: the window cannot be resized, so the swap chain is never
        // recreated.
        match unsafe { device.queue_present_khr(self.present_queue, &present_info) } {
            Ok(_) => {}
            Err(e) if skips_frame(e) => trace!("Swap chain out of date, frame not presented."),
            Err(e) => return Err(ViewError::Present(e)),
        }

        unsafe { device.queue_wait_idle(self.present_queue) }.map_err(ViewError::WaitIdle)?;

        Ok(())
    }
}

/// Errors from acquire or present that drop the current frame instead of ending the app.
fn skips_frame(error: vk::ErrorCode) -> bool {
    error == vk::ErrorCode::OUT_OF_DATE_KHR
}

impl Drop for Renderer {
    fn drop(&mut self) {
        debug!("Destroying renderer.");

        unsafe {
            if let Some(device) = self.device.as_ref() {
                // Nothing can be destroyed while the GPU may still be using it. A failure here
                // means the device is lost, and destroying is all that is left to do.
                let _ = device.device_wait_idle();

                if !self.render_finished.is_null() {
                    device.destroy_semaphore(self.render_finished, None);
                }
                if !self.image_available.is_null() {
                    device.destroy_semaphore(self.image_available, None);
                }

                // Frees the command buffers too.
                if !self.command_pool.is_null() {
                    device.destroy_command_pool(self.command_pool, None);
                }

                for framebuffer in self.framebuffers.drain(..) {
                    device.destroy_framebuffer(framebuffer, None);
                }

                if !self.pipeline.is_null() {
                    device.destroy_pipeline(self.pipeline, None);
                }
                if !self.pipeline_layout.is_null() {
                    device.destroy_pipeline_layout(self.pipeline_layout, None);
                }
                if !self.render_pass.is_null() {
                    device.destroy_render_pass(self.render_pass, None);
                }

                for view in self.image_views.drain(..) {
                    device.destroy_image_view(view, None);
                }

                if !self.swap_chain.is_null() {
                    device.destroy_swapchain_khr(self.swap_chain, None);
                }

                device.destroy_device(None);
            }

            if !self.surface.is_null() {
                self.instance.destroy_surface_khr(self.surface, None);
            }

            if let Some(messenger) = self.debug_messenger.take() {
                self.instance.destroy_debug_utils_messenger_ext(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_date_skips_the_frame() {
        assert!(skips_frame(vk::ErrorCode::OUT_OF_DATE_KHR));
    }

    #[test]
    fn other_errors_are_fatal() {
        assert!(!skips_frame(vk::ErrorCode::DEVICE_LOST));
        assert!(!skips_frame(vk::ErrorCode::SURFACE_LOST_KHR));
        assert!(!skips_frame(vk::ErrorCode::OUT_OF_HOST_MEMORY));
    }
}
