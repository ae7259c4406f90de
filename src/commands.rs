use vulkanalia::vk::{DeviceV1_0, HasBuilder};
use vulkanalia::{Device, vk};

use crate::error::ViewError;

pub fn create_command_pool(
    device: &Device,
    graphics_family: u32,
) -> Result<vk::CommandPool, ViewError> {
    let info = vk::CommandPoolCreateInfo::builder()
        .flags(vk::CommandPoolCreateFlags::empty())
        .queue_family_index(graphics_family);

    unsafe { device.create_command_pool(&info, None) }.map_err(ViewError::CommandPool)
}

/// Everything recorded into the per-image command buffers.
pub struct DrawParams {
    pub render_pass: vk::RenderPass,
    pub pipeline: vk::Pipeline,
    pub extent: vk::Extent2D,
    pub clear_color: [f32; 4],
}

/// Allocates one command buffer per framebuffer and records the triangle draw into each. The
/// buffers are recorded once and resubmitted every frame, so they are marked SIMULTANEOUS_USE.
/// They are freed together with `pool`.
pub fn record_command_buffers(
    device: &Device,
    pool: vk::CommandPool,
    framebuffers: &[vk::Framebuffer],
    params: &DrawParams,
) -> Result<Vec<vk::CommandBuffer>, ViewError> {
    let allocate_info = vk::CommandBufferAllocateInfo::builder()
        .command_pool(pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(framebuffers.len() as u32);

    let command_buffers = unsafe { device.allocate_command_buffers(&allocate_info) }
        .map_err(ViewError::CommandBufferAllocation)?;

    let clear_values = &[vk::ClearValue {
        color: vk::ClearColorValue {
            float32: params.clear_color,
        },
    }];

    let render_area = vk::Rect2D::builder()
        .offset(vk::Offset2D::default())
        .extent(params.extent);

    for (command_buffer, framebuffer) in command_buffers.iter().zip(framebuffers) {
        let begin_info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::SIMULTANEOUS_USE);

        let render_pass_info = vk::RenderPassBeginInfo::builder()
            .render_pass(params.render_pass)
            .framebuffer(*framebuffer)
            .render_area(render_area)
            .clear_values(clear_values);

        unsafe {
            device
                .begin_command_buffer(*command_buffer, &begin_info)
                .map_err(ViewError::CommandBufferRecording)?;

            device.cmd_begin_render_pass(
                *command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );
            device.cmd_bind_pipeline(
                *command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                params.pipeline,
            );
            device.cmd_draw(*command_buffer, 3, 1, 0, 0);
            device.cmd_end_render_pass(*command_buffer);

            device
                .end_command_buffer(*command_buffer)
                .map_err(ViewError::CommandBufferRecording)?;
        }
    }

    Ok(command_buffers)
}

pub fn create_semaphore(device: &Device) -> Result<vk::Semaphore, ViewError> {
    let info = vk::SemaphoreCreateInfo::builder();

    unsafe { device.create_semaphore(&info, None) }.map_err(ViewError::Semaphore)
}
