use std::path::PathBuf;

use thiserror::Error;
use vulkanalia::vk;

/// A failed step while building or driving the view. Each variant names the step that failed;
/// none of them are recoverable.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Failed to load the Vulkan library: {0}")]
    Loader(String),

    #[error("Failed to created Vulkan Instance: {0}")]
    Instance(vk::ErrorCode),

    #[error("Failed to set up debug messenger: {0}")]
    DebugMessenger(vk::ErrorCode),

    #[error("Failed to create Window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("Failed to create Window Surface: {0}")]
    Surface(vk::ErrorCode),

    #[error("None of the GPUs support Vulkan")]
    NoVulkanDevice,

    #[error("Failed to find a suitable GPU!")]
    NoSuitableDevice,

    #[error("Failed to query physical device: {0}")]
    DeviceQuery(vk::ErrorCode),

    #[error("Failed to create Logical Device: {0}")]
    LogicalDevice(vk::ErrorCode),

    #[error("No surface formats available for the Swap Chain")]
    NoSurfaceFormat,

    #[error("Failed to create Swap Chain: {0}")]
    SwapChain(vk::ErrorCode),

    #[error("Failed to create Image Views: {0}")]
    ImageView(vk::ErrorCode),

    #[error("Failed to create Render Pass!: {0}")]
    RenderPass(vk::ErrorCode),

    #[error("Failed to open {}, does the file exist?", path.display())]
    ShaderFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid SPIR-V in {}: {reason}", path.display())]
    ShaderBytecode { path: PathBuf, reason: String },

    #[error("Failed to create Shader Module!: {0}")]
    ShaderModule(vk::ErrorCode),

    #[error("Failed to create Pipeline Layout!: {0}")]
    PipelineLayout(vk::ErrorCode),

    #[error("Failed to create Graphics Pipeline!: {0}")]
    GraphicsPipeline(vk::ErrorCode),

    #[error("Failed to create Frame Buffer!: {0}")]
    Framebuffer(vk::ErrorCode),

    #[error("Failed to create Command Pool!: {0}")]
    CommandPool(vk::ErrorCode),

    #[error("Failed to allocate Command Buffers!: {0}")]
    CommandBufferAllocation(vk::ErrorCode),

    #[error("Failed to record Command Buffer!: {0}")]
    CommandBufferRecording(vk::ErrorCode),

    #[error("Failed to create Semaphores!: {0}")]
    Semaphore(vk::ErrorCode),

    #[error("Failed to acquire Swap Chain image: {0}")]
    AcquireImage(vk::ErrorCode),

    #[error("Failed to submit Draw Command Buffer!: {0}")]
    Submit(vk::ErrorCode),

    #[error("Failed to present Swap Chain image: {0}")]
    Present(vk::ErrorCode),

    #[error("Failed to wait for the device to go idle: {0}")]
    WaitIdle(vk::ErrorCode),

    #[error("The window has not been created yet")]
    NotInitialized,
}
