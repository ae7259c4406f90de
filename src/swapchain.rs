use log::info;
use vulkanalia::vk::{
    DeviceV1_0, Handle, HasBuilder, KhrSurfaceExtension, KhrSwapchainExtension, SurfaceFormatKHR,
};
use vulkanalia::{Device, Instance, vk};

use crate::device::QueueFamilyIndices;
use crate::error::ViewError;

/// Specifies the number of layers each image in a swap chain should consist of. This is always 1,
/// unless developing a stereoscopic 3D application.
const IMAGE_LAYERS_COUNT: u32 = 1;

/// The surface format the swap chain asks for first.
pub const PREFERRED_SURFACE_FORMAT: SurfaceFormatKHR = SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_UNORM,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

#[derive(Debug)]
pub struct SwapChainSupportDetails {
    /// The surface's capabilities (i.e, min/max number of images in swap chain, min/max width and
    /// height of images).
    pub capabilities: vk::SurfaceCapabilitiesKHR,

    /// Pixel format and color space pairs the surface accepts, in the order the driver reports
    /// them.
    pub formats: Vec<vk::SurfaceFormatKHR>,

    /// The presentation modes the surface supports. FIFO is always among them.
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapChainSupportDetails {
    /// Queries `device` and `surface` for everything needed to configure a swap chain.
    pub fn query(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self, ViewError> {
        let capabilities =
            unsafe { instance.get_physical_device_surface_capabilities_khr(device, surface) }
                .map_err(ViewError::DeviceQuery)?;

        let formats = unsafe { instance.get_physical_device_surface_formats_khr(device, surface) }
            .map_err(ViewError::DeviceQuery)?;

        let present_modes =
            unsafe { instance.get_physical_device_surface_present_modes_khr(device, surface) }
                .map_err(ViewError::DeviceQuery)?;

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Picks the swap chain's surface format.
///
/// A lone `UNDEFINED` entry means the surface takes anything, so the preferred format is used.
/// Otherwise the preferred format wins if listed, falling back to the first entry.
pub fn choose_surface_format(formats: &[SurfaceFormatKHR]) -> Option<SurfaceFormatKHR> {
    if let [only] = formats {
        if only.format == vk::Format::UNDEFINED {
            return Some(PREFERRED_SURFACE_FORMAT);
        }
    }

    formats
        .iter()
        .find(|f| {
            f.format == PREFERRED_SURFACE_FORMAT.format
                && f.color_space == PREFERRED_SURFACE_FORMAT.color_space
        })
        .or_else(|| formats.first())
        .copied()
}

/// Chooses the present mode for the swap chain. Prefers MAILBOX (triple buffering), but will
/// return FIFO if that is not available.
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Chooses the resolution of the swap chain images.
///
/// Most surfaces dictate it through `current_extent`. A width of `u32::MAX` means the surface
/// lets us pick, in which case `fallback` is clamped into the supported range.
pub fn choose_swap_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    fallback: (u32, u32),
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let min = capabilities.min_image_extent;
    let max = capabilities.max_image_extent;

    vk::Extent2D {
        width: min.width.max(max.width.min(fallback.0)),
        height: min.height.max(max.height.min(fallback.1)),
    }
}

/// One more image than the minimum, capped at the maximum when the surface has one (0 means no
/// limit).
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;

    if capabilities.max_image_count > 0 && count > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        count
    }
}

/// A created swap chain together with the images it owns and the parameters it was built with.
pub struct SwapChain {
    pub handle: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

/// Creates a swap chain for `surface`.
pub fn create_swap_chain(
    instance: &Instance,
    device: &Device,
    physical_device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    indices: &QueueFamilyIndices,
    fallback_extent: (u32, u32),
) -> Result<SwapChain, ViewError> {
    let support = SwapChainSupportDetails::query(instance, physical_device, surface)?;

    let surface_format =
        choose_surface_format(&support.formats).ok_or(ViewError::NoSurfaceFormat)?;
    let present_mode = choose_present_mode(&support.present_modes);
    let extent = choose_swap_extent(&support.capabilities, fallback_extent);
    let image_count = choose_image_count(&support.capabilities);

    let family_indices = indices.unique_families().into_iter().collect::<Vec<_>>();

    let (sharing_mode, family_indices) = if family_indices.len() > 1 {
        // Images are shared between the graphics and present families without ownership
        // transfers.
        (vk::SharingMode::CONCURRENT, family_indices)
    } else {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    };

    let info = vk::SwapchainCreateInfoKHR::builder()
        .surface(surface)
        .min_image_count(image_count)
        .image_format(surface_format.format)
        .image_color_space(surface_format.color_space)
        .image_extent(extent)
        .image_array_layers(IMAGE_LAYERS_COUNT)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(sharing_mode)
        .queue_family_indices(&family_indices)
        .pre_transform(support.capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true)
        .old_swapchain(vk::SwapchainKHR::null());

    let handle =
        unsafe { device.create_swapchain_khr(&info, None) }.map_err(ViewError::SwapChain)?;

    let images = match unsafe { device.get_swapchain_images_khr(handle) } {
        Ok(images) => images,
        Err(e) => {
            unsafe { device.destroy_swapchain_khr(handle, None) };
            return Err(ViewError::SwapChain(e));
        }
    };

    info!(
        "Swap chain created: {} images, {:?}, {:?}, {}x{}.",
        images.len(),
        surface_format.format,
        present_mode,
        extent.width,
        extent.height
    );

    Ok(SwapChain {
        handle,
        images,
        format: surface_format.format,
        extent,
    })
}

/// Creates a color view for every swap chain image. Views created before a failure are pushed to
/// `views` so the caller still owns them.
pub fn create_image_views(
    device: &Device,
    swap_chain: &SwapChain,
    views: &mut Vec<vk::ImageView>,
) -> Result<(), ViewError> {
    let components = vk::ComponentMapping::builder()
        .r(vk::ComponentSwizzle::IDENTITY)
        .g(vk::ComponentSwizzle::IDENTITY)
        .b(vk::ComponentSwizzle::IDENTITY)
        .a(vk::ComponentSwizzle::IDENTITY);

    let subresource_range = vk::ImageSubresourceRange::builder()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(IMAGE_LAYERS_COUNT);

    for image in &swap_chain.images {
        let info = vk::ImageViewCreateInfo::builder()
            .image(*image)
            .view_type(vk::ImageViewType::_2D)
            .format(swap_chain.format)
            .components(components)
            .subresource_range(subresource_range);

        let view =
            unsafe { device.create_image_view(&info, None) }.map_err(ViewError::ImageView)?;
        views.push(view);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> SurfaceFormatKHR {
        SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    fn capabilities(
        current: (u32, u32),
        min: (u32, u32),
        max: (u32, u32),
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: current.0,
                height: current.1,
            },
            min_image_extent: vk::Extent2D {
                width: min.0,
                height: min.1,
            },
            max_image_extent: vk::Extent2D {
                width: max.0,
                height: max.1,
            },
            ..Default::default()
        }
    }

    fn assert_extent(extent: vk::Extent2D, expected: (u32, u32)) {
        assert_eq!((extent.width, extent.height), expected);
    }

    #[test]
    fn preferred_format_is_chosen_when_listed() {
        let formats = [
            format(vk::Format::R8G8B8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            PREFERRED_SURFACE_FORMAT,
        ];

        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn lone_undefined_format_falls_back_to_preferred() {
        let formats = [format(vk::Format::UNDEFINED, vk::ColorSpaceKHR::SRGB_NONLINEAR)];

        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, PREFERRED_SURFACE_FORMAT.format);
        assert_eq!(chosen.color_space, PREFERRED_SURFACE_FORMAT.color_space);
    }

    #[test]
    fn otherwise_first_format_is_chosen() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::A2B10G10R10_UNORM_PACK32, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];

        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn no_formats_yields_none() {
        assert!(choose_surface_format(&[]).is_none());
    }

    #[test]
    fn mailbox_is_preferred() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn fifo_is_the_fallback() {
        let modes = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO_RELAXED];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn defined_current_extent_is_used_unchanged() {
        let caps = capabilities((1024, 768), (1, 1), (4096, 4096));
        assert_extent(choose_swap_extent(&caps, (800, 600)), (1024, 768));
    }

    #[test]
    fn undefined_current_extent_clamps_fallback() {
        let caps = capabilities((u32::MAX, u32::MAX), (1, 1), (4096, 4096));
        assert_extent(choose_swap_extent(&caps, (800, 600)), (800, 600));

        let small = capabilities((u32::MAX, u32::MAX), (1, 1), (640, 480));
        assert_extent(choose_swap_extent(&small, (800, 600)), (640, 480));

        let large = capabilities((u32::MAX, u32::MAX), (1024, 700), (4096, 4096));
        assert_extent(choose_swap_extent(&large, (800, 600)), (1024, 700));
    }

    #[test]
    fn image_count_is_one_above_minimum_within_maximum() {
        let mut caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&caps), 3);

        caps.max_image_count = 2;
        assert_eq!(choose_image_count(&caps), 2);

        caps.max_image_count = 8;
        assert_eq!(choose_image_count(&caps), 3);
    }

    #[test]
    fn adequacy_needs_formats_and_present_modes() {
        let details = SwapChainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![PREFERRED_SURFACE_FORMAT],
            present_modes: Vec::new(),
        };
        assert!(!details.is_adequate());
    }
}
