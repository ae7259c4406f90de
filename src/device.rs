use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, info, warn};
use vulkanalia::vk::{DeviceV1_0, HasBuilder, InstanceV1_0, KhrSurfaceExtension, PhysicalDeviceType};
use vulkanalia::{Device, Instance, vk};

use crate::REQUIRED_EXTENSIONS;
use crate::error::ViewError;
use crate::swapchain::SwapChainSupportDetails;

/// Score a device gets for being a discrete GPU.
const DISCRETE_GPU_BONUS: u32 = 1000;

/// Contains indices on the current GPU for each queue family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics_family: Option<u32>,
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// Locates the graphics and present queue families on `device`. Scanning stops at the first
    /// point where both are known.
    pub fn find(
        instance: &Instance,
        surface: vk::SurfaceKHR,
        device: vk::PhysicalDevice,
    ) -> Result<Self, ViewError> {
        let properties = unsafe { instance.get_physical_device_queue_family_properties(device) };

        let mut indices = Self::default();

        for (i, family) in properties.iter().enumerate() {
            let i = i as u32;

            if family.queue_count > 0 && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                indices.graphics_family = Some(i);
            }

            let present_support =
                unsafe { instance.get_physical_device_surface_support_khr(device, i, surface) }
                    .map_err(ViewError::DeviceQuery)?;

            if family.queue_count > 0 && present_support {
                indices.present_family = Some(i);
            }

            if indices.is_complete() {
                break;
            }
        }

        Ok(indices)
    }

    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// The distinct families to create queues on. Graphics and presentation often share one.
    pub fn unique_families(&self) -> BTreeSet<u32> {
        self.graphics_family
            .into_iter()
            .chain(self.present_family)
            .collect()
    }
}

/// Ranks a device by type and maximum texture size. Devices without geometry shaders score 0,
/// which disqualifies them.
pub fn score_physical_device(
    properties: &vk::PhysicalDeviceProperties,
    features: &vk::PhysicalDeviceFeatures,
) -> u32 {
    if features.geometry_shader == vk::FALSE {
        return 0;
    }

    let mut score = 0;

    if properties.device_type == PhysicalDeviceType::DISCRETE_GPU {
        score += DISCRETE_GPU_BONUS;
    }

    score.saturating_add(properties.limits.max_image_dimension_2d)
}

/// Picks the highest scoring candidate. Candidates with equal scores overwrite each other, so the
/// last one seen wins. Returns `None` when no candidate scores above 0.
pub fn pick_best<T>(candidates: impl IntoIterator<Item = (u32, T)>) -> Option<T> {
    let ranked = candidates.into_iter().collect::<BTreeMap<_, _>>();

    ranked
        .into_iter()
        .next_back()
        .filter(|(score, _)| *score > 0)
        .map(|(_, candidate)| candidate)
}

/// Queries the physical device for support for the extensions the renderer requires.
fn check_device_extension_support(
    instance: &Instance,
    device: vk::PhysicalDevice,
) -> Result<bool, ViewError> {
    let available = unsafe { instance.enumerate_device_extension_properties(device, None) }
        .map_err(ViewError::DeviceQuery)?
        .iter()
        .map(|e| e.extension_name)
        .collect::<HashSet<_>>();

    let mut supported = true;
    for ext in REQUIRED_EXTENSIONS {
        if !available.contains(&ext) {
            warn!("Required extension {} not available!", ext);
            supported = false;
        }
    }

    Ok(supported)
}

/// Checks everything besides the score: complete queue families, required extensions, and at
/// least one surface format and present mode.
fn is_device_suitable(
    instance: &Instance,
    surface: vk::SurfaceKHR,
    device: vk::PhysicalDevice,
) -> Result<bool, ViewError> {
    let indices = QueueFamilyIndices::find(instance, surface, device)?;

    if !indices.is_complete() || !check_device_extension_support(instance, device)? {
        return Ok(false);
    }

    let support = SwapChainSupportDetails::query(instance, device, surface)?;
    Ok(support.is_adequate())
}

/// Selects the highest-ranked suitable physical device.
pub fn pick_physical_device(
    instance: &Instance,
    surface: vk::SurfaceKHR,
) -> Result<vk::PhysicalDevice, ViewError> {
    let devices =
        unsafe { instance.enumerate_physical_devices() }.map_err(ViewError::DeviceQuery)?;

    if devices.is_empty() {
        return Err(ViewError::NoVulkanDevice);
    }

    let mut candidates = Vec::with_capacity(devices.len());

    for device in devices {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let features = unsafe { instance.get_physical_device_features(device) };
        let score = score_physical_device(&properties, &features);

        debug!("Physical device `{}` scored {}.", properties.device_name, score);

        if score > 0 && is_device_suitable(instance, surface, device)? {
            candidates.push((score, device));
        } else {
            warn!("Skipping physical device `{}`.", properties.device_name);
        }
    }

    let device = pick_best(candidates).ok_or(ViewError::NoSuitableDevice)?;

    let properties = unsafe { instance.get_physical_device_properties(device) };
    info!("Selected physical device `{}`.", properties.device_name);

    Ok(device)
}

/// Creates the logical device with one queue per distinct family, every feature the physical
/// device supports, and the required extensions. Returns the device with its graphics and
/// present queues.
pub fn create_logical_device(
    instance: &Instance,
    physical_device: vk::PhysicalDevice,
    indices: &QueueFamilyIndices,
) -> Result<(Device, vk::Queue, vk::Queue), ViewError> {
    let (Some(graphics_family), Some(present_family)) =
        (indices.graphics_family, indices.present_family)
    else {
        return Err(ViewError::NoSuitableDevice);
    };

    let queue_priorities = &[1.0];
    let queue_infos = indices
        .unique_families()
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(family)
                .queue_priorities(queue_priorities)
        })
        .collect::<Vec<_>>();

    let features = unsafe { instance.get_physical_device_features(physical_device) };

    let extensions = REQUIRED_EXTENSIONS
        .iter()
        .map(|e| e.as_ptr())
        .collect::<Vec<_>>();

    let device_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(&queue_infos)
        .enabled_extension_names(&extensions)
        .enabled_features(&features);

    let device = unsafe { instance.create_device(physical_device, &device_info, None) }
        .map_err(ViewError::LogicalDevice)?;

    let graphics_queue = unsafe { device.get_device_queue(graphics_family, 0) };
    let present_queue = unsafe { device.get_device_queue(present_family, 0) };

    Ok((device, graphics_queue, present_queue))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(device_type: PhysicalDeviceType, max_dim: u32) -> vk::PhysicalDeviceProperties {
        vk::PhysicalDeviceProperties {
            device_type,
            limits: vk::PhysicalDeviceLimits {
                max_image_dimension_2d: max_dim,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn features(geometry_shader: bool) -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures {
            geometry_shader: if geometry_shader { vk::TRUE } else { vk::FALSE },
            ..Default::default()
        }
    }

    #[test]
    fn discrete_gpu_outscores_integrated_by_1000() {
        let discrete = score_physical_device(
            &properties(PhysicalDeviceType::DISCRETE_GPU, 16384),
            &features(true),
        );
        let integrated = score_physical_device(
            &properties(PhysicalDeviceType::INTEGRATED_GPU, 16384),
            &features(true),
        );

        assert_eq!(integrated, 16384);
        assert_eq!(discrete - integrated, 1000);
    }

    #[test]
    fn missing_geometry_shader_scores_zero() {
        let score = score_physical_device(
            &properties(PhysicalDeviceType::DISCRETE_GPU, 32768),
            &features(false),
        );

        assert_eq!(score, 0);
    }

    #[test]
    fn huge_image_dimension_saturates() {
        let score = score_physical_device(
            &properties(PhysicalDeviceType::DISCRETE_GPU, u32::MAX),
            &features(true),
        );

        assert_eq!(score, u32::MAX);
    }

    #[test]
    fn pick_best_takes_highest_score() {
        let picked = pick_best([(17384, "discrete"), (16384, "integrated"), (4096, "cpu")]);
        assert_eq!(picked, Some("discrete"));
    }

    #[test]
    fn pick_best_equal_scores_last_wins() {
        let picked = pick_best([(16384, "first"), (16384, "second")]);
        assert_eq!(picked, Some("second"));
    }

    #[test]
    fn pick_best_rejects_zero_and_empty() {
        assert_eq!(pick_best([(0, "no geometry shader")]), None);
        assert_eq!(pick_best(Vec::<(u32, &str)>::new()), None);
    }

    #[test]
    fn completeness_needs_both_families() {
        let graphics_only = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: None,
        };
        assert!(!graphics_only.is_complete());

        let both = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(2),
        };
        assert!(both.is_complete());
    }

    #[test]
    fn shared_family_is_created_once() {
        let shared = QueueFamilyIndices {
            graphics_family: Some(1),
            present_family: Some(1),
        };
        assert_eq!(shared.unique_families().into_iter().collect::<Vec<_>>(), vec![1]);

        let split = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(2),
        };
        assert_eq!(split.unique_families().into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }
}
