use std::collections::HashSet;
use std::ffi::{CStr, c_void};

use log::{debug, error, info, warn};
use vulkanalia::loader::{LIBRARY, LibloadingLoader};
use vulkanalia::vk::{EntryV1_0, ExtDebugUtilsExtension, ExtensionName, HasBuilder, InstanceV1_0};
use vulkanalia::window::get_required_instance_extensions;
use vulkanalia::{Entry, Instance, Version, vk};
use winit::window::Window;

use crate::error::ViewError;

/// The validation layer requested when validation is enabled.
pub const VALIDATION_LAYER: ExtensionName =
    ExtensionName::from_bytes(b"VK_LAYER_KHRONOS_validation");

/// Loads the Vulkan library through libloading, resolving the platform's default loader path.
pub fn create_vulkan_entry() -> Result<Entry, ViewError> {
    let loader = unsafe { LibloadingLoader::new(LIBRARY) }
        .map_err(|e| ViewError::Loader(e.to_string()))?;

    unsafe { Entry::new(loader) }.map_err(|e| ViewError::Loader(e.to_string()))
}

/// Checks that the validation layer is installed.
pub fn check_validation_layer_support(entry: &Entry) -> Result<bool, ViewError> {
    let layers = unsafe { entry.enumerate_instance_layer_properties() }
        .map_err(ViewError::Instance)?
        .iter()
        .map(|l| l.layer_name)
        .collect::<HashSet<_>>();

    Ok(layers.contains(&VALIDATION_LAYER))
}

pub extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    type_: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _: *mut c_void,
) -> vk::Bool32 {
    let message = unsafe { CStr::from_ptr((*callback_data).message) }.to_string_lossy();

    if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        error!("({:?}) {}", type_, message);
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        warn!("({:?}) {}", type_, message);
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::INFO {
        info!("({:?}) {}", type_, message);
    } else {
        debug!("({:?}) {}", type_, message);
    }

    vk::FALSE
}

/// Creates the Vulkan instance with the extensions the window needs. When `validation` is set and
/// the layer is installed, the layer and a debug messenger are attached too; the messenger is
/// returned alongside the instance so its owner can destroy it first.
pub fn create_instance(
    window: &Window,
    entry: &Entry,
    validation: bool,
) -> Result<(Instance, Option<vk::DebugUtilsMessengerEXT>), ViewError> {
    let validation = if validation && !check_validation_layer_support(entry)? {
        warn!("Validation layer requested but not installed, continuing without it.");
        false
    } else {
        validation
    };

    let application_info = vk::ApplicationInfo::builder()
        .application_name(b"Vulkan Window\0")
        .application_version(Version::new(1, 0, 0).into())
        .engine_name(b"No Engine\0")
        .engine_version(Version::new(1, 0, 0).into())
        .api_version(Version::new(1, 0, 0).into());

    let mut extensions = get_required_instance_extensions(window)
        .iter()
        .map(|e| e.as_ptr())
        .collect::<Vec<_>>();

    if validation {
        extensions.push(vk::EXT_DEBUG_UTILS_EXTENSION.name.as_ptr());
    }

    // MoltenVK is not fully conformant, and the loader hides it unless portability enumeration
    // is acknowledged.
    let flags = if cfg!(target_os = "macos") {
        extensions.push(vk::KHR_PORTABILITY_ENUMERATION_EXTENSION.name.as_ptr());
        vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
    } else {
        vk::InstanceCreateFlags::empty()
    };

    let layers = if validation {
        vec![VALIDATION_LAYER.as_ptr()]
    } else {
        Vec::new()
    };

    let mut debug_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
        )
        .user_callback(Some(debug_callback));

    let mut instance_info = vk::InstanceCreateInfo::builder()
        .application_info(&application_info)
        .enabled_layer_names(&layers)
        .enabled_extension_names(&extensions)
        .flags(flags);

    // Chaining the messenger info also covers messages from instance creation and destruction.
    if validation {
        instance_info = instance_info.push_next(&mut debug_info);
    }

    let instance = unsafe { entry.create_instance(&instance_info, None) }
        .map_err(ViewError::Instance)?;

    let messenger = if validation {
        match unsafe { instance.create_debug_utils_messenger_ext(&debug_info, None) } {
            Ok(messenger) => Some(messenger),
            Err(e) => {
                unsafe { instance.destroy_instance(None) };
                return Err(ViewError::DebugMessenger(e));
            }
        }
    } else {
        None
    };

    info!("Vulkan instance created (validation: {}).", validation);
    Ok((instance, messenger))
}
