mod commands;
mod config;
mod controller;
mod device;
mod error;
mod init;
mod input;
mod keys;
mod model;
mod pipeline;
mod renderer;
mod shaders;
mod swapchain;
mod view;

use env_logger::Env;
use vulkanalia::vk;
use vulkanalia::vk::ExtensionName;
use winit::event_loop::{ControlFlow, EventLoop};

use crate::config::ViewConfig;
use crate::controller::Controller;
use crate::model::Model;
use crate::view::View;

pub const VALIDATION_ENABLED: bool = cfg!(debug_assertions);
pub const REQUIRED_EXTENSIONS: [ExtensionName; 1] = [vk::KHR_SWAPCHAIN_EXTENSION.name];

fn main() -> anyhow::Result<()> {
    let default_filter = if VALIDATION_ENABLED { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let model = Model::new();
    let view = View::new(ViewConfig::default());
    let controller = Controller::new(model, view);

    controller.run_loop(event_loop)
}
