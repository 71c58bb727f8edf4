//! Lumen demo - opens one window and renders the built-in triangle
//!
//! Shader binaries are looked up under `assets/shaders/` next to the working
//! directory and materialized through the payload extractor before the
//! driver consumes them.

use std::fs;
use std::process::ExitCode;

use lumen_app_engine::lumen::resource::{Extractor, PayloadKind};
use lumen_app_engine::lumen::{self, AppContext, Application, Config};
use lumen_app_engine::lumen_error;
use lumen_app_engine_driver_vulkan::{DriverConfig, VulkanDriver};

#[derive(Default)]
struct DemoApp;

impl Application for DemoApp {
    fn start(&mut self, ctx: &mut AppContext) {
        if let Err(error) = ctx.open_window(800, 600) {
            lumen_error!("lumen_demo", "Failed to open window: {}", error);
            ctx.exit();
        }
    }
}

/// Materialize a shader payload and read its bytes back
fn load_shader(extractor: &Extractor, name: &str) -> lumen::Result<Vec<u8>> {
    let path = extractor.extract(PayloadKind::ShaderBinary, name)?;
    fs::read(&path).map_err(|error| {
        lumen::Error::FilesystemFailed(format!(
            "Failed to read extracted shader {}: {}",
            path.display(),
            error
        ))
    })
}

fn run() -> lumen::Result<()> {
    let mut extractor = Extractor::new();
    extractor.add_search_root("assets");

    let vertex_shader = load_shader(&extractor, "triangle_vert")?;
    let fragment_shader = load_shader(&extractor, "triangle_frag")?;

    let driver = VulkanDriver::new(DriverConfig::new(
        "Lumen Demo",
        vertex_shader,
        fragment_shader,
    ));

    lumen::launch::<DemoApp>(Box::new(driver), Config::default())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("lumen_demo: {}", error);
            ExitCode::FAILURE
        }
    }
}
