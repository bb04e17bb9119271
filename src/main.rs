use phagocyte::config::{IntroConfig, SimulationConfig};
use phagocyte::constants::*;
use phagocyte::intro::Intro;
use phagocyte::renderer::{InstanceData, Renderer};
use phagocyte::simulation::World;
use std::{sync::Arc, time::Instant};
use winit::{
    dpi::{LogicalPosition, PhysicalSize},
    event::{ElementState, Event, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

fn logical_size(window: &Window) -> (f32, f32) {
    let size = window.inner_size().to_logical::<f32>(window.scale_factor());
    (size.width, size.height)
}

// --- Main Function ---
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Phagocyte")
            .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
            .build(&event_loop)?,
    );
    let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;

    let (width, height) = logical_size(&window);
    let mut intro = Intro::new(IntroConfig::default(), width, height);
    let mut world = World::new(width, height, SimulationConfig::default());

    let mut cursor = LogicalPosition::new(0.0f32, 0.0f32);
    let mut last_sim_update_time = Instant::now();
    let mut time_accumulator = 0.0;
    let mut last_fps_update_time = Instant::now();
    let mut frames_since_last_fps_update = 0;
    let mut current_fps = 0.0;

    event_loop.run(move |event, elwt: &EventLoopWindowTarget<()>| {
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::AboutToWait => {
                let animating = !intro.is_finished() || world.is_running();
                if animating {
                    let now = Instant::now();
                    time_accumulator += now.duration_since(last_sim_update_time).as_secs_f64();
                    last_sim_update_time = now;

                    let mut steps = 0;
                    while time_accumulator >= FIXED_TIMESTEP && steps < MAX_STEPS_PER_FRAME {
                        if !intro.is_finished() {
                            if intro.tick() {
                                world.start();
                            }
                        } else {
                            world.tick();
                        }
                        time_accumulator -= FIXED_TIMESTEP;
                        steps += 1;
                    }
                    if steps == MAX_STEPS_PER_FRAME {
                        time_accumulator = 0.0;
                    }
                } else {
                    last_sim_update_time = Instant::now();
                    time_accumulator = 0.0;
                }
                window.request_redraw();
            }
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(physical_size) => {
                    renderer.resize(physical_size, window.scale_factor());
                    let (width, height) = logical_size(&window);
                    world.resize(width, height);
                    intro.resize(width, height);
                }
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    renderer.resize(window.inner_size(), scale_factor);
                    let (width, height) = logical_size(&window);
                    world.resize(width, height);
                    intro.resize(width, height);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    cursor = position.to_logical::<f32>(window.scale_factor());
                }
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => world.spawn_prey(cursor.x, cursor.y),
                WindowEvent::KeyboardInput {
                    event: key_event, ..
                } => {
                    if key_event.state == ElementState::Pressed && !key_event.repeat {
                        match key_event.physical_key {
                            PhysicalKey::Code(KeyCode::Enter) => {
                                if !intro.is_finished() {
                                    intro.skip();
                                    world.start();
                                }
                            }
                            PhysicalKey::Code(KeyCode::Space) if intro.is_finished() => {
                                if world.is_running() {
                                    world.stop();
                                } else {
                                    world.start();
                                }
                            }
                            PhysicalKey::Code(KeyCode::KeyR) if intro.is_finished() => {
                                world.stop();
                                world.start();
                            }
                            PhysicalKey::Code(KeyCode::Escape) => elwt.exit(),
                            _ => {}
                        }
                    }
                }
                WindowEvent::RedrawRequested => {
                    frames_since_last_fps_update += 1;
                    let now = Instant::now();
                    let elapsed_secs = now.duration_since(last_fps_update_time).as_secs_f64();
                    if elapsed_secs >= FPS_UPDATE_INTERVAL_SECS {
                        current_fps = frames_since_last_fps_update as f64 / elapsed_secs;
                        last_fps_update_time = now;
                        frames_since_last_fps_update = 0;

                        let (predator_count, prey_count) = world.counts();
                        let status = if intro.is_finished() && !world.is_running() {
                            " [STOPPED]"
                        } else {
                            ""
                        };
                        window.set_title(&format!(
                            "Phagocyte - Predators: {predator_count}, Prey: {prey_count} - FPS: {current_fps:.1}{status}"
                        ));
                    }

                    let result = if intro.is_finished() {
                        renderer.render(world.snapshot().map(InstanceData::from))
                    } else {
                        let block_size = intro.block_size();
                        renderer.render(
                            intro
                                .visible_blocks()
                                .map(|block| InstanceData::from_block(block, block_size)),
                        )
                    };
                    match result {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            renderer.reconfigure()
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("WGPU Error: OutOfMemory");
                            elwt.exit();
                        }
                        Err(e) => log::warn!("WGPU Error: {:?}", e),
                    }
                }
                _ => {}
            },
            _ => {}
        }
    })?;
    Ok(())
}
