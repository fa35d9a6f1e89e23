//! SDL2 Window Display Module
//! Creates an SDL2 window and blits canonical RGBA images into a
//! streaming texture.

use std::time::Instant;

use ::sdl2::event::Event;
use ::sdl2::keyboard::Keycode;
use ::sdl2::pixels::PixelFormatEnum;
use ::sdl2::render::{Canvas, TextureCreator};
use ::sdl2::video::{Window, WindowContext};
use color_eyre::Result;
use flume::Receiver;
use tracing::{error, info};

use super::{BlitSurface, CanonicalImage, DisplayError};
use crate::source::Frame;
use crate::viewer::Viewer;

/// SDL2 window surface.
/// Recreates its streaming texture whenever the incoming resolution
/// changes.
pub struct Sdl2Display {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    width: u32,
    height: u32,
}

impl Sdl2Display {
    pub fn new(sdl_context: &::sdl2::Sdl, width: u32, height: u32) -> Result<Self, DisplayError> {
        let video_subsystem = sdl_context.video().map_err(DisplayError::MissingTarget)?;

        let window = video_subsystem
            .window("Iris Frame Viewer", width, height)
            .position_centered()
            .build()
            .map_err(|e| DisplayError::MissingTarget(e.to_string()))?;

        let canvas = window
            .into_canvas()
            .present_vsync()
            .build()
            .map_err(|e| DisplayError::MissingTarget(e.to_string()))?;
        let texture_creator = canvas.texture_creator();

        Ok(Self {
            canvas,
            texture_creator,
            width,
            height,
        })
    }
}

impl BlitSurface for Sdl2Display {
    fn blit(&mut self, image: &CanonicalImage) -> Result<(), DisplayError> {
        let render_start = Instant::now();

        if self.width != image.width || self.height != image.height {
            info!(
                "Display resolution change: {}x{} -> {}x{}",
                self.width, self.height, image.width, image.height
            );
            self.width = image.width;
            self.height = image.height;
        }

        let mut texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::RGBA32, image.width, image.height)
            .map_err(|e| DisplayError::Render(e.to_string()))?;

        texture
            .update(None, &image.pixels, image.width as usize * 4)
            .map_err(|e| DisplayError::Render(e.to_string()))?;

        self.canvas.clear();
        self.canvas
            .copy(&texture, None, None)
            .map_err(DisplayError::Render)?;

        self.canvas.present();

        let render_time = render_start.elapsed();
        metrics::histogram!("render_time_us").record(render_time.as_micros() as f64);

        Ok(())
    }
}

/// Pump SDL events and feed incoming frames through the viewer until the
/// window is closed or the source hangs up.
pub fn run_display_loop(
    sdl_context: &::sdl2::Sdl,
    viewer: &mut Viewer<Sdl2Display>,
    rx: Receiver<Frame>,
) -> Result<()> {
    let mut event_pump = sdl_context
        .event_pump()
        .map_err(DisplayError::MissingTarget)?;

    'running: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => {
                    info!("Quit event received");
                    break 'running;
                }
                _ => {}
            }
        }

        match rx.recv() {
            Ok(frame) => {
                // A bad frame is rejected; the previous image stays up.
                if let Err(e) = viewer.process_frame(&frame) {
                    error!("Frame rejected: {}", e);
                }
            }
            Err(_) => {
                info!("Frame source closed");
                break;
            }
        }
    }

    Ok(())
}
