use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::PlasmaConfig;
use crate::plasma::{PlasmaField, RenderError};

const TARGET_FRAME: Duration = Duration::from_micros(16_667);
const FPS_LOG_INTERVAL: u32 = 50;

struct FrameSlot {
    rgba: Vec<u8>,
    presented: u64,
}

/// Write side of the output surface. Handed to the render thread; after the
/// handoff the UI keeps only a [`SurfaceView`].
pub struct Surface {
    slot: Arc<Mutex<FrameSlot>>,
}

pub struct SurfaceView {
    slot: Arc<Mutex<FrameSlot>>,
    seen: u64,
}

impl Surface {
    fn new(width: u32, height: u32) -> (Surface, SurfaceView) {
        let slot = Arc::new(Mutex::new(FrameSlot {
            rgba: vec![0; width as usize * height as usize * 4],
            presented: 0,
        }));
        (Surface { slot: slot.clone() }, SurfaceView { slot, seen: 0 })
    }

    fn blit(&self, rgba: &[u8]) {
        let mut slot = lock(&self.slot);
        slot.rgba.copy_from_slice(rgba);
        slot.presented += 1;
    }
}

impl SurfaceView {
    /// Copies the newest frame into `out` if it advanced past the last one
    /// this view returned.
    pub fn latest(&mut self, out: &mut Vec<u8>) -> bool {
        let slot = lock(&self.slot);
        if slot.presented == self.seen {
            return false;
        }
        out.clear();
        out.extend_from_slice(&slot.rgba);
        self.seen = slot.presented;
        true
    }

    pub fn presented(&self) -> u64 {
        self.seen
    }
}

enum Command {
    Init {
        surface: Surface,
        config: PlasmaConfig,
        device_pixel_ratio: f32,
        width: u32,
        height: u32,
    },
    Start,
}

/// Controller-side handle for one render session. Dropping it disconnects
/// the command channel, which the render thread treats as teardown.
pub struct RenderWorker {
    commands: Option<Sender<Command>>,
    handle: Option<JoinHandle<()>>,
    pub view: SurfaceView,
    pub width: u32,
    pub height: u32,
}

impl RenderWorker {
    pub fn start(
        config: PlasmaConfig,
        width: u32,
        height: u32,
        device_pixel_ratio: f32,
    ) -> Result<Self, RenderError> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(RenderError::EmptySurface { width, height });
        }

        let (surface, view) = Surface::new(width, height);
        let (commands, inbox) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("plasma-render".to_owned())
            .spawn(move || worker_main(inbox))?;

        let init = Command::Init {
            surface,
            config,
            device_pixel_ratio,
            width,
            height,
        };
        if commands.send(init).is_err() || commands.send(Command::Start).is_err() {
            return Err(RenderError::WorkerGone);
        }

        Ok(Self {
            commands: Some(commands),
            handle: Some(handle),
            view,
            width,
            height,
        })
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        drop(self.commands.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_main(inbox: Receiver<Command>) {
    let mut session: Option<(PlasmaField, Surface)> = None;

    loop {
        match inbox.recv() {
            Ok(Command::Init {
                surface,
                config,
                device_pixel_ratio,
                width,
                height,
            }) => match PlasmaField::new(config, width, height) {
                Ok(field) => {
                    let [w, h] = field.dimensions();
                    log::info!("plasma field ready: {w}x{h} at dpr {device_pixel_ratio}");
                    session = Some((field, surface));
                }
                Err(err) => {
                    log::error!("plasma init rejected: {err}");
                    return;
                }
            },
            Ok(Command::Start) => match session.take() {
                Some((field, surface)) => {
                    run_loop(field, surface, &inbox);
                    return;
                }
                None => {
                    log::error!("start received before init");
                    return;
                }
            },
            Err(_) => return,
        }
    }
}

fn run_loop(mut field: PlasmaField, surface: Surface, inbox: &Receiver<Command>) {
    let mut window_start = Instant::now();
    let mut window_frames = 0u32;

    loop {
        let frame_start = Instant::now();
        field.render_frame();
        surface.blit(field.frame_rgba());

        window_frames += 1;
        if window_frames == FPS_LOG_INTERVAL {
            let elapsed = window_start.elapsed().as_secs_f32().max(1.0e-6);
            log::debug!(
                "plasma: {:.1} fps, clock {:.2}",
                window_frames as f32 / elapsed,
                field.clock()
            );
            window_start = Instant::now();
            window_frames = 0;
        }

        if matches!(inbox.try_recv(), Err(TryRecvError::Disconnected)) {
            return;
        }

        // A slow frame just starts the next one late.
        let spent = frame_start.elapsed();
        if spent < TARGET_FRAME {
            thread::sleep(TARGET_FRAME - spent);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
