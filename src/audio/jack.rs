use assert_no_alloc::assert_no_alloc;
use jack::{Client, Control, Frames, ProcessScope};
use log::{debug, warn};

use crate::audio::engine::{Engine, EngineHandle};
use crate::audio::ports::Ports;
use crate::error::DeviceError;

pub struct NotificationHandler {
    engine: EngineHandle,
    /// Rate the effects chain was built for.
    engine_rate: usize,
}

pub struct ProcessHandler {
    ports: Ports,
    audio_engine: Engine,
    buffer: Vec<f32>,
}

impl NotificationHandler {
    pub const fn new(engine: EngineHandle, engine_rate: usize) -> Self {
        Self {
            engine,
            engine_rate,
        }
    }

    /// True when the device now runs at a rate the filters and delay lines
    /// were not tuned for.
    pub const fn is_detuned(&self, device_rate: usize) -> bool {
        device_rate != self.engine_rate
    }
}

impl jack::NotificationHandler for NotificationHandler {
    fn sample_rate(&mut self, _: &Client, sample_rate: Frames) -> Control {
        // JACK also calls this once on activation with the current rate.
        if self.is_detuned(sample_rate as usize) {
            warn!(
                "JACK sample rate changed to {sample_rate} Hz, the amp is tuned for {} Hz; restart to retune",
                self.engine_rate
            );
        } else {
            debug!("JACK sample rate is {sample_rate} Hz");
        }

        Control::Continue
    }

    fn xrun(&mut self, _: &Client) -> Control {
        self.engine.record_xrun();

        Control::Continue
    }
}

impl ProcessHandler {
    pub fn new(client: &Client, audio_engine: Engine) -> Result<Self, DeviceError> {
        let ports = Ports::new(client)?;
        let buffer_size = audio_engine.buffer_size();

        Ok(Self {
            ports,
            audio_engine,
            buffer: vec![0.0; buffer_size],
        })
    }
}

impl jack::ProcessHandler for ProcessHandler {
    fn process(&mut self, _client: &Client, ps: &ProcessScope) -> Control {
        let result = assert_no_alloc(|| {
            let input = self.ports.get_input(ps);
            self.audio_engine.process(input, &mut self.buffer)
        });

        // The engine has already counted and queued the failure.
        if result.is_err() {
            self.ports.silence_output(ps);
            return Control::Continue;
        }

        self.ports.write_output(ps, &self.buffer);
        Control::Continue
    }

    fn buffer_size(&mut self, client: &Client, frames: Frames) -> Control {
        let new_size = frames as usize;
        warn!("buffer_size changed to {new_size} frames");
        debug_stats(client);

        self.buffer.resize(new_size, 0.0);
        self.audio_engine.update_buffer_size(new_size);

        Control::Continue
    }
}

pub fn debug_stats(client: &Client) {
    let sample_rate = client.sample_rate() as f32;
    let buffer_frames = client.buffer_size() as f32;
    debug!(
        "Sample rate: {sample_rate}, Buffer frames: {buffer_frames}, Calls p/s: {}",
        sample_rate / buffer_frames
    );
}
