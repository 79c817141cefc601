use jack::{AudioIn, AudioOut, Client, Port, ProcessScope};

use crate::error::DeviceError;

pub const IN_PORT: &str = "in_port";
pub const OUT_LEFT_PORT: &str = "out_port_left";
pub const OUT_RIGHT_PORT: &str = "out_port_right";

/// One mono input, mirrored onto two outputs so headphones get both sides.
pub struct Ports {
    input: Port<AudioIn>,
    output_left: Port<AudioOut>,
    output_right: Port<AudioOut>,
}

impl Ports {
    pub fn new(client: &Client) -> Result<Self, DeviceError> {
        let register_err =
            |name: &'static str| move |source: jack::Error| DeviceError::Port { name, source };

        Ok(Self {
            input: client
                .register_port(IN_PORT, AudioIn::default())
                .map_err(register_err(IN_PORT))?,
            output_left: client
                .register_port(OUT_LEFT_PORT, AudioOut::default())
                .map_err(register_err(OUT_LEFT_PORT))?,
            output_right: client
                .register_port(OUT_RIGHT_PORT, AudioOut::default())
                .map_err(register_err(OUT_RIGHT_PORT))?,
        })
    }

    pub fn get_input<'a>(&'a self, ps: &'a ProcessScope) -> &'a [f32] {
        self.input.as_slice(ps)
    }

    pub fn write_output(&mut self, ps: &ProcessScope, samples: &[f32]) {
        let output_size = ps.n_frames() as usize;
        let frame_count = samples.len().min(output_size);
        let out_left = self.output_left.as_mut_slice(ps);
        let out_right = self.output_right.as_mut_slice(ps);

        out_left[..frame_count].copy_from_slice(&samples[..frame_count]);
        out_right[..frame_count].copy_from_slice(&samples[..frame_count]);

        out_left[frame_count..output_size].fill(0.0);
        out_right[frame_count..output_size].fill(0.0);
    }

    pub fn silence_output(&mut self, ps: &ProcessScope) {
        let output_size = ps.n_frames() as usize;
        let out_left = self.output_left.as_mut_slice(ps);
        let out_right = self.output_right.as_mut_slice(ps);
        out_left[..output_size].fill(0.0);
        out_right[..output_size].fill(0.0);
    }
}
