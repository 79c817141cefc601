use anyhow::{Context, Result};
use jack::{AsyncClient, Client, ClientOptions};
use log::{debug, error, info, warn};
use std::thread::{self, JoinHandle};

use crate::audio::engine::{Engine, EngineHandle, EngineStats};
use crate::audio::jack::{NotificationHandler, ProcessHandler, debug_stats};
use crate::audio::ports::{IN_PORT, OUT_LEFT_PORT, OUT_RIGHT_PORT};
use crate::error::{DeviceError, EngineError};
use crate::settings::Settings;
use crate::snapshot::SnapshotReader;

const CLIENT_NAME: &str = "rustamp";

/// Owns the JACK client for the lifetime of the amp.
///
/// The client is released on every exit path: dropping a half-built client on
/// construction failure, `shutdown`, or `Drop`.
pub struct Manager {
    active_client: Option<AsyncClient<NotificationHandler, ProcessHandler>>,
    engine_handle: EngineHandle,
    monitor: Option<JoinHandle<()>>,
}

impl Manager {
    pub fn new(settings: &Settings, reader: SnapshotReader) -> Result<Self> {
        let (client, _) = Client::new(CLIENT_NAME, ClientOptions::NO_START_SERVER)
            .map_err(DeviceError::Open)
            .context("failed to create JACK client")?;

        let sample_rate = client.sample_rate() as usize;
        let buffer_size = client.buffer_size() as usize;
        debug_stats(&client);

        if sample_rate != settings.audio.sample_rate as usize
            || buffer_size != settings.audio.buffer_size as usize
        {
            warn!(
                "JACK runs at {sample_rate} Hz / {buffer_size} frames, settings ask for {} Hz / {} frames",
                settings.audio.sample_rate, settings.audio.buffer_size
            );
        }

        let (engine, engine_handle) = Engine::new(reader, buffer_size, sample_rate, settings.clipper)
            .context("failed to create audio engine")?;
        let jack_handler =
            ProcessHandler::new(&client, engine).context("failed to create process handler")?;

        let active_client = client
            .activate_async(NotificationHandler::new(engine_handle.clone(), sample_rate), jack_handler)
            .map_err(DeviceError::Activate)
            .context("failed to activate async client")?;

        let monitor = spawn_monitor(&engine_handle)?;

        let manager = Self {
            active_client: Some(active_client),
            engine_handle,
            monitor: Some(monitor),
        };

        manager.connect_ports(settings);
        info!("Audio engine started (SR: {sample_rate}Hz, Chunk: {buffer_size})");

        Ok(manager)
    }

    /// Connect audio ports based on settings
    fn connect_ports(&self, settings: &Settings) {
        let Some(active_client) = &self.active_client else {
            return;
        };
        let client = active_client.as_client();
        let own = |port: &str| format!("{CLIENT_NAME}:{port}");
        let audio = &settings.audio;

        let connections = [
            (audio.input_port.clone(), own(IN_PORT)),
            (own(OUT_LEFT_PORT), audio.output_left_port.clone()),
            (own(OUT_RIGHT_PORT), audio.output_right_port.clone()),
        ];

        for (source, destination) in &connections {
            if let Err(e) = client.connect_ports_by_name(source, destination) {
                warn!("Failed to connect '{source}' -> '{destination}': {e}");
            } else {
                info!("Connected {source} -> {destination}");
            }
        }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine_handle
    }

    pub fn stats(&self) -> EngineStats {
        self.engine_handle.stats()
    }

    pub fn sample_rate(&self) -> Option<usize> {
        self.active_client
            .as_ref()
            .map(|c| c.as_client().sample_rate() as usize)
    }

    pub fn buffer_size(&self) -> Option<usize> {
        self.active_client
            .as_ref()
            .map(|c| c.as_client().buffer_size() as usize)
    }

    /// Stops the callback and releases the device. JACK finishes the cycle in
    /// flight before deactivation returns. Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<()> {
        let monitor = self.monitor.take();

        if let Some(active_client) = self.active_client.take() {
            // On failure the monitor is left detached rather than joined.
            let (_client, _notifications, _process) = active_client
                .deactivate()
                .context("failed to deactivate JACK client")?;
            info!("Audio engine stopped");
        }

        // The engine, and with it the event sender, is gone now.
        if let Some(monitor) = monitor {
            monitor
                .join()
                .map_err(|e| anyhow::anyhow!("Monitor thread panicked (join failed): {:?}", e))?;
        }

        Ok(())
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Failed to shut down audio engine: {e:#}");
        }
    }
}

/// Logs real-time events off the audio thread until the engine goes away.
pub fn spawn_monitor(handle: &EngineHandle) -> Result<JoinHandle<()>> {
    let rx = handle.events().clone();

    thread::Builder::new()
        .name("rustamp-monitor".to_string())
        .spawn(move || {
            for event in rx.iter() {
                match event {
                    EngineError::Overrun { .. } => warn!("Audio overrun: {event}"),
                    EngineError::BufferSizeMismatch { .. } | EngineError::InvalidFormat { .. } => {
                        error!("Device error: {event}");
                    }
                }
            }
            debug!("Engine event stream closed");
        })
        .context("failed to spawn monitor thread")
}
