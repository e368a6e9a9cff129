//! Link supervisor
//!
//! Boots the instruments and radios, then drives the telemetry schedule:
//! full frames every telemetry interval, GPS-only frames in between, the
//! call sign every call sign interval, and a command poll on every tick.
//! Consecutive failed frames past the threshold trigger a promotion.
//!
//! In ground-station mode nothing is transmitted; every tick reads downlink
//! frames and logs the decoded position.

use anyhow::Context;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use altair_core::SnapshotSource;
use altair_telemetry::{
    Position, RadioKind, ReaderRole, TelemetryConfig, TelemetryError, TelemetrySystem,
    FULL_FRAME_LENGTH, GPS_FRAME_LENGTH,
};

use crate::config::NodeConfig;
use crate::radios::build_radios;

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Frames transmitted successfully
    pub frames_sent: u32,
    /// Frames whose transmission failed
    pub frames_failed: u32,
    /// Length of the frame received, if any
    pub frame_received: Option<usize>,
    /// Radio promoted to primary during this tick
    pub promoted: Option<RadioKind>,
}

/// Drives the telemetry schedule over a [`TelemetrySystem`]
pub struct LinkSupervisor<S> {
    system: TelemetrySystem,
    source: S,
    config: TelemetryConfig,
    consecutive_failures: u32,
    next_telemetry: Instant,
    next_gps: Instant,
    next_call_sign: Instant,
    ticks: u64,
}

impl<S: SnapshotSource> LinkSupervisor<S> {
    /// Detect sensors, build and initialize the radios
    ///
    /// Any failure here is fatal.
    pub fn boot(config: &NodeConfig, mut source: S) -> anyhow::Result<Self> {
        source.detect().context("sensor detection failed")?;
        info!("All required sensors detected");

        let telemetry = &config.telemetry;
        let (dnt900, shx144, rfm23bp) = build_radios(telemetry).context("building radios")?;
        let mut system = TelemetrySystem::new(dnt900, shx144, rfm23bp, telemetry);
        system
            .initialize_all(telemetry.enable_backup1, telemetry.enable_backup2)
            .context("radio initialization failed")?;

        Ok(Self::new(system, source, telemetry.clone()))
    }

    /// Supervise an already initialized system
    pub fn new(system: TelemetrySystem, source: S, config: TelemetryConfig) -> Self {
        let now = Instant::now();
        Self {
            system,
            source,
            config,
            consecutive_failures: 0,
            next_telemetry: now,
            next_gps: now,
            next_call_sign: now,
            ticks: 0,
        }
    }

    /// The supervised system
    pub fn system(&self) -> &TelemetrySystem {
        &self.system
    }

    /// The snapshot source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Period of the scheduling loop
    pub fn tick_period(&self) -> Duration {
        self.config.gps_interval.min(self.config.telemetry_interval)
    }

    /// Run one scheduling step at `now`
    pub fn tick(&mut self, now: Instant) -> anyhow::Result<TickReport> {
        self.ticks += 1;
        let mut report = TickReport::default();

        if self.config.reader_role == ReaderRole::GroundStation {
            self.receive(&mut report);
            return Ok(report);
        }

        if now >= self.next_call_sign {
            self.next_call_sign = now + self.config.call_sign_interval;
            if let Err(e) = self.system.send_call_sign() {
                warn!(error = %e, "Call sign not sent");
            }
        }

        if now >= self.next_telemetry {
            self.next_telemetry = now + self.config.telemetry_interval;
            self.next_gps = now + self.config.gps_interval;
            let snapshot = self
                .source
                .snapshot()
                .context("reading instruments")?
                .with_rssi(self.system.primary_rssi());
            let result = self.system.send_telemetry(&snapshot);
            self.record(result, &mut report)?;
        } else if now >= self.next_gps {
            self.next_gps = now + self.config.gps_interval;
            let snapshot = self.source.snapshot().context("reading instruments")?;
            let result = self.system.send_gps(&Position::from_fix(&snapshot.gps));
            self.record(result, &mut report)?;
        }

        self.receive(&mut report);
        Ok(report)
    }

    fn record(
        &mut self,
        result: altair_telemetry::Result<()>,
        report: &mut TickReport,
    ) -> anyhow::Result<()> {
        match result {
            Ok(()) => {
                self.consecutive_failures = 0;
                report.frames_sent += 1;
            }
            Err(e) => {
                self.consecutive_failures += 1;
                report.frames_failed += 1;
                warn!(
                    radio = %self.system.primary_kind(),
                    error = %e,
                    consecutive = self.consecutive_failures,
                    "Frame failed"
                );
            }
        }

        if self.consecutive_failures >= self.config.failover_threshold {
            report.promoted = self.fail_over()?;
        }
        Ok(())
    }

    fn fail_over(&mut self) -> anyhow::Result<Option<RadioKind>> {
        self.consecutive_failures = 0;
        let result = if self.config.enable_backup1 {
            self.system.promote_backup1()
        } else if self.config.enable_backup2 {
            self.system.promote_backup2()
        } else {
            error!(
                radio = %self.system.primary_kind(),
                "Primary radio failing and no backup enabled"
            );
            return Ok(None);
        };
        result.context("promoting backup radio failed")?;
        Ok(Some(self.system.primary_kind()))
    }

    fn receive(&mut self, report: &mut TickReport) {
        match self.system.read_primary() {
            Ok(Some(frame)) => {
                report.frame_received = Some(frame.len());
                self.log_frame(&frame);
                self.echo_command(&frame);
            }
            Ok(None) => {}
            Err(TelemetryError::TransportBusy { radio }) => {
                debug!(%radio, "Primary busy, command poll skipped");
            }
            Err(e) => warn!(error = %e, "Command poll failed"),
        }
    }

    fn log_frame(&self, frame: &[u8]) {
        let length = frame.len();
        if self.config.reader_role == ReaderRole::GroundStation
            && (length == GPS_FRAME_LENGTH as usize || length == FULL_FRAME_LENGTH as usize)
        {
            if let Some(position) = Position::decode(frame) {
                info!(
                    time = %format!("{:02}:{:02}:{:02}", position.hour, position.minute, position.second),
                    latitude = position.latitude(),
                    longitude = position.longitude(),
                    elevation_m = position.elevation_m,
                    full = length == FULL_FRAME_LENGTH as usize,
                    "Downlink frame"
                );
                return;
            }
        }
        info!(length, bytes = ?frame, "Frame received");
    }

    fn echo_command(&mut self, frame: &[u8]) {
        if !self.config.echo_commands || self.config.reader_role == ReaderRole::GroundStation {
            return;
        }
        match self.system.echo_frame(frame) {
            Ok(()) => debug!(length = frame.len(), "Command frame echoed"),
            Err(e) => warn!(error = %e, "Command echo not sent"),
        }
    }

    /// Tick every [`tick_period`](Self::tick_period) until `ticks` have run
    /// (forever when `None`) or ctrl-c
    pub async fn run(&mut self, ticks: Option<u64>) -> anyhow::Result<()> {
        let period = self.tick_period();
        info!(
            period = %humantime::format_duration(period),
            telemetry = %humantime::format_duration(self.config.telemetry_interval),
            role = ?self.config.reader_role,
            "Link supervisor running"
        );

        let mut interval = tokio::time::interval(period);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            if ticks.is_some_and(|limit| self.ticks >= limit) {
                break;
            }
            tokio::select! {
                instant = interval.tick() => {
                    self.tick(instant)?;
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        for kind in RadioKind::ALL {
            let stats = self.system.stats(kind);
            info!(
                radio = %kind,
                role = %self.system.role_of(kind),
                sent = stats.frames_sent,
                failed = stats.send_failures,
                received = stats.frames_received,
                "Link statistics"
            );
        }
        info!(failovers = self.system.failovers(), "Link supervisor stopped");
        Ok(())
    }
}

impl<S> std::fmt::Debug for LinkSupervisor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSupervisor")
            .field("system", &self.system)
            .field("consecutive_failures", &self.consecutive_failures)
            .field("ticks", &self.ticks)
            .finish()
    }
}
