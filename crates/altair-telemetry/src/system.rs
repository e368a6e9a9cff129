//! Radio roles and failover
//!
//! [`TelemetrySystem`] owns the three radios and binds each to one of the
//! roles primary, backup 1, and backup 2. Telemetry goes out and commands
//! come in over the primary; promoting a backup rebinds roles without moving
//! any frame state between radios.
//!
//! The role table is a permutation of [`RadioKind::ALL`] at all times. At
//! boot it is the default order: DNT900 primary, SHX144 backup 1, RFM23BP
//! backup 2.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::TelemetryConfig;
use crate::decoder::FrameReader;
use crate::encoder::{encode_full_frame, encode_gps_frame, transmit, Position};
use crate::error::{Result, TelemetryError};
use crate::interface::{Dnt900, Radio, RadioKind, Rfm23bp, Shx144, Transport};
use altair_core::TelemetrySnapshot;

/// Role a radio plays in the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Carries all telemetry and commands
    Primary,
    /// First radio promoted on failure
    Backup1,
    /// Last resort
    Backup2,
}

impl Role {
    /// All roles, highest first
    pub const ALL: [Role; 3] = [Role::Primary, Role::Backup1, Role::Backup2];

    fn index(self) -> usize {
        match self {
            Role::Primary => 0,
            Role::Backup1 => 1,
            Role::Backup2 => 2,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Backup1 => write!(f, "backup1"),
            Role::Backup2 => write!(f, "backup2"),
        }
    }
}

/// Whether a radio can be used without initializing it first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioHealth {
    /// Never brought up
    #[default]
    Uninitialized,
    /// Initialized and usable
    Ready,
    /// Removed from the primary role after failures
    Demoted,
}

/// Per-radio link counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    /// Frames whose terminator was written
    pub frames_sent: u64,
    /// Failed writes, terminator or earlier
    pub send_failures: u64,
    /// Complete frames read
    pub frames_received: u64,
    /// Reads skipped because the radio was busy
    pub busy_aborts: u64,
    /// Reads that ran out of polls without a frame
    pub empty_reads: u64,
}

/// The three radios, their roles, and one frame reader per radio
pub struct TelemetrySystem {
    radios: [Radio; 3],
    readers: [FrameReader; 3],
    health: [RadioHealth; 3],
    stats: [LinkStats; 3],
    roles: [RadioKind; 3],
    failovers: u32,
}

impl TelemetrySystem {
    /// Take ownership of the radios; nothing is initialized yet
    pub fn new(
        dnt900: Dnt900,
        shx144: Shx144,
        rfm23bp: Rfm23bp,
        config: &TelemetryConfig,
    ) -> Self {
        let reader =
            || FrameReader::new(config.reader_role).with_max_read_tries(config.max_read_tries);
        Self {
            radios: [dnt900.into(), shx144.into(), rfm23bp.into()],
            readers: [reader(), reader(), reader()],
            health: [RadioHealth::Uninitialized; 3],
            stats: Default::default(),
            roles: RadioKind::ALL,
            failovers: 0,
        }
    }

    /// Bring up the primary and the enabled backups
    ///
    /// Backup 2 is only initialized when backup 1 is enabled too. Any
    /// failure is returned at once and is fatal to the link.
    pub fn initialize_all(&mut self, enable_backup1: bool, enable_backup2: bool) -> Result<()> {
        info!(enable_backup1, enable_backup2, "Initializing radios");
        self.initialize_role(Role::Primary)?;
        if enable_backup1 {
            self.initialize_role(Role::Backup1)?;
            if enable_backup2 {
                self.initialize_role(Role::Backup2)?;
            }
        }
        Ok(())
    }

    fn initialize_role(&mut self, role: Role) -> Result<()> {
        let kind = self.kind_in(role);
        debug!(%role, radio = %kind, "Initializing role");
        self.initialize_radio(kind)
    }

    fn initialize_radio(&mut self, kind: RadioKind) -> Result<()> {
        let i = kind.index();
        if let Err(e) = self.radios[i].initialize() {
            error!(
                radio = %kind,
                error = %e,
                code = e.error_code(),
                "Radio initialization failed"
            );
            return Err(e);
        }
        self.readers[i].reset();
        self.health[i] = RadioHealth::Ready;
        info!(radio = %kind, "Radio ready");
        Ok(())
    }

    /// Make backup 1 the primary radio
    pub fn promote_backup1(&mut self) -> Result<()> {
        self.promote(Role::Backup1)
    }

    /// Make backup 2 the primary radio
    pub fn promote_backup2(&mut self) -> Result<()> {
        self.promote(Role::Backup2)
    }

    fn promote(&mut self, role: Role) -> Result<()> {
        let target = self.kind_in(role);
        let previous = self.primary_kind();

        if self.health[target.index()] != RadioHealth::Ready {
            self.initialize_radio(target)?;
        }

        // The remaining radios fill the backup roles in default order, which
        // keeps RFM23BP in backup 2 unless it is primary
        let mut roles = [target; 3];
        let mut slot = 1;
        for kind in RadioKind::ALL {
            if kind != target {
                roles[slot] = kind;
                slot += 1;
            }
        }
        self.roles = roles;

        if previous != target {
            self.health[previous.index()] = RadioHealth::Demoted;
        }
        self.failovers += 1;

        warn!(
            from = %previous,
            to = %target,
            promoted = %role,
            backup1 = %self.roles[1],
            backup2 = %self.roles[2],
            "Failed over to new primary radio"
        );
        Ok(())
    }

    fn kind_in(&self, role: Role) -> RadioKind {
        self.roles[role.index()]
    }

    /// Radio currently bound to the primary role
    pub fn primary_kind(&self) -> RadioKind {
        self.kind_in(Role::Primary)
    }

    /// Radio bound to `role`
    pub fn radio_in(&self, role: Role) -> &Radio {
        &self.radios[self.kind_in(role).index()]
    }

    /// Primary radio
    pub fn primary(&self) -> &Radio {
        self.radio_in(Role::Primary)
    }

    /// Mutable primary radio
    pub fn primary_mut(&mut self) -> &mut Radio {
        let i = self.primary_kind().index();
        &mut self.radios[i]
    }

    /// Backup 1 radio
    pub fn backup1(&self) -> &Radio {
        self.radio_in(Role::Backup1)
    }

    /// Backup 2 radio
    pub fn backup2(&self) -> &Radio {
        self.radio_in(Role::Backup2)
    }

    /// A radio by identity, whatever its role
    pub fn radio(&self, kind: RadioKind) -> &Radio {
        &self.radios[kind.index()]
    }

    /// Mutable radio by identity
    pub fn radio_mut(&mut self, kind: RadioKind) -> &mut Radio {
        &mut self.radios[kind.index()]
    }

    /// Role `kind` currently plays
    pub fn role_of(&self, kind: RadioKind) -> Role {
        Role::ALL
            .into_iter()
            .find(|role| self.kind_in(*role) == kind)
            .unwrap_or(Role::Backup2)
    }

    /// Radios in role order: primary, backup 1, backup 2
    pub fn assignment(&self) -> [RadioKind; 3] {
        self.roles
    }

    /// Link counters of one radio
    pub fn stats(&self, kind: RadioKind) -> &LinkStats {
        &self.stats[kind.index()]
    }

    /// Health of one radio
    pub fn health(&self, kind: RadioKind) -> RadioHealth {
        self.health[kind.index()]
    }

    /// Frame reader of one radio
    pub fn reader(&self, kind: RadioKind) -> &FrameReader {
        &self.readers[kind.index()]
    }

    /// Number of promotions since boot
    pub fn failovers(&self) -> u32 {
        self.failovers
    }

    /// RSSI of the last frame the primary received
    pub fn primary_rssi(&mut self) -> i8 {
        self.primary_mut().last_rssi()
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        let i = self.primary_kind().index();
        let outcome = transmit(&mut self.radios[i], frame);

        let stats = &mut self.stats[i];
        stats.send_failures += u64::from(outcome.early_failures);
        match &outcome.result {
            Ok(()) => stats.frames_sent += 1,
            Err(_) => stats.send_failures += 1,
        }
        outcome.result
    }

    /// Send a GPS-only frame on the primary
    pub fn send_gps(&mut self, position: &Position) -> Result<()> {
        self.send_frame(&encode_gps_frame(position))
    }

    /// Send a full telemetry frame on the primary
    pub fn send_telemetry(&mut self, snapshot: &TelemetrySnapshot) -> Result<()> {
        self.send_frame(&encode_full_frame(snapshot))
    }

    /// Identify the station on the primary
    pub fn send_call_sign(&mut self) -> Result<()> {
        let radio = self.primary_mut();
        radio.send_call_sign()?;
        radio.send_end_message()
    }

    /// Send `frame` back on the primary as hex text, for diagnostics
    pub fn echo_frame(&mut self, frame: &[u8]) -> Result<()> {
        let radio = self.primary_mut();
        radio.send_as_text(frame)?;
        radio.send_end_message()
    }

    /// Read one inbound frame from the primary
    pub fn read_primary(&mut self) -> Result<Option<Bytes>> {
        let i = self.primary_kind().index();
        let result = self.readers[i].read_frame(&mut self.radios[i]);

        let stats = &mut self.stats[i];
        match &result {
            Ok(Some(_)) => stats.frames_received += 1,
            Ok(None) => stats.empty_reads += 1,
            Err(TelemetryError::TransportBusy { .. }) => stats.busy_aborts += 1,
            Err(_) => {}
        }
        result
    }
}

impl std::fmt::Debug for TelemetrySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySystem")
            .field("roles", &self.roles)
            .field("health", &self.health)
            .field("failovers", &self.failovers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{END_MESSAGE, RX_START_BYTE, TX_START_BYTE};
    use crate::test_utils::TestFixture;

    fn assert_permutation(roles: [RadioKind; 3]) {
        for kind in RadioKind::ALL {
            assert_eq!(roles.iter().filter(|k| **k == kind).count(), 1);
        }
    }

    #[test]
    fn test_default_assignment() {
        let fixture = TestFixture::new();
        assert_eq!(fixture.system.assignment(), RadioKind::ALL);
        assert_eq!(fixture.system.primary().kind(), RadioKind::Dnt900);
        assert_eq!(fixture.system.backup1().kind(), RadioKind::Shx144);
        assert_eq!(fixture.system.backup2().kind(), RadioKind::Rfm23bp);
        assert_eq!(
            fixture.system.health(RadioKind::Dnt900),
            RadioHealth::Uninitialized
        );
    }

    #[test]
    fn test_initialize_counts() {
        for (b1, b2, expected) in [
            (false, false, 1),
            (true, false, 2),
            (true, true, 3),
            (false, true, 1),
        ] {
            let mut fixture = TestFixture::new();
            fixture.system.initialize_all(b1, b2).unwrap();
            assert_eq!(fixture.total_inits(), expected, "backups {b1}/{b2}");
        }
    }

    #[test]
    fn test_initialize_failure_is_fatal() {
        let mut fixture = TestFixture::new();
        fixture.shx144.set_fail_init(true);

        let err = fixture.system.initialize_all(true, true).unwrap_err();
        assert!(err.is_fatal());
        // Backup 2 is never attempted after backup 1 fails
        assert_eq!(fixture.rfm23bp.init_count(), 0);
        assert_eq!(fixture.system.health(RadioKind::Dnt900), RadioHealth::Ready);
    }

    #[test]
    fn test_promote_backup1() {
        let mut fixture = TestFixture::new();
        fixture.system.initialize_all(true, true).unwrap();

        fixture.system.promote_backup1().unwrap();
        let roles = fixture.system.assignment();
        assert_permutation(roles);
        assert_eq!(
            roles,
            [RadioKind::Shx144, RadioKind::Dnt900, RadioKind::Rfm23bp]
        );
        assert_eq!(fixture.system.health(RadioKind::Dnt900), RadioHealth::Demoted);
        // Already ready, so not initialized again
        assert_eq!(fixture.shx144.init_count(), 1);
        assert_eq!(fixture.system.failovers(), 1);
    }

    #[test]
    fn test_promote_uninitialized_backup() {
        let mut fixture = TestFixture::new();
        fixture.system.initialize_all(false, false).unwrap();

        fixture.system.promote_backup2().unwrap();
        assert_eq!(fixture.rfm23bp.init_count(), 1);
        assert_eq!(
            fixture.system.assignment(),
            [RadioKind::Rfm23bp, RadioKind::Dnt900, RadioKind::Shx144]
        );
        assert_eq!(fixture.system.role_of(RadioKind::Shx144), Role::Backup2);
    }

    #[test]
    fn test_promotion_halts_on_init_failure() {
        let mut fixture = TestFixture::new();
        fixture.system.initialize_all(false, false).unwrap();
        fixture.shx144.set_fail_init(true);

        assert!(fixture.system.promote_backup1().is_err());
        assert_eq!(fixture.system.assignment(), RadioKind::ALL);
        assert_eq!(fixture.system.failovers(), 0);
    }

    #[test]
    fn test_promotions_cycle_primary() {
        let mut fixture = TestFixture::new();
        fixture.system.initialize_all(true, true).unwrap();

        fixture.system.promote_backup1().unwrap();
        assert_eq!(fixture.system.primary_kind(), RadioKind::Shx144);
        fixture.system.promote_backup2().unwrap();
        assert_eq!(fixture.system.primary_kind(), RadioKind::Rfm23bp);
        assert_permutation(fixture.system.assignment());
        fixture.system.promote_backup1().unwrap();
        assert_eq!(fixture.system.primary_kind(), RadioKind::Dnt900);
        // Demoted on the first promotion, so brought up again
        assert_eq!(fixture.dnt900.init_count(), 2);
    }

    #[test]
    fn test_send_goes_to_primary() {
        let mut fixture = TestFixture::new();
        fixture.system.initialize_all(true, true).unwrap();
        fixture.system.promote_backup1().unwrap();

        fixture
            .system
            .send_telemetry(&crate::test_utils::sample_snapshot())
            .unwrap();
        assert!(fixture.dnt900.written().is_empty());
        assert_eq!(fixture.shx144.written()[0], TX_START_BYTE);
        assert_eq!(fixture.system.stats(RadioKind::Shx144).frames_sent, 1);
    }

    #[test]
    fn test_echo_frame_as_text() {
        let mut fixture = TestFixture::new();
        fixture.system.initialize_all(false, false).unwrap();

        fixture.system.echo_frame(&[0x10, 0xAB]).unwrap();
        let mut expected = b"10AB".to_vec();
        expected.extend_from_slice(END_MESSAGE.as_bytes());
        assert_eq!(fixture.dnt900.written(), expected);
    }

    #[test]
    fn test_send_failures_counted() {
        let mut fixture = TestFixture::new();
        fixture.system.initialize_all(false, false).unwrap();
        fixture.dnt900.set_fail_writes(true);

        assert!(fixture.system.send_gps(&Position::default()).is_err());
        let stats = fixture.system.stats(RadioKind::Dnt900);
        assert_eq!(stats.frames_sent, 0);
        assert_eq!(stats.send_failures, 3);
    }

    #[test]
    fn test_read_primary_stats() {
        let mut fixture = TestFixture::new();
        fixture.system.initialize_all(true, true).unwrap();

        fixture.dnt900.queue_incoming(&[RX_START_BYTE, 0x01, 0x42]);
        let frame = fixture.system.read_primary().unwrap().unwrap();
        assert_eq!(frame.as_ref(), &[0x42]);
        assert_eq!(fixture.system.read_primary().unwrap(), None);

        fixture.dnt900.set_busy(true);
        assert!(fixture.system.read_primary().is_err());

        let stats = fixture.system.stats(RadioKind::Dnt900);
        assert_eq!(stats.frames_received, 1);
        assert_eq!(stats.empty_reads, 1);
        assert_eq!(stats.busy_aborts, 1);
    }

    #[test]
    fn test_call_sign_on_primary() {
        let mut fixture = TestFixture::new();
        fixture.system.initialize_all(false, false).unwrap();
        fixture.system.send_call_sign().unwrap();

        let written = String::from_utf8(fixture.dnt900.written()).unwrap();
        assert_eq!(written, " VE7XJA STATION ALTAIR  OVER ");
    }
}
