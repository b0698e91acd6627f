//! Sample records and clocks shared by the integration suites.

use chrono::{DateTime, Local, TimeZone, Utc};
use feeds_store::feeds::domain::{
    FeedsManagerId, JobType, NewFeedsManager, NewJobProposal, PublicKey,
};
use mockable::Clock;
use uuid::Uuid;

/// Raw bytes of the sample manager's public key.
pub const SAMPLE_PUBLIC_KEY: &[u8; 32] = b"11111111111111111111111111111111";

/// Returns the attributes of a typical Chainlink feeds manager.
#[must_use]
pub fn sample_manager() -> NewFeedsManager {
    NewFeedsManager {
        uri: "http://192.168.0.1".to_owned(),
        name: "Chainlink FMS".to_owned(),
        public_key: PublicKey::new(*SAMPLE_PUBLIC_KEY),
        job_types: vec![JobType::FluxMonitor, JobType::OffchainReporting],
        network: "mainnet".to_owned(),
        is_ocr_bootstrap_peer: false,
    }
}

/// Returns a pending-proposal input owned by `feeds_manager_id`.
#[must_use]
pub fn sample_proposal(feeds_manager_id: FeedsManagerId) -> NewJobProposal {
    NewJobProposal {
        remote_uuid: Uuid::new_v4(),
        spec: String::new(),
        feeds_manager_id,
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Freezes the clock at 2026-10-01T12:00:00Z.
    #[must_use]
    pub fn sample() -> Self {
        Self(
            Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0)
                .single()
                .unwrap_or_default(),
        )
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}
