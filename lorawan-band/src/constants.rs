//! Defaults shared by most regional parameter sets.

use std::time::Duration;

pub(crate) const RECEIVE_DELAY_1: Duration = Duration::from_secs(1);
pub(crate) const RECEIVE_DELAY_2: Duration = Duration::from_secs(2); // must be RECEIVE_DELAY_1 + 1 s
pub(crate) const JOIN_ACCEPT_DELAY_1: Duration = Duration::from_secs(5);
pub(crate) const JOIN_ACCEPT_DELAY_2: Duration = Duration::from_secs(6);
pub(crate) const MAX_FCNT_GAP: u32 = 16384;
pub(crate) const ADR_ACK_LIMIT: u16 = 64;
pub(crate) const ADR_ACK_DELAY: u16 = 32;
pub(crate) const ACK_TIMEOUT: Duration = Duration::from_secs(2);
pub(crate) const ACK_TIMEOUT_MARGIN: Duration = Duration::from_secs(1); // random delay between 1 and 3 seconds

pub(crate) const BEACON_CODING_RATE: &str = "4/5";
pub(crate) const BEACON_PERIOD: Duration = Duration::from_secs(128);
