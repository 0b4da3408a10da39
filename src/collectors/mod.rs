//! External measurement collaborators
//!
//! Bandwidth and ISP identity come from third-party services. Each collaborator
//! gets exactly one attempt per cycle with a bounded timeout; a failure leaves
//! the corresponding Sample fields absent and the cycle is still recorded.

mod bandwidth;
mod isp;

pub use bandwidth::{BandwidthTester, SpeedtestCliTester};
pub use isp::{IpinfoLookup, IspLookup};
