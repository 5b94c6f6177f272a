//! Flood protection for anonymous endpoints (self-registration)
//!
//! A GCRA limiter keyed by client address. Every attempt counts, accepted or not.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DashMapStateStore;
use governor::{Quota, RateLimiter};

use crate::prelude::*;

type KeyedLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>;

/// Attempts allowed in one burst
pub const FLOOD_BURST: u32 = 5;

/// Time for one attempt to replenish
pub const FLOOD_PERIOD: Duration = Duration::from_secs(120);

pub struct FloodProtection {
	enabled: bool,
	limiter: KeyedLimiter,
}

impl FloodProtection {
	pub fn new(enabled: bool) -> Self {
		Self::with_quota(enabled, FLOOD_PERIOD, FLOOD_BURST)
	}

	pub fn with_quota(enabled: bool, period: Duration, burst: u32) -> Self {
		const ONE: NonZeroU32 = match NonZeroU32::new(1) {
			Some(v) => v,
			None => unreachable!(),
		};
		let quota = Quota::with_period(period)
			.unwrap_or_else(|| Quota::per_second(ONE))
			.allow_burst(NonZeroU32::new(burst).unwrap_or(ONE));
		Self { enabled, limiter: RateLimiter::keyed(quota) }
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Count one attempt from `addr`, failing with `Error::RateLimited` once the quota is spent
	pub fn check(&self, addr: IpAddr) -> ClResult<()> {
		if !self.enabled {
			return Ok(());
		}
		self.limiter.check_key(&addr).map_err(|_| {
			warn!("Flood protection triggered for {}", addr);
			Error::RateLimited
		})
	}
}

impl std::fmt::Debug for FloodProtection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FloodProtection").field("enabled", &self.enabled).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::Ipv4Addr;

	#[test]
	fn test_burst_then_limited() {
		let flood = FloodProtection::with_quota(true, Duration::from_secs(3600), 2);
		let addr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
		assert!(flood.check(addr).is_ok());
		assert!(flood.check(addr).is_ok());
		assert!(matches!(flood.check(addr), Err(Error::RateLimited)));

		// other clients have their own budget
		assert!(flood.check(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))).is_ok());
	}

	#[test]
	fn test_disabled_never_limits() {
		let flood = FloodProtection::with_quota(false, Duration::from_secs(3600), 1);
		let addr = IpAddr::V4(Ipv4Addr::LOCALHOST);
		for _ in 0..10 {
			assert!(flood.check(addr).is_ok());
		}
	}
}

// vim: ts=4
