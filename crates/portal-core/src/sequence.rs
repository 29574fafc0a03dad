//! Order-id sequencing.
//!
//! Order ids are customer-visible and must be strictly increasing. The
//! allocator serializes allocation behind a mutex and seeds itself from the
//! highest id already persisted, so ids stay monotonic even when several
//! requests complete concurrently.

use tokio::sync::Mutex;

/// The first order id ever assigned.
pub const FIRST_ORDER_ID: u64 = 200;

/// In-process allocator for sequential order ids.
///
/// The caller supplies the stored maximum on every allocation; it is only
/// consulted the first time, after which the cached last id wins. The
/// counter never moves backwards.
pub struct OrderIdAllocator {
	last: Mutex<Option<u64>>,
}

impl OrderIdAllocator {
	pub fn new() -> Self {
		Self {
			last: Mutex::new(None),
		}
	}

	/// Allocates the next order id.
	pub async fn allocate(&self, stored_max: Option<u64>) -> u64 {
		let mut last = self.last.lock().await;
		let next = match *last {
			Some(prev) => prev + 1,
			None => match stored_max {
				Some(max) => max.max(FIRST_ORDER_ID - 1) + 1,
				None => FIRST_ORDER_ID,
			},
		};
		*last = Some(next);
		next
	}
}

impl Default for OrderIdAllocator {
	fn default() -> Self {
		Self::new()
	}
}
