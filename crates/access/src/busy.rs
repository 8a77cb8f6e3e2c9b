use tokio::sync::watch;

/// Count of in-flight dispatches, observable through a watch channel.
#[derive(Debug)]
pub struct BusyIndicator {
	count: watch::Sender<usize>,
}

impl Default for BusyIndicator {
	fn default() -> Self {
		Self::new()
	}
}

impl BusyIndicator {
	#[must_use]
	pub fn new() -> Self {
		let (count, _) = watch::channel(0);
		Self { count }
	}

	/// Increment now, decrement when the guard drops (including on error and cancellation).
	#[must_use = "the indicator is released as soon as the guard drops"]
	pub fn acquire(&self) -> BusyGuard<'_> {
		self.count.send_modify(|count| *count += 1);
		BusyGuard { indicator: self }
	}

	#[must_use]
	pub fn current(&self) -> usize {
		*self.count.borrow()
	}

	#[must_use]
	pub fn is_busy(&self) -> bool {
		self.current() > 0
	}

	pub fn subscribe(&self) -> watch::Receiver<usize> {
		self.count.subscribe()
	}
}

#[derive(Debug)]
pub struct BusyGuard<'a> {
	indicator: &'a BusyIndicator,
}

impl Drop for BusyGuard<'_> {
	fn drop(&mut self) {
		self.indicator
			.count
			.send_modify(|count| *count = count.saturating_sub(1));
	}
}
