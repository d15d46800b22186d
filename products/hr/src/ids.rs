use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// Issues employee ids that look like millisecond timestamps but never repeat.
///
/// Each id is the largest of: the current time in milliseconds, the previous
/// id from this generator plus one, and the largest id already stored plus
/// one. Two creations in the same millisecond therefore still get distinct
/// ids, and ids written by an older process are never reused.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self, existing_max: Option<u64>) -> u64 {
        self.next_id_at(now_millis(), existing_max)
    }

    fn next_id_at(&self, now: u64, existing_max: Option<u64>) -> u64 {
        let floor = existing_max.map_or(0, |id| id.saturating_add(1));
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let candidate = now.max(last.saturating_add(1)).max(floor);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
