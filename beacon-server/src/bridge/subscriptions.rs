use dashmap::DashMap;

use beacon_core::RoomId;

/// Per-process subscription refcounts. The backing channel is subscribed
/// on the 0 -> 1 transition and unsubscribed on 1 -> 0.
#[derive(Default)]
pub(crate) struct SubscriptionTable {
    rooms: DashMap<RoomId, usize>,
}

impl SubscriptionTable {
    /// True when this acquire took the count from zero.
    pub fn acquire(&self, room: &RoomId) -> bool {
        let mut count = self.rooms.entry(room.clone()).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// True when this release dropped the count to zero.
    pub fn release(&self, room: &RoomId) -> bool {
        let emptied = match self.rooms.get_mut(room) {
            Some(mut count) => {
                *count = count.saturating_sub(1);
                *count == 0
            }
            None => false,
        };
        if emptied {
            self.rooms.remove_if(room, |_, count| *count == 0);
        }
        emptied
    }
}
