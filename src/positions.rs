//! Last known account positions.

use transaq_session::Positions;

/// Position snapshot merged from partial updates.
///
/// The connector sends only the sub-collections that changed, so an empty
/// collection in an update means "no news", never "now empty".
#[derive(Debug, Default)]
pub struct PositionCache {
    positions: Positions,
}

fn replace_if_present<T>(slot: &mut Vec<T>, incoming: Vec<T>) -> bool {
    if incoming.is_empty() {
        return false;
    }
    *slot = incoming;
    true
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &Positions {
        &self.positions
    }

    /// Apply an update. Returns how many sub-collections were replaced.
    pub fn merge(&mut self, update: Positions) -> usize {
        let cached = &mut self.positions;
        [
            replace_if_present(&mut cached.united_limits, update.united_limits),
            replace_if_present(&mut cached.sec_positions, update.sec_positions),
            replace_if_present(&mut cached.forts_money, update.forts_money),
            replace_if_present(&mut cached.money_position, update.money_position),
            replace_if_present(&mut cached.forts_position, update.forts_position),
            replace_if_present(&mut cached.forts_collaterals, update.forts_collaterals),
            replace_if_present(&mut cached.spot_limit, update.spot_limit),
        ]
        .into_iter()
        .filter(|replaced| *replaced)
        .count()
    }
}
