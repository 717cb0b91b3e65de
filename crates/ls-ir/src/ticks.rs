//! Conversion between delta-time and absolute-tick positions.

use crate::error::ModelError;
use crate::event::Tick;

/// Largest delta time a standard MIDI file can encode (28-bit VLQ).
pub const MAX_DELTA: u32 = 0x0FFF_FFFF;

/// Turn a sequence of delta times into running absolute ticks.
///
/// `tick(e) = tick(previous) + delta(e)`, starting at zero.
pub fn absolute_ticks<I>(deltas: I) -> impl Iterator<Item = Tick>
where
    I: IntoIterator<Item = u32>,
{
    deltas.into_iter().scan(0u64, |tick, delta| {
        *tick += delta as Tick;
        Some(*tick)
    })
}

/// Delta time from `prev` to `tick`.
///
/// Fails if the stream would go backwards or the gap does not fit in a
/// 28-bit delta.
pub fn delta_between(prev: Tick, tick: Tick) -> Result<u32, ModelError> {
    let delta = tick
        .checked_sub(prev)
        .ok_or(ModelError::TickOrder { prev, tick })?;
    if delta > MAX_DELTA as Tick {
        return Err(ModelError::DeltaOverflow { tick, delta });
    }
    Ok(delta as u32)
}
