use thiserror::Error;

use super::model::{Bounds, Channel, Group, Record};
use super::tolerance::{ToleranceSet, ValidationError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GroupingError {
    #[error("invalid tolerances: {0}")]
    Validation(#[from] ValidationError),

    /// Ingestion is supposed to reject these rows; seeing one here is a
    /// precondition violation, reported instead of coerced.
    #[error("record {sequence_id}: {channel} value {value} is not a finite number")]
    NonFiniteChannel {
        sequence_id: usize,
        channel: Channel,
        value: f64,
    },
}

// ---------------------------------------------------------------------------
// Accumulator – a group that is still growing
// ---------------------------------------------------------------------------

struct Accumulator {
    group_id: usize,
    members: Vec<Record>,
    bounds: Bounds,
}

impl Accumulator {
    fn seed(group_id: usize, record: &Record) -> Self {
        Accumulator {
            group_id,
            members: vec![record.clone()],
            bounds: Bounds::of(record),
        }
    }

    /// Bounds after adding `record`, if they stay within `tolerances` on
    /// every channel. Boundary equality fits.
    fn fitted(&self, record: &Record, tolerances: &ToleranceSet) -> Option<Bounds> {
        let widened = self.bounds.widened(record);
        Channel::ALL
            .iter()
            .all(|&c| widened.get(c).range() <= tolerances.get(c))
            .then_some(widened)
    }

    fn absorb(&mut self, record: &Record, bounds: Bounds) {
        self.members.push(record.clone());
        self.bounds = bounds;
    }

    fn finalize(self) -> Group {
        Group::finalize(self.group_id, self.members, self.bounds)
    }
}

fn ensure_finite(record: &Record) -> Result<(), GroupingError> {
    match Channel::ALL
        .into_iter()
        .find(|&c| !record.channel(c).is_finite())
    {
        Some(channel) => Err(GroupingError::NonFiniteChannel {
            sequence_id: record.sequence_id,
            channel,
            value: record.channel(channel),
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Partition `records` into shade groups, greedy first-fit.
///
/// Records are visited in input order. Each one joins the *first* existing
/// group (by id) whose bounding box, widened to include it, still spans no
/// more than the tolerance on all three channels; a later group that would
/// fit more tightly is never considered. A record that fits nowhere opens a
/// new group. The result therefore depends on input order.
///
/// Either every record is placed or an error is returned; there is no
/// partial result.
pub fn group(records: &[Record], tolerances: &ToleranceSet) -> Result<Vec<Group>, GroupingError> {
    tolerances.validate()?;

    let accumulators = records
        .iter()
        .try_fold(Vec::<Accumulator>::new(), |mut groups, record| {
            ensure_finite(record)?;
            let fit = groups
                .iter_mut()
                .find_map(|g| g.fitted(record, tolerances).map(|bounds| (g, bounds)));
            match fit {
                Some((target, bounds)) => target.absorb(record, bounds),
                None => {
                    let id = groups.len() + 1;
                    groups.push(Accumulator::seed(id, record));
                }
            }
            Ok::<_, GroupingError>(groups)
        })?;

    let groups: Vec<Group> = accumulators.into_iter().map(Accumulator::finalize).collect();
    log::debug!(
        "Grouped {} records into {} groups (ΔL*={}, Δa*={}, Δb*={})",
        records.len(),
        groups.len(),
        tolerances.delta_l(),
        tolerances.delta_a(),
        tolerances.delta_b()
    );
    Ok(groups)
}
