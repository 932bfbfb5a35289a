use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Channel – one axis of the CIELAB measurement
// ---------------------------------------------------------------------------

/// One of the three measured colour channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Channel {
    L,
    A,
    B,
}

impl Channel {
    /// All channels in display order.
    pub const ALL: [Channel; 3] = [Channel::L, Channel::A, Channel::B];

    /// Column / axis label as it appears in measurement sheets.
    pub fn label(self) -> &'static str {
        match self {
            Channel::L => "L*",
            Channel::A => "a*",
            Channel::B => "b*",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the measurement sheet
// ---------------------------------------------------------------------------

/// A single measured sample (one fabric roll / reel).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Dense 1-based position in the source file, assigned by the loader.
    pub sequence_id: usize,
    /// Roll number or other identifying text. Opaque to the grouping engine.
    pub label: String,
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Record {
    pub fn new(sequence_id: usize, label: impl Into<String>, l: f64, a: f64, b: f64) -> Self {
        Record {
            sequence_id,
            label: label.into(),
            l,
            a,
            b,
        }
    }

    /// Value of the given channel.
    pub fn channel(&self, channel: Channel) -> f64 {
        match channel {
            Channel::L => self.l,
            Channel::A => self.a,
            Channel::B => self.b,
        }
    }
}

// ---------------------------------------------------------------------------
// Bounds – running [min, max] per channel
// ---------------------------------------------------------------------------

/// Closed interval observed on one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelBounds {
    pub min: f64,
    pub max: f64,
}

impl ChannelBounds {
    /// Degenerate interval containing a single value.
    pub fn point(value: f64) -> Self {
        ChannelBounds {
            min: value,
            max: value,
        }
    }

    /// The interval widened just enough to contain `value`.
    pub fn widened(self, value: f64) -> Self {
        ChannelBounds {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }

    pub fn range(self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Bounding box of a group in L*a*b* space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub l: ChannelBounds,
    pub a: ChannelBounds,
    pub b: ChannelBounds,
}

impl Bounds {
    /// Bounds of a group holding only `record`.
    pub fn of(record: &Record) -> Self {
        Bounds {
            l: ChannelBounds::point(record.l),
            a: ChannelBounds::point(record.a),
            b: ChannelBounds::point(record.b),
        }
    }

    /// Hypothetical bounds after adding `record`.
    pub fn widened(&self, record: &Record) -> Self {
        Bounds {
            l: self.l.widened(record.l),
            a: self.a.widened(record.a),
            b: self.b.widened(record.b),
        }
    }

    pub fn get(&self, channel: Channel) -> ChannelBounds {
        match channel {
            Channel::L => self.l,
            Channel::A => self.a,
            Channel::B => self.b,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary – derived statistics, computed once per finished group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl From<ChannelBounds> for ChannelSummary {
    fn from(bounds: ChannelBounds) -> Self {
        ChannelSummary {
            min: bounds.min,
            max: bounds.max,
            range: bounds.range(),
        }
    }
}

impl fmt::Display for ChannelSummary {
    /// `"<min> - <max> (<range>)"`, the layout used in the results table and
    /// the exported summary sheet.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({:.2})", self.min, self.max, self.range)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupSummary {
    #[serde(rename = "L")]
    pub l: ChannelSummary,
    pub a: ChannelSummary,
    pub b: ChannelSummary,
}

impl GroupSummary {
    pub fn get(&self, channel: Channel) -> ChannelSummary {
        match channel {
            Channel::L => self.l,
            Channel::A => self.a,
            Channel::B => self.b,
        }
    }
}

impl From<&Bounds> for GroupSummary {
    fn from(bounds: &Bounds) -> Self {
        GroupSummary {
            l: bounds.l.into(),
            a: bounds.a.into(),
            b: bounds.b.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Group – one shade lot
// ---------------------------------------------------------------------------

/// A finished group produced by [`crate::data::grouping::group`].
///
/// Fields are private: a group is immutable once the grouping pass returns,
/// and `summary` is always the one derived from `bounds` at that moment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    #[serde(rename = "groupId")]
    group_id: usize,
    #[serde(rename = "colors")]
    members: Vec<Record>,
    #[serde(skip)]
    bounds: Bounds,
    summary: GroupSummary,
}

impl Group {
    /// Seal a group. Only the grouping engine builds groups.
    pub(crate) fn finalize(group_id: usize, members: Vec<Record>, bounds: Bounds) -> Self {
        debug_assert!(!members.is_empty(), "group {group_id} has no members");
        let summary = GroupSummary::from(&bounds);
        Group {
            group_id,
            members,
            bounds,
            summary,
        }
    }

    /// 1-based id in order of creation.
    pub fn id(&self) -> usize {
        self.group_id
    }

    /// Members in the order they were assigned.
    pub fn members(&self) -> &[Record] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn summary(&self) -> &GroupSummary {
        &self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widened_bounds_cover_new_value() {
        let b = ChannelBounds::point(1.0).widened(0.5).widened(1.25);
        assert_eq!(b.min, 0.5);
        assert_eq!(b.max, 1.25);
        assert_eq!(b.range(), 0.75);
    }

    #[test]
    fn bounds_of_record_have_zero_range() {
        let r = Record::new(1, "R1", 50.0, -3.0, 12.5);
        let bounds = Bounds::of(&r);
        for c in Channel::ALL {
            assert_eq!(bounds.get(c).range(), 0.0);
            assert_eq!(bounds.get(c).min, r.channel(c));
        }
    }

    #[test]
    fn summary_mirrors_bounds() {
        let r1 = Record::new(1, "R1", 50.0, 1.0, 2.0);
        let r2 = Record::new(2, "R2", 50.5, 0.75, 2.25);
        let bounds = Bounds::of(&r1).widened(&r2);
        let summary = GroupSummary::from(&bounds);
        assert_eq!(summary.l.min, 50.0);
        assert_eq!(summary.l.max, 50.5);
        assert_eq!(summary.l.range, 0.5);
        assert_eq!(summary.a.range, 0.25);
        assert_eq!(summary.b.range, 0.25);
    }

    #[test]
    fn channel_summary_display() {
        let s = ChannelSummary {
            min: 50.0,
            max: 50.1,
            range: 0.1,
        };
        assert_eq!(s.to_string(), "50 - 50.1 (0.10)");
    }

    #[test]
    fn channel_labels() {
        let labels: Vec<&str> = Channel::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(labels, ["L*", "a*", "b*"]);
    }
}
