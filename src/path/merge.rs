// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Splicing two open paths that share an endpoint

use super::{Path, PathFlags};
use crate::host::RenderHandle;
use crate::model::ElementId;

/// Where two paths touch, named from the point of view of `self`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    /// Last element of `self` is the first of `other`
    EndStart,
    /// First element of `self` is the last of `other`
    StartEnd,
    /// Both paths start at the same element
    StartStart,
    /// Both paths end at the same element
    EndEnd,
}

/// Forward fills and batches of a path, without its closing slot
struct Segments {
    controls: Vec<ElementId>,
    fills: Vec<Vec<ElementId>>,
    batches: Vec<Option<RenderHandle>>,
}

impl Segments {
    fn take(path: &mut Path) -> Self {
        let mut fills = std::mem::take(&mut path.fill_elements);
        let mut batches = std::mem::take(&mut path.fill_batches);
        fills.pop();
        if let Some(handle) = batches.pop().flatten() {
            path.stale.push(handle);
        }
        Self {
            controls: std::mem::take(&mut path.control_elements),
            fills,
            batches,
        }
    }

    fn reversed(mut self) -> Self {
        self.controls.reverse();
        self.fills.reverse();
        self.batches.reverse();
        for fill in &mut self.fills {
            fill.reverse();
        }
        self
    }

    /// Append `tail`, dropping its first control element (the shared one)
    fn extend_with(&mut self, tail: Segments) {
        self.controls.extend(tail.controls.into_iter().skip(1));
        self.fills.extend(tail.fills);
        self.batches.extend(tail.batches);
    }
}

impl Path {
    /// How `other` can be spliced onto `self`, if at all
    ///
    /// Checks End/Start, Start/End, Start/Start and End/End in that order;
    /// the first match wins. Paths on different islands never match.
    pub fn junction_with(&self, other: &Path) -> Option<Junction> {
        if self.island_index != other.island_index || self.object != other.object {
            return None;
        }
        let (first, last) = (self.first()?, self.last()?);
        let (other_first, other_last) = (other.first()?, other.last()?);

        if last == other_first {
            Some(Junction::EndStart)
        } else if first == other_last {
            Some(Junction::StartEnd)
        } else if first == other_first {
            Some(Junction::StartStart)
        } else if last == other_last {
            Some(Junction::EndEnd)
        } else {
            None
        }
    }

    /// Splice `other` onto `self` at their shared endpoint
    ///
    /// The shared element appears once in the result. For Start/Start and
    /// End/End, `other` is walked backwards so the merged fills run in one
    /// direction. The result is open, keeps the flags of `self`, and has no
    /// control batch; closing batches of both inputs are parked as stale.
    /// Both paths are handed back untouched when they do not meet.
    pub fn merge(self, other: Path) -> Result<Path, (Path, Path)> {
        let Some(junction) = self.junction_with(&other) else {
            return Err((self, other));
        };
        Ok(self.splice(other, junction))
    }

    fn splice(mut self, mut other: Path, junction: Junction) -> Path {
        let mut stale = std::mem::take(&mut self.stale);
        stale.append(&mut other.stale);
        stale.extend(self.control_batch.take());
        stale.extend(other.control_batch.take());

        let ours = Segments::take(&mut self);
        let theirs = Segments::take(&mut other);
        stale.append(&mut self.stale);
        stale.append(&mut other.stale);

        let mut merged = match junction {
            Junction::EndStart => {
                let mut head = ours;
                head.extend_with(theirs);
                head
            }
            Junction::StartEnd => {
                let mut head = theirs;
                head.extend_with(ours);
                head
            }
            Junction::StartStart => {
                let mut head = theirs.reversed();
                head.extend_with(ours);
                head
            }
            Junction::EndEnd => {
                let mut head = ours;
                head.extend_with(theirs.reversed());
                head
            }
        };

        merged.fills.push(Vec::new());
        merged.batches.push(None);

        let mut flags = self.flags;
        flags.remove(PathFlags::CLOSED);

        Path {
            object: self.object,
            island_index: self.island_index,
            flags,
            control_elements: merged.controls,
            fill_elements: merged.fills,
            fill_batches: merged.batches,
            control_batch: None,
            stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectId;

    fn v(index: u32) -> ElementId {
        ElementId::vertex(ObjectId(0), index)
    }

    fn e(index: u32) -> ElementId {
        ElementId::edge(ObjectId(0), index)
    }

    /// Open path over `indices` with fill `i` holding edge `100 * a + b`
    fn path_of(indices: &[u32]) -> Path {
        let mut path = Path::new(v(indices[0]), 0, PathFlags::empty());
        for (i, &index) in indices.iter().enumerate().skip(1) {
            path.insert_control_element(i, v(index));
        }
        for (slot, pair) in indices.windows(2).enumerate() {
            path.set_fill(slot, vec![e(100 * pair[0] + pair[1])], None);
        }
        path
    }

    fn controls(path: &Path) -> Vec<u32> {
        path.control_elements().iter().map(|e| e.index).collect()
    }

    #[test]
    fn end_start() {
        let merged = path_of(&[1, 2]).merge(path_of(&[2, 3])).unwrap();
        assert_eq!(controls(&merged), vec![1, 2, 3]);
        assert_eq!(
            merged.fill_elements(),
            &[vec![e(102)], vec![e(203)], vec![]]
        );
    }

    #[test]
    fn start_end() {
        let merged = path_of(&[3, 4]).merge(path_of(&[1, 2, 3])).unwrap();
        assert_eq!(controls(&merged), vec![1, 2, 3, 4]);
        assert_eq!(merged.fill_elements().len(), 4);
        assert_eq!(merged.fill(2), Some(&[e(304)][..]));
    }

    #[test]
    fn start_start_reverses_other() {
        let merged = path_of(&[1, 2]).merge(path_of(&[1, 5, 6])).unwrap();
        assert_eq!(controls(&merged), vec![6, 5, 1, 2]);
        assert_eq!(
            merged.fill_elements(),
            &[vec![e(506)], vec![e(105)], vec![e(102)], vec![]]
        );
    }

    #[test]
    fn end_end_reverses_other() {
        let merged = path_of(&[1, 2]).merge(path_of(&[7, 2])).unwrap();
        assert_eq!(controls(&merged), vec![1, 2, 7]);
        assert_eq!(
            merged.fill_elements(),
            &[vec![e(102)], vec![e(702)], vec![]]
        );
    }

    #[test]
    fn first_match_wins() {
        // [1, 2] and [2, 1] touch End/Start and Start/End; End/Start is checked first
        let a = path_of(&[1, 2]);
        let b = path_of(&[2, 1]);
        assert_eq!(a.junction_with(&b), Some(Junction::EndStart));
        let merged = a.merge(b).unwrap();
        assert_eq!(controls(&merged), vec![1, 2, 1]);
    }

    #[test]
    fn different_islands_do_not_merge() {
        let a = path_of(&[1, 2]);
        let mut b = Path::new(v(2), 1, PathFlags::empty());
        b.insert_control_element(1, v(3));
        assert!(a.junction_with(&b).is_none());
        let (a, b) = a.merge(b).unwrap_err();
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn merged_path_is_open_and_keeps_own_flags() {
        let mut a = path_of(&[1, 2]);
        a.set_flag(PathFlags::TOPOLOGY, true);
        let merged = a.merge(path_of(&[2, 3])).unwrap();
        assert!(!merged.is_closed());
        assert!(merged.uses_topology_distance());
    }
}
