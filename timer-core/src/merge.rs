use crate::error::{Result, TimerError};
use crate::interval::TimeInterval;

/// Merge a multiset of daily intervals into the minimal sorted tuple of
/// non-overlapping, non-touching intervals covering the same cyclic union.
///
/// Fails with [`TimerError::AlwaysOn`] if the union would cover the full
/// 24-hour circle (§4.2). Brute-force four-candidate approach: when two
/// intervals overlap there's no cheap closed form across the midnight wrap,
/// so every combination of their endpoints is tried and the longest kept.
pub fn merge(intervals: &[TimeInterval]) -> Result<Vec<TimeInterval>> {
  if intervals.is_empty() {
    return Ok(Vec::new());
  }

  let mut sorted = intervals.to_vec();
  sorted.sort_by_key(|i| i.start);

  let mut output: Vec<TimeInterval> = vec![sorted[0]];

  for item in &sorted[1..] {
    let last = *output.last().unwrap();

    let overlaps = (item.start < last.end && !last.spans_midnight())
      || (item.start > last.end && last.spans_midnight());

    let mut start = item.start;
    let mut end = item.end;

    if overlaps {
      let superset = TimeInterval::new(item.start, item.end)?;
      let earlier = TimeInterval::new(item.start, last.end)?;
      let later = TimeInterval::new(last.start, item.end)?;
      let subset = TimeInterval::new(last.start, last.end)?;

      let longest = [superset, earlier, later, subset]
        .into_iter()
        .max_by_key(|candidate| candidate.duration())
        .unwrap();

      let gap = TimeInterval::new(longest.end, longest.start)?;
      if item.intersects(&gap) || last.intersects(&gap) {
        return Err(TimerError::AlwaysOn);
      }

      start = longest.start;
      end = longest.end;
      output.pop();
    }

    if item.spans_midnight() {
      while let Some(front) = output.first().copied() {
        if item.end < front.start {
          break;
        }
        end = std::cmp::max(item.end, front.end);
        output.remove(0);
      }
    }

    // The midnight-swallow step has no gap check of its own: if it ends up
    // eating its way all the way back round to its own start, that is full
    // 24h coverage, not a zero-length interval.
    if start == end {
      return Err(TimerError::AlwaysOn);
    }
    output.push(TimeInterval::new(start, end)?);
  }

  Ok(output)
}
