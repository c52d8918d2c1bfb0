//! Line-based unified diff.
//!
//! Myers' O(ND) shortest edit script, grouped into hunks with a fixed amount
//! of context. The output uses the familiar `---`/`+++`/`@@` layout.
//!
//! The search is bounded by [`MAX_EDIT_DISTANCE`]. A changed region that
//! needs more edits than that is reported as one replacement of the whole
//! region, so unrelated outputs cost linear memory instead of quadratic.

/// Lines of unchanged context around each hunk.
pub const CONTEXT_LINES: usize = 3;

/// Edit distance beyond which the search gives up and replaces the region.
pub const MAX_EDIT_DISTANCE: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Equal,
    Delete,
    Insert,
}

/// A run of edits over `old[old_start..old_end]` and `new[new_start..new_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    changed: bool,
    old_start: usize,
    old_end: usize,
    new_start: usize,
    new_end: usize,
}

/// Render a unified diff of two texts, split on lines.
///
/// Returns no lines when the texts have identical lines.
#[must_use]
pub fn unified_diff(old: &str, new: &str, old_name: &str, new_name: &str) -> Vec<String> {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    let blocks = blocks(&old_lines, &new_lines);
    let hunks = group_hunks(blocks, CONTEXT_LINES);
    if hunks.is_empty() {
        return Vec::new();
    }

    let mut out = vec![format!("--- {old_name}"), format!("+++ {new_name}")];
    for hunk in hunks {
        let (Some(first), Some(last)) = (hunk.first(), hunk.last()) else {
            continue;
        };
        out.push(format!(
            "@@ -{} +{} @@",
            format_range(first.old_start, last.old_end),
            format_range(first.new_start, last.new_end)
        ));
        for block in &hunk {
            if block.changed {
                for line in &old_lines[block.old_start..block.old_end] {
                    out.push(format!("-{line}"));
                }
                for line in &new_lines[block.new_start..block.new_end] {
                    out.push(format!("+{line}"));
                }
            } else {
                for line in &old_lines[block.old_start..block.old_end] {
                    out.push(format!(" {line}"));
                }
            }
        }
    }
    out
}

/// `start,len` with 1-based start; a single line omits the length and an
/// empty range points at the line before it.
fn format_range(start: usize, end: usize) -> String {
    let len = end - start;
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{len}", start + 1),
    }
}

/// Collapse the edit script into alternating equal/changed blocks.
fn blocks(old: &[&str], new: &[&str]) -> Vec<Block> {
    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let (old_mid, new_mid) = (&old[prefix..old.len() - suffix], &new[prefix..new.len() - suffix]);
    let mut edits = vec![Edit::Equal; prefix];
    match myers(old_mid, new_mid, MAX_EDIT_DISTANCE) {
        Some(script) => edits.extend(script),
        None => {
            edits.extend(std::iter::repeat_n(Edit::Delete, old_mid.len()));
            edits.extend(std::iter::repeat_n(Edit::Insert, new_mid.len()));
        }
    }
    edits.extend(std::iter::repeat_n(Edit::Equal, suffix));

    let mut result: Vec<Block> = Vec::new();
    let (mut i, mut j) = (0, 0);
    for edit in edits {
        let changed = edit != Edit::Equal;
        match result.last_mut() {
            Some(block) if block.changed == changed => {}
            _ => result.push(Block {
                changed,
                old_start: i,
                old_end: i,
                new_start: j,
                new_end: j,
            }),
        }
        match edit {
            Edit::Equal => {
                i += 1;
                j += 1;
            }
            Edit::Delete => i += 1,
            Edit::Insert => j += 1,
        }
        if let Some(block) = result.last_mut() {
            block.old_end = i;
            block.new_end = j;
        }
    }
    result
}

/// Split blocks into hunks, keeping `context` equal lines on each side of a
/// change and starting a new hunk when a gap exceeds twice that.
fn group_hunks(mut blocks: Vec<Block>, context: usize) -> Vec<Vec<Block>> {
    if !blocks.iter().any(|b| b.changed) {
        return Vec::new();
    }

    if let Some(first) = blocks.first_mut().filter(|b| !b.changed) {
        first.old_start = first.old_start.max(first.old_end.saturating_sub(context));
        first.new_start = first.new_start.max(first.new_end.saturating_sub(context));
    }
    if let Some(last) = blocks.last_mut().filter(|b| !b.changed) {
        last.old_end = last.old_end.min(last.old_start + context);
        last.new_end = last.new_end.min(last.new_start + context);
    }

    let mut hunks = Vec::new();
    let mut current = Vec::new();
    for mut block in blocks {
        if !block.changed && block.old_end - block.old_start > context * 2 {
            current.push(Block {
                old_end: block.old_end.min(block.old_start + context),
                new_end: block.new_end.min(block.new_start + context),
                ..block
            });
            hunks.push(std::mem::take(&mut current));
            block.old_start = block.old_start.max(block.old_end - context);
            block.new_start = block.new_start.max(block.new_end - context);
        }
        current.push(block);
    }
    if !(current.len() == 1 && !current[0].changed) && !current.is_empty() {
        hunks.push(current);
    }
    hunks.retain(|hunk| hunk.iter().any(|b| b.changed));
    hunks
}

/// Shortest edit script from `a` to `b`, or `None` when it needs more than
/// `max_distance` edits.
///
/// Each round `d` only touches diagonals `-d..=d`, so the trace keeps just
/// that band and memory stays `O(min(D, max_distance)^2)`.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn myers(a: &[&str], b: &[&str], max_distance: usize) -> Option<Vec<Edit>> {
    let n = a.len();
    let m = b.len();
    if n == 0 {
        return Some(vec![Edit::Insert; m]);
    }
    if m == 0 {
        return Some(vec![Edit::Delete; n]);
    }

    let limit = (n + m).min(max_distance) as isize;
    let offset = limit + 1;
    let mut v = vec![0usize; (2 * limit + 3) as usize];
    let mut trace: Vec<Vec<usize>> = Vec::new();
    let mut reached = false;

    'search: for d in 0..=limit {
        trace.push(v[(offset - d - 1) as usize..=(offset + d + 1) as usize].to_vec());
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = (x as isize - k) as usize;
            while x < n && y < m && a[x] == b[y] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                reached = true;
                break 'search;
            }
            k += 2;
        }
    }
    if !reached {
        return None;
    }

    let mut edits = Vec::with_capacity(n + m);
    let (mut x, mut y) = (n as isize, m as isize);
    for (d, band) in trace.iter().enumerate().rev() {
        let d = d as isize;
        // band[0] holds diagonal -d-1
        let at = |k: isize| band[(k + d + 1) as usize];
        let k = x - y;
        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k) as isize;
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            edits.push(Edit::Equal);
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            edits.push(if x == prev_x { Edit::Insert } else { Edit::Delete });
        }
        x = prev_x;
        y = prev_y;
    }
    edits.reverse();
    Some(edits)
}
