//! Cutting the last visible line when a paragraph has more content than
//! lines.

use std::ops::Range;

use umbra_core::text::LineBreakMode;

use crate::Shaped;
use crate::breaker::EPSILON;

/// Where an ellipsizing cut may fall.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Granularity {
    #[default]
    Grapheme,
    /// Cut between words; falls back to graphemes when not even one word
    /// fits.
    Word,
}

/// How ellipsizing line-break modes cut text.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TruncationPolicy {
    pub granularity: Granularity,
    pub ellipsis: String,
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self {
            granularity: Granularity::Grapheme,
            ellipsis: "\u{2026}".to_string(),
        }
    }
}

/// One visible item of a laid-out line.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Cluster(usize),
    /// Inserted ellipsis, styled like `run`.
    Ellipsis { run: usize, advance: f32 },
}

/// Items of the last visible line. `content` is every cluster from the
/// line's start to the end of the paragraph. `ellipsis` measures the
/// ellipsis string in a run's font.
pub(crate) fn truncate_last_line(
    shaped: &Shaped,
    content: Range<usize>,
    mode: LineBreakMode,
    policy: &TruncationPolicy,
    max_width: Option<f32>,
    ellipsis: &dyn Fn(usize) -> f32,
) -> Vec<Item> {
    let first_line: Vec<usize> = content
        .clone()
        .take_while(|&i| !shaped.clusters[i].newline)
        .collect();
    let visible: Vec<usize> = content
        .filter(|&i| !shaped.clusters[i].newline)
        .collect();
    let width = max_width.unwrap_or(f32::INFINITY);
    let word = policy.granularity == Granularity::Word;

    match mode {
        LineBreakMode::Clipping => {
            let mut x = 0.0;
            first_line
                .into_iter()
                .take_while(|&i| {
                    let starts_inside = x < width - EPSILON;
                    x += shaped.clusters[i].advance;
                    starts_inside
                })
                .map(Item::Cluster)
                .collect()
        }
        LineBreakMode::WordWrapping => {
            let n = fit_prefix(shaped, &first_line, width, true);
            trim_end(shaped, &first_line[..n]).iter().copied().map(Item::Cluster).collect()
        }
        LineBreakMode::CharWrapping => {
            let n = fit_prefix(shaped, &first_line, width, false);
            first_line[..n].iter().copied().map(Item::Cluster).collect()
        }
        LineBreakMode::TruncatingTail => {
            let run = first_line.first().map_or(0, |&i| shaped.clusters[i].run);
            let e = ellipsis(run);
            let n = fit_prefix(shaped, &first_line, width - e, word);
            let prefix = trim_end(shaped, &first_line[..n]);
            let run = prefix.last().map_or(run, |&i| shaped.clusters[i].run);
            let mut items: Vec<Item> = prefix.iter().copied().map(Item::Cluster).collect();
            items.push(Item::Ellipsis {
                run,
                advance: ellipsis(run),
            });
            items
        }
        LineBreakMode::TruncatingHead => {
            let run = visible.last().map_or(0, |&i| shaped.clusters[i].run);
            let e = ellipsis(run);
            let n = fit_suffix(shaped, &visible, width - e, word);
            let suffix = trim_start(shaped, &visible[visible.len() - n..]);
            let run = suffix.first().map_or(run, |&i| shaped.clusters[i].run);
            let mut items = vec![Item::Ellipsis {
                run,
                advance: ellipsis(run),
            }];
            items.extend(suffix.iter().copied().map(Item::Cluster));
            items
        }
        LineBreakMode::TruncatingMiddle => {
            let run = visible.first().map_or(0, |&i| shaped.clusters[i].run);
            let e = ellipsis(run);
            let budget = width - e;
            let n = fit_prefix(shaped, &visible, budget / 2.0, word);
            let prefix = trim_end(shaped, &visible[..n]);
            let used = widths(shaped, prefix);
            let rest = &visible[n..];
            let m = fit_suffix(shaped, rest, budget - used, word);
            let suffix = trim_start(shaped, &rest[rest.len() - m..]);
            let mut items: Vec<Item> = prefix.iter().copied().map(Item::Cluster).collect();
            items.push(Item::Ellipsis { run, advance: e });
            items.extend(suffix.iter().copied().map(Item::Cluster));
            items
        }
    }
}

fn widths(shaped: &Shaped, clusters: &[usize]) -> f32 {
    clusters.iter().map(|&i| shaped.clusters[i].advance).sum()
}

/// Longest prefix of `clusters` no wider than `budget`; with `word`, it
/// ends at a word boundary unless no whole word fits.
fn fit_prefix(shaped: &Shaped, clusters: &[usize], budget: f32, word: bool) -> usize {
    let mut x = 0.0;
    let mut n = 0;
    for &i in clusters {
        x += shaped.clusters[i].advance;
        if x > budget + EPSILON {
            break;
        }
        n += 1;
    }
    if word && n < clusters.len() {
        let at_boundary = (1..=n)
            .rev()
            .find(|&k| shaped.is_word_boundary(clusters[k - 1] + 1));
        if let Some(k) = at_boundary {
            return k;
        }
    }
    n
}

fn fit_suffix(shaped: &Shaped, clusters: &[usize], budget: f32, word: bool) -> usize {
    let mut x = 0.0;
    let mut n = 0;
    for &i in clusters.iter().rev() {
        x += shaped.clusters[i].advance;
        if x > budget + EPSILON {
            break;
        }
        n += 1;
    }
    if word && n < clusters.len() {
        let len = clusters.len();
        let at_boundary = (1..=n)
            .rev()
            .find(|&k| shaped.is_word_boundary(clusters[len - k]));
        if let Some(k) = at_boundary {
            return k;
        }
    }
    n
}

fn trim_end<'a>(shaped: &Shaped, clusters: &'a [usize]) -> &'a [usize] {
    let n = clusters
        .iter()
        .rposition(|&i| !shaped.clusters[i].whitespace)
        .map_or(0, |p| p + 1);
    &clusters[..n]
}

fn trim_start<'a>(shaped: &Shaped, clusters: &'a [usize]) -> &'a [usize] {
    let n = clusters
        .iter()
        .position(|&i| !shaped.clusters[i].whitespace)
        .unwrap_or(clusters.len());
    &clusters[n..]
}
