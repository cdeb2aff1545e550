//! Paragraph measurement.
//!
//! A paragraph's span tree is flattened into an [`AttributedString`], split
//! into grapheme clusters measured by a [`FontMetrics`] implementation, and
//! broken into lines. [`ParagraphMeasurer`] applies the paragraph's line
//! limit, shrinks the font when `adjustsFontSizeToFit` asks for it, and
//! truncates what still does not fit according to the line-break mode and
//! the surface's [`TruncationPolicy`].
//!
//! ```rust
//! use umbra_core::text::{ParagraphProps, TextAttributes};
//! use umbra_text::{AttributedString, ParagraphConstraints, ParagraphMeasurer};
//!
//! let mut text = AttributedString::default();
//! text.push_text("hello world", TextAttributes::default(), 1);
//!
//! let layout = ParagraphMeasurer::default().measure(
//!     &text,
//!     &ParagraphProps::default(),
//!     &ParagraphConstraints { max_width: Some(50.0), ..Default::default() },
//! );
//! assert_eq!(layout.state.lines.len(), 2);
//! ```

mod attributed;
mod breaker;
mod metrics;
mod paragraph;
mod truncate;

pub use attributed::{ATTACHMENT_CHAR, AttributedString, RunKind, TextRun};
pub use breaker::{Cluster, Line, Shaped, break_lines};
pub use metrics::{ApproximateFontMetrics, DEFAULT_FONT_SIZE, FontMetrics, FontSpec};
pub use paragraph::{
    FONT_SCALE_PRECISION, MIN_FONT_SCALE, Overflow, ParagraphConstraints, ParagraphLayout,
    ParagraphMeasurer,
};
pub use truncate::{Granularity, Item, TruncationPolicy};
