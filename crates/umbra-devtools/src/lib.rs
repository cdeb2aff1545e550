use std::collections::VecDeque;
use std::fmt::Write;

use web_time::Instant;

use umbra_core::{Diagnostics, Props, ShadowNode, ShadowTree};
use umbra_runtime::RenderReport;

/// Diagnostics kept by an [`Inspector`] before the oldest are dropped.
pub const DIAGNOSTIC_LOG_LIMIT: usize = 64;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metrics {
    pub build_ms: f32,
    pub layout_ms: f32,
    pub commit_ms: f32,
    pub nodes: usize,
    pub mutations: usize,
}

impl Metrics {
    pub fn total_ms(&self) -> f32 {
        self.build_ms + self.layout_ms + self.commit_ms
    }
}

pub struct Hud {
    passes: u64,
    last_pass: Option<Instant>,
    rate_smooth: f32,
    pub metrics: Option<Metrics>,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self {
            passes: 0,
            last_pass: None,
            rate_smooth: 0.0,
            metrics: None,
        }
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Commits per second, smoothed.
    pub fn commit_rate(&self) -> f32 {
        self.rate_smooth
    }

    pub fn record(&mut self, report: &RenderReport) {
        self.passes += 1;
        let now = Instant::now();
        if let Some(prev) = self.last_pass.replace(now) {
            let dt = (now - prev).as_secs_f32();
            if dt > 0.0 {
                let rate = 1.0 / dt;
                // simple EMA
                let a = 0.2;
                self.rate_smooth = if self.rate_smooth == 0.0 {
                    rate
                } else {
                    (1.0 - a) * self.rate_smooth + a * rate
                };
            }
        }
        self.metrics = Some(Metrics {
            build_ms: report.build_ms,
            layout_ms: report.layout_ms,
            commit_ms: report.commit_ms,
            nodes: report.nodes,
            mutations: report.mutations.len(),
        });
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("passes: {}", self.passes),
            format!("commits/s: {:.1}", self.rate_smooth),
        ];
        if let Some(m) = &self.metrics {
            lines.push(format!(
                "build+layout+commit: {:.2} ms ({:.2}/{:.2}/{:.2})",
                m.total_ms(),
                m.build_ms,
                m.layout_ms,
                m.commit_ms
            ));
            lines.push(format!("nodes: {}", m.nodes));
            lines.push(format!("mutations: {}", m.mutations));
        }
        lines.join("  |  ")
    }
}

fn describe(node: &ShadowNode, out: &mut String) {
    let f = node.layout().frame;
    let _ = write!(
        out,
        "{} #{} r{} [{},{} {}x{}]",
        node.component(),
        node.tag(),
        node.revision(),
        f.x,
        f.y,
        f.w,
        f.h
    );
    if node.is_layout_dirty() {
        out.push_str(" dirty");
    }
    match node.props() {
        Props::RawText(raw) => {
            let _ = write!(out, " {:?}", raw.text);
        }
        Props::Paragraph(_) => {
            if let Some(p) = node.state().paragraph() {
                let _ = write!(
                    out,
                    " lines={} scale={:.2}{}",
                    p.lines.len(),
                    p.font_scale,
                    if p.truncated { " truncated" } else { "" }
                );
            }
        }
        _ => {}
    }
}

fn dump_node(node: &ShadowNode, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    describe(node, out);
    out.push('\n');
    for child in node.children() {
        dump_node(child, depth + 1, out);
    }
}

/// Indented outline of a committed tree, one node per line, inline text
/// content included.
pub fn dump_tree(tree: &ShadowTree) -> String {
    let mut out = format!("generation {} ({} nodes)\n", tree.generation(), tree.len());
    dump_node(tree.root(), 0, &mut out);
    out
}

pub struct Inspector {
    pub hud: Hud,
    enabled: bool,
    log: VecDeque<String>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self {
            hud: Hud::new(),
            enabled: false,
            log: VecDeque::new(),
        }
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records a pass; does nothing while disabled.
    pub fn record(&mut self, report: &RenderReport) {
        if self.enabled {
            self.hud.record(report);
        }
    }

    /// Moves pending diagnostics into the inspector's log.
    pub fn collect(&mut self, diagnostics: &Diagnostics) -> usize {
        let taken = diagnostics.take();
        let n = taken.len();
        for d in taken {
            if self.log.len() == DIAGNOSTIC_LOG_LIMIT {
                self.log.pop_front();
            }
            self.log.push_back(format!("[gen {}] {}", d.generation, d.error));
        }
        n
    }

    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    pub fn report(&self, tree: &ShadowTree) -> String {
        let mut out = self.hud.summary();
        out.push('\n');
        out.push_str(&dump_tree(tree));
        for line in &self.log {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
