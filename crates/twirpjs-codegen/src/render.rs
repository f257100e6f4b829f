//! JavaScript rendering of the emission tree.

use crate::synth::{Element, Node, LOOP_VAR};

const INDENT: &str = "  ";

/// Line-oriented writer with two-space indentation.
#[derive(Debug, Default)]
pub struct Renderer {
    out: String,
    depth: usize,
}

impl Renderer {
    pub fn new(depth: usize) -> Self {
        Self {
            out: String::new(),
            depth,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    pub fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// `prefix{ ...fields }suffix`, or `prefix{}suffix` with no fields.
    pub fn object(&mut self, prefix: &str, nodes: &[Node], suffix: &str) {
        if nodes.is_empty() {
            self.line(&format!("{prefix}{{}}{suffix}"));
            return;
        }
        self.line(&format!("{prefix}{{"));
        self.indent();
        self.fields(nodes);
        self.dedent();
        self.line(&format!("}}{suffix}"));
    }

    /// Object members in order, `,` after every member but the last.
    pub fn fields(&mut self, nodes: &[Node]) {
        for (i, node) in nodes.iter().enumerate() {
            let sep = if i + 1 == nodes.len() { "" } else { "," };
            self.node(node, sep);
        }
    }

    fn node(&mut self, node: &Node, sep: &str) {
        match node {
            Node::Scalar { name, path, zero } => {
                self.line(&format!("{name}: {} || {}{sep}", path.render(), zero.literal()));
            }
            Node::Timestamp { name, path } => {
                self.line(&format!("{name}: {} || \"\"{sep}", path.render()));
            }
            Node::Message { name, fields, .. } => {
                self.object(&format!("{name}: "), fields, sep);
            }
            Node::Map { name, path, value } => {
                self.line(&format!(
                    "{name}: Object.entries({} || {{}}).reduce((a, [k, {LOOP_VAR}]) => {{",
                    path.render()
                ));
                self.indent();
                self.element("a[k] = ", value);
                self.line("return a");
                self.dedent();
                self.line(&format!("}}, {{}}){sep}"));
            }
            Node::Repeated {
                name,
                path,
                element,
            } => {
                let source = path.render();
                self.line(&format!("{name}: {source} ? {source}.map({LOOP_VAR} => {{"));
                self.indent();
                self.element("return ", element);
                self.dedent();
                self.line(&format!("}}) : []{sep}"));
            }
        }
    }

    fn element(&mut self, prefix: &str, element: &Element) {
        match element {
            Element::Defaulted(zero) => {
                self.line(&format!("{prefix}{LOOP_VAR} || {}", zero.literal()));
            }
            Element::Object(nodes) => self.object(prefix, nodes, ""),
        }
    }
}

/// Render `nodes` as a standalone object literal at `depth`.
pub fn render_object(prefix: &str, nodes: &[Node], depth: usize) -> String {
    let mut r = Renderer::new(depth);
    r.object(prefix, nodes, "");
    r.finish()
}
