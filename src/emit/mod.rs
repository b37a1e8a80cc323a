//! Emission model
//!
//! Design: generators build trees of [`Node`]s instead of writing text with
//! a running indent counter. A [`Fragment`] is an ordered list of nodes;
//! [`render`] turns it into text in one pure pass, so indentation is a
//! property of nesting alone.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Line(String),
    Blank,
    /// `open`, the indented body, then `close` (omitted when empty)
    Block {
        open: String,
        body: Vec<Node>,
        close: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl Into<String>) -> &mut Self {
        self.nodes.push(Node::Line(text.into()));
        self
    }

    pub fn lines<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes.extend(lines.into_iter().map(|l| Node::Line(l.into())));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.nodes.push(Node::Blank);
        self
    }

    pub fn block(
        &mut self,
        open: impl Into<String>,
        close: impl Into<String>,
        body: Fragment,
    ) -> &mut Self {
        self.nodes.push(Node::Block {
            open: open.into(),
            body: body.nodes,
            close: close.into(),
        });
        self
    }

    /// Block whose body is built by `build`
    pub fn block_with<F>(&mut self, open: impl Into<String>, close: impl Into<String>, build: F) -> &mut Self
    where
        F: FnOnce(&mut Fragment),
    {
        let mut body = Fragment::new();
        build(&mut body);
        self.block(open, close, body)
    }

    pub fn append(&mut self, other: Fragment) -> &mut Self {
        self.nodes.extend(other.nodes);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// Output conventions for one target language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub indent: Indent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
    Tab,
}

impl Style {
    pub const fn rust() -> Self {
        Self {
            indent: Indent::Spaces(4),
        }
    }

    /// C and Objective-C shims
    pub const fn c() -> Self {
        Self { indent: Indent::Tab }
    }

    fn indent(&self, depth: usize, out: &mut String) {
        match self.indent {
            Indent::Spaces(n) => out.extend(std::iter::repeat(' ').take(n * depth)),
            Indent::Tab => out.extend(std::iter::repeat('\t').take(depth)),
        }
    }
}

pub fn render(fragment: &Fragment, style: &Style) -> String {
    let mut out = String::new();
    render_nodes(&fragment.nodes, style, 0, &mut out);
    out
}

fn render_nodes(nodes: &[Node], style: &Style, depth: usize, out: &mut String) {
    for node in nodes {
        match node {
            Node::Line(text) => push_line(text, style, depth, out),
            Node::Blank => out.push('\n'),
            Node::Block { open, body, close } => {
                push_line(open, style, depth, out);
                render_nodes(body, style, depth + 1, out);
                if !close.is_empty() {
                    push_line(close, style, depth, out);
                }
            }
        }
    }
}

fn push_line(text: &str, style: &Style, depth: usize, out: &mut String) {
    if !text.is_empty() {
        style.indent(depth, out);
        out.push_str(text);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests;
