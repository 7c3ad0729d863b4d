//! Minimal XML element tree for sitemap handlers.
//!
//! Sitemaps only need element names and their text, so responses are read
//! with `quick-xml` into a small owned tree and matched against descendant
//! paths such as `//url` or `//sitemap/loc`.

use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;

/// One element with its inner text (the text of all descendants, in order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    pub name: String,
    text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Self::default()
        }
    }

    /// Parse a document into a nameless root holding the top-level elements.
    pub fn parse(xml: &str) -> Result<XmlNode, quick_xml::Error> {
        let mut reader = Reader::from_str(xml);
        let mut stack = vec![XmlNode::default()];

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(XmlNode::named(e.name().as_ref())),
                Event::Empty(e) => attach(&mut stack, XmlNode::named(e.name().as_ref())),
                Event::End(_) => {
                    if stack.len() > 1 {
                        if let Some(node) = stack.pop() {
                            attach(&mut stack, node);
                        }
                    }
                }
                Event::Text(t) => {
                    let raw = String::from_utf8_lossy(&t);
                    let text = unescape(&raw)
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| raw.to_string());
                    append_text(&mut stack, &text);
                }
                Event::CData(c) => append_text(&mut stack, &String::from_utf8_lossy(&c)),
                Event::GeneralRef(r) => {
                    let entity = format!("&{};", String::from_utf8_lossy(&r));
                    let text = unescape(&entity).map(|s| s.into_owned()).unwrap_or(entity);
                    append_text(&mut stack, &text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        // tolerate truncated documents
        while stack.len() > 1 {
            if let Some(node) = stack.pop() {
                attach(&mut stack, node);
            }
        }
        Ok(stack.pop().unwrap_or_default())
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Qualified names match exactly; unprefixed names also match on local name.
    fn is(&self, name: &str) -> bool {
        self.name == name || (!name.contains(':') && self.local_name() == name)
    }

    /// Trimmed inner text.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Text of the first direct child called `name`, empty if none.
    pub fn child_text(&self, name: &str) -> &str {
        self.children
            .iter()
            .find(|c| c.is(name))
            .map(XmlNode::text)
            .unwrap_or("")
    }

    /// Text of the first descendant called `name`, empty if none.
    pub fn descendant_text(&self, name: &str) -> &str {
        self.find_descendant(name).map(XmlNode::text).unwrap_or("")
    }

    fn find_descendant(&self, name: &str) -> Option<&XmlNode> {
        self.children
            .iter()
            .find_map(|c| if c.is(name) { Some(c) } else { c.find_descendant(name) })
    }

    /// All descendants matching `path`, in document order.
    pub fn select(&self, path: &XmlPath) -> Vec<&XmlNode> {
        let mut out = Vec::new();
        let mut ancestors = Vec::new();
        collect(self, &mut ancestors, path, &mut out);
        out
    }
}

fn attach(stack: &mut [XmlNode], node: XmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn append_text(stack: &mut [XmlNode], text: &str) {
    for node in stack.iter_mut() {
        node.text.push_str(text);
    }
}

fn collect<'a>(
    node: &'a XmlNode,
    ancestors: &mut Vec<&'a XmlNode>,
    path: &XmlPath,
    out: &mut Vec<&'a XmlNode>,
) {
    for child in &node.children {
        if path.matches(child, ancestors) {
            out.push(child);
        }
        ancestors.push(child);
        collect(child, ancestors, path, out);
        ancestors.pop();
    }
}

/// A descendant path like `//url` or `//sitemap/loc`: the last segment names
/// the element, earlier segments name its direct parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPath {
    segments: Vec<String>,
}

impl XmlPath {
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    fn matches(&self, node: &XmlNode, ancestors: &[&XmlNode]) -> bool {
        let Some((last, parents)) = self.segments.split_last() else {
            return false;
        };
        if !node.is(last) || parents.len() > ancestors.len() {
            return false;
        }
        parents
            .iter()
            .rev()
            .zip(ancestors.iter().rev())
            .all(|(segment, ancestor)| ancestor.is(segment))
    }
}
